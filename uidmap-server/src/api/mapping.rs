//! Mapping API Handlers
//!
//! Single user/address mappings, count-based bulk mapping jobs and
//! subnet-wide mapping jobs.

use axum::{Json, extract::State};
use uidmap_core::domain::job::{Job, JobKind};
use uidmap_core::domain::work_item::MappingOperation;
use uidmap_core::dto::job::SubmitResponse;
use uidmap_core::dto::mapping::{BulkMappingRequest, SingleMappingRequest, SubnetMappingRequest};
use uidmap_core::dto::status::MessageResponse;

use crate::api::error::{ApiError, ApiResult};
use crate::service::JobHandle;
use crate::state::AppState;

/// POST /single-mapping
/// Sends one mapping straight to the agent
pub async fn single_mapping(
    State(state): State<AppState>,
    Json(req): Json<SingleMappingRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let item = req.work_item()?;
    tracing::debug!("Single mapping: {}", item);

    let halt = state.registry.halt_token();
    state
        .runner
        .execute_single(&item, req.uia_url.as_deref(), halt)
        .await?;

    Ok(Json(MessageResponse::new(format!(
        "Mapping {} sent to {}",
        item,
        state.connection.current().endpoint
    ))))
}

/// POST /bulk-mapping
/// Starts a job mapping `count` consecutive addresses to numbered users
pub async fn bulk_mapping(
    State(state): State<AppState>,
    Json(req): Json<BulkMappingRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    check_batch_size(&state, req.count)?;

    let job = Job::new(mapping_kind(req.operation), req.work_items()?)?;

    let handle = state.registry.submit(job, req.uia_url.as_deref())?;
    Ok(Json(submitted(handle)))
}

/// POST /map-subnet
/// Starts a job mapping every host of a subnet to numbered users
pub async fn map_subnet(
    State(state): State<AppState>,
    Json(req): Json<SubnetMappingRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    let hosts = req.host_count()?;
    check_batch_size(&state, usize::try_from(hosts).unwrap_or(usize::MAX))?;

    let job = Job::new(mapping_kind(req.operation), req.work_items()?)?;
    tracing::info!("Subnet {} expands to {} host(s)", req.subnet, hosts);

    let handle = state.registry.submit(job, req.uia_url.as_deref())?;
    Ok(Json(submitted(handle)))
}

fn mapping_kind(operation: MappingOperation) -> JobKind {
    match operation {
        MappingOperation::Login => JobKind::MappingLogin,
        MappingOperation::Logout => JobKind::MappingLogout,
    }
}

/// Rejects batches above the configured maximum
pub(crate) fn check_batch_size(state: &AppState, count: usize) -> ApiResult<()> {
    if count > state.config.max_batch {
        return Err(ApiError::BadRequest(format!(
            "batch of {} items exceeds the maximum of {}",
            count, state.config.max_batch
        )));
    }
    Ok(())
}

pub(crate) fn submitted(handle: JobHandle) -> SubmitResponse {
    SubmitResponse {
        message: format!("Started {} job with {} item(s)", handle.kind, handle.total),
        job_id: handle.id,
        kind: handle.kind,
        total: handle.total,
    }
}
