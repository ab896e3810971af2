//! Tag API Handlers
//!
//! Address-tag and user-tag batches. Each request becomes one job.

use axum::{Json, extract::State};
use uidmap_core::domain::job::{Job, JobKind};
use uidmap_core::domain::work_item::{AddressTagAction, UserTagAction};
use uidmap_core::dto::job::SubmitResponse;
use uidmap_core::dto::tag::{IpTagRequest, UserTagRequest};

use crate::api::error::ApiResult;
use crate::api::mapping::{check_batch_size, submitted};
use crate::state::AppState;

/// POST /update-ip-tags
pub async fn update_ip_tags(
    State(state): State<AppState>,
    Json(req): Json<IpTagRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    check_batch_size(&state, req.items.len())?;

    let kind = match req.action {
        AddressTagAction::Register => JobKind::AddressTagRegister,
        AddressTagAction::Unregister => JobKind::AddressTagUnregister,
    };
    let job = Job::new(kind, req.work_items()?)?;

    let handle = state.registry.submit(job, req.uia_url.as_deref())?;
    Ok(Json(submitted(handle)))
}

/// POST /update-tags
pub async fn update_user_tags(
    State(state): State<AppState>,
    Json(req): Json<UserTagRequest>,
) -> ApiResult<Json<SubmitResponse>> {
    check_batch_size(&state, req.items.len())?;

    let kind = match req.action {
        UserTagAction::RegisterUser => JobKind::UserTagRegister,
        UserTagAction::UnregisterUser => JobKind::UserTagUnregister,
    };
    let job = Job::new(kind, req.work_items()?)?;

    let handle = state.registry.submit(job, req.uia_url.as_deref())?;
    Ok(Json(submitted(handle)))
}
