//! Tag DTOs

use serde::{Deserialize, Serialize};

use crate::domain::work_item::{AddressTagAction, UserTagAction, WorkItem};
use crate::dto::mapping::parse_ip;
use crate::error::BatchError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpTagItem {
    pub ip: String,
    pub tag: String,
}

/// Register or unregister tags on addresses (dynamic address groups)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpTagRequest {
    pub items: Vec<IpTagItem>,
    pub action: AddressTagAction,
    #[serde(default)]
    pub uia_url: Option<String>,
}

impl IpTagRequest {
    pub fn work_items(&self) -> Result<Vec<WorkItem>, BatchError> {
        if self.items.is_empty() {
            return Err(BatchError::Empty);
        }

        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| -> Result<WorkItem, BatchError> {
                let ip = parse_ip(&item.ip)?;
                let tag = non_empty(index, "tag", &item.tag)?;
                Ok(WorkItem::address_tag(self.action, ip.to_string(), tag))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTagItem {
    pub user: String,
    pub tag: String,
}

/// Register or unregister tags on users (dynamic user groups)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTagRequest {
    pub items: Vec<UserTagItem>,
    pub action: UserTagAction,
    #[serde(default)]
    pub uia_url: Option<String>,
}

impl UserTagRequest {
    pub fn work_items(&self) -> Result<Vec<WorkItem>, BatchError> {
        if self.items.is_empty() {
            return Err(BatchError::Empty);
        }

        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| -> Result<WorkItem, BatchError> {
                let user = non_empty(index, "user", &item.user)?;
                let tag = non_empty(index, "tag", &item.tag)?;
                Ok(WorkItem::user_tag(self.action, user, tag))
            })
            .collect()
    }
}

fn non_empty<'a>(index: usize, field: &'static str, value: &'a str) -> Result<&'a str, BatchError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(BatchError::EmptyField { index, field });
    }
    Ok(trimmed)
}
