//! Work item domain types
//!
//! A work item is one atomic operation sent to the agent: a user/address
//! mapping or a tag change on an address or a user.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::job::JobKind;

/// One unit of work executed against the agent
///
/// Immutable once created. Every variant carries the identifiers the agent
/// needs for that operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WorkItem {
    MappingLogin {
        ip: String,
        username: String,
        timeout: u32,
    },
    MappingLogout {
        ip: String,
        username: String,
        timeout: u32,
    },
    AddressTagRegister {
        ip: String,
        tag: String,
    },
    AddressTagUnregister {
        ip: String,
        tag: String,
    },
    UserTagRegister {
        user: String,
        tag: String,
    },
    UserTagUnregister {
        user: String,
        tag: String,
    },
}

impl WorkItem {
    /// Builds a mapping item for the given operation
    pub fn mapping(
        operation: MappingOperation,
        ip: impl Into<String>,
        username: impl Into<String>,
        timeout: u32,
    ) -> Self {
        let (ip, username) = (ip.into(), username.into());
        match operation {
            MappingOperation::Login => WorkItem::MappingLogin {
                ip,
                username,
                timeout,
            },
            MappingOperation::Logout => WorkItem::MappingLogout {
                ip,
                username,
                timeout,
            },
        }
    }

    /// Builds an address tag item
    pub fn address_tag(action: AddressTagAction, ip: impl Into<String>, tag: impl Into<String>) -> Self {
        let (ip, tag) = (ip.into(), tag.into());
        match action {
            AddressTagAction::Register => WorkItem::AddressTagRegister { ip, tag },
            AddressTagAction::Unregister => WorkItem::AddressTagUnregister { ip, tag },
        }
    }

    /// Builds a user tag item
    pub fn user_tag(action: UserTagAction, user: impl Into<String>, tag: impl Into<String>) -> Self {
        let (user, tag) = (user.into(), tag.into());
        match action {
            UserTagAction::RegisterUser => WorkItem::UserTagRegister { user, tag },
            UserTagAction::UnregisterUser => WorkItem::UserTagUnregister { user, tag },
        }
    }

    /// The operation kind of this item
    pub fn kind(&self) -> JobKind {
        match self {
            WorkItem::MappingLogin { .. } => JobKind::MappingLogin,
            WorkItem::MappingLogout { .. } => JobKind::MappingLogout,
            WorkItem::AddressTagRegister { .. } => JobKind::AddressTagRegister,
            WorkItem::AddressTagUnregister { .. } => JobKind::AddressTagUnregister,
            WorkItem::UserTagRegister { .. } => JobKind::UserTagRegister,
            WorkItem::UserTagUnregister { .. } => JobKind::UserTagUnregister,
        }
    }

    /// The identifier operators search the activity log for: the address,
    /// or the user for user tag operations
    pub fn identifier(&self) -> &str {
        match self {
            WorkItem::MappingLogin { ip, .. }
            | WorkItem::MappingLogout { ip, .. }
            | WorkItem::AddressTagRegister { ip, .. }
            | WorkItem::AddressTagUnregister { ip, .. } => ip,
            WorkItem::UserTagRegister { user, .. } | WorkItem::UserTagUnregister { user, .. } => {
                user
            }
        }
    }
}

impl fmt::Display for WorkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkItem::MappingLogin { ip, username, .. } => write!(f, "login {} -> {}", ip, username),
            WorkItem::MappingLogout { ip, username, .. } => {
                write!(f, "logout {} -> {}", ip, username)
            }
            WorkItem::AddressTagRegister { ip, tag } => write!(f, "tag {} +{}", ip, tag),
            WorkItem::AddressTagUnregister { ip, tag } => write!(f, "tag {} -{}", ip, tag),
            WorkItem::UserTagRegister { user, tag } => write!(f, "user tag {} +{}", user, tag),
            WorkItem::UserTagUnregister { user, tag } => write!(f, "user tag {} -{}", user, tag),
        }
    }
}

/// Direction of a user/address mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappingOperation {
    #[default]
    Login,
    Logout,
}

impl fmt::Display for MappingOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingOperation::Login => write!(f, "login"),
            MappingOperation::Logout => write!(f, "logout"),
        }
    }
}

/// Tag change applied to an address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressTagAction {
    Register,
    Unregister,
}

/// Tag change applied to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UserTagAction {
    RegisterUser,
    UnregisterUser,
}
