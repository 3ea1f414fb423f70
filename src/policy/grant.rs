//! Share grants and stored row-level security documents

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::{FilterOperator, LogicalConnector};

/// The identity a request is made under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub user_id: String,
    #[serde(default)]
    pub group_id: Option<String>,
}

impl Requester {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            group_id: None,
        }
    }

    pub fn with_group(mut self, group_id: impl Into<String>) -> Self {
        self.group_id = Some(group_id.into());
        self
    }
}

/// Permission level of a share grant, ordered `View < Edit < Admin`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    View,
    Edit,
    Admin,
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SharePermission::View => "view",
            SharePermission::Edit => "edit",
            SharePermission::Admin => "admin",
        };
        f.write_str(name)
    }
}

impl FromStr for SharePermission {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "view" | "viewer" | "read" => Ok(SharePermission::View),
            "edit" | "editor" | "write" => Ok(SharePermission::Edit),
            "admin" | "owner" => Ok(SharePermission::Admin),
            other => Err(format!("unknown share permission '{}'", other)),
        }
    }
}

/// One condition of a stored RLS rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RlsCondition {
    pub field: String,
    pub operator: FilterOperator,
    #[serde(default)]
    pub value: serde_json::Value,
    #[serde(default)]
    pub value2: Option<serde_json::Value>,
}

/// Conditions combined with one connector
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RlsRuleGroup {
    #[serde(default)]
    pub conditions: Vec<RlsCondition>,
    #[serde(default)]
    pub combinator: LogicalConnector,
}

/// Stored RLS document: `{rules: [{conditions: [...], combinator}]}`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RlsDocument {
    #[serde(default)]
    pub rules: Vec<RlsRuleGroup>,
}

/// A share of a dashboard with a user or a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareGrant {
    pub id: String,
    pub tenant_id: String,
    pub dashboard_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub group_id: Option<String>,
    pub permission: SharePermission,
    /// Pages the grantee may open; empty means every page
    #[serde(default)]
    pub allowed_page_ids: Vec<String>,
    #[serde(default)]
    pub rls: RlsDocument,
}

impl ShareGrant {
    pub fn is_user_grant(&self) -> bool {
        self.user_id.is_some()
    }

    /// Whether the grant targets the requester directly or through their group
    pub fn applies_to(&self, requester: &Requester) -> bool {
        let user_match = self.user_id.as_deref() == Some(requester.user_id.as_str());
        let group_match = match (&self.group_id, &requester.group_id) {
            (Some(granted), Some(group)) => granted == group,
            _ => false,
        };
        user_match || group_match
    }
}
