//! Share policy selection and page scoping

use tracing::debug;

use crate::planner::PlanError;
use crate::store::{PolicyStore, StoreError};
use super::grant::{Requester, RlsRuleGroup, SharePermission, ShareGrant};

/// Restrictions derived from the requester's strongest non-admin grant
#[derive(Debug, Clone, PartialEq)]
pub struct SharePolicy {
    pub grant_id: String,
    pub permission: SharePermission,
    /// Pages the requester may open; empty means every page
    pub allowed_page_ids: Vec<String>,
    pub rule_groups: Vec<RlsRuleGroup>,
}

impl SharePolicy {
    /// Check the requested page against the allow-list
    pub fn check_page(&self, page_id: Option<&str>) -> Result<(), PlanError> {
        if self.allowed_page_ids.is_empty() {
            return Ok(());
        }
        match page_id {
            Some(page) if self.allowed_page_ids.iter().any(|p| p == page) => Ok(()),
            _ => Err(PlanError::RlsPageDenied {
                page_id: page_id.map(String::from),
            }),
        }
    }

    pub fn has_rls(&self) -> bool {
        self.rule_groups.iter().any(|g| !g.conditions.is_empty())
    }
}

/// Pick the policy governing `requester` from the dashboard's grants.
///
/// The highest permission wins; on a tie a direct user grant beats a group
/// grant, then the earlier grant. Admin access carries no restriction, and
/// neither does having no grant at all.
pub fn select_policy(grants: &[ShareGrant], requester: &Requester) -> Option<SharePolicy> {
    let mut best: Option<&ShareGrant> = None;
    for grant in grants.iter().filter(|g| g.applies_to(requester)) {
        let better = match best {
            None => true,
            Some(current) => {
                (grant.permission, grant.is_user_grant())
                    > (current.permission, current.is_user_grant())
            }
        };
        if better {
            best = Some(grant);
        }
    }

    let grant = best?;
    if grant.permission == SharePermission::Admin {
        return None;
    }
    Some(SharePolicy {
        grant_id: grant.id.clone(),
        permission: grant.permission,
        allowed_page_ids: grant.allowed_page_ids.clone(),
        rule_groups: grant.rls.rules.clone(),
    })
}

/// Load the dashboard's grants and select the requester's policy
pub async fn resolve_policy<P: PolicyStore>(
    store: &P,
    tenant_id: &str,
    requester: &Requester,
    dashboard_id: Option<&str>,
) -> Result<Option<SharePolicy>, StoreError> {
    let Some(dashboard_id) = dashboard_id else {
        return Ok(None);
    };
    let grants = store.share_grants(tenant_id, dashboard_id, requester).await?;
    let policy = select_policy(&grants, requester);
    debug!(
        dashboard = %dashboard_id,
        user = %requester.user_id,
        grants = grants.len(),
        restricted = policy.is_some(),
        "resolved share policy"
    );
    Ok(policy)
}
