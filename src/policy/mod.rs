//! Security policy compiler (noun + verb module)
//!
//! Dashboard share grants decide which pages a requester may open and which
//! row-level predicates are added to every query they run.

mod grant;
mod resolve;
mod rls;

pub use grant::{
    Requester, RlsCondition, RlsDocument, RlsRuleGroup, SharePermission, ShareGrant,
};
pub use resolve::{resolve_policy, select_policy, SharePolicy};
pub use rls::{compile_rls, RlsFilterGroup};
