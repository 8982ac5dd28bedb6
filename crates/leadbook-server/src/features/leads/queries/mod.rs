pub mod get;
pub mod list;

pub use get::GetLeadError;
pub use list::{LeadSortField, LeadStats, ListLeadsError, ListLeadsQuery, ListLeadsResponse};
