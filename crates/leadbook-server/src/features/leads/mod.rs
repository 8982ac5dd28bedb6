//! Leads: prospective customers worked through the sales pipeline

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{
    CreateLeadCommand, CreateLeadError, DeleteLeadError, UpdateLeadCommand, UpdateLeadError,
};
pub use queries::{GetLeadError, LeadStats, ListLeadsError, ListLeadsQuery, ListLeadsResponse};
pub use routes::leads_routes;
pub use types::{Lead, LeadSource, LeadStage, LeadStatus, Priority};
