pub mod create;
pub mod delete;
pub mod update;

pub use create::{CreateLeadCommand, CreateLeadError};
pub use delete::DeleteLeadError;
pub use update::{UpdateLeadCommand, UpdateLeadError};
