pub mod bulk_delete;
pub mod create;
pub mod delete;
pub mod update;

pub use bulk_delete::{BulkDeleteCallLogsCommand, BulkDeleteCallLogsError};
pub use create::{CreateCallLogCommand, CreateCallLogError};
pub use delete::DeleteCallLogError;
pub use update::{UpdateCallLogCommand, UpdateCallLogError};
