//! Call logs: phone calls made or received by sales agents

pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use commands::{
    BulkDeleteCallLogsCommand, BulkDeleteCallLogsError, CreateCallLogCommand, CreateCallLogError,
    DeleteCallLogError, UpdateCallLogCommand, UpdateCallLogError,
};
pub use queries::{
    CallLogStats, GetCallLogError, ListCallLogsError, ListCallLogsQuery, ListCallLogsResponse,
};
pub use routes::call_logs_routes;
pub use types::{CallLog, CallType, SimProvider};
