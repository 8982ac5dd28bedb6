pub mod by_user;
pub mod get;
pub mod list;

pub use get::GetCallLogError;
pub use list::{
    CallLogSortField, CallLogStats, ListCallLogsError, ListCallLogsQuery, ListCallLogsResponse,
};
