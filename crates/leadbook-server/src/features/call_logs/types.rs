//! Call log entity and its enumerations

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::features::shared::enums::text_enum;

text_enum! {
    CallType {
        Incoming => "INCOMING",
        Outgoing => "OUTGOING",
        Missed => "MISSED",
        Unanswered => "UNANSWERED",
    }
}

text_enum! {
    /// Carrier of the SIM the call was placed from.
    SimProvider {
        Vi => "VI",
        Jio => "JIO",
        Airtel => "AIRTEL",
        Bsnl => "BSNL",
        Other => "OTHER",
    }
    default = Other
}

pub(crate) const CALL_LOG_COLUMNS: &str = "id, name, phone_number, call_type, duration, \
     sim_provider, user_email, call_time, notes, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CallLog {
    pub id: Uuid,
    pub name: String,
    pub phone_number: String,
    #[sqlx(try_from = "String")]
    pub call_type: CallType,
    /// Seconds.
    pub duration: i32,
    #[sqlx(try_from = "String")]
    pub sim_provider: SimProvider,
    pub user_email: String,
    pub call_time: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
