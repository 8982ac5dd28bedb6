//! Lead entity and its enumerations

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::features::shared::enums::text_enum;

text_enum! {
    /// How urgently a lead should be worked.
    Priority { High => "HIGH", Medium => "MEDIUM", Low => "LOW" }
    default = Medium
}

text_enum! {
    /// Where the sales conversation currently stands.
    LeadStage {
        CallDone => "CALL_DONE",
        FollowupDone => "FOLLOWUP_DONE",
        DemoBooked => "DEMO_BOOKED",
        Negotiation => "NEGOTIATION",
        FutureConnect => "FUTURE_CONNECT",
    }
    default = CallDone
}

text_enum! {
    /// Outcome-oriented lead status, summarised in list stats.
    LeadStatus {
        New => "NEW",
        Connected => "CONNECTED",
        DemoDone => "DEMO_DONE",
        ClosedWon => "CLOSED_WON",
        Lost => "LOST",
        FollowUp => "FOLLOW_UP",
    }
    default = New
}

text_enum! {
    /// Acquisition channel.
    LeadSource {
        Website => "WEBSITE",
        Referral => "REFERRAL",
        EmailCampaign => "EMAIL_CAMPAIGN",
        SocialMedia => "SOCIAL_MEDIA",
    }
    default = Website
}

/// Column list shared by every statement returning a [`Lead`].
pub(crate) const LEAD_COLUMNS: &str = "id, lead_name, institution, phone_number, city, owner, \
     email, notes, priority, stage, status, source, created_at, updated_at";

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub lead_name: String,
    pub institution: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub owner: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub priority: Priority,
    #[sqlx(try_from = "String")]
    pub stage: LeadStage,
    #[sqlx(try_from = "String")]
    pub status: LeadStatus,
    #[sqlx(try_from = "String")]
    pub source: LeadSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
