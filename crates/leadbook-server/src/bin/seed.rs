//! Leadbook seed data
//!
//! Replaces every lead and call log with a fixed sample set. The audit log
//! is left alone and no audit events are recorded.

use anyhow::{Context, Result};
use chrono::{DateTime, TimeZone, Utc};
use leadbook_common::logging::{init_logging, LogConfig, LogOutput};
use sqlx::{Postgres, Transaction};
use tracing::info;

use leadbook_server::{
    config::Config,
    db,
    features::{
        call_logs::{CallType, SimProvider},
        leads::{LeadSource, LeadStage, LeadStatus, Priority},
    },
};

struct SeedLead {
    lead_name: &'static str,
    institution: &'static str,
    phone_number: &'static str,
    city: &'static str,
    priority: Priority,
    stage: LeadStage,
    source: LeadSource,
    owner: &'static str,
    status: LeadStatus,
}

struct SeedCallLog {
    name: &'static str,
    phone_number: &'static str,
    call_type: CallType,
    duration: i32,
    sim_provider: SimProvider,
    user_email: &'static str,
    call_time: (u32, u32, u32),
}

macro_rules! lead {
    ($name:literal, $inst:literal, $phone:literal, $city:literal, $prio:ident, $stage:ident, $source:ident, $owner:literal, $status:ident) => {
        SeedLead {
            lead_name: $name,
            institution: $inst,
            phone_number: $phone,
            city: $city,
            priority: Priority::$prio,
            stage: LeadStage::$stage,
            source: LeadSource::$source,
            owner: $owner,
            status: LeadStatus::$status,
        }
    };
}

macro_rules! call {
    ($name:literal, $phone:literal, $ty:ident, $dur:literal, $sim:ident, $email:literal, $day:literal, $h:literal, $m:literal) => {
        SeedCallLog {
            name: $name,
            phone_number: $phone,
            call_type: CallType::$ty,
            duration: $dur,
            sim_provider: SimProvider::$sim,
            user_email: $email,
            call_time: ($day, $h, $m),
        }
    };
}

const LEADS: &[SeedLead] = &[
    lead!("Rahul Sharma", "Delhi Public School", "9876543210", "Delhi", High, CallDone, Website, "Ananya Sharma", New),
    lead!("Anita Rao", "Green Valley School", "9998887776", "Bangalore", Medium, FollowupDone, Referral, "Vikram Singh", Connected),
    lead!("Sumit Patel", "Modern School", "9345678123", "Mumbai", Low, DemoBooked, EmailCampaign, "Priya Patel", DemoDone),
    lead!("Sonal Gupta", "City International", "9812345678", "Hyderabad", High, Negotiation, Referral, "Rahul Mehta", ClosedWon),
    lead!("Rakesh Kumar", "Sunshine Academy", "9801223344", "Kolkata", Medium, DemoBooked, Website, "Sneha Kapoor", Lost),
    lead!("Priya Menon", "Oakridge School", "9765432109", "Chennai", Low, FutureConnect, SocialMedia, "Karan Malhotra", FollowUp),
    lead!("Amit Sharma", "Little Angels", "9870123456", "Pune", Medium, Negotiation, Website, "Deepika Iyer", ClosedWon),
    lead!("Lakshmi Nair", "Lotus Valley", "9812678901", "Delhi", High, FollowupDone, Referral, "Ananya Sharma", New),
    lead!("Ravi Teja", "St Xavier School", "9876712345", "Hyderabad", Low, CallDone, Website, "Vikram Singh", Connected),
    lead!("Simran Kaur", "Blue Bells Academy", "9813322110", "Chandigarh", Medium, DemoBooked, EmailCampaign, "Priya Patel", DemoDone),
    lead!("Akash Mehta", "Global Public School", "9922334455", "Ahmedabad", High, CallDone, SocialMedia, "Rahul Mehta", FollowUp),
    lead!("Surbhi Jain", "Heritage School", "9888776655", "Gurgaon", High, Negotiation, SocialMedia, "Sneha Kapoor", ClosedWon),
    lead!("Manoj Kumar", "Springfields High", "9800112233", "Dehradun", Medium, DemoBooked, Referral, "Karan Malhotra", DemoDone),
    lead!("Divya Singh", "National Public School", "9811456789", "Bangalore", High, CallDone, Website, "Deepika Iyer", FollowUp),
    lead!("Gaurav Mishra", "Hill Fort Academy", "9912233445", "Jaipur", Low, FutureConnect, SocialMedia, "Ananya Sharma", Connected),
    lead!("Meena Agarwal", "Sunrise Convent", "9833446655", "Bhopal", High, Negotiation, Referral, "Vikram Singh", ClosedWon),
    lead!("Vikas Pandey", "Cambridge School", "9822233446", "Lucknow", Medium, FollowupDone, EmailCampaign, "Priya Patel", FollowUp),
    lead!("Sapna Joshi", "St John's", "9877665544", "Nagpur", Low, CallDone, Website, "Rahul Mehta", FollowUp),
];

const CALL_LOGS: &[SeedCallLog] = &[
    call!("Gaurav Mishra", "+91 99122 33445", Outgoing, 536, Vi, "admin@unite.com", 15, 15, 12),
    call!("Sumit Patel", "+91 93456 78123", Unanswered, 0, Vi, "support@unite.com", 15, 13, 25),
    call!("Rakesh Kumar", "+91 98012 23344", Unanswered, 0, Jio, "admin@unite.com", 15, 11, 59),
    call!("Gaurav Mishra", "+91 99122 33445", Incoming, 159, Vi, "support@unite.com", 14, 11, 50),
    call!("Anita Rao", "+91 99988 87776", Outgoing, 222, Airtel, "sales@unite.com", 13, 20, 34),
    call!("Divya Singh", "+91 98114 56789", Missed, 0, Airtel, "admin@unite.com", 13, 16, 32),
    call!("Vikas Pandey", "+91 98222 33446", Missed, 0, Jio, "sales@unite.com", 13, 10, 19),
    call!("Sumit Patel", "+91 93456 78123", Incoming, 365, Vi, "support@unite.com", 12, 16, 50),
    call!("Simran Kaur", "+91 98133 22110", Incoming, 339, Airtel, "support@unite.com", 12, 15, 10),
    call!("Sonal Gupta", "+91 98123 45678", Outgoing, 381, Bsnl, "support@unite.com", 12, 11, 15),
    call!("Lakshmi Nair", "+91 98126 78901", Outgoing, 582, Bsnl, "support@unite.com", 11, 16, 22),
    call!("Meena Agarwal", "+91 98334 46655", Incoming, 430, Bsnl, "support@unite.com", 10, 9, 43),
    call!("Surbhi Jain", "+91 98887 76655", Incoming, 69, Bsnl, "sales@unite.com", 9, 13, 30),
    call!("Shruti Desai", "+91 99112 23344", Unanswered, 0, Bsnl, "sales@unite.com", 8, 19, 43),
    call!("Manoj Kumar", "+91 98001 12233", Outgoing, 293, Jio, "support@unite.com", 6, 13, 37),
    call!("Rahul Sharma", "+91 98765 43210", Outgoing, 67, Jio, "support@unite.com", 6, 12, 39),
];

fn call_time((day, hour, minute): (u32, u32, u32)) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(2025, 12, day, hour, minute, 0)
        .single()
        .with_context(|| format!("invalid seed call time 2025-12-{day} {hour}:{minute}"))
}

async fn seed_leads(tx: &mut Transaction<'_, Postgres>) -> Result<usize> {
    for lead in LEADS {
        sqlx::query(
            "INSERT INTO leads (lead_name, institution, phone_number, city, priority, stage, source, owner, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(lead.lead_name)
        .bind(lead.institution)
        .bind(lead.phone_number)
        .bind(lead.city)
        .bind(lead.priority.as_str())
        .bind(lead.stage.as_str())
        .bind(lead.source.as_str())
        .bind(lead.owner)
        .bind(lead.status.as_str())
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert lead '{}'", lead.lead_name))?;
    }
    Ok(LEADS.len())
}

async fn seed_call_logs(tx: &mut Transaction<'_, Postgres>) -> Result<usize> {
    for log in CALL_LOGS {
        sqlx::query(
            "INSERT INTO call_logs (name, phone_number, call_type, duration, sim_provider, user_email, call_time) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(log.name)
        .bind(log.phone_number)
        .bind(log.call_type.as_str())
        .bind(log.duration)
        .bind(log.sim_provider.as_str())
        .bind(log.user_email)
        .bind(call_time(log.call_time)?)
        .execute(&mut **tx)
        .await
        .with_context(|| format!("Failed to insert call log for '{}'", log.name))?;
    }
    Ok(CALL_LOGS.len())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let log_config = LogConfig::builder()
        .output(LogOutput::Console)
        .log_file_prefix("leadbook-seed")
        .build()
        .merge_env()?;
    let _log_guard = init_logging(&log_config)?;

    let config = Config::load().context("Failed to load config")?;
    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let mut tx = pool.begin().await?;

    info!("Clearing existing leads and call logs");
    sqlx::query("DELETE FROM call_logs").execute(&mut *tx).await?;
    sqlx::query("DELETE FROM leads").execute(&mut *tx).await?;

    let leads = seed_leads(&mut tx).await?;
    info!("Created {} leads", leads);

    let call_logs = seed_call_logs(&mut tx).await?;
    info!("Created {} call logs", call_logs);

    tx.commit().await?;
    info!("Seed completed");

    Ok(())
}
