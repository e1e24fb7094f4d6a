//! Contribution reminders
//!
//! Treasurer tooling: builds per-member reminder messages with WhatsApp
//! click-to-chat links and a batch summary. Generation only - nothing is
//! sent from here; the treasurer opens the links themselves.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::balance;
use crate::error::{FundError, FundResult};
use crate::projection::{member_status, MemberStatus};

/// Which members a reminder batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetGroup {
    All,
    NotStarted,
    InProgress,
    /// Everyone below the target, started or not.
    Incomplete,
    Completed,
}

impl TargetGroup {
    pub fn parse(s: &str) -> FundResult<Self> {
        match s {
            "all" => Ok(TargetGroup::All),
            "not_started" => Ok(TargetGroup::NotStarted),
            "in_progress" => Ok(TargetGroup::InProgress),
            "incomplete" => Ok(TargetGroup::Incomplete),
            "completed" => Ok(TargetGroup::Completed),
            _ => Err(FundError::Validation(format!("unknown target group {s}"))),
        }
    }

    fn matches(&self, total_paid: i64, target: i64) -> bool {
        match self {
            TargetGroup::All => true,
            TargetGroup::NotStarted => total_paid == 0,
            TargetGroup::InProgress => total_paid > 0 && total_paid < target,
            TargetGroup::Incomplete => total_paid < target,
            TargetGroup::Completed => total_paid >= target,
        }
    }
}

/// One member's reminder.
#[derive(Debug, Clone, Serialize)]
pub struct MemberReminder {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub total_paid: i64,
    pub remaining: i64,
    pub status: MemberStatus,
    pub message: String,
    pub whatsapp_link: Option<String>,
    pub has_phone: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderSummary {
    pub total_members: i64,
    pub targeted_members: i64,
    pub with_phone: i64,
    pub without_phone: i64,
    pub days_left: i64,
    pub total_collected: i64,
    pub total_remaining: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReminderBatch {
    pub target_group: TargetGroup,
    pub summary: ReminderSummary,
    pub reminders: Vec<MemberReminder>,
}

/// Reminder generation service.
pub struct ReminderService {
    pool: PgPool,
    target: i64,
    deadline: Date,
    app_url: String,
}

#[derive(Debug, sqlx::FromRow)]
struct MemberRow {
    user_id: Uuid,
    name: String,
    email: String,
    phone: Option<String>,
    total_paid: i64,
}

impl ReminderService {
    pub fn new(pool: PgPool, target: i64, deadline: Date, app_url: String) -> Self {
        Self {
            pool,
            target,
            deadline,
            app_url,
        }
    }

    /// Build a reminder batch for the given target group.
    pub async fn generate(&self, group: TargetGroup) -> FundResult<ReminderBatch> {
        let rows: Vec<MemberRow> = sqlx::query_as(
            r#"
            SELECT
                p.user_id,
                p.name,
                p.email,
                p.phone,
                COALESCE(SUM(c.amount) FILTER (WHERE c.status = 'completed'), 0)::BIGINT
                    AS total_paid
            FROM profiles p
            LEFT JOIN contributions c ON c.user_id = p.user_id
            GROUP BY p.user_id, p.name, p.email, p.phone
            ORDER BY p.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let days_left = days_until(self.deadline, OffsetDateTime::now_utc().date());
        let total_members = rows.len() as i64;
        let total_collected: i64 = rows.iter().map(|r| r.total_paid).sum();
        let total_target = total_members * self.target;

        let reminders: Vec<MemberReminder> = rows
            .into_iter()
            .filter(|r| group.matches(r.total_paid, self.target))
            .map(|row| {
                let bal = balance::from_total(self.target, row.total_paid);
                let message = reminder_message(
                    &row.name,
                    bal.total_paid,
                    bal.remaining,
                    self.target,
                    days_left,
                    &self.app_url,
                );
                let whatsapp_link = row
                    .phone
                    .as_deref()
                    .map(|phone| whatsapp_link(phone, &message));
                MemberReminder {
                    user_id: row.user_id,
                    name: row.name,
                    email: row.email,
                    has_phone: row.phone.is_some(),
                    phone: row.phone,
                    total_paid: bal.total_paid,
                    remaining: bal.remaining,
                    status: member_status(bal.total_paid, self.target),
                    message,
                    whatsapp_link,
                }
            })
            .collect();

        let with_phone = reminders.iter().filter(|r| r.has_phone).count() as i64;
        let summary = ReminderSummary {
            total_members,
            targeted_members: reminders.len() as i64,
            with_phone,
            without_phone: reminders.len() as i64 - with_phone,
            days_left,
            total_collected,
            total_remaining: (total_target - total_collected).max(0),
        };

        tracing::info!(
            target_group = ?group,
            targeted = summary.targeted_members,
            days_left = days_left,
            "Generated reminder batch"
        );

        Ok(ReminderBatch {
            target_group: group,
            summary,
            reminders,
        })
    }
}

/// Whole days from `today` until the deadline, clamped at zero.
pub fn days_until(deadline: Date, today: Date) -> i64 {
    (deadline - today).whole_days().max(0)
}

/// Build the reminder text for one member's progress bucket.
pub fn reminder_message(
    name: &str,
    total_paid: i64,
    remaining: i64,
    target: i64,
    days_left: i64,
    app_url: &str,
) -> String {
    if total_paid == 0 {
        return format!(
            "Hi {name}! This is a friendly reminder about the FinalCommit Fund contribution.\n\
             Your status: not started yet. Target: KES {target}. Days left: {days_left}.\n\
             Please contribute when you can - every contribution counts!\n\
             Contribute here: {app_url}/contribute"
        );
    }

    if remaining > 0 {
        let percent = (total_paid * 100) / target;
        return format!(
            "Hi {name}! Great progress on your FinalCommit Fund contribution.\n\
             Your progress: {percent}%. Paid: KES {total_paid}. Remaining: KES {remaining}.\n\
             Days left: {days_left}. You're almost there!\n\
             Contribute here: {app_url}/contribute"
        );
    }

    format!(
        "Hi {name}! Thank you for completing your FinalCommit Fund contribution.\n\
         Status: COMPLETED. Total paid: KES {total_paid}. You're all set!"
    )
}

/// Digits-only international phone for the wa.me URL path.
pub fn whatsapp_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(rest) = digits.strip_prefix('0') {
        format!("254{rest}")
    } else if digits.starts_with("254") {
        digits
    } else {
        format!("254{digits}")
    }
}

/// WhatsApp click-to-chat URL with the message pre-filled.
pub fn whatsapp_link(phone: &str, message: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
    format!("https://wa.me/{}?text={}", whatsapp_phone(phone), encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn test_target_group_parse() {
        assert_eq!(TargetGroup::parse("all").unwrap(), TargetGroup::All);
        assert_eq!(
            TargetGroup::parse("not_started").unwrap(),
            TargetGroup::NotStarted
        );
        assert!(TargetGroup::parse("everyone").is_err());
    }

    #[test]
    fn test_target_group_filters() {
        let target = 700;
        assert!(TargetGroup::NotStarted.matches(0, target));
        assert!(!TargetGroup::NotStarted.matches(100, target));
        assert!(TargetGroup::InProgress.matches(100, target));
        assert!(!TargetGroup::InProgress.matches(0, target));
        assert!(TargetGroup::Incomplete.matches(0, target));
        assert!(TargetGroup::Incomplete.matches(699, target));
        assert!(!TargetGroup::Incomplete.matches(700, target));
        assert!(TargetGroup::Completed.matches(700, target));
    }

    #[test]
    fn test_message_selection_by_bucket() {
        let not_started = reminder_message("Felix", 0, 700, 700, 30, "https://fund.example");
        assert!(not_started.contains("not started"));
        assert!(not_started.contains("/contribute"));

        let in_progress = reminder_message("Grace", 300, 400, 700, 30, "https://fund.example");
        assert!(in_progress.contains("42%"));
        assert!(in_progress.contains("KES 400"));

        let done = reminder_message("Alex", 700, 0, 700, 30, "https://fund.example");
        assert!(done.contains("COMPLETED"));
        assert!(!done.contains("/contribute"));
    }

    #[test]
    fn test_whatsapp_phone_formats() {
        assert_eq!(whatsapp_phone("0712345678"), "254712345678");
        assert_eq!(whatsapp_phone("+254712345678"), "254712345678");
        assert_eq!(whatsapp_phone("712345678"), "254712345678");
    }

    #[test]
    fn test_whatsapp_link_encodes_message() {
        let link = whatsapp_link("0712345678", "Hi Alex! 50% done");
        assert!(link.starts_with("https://wa.me/254712345678?text="));
        assert!(!link.contains(' '));
        assert!(link.contains("Hi+Alex%21"));
    }

    #[test]
    fn test_days_until_clamps_at_zero() {
        let deadline = date!(2026 - 05 - 01);
        assert_eq!(days_until(deadline, date!(2026 - 04 - 01)), 30);
        assert_eq!(days_until(deadline, date!(2026 - 06 - 01)), 0);
    }
}
