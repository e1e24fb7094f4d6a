//! Contribution records and their lifecycle

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle status of a contribution.
///
/// `pending -> processing -> {completed | failed}`. `Completed` is
/// absorbing: once a contribution reaches it, no later update (duplicate or
/// out-of-order webhook delivery included) may overwrite it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContributionStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ContributionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionStatus::Pending => "pending",
            ContributionStatus::Processing => "processing",
            ContributionStatus::Completed => "completed",
            ContributionStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ContributionStatus::Pending),
            "processing" => Some(ContributionStatus::Processing),
            "completed" => Some(ContributionStatus::Completed),
            "failed" => Some(ContributionStatus::Failed),
            _ => None,
        }
    }

    /// Terminal statuses receive no further gateway-driven transitions
    /// except the absorbing rule below.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ContributionStatus::Completed | ContributionStatus::Failed
        )
    }

    /// `completed` can never be left once reached.
    pub fn is_absorbing(&self) -> bool {
        matches!(self, ContributionStatus::Completed)
    }
}

impl std::fmt::Display for ContributionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded payment attempt/outcome tied to a member.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Contribution {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Whole currency units (KES), always positive.
    pub amount: i32,
    pub status: String,
    /// Correlation token linking the outgoing charge to its webhook.
    pub api_ref: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Contribution {
    pub fn parsed_status(&self) -> Option<ContributionStatus> {
        ContributionStatus::parse(&self.status)
    }
}
