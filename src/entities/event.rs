//! Quality event entity type - deviations and non-conformances

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{string_enum, Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::overdue::Deadline;

string_enum! {
    /// Quality event workflow status
    #[derive(Default)]
    pub enum EventStatus ("event status") {
        #[default]
        Open => "open",
        UnderInvestigation => "under_investigation",
        PendingApproval => "pending_approval",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

impl EventStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Closed | EventStatus::Cancelled)
    }
}

string_enum! {
    /// Impact severity of a quality event
    #[derive(Default)]
    pub enum Severity ("severity") {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

impl From<Severity> for Priority {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Low => Priority::Low,
            Severity::Medium => Priority::Medium,
            Severity::High => Priority::High,
            Severity::Critical => Priority::Critical,
        }
    }
}

/// A recorded quality event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityEvent {
    /// Unique identifier
    pub id: EntityId,

    /// Event number (e.g., "QE-2024-001")
    pub event_number: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Event type (e.g., "Deviation", "Non-conformance", "Complaint")
    pub event_type: String,

    #[serde(default)]
    pub severity: Severity,

    #[serde(default)]
    pub status: EventStatus,

    pub reported_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    pub reported_date: NaiveDate,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<NaiveDate>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for QualityEvent {
    const PREFIX: EntityPrefix = EntityPrefix::Qe;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn number(&self) -> Option<&str> {
        Some(&self.event_number)
    }

    fn status_key(&self) -> &'static str {
        self.status.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> &str {
        &self.reported_by
    }
}

impl Deadline for QualityEvent {
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl QualityEvent {
    /// Create a new open event reported now
    pub fn new(
        event_number: String,
        title: String,
        event_type: String,
        reported_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Qe),
            event_number,
            title,
            description: String::new(),
            event_type,
            severity: Severity::default(),
            status: EventStatus::default(),
            reported_by,
            assigned_to: None,
            reported_date: now.date_naive(),
            due_date: None,
            closed_date: None,
            created_at: now,
            updated_at: now,
        }
    }
}
