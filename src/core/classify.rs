//! Status and priority badges
//!
//! Every status, priority and role value maps to a fixed [`Badge`]: a display
//! label and a [`Tone`] that the view layer turns into terminal colors.
//!
//! Typed values are covered by the [`Badged`] impls and cannot miss. Raw
//! strings go through [`classify`], which is the one place an unknown value
//! is mapped to the documented default badge for its kind instead of
//! failing. The result says whether that happened.

use serde::Serialize;
use std::str::FromStr;

use crate::core::entity::{string_enum, Priority, RecordKind};
use crate::entities::{
    CapaStatus, ChangeStatus, DocumentStatus, EventStatus, Role, Severity, UserState,
};

/// Visual weight of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Info,
    Warning,
    Caution,
    Success,
    Accent,
    Danger,
    Muted,
}

/// Display label plus tone for one value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

impl Badge {
    pub const fn new(label: &'static str, tone: Tone) -> Self {
        Self { label, tone }
    }
}

impl std::fmt::Display for Badge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label)
    }
}

/// Values that have a badge
pub trait Badged {
    fn badge(&self) -> Badge;
}

impl Badged for DocumentStatus {
    fn badge(&self) -> Badge {
        match self {
            DocumentStatus::Draft => Badge::new("Draft", Tone::Neutral),
            DocumentStatus::PendingReview => Badge::new("Pending Review", Tone::Warning),
            DocumentStatus::PendingApproval => Badge::new("Pending Approval", Tone::Caution),
            DocumentStatus::Approved => Badge::new("Approved", Tone::Info),
            DocumentStatus::Effective => Badge::new("Effective", Tone::Success),
            DocumentStatus::Superseded => Badge::new("Superseded", Tone::Muted),
            DocumentStatus::Archived => Badge::new("Archived", Tone::Muted),
        }
    }
}

impl Badged for EventStatus {
    fn badge(&self) -> Badge {
        match self {
            EventStatus::Open => Badge::new("Open", Tone::Info),
            EventStatus::UnderInvestigation => Badge::new("Under Investigation", Tone::Warning),
            EventStatus::PendingApproval => Badge::new("Pending Approval", Tone::Caution),
            EventStatus::Closed => Badge::new("Closed", Tone::Success),
            EventStatus::Cancelled => Badge::new("Cancelled", Tone::Neutral),
        }
    }
}

impl Badged for CapaStatus {
    fn badge(&self) -> Badge {
        match self {
            CapaStatus::Draft => Badge::new("Draft", Tone::Neutral),
            CapaStatus::Investigation => Badge::new("Investigation", Tone::Info),
            CapaStatus::ActionPlan => Badge::new("Action Plan", Tone::Warning),
            CapaStatus::Implementation => Badge::new("Implementation", Tone::Caution),
            CapaStatus::EffectivenessCheck => Badge::new("Effectiveness Check", Tone::Accent),
            CapaStatus::Closed => Badge::new("Closed", Tone::Success),
            CapaStatus::Cancelled => Badge::new("Cancelled", Tone::Neutral),
        }
    }
}

impl Badged for ChangeStatus {
    fn badge(&self) -> Badge {
        match self {
            ChangeStatus::Draft => Badge::new("Draft", Tone::Neutral),
            ChangeStatus::PendingReview => Badge::new("Pending Review", Tone::Info),
            ChangeStatus::PendingApproval => Badge::new("Pending Approval", Tone::Warning),
            ChangeStatus::Approved => Badge::new("Approved", Tone::Success),
            ChangeStatus::Implemented => Badge::new("Implemented", Tone::Accent),
            ChangeStatus::Closed => Badge::new("Closed", Tone::Neutral),
            ChangeStatus::Cancelled => Badge::new("Cancelled", Tone::Danger),
        }
    }
}

impl Badged for Priority {
    fn badge(&self) -> Badge {
        match self {
            Priority::Critical => Badge::new("Critical", Tone::Danger),
            Priority::High => Badge::new("High", Tone::Caution),
            Priority::Medium => Badge::new("Medium", Tone::Warning),
            Priority::Low => Badge::new("Low", Tone::Success),
        }
    }
}

impl Badged for Severity {
    fn badge(&self) -> Badge {
        Priority::from(*self).badge()
    }
}

impl Badged for Role {
    fn badge(&self) -> Badge {
        match self {
            Role::OrganizationAdmin => Badge::new("Admin", Tone::Danger),
            Role::QualityManager => Badge::new("Quality Manager", Tone::Info),
            Role::QaReviewer => Badge::new("QA Reviewer", Tone::Success),
            Role::DocumentController => Badge::new("Document Controller", Tone::Accent),
            Role::CapaOwner => Badge::new("CAPA Owner", Tone::Caution),
            Role::DepartmentHead => Badge::new("Department Head", Tone::Warning),
            Role::GeneralUser => Badge::new("General User", Tone::Neutral),
        }
    }
}

impl Badged for UserState {
    fn badge(&self) -> Badge {
        match self {
            UserState::Active => Badge::new("Active", Tone::Success),
            UserState::Inactive => Badge::new("Inactive", Tone::Neutral),
        }
    }
}

string_enum! {
    /// Which badge table a raw value is looked up in
    pub enum BadgeKind ("badge kind") {
        Document => "document",
        Event => "event",
        Capa => "capa",
        Change => "change",
        Priority => "priority",
        Role => "role",
        User => "user",
    }
}

impl BadgeKind {
    /// The status table for a record kind
    pub fn status_of(kind: RecordKind) -> Self {
        match kind {
            RecordKind::Document => BadgeKind::Document,
            RecordKind::Event => BadgeKind::Event,
            RecordKind::Capa => BadgeKind::Capa,
            RecordKind::Change => BadgeKind::Change,
            RecordKind::User => BadgeKind::User,
        }
    }
}

/// Outcome of classifying a raw string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified {
    /// The value was recognized
    Known(Badge),
    /// The value was not recognized; this is the default badge for the kind
    Fallback(Badge),
}

impl Classified {
    pub fn badge(&self) -> Badge {
        match self {
            Classified::Known(b) | Classified::Fallback(b) => *b,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Classified::Fallback(_))
    }
}

/// Look up the badge for a raw status, priority or role string.
///
/// Matching ignores case and surrounding whitespace. Unknown values get the
/// default for the kind: draft, open, medium or general user (active for
/// user state).
pub fn classify(kind: BadgeKind, raw: &str) -> Classified {
    match kind {
        BadgeKind::Document => lookup::<DocumentStatus>(kind, raw),
        BadgeKind::Event => lookup::<EventStatus>(kind, raw),
        BadgeKind::Capa => lookup::<CapaStatus>(kind, raw),
        BadgeKind::Change => lookup::<ChangeStatus>(kind, raw),
        BadgeKind::Priority => lookup::<Priority>(kind, raw),
        BadgeKind::Role => lookup::<Role>(kind, raw),
        BadgeKind::User => lookup::<UserState>(kind, raw),
    }
}

fn lookup<T>(kind: BadgeKind, raw: &str) -> Classified
where
    T: FromStr + Default + Badged,
{
    match raw.parse::<T>() {
        Ok(value) => Classified::Known(value.badge()),
        Err(_) => {
            tracing::debug!(kind = %kind, value = raw, "no badge for value, using default");
            Classified::Fallback(T::default().badge())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_values() {
        let c = classify(BadgeKind::Capa, "effectiveness_check");
        assert_eq!(c, Classified::Known(Badge::new("Effectiveness Check", Tone::Accent)));

        let c = classify(BadgeKind::Change, "cancelled");
        assert_eq!(c.badge().tone, Tone::Danger);

        let c = classify(BadgeKind::Event, "cancelled");
        assert_eq!(c.badge().tone, Tone::Neutral);
    }

    #[test]
    fn test_case_and_whitespace_ignored() {
        let c = classify(BadgeKind::Priority, "  CRITICAL ");
        assert!(!c.is_fallback());
        assert_eq!(c.badge(), Badge::new("Critical", Tone::Danger));
    }

    #[test]
    fn test_fallbacks_per_kind() {
        let cases = [
            (BadgeKind::Document, "Draft"),
            (BadgeKind::Event, "Open"),
            (BadgeKind::Capa, "Draft"),
            (BadgeKind::Change, "Draft"),
            (BadgeKind::Priority, "Medium"),
            (BadgeKind::Role, "General User"),
            (BadgeKind::User, "Active"),
        ];
        for (kind, label) in cases {
            let c = classify(kind, "no-such-value");
            assert!(c.is_fallback(), "{kind} should fall back");
            assert_eq!(c.badge().label, label);
        }
    }

    #[test]
    fn test_empty_string_falls_back() {
        assert!(classify(BadgeKind::Priority, "").is_fallback());
    }

    #[test]
    fn test_same_key_differs_by_kind() {
        let doc = classify(BadgeKind::Document, "approved").badge();
        let change = classify(BadgeKind::Change, "approved").badge();
        assert_eq!(doc.tone, Tone::Info);
        assert_eq!(change.tone, Tone::Success);
    }

    #[test]
    fn test_every_typed_value_has_a_label() {
        for s in DocumentStatus::ALL {
            assert!(!s.badge().label.is_empty());
        }
        for s in CapaStatus::ALL {
            assert!(!s.badge().label.is_empty());
        }
        for r in Role::ALL {
            assert!(!r.badge().label.is_empty());
        }
    }

    #[test]
    fn test_severity_uses_priority_table() {
        assert_eq!(Severity::High.badge(), Priority::High.badge());
    }

    #[test]
    fn test_status_table_for_record_kind() {
        assert_eq!(BadgeKind::status_of(RecordKind::User), BadgeKind::User);
        assert_eq!(BadgeKind::status_of(RecordKind::Event), BadgeKind::Event);
    }
}
