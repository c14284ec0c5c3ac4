//! Dashboard counts per record type

use serde::Serialize;

use crate::core::context::SessionContext;
use crate::core::loader::RecordSet;
use crate::core::overdue::{count_overdue, is_overdue};
use crate::entities::{
    Capa, CapaStatus, ChangeControl, ChangeStatus, Document, DocumentStatus, EventStatus,
    QualityEvent, UserProfile,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentMetrics {
    pub total: usize,
    /// Pending review or pending approval
    pub pending_review: usize,
    pub effective: usize,
    pub review_due: usize,
}

impl DocumentMetrics {
    pub fn collect(documents: &[Document], ctx: &SessionContext) -> Self {
        Self {
            total: documents.len(),
            pending_review: documents.iter().filter(|d| d.status.is_pending()).count(),
            effective: documents
                .iter()
                .filter(|d| d.status == DocumentStatus::Effective)
                .count(),
            review_due: documents
                .iter()
                .filter(|d| d.is_review_due(ctx.today))
                .count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventMetrics {
    pub total: usize,
    pub open: usize,
    pub overdue: usize,
    pub closed: usize,
}

impl EventMetrics {
    pub fn collect(events: &[QualityEvent], ctx: &SessionContext) -> Self {
        Self {
            total: events.len(),
            open: events
                .iter()
                .filter(|e| e.status == EventStatus::Open)
                .count(),
            overdue: count_overdue(events, ctx.today),
            closed: events
                .iter()
                .filter(|e| e.status == EventStatus::Closed)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapaMetrics {
    pub total: usize,
    /// Investigation, action plan or implementation
    pub active: usize,
    pub overdue: usize,
    pub closed: usize,
}

impl CapaMetrics {
    pub fn collect(capas: &[Capa], ctx: &SessionContext) -> Self {
        Self {
            total: capas.len(),
            active: capas.iter().filter(|c| c.status.is_active()).count(),
            overdue: count_overdue(capas, ctx.today),
            closed: capas
                .iter()
                .filter(|c| c.status == CapaStatus::Closed)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChangeMetrics {
    pub total: usize,
    pub pending_approval: usize,
    pub overdue: usize,
    pub implemented: usize,
}

impl ChangeMetrics {
    pub fn collect(changes: &[ChangeControl], ctx: &SessionContext) -> Self {
        Self {
            total: changes.len(),
            pending_approval: changes
                .iter()
                .filter(|c| c.status == ChangeStatus::PendingApproval)
                .count(),
            overdue: changes.iter().filter(|c| is_overdue(*c, ctx.today)).count(),
            implemented: changes
                .iter()
                .filter(|c| c.status == ChangeStatus::Implemented)
                .count(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserMetrics {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    /// Logged in within the last 24 hours
    pub recent_logins: usize,
}

impl UserMetrics {
    pub fn collect(users: &[UserProfile], ctx: &SessionContext) -> Self {
        let active = users.iter().filter(|u| u.is_active).count();
        Self {
            total: users.len(),
            active,
            inactive: users.len() - active,
            recent_logins: users
                .iter()
                .filter(|u| u.logged_in_since(ctx.now))
                .count(),
        }
    }
}

/// All dashboard cards
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardMetrics {
    pub documents: DocumentMetrics,
    pub events: EventMetrics,
    pub capas: CapaMetrics,
    pub changes: ChangeMetrics,
    pub users: UserMetrics,
}

impl DashboardMetrics {
    pub fn collect(records: &RecordSet, ctx: &SessionContext) -> Self {
        Self {
            documents: DocumentMetrics::collect(&records.documents, ctx),
            events: EventMetrics::collect(&records.events, ctx),
            capas: CapaMetrics::collect(&records.capas, ctx),
            changes: ChangeMetrics::collect(&records.changes, ctx),
            users: UserMetrics::collect(&records.users, ctx),
        }
    }

    /// Open work that has passed its due date, across all types
    pub fn total_overdue(&self) -> usize {
        self.events.overdue + self.capas.overdue + self.changes.overdue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};

    fn ctx() -> SessionContext {
        SessionContext::fixed(Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap())
    }

    fn sample_records(ctx: &SessionContext) -> RecordSet {
        let created = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let past = NaiveDate::from_ymd_opt(2024, 1, 20);
        let future = NaiveDate::from_ymd_opt(2024, 3, 1);

        let doc = |status, review| {
            let mut d = Document::new(
                "Doc".to_string(),
                "SOP-001".to_string(),
                "SOP".to_string(),
                "Emily Davis".to_string(),
                created,
            );
            d.status = status;
            d.review_date = review;
            d
        };
        let event = |status, due| {
            let mut e = QualityEvent::new(
                "QE-2024-001".to_string(),
                "Event".to_string(),
                "Deviation".to_string(),
                "Lisa Brown".to_string(),
                created,
            );
            e.status = status;
            e.due_date = due;
            e
        };
        let capa = |status, due| {
            let mut c = Capa::new(
                "CAPA-2024-001".to_string(),
                "CAPA".to_string(),
                "user2".to_string(),
                "user1".to_string(),
                created,
            );
            c.status = status;
            c.due_date = due;
            c
        };
        let change = |status, due| {
            let mut c = ChangeControl::new(
                "CR-2024-001".to_string(),
                "Change".to_string(),
                "Process".to_string(),
                "Robert Taylor".to_string(),
                created,
            );
            c.status = status;
            c.due_date = due;
            c
        };
        let user = |active, last_login| {
            let mut u = UserProfile::new(
                "a@acme.com".to_string(),
                "A".to_string(),
                "B".to_string(),
                String::new(),
                created,
            );
            u.is_active = active;
            u.last_login = last_login;
            u
        };

        RecordSet {
            documents: vec![
                doc(DocumentStatus::Effective, past),
                doc(DocumentStatus::Effective, future),
                doc(DocumentStatus::PendingReview, None),
                doc(DocumentStatus::PendingApproval, past),
                doc(DocumentStatus::Draft, None),
            ],
            events: vec![
                event(EventStatus::Open, past),
                event(EventStatus::Open, future),
                event(EventStatus::UnderInvestigation, past),
                event(EventStatus::Closed, past),
            ],
            capas: vec![
                capa(CapaStatus::Investigation, past),
                capa(CapaStatus::ActionPlan, None),
                capa(CapaStatus::Implementation, future),
                capa(CapaStatus::EffectivenessCheck, past),
                capa(CapaStatus::Closed, past),
                capa(CapaStatus::Cancelled, None),
            ],
            changes: vec![
                change(ChangeStatus::PendingApproval, past),
                change(ChangeStatus::Implemented, future),
                change(ChangeStatus::Cancelled, past),
            ],
            users: vec![
                user(true, Some(ctx.now - Duration::hours(2))),
                user(true, Some(ctx.now - Duration::days(3))),
                user(false, None),
            ],
        }
    }

    #[test]
    fn test_dashboard_metrics() {
        let ctx = ctx();
        let metrics = DashboardMetrics::collect(&sample_records(&ctx), &ctx);

        insta::assert_yaml_snapshot!(metrics, @r###"
        documents:
          total: 5
          pending_review: 2
          effective: 2
          review_due: 1
        events:
          total: 4
          open: 2
          overdue: 2
          closed: 1
        capas:
          total: 6
          active: 3
          overdue: 2
          closed: 1
        changes:
          total: 3
          pending_approval: 1
          overdue: 1
          implemented: 1
        users:
          total: 3
          active: 2
          inactive: 1
          recent_logins: 1
        "###);

        assert_eq!(metrics.total_overdue(), 5);
    }

    #[test]
    fn test_empty_project_is_all_zero() {
        let metrics = DashboardMetrics::collect(&RecordSet::default(), &ctx());
        assert_eq!(metrics, DashboardMetrics::default());
    }
}
