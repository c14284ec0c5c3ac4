//! Overdue predicate for records that carry a due date

use chrono::NaiveDate;

/// A record with an optional due date and a terminal/non-terminal status
pub trait Deadline {
    fn due_date(&self) -> Option<NaiveDate>;

    /// Closed or cancelled
    fn is_terminal(&self) -> bool;
}

/// Due date strictly before `today` while the record is still open.
///
/// `today` is always supplied by the caller; the predicate never reads the
/// clock.
pub fn is_overdue<T: Deadline + ?Sized>(record: &T, today: NaiveDate) -> bool {
    match record.due_date() {
        Some(due) => due < today && !record.is_terminal(),
        None => false,
    }
}

/// Number of overdue records in a slice
pub fn count_overdue<T: Deadline>(records: &[T], today: NaiveDate) -> usize {
    records.iter().filter(|r| is_overdue(*r, today)).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::capa::{Capa, CapaStatus};
    use crate::entities::change::{ChangeControl, ChangeStatus};
    use crate::entities::event::{EventStatus, QualityEvent};
    use chrono::{Duration, TimeZone, Utc};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn capa(status: CapaStatus, due: Option<NaiveDate>) -> Capa {
        let mut capa = Capa::new(
            "CAPA-2024-001".to_string(),
            "Improve Temperature Monitoring System".to_string(),
            "user2".to_string(),
            "user1".to_string(),
            Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap(),
        );
        capa.status = status;
        capa.due_date = due;
        capa
    }

    #[test]
    fn test_due_yesterday_and_open_is_overdue() {
        let yesterday = today() - Duration::days(1);
        assert!(is_overdue(
            &capa(CapaStatus::Investigation, Some(yesterday)),
            today()
        ));
    }

    #[test]
    fn test_closed_is_never_overdue() {
        let yesterday = today() - Duration::days(1);
        assert!(!is_overdue(&capa(CapaStatus::Closed, Some(yesterday)), today()));
        assert!(!is_overdue(
            &capa(CapaStatus::Cancelled, Some(yesterday)),
            today()
        ));
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        assert!(!is_overdue(&capa(CapaStatus::Draft, Some(today())), today()));
    }

    #[test]
    fn test_no_due_date_is_not_overdue() {
        assert!(!is_overdue(&capa(CapaStatus::Draft, None), today()));
    }

    #[test]
    fn test_applies_to_events_and_changes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        let last_week = today() - Duration::days(7);

        let mut event = QualityEvent::new(
            "QE-2024-001".to_string(),
            "Temperature Deviation in Storage Room A".to_string(),
            "Deviation".to_string(),
            "Lisa Brown".to_string(),
            now,
        );
        event.due_date = Some(last_week);
        assert!(is_overdue(&event, today()));
        event.status = EventStatus::Closed;
        assert!(!is_overdue(&event, today()));

        let mut change = ChangeControl::new(
            "CR-2024-001".to_string(),
            "Update Cleaning Procedure".to_string(),
            "Process".to_string(),
            "Robert Taylor".to_string(),
            now,
        );
        change.due_date = Some(last_week);
        change.status = ChangeStatus::Implemented;
        assert!(is_overdue(&change, today()));
    }

    #[test]
    fn test_count_overdue() {
        let yesterday = today() - Duration::days(1);
        let records = vec![
            capa(CapaStatus::ActionPlan, Some(yesterday)),
            capa(CapaStatus::Closed, Some(yesterday)),
            capa(CapaStatus::Draft, None),
            capa(CapaStatus::Implementation, Some(yesterday)),
        ];
        assert_eq!(count_overdue(&records, today()), 2);
    }
}
