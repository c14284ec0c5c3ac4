//! Who is acting, and when
//!
//! Built once per command and passed to whatever needs the current user,
//! the organization or the date. Nothing reads the clock on its own.

use chrono::{DateTime, Local, NaiveDate, Utc};

use crate::entities::{Organization, UserProfile};

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub organization: Option<Organization>,
    pub user: Option<UserProfile>,
    /// Local calendar date used for due-date comparisons
    pub today: NaiveDate,
    pub now: DateTime<Utc>,
}

impl SessionContext {
    /// Context stamped with the current time
    pub fn new(organization: Option<Organization>, user: Option<UserProfile>) -> Self {
        let now = Utc::now();
        Self {
            organization,
            user,
            today: now.with_timezone(&Local).date_naive(),
            now,
        }
    }

    /// Context pinned to a given instant, for tests and reproducible reports
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self {
            organization: None,
            user: None,
            today: now.date_naive(),
            now,
        }
    }

    /// Name to record as author on new records
    ///
    /// The signed-in profile wins; otherwise the configured author.
    pub fn author_or(&self, fallback: &str) -> String {
        match &self.user {
            Some(user) => user.display_name(),
            None => fallback.to_string(),
        }
    }

    /// Organization id new profiles are attached to
    pub fn organization_id(&self) -> String {
        self.organization
            .as_ref()
            .map(|o| o.id.clone())
            .unwrap_or_default()
    }
}
