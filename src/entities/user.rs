//! User profiles, roles and the owning organization

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::core::entity::{string_enum, Entity};
use crate::core::identity::{EntityId, EntityPrefix};

string_enum! {
    /// Role tags attached to a user profile
    ///
    /// Roles are a flat set of tags; no hierarchy between them is enforced.
    #[derive(Default)]
    pub enum Role ("role") {
        OrganizationAdmin => "organization_admin",
        QualityManager => "quality_manager",
        QaReviewer => "qa_reviewer",
        DocumentController => "document_controller",
        CapaOwner => "capa_owner",
        DepartmentHead => "department_head",
        #[default]
        GeneralUser => "general_user",
    }
}

string_enum! {
    /// Whether a profile can sign in
    #[derive(Default)]
    pub enum UserState ("user state") {
        #[default]
        Active => "active",
        Inactive => "inactive",
    }
}

/// A user profile within the organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: EntityId,

    pub email: String,

    pub first_name: String,

    pub last_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_login: Option<DateTime<Utc>>,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default)]
    pub roles: BTreeSet<Role>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Entity for UserProfile {
    const PREFIX: EntityPrefix = EntityPrefix::Usr;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.email
    }

    fn number(&self) -> Option<&str> {
        None
    }

    fn status_key(&self) -> &'static str {
        self.state().as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> &str {
        "System"
    }
}

impl UserProfile {
    /// Create a new active profile with the general user role
    pub fn new(
        email: String,
        first_name: String,
        last_name: String,
        organization_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Usr),
            email,
            first_name,
            last_name,
            job_title: None,
            department: None,
            phone: None,
            avatar_url: None,
            is_active: true,
            last_login: None,
            organization_id,
            roles: BTreeSet::from([Role::GeneralUser]),
            created_at: now,
            updated_at: now,
        }
    }

    /// "First Last", or the email when both names are blank
    pub fn display_name(&self) -> String {
        let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let name = name.trim();
        if name.is_empty() {
            self.email.clone()
        } else {
            name.to_string()
        }
    }

    /// Upper-case initials of first and last name
    pub fn initials(&self) -> String {
        [&self.first_name, &self.last_name]
            .iter()
            .filter_map(|n| n.trim().chars().next())
            .flat_map(char::to_uppercase)
            .collect()
    }

    pub fn state(&self) -> UserState {
        if self.is_active {
            UserState::Active
        } else {
            UserState::Inactive
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// "job_title - department" with missing parts left out
    pub fn position(&self) -> String {
        [self.job_title.as_deref(), self.department.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" - ")
    }

    /// Logged in at some point in the 24 hours before `now`
    pub fn logged_in_since(&self, now: DateTime<Utc>) -> bool {
        self.last_login
            .is_some_and(|t| t <= now && now - t <= chrono::Duration::hours(24))
    }
}

/// The organization that owns every record in a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,

    pub name: String,

    pub slug: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,

    /// Free-form settings, never interpreted
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub settings: BTreeMap<String, serde_yml::Value>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Organization {
    pub fn new(name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            slug: slugify(name),
            logo_url: None,
            settings: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Load from a YAML file, `None` if it is missing or unreadable
    pub fn load_from_path(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let contents = std::fs::read_to_string(path).ok()?;
        match serde_yml::from_str(&contents) {
            Ok(org) => Some(org),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable organization file");
                None
            }
        }
    }

    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        let contents = serde_yml::to_string(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, contents)
    }
}

/// Lower-case, dash-separated form of a name
pub fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
