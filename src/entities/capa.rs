//! CAPA entity type - Corrective and Preventive Actions

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{string_enum, Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::overdue::Deadline;

string_enum! {
    /// CAPA workflow status
    #[derive(Default)]
    pub enum CapaStatus ("CAPA status") {
        #[default]
        Draft => "draft",
        Investigation => "investigation",
        ActionPlan => "action_plan",
        Implementation => "implementation",
        EffectivenessCheck => "effectiveness_check",
        Closed => "closed",
        Cancelled => "cancelled",
    }
}

impl CapaStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CapaStatus::Closed | CapaStatus::Cancelled)
    }

    /// Work is under way (investigating, planning or implementing)
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            CapaStatus::Investigation | CapaStatus::ActionPlan | CapaStatus::Implementation
        )
    }
}

/// A CAPA record
///
/// `source_type`/`source_id` point back at whatever raised the CAPA (usually
/// a quality event number). The reference is by identifier only and is never
/// resolved or checked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capa {
    /// Unique identifier
    pub id: EntityId,

    /// CAPA number (e.g., "CAPA-2024-001")
    pub capa_number: String,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// What raised this CAPA (e.g., "Quality Event", "Audit")
    #[serde(default)]
    pub source_type: String,

    /// Identifier of the originating record (e.g., "QE-2024-001")
    #[serde(default)]
    pub source_id: String,

    #[serde(default)]
    pub status: CapaStatus,

    #[serde(default)]
    pub priority: Priority,

    pub assigned_to: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<NaiveDate>,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Capa {
    const PREFIX: EntityPrefix = EntityPrefix::Capa;

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn number(&self) -> Option<&str> {
        Some(&self.capa_number)
    }

    fn status_key(&self) -> &'static str {
        self.status.as_str()
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn author(&self) -> &str {
        &self.created_by
    }
}

impl Deadline for Capa {
    fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Capa {
    /// Create a new draft CAPA
    pub fn new(
        capa_number: String,
        title: String,
        assigned_to: String,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Capa),
            capa_number,
            title,
            description: String::new(),
            source_type: String::new(),
            source_id: String::new(),
            status: CapaStatus::default(),
            priority: Priority::default(),
            assigned_to,
            due_date: None,
            completed_date: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Human-readable source reference, if one was recorded
    pub fn source(&self) -> Option<String> {
        match (self.source_type.trim(), self.source_id.trim()) {
            ("", "") => None,
            (kind, "") => Some(kind.to_string()),
            ("", id) => Some(id.to_string()),
            (kind, id) => Some(format!("{} {}", kind, id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Capa {
        Capa::new(
            "CAPA-2024-001".to_string(),
            "Improve Temperature Monitoring System".to_string(),
            "user2".to_string(),
            "user1".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_capa_creation() {
        let capa = sample();
        assert!(capa.id.to_string().starts_with("CAPA-"));
        assert_eq!(capa.title, "Improve Temperature Monitoring System");
        assert_eq!(capa.status, CapaStatus::Draft);
        assert_eq!(capa.priority, Priority::Medium);
    }

    #[test]
    fn test_capa_roundtrip() {
        let mut capa = sample();
        capa.status = CapaStatus::EffectivenessCheck;
        capa.source_type = "Quality Event".to_string();
        capa.source_id = "QE-2024-001".to_string();

        let yaml = serde_yml::to_string(&capa).unwrap();
        assert!(yaml.contains("status: effectiveness_check"));
        let parsed: Capa = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(capa.id, parsed.id);
        assert_eq!(parsed.status, CapaStatus::EffectivenessCheck);
        assert_eq!(parsed.source_id, "QE-2024-001");
    }

    #[test]
    fn test_entity_trait_implementation() {
        let capa = sample();
        assert_eq!(Capa::PREFIX, EntityPrefix::Capa);
        assert_eq!(capa.status_key(), "draft");
        assert_eq!(capa.author(), "user1");
        assert_eq!(capa.number(), Some("CAPA-2024-001"));
    }

    #[test]
    fn test_active_statuses() {
        let active: Vec<_> = CapaStatus::ALL.iter().filter(|s| s.is_active()).collect();
        assert_eq!(
            active,
            vec![
                &CapaStatus::Investigation,
                &CapaStatus::ActionPlan,
                &CapaStatus::Implementation
            ]
        );
    }

    #[test]
    fn test_source_display() {
        let mut capa = sample();
        assert_eq!(capa.source(), None);
        capa.source_type = "Quality Event".to_string();
        capa.source_id = "QE-2024-001".to_string();
        assert_eq!(capa.source().as_deref(), Some("Quality Event QE-2024-001"));
    }
}
