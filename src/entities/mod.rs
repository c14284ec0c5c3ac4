//! Entity type definitions
//!
//! QMS records, one YAML file each:
//!
//! - [`Document`] - Controlled documents with lifecycle status and periodic review
//! - [`QualityEvent`] - Deviations, non-conformances and complaints
//! - [`Capa`] - Corrective and preventive actions
//! - [`ChangeControl`] - Change requests and their approval state
//! - [`UserProfile`] - People in the organization and their role tags
//!
//! The single [`Organization`] record lives in the project's `.qms/` directory.

pub mod capa;
pub mod change;
pub mod document;
pub mod event;
pub mod user;

pub use capa::{Capa, CapaStatus};
pub use change::{ChangeControl, ChangeStatus};
pub use document::{Document, DocumentStatus};
pub use event::{EventStatus, QualityEvent, Severity};
pub use user::{Organization, Role, UserProfile, UserState};
