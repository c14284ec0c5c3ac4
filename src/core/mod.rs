//! Core module - record model, engine and project store

pub mod classify;
pub mod config;
pub mod context;
pub mod entity;
pub mod identity;
pub mod loader;
pub mod metrics;
pub mod numbering;
pub mod overdue;
pub mod project;
pub mod search;
pub mod shortid;

pub use classify::{classify, Badge, BadgeKind, Badged, Classified, Tone};
pub use config::Config;
pub use context::SessionContext;
pub use entity::{Entity, ParseValueError, Priority, RecordKind};
pub use identity::{EntityId, EntityPrefix, IdParseError};
pub use loader::{RecordSet, StoreError};
pub use metrics::DashboardMetrics;
pub use overdue::{is_overdue, Deadline};
pub use project::{Project, ProjectError};
pub use search::{
    parse_query, rank, relevance_score, KindFilter, QueryError, SearchQuery, SearchResult,
    SortKey, StatusFilter,
};
pub use shortid::ShortIdIndex;
