//! Entity trait - common interface for all record types

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};

/// Common trait for all QMS records stored in a project
pub trait Entity: Serialize + DeserializeOwned {
    /// The record type prefix
    const PREFIX: EntityPrefix;

    /// Get the record's unique ID
    fn id(&self) -> &EntityId;

    /// Get the record's title (display name for users)
    fn title(&self) -> &str;

    /// Human record number (e.g. "CAPA-2024-001"), if the type has one
    fn number(&self) -> Option<&str>;

    /// Status key as stored in the record file
    fn status_key(&self) -> &'static str;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Who created, reported or requested the record
    fn author(&self) -> &str;
}

/// An enum value string that is not part of its closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}' (valid: {expected})")]
pub struct ParseValueError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

impl ParseValueError {
    pub fn new<'a>(
        kind: &'static str,
        value: &str,
        expected: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.into_iter().collect::<Vec<_>>().join(", "),
        }
    }
}

/// Normalize user input before matching it against enum keys
pub(crate) fn normalize_key(s: &str) -> String {
    s.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Declares a closed, string-keyed enum with `as_str`, `ALL`, `Display`,
/// `FromStr` and snake_case serde names.
///
/// The key string of each variant must equal its snake_case serde name.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $key:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every value, in lifecycle order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $key),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::core::entity::ParseValueError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let key = $crate::core::entity::normalize_key(s);
                $name::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == key)
                    .ok_or_else(|| {
                        $crate::core::entity::ParseValueError::new(
                            $kind,
                            s,
                            $name::ALL.iter().map(|v| v.as_str()),
                        )
                    })
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Priority shared by CAPAs and change controls
    #[derive(Default)]
    pub enum Priority ("priority") {
        Low => "low",
        #[default]
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

string_enum! {
    /// The kinds of record the dashboard can list and search
    pub enum RecordKind ("record type") {
        Document => "document",
        Event => "event",
        Capa => "capa",
        Change => "change",
        User => "user",
    }
}

impl RecordKind {
    pub fn prefix(&self) -> EntityPrefix {
        match self {
            RecordKind::Document => EntityPrefix::Doc,
            RecordKind::Event => EntityPrefix::Qe,
            RecordKind::Capa => EntityPrefix::Capa,
            RecordKind::Change => EntityPrefix::Cr,
            RecordKind::User => EntityPrefix::Usr,
        }
    }
}

impl From<EntityPrefix> for RecordKind {
    fn from(prefix: EntityPrefix) -> Self {
        match prefix {
            EntityPrefix::Doc => RecordKind::Document,
            EntityPrefix::Qe => RecordKind::Event,
            EntityPrefix::Capa => RecordKind::Capa,
            EntityPrefix::Cr => RecordKind::Change,
            EntityPrefix::Usr => RecordKind::User,
        }
    }
}
