//! Filter, sort and rank records for cross-type search
//!
//! Every record type is first projected into a [`SearchResult`]. The engine
//! then runs four steps over that flat list:
//!
//! 1. keep records matching the kind and status filters
//! 2. if the query text is non-blank, keep records whose title, description,
//!    number or author contain it (case-insensitive)
//! 3. score each survivor ([`relevance_score`])
//! 4. order by the requested [`SortKey`]
//!
//! Every ordering ends with the record id, so identical input always yields
//! identical output.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

use crate::core::entity::{
    normalize_key, string_enum, Entity, ParseValueError, Priority, RecordKind,
};
use crate::entities::{
    Capa, CapaStatus, ChangeControl, ChangeStatus, Document, DocumentStatus, EventStatus,
    QualityEvent, UserProfile, UserState,
};

/// Bonus when the title contains the query
pub const TITLE_WEIGHT: u32 = 10;
/// Bonus when the record number contains the query
pub const NUMBER_WEIGHT: u32 = 8;
/// Bonus when the description contains the query
pub const DESCRIPTION_WEIGHT: u32 = 5;
/// Bonus when the author contains the query
pub const AUTHOR_WEIGHT: u32 = 3;

/// Flat, type-independent view of one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub id: String,
    pub kind: RecordKind,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Where the record lives, relative to the project root
    pub target: String,
}

impl SearchResult {
    fn from_entity<E: Entity>(
        entity: &E,
        description: String,
        priority: Option<Priority>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        let id = entity.id().to_string();
        Self {
            target: format!("{}/{}.qms.yaml", E::PREFIX.directory(), id),
            id,
            kind: RecordKind::from(E::PREFIX),
            title: entity.title().to_string(),
            description,
            number: entity.number().map(str::to_string),
            status: Some(entity.status_key().to_string()),
            priority,
            created_by: Some(entity.author().to_string()),
            created_at: entity.created_at(),
            updated_at,
        }
    }

    /// Replace the navigation target (e.g. with the path the record was loaded from)
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }
}

impl From<&Document> for SearchResult {
    fn from(doc: &Document) -> Self {
        SearchResult::from_entity(doc, doc.summary(), None, doc.updated_at)
    }
}

impl From<&QualityEvent> for SearchResult {
    fn from(event: &QualityEvent) -> Self {
        SearchResult::from_entity(
            event,
            event.description.clone(),
            Some(event.severity.into()),
            event.updated_at,
        )
    }
}

impl From<&Capa> for SearchResult {
    fn from(capa: &Capa) -> Self {
        SearchResult::from_entity(
            capa,
            capa.description.clone(),
            Some(capa.priority),
            capa.updated_at,
        )
    }
}

impl From<&ChangeControl> for SearchResult {
    fn from(change: &ChangeControl) -> Self {
        SearchResult::from_entity(
            change,
            change.description.clone(),
            Some(change.priority),
            change.updated_at,
        )
    }
}

impl From<&UserProfile> for SearchResult {
    fn from(user: &UserProfile) -> Self {
        let mut result =
            SearchResult::from_entity(user, user.position(), None, user.updated_at);
        result.title = user.display_name();
        result
    }
}

/// Restrict results to one record kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KindFilter {
    #[default]
    All,
    Only(RecordKind),
}

impl KindFilter {
    pub fn matches(&self, kind: RecordKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Only(k) => *k == kind,
        }
    }
}

impl FromStr for KindFilter {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if normalize_key(s) == "all" {
            return Ok(KindFilter::All);
        }
        s.parse::<RecordKind>().map(KindFilter::Only).map_err(|_| {
            ParseValueError::new(
                "record type",
                s,
                std::iter::once("all").chain(RecordKind::ALL.iter().map(|k| k.as_str())),
            )
        })
    }
}

/// Restrict results to one status key
///
/// Any status key of any record type is accepted, so `approved` matches both
/// documents and change controls. Records without a status never match a
/// specific status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(String),
}

impl StatusFilter {
    pub fn matches(&self, status: Option<&str>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => status == Some(wanted.as_str()),
        }
    }
}

/// Every status key used by any record type, sorted
pub fn known_status_keys() -> BTreeSet<&'static str> {
    DocumentStatus::ALL
        .iter()
        .map(|s| s.as_str())
        .chain(EventStatus::ALL.iter().map(|s| s.as_str()))
        .chain(CapaStatus::ALL.iter().map(|s| s.as_str()))
        .chain(ChangeStatus::ALL.iter().map(|s| s.as_str()))
        .chain(UserState::ALL.iter().map(|s| s.as_str()))
        .collect()
}

impl FromStr for StatusFilter {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = normalize_key(s);
        if key == "all" {
            return Ok(StatusFilter::All);
        }
        let known = known_status_keys();
        if known.contains(key.as_str()) {
            Ok(StatusFilter::Only(key))
        } else {
            Err(ParseValueError::new(
                "status",
                s,
                std::iter::once("all").chain(known),
            ))
        }
    }
}

string_enum! {
    /// Result ordering
    #[derive(Default)]
    pub enum SortKey ("sort key") {
        #[default]
        Relevance => "relevance",
        DateAsc => "date_asc",
        DateDesc => "date_desc",
        TitleAsc => "title_asc",
        TitleDesc => "title_desc",
    }
}

/// Everything the engine needs besides the records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    pub text: String,
    pub kind: KindFilter,
    pub status: StatusFilter,
    pub sort: SortKey,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Lower-cased query text, or `None` when it is blank. Surrounding
    /// whitespace is part of the needle.
    fn needle(&self) -> Option<String> {
        needle(&self.text)
    }
}

fn needle(text: &str) -> Option<String> {
    (!text.trim().is_empty()).then(|| text.to_lowercase())
}

/// A result with its relevance score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scored {
    pub score: u32,
    #[serde(flatten)]
    pub result: SearchResult,
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn matches_text(record: &SearchResult, needle: &str) -> bool {
    contains(&record.title, needle)
        || contains(&record.description, needle)
        || record.number.as_deref().is_some_and(|n| contains(n, needle))
        || record.created_by.as_deref().is_some_and(|a| contains(a, needle))
}

/// Additive relevance of a record for `query`; 0 for a blank query.
pub fn relevance_score(record: &SearchResult, query: &str) -> u32 {
    let Some(needle) = needle(query) else {
        return 0;
    };

    let mut score = 0;
    if contains(&record.title, &needle) {
        score += TITLE_WEIGHT;
    }
    if record.number.as_deref().is_some_and(|n| contains(n, &needle)) {
        score += NUMBER_WEIGHT;
    }
    if contains(&record.description, &needle) {
        score += DESCRIPTION_WEIGHT;
    }
    if record.created_by.as_deref().is_some_and(|a| contains(a, &needle)) {
        score += AUTHOR_WEIGHT;
    }
    score
}

/// Filter, score and order records, keeping the scores.
pub fn rank_scored(records: &[SearchResult], query: &SearchQuery) -> Vec<Scored> {
    let needle = query.needle();

    let mut scored: Vec<Scored> = records
        .iter()
        .filter(|r| query.kind.matches(r.kind))
        .filter(|r| query.status.matches(r.status.as_deref()))
        .filter(|r| needle.as_deref().map_or(true, |n| matches_text(r, n)))
        .map(|r| Scored {
            score: relevance_score(r, &query.text),
            result: r.clone(),
        })
        .collect();

    scored.sort_by(|a, b| {
        let (x, y) = (&a.result, &b.result);
        let primary = match query.sort {
            SortKey::Relevance => b.score.cmp(&a.score),
            SortKey::DateAsc => x.created_at.cmp(&y.created_at),
            SortKey::DateDesc => y.created_at.cmp(&x.created_at),
            SortKey::TitleAsc => compare_titles(&x.title, &y.title),
            SortKey::TitleDesc => compare_titles(&y.title, &x.title),
        };
        primary.then_with(|| x.id.cmp(&y.id))
    });

    tracing::debug!(
        total = records.len(),
        matched = scored.len(),
        sort = %query.sort,
        "ranked search results"
    );

    scored
}

/// Filter, score and order records.
pub fn rank(records: &[SearchResult], query: &SearchQuery) -> Vec<SearchResult> {
    rank_scored(records, query)
        .into_iter()
        .map(|s| s.result)
        .collect()
}

fn compare_titles(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// A `type:` or `status:` token that could not be used
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("invalid type filter: {0}")]
    Kind(#[source] ParseValueError),

    #[error("invalid status filter: {0}")]
    Status(#[source] ParseValueError),

    #[error("'{0}:' needs a value")]
    MissingValue(&'static str),

    #[error("'{0}:' given more than once")]
    Repeated(&'static str),
}

/// Split `type:<kind>` and `status:<status>` tokens out of a raw query.
///
/// Everything else is kept as typed, spacing included; each filter token
/// goes with the whitespace that follows it (or precedes it, at the end).
/// Sorting is left at its default.
pub fn parse_query(raw: &str) -> Result<SearchQuery, QueryError> {
    let mut query = SearchQuery::default();
    let mut kind_seen = false;
    let mut status_seen = false;
    let mut pieces: Vec<Option<&str>> = whitespace_runs(raw).into_iter().map(Some).collect();

    for i in 0..pieces.len() {
        let Some(token) = pieces[i] else { continue };
        if token.starts_with(char::is_whitespace) {
            continue;
        }
        let Some((key, value)) = token.split_once(':') else {
            continue;
        };

        match key.to_ascii_lowercase().as_str() {
            "type" => {
                if kind_seen {
                    return Err(QueryError::Repeated("type"));
                }
                if value.is_empty() {
                    return Err(QueryError::MissingValue("type"));
                }
                query.kind = value.parse().map_err(QueryError::Kind)?;
                kind_seen = true;
            }
            "status" => {
                if status_seen {
                    return Err(QueryError::Repeated("status"));
                }
                if value.is_empty() {
                    return Err(QueryError::MissingValue("status"));
                }
                query.status = value.parse().map_err(QueryError::Status)?;
                status_seen = true;
            }
            // Record numbers and URLs contain colons too
            _ => continue,
        }

        pieces[i] = None;
        if i + 1 < pieces.len() {
            pieces[i + 1] = None;
        } else if i > 0 {
            pieces[i - 1] = None;
        }
    }

    query.text = pieces.into_iter().flatten().collect();
    Ok(query)
}

/// Split `raw` into alternating runs of whitespace and non-whitespace
fn whitespace_runs(raw: &str) -> Vec<&str> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut in_space = None;
    for (i, c) in raw.char_indices() {
        let space = c.is_whitespace();
        if in_space.is_some_and(|s| s != space) {
            runs.push(&raw[start..i]);
            start = i;
        }
        in_space = Some(space);
    }
    if start < raw.len() {
        runs.push(&raw[start..]);
    }
    runs
}
