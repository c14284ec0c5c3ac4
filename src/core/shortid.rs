//! Short ID system for easier record selection
//!
//! Numeric aliases like `@1`, `@2` map to full record IDs. The index is
//! rewritten every time a list or search is printed, so `@N` always refers to
//! row N of the most recent listing.

use std::collections::{BTreeMap, HashMap};
use std::fs;

use crate::core::project::Project;

/// Index file name within the project's `.qms/` directory
const INDEX_FILE: &str = "shortids.json";

/// A mapping of short IDs (@N) to full record IDs
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ShortIdIndex {
    /// Maps short number to full record ID string
    entries: BTreeMap<u32, String>,
    /// Maps full record ID to short number (reverse lookup)
    #[serde(skip)]
    reverse: HashMap<String, u32>,
    /// Next available short ID
    next_id: u32,
}

impl ShortIdIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            reverse: HashMap::new(),
            next_id: 1,
        }
    }

    /// Load the index from a project, or create empty if not found
    pub fn load(project: &Project) -> Self {
        let path = project.qms_dir().join(INDEX_FILE);
        let Ok(content) = fs::read_to_string(&path) else {
            return Self::new();
        };

        match serde_json::from_str::<ShortIdIndex>(&content) {
            Ok(mut index) => {
                index.reverse = index
                    .entries
                    .iter()
                    .map(|(k, v)| (v.clone(), *k))
                    .collect();
                index
            }
            Err(e) => {
                tracing::debug!(error = %e, "discarding unreadable short id index");
                Self::new()
            }
        }
    }

    /// Save the index to a project
    pub fn save(&self, project: &Project) -> std::io::Result<()> {
        let path = project.qms_dir().join(INDEX_FILE);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
    }

    /// Clear and rebuild the index with new record IDs
    pub fn rebuild(&mut self, ids: impl IntoIterator<Item = String>) {
        self.entries.clear();
        self.reverse.clear();
        self.next_id = 1;

        for id in ids {
            self.add(id);
        }
    }

    /// Add a record ID and return its short ID
    pub fn add(&mut self, id: String) -> u32 {
        if let Some(&short_id) = self.reverse.get(&id) {
            return short_id;
        }

        let short_id = self.next_id;
        self.next_id += 1;
        self.entries.insert(short_id, id.clone());
        self.reverse.insert(id, short_id);
        short_id
    }

    /// Resolve a short ID reference to a full record ID
    ///
    /// Accepts `@N` or a plain number. Anything else is not a short ID and
    /// gives `None`, as does a number that is not in the index.
    pub fn resolve(&self, reference: &str) -> Option<String> {
        let digits = short_id_digits(reference)?;
        digits
            .parse::<u32>()
            .ok()
            .and_then(|n| self.entries.get(&n).cloned())
    }

    /// Get the short ID for a full record ID
    pub fn get_short_id(&self, id: &str) -> Option<u32> {
        self.reverse.get(id).copied()
    }

    /// `@N` label for a record ID, empty if it has none
    pub fn label(&self, id: &str) -> String {
        self.get_short_id(id)
            .map(|n| format!("@{}", n))
            .unwrap_or_default()
    }

    /// Number of entries in the index
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The digits of a short-id shaped reference (`@N` or `N`)
pub fn short_id_digits(reference: &str) -> Option<&str> {
    let reference = reference.trim();
    let digits = reference.strip_prefix('@').unwrap_or(reference);
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}
