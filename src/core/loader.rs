//! Reading and writing record files
//!
//! Each record is one `<ID>.qms.yaml` file under its type's directory. List
//! views tolerate broken files (they are logged and skipped); commands that
//! address a single record report them as errors.

use miette::Diagnostic;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::entity::{Entity, RecordKind};
use crate::core::project::Project;
use crate::core::search::SearchResult;
use crate::core::shortid::{short_id_digits, ShortIdIndex};
use crate::entities::{Capa, ChangeControl, Document, QualityEvent, UserProfile};
use crate::yaml::{parse_yaml, YamlSyntaxError};

/// Errors reading or writing records
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("document number '{number}' is already used by {existing}")]
    #[diagnostic(
        code(qms::store::duplicate_number),
        help("document numbers are unique within the organization; pick another --number")
    )]
    DuplicateDocumentNumber { number: String, existing: String },

    #[error("no {kind} matches '{reference}'")]
    #[diagnostic(code(qms::store::not_found))]
    NotFound {
        kind: RecordKind,
        reference: String,
    },

    #[error("short ID '{reference}' is not in the current {kind} listing")]
    #[diagnostic(
        code(qms::store::unknown_short_id),
        help("short IDs come from the last list or search; run it again, or use the record number")
    )]
    UnknownShortId {
        kind: RecordKind,
        reference: String,
    },

    #[error("'{reference}' matches more than one {kind}: {candidates}")]
    #[diagnostic(
        code(qms::store::ambiguous),
        help("use more characters of the id, or the full record number")
    )]
    Ambiguous {
        kind: RecordKind,
        reference: String,
        candidates: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("cannot access {}: {source}", path.display())]
    #[diagnostic(code(qms::store::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize record: {0}")]
    Serialize(String),
}

/// A record together with the file it came from
#[derive(Debug)]
pub struct Loaded<T> {
    pub path: PathBuf,
    pub record: T,
}

/// Read and parse one record file
pub fn load_file<T: Entity>(path: &Path) -> Result<T, StoreError> {
    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_yaml(&content, &path.display().to_string())?)
}

/// Load every record of type `T`, in file-name order
///
/// Files that cannot be read or parsed are skipped with a warning.
pub fn load_all<T: Entity>(project: &Project) -> Vec<Loaded<T>> {
    let mut loaded = Vec::new();

    for path in project.iter_entity_files(T::PREFIX) {
        match load_file::<T>(&path) {
            Ok(record) => loaded.push(Loaded { path, record }),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable record");
            }
        }
    }

    tracing::debug!(kind = %RecordKind::from(T::PREFIX), count = loaded.len(), "loaded records");
    loaded
}

/// Find a single record of type `T` by reference
///
/// The reference may be a short ID (`@N` or `N`), a full ID, a record number
/// (case-insensitive) or a unique fragment of an ID.
pub fn find<T: Entity>(
    project: &Project,
    reference: &str,
    short_ids: &ShortIdIndex,
) -> Result<Loaded<T>, StoreError> {
    let kind = RecordKind::from(T::PREFIX);
    let wanted = short_ids
        .resolve(reference)
        .unwrap_or_else(|| reference.trim().to_string());
    let mut records = load_all::<T>(project);

    let exact = records
        .iter()
        .position(|l| l.record.id().to_string().eq_ignore_ascii_case(&wanted))
        .or_else(|| {
            records.iter().position(|l| {
                l.record
                    .number()
                    .is_some_and(|n| n.eq_ignore_ascii_case(&wanted))
            })
        });
    if let Some(i) = exact {
        return Ok(records.swap_remove(i));
    }
    if short_id_digits(reference).is_some() && short_ids.resolve(reference).is_none() {
        return Err(StoreError::UnknownShortId {
            kind,
            reference: reference.trim().to_string(),
        });
    }

    let fragment = wanted.to_ascii_uppercase();
    let partial: Vec<usize> = records
        .iter()
        .enumerate()
        .filter(|(_, l)| !fragment.is_empty() && l.record.id().to_string().contains(&fragment))
        .map(|(i, _)| i)
        .collect();

    match partial.as_slice() {
        [one] => Ok(records.swap_remove(*one)),
        [] => Err(StoreError::NotFound {
            kind,
            reference: reference.to_string(),
        }),
        many => Err(StoreError::Ambiguous {
            kind,
            reference: reference.to_string(),
            candidates: many
                .iter()
                .map(|&i| records[i].record.id().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

/// Write a new record file and return its path
pub fn save<T: Entity>(project: &Project, record: &T) -> Result<PathBuf, StoreError> {
    let path = project.entity_path(record.id());
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(|source| StoreError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let yaml = serde_yml::to_string(record).map_err(|e| StoreError::Serialize(e.to_string()))?;
    fs::write(&path, yaml).map_err(|source| StoreError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "wrote record");
    Ok(path)
}

/// Reject a document number that another document already uses
pub fn ensure_unique_document_number(
    documents: &[Loaded<Document>],
    number: &str,
) -> Result<(), StoreError> {
    match documents
        .iter()
        .find(|d| d.record.document_number.trim().eq_ignore_ascii_case(number.trim()))
    {
        Some(existing) => Err(StoreError::DuplicateDocumentNumber {
            number: number.to_string(),
            existing: existing.record.id.to_string(),
        }),
        None => Ok(()),
    }
}

/// Every record in a project, by type
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub documents: Vec<Document>,
    pub events: Vec<QualityEvent>,
    pub capas: Vec<Capa>,
    pub changes: Vec<ChangeControl>,
    pub users: Vec<UserProfile>,
}

impl RecordSet {
    pub fn load(project: &Project) -> Self {
        fn records<T: Entity>(project: &Project) -> Vec<T> {
            load_all::<T>(project).into_iter().map(|l| l.record).collect()
        }

        Self {
            documents: records(project),
            events: records(project),
            capas: records(project),
            changes: records(project),
            users: records(project),
        }
    }

    /// Project every record into the flat search shape
    pub fn search_results(&self) -> Vec<SearchResult> {
        let mut results = Vec::new();
        results.extend(self.documents.iter().map(SearchResult::from));
        results.extend(self.events.iter().map(SearchResult::from));
        results.extend(self.capas.iter().map(SearchResult::from));
        results.extend(self.changes.iter().map(SearchResult::from));
        results.extend(self.users.iter().map(SearchResult::from));
        results
    }
}

/// Search results with targets pointing at the files they were loaded from
pub fn load_search_results(project: &Project) -> Vec<SearchResult> {
    fn project_all<T: Entity>(project: &Project, out: &mut Vec<SearchResult>)
    where
        for<'a> SearchResult: From<&'a T>,
    {
        out.extend(load_all::<T>(project).iter().map(|l| {
            SearchResult::from(&l.record).with_target(project.relative_path(&l.path))
        }));
    }

    let mut results = Vec::new();
    project_all::<Document>(project, &mut results);
    project_all::<QualityEvent>(project, &mut results);
    project_all::<Capa>(project, &mut results);
    project_all::<ChangeControl>(project, &mut results);
    project_all::<UserProfile>(project, &mut results);
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::CapaStatus;
    use chrono::Utc;
    use tempfile::tempdir;

    fn capa(number: &str, title: &str) -> Capa {
        Capa::new(
            number.to_string(),
            title.to_string(),
            "user2".to_string(),
            "user1".to_string(),
            Utc::now(),
        )
    }

    #[test]
    fn test_load_all_empty_project() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(load_all::<Capa>(&project).is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        let mut record = capa("CAPA-2024-001", "Improve monitoring");
        record.status = CapaStatus::ActionPlan;
        let path = save(&project, &record).unwrap();
        assert!(path.starts_with(project.root().join("capas")));

        let loaded = load_all::<Capa>(&project);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].record.id, record.id);
        assert_eq!(loaded[0].record.status, CapaStatus::ActionPlan);
    }

    #[test]
    fn test_broken_files_are_skipped_in_lists() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        save(&project, &capa("CAPA-2024-001", "Good")).unwrap();
        fs::write(
            project.root().join("capas/CAPA-BROKEN.qms.yaml"),
            "title: [unterminated\n",
        )
        .unwrap();
        fs::write(project.root().join("capas/notes.txt"), "ignored").unwrap();

        assert_eq!(load_all::<Capa>(&project).len(), 1);
    }

    #[test]
    fn test_load_file_reports_syntax_error() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.qms.yaml");
        fs::write(&path, "id: CAPA-01HQ3K4N5M6P7R8S9T0VWXYZAB\nstatus: finished\n").unwrap();

        let err = load_file::<Capa>(&path).unwrap_err();
        assert!(matches!(err, StoreError::Syntax(_)));
    }

    #[test]
    fn test_find_by_number_id_fragment_and_short_id() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let first = capa("CAPA-2024-001", "First");
        let second = capa("CAPA-2024-002", "Second");
        save(&project, &first).unwrap();
        save(&project, &second).unwrap();

        let mut short_ids = ShortIdIndex::new();
        short_ids.rebuild(vec![second.id.to_string(), first.id.to_string()]);

        let by_number = find::<Capa>(&project, "capa-2024-002", &short_ids).unwrap();
        assert_eq!(by_number.record.id, second.id);

        let full = first.id.to_string();
        let by_id = find::<Capa>(&project, &full, &short_ids).unwrap();
        assert_eq!(by_id.record.id, first.id);

        let fragment = &first.id.ulid().to_string()[10..];
        let by_fragment = find::<Capa>(&project, &fragment.to_lowercase(), &short_ids).unwrap();
        assert_eq!(by_fragment.record.id, first.id);

        let by_short = find::<Capa>(&project, "@1", &short_ids).unwrap();
        assert_eq!(by_short.record.id, second.id);
    }

    #[test]
    fn test_find_not_found_and_ambiguous() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        save(&project, &capa("CAPA-2024-001", "First")).unwrap();
        save(&project, &capa("CAPA-2024-002", "Second")).unwrap();
        let short_ids = ShortIdIndex::new();

        let err = find::<Capa>(&project, "CAPA-2099-001", &short_ids).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        // Every id contains its own prefix
        let err = find::<Capa>(&project, "CAPA-", &short_ids).unwrap_err();
        assert!(matches!(err, StoreError::Ambiguous { .. }));
    }

    #[test]
    fn test_find_unlisted_short_id_is_not_a_fragment() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        for n in 1..=12 {
            save(&project, &capa(&format!("CAPA-2024-{n:03}"), "Record")).unwrap();
        }
        let mut short_ids = ShortIdIndex::new();

        for reference in ["7", "@7", " @42 "] {
            let err = find::<Capa>(&project, reference, &short_ids).unwrap_err();
            assert!(
                matches!(err, StoreError::UnknownShortId { .. }),
                "{reference}: {err}"
            );
        }

        // A listed short ID still resolves
        let listed = load_all::<Capa>(&project);
        short_ids.rebuild(vec![listed[3].record.id.to_string()]);
        let found = find::<Capa>(&project, "1", &short_ids).unwrap();
        assert_eq!(found.record.id, listed[3].record.id);
    }

    #[test]
    fn test_duplicate_document_number_rejected() {
        let doc = Document::new(
            "Calibration".to_string(),
            "SOP-001".to_string(),
            "SOP".to_string(),
            "Emily Davis".to_string(),
            Utc::now(),
        );
        let existing = vec![Loaded {
            path: PathBuf::from("documents/x.qms.yaml"),
            record: doc,
        }];

        assert!(matches!(
            ensure_unique_document_number(&existing, "sop-001"),
            Err(StoreError::DuplicateDocumentNumber { .. })
        ));
        assert!(ensure_unique_document_number(&existing, "SOP-002").is_ok());
    }

    #[test]
    fn test_search_results_point_at_files() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let record = capa("CAPA-2024-001", "First");
        save(&project, &record).unwrap();

        let results = load_search_results(&project);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target, format!("capas/{}.qms.yaml", record.id));

        let set = RecordSet::load(&project);
        assert_eq!(set.capas.len(), 1);
        assert_eq!(set.search_results().len(), 1);
    }
}
