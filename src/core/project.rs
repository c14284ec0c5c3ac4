//! Project discovery and structure

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::Organization;

/// Name of the per-project metadata directory
pub const QMS_DIR: &str = ".qms";

/// Suffix shared by every record file
pub const RECORD_SUFFIX: &str = ".qms.yaml";

/// Represents a QMS project
#[derive(Debug)]
pub struct Project {
    /// Root directory of the project (parent of .qms/)
    root: PathBuf,
}

impl Project {
    /// Find project root by walking up from the current directory
    pub fn discover() -> Result<Self, ProjectError> {
        let current =
            std::env::current_dir().map_err(|e| ProjectError::IoError(e.to_string()))?;
        Self::discover_from(&current)
    }

    /// Find project root by walking up from the given directory
    pub fn discover_from(start: &Path) -> Result<Self, ProjectError> {
        let mut current = start
            .canonicalize()
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        loop {
            if current.join(QMS_DIR).is_dir() {
                tracing::debug!(root = %current.display(), "found project");
                return Ok(Self { root: current });
            }

            if !current.pop() {
                return Err(ProjectError::NotFound {
                    searched_from: start.to_path_buf(),
                });
            }
        }
    }

    /// Create a new project structure at the given path
    pub fn init(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if root.join(QMS_DIR).exists() {
            return Err(ProjectError::AlreadyExists(root));
        }

        Self::create_layout(root)
    }

    /// Initialize even if .qms/ exists; the config file is rewritten
    pub fn init_force(path: &Path) -> Result<Self, ProjectError> {
        let root = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        Self::create_layout(root)
    }

    fn create_layout(root: PathBuf) -> Result<Self, ProjectError> {
        let qms_dir = root.join(QMS_DIR);
        std::fs::create_dir_all(&qms_dir).map_err(|e| ProjectError::IoError(e.to_string()))?;

        std::fs::write(qms_dir.join("config.yaml"), Self::default_config())
            .map_err(|e| ProjectError::IoError(e.to_string()))?;

        for prefix in EntityPrefix::all() {
            std::fs::create_dir_all(root.join(prefix.directory()))
                .map_err(|e| ProjectError::IoError(e.to_string()))?;
        }

        tracing::debug!(root = %root.display(), "initialized project layout");
        Ok(Self { root })
    }

    fn default_config() -> &'static str {
        r#"# QMS Project Configuration

# Default author for new records (can be overridden by global config)
# author: ""

# Email of the user profile acting in this project
# user: ""

# Default output format (auto, yaml, tsv, json, csv, md, id, short-id)
# default_format: auto
"#
    }

    /// Get the project root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the .qms metadata directory
    pub fn qms_dir(&self) -> PathBuf {
        self.root.join(QMS_DIR)
    }

    pub fn organization_path(&self) -> PathBuf {
        self.qms_dir().join("organization.yaml")
    }

    /// The project's organization, if one has been recorded
    pub fn organization(&self) -> Option<Organization> {
        Organization::load_from_path(&self.organization_path())
    }

    pub fn save_organization(&self, org: &Organization) -> Result<(), ProjectError> {
        org.save_to_path(&self.organization_path())
            .map_err(|e| ProjectError::IoError(e.to_string()))
    }

    /// Get the path for a new record file
    pub fn entity_path(&self, id: &EntityId) -> PathBuf {
        self.root
            .join(id.prefix().directory())
            .join(format!("{}{}", id, RECORD_SUFFIX))
    }

    /// Path relative to the project root, with forward slashes
    pub fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Iterate all record files of a given prefix type, in path order
    pub fn iter_entity_files(&self, prefix: EntityPrefix) -> impl Iterator<Item = PathBuf> {
        let dir = self.root.join(prefix.directory());
        walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().to_string_lossy().ends_with(RECORD_SUFFIX))
            .map(|e| e.path().to_path_buf())
    }
}

/// Errors that can occur during project operations
#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("not a QMS project (searched from {searched_from:?}). Run 'qms init' to create one.")]
    NotFound { searched_from: PathBuf },

    #[error("QMS project already exists at {0:?}")]
    AlreadyExists(PathBuf),

    #[error("IO error: {0}")]
    IoError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;

    #[test]
    fn test_project_init_creates_structure() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();

        assert!(project.qms_dir().exists());
        assert!(project.qms_dir().join("config.yaml").exists());
        for dir in ["documents", "events", "capas", "changes", "users"] {
            assert!(project.root().join(dir).is_dir(), "{dir} missing");
        }
    }

    #[test]
    fn test_project_init_fails_if_exists() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let err = Project::init(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::AlreadyExists(_)));

        assert!(Project::init_force(tmp.path()).is_ok());
    }

    #[test]
    fn test_project_discover_finds_qms_dir() {
        let tmp = tempdir().unwrap();
        Project::init(tmp.path()).unwrap();

        let subdir = tmp.path().join("some/nested/dir");
        std::fs::create_dir_all(&subdir).unwrap();

        let project = Project::discover_from(&subdir).unwrap();
        assert_eq!(
            project.root().canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_project_discover_fails_without_qms_dir() {
        let tmp = tempdir().unwrap();
        let err = Project::discover_from(tmp.path()).unwrap_err();
        assert!(matches!(err, ProjectError::NotFound { .. }));
    }

    #[test]
    fn test_entity_path_and_relative_path() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        let id = EntityId::new(EntityPrefix::Capa);

        let path = project.entity_path(&id);
        assert_eq!(
            project.relative_path(&path),
            format!("capas/{}.qms.yaml", id)
        );
    }

    #[test]
    fn test_organization_roundtrip() {
        let tmp = tempdir().unwrap();
        let project = Project::init(tmp.path()).unwrap();
        assert!(project.organization().is_none());

        project
            .save_organization(&Organization::new("Acme Pharma", Utc::now()))
            .unwrap();
        assert_eq!(project.organization().unwrap().slug, "acme-pharma");
    }
}
