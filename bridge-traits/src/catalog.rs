//! Remote Catalog Abstraction
//!
//! The remote research-data repository is modelled as a flat capability set
//! rather than a tree of live remote objects. Entities are addressed by an
//! [`EntityPath`] (project → subject → session → scan → resource) and the
//! catalog exposes four operations: existence check, create, attribute-set
//! and file upload.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::Result;

/// Field name → value map sent with create and attribute-set calls.
///
/// Ordered so that request construction and test assertions are stable.
pub type AttributeMap = BTreeMap<String, String>;

/// Level of an entity in the catalog hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Subject,
    Session,
    Scan,
    Resource,
}

impl EntityKind {
    /// All levels, outermost first
    pub const LEVELS: [EntityKind; 4] = [
        EntityKind::Subject,
        EntityKind::Session,
        EntityKind::Scan,
        EntityKind::Resource,
    ];

    fn depth(self) -> usize {
        match self {
            EntityKind::Subject => 1,
            EntityKind::Session => 2,
            EntityKind::Scan => 3,
            EntityKind::Resource => 4,
        }
    }

    /// REST collection name of this level (`subjects`, `experiments`, ...)
    pub fn collection(self) -> &'static str {
        match self {
            EntityKind::Subject => "subjects",
            EntityKind::Session => "experiments",
            EntityKind::Scan => "scans",
            EntityKind::Resource => "resources",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Subject => "subject",
            EntityKind::Session => "session",
            EntityKind::Scan => "scan",
            EntityKind::Resource => "resource",
        };
        f.write_str(name)
    }
}

/// Address of a remote entity inside a project.
///
/// Paths are built top-down:
///
/// ```
/// use bridge_traits::catalog::{EntityKind, EntityPath};
///
/// let scan = EntityPath::subject("ADNI", "S01").session("S01_E01").scan("123");
/// assert_eq!(scan.kind(), EntityKind::Scan);
/// assert_eq!(
///     scan.to_string(),
///     "/data/projects/ADNI/subjects/S01/experiments/S01_E01/scans/123"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPath {
    project: String,
    labels: Vec<String>,
}

impl EntityPath {
    /// Path of a subject within a project
    pub fn subject(project: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            labels: vec![subject.into()],
        }
    }

    /// Path of a session under this subject
    pub fn session(&self, label: impl Into<String>) -> Self {
        self.child(EntityKind::Session, label.into())
    }

    /// Path of a scan under this session
    pub fn scan(&self, label: impl Into<String>) -> Self {
        self.child(EntityKind::Scan, label.into())
    }

    /// Path of a named resource collection under this scan
    pub fn resource(&self, name: impl Into<String>) -> Self {
        self.child(EntityKind::Resource, name.into())
    }

    fn child(&self, kind: EntityKind, label: String) -> Self {
        debug_assert_eq!(
            self.labels.len() + 1,
            kind.depth(),
            "{} cannot be nested under {}",
            kind,
            self.kind()
        );
        let mut labels = self.labels.clone();
        labels.push(label);
        Self {
            project: self.project.clone(),
            labels,
        }
    }

    /// Level addressed by this path
    pub fn kind(&self) -> EntityKind {
        match self.labels.len() {
            1 => EntityKind::Subject,
            2 => EntityKind::Session,
            3 => EntityKind::Scan,
            _ => EntityKind::Resource,
        }
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Label of the addressed entity itself
    pub fn label(&self) -> &str {
        self.labels.last().map(String::as_str).unwrap_or_default()
    }

    /// Label of the ancestor (or self) at the given level
    pub fn label_of(&self, kind: EntityKind) -> Option<&str> {
        self.labels.get(kind.depth() - 1).map(String::as_str)
    }
}

impl fmt::Display for EntityPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/data/projects/{}", self.project)?;
        for (kind, label) in EntityKind::LEVELS.iter().zip(&self.labels) {
            write!(f, "/{}/{}", kind.collection(), label)?;
        }
        Ok(())
    }
}

/// Tags attached to an uploaded file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTags {
    /// File format label (e.g. `NII`, `XML`, `PNG`)
    pub format: String,
    /// Optional content label (e.g. `PROCESSED`, `ORIGINAL`, `THUMBNAIL`)
    pub content: Option<String>,
}

impl FileTags {
    pub fn new(format: impl Into<String>) -> Self {
        Self {
            format: format.into(),
            content: None,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }
}

/// Remote catalog capability
///
/// Every operation fails with a [`BridgeError`](crate::error::BridgeError) on
/// connectivity or validation problems. Callers decide whether to propagate;
/// implementations never retry a create or attribute-set on their own.
#[async_trait]
pub trait RemoteCatalog: Send + Sync {
    /// Whether the addressed entity (or resource collection) exists
    async fn exists(&self, path: &EntityPath) -> Result<bool>;

    /// Create the entity with fields that the remote schema accepts at
    /// creation time
    async fn create(&self, path: &EntityPath, core_fields: &AttributeMap) -> Result<()>;

    /// Set fields on an existing entity in one batched call
    async fn set_attributes(&self, path: &EntityPath, fields: &AttributeMap) -> Result<()>;

    /// Upload a local file into a resource collection
    async fn upload_file(
        &self,
        resource: &EntityPath,
        local_path: &Path,
        tags: &FileTags,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_path_levels() {
        let subject = EntityPath::subject("ADNI", "S01");
        let session = subject.session("S01_E01");
        let scan = session.scan("123");
        let resource = scan.resource("NIFTI");

        assert_eq!(subject.kind(), EntityKind::Subject);
        assert_eq!(session.kind(), EntityKind::Session);
        assert_eq!(scan.kind(), EntityKind::Scan);
        assert_eq!(resource.kind(), EntityKind::Resource);

        assert_eq!(resource.label(), "NIFTI");
        assert_eq!(resource.label_of(EntityKind::Session), Some("S01_E01"));
        assert_eq!(subject.label_of(EntityKind::Scan), None);
        assert_eq!(resource.project(), "ADNI");
    }

    #[test]
    fn test_entity_path_display() {
        let resource = EntityPath::subject("ADNI", "S01")
            .session("S01_E01")
            .scan("123")
            .resource("SNAPSHOTS");

        assert_eq!(
            resource.to_string(),
            "/data/projects/ADNI/subjects/S01/experiments/S01_E01/scans/123/resources/SNAPSHOTS"
        );
    }

    #[test]
    fn test_levels_and_collections() {
        let collections: Vec<&str> = EntityKind::LEVELS
            .iter()
            .map(|kind| kind.collection())
            .collect();
        assert_eq!(collections, ["subjects", "experiments", "scans", "resources"]);
    }

    #[test]
    fn test_file_tags() {
        let tags = FileTags::new("NII").with_content("PROCESSED");
        assert_eq!(tags.format, "NII");
        assert_eq!(tags.content.as_deref(), Some("PROCESSED"));
        assert!(FileTags::new("XML").content.is_none());
    }
}
