//! On-disk persistence of one family tree under `<root>/.kindred/`.
//!
//! The tree lives in `tree.json`:
//!
//! ```json
//! { "version": 1, "lastUpdated": "...", "contentHash": "blake3:...",
//!   "persons": [...], "relationships": [...] }
//! ```
//!
//! Writes go to a sibling temp file that is renamed over `tree.json` while an
//! exclusive advisory lock on `.kindred/lock` is held, so readers never see a
//! half-written tree. Reads take the shared lock.
//!
//! [`decode_document`] additionally understands the older browser export
//! shape `{ nodes, edges, lastUpdated }`, where each edge carries its kind
//! in `data.type` and edges without one are parent-child links.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::KINDRED_DIR;
use crate::error::ErrorCode;
use crate::lock::{LockError, TreeLock, TreeReadLock};
use crate::model::{Biography, Person, PersonId, Position, Relationship, RelationshipId, RelationshipKind};
use crate::seed::initial_family;
use crate::snapshot::Snapshot;

/// Newest tree file format this build reads and writes.
pub const TREE_FORMAT_VERSION: u32 = 1;

const TREE_FILE: &str = "tree.json";
const LOCK_FILE: &str = "lock";
const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{}: cannot access {}: {source}", ErrorCode::TreeWriteFailed, .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{}: {} is not a valid tree document: {source}", ErrorCode::CorruptTree, .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "{}: {} content hash mismatch (recorded {expected}, computed {actual})",
        ErrorCode::CorruptTree,
        .path.display()
    )]
    CorruptTree {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    #[error(
        "{}: {} has format version {found}, newest supported is {supported}",
        ErrorCode::UnsupportedVersion,
        .path.display()
    )]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("{}: cannot encode tree: {0}", ErrorCode::InternalUnexpected)]
    Encode(#[source] serde_json::Error),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Io { .. } => ErrorCode::TreeWriteFailed,
            Self::Parse { .. } | Self::CorruptTree { .. } => ErrorCode::CorruptTree,
            Self::UnsupportedVersion { .. } => ErrorCode::UnsupportedVersion,
            Self::Encode(_) => ErrorCode::InternalUnexpected,
            Self::Lock(err) => err.code(),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Contents of `tree.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredTree {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    pub content_hash: String,
    #[serde(flatten)]
    pub snapshot: Snapshot,
}

impl StoredTree {
    /// Stamp `snapshot` with the current format version and its hash.
    ///
    /// # Errors
    ///
    /// [`StoreError::Encode`] if the snapshot cannot be serialized.
    pub fn new(snapshot: Snapshot, last_updated: DateTime<Utc>) -> Result<Self, StoreError> {
        Ok(Self {
            version: TREE_FORMAT_VERSION,
            last_updated,
            content_hash: snapshot.content_hash().map_err(StoreError::Encode)?,
            snapshot,
        })
    }

    fn verify(self, path: &Path) -> Result<Self, StoreError> {
        if self.version > TREE_FORMAT_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: self.version,
                supported: TREE_FORMAT_VERSION,
            });
        }
        let actual = self.snapshot.content_hash().map_err(StoreError::Encode)?;
        if actual != self.content_hash {
            return Err(StoreError::CorruptTree {
                path: path.to_path_buf(),
                expected: self.content_hash,
                actual,
            });
        }
        Ok(self)
    }
}

/// Result of [`TreeStore::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Written { content_hash: String },
    /// The file already held this exact content.
    Unchanged,
}

/// Handle on a project's `.kindred/` directory.
#[derive(Debug, Clone)]
pub struct TreeStore {
    dir: PathBuf,
    lock_timeout: Duration,
}

impl TreeStore {
    /// Handle for `project_root`. Nothing is touched on disk.
    #[must_use]
    pub fn open(project_root: &Path) -> Self {
        Self {
            dir: project_root.join(KINDRED_DIR),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Walk up from `start` to the nearest directory containing `.kindred/`.
    #[must_use]
    pub fn discover(start: &Path) -> Option<Self> {
        start
            .ancestors()
            .find(|dir| dir.join(KINDRED_DIR).is_dir())
            .map(Self::open)
    }

    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn tree_path(&self) -> PathBuf {
        self.dir.join(TREE_FILE)
    }

    fn lock_path(&self) -> PathBuf {
        self.dir.join(LOCK_FILE)
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.dir.is_dir()
    }

    /// Create `.kindred/`. Returns `false` if it already existed.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] if the directory cannot be created.
    pub fn init(&self) -> Result<bool, StoreError> {
        if self.is_initialized() {
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        debug!(dir = %self.dir.display(), "initialized tree directory");
        Ok(true)
    }

    /// Read and verify `tree.json`; `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Any [`StoreError`]: unreadable file, bad JSON, failed hash check,
    /// newer format version, or lock timeout.
    pub fn load(&self) -> Result<Option<StoredTree>, StoreError> {
        let path = self.tree_path();
        if !path.exists() {
            return Ok(None);
        }

        let _guard = TreeReadLock::acquire(&self.lock_path(), self.lock_timeout)?;
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let tree: StoredTree =
            serde_json::from_str(&text).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?;
        let tree = tree.verify(&path)?;
        debug!(
            persons = tree.snapshot.persons.len(),
            relationships = tree.snapshot.relationships.len(),
            "loaded tree"
        );
        Ok(Some(tree))
    }

    /// The stored snapshot, or the seed family if nothing is stored yet.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load).
    pub fn load_or_seed(&self) -> Result<Snapshot, StoreError> {
        Ok(self
            .load()?
            .map_or_else(initial_family, |tree| tree.snapshot))
    }

    /// Persist `snapshot`, skipping the write if the content is unchanged.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] or [`StoreError::Lock`].
    pub fn save(&self, snapshot: &Snapshot) -> Result<SaveOutcome, StoreError> {
        self.save_at(snapshot, Utc::now())
    }

    /// [`save`](Self::save) with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] or [`StoreError::Lock`].
    pub fn save_at(
        &self,
        snapshot: &Snapshot,
        now: DateTime<Utc>,
    ) -> Result<SaveOutcome, StoreError> {
        self.init()?;
        let path = self.tree_path();
        let _guard = TreeLock::acquire(&self.lock_path(), self.lock_timeout)?;

        let content_hash = snapshot.content_hash().map_err(StoreError::Encode)?;
        if recorded_hash(&path).as_deref() == Some(content_hash.as_str()) {
            debug!(%content_hash, "tree unchanged; skipping write");
            return Ok(SaveOutcome::Unchanged);
        }

        let tree = StoredTree::new(snapshot.clone(), now)?;
        let mut bytes = serde_json::to_vec_pretty(&tree).map_err(StoreError::Encode)?;
        bytes.push(b'\n');

        let tmp = self.dir.join(format!("{TREE_FILE}.tmp"));
        fs::write(&tmp, &bytes).map_err(|e| StoreError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StoreError::io(&path, e))?;

        info!(
            persons = snapshot.persons.len(),
            relationships = snapshot.relationships.len(),
            %content_hash,
            "saved tree"
        );
        Ok(SaveOutcome::Written { content_hash })
    }

    /// Delete `tree.json` so the next load falls back to the seed family.
    /// Returns `false` if there was nothing to delete.
    ///
    /// # Errors
    ///
    /// [`StoreError::Io`] or [`StoreError::Lock`].
    pub fn clear(&self) -> Result<bool, StoreError> {
        let path = self.tree_path();
        if !path.exists() {
            return Ok(false);
        }
        let _guard = TreeLock::acquire(&self.lock_path(), self.lock_timeout)?;
        fs::remove_file(&path).map_err(|e| StoreError::io(&path, e))?;
        info!(path = %path.display(), "cleared tree");
        Ok(true)
    }
}

/// Hash recorded in an existing tree file, if it can be read at all.
fn recorded_hash(path: &Path) -> Option<String> {
    let text = fs::read_to_string(path).ok()?;
    let tree: StoredTree = serde_json::from_str(&text).ok()?;
    // A file whose body no longer matches its header must be rewritten.
    tree.verify(path).ok().map(|t| t.content_hash)
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    nodes: Vec<LegacyNode>,
    #[serde(default)]
    edges: Vec<LegacyEdge>,
}

#[derive(Deserialize)]
struct LegacyNode {
    id: PersonId,
    #[serde(default)]
    position: Position,
    #[serde(default)]
    data: Biography,
}

#[derive(Deserialize)]
struct LegacyEdge {
    id: RelationshipId,
    source: PersonId,
    target: PersonId,
    #[serde(default)]
    data: LegacyEdgeData,
}

#[derive(Default, Deserialize)]
struct LegacyEdgeData {
    #[serde(rename = "type")]
    kind: Option<RelationshipKind>,
}

impl From<LegacyDocument> for Snapshot {
    fn from(doc: LegacyDocument) -> Self {
        let persons = doc
            .nodes
            .into_iter()
            .map(|n| Person {
                id: n.id,
                position: n.position,
                data: n.data,
            })
            .collect();
        let relationships = doc
            .edges
            .into_iter()
            .map(|e| Relationship {
                id: e.id,
                source: e.source,
                target: e.target,
                kind: e.data.kind.unwrap_or(RelationshipKind::ParentChild),
            })
            .collect();
        Self::new(persons, relationships)
    }
}

/// Decode an exported document into a snapshot.
///
/// Accepts a stored tree (hash and version are checked), a bare
/// `{persons, relationships}` snapshot, or a legacy `{nodes, edges}` export.
/// Graph invariants are not checked here.
///
/// # Errors
///
/// [`StoreError::Parse`], [`StoreError::CorruptTree`] or
/// [`StoreError::UnsupportedVersion`].
pub fn decode_document(text: &str, origin: &Path) -> Result<Snapshot, StoreError> {
    let parse_err = |source| StoreError::Parse {
        path: origin.to_path_buf(),
        source,
    };
    let value: serde_json::Value = serde_json::from_str(text).map_err(parse_err)?;

    if value.get("nodes").is_some() || value.get("edges").is_some() {
        warn!(origin = %origin.display(), "importing legacy nodes/edges document");
        let doc: LegacyDocument = serde_json::from_value(value).map_err(parse_err)?;
        return Ok(doc.into());
    }

    if value.get("contentHash").is_some() {
        let tree: StoredTree = serde_json::from_value(value).map_err(parse_err)?;
        return Ok(tree.verify(origin)?.snapshot);
    }

    serde_json::from_value(value).map_err(parse_err)
}
