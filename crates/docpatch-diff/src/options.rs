use docpatch_types::Path;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Options for a single `diff_patch` invocation.
///
/// Field names follow the camelCase spelling used by option files, e.g.
///
/// ```toml
/// id = "movie-1"
/// ifRevisionID = true
/// basePath = ["author"]
///
/// [diffMatchPatch]
/// lengthThresholdAbsolute = 50
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DiffOptions {
    /// Document id the mutations are addressed to. Inferred from `_id` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Where the two trees live inside the document. Root by default.
    pub base_path: Path,
    /// Optimistic-concurrency guard for the emitted mutations.
    #[serde(rename = "ifRevisionID", alias = "ifRevisionId")]
    pub if_revision_id: RevisionGuard,
    /// Silence the non-fatal warning channel.
    #[serde(alias = "suppressWarnings")]
    pub hide_warnings: bool,
    /// Text-patch heuristic settings.
    pub diff_match_patch: TextPatchOptions,
    /// Maximum nesting depth the differ will descend to.
    pub max_depth: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            id: None,
            base_path: Path::root(),
            if_revision_id: RevisionGuard::None,
            hide_warnings: false,
            diff_match_patch: TextPatchOptions::default(),
            max_depth: 128,
        }
    }
}

impl DiffOptions {
    /// Address mutations to an explicit document id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Diff two sub-trees living at `path` inside the document.
    pub fn with_base_path(mut self, path: Path) -> Self {
        self.base_path = path;
        self
    }

    /// Guard the mutations with a literal revision.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.if_revision_id = RevisionGuard::Revision(revision.into());
        self
    }

    /// Guard the mutations with item A's own `_rev`.
    pub fn infer_revision(mut self) -> Self {
        self.if_revision_id = RevisionGuard::Infer;
        self
    }

    /// Silence warnings.
    pub fn quiet(mut self) -> Self {
        self.hide_warnings = true;
        self
    }

    /// Always emit whole-value `set` patches for strings.
    pub fn without_text_patch(mut self) -> Self {
        self.diff_match_patch.enabled = false;
        self
    }

    /// Returns `true` when a revision guard will be attached.
    ///
    /// Guarded diffs may address array removals by index range, since the
    /// backend rejects them if the document moved on.
    pub fn is_revision_locked(&self) -> bool {
        match &self.if_revision_id {
            RevisionGuard::None => false,
            RevisionGuard::Revision(rev) => !rev.is_empty(),
            RevisionGuard::Infer => true,
        }
    }
}

/// Settings for the text-patch heuristic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextPatchOptions {
    /// Whether to consider text patches at all.
    pub enabled: bool,
    /// Minimum length (UTF-16 code units) of the new string.
    pub length_threshold_absolute: usize,
    /// Maximum ratio of patch text length to new string length.
    pub length_threshold_relative: f64,
}

impl Default for TextPatchOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            length_threshold_absolute: 30,
            length_threshold_relative: 1.2,
        }
    }
}

/// Where the revision guard comes from.
///
/// Serialized as `false` (none), `true` (infer from item A's `_rev`) or a
/// revision string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum RevisionGuard {
    #[default]
    None,
    Revision(String),
    Infer,
}

impl Serialize for RevisionGuard {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::None => serializer.serialize_bool(false),
            Self::Infer => serializer.serialize_bool(true),
            Self::Revision(rev) => serializer.serialize_str(rev),
        }
    }
}

impl<'de> Deserialize<'de> for RevisionGuard {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Flag(bool),
            Revision(String),
        }

        match Raw::deserialize(deserializer).map_err(|_| {
            D::Error::custom("expected `true`, `false` or a revision string")
        })? {
            Raw::Flag(true) => Ok(Self::Infer),
            Raw::Flag(false) => Ok(Self::None),
            Raw::Revision(rev) => Ok(Self::Revision(rev)),
        }
    }
}
