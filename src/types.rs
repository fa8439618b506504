use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{wire::null_as_default, DataValue};

/// How BLOB cells are rendered in a [`QueryResult`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlobPolicy {
    /// BLOB cells become empty strings.
    #[default]
    Skip,
    /// BLOB cells are base64 encoded.
    Base64,
}

/// One query result row, every cell rendered as a string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultRow {
    pub fields: Vec<String>,
}

impl<S: Into<String>> FromIterator<S> for ResultRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryResult {
    pub rows: Vec<ResultRow>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ExecResult {
    pub rows_changed: u64,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Column {
    pub column_id: i64,
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexColumn {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Index {
    pub name: String,
    pub table: String,
    #[serde(deserialize_with = "null_as_default")]
    pub columns: Vec<IndexColumn>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BranchEntry {
    pub commit: String,
    pub commit_count: u64,
    pub description: String,
}

/// Branches of a database plus the name of its default branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Branches {
    #[serde(deserialize_with = "null_as_default")]
    pub branches: BTreeMap<String, BranchEntry>,
    pub default_branch: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum TreeEntryType {
    #[serde(rename = "tree")]
    Tree,
    #[serde(rename = "db")]
    Database,
    #[serde(rename = "licence")]
    Licence,
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub entry_type: TreeEntryType,
    #[serde(default)]
    pub last_modified: DateTime<Utc>,
    /// SHA256 of the licence attached to the entry.
    #[serde(default, rename = "licence")]
    pub licence_sha: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub size: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Tree {
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub entries: Vec<TreeEntry>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommitEntry {
    pub id: String,
    pub author_email: String,
    pub author_name: String,
    pub committer_email: String,
    pub committer_name: String,
    pub message: String,
    #[serde(deserialize_with = "null_as_default")]
    pub other_parents: Vec<String>,
    pub parent: String,
    pub timestamp: DateTime<Utc>,
    pub tree: Tree,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReleaseEntry {
    pub commit: String,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(rename = "email")]
    pub releaser_email: String,
    #[serde(rename = "name")]
    pub releaser_name: String,
    pub size: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TagEntry {
    pub commit: String,
    pub date: DateTime<Utc>,
    pub description: String,
    #[serde(rename = "email")]
    pub tagger_email: String,
    #[serde(rename = "name")]
    pub tagger_name: String,
}

/// Everything known about a database's history in one response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Metadata {
    #[serde(deserialize_with = "null_as_default")]
    pub branches: BTreeMap<String, BranchEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub commits: BTreeMap<String, CommitEntry>,
    pub default_branch: String,
    #[serde(deserialize_with = "null_as_default")]
    pub releases: BTreeMap<String, ReleaseEntry>,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, TagEntry>,
    pub web_page: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Webpage {
    pub web_page: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    Add,
    Delete,
    Modify,
}

/// Schema change of one object.
///
/// `sql` is only filled in when the diff was requested with a merge
/// strategy other than [`crate::MergeStrategy::NoMerge`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SchemaDiff {
    pub action_type: DiffAction,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub before: String,
    #[serde(default)]
    pub after: String,
}

/// Change to one row of an object.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DataDiff {
    pub action_type: DiffAction,
    #[serde(default)]
    pub sql: Option<String>,
    /// Primary key of the changed row.
    #[serde(default, deserialize_with = "null_as_default")]
    pub pk: Vec<DataValue>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_before: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data_after: Vec<serde_json::Value>,
}

/// All differences for one table, view, index or trigger.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DiffObjectChangeset {
    pub object_name: String,
    pub object_type: String,
    #[serde(default)]
    pub schema: Option<SchemaDiff>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<DataDiff>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Diffs {
    #[serde(deserialize_with = "null_as_default")]
    pub diff: Vec<DiffObjectChangeset>,
}
