use std::{collections::BTreeMap, fmt, str::FromStr};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::DbHubError;

/// Form fields sent with a single request.
///
/// Built fresh for every call. Keys are kept sorted so request bodies are
/// stable, although the service does not depend on field order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormParams(BTreeMap<String, String>);

impl FormParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Sets a field only when `value` is non-empty.
    ///
    /// The service selects behavior by field presence, so an empty value
    /// must not be sent at all.
    pub fn set_non_empty(&mut self, key: impl Into<String>, value: &str) {
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

/// Selects which version of a database a call targets.
///
/// All fields empty means the database's default branch. Fields are
/// combinable; empty fields are never sent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    pub branch: String,
    pub commit_id: String,
    pub release: String,
    pub tag: String,
}

impl Identifier {
    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            branch: name.into(),
            ..Self::default()
        }
    }

    pub fn commit(id: impl Into<String>) -> Self {
        Self {
            commit_id: id.into(),
            ..Self::default()
        }
    }

    pub fn release(name: impl Into<String>) -> Self {
        Self {
            release: name.into(),
            ..Self::default()
        }
    }

    pub fn tag(name: impl Into<String>) -> Self {
        Self {
            tag: name.into(),
            ..Self::default()
        }
    }

    fn write_to(&self, params: &mut FormParams, suffix: &str) {
        params.set_non_empty(format!("branch{suffix}"), &self.branch);
        params.set_non_empty(format!("commit{suffix}"), &self.commit_id);
        params.set_non_empty(format!("release{suffix}"), &self.release);
        params.set_non_empty(format!("tag{suffix}"), &self.tag);
    }
}

/// Controls the SQL generated for a diff.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MergeStrategy {
    /// No SQL is generated; only before/after snapshots are returned.
    #[default]
    NoMerge,
    /// Generated statements keep the original primary key values.
    PreservePkMerge,
    /// Generated statements let the database assign new primary keys.
    NewPkMerge,
}

impl MergeStrategy {
    /// Wire token sent in the `merge` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoMerge => "none",
            Self::PreservePkMerge => "preserve_pk",
            Self::NewPkMerge => "new_pk",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = DbHubError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::NoMerge),
            "preserve_pk" => Ok(Self::PreservePkMerge),
            "new_pk" => Ok(Self::NewPkMerge),
            other => Err(DbHubError::InvalidArgument(format!(
                "unknown merge strategy '{other}'"
            ))),
        }
    }
}

/// One side of a diff: a database and the version to compare.
///
/// Leaving owner and name empty on the second side compares two versions
/// of the first side's database.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiffTarget {
    pub owner: String,
    pub name: String,
    pub ident: Identifier,
}

impl DiffTarget {
    pub fn new(owner: impl Into<String>, name: impl Into<String>, ident: Identifier) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            ident,
        }
    }

    /// Targets another version of the database named on the other side.
    pub fn same_database(ident: Identifier) -> Self {
        Self {
            ident,
            ..Self::default()
        }
    }
}

/// Optional commit and provenance details attached to an upload.
///
/// Unset and empty fields are omitted from the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadInformation {
    /// Branch or parent commit the upload builds on.
    pub ident: Identifier,
    pub commit_msg: Option<String>,
    pub source_url: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub licence: Option<String>,
    pub public: Option<bool>,
    /// Overwrite the branch head even when `ident` is not its latest commit.
    pub force: bool,
    pub commit_timestamp: Option<DateTime<Utc>>,
    pub author_name: Option<String>,
    pub author_email: Option<String>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
    pub other_parents: Option<String>,
    /// SHA256 of the database file, checked by the server.
    pub sha_sum: Option<String>,
}

impl UploadInformation {
    pub fn with_commit_message(message: impl Into<String>) -> Self {
        Self {
            commit_msg: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Builds the standard authenticated field set for a database call.
pub(crate) fn prepare(api_key: &str, owner: &str, name: &str, ident: &Identifier) -> FormParams {
    let mut params = FormParams::new();
    params.set_non_empty("apikey", api_key);
    params.set_non_empty("dbowner", owner);
    params.set_non_empty("dbname", name);
    ident.write_to(&mut params, "");
    params
}

/// Builds fields for an account-scoped call such as listing databases.
pub(crate) fn prepare_account(api_key: &str) -> FormParams {
    prepare(api_key, "", "", &Identifier::default())
}

pub(crate) fn prepare_diff(
    api_key: &str,
    a: &DiffTarget,
    b: &DiffTarget,
    merge: MergeStrategy,
) -> FormParams {
    let mut params = FormParams::new();
    params.set_non_empty("apikey", api_key);
    for (side, suffix) in [(a, "_a"), (b, "_b")] {
        params.set(format!("dbowner{suffix}"), side.owner.as_str());
        params.set(format!("dbname{suffix}"), side.name.as_str());
        side.ident.write_to(&mut params, suffix);
    }
    params.set("merge", merge.as_str());
    params
}

/// Builds fields for a standard upload.
///
/// Uploads always land in the API key owner's account, so no owner field
/// is ever produced.
pub(crate) fn prepare_upload(api_key: &str, name: &str, info: &UploadInformation) -> FormParams {
    let mut params = prepare(api_key, "", name, &info.ident);

    let optional_text = [
        ("commitmsg", &info.commit_msg),
        ("sourceurl", &info.source_url),
        ("licence", &info.licence),
        ("authorname", &info.author_name),
        ("authoremail", &info.author_email),
        ("committername", &info.committer_name),
        ("committeremail", &info.committer_email),
        ("otherparents", &info.other_parents),
        ("dbshasum", &info.sha_sum),
    ];
    for (key, value) in optional_text {
        if let Some(value) = value {
            params.set_non_empty(key, value);
        }
    }

    if let Some(ts) = info.last_modified {
        params.set("lastmodified", format_timestamp(ts));
    }
    if let Some(ts) = info.commit_timestamp {
        params.set("committimestamp", format_timestamp(ts));
    }
    if let Some(public) = info.public {
        params.set("public", public.to_string());
    }
    if info.force {
        params.set("force", "true");
    }
    params
}

/// Builds fields for a live database upload. Live uploads carry no commit data.
pub(crate) fn prepare_upload_live(api_key: &str, name: &str) -> FormParams {
    let mut params = prepare(api_key, "", name, &Identifier::default());
    params.set("live", "true");
    params
}

/// Adds SQL text in the base64 form the service expects.
pub(crate) fn set_sql(params: &mut FormParams, sql: &str) {
    params.set("sql", STANDARD.encode(sql.as_bytes()));
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{
        prepare, prepare_account, prepare_diff, prepare_upload, prepare_upload_live, set_sql,
        DiffTarget, Identifier, MergeStrategy, UploadInformation,
    };
    use crate::DbHubError;

    #[test]
    fn default_identifier_adds_no_selector_fields() {
        let params = prepare("key", "owner", "db.sqlite", &Identifier::default());
        assert_eq!(params.len(), 3);
        for key in ["branch", "commit", "release", "tag"] {
            assert!(!params.contains(key), "{key} must be omitted");
        }
    }

    #[test]
    fn identifier_fields_are_combinable() {
        let ident = Identifier {
            branch: "main".to_owned(),
            tag: "v1".to_owned(),
            ..Identifier::default()
        };
        let params = prepare("key", "owner", "db.sqlite", &ident);
        assert_eq!(params.get("branch"), Some("main"));
        assert_eq!(params.get("tag"), Some("v1"));
        assert!(!params.contains("commit"));
        assert!(!params.contains("release"));
    }

    #[test]
    fn empty_owner_and_key_are_omitted() {
        let params = prepare("", "", "db.sqlite", &Identifier::commit("abc"));
        assert!(!params.contains("apikey"));
        assert!(!params.contains("dbowner"));
        assert_eq!(params.get("dbname"), Some("db.sqlite"));
        assert_eq!(params.get("commit"), Some("abc"));
    }

    #[test]
    fn account_params_only_carry_key() {
        let params = prepare_account("key");
        assert_eq!(params.iter().collect::<Vec<_>>(), vec![("apikey", "key")]);
    }

    #[test]
    fn merge_strategy_tokens() {
        let a = DiffTarget::new("owner", "db.sqlite", Identifier::commit("c1"));
        let b = DiffTarget::same_database(Identifier::commit("c2"));
        for (merge, token) in [
            (MergeStrategy::PreservePkMerge, "preserve_pk"),
            (MergeStrategy::NewPkMerge, "new_pk"),
            (MergeStrategy::NoMerge, "none"),
        ] {
            let params = prepare_diff("key", &a, &b, merge);
            assert_eq!(params.get("merge"), Some(token));
        }
    }

    #[test]
    fn merge_strategy_parse_rejects_unknown_token() {
        assert_eq!(
            "new_pk".parse::<MergeStrategy>().ok(),
            Some(MergeStrategy::NewPkMerge)
        );
        let err = "sometimes".parse::<MergeStrategy>().expect_err("must reject");
        assert!(matches!(err, DbHubError::InvalidArgument(_)));
    }

    #[test]
    fn diff_params_suffix_both_sides() {
        let a = DiffTarget::new("owner", "db.sqlite", Identifier::branch("main"));
        let b = DiffTarget::same_database(Identifier::commit("c2"));
        let params = prepare_diff("key", &a, &b, MergeStrategy::NoMerge);

        assert_eq!(params.get("apikey"), Some("key"));
        assert_eq!(params.get("dbowner_a"), Some("owner"));
        assert_eq!(params.get("dbname_a"), Some("db.sqlite"));
        assert_eq!(params.get("branch_a"), Some("main"));
        assert_eq!(params.get("dbowner_b"), Some(""));
        assert_eq!(params.get("dbname_b"), Some(""));
        assert_eq!(params.get("commit_b"), Some("c2"));
        assert!(!params.contains("commit_a"));
        assert!(!params.contains("branch_b"));
        assert!(!params.contains("branch"));
    }

    #[test]
    fn upload_params_never_carry_owner() {
        let params = prepare_upload("key", "db.sqlite", &UploadInformation::default());
        assert!(!params.contains("dbowner"));
        assert_eq!(params.get("dbname"), Some("db.sqlite"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn upload_params_include_set_metadata_only() {
        let info = UploadInformation {
            ident: Identifier::branch("main"),
            commit_msg: Some("Initial".to_owned()),
            author_name: Some(String::new()),
            last_modified: Some(Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()),
            public: Some(false),
            force: true,
            ..UploadInformation::default()
        };
        let params = prepare_upload("key", "db.sqlite", &info);

        assert_eq!(params.get("branch"), Some("main"));
        assert_eq!(params.get("commitmsg"), Some("Initial"));
        assert_eq!(params.get("lastmodified"), Some("2021-03-04T05:06:07Z"));
        assert_eq!(params.get("public"), Some("false"));
        assert_eq!(params.get("force"), Some("true"));
        assert!(!params.contains("authorname"));
        assert!(!params.contains("committimestamp"));
        assert!(!params.contains("dbshasum"));
    }

    #[test]
    fn live_upload_params() {
        let params = prepare_upload_live("key", "live.sqlite");
        assert_eq!(params.get("live"), Some("true"));
        assert_eq!(params.get("dbname"), Some("live.sqlite"));
        assert!(!params.contains("dbowner"));
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn sql_is_sent_base64_encoded() {
        let mut params = prepare_account("key");
        set_sql(&mut params, "SELECT \"a\"\nFROM t");
        assert_eq!(params.get("sql"), Some("U0VMRUNUICJhIgpGUk9NIHQ="));
    }
}
