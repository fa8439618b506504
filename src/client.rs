use std::{collections::BTreeMap, fmt, time::Duration};

use serde::de::DeserializeOwned;

use crate::{
    decode::project_rows,
    error::remap_delete_error,
    params::{self, DiffTarget, FormParams, Identifier, MergeStrategy, UploadInformation},
    response::{decode_bytes, decode_json, decode_void},
    transport::Transport,
    BlobPolicy, Branches, ClientOptions, Column, CommitEntry, DataRow, Diffs, ExecResult, Index,
    Metadata, QueryResult, ReleaseEntry, Result, TagEntry, Webpage,
};

/// Server used when none is configured.
pub const DEFAULT_SERVER: &str = "https://api.dbhub.io";

/// `User-Agent` sent with every request unless overridden per client.
pub const DEFAULT_USER_AGENT: &str = concat!("dbhub-http v", env!("CARGO_PKG_VERSION"));

/// Connection settings for the DBHub.io API.
///
/// Holds no network resources: every call builds its own HTTP client from
/// the current settings and performs exactly one request, so changes made
/// through the setters apply to the next call.
#[derive(Clone)]
pub struct DbHubClient {
    api_key: String,
    server: String,
    verify_server_cert: bool,
    user_agent: String,
    options: ClientOptions,
}

impl fmt::Debug for DbHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbHubClient")
            .field("server", &self.server)
            .field("api_key", &"<redacted>")
            .field("verify_server_cert", &self.verify_server_cert)
            .field("user_agent", &self.user_agent)
            .field("options", &self.options)
            .finish()
    }
}

impl DbHubClient {
    /// Creates a client for the public DBHub.io server.
    ///
    /// Nothing is sent until an operation is called.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            server: DEFAULT_SERVER.to_owned(),
            verify_server_cert: true,
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            options: ClientOptions::default(),
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `DBHUB_API_KEY`: API key (required)
    /// - `DBHUB_SERVER`: server base URL (optional, defaults to
    ///   [`DEFAULT_SERVER`])
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dbhub_http::DbHubClient;
    ///
    /// let db = DbHubClient::from_env().expect("missing DBHUB_API_KEY");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        let api_key = std::env::var("DBHUB_API_KEY")
            .map_err(|_| "missing DBHUB_API_KEY environment variable".to_owned())?;
        if api_key.trim().is_empty() {
            return Err("DBHUB_API_KEY is set but empty".to_owned());
        }

        let client = Self::new(api_key.trim());
        match std::env::var("DBHUB_SERVER") {
            Ok(server) if !server.trim().is_empty() => Ok(client.with_server(server.trim())),
            _ => Ok(client),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    /// Applies request options such as a timeout.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Replaces the `User-Agent` header value for this client only.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn set_api_key(&mut self, api_key: impl Into<String>) {
        self.api_key = api_key.into();
    }

    /// Changes the server address, e.g. to a local development instance.
    pub fn set_server(&mut self, server: impl Into<String>) {
        self.server = server.into();
    }

    /// Enables or disables TLS certificate verification.
    ///
    /// Only disable this against development servers with self-signed
    /// certificates.
    pub fn set_verify_server_cert(&mut self, verify: bool) {
        self.verify_server_cert = verify;
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn verify_server_cert(&self) -> bool {
        self.verify_server_cert
    }

    /// Builds the authenticated field set for a database and version.
    ///
    /// Empty arguments are left out of the result.
    pub fn prepare_params(&self, owner: &str, name: &str, ident: &Identifier) -> FormParams {
        params::prepare(&self.api_key, owner, name, ident)
    }

    /// Returns the branches of a database and the name of its default branch.
    pub async fn branches(&self, owner: &str, name: &str) -> Result<Branches> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_json("/v1/branches", &data).await
    }

    /// Returns column details for a table or view.
    pub async fn columns(
        &self,
        owner: &str,
        name: &str,
        ident: &Identifier,
        table: &str,
    ) -> Result<Vec<Column>> {
        let mut data = self.prepare_params(owner, name, ident);
        data.set("table", table);
        self.post_list("/v1/columns", &data).await
    }

    /// Returns all commits of a database, keyed by commit id.
    pub async fn commits(&self, owner: &str, name: &str) -> Result<BTreeMap<String, CommitEntry>> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_map("/v1/commits", &data).await
    }

    /// Lists the standard databases in the API key owner's account.
    pub async fn databases(&self) -> Result<Vec<String>> {
        let data = params::prepare_account(&self.api_key);
        self.post_list("/v1/databases", &data).await
    }

    /// Lists the live databases in the API key owner's account.
    pub async fn databases_live(&self) -> Result<Vec<String>> {
        let mut data = params::prepare_account(&self.api_key);
        data.set("live", "true");
        self.post_list("/v1/databases", &data).await
    }

    /// Deletes a database from the API key owner's account.
    ///
    /// Returns [`crate::DbHubError::UnknownDatabase`] when no such database
    /// exists.
    pub async fn delete(&self, name: &str) -> Result<()> {
        let data = self.prepare_params("", name, &Identifier::default());
        let reply = self
            .transport()
            .post_form(&self.endpoint("/v1/delete"), &data)
            .await?;
        decode_void(reply).await.map_err(remap_delete_error)
    }

    /// Returns the differences between two versions of one or two databases.
    ///
    /// `merge` decides whether SQL for applying the changes is generated.
    pub async fn diff(
        &self,
        a: &DiffTarget,
        b: &DiffTarget,
        merge: MergeStrategy,
    ) -> Result<Diffs> {
        let data = params::prepare_diff(&self.api_key, a, b, merge);
        self.post_json("/v1/diff", &data).await
    }

    /// Downloads a database file.
    pub async fn download(&self, owner: &str, name: &str, ident: &Identifier) -> Result<Vec<u8>> {
        let data = self.prepare_params(owner, name, ident);
        let reply = self
            .transport()
            .post_form(&self.endpoint("/v1/download"), &data)
            .await?;
        decode_bytes(reply).await
    }

    /// Runs a data-changing SQL statement on a live database.
    pub async fn execute(&self, owner: &str, name: &str, sql: &str) -> Result<ExecResult> {
        let mut data = self.prepare_params(owner, name, &Identifier::default());
        params::set_sql(&mut data, sql);
        self.post_json("/v1/execute", &data).await
    }

    /// Returns the indexes of a database with the table each belongs to.
    pub async fn indexes(&self, owner: &str, name: &str, ident: &Identifier) -> Result<Vec<Index>> {
        let data = self.prepare_params(owner, name, ident);
        self.post_list("/v1/indexes", &data).await
    }

    /// Returns branches, commits, releases, tags and the web page in one call.
    pub async fn metadata(&self, owner: &str, name: &str) -> Result<Metadata> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_json("/v1/metadata", &data).await
    }

    /// Runs a read-only SQL query and returns every cell as a string.
    ///
    /// `blobs` decides whether BLOB cells are base64 encoded or left empty.
    pub async fn query(
        &self,
        owner: &str,
        name: &str,
        ident: &Identifier,
        blobs: BlobPolicy,
        sql: &str,
    ) -> Result<QueryResult> {
        let mut data = self.prepare_params(owner, name, ident);
        params::set_sql(&mut data, sql);
        let rows: Vec<DataRow> = self.post_list("/v1/query", &data).await?;
        Ok(project_rows(rows, blobs))
    }

    /// Returns all releases of a database, keyed by release name.
    pub async fn releases(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<BTreeMap<String, ReleaseEntry>> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_map("/v1/releases", &data).await
    }

    /// Lists the tables of a database.
    pub async fn tables(&self, owner: &str, name: &str, ident: &Identifier) -> Result<Vec<String>> {
        let data = self.prepare_params(owner, name, ident);
        self.post_list("/v1/tables", &data).await
    }

    /// Returns all tags of a database, keyed by tag name.
    pub async fn tags(&self, owner: &str, name: &str) -> Result<BTreeMap<String, TagEntry>> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_map("/v1/tags", &data).await
    }

    /// Lists the views of a database.
    pub async fn views(&self, owner: &str, name: &str, ident: &Identifier) -> Result<Vec<String>> {
        let data = self.prepare_params(owner, name, ident);
        self.post_list("/v1/views", &data).await
    }

    /// Uploads a new database, or a new commit of an existing one.
    ///
    /// The database is always stored in the API key owner's account.
    pub async fn upload(
        &self,
        name: &str,
        info: &UploadInformation,
        db: impl Into<Vec<u8>>,
    ) -> Result<()> {
        let data = params::prepare_upload(&self.api_key, name, info);
        self.post_upload(&data, db.into()).await
    }

    /// Uploads a database as a live database.
    pub async fn upload_live(&self, name: &str, db: impl Into<Vec<u8>>) -> Result<()> {
        let data = params::prepare_upload_live(&self.api_key, name);
        self.post_upload(&data, db.into()).await
    }

    /// Returns the web UI address of a database.
    pub async fn webpage(&self, owner: &str, name: &str) -> Result<Webpage> {
        let data = self.prepare_params(owner, name, &Identifier::default());
        self.post_json("/v1/webpage", &data).await
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.server.trim_end_matches('/'))
    }

    fn transport(&self) -> Transport {
        Transport {
            user_agent: self.user_agent.clone(),
            verify_server_cert: self.verify_server_cert,
            timeout: self.options.timeout_ms.map(Duration::from_millis),
        }
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, data: &FormParams) -> Result<T> {
        let reply = self.transport().post_form(&self.endpoint(path), data).await?;
        decode_json(reply).await
    }

    /// Like [`Self::post_json`], reading a JSON `null` as an empty list.
    async fn post_list<T: DeserializeOwned>(&self, path: &str, data: &FormParams) -> Result<Vec<T>> {
        let list: Option<Vec<T>> = self.post_json(path, data).await?;
        Ok(list.unwrap_or_default())
    }

    /// Like [`Self::post_json`], reading a JSON `null` as an empty map.
    async fn post_map<T: DeserializeOwned>(
        &self,
        path: &str,
        data: &FormParams,
    ) -> Result<BTreeMap<String, T>> {
        let map: Option<BTreeMap<String, T>> = self.post_json(path, data).await?;
        Ok(map.unwrap_or_default())
    }

    async fn post_upload(&self, data: &FormParams, db: Vec<u8>) -> Result<()> {
        let reply = self
            .transport()
            .post_multipart(&self.endpoint("/v1/upload"), data, db)
            .await?;
        decode_void(reply).await
    }
}

#[cfg(test)]
mod tests {
    use super::{DbHubClient, DEFAULT_SERVER, DEFAULT_USER_AGENT};
    use crate::{ClientOptions, Identifier};

    #[test]
    fn new_uses_default_server() {
        let db = DbHubClient::new("key");
        assert_eq!(db.server(), DEFAULT_SERVER);
        assert!(db.verify_server_cert());
    }

    #[test]
    fn setters_change_next_request_settings() {
        let mut db = DbHubClient::new("key").with_options(ClientOptions::with_timeout_ms(50));
        db.set_api_key("other");
        db.set_server("https://localhost:9444/");
        db.set_verify_server_cert(false);

        assert_eq!(db.api_key(), "other");
        assert_eq!(db.endpoint("/v1/tables"), "https://localhost:9444/v1/tables");

        let transport = db.transport();
        assert!(!transport.verify_server_cert);
        assert_eq!(transport.timeout, Some(std::time::Duration::from_millis(50)));
    }

    #[test]
    fn user_agent_names_crate_and_version() {
        assert_eq!(
            DEFAULT_USER_AGENT,
            format!("dbhub-http v{}", env!("CARGO_PKG_VERSION"))
        );
        let db = DbHubClient::new("key").with_user_agent("custom/1.0");
        assert_eq!(db.transport().user_agent, "custom/1.0");
    }

    #[test]
    fn prepare_params_uses_current_key() {
        let mut db = DbHubClient::new("first");
        db.set_api_key("second");
        let params = db.prepare_params("owner", "db.sqlite", &Identifier::default());
        assert_eq!(params.get("apikey"), Some("second"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let db = DbHubClient::new("secret-key");
        let debug = format!("{db:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-key"));
    }
}
