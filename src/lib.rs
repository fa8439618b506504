//! `dbhub-http` is an async HTTP client for the DBHub.io database hosting API.
//!
//! Every operation is one authenticated POST against the configured server:
//! - queries with [`DbHubClient::query`] and [`DbHubClient::execute`]
//! - schema and history metadata ([`DbHubClient::tables`],
//!   [`DbHubClient::commits`], [`DbHubClient::metadata`], ...)
//! - whole-file transfer with [`DbHubClient::upload`] and
//!   [`DbHubClient::download`]
//! - version comparison with [`DbHubClient::diff`]

mod client;
mod decode;
mod error;
mod options;
mod params;
mod response;
mod transport;
mod types;
mod value;
mod wire;

pub use client::{DbHubClient, DEFAULT_SERVER, DEFAULT_USER_AGENT};
pub use error::DbHubError;
pub use options::ClientOptions;
pub use params::{DiffTarget, FormParams, Identifier, MergeStrategy, UploadInformation};
pub use types::{
    BlobPolicy, BranchEntry, Branches, Column, CommitEntry, DataDiff, DiffAction,
    DiffObjectChangeset, Diffs, ExecResult, Index, IndexColumn, Metadata, QueryResult,
    ReleaseEntry, ResultRow, SchemaDiff, TagEntry, Tree, TreeEntry, TreeEntryType, Webpage,
};
pub use value::{Blob, DataRow, DataValue, Value, ValueType};

pub type Result<T> = std::result::Result<T, DbHubError>;
