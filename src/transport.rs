use std::time::Duration;

use reqwest::{multipart, StatusCode};

use crate::{DbHubError, FormParams, Result};

/// Filename sent for an upload when the request carries no `dbname`.
const FALLBACK_UPLOAD_NAME: &str = "database.db";

/// Status codes a request treats as success.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Accept {
    /// Any 2xx status.
    Success,
    /// Exactly `201 Created`.
    Created,
}

/// A received HTTP response, classified but not yet read.
///
/// The body is released when the `Reply` is consumed or dropped.
#[derive(Debug)]
pub(crate) struct Reply {
    response: reqwest::Response,
    accept: Accept,
}

impl Reply {
    pub(crate) fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub(crate) fn is_success(&self) -> bool {
        let status = self.status();
        match self.accept {
            Accept::Success => status.is_success(),
            Accept::Created => status == StatusCode::CREATED,
        }
    }

    /// Reads the whole body, consuming the response.
    pub(crate) async fn into_body(self) -> Result<Vec<u8>> {
        self.response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(DbHubError::Transport)
    }
}

/// Status line as the server would print it, e.g. `404 Not Found`.
pub(crate) fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

/// Sends one request per call over a freshly built HTTP client.
#[derive(Clone, Debug)]
pub(crate) struct Transport {
    pub(crate) user_agent: String,
    pub(crate) verify_server_cert: bool,
    pub(crate) timeout: Option<Duration>,
}

impl Transport {
    fn http_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .danger_accept_invalid_certs(!self.verify_server_cert);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(DbHubError::Transport)
    }

    /// POSTs `params` as an url-encoded form.
    pub(crate) async fn post_form(&self, url: &str, params: &FormParams) -> Result<Reply> {
        let response = self
            .http_client()?
            .post(url)
            .form(params)
            .send()
            .await
            .map_err(DbHubError::Transport)?;

        Ok(Self::classify(url, response, Accept::Success))
    }

    /// POSTs a database file plus `params` as `multipart/form-data`.
    ///
    /// The file goes first, in a part named `file`, followed by one text part
    /// per field. Only `201 Created` counts as success.
    pub(crate) async fn post_multipart(
        &self,
        url: &str,
        params: &FormParams,
        file: Vec<u8>,
    ) -> Result<Reply> {
        let file_name = params
            .get("dbname")
            .unwrap_or(FALLBACK_UPLOAD_NAME)
            .to_owned();
        let file_part = multipart::Part::bytes(file)
            .file_name(file_name)
            .mime_str("application/octet-stream")
            .map_err(DbHubError::Transport)?;

        let form = params.iter().fold(
            multipart::Form::new().part("file", file_part),
            |form, (key, value)| form.text(key.to_owned(), value.to_owned()),
        );

        let response = self
            .http_client()?
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(DbHubError::Transport)?;

        Ok(Self::classify(url, response, Accept::Created))
    }

    fn classify(url: &str, response: reqwest::Response, accept: Accept) -> Reply {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            url,
            status = response.status().as_u16(),
            ?accept,
            "dbhub request completed"
        );
        #[cfg(not(feature = "tracing"))]
        let _ = url;

        Reply { response, accept }
    }
}
