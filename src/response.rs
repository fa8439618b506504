use serde::de::DeserializeOwned;

use crate::{
    transport::{status_line, Reply},
    wire::ErrorEnvelope,
    DbHubError, Result,
};

/// Decodes a successful reply's JSON body into `T`, or the reply's error.
pub(crate) async fn decode_json<T: DeserializeOwned>(reply: Reply) -> Result<T> {
    let body = read_success(reply).await?;
    parse_json(&body)
}

/// Checks a reply whose success carries no payload. The body is not parsed.
pub(crate) async fn decode_void(reply: Reply) -> Result<()> {
    if reply.is_success() {
        return Ok(());
    }
    Err(into_error(reply).await)
}

/// Returns a successful reply's raw body, or the reply's error.
pub(crate) async fn decode_bytes(reply: Reply) -> Result<Vec<u8>> {
    read_success(reply).await
}

async fn read_success(reply: Reply) -> Result<Vec<u8>> {
    if !reply.is_success() {
        return Err(into_error(reply).await);
    }
    reply.into_body().await
}

/// Reads a failed reply's body and turns it into an error.
async fn into_error(reply: Reply) -> DbHubError {
    let status = reply.status();
    match reply.into_body().await {
        Ok(body) => error_from_body(status.as_u16(), &status_line(status), &body),
        Err(err) => err,
    }
}

/// Builds the error for a failed reply.
///
/// The service's `{"error": "..."}` message wins; the status line is the
/// fallback when the body is empty or not an error envelope.
pub(crate) fn error_from_body(status: u16, status_line: &str, body: &[u8]) -> DbHubError {
    let message = serde_json::from_slice::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error)
        .unwrap_or_else(|_| status_line.to_owned());
    DbHubError::Http { status, message }
}

pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice::<T>(body).map_err(|err| {
        DbHubError::Decode(format!(
            "invalid response JSON: {err}; body: {}",
            String::from_utf8_lossy(body)
        ))
    })
}
