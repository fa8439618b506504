/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum DbHubError {
    /// The request never completed: DNS, TLS, connect or timeout failure
    /// reported by `reqwest`, or the HTTP client could not be built.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// The server answered with an unexpected HTTP status.
    ///
    /// `message` is the text of the service's `{"error": ...}` envelope when
    /// the body carried one, otherwise the HTTP status line.
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// Response body did not match the expected JSON shape.
    #[error("decode error: {0}")]
    Decode(String),
    /// The target database does not exist.
    #[error("unknown database")]
    UnknownDatabase,
    /// Caller input rejected before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DbHubError {
    /// Returns the HTTP status code for [`DbHubError::Http`] errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

const NO_ROWS_MESSAGE: &str = "no rows in result set";

/// Rewrites the service's wording for a delete against a missing database.
///
/// The service reports this case with its storage layer's raw message
/// instead of a structured code, so this matches on the text. Only the
/// delete operation routes its errors through here.
pub(crate) fn remap_delete_error(err: DbHubError) -> DbHubError {
    match err {
        DbHubError::Http { ref message, .. } if message == NO_ROWS_MESSAGE => {
            DbHubError::UnknownDatabase
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::{remap_delete_error, DbHubError};

    #[test]
    fn remaps_no_rows_message() {
        let err = remap_delete_error(DbHubError::Http {
            status: 400,
            message: "no rows in result set".to_owned(),
        });
        assert!(matches!(err, DbHubError::UnknownDatabase));
    }

    #[test]
    fn keeps_other_http_messages() {
        let err = remap_delete_error(DbHubError::Http {
            status: 400,
            message: "no rows in result set (table foo)".to_owned(),
        });
        assert!(matches!(err, DbHubError::Http { status: 400, .. }));
    }

    #[test]
    fn keeps_decode_errors() {
        let err = remap_delete_error(DbHubError::Decode("no rows in result set".to_owned()));
        assert!(matches!(err, DbHubError::Decode(_)));
    }

    #[test]
    fn status_accessor() {
        let err = DbHubError::Http {
            status: 404,
            message: "404 Not Found".to_owned(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(DbHubError::UnknownDatabase.status(), None);
    }
}
