use std::str::FromStr;

use anyhow::{anyhow, Context};
use serde_json::json;

use crate::{CommentId, Uuid};

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Login required")]
    LoginRequired,

    #[error("Comment not found {0:?}")]
    NotFound(CommentId),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Comment content is empty")]
    EmptyContent,

    #[error("Comment content is too long ({0} characters)")]
    ContentTooLong(usize),
}

impl Error {
    /// Failures of the transport or of the server itself, as opposed to
    /// requests the server understood and rejected
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Unknown(_) | Error::Network(_))
    }

    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Network(_) => StatusCode::BAD_GATEWAY,
            Error::PermissionDenied => StatusCode::FORBIDDEN,
            Error::LoginRequired => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::EmptyContent => StatusCode::BAD_REQUEST,
            Error::ContentTooLong(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::Network(msg) => json!({
                "message": msg,
                "type": "network",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::LoginRequired => json!({
                "message": "login required",
                "type": "login-required",
            }),
            Error::NotFound(id) => json!({
                "message": "comment not found",
                "type": "not-found",
                "id": id.0,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::EmptyContent => json!({
                "message": "comment content is empty",
                "type": "empty-content",
            }),
            Error::ContentTooLong(len) => json!({
                "message": "comment content is too long",
                "type": "content-too-long",
                "length": len,
            }),
        })
        .expect("serializing error")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        let message = || {
            String::from(
                data.get("message")
                    .and_then(|msg| msg.as_str())
                    .unwrap_or(""),
            )
        };
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(message()),
                "network" => Error::Network(message()),
                "permission-denied" => Error::PermissionDenied,
                "login-required" => Error::LoginRequired,
                "not-found" => Error::NotFound(CommentId(
                    data.get("id")
                        .and_then(|id| id.as_str())
                        .and_then(|id| Uuid::from_str(id).ok())
                        .ok_or_else(|| anyhow!("error is a not-found without a proper id"))?,
                )),
                "null-byte" => Error::NullByteInString(String::from(
                    data.get("string").and_then(|s| s.as_str()).ok_or_else(|| {
                        anyhow!("error is a null-byte-in-string without a string")
                    })?,
                )),
                "empty-content" => Error::EmptyContent,
                "content-too-long" => Error::ContentTooLong(
                    data.get("length")
                        .and_then(|l| l.as_u64())
                        .and_then(|l| usize::try_from(l).ok())
                        .ok_or_else(|| anyhow!("error is a too-long content without a length"))?,
                ),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_survive_json() {
        let errors = [
            Error::Unknown(String::from("boom")),
            Error::Network(String::from("connection reset")),
            Error::PermissionDenied,
            Error::LoginRequired,
            Error::NotFound(CommentId(Uuid::new_v4())),
            Error::NullByteInString(String::from("a\0")),
            Error::EmptyContent,
            Error::ContentTooLong(4000),
        ];
        for e in errors {
            assert_eq!(Error::parse(&e.contents()).expect("parsing error"), e);
        }
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(Error::parse(br#"{"type":"nope"}"#).is_err());
        assert!(Error::parse(b"not json").is_err());
    }

    #[test]
    fn transient_classification() {
        assert!(Error::Network(String::new()).is_transient());
        assert!(Error::Unknown(String::new()).is_transient());
        assert!(!Error::PermissionDenied.is_transient());
        assert!(!Error::EmptyContent.is_transient());
    }
}
