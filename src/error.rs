//! Upload error types
//!
//! Every failure in the upload pipeline maps to one variant here. The
//! handler collapses all of them into the same 500 JSON response; the
//! variants exist so each step stays independently testable.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum UploadError {
    /// Request body could not be read (bad framing, client disconnect).
    #[error("malformed request: {0}")]
    MalformedRequest(String),
    /// Body is not valid UTF-8 JSON.
    #[error("invalid JSON body: {0}")]
    Decode(serde_json::Error),
    /// JSON parsed, but the `image` field is absent or not a string.
    #[error("bad upload request: {0}")]
    MissingField(serde_json::Error),
    /// The `image` value is not valid standard base64.
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Directory creation or file write failed.
    #[error("failed to store avatar: {0}")]
    Filesystem(#[from] std::io::Error),
}

impl UploadError {
    /// Classify a `serde_json` failure: syntax and EOF errors are decode
    /// failures, data errors mean `image` was missing or mistyped.
    pub fn from_json(err: serde_json::Error) -> Self {
        if err.classify() == serde_json::error::Category::Data {
            Self::MissingField(err)
        } else {
            Self::Decode(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, serde::Deserialize)]
    struct Probe {
        #[allow(dead_code)]
        image: String,
    }

    #[test]
    fn test_syntax_error_is_decode() {
        let err = serde_json::from_str::<Probe>("not json").unwrap_err();
        assert!(matches!(UploadError::from_json(err), UploadError::Decode(_)));
    }

    #[test]
    fn test_missing_field_is_data_error() {
        let err = serde_json::from_str::<Probe>("{}").unwrap_err();
        assert!(matches!(
            UploadError::from_json(err),
            UploadError::MissingField(_)
        ));
    }

    #[test]
    fn test_wrong_type_is_data_error() {
        let err = serde_json::from_str::<Probe>(r#"{"image": 42}"#).unwrap_err();
        assert!(matches!(
            UploadError::from_json(err),
            UploadError::MissingField(_)
        ));
    }

    #[test]
    fn test_messages_are_non_empty() {
        let err = UploadError::MalformedRequest("body read failed".to_string());
        assert!(!err.to_string().is_empty());
    }
}
