//! Error types and result alias for the crate.
//!
//! This module defines [`enum@crate::error::Error`] and the crate-wide [Result] alias. Variants cover
//! per-layer decode failures, empty scenes, unsupported layer kinds, callouts without an anchor,
//! font loading, invalid configuration, IO, and generic errors.
use thiserror::Error;

use crate::scene::LayerId;

pub type Result<T> = std::result::Result<T, Error>;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum Error {
    /// A single layer's image could not be fetched or decoded.
    #[error("failed to decode image '{locator}': {reason}")]
    Decode { locator: String, reason: String },

    /// No drawable layers exist, even after injecting the placeholder shape.
    #[error("scene has no drawable layers")]
    EmptyScene,

    #[error("layer '{id}' has unsupported kind '{kind}'")]
    UnsupportedLayer { id: LayerId, kind: String },

    #[error("callout '{callout}' has no resolvable anchor")]
    NoAnchor { callout: String },

    #[error("font error: {0}")]
    Font(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Returns `true` for failures that only affect a single layer and are skipped by the compositor.
    pub fn is_recoverable_layer_failure(&self) -> bool {
        matches!(self, Error::Decode { .. })
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Error::Other(value)
    }
}

impl From<&str> for Error {
    fn from(value: &str) -> Self {
        Error::Other(value.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_string_uses_other_variant() {
        let err: Error = String::from("boom").into();
        matches!(err, Error::Other(_))
            .then_some(())
            .expect("expected Other variant");
    }

    #[test]
    fn from_str_allocates_owned_message() {
        let err: Error = "issue".into();
        assert!(matches!(err, Error::Other(ref msg) if msg == "issue"));
    }

    #[test]
    fn decode_message_names_locator() {
        let err = Error::Decode {
            locator: "icons/pin.png".into(),
            reason: "truncated".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to decode image 'icons/pin.png': truncated"
        );
        assert!(err.is_recoverable_layer_failure());
    }

    #[test]
    fn fatal_errors_are_not_recoverable() {
        assert!(!Error::EmptyScene.is_recoverable_layer_failure());
        let err = Error::UnsupportedLayer {
            id: "video".into(),
            kind: "video-overlay".into(),
        };
        assert!(!err.is_recoverable_layer_failure());
        assert_eq!(
            err.to_string(),
            "layer 'video' has unsupported kind 'video-overlay'"
        );
    }
}
