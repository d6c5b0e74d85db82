use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceRemindersError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("speech synthesis failed: {0}")]
    SynthesisFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

pub use crate::Result;

impl VoiceRemindersError {
    pub fn store(err: impl std::fmt::Display) -> Self {
        Self::StoreUnavailable(err.to_string())
    }

    pub fn synthesis(err: impl std::fmt::Display) -> Self {
        Self::SynthesisFailed(err.to_string())
    }

    /// Only `NotFound` is a client error; everything else is reported as a server failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_category_and_message() {
        let err = VoiceRemindersError::SynthesisFailed("no text to speak".to_string());
        assert_eq!(format!("{err}"), "speech synthesis failed: no text to speak");

        let err = VoiceRemindersError::store("database is locked");
        assert!(format!("{err}").starts_with("store unavailable"));
        assert!(!err.is_not_found());
        assert!(VoiceRemindersError::NotFound("x.mp3".to_string()).is_not_found());
    }
}
