pub mod config;
pub mod daemon;
pub mod db;
pub mod error;
pub mod logging;
pub mod reminders;
pub mod replies;
pub mod runtime_paths;
pub mod speech;

pub mod interfaces {
    pub mod speech;
}

pub mod providers {
    pub mod google_tts;
}

pub type Result<T> = std::result::Result<T, error::VoiceRemindersError>;
