use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use rand::rngs::SysRng;
use rand::TryRng;
use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;
use crate::error::{Result, VoiceRemindersError};
use crate::interfaces::speech::SpeechProvider;
use crate::providers::google_tts::GoogleTranslateTts;

pub const AUDIO_EXTENSION: &str = "mp3";
const TOKEN_BYTES: usize = 16;

/// Language the synthesis provider is asked to speak. The Indic codes the app is built
/// around get their own variants; any other well-formed code is passed through as
/// `Other` and the provider decides whether it supports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Language {
    #[default]
    Hindi,
    Marathi,
    English,
    Bengali,
    Gujarati,
    Kannada,
    Malayalam,
    Punjabi,
    Tamil,
    Telugu,
    Urdu,
    Other(String),
}

impl Language {
    pub const KNOWN: [Language; 11] = [
        Language::Hindi,
        Language::Marathi,
        Language::English,
        Language::Bengali,
        Language::Gujarati,
        Language::Kannada,
        Language::Malayalam,
        Language::Punjabi,
        Language::Tamil,
        Language::Telugu,
        Language::Urdu,
    ];

    pub fn code(&self) -> &str {
        match self {
            Language::Hindi => "hi",
            Language::Marathi => "mr",
            Language::English => "en",
            Language::Bengali => "bn",
            Language::Gujarati => "gu",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Punjabi => "pa",
            Language::Tamil => "ta",
            Language::Telugu => "te",
            Language::Urdu => "ur",
            Language::Other(code) => code,
        }
    }

    /// Missing or blank codes fall back to `fallback`; malformed codes are rejected.
    pub fn resolve(raw: Option<&str>, fallback: &Language) -> Result<Language> {
        match raw.map(str::trim) {
            None | Some("") => Ok(fallback.clone()),
            Some(code) => code.parse(),
        }
    }
}

/// `ll`, `lll`, or either followed by a `-` region/script subtag (`zh-CN`, `pt-BR`).
fn normalize_code(raw: &str) -> Option<String> {
    let (primary, subtag) = match raw.split_once('-') {
        Some((primary, subtag)) => (primary, Some(subtag)),
        None => (raw, None),
    };
    if !(2..=3).contains(&primary.len()) || !primary.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let primary = primary.to_ascii_lowercase();
    match subtag {
        None => Some(primary),
        Some(subtag)
            if (2..=4).contains(&subtag.len())
                && subtag.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            Some(format!("{primary}-{subtag}"))
        }
        Some(_) => None,
    }
}

impl FromStr for Language {
    type Err = VoiceRemindersError;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        let code = normalize_code(value.trim()).ok_or_else(|| {
            VoiceRemindersError::SynthesisFailed(format!("unsupported language code: {value:?}"))
        })?;
        Ok(Language::KNOWN
            .into_iter()
            .find(|lang| lang.code() == code)
            .unwrap_or(Language::Other(code)))
    }
}

impl TryFrom<String> for Language {
    type Error = VoiceRemindersError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Language> for String {
    fn from(lang: Language) -> Self {
        lang.code().to_string()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Turns text into an audio file under `audio_dir` and hands back the public path
/// (`{url_prefix}/{token}.mp3`). Files are never cleaned up.
pub struct SpeechSynthesizer {
    provider: Arc<dyn SpeechProvider>,
    audio_dir: PathBuf,
    url_prefix: String,
    default_lang: Language,
}

impl SpeechSynthesizer {
    pub fn new(
        provider: Arc<dyn SpeechProvider>,
        audio_dir: impl Into<PathBuf>,
        url_prefix: impl Into<String>,
        default_lang: Language,
    ) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_string();
        Self {
            provider,
            audio_dir: audio_dir.into(),
            url_prefix,
            default_lang,
        }
    }

    pub fn from_config(config: &SpeechConfig) -> Result<Self> {
        let provider = GoogleTranslateTts::new(
            Some(config.base_url.clone()),
            config.timeout_seconds.map(Duration::from_secs),
        )?;
        Ok(Self::new(
            Arc::new(provider),
            &config.audio_dir,
            &config.url_prefix,
            config.default_lang.clone(),
        ))
    }

    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    pub fn resolve_language(&self, raw: Option<&str>) -> Result<Language> {
        Language::resolve(raw, &self.default_lang)
    }

    pub async fn synthesize(&self, text: &str, lang: &Language) -> Result<String> {
        if text.trim().is_empty() {
            return Err(VoiceRemindersError::SynthesisFailed(
                "no text to speak".to_string(),
            ));
        }

        let file_name = audio_file_name()?;
        let audio = self.provider.synthesize(text, lang).await?;

        tokio::fs::create_dir_all(&self.audio_dir)
            .await
            .map_err(|e| {
                VoiceRemindersError::SynthesisFailed(format!(
                    "failed to create audio directory {}: {e}",
                    self.audio_dir.to_string_lossy()
                ))
            })?;
        let path = self.audio_dir.join(&file_name);
        tokio::fs::write(&path, &audio).await.map_err(|e| {
            VoiceRemindersError::SynthesisFailed(format!(
                "failed to write audio file {}: {e}",
                path.to_string_lossy()
            ))
        })?;

        tracing::info!(
            provider = self.provider.name(),
            lang = lang.code(),
            file = %file_name,
            bytes = audio.len(),
            "Wrote speech audio"
        );
        Ok(format!("{}/{}", self.url_prefix, file_name))
    }

    /// Reads back a previously generated file. Anything that is not a generated
    /// file name, or no longer exists, is `NotFound`.
    pub async fn read_audio(&self, file_name: &str) -> Result<Bytes> {
        if !is_audio_file_name(file_name) {
            return Err(VoiceRemindersError::NotFound(file_name.to_string()));
        }
        match tokio::fs::read(self.audio_dir.join(file_name)).await {
            Ok(bytes) => Ok(Bytes::from(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(VoiceRemindersError::NotFound(file_name.to_string()))
            }
            Err(err) => Err(VoiceRemindersError::Runtime(err.to_string())),
        }
    }
}

fn audio_file_name() -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    let mut rng = SysRng;
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| VoiceRemindersError::Runtime(e.to_string()))?;
    let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    Ok(format!("{token}.{AUDIO_EXTENSION}"))
}

pub fn is_audio_file_name(name: &str) -> bool {
    let Some(stem) = name.strip_suffix(&format!(".{AUDIO_EXTENSION}")) else {
        return false;
    };
    stem.len() == TOKEN_BYTES * 2
        && stem
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
}
