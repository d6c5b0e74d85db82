use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::USER_AGENT;

use crate::config::DEFAULT_TTS_BASE_URL;
use crate::error::{Result, VoiceRemindersError};
use crate::interfaces::speech::SpeechProvider;
use crate::speech::Language;

/// The translate endpoint refuses longer `q` values.
pub const MAX_CHUNK_CHARS: usize = 100;
const CLIENT_ID: &str = "tw-ob";
const AGENT: &str = concat!("voice-reminders/", env!("CARGO_PKG_VERSION"));

#[derive(Clone)]
pub struct GoogleTranslateTts {
    client: reqwest::Client,
    base_url: String,
}

impl GoogleTranslateTts {
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = base_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_TTS_BASE_URL.to_string());
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| VoiceRemindersError::Config(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    async fn fetch_chunk(
        &self,
        chunk: &str,
        lang: &Language,
        idx: usize,
        total: usize,
    ) -> Result<Bytes> {
        let url = format!("{}/translate_tts", self.base_url);
        let idx = idx.to_string();
        let total = total.to_string();
        let textlen = chunk.chars().count().to_string();

        let response = self
            .client
            .get(&url)
            .header(USER_AGENT, AGENT)
            .query(&[
                ("ie", "UTF-8"),
                ("q", chunk),
                ("tl", lang.code()),
                ("client", CLIENT_ID),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                VoiceRemindersError::SynthesisFailed(format!("provider unreachable: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail: String = body.trim().chars().take(200).collect();
            return Err(VoiceRemindersError::SynthesisFailed(format!(
                "provider returned {status} for language '{}': {detail}",
                lang.code()
            )));
        }

        let audio = response.bytes().await.map_err(VoiceRemindersError::synthesis)?;
        if audio.is_empty() {
            return Err(VoiceRemindersError::SynthesisFailed(
                "provider returned empty audio".to_string(),
            ));
        }
        Ok(audio)
    }
}

#[async_trait]
impl SpeechProvider for GoogleTranslateTts {
    fn name(&self) -> &str {
        "google_translate"
    }

    async fn synthesize(&self, text: &str, lang: &Language) -> Result<Bytes> {
        let chunks = split_for_speech(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(VoiceRemindersError::SynthesisFailed(
                "no text to speak".to_string(),
            ));
        }

        let total = chunks.len();
        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let part = self.fetch_chunk(chunk, lang, idx, total).await?;
            audio.extend_from_slice(&part);
        }
        tracing::debug!(
            provider = self.name(),
            lang = lang.code(),
            chunks = total,
            bytes = audio.len(),
            "Synthesized speech"
        );
        Ok(Bytes::from(audio))
    }
}

/// Packs whitespace-separated words into chunks of at most `max_chars` characters.
/// Words longer than the limit are split mid-word.
pub fn split_for_speech(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let mut word_chars: Vec<char> = word.chars().collect();
        while word_chars.len() > max_chars {
            if current_len > 0 {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            let rest = word_chars.split_off(max_chars);
            let head = std::mem::replace(&mut word_chars, rest);
            chunks.push(head.into_iter().collect());
        }
        if word_chars.is_empty() {
            continue;
        }

        let word_len = word_chars.len();
        if current_len == 0 {
            current.extend(word_chars);
            current_len = word_len;
        } else if current_len + 1 + word_len > max_chars {
            chunks.push(std::mem::replace(
                &mut current,
                word_chars.into_iter().collect(),
            ));
            current_len = word_len;
        } else {
            current.push(' ');
            current.extend(word_chars);
            current_len += 1 + word_len;
        }
    }

    if current_len > 0 {
        chunks.push(current);
    }
    chunks
}
