use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;
use crate::speech::Language;

/// External text-to-speech backend. Implementations return encoded MP3 audio for `text`
/// and report any provider-side rejection as `SynthesisFailed`.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn synthesize(&self, text: &str, lang: &Language) -> Result<Bytes>;
}
