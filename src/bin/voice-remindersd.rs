use clap::Parser;
use voice_reminders::config::Config;
use voice_reminders::daemon;
use voice_reminders::error::Result;

#[derive(Parser, Debug)]
#[command(name = "voice-remindersd")]
#[command(about = "Voice reminders HTTP backend")]
struct Cli {
    /// JSON config file; flags below override its values.
    #[arg(long, env = "VOICE_REMINDERS_CONFIG")]
    config: Option<String>,

    #[arg(long, env = "VOICE_REMINDERS_HOST")]
    host: Option<String>,

    #[arg(long, env = "VOICE_REMINDERS_PORT")]
    port: Option<u16>,

    #[arg(long, env = "VOICE_REMINDERS_DB")]
    db: Option<String>,

    #[arg(long, env = "VOICE_REMINDERS_AUDIO_DIR")]
    audio_dir: Option<String>,

    #[arg(long, env = "VOICE_REMINDERS_TTS_URL")]
    tts_url: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::convention_defaults(),
        };
        if let Some(host) = self.host {
            config.server.host = host;
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(db) = self.db {
            config.storage.sqlite_path = db;
        }
        if let Some(audio_dir) = self.audio_dir {
            config.speech.audio_dir = audio_dir;
        }
        if let Some(tts_url) = self.tts_url {
            config.speech.base_url = tts_url;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Cli::parse().into_config()?;
    voice_reminders::logging::init_tracing("voice_remindersd", &config.logging);

    daemon::run(config).await
}
