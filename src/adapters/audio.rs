//! Log-only audio player.
//!
//! Stand-in for the media clients (local files, Bluetooth, streaming).
//! Accepts any non-empty source; an empty source is reported as
//! unavailable.

use log::info;

use crate::app::ports::AudioPort;
use crate::error::AudioError;

#[derive(Debug, Default)]
pub struct LogAudioPlayer {
    playing: Option<String>,
}

impl LogAudioPlayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }
}

impl AudioPort for LogAudioPlayer {
    fn start_playback(&mut self, source: &str) -> Result<(), AudioError> {
        if source.trim().is_empty() {
            return Err(AudioError::SourceUnavailable);
        }
        info!("AUDIO | playing {}", source);
        self.playing = Some(source.to_string());
        Ok(())
    }

    fn stop_playback(&mut self) {
        if let Some(source) = self.playing.take() {
            info!("AUDIO | stopped {}", source);
        }
    }
}
