// Engine configuration - timing and click synthesis constants

use std::time::Duration;

/// Errors raised by an inconsistent engine configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("tick interval ({tick_ms} ms) must be shorter than the look-ahead window ({look_ahead_ms} ms)")]
    TickTooSlow { tick_ms: u128, look_ahead_ms: u128 },

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Timing and audio parameters of the metronome engine
///
/// These are not user settings: they stay fixed for the lifetime of the
/// process. User-facing values (tempo, beats, subdivision) live in
/// [`crate::settings::MetronomeSettings`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetronomeConfig {
    /// Period of the tick source
    pub tick_interval: Duration,
    /// How far ahead of the audio clock beats are scheduled on each pass
    pub look_ahead: Duration,
    /// Delay between stop and the session reset, lets queued clicks ring out
    pub stop_grace: Duration,
    /// Length of one click tone
    pub click_duration: Duration,
    pub downbeat_frequency: f32,
    pub beat_frequency: f32,
    /// Peak amplitude of the click tone (0.0 to 1.0)
    pub click_amplitude: f32,
    /// Requested frames per audio callback
    ///
    /// Capped so one buffer fits inside the look-ahead window minus a tick.
    pub buffer_frames: u32,
    pub beat_queue_capacity: usize,
    pub click_queue_capacity: usize,
    pub notification_capacity: usize,
}

impl Default for MetronomeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(25),
            look_ahead: Duration::from_millis(100),
            stop_grace: Duration::from_millis(100),
            click_duration: Duration::from_millis(40),
            downbeat_frequency: 880.0,
            beat_frequency: 440.0,
            click_amplitude: 0.5,
            buffer_frames: 256,
            // 300 BPM in eighths over a 100ms window never exceeds a handful of
            // beats, 64 leaves room for a stalled UI thread.
            beat_queue_capacity: 64,
            click_queue_capacity: 64,
            notification_capacity: 32,
        }
    }
}

impl MetronomeConfig {
    /// Look-ahead window in audio-clock seconds
    pub fn look_ahead_secs(&self) -> f64 {
        self.look_ahead.as_secs_f64()
    }

    /// Longest callback buffer that still leaves a full tick of margin
    pub fn max_buffer_secs(&self) -> f64 {
        self.look_ahead
            .saturating_sub(self.tick_interval)
            .as_secs_f64()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroValue("tick interval"));
        }
        if self.click_duration.is_zero() {
            return Err(ConfigError::ZeroValue("click duration"));
        }
        if self.buffer_frames == 0 {
            return Err(ConfigError::ZeroValue("buffer frames"));
        }
        if self.beat_queue_capacity == 0 {
            return Err(ConfigError::ZeroValue("beat queue capacity"));
        }
        if self.click_queue_capacity == 0 {
            return Err(ConfigError::ZeroValue("click queue capacity"));
        }
        if self.tick_interval >= self.look_ahead {
            return Err(ConfigError::TickTooSlow {
                tick_ms: self.tick_interval.as_millis(),
                look_ahead_ms: self.look_ahead.as_millis(),
            });
        }
        Ok(())
    }
}
