// Audio clock - monotonic, sample-accurate time base shared by all threads

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Frame counter advanced by the audio callback, read everywhere else
///
/// Times handed out by [`AudioClock::now`] are seconds since the session
/// origin. [`AudioClock::restart`] moves the origin to the current frame,
/// which gives the next playback session a fresh time base starting at 0
/// while the hardware frame counter keeps running.
#[derive(Clone, Debug)]
pub struct AudioClock {
    frames: Arc<AtomicU64>,
    origin: Arc<AtomicU64>,
    /// 0 until an output stream is bound
    sample_rate: Arc<AtomicU32>,
    /// Frames rendered per callback, 0 while unknown
    block_frames: Arc<AtomicU32>,
}

impl AudioClock {
    /// Create an unbound clock: it reads 0 until a stream drives it
    pub fn new() -> Self {
        Self {
            frames: Arc::new(AtomicU64::new(0)),
            origin: Arc::new(AtomicU64::new(0)),
            sample_rate: Arc::new(AtomicU32::new(0)),
            block_frames: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Bind the clock to an output stream's sample rate
    pub fn bind(&self, sample_rate: u32) {
        self.sample_rate.store(sample_rate, Ordering::Release);
    }

    /// True once an output stream drives the clock
    pub fn is_running(&self) -> bool {
        self.sample_rate() > 0
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate.load(Ordering::Acquire)
    }

    /// Record the callback buffer length
    ///
    /// The clock only moves once per callback, so a beat must be queued a
    /// whole buffer ahead of the current reading to start on its frame.
    pub fn set_block_frames(&self, frames: u32) {
        self.block_frames.store(frames, Ordering::Relaxed);
    }

    pub fn block_frames(&self) -> u32 {
        self.block_frames.load(Ordering::Relaxed)
    }

    /// Callback buffer length in seconds, 0 while unknown or unbound
    pub fn block_secs(&self) -> f64 {
        let sample_rate = self.sample_rate();
        if sample_rate == 0 {
            return 0.0;
        }
        self.block_frames() as f64 / sample_rate as f64
    }

    /// Advance by one callback's worth of frames (audio thread only)
    pub fn advance(&self, frames: usize) {
        self.frames.fetch_add(frames as u64, Ordering::Release);
    }

    /// Absolute frame position since the stream started
    pub fn current_frame(&self) -> u64 {
        self.frames.load(Ordering::Acquire)
    }

    /// Seconds elapsed since the session origin
    pub fn now(&self) -> f64 {
        let sample_rate = self.sample_rate();
        if sample_rate == 0 {
            return 0.0;
        }
        let elapsed = self
            .current_frame()
            .saturating_sub(self.origin.load(Ordering::Acquire));
        elapsed as f64 / sample_rate as f64
    }

    /// Start a fresh session time base at the current frame
    pub fn restart(&self) {
        self.origin
            .store(self.current_frame(), Ordering::Release);
    }

    /// Absolute frame at which a session time falls
    ///
    /// Negative times map to the session origin.
    pub fn time_to_frame(&self, time: f64) -> u64 {
        let origin = self.origin.load(Ordering::Acquire);
        origin + self.seconds_to_frames(time.max(0.0))
    }

    /// Length of a duration in frames at the bound sample rate
    pub fn seconds_to_frames(&self, seconds: f64) -> u64 {
        (seconds * self.sample_rate() as f64).round() as u64
    }
}

impl Default for AudioClock {
    fn default() -> Self {
        Self::new()
    }
}
