// Click output trait - seam between the scheduler and the audio backend

use crate::audio::click::ClickTrigger;
use crate::audio::engine::EngineError;

/// Where scheduled beats are turned into sound
///
/// The scheduler worker owns one output. The cpal-backed implementation opens
/// the device lazily; tests drive a bare [`ClickTrigger`] and render its
/// voices offline.
pub trait ClickOutput {
    /// Make sure the audio clock is running, opening the device if needed
    fn ensure_running(&mut self) -> Result<(), EngineError>;

    /// Schedule a click at `time` on the audio clock
    fn trigger(&mut self, beat_index: u32, time: f64, downbeat: bool);
}

impl ClickOutput for ClickTrigger {
    fn ensure_running(&mut self) -> Result<(), EngineError> {
        if self.clock().is_running() {
            Ok(())
        } else {
            Err(EngineError::NoOutputDevice)
        }
    }

    fn trigger(&mut self, beat_index: u32, time: f64, downbeat: bool) {
        ClickTrigger::trigger(self, beat_index, time, downbeat);
    }
}
