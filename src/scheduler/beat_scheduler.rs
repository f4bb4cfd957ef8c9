// Beat scheduler - look-ahead conversion of settings into beat timestamps
//
// Each pass emits every beat whose trigger time falls before
// `now + look_ahead`. Beat times are derived only from the audio clock and
// the settings in effect at the pass, never from when the pass runs, so a
// late or early tick cannot drift the rhythm.

use super::beat::{PlaybackCursor, ScheduledBeat};
use crate::settings::MetronomeSettings;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Playing,
}

/// IDLE ⇄ PLAYING state machine owning the playback cursor
#[derive(Debug, Clone)]
pub struct BeatScheduler {
    state: SchedulerState,
    cursor: PlaybackCursor,
    look_ahead: f64,
    /// Lower bound on the window, covers one audio callback plus a tick
    min_window: f64,
    /// Stop happened, session reset still to apply
    reset_pending: bool,
}

impl BeatScheduler {
    /// `look_ahead` in audio-clock seconds
    pub fn new(look_ahead: f64) -> Self {
        Self {
            state: SchedulerState::Idle,
            cursor: PlaybackCursor::default(),
            look_ahead,
            min_window: 0.0,
            reset_pending: false,
        }
    }

    /// Widen the window when the audio buffer is longer than the look-ahead
    pub fn set_min_window(&mut self, min_window: f64) {
        if min_window.is_finite() {
            self.min_window = min_window.max(0.0);
        }
    }

    /// Effective scheduling window in seconds
    pub fn window(&self) -> f64 {
        self.look_ahead.max(self.min_window)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == SchedulerState::Playing
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn look_ahead(&self) -> f64 {
        self.look_ahead
    }

    /// IDLE → PLAYING with the cursor time at `now`
    ///
    /// A pending stop reset is applied first. Returns false if already playing.
    pub fn start(&mut self, now: f64) -> bool {
        if self.is_playing() {
            return false;
        }
        self.finish_stop();
        self.cursor.next_beat_time = now;
        self.state = SchedulerState::Playing;
        true
    }

    /// PLAYING → IDLE; no beat is scheduled after this returns
    ///
    /// Idempotent. The cursor reset waits for [`BeatScheduler::finish_stop`].
    pub fn stop(&mut self) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.state = SchedulerState::Idle;
        self.reset_pending = true;
        true
    }

    /// Apply the reset that follows a stop: index back to the downbeat
    ///
    /// Returns true if a reset was pending, so the caller can start a fresh
    /// audio clock session.
    pub fn finish_stop(&mut self) -> bool {
        if !self.reset_pending {
            return false;
        }
        self.reset_pending = false;
        self.cursor = PlaybackCursor::new(0.0);
        true
    }

    /// Make the next emitted beat a downbeat, timing untouched
    pub fn restart_measure(&mut self) {
        self.cursor.next_beat_index = 0;
    }

    /// One scheduling pass: emit every beat due before `now + window()`
    ///
    /// Returns the number of beats emitted. Does nothing while idle.
    pub fn schedule<F>(&mut self, now: f64, settings: &MetronomeSettings, mut emit: F) -> usize
    where
        F: FnMut(ScheduledBeat),
    {
        if !self.is_playing() {
            return 0;
        }
        if !now.is_finite() {
            warn!("Scheduling pass skipped, audio clock returned {}", now);
            return 0;
        }

        let beats = settings.beats_per_measure.max(1);
        if self.cursor.next_beat_index >= beats as u32 {
            self.cursor.next_beat_index = 0;
        }

        let window = self.window();

        // Host was suspended: skip the missed beats instead of bursting them
        if self.cursor.next_beat_time + window < now {
            warn!(
                "Scheduler fell behind by {:.3}s, resyncing",
                now - self.cursor.next_beat_time
            );
            self.cursor.next_beat_time = now;
        }

        let interval = settings.beat_interval();
        let horizon = now + window;
        let mut emitted = 0;

        while self.cursor.next_beat_time < horizon {
            emit(ScheduledBeat::new(
                self.cursor.next_beat_index,
                self.cursor.next_beat_time,
            ));
            self.cursor.advance(beats, interval);
            emitted += 1;
        }

        if emitted > 0 {
            debug!(
                "Scheduled {} beat(s), next #{} at {:.4}s",
                emitted, self.cursor.next_beat_index, self.cursor.next_beat_time
            );
        }
        emitted
    }
}
