// Visual sync - per-frame drain of the beat queue against the audio clock
//
// Runs on the UI thread, once per display refresh while playing. The
// indicator only changes when a beat has actually crossed its trigger time,
// so the display follows what is audible rather than what is scheduled.

use super::indicator::IndicatorStrip;
use crate::messaging::channels::BeatConsumer;
use ringbuf::traits::{Consumer, Observer};

pub struct VisualSync {
    queue: BeatConsumer,
    session: u32,
    playing: bool,
    last_displayed: Option<u32>,
    redraws: usize,
}

impl VisualSync {
    pub fn new(queue: BeatConsumer) -> Self {
        Self {
            queue,
            session: 0,
            playing: false,
            last_displayed: None,
            redraws: 0,
        }
    }

    /// Begin following beats tagged with `session`
    pub fn start(&mut self, session: u32) {
        self.queue.clear();
        self.session = session;
        self.playing = true;
        self.last_displayed = None;
    }

    /// Stop following; one final redraw back to the all-off strip
    ///
    /// Idempotent: stopping while stopped does not redraw.
    pub fn stop(&mut self) {
        self.queue.clear();
        if !self.playing {
            return;
        }
        self.playing = false;
        self.last_displayed = None;
        self.redraws += 1;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// One refresh: drain beats due at `now`, returns true if the strip changed
    pub fn frame(&mut self, now: f64) -> bool {
        if !self.playing {
            return false;
        }

        let mut current = self.last_displayed;
        while let Some(head) = self.queue.try_peek().copied() {
            if head.session != self.session {
                // Left over from an earlier session
                self.queue.skip(1);
                continue;
            }
            if head.beat.trigger_time > now {
                break;
            }
            current = Some(head.beat.beat_index);
            self.queue.skip(1);
        }

        if current == self.last_displayed {
            return false;
        }
        self.last_displayed = current;
        self.redraws += 1;
        true
    }

    pub fn last_displayed(&self) -> Option<u32> {
        self.last_displayed
    }

    /// Number of times the strip changed (including the final stop redraw)
    pub fn redraws(&self) -> usize {
        self.redraws
    }

    /// Beats still waiting for their trigger time
    pub fn pending(&self) -> usize {
        self.queue.occupied_len()
    }

    pub fn indicator(&self, beats_per_measure: u8) -> IndicatorStrip {
        IndicatorStrip::with_active(beats_per_measure, self.last_displayed)
    }
}
