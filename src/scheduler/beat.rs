// Beat model - scheduled beats and the playback cursor

/// One beat queued for playback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledBeat {
    /// Position in the measure, 0 is the downbeat
    pub beat_index: u32,
    /// Audio-clock seconds at which the click starts
    pub trigger_time: f64,
}

impl ScheduledBeat {
    pub fn new(beat_index: u32, trigger_time: f64) -> Self {
        Self {
            beat_index,
            trigger_time,
        }
    }

    pub fn is_downbeat(&self, beats_per_measure: u8) -> bool {
        self.beat_index % beats_per_measure.max(1) as u32 == 0
    }
}

/// Beat handed to the display queue, tagged with its playback session
///
/// Visual sync drops entries from any session other than the current one,
/// so nothing from a stopped session can light the indicator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedBeat {
    pub session: u32,
    pub beat: ScheduledBeat,
}

/// Next beat the scheduler will emit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    pub next_beat_index: u32,
    pub next_beat_time: f64,
}

impl PlaybackCursor {
    pub fn new(next_beat_time: f64) -> Self {
        Self {
            next_beat_index: 0,
            next_beat_time,
        }
    }

    /// Move past the current beat
    pub fn advance(&mut self, beats_per_measure: u8, interval: f64) {
        self.next_beat_index = (self.next_beat_index + 1) % beats_per_measure.max(1) as u32;
        self.next_beat_time += interval;
    }
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self::new(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_wraps_measure() {
        let mut cursor = PlaybackCursor::default();
        let indices: Vec<u32> = (0..7)
            .map(|_| {
                let index = cursor.next_beat_index;
                cursor.advance(3, 0.5);
                index
            })
            .collect();

        assert_eq!(indices, vec![0, 1, 2, 0, 1, 2, 0]);
        assert!((cursor.next_beat_time - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_downbeat() {
        assert!(ScheduledBeat::new(0, 0.0).is_downbeat(4));
        assert!(!ScheduledBeat::new(3, 0.0).is_downbeat(4));
        assert!(ScheduledBeat::new(0, 0.0).is_downbeat(1));
    }
}
