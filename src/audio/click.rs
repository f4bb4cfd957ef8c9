// Click synthesis - sample-accurate scheduling of short metronome tones
//
// The scheduler side (`ClickTrigger`) converts a beat's audio-clock time into
// an absolute frame and pushes it to the audio thread. The audio side
// (`ClickVoices`) starts each click on that exact frame inside the callback
// buffer, so the moment `trigger` is called does not affect playback timing.

use crate::audio::clock::AudioClock;
use crate::config::MetronomeConfig;
use crate::messaging::channels::{ClickConsumer, ClickProducer};
use ringbuf::traits::{Consumer, Producer};
use std::f32::consts::PI;
use std::time::Duration;

/// Maximum clicks waiting or sounding at once in the audio thread
const MAX_VOICES: usize = 16;

/// Release ramp at the end of each click, avoids a pop on cut-off
const RELEASE_MS: f32 = 5.0;

/// Click type, picks the tone frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickType {
    /// First beat of the measure
    Downbeat,
    Regular,
}

impl ClickType {
    pub fn for_beat(downbeat: bool) -> Self {
        if downbeat {
            ClickType::Downbeat
        } else {
            ClickType::Regular
        }
    }
}

/// One click as seen by the audio thread
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickEvent {
    /// Absolute frame (see [`AudioClock::current_frame`]) where the tone starts
    pub start_frame: u64,
    pub frequency: f32,
    pub duration_frames: u32,
    pub amplitude: f32,
}

/// Tone parameters shared by every click
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickTone {
    pub downbeat_frequency: f32,
    pub beat_frequency: f32,
    pub duration: Duration,
    pub amplitude: f32,
}

impl ClickTone {
    pub fn from_config(config: &MetronomeConfig) -> Self {
        Self {
            downbeat_frequency: config.downbeat_frequency,
            beat_frequency: config.beat_frequency,
            duration: config.click_duration,
            amplitude: config.click_amplitude.clamp(0.0, 1.0),
        }
    }

    pub fn frequency(&self, click_type: ClickType) -> f32 {
        match click_type {
            ClickType::Downbeat => self.downbeat_frequency,
            ClickType::Regular => self.beat_frequency,
        }
    }
}

impl Default for ClickTone {
    fn default() -> Self {
        Self::from_config(&MetronomeConfig::default())
    }
}

/// Scheduler-side handle that queues clicks for the audio thread
pub struct ClickTrigger {
    clock: AudioClock,
    tone: ClickTone,
    tx: ClickProducer,
}

impl ClickTrigger {
    pub fn new(clock: AudioClock, tone: ClickTone, tx: ClickProducer) -> Self {
        Self { clock, tone, tx }
    }

    /// Schedule a click to start at `time` (audio-clock seconds)
    ///
    /// Returns false if the audio thread's queue is full and the click was dropped.
    pub fn trigger(&mut self, beat_index: u32, time: f64, downbeat: bool) -> bool {
        let click_type = ClickType::for_beat(downbeat);
        let event = ClickEvent {
            start_frame: self.clock.time_to_frame(time),
            frequency: self.tone.frequency(click_type),
            duration_frames: self.clock.seconds_to_frames(self.tone.duration.as_secs_f64()) as u32,
            amplitude: self.tone.amplitude,
        };

        if self.tx.try_push(event).is_err() {
            log::warn!("Click queue full, beat {} at {:.3}s dropped", beat_index, time);
            return false;
        }
        true
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    event: ClickEvent,
    position: u32,
}

impl Voice {
    fn next_sample(&mut self, sample_rate: f32, release_frames: u32) -> f32 {
        let t = self.position as f32 / sample_rate;
        let remaining = self.event.duration_frames - self.position;
        let envelope = if remaining < release_frames {
            remaining as f32 / release_frames as f32
        } else {
            1.0
        };
        self.position += 1;
        (2.0 * PI * self.event.frequency * t).sin() * self.event.amplitude * envelope
    }

    fn is_finished(&self) -> bool {
        self.position >= self.event.duration_frames
    }
}

/// Audio-side click renderer
///
/// Everything is pre-allocated: rendering never allocates or blocks.
pub struct ClickVoices {
    rx: ClickConsumer,
    sample_rate: f32,
    release_frames: u32,
    pending: Vec<ClickEvent>,
    active: Vec<Voice>,
}

impl ClickVoices {
    pub fn new(rx: ClickConsumer, sample_rate: f32) -> Self {
        Self {
            rx,
            sample_rate,
            release_frames: ((RELEASE_MS / 1000.0) * sample_rate).max(1.0) as u32,
            pending: Vec::with_capacity(MAX_VOICES),
            active: Vec::with_capacity(MAX_VOICES),
        }
    }

    /// Render a mono buffer whose first sample sits at absolute frame `first_frame`
    pub fn render(&mut self, output: &mut [f32], first_frame: u64) {
        while self.pending.len() < MAX_VOICES {
            match self.rx.try_pop() {
                Some(event) if event.duration_frames > 0 => self.pending.push(event),
                Some(_) => {}
                None => break,
            }
        }

        for (offset, sample) in output.iter_mut().enumerate() {
            let frame = first_frame + offset as u64;
            self.start_due(frame);

            let mut mixed = 0.0;
            for voice in self.active.iter_mut() {
                mixed += voice.next_sample(self.sample_rate, self.release_frames);
            }
            self.active.retain(|voice| !voice.is_finished());
            *sample = mixed;
        }
    }

    /// Clicks that are sounding or waiting for their start frame
    pub fn in_flight(&self) -> usize {
        self.pending.len() + self.active.len()
    }

    fn start_due(&mut self, frame: u64) {
        let mut i = 0;
        while i < self.pending.len() {
            // Late events start right away rather than being skipped
            if self.pending[i].start_frame <= frame && self.active.len() < MAX_VOICES {
                let event = self.pending.swap_remove(i);
                self.active.push(Voice { event, position: 0 });
            } else {
                i += 1;
            }
        }
    }
}
