// Scheduler worker lifecycle with an offline click output
//
// The test thread plays the part of the audio callback: it renders the click
// voices and advances the audio clock in 10 ms blocks at roughly real time.

use mymetronome::audio::click::{ClickTone, ClickTrigger, ClickVoices};
use mymetronome::messaging::channels::BeatConsumer;
use mymetronome::messaging::command::ControlMessage;
use mymetronome::scheduler::QueuedBeat;
use mymetronome::settings::{MetronomeSettings, NoteSubdivision, SharedSettings};
use mymetronome::{
    AudioClock, MetronomeConfig, SchedulerHandle, create_beat_queue, create_click_channel,
    create_notification_channel,
};
use ringbuf::traits::Consumer;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const SAMPLE_RATE: u32 = 48_000;
const BLOCK_FRAMES: usize = 480;

struct Rig {
    handle: SchedulerHandle,
    beats: BeatConsumer,
    voices: ClickVoices,
    clock: AudioClock,
}

impl Rig {
    fn new(settings: MetronomeSettings, bound: bool) -> Self {
        let config = MetronomeConfig::default();
        let clock = AudioClock::new();
        if bound {
            clock.bind(SAMPLE_RATE);
        }

        let (beat_tx, beats) = create_beat_queue(256);
        let (click_tx, click_rx) = create_click_channel(256);
        let (notification_tx, _notification_rx) = create_notification_channel(8);
        let tone = ClickTone::from_config(&config);
        let output_clock = clock.clone();

        let handle = SchedulerHandle::spawn(
            &config,
            clock.clone(),
            SharedSettings::new(settings),
            beat_tx,
            Arc::new(Mutex::new(notification_tx)),
            move || ClickTrigger::new(output_clock, tone, click_tx),
        );

        Self {
            handle,
            beats,
            voices: ClickVoices::new(click_rx, SAMPLE_RATE as f32),
            clock,
        }
    }

    /// Render and advance the clock for `seconds`, returning the peak level
    fn play_for(&mut self, seconds: f64) -> f32 {
        let blocks = (seconds * SAMPLE_RATE as f64 / BLOCK_FRAMES as f64).ceil() as usize;
        let mut buffer = [0.0f32; BLOCK_FRAMES];
        let mut peak = 0.0f32;
        for _ in 0..blocks {
            self.voices.render(&mut buffer, self.clock.current_frame());
            peak = buffer.iter().fold(peak, |peak, s| peak.max(s.abs()));
            self.clock.advance(BLOCK_FRAMES);
            thread::sleep(Duration::from_millis(10));
        }
        peak
    }

    fn drain(&mut self) -> Vec<QueuedBeat> {
        self.beats.pop_iter().collect()
    }

    /// Wait (clock frozen) for the worker to queue a beat of `session`
    fn wait_for_session(&mut self, session: u32) -> Vec<QueuedBeat> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut seen = Vec::new();
        while Instant::now() < deadline {
            seen.extend(self.drain());
            if seen.iter().any(|b| b.session == session) {
                break;
            }
            thread::sleep(Duration::from_millis(5));
        }
        seen
    }
}

fn fast_settings() -> MetronomeSettings {
    // 0.2 s between clicks
    MetronomeSettings::new(4, NoteSubdivision::Quarter, 300)
}

#[test]
fn test_playback_schedules_in_time_and_sounds() {
    let mut rig = Rig::new(fast_settings(), true);
    rig.handle.send(ControlMessage::Start { session: 1 });

    // First beat lands at the clock reading taken on start
    let mut beats = rig.wait_for_session(1);
    let peak = rig.play_for(1.5);
    beats.extend(rig.drain());

    assert!(beats.len() >= 5, "only {} beats", beats.len());
    assert!(peak > 0.1, "clicks not rendered, peak {}", peak);
    for (n, queued) in beats.iter().enumerate() {
        assert_eq!(queued.session, 1);
        assert_eq!(queued.beat.beat_index, (n % 4) as u32);
        assert!((queued.beat.trigger_time - n as f64 * 0.2).abs() < 1e-9);
    }
}

#[test]
fn test_no_beats_after_stop() {
    let mut rig = Rig::new(fast_settings(), true);
    rig.handle.send(ControlMessage::Start { session: 1 });
    rig.play_for(0.5);

    rig.handle.send(ControlMessage::Stop);
    thread::sleep(Duration::from_millis(100));
    rig.drain();

    rig.play_for(0.6);
    assert!(rig.drain().is_empty());
}

#[test]
fn test_immediate_restart_starts_fresh_session() {
    let mut rig = Rig::new(fast_settings(), true);
    rig.handle.send(ControlMessage::Start { session: 1 });
    rig.play_for(0.7);

    // Restart inside the grace delay, clock frozen meanwhile
    rig.handle.send(ControlMessage::Stop);
    rig.handle.send(ControlMessage::Start { session: 2 });
    let seen = rig.wait_for_session(2);

    let first = seen
        .iter()
        .find(|b| b.session == 2)
        .expect("no beat from the new session");
    assert_eq!(first.beat.beat_index, 0);
    assert_eq!(first.beat.trigger_time, 0.0);
    assert_eq!(rig.clock.now(), 0.0);

    // New session keeps a regular grid from zero
    rig.play_for(0.5);
    let next: Vec<_> = rig.drain().into_iter().filter(|b| b.session == 2).collect();
    for (n, queued) in next.iter().enumerate() {
        assert!((queued.beat.trigger_time - (n + 1) as f64 * 0.2).abs() < 1e-9);
    }
}

#[test]
fn test_restart_measure_next_beat_is_downbeat() {
    let mut rig = Rig::new(fast_settings(), true);
    rig.handle.send(ControlMessage::Start { session: 1 });
    rig.play_for(0.3);

    // Frozen clock: the worker has nothing left to schedule
    thread::sleep(Duration::from_millis(100));
    let before = rig.drain();
    assert!(before.last().map(|b| b.beat.beat_index).unwrap_or(0) > 0);

    rig.handle.send(ControlMessage::RestartMeasure);
    thread::sleep(Duration::from_millis(50));
    rig.play_for(0.3);

    let after = rig.drain();
    assert!(!after.is_empty());
    assert_eq!(after[0].beat.beat_index, 0);
}

#[test]
fn test_missing_audio_output_clears_playing_flag() {
    let mut rig = Rig::new(fast_settings(), false);
    rig.handle.playing().set(true);
    rig.handle.send(ControlMessage::Start { session: 1 });

    let deadline = Instant::now() + Duration::from_secs(5);
    while rig.handle.playing().get() && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert!(!rig.handle.playing().get());
    assert!(rig.drain().is_empty());
}
