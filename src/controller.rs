// Controller - control surface used by the UI
//
// Single writer of the settings: every accepted change goes to the store and
// then to the shared snapshot read by the scheduler.

use crate::audio::clock::AudioClock;
use crate::audio::engine::SharedNotificationProducer;
use crate::audio::output::ClickOutput;
use crate::config::MetronomeConfig;
use crate::messaging::channels::create_beat_queue;
use crate::messaging::command::ControlMessage;
use crate::messaging::notification::Notification;
use crate::scheduler::SchedulerHandle;
use crate::settings::{Direction, MetronomeSettings, SettingsError, SettingsStore, SharedSettings};
use crate::visual::{IndicatorStrip, VisualSync};
use log::{debug, info, warn};
use ringbuf::traits::Producer;

pub struct MetronomeController {
    settings: MetronomeSettings,
    store: SettingsStore,
    shared: SharedSettings,
    scheduler: SchedulerHandle,
    visual: VisualSync,
    clock: AudioClock,
    notification_tx: SharedNotificationProducer,
    session: u32,
}

impl MetronomeController {
    /// Load the settings and spawn the scheduler worker
    ///
    /// `make_output` builds the click output on the worker thread.
    pub fn spawn<O, F>(
        config: &MetronomeConfig,
        mut store: SettingsStore,
        clock: AudioClock,
        notification_tx: SharedNotificationProducer,
        make_output: F,
    ) -> Self
    where
        O: ClickOutput + 'static,
        F: FnOnce() -> O + Send + 'static,
    {
        let settings = store.load();
        info!(
            "Settings: {} bpm, {} beats, {}",
            settings.tempo, settings.beats_per_measure, settings.note_subdivision
        );

        let shared = SharedSettings::new(settings);
        let (beat_tx, beat_rx) = create_beat_queue(config.beat_queue_capacity);
        let scheduler = SchedulerHandle::spawn(
            config,
            clock.clone(),
            shared.clone(),
            beat_tx,
            notification_tx.clone(),
            make_output,
        );

        let controller = Self {
            settings,
            store,
            shared,
            scheduler,
            visual: VisualSync::new(beat_rx),
            clock,
            notification_tx,
            session: 0,
        };
        if controller.store.is_disabled() {
            controller.notify_settings_unavailable();
        }
        controller
    }

    pub fn settings(&self) -> MetronomeSettings {
        self.settings
    }

    pub fn is_playing(&self) -> bool {
        self.visual.is_playing() && self.scheduler.playing().get()
    }

    /// Start when idle, stop when playing; returns the new playing state
    pub fn toggle_playback(&mut self) -> bool {
        self.sync_playing_flag();
        if self.visual.is_playing() {
            self.stop();
        } else {
            self.start();
        }
        self.is_playing()
    }

    pub fn adjust_beats(&mut self, delta: i32) -> Option<MetronomeSettings> {
        let next = self.settings.with_beats_delta(delta)?;
        self.apply(next);
        if self.visual.is_playing() {
            self.scheduler.send(ControlMessage::RestartMeasure);
        }
        Some(next)
    }

    pub fn adjust_tempo(&mut self, delta: i32) -> Option<MetronomeSettings> {
        let next = self.settings.with_tempo_delta(delta)?;
        self.apply(next);
        Some(next)
    }

    pub fn adjust_note_subdivision(&mut self, direction: Direction) -> Option<MetronomeSettings> {
        let next = self.settings.with_subdivision_step(direction)?;
        self.apply(next);
        Some(next)
    }

    /// One display refresh; returns true when the indicator changed
    ///
    /// The caller keeps requesting frames only while `is_playing()`.
    pub fn frame(&mut self) -> bool {
        if self.sync_playing_flag() {
            return true;
        }
        self.visual.frame(self.clock.now())
    }

    pub fn indicator(&self) -> IndicatorStrip {
        self.visual.indicator(self.settings.beats_per_measure)
    }

    pub fn redraws(&self) -> usize {
        self.visual.redraws()
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    fn start(&mut self) {
        self.session = self.session.wrapping_add(1);
        self.scheduler.playing().set(true);
        self.visual.start(self.session);
        self.scheduler.send(ControlMessage::Start {
            session: self.session,
        });
    }

    fn stop(&mut self) {
        self.scheduler.playing().set(false);
        self.visual.stop();
        self.scheduler.send(ControlMessage::Stop);
    }

    /// Follow a stop decided by the worker (audio output unavailable)
    fn sync_playing_flag(&mut self) -> bool {
        if self.visual.is_playing() && !self.scheduler.playing().get() {
            debug!("Worker cleared the playing flag, stopping display");
            self.stop();
            return true;
        }
        false
    }

    fn apply(&mut self, next: MetronomeSettings) {
        self.settings = next;
        self.shared.store(next);
        match self.store.save(&next) {
            Ok(()) => {}
            Err(SettingsError::WritesDisabled) => debug!("Settings not saved, storage disabled"),
            Err(e) => {
                warn!("Settings not saved: {}", e);
                self.notify_settings_unavailable();
            }
        }
    }

    fn notify_settings_unavailable(&self) {
        if let Ok(mut tx) = self.notification_tx.try_lock() {
            let _ = tx.try_push(Notification::warning("Settings cannot be saved this session"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::click::{ClickTone, ClickTrigger};
    use crate::messaging::channels::{create_click_channel, create_notification_channel};
    use crate::settings::{MAX_BEATS, MAX_TEMPO, MIN_BEATS, MIN_TEMPO, NoteSubdivision};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn controller(dir: &TempDir, clock: AudioClock) -> MetronomeController {
        let config = MetronomeConfig::default();
        let store = SettingsStore::with_path(dir.path().join("settings.json"));
        let (notification_tx, _notification_rx) = create_notification_channel(8);
        let output_clock = clock.clone();
        MetronomeController::spawn(
            &config,
            store,
            clock,
            Arc::new(Mutex::new(notification_tx)),
            move || {
                let (tx, _rx) = create_click_channel(64);
                ClickTrigger::new(output_clock, ClickTone::default(), tx)
            },
        )
    }

    fn bound_clock() -> AudioClock {
        let clock = AudioClock::new();
        clock.bind(48_000);
        clock
    }

    #[test]
    fn test_tempo_clamps() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&dir, bound_clock());

        assert_eq!(controller.adjust_tempo(250).unwrap().tempo, MAX_TEMPO);
        assert!(controller.adjust_tempo(1).is_none());
        assert_eq!(controller.adjust_tempo(-500).unwrap().tempo, MIN_TEMPO);
    }

    #[test]
    fn test_beats_out_of_bounds_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&dir, bound_clock());

        assert!(controller.adjust_beats(9).is_none());
        assert_eq!(controller.adjust_beats(8).unwrap().beats_per_measure, MAX_BEATS);
        assert!(controller.adjust_beats(1).is_none());
        assert_eq!(controller.adjust_beats(-11).unwrap().beats_per_measure, MIN_BEATS);
        assert!(controller.adjust_beats(-1).is_none());
        assert_eq!(controller.settings().beats_per_measure, MIN_BEATS);
    }

    #[test]
    fn test_changes_are_persisted() {
        let dir = TempDir::new().unwrap();
        {
            let mut controller = controller(&dir, bound_clock());
            controller.adjust_tempo(13);
            controller.adjust_note_subdivision(Direction::Up);
        }

        let mut store = SettingsStore::with_path(dir.path().join("settings.json"));
        let loaded = store.load();
        assert_eq!(loaded.tempo, 80);
        assert_eq!(loaded.note_subdivision, NoteSubdivision::Eighth);
    }

    #[test]
    fn test_toggle_playback() {
        let dir = TempDir::new().unwrap();
        let mut controller = controller(&dir, bound_clock());

        assert!(controller.toggle_playback());
        assert!(controller.is_playing());
        assert!(!controller.toggle_playback());
        assert!(!controller.is_playing());
        assert_eq!(controller.indicator().active(), None);
    }

    #[test]
    fn test_first_beat_is_displayed() {
        let dir = TempDir::new().unwrap();
        let clock = bound_clock();
        let mut controller = controller(&dir, clock.clone());

        controller.toggle_playback();
        let deadline = Instant::now() + Duration::from_secs(5);
        while controller.indicator().active().is_none() && Instant::now() < deadline {
            controller.frame();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert_eq!(controller.indicator().active(), Some(0));
    }

    #[test]
    fn test_unavailable_output_falls_back_to_idle() {
        let dir = TempDir::new().unwrap();
        // Never bound: the click output reports no device
        let mut controller = controller(&dir, AudioClock::new());

        controller.toggle_playback();
        let deadline = Instant::now() + Duration::from_secs(5);
        while controller.is_playing() && Instant::now() < deadline {
            controller.frame();
            std::thread::sleep(Duration::from_millis(5));
        }
        controller.frame();
        assert!(!controller.is_playing());

        // The next toggle tries again
        controller.toggle_playback();
    }
}
