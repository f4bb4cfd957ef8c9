// Scheduler worker - thread hosting the beat scheduler
//
// Waits on three sources: control messages from the UI, ticks from the tick
// source, and the stop grace timer. Every scheduled beat goes to the click
// output and, tagged with the session, to the display queue.

use crate::audio::clock::AudioClock;
use crate::audio::engine::SharedNotificationProducer;
use crate::audio::output::ClickOutput;
use crate::config::MetronomeConfig;
use crate::messaging::channels::BeatProducer;
use crate::messaging::command::ControlMessage;
use crate::messaging::notification::Notification;
use crate::scheduler::beat::QueuedBeat;
use crate::scheduler::beat_scheduler::BeatScheduler;
use crate::scheduler::tick::{Tick, TickSource};
use crate::settings::SharedSettings;
use crossbeam_channel::{Receiver, Sender, after, never, select};
use log::{debug, error, info, warn};
use ringbuf::traits::Producer;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// "Still playing" flag shared by the controller and the worker
///
/// The controller raises it on start; either side lowers it (the worker
/// does when the audio device cannot be opened).
#[derive(Clone, Debug, Default)]
pub struct PlayingFlag {
    inner: Arc<AtomicBool>,
}

impl PlayingFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> bool {
        self.inner.load(Ordering::Acquire)
    }

    pub fn set(&self, playing: bool) {
        self.inner.store(playing, Ordering::Release);
    }
}

/// UI-side handle to the worker thread
///
/// Dropping it stops playback and joins the thread.
pub struct SchedulerHandle {
    control_tx: Sender<ControlMessage>,
    playing: PlayingFlag,
    thread: Option<thread::JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Spawn the worker; `make_output` runs on the worker thread
    ///
    /// The output is built in place because CPAL streams are not `Send` on
    /// every platform.
    pub fn spawn<O, F>(
        config: &MetronomeConfig,
        clock: AudioClock,
        settings: SharedSettings,
        beat_tx: BeatProducer,
        notification_tx: SharedNotificationProducer,
        make_output: F,
    ) -> Self
    where
        O: ClickOutput + 'static,
        F: FnOnce() -> O + Send + 'static,
    {
        let (control_tx, control_rx) = crossbeam_channel::unbounded();
        let playing = PlayingFlag::new();
        let worker_playing = playing.clone();
        let tick_interval = config.tick_interval;
        let stop_grace = config.stop_grace;
        let look_ahead = config.look_ahead_secs();

        let thread = thread::Builder::new()
            .name("metronome-scheduler".to_string())
            .spawn(move || {
                let (tick_source, tick_rx) = TickSource::spawn(tick_interval);
                let worker = SchedulerWorker {
                    scheduler: BeatScheduler::new(look_ahead),
                    output: make_output(),
                    clock,
                    settings,
                    beat_tx,
                    notification_tx,
                    playing: worker_playing,
                    tick_source,
                    tick_interval,
                    stop_grace,
                    session: 0,
                };
                worker.run(control_rx, tick_rx);
            })
            .ok();

        if thread.is_none() {
            error!("Failed to spawn scheduler thread");
        }

        Self {
            control_tx,
            playing,
            thread,
        }
    }

    pub fn send(&self, message: ControlMessage) {
        if self.control_tx.send(message).is_err() {
            warn!("Scheduler thread gone, {:?} ignored", message);
        }
    }

    pub fn playing(&self) -> &PlayingFlag {
        &self.playing
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        let _ = self.control_tx.send(ControlMessage::Quit);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

struct SchedulerWorker<O: ClickOutput> {
    scheduler: BeatScheduler,
    output: O,
    clock: AudioClock,
    settings: SharedSettings,
    beat_tx: BeatProducer,
    notification_tx: SharedNotificationProducer,
    playing: PlayingFlag,
    tick_source: TickSource,
    tick_interval: Duration,
    stop_grace: Duration,
    session: u32,
}

impl<O: ClickOutput> SchedulerWorker<O> {
    fn run(mut self, control_rx: Receiver<ControlMessage>, tick_rx: Receiver<Tick>) {
        let mut grace: Option<Receiver<Instant>> = None;

        loop {
            let grace_rx = grace.clone().unwrap_or_else(never);

            select! {
                recv(control_rx) -> message => match message {
                    Ok(ControlMessage::Start { session }) => {
                        grace = None;
                        self.start(session);
                    }
                    Ok(ControlMessage::Stop) => {
                        if self.stop() {
                            grace = Some(after(self.stop_grace));
                        }
                    }
                    Ok(ControlMessage::RestartMeasure) => self.scheduler.restart_measure(),
                    Ok(ControlMessage::Quit) | Err(_) => break,
                },
                recv(tick_rx) -> tick => match tick {
                    Ok(Tick) => self.schedule_pass(),
                    Err(_) => {
                        error!("Tick source disconnected, scheduler exiting");
                        self.notify(Notification::error("Beat scheduler stopped"));
                        break;
                    }
                },
                recv(grace_rx) -> _ => {
                    grace = None;
                    self.finish_stop();
                }
            }
        }

        self.tick_source.stop();
        self.scheduler.stop();
        self.playing.set(false);
        debug!("Scheduler thread stopped");
    }

    fn start(&mut self, session: u32) {
        if self.scheduler.is_playing() {
            debug!("Start ignored, already playing");
            return;
        }
        // Restart inside the grace delay: apply the pending reset now
        self.finish_stop();

        if let Err(e) = self.output.ensure_running() {
            error!("Cannot start playback: {}", e);
            self.notify(Notification::error(format!("Cannot start playback: {}", e)));
            self.playing.set(false);
            return;
        }

        self.session = session;
        self.scheduler.start(self.clock.now());
        self.tick_source.set_interval(self.tick_interval);
        self.tick_source.start();
        // First beat is queued before the first tick arrives
        self.schedule_pass();
        info!("Playback started (session {})", session);
    }

    fn stop(&mut self) -> bool {
        self.tick_source.stop();
        if !self.scheduler.stop() {
            return false;
        }
        info!("Playback stopped");
        true
    }

    fn finish_stop(&mut self) {
        if self.scheduler.finish_stop() {
            self.clock.restart();
            debug!("Session reset, fresh audio clock");
        }
    }

    fn schedule_pass(&mut self) {
        let settings = self.settings.snapshot();
        let now = self.clock.now();
        self.scheduler
            .set_min_window(self.clock.block_secs() + self.tick_interval.as_secs_f64());
        let session = self.session;
        let output = &mut self.output;
        let beat_tx = &mut self.beat_tx;
        let mut dropped = 0;

        self.scheduler.schedule(now, &settings, |beat| {
            output.trigger(
                beat.beat_index,
                beat.trigger_time,
                beat.is_downbeat(settings.beats_per_measure),
            );
            if beat_tx.try_push(QueuedBeat { session, beat }).is_err() {
                dropped += 1;
            }
        });

        if dropped > 0 {
            warn!("Beat queue full, {} beat(s) not displayed", dropped);
        }
    }

    fn notify(&self, notification: Notification) {
        if let Ok(mut tx) = self.notification_tx.try_lock() {
            let _ = tx.try_push(notification);
        }
    }
}
