// Tick source - free-running timer thread that prompts the scheduler
//
// Ticks carry no timing information the scheduler relies on: they only say
// "wake up and check the audio clock". Ticks that pile up while the receiver
// is busy are coalesced into one.

use crossbeam_channel::{Receiver, Sender, TrySendError, never, select, tick};
use log::debug;
use std::thread;
use std::time::{Duration, Instant};

/// Wake-up signal sent to the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick;

#[derive(Debug, Clone, Copy)]
enum TickCommand {
    Start,
    Stop,
    SetInterval(Duration),
    Shutdown,
}

/// Handle to the tick thread
///
/// Dropping the handle shuts the thread down.
pub struct TickSource {
    command_tx: Sender<TickCommand>,
    thread: Option<thread::JoinHandle<()>>,
}

impl TickSource {
    /// Spawn the timer thread, stopped, with the given firing period
    pub fn spawn(interval: Duration) -> (Self, Receiver<Tick>) {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (tick_tx, tick_rx) = crossbeam_channel::bounded(1);

        let thread = thread::Builder::new()
            .name("metronome-tick".to_string())
            .spawn(move || run(interval, command_rx, tick_tx))
            .ok();

        if thread.is_none() {
            log::error!("Failed to spawn tick thread");
        }

        (
            Self {
                command_tx,
                thread,
            },
            tick_rx,
        )
    }

    /// Begin emitting ticks at the current interval
    pub fn start(&self) {
        let _ = self.command_tx.send(TickCommand::Start);
    }

    /// Halt emission and drop the pending timer
    pub fn stop(&self) {
        let _ = self.command_tx.send(TickCommand::Stop);
    }

    /// Change the firing period; a running timer is replaced, never doubled
    pub fn set_interval(&self, interval: Duration) {
        let _ = self.command_tx.send(TickCommand::SetInterval(interval));
    }
}

impl Drop for TickSource {
    fn drop(&mut self) {
        let _ = self.command_tx.send(TickCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(mut interval: Duration, command_rx: Receiver<TickCommand>, tick_tx: Sender<Tick>) {
    let mut timer: Option<Receiver<Instant>> = None;

    loop {
        let timer_rx = timer.clone().unwrap_or_else(never);

        select! {
            recv(command_rx) -> command => match command {
                Ok(TickCommand::Start) => {
                    if timer.is_none() {
                        timer = Some(tick(interval));
                    }
                }
                Ok(TickCommand::Stop) => timer = None,
                Ok(TickCommand::SetInterval(new_interval)) => {
                    interval = new_interval.max(Duration::from_millis(1));
                    if timer.is_some() {
                        timer = Some(tick(interval));
                    }
                }
                Ok(TickCommand::Shutdown) | Err(_) => break,
            },
            recv(timer_rx) -> _ => match tick_tx.try_send(Tick) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => break,
            },
        }
    }

    debug!("Tick thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_ticks_until_started() {
        let (_source, ticks) = TickSource::spawn(Duration::from_millis(5));
        assert!(ticks.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn test_ticks_after_start() {
        let (source, ticks) = TickSource::spawn(Duration::from_millis(5));
        source.start();

        for _ in 0..3 {
            assert_eq!(ticks.recv_timeout(Duration::from_secs(2)), Ok(Tick));
        }
    }

    #[test]
    fn test_stop_halts_emission() {
        let (source, ticks) = TickSource::spawn(Duration::from_millis(5));
        source.start();
        assert!(ticks.recv_timeout(Duration::from_secs(2)).is_ok());

        source.stop();
        // Let the stop land, then drain whatever was already buffered
        thread::sleep(Duration::from_millis(30));
        while ticks.try_recv().is_ok() {}

        assert!(ticks.recv_timeout(Duration::from_millis(60)).is_err());
    }

    #[test]
    fn test_set_interval_replaces_timer() {
        let (source, ticks) = TickSource::spawn(Duration::from_secs(60));
        source.start();
        source.set_interval(Duration::from_millis(5));

        // Would never arrive at the old 60s period
        assert!(ticks.recv_timeout(Duration::from_secs(2)).is_ok());
    }

    #[test]
    fn test_drop_joins_thread() {
        let (source, ticks) = TickSource::spawn(Duration::from_millis(5));
        source.start();
        drop(source);
        // Sender side is gone once the thread exits
        thread::sleep(Duration::from_millis(20));
        while ticks.try_recv().is_ok() {}
        assert!(matches!(
            ticks.recv_timeout(Duration::from_millis(50)),
            Err(crossbeam_channel::RecvTimeoutError::Disconnected)
        ));
    }
}
