// Scheduler module - look-ahead beat scheduling driven by a tick thread

pub mod beat;
pub mod beat_scheduler;
pub mod tick;
pub mod worker;

pub use beat::{PlaybackCursor, QueuedBeat, ScheduledBeat};
pub use beat_scheduler::{BeatScheduler, SchedulerState};
pub use tick::{Tick, TickSource};
pub use worker::{PlayingFlag, SchedulerHandle};
