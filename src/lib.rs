// MyMetronome - Library exports for tests and benchmarks

pub mod audio;
pub mod config;
pub mod controller;
pub mod messaging;
pub mod scheduler;
pub mod settings;
pub mod ui;
pub mod visual;

// Re-export commonly used types for convenience
pub use audio::click::{ClickTone, ClickTrigger, ClickVoices};
pub use audio::clock::AudioClock;
pub use audio::engine::{AudioEngine, CpalClickOutput, EngineError};
pub use audio::output::ClickOutput;
pub use config::{ConfigError, MetronomeConfig};
pub use controller::MetronomeController;
pub use messaging::channels::{create_beat_queue, create_click_channel, create_notification_channel};
pub use scheduler::{BeatScheduler, PlaybackCursor, ScheduledBeat, SchedulerHandle, TickSource};
pub use settings::{
    Direction, MetronomeSettings, NoteSubdivision, SettingsError, SettingsStore, SharedSettings,
};
pub use visual::{CellState, IndicatorStrip, VisualSync};
