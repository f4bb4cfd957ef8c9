// UI module - egui window hosting the metronome controls

pub mod app;
pub mod indicator;
