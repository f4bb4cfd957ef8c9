// Audio module - CPAL backend, audio clock and click synthesis

pub mod click;
pub mod clock;
pub mod engine;
pub mod format_conversion;
pub mod output;
pub mod status;
