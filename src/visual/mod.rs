// Visual module - beat indicator driven by the display refresh

pub mod indicator;
pub mod sync;

pub use indicator::{CellState, IndicatorStrip};
pub use sync::VisualSync;
