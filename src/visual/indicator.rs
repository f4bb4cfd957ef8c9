// Indicator strip model - which cell is lit and in which color

/// State of one cell of the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Off,
    Beat,
    Downbeat,
}

/// `beats_per_measure` cells, at most one of them lit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorStrip {
    beats_per_measure: u8,
    active: Option<u32>,
}

impl IndicatorStrip {
    /// All cells off
    pub fn idle(beats_per_measure: u8) -> Self {
        Self {
            beats_per_measure: beats_per_measure.max(1),
            active: None,
        }
    }

    pub fn with_active(beats_per_measure: u8, active: Option<u32>) -> Self {
        Self {
            active,
            ..Self::idle(beats_per_measure)
        }
    }

    pub fn beats_per_measure(&self) -> u8 {
        self.beats_per_measure
    }

    pub fn active(&self) -> Option<u32> {
        self.active
    }

    pub fn cell(&self, index: u32) -> CellState {
        match self.active {
            Some(active) if active == index => {
                if active % self.beats_per_measure as u32 == 0 {
                    CellState::Downbeat
                } else {
                    CellState::Beat
                }
            }
            _ => CellState::Off,
        }
    }

    pub fn cells(&self) -> Vec<CellState> {
        (0..self.beats_per_measure as u32)
            .map(|index| self.cell(index))
            .collect()
    }
}

/// Horizontal placement of evenly spaced cells on a strip
///
/// Returns the left edge of each cell. The first and last cells touch the
/// strip edges; a single cell is centered.
pub fn cell_offsets(strip_width: f32, cell_width: f32, cells: u8) -> Vec<f32> {
    match cells {
        0 => Vec::new(),
        1 => vec![((strip_width - cell_width) / 2.0).max(0.0)],
        n => {
            let gap = ((strip_width - n as f32 * cell_width) / (n - 1) as f32).max(0.0);
            (0..n).map(|i| i as f32 * (cell_width + gap)).collect()
        }
    }
}
