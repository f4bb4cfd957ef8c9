// Indicator strip painter

use crate::visual::indicator::{CellState, IndicatorStrip, cell_offsets};
use eframe::egui;

pub const STRIP_WIDTH: f32 = 300.0;
pub const STRIP_HEIGHT: f32 = 30.0;
pub const CELL_WIDTH: f32 = 7.0;

const OFF_COLOR: egui::Color32 = egui::Color32::from_rgb(0x0A, 0x0A, 0x0A);
const DOWNBEAT_COLOR: egui::Color32 = egui::Color32::from_rgb(220, 40, 40);
const BEAT_COLOR: egui::Color32 = egui::Color32::from_rgb(40, 110, 230);

fn cell_color(state: CellState) -> egui::Color32 {
    match state {
        CellState::Off => OFF_COLOR,
        CellState::Beat => BEAT_COLOR,
        CellState::Downbeat => DOWNBEAT_COLOR,
    }
}

/// Paint the strip: one rectangle per beat, evenly spaced
pub fn draw_indicator(ui: &mut egui::Ui, strip: &IndicatorStrip) -> egui::Response {
    let (rect, response) = ui.allocate_exact_size(
        egui::vec2(STRIP_WIDTH, STRIP_HEIGHT),
        egui::Sense::hover(),
    );
    let painter = ui.painter_at(rect);
    painter.rect_filled(rect, 2.0, egui::Color32::from_gray(30));

    let offsets = cell_offsets(STRIP_WIDTH, CELL_WIDTH, strip.beats_per_measure());
    for (index, (offset, state)) in offsets.iter().zip(strip.cells()).enumerate() {
        let cell = egui::Rect::from_min_size(
            rect.min + egui::vec2(*offset, 0.0),
            egui::vec2(CELL_WIDTH, STRIP_HEIGHT),
        );
        painter.rect_filled(cell, 0.0, cell_color(state));

        // Measure start marker under the first cell
        if index == 0 {
            painter.hline(
                cell.x_range(),
                rect.bottom() - 1.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(90)),
            );
        }
    }

    response
}
