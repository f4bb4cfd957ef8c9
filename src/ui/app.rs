// Main UI App

use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::controller::MetronomeController;
use crate::messaging::channels::NotificationConsumer;
use crate::messaging::notification::{Notification, NotificationLevel};
use crate::settings::{Direction, MAX_BEATS, MAX_TEMPO, MIN_BEATS, MIN_TEMPO};
use crate::ui::indicator::draw_indicator;
use eframe::egui;
use std::collections::VecDeque;

pub struct MetronomeApp {
    controller: MetronomeController,
    device_status: AtomicDeviceStatus,
    // Notification system
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    max_notifications: usize,
}

impl MetronomeApp {
    pub fn new(
        controller: MetronomeController,
        device_status: AtomicDeviceStatus,
        notification_rx: NotificationConsumer,
    ) -> Self {
        Self {
            controller,
            device_status,
            notification_rx,
            notification_queue: VecDeque::new(),
            max_notifications: 10,
        }
    }

    /// Move new notifications from the ring buffer into the display queue
    fn update_notifications(&mut self) {
        while let Some(notification) = ringbuf::traits::Consumer::try_pop(&mut self.notification_rx) {
            self.notification_queue.push_back(notification);

            if self.notification_queue.len() > self.max_notifications {
                self.notification_queue.pop_front();
            }
        }
    }

    /// Notifications younger than 5 seconds, newest first
    fn get_recent_notifications(&self) -> Vec<&Notification> {
        self.notification_queue
            .iter()
            .rev()
            .filter(|n| n.is_recent(5000))
            .take(3)
            .collect()
    }

    fn handle_keyboard(&mut self, ctx: &egui::Context) {
        // Ignore shortcuts while a widget holds the keyboard
        if ctx.wants_keyboard_input() {
            return;
        }

        let (space, up, down) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::Space),
                i.key_pressed(egui::Key::ArrowUp) || i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowDown) || i.key_pressed(egui::Key::ArrowLeft),
            )
        });

        if space {
            self.controller.toggle_playback();
        }
        if up {
            self.controller.adjust_tempo(1);
        }
        if down {
            self.controller.adjust_tempo(-1);
        }
    }

    fn draw_transport(&mut self, ui: &mut egui::Ui) {
        let playing = self.controller.is_playing();
        let label = if playing { "⏹ Stop" } else { "▶ Play" };
        if ui
            .add_sized([120.0, 32.0], egui::Button::new(label))
            .on_hover_text("Space")
            .clicked()
        {
            self.controller.toggle_playback();
        }
    }

    fn draw_device_status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Audio Output:");
            let (status_text, status_color) = match self.device_status.get() {
                DeviceStatus::Connected => ("● open", egui::Color32::GREEN),
                DeviceStatus::Connecting => ("● opening", egui::Color32::YELLOW),
                DeviceStatus::Closed => ("○ opens on play", egui::Color32::GRAY),
                DeviceStatus::Error => ("● error", egui::Color32::RED),
            };
            ui.colored_label(status_color, status_text);
        });
    }

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        let settings = self.controller.settings();

        ui.horizontal(|ui| {
            ui.label("Beats:");
            let can_decrease = settings.beats_per_measure > MIN_BEATS;
            if ui.add_enabled(can_decrease, egui::Button::new("−")).clicked() {
                self.controller.adjust_beats(-1);
            }
            ui.label(format!("{:>2}", settings.beats_per_measure));
            let can_increase = settings.beats_per_measure < MAX_BEATS;
            if ui.add_enabled(can_increase, egui::Button::new("+")).clicked() {
                self.controller.adjust_beats(1);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Tempo:");
            let can_decrease = settings.tempo > MIN_TEMPO;
            let can_increase = settings.tempo < MAX_TEMPO;
            if ui.add_enabled(can_decrease, egui::Button::new("−10")).clicked() {
                self.controller.adjust_tempo(-10);
            }
            if ui.add_enabled(can_decrease, egui::Button::new("−1")).clicked() {
                self.controller.adjust_tempo(-1);
            }
            ui.label(format!("{:>3} BPM", settings.tempo));
            if ui.add_enabled(can_increase, egui::Button::new("+1")).clicked() {
                self.controller.adjust_tempo(1);
            }
            if ui.add_enabled(can_increase, egui::Button::new("+10")).clicked() {
                self.controller.adjust_tempo(10);
            }
        });

        ui.horizontal(|ui| {
            ui.label("Note:");
            let can_decrease = settings.note_subdivision.step(Direction::Down).is_some();
            let can_increase = settings.note_subdivision.step(Direction::Up).is_some();
            if ui.add_enabled(can_decrease, egui::Button::new("◀")).clicked() {
                self.controller.adjust_note_subdivision(Direction::Down);
            }
            ui.label(settings.note_subdivision.to_string());
            if ui.add_enabled(can_increase, egui::Button::new("▶")).clicked() {
                self.controller.adjust_note_subdivision(Direction::Up);
            }
        });
    }

    /// Status line at the bottom of the window
    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|ui| {
            let recent_notifications = self.get_recent_notifications();

            if recent_notifications.is_empty() {
                let status = if self.controller.store().is_disabled() {
                    "Ready (settings not saved)"
                } else {
                    "Ready"
                };
                ui.label(status);
            } else {
                for notification in recent_notifications {
                    let (icon, color) = match notification.level {
                        NotificationLevel::Info => ("ℹ", egui::Color32::from_rgb(100, 150, 255)),
                        NotificationLevel::Warning => ("⚠", egui::Color32::from_rgb(255, 165, 0)),
                        NotificationLevel::Error => ("✖", egui::Color32::RED),
                    };

                    ui.colored_label(color, icon);
                    ui.colored_label(color, &notification.message);
                    ui.add_space(10.0);
                }
            }
        });
    }
}

impl eframe::App for MetronomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_notifications();
        self.handle_keyboard(ctx);

        // Visual sync runs once per refresh, re-armed only while playing
        self.controller.frame();
        if self.controller.is_playing() {
            ctx.request_repaint();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("MyMetronome");
            ui.separator();
            ui.add_space(10.0);

            ui.vertical_centered(|ui| {
                draw_indicator(ui, &self.controller.indicator());
                ui.add_space(10.0);
                self.draw_transport(ui);
            });

            ui.add_space(10.0);
            ui.separator();
            self.draw_settings(ui);
            self.draw_device_status(ui);

            ui.add_space(10.0);
            self.draw_status_bar(ui);
        });
    }
}
