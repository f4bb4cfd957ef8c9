use mymetronome::audio::status::AtomicDeviceStatus;
use mymetronome::ui::app::MetronomeApp;
use mymetronome::{
    AudioClock, CpalClickOutput, MetronomeConfig, MetronomeController, SettingsStore,
    create_notification_channel,
};
use std::sync::{Arc, Mutex};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = MetronomeConfig::default();
    if let Err(e) = config.validate() {
        log::error!("Invalid configuration: {}", e);
        return;
    }

    // Create notification channel (for error handling)
    let (notification_tx, notification_rx) =
        create_notification_channel(config.notification_capacity);
    let notification_tx = Arc::new(Mutex::new(notification_tx));

    let store = SettingsStore::open_default();
    match store.path() {
        Some(path) => log::info!("Settings file: {}", path.display()),
        None => log::warn!("No settings location, changes will not be saved"),
    }

    // The audio device opens on first playback, on the scheduler thread
    let clock = AudioClock::new();
    let device_status = AtomicDeviceStatus::default();
    let output_status = device_status.clone();
    let output_clock = clock.clone();
    let output_config = config.clone();
    let output_notifications = notification_tx.clone();
    let controller = MetronomeController::spawn(
        &config,
        store,
        clock,
        notification_tx,
        move || {
            CpalClickOutput::new(
                output_clock,
                output_config,
                output_status,
                output_notifications,
            )
        },
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([360.0, 260.0])
            .with_title("MyMetronome"),
        ..Default::default()
    };

    if let Err(e) = eframe::run_native(
        "MyMetronome",
        native_options,
        Box::new(|_cc| {
            Ok(Box::new(MetronomeApp::new(
                controller,
                device_status,
                notification_rx,
            )))
        }),
    ) {
        log::error!("UI error: {}", e);
    }
}
