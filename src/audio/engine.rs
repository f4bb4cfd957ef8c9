// Audio engine - CPAL output stream driving the audio clock and click voices
//
// # Format Support
//
// The stream is built for the device's preferred sample format (F32, I16 or
// U16). Clicks are rendered as mono f32 and converted when they are copied to
// the interleaved device buffer, without allocation.
//
// # Clock
//
// The callback is the only writer of the `AudioClock` frame counter: it
// renders the buffer starting at `current_frame()` then advances the counter
// by the buffer length. Every other thread reads time from the same counter.
//
// # Stream Limitations
//
// On macOS (CoreAudio) the Stream is not Send, so the engine is created and
// kept on the scheduler worker thread (see `CpalClickOutput`).

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BufferSize, Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig,
    SupportedBufferSize,
};
use log::{error, info};
use ringbuf::traits::Producer;
use std::sync::{Arc, Mutex};

use crate::audio::click::{ClickTone, ClickTrigger, ClickVoices};
use crate::audio::clock::AudioClock;
use crate::audio::format_conversion::write_mono_block;
use crate::audio::output::ClickOutput;
use crate::audio::status::{AtomicDeviceStatus, DeviceStatus};
use crate::config::MetronomeConfig;
use crate::messaging::channels::{NotificationProducer, create_click_channel};
use crate::messaging::notification::Notification;

/// Frames rendered per internal block, the callback loops over larger buffers
const RENDER_BLOCK_FRAMES: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("No audio output device found")]
    NoOutputDevice,

    #[error("Audio configuration error: {0}")]
    Config(String),

    #[error("Unsupported sample format: {0}. Supported formats: F32, I16, U16")]
    UnsupportedFormat(String),

    #[error("Error in stream creation: {0}")]
    BuildStream(String),

    #[error("Error starting stream: {0}")]
    PlayStream(String),
}

pub type SharedNotificationProducer = Arc<Mutex<NotificationProducer>>;

pub struct AudioEngine {
    _device: Device,
    _stream: Stream,
    sample_rate: u32,
    trigger: ClickTrigger,
}

impl AudioEngine {
    /// Open the default output device and start driving `clock`
    pub fn new(
        clock: AudioClock,
        config: &MetronomeConfig,
        status: AtomicDeviceStatus,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Self, EngineError> {
        status.set(DeviceStatus::Connecting);

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;

        info!(
            "Audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let supported_config = device
            .default_output_config()
            .map_err(|e| EngineError::Config(e.to_string()))?;

        let sample_format = supported_config.sample_format();
        let sample_rate = supported_config.sample_rate().0;
        let channels = supported_config.channels() as usize;
        let max_frames = (config.max_buffer_secs() * sample_rate as f64) as u32;
        let fixed_frames = fixed_buffer_frames(
            supported_config.buffer_size(),
            config.buffer_frames,
            max_frames,
        );
        let mut stream_config: StreamConfig = supported_config.into();

        clock.bind(sample_rate);
        match fixed_frames {
            Some(frames) => {
                stream_config.buffer_size = BufferSize::Fixed(frames);
                clock.set_block_frames(frames);
                info!("Audio buffer: {} frames", frames);
            }
            // Learned from the first callback
            None => info!("Audio buffer: device default"),
        }

        let (click_tx, click_rx) = create_click_channel(config.click_queue_capacity);
        let trigger = ClickTrigger::new(clock.clone(), ClickTone::from_config(config), click_tx);
        let voices = ClickVoices::new(click_rx, sample_rate as f32);

        let stream = match sample_format {
            SampleFormat::F32 => Self::build_stream::<f32>(
                &device,
                &stream_config,
                channels,
                voices,
                clock,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::I16 => Self::build_stream::<i16>(
                &device,
                &stream_config,
                channels,
                voices,
                clock,
                status.clone(),
                notification_tx.clone(),
            ),
            SampleFormat::U16 => Self::build_stream::<u16>(
                &device,
                &stream_config,
                channels,
                voices,
                clock,
                status.clone(),
                notification_tx.clone(),
            ),
            other => return Err(EngineError::UnsupportedFormat(format!("{:?}", other))),
        }?;

        stream
            .play()
            .map_err(|e| EngineError::PlayStream(e.to_string()))?;

        status.set(DeviceStatus::Connected);
        info!("Audio engine started: {} Hz, {} channels", sample_rate, channels);

        if let Ok(mut tx) = notification_tx.try_lock() {
            let notif = Notification::info(format!("Audio connected: {} Hz", sample_rate));
            let _ = tx.try_push(notif);
        }

        Ok(Self {
            _device: device,
            _stream: stream,
            sample_rate,
            trigger,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn trigger(&mut self, beat_index: u32, time: f64, downbeat: bool) -> bool {
        self.trigger.trigger(beat_index, time, downbeat)
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        channels: usize,
        mut voices: ClickVoices,
        clock: AudioClock,
        status: AtomicDeviceStatus,
        notification_tx: SharedNotificationProducer,
    ) -> Result<Stream, EngineError>
    where
        T: SizedSample + FromSample<f32> + Send + 'static,
    {
        let mut scratch = vec![0.0f32; RENDER_BLOCK_FRAMES];

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    // ========== SACRED ZONE ==========
                    // No allocations, No I/O, No blocking locks
                    let frames = data.len() / channels;
                    let first_frame = clock.current_frame();
                    clock.set_block_frames(frames as u32);

                    let mut done = 0;
                    while done < frames {
                        let block = (frames - done).min(RENDER_BLOCK_FRAMES);
                        voices.render(&mut scratch[..block], first_frame + done as u64);
                        write_mono_block(
                            &scratch[..block],
                            &mut data[done * channels..(done + block) * channels],
                            channels,
                        );
                        done += block;
                    }

                    clock.advance(frames);
                    // ========== SACRED ZONE END ==========
                },
                move |err| {
                    // Runs outside the real-time callback, I/O is fine here
                    error!("Audio stream error: {}", err);
                    status.set(DeviceStatus::Error);

                    if let Ok(mut tx) = notification_tx.try_lock() {
                        let notif = Notification::error(format!("Audio stream error: {}", err));
                        let _ = tx.try_push(notif);
                    }
                },
                None,
            )
            .map_err(|e| EngineError::BuildStream(e.to_string()))
    }
}

/// Buffer size to request from the device
///
/// `preferred` is capped at `max_frames`, then clamped into the range the
/// device supports. `None` when the device does not report a range.
fn fixed_buffer_frames(supported: &SupportedBufferSize, preferred: u32, max_frames: u32) -> Option<u32> {
    match supported {
        SupportedBufferSize::Range { min, max } => {
            let frames = preferred.min(max_frames).max(1);
            Some(frames.clamp(*min, (*max).max(*min)))
        }
        SupportedBufferSize::Unknown => None,
    }
}

/// Click output that opens the CPAL engine on first playback
///
/// Lives on the scheduler worker thread for its whole life.
pub struct CpalClickOutput {
    clock: AudioClock,
    config: MetronomeConfig,
    status: AtomicDeviceStatus,
    notification_tx: SharedNotificationProducer,
    engine: Option<AudioEngine>,
}

impl CpalClickOutput {
    pub fn new(
        clock: AudioClock,
        config: MetronomeConfig,
        status: AtomicDeviceStatus,
        notification_tx: SharedNotificationProducer,
    ) -> Self {
        Self {
            clock,
            config,
            status,
            notification_tx,
            engine: None,
        }
    }
}

impl ClickOutput for CpalClickOutput {
    fn ensure_running(&mut self) -> Result<(), EngineError> {
        if self.engine.is_some() && self.status.get() != DeviceStatus::Error {
            return Ok(());
        }

        // A failed stream is dropped and reopened on the next start
        self.engine = None;
        match AudioEngine::new(
            self.clock.clone(),
            &self.config,
            self.status.clone(),
            self.notification_tx.clone(),
        ) {
            Ok(engine) => {
                self.engine = Some(engine);
                Ok(())
            }
            Err(e) => {
                self.status.set(DeviceStatus::Error);
                Err(e)
            }
        }
    }

    fn trigger(&mut self, beat_index: u32, time: f64, downbeat: bool) {
        if let Some(engine) = self.engine.as_mut() {
            engine.trigger(beat_index, time, downbeat);
        }
    }
}
