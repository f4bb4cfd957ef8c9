// Output stream state, written by the engine and read by the UI each frame

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DeviceStatus {
    /// The stream opens lazily on the first Play
    Closed,
    Connecting,
    Connected,
    /// Stream failed or the device went away; the next Play reopens it
    Error,
}

impl DeviceStatus {
    fn decode(raw: u8) -> Self {
        match raw {
            1 => DeviceStatus::Connecting,
            2 => DeviceStatus::Connected,
            3 => DeviceStatus::Error,
            _ => DeviceStatus::Closed,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct AtomicDeviceStatus(Arc<AtomicU8>);

impl AtomicDeviceStatus {
    pub fn get(&self) -> DeviceStatus {
        DeviceStatus::decode(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, status: DeviceStatus) {
        self.0.store(status as u8, Ordering::Relaxed);
    }
}
