// Shared settings - lock-free snapshot UI → scheduler thread
// The controller is the single writer; the scheduler reads one snapshot per pass

use super::{MetronomeSettings, NoteSubdivision};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Settings packed into a single atomic word so a snapshot is never torn
///
/// Layout: tempo in bits 0-15, beats in bits 16-23, subdivision index in bits 24-31.
#[derive(Clone, Debug)]
pub struct SharedSettings {
    inner: Arc<AtomicU32>,
}

impl SharedSettings {
    pub fn new(settings: MetronomeSettings) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(pack(&settings))),
        }
    }

    /// Publish new settings (controller only)
    pub fn store(&self, settings: MetronomeSettings) {
        self.inner.store(pack(&settings), Ordering::Release);
    }

    /// Read a consistent copy of the current settings
    pub fn snapshot(&self) -> MetronomeSettings {
        unpack(self.inner.load(Ordering::Acquire))
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(MetronomeSettings::default())
    }
}

fn pack(settings: &MetronomeSettings) -> u32 {
    settings.tempo as u32
        | (settings.beats_per_measure as u32) << 16
        | (settings.note_subdivision.index() as u32) << 24
}

fn unpack(bits: u32) -> MetronomeSettings {
    MetronomeSettings::new(
        ((bits >> 16) & 0xFF) as u8,
        NoteSubdivision::from_index(((bits >> 24) & 0xFF) as u8),
        (bits & 0xFFFF) as u16,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_matches_store() {
        let shared = SharedSettings::default();
        assert_eq!(shared.snapshot(), MetronomeSettings::default());

        for note in NoteSubdivision::ALL {
            let settings = MetronomeSettings::new(12, note, 300);
            shared.store(settings);
            assert_eq!(shared.snapshot(), settings);
        }
    }

    #[test]
    fn test_clones_share_state() {
        let writer = SharedSettings::default();
        let reader = writer.clone();

        writer.store(MetronomeSettings::new(7, NoteSubdivision::Eighth, 33));
        assert_eq!(reader.snapshot().beats_per_measure, 7);
        assert_eq!(reader.snapshot().tempo, 33);
    }
}
