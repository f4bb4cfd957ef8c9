// Format conversion for CPAL output streams
//
// Clicks are synthesized as mono f32 and copied to every channel of the
// device's interleaved buffer, converted to the device sample type (f32, i16
// or u16) through CPAL's `FromSample`. Allocation-free, safe in the callback.

use cpal::{FromSample, Sample};

/// Write one mono sample to every channel of an interleaved frame
#[inline]
pub fn write_mono_to_interleaved_frame<T>(internal_sample: f32, output_frame: &mut [T])
where
    T: Sample + FromSample<f32>,
{
    let converted = T::from_sample(internal_sample.clamp(-1.0, 1.0));
    for channel_sample in output_frame.iter_mut() {
        *channel_sample = converted;
    }
}

/// Spread a mono block over an interleaved buffer of `channels` channels
///
/// Frames beyond the end of `mono` are filled with silence.
#[inline]
pub fn write_mono_block<T>(mono: &[f32], output: &mut [T], channels: usize)
where
    T: Sample + FromSample<f32>,
{
    for (index, frame) in output.chunks_mut(channels.max(1)).enumerate() {
        let sample = mono.get(index).copied().unwrap_or(0.0);
        write_mono_to_interleaved_frame(sample, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mono_to_interleaved() {
        let mut output: [f32; 2] = [0.0; 2];
        write_mono_to_interleaved_frame(0.5, &mut output);
        assert_eq!(output, [0.5, 0.5]);

        let mut output_i16: [i16; 2] = [0; 2];
        write_mono_to_interleaved_frame(0.5, &mut output_i16);
        assert!(output_i16[0] > 0);
        assert_eq!(output_i16[0], output_i16[1]);
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let mut output: [i16; 1] = [0];
        write_mono_to_interleaved_frame(3.0, &mut output);
        assert_eq!(output[0], i16::MAX);

        let mut output_u16: [u16; 1] = [0];
        write_mono_to_interleaved_frame(-3.0, &mut output_u16);
        assert_eq!(output_u16[0], u16::MIN);
    }

    #[test]
    fn test_write_mono_block_fills_all_channels() {
        let mono = [0.25f32, -0.25];
        let mut output = [1.0f32; 6];
        write_mono_block(&mono, &mut output, 2);
        assert_eq!(output, [0.25, 0.25, -0.25, -0.25, 0.0, 0.0]);
    }
}
