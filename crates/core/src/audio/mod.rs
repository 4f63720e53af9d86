use std::sync::Arc;

use crate::{assets::SoundClip, Result, StageError};

#[cfg(feature = "playback")]
mod cpal_output;

#[cfg(feature = "playback")]
pub use cpal_output::CpalOutput;

/// A single fire-and-forget playback request. Nothing is handed back to the
/// caller; the output owns the clip until it has finished playing.
#[derive(Debug, Clone)]
pub struct PlaybackRequest {
    pub clip: Arc<SoundClip>,
    pub volume: f32,
}

impl PlaybackRequest {
    /// Builds a request, rejecting volumes outside of `[0, 1]`.
    pub fn new(clip: Arc<SoundClip>, volume: f32) -> Result<Self> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(StageError::InvalidVolume(volume));
        }
        Ok(Self { clip, volume })
    }
}

/// Sink for playback requests.
pub trait AudioOutput: Send + Sync {
    fn play(&self, request: PlaybackRequest) -> Result<()>;
}

/// Output that accepts every request and produces no sound. Used when the
/// crate is built without the `playback` feature or no device is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentOutput;

impl AudioOutput for SilentOutput {
    fn play(&self, request: PlaybackRequest) -> Result<()> {
        tracing::info!(
            clip = %request.clip.name,
            volume = request.volume,
            duration = ?request.clip.duration(),
            "audio output disabled, dropping playback request"
        );
        Ok(())
    }
}

/// Returns the best output available in this build.
#[cfg(feature = "playback")]
pub fn default_output() -> Box<dyn AudioOutput> {
    Box::new(CpalOutput::new())
}

/// Returns the best output available in this build.
#[cfg(not(feature = "playback"))]
pub fn default_output() -> Box<dyn AudioOutput> {
    Box::new(SilentOutput)
}

/// Converts interleaved `input` at `source_rate` with `source_channels` into
/// the device layout using linear interpolation. Extra device channels repeat
/// the last source channel; surplus source channels are dropped.
pub fn resample(
    input: &[f32],
    source_channels: u16,
    source_rate: u32,
    target_channels: u16,
    target_rate: u32,
    volume: f32,
) -> Vec<f32> {
    let source_channels = usize::from(source_channels.max(1));
    let target_channels = usize::from(target_channels.max(1));
    let source_frames = input.len() / source_channels;
    if source_frames == 0 || source_rate == 0 || target_rate == 0 {
        return Vec::new();
    }

    let step = f64::from(source_rate) / f64::from(target_rate);
    let target_frames = ((source_frames as f64) / step).floor() as usize;
    let mut output = Vec::with_capacity(target_frames * target_channels);

    for frame in 0..target_frames {
        let position = frame as f64 * step;
        let index = position.floor() as usize;
        let next = (index + 1).min(source_frames - 1);
        let fraction = (position - index as f64) as f32;

        for channel in 0..target_channels {
            let source_channel = channel.min(source_channels - 1);
            let a = input[index * source_channels + source_channel];
            let b = input[next * source_channels + source_channel];
            output.push((a + (b - a) * fraction) * volume);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip() -> Arc<SoundClip> {
        Arc::new(SoundClip {
            name: "clip.mp3".to_string(),
            channels: 1,
            sample_rate: 4,
            samples: vec![0.0, 1.0, 0.0, -1.0],
        })
    }

    #[test]
    fn accepts_volumes_in_unit_range() {
        assert!(PlaybackRequest::new(clip(), 0.0).is_ok());
        assert!(PlaybackRequest::new(clip(), 0.5).is_ok());
        assert!(PlaybackRequest::new(clip(), 1.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_volumes() {
        for volume in [-0.1, 1.5, f32::NAN, f32::INFINITY] {
            let err = PlaybackRequest::new(clip(), volume).unwrap_err();
            assert!(matches!(err, StageError::InvalidVolume(_)));
        }
    }

    #[test]
    fn silent_output_accepts_requests() {
        let request = PlaybackRequest::new(clip(), 0.5).unwrap();
        assert!(SilentOutput.play(request).is_ok());
    }

    #[test]
    fn resample_upmixes_and_scales() {
        let output = resample(&[1.0, -1.0], 1, 10, 2, 10, 0.5);
        assert_eq!(output, vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn resample_interpolates_between_frames() {
        let output = resample(&[0.0, 1.0], 1, 1, 1, 2, 1.0);
        assert_eq!(output.len(), 4);
        assert_eq!(output[0], 0.0);
        assert!((output[1] - 0.5).abs() < 1e-6);
        assert_eq!(output[2], 1.0);
    }

    #[test]
    fn resample_downmixes_by_dropping_channels() {
        let output = resample(&[0.25, 0.75, 0.5, 1.0], 2, 8, 1, 8, 1.0);
        assert_eq!(output, vec![0.25, 0.5]);
    }
}
