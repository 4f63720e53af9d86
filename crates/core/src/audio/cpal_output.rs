use std::{sync::mpsc, thread, time::Duration};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{resample, AudioOutput, PlaybackRequest};
use crate::{Result, StageError};

/// Extra time a stream is kept alive after its last sample has been queued, so
/// the device buffer can drain.
const DRAIN_MARGIN: Duration = Duration::from_millis(250);

/// Plays clips through the host's default output device. Each request gets its
/// own detached thread that owns the stream and exits once the clip is done.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalOutput;

impl CpalOutput {
    pub fn new() -> Self {
        Self
    }
}

impl AudioOutput for CpalOutput {
    fn play(&self, request: PlaybackRequest) -> Result<()> {
        let (ready_tx, ready_rx) = mpsc::sync_channel::<Result<()>>(1);

        thread::Builder::new()
            .name("sprite-stage-audio".to_string())
            .spawn(move || {
                let stream = match open_stream(&request) {
                    Ok((stream, duration)) => {
                        let _ = ready_tx.send(Ok(()));
                        Some((stream, duration))
                    }
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        None
                    }
                };

                if let Some((stream, duration)) = stream {
                    thread::sleep(duration + DRAIN_MARGIN);
                    drop(stream);
                    tracing::debug!(clip = %request.clip.name, "playback finished");
                }
            })?;

        ready_rx
            .recv()
            .map_err(|_| StageError::Audio("playback thread exited during setup".to_string()))?
    }
}

fn open_stream(request: &PlaybackRequest) -> Result<(cpal::Stream, Duration)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| StageError::Audio("no default output device available".to_string()))?;
    let config = device
        .default_output_config()
        .map_err(|err| StageError::Audio(err.to_string()))?;

    if config.sample_format() != cpal::SampleFormat::F32 {
        return Err(StageError::Audio(format!(
            "unsupported sample format: {}",
            config.sample_format()
        )));
    }

    let channels = config.channels();
    let sample_rate = config.sample_rate();
    let clip = &request.clip;
    let samples = resample(
        &clip.samples,
        clip.channels,
        clip.sample_rate,
        channels,
        sample_rate,
        request.volume,
    );
    let duration = Duration::from_secs_f64(
        (samples.len() / usize::from(channels.max(1))) as f64 / f64::from(sample_rate.max(1)),
    );

    let mut cursor = 0;
    let data_callback = move |output: &mut [f32], _: &cpal::OutputCallbackInfo| {
        for sample in output.iter_mut() {
            *sample = samples.get(cursor).copied().unwrap_or(0.0);
            cursor += 1;
        }
    };
    let error_callback = |err: cpal::StreamError| {
        tracing::error!(%err, "audio stream error");
    };

    let stream = device
        .build_output_stream(&config.into(), data_callback, error_callback, None)
        .map_err(|err| StageError::Audio(err.to_string()))?;
    stream
        .play()
        .map_err(|err| StageError::Audio(err.to_string()))?;

    tracing::info!(
        clip = %clip.name,
        volume = request.volume,
        channels,
        sample_rate,
        "started playback"
    );
    Ok((stream, duration))
}
