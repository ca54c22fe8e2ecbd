use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender};
use tracing::info;

use crate::audio_api::AudioGuard;
use crate::shared::AUDIO_BUFFER_SAMPLES;

/// Default output device, opened but not started yet. The engine has to be
/// built at the device's rate, so the host asks for it first.
pub struct OutputDevice {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
}

pub struct AudioHandle {
    errors: Receiver<String>,
    sample_rate: u32,
    _output_stream: cpal::Stream,
}

impl AudioHandle {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    // stream errors from the device thread, if any came in
    pub fn poll_error(&self) -> Option<String> {
        self.errors.try_recv().ok()
    }
}

impl OutputDevice {
    pub fn open_default() -> anyhow::Result<Self> {
        let host = cpal::default_host();
        let device = host.default_output_device().context("no default output device")?;
        let config = device.default_output_config().context("no default output config")?;
        Ok(Self { device, config })
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate()
    }

    pub fn start(self, guard: AudioGuard) -> anyhow::Result<AudioHandle> {
        let (err_tx, err_rx) = crossbeam_channel::bounded::<String>(16);
        let sample_rate = self.sample_rate();
        let channels = self.config.channels() as usize;
        let format = self.config.sample_format();
        let stream_config: cpal::StreamConfig = self.config.into();

        let stream = match format {
            cpal::SampleFormat::F32 => build_output_stream::<f32>(&self.device, &stream_config, guard, channels, err_tx)?,
            cpal::SampleFormat::I16 => build_output_stream::<i16>(&self.device, &stream_config, guard, channels, err_tx)?,
            other => anyhow::bail!("unsupported sample format {other:?} (only f32 and i16)"),
        };
        stream.play().context("failed to play output stream")?;
        info!(sample_rate, channels, ?format, "audio output running");

        Ok(AudioHandle {
            errors: err_rx,
            sample_rate,
            _output_stream: stream,
        })
    }
}

// ── Output stream ─────────────────────────────────────────────────

fn build_output_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    guard: AudioGuard,
    channels: usize,
    err_tx: Sender<String>,
) -> anyhow::Result<cpal::Stream>
where
    T: SizedSample + FromSample<i16>,
{
    let channels = channels.max(1);
    // engine renders mono blocks into this, we fan them out per channel
    let mut scratch = [0i16; AUDIO_BUFFER_SAMPLES];

    let err_fn = move |err: cpal::StreamError| {
        let _ = err_tx.try_send(format!("audio output stream error: {err}"));
    };

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _info| {
            for chunk in data.chunks_mut(AUDIO_BUFFER_SAMPLES * channels) {
                let frames = chunk.len() / channels;
                let mono = &mut scratch[..frames];
                guard.render(mono);
                for (frame, &s) in chunk.chunks_mut(channels).zip(mono.iter()) {
                    frame.fill(T::from_sample(s));
                }
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}
