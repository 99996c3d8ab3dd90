//! One-shot recording sessions via cpal.
//!
//! Opens the default (or named) input device, captures at its native
//! sample rate, downmixes to mono and resamples to 16 kHz, and accumulates
//! the take until the session is finished. Exactly one session is active
//! at a time; the main loop enforces that.

use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Stream, StreamConfig};
use tracing::{error, info};

use super::{encode_wav, AudioClip, TARGET_SAMPLE_RATE};

/// Resolved info about the audio input we will use.
struct CaptureConfig {
    device: cpal::Device,
    stream_config: StreamConfig,
    native_rate: u32,
}

/// Find and configure the input device.
fn resolve_device(device_name: Option<&str>) -> anyhow::Result<CaptureConfig> {
    let host = cpal::default_host();

    let device = if let Some(name) = device_name {
        host.input_devices()?
            .find(|d| d.name().map(|n| n == name).unwrap_or(false))
            .ok_or_else(|| anyhow::anyhow!("Input device not found: {name}"))?
    } else {
        host.default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device available"))?
    };

    let dev_name = device.name().unwrap_or_else(|_| "unknown".into());
    info!(device = %dev_name, "Selected input device");

    let default_config = device.default_input_config()?;
    let native_rate = default_config.sample_rate().0;
    let channels = default_config.channels();

    // We always request f32 format at the device's native rate and resample
    // ourselves.
    let stream_config = StreamConfig {
        channels,
        sample_rate: cpal::SampleRate(native_rate),
        buffer_size: cpal::BufferSize::Default,
    };

    Ok(CaptureConfig {
        device,
        stream_config,
        native_rate,
    })
}

/// Simple linear resampler from `from_rate` to `to_rate`.
/// Operates on mono f32 samples.
fn resample_linear(input: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate {
        return input.to_vec();
    }
    let ratio = from_rate as f64 / to_rate as f64;
    let out_len = ((input.len() as f64) / ratio).floor() as usize;
    let mut output = Vec::with_capacity(out_len);
    for i in 0..out_len {
        let src_idx = i as f64 * ratio;
        let idx0 = src_idx.floor() as usize;
        let frac = (src_idx - idx0 as f64) as f32;
        let s0 = input.get(idx0).copied().unwrap_or(0.0);
        let s1 = input.get(idx0 + 1).copied().unwrap_or(s0);
        output.push(s0 + frac * (s1 - s0));
    }
    output
}

/// Down-mix multi-channel audio to mono by averaging channels.
fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let ch = channels as usize;
    samples
        .chunks_exact(ch)
        .map(|frame| frame.iter().sum::<f32>() / ch as f32)
        .collect()
}

/// An in-progress capture session. The cpal stream stays alive for the
/// lifetime of the session; dropping the session stops capture.
pub struct RecordingSession {
    _stream: Stream,
    buffer: Arc<Mutex<Vec<f32>>>,
}

impl RecordingSession {
    /// Open the input device and start capturing.
    ///
    /// `device_name` of `None` uses the system default input.
    pub fn start(device_name: Option<&str>) -> anyhow::Result<Self> {
        let cfg = resolve_device(device_name)?;
        let native_rate = cfg.native_rate;
        let channels = cfg.stream_config.channels;
        let needs_resample = native_rate != TARGET_SAMPLE_RATE;
        let needs_downmix = channels > 1;

        let buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);

        let stream = cfg
            .device
            .build_input_stream(
                &cfg.stream_config,
                move |data: &[f32], _info: &cpal::InputCallbackInfo| {
                    let mono = if needs_downmix {
                        to_mono(data, channels)
                    } else {
                        data.to_vec()
                    };

                    let resampled = if needs_resample {
                        resample_linear(&mono, native_rate, TARGET_SAMPLE_RATE)
                    } else {
                        mono
                    };

                    if let Ok(mut buf) = sink.lock() {
                        buf.extend_from_slice(&resampled);
                    }
                },
                move |err| {
                    error!("Audio input stream error: {}", err);
                },
                None, // no timeout
            )?;

        stream.play()?;
        info!(native_rate, channels, "Recording started");

        Ok(Self {
            _stream: stream,
            buffer,
        })
    }

    /// Stop capturing and package the take as a 16 kHz mono WAV clip.
    ///
    /// An empty take (device produced no samples) is an error.
    pub fn finish(self) -> anyhow::Result<AudioClip> {
        drop(self._stream);

        let samples = match self.buffer.lock() {
            Ok(mut buf) => std::mem::take(&mut *buf),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };

        if samples.is_empty() {
            anyhow::bail!("No audio captured — check the microphone and try again");
        }

        let duration_secs = samples.len() as f32 / TARGET_SAMPLE_RATE as f32;
        let data = encode_wav(&samples, TARGET_SAMPLE_RATE);
        info!(
            samples = samples.len(),
            duration_secs, "Recording finished"
        );

        Ok(AudioClip {
            data,
            mime_type: "audio/wav",
            filename: "recording.wav",
            duration_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity_when_rates_match() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&input, 16_000, 16_000), input);
    }

    #[test]
    fn test_resample_halves_length_at_double_rate() {
        let input: Vec<f32> = (0..320).map(|i| i as f32 / 320.0).collect();
        let out = resample_linear(&input, 32_000, 16_000);
        assert_eq!(out.len(), 160);
    }

    #[test]
    fn test_to_mono_averages_stereo_frames() {
        let stereo = vec![1.0, 0.0, 0.5, 0.5];
        assert_eq!(to_mono(&stereo, 2), vec![0.5, 0.5]);
    }

    #[test]
    fn test_to_mono_passthrough_for_mono() {
        let mono = vec![0.1, 0.2];
        assert_eq!(to_mono(&mono, 1), mono);
    }
}
