//! Microphone capture and WAV packaging.

pub mod recorder;

use cpal::traits::{DeviceTrait, HostTrait};

/// Target sample rate for captured audio.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// A finished recording take, packaged for upload.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// 16-bit PCM WAV bytes.
    pub data: Vec<u8>,
    pub mime_type: &'static str,
    pub filename: &'static str,
    pub duration_secs: f32,
}

/// List available input device names.
pub fn list_devices() -> Vec<String> {
    let host = cpal::default_host();
    let mut names = Vec::new();
    if let Ok(devices) = host.input_devices() {
        for dev in devices {
            if let Ok(name) = dev.name() {
                names.push(name);
            }
        }
    }
    names
}

/// Encode f32 audio samples as 16-bit PCM WAV bytes.
///
/// Assumes mono input at `sample_rate`.
pub fn encode_wav(audio: &[f32], sample_rate: u32) -> Vec<u8> {
    let num_samples = audio.len() as u32;
    let bytes_per_sample: u16 = 2; // 16-bit
    let num_channels: u16 = 1;
    let data_size = num_samples * bytes_per_sample as u32;
    let file_size = 36 + data_size; // RIFF header is 44 bytes total, minus 8 for RIFF+size

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&file_size.to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    // fmt sub-chunk
    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes()); // sub-chunk size
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    buf.extend_from_slice(&num_channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    let byte_rate = sample_rate * num_channels as u32 * bytes_per_sample as u32;
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    let block_align = num_channels * bytes_per_sample;
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&(bytes_per_sample * 8).to_le_bytes()); // bits per sample

    // data sub-chunk
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in audio {
        let clamped = sample.clamp(-1.0, 1.0);
        let pcm = (clamped * 32767.0) as i16;
        buf.extend_from_slice(&pcm.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wav_header() {
        let samples = vec![0.0f32; 160];
        let wav = encode_wav(&samples, TARGET_SAMPLE_RATE);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(wav.len(), 44 + samples.len() * 2);

        // Sample rate field at offset 24
        let rate = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(rate, TARGET_SAMPLE_RATE);
    }

    #[test]
    fn test_encode_wav_clamps_out_of_range_samples() {
        let wav = encode_wav(&[2.0, -2.0], 16_000);
        let first = i16::from_le_bytes([wav[44], wav[45]]);
        let second = i16::from_le_bytes([wav[46], wav[47]]);
        assert_eq!(first, 32767);
        assert_eq!(second, -32767);
    }
}
