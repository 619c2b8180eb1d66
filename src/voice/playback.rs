//! Audio playback to speakers

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Sample rate for playback (matches common TTS output)
const PLAYBACK_SAMPLE_RATE: u32 = 24000;

/// Cooperative cancellation flag for an in-progress playback
///
/// [`Speaker::speak`](crate::voice::Speaker::speak) cancels the prior
/// utterance's token before starting a new one (last-write-wins).
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Plays audio to the default output device
pub struct AudioPlayback {
    device: Device,
    config: StreamConfig,
}

impl AudioPlayback {
    /// Open the default output device at 24kHz
    ///
    /// # Errors
    ///
    /// Returns error if no output device is present or none supports the
    /// required format. This is the startup capability check for speech
    /// output.
    pub fn new() -> Result<Self> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        let supported = device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(|c| {
                c.channels() == 1
                    && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
            })
            .or_else(|| {
                // Fallback: stereo output
                device.supported_output_configs().ok()?.find(|c| {
                    c.channels() == 2
                        && c.min_sample_rate() <= SampleRate(PLAYBACK_SAMPLE_RATE)
                        && c.max_sample_rate() >= SampleRate(PLAYBACK_SAMPLE_RATE)
                })
            })
            .ok_or_else(|| Error::Audio("no suitable output config found".to_string()))?;

        let config = supported
            .with_sample_rate(SampleRate(PLAYBACK_SAMPLE_RATE))
            .config();

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            sample_rate = PLAYBACK_SAMPLE_RATE,
            channels = config.channels,
            "audio playback initialized"
        );

        Ok(Self { device, config })
    }

    /// Play f32 samples until complete or the token is cancelled
    ///
    /// # Errors
    ///
    /// Returns error if playback fails
    #[allow(clippy::unused_async)]
    pub async fn play(&mut self, samples: Vec<f32>, cancel: &CancelToken) -> Result<()> {
        self.play_blocking(samples, cancel)
    }

    /// Decode MP3 bytes and play them
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    #[allow(clippy::unused_async)]
    pub async fn play_mp3(&mut self, mp3_data: &[u8], cancel: &CancelToken) -> Result<()> {
        let samples = decode_mp3(mp3_data)?;
        self.play_blocking(samples, cancel)
    }

    fn play_blocking(&self, samples: Vec<f32>, cancel: &CancelToken) -> Result<()> {
        if samples.is_empty() || cancel.is_cancelled() {
            return Ok(());
        }

        let channels = self.config.channels as usize;
        let sample_count = samples.len();

        let samples = Arc::new(samples);
        let position = Arc::new(Mutex::new(0usize));
        let finished = Arc::new(AtomicBool::new(false));

        let samples_cb = Arc::clone(&samples);
        let position_cb = Arc::clone(&position);
        let finished_cb = Arc::clone(&finished);

        let stream = self
            .device
            .build_output_stream(
                &self.config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let Ok(mut pos) = position_cb.lock() else {
                        return;
                    };
                    for frame in data.chunks_mut(channels) {
                        let sample = if *pos < samples_cb.len() {
                            let s = samples_cb[*pos];
                            *pos += 1;
                            s
                        } else {
                            finished_cb.store(true, Ordering::Relaxed);
                            0.0
                        };
                        for out in frame.iter_mut() {
                            *out = sample;
                        }
                    }
                },
                |err| {
                    tracing::error!(error = %err, "audio playback error");
                },
                None,
            )
            .map_err(|e| Error::Audio(e.to_string()))?;

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        // Poll for completion or cancellation, bounded by the clip length
        let duration_ms = (sample_count as u64 * 1000) / u64::from(PLAYBACK_SAMPLE_RATE);
        let deadline =
            std::time::Instant::now() + std::time::Duration::from_millis(duration_ms + 500);

        while !finished.load(Ordering::Relaxed) && !cancel.is_cancelled() {
            if std::time::Instant::now() > deadline {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }

        drop(stream);

        if cancel.is_cancelled() {
            tracing::debug!(samples = sample_count, "playback cancelled");
        } else {
            tracing::debug!(samples = sample_count, "playback complete");
        }

        Ok(())
    }
}

/// Decode MP3 bytes to mono f32 samples
fn decode_mp3(mp3_data: &[u8]) -> Result<Vec<f32>> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();

    loop {
        match decoder.next_frame() {
            Ok(frame) => {
                if frame.channels == 2 {
                    // Stereo: average channels
                    samples.extend(frame.data.chunks(2).map(|chunk| {
                        let left = f32::from(chunk[0]) / 32768.0;
                        let right = f32::from(chunk.get(1).copied().unwrap_or(chunk[0])) / 32768.0;
                        f32::midpoint(left, right)
                    }));
                } else {
                    samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
                }
            }
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        }
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_token_propagates_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();

        token.cancel();
        assert!(clone.is_cancelled());
    }
}
