//! Microphone capture as an explicit session:
//! `Idle -> Recording -> Finalizing -> Idle`.
//!
//! `Finalizing` encodes the captured PCM samples as a WAV payload and hands
//! it back to the caller. Only one recording can be active; the input device
//! is held for exactly the duration of `Recording`.

use anyhow::{Context, Result};
use base64::Engine;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use crate::error::OrganizerError;
use crate::logging::{log_debug, log_info, log_warn};

/// A finished recording as WAV bytes
#[derive(Clone, PartialEq, Eq)]
pub struct AudioClip {
    wav: Vec<u8>,
}

impl std::fmt::Debug for AudioClip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioClip")
            .field("bytes", &self.wav.len())
            .finish()
    }
}

impl AudioClip {
    pub fn from_wav_bytes(wav: Vec<u8>) -> Self {
        Self { wav }
    }

    pub fn len(&self) -> usize {
        self.wav.len()
    }

    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.wav)
    }
}

/// Raw 16-bit PCM collected between `start` and `stop`
#[derive(Debug, Clone, Default)]
pub struct RecordedSamples {
    pub channels: u16,
    pub sample_rate: u32,
    pub samples: Vec<i16>,
}

/// An exclusive audio input device
pub trait AudioInput {
    /// Acquire the device and begin buffering samples
    fn start(&mut self) -> Result<()>;

    /// Stop buffering, release the device, and return what was captured
    fn stop(&mut self) -> Result<RecordedSamples>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Recording,
    Finalizing,
}

#[derive(Debug)]
pub struct CaptureSession<D: AudioInput> {
    device: D,
    state: CaptureState,
}

impl<D: AudioInput> CaptureSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            state: CaptureState::Idle,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Begin recording. Returns `Ok(false)` if a recording is already active.
    pub fn start(&mut self) -> Result<bool, OrganizerError> {
        if self.state != CaptureState::Idle {
            log_debug("Recording already active, ignoring start");
            return Ok(false);
        }

        self.device
            .start()
            .map_err(|e| OrganizerError::DeviceAccess(format!("{e:#}")))?;
        self.state = CaptureState::Recording;
        log_info("Recording started");
        Ok(true)
    }

    /// Finish the active recording. Returns `Ok(None)` when nothing was recording.
    pub fn stop(&mut self) -> Result<Option<AudioClip>, OrganizerError> {
        if self.state != CaptureState::Recording {
            return Ok(None);
        }

        self.state = CaptureState::Finalizing;
        let finalized = self
            .device
            .stop()
            .and_then(|recorded| encode_wav(&recorded));
        self.state = CaptureState::Idle;

        let wav = finalized.map_err(|e| OrganizerError::DeviceAccess(format!("{e:#}")))?;
        log_info(&format!("Recording finalized: {} bytes of WAV", wav.len()));
        Ok(Some(AudioClip::from_wav_bytes(wav)))
    }
}

pub fn encode_wav(recorded: &RecordedSamples) -> Result<Vec<u8>> {
    if recorded.samples.is_empty() {
        return Err(anyhow::anyhow!("No audio recorded"));
    }

    let spec = hound::WavSpec {
        channels: recorded.channels,
        sample_rate: recorded.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).context("Failed to create WAV writer")?;
        for &sample in &recorded.samples {
            writer
                .write_sample(sample)
                .context("Failed to write WAV sample")?;
        }
        writer.finalize().context("Failed to finalize WAV data")?;
    }
    Ok(cursor.into_inner())
}

/// Default system input device via cpal
#[derive(Default)]
pub struct Microphone {
    stream: Option<cpal::Stream>,
    buffer: Arc<Mutex<Vec<i16>>>,
    channels: u16,
    sample_rate: u32,
}

impl std::fmt::Debug for Microphone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Microphone")
            .field("active", &self.stream.is_some())
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}

fn push_samples<T: Copy>(buffer: &Arc<Mutex<Vec<i16>>>, data: &[T], convert: fn(T) -> i16) {
    if let Ok(mut samples) = buffer.lock() {
        samples.extend(data.iter().map(|&s| convert(s)));
    }
}

impl AudioInput for Microphone {
    fn start(&mut self) -> Result<()> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("No default input device available"))?;

        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        log_info(&format!("Using audio device: {device_name}"));

        let config = device
            .default_input_config()
            .context("Failed to get default input config")?;

        log_debug(&format!(
            "Audio config - Sample rate: {}, Channels: {}, Format: {:?}",
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        ));

        self.channels = config.channels();
        self.sample_rate = config.sample_rate().0;
        if let Ok(mut samples) = self.buffer.lock() {
            samples.clear();
        }

        let buffer = Arc::clone(&self.buffer);
        let on_error = |err: cpal::StreamError| log_warn(&format!("Stream error: {err}"));

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    push_samples(&buffer, data, |s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::I16 => device.build_input_stream(
                &config.into(),
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    push_samples(&buffer, data, |s| s)
                },
                on_error,
                None,
            ),
            cpal::SampleFormat::U16 => device.build_input_stream(
                &config.into(),
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    push_samples(&buffer, data, |s| (s as i32 - 32768) as i16)
                },
                on_error,
                None,
            ),
            other => {
                return Err(anyhow::anyhow!("Unsupported sample format: {other:?}"));
            }
        }
        .context("Failed to build input stream")?;

        stream.play().context("Failed to start audio stream")?;
        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<RecordedSamples> {
        // dropping the stream releases the device
        let stream = self
            .stream
            .take()
            .ok_or_else(|| anyhow::anyhow!("Microphone is not recording"))?;
        drop(stream);

        let samples = self
            .buffer
            .lock()
            .map(|mut guard| std::mem::take(&mut *guard))
            .map_err(|_| anyhow::anyhow!("Audio buffer lock poisoned"))?;

        Ok(RecordedSamples {
            channels: self.channels,
            sample_rate: self.sample_rate,
            samples,
        })
    }
}
