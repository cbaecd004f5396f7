//! Real-time audio playback using cpal

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, Stream, StreamConfig};
use log::{error, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Engine;

/// Real-time audio player
///
/// The engine moves into the device callback, which is its only user
/// from then on.
pub struct Player {
    stream: Option<Stream>,
    running: Arc<AtomicBool>,
}

impl Player {
    /// Create a new player
    pub fn new() -> Self {
        Self {
            stream: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start playing the engine on the named device, or the default one
    pub fn start(&mut self, mut engine: Engine, device_name: Option<&str>) -> Result<()> {
        let host = cpal::default_host();
        let device = match device_name {
            Some(name) => find_output_device(&host, name)?,
            None => host
                .default_output_device()
                .ok_or_else(|| anyhow!("No output device available"))?,
        };

        let config = device
            .default_output_config()
            .context("failed to query the output config")?;
        let sample_format = config.sample_format();
        let stream_config: StreamConfig = config.into();

        let buffer_size = engine.config().audio.buffer_size;
        engine.prepare(stream_config.sample_rate.0 as f32, buffer_size);
        info!(
            "playing on {} ({} Hz, {} ch, {:?})",
            device.name().unwrap_or_default(),
            stream_config.sample_rate.0,
            stream_config.channels,
            sample_format
        );

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, engine, running)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, engine, running)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, engine, running)?,
            other => return Err(anyhow!("Unsupported sample format {:?}", other)),
        };

        stream.play().context("failed to start the output stream")?;
        self.stream = Some(stream);

        Ok(())
    }

    /// Stop playback
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.stream = None;
    }

    /// Check if currently playing
    pub fn is_playing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

fn find_output_device(host: &cpal::Host, name: &str) -> Result<Device> {
    host.output_devices()
        .context("failed to list output devices")?
        .find(|device| device.name().map(|n| n == name).unwrap_or(false))
        .ok_or_else(|| anyhow!("No output device named '{}'", name))
}

fn build_stream<T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>>(
    device: &Device,
    config: &StreamConfig,
    mut engine: Engine,
    running: Arc<AtomicBool>,
) -> Result<Stream> {
    let channels = (config.channels as usize).max(1);
    // Float staging for every sample format, sized before the stream starts
    let mut staging = vec![0.0f32; engine.max_block_size() * channels];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            if !running.load(Ordering::SeqCst) {
                // Fill with silence when stopped
                for sample in data.iter_mut() {
                    *sample = T::from_sample(0.0f32);
                }
                return;
            }
            fill_device_buffer(&mut engine, &mut staging, data, channels);
        },
        |err| {
            error!("Audio stream error: {}", err);
        },
        None,
    )?;

    Ok(stream)
}

/// Render into a device buffer through a fixed-size float staging buffer.
/// `staging` holds whole frames; the device buffer is filled in chunks of it.
fn fill_device_buffer<T: cpal::Sample + cpal::FromSample<f32>>(
    engine: &mut Engine,
    staging: &mut [f32],
    data: &mut [T],
    channels: usize,
) {
    let chunk_len = (staging.len() / channels * channels).max(channels);
    if staging.len() < chunk_len {
        for sample in data.iter_mut() {
            *sample = T::from_sample(0.0f32);
        }
        return;
    }
    for chunk in data.chunks_mut(chunk_len) {
        let staging = &mut staging[..chunk.len()];
        engine.fill_interleaved(staging, channels);
        for (out, &sample) in chunk.iter_mut().zip(staging.iter()) {
            *out = T::from_sample(sample);
        }
    }
}

/// Get the default output device name
pub fn default_device_name() -> Option<String> {
    let host = cpal::default_host();
    host.default_output_device().and_then(|d| d.name().ok())
}

/// List all available output devices
pub fn list_output_devices() -> Vec<(String, StreamConfig)> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(output_devices) = host.output_devices() {
        for device in output_devices {
            if let (Ok(name), Ok(config)) = (device.name(), device.default_output_config()) {
                devices.push((name, config.into()));
            }
        }
    }

    devices
}
