//! WAV file recorder
//!
//! Records stereo engine output to 32-bit float WAV files.

use anyhow::{Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Stereo WAV file recorder
pub struct Recorder {
    writer: WavWriter<BufWriter<File>>,
    path: PathBuf,
    sample_rate: u32,
    frames_written: u64,
}

impl Recorder {
    /// Create a new recorder
    ///
    /// # Arguments
    /// * `path` - Output file path
    /// * `sample_rate` - Sample rate in Hz
    pub fn new(path: &Path, sample_rate: u32) -> Result<Self> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };

        let writer = WavWriter::create(path, spec)
            .with_context(|| format!("failed to create WAV file: {:?}", path))?;
        info!("recording to {:?} at {} Hz", path, sample_rate);

        Ok(Self {
            writer,
            path: path.to_path_buf(),
            sample_rate,
            frames_written: 0,
        })
    }

    /// Get the sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the number of stereo frames written
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Get the duration recorded in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frames_written as f64 / self.sample_rate as f64
    }

    /// Write one stereo frame
    pub fn write_frame(&mut self, left: f32, right: f32) -> Result<()> {
        self.writer
            .write_sample(left)
            .and_then(|_| self.writer.write_sample(right))
            .context("failed to write frame")?;
        self.frames_written += 1;
        Ok(())
    }

    /// Write a block of frames; only the common length is written
    pub fn write_block(&mut self, left: &[f32], right: &[f32]) -> Result<()> {
        for (&l, &r) in left.iter().zip(right) {
            self.write_frame(l, r)?;
        }
        Ok(())
    }

    /// Finalize the WAV file
    ///
    /// This must be called to properly close the file and write the header.
    pub fn finalize(self) -> Result<()> {
        self.writer
            .finalize()
            .with_context(|| format!("failed to finalize WAV file: {:?}", self.path))?;
        info!(
            "wrote {} frames ({:.1}s) to {:?}",
            self.frames_written,
            self.frames_written as f64 / self.sample_rate as f64,
            self.path
        );
        Ok(())
    }
}
