//! Silence-aware WAV concatenation.
//!
//! Clips are read in order, joined with blocks of zero samples, and
//! written once to the destination. The gap between two clips depends
//! on their provenance: fragments of the same original dialogue line
//! get the shorter intra-line gap, everything else gets the inter-line
//! default. Source files are never modified or deleted.

use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::error::Result;

/// Provenance of one clip, aligned with the merge input list.
#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentMeta {
    /// True when the clip is one fragment of a segmented line.
    pub is_segment: bool,
    /// Source line shared by all fragments of one original line.
    pub original_line_idx: Option<usize>,
}

impl SegmentMeta {
    fn same_source_line(&self, other: &SegmentMeta) -> bool {
        self.is_segment
            && other.is_segment
            && self.original_line_idx.is_some()
            && self.original_line_idx == other.original_line_idx
    }
}

/// Silence configuration for [`AudioMerger`].
#[derive(Debug, Clone, Copy)]
pub struct MergeOptions {
    /// Gap between clips from different dialogue lines, in ms.
    pub line_silence_ms: u64,
    /// Shorter gap between fragments of the same line, in ms. `None`
    /// uses the inter-line gap everywhere.
    pub segment_silence_ms: Option<u64>,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            line_silence_ms: 500,
            segment_silence_ms: None,
        }
    }
}

/// Concatenates ordered waveform files into one track.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioMerger {
    options: MergeOptions,
}

impl AudioMerger {
    pub fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// Merge `files` into `output`.
    ///
    /// Listed files that do not exist or fail to read are skipped with
    /// a warning. The first successfully read clip fixes the output
    /// sample rate; later clips at a different rate are joined as-is
    /// after a warning (no resampling — a documented limitation, the
    /// output plays those clips pitch-shifted). Returns the output path,
    /// or `None` when nothing could be read and no file was written.
    pub fn merge(
        &self,
        files: &[PathBuf],
        metadata: Option<&[SegmentMeta]>,
        output: &Path,
    ) -> Result<Option<PathBuf>> {
        tracing::info!(clips = files.len(), output = %output.display(), "merging audio");

        let mut combined: Vec<f32> = Vec::new();
        let mut target_rate: Option<u32> = None;
        let mut previous_included: Option<usize> = None;

        for (index, path) in files.iter().enumerate() {
            let (samples, rate) = match read_wav_mono(path) {
                Ok(clip) => clip,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "skipping clip");
                    continue;
                }
            };

            let rate = match target_rate {
                None => {
                    target_rate = Some(rate);
                    rate
                }
                Some(target) => {
                    if rate != target {
                        tracing::warn!(
                            path = %path.display(),
                            expected = target,
                            got = rate,
                            "sample rate mismatch, joining without resampling"
                        );
                    }
                    target
                }
            };

            if let Some(prev) = previous_included {
                let silence_ms = self.gap_ms(metadata, prev, index);
                let silence_len = (rate as u64 * silence_ms / 1000) as usize;
                combined.extend(std::iter::repeat_n(0.0_f32, silence_len));
            }
            combined.extend(samples);
            previous_included = Some(index);
        }

        let Some(rate) = target_rate else {
            tracing::warn!("no audio clips could be read, nothing to merge");
            return Ok(None);
        };

        write_wav_mono(output, &combined, rate)?;
        tracing::info!(
            samples = combined.len(),
            sample_rate = rate,
            output = %output.display(),
            "merged track written"
        );
        Ok(Some(output.to_path_buf()))
    }

    /// Gap to insert between the clips at input positions `prev` and
    /// `next`, both included in the output.
    fn gap_ms(&self, metadata: Option<&[SegmentMeta]>, prev: usize, next: usize) -> u64 {
        if let (Some(short), Some(meta)) = (self.options.segment_silence_ms, metadata)
            && let (Some(a), Some(b)) = (meta.get(prev), meta.get(next))
            && a.same_source_line(b)
        {
            return short;
        }
        self.options.line_silence_ms
    }
}

/// Read a WAV file down-mixed to mono f32 in -1.0..=1.0.
fn read_wav_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => reader.samples::<f32>().collect::<hound::Result<_>>()?,
        (SampleFormat::Int, bits) => {
            let scale = (1_i64 << (bits.max(1) - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<hound::Result<_>>()?
        }
    };

    if channels == 1 {
        return Ok((interleaved, spec.sample_rate));
    }
    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

/// Write mono f32 samples as 16-bit PCM.
pub(crate) fn write_wav_mono(path: &Path, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
