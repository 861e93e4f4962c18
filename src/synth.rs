//! Batch synthesis driver.
//!
//! Walks the segmented dialogue sequence, synthesizes each entry with
//! the prepared prompt for its role, and writes one WAV per segment.
//! A per-segment failure is recorded and the batch continues; the
//! caller inspects the [`BatchReport`] to see what rendered and what
//! failed and why.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::engine::{PromptSet, TtsEngine};
use crate::error::{Error, Result};
use crate::merge::{SegmentMeta, write_wav_mono};
use crate::script::DialogueLine;

/// One successfully synthesized segment.
#[derive(Debug, Clone)]
pub struct RenderedSegment {
    /// Running index in the batch, also encoded in the filename.
    pub index: usize,
    /// Speaker of the segment.
    pub role: String,
    /// Where the WAV was written.
    pub path: PathBuf,
    /// Provenance carried over to the merger.
    pub meta: SegmentMeta,
}

/// One segment the engine could not render.
#[derive(Debug, Clone)]
pub struct SegmentFailure {
    /// Running index in the batch.
    pub index: usize,
    /// Speaker of the segment.
    pub role: String,
    /// First characters of the text, for log correlation.
    pub text_prefix: String,
    /// Engine-reported reason.
    pub reason: String,
}

/// Outcome of one batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Rendered segments, in batch order.
    pub rendered: Vec<RenderedSegment>,
    /// Segments omitted from the output set.
    pub failures: Vec<SegmentFailure>,
}

impl BatchReport {
    /// Ordered WAV paths, ready for the merger.
    pub fn files(&self) -> Vec<PathBuf> {
        self.rendered.iter().map(|s| s.path.clone()).collect()
    }

    /// Provenance metadata aligned with [`files`](Self::files).
    pub fn metadata(&self) -> Vec<SegmentMeta> {
        self.rendered.iter().map(|s| s.meta).collect()
    }
}

/// Output filename for one segment: running index plus role, with the
/// fragment number appended for segmented lines, so the mapping back
/// to the dialogue stays unambiguous and order-preserving.
fn segment_filename(index: usize, line: &DialogueLine) -> String {
    let role = line.role.replace(['/', '\\'], "_");
    match (line.is_segment, line.segment_idx) {
        (true, Some(part)) => format!("{index:04}_{role}_part{part}.wav"),
        _ => format!("{index:04}_{role}.wav"),
    }
}

fn text_prefix(text: &str) -> String {
    text.chars().take(30).collect()
}

/// Synthesize every dialogue line into `output_dir`.
///
/// Fails up front if any line's role has no prepared prompt; after
/// that, failures are per-segment and the batch runs to the end.
pub fn synthesize_batch<E: TtsEngine>(
    engine: &E,
    prompts: &PromptSet<E>,
    dialogues: &[DialogueLine],
    output_dir: &Path,
    default_language: &str,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;

    // Every role must have a prompt before any synthesis is attempted.
    for line in dialogues {
        if prompts.get(&line.role).is_none() {
            return Err(Error::NoPrompt {
                role: line.role.clone(),
            });
        }
    }

    let bar = ProgressBar::new(dialogues.len() as u64);
    if let Ok(style) =
        ProgressStyle::with_template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} segments ({eta})")
    {
        bar.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
    }

    let mut report = BatchReport::default();
    for (index, line) in dialogues.iter().enumerate() {
        let language = line.language.as_deref().unwrap_or(default_language);
        tracing::info!(
            index,
            total = dialogues.len(),
            role = %line.role,
            text = %text_prefix(&line.text),
            "synthesizing"
        );

        // Checked above; treat disappearance as a per-segment failure
        // rather than panicking.
        let Some(prompt) = prompts.get(&line.role) else {
            report.failures.push(SegmentFailure {
                index,
                role: line.role.clone(),
                text_prefix: text_prefix(&line.text),
                reason: format!("no prompt for role '{}'", line.role),
            });
            bar.inc(1);
            continue;
        };

        let outcome = engine
            .synthesize(prompt, &line.text, language)
            .and_then(|clip| {
                let path = output_dir.join(segment_filename(index, line));
                write_wav_mono(&path, &clip.samples, clip.sample_rate)?;
                Ok(path)
            });

        match outcome {
            Ok(path) => report.rendered.push(RenderedSegment {
                index,
                role: line.role.clone(),
                path,
                meta: SegmentMeta {
                    is_segment: line.is_segment,
                    original_line_idx: line.original_line_idx,
                },
            }),
            Err(e) => {
                tracing::error!(
                    index,
                    role = %line.role,
                    text = %text_prefix(&line.text),
                    error = %e,
                    "segment failed, continuing batch"
                );
                report.failures.push(SegmentFailure {
                    index,
                    role: line.role.clone(),
                    text_prefix: text_prefix(&line.text),
                    reason: e.to_string(),
                });
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    tracing::info!(
        rendered = report.rendered.len(),
        failed = report.failures.len(),
        "batch complete"
    );
    Ok(report)
}
