//! multivox – batch multi-speaker dialogue synthesis
//! ==================================================
//! Turns a dialogue script (JSON or plain text) into per-line speech
//! clips via a voice-cloning TTS backend, then optionally joins them
//! into one track with context-aware silence between clips.
//!
//! The pipeline is a straight line:
//!
//! ```text
//! script file ─▶ Script ─▶ Segmenter ─▶ synthesize_batch ─▶ AudioMerger
//! ```
//!
//! The model itself stays behind the [`TtsEngine`] trait; this crate
//! owns the script formats, the bounded-length segmentation, the batch
//! bookkeeping, and the silence-aware merge.

#![deny(unsafe_code)]

/* ────────────────────────  sub-modules  ─────────────────────────────── */
pub mod config;
pub mod engine;
pub mod error;
pub mod merge;
pub mod script;
pub mod segment;
pub mod synth;

/* ────────── public façade & re-exports ──────────────────────────────── */
pub use config::PipelineConfig;
pub use engine::{Clip, PromptSet, PromptSpec, ToneEngine, TtsEngine};
pub use error::{Error, Result};
pub use merge::{AudioMerger, MergeOptions, SegmentMeta};
pub use script::{
    DialogueLine, Metadata, Script, ScriptFormat, SpeakerConfig, load_script,
};
pub use segment::Segmenter;
pub use synth::{BatchReport, RenderedSegment, SegmentFailure, synthesize_batch};
