//! Pipeline configuration.
//!
//! One flat struct covers every knob a front end exposes, with
//! defaults matching the reference tooling. Serde-derived so a config
//! file or a GUI form can populate it the same way the CLI flags do.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::merge::MergeOptions;

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output_dialogue")
}

fn default_model() -> String {
    "Qwen/Qwen3-TTS-12Hz-1.7B-Base".to_string()
}

fn default_device() -> String {
    "cuda:0".to_string()
}

fn default_silence_ms() -> u64 {
    500
}

fn default_chunk_silence_ms() -> u64 {
    100
}

fn default_max_chars() -> usize {
    100
}

/// Everything one batch run needs besides the script itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory receiving per-segment WAVs and the merged track.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Model identifier or local path, passed through to the engine.
    #[serde(default = "default_model")]
    pub model: String,
    /// Compute device selector, passed through to the engine.
    #[serde(default = "default_device")]
    pub device: String,
    /// Concatenate the generated clips into one track.
    #[serde(default)]
    pub merge: bool,
    /// Gap between clips from different dialogue lines, in ms.
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u64,
    /// Shorter gap between fragments of one segmented line, in ms.
    #[serde(default = "default_chunk_silence_ms")]
    pub chunk_silence_ms: u64,
    /// Maximum characters per synthesis segment.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            model: default_model(),
            device: default_device(),
            merge: false,
            silence_ms: default_silence_ms(),
            chunk_silence_ms: default_chunk_silence_ms(),
            max_chars: default_max_chars(),
        }
    }
}

impl PipelineConfig {
    /// Silence configuration for the merge stage.
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            line_silence_ms: self.silence_ms,
            segment_silence_ms: Some(self.chunk_silence_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_mirror_reference_tooling() {
        let cfg = PipelineConfig::default();
        assert_eq!(cfg.silence_ms, 500);
        assert_eq!(cfg.chunk_silence_ms, 100);
        assert_eq!(cfg.max_chars, 100);
        assert!(!cfg.merge);
    }

    #[test]
    fn empty_json_fills_defaults() {
        let cfg: PipelineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("./output_dialogue"));
        assert_eq!(cfg.max_chars, 100);
    }
}
