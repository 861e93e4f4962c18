//! Dialogue script data model.
//!
//! A [`Script`] is the normalized in-memory form of one input file,
//! whatever format it arrived in: metadata, a speaker map, and an
//! ordered dialogue sequence. It is immutable after load except for
//! [`Script::update_speaker`], which front ends use to patch in
//! reference audio collected interactively.

mod format;
mod loader;

pub use format::ScriptFormat;
pub use loader::load_script;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Script-level metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Human-readable title; also names the merged output file.
    #[serde(default)]
    pub title: Option<String>,
    /// Language used when neither a line nor its speaker specifies one.
    #[serde(default)]
    pub default_language: Option<String>,
}

impl Metadata {
    /// Title with a fallback, spaces replaced for filesystem use.
    pub fn output_stem(&self) -> String {
        self.title
            .as_deref()
            .unwrap_or("combined_dialogue")
            .replace(' ', "_")
    }

    /// Effective default language for the whole script.
    pub fn language(&self) -> &str {
        self.default_language.as_deref().unwrap_or("Chinese")
    }
}

/// Per-speaker voice-cloning configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerConfig {
    /// Reference audio for the voice-clone prompt. Must resolve to an
    /// existing file before synthesis. Relative paths are resolved
    /// against the script file's directory, never the working dir.
    #[serde(default)]
    pub ref_audio: Option<PathBuf>,
    /// Transcript of the reference audio; absence selects
    /// voiceprint-only cloning.
    #[serde(default)]
    pub ref_text: Option<String>,
    /// Per-speaker language override.
    #[serde(default)]
    pub language: Option<String>,
}

/// One line of dialogue, possibly a fragment of a longer original line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Speaker name; must exist in the script's speaker map.
    /// Accepts `speaker` as an input alias for uniformity.
    #[serde(alias = "speaker")]
    pub role: String,
    /// Text to synthesize. Non-empty after validation.
    pub text: String,
    /// Per-line language override.
    #[serde(default)]
    pub language: Option<String>,
    /// True when this line is one fragment of an over-long original.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_segment: bool,
    /// Position of the source line in the pre-segmentation sequence;
    /// shared by all fragments of one original line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_line_idx: Option<usize>,
    /// Order of this fragment within its original line, from 0.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segment_idx: Option<usize>,
}

impl DialogueLine {
    /// A plain, unsegmented line.
    pub fn new(role: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            text: text.into(),
            language: None,
            is_segment: false,
            original_line_idx: None,
            segment_idx: None,
        }
    }
}

/// A parsed dialogue script.
#[derive(Debug, Clone)]
pub struct Script {
    /// Script-level metadata.
    pub metadata: Metadata,
    /// Speaker name → voice config. Ordered for stable iteration.
    pub speakers: BTreeMap<String, SpeakerConfig>,
    /// Ordered dialogue sequence.
    pub dialogues: Vec<DialogueLine>,
    /// Directory containing the script file; anchor for relative
    /// `ref_audio` paths.
    script_dir: PathBuf,
}

impl Script {
    pub(crate) fn new(
        metadata: Metadata,
        speakers: BTreeMap<String, SpeakerConfig>,
        dialogues: Vec<DialogueLine>,
        script_dir: PathBuf,
    ) -> Self {
        Self {
            metadata,
            speakers,
            dialogues,
            script_dir,
        }
    }

    /// Distinct speaker names.
    pub fn roles(&self) -> Vec<&str> {
        self.speakers.keys().map(String::as_str).collect()
    }

    /// Replace (or insert) one speaker's config. Used by front ends
    /// that collect reference audio after structural validation.
    pub fn update_speaker(&mut self, role: impl Into<String>, config: SpeakerConfig) {
        self.speakers.insert(role.into(), config);
    }

    /// Speaker map with relative `ref_audio` paths resolved against the
    /// script file's directory. Resolution happens here, lazily, so a
    /// config patched in after load is resolved the same way.
    pub fn resolved_speakers(&self) -> BTreeMap<String, SpeakerConfig> {
        self.speakers
            .iter()
            .map(|(name, cfg)| {
                let mut cfg = cfg.clone();
                if let Some(ref_audio) = &cfg.ref_audio
                    && ref_audio.is_relative()
                {
                    cfg.ref_audio = Some(self.script_dir.join(ref_audio));
                }
                (name.clone(), cfg)
            })
            .collect()
    }

    /// Validate script structure, failing on the first problem found.
    ///
    /// With `check_ref_audio` set, every speaker must carry a
    /// `ref_audio` path that resolves to an existing file. Callers that
    /// intend to populate audio paths interactively pass `false` and
    /// re-validate before synthesis.
    pub fn validate(&self, check_ref_audio: bool) -> Result<()> {
        let speakers = self.resolved_speakers();

        if check_ref_audio {
            for (role, cfg) in &speakers {
                let path = cfg
                    .ref_audio
                    .as_ref()
                    .ok_or_else(|| Error::MissingRefAudio { role: role.clone() })?;
                if !path.is_file() {
                    return Err(Error::RefAudioNotFound {
                        role: role.clone(),
                        path: path.clone(),
                    });
                }
            }
        }

        for (line, dialogue) in self.dialogues.iter().enumerate() {
            if dialogue.role.is_empty() {
                return Err(Error::MissingRole { line });
            }
            if !speakers.contains_key(&dialogue.role) {
                return Err(Error::UnknownRole {
                    line,
                    role: dialogue.role.clone(),
                });
            }
            if dialogue.text.is_empty() {
                return Err(Error::MissingText { line });
            }
        }
        Ok(())
    }
}
