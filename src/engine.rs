//! Synthesis engine seam.
//!
//! The voice-cloning model itself is an external capability: given a
//! prepared speaker prompt and a piece of text, it produces one
//! waveform. Everything this crate needs from a backend is captured by
//! [`TtsEngine`]; model loading, device placement and inference live
//! behind it.
//!
//! [`PromptSet`] is the explicit per-run context object holding one
//! prepared prompt per role. It is populated once, before any
//! synthesis, and read-only afterward.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::script::SpeakerConfig;

/// Everything a backend needs to prepare one speaker's voice prompt.
#[derive(Debug, Clone)]
pub struct PromptSpec {
    /// Reference audio file, already resolved to an absolute location.
    pub ref_audio: PathBuf,
    /// Transcript of the reference audio. `None` selects
    /// voiceprint-only cloning mode.
    pub ref_text: Option<String>,
    /// Speaker-level language hint.
    pub language: Option<String>,
}

/// One synthesized waveform.
#[derive(Debug, Clone)]
pub struct Clip {
    /// Mono samples in -1.0..=1.0.
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

/// A text-to-speech backend with voice cloning.
pub trait TtsEngine {
    /// Backend-specific prepared speaker representation.
    type Prompt;

    /// Build a voice-clone prompt from reference material. Called once
    /// per role, before any synthesis.
    fn prepare_prompt(&self, spec: &PromptSpec) -> Result<Self::Prompt>;

    /// Synthesize one segment of text in the given speaker's voice.
    fn synthesize(&self, prompt: &Self::Prompt, text: &str, language: &str) -> Result<Clip>;
}

/// Role → prepared voice prompt, built once per batch run.
pub struct PromptSet<E: TtsEngine> {
    prompts: HashMap<String, E::Prompt>,
}

impl<E: TtsEngine> PromptSet<E> {
    /// Prepare a prompt for every speaker. A speaker with no reference
    /// audio is a fatal configuration error here, before any synthesis
    /// work starts.
    pub fn prepare(engine: &E, speakers: &BTreeMap<String, SpeakerConfig>) -> Result<Self> {
        let mut prompts = HashMap::with_capacity(speakers.len());
        for (role, cfg) in speakers {
            tracing::info!(role = %role, "preparing voice prompt");
            let ref_audio = cfg
                .ref_audio
                .clone()
                .ok_or_else(|| Error::MissingRefAudio { role: role.clone() })?;
            let spec = PromptSpec {
                ref_audio,
                ref_text: cfg.ref_text.clone().filter(|t| !t.is_empty()),
                language: cfg.language.clone(),
            };
            prompts.insert(role.clone(), engine.prepare_prompt(&spec)?);
        }
        Ok(Self { prompts })
    }

    /// Look up a role's prompt.
    pub fn get(&self, role: &str) -> Option<&E::Prompt> {
        self.prompts.get(role)
    }

    /// Number of prepared prompts.
    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }
}

/// Deterministic placeholder backend.
///
/// Produces a short tone whose pitch is derived from the reference
/// audio path, so distinct speakers are audibly distinct and test runs
/// are reproducible without a model. Real backends implement
/// [`TtsEngine`] and plug into the same pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ToneEngine {
    sample_rate: u32,
}

/// Prepared state of [`ToneEngine`]: just a per-speaker pitch.
#[derive(Debug, Clone, Copy)]
pub struct TonePrompt {
    frequency: f32,
}

impl ToneEngine {
    pub fn new() -> Self {
        Self { sample_rate: 24_000 }
    }

    pub fn with_sample_rate(sample_rate: u32) -> Self {
        Self { sample_rate }
    }
}

impl Default for ToneEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TtsEngine for ToneEngine {
    type Prompt = TonePrompt;

    fn prepare_prompt(&self, spec: &PromptSpec) -> Result<Self::Prompt> {
        // FNV-1a over the path bytes keeps the mapping stable across runs.
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in spec.ref_audio.as_os_str().as_encoded_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        let frequency = 180.0 + (hash % 220) as f32;
        Ok(TonePrompt { frequency })
    }

    fn synthesize(&self, prompt: &Self::Prompt, text: &str, _language: &str) -> Result<Clip> {
        // 40 ms per character approximates speech pacing well enough
        // for pipeline checks.
        let chars = text.chars().count().max(5);
        let samples_len = (self.sample_rate as usize * chars * 40) / 1000;
        let step = std::f32::consts::TAU * prompt.frequency / self.sample_rate as f32;
        let samples = (0..samples_len)
            .map(|n| (n as f32 * step).sin() * 0.3)
            .collect();
        Ok(Clip {
            samples,
            sample_rate: self.sample_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(path: &str) -> SpeakerConfig {
        SpeakerConfig {
            ref_audio: Some(PathBuf::from(path)),
            ref_text: None,
            language: None,
        }
    }

    #[test]
    fn prompt_set_prepares_every_role() {
        let mut speakers = BTreeMap::new();
        speakers.insert("Alice".to_string(), speaker("/voices/alice.wav"));
        speakers.insert("Bob".to_string(), speaker("/voices/bob.wav"));

        let engine = ToneEngine::new();
        let prompts = PromptSet::prepare(&engine, &speakers).unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.get("Alice").is_some());
        assert!(prompts.get("Carol").is_none());
    }

    #[test]
    fn missing_ref_audio_is_fatal_before_synthesis() {
        let mut speakers = BTreeMap::new();
        speakers.insert("Alice".to_string(), SpeakerConfig::default());
        let engine = ToneEngine::new();
        assert!(matches!(
            PromptSet::prepare(&engine, &speakers),
            Err(Error::MissingRefAudio { .. })
        ));
    }

    #[test]
    fn tone_engine_is_deterministic_per_speaker() {
        let engine = ToneEngine::new();
        let spec = PromptSpec {
            ref_audio: PathBuf::from("/voices/alice.wav"),
            ref_text: None,
            language: None,
        };
        let a = engine.prepare_prompt(&spec).unwrap();
        let b = engine.prepare_prompt(&spec).unwrap();
        let clip_a = engine.synthesize(&a, "hello", "English").unwrap();
        let clip_b = engine.synthesize(&b, "hello", "English").unwrap();
        assert_eq!(clip_a.samples, clip_b.samples);
        assert_eq!(clip_a.sample_rate, 24_000);
    }

    #[test]
    fn clip_length_scales_with_text() {
        let engine = ToneEngine::new();
        let prompt = TonePrompt { frequency: 220.0 };
        let short = engine.synthesize(&prompt, "hi there you", "English").unwrap();
        let long = engine
            .synthesize(&prompt, "a considerably longer line of dialogue", "English")
            .unwrap();
        assert!(long.samples.len() > short.samples.len());
    }
}
