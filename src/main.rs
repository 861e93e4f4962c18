// multivox CLI
// ─────────────────────────────────────────────────────────────────────────────
//  ❯ multivox --input play.json --merge
//  ❯ multivox --input play.txt --output-dir out --max-chars 80 --silence 400
// ─────────────────────────────────────────────────────────────────────────────

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use multivox::{
    AudioMerger, PipelineConfig, PromptSet, Segmenter, ToneEngine, load_script,
    synthesize_batch,
};

/// Available synthesis backends. Model backends implement
/// `multivox::TtsEngine` and register here.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum EngineKind {
    /// Deterministic tone generator; exercises the full pipeline
    /// without a model.
    Tone,
}

/// Batch dialogue synthesis from a JSON or TXT script.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the dialogue script (.json or .txt).
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Output directory for per-segment and merged audio.
    #[arg(long, short = 'o', default_value = "./output_dialogue")]
    output_dir: PathBuf,

    /// Model identifier or local path, passed to the engine.
    #[arg(long, short = 'm', default_value = "Qwen/Qwen3-TTS-12Hz-1.7B-Base")]
    model_path: String,

    /// Compute device selector, passed to the engine.
    #[arg(long, default_value = "cuda:0")]
    device: String,

    /// Synthesis backend.
    #[arg(long, value_enum, default_value_t = EngineKind::Tone)]
    engine: EngineKind,

    /// Merge generated clips into one track (originals are kept).
    #[arg(long)]
    merge: bool,

    /// Silence between dialogue lines when merging, in ms.
    #[arg(long, default_value_t = 500)]
    silence: u64,

    /// Silence between fragments of one segmented line, in ms.
    #[arg(long, default_value_t = 100)]
    chunk_silence: u64,

    /// Maximum characters per synthesis segment.
    #[arg(long, default_value_t = 100)]
    max_chars: usize,
}

impl Args {
    fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            output_dir: self.output_dir.clone(),
            model: self.model_path.clone(),
            device: self.device.clone(),
            merge: self.merge,
            silence_ms: self.silence,
            chunk_silence_ms: self.chunk_silence,
            max_chars: self.max_chars,
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let cfg = args.pipeline_config();

    if !args.input.exists() {
        bail!("input file {:?} not found", args.input);
    }

    // 1. Parse the script. Plain-text imports carry no reference audio
    //    yet, so skip the existence check there; prompt preparation
    //    still requires audio before anything is synthesized.
    tracing::info!(input = %args.input.display(), "parsing dialogue script");
    let script = load_script(&args.input).context("failed to load script")?;
    let is_txt = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("txt"));
    script
        .validate(!is_txt)
        .context("script validation failed")?;
    if is_txt {
        tracing::info!(
            "TXT script detected; speaker reference audio must be present in the \
             config lines or patched in before synthesis"
        );
    }
    tracing::info!(
        roles = script.roles().len(),
        lines = script.dialogues.len(),
        title = %script.metadata.output_stem(),
        "script loaded"
    );

    // 2. Split over-long lines.
    let segmenter = Segmenter::new(cfg.max_chars);
    let dialogues = segmenter.process(script.dialogues.clone());
    tracing::info!(
        segments = dialogues.len(),
        max_chars = cfg.max_chars,
        "segmentation complete"
    );

    // 3. Prepare voice prompts, once, before any synthesis.
    let engine = match args.engine {
        EngineKind::Tone => {
            tracing::info!(
                model = %cfg.model,
                device = %cfg.device,
                "using tone engine (model identifier and device are ignored)"
            );
            ToneEngine::new()
        }
    };
    let prompts = PromptSet::prepare(&engine, &script.resolved_speakers())
        .context("failed to prepare voice prompts")?;

    // 4. Batch synthesis.
    let report = synthesize_batch(
        &engine,
        &prompts,
        &dialogues,
        &cfg.output_dir,
        script.metadata.language(),
    )?;
    for failure in &report.failures {
        tracing::warn!(
            index = failure.index,
            role = %failure.role,
            text = %failure.text_prefix,
            reason = %failure.reason,
            "segment omitted"
        );
    }
    if report.rendered.is_empty() {
        bail!("no segments were rendered");
    }

    // 5. Optional merge into one track.
    if cfg.merge {
        let output = cfg
            .output_dir
            .join(format!("{}.wav", script.metadata.output_stem()));
        let merger = AudioMerger::new(cfg.merge_options());
        match merger.merge(&report.files(), Some(&report.metadata()), &output)? {
            Some(path) => tracing::info!(output = %path.display(), "merged track ready"),
            None => tracing::warn!("no clips available to merge"),
        }
    }

    tracing::info!(
        rendered = report.rendered.len(),
        failed = report.failures.len(),
        output_dir = %cfg.output_dir.display(),
        "batch synthesis finished"
    );
    Ok(())
}
