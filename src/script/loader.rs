//! Per-format script parsers.
//!
//! [`load_script`] reads the file once, classifies it with
//! [`ScriptFormat::classify`], and hands the text to the matching
//! deterministic parse function. Plain-text imports synthesize empty
//! speaker configs; the caller fills in reference audio later via
//! [`Script::update_speaker`](super::Script::update_speaker).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{DialogueLine, Metadata, Script, ScriptFormat, SpeakerConfig};
use crate::error::{Error, Result};

/// Load and normalize a dialogue script from `.json` or `.txt`.
pub fn load_script(path: impl AsRef<Path>) -> Result<Script> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let first_non_blank = raw
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let format = ScriptFormat::classify(path, first_non_blank)?;

    let script_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    tracing::debug!(?format, path = %path.display(), "loading script");

    match format {
        ScriptFormat::JsonList => parse_json_list(path, &raw, script_dir),
        ScriptFormat::JsonFull => parse_json_full(path, &raw, script_dir),
        ScriptFormat::BracketedText => Ok(parse_bracketed(&raw, script_dir)),
        ScriptFormat::PairedLine => Ok(parse_paired_line(&raw, script_dir)),
    }
}

fn imported_metadata(source: &str) -> Metadata {
    Metadata {
        title: Some(format!("Imported from {source}")),
        default_language: Some("Chinese".into()),
    }
}

/// Empty configs for every distinct role in `dialogues`, untouched
/// roles the caller already collected kept as-is.
fn synthesize_speakers(
    dialogues: &[DialogueLine],
    mut speakers: BTreeMap<String, SpeakerConfig>,
) -> BTreeMap<String, SpeakerConfig> {
    for line in dialogues {
        speakers.entry(line.role.clone()).or_default();
    }
    speakers
}

fn parse_json_list(path: &Path, raw: &str, script_dir: PathBuf) -> Result<Script> {
    let dialogues: Vec<DialogueLine> = serde_json::from_str(raw).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let speakers = synthesize_speakers(&dialogues, BTreeMap::new());
    Ok(Script::new(
        imported_metadata("JSON"),
        speakers,
        dialogues,
        script_dir,
    ))
}

/// Outer shape of a full-format script file. Sections are optional at
/// the serde level so their absence surfaces as a named validation
/// error instead of a parse error.
#[derive(Deserialize)]
struct FullScriptFile {
    #[serde(default)]
    metadata: Metadata,
    speakers: Option<BTreeMap<String, SpeakerConfig>>,
    dialogues: Option<Vec<DialogueLine>>,
}

fn parse_json_full(path: &Path, raw: &str, script_dir: PathBuf) -> Result<Script> {
    let file: FullScriptFile = serde_json::from_str(raw).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let speakers = file
        .speakers
        .ok_or(Error::MissingSection { name: "speakers" })?;
    let dialogues = file
        .dialogues
        .ok_or(Error::MissingSection { name: "dialogues" })?;
    Ok(Script::new(file.metadata, speakers, dialogues, script_dir))
}

/// Parse one `[role] text` line; `None` for anything else.
fn bracketed_line(line: &str) -> Option<(&str, &str)> {
    let rest = line.strip_prefix('[')?;
    let close = rest.find(']')?;
    let role = &rest[..close];
    let text = rest[close + 1..].trim_start();
    if role.is_empty() || text.is_empty() {
        return None;
    }
    Some((role, text))
}

fn parse_bracketed(raw: &str, script_dir: PathBuf) -> Script {
    let dialogues: Vec<DialogueLine> = raw
        .lines()
        .map(str::trim)
        .filter_map(bracketed_line)
        .map(|(role, text)| DialogueLine::new(role, text))
        .collect();
    let speakers = synthesize_speakers(&dialogues, BTreeMap::new());
    Script::new(imported_metadata("TXT"), speakers, dialogues, script_dir)
}

/// Config line of the paired-line layout.
#[derive(Deserialize)]
struct PairedConfig {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    ref_audio: Option<PathBuf>,
    #[serde(default)]
    ref_text: Option<String>,
    #[serde(default)]
    language: Option<String>,
}

fn parse_paired_line(raw: &str, script_dir: PathBuf) -> Script {
    let lines: Vec<&str> = raw.lines().map(str::trim).collect();
    let mut dialogues = Vec::new();
    let mut speakers: BTreeMap<String, SpeakerConfig> = BTreeMap::new();

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if line.starts_with('{') {
            // Malformed config lines are skipped, not fatal.
            if let Ok(config) = serde_json::from_str::<PairedConfig>(line) {
                let role = config.name.clone().unwrap_or_else(|| "Unknown".into());
                // The following line is this role's text; a config line
                // with no non-blank follower is dropped.
                i += 1;
                if let Some(text) = lines.get(i).filter(|t| !t.is_empty()) {
                    let mut dialogue = DialogueLine::new(role.clone(), *text);
                    dialogue.language = config.language.clone();
                    dialogues.push(dialogue);

                    let entry = speakers.entry(role).or_default();
                    if config.ref_audio.is_some() {
                        entry.ref_audio = config.ref_audio;
                    }
                    if config.ref_text.is_some() {
                        entry.ref_text = config.ref_text;
                    }
                    if config.language.is_some() {
                        entry.language = config.language;
                    }
                }
            }
        }
        i += 1;
    }

    Script::new(imported_metadata("TXT"), speakers, dialogues, script_dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn json_list_normalizes_speaker_key() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "play.json",
            r#"[{"speaker": "Alice", "text": "Hi"}, {"role": "Bob", "text": "Hey"}]"#,
        );
        let script = load_script(&path).unwrap();
        assert_eq!(script.dialogues.len(), 2);
        assert_eq!(script.dialogues[0].role, "Alice");
        assert_eq!(script.dialogues[1].role, "Bob");
        assert!(script.speakers.contains_key("Alice"));
        assert!(script.speakers.contains_key("Bob"));
        script.validate(false).unwrap();
    }

    #[test]
    fn json_full_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "play.json",
            r#"{
                "metadata": {"title": "Tea Time", "default_language": "English"},
                "speakers": {"Alice": {"ref_audio": "alice.wav", "ref_text": "hello"}},
                "dialogues": [{"speaker": "Alice", "text": "More tea?"}]
            }"#,
        );
        let script = load_script(&path).unwrap();
        assert_eq!(script.metadata.title.as_deref(), Some("Tea Time"));
        assert_eq!(script.metadata.language(), "English");
        assert_eq!(script.dialogues[0].role, "Alice");
        let resolved = script.resolved_speakers();
        assert_eq!(
            resolved["Alice"].ref_audio.as_deref(),
            Some(dir.path().join("alice.wav").as_path())
        );
    }

    #[test]
    fn json_full_missing_dialogues_is_named() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "play.json", r#"{"speakers": {}}"#);
        assert!(matches!(
            load_script(&path),
            Err(Error::MissingSection { name: "dialogues" })
        ));
    }

    #[test]
    fn bracketed_skips_non_matching_lines() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "play.txt",
            "[Alice] Hello there\n\nstage direction, ignored\n[Bob] General greeting\n",
        );
        let script = load_script(&path).unwrap();
        let roles: Vec<_> = script.dialogues.iter().map(|d| d.role.as_str()).collect();
        assert_eq!(roles, ["Alice", "Bob"]);
        assert_eq!(script.dialogues[0].text, "Hello there");
    }

    #[test]
    fn paired_line_carries_config_into_speakers() {
        let dir = TempDir::new().unwrap();
        let path = write_script(
            &dir,
            "play.txt",
            concat!(
                "{\"name\": \"Alice\", \"ref_audio\": \"alice.wav\", \"language\": \"English\"}\n",
                "Nice weather today.\n",
                "{\"name\": \"Bob\"}\n",
                "Indeed it is.\n",
                "{not json, skipped}\n",
                "{\"name\": \"Carol\"}\n",
            ),
        );
        let script = load_script(&path).unwrap();
        // Carol's config has no following text line and is dropped.
        let roles: Vec<_> = script.dialogues.iter().map(|d| d.role.as_str()).collect();
        assert_eq!(roles, ["Alice", "Bob"]);
        assert_eq!(
            script.speakers["Alice"].ref_audio.as_deref(),
            Some(Path::new("alice.wav"))
        );
        assert_eq!(script.dialogues[0].language.as_deref(), Some("English"));
    }

    #[test]
    fn paired_line_defaults_missing_name() {
        let dir = TempDir::new().unwrap();
        let path = write_script(&dir, "play.txt", "{}\nAnonymous line.\n");
        let script = load_script(&path).unwrap();
        assert_eq!(script.dialogues[0].role, "Unknown");
    }

    #[test]
    fn unreadable_file_is_io_error() {
        assert!(matches!(
            load_script("does/not/exist.json"),
            Err(Error::Io { .. })
        ));
    }
}
