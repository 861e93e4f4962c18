//! Script format classification.
//!
//! The loader never branches on loosely-typed data mid-parse: the
//! format is decided up front, from the file extension plus the first
//! non-blank line, and each variant has its own parse function.

use std::path::Path;

use crate::error::{Error, Result};

/// Closed set of supported script layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptFormat {
    /// `.json` holding an array of `{role|speaker, text}` records.
    JsonList,
    /// `.json` holding `{metadata, speakers, dialogues}`.
    JsonFull,
    /// `.txt` with `[role] text` per line.
    BracketedText,
    /// `.txt` alternating a JSON config line and a text line.
    PairedLine,
}

impl ScriptFormat {
    /// Classify a script file from its extension and first non-blank
    /// line. Pure: no I/O beyond what the caller already did.
    pub fn classify(path: &Path, first_non_blank: &str) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match ext.as_deref() {
            Some("json") => {
                if first_non_blank.starts_with('[') {
                    Ok(Self::JsonList)
                } else {
                    Ok(Self::JsonFull)
                }
            }
            Some("txt") => {
                if first_non_blank.starts_with('[') {
                    Ok(Self::BracketedText)
                } else if first_non_blank.starts_with('{') {
                    Ok(Self::PairedLine)
                } else {
                    Err(Error::UnknownTextLayout {
                        path: path.to_path_buf(),
                    })
                }
            }
            _ => Err(Error::UnsupportedExtension {
                path: path.to_path_buf(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_sniffs_list_vs_full() {
        let p = Path::new("play.json");
        assert_eq!(
            ScriptFormat::classify(p, "[{\"role\": \"A\"}]").unwrap(),
            ScriptFormat::JsonList
        );
        assert_eq!(
            ScriptFormat::classify(p, "{\"metadata\": {}}").unwrap(),
            ScriptFormat::JsonFull
        );
    }

    #[test]
    fn txt_sniffs_bracket_vs_paired() {
        let p = Path::new("play.txt");
        assert_eq!(
            ScriptFormat::classify(p, "[Alice] Hello").unwrap(),
            ScriptFormat::BracketedText
        );
        assert_eq!(
            ScriptFormat::classify(p, "{\"name\": \"Alice\"}").unwrap(),
            ScriptFormat::PairedLine
        );
        assert!(matches!(
            ScriptFormat::classify(p, "Alice: Hello"),
            Err(Error::UnknownTextLayout { .. })
        ));
    }

    #[test]
    fn unsupported_extension_rejected() {
        assert!(matches!(
            ScriptFormat::classify(Path::new("play.yaml"), "{}"),
            Err(Error::UnsupportedExtension { .. })
        ));
    }

    #[test]
    fn extension_case_insensitive() {
        assert_eq!(
            ScriptFormat::classify(Path::new("PLAY.JSON"), "[]").unwrap(),
            ScriptFormat::JsonList
        );
    }
}
