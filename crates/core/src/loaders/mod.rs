//! Turn transcript files into [`LaneData`] snapshots for the board.

pub mod claude;
pub mod native;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

use crate::model::LaneData;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("session `{0}` contains no interaction records")]
    Empty(String),
    #[error("session `{session}` repeats record uuid `{uuid}`")]
    DuplicateUuid { session: String, uuid: String },
}

/// A parsed session plus how many input lines had to be dropped.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub data: LaneData,
    pub skipped_lines: usize,
}

/// Detect the format and parse it.
///
/// A single JSON object with `session` and `records` keys is the board's own
/// shape; anything else is read as a Claude Code JSONL transcript.
pub fn load_auto(data: &[u8], session_id: &str) -> Result<Loaded, LoadError> {
    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(data) {
        let native_shape = value
            .as_object()
            .is_some_and(|o| o.contains_key("session") && o.contains_key("records"));
        if native_shape {
            return Ok(Loaded {
                data: native::lane_from_value(value)?,
                skipped_lines: 0,
            });
        }
    }
    let text = std::str::from_utf8(data)?;
    claude::parse_claude_jsonl(text, session_id)
}

/// Read one file. The file stem becomes the session id for transcripts.
pub fn load_path(path: &Path) -> Result<Loaded, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let session_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session");
    let loaded = if path.extension().is_some_and(|e| e == "json") {
        Loaded {
            data: native::parse_lane_json(&bytes)?,
            skipped_lines: 0,
        }
    } else {
        load_auto(&bytes, session_id)?
    };
    if loaded.skipped_lines > 0 {
        warn!(
            path = %path.display(),
            skipped = loaded.skipped_lines,
            "skipped malformed transcript lines"
        );
    }
    info!(
        path = %path.display(),
        records = loaded.data.records.len(),
        "session loaded"
    );
    Ok(loaded)
}

/// Load every path, keeping the ones that succeed. Failures are returned
/// alongside so the caller can report them.
pub fn load_paths(paths: &[PathBuf]) -> (Vec<LaneData>, Vec<(PathBuf, LoadError)>) {
    let mut lanes = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();
    for path in paths {
        match load_path(path) {
            Ok(loaded) => lanes.push(loaded.data),
            Err(err) => failures.push((path.clone(), err)),
        }
    }
    (lanes, failures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_native_shape() {
        let json = br#"{"session":{"id":"n1","title":"Native"},"records":[{"uuid":"a","role":"user","textContent":"hi"}]}"#;
        let loaded = load_auto(json, "ignored").unwrap();
        assert_eq!(loaded.data.id().as_str(), "n1");
        assert_eq!(loaded.data.records.len(), 1);
    }

    #[test]
    fn falls_back_to_transcript() {
        let line = br#"{"type":"user","uuid":"u1","timestamp":"2025-01-01T00:00:00Z","message":{"role":"user","content":"hello"}}"#;
        let loaded = load_auto(line, "t1").unwrap();
        assert_eq!(loaded.data.id().as_str(), "t1");
        assert_eq!(loaded.data.records[0].text(), "hello");
    }

    #[test]
    fn binary_input_is_rejected() {
        assert!(matches!(
            load_auto(&[0xff, 0xfe, 0x00], "x"),
            Err(LoadError::Utf8(_))
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_path(Path::new("/definitely/not/here.jsonl")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.jsonl"));
    }
}
