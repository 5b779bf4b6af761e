//! Cross-lane brushing: one active criterion highlights matching records in
//! every lane at once.

use std::hash::{DefaultHasher, Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::classify::{SemanticTags, is_doc_path};
use crate::model::{InteractionRecord, Role};

/// Matches any tool.
pub const TOOL_WILDCARD: &str = "*";
/// Matches any documentation file.
pub const DOC_WILDCARD: &str = "*.md";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrushKind {
    Model,
    Status,
    Tool,
    File,
}

impl BrushKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::Status => "status",
            Self::Tool => "tool",
            Self::File => "file",
        }
    }
}

/// The single board-wide cross-filter. Replaced or cleared, never merged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveBrush {
    #[serde(rename = "type")]
    pub kind: BrushKind,
    pub value: String,
}

impl ActiveBrush {
    pub fn new(kind: BrushKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn errors() -> Self {
        Self::new(BrushKind::Status, "error")
    }

    pub fn any_tool() -> Self {
        Self::new(BrushKind::Tool, TOOL_WILDCARD)
    }
}

impl std::fmt::Display for ActiveBrush {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.kind.label(), self.value)
    }
}

/// Stable per-process fingerprint of a brush, `0` for none. Used in cache
/// keys.
pub fn brush_signature(brush: Option<&ActiveBrush>) -> u64 {
    let Some(brush) = brush else {
        return 0;
    };
    let mut hasher = DefaultHasher::new();
    brush.hash(&mut hasher);
    // Keep 0 reserved for "no brush".
    hasher.finish().max(1)
}

/// Record fields the matcher reads besides the tags.
#[derive(Debug, Clone, Copy)]
pub struct Ambient<'a> {
    pub role: Role,
    pub model: Option<&'a str>,
    pub tool_name: Option<&'a str>,
}

impl<'a> Ambient<'a> {
    pub fn of(record: &'a InteractionRecord) -> Self {
        Self {
            role: record.role,
            model: record.model.as_deref(),
            tool_name: record.tool_name(),
        }
    }
}

/// Whether a record matches the brush. No brush matches everything.
pub fn matches(brush: Option<&ActiveBrush>, tags: &SemanticTags, ambient: Ambient<'_>) -> bool {
    let Some(brush) = brush else {
        return true;
    };
    let value = brush.value.as_str();
    match brush.kind {
        BrushKind::Model => ambient.model == Some(value),
        BrushKind::Status => match value {
            "error" => tags.any_error(),
            "cancelled" => tags.is_cancelled,
            "commit" => tags.is_commit,
            "mcp" => tags.is_mcp,
            _ => false,
        },
        BrushKind::Tool => ambient.tool_name.is_some_and(|name| {
            value == TOOL_WILDCARD || name == value || tags.variant.label() == value
        }),
        BrushKind::File => edited_path(tags)
            .is_some_and(|path| path == value || (value == DOC_WILDCARD && is_doc_path(path))),
    }
}

fn edited_path(tags: &SemanticTags) -> Option<&str> {
    tags.edited_file
        .as_deref()
        .or(tags.edited_doc_file.as_deref())
}

/// The value a record offers for a brush dimension, e.g. when it is hovered
/// while a brush of that kind is active.
pub fn candidate_value(
    kind: BrushKind,
    record: &InteractionRecord,
    tags: &SemanticTags,
) -> Option<String> {
    match kind {
        BrushKind::Model => record.model.clone(),
        BrushKind::Status => {
            if tags.any_error() {
                Some("error".into())
            } else if tags.is_cancelled {
                Some("cancelled".into())
            } else if tags.is_commit {
                Some("commit".into())
            } else if tags.is_mcp {
                Some("mcp".into())
            } else {
                None
            }
        }
        BrushKind::Tool => record.tool_name().map(str::to_string),
        BrushKind::File => edited_path(tags).map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use serde_json::json;

    fn check(brush: Option<&ActiveBrush>, record: &InteractionRecord) -> bool {
        let tags = classify(record, &[], &[]);
        matches(brush, &tags, Ambient::of(record))
    }

    #[test]
    fn no_brush_matches_everything() {
        let records = [
            InteractionRecord::new("a", Role::Unknown),
            InteractionRecord::new("b", Role::User).with_text("hello"),
            InteractionRecord::new("c", Role::Assistant).with_tool("Bash", json!({})),
        ];
        for r in &records {
            assert!(check(None, r));
        }
    }

    #[test]
    fn model_brush() {
        let brush = ActiveBrush::new(BrushKind::Model, "claude-sonnet-4");
        let r = InteractionRecord::new("a", Role::Assistant).with_model("claude-sonnet-4");
        assert!(check(Some(&brush), &r));
        let other = InteractionRecord::new("b", Role::Assistant).with_model("gpt-5");
        assert!(!check(Some(&brush), &other));
        assert!(!check(Some(&brush), &InteractionRecord::new("c", Role::User)));
    }

    #[test]
    fn status_error_covers_raw_errors() {
        let brush = ActiveBrush::errors();
        let raw = InteractionRecord::new("a", Role::Assistant).with_text("fatal: not a git repository");
        assert!(check(Some(&brush), &raw));
        let clean = InteractionRecord::new("b", Role::Assistant).with_text("all good");
        assert!(!check(Some(&brush), &clean));
        let unknown = ActiveBrush::new(BrushKind::Status, "sparkly");
        assert!(!check(Some(&unknown), &raw));
    }

    #[test]
    fn tool_brush_wildcard_name_and_variant() {
        let r = InteractionRecord::new("a", Role::Assistant)
            .with_tool("run_command", json!({ "command": "git commit -m 'fix bug'" }));
        assert!(check(Some(&ActiveBrush::any_tool()), &r));
        assert!(check(Some(&ActiveBrush::new(BrushKind::Tool, "run_command")), &r));
        assert!(check(Some(&ActiveBrush::new(BrushKind::Tool, "terminal")), &r));
        assert!(!check(Some(&ActiveBrush::new(BrushKind::Tool, "Read")), &r));

        let text_only = InteractionRecord::new("b", Role::Assistant).with_text("no tools here");
        assert!(!check(Some(&ActiveBrush::any_tool()), &text_only));
    }

    #[test]
    fn file_brush_exact_and_doc_wildcard() {
        let r = InteractionRecord::new("a", Role::Assistant)
            .with_tool("Edit", json!({ "file_path": "docs/guide.md" }));
        assert!(check(Some(&ActiveBrush::new(BrushKind::File, "docs/guide.md")), &r));
        assert!(check(Some(&ActiveBrush::new(BrushKind::File, DOC_WILDCARD)), &r));
        let code = InteractionRecord::new("b", Role::Assistant)
            .with_tool("Edit", json!({ "file_path": "src/main.rs" }));
        assert!(!check(Some(&ActiveBrush::new(BrushKind::File, DOC_WILDCARD)), &code));
    }

    #[test]
    fn matching_is_order_independent() {
        let brush = ActiveBrush::errors();
        let a = InteractionRecord::new("a", Role::System).with_text("error: quota");
        let b = InteractionRecord::new("b", Role::User).with_text("fine");
        let first = [check(Some(&brush), &a), check(Some(&brush), &b)];
        let second = [check(Some(&brush), &b), check(Some(&brush), &a)];
        assert_eq!(first, [second[1], second[0]]);
        assert_eq!(check(Some(&brush), &a), check(Some(&brush), &a));
    }

    #[test]
    fn signatures() {
        assert_eq!(brush_signature(None), 0);
        let a = ActiveBrush::errors();
        assert_eq!(brush_signature(Some(&a)), brush_signature(Some(&a.clone())));
        assert_ne!(brush_signature(Some(&a)), brush_signature(Some(&ActiveBrush::any_tool())));
        assert_ne!(brush_signature(Some(&a)), 0);
    }

    #[test]
    fn candidates_follow_brush_kind() {
        let r = InteractionRecord::new("a", Role::Assistant)
            .with_model("m1")
            .with_tool("Write", json!({ "file_path": "NOTES.md" }));
        let tags = classify(&r, &[], &[]);
        assert_eq!(candidate_value(BrushKind::Model, &r, &tags).as_deref(), Some("m1"));
        assert_eq!(candidate_value(BrushKind::Tool, &r, &tags).as_deref(), Some("Write"));
        assert_eq!(candidate_value(BrushKind::File, &r, &tags).as_deref(), Some("NOTES.md"));
        assert_eq!(candidate_value(BrushKind::Status, &r, &tags), None);
    }

    #[test]
    fn wire_shape_uses_type_key() {
        let json = serde_json::to_value(ActiveBrush::any_tool()).unwrap_or_default();
        assert_eq!(json, json!({ "type": "tool", "value": "*" }));
    }
}
