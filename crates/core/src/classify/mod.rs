//! Semantic classification of interaction records.
//!
//! [`classify`] is pure and total: any record, however malformed, yields a
//! fully populated [`SemanticTags`] whose unknown flags are `false`.

mod cache;

pub use cache::{CacheStats, ClassificationCache};

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::{CommitEvent, InteractionRecord, Role, ToolInput, ToolKind};

/// Stop reasons that mean the turn was cancelled.
pub const CANCEL_STOP_REASONS: &[&str] = &["cancelled", "user_cancelled"];
/// Injected into the transcript when the user interrupts a turn.
pub const CANCEL_PHRASE: &str = "[Request interrupted by user";
pub const DOC_EXTENSION: &str = ".md";
/// Tool name used by hosts that report all MCP calls under one name.
pub const MCP_TOOL_NAME: &str = "mcp";
/// A commit and its corroborating evidence must lie this close in time.
pub const COMMIT_WINDOW_MS: i64 = 120_000;

const MCP_TEXT_MARKERS: &[&str] = &["mcp__", "<mcp"];
const RAW_ERROR_MARKERS: &[&str] = &[
    "Traceback (most recent call last)",
    "panicked at",
    "command not found",
    "fatal: ",
    "ENOENT",
    "error[",
];

static URL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).ok());
static GIT_COMMIT_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\bgit(?:\s+-[A-Za-z]\s+\S+)*\s+commit\b").ok());
static DOC_MENTION_RE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:created?|creating|updated?|updating|wrote|writing|modified|edited|editing)\b[^\n]*?([\w./-]+\.md)\b",
    )
    .ok()
});
static ERROR_LINE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:Error|ERROR):\s").ok());

fn re_matches(re: &LazyLock<Option<Regex>>, text: &str) -> bool {
    re.as_ref().is_some_and(|re| re.is_match(text))
}

/// Coarse category used for color, iconography, and the tool brush.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolVariant {
    Code,
    File,
    Search,
    Task,
    Terminal,
    Git,
    Web,
    Document,
    #[default]
    Neutral,
}

impl ToolVariant {
    /// Keyword cascade on the lower-cased tool name; first match wins.
    pub fn from_tool(name: &str, path: Option<&str>) -> Self {
        let name = name.to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(&["git"]) {
            Self::Git
        } else if has(&["web", "fetch", "browser", "url"]) {
            Self::Web
        } else if has(&["bash", "shell", "command", "terminal", "exec"]) {
            Self::Terminal
        } else if has(&["grep", "glob", "search", "find"]) {
            Self::Search
        } else if has(&["task", "agent", "todo"]) {
            Self::Task
        } else if has(&["edit", "write", "replace", "patch"]) {
            if path.is_some_and(is_doc_path) {
                Self::Document
            } else {
                Self::Code
            }
        } else if has(&["notebook", "doc"]) {
            Self::Document
        } else if has(&["read", "view", "ls", "list", "file"]) {
            Self::File
        } else {
            Self::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::File => "file",
            Self::Search => "search",
            Self::Task => "task",
            Self::Terminal => "terminal",
            Self::Git => "git",
            Self::Web => "web",
            Self::Document => "document",
            Self::Neutral => "neutral",
        }
    }
}

/// Derived classification of one record. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticTags {
    pub variant: ToolVariant,
    pub is_error: bool,
    pub is_cancelled: bool,
    pub is_commit: bool,
    /// A commit backed by a nearby git event or a successful tool result.
    pub commit_verified: bool,
    pub is_shell: bool,
    pub shell_command: Option<String>,
    pub is_file_edit: bool,
    pub edited_file: Option<String>,
    pub edited_doc_file: Option<String>,
    pub has_links: bool,
    pub is_mcp: bool,
    pub is_raw_error: bool,
    /// The record's tool arguments, resolved once.
    pub tool: Option<ToolInput>,
}

impl SemanticTags {
    /// Variant used for the card icon. A commit shows as git even though its
    /// tool is a terminal.
    pub fn icon_variant(&self) -> ToolVariant {
        if self.is_commit {
            ToolVariant::Git
        } else {
            self.variant
        }
    }

    pub fn any_error(&self) -> bool {
        self.is_error || self.is_raw_error
    }
}

pub fn is_doc_path(path: &str) -> bool {
    path.to_ascii_lowercase().ends_with(DOC_EXTENSION)
}

/// Classify one record.
///
/// `siblings` is the full record list of the record's session and
/// `commits` any git commits observed for it; both are only consulted to
/// corroborate commits.
pub fn classify(
    record: &InteractionRecord,
    siblings: &[InteractionRecord],
    commits: &[CommitEvent],
) -> SemanticTags {
    let text = record.text();
    let tool = record.tool_invocation.as_ref().map(ToolInput::resolve);
    let kind = tool.as_ref().map(ToolInput::kind);
    let tool_path = tool.as_ref().and_then(ToolInput::path);

    let variant = record
        .tool_invocation
        .as_ref()
        .map(|inv| ToolVariant::from_tool(&inv.name, tool_path))
        .unwrap_or_default();

    let shell_command = tool
        .as_ref()
        .and_then(ToolInput::command)
        .map(str::to_string);
    let is_commit = kind == Some(ToolKind::Shell)
        && shell_command
            .as_deref()
            .is_some_and(|c| re_matches(&GIT_COMMIT_RE, c));
    let is_shell = variant == ToolVariant::Terminal && !is_commit;

    let is_file_edit = kind == Some(ToolKind::FileEdit);
    let edited_file = if is_file_edit {
        tool_path.map(str::to_string)
    } else {
        None
    };
    let edited_doc_file = match (&edited_file, tool_path) {
        (Some(path), _) if is_doc_path(path) => Some(path.clone()),
        (None, None) if record.role == Role::Assistant => doc_mention(text),
        _ => None,
    };

    let is_mcp = kind == Some(ToolKind::Mcp)
        || record.tool_name() == Some(MCP_TOOL_NAME)
        || MCP_TEXT_MARKERS.iter().any(|m| text.contains(m));

    let commit_verified = is_commit && corroborate_commit(record, siblings, commits);

    SemanticTags {
        variant,
        is_error: is_structured_error(record),
        is_cancelled: is_cancelled(record),
        is_commit,
        commit_verified,
        is_shell,
        shell_command,
        is_file_edit,
        edited_file,
        edited_doc_file,
        has_links: re_matches(&URL_RE, text),
        is_mcp,
        is_raw_error: is_raw_error(text),
        tool,
    }
}

fn is_structured_error(record: &InteractionRecord) -> bool {
    if record.role == Role::System && record.text().to_ascii_lowercase().contains("error") {
        return true;
    }
    record.tool_result.as_ref().is_some_and(|result| {
        result.is_error == Some(true)
            || result
                .stderr
                .as_deref()
                .is_some_and(|s| !s.trim().is_empty())
    })
}

fn is_cancelled(record: &InteractionRecord) -> bool {
    record
        .stop_reason
        .as_deref()
        .is_some_and(|r| CANCEL_STOP_REASONS.contains(&r))
        || record.text().contains(CANCEL_PHRASE)
}

fn is_raw_error(text: &str) -> bool {
    RAW_ERROR_MARKERS.iter().any(|m| text.contains(m)) || re_matches(&ERROR_LINE_RE, text)
}

fn doc_mention(text: &str) -> Option<String> {
    DOC_MENTION_RE
        .as_ref()?
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

fn corroborate_commit(
    record: &InteractionRecord,
    siblings: &[InteractionRecord],
    commits: &[CommitEvent],
) -> bool {
    let Some(at) = record.timestamp_ms else {
        return false;
    };
    let near = |t: i64| (t - at).abs() <= COMMIT_WINDOW_MS;

    if commits.iter().any(|c| near(c.timestamp_ms)) {
        return true;
    }
    siblings.iter().any(|s| {
        s.parent_uuid.as_ref() == Some(&record.uuid)
            && s.timestamp_ms.is_some_and(near)
            && s
                .tool_result
                .as_ref()
                .is_some_and(|r| r.is_error != Some(true) && r.exit_code.unwrap_or(0) == 0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;
    use serde_json::json;

    fn assistant(uuid: &str) -> InteractionRecord {
        InteractionRecord::new(uuid, Role::Assistant).with_timestamp(1_000_000)
    }

    #[test]
    fn git_commit_is_commit_not_shell() {
        let r = assistant("r217")
            .with_tool("run_command", json!({ "command": "git commit -m 'fix bug'" }));
        let tags = classify(&r, &[], &[]);
        assert!(tags.is_commit);
        assert!(!tags.is_shell);
        assert_eq!(tags.variant, ToolVariant::Terminal);
        assert_eq!(tags.icon_variant(), ToolVariant::Git);
        assert_eq!(tags.shell_command.as_deref(), Some("git commit -m 'fix bug'"));
    }

    #[test]
    fn plain_shell_command() {
        let r = assistant("a").with_tool("Bash", json!({ "command": "cargo test" }));
        let tags = classify(&r, &[], &[]);
        assert!(tags.is_shell);
        assert!(!tags.is_commit);
    }

    #[test]
    fn git_with_dash_c_still_commits() {
        let r = assistant("a").with_tool("Bash", json!({ "command": "git -C repo commit -am x" }));
        assert!(classify(&r, &[], &[]).is_commit);
        let r = assistant("b").with_tool("Bash", json!({ "command": "git commitment" }));
        assert!(!classify(&r, &[], &[]).is_commit);
    }

    #[test]
    fn commit_corroborated_by_event_or_result() {
        let r = assistant("c").with_tool("Bash", json!({ "command": "git commit -m x" }));
        assert!(!classify(&r, &[], &[]).commit_verified);

        let event = CommitEvent {
            sha: "abc123".into(),
            timestamp_ms: 1_050_000,
            message: None,
        };
        assert!(classify(&r, &[], &[event]).commit_verified);

        let result = InteractionRecord::new("d", Role::User)
            .with_parent("c")
            .with_timestamp(1_002_000)
            .with_result(ToolResult::default());
        assert!(classify(&r, &[r.clone(), result], &[]).commit_verified);

        let far = CommitEvent {
            sha: "def456".into(),
            timestamp_ms: 9_000_000,
            message: None,
        };
        assert!(!classify(&r, &[], &[far]).commit_verified);
    }

    #[test]
    fn errors_from_every_source() {
        let system = InteractionRecord::new("s", Role::System).with_text("API Error: overloaded");
        assert!(classify(&system, &[], &[]).is_error);

        let flagged = InteractionRecord::new("f", Role::User).with_result(ToolResult {
            is_error: Some(true),
            ..ToolResult::default()
        });
        assert!(classify(&flagged, &[], &[]).is_error);

        let stderr = InteractionRecord::new("e", Role::User).with_result(ToolResult {
            stderr: Some("boom".into()),
            ..ToolResult::default()
        });
        assert!(classify(&stderr, &[], &[]).is_error);

        let blank = InteractionRecord::new("b", Role::User).with_result(ToolResult {
            stderr: Some("  ".into()),
            ..ToolResult::default()
        });
        assert!(!classify(&blank, &[], &[]).is_error);

        let user_says_error = InteractionRecord::new("u", Role::User).with_text("an error?");
        assert!(!classify(&user_says_error, &[], &[]).is_error);
    }

    #[test]
    fn raw_error_markers() {
        let r = assistant("a").with_text("thread 'main' panicked at src/main.rs:3:5");
        let tags = classify(&r, &[], &[]);
        assert!(tags.is_raw_error);
        assert!(!tags.is_error);
        assert!(tags.any_error());
        let r = assistant("b").with_text("ok\nError: file missing");
        assert!(classify(&r, &[], &[]).is_raw_error);
    }

    #[test]
    fn cancellation() {
        let r = assistant("a").with_stop_reason("user_cancelled");
        assert!(classify(&r, &[], &[]).is_cancelled);
        let r = InteractionRecord::new("b", Role::User).with_text("[Request interrupted by user]");
        assert!(classify(&r, &[], &[]).is_cancelled);
        let r = assistant("c").with_stop_reason("end_turn");
        assert!(!classify(&r, &[], &[]).is_cancelled);
    }

    #[test]
    fn file_edit_and_doc_file() {
        let r = assistant("a").with_tool("Edit", json!({ "file_path": "docs/README.md" }));
        let tags = classify(&r, &[], &[]);
        assert!(tags.is_file_edit);
        assert_eq!(tags.edited_file.as_deref(), Some("docs/README.md"));
        assert_eq!(tags.edited_doc_file.as_deref(), Some("docs/README.md"));
        assert_eq!(tags.variant, ToolVariant::Document);

        let r = assistant("b").with_tool("Write", json!({ "file_path": "src/lib.rs" }));
        let tags = classify(&r, &[], &[]);
        assert!(tags.is_file_edit);
        assert!(tags.edited_doc_file.is_none());
        assert_eq!(tags.variant, ToolVariant::Code);
    }

    #[test]
    fn todo_write_is_not_a_file_edit() {
        let r = assistant("a").with_tool("TodoWrite", json!({ "todos": [] }));
        let tags = classify(&r, &[], &[]);
        assert!(!tags.is_file_edit);
        assert_eq!(tags.variant, ToolVariant::Task);
    }

    #[test]
    fn doc_file_from_assistant_text() {
        let r = assistant("a").with_text("I've updated the notes in CHANGELOG.md for you.");
        assert_eq!(
            classify(&r, &[], &[]).edited_doc_file.as_deref(),
            Some("CHANGELOG.md")
        );
        let user = InteractionRecord::new("u", Role::User).with_text("updated README.md");
        assert!(classify(&user, &[], &[]).edited_doc_file.is_none());
    }

    #[test]
    fn links_and_mcp() {
        let r = assistant("a").with_text("see https://example.com/docs");
        assert!(classify(&r, &[], &[]).has_links);
        let r = assistant("b").with_tool("mcp__github__create_issue", json!({}));
        assert!(classify(&r, &[], &[]).is_mcp);
        let r = assistant("c").with_tool("mcp", json!({}));
        assert!(classify(&r, &[], &[]).is_mcp);
        let r = assistant("d").with_text("calling mcp__linear__search");
        assert!(classify(&r, &[], &[]).is_mcp);
    }

    #[test]
    fn variants_by_keyword() {
        let cases = [
            ("WebFetch", ToolVariant::Web),
            ("Grep", ToolVariant::Search),
            ("Task", ToolVariant::Task),
            ("Read", ToolVariant::File),
            ("git_status", ToolVariant::Git),
            ("NotebookRead", ToolVariant::Document),
            ("frobnicate", ToolVariant::Neutral),
        ];
        for (name, expected) in cases {
            assert_eq!(ToolVariant::from_tool(name, None), expected, "{name}");
        }
    }

    #[test]
    fn malformed_records_get_safe_defaults() {
        let bare = InteractionRecord::new("x", Role::Unknown);
        assert_eq!(classify(&bare, &[], &[]), SemanticTags::default());

        let nulls = InteractionRecord::new("y", Role::Unknown).with_tool("", serde_json::Value::Null);
        let tags = classify(&nulls, &[], &[]);
        assert_eq!(tags.variant, ToolVariant::Neutral);
        assert!(!tags.is_error && !tags.is_commit && !tags.is_shell && !tags.is_file_edit);
    }
}
