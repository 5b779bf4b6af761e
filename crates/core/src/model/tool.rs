use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::record::ToolInvocation;

/// Normalized tool family, keyed off the raw tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Shell,
    FileEdit,
    FileRead,
    Search,
    Web,
    Task,
    Mcp,
    Unknown,
}

impl ToolKind {
    /// Keyword cascade on the lower-cased name; first match wins.
    ///
    /// Task comes before edit so `TodoWrite` is not treated as a file write,
    /// and edit before search so `search_replace` is.
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if name == "mcp" || name.starts_with("mcp__") {
            Self::Mcp
        } else if has(&["web", "fetch", "browser", "url"]) {
            Self::Web
        } else if has(&["bash", "shell", "command", "terminal", "exec"]) {
            Self::Shell
        } else if has(&["task", "agent", "todo"]) {
            Self::Task
        } else if has(&["write", "edit", "replace", "patch"]) {
            Self::FileEdit
        } else if has(&["grep", "glob", "search", "find"]) {
            Self::Search
        } else if has(&["read", "view", "open", "list", "ls"]) {
            Self::FileRead
        } else {
            Self::Unknown
        }
    }
}

/// A tool invocation's arguments, resolved once into a typed shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolInput {
    Shell {
        command: String,
    },
    FileEdit {
        path: Option<String>,
    },
    FileRead {
        path: Option<String>,
    },
    Search {
        pattern: Option<String>,
    },
    Web {
        target: Option<String>,
    },
    Task {
        description: Option<String>,
    },
    Mcp {
        server: Option<String>,
        tool: String,
    },
    Unknown {
        name: String,
        payload: Value,
    },
}

const PATH_KEYS: &[&str] = &[
    "file_path",
    "filePath",
    "path",
    "notebook_path",
    "target_file",
];
const COMMAND_KEYS: &[&str] = &["command", "cmd", "script"];
const PATTERN_KEYS: &[&str] = &["pattern", "query", "regex", "glob"];
const WEB_KEYS: &[&str] = &["url", "query"];
const TASK_KEYS: &[&str] = &["description", "prompt", "subject"];

impl ToolInput {
    pub fn resolve(invocation: &ToolInvocation) -> Self {
        let input = &invocation.input;
        match ToolKind::from_name(&invocation.name) {
            ToolKind::Shell => Self::Shell {
                command: command_text(input).unwrap_or_default(),
            },
            ToolKind::FileEdit => Self::FileEdit {
                path: first_str(input, PATH_KEYS).or_else(|| patch_target(input)),
            },
            ToolKind::FileRead => Self::FileRead {
                path: first_str(input, PATH_KEYS),
            },
            ToolKind::Search => Self::Search {
                pattern: first_str(input, PATTERN_KEYS),
            },
            ToolKind::Web => Self::Web {
                target: first_str(input, WEB_KEYS),
            },
            ToolKind::Task => Self::Task {
                description: first_str(input, TASK_KEYS),
            },
            ToolKind::Mcp => {
                let mut parts = invocation
                    .name
                    .strip_prefix("mcp__")
                    .unwrap_or(&invocation.name)
                    .splitn(2, "__");
                let first = parts.next().unwrap_or_default().to_string();
                match parts.next() {
                    Some(tool) => Self::Mcp {
                        server: Some(first),
                        tool: tool.to_string(),
                    },
                    None => Self::Mcp {
                        server: None,
                        tool: first,
                    },
                }
            }
            ToolKind::Unknown => Self::Unknown {
                name: invocation.name.clone(),
                payload: input.clone(),
            },
        }
    }

    pub fn kind(&self) -> ToolKind {
        match self {
            Self::Shell { .. } => ToolKind::Shell,
            Self::FileEdit { .. } => ToolKind::FileEdit,
            Self::FileRead { .. } => ToolKind::FileRead,
            Self::Search { .. } => ToolKind::Search,
            Self::Web { .. } => ToolKind::Web,
            Self::Task { .. } => ToolKind::Task,
            Self::Mcp { .. } => ToolKind::Mcp,
            Self::Unknown { .. } => ToolKind::Unknown,
        }
    }

    /// Target file of an edit or read.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::FileEdit { path } | Self::FileRead { path } => path.as_deref(),
            _ => None,
        }
    }

    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Shell { command } => Some(command.as_str()),
            _ => None,
        }
    }

    /// The most telling argument, for one-line summaries.
    pub fn headline(&self) -> Option<&str> {
        match self {
            Self::Shell { command } => Some(command.as_str()).filter(|c| !c.is_empty()),
            Self::FileEdit { path } | Self::FileRead { path } => path.as_deref(),
            Self::Search { pattern } => pattern.as_deref(),
            Self::Web { target } => target.as_deref(),
            Self::Task { description } => description.as_deref(),
            Self::Mcp { tool, .. } => Some(tool.as_str()),
            Self::Unknown { .. } => None,
        }
    }
}

fn first_str(input: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| input.get(*k).and_then(Value::as_str))
        .map(str::to_string)
}

/// Shell commands arrive either as a string or as an argv array.
fn command_text(input: &Value) -> Option<String> {
    for key in COMMAND_KEYS {
        match input.get(*key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Array(argv)) => {
                let words: Vec<&str> = argv.iter().filter_map(Value::as_str).collect();
                return Some(words.join(" "));
            }
            _ => {}
        }
    }
    input.as_str().map(str::to_string)
}

/// `apply_patch`-style tools carry the target inside the patch body.
fn patch_target(input: &Value) -> Option<String> {
    let body = input
        .get("patch")
        .or_else(|| input.get("input"))
        .and_then(Value::as_str)
        .or_else(|| input.as_str())?;
    body.lines().find_map(|line| {
        ["*** Update File: ", "*** Add File: ", "+++ b/"]
            .iter()
            .find_map(|prefix| line.strip_prefix(prefix))
            .map(|p| p.trim().to_string())
    })
}
