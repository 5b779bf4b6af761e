//! Claude Code JSONL transcripts.
//!
//! Each line is a JSON object with a top-level `type`. `user` and
//! `assistant` lines carry an API message whose `content` is a string or a
//! list of blocks; every `text`, `tool_use` and `tool_result` block becomes
//! its own record. `system` and `summary` lines become one record each.
//! Other line types (snapshots, progress) are ignored.

use std::collections::{HashMap, HashSet};

use chrono::DateTime;
use lanewise_protocol::SharedStr;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::{InteractionRecord, LaneData, Role, Session, ToolResult, Usage};

use super::{LoadError, Loaded};

const TITLE_CHARS: usize = 60;
const SIDECHAIN_AGENT: &str = "sidechain";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLine {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    uuid: Option<String>,
    #[serde(default)]
    parent_uuid: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    is_sidechain: bool,
    #[serde(default)]
    agent_id: Option<String>,
    #[serde(default)]
    message: Option<RawMessage>,
    /// System lines put their text here.
    #[serde(default)]
    content: Option<Value>,
    #[serde(default)]
    subtype: Option<String>,
    #[serde(default)]
    duration_ms: Option<u64>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    tool_use_result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Option<RawContent>,
    #[serde(default)]
    usage: Option<RawUsage>,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawContent {
    Text(String),
    Blocks(Vec<RawBlock>),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlock {
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        content: Option<Value>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
    #[serde(default)]
    cache_read_input_tokens: u64,
}

impl From<RawUsage> for Usage {
    fn from(raw: RawUsage) -> Self {
        Self {
            input_tokens: raw.input_tokens,
            output_tokens: raw.output_tokens,
            cache_read_tokens: raw.cache_read_input_tokens,
        }
    }
}

fn parse_timestamp(s: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|t| t.timestamp_millis())
}

/// Flatten tool result content: a string, or a list of `{type: text}`
/// blocks.
fn content_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn stderr_of(tool_use_result: Option<&Value>) -> Option<String> {
    tool_use_result?
        .get("stderr")?
        .as_str()
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

#[derive(Default)]
struct Builder {
    session_id: String,
    records: Vec<InteractionRecord>,
    /// tool_use id -> record carrying the invocation
    tool_owner: HashMap<String, SharedStr>,
    /// Line uuids already taken. Resumed sessions replay earlier lines.
    seen: HashSet<String>,
    summary: Option<String>,
    first_prompt: Option<String>,
    last_timestamp_ms: i64,
}

impl Builder {
    fn push_line(&mut self, line_no: usize, raw: RawLine) {
        let role = match raw.kind.as_str() {
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "system" => Role::System,
            "summary" => Role::Summary,
            _ => return,
        };
        let base = raw
            .uuid
            .clone()
            .unwrap_or_else(|| format!("{}:{}", self.session_id, line_no + 1));
        if !self.seen.insert(base.clone()) {
            debug!(session = %self.session_id, uuid = %base, "replayed line ignored");
            return;
        }
        let timestamp_ms = raw.timestamp.as_deref().and_then(parse_timestamp);
        if let Some(t) = timestamp_ms {
            self.last_timestamp_ms = self.last_timestamp_ms.max(t);
        }
        let agent_id = raw
            .agent_id
            .clone()
            .or_else(|| raw.is_sidechain.then(|| SIDECHAIN_AGENT.to_string()));

        let stamp = |mut r: InteractionRecord| {
            r.timestamp_ms = timestamp_ms;
            r.agent_id.clone_from(&agent_id);
            r
        };

        match role {
            Role::System => {
                let text = raw
                    .content
                    .as_ref()
                    .map(content_text)
                    .filter(|t| !t.is_empty())
                    .or(raw.subtype.clone())
                    .unwrap_or_default();
                let mut record = stamp(InteractionRecord::new(base, role).with_text(text));
                record.parent_uuid = raw.parent_uuid.map(SharedStr::from);
                record.duration_ms = raw.duration_ms;
                self.records.push(record);
            }
            Role::Summary => {
                let text = raw.summary.unwrap_or_default();
                if self.summary.is_none() && !text.trim().is_empty() {
                    self.summary = Some(text.clone());
                }
                self.records
                    .push(stamp(InteractionRecord::new(base, role).with_text(text)));
            }
            _ => {
                let Some(message) = raw.message else {
                    return;
                };
                let emitted = self.push_message(&base, role, raw.parent_uuid, message, raw.tool_use_result.as_ref());
                for record in &mut self.records[emitted..] {
                    record.timestamp_ms = timestamp_ms;
                    record.agent_id.clone_from(&agent_id);
                }
            }
        }
    }

    /// Push one record per content block. Returns the index of the first
    /// record pushed.
    fn push_message(
        &mut self,
        base: &str,
        role: Role,
        parent: Option<String>,
        message: RawMessage,
        tool_use_result: Option<&Value>,
    ) -> usize {
        let start = self.records.len();
        let blocks = match message.content {
            Some(RawContent::Text(text)) => vec![RawBlock::Text { text }],
            Some(RawContent::Blocks(blocks)) => blocks,
            None => Vec::new(),
        };
        let mut previous: Option<SharedStr> = parent.map(SharedStr::from);

        for block in blocks {
            let uuid: SharedStr = match self.records.len() - start {
                0 => base.into(),
                n => format!("{base}#{n}").into(),
            };
            let mut record = match block {
                RawBlock::Text { text } => {
                    if role == Role::User && self.first_prompt.is_none() && !text.trim().is_empty() {
                        self.first_prompt = Some(text.clone());
                    }
                    InteractionRecord::new(uuid.clone(), role).with_text(text)
                }
                RawBlock::ToolUse { id, name, input } => {
                    if !id.is_empty() {
                        self.tool_owner.insert(id, uuid.clone());
                    }
                    InteractionRecord::new(uuid.clone(), role).with_tool(name, input)
                }
                RawBlock::ToolResult {
                    tool_use_id,
                    content,
                    is_error,
                } => {
                    let mut record = InteractionRecord::new(uuid.clone(), role)
                        .with_text(content.as_ref().map(content_text).unwrap_or_default())
                        .with_result(ToolResult {
                            is_error,
                            exit_code: None,
                            stderr: stderr_of(tool_use_result),
                        });
                    if let Some(owner) = self.tool_owner.get(&tool_use_id) {
                        record.parent_uuid = Some(owner.clone());
                    }
                    record
                }
                RawBlock::Other => continue,
            };
            if record.parent_uuid.is_none() {
                record.parent_uuid = previous.clone();
            }
            previous = Some(uuid);
            if role == Role::Assistant {
                record.model.clone_from(&message.model);
            }
            self.records.push(record);
        }

        let pushed = &mut self.records[start..];
        if let Some(first) = pushed.first_mut() {
            first.usage = message.usage.map(Usage::from);
        }
        if let Some(last) = pushed.last_mut() {
            last.stop_reason = message.stop_reason;
        }
        start
    }

    fn finish(self, skipped_lines: usize) -> Result<Loaded, LoadError> {
        if self.records.is_empty() {
            return Err(LoadError::Empty(self.session_id));
        }
        let title = self
            .summary
            .or_else(|| self.first_prompt.map(|p| prompt_title(&p)))
            .unwrap_or_else(|| self.session_id.clone());
        let mut session = Session::new(self.session_id, title);
        session.last_modified_at_ms = self.last_timestamp_ms;
        Ok(Loaded {
            data: LaneData::new(session, self.records),
            skipped_lines,
        })
    }
}

fn prompt_title(prompt: &str) -> String {
    let line = prompt
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    if line.chars().count() <= TITLE_CHARS {
        return line.to_string();
    }
    let mut title: String = line.chars().take(TITLE_CHARS - 1).collect();
    title.push('…');
    title
}

/// Parse a transcript. Lines that are not valid JSON are skipped and
/// counted; a transcript with no usable records is an error.
pub fn parse_claude_jsonl(text: &str, session_id: &str) -> Result<Loaded, LoadError> {
    let mut builder = Builder {
        session_id: session_id.to_string(),
        ..Builder::default()
    };
    let mut skipped = 0;
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<RawLine>(line) {
            Ok(raw) => builder.push_line(line_no, raw),
            Err(err) => {
                skipped += 1;
                warn!(session = session_id, line = line_no + 1, %err, "skipping malformed line");
            }
        }
    }
    builder.finish(skipped)
}
