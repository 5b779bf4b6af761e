use lanewise_protocol::SharedStr;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a record. Anything unrecognised (or missing) is `Unknown`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
    Summary,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub name: String,
    /// Tool-specific arguments; the shape varies per tool.
    #[serde(default)]
    pub input: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolResult {
    #[serde(default)]
    pub is_error: Option<bool>,
    #[serde(default)]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub stderr: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cache_read_tokens: u64,
}

impl Usage {
    /// Input plus output. Cache reads are reported separately and not billed
    /// as fresh context, so they are left out.
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }
}

/// One entry of a recorded session. Immutable once loaded; identity is
/// `uuid`.
///
/// Every field but `uuid` is optional on the wire so that truncated or
/// hand-edited logs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRecord {
    pub uuid: SharedStr,
    #[serde(default)]
    pub parent_uuid: Option<SharedStr>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
    #[serde(default)]
    pub text_content: Option<String>,
    #[serde(default)]
    pub tool_invocation: Option<ToolInvocation>,
    #[serde(default)]
    pub tool_result: Option<ToolResult>,
    #[serde(default)]
    pub usage: Option<Usage>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    /// Model that produced an assistant record.
    #[serde(default)]
    pub model: Option<String>,
    /// Sub-agent identity; `None` is the main agent.
    #[serde(default)]
    pub agent_id: Option<String>,
}

impl InteractionRecord {
    pub fn new(uuid: impl Into<SharedStr>, role: Role) -> Self {
        Self {
            uuid: uuid.into(),
            parent_uuid: None,
            role,
            timestamp_ms: None,
            text_content: None,
            tool_invocation: None,
            tool_result: None,
            usage: None,
            stop_reason: None,
            duration_ms: None,
            model: None,
            agent_id: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<SharedStr>) -> Self {
        self.parent_uuid = Some(parent.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp_ms: i64) -> Self {
        self.timestamp_ms = Some(timestamp_ms);
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_tool(mut self, name: impl Into<String>, input: Value) -> Self {
        self.tool_invocation = Some(ToolInvocation {
            name: name.into(),
            input,
        });
        self
    }

    pub fn with_result(mut self, result: ToolResult) -> Self {
        self.tool_result = Some(result);
        self
    }

    pub fn with_usage(mut self, input_tokens: u64, output_tokens: u64) -> Self {
        self.usage = Some(Usage {
            input_tokens,
            output_tokens,
            cache_read_tokens: 0,
        });
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = Some(agent_id.into());
        self
    }

    pub fn with_stop_reason(mut self, reason: impl Into<String>) -> Self {
        self.stop_reason = Some(reason.into());
        self
    }

    /// Text content, or `""` when absent.
    pub fn text(&self) -> &str {
        self.text_content.as_deref().unwrap_or("")
    }

    pub fn tool_name(&self) -> Option<&str> {
        self.tool_invocation.as_ref().map(|t| t.name.as_str())
    }

    /// Content-bearing or tool-bearing records are shown in a lane; bare
    /// bookkeeping records are not.
    pub fn is_visible(&self) -> bool {
        self.tool_invocation.is_some() || !self.text().trim().is_empty()
    }

    /// Tokens billed to this record: only assistant turns carry usage that
    /// counts towards a lane total.
    pub fn billed_tokens(&self) -> u64 {
        match (self.role, self.usage) {
            (Role::Assistant, Some(usage)) => usage.total(),
            _ => 0,
        }
    }
}
