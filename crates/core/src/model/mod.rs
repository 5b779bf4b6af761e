pub mod lane;
pub mod record;
pub mod session;
pub mod thread;
pub mod tool;

pub use lane::{LaneStats, ZoomLevel};
pub use record::{InteractionRecord, Role, ToolInvocation, ToolResult, Usage};
pub use session::{CommitEvent, LaneData, Session};
pub use thread::thread_of;
pub use tool::{ToolInput, ToolKind};
