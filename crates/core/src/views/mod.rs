//! View transforms: board state in, `RenderCommand`s out.

mod card;
mod lane;
mod notice;

pub use card::{CardStyle, card_color, card_label, render_card};
pub use lane::{format_tokens, render_lane_header, stats_line};
pub use notice::{EMPTY_MESSAGE, RELOAD_LABEL, render_empty_state, render_failure};
