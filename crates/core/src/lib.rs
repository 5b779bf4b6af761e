//! Core of the lanewise session board: the interaction model, semantic
//! classification, brushing, viewport windowing, scroll sync, and the
//! lane/board state machines that turn sessions into render commands.

pub mod board;
pub mod brush;
pub mod classify;
pub mod config;
pub mod lane;
pub mod loaders;
pub mod model;
pub mod sync;
pub mod views;
pub mod window;

pub use board::{Board, BoardError, BoardEvent, CardRef};
pub use brush::{ActiveBrush, BrushKind};
pub use config::{BoardConfig, ConfigError, PanModifier, RowSizes};
pub use lane::{CardView, Lane, ScrollAnchor};
pub use model::{InteractionRecord, LaneData, Role, Session, ZoomLevel};
pub use sync::{Scrollable, SyncOutcome};
