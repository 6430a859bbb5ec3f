//! State management module
//!
//! Handles bookmark tracking and incremental windows.
//! State is persisted between sync runs to enable incremental syncs.
//!
//! # Overview
//!
//! The state module provides:
//! - `State` - Nested `{stream: {bookmark_key: value}}` mapping
//! - `StateManager` - Loads state, hands out snapshots, commits once per stream
//! - `build_range` - Incremental window computation from a bookmark

mod manager;
mod types;
mod window;

pub use manager::StateManager;
pub use types::State;
pub use window::{build_range, parse_bookmark_date, DateWindow, WindowPolicy, WindowStart};
