//! UI rendering module for the live-score dashboard
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod match_list;

pub use help_overlay::render as render_help_overlay;
pub use match_list::render_match_list;
