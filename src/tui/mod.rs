//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Dashboard with system status and session tallies
//! - Patient data input
//! - Risk assessment results with recommendations

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::CardioTheme;
