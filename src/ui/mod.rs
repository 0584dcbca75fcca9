//! UI rendering module for cpratings
//!
//! This module contains the rendering logic for the terminal view, using the
//! ratatui library for TUI components.

pub mod ratings;

pub use ratings::render;
