//! Internal modules for the Skillatics terminal client.
//!
//! This library provides argument parsing, prompt parsers, text rendering
//! and the full-screen test UI used by the sk_client binary.

pub mod app;
pub mod cli;
pub mod commands;
pub mod logging;
pub mod render;
pub mod tui_app;
