//! Thin command-line client for a running canvass server

pub mod client;
pub mod commands;
pub mod display;
