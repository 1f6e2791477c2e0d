//! Canvass - Survey Feedback Question Answering
//!
//! Collects customer feedback against survey forms and answers questions
//! about it with a retrieval-augmented generation pipeline.

pub mod cli;
pub mod config;
pub mod error;
pub mod server;
