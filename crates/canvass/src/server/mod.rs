//! REST API module for the canvass service
//!
//! Hosts the question-answering pipeline behind axum routes. Request and
//! response types carry schemars annotations for the `/api` schema listing.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routing;
pub mod services;
pub mod startup;
pub mod state;
pub mod types;
