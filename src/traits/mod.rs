// ABOUTME: Core trait definitions for the pipeline's service host
// ABOUTME: Defines the single seam between transport dispatch and action handlers

//! Core traits bridging transport dispatch and business logic.

pub mod handlers;

pub use handlers::ActionHandler;
