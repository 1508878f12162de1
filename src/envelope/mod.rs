// ABOUTME: Core envelope structures and metadata handling
// ABOUTME: Implements the standard envelope pattern used between handler and transport

//! Core envelope structures and metadata handling.
//!
//! The envelope pattern separates a handler's business payload from the
//! metadata that travels alongside it (correlation id, timestamp, protocol
//! version). `transport::jsonrpc` translates between this internal shape and
//! the wire-level JSON-RPC envelope described by the A2A contract.

pub mod builder;
pub mod meta;

pub use builder::{Envelope, EnvelopeBuilder, EnvelopeError};
pub use meta::{Meta, MetaBuilder};
