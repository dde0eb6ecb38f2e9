//! Thinktrace - a durable tracker for branching, revisable reasoning sessions.

// ============================================================================
// Core Infrastructure
// ============================================================================

pub mod config;
pub mod store;
pub mod sync;

// ============================================================================
// Operation Surface
// ============================================================================

pub mod api;

// ============================================================================
// Domain
// ============================================================================

pub mod session;
