//! # Communications interface crate.
//!
//! Provides the interface structures and networking shared between the swarm
//! controller and the vehicle platform.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Command and response definitions for equipment (the vehicle platform)
pub mod eqpt;

/// Network module
pub mod net;
