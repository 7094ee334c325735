//! Client-side chess move timeline and reconciliation
//!
//! - `core` - errors, settings, logging
//! - `game` - timeline, material, coordinator, engine bridge, session
//! - `remote` - the remote authority contract and an in-memory authority

pub mod core;
pub mod game;
pub mod remote;
