//! Flatris (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof so tools and tests can use
//! `flatris::{core, sync, types}` while the implementation lives under `crates/`.

pub mod logging;

pub use flatris_core as core;
pub use flatris_sync as sync;
pub use flatris_types as types;
