//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `bridge-registry`, `bridge-runtime`). Embedding
//! applications can depend on `fcb-workspace` and enable the documented
//! features without needing to wire each crate individually.
