//! Dashboard document model.
//!
//! # Responsibility
//! - Define the Dashboard -> Row -> Panel tree shared by navigation and storage.
//! - Own name derivation so every layer addresses nodes the same way.
//!
//! # Invariants
//! - A node's parent chain always ends at the document stored as one file.
//! - Canonical bytes are regenerated from the tree, never cached.

pub mod document;
pub mod naming;
