//! Core use-case services.
//!
//! # Responsibility
//! - Expose category-level list/get/save/remove over stored documents.
//! - Keep CLI callers decoupled from layout and filesystem details.

pub mod resource_store;
