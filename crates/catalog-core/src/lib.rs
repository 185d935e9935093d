//! # catalog-core
//!
//! Core types, traits, and rules for the resource catalog.
//!
//! This crate holds everything that does not depend on a concrete datastore
//! or transport: entities and wire shapes, command validation, the mapping
//! layer, tag reconciliation planning and the repository trait that storage
//! backends implement.

pub mod defaults;
pub mod error;
pub mod mapping;
pub mod models;
pub mod tags;
pub mod traits;
pub mod uuid_utils;
pub mod validation;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use tags::{plan_reconciliation, ReconcilePlan};
pub use traits::ResourceRepository;
pub use uuid_utils::{is_v7, new_v7};
pub use validation::{ensure_valid, Validate, ValidationErrors};
