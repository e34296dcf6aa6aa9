//! Shared types and models for the Pharmacy Inventory Management System
//!
//! This crate contains the domain models, the document identifier scheme,
//! and the batch allocation planner shared between the backend and other
//! components of the system.

pub mod allocation;
pub mod doc_id;
pub mod models;
pub mod types;
pub mod validation;

pub use allocation::*;
pub use doc_id::*;
pub use models::*;
pub use types::*;
pub use validation::*;
