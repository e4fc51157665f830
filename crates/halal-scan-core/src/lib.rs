//! # Halal Scan Core
//!
//! Runtime-agnostic logic for Halal Scan: turning machine-read label text
//! into a per-ingredient and overall halal verdict, and collecting
//! unclassified names for curation.
//!
//! This crate contains no tokio, sqlx, HTTP, or filesystem I/O. Storage is
//! reached through the [`store`] traits.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`segment`] | Isolate the ingredients declaration |
//! | [`extract`] | Split the declaration into candidates |
//! | [`quality`] | Detect OCR noise |
//! | [`matcher`] | Reference lookup and matching strategies |
//! | [`classify`] | Ordered keyword rules |
//! | [`verdict`] | Overall product status |
//! | [`learner`] | Record unclassified names |
//! | [`pipeline`] | Wire everything together |

pub mod classify;
pub mod extract;
pub mod learner;
pub mod lexicon;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod quality;
pub mod segment;
pub mod store;
pub mod verdict;

pub use models::{ClassifiedIngredient, HalalStatus, ProductVerdict, ReferenceIngredient};
pub use pipeline::{Classification, Pipeline, PipelineError, PipelineSettings};
