//! # Halal Scan
//!
//! Classifies a photographed food label as halal `OK`, `Caution`, `Avoid`,
//! or `Unknown`, ingredient by ingredient, and collects names it could not
//! classify for later curation.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌─────────────────────┐   ┌──────────┐
//! │  photo   │──▶│   OCR    │──▶│ halal-scan-core     │──▶│ verdict  │
//! │ (base64) │   │ provider │   │ segment → classify  │   │  (JSON)  │
//! └──────────┘   └──────────┘   └─────────┬───────────┘   └──────────┘
//!                                         │ novel names
//!                                         ▼
//!                                   ┌──────────┐
//!                                   │  SQLite  │ reference + candidate
//!                                   └──────────┘ ingredients
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! halal-scan init
//! halal-scan reference import ./data/reference.json
//! halal-scan classify ./label.txt
//! halal-scan serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | SQLite connection pool |
//! | [`migrate`] | Schema migrations |
//! | [`sqlite_store`] | SQLite reference and candidate stores |
//! | [`retry`] | Bounded retry with backoff |
//! | [`ocr`] | Text-extraction providers |
//! | [`scan`] | Scan service with time budget and learner hand-off |
//! | [`server`] | HTTP `/scan` endpoint |
//! | [`curate`] | Reference import and review commands |

pub mod config;
pub mod curate;
pub mod db;
pub mod migrate;
pub mod ocr;
pub mod retry;
pub mod scan;
pub mod server;
pub mod sqlite_store;
