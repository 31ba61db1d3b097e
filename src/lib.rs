//! # Scriptorium
//!
//! Content intelligence for heritage archive collections.
//!
//! Scriptorium is an in-process library behind a tourism/heritage content
//! site: it indexes a catalog of monastery manuscripts, artifacts, and
//! media, ranks catalog items against free-text queries, models OCR
//! extraction over uploaded manuscript scans, and computes personalized,
//! explained recommendations from a visitor's interest profile.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐
//! │ Ingestion    │──▶│   Catalog    │◀──────────────┐
//! │ feed (JSON)  │   │   Index      │               │
//! └──────────────┘   └──────┬──────┘               │
//!                           │                       │
//!                ┌──────────┴──────────┐            │
//!                ▼                     ▼            │
//!         ┌────────────┐       ┌──────────────┐     │
//!         │   Query    │       │Recommendation│     │
//!         │  Matcher   │       │    Ranker    │     │
//!         └────────────┘       └──────────────┘     │
//!                                                   │
//! ┌──────────────┐   ┌─────────────┐   detected tags/languages
//! │ Upload       │──▶│    OCR      │────────────────┘
//! │ handler      │   │  Extractor  │   (future feedback loop)
//! └──────────────┘   └─────────────┘
//! ```
//!
//! All scoring components are pure functions over immutable catalog
//! snapshots, safe to call concurrently, no shared mutable state. The OCR
//! extractor is the one long-running operation: an async, cooperatively
//! cancellable task that reports monotone progress and returns either a
//! complete result or nothing.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`models`] | Core data types |
//! | [`error`] | Typed error taxonomy |
//! | [`catalog`] | Read-only catalog index |
//! | [`ingest`] | Partial-batch JSON record ingestion |
//! | [`matcher`] | Free-text query matching and ranking |
//! | [`recommend`] | Explained recommendation scoring |
//! | [`ocr`] | Image→text extraction contract |
//! | [`progress`] | Extraction progress reporting |
//! | [`config`] | TOML configuration parsing |

pub mod catalog;
pub mod config;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod models;
pub mod ocr;
pub mod progress;
pub mod recommend;
