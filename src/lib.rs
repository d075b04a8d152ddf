//! Repository downloader - keeps local clones in sync with tracked branches
//! and derives per-commit statistics from their history.
//!
//! - `jobs`: single-flight coordinator, processing pipeline, job source polling
//! - `git`: reconciliation of local clones, commit history walking, diff stats
//! - `routes`: HTTP trigger surface
//! - `config`: CLI/env configuration

pub mod config;
pub mod error;
pub mod git;
pub mod jobs;
pub mod models;
pub mod routes;
pub mod storage;
