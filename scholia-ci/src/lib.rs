//! scholia-ci library - Corpus ingest tool
//!
//! Loads tokenized documents (JSON Lines) into the shared annotation
//! database: one all-or-nothing transaction per run, token rows
//! deduplicated per language, string rows linked to their canonical
//! token by a single backfill pass.

pub mod pipeline;
pub mod reader;
