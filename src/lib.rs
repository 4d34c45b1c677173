//! Study-hours dashboard backend: a CSV study log in, streak and
//! attendance analytics out.
//!
//! `analytics` is the pure engine; `data` handles the CSV source and sink
//! plus the per-date aggregation the engine expects.

pub mod analytics;
pub mod data;
