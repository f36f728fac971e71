// src/ingest/providers/mod.rs
pub mod local;
pub mod rss;
