//! NewsHub - A News Aggregator
//!
//! This crate ingests articles from a category-based news API, cleans and
//! deduplicates them, and serves the stored articles through a small web
//! interface with search, category filtering, and pagination.

pub mod config;
pub mod db;
pub mod fetcher;
pub mod ingest;
pub mod routes;
pub mod sanitize;
