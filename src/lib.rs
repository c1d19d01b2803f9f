//! Repograph - dependency graph aggregation
//!
//! This crate walks a configured list of repositories, fetches each one's
//! manifest (pyproject.toml or package.json) from the hosting API, and merges
//! the per-repository dependency edges into one `{nodes, links}` graph that is
//! stored as a timestamped JSON snapshot and served over HTTP.

pub mod config;
pub mod github;
pub mod graph;
pub mod parsers;
pub mod repository;
pub mod server;
pub mod service;
pub mod snapshot;
pub mod storage;
