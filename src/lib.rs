//! LM-driven product catalog field enrichment.
//!
//! The core is an in-process pipeline: a template resolver turns a
//! user-authored `@field` template into a per-record prompt, a chat model
//! generates the value, a judge model accepts or rewrites it, and a
//! pluggable sink persists the result (store write-back or in-memory
//! rows). Everything around that — store queries, instruction storage,
//! row files — is external glue.

pub mod cli;
pub mod config;
pub mod instructions;
pub mod judge;
pub mod model;
pub mod pipeline;
pub mod record;
pub mod rows;
pub mod sink;
pub mod store;
pub mod template;
pub mod util;
