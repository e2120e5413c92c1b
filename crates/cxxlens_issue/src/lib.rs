//! # cxxlens_issue
//!
//! Data model shared by every cxxlens crate.
//!
//! This crate provides:
//! - [`Issue`], the canonical representation of one static-analysis finding
//! - [`Severity`] levels
//! - [`RuleProfile`], the per-language rule table used to filter and annotate issues

mod error;
mod issue;
mod profile;

pub use error::ProfileError;
pub use issue::{Issue, Severity};
pub use profile::{Rule, RuleProfile};
