//! Raw student input schema
//!
//! This module defines the raw field mapping accepted by the pipeline and the
//! catalogue of known fields (name, requirement, domain, default). Raw input
//! can come from JSON objects or tabular rows; both end up as [`RawFields`].

mod catalogue;
mod raw_fields;

pub use catalogue::*;
pub use raw_fields::*;
