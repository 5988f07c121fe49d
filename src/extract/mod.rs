//! Field extraction and record assembly
//!
//! This module contains:
//! - The declarative rule table describing where each product field lives
//! - The extractors that run those rules against a parsed page
//! - The record assembler and the normalized product record

mod assembler;
mod fields;
mod record;
mod rules;
mod text;

pub use assembler::RecordAssembler;
pub use fields::{extract_field, extract_fields};
pub use record::{ProductRecord, RecordFields, RecordKey};
pub use rules::{rule_for, Acceptance, ExtractionRule, Field, Lookup, Strategy, RULES};
pub use text::element_text;
