//! URL handling module for Catalog-Scout
//!
//! This module provides item identifier extraction, origin derivation for
//! request pacing, and the link handling used by the listing walker.

mod identifier;
mod normalize;
mod origin;

pub use identifier::extract_identifier;
pub use normalize::{build_search_url, parse_target, resolve_item_link};
pub use origin::origin_of;
