//! State module for tracking request pacing
//!
//! # Components
//!
//! - `OriginState`: Tracks per-origin request counts, block counts and whether
//!   a scheduled delay is owed before the next request to that origin

mod origin_state;

pub use origin_state::OriginState;
