//! The app under test, reduced to what the scenarios call into.
//!
//! The room loader and tier provider are traits so a scenario context can
//! swap in another implementation; the bundled ones serve fixtures through
//! the host's network primitive and hand out mock identities.

pub mod audio;
pub mod catalog;
pub mod loader;
pub mod tiers;
