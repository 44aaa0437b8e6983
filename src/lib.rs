//! Manual tiling layout engine with nested split and tabbed groups.
//!
//! The engine keeps one node tree per workspace and drives a compositor
//! through the [`sys::host::Host`] trait.

pub mod common;
pub mod layout_engine;
pub mod model;
pub mod sys;
