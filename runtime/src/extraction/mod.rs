//! Link extraction: the resolver, its browser fallback, and the element
//! classifier that tells the browser what to click.

pub mod browser;
pub mod resolver;
pub mod selector_model;
