//! codesnip-app
//!
//! Headless client core: which screen a session may see, and the state
//! behind each screen. Rendering lives elsewhere.

pub mod app;
pub mod error;
pub mod routing;
pub mod views;
