//! codesnip-auth
//!
//! Session providers: who is signed in, and a way to watch that change.
//! Cognito for deployments, an in-memory account list for development.

pub mod cognito;
pub mod error;
pub mod flows;
pub mod jwt;
pub mod memory;
pub mod session;
