//! # luajava-runtime
//!
//! Policy layer for the Lua/Java bridge.
//!
//! This crate provides:
//! - The class-name sandbox (whitelist and blacklist of prefixes)
//! - The per-thread binding through which embedders expose a sandbox
//! - Sandbox configuration loading
//! - The error types shared with the dispatch facade
//!
//! ## Security Model
//!
//! Script operations that name a host class (instantiation by name, library
//! loading, proxy creation) are checked against the sandbox bound to the
//! running thread. With no sandbox bound, nothing is checked.

pub mod ambient;
pub mod config;
pub mod error;
pub mod sandbox;

pub use ambient::SandboxGuard;
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, ResolveResult, ResolverError};
pub use sandbox::{ClassPolicy, Sandbox};
