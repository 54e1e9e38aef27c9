//! # luajava-api
//!
//! Dispatch facade between Lua scripts and host objects.
//!
//! The VM's metamethod trampolines call into [`BridgeApi`] for every
//! index, assignment, construction, library load and proxy request on a
//! host value. The facade applies the sandbox bound to the calling thread
//! (see [`luajava_runtime::ambient`]) and delegates the reflective work to a
//! [`Resolver`].
//!
//! ## Conventions
//!
//! - Array indices are passed through as the script wrote them (1-based).
//!   Resolvers convert with [`script_index_to_offset`].
//! - `class_index` returns 1 for a field and 2 for a method
//!   ([`ClassMember`]).
//! - Proxy interface lists are split on `,` with no trimming
//!   ([`interface_names`]).

pub mod facade;
pub mod handle;
pub mod resolver;

pub use facade::BridgeApi;
pub use handle::{HostClass, HostObject, LuaState};
pub use resolver::{interface_names, script_index_to_offset, ClassMember, Resolver};
