//! Opaque handles passed from the VM trampolines into the facade.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Token identifying one Lua VM instance.
///
/// The facade never interprets it; it is forwarded to the resolver, which
/// uses it to push results onto that VM's stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LuaState(i64);

impl LuaState {
    /// Wrap a raw state token.
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// The raw state token.
    pub const fn as_raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for LuaState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{:#x}", self.0)
    }
}

/// Shared reference to a host value held by a script.
#[derive(Clone)]
pub struct HostObject {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl HostObject {
    /// Wrap a host value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Wrap an already shared host value.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Borrow the value as `T`, if that is its type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Whether the value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Name of the wrapped host type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether both handles refer to the same host value.
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// Descriptor of a host class dereferenced by a script.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostClass {
    name: Arc<str>,
    type_id: Option<TypeId>,
}

impl HostClass {
    /// A class known only by name.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            type_id: None,
        }
    }

    /// The class backing Rust type `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            name: Arc::from(std::any::type_name::<T>()),
            type_id: Some(TypeId::of::<T>()),
        }
    }

    /// Fully qualified class name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type identity, for classes built with [`HostClass::of`].
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Whether an object is an instance of this class.
    ///
    /// Only classes built from a Rust type can answer; named classes never
    /// match.
    pub fn is_instance(&self, object: &HostObject) -> bool {
        self.type_id == Some(object.value.as_ref().type_id())
    }
}

impl fmt::Display for HostClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
