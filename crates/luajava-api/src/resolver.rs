//! The reflective resolver the facade delegates to.
//!
//! The resolver does the actual work behind every metamethod: field and
//! method lookup, overload resolution, invocation, and pushing results onto
//! the VM stack. Every method returns how many values it pushed. On error it
//! must leave the stack as it found it.

use crate::handle::{HostClass, HostObject, LuaState};
use luajava_runtime::{ResolveResult, ResolverError};
use std::sync::Arc;

/// Reflective operations behind the facade entry points.
///
/// Array indices arrive exactly as the script wrote them (1-based); see
/// [`script_index_to_offset`].
pub trait Resolver: Send + Sync {
    /// `__index` on a host object.
    fn object_index(&self, state: LuaState, obj: &HostObject, name: &str) -> ResolveResult<usize>;

    /// `__index` on a host array.
    fn array_index(&self, state: LuaState, obj: &HostObject, index: i64) -> ResolveResult<usize>;

    /// `__index` on a host class. Returns 1 when a field matched and 2 when
    /// a method matched; see [`ClassMember`].
    fn class_index(&self, state: LuaState, class: &HostClass, name: &str) -> ResolveResult<usize>;

    /// `__newindex` on a host object; the value is on the VM stack.
    fn object_new_index(
        &self,
        state: LuaState,
        obj: &HostObject,
        field: &str,
    ) -> ResolveResult<usize>;

    /// `__newindex` on a host array; the value is on the VM stack.
    fn array_new_index(&self, state: LuaState, obj: &HostObject, index: i64)
        -> ResolveResult<usize>;

    /// Instantiate a class by name.
    fn java_new_instance(&self, state: LuaState, class_name: &str) -> ResolveResult<usize>;

    /// Instantiate a class descriptor.
    fn java_new(&self, state: LuaState, class: &HostClass) -> ResolveResult<usize>;

    /// Call the static library opener `method_name` on `class_name`.
    fn java_load_lib(
        &self,
        state: LuaState,
        class_name: &str,
        method_name: &str,
    ) -> ResolveResult<usize>;

    /// Push whether `obj` has a field called `field`.
    fn check_field(&self, state: LuaState, obj: &HostObject, field: &str) -> ResolveResult<usize>;

    /// Build a proxy implementing the comma-separated `interfaces` that
    /// dispatches back into the script.
    fn create_proxy_object(&self, state: LuaState, interfaces: &str) -> ResolveResult<usize>;
}

macro_rules! forward_resolver {
    ($($ptr:ty),*) => {$(
        impl<R: Resolver + ?Sized> Resolver for $ptr {
            fn object_index(&self, state: LuaState, obj: &HostObject, name: &str) -> ResolveResult<usize> {
                (**self).object_index(state, obj, name)
            }

            fn array_index(&self, state: LuaState, obj: &HostObject, index: i64) -> ResolveResult<usize> {
                (**self).array_index(state, obj, index)
            }

            fn class_index(&self, state: LuaState, class: &HostClass, name: &str) -> ResolveResult<usize> {
                (**self).class_index(state, class, name)
            }

            fn object_new_index(&self, state: LuaState, obj: &HostObject, field: &str) -> ResolveResult<usize> {
                (**self).object_new_index(state, obj, field)
            }

            fn array_new_index(&self, state: LuaState, obj: &HostObject, index: i64) -> ResolveResult<usize> {
                (**self).array_new_index(state, obj, index)
            }

            fn java_new_instance(&self, state: LuaState, class_name: &str) -> ResolveResult<usize> {
                (**self).java_new_instance(state, class_name)
            }

            fn java_new(&self, state: LuaState, class: &HostClass) -> ResolveResult<usize> {
                (**self).java_new(state, class)
            }

            fn java_load_lib(&self, state: LuaState, class_name: &str, method_name: &str) -> ResolveResult<usize> {
                (**self).java_load_lib(state, class_name, method_name)
            }

            fn check_field(&self, state: LuaState, obj: &HostObject, field: &str) -> ResolveResult<usize> {
                (**self).check_field(state, obj, field)
            }

            fn create_proxy_object(&self, state: LuaState, interfaces: &str) -> ResolveResult<usize> {
                (**self).create_proxy_object(state, interfaces)
            }
        }
    )*};
}

forward_resolver!(&R, Box<R>, Arc<R>);

/// What a class-index lookup found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMember {
    /// A static field; its value was pushed.
    Field,
    /// A method; a callable was pushed for the script to invoke.
    Method,
}

impl ClassMember {
    /// The count a resolver returns from `class_index` for this member.
    pub const fn push_count(self) -> usize {
        match self {
            ClassMember::Field => 1,
            ClassMember::Method => 2,
        }
    }

    /// Interpret a `class_index` return count.
    pub const fn from_push_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(ClassMember::Field),
            2 => Some(ClassMember::Method),
            _ => None,
        }
    }
}

/// Convert a 1-based script index into an offset into an array of `len`
/// elements.
pub fn script_index_to_offset(index: i64, len: usize) -> ResolveResult<usize> {
    usize::try_from(index)
        .ok()
        .and_then(|i| i.checked_sub(1))
        .filter(|&offset| offset < len)
        .ok_or(ResolverError::IndexOutOfBounds { index, len })
}

/// Split a proxy interface list on `,`.
///
/// No trimming is done and empty entries are kept, so `"A,"` yields `"A"`
/// and `""`.
pub fn interface_names(interfaces: &str) -> std::str::Split<'_, char> {
    interfaces.split(',')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_index_to_offset() {
        assert_eq!(script_index_to_offset(1, 3), Ok(0));
        assert_eq!(script_index_to_offset(3, 3), Ok(2));
    }

    #[test]
    fn test_script_index_out_of_range() {
        for index in [0, -1, 4, i64::MIN, i64::MAX] {
            assert_eq!(
                script_index_to_offset(index, 3),
                Err(ResolverError::IndexOutOfBounds { index, len: 3 })
            );
        }
        assert!(script_index_to_offset(1, 0).is_err());
    }

    #[test]
    fn test_class_member_counts() {
        assert_eq!(ClassMember::Field.push_count(), 1);
        assert_eq!(ClassMember::Method.push_count(), 2);
        assert_eq!(ClassMember::from_push_count(2), Some(ClassMember::Method));
        assert_eq!(ClassMember::from_push_count(0), None);
    }

    #[test]
    fn test_interface_names() {
        assert_eq!(interface_names("A,B,C").collect::<Vec<_>>(), ["A", "B", "C"]);
        assert_eq!(interface_names("A,").collect::<Vec<_>>(), ["A", ""]);
        assert_eq!(interface_names("A").collect::<Vec<_>>(), ["A"]);
        assert_eq!(interface_names("").collect::<Vec<_>>(), [""]);
        assert_eq!(interface_names(" A, B").collect::<Vec<_>>(), [" A", " B"]);
    }
}
