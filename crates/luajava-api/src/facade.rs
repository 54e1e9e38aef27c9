//! Entry points called by the VM's metamethod trampolines.
//!
//! Each entry point reads the sandbox bound to the calling thread once,
//! runs the check the operation calls for (if a sandbox is bound), and hands
//! the call to the resolver. The resolver's push count is returned as is.
//! Errors from the sandbox or the resolver are propagated untouched.

use crate::handle::{HostClass, HostObject, LuaState};
use crate::resolver::{interface_names, Resolver};
use luajava_runtime::{ambient, BridgeError, BridgeResult};
use tracing::{trace, warn};

/// Dispatch facade over a resolver.
#[derive(Debug, Clone, Default)]
pub struct BridgeApi<R> {
    resolver: R,
}

impl<R: Resolver> BridgeApi<R> {
    /// Create a facade delegating to `resolver`.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// The underlying resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Consume the facade, returning the resolver.
    pub fn into_resolver(self) -> R {
        self.resolver
    }

    /// `__index` on a host object.
    pub fn object_index(
        &self,
        state: LuaState,
        obj: &HostObject,
        name: &str,
    ) -> BridgeResult<usize> {
        trace!(%state, host_type = obj.type_name(), member = name, "object_index");
        Ok(self.resolver.object_index(state, obj, name)?)
    }

    /// `__index` on a host array. `index` is the script's 1-based index and
    /// is forwarded unchanged.
    pub fn array_index(
        &self,
        state: LuaState,
        obj: &HostObject,
        index: i64,
    ) -> BridgeResult<usize> {
        trace!(%state, host_type = obj.type_name(), index, "array_index");
        Ok(self.resolver.array_index(state, obj, index)?)
    }

    /// `__index` on a host class. 1 means a field was pushed, 2 a method.
    pub fn class_index(
        &self,
        state: LuaState,
        class: &HostClass,
        name: &str,
    ) -> BridgeResult<usize> {
        trace!(%state, class = class.name(), member = name, "class_index");
        Ok(self.resolver.class_index(state, class, name)?)
    }

    /// `__newindex` on a host object.
    pub fn object_new_index(
        &self,
        state: LuaState,
        obj: &HostObject,
        field: &str,
    ) -> BridgeResult<usize> {
        trace!(%state, host_type = obj.type_name(), field, "object_new_index");
        Ok(self.resolver.object_new_index(state, obj, field)?)
    }

    /// `__newindex` on a host array. `index` is forwarded unchanged.
    pub fn array_new_index(
        &self,
        state: LuaState,
        obj: &HostObject,
        index: i64,
    ) -> BridgeResult<usize> {
        trace!(%state, host_type = obj.type_name(), index, "array_new_index");
        Ok(self.resolver.array_new_index(state, obj, index)?)
    }

    /// Instantiate a class by name. Sandboxed.
    pub fn java_new_instance(&self, state: LuaState, class_name: &str) -> BridgeResult<usize> {
        trace!(%state, class = class_name, "java_new_instance");
        if let Some(policy) = ambient::current() {
            policy
                .check_class_name(class_name)
                .inspect_err(|e| denied("java_new_instance", e))?;
        }
        Ok(self.resolver.java_new_instance(state, class_name)?)
    }

    /// Instantiate a class the script already holds.
    pub fn java_new(&self, state: LuaState, class: &HostClass) -> BridgeResult<usize> {
        trace!(%state, class = class.name(), "java_new");
        Ok(self.resolver.java_new(state, class)?)
    }

    /// Open a host library through a static method. Sandboxed on the class.
    pub fn java_load_lib(
        &self,
        state: LuaState,
        class_name: &str,
        method_name: &str,
    ) -> BridgeResult<usize> {
        trace!(%state, class = class_name, method = method_name, "java_load_lib");
        if let Some(policy) = ambient::current() {
            policy
                .check_class_method(class_name, method_name)
                .inspect_err(|e| denied("java_load_lib", e))?;
        }
        Ok(self.resolver.java_load_lib(state, class_name, method_name)?)
    }

    /// Push whether `obj` has a field called `field`.
    pub fn check_field(
        &self,
        state: LuaState,
        obj: &HostObject,
        field: &str,
    ) -> BridgeResult<usize> {
        trace!(%state, host_type = obj.type_name(), field, "check_field");
        Ok(self.resolver.check_field(state, obj, field)?)
    }

    /// Create a proxy for the comma-separated interface list. Every listed
    /// name is checked, in order, before the resolver is called.
    pub fn create_proxy_object(&self, state: LuaState, interfaces: &str) -> BridgeResult<usize> {
        trace!(%state, interfaces, "create_proxy_object");
        if let Some(policy) = ambient::current() {
            for class_name in interface_names(interfaces) {
                policy
                    .check_class_name(class_name)
                    .inspect_err(|e| denied("create_proxy_object", e))?;
            }
        }
        Ok(self.resolver.create_proxy_object(state, interfaces)?)
    }
}

fn denied(entry: &'static str, err: &BridgeError) {
    if let Some(class_name) = err.forbidden_name() {
        warn!(entry, class = class_name, "sandbox denied access");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use luajava_runtime::{ResolveResult, ResolverError, Sandbox};
    use std::sync::Mutex;
    use std::thread;

    /// Returns a fixed count and remembers which entries were reached.
    #[derive(Default)]
    struct CountingResolver {
        calls: Mutex<Vec<&'static str>>,
    }

    impl CountingResolver {
        fn hit(&self, entry: &'static str, count: usize) -> ResolveResult<usize> {
            self.calls.lock().unwrap().push(entry);
            Ok(count)
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Resolver for CountingResolver {
        fn object_index(&self, _: LuaState, _: &HostObject, _: &str) -> ResolveResult<usize> {
            self.hit("object_index", 1)
        }

        fn array_index(&self, _: LuaState, _: &HostObject, _: i64) -> ResolveResult<usize> {
            self.hit("array_index", 1)
        }

        fn class_index(&self, _: LuaState, _: &HostClass, name: &str) -> ResolveResult<usize> {
            self.hit("class_index", if name == "field" { 1 } else { 2 })
        }

        fn object_new_index(&self, _: LuaState, _: &HostObject, _: &str) -> ResolveResult<usize> {
            self.hit("object_new_index", 0)
        }

        fn array_new_index(&self, _: LuaState, _: &HostObject, _: i64) -> ResolveResult<usize> {
            self.hit("array_new_index", 0)
        }

        fn java_new_instance(&self, _: LuaState, class_name: &str) -> ResolveResult<usize> {
            if class_name == "missing.Class" {
                return Err(ResolverError::ClassNotFound(class_name.to_string()));
            }
            self.hit("java_new_instance", 1)
        }

        fn java_new(&self, _: LuaState, _: &HostClass) -> ResolveResult<usize> {
            self.hit("java_new", 1)
        }

        fn java_load_lib(&self, _: LuaState, _: &str, _: &str) -> ResolveResult<usize> {
            self.hit("java_load_lib", 0)
        }

        fn check_field(&self, _: LuaState, _: &HostObject, _: &str) -> ResolveResult<usize> {
            self.hit("check_field", 1)
        }

        fn create_proxy_object(&self, _: LuaState, _: &str) -> ResolveResult<usize> {
            self.hit("create_proxy_object", 1)
        }
    }

    const L: LuaState = LuaState::from_raw(1);

    // Each test runs on a fresh thread so bindings never leak between tests.
    fn isolated(f: impl FnOnce() + Send + 'static) {
        thread::spawn(f).join().unwrap();
    }

    #[test]
    fn test_class_index_count_passes_through() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            let class = HostClass::named("java.lang.Math");
            assert_eq!(api.class_index(L, &class, "field").unwrap(), 1);
            assert_eq!(api.class_index(L, &class, "max").unwrap(), 2);
        });
    }

    #[test]
    fn test_new_instance_checks_sandbox() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            let _guard = ambient::enter_sandbox(Sandbox::allow(["com.example."]));

            assert_eq!(api.java_new_instance(L, "com.example.Foo").unwrap(), 1);

            let err = api.java_new_instance(L, "java.lang.Runtime").unwrap_err();
            assert_eq!(err.to_string(), "luajava forbidden > java.lang.Runtime");
            assert_eq!(api.resolver().calls(), ["java_new_instance"]);
        });
    }

    #[test]
    fn test_unbound_sandbox_skips_checks() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            assert_eq!(api.java_new_instance(L, "java.lang.Runtime").unwrap(), 1);
            assert_eq!(api.java_load_lib(L, "any.Lib", "open").unwrap(), 0);
            assert_eq!(api.create_proxy_object(L, "x.A,y.B").unwrap(), 1);
        });
    }

    #[test]
    fn test_resolver_error_propagates_unchanged() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            let err = api.java_new_instance(L, "missing.Class").unwrap_err();
            assert!(matches!(
                err,
                BridgeError::Resolver(ResolverError::ClassNotFound(ref name)) if name == "missing.Class"
            ));
            assert_eq!(err.to_string(), "Class not found: missing.Class");
        });
    }

    #[test]
    fn test_unchecked_entries_ignore_deny_all_sandbox() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            let _guard = ambient::enter_sandbox(Sandbox::deny_all());
            let obj = HostObject::new(vec![1u8, 2, 3]);
            let class = HostClass::named("java.lang.Runtime");

            assert_eq!(api.object_index(L, &obj, "len").unwrap(), 1);
            assert_eq!(api.array_index(L, &obj, 1).unwrap(), 1);
            assert_eq!(api.class_index(L, &class, "getRuntime").unwrap(), 2);
            assert_eq!(api.object_new_index(L, &obj, "x").unwrap(), 0);
            assert_eq!(api.array_new_index(L, &obj, 0).unwrap(), 0);
            assert_eq!(api.java_new(L, &class).unwrap(), 1);
            assert_eq!(api.check_field(L, &obj, "x").unwrap(), 1);
        });
    }

    #[test]
    fn test_into_resolver_returns_recorded_calls() {
        isolated(|| {
            let api = BridgeApi::new(CountingResolver::default());
            api.java_new(L, &HostClass::named("demo.Point")).unwrap();

            let resolver = api.into_resolver();
            assert_eq!(resolver.calls(), ["java_new"]);
        });
    }
}
