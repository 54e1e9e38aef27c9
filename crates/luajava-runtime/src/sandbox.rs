//! Class-name sandbox for script access to host classes.
//!
//! A sandbox carries an optional whitelist and an optional blacklist of
//! class-name prefixes. A class is permitted only if some whitelist entry is
//! a prefix of its name and no blacklist entry is. Without a whitelist
//! nothing is permitted; embedders wanting unrestricted access bind no
//! sandbox at all.

use crate::error::{BridgeError, BridgeResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Access policy consulted by the dispatch facade.
///
/// Method-level rules can be layered on by overriding
/// [`ClassPolicy::check_class_method`]; the facade only talks to this trait.
pub trait ClassPolicy: Send + Sync {
    /// Permit or deny a bare class name.
    fn check_class_name(&self, class_name: &str) -> BridgeResult<()>;

    /// Permit or deny a class/method pair. The method name is not consulted
    /// by default.
    fn check_class_method(&self, class_name: &str, _method_name: &str) -> BridgeResult<()> {
        self.check_class_name(class_name)
    }
}

/// Immutable whitelist/blacklist of class-name prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sandbox {
    #[serde(default)]
    whitelist: Option<Vec<String>>,

    #[serde(default)]
    blacklist: Option<Vec<String>>,
}

impl Sandbox {
    /// Create a sandbox from optional prefix lists.
    pub fn new(whitelist: Option<Vec<String>>, blacklist: Option<Vec<String>>) -> Self {
        Self {
            whitelist,
            blacklist,
        }
    }

    /// A sandbox with no lists at all. It denies every class.
    pub fn deny_all() -> Self {
        Self::default()
    }

    /// A sandbox whitelisting the given prefixes, with no blacklist.
    pub fn allow<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            whitelist: Some(prefixes.into_iter().map(Into::into).collect()),
            blacklist: None,
        }
    }

    /// Replace the blacklist.
    pub fn with_blacklist<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blacklist = Some(prefixes.into_iter().map(Into::into).collect());
        self
    }

    /// Whitelisted prefixes, if a whitelist is set.
    pub fn whitelist(&self) -> Option<&[String]> {
        self.whitelist.as_deref()
    }

    /// Blacklisted prefixes, if a blacklist is set.
    pub fn blacklist(&self) -> Option<&[String]> {
        self.blacklist.as_deref()
    }

    /// Check a class name against both lists.
    ///
    /// The whitelist is consulted first; a miss there (or no whitelist)
    /// denies. The blacklist is consulted second and overrides a whitelist
    /// hit. Matching is a case-sensitive string prefix test.
    pub fn check_class_name(&self, class_name: &str) -> BridgeResult<()> {
        let mut denied = true;
        if let Some(whitelist) = &self.whitelist {
            if whitelist.iter().any(|prefix| class_name.starts_with(prefix.as_str())) {
                denied = false;
            }
        }
        if denied {
            debug!(class = %class_name, "class not whitelisted");
            return Err(BridgeError::Forbidden(class_name.to_string()));
        }

        if let Some(blacklist) = &self.blacklist {
            if blacklist.iter().any(|prefix| class_name.starts_with(prefix.as_str())) {
                debug!(class = %class_name, "class blacklisted");
                return Err(BridgeError::Forbidden(class_name.to_string()));
            }
        }

        Ok(())
    }

    /// Check a class/method pair. Only the class name decides.
    pub fn check_class_method(&self, class_name: &str, _method_name: &str) -> BridgeResult<()> {
        self.check_class_name(class_name)
    }

    /// Non-failing form of [`Sandbox::check_class_name`].
    pub fn permits(&self, class_name: &str) -> bool {
        self.check_class_name(class_name).is_ok()
    }
}

impl ClassPolicy for Sandbox {
    fn check_class_name(&self, class_name: &str) -> BridgeResult<()> {
        Sandbox::check_class_name(self, class_name)
    }

    fn check_class_method(&self, class_name: &str, method_name: &str) -> BridgeResult<()> {
        Sandbox::check_class_method(self, class_name, method_name)
    }
}
