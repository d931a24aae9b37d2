//! Collection Hook Interface
//!
//! The fixed extension-point set consumed by the collection engine. Hooks are
//! plain registered callbacks; dispatch is an ordered iteration with
//! first-non-null-wins semantics, most recently registered first.

use std::path::Path;

use crate::collect::config::CollectConfig;
use crate::collect::filter::ScopedExclusions;
use crate::collect::node::NodeRef;

use super::error::HookResult;

/// Configure-time context handed to every hook before traversal starts.
///
/// This is the one documented mutation path for the scoped exclusion lists;
/// hooks must not mutate filter state during dispatch.
pub struct ConfigureContext<'a> {
    pub config: &'a CollectConfig,
    pub exclusions: &'a mut ScopedExclusions,
}

impl<'a> ConfigureContext<'a> {
    /// Check a boolean-style option flag from the configuration
    pub fn flag(&self, key: &str) -> bool {
        self.config.flag(key)
    }
}

/// Extension interface for customizing discovery.
///
/// Every method has a neutral default so implementations only override the
/// dispatch points they care about.
pub trait CollectHook {
    /// Registry key; also used to attribute extension failures
    fn name(&self) -> &str;

    /// Invoked once at session construction, in registration order
    fn configure(&self, _ctx: &mut ConfigureContext<'_>) {}

    /// Return true to skip this path before node resolution
    fn ignore_collect(&self, _path: &Path, _config: &CollectConfig) -> HookResult<bool> {
        Ok(false)
    }

    /// Produce a node for an admitted file path, or None to pass
    fn resolve_file(&self, _path: &Path, _parent: &NodeRef) -> HookResult<Option<NodeRef>> {
        Ok(None)
    }

    /// Produce a collector for an admitted directory path, or None to pass.
    /// Never consulted for the traversal root.
    fn resolve_directory(&self, _path: &Path, _parent: &NodeRef) -> HookResult<Option<NodeRef>> {
        Ok(None)
    }
}
