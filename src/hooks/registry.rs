//! Hook Registry
//!
//! Ordered registration and dispatch of collection hooks. Registration order
//! is preserved; resolution dispatch walks it in reverse so the most recently
//! registered hook wins, mirroring override intent.

use std::path::Path;
use std::rc::Rc;

use log::debug;

use crate::collect::config::CollectConfig;
use crate::collect::node::NodeRef;

use super::error::{HookError, HookResult};
use super::traits::{CollectHook, ConfigureContext};

/// Registry of collection hooks
#[derive(Default)]
pub struct HookRegistry {
    hooks: Vec<Rc<dyn CollectHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self { hooks: Vec::new() }
    }

    /// Register a hook; names must be unique
    pub fn register(&mut self, hook: Rc<dyn CollectHook>) -> HookResult<()> {
        let name = hook.name().to_string();
        if self.hooks.iter().any(|h| h.name() == name) {
            return Err(HookError::already_registered(name));
        }
        debug!("Registered collection hook: {}", name);
        self.hooks.push(hook);
        Ok(())
    }

    /// Register a concrete hook value
    pub fn register_hook<H: CollectHook + 'static>(&mut self, hook: H) -> HookResult<()> {
        self.register(Rc::new(hook))
    }

    /// Registered hook names in registration order
    pub fn list_hooks(&self) -> Vec<String> {
        self.hooks.iter().map(|h| h.name().to_string()).collect()
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run every hook's configure pass, in registration order
    pub(crate) fn run_configure(&self, ctx: &mut ConfigureContext<'_>) {
        for hook in &self.hooks {
            hook.configure(ctx);
        }
    }

    /// Ask hooks whether to skip a path; short-circuits on the first true
    /// answer, evaluated in registration order
    pub(crate) fn dispatch_ignore_collect(
        &self,
        path: &Path,
        config: &CollectConfig,
    ) -> HookResult<Option<String>> {
        for hook in self.hooks.iter() {
            let ignored = hook
                .ignore_collect(path, config)
                .map_err(|e| e.attributed_to(hook.name()))?;
            if ignored {
                return Ok(Some(hook.name().to_string()));
            }
        }
        Ok(None)
    }

    /// First non-null file resolution, most recently registered first
    pub(crate) fn dispatch_resolve_file(
        &self,
        path: &Path,
        parent: &NodeRef,
    ) -> HookResult<Option<NodeRef>> {
        for hook in self.hooks.iter().rev() {
            if let Some(node) = hook
                .resolve_file(path, parent)
                .map_err(|e| e.attributed_to(hook.name()))?
            {
                debug!("Hook '{}' resolved file {}", hook.name(), path.display());
                return Ok(Some(node));
            }
        }
        Ok(None)
    }

    /// First non-null directory resolution, most recently registered first
    pub(crate) fn dispatch_resolve_directory(
        &self,
        path: &Path,
        parent: &NodeRef,
    ) -> HookResult<Option<NodeRef>> {
        for hook in self.hooks.iter().rev() {
            if let Some(node) = hook
                .resolve_directory(path, parent)
                .map_err(|e| e.attributed_to(hook.name()))?
            {
                debug!("Hook '{}' resolved directory {}", hook.name(), path.display());
                return Ok(Some(node));
            }
        }
        Ok(None)
    }
}
