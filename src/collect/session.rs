//! Collection Session
//!
//! The orchestrator: owns the configuration, hook registry, admission filter
//! and failure reports for one collection run, and drives traversal from the
//! root directory collector. A session is the unit of isolation; it is
//! single-threaded and nothing in it is shared across concurrent runs.

use std::cell::RefCell;
use std::fs;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::hooks::{ConfigureContext, HookError, HookRegistry};

use super::config::CollectConfig;
use super::error::{CollectError, CollectResult};
use super::failure::FailureReport;
use super::filter::{GlobSet, PathFilter, ScopedExclusions, SkipReason};
use super::identity;
use super::node::{NodeRef, NodeRole};
use super::nodes::{DirectoryCollector, ErrorNode, ModuleCollector};

/// Outcome of the admission check for a candidate path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Admit,
    Skip(SkipReason),
}

/// Shared per-session state reachable from every node
pub struct SessionCore {
    config: CollectConfig,
    hooks: HookRegistry,
    filter: PathFilter,
    file_globs: GlobSet,
    exclusions: RefCell<ScopedExclusions>,
    reports: RefCell<Vec<Rc<FailureReport>>>,
}

impl SessionCore {
    pub fn config(&self) -> &CollectConfig {
        &self.config
    }

    /// Apply admission rules 1–4 to a candidate path
    pub(crate) fn admit(&self, path: &Path) -> CollectResult<Admission> {
        {
            let exclusions = self.exclusions.borrow();
            if let ControlFlow::Break(reason) = self.filter.check_static(path, &exclusions) {
                return Ok(Admission::Skip(reason));
            }
        }
        match self.hooks.dispatch_ignore_collect(path, &self.config) {
            Ok(Some(hook)) => Ok(Admission::Skip(SkipReason::Hook(hook))),
            Ok(None) => Ok(Admission::Admit),
            Err(error) => Err(self.hook_error(path, error)),
        }
    }

    /// Resolve an admitted path into a node: hooks first, then built-in
    /// defaults. Returns `None` for files no rule recognizes.
    pub(crate) fn resolve_path(
        &self,
        path: &Path,
        parent: &NodeRef,
    ) -> CollectResult<Option<NodeRef>> {
        if path.is_dir() {
            return match self.hooks.dispatch_resolve_directory(path, parent) {
                Ok(Some(node)) => Ok(Some(node)),
                Ok(None) => Ok(Some(DirectoryCollector::new(path, parent))),
                Err(error) => Err(self.hook_error(path, error)),
            };
        }
        match self.hooks.dispatch_resolve_file(path, parent) {
            Ok(Some(node)) => Ok(Some(node)),
            Ok(None) => {
                if self.file_globs.is_match(super::filter::basename(path)) {
                    Ok(Some(ModuleCollector::new(path, parent)))
                } else {
                    Ok(None)
                }
            }
            Err(error) => Err(self.hook_error(path, error)),
        }
    }

    /// Collect a node's children: memoized, failure-wrapped, sorted purely
    /// by display name with no type grouping.
    pub(crate) fn collect_node(&self, node: &NodeRef) -> Vec<NodeRef> {
        if node.role() == NodeRole::Item {
            return Vec::new();
        }
        if let Some(cached) = node.core().cached_children() {
            return cached;
        }
        let mut children = match node.run_collect() {
            Ok(children) => children,
            Err(error) => {
                self.capture_for_node(node, error);
                Vec::new()
            }
        };
        children.sort_by(|a, b| a.name().cmp(b.name()));
        node.core().store_children(children.clone());
        children
    }

    /// Capture a failure raised by a node's own collection step
    pub(crate) fn capture_for_node(&self, node: &NodeRef, error: CollectError) -> Rc<FailureReport> {
        let rendered_override = node.repr_failure(&error);
        let node_id = identity::node_id(node);
        let path = node.path().map(Path::to_path_buf);
        self.capture(node_id, path, error, rendered_override)
    }

    /// Capture a child-construction failure and return the placeholder node
    /// that keeps it visible in the parent's child sequence.
    pub(crate) fn attach_error_child(
        &self,
        parent: &NodeRef,
        path: &Path,
        error: CollectError,
    ) -> NodeRef {
        let node_id =
            identity::child_fs_id(&identity::node_id(parent), super::filter::basename(path));
        let report = self.capture(node_id, Some(path.to_path_buf()), error, None);
        ErrorNode::new(path, parent, report)
    }

    fn capture(
        &self,
        node_id: String,
        path: Option<PathBuf>,
        error: CollectError,
        rendered_override: Option<String>,
    ) -> Rc<FailureReport> {
        warn!("Collection failure at '{}': {}", node_id, error);
        let report = Rc::new(FailureReport::from_error(node_id, path, &error, rendered_override));
        self.reports.borrow_mut().push(Rc::clone(&report));
        report
    }

    fn hook_error(&self, path: &Path, error: HookError) -> CollectError {
        CollectError::hook(
            error.hook_name().unwrap_or("<unnamed>"),
            path,
            error.message(),
        )
    }
}

/// One collection run over a directory tree
pub struct Session {
    core: Rc<SessionCore>,
    root: NodeRef,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

impl Session {
    /// Build a session: validates configuration and root, runs every hook's
    /// configure pass, and creates the root directory collector.
    pub fn new(config: CollectConfig, hooks: HookRegistry) -> CollectResult<Session> {
        config.validate()?;

        let metadata = fs::metadata(&config.root)
            .map_err(|e| CollectError::invalid_root(&config.root, e.to_string()))?;
        if !metadata.is_dir() {
            return Err(CollectError::invalid_root(&config.root, "not a directory"));
        }

        let filter = PathFilter::from_config(&config)?;
        let file_globs = GlobSet::compile(&config.file_patterns)?;

        let mut exclusions = ScopedExclusions::new();
        {
            let mut ctx = ConfigureContext { config: &config, exclusions: &mut exclusions };
            hooks.run_configure(&mut ctx);
        }

        info!("Collection session rooted at {}", config.root.display());
        let core = Rc::new(SessionCore {
            config,
            hooks,
            filter,
            file_globs,
            exclusions: RefCell::new(exclusions),
            reports: RefCell::new(Vec::new()),
        });
        let root = DirectoryCollector::root(&core.config.root, Rc::downgrade(&core));
        Ok(Session { core, root })
    }

    /// The root directory collector
    pub fn root(&self) -> NodeRef {
        self.root.clone()
    }

    pub fn config(&self) -> &CollectConfig {
        self.core.config()
    }

    /// Ordered immediate children of a collector; empty for items.
    ///
    /// Children are computed once per node and memoized for the session's
    /// lifetime; failures are captured as reports rather than propagated.
    pub fn collect(&self, node: &NodeRef) -> Vec<NodeRef> {
        self.core.collect_node(node)
    }

    /// Depth-first traversal yielding every leaf item reachable from the
    /// root, error placeholders included.
    pub fn collect_all(&self) -> Vec<NodeRef> {
        let mut items = Vec::new();
        self.walk(&self.root, &mut items);
        debug!("Collected {} items", items.len());
        items
    }

    fn walk(&self, node: &NodeRef, items: &mut Vec<NodeRef>) {
        if node.role() == NodeRole::Item {
            items.push(node.clone());
            return;
        }
        for child in self.collect(node) {
            self.walk(&child, items);
        }
    }

    /// The stable address of a node relative to the collection root
    pub fn getid(&self, node: &NodeRef) -> String {
        identity::node_id(node)
    }

    /// Re-resolve an address against the current tree.
    ///
    /// Filesystem components are resolved directly when ambient discovery
    /// filtered them out, so explicitly targeted paths inside excluded
    /// directories still collect. Unknown addresses yield an empty result.
    pub fn getbyid(&self, id: &str) -> Vec<NodeRef> {
        let (fs_parts, logical) = identity::parse_id(id);

        let mut current = self.root.clone();
        let mut current_path = self.core.config.root.clone();
        for part in &fs_parts {
            current_path = current_path.join(part);
            let children = self.collect(&current);
            if let Some(found) = children.iter().find(|c| c.name() == part.as_str()) {
                current = found.clone();
                continue;
            }
            if !current_path.exists() {
                return Vec::new();
            }
            // Targeted resolution bypasses ambient exclusion rules
            match self.core.resolve_path(&current_path, &current) {
                Ok(Some(node)) => current = node,
                _ => return Vec::new(),
            }
        }

        let mut matches = vec![current];
        for name in &logical {
            let mut next = Vec::new();
            for node in &matches {
                self.match_segment(node, name, &mut next);
            }
            if next.is_empty() {
                return Vec::new();
            }
            matches = next;
        }
        matches
    }

    fn match_segment(&self, node: &NodeRef, name: &str, out: &mut Vec<NodeRef>) {
        for child in self.collect(node) {
            match child.id_segment() {
                // Synthetic layers are transparent to addressing
                None => self.match_segment(&child, name, out),
                Some(segment) if segment == name => out.push(child.clone()),
                Some(_) => {}
            }
        }
    }

    /// Failure reports captured so far, in capture order
    pub fn reports(&self) -> Vec<Rc<FailureReport>> {
        self.core.reports.borrow().clone()
    }

    /// The report captured for a node address, if any
    pub fn report_for(&self, node_id: &str) -> Option<Rc<FailureReport>> {
        self.core
            .reports
            .borrow()
            .iter()
            .find(|report| report.node_id == node_id)
            .map(Rc::clone)
    }
}
