//! Built-in Node Variants
//!
//! Directory, Module, Class, Instance and Function, plus the error
//! placeholder attached when a child fails to construct. Traversal treats
//! every variant uniformly through the collector/item roles; nothing here is
//! special-cased by the orchestrator.

use std::fs;
use std::path::Path;
use std::rc::{Rc, Weak};

use log::debug;

use super::error::{CollectError, CollectResult};
use super::failure::FailureReport;
use super::filter::basename;
use super::node::{Node, NodeCore, NodeRef, NodeRole, NodeType};
use super::python::{self, PyFunction};
use super::session::{Admission, SessionCore};

fn session_of(core: &NodeCore) -> CollectResult<Rc<SessionCore>> {
    core.session().ok_or(CollectError::SessionClosed)
}

/// Collector for a filesystem directory: children are the admitted, resolved
/// immediate entries.
pub struct DirectoryCollector {
    core: NodeCore,
}

impl DirectoryCollector {
    /// Create a directory collector under an existing parent; usable from
    /// `resolve_directory` hooks to preserve default recursion behavior.
    pub fn new(path: &Path, parent: &NodeRef) -> NodeRef {
        NodeRef::new(Self { core: NodeCore::child_of(parent, basename(path), Some(path)) })
    }

    pub(crate) fn root(path: &Path, session: Weak<SessionCore>) -> NodeRef {
        let name = match basename(path) {
            "" => path.display().to_string(),
            name => name.to_string(),
        };
        NodeRef::new(Self {
            core: NodeCore::new(name, Some(path.to_path_buf()), None, session),
        })
    }
}

impl Node for DirectoryCollector {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Directory
    }

    fn role(&self) -> NodeRole {
        NodeRole::Collector
    }

    fn collect(&self, myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        let session = session_of(&self.core)?;
        let path = match self.core.path() {
            Some(path) => path,
            None => return Err(CollectError::io("<directory>", "collector has no path")),
        };

        let entries = fs::read_dir(path).map_err(|e| CollectError::from_io(path, &e))?;
        let mut children = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CollectError::from_io(path, &e))?;
            let child_path = entry.path();
            match session.admit(&child_path) {
                Ok(Admission::Admit) => match session.resolve_path(&child_path, myself) {
                    Ok(Some(node)) => children.push(node),
                    Ok(None) => {}
                    Err(error) => {
                        children.push(session.attach_error_child(myself, &child_path, error))
                    }
                },
                Ok(Admission::Skip(reason)) => {
                    debug!("Skipping {}: {}", child_path.display(), reason);
                }
                Err(error) => {
                    children.push(session.attach_error_child(myself, &child_path, error))
                }
            }
        }
        Ok(children)
    }
}

/// Collector for a recognized test file: children are the test-bearing
/// definitions found by scanning the source.
pub struct ModuleCollector {
    core: NodeCore,
}

impl ModuleCollector {
    /// Create a module collector under an existing parent; usable from
    /// `resolve_file` hooks.
    pub fn new(path: &Path, parent: &NodeRef) -> NodeRef {
        NodeRef::new(Self { core: NodeCore::child_of(parent, basename(path), Some(path)) })
    }
}

impl Node for ModuleCollector {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Module
    }

    fn role(&self) -> NodeRole {
        NodeRole::Collector
    }

    fn collect(&self, myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        let session = session_of(&self.core)?;
        let path = match self.core.path() {
            Some(path) => path,
            None => return Err(CollectError::io("<module>", "collector has no path")),
        };

        let outline = python::load_outline(path)?;
        let config = session.config();
        let mut children = Vec::new();

        for function in &outline.functions {
            if function.name.starts_with(&config.function_prefix) {
                children.push(FunctionItem::new(&function.name, myself));
            }
        }
        for class in &outline.classes {
            if !class.name.starts_with(&config.class_prefix) {
                continue;
            }
            if class.has_init {
                debug!(
                    "Skipping class {} in {}: defines __init__",
                    class.name,
                    path.display()
                );
                continue;
            }
            children.push(ClassCollector::new(&class.name, class.methods.clone(), myself));
        }
        Ok(children)
    }

    /// Load failures of the artifact itself render as a single located line
    /// instead of the generic trace.
    fn repr_failure(&self, error: &CollectError) -> Option<String> {
        match error {
            CollectError::Load { path, line, message, source_line } => {
                let mut rendered = String::new();
                if let Some(source) = source_line {
                    rendered.push_str(source);
                    rendered.push('\n');
                }
                rendered.push_str(&format!("{}:{}: {}", path.display(), line, message));
                Some(rendered)
            }
            _ => None,
        }
    }
}

/// Collector for a test class; yields a synthetic instance layer to mirror
/// per-instance setup semantics.
pub struct ClassCollector {
    core: NodeCore,
    methods: Vec<PyFunction>,
}

impl ClassCollector {
    pub(crate) fn new(name: &str, methods: Vec<PyFunction>, parent: &NodeRef) -> NodeRef {
        NodeRef::new(Self { core: NodeCore::child_of(parent, name, None), methods })
    }
}

impl Node for ClassCollector {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Class
    }

    fn role(&self) -> NodeRole {
        NodeRole::Collector
    }

    fn collect(&self, myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        Ok(vec![InstanceCollector::new(self.methods.clone(), myself)])
    }
}

/// Synthetic per-instance collector between a class and its methods.
/// Transparent to identity: it contributes no address segment.
pub struct InstanceCollector {
    core: NodeCore,
    methods: Vec<PyFunction>,
}

impl InstanceCollector {
    pub(crate) fn new(methods: Vec<PyFunction>, parent: &NodeRef) -> NodeRef {
        NodeRef::new(Self { core: NodeCore::child_of(parent, "()", None), methods })
    }
}

impl Node for InstanceCollector {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Instance
    }

    fn role(&self) -> NodeRole {
        NodeRole::Collector
    }

    fn id_segment(&self) -> Option<&str> {
        None
    }

    fn collect(&self, myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        let session = session_of(&self.core)?;
        let prefix = session.config().function_prefix.clone();
        Ok(self
            .methods
            .iter()
            .filter(|method| method.name.starts_with(&prefix))
            .map(|method| FunctionItem::new(&method.name, myself))
            .collect())
    }
}

/// Terminal item for one test function or method
pub struct FunctionItem {
    core: NodeCore,
}

impl FunctionItem {
    /// Create a function item under an existing parent; usable by custom
    /// collectors emitting their own leaf items.
    pub fn new(name: &str, parent: &NodeRef) -> NodeRef {
        NodeRef::new(Self { core: NodeCore::child_of(parent, name, None) })
    }
}

impl Node for FunctionItem {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Function
    }

    fn role(&self) -> NodeRole {
        NodeRole::Item
    }
}

/// Placeholder item standing in for a child whose construction failed,
/// keeping the failure visible in its parent's child sequence.
pub struct ErrorNode {
    core: NodeCore,
    report: Rc<FailureReport>,
}

impl ErrorNode {
    pub(crate) fn new(path: &Path, parent: &NodeRef, report: Rc<FailureReport>) -> NodeRef {
        NodeRef::new(Self {
            core: NodeCore::child_of(parent, basename(path), Some(path)),
            report,
        })
    }
}

impl Node for ErrorNode {
    fn core(&self) -> &NodeCore {
        &self.core
    }

    fn node_type(&self) -> NodeType {
        NodeType::Error
    }

    fn role(&self) -> NodeRole {
        NodeRole::Item
    }

    fn failure_report(&self) -> Option<Rc<FailureReport>> {
        Some(Rc::clone(&self.report))
    }
}
