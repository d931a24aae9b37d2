//! Node Model
//!
//! The polymorphic collector/item tree. Nodes share a `NodeCore` (name, path,
//! parent link, owning session) and expose their behavior through the `Node`
//! trait. Handles are reference-counted `NodeRef`s whose equality and hashing
//! are defined by variant tag plus the display-name chain from the root, so
//! logically equal nodes from separate collection runs compare equal.

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::error::CollectResult;
use super::session::SessionCore;

/// Variant tag for a node.
///
/// Built-in variants are closed; extensions tag their own with `Custom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Directory,
    Module,
    Class,
    Instance,
    Function,
    Error,
    Custom(&'static str),
}

impl NodeType {
    /// Display label used in tree rendering
    pub fn label(&self) -> &'static str {
        match self {
            NodeType::Directory => "Directory",
            NodeType::Module => "Module",
            NodeType::Class => "Class",
            NodeType::Instance => "Instance",
            NodeType::Function => "Function",
            NodeType::Error => "Error",
            NodeType::Custom(name) => name,
        }
    }
}

/// Capability role of a node: exactly one of the two
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    Collector,
    Item,
}

/// Shared base state carried by every node
pub struct NodeCore {
    name: String,
    path: Option<PathBuf>,
    parent: Option<WeakNode>,
    session: Weak<SessionCore>,
    children: RefCell<Option<Vec<NodeRef>>>,
}

impl NodeCore {
    pub(crate) fn new(
        name: impl Into<String>,
        path: Option<PathBuf>,
        parent: Option<&NodeRef>,
        session: Weak<SessionCore>,
    ) -> Self {
        Self {
            name: name.into(),
            path,
            parent: parent.map(NodeRef::downgrade),
            session,
            children: RefCell::new(None),
        }
    }

    /// Create base state for a child of an existing node.
    ///
    /// This is the construction path for extension-defined variants: the
    /// session reference is inherited from the parent.
    pub fn child_of(parent: &NodeRef, name: impl Into<String>, path: Option<&Path>) -> Self {
        Self::new(
            name,
            path.map(Path::to_path_buf),
            Some(parent),
            parent.core().session.clone(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Resolve the parent link, if any
    pub fn parent(&self) -> Option<NodeRef> {
        self.parent.as_ref().and_then(|weak| weak.upgrade()).map(NodeRef)
    }

    pub(crate) fn session(&self) -> Option<Rc<SessionCore>> {
        self.session.upgrade()
    }

    pub(crate) fn cached_children(&self) -> Option<Vec<NodeRef>> {
        self.children.borrow().clone()
    }

    pub(crate) fn store_children(&self, children: Vec<NodeRef>) {
        *self.children.borrow_mut() = Some(children);
    }
}

/// Behavior shared by all node variants, built-in and extension-defined
pub trait Node {
    /// Access the shared base state
    fn core(&self) -> &NodeCore;

    /// The concrete variant tag
    fn node_type(&self) -> NodeType;

    /// The capability role; a node is never both
    fn role(&self) -> NodeRole;

    /// Variant ancestry check used by `getparent`.
    ///
    /// The default is exact tag equality; extension variants may also answer
    /// true for a built-in tag to be found where that built-in is expected.
    fn is_type(&self, ty: NodeType) -> bool {
        self.node_type() == ty
    }

    /// Produce this collector's immediate children.
    ///
    /// Items keep the default empty implementation. Invoked through
    /// `Session::collect`, which memoizes, sorts and failure-wraps the result.
    fn collect(&self, _myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        Ok(Vec::new())
    }

    /// The segment this node contributes to its address, or `None` for
    /// synthetic layers that are transparent to identity.
    fn id_segment(&self) -> Option<&str> {
        Some(self.core().name())
    }

    /// Variant-specific rendering for failure kinds the variant recognizes.
    ///
    /// Returning `None` falls back to the built-in pruned trace renderer.
    fn repr_failure(&self, _error: &super::error::CollectError) -> Option<String> {
        None
    }

    /// The captured failure this node stands in for, if it is an error
    /// placeholder.
    fn failure_report(&self) -> Option<std::rc::Rc<super::failure::FailureReport>> {
        None
    }
}

/// Weak handle used for parent links
pub type WeakNode = Weak<dyn Node>;

/// Shared handle to a node in the collection tree
#[derive(Clone)]
pub struct NodeRef(Rc<dyn Node>);

/// Identity key: variant tag plus display-name chain from the root
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    ty: NodeType,
    names: Vec<String>,
}

impl NodeRef {
    /// Wrap a concrete node into a shared handle
    pub fn new<N: Node + 'static>(node: N) -> Self {
        NodeRef(Rc::new(node))
    }

    pub fn core(&self) -> &NodeCore {
        self.0.core()
    }

    pub fn name(&self) -> &str {
        self.0.core().name()
    }

    pub fn path(&self) -> Option<&Path> {
        self.0.core().path()
    }

    pub fn node_type(&self) -> NodeType {
        self.0.node_type()
    }

    pub fn role(&self) -> NodeRole {
        self.0.role()
    }

    pub fn is_type(&self, ty: NodeType) -> bool {
        self.0.is_type(ty)
    }

    pub fn id_segment(&self) -> Option<&str> {
        self.0.id_segment()
    }

    pub fn failure_report(&self) -> Option<Rc<super::failure::FailureReport>> {
        self.0.failure_report()
    }

    pub fn parent(&self) -> Option<NodeRef> {
        self.0.core().parent()
    }

    /// Walk ancestors starting at self, returning the first node whose
    /// variant is-a `ty`. Returns self when self already matches.
    pub fn getparent(&self, ty: NodeType) -> Option<NodeRef> {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if node.is_type(ty) {
                return Some(node);
            }
            current = node.parent();
        }
        None
    }

    /// The chain of nodes from the root down to self, inclusive
    pub fn chain(&self) -> Vec<NodeRef> {
        let mut chain = vec![self.clone()];
        let mut current = self.parent();
        while let Some(node) = current {
            current = node.parent();
            chain.push(node);
        }
        chain.reverse();
        chain
    }

    /// Identity key deciding equality and hashing
    pub fn key(&self) -> NodeKey {
        NodeKey {
            ty: self.node_type(),
            names: self.chain().iter().map(|n| n.name().to_string()).collect(),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakNode {
        Rc::downgrade(&self.0)
    }

    pub(crate) fn run_collect(&self) -> CollectResult<Vec<NodeRef>> {
        self.0.collect(self)
    }

    pub(crate) fn repr_failure(&self, error: &super::error::CollectError) -> Option<String> {
        self.0.repr_failure(error)
    }

    pub(crate) fn same_instance(&self, other: &NodeRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.same_instance(other) || self.key() == other.key()
    }
}

impl Eq for NodeRef {}

impl Hash for NodeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} '{}'>", self.node_type().label(), self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain {
        core: NodeCore,
        ty: NodeType,
        role: NodeRole,
        transparent: bool,
    }

    impl Node for Plain {
        fn core(&self) -> &NodeCore {
            &self.core
        }
        fn node_type(&self) -> NodeType {
            self.ty
        }
        fn role(&self) -> NodeRole {
            self.role
        }
        fn id_segment(&self) -> Option<&str> {
            if self.transparent {
                None
            } else {
                Some(self.core.name())
            }
        }
    }

    fn detached(name: &str, ty: NodeType, role: NodeRole, parent: Option<&NodeRef>) -> NodeRef {
        NodeRef::new(Plain {
            core: NodeCore::new(name, None, parent, Weak::new()),
            ty,
            role,
            transparent: ty == NodeType::Instance,
        })
    }

    fn sample_chain() -> (NodeRef, NodeRef, NodeRef, NodeRef) {
        let module = detached("test_mod.py", NodeType::Module, NodeRole::Collector, None);
        let class = detached("TestClass", NodeType::Class, NodeRole::Collector, Some(&module));
        let instance = detached("()", NodeType::Instance, NodeRole::Collector, Some(&class));
        let function = detached("test_foo", NodeType::Function, NodeRole::Item, Some(&instance));
        (module, class, instance, function)
    }

    #[test]
    fn test_equality_by_variant_and_chain() {
        let (_m1, _c1, _i1, f1) = sample_chain();
        let (_m2, _c2, _i2, f2) = sample_chain();
        assert_eq!(f1, f2);

        let (m, _c, _i, f) = sample_chain();
        assert_ne!(f, m);
        assert_ne!(m, f);
    }

    #[test]
    fn test_hash_consistent_with_equality() {
        use std::collections::hash_map::DefaultHasher;

        let (_m1, _c1, _i1, f1) = sample_chain();
        let (_m2, _c2, _i2, f2) = sample_chain();

        let hash = |n: &NodeRef| {
            let mut h = DefaultHasher::new();
            n.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&f1), hash(&f2));
    }

    #[test]
    fn test_same_chain_different_variant_unequal() {
        let a = detached("thing", NodeType::Function, NodeRole::Item, None);
        let b = detached("thing", NodeType::Custom("Special"), NodeRole::Item, None);
        assert_ne!(a, b);
        assert_ne!(b, a);
    }

    #[test]
    fn test_getparent_skips_instance_layer() {
        let (module, class, _instance, function) = sample_chain();

        assert_eq!(function.getparent(NodeType::Function), Some(function.clone()));
        assert_eq!(function.getparent(NodeType::Class), Some(class));
        assert_eq!(function.getparent(NodeType::Module), Some(module));
        assert_eq!(function.getparent(NodeType::Directory), None);
    }

    #[test]
    fn test_chain_order_is_root_first() {
        let (_module, _class, _instance, function) = sample_chain();
        let chain = function.chain();
        let names: Vec<&str> = chain.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["test_mod.py", "TestClass", "()", "test_foo"]);
    }

    #[test]
    fn test_debug_rendering() {
        let (module, _c, _i, function) = sample_chain();
        assert_eq!(format!("{:?}", module), "<Module 'test_mod.py'>");
        assert_eq!(format!("{:?}", function), "<Function 'test_foo'>");
    }
}
