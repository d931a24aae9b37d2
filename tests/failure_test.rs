//! Failure Capture Integration Tests
//!
//! Covers structured failure reports: pruned traces for broken artifacts,
//! sibling isolation, variant-specific failure rendering with fallback, and
//! extension failures surfacing as placeholder children.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use tcollect::collect::failure::INTERNAL_FRAME_PREFIX;
use tcollect::collect::{
    CollectConfig, CollectError, CollectResult, Node, NodeCore, NodeRef, NodeRole, NodeType,
    Session,
};
use tcollect::hooks::{CollectHook, HookError, HookRegistry, HookResult};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create fixture directory");
    }
    fs::write(path, content).expect("Failed to write fixture file");
}

#[test]
fn test_broken_artifact_yields_one_pruned_report() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_broken.py", "def test_x(\n");

    let session = Session::new(CollectConfig::new(dir.path()), HookRegistry::new()).unwrap();
    let module = session.collect(&session.root()).remove(0);
    assert!(session.collect(&module).is_empty());

    let reports = session.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];

    assert_eq!(report.node_id, "test_broken.py");
    // The summary surfaces the original error text with its location
    assert!(report.summary.contains("'(' was never closed"), "summary: {}", report.summary);
    assert!(report.summary.contains("test_broken.py:1"));
    // The rendering carries no engine machinery markers
    assert!(
        !report.rendered.contains(INTERNAL_FRAME_PREFIX),
        "machinery leaked into rendering: {}",
        report.rendered
    );
    assert!(report.rendered.contains("'(' was never closed"));
}

#[test]
fn test_failing_sibling_does_not_block_collection() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_broken.py", "x = 'unterminated\n");
    write(dir.path(), "test_good.py", "def test_ok(): pass\n");

    let session = Session::new(CollectConfig::new(dir.path()), HookRegistry::new()).unwrap();
    let ids: Vec<String> =
        session.collect_all().iter().map(|item| session.getid(item)).collect();

    assert_eq!(ids, vec!["test_good.py::test_ok".to_string()]);
    assert_eq!(session.reports().len(), 1);
    assert_eq!(session.reports()[0].node_id, "test_broken.py");
}

/// Custom collector raising its own failure kind with a custom rendering
struct MyFile {
    core: NodeCore,
    kind: &'static str,
}

impl Node for MyFile {
    fn core(&self) -> &NodeCore {
        &self.core
    }
    fn node_type(&self) -> NodeType {
        NodeType::Custom("MyFile")
    }
    fn role(&self) -> NodeRole {
        NodeRole::Collector
    }
    fn collect(&self, _myself: &NodeRef) -> CollectResult<Vec<NodeRef>> {
        Err(CollectError::custom(self.kind, "collect blew up"))
    }
    fn repr_failure(&self, error: &CollectError) -> Option<String> {
        if error.custom_kind() == Some("my-error") {
            return Some("hello world".to_string());
        }
        None
    }
}

struct MyFileResolver {
    kind: &'static str,
}

impl CollectHook for MyFileResolver {
    fn name(&self) -> &str {
        "my-file-resolver"
    }
    fn resolve_file(&self, path: &Path, parent: &NodeRef) -> HookResult<Option<NodeRef>> {
        Ok(Some(NodeRef::new(MyFile {
            core: NodeCore::child_of(
                parent,
                path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
                Some(path),
            ),
            kind: self.kind,
        })))
    }
}

#[test]
fn test_custom_repr_failure_used_for_recognized_kind() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_thing.py", "import not_exists\n");

    let mut hooks = HookRegistry::new();
    hooks.register_hook(MyFileResolver { kind: "my-error" }).unwrap();

    let session = Session::new(CollectConfig::new(dir.path()), hooks).unwrap();
    let node = session.collect(&session.root()).remove(0);
    assert!(session.collect(&node).is_empty());

    let reports = session.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].rendered, "hello world");
    assert!(reports[0].summary.contains("collect blew up"));
}

#[test]
fn test_default_renderer_for_unrecognized_kind() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_thing.py", "import not_exists\n");

    let mut hooks = HookRegistry::new();
    hooks.register_hook(MyFileResolver { kind: "other-error" }).unwrap();

    let session = Session::new(CollectConfig::new(dir.path()), hooks).unwrap();
    let node = session.collect(&session.root()).remove(0);
    assert!(session.collect(&node).is_empty());

    let reports = session.reports();
    assert_eq!(reports.len(), 1);
    assert_ne!(reports[0].rendered, "hello world");
    assert!(reports[0].rendered.contains("other-error"));
    assert!(reports[0].rendered.contains("collect blew up"));
}

struct FailingResolver;

impl CollectHook for FailingResolver {
    fn name(&self) -> &str {
        "failing-resolver"
    }
    fn resolve_file(&self, path: &Path, _parent: &NodeRef) -> HookResult<Option<NodeRef>> {
        if path.extension().and_then(|e| e.to_str()) == Some("py") {
            return Err(HookError::failed("resolver exploded"));
        }
        Ok(None)
    }
}

#[test]
fn test_extension_failure_becomes_placeholder_child() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_one.py", "def test_1(): pass\n");

    let mut hooks = HookRegistry::new();
    hooks.register_hook(FailingResolver).unwrap();

    let session = Session::new(CollectConfig::new(dir.path()), hooks).unwrap();
    let children = session.collect(&session.root());

    // The failed child stays visible as an error placeholder item
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].node_type(), NodeType::Error);
    assert_eq!(children[0].role(), NodeRole::Item);
    assert_eq!(children[0].name(), "test_one.py");

    let report = children[0].failure_report().expect("placeholder carries its report");
    assert_eq!(report.node_id, "test_one.py");
    // The extension's failure is chained into the rendering, not elided
    assert!(report.rendered.contains("failing-resolver"));
    assert!(report.rendered.contains("resolver exploded"));
    assert!(!report.rendered.contains(INTERNAL_FRAME_PREFIX));

    assert_eq!(session.reports().len(), 1);
}

#[test]
fn test_extension_failure_does_not_block_siblings() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "test_one.py", "def test_1(): pass\n");
    write(dir.path(), "other.xyz", "data");

    struct PickyResolver;
    impl CollectHook for PickyResolver {
        fn name(&self) -> &str {
            "picky-resolver"
        }
        fn resolve_file(&self, path: &Path, _parent: &NodeRef) -> HookResult<Option<NodeRef>> {
            if path.extension().and_then(|e| e.to_str()) == Some("xyz") {
                return Err(HookError::failed("cannot deal with xyz"));
            }
            Ok(None)
        }
    }

    let mut hooks = HookRegistry::new();
    hooks.register_hook(PickyResolver).unwrap();

    let session = Session::new(CollectConfig::new(dir.path()), hooks).unwrap();
    let children = session.collect(&session.root());
    let names: Vec<&str> = children.iter().map(|c| c.name()).collect();

    // Sorted child sequence holds both the placeholder and the real module
    assert_eq!(names, vec!["other.xyz", "test_one.py"]);
    assert_eq!(children[0].node_type(), NodeType::Error);
    assert_eq!(children[1].node_type(), NodeType::Module);

    let ids: Vec<String> =
        session.collect_all().iter().map(|item| session.getid(item)).collect();
    assert!(ids.contains(&"test_one.py::test_1".to_string()));
}
