//! Display module for collect-only output
//!
//! Renders the collected tree, the failure report section and the summary
//! line for the CLI, in text (optionally colored) or JSON form.

use colored::Colorize;
use serde::Serialize;

use crate::collect::{FailureReport, NodeRef, NodeRole, NodeType, Session};

/// Compact single-line formatting for summary values
pub trait CompactFormat {
    fn to_compact_format(&self) -> String;
}

/// Counts of what a collection run produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectSummary {
    pub collectors: usize,
    pub items: usize,
    pub errors: usize,
}

impl CompactFormat for CollectSummary {
    fn to_compact_format(&self) -> String {
        format!(
            "Collectors: {} | Items: {} | Errors: {}",
            self.collectors, self.items, self.errors
        )
    }
}

/// Render the tree below each given node, two-space indent per depth
pub fn render_tree(session: &Session, roots: &[NodeRef]) -> String {
    let mut out = String::new();
    for node in roots {
        render_node(session, node, 0, &mut out);
    }
    out
}

fn render_node(session: &Session, node: &NodeRef, depth: usize, out: &mut String) {
    out.push_str(&"  ".repeat(depth));
    out.push_str(&format!("<{} '{}'>\n", node.node_type().label(), node.name()));
    for child in session.collect(node) {
        render_node(session, &child, depth + 1, out);
    }
}

/// Count collectors, items and captured failures under the given nodes
pub fn summarize(session: &Session, roots: &[NodeRef]) -> CollectSummary {
    let mut summary = CollectSummary { errors: session.reports().len(), ..Default::default() };
    for node in roots {
        count_node(session, node, &mut summary);
    }
    summary
}

fn count_node(session: &Session, node: &NodeRef, summary: &mut CollectSummary) {
    match node.role() {
        NodeRole::Item => {
            if node.node_type() != NodeType::Error {
                summary.items += 1;
            }
        }
        NodeRole::Collector => {
            summary.collectors += 1;
            for child in session.collect(node) {
                count_node(session, &child, summary);
            }
        }
    }
}

/// Render the failure report section; empty when nothing failed
pub fn render_reports(session: &Session) -> String {
    let reports = session.reports();
    if reports.is_empty() {
        return String::new();
    }

    let mut out = String::new();
    out.push_str(&format!("{}\n", "ERRORS".red().bold()));
    for report in reports {
        out.push_str(&format!("{} {}\n", "ERROR collecting".red(), report.node_id));
        out.push_str(&report.rendered);
        if !report.rendered.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

#[derive(Serialize)]
struct JsonNode {
    #[serde(rename = "type")]
    node_type: String,
    name: String,
    id: String,
    children: Vec<JsonNode>,
}

#[derive(Serialize)]
struct JsonOutput {
    tree: Vec<JsonNode>,
    reports: Vec<FailureReport>,
}

/// Serialize the collected tree and failure reports as pretty JSON
pub fn render_json(session: &Session, roots: &[NodeRef]) -> anyhow::Result<String> {
    let tree = roots.iter().map(|node| json_node(session, node)).collect();
    let reports = session.reports().iter().map(|r| (**r).clone()).collect();
    let output = JsonOutput { tree, reports };
    Ok(serde_json::to_string_pretty(&output)?)
}

fn json_node(session: &Session, node: &NodeRef) -> JsonNode {
    JsonNode {
        node_type: node.node_type().label().to_string(),
        name: node.name().to_string(),
        id: session.getid(node),
        children: session
            .collect(node)
            .iter()
            .map(|child| json_node(session, child))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    use crate::collect::CollectConfig;
    use crate::hooks::HookRegistry;

    fn fixture_session() -> (TempDir, Session) {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(
            dir.path().join("sub").join("test_x.py"),
            "def test_a(): pass\n\nclass TestGroup:\n    def test_b(self):\n        pass\n",
        )
        .unwrap();
        let session =
            Session::new(CollectConfig::new(dir.path()), HookRegistry::new()).unwrap();
        (dir, session)
    }

    #[test]
    fn test_render_tree_structure() {
        let (_dir, session) = fixture_session();
        let rendered = render_tree(&session, &[session.root()]);

        assert!(rendered.contains("<Directory 'sub'>"));
        assert!(rendered.contains("<Module 'test_x.py'>"));
        assert!(rendered.contains("<Class 'TestGroup'>"));
        assert!(rendered.contains("<Function 'test_a'>"));
        // Indentation grows with depth
        assert!(rendered.contains("\n  <Directory 'sub'>\n    <Module 'test_x.py'>"));
    }

    #[test]
    fn test_summary_counts() {
        let (_dir, session) = fixture_session();
        let summary = summarize(&session, &[session.root()]);

        // root + sub + module + class + instance collectors, two functions
        assert_eq!(summary.collectors, 5);
        assert_eq!(summary.items, 2);
        assert_eq!(summary.errors, 0);
        assert_eq!(summary.to_compact_format(), "Collectors: 5 | Items: 2 | Errors: 0");
    }

    #[test]
    fn test_render_reports_empty_when_clean() {
        let (_dir, session) = fixture_session();
        render_tree(&session, &[session.root()]);
        assert_eq!(render_reports(&session), "");
    }

    #[test]
    fn test_render_json_roundtrips() {
        let (_dir, session) = fixture_session();
        let json = render_json(&session, &[session.root()]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        let tree = value.get("tree").and_then(|t| t.as_array()).unwrap();
        assert_eq!(tree.len(), 1);
        let sub = &tree[0]["children"][0];
        assert_eq!(sub["type"], "Directory");
        assert_eq!(sub["name"], "sub");
        let module = &sub["children"][0];
        assert_eq!(module["id"], "sub/test_x.py");
        assert!(value.get("reports").and_then(|r| r.as_array()).unwrap().is_empty());
    }
}
