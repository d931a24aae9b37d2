//! Node Identity
//!
//! Deterministic, round-trippable node addresses: the root-relative
//! filesystem part joined with `/`, then the logical name chain below the
//! file level joined with `::`. Synthetic layers contribute no segment.

use super::node::NodeRef;

/// Separator between logical segments of an address
pub const SEP: &str = "::";

/// Compute the stable address of a node relative to its collection root
pub fn node_id(node: &NodeRef) -> String {
    let chain = node.chain();
    let mut fs_parts: Vec<String> = Vec::new();
    let mut logical: Vec<String> = Vec::new();

    for n in chain.iter().skip(1) {
        let segment = match n.id_segment() {
            Some(segment) => segment.to_string(),
            None => continue,
        };
        if logical.is_empty() && n.path().is_some() {
            fs_parts.push(segment);
        } else {
            logical.push(segment);
        }
    }

    let mut id = fs_parts.join("/");
    for part in logical {
        id.push_str(SEP);
        id.push_str(&part);
    }
    id
}

/// Address of a filesystem-level child of an addressed node
pub(crate) fn child_fs_id(parent_id: &str, name: &str) -> String {
    if parent_id.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent_id, name)
    }
}

/// Split an address into its filesystem components and logical segments
pub fn parse_id(id: &str) -> (Vec<String>, Vec<String>) {
    if id.is_empty() {
        return (Vec::new(), Vec::new());
    }
    let mut sections = id.split(SEP);
    let fs = sections.next().unwrap_or("");
    let fs_parts = if fs.is_empty() {
        Vec::new()
    } else {
        fs.split('/').map(str::to_string).collect()
    };
    let logical = sections.map(str::to_string).collect();
    (fs_parts, logical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_plain_path() {
        let (fs, logical) = parse_id("sub/dir/test_x.py");
        assert_eq!(fs, vec!["sub", "dir", "test_x.py"]);
        assert!(logical.is_empty());
    }

    #[test]
    fn test_parse_with_logical_segments() {
        let (fs, logical) = parse_id("sub/test_x.py::TestClass::test_method");
        assert_eq!(fs, vec!["sub", "test_x.py"]);
        assert_eq!(logical, vec!["TestClass", "test_method"]);
    }

    #[test]
    fn test_parse_empty_is_root() {
        let (fs, logical) = parse_id("");
        assert!(fs.is_empty());
        assert!(logical.is_empty());
    }

    #[test]
    fn test_child_fs_id() {
        assert_eq!(child_fs_id("", "sub"), "sub");
        assert_eq!(child_fs_id("sub", "test_x.py"), "sub/test_x.py");
    }

    fn format_id(fs: &[String], logical: &[String]) -> String {
        let mut id = fs.join("/");
        for part in logical {
            id.push_str(SEP);
            id.push_str(part);
        }
        id
    }

    proptest! {
        #[test]
        fn prop_format_parse_roundtrip(
            fs in proptest::collection::vec("[a-z][a-z0-9_]{0,8}(\\.py)?", 0..4),
            logical in proptest::collection::vec("[A-Za-z_][A-Za-z0-9_]{0,8}", 0..3),
        ) {
            let id = format_id(&fs, &logical);
            let (parsed_fs, parsed_logical) = parse_id(&id);
            if id.is_empty() {
                prop_assert!(parsed_fs.is_empty() && parsed_logical.is_empty());
            } else {
                prop_assert_eq!(parsed_fs, fs);
                prop_assert_eq!(parsed_logical, logical);
            }
        }
    }
}
