//! Path lookups over a parsed `report.xml`.
//!
//! Supports the small ElementTree-style subset the report reader needs:
//! - `a/b/c` walks child elements starting at the document root element
//! - `.//a/b` matches `a` anywhere below the root element, then walks children
//!
//! Lookups never fail. A missing node is reported through the
//! [`NOT_AVAILABLE`] sentinel by [`field_text`].

use roxmltree::{Document, Node};

/// Sentinel returned by [`field_text`] when the path matches nothing.
pub const NOT_AVAILABLE: &str = "N/A";

/// A parsed element path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlPath {
    /// First step may match at any depth below the root element.
    anywhere: bool,
    /// Element names, outermost first.
    steps: Vec<String>,
}

impl XmlPath {
    /// Parse a path expression such as `creator/program` or `.//feature_file/count`.
    pub fn new(expr: &str) -> Self {
        let (anywhere, rest) = match expr.strip_prefix(".//") {
            Some(rest) => (true, rest),
            None => (false, expr.strip_prefix("./").unwrap_or(expr)),
        };

        let steps = rest
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        Self { anywhere, steps }
    }

    /// Whether the first step matches at any depth.
    pub fn is_anywhere(&self) -> bool {
        self.anywhere
    }

    /// Element names in the path.
    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    /// All matching elements below `root`, in document order.
    pub fn select<'a, 'input>(&self, root: Node<'a, 'input>) -> Vec<Node<'a, 'input>> {
        let Some((first, rest)) = self.steps.split_first() else {
            return Vec::new();
        };

        let mut matched: Vec<Node<'a, 'input>> = if self.anywhere {
            root.descendants()
                .skip(1)
                .filter(|n| is_named(n, first))
                .collect()
        } else {
            root.children().filter(|n| is_named(n, first)).collect()
        };

        for step in rest {
            matched = matched
                .into_iter()
                .flat_map(|n| n.children().filter(move |c| is_named(c, step)))
                .collect();
        }

        matched
    }

    /// First matching element below `root`.
    pub fn first<'a, 'input>(&self, root: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
        self.select(root).into_iter().next()
    }
}

fn is_named(node: &Node<'_, '_>, name: &str) -> bool {
    node.is_element() && node.tag_name().name() == name
}

/// Text of a node, with "no text" normalized to the empty string.
pub fn node_text(node: Node<'_, '_>) -> String {
    node.text().unwrap_or_default().to_string()
}

/// Text of the first node matching `path`, or [`NOT_AVAILABLE`].
///
/// A node that matches but holds no text yields `""`.
pub fn field_text(doc: &Document<'_>, path: &str) -> String {
    XmlPath::new(path)
        .first(doc.root_element())
        .map(node_text)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
