// Document tree - Owned element tree shared by the reader and the assembler
// Every lookup goes through `child` or `resolve`; absence is `None`, never an error

use std::str::FromStr;

/// One step of a path through the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathSegment<'a> {
    /// Positional child (0-indexed)
    ByIndex(usize),

    /// First child with the given tag
    ByTag(&'a str),
}

/// An element with ordered attributes and children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

impl Node {
    /// Create an empty element
    pub fn new(tag: impl Into<String>) -> Self {
        Node {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Set an attribute, replacing an existing value in place
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl ToString) {
        let name = name.into();
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The `Value` attribute, which carries almost every scalar in a live set
    pub fn value(&self) -> Option<&str> {
        self.attr("Value")
    }

    /// Parse the `Value` attribute; unparsable values count as absent
    pub fn parse_value<T: FromStr>(&self) -> Option<T> {
        self.value().and_then(|v| v.trim().parse().ok())
    }

    /// First direct child with the given tag
    pub fn child(&self, tag: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.tag == tag)
    }

    pub fn child_at(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    /// All direct children with the given tag
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.tag == tag)
    }

    /// Walk a path of segments, stopping at the first missing step
    pub fn resolve(&self, path: &[PathSegment<'_>]) -> Option<&Node> {
        path.iter().try_fold(self, |node, segment| match segment {
            PathSegment::ByIndex(i) => node.child_at(*i),
            PathSegment::ByTag(tag) => node.child(tag),
        })
    }

    /// Resolve a tag-only path
    pub fn resolve_tags(&self, tags: &[&str]) -> Option<&Node> {
        tags.iter().try_fold(self, |node, tag| node.child(tag))
    }

    /// Depth-first search for the first descendant with the given tag
    pub fn find_descendant(&self, tag: &str) -> Option<&Node> {
        for child in &self.children {
            if child.tag == tag {
                return Some(child);
            }
            if let Some(found) = child.find_descendant(tag) {
                return Some(found);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PathSegment::{ByIndex, ByTag};

    fn sample_tree() -> Node {
        Node::new("Ableton").with_child(
            Node::new("LiveSet")
                .with_child(Node::new("Tracks").with_child(Node::new("MidiTrack").with_attr("Id", 7)))
                .with_child(Node::new("Tempo").with_child(Node::new("Manual").with_attr("Value", "128.5"))),
        )
    }

    #[test]
    fn test_resolve_mixed_path() {
        let root = sample_tree();
        let track = root
            .resolve(&[ByIndex(0), ByTag("Tracks"), ByIndex(0)])
            .unwrap();
        assert_eq!(track.tag, "MidiTrack");
        assert_eq!(track.attr("Id"), Some("7"));
    }

    #[test]
    fn test_resolve_missing_step_is_none() {
        let root = sample_tree();
        assert!(root.resolve(&[ByIndex(0), ByTag("Nope")]).is_none());
        assert!(root.resolve(&[ByIndex(3)]).is_none());
    }

    #[test]
    fn test_parse_value() {
        let root = sample_tree();
        let manual = root.resolve_tags(&["LiveSet", "Tempo", "Manual"]).unwrap();
        assert_eq!(manual.parse_value::<f64>(), Some(128.5));
        assert_eq!(manual.parse_value::<u8>(), None);
    }

    #[test]
    fn test_find_descendant_depth_first() {
        let root = sample_tree();
        let manual = root.find_descendant("Manual").unwrap();
        assert_eq!(manual.value(), Some("128.5"));
    }

    #[test]
    fn test_set_attr_replaces_in_place() {
        let mut node = Node::new("params").with_attr("a", 1).with_attr("b", 2);
        node.set_attr("a", 9);
        assert_eq!(node.attrs, vec![("a".into(), "9".into()), ("b".into(), "2".into())]);
    }
}
