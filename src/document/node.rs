// src/document/node.rs

use std::collections::HashSet;

/// One element of a parsed document. Text is the trimmed concatenation of the
/// element's direct text and CDATA content.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct XmlNode {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Axis {
    Child,
    Descendant,
}

#[derive(Debug)]
struct Step<'p> {
    axis: Axis,
    name: &'p str,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> &str {
        self.text.trim()
    }

    /// First direct child with the given element name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Text of the first direct child named `name`, empty when absent.
    pub fn child_text(&self, name: &str) -> &str {
        self.child(name).map(XmlNode::text).unwrap_or("")
    }

    /// Selects nodes relative to this one, in document order.
    ///
    /// `a/b` walks children, `a//b` finds `b` anywhere below `a`, and a leading
    /// `.//` searches all descendants of this node.
    pub fn select(&self, path: &str) -> Vec<&XmlNode> {
        let mut current: Vec<&XmlNode> = vec![self];
        for step in parse_path(path) {
            let mut next: Vec<&XmlNode> = Vec::new();
            for node in &current {
                match step.axis {
                    Axis::Child => next.extend(node.children.iter().filter(|c| c.name == step.name)),
                    Axis::Descendant => node.collect_descendants(step.name, &mut next),
                }
            }
            // Nested context nodes reach the same descendants more than once.
            if step.axis == Axis::Descendant && current.len() > 1 {
                let mut seen: HashSet<*const XmlNode> = HashSet::with_capacity(next.len());
                next.retain(|n| seen.insert(*n as *const XmlNode));
            }
            current = next;
        }
        current
    }

    fn collect_descendants<'a>(&'a self, name: &str, out: &mut Vec<&'a XmlNode>) {
        for child in &self.children {
            if child.name == name {
                out.push(child);
            }
            child.collect_descendants(name, out);
        }
    }
}

fn parse_path(path: &str) -> Vec<Step<'_>> {
    let mut steps = Vec::new();
    let mut descendant = false;
    for segment in path.split('/') {
        match segment {
            "" => descendant = true,
            "." => {}
            name => {
                steps.push(Step {
                    axis: if descendant { Axis::Descendant } else { Axis::Child },
                    name,
                });
                descendant = false;
            }
        }
    }
    steps
}
