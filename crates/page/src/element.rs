//! Element tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A node of the page tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    /// Tag name
    pub tag: String,

    /// Element id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Class list, in insertion order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub classes: Vec<String>,

    /// `data-*` attributes, keyed without the prefix
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,

    /// Text content
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,

    /// Inline style properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub style: BTreeMap<String, String>,

    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Element>,
}

impl Element {
    /// Create an empty element.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            id: None,
            classes: Vec::new(),
            data: BTreeMap::new(),
            text: String::new(),
            style: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set the id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a class.
    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    /// Set a `data-*` attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set the text content.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    /// Append several children.
    pub fn with_children(mut self, children: impl IntoIterator<Item = Element>) -> Self {
        self.children.extend(children);
        self
    }

    /// Whether the element has `id`.
    pub fn has_id(&self, id: &str) -> bool {
        self.id.as_deref() == Some(id)
    }

    /// Whether the class list contains `class`.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Add a class unless already present. Returns whether it was added.
    pub fn add_class(&mut self, class: &str) -> bool {
        if self.has_class(class) {
            return false;
        }
        self.classes.push(class.to_string());
        true
    }

    /// Remove a class. Returns whether it was present.
    pub fn remove_class(&mut self, class: &str) -> bool {
        let before = self.classes.len();
        self.classes.retain(|c| c != class);
        self.classes.len() != before
    }

    /// Set an inline style property.
    pub fn set_style(&mut self, property: &str, value: impl Into<String>) {
        self.style.insert(property.to_string(), value.into());
    }

    /// Read a `data-*` attribute.
    pub fn data(&self, key: &str) -> Option<&str> {
        self.data.get(key).map(String::as_str)
    }

    /// Depth-first search for the element with `id`.
    pub fn find(&self, id: &str) -> Option<&Element> {
        if self.has_id(id) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(id))
    }

    /// Mutable depth-first search for the element with `id`.
    pub fn find_mut(&mut self, id: &str) -> Option<&mut Element> {
        if self.has_id(id) {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(id))
    }

    /// Visit every element in document order.
    pub fn walk(&self, f: &mut dyn FnMut(&Element)) {
        f(self);
        for child in &self.children {
            child.walk(f);
        }
    }

    /// Visit every element in document order, mutably.
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            child.walk_mut(f);
        }
    }

    fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|c| c.has_id(id))
    }

    /// Find the element whose direct children include both ids.
    pub(crate) fn parent_of_pair_mut(&mut self, a: &str, b: &str) -> Option<&mut Element> {
        if self.has_child(a) && self.has_child(b) {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|c| c.parent_of_pair_mut(a, b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classes_do_not_duplicate() {
        let mut el = Element::new("div").with_class("card");
        assert!(!el.add_class("card"));
        assert!(el.add_class("highlight"));
        assert_eq!(el.classes, vec!["card", "highlight"]);
        assert!(el.remove_class("card"));
        assert!(!el.remove_class("card"));
    }

    #[test]
    fn test_find_nested() {
        let tree = Element::new("body").with_child(
            Element::new("main").with_child(Element::new("section").with_id("about")),
        );
        assert_eq!(tree.find("about").map(|e| e.tag.as_str()), Some("section"));
        assert!(tree.find("missing").is_none());
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let tree = Element::new("a")
            .with_child(Element::new("b").with_child(Element::new("c")))
            .with_child(Element::new("d"));
        let mut tags = Vec::new();
        tree.walk(&mut |e| tags.push(e.tag.clone()));
        assert_eq!(tags, vec!["a", "b", "c", "d"]);
    }
}
