//! In-memory document.

use crate::{Element, Lookup, Page};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// An in-memory page: root CSS custom properties plus the body tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Custom properties on the document root (`--name` → value)
    #[serde(default)]
    pub root_vars: BTreeMap<String, String>,

    /// The body element
    pub body: Element,
}

impl Document {
    /// A document with an empty body.
    pub fn new() -> Self {
        Self {
            root_vars: BTreeMap::new(),
            body: Element::new("body"),
        }
    }

    /// A document with the given body.
    pub fn with_body(body: Element) -> Self {
        Self {
            root_vars: BTreeMap::new(),
            body,
        }
    }

    /// Parse a document from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serialize the document as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Ids of the direct children of `parent`, in order.
    pub fn child_ids(&self, parent: &str) -> Vec<String> {
        self.body
            .find(parent)
            .map(|el| el.children.iter().filter_map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// All elements carrying `class`, in document order.
    pub fn elements_with_class(&self, class: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        collect_with_class(&self.body, class, &mut found);
        found
    }
}

fn collect_with_class<'a>(el: &'a Element, class: &str, out: &mut Vec<&'a Element>) {
    if el.has_class(class) {
        out.push(el);
    }
    for child in &el.children {
        collect_with_class(child, class, out);
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Page for Document {
    fn element(&self, id: &str) -> Option<&Element> {
        self.body.find(id)
    }

    fn with_element(&mut self, id: &str, f: &mut dyn FnMut(&mut Element)) -> Lookup<()> {
        match self.body.find_mut(id) {
            Some(el) => {
                f(el);
                Lookup::Found(())
            }
            None => {
                debug!(id, "element not found");
                Lookup::Absent(format!("#{id}"))
            }
        }
    }

    fn for_each_with_class(&mut self, class: &str, f: &mut dyn FnMut(usize, &mut Element)) -> usize {
        let mut index = 0;
        self.body.walk_mut(&mut |el| {
            if el.has_class(class) {
                f(index, el);
                index += 1;
            }
        });
        if index == 0 {
            debug!(class, "no elements with class");
        }
        index
    }

    fn move_before(&mut self, id: &str, reference: &str) -> Lookup<()> {
        let Some(parent) = self.body.parent_of_pair_mut(id, reference) else {
            debug!(id, reference, "elements missing or not siblings");
            return Lookup::Absent(format!("#{id} and #{reference} as siblings"));
        };
        let Some(from) = parent.children.iter().position(|c| c.has_id(id)) else {
            return Lookup::Absent(format!("#{id}"));
        };
        let moved = parent.children.remove(from);
        let Some(to) = parent.children.iter().position(|c| c.has_id(reference)) else {
            parent.children.insert(from, moved);
            return Lookup::Absent(format!("#{reference}"));
        };
        parent.children.insert(to, moved);
        Lookup::Found(())
    }

    fn append_child(&mut self, parent: &str, child: Element) -> Lookup<()> {
        match self.body.find_mut(parent) {
            Some(el) => {
                el.children.push(child);
                Lookup::Found(())
            }
            None => {
                debug!(parent, "append target not found");
                Lookup::Absent(format!("#{parent}"))
            }
        }
    }

    fn add_body_class(&mut self, class: &str) {
        self.body.add_class(class);
    }

    fn remove_body_class(&mut self, class: &str) {
        self.body.remove_class(class);
    }

    fn set_css_var(&mut self, name: &str, value: &str) {
        self.root_vars.insert(name.to_string(), value.to_string());
    }

    fn css_var(&self, name: &str) -> Option<&str> {
        self.root_vars.get(name).map(String::as_str)
    }
}
