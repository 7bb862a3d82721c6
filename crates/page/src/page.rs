//! The page surface the engine mutates.

use crate::Element;

/// Id of the transient notice element.
pub const NOTICE_ID: &str = "evolutionNotice";

/// Class that makes the notice visible.
pub const NOTICE_VISIBLE_CLASS: &str = "show";

/// Outcome of a targeted page operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// Target existed; operation applied
    Found(T),
    /// Target missing; nothing changed
    Absent(String),
}

impl<T> Lookup<T> {
    /// Whether the target existed.
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }

    /// The value, if the target existed.
    pub fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Absent(_) => None,
        }
    }

    /// Map the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Lookup<U> {
        match self {
            Lookup::Found(value) => Lookup::Found(f(value)),
            Lookup::Absent(what) => Lookup::Absent(what),
        }
    }
}

/// A mutable page.
///
/// Every targeted operation reports a missing target as
/// [`Lookup::Absent`]; nothing here fails.
pub trait Page: Send {
    /// Read an element by id.
    fn element(&self, id: &str) -> Option<&Element>;

    /// Run `f` on the element with `id`.
    fn with_element(&mut self, id: &str, f: &mut dyn FnMut(&mut Element)) -> Lookup<()>;

    /// Run `f` on every element with `class`, in document order, passing
    /// the match index. Returns the number of matches.
    fn for_each_with_class(&mut self, class: &str, f: &mut dyn FnMut(usize, &mut Element)) -> usize;

    /// Move the element `id` so it sits right before its sibling `reference`.
    fn move_before(&mut self, id: &str, reference: &str) -> Lookup<()>;

    /// Append `child` to the element with id `parent`.
    fn append_child(&mut self, parent: &str, child: Element) -> Lookup<()>;

    /// Add a class to the page body.
    fn add_body_class(&mut self, class: &str);

    /// Remove a class from the page body.
    fn remove_body_class(&mut self, class: &str);

    /// Set a CSS custom property on the document root.
    fn set_css_var(&mut self, name: &str, value: &str);

    /// Read a CSS custom property from the document root.
    fn css_var(&self, name: &str) -> Option<&str>;

    /// Set the text of the element with `id`.
    fn set_text(&mut self, id: &str, text: &str) -> Lookup<()> {
        self.with_element(id, &mut |el| el.text = text.to_string())
    }

    /// Show `text` in the notice element.
    fn show_notice(&mut self, text: &str) -> Lookup<()> {
        self.with_element(NOTICE_ID, &mut |el| {
            el.text = text.to_string();
            el.add_class(NOTICE_VISIBLE_CLASS);
        })
    }

    /// Hide the notice element.
    fn hide_notice(&mut self) -> Lookup<()> {
        self.with_element(NOTICE_ID, &mut |el| {
            el.remove_class(NOTICE_VISIBLE_CLASS);
        })
    }
}
