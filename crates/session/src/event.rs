//! UI events delivered to a session.

use folio_page::ContactForm;
use serde::{Deserialize, Serialize};

/// Something the visitor did.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum UiEvent {
    /// `.nav-link[data-section]` clicked
    NavClick {
        /// Value of `data-section`
        section: String,
    },
    /// `.project-card[data-project]` clicked
    ProjectCardClick {
        /// Value of `data-project`
        project: String,
    },
    /// `#exploreProjects` clicked
    ExploreProjects,
    /// `#contactHero` clicked
    ContactHero,
    /// `.project-cta` clicked
    ProjectCta {
        /// Project of the enclosing card, if known
        #[serde(default)]
        project: Option<String>,
    },
    /// `#themeToggle` clicked
    ThemeToggle,
    /// `#menuToggle` clicked
    MenuToggle,
    /// Any other click on the document
    Click {
        /// Element id, if any
        #[serde(default)]
        target: Option<String>,
    },
    /// `.contact-form` submitted
    ContactSubmit {
        /// Submitted fields
        form: ContactForm,
    },
    /// A section became the visible one
    SectionVisible {
        /// Section id
        section: String,
    },
    /// Scroll position changed
    Scroll {
        /// Depth, percent of the page
        depth: f64,
    },
    /// The page is being torn down
    Unload,
}

impl UiEvent {
    /// Whether this event is a document click, which schedules an
    /// evaluation shortly after.
    pub fn is_click(&self) -> bool {
        !matches!(
            self,
            UiEvent::SectionVisible { .. } | UiEvent::Scroll { .. } | UiEvent::Unload
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tagged_json() {
        let event: UiEvent = serde_json::from_str(r#"{"type":"navClick","section":"projects"}"#).unwrap();
        assert_eq!(event, UiEvent::NavClick { section: "projects".into() });

        let event: UiEvent = serde_json::from_str(r#"{"type":"projectCta"}"#).unwrap();
        assert_eq!(event, UiEvent::ProjectCta { project: None });

        let event: UiEvent = serde_json::from_str(
            r#"{"type":"contactSubmit","form":{"name":"A","email":"a@b.co"}}"#,
        )
        .unwrap();
        assert!(matches!(event, UiEvent::ContactSubmit { ref form } if form.subject.is_empty()));
    }

    #[test]
    fn test_click_classification() {
        assert!(UiEvent::ThemeToggle.is_click());
        assert!(UiEvent::Click { target: None }.is_click());
        assert!(!UiEvent::Scroll { depth: 10.0 }.is_click());
        assert!(!UiEvent::Unload.is_click());
    }
}
