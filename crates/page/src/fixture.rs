//! The standard portfolio page.

use crate::{Document, Element, NOTICE_ID};
use folio_core::Section;

/// Projects shown on the default page.
const PROJECTS: [(&str, &str); 4] = [
    ("analytics-dashboard", "Analytics Dashboard"),
    ("task-manager", "Task Manager"),
    ("weather-app", "Weather App"),
    ("portfolio-engine", "Portfolio Engine"),
];

const SKILLS: [(&str, u8); 4] = [("Rust", 90), ("TypeScript", 85), ("SQL", 75), ("CSS", 70)];

const STATS: [(&str, u32); 3] = [("Projects", 24), ("Clients", 12), ("Years", 6)];

impl Document {
    /// The page layout the event wiring and the evolution rules expect.
    pub fn portfolio() -> Self {
        let nav = Element::new("nav")
            .with_id("nav")
            .with_child(Element::new("button").with_id("menuToggle").with_text("Menu"))
            .with_child(Element::new("button").with_id("themeToggle").with_text("Theme"))
            .with_children(Section::ALL.iter().map(|s| {
                Element::new("a")
                    .with_class("nav-link")
                    .with_data("section", s.as_str())
                    .with_text(title_case(s.as_str()))
            }));

        let hero = section(Section::Hero)
            .with_child(Element::new("h1").with_text("Hi, I build things for the web"))
            .with_child(
                Element::new("button")
                    .with_id("exploreProjects")
                    .with_class("btn")
                    .with_text("View My Work"),
            )
            .with_child(
                Element::new("button")
                    .with_id("contactHero")
                    .with_class("btn")
                    .with_text("Get In Touch"),
            );

        let about = section(Section::About)
            .with_child(Element::new("h2").with_text("About"))
            .with_child(Element::new("p").with_text("Developer focused on fast, reliable software."));

        let projects = section(Section::Projects)
            .with_child(Element::new("h2").with_text("Projects"))
            .with_child(Element::new("div").with_id("projectGrid").with_children(
                PROJECTS.iter().map(|(key, title)| {
                    Element::new("div")
                        .with_class("project-card")
                        .with_data("project", *key)
                        .with_child(Element::new("h3").with_text(*title))
                        .with_child(
                            Element::new("button")
                                .with_class("project-cta")
                                .with_text("View Project"),
                        )
                }),
            ));

        let skills = section(Section::Skills)
            .with_child(Element::new("h2").with_text("Skills"))
            .with_children(SKILLS.iter().map(|(name, level)| {
                Element::new("div")
                    .with_class("skill-progress")
                    .with_data("level", level.to_string())
                    .with_text(*name)
            }))
            .with_children(STATS.iter().map(|(label, count)| {
                Element::new("span")
                    .with_class("stat-number")
                    .with_data("count", count.to_string())
                    .with_text(*label)
            }));

        let contact = section(Section::Contact)
            .with_child(Element::new("h2").with_text("Contact"))
            .with_child(
                Element::new("form")
                    .with_id("contactForm")
                    .with_class("contact-form")
                    .with_children(["name", "email", "subject", "message"].map(|field| {
                        Element::new(if field == "message" { "textarea" } else { "input" })
                            .with_id(field)
                            .with_data("field", field)
                    }))
                    .with_child(
                        Element::new("button")
                            .with_id("contactSubmit")
                            .with_text("Send Message"),
                    ),
            );

        let body = Element::new("body")
            .with_child(nav)
            .with_child(
                Element::new("main")
                    .with_id("main")
                    .with_children([hero, about, projects, skills, contact]),
            )
            .with_child(Element::new("div").with_id("particles"))
            .with_child(
                Element::new("div")
                    .with_id(NOTICE_ID)
                    .with_class("evolution-notice"),
            );

        let mut doc = Document::with_body(body);
        doc.root_vars.insert("--accent-color".to_string(), "#3b82f6".to_string());
        doc.root_vars.insert("--accent-hover".to_string(), "#2563eb".to_string());
        doc
    }
}

fn section(s: Section) -> Element {
    Element::new("section").with_id(s.as_str()).with_class("section")
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Page;

    #[test]
    fn test_portfolio_has_expected_surface() {
        let doc = Document::portfolio();
        for id in ["themeToggle", "menuToggle", "exploreProjects", "contactHero", "particles", NOTICE_ID] {
            assert!(doc.element(id).is_some(), "missing #{id}");
        }
        assert_eq!(doc.elements_with_class("nav-link").len(), Section::ALL.len());
        assert_eq!(doc.elements_with_class("project-card").len(), PROJECTS.len());
        assert_eq!(doc.elements_with_class("project-cta").len(), PROJECTS.len());
        assert_eq!(
            doc.child_ids("main"),
            vec!["hero", "about", "projects", "skills", "contact"]
        );
        assert_eq!(doc.css_var("--accent-color"), Some("#3b82f6"));
    }
}
