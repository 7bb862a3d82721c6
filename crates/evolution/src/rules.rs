//! The built-in rule table.

use crate::{ActionReport, EvolutionRule, RuleSet};
use chrono::Duration;
use folio_core::{InteractionData, Theme};
use folio_page::{Element, Page};

/// Move projects ahead of about.
pub const PROJECTS_PRIORITY: &str = "projects_priority";
/// Recolour and reword call-to-action buttons.
pub const CTA_OPTIMIZATION: &str = "cta_optimization";
/// Make the dark theme the default.
pub const DARK_THEME_DEFAULT: &str = "dark_theme_default";
/// Pulse the project cards.
pub const PROJECT_HIGHLIGHT: &str = "project_highlight";
/// Append bonus content for deep scrollers.
pub const CONTENT_REVEAL: &str = "content_reveal";

const HIGHLIGHT_CLASS: &str = "evolution-highlight";
const HIGHLIGHT_STAGGER_MS: usize = 200;
const BONUS_ID: &str = "bonusContent";

impl RuleSet {
    /// The standard rules, in evaluation order.
    pub fn builtin() -> Self {
        Self {
            rules: vec![
                EvolutionRule {
                    name: PROJECTS_PRIORITY,
                    description: "Projects moved up: they get the most attention",
                    predicate: projects_preferred,
                    action: prioritize_projects,
                    cooldown: Duration::seconds(30),
                },
                EvolutionRule {
                    name: CTA_OPTIMIZATION,
                    description: "Call-to-action buttons optimized",
                    predicate: cta_engaged,
                    action: optimize_cta,
                    cooldown: Duration::seconds(60),
                },
                EvolutionRule {
                    name: DARK_THEME_DEFAULT,
                    description: "Dark theme set as default",
                    predicate: prefers_dark,
                    action: default_to_dark,
                    cooldown: Duration::seconds(60),
                },
                EvolutionRule {
                    name: PROJECT_HIGHLIGHT,
                    description: "Project cards highlighted",
                    predicate: projects_explored,
                    action: highlight_projects,
                    cooldown: Duration::seconds(45),
                },
                EvolutionRule {
                    name: CONTENT_REVEAL,
                    description: "Bonus content unlocked for deep readers",
                    predicate: scrolled_deep,
                    action: reveal_content,
                    cooldown: Duration::seconds(120),
                },
            ],
        }
    }
}

fn projects_preferred(data: &InteractionData) -> bool {
    data.clicks.projects > data.clicks.about.saturating_add(2)
        && data.section_time.projects > data.section_time.about
}

fn cta_engaged(data: &InteractionData) -> bool {
    data.clicks.cta > 3 || data.clicks.contact > 5
}

fn prefers_dark(data: &InteractionData) -> bool {
    data.clicks.theme_toggle > 1 && data.theme_preference == Theme::Dark
}

fn projects_explored(data: &InteractionData) -> bool {
    data.clicks.projects > 8
}

fn scrolled_deep(data: &InteractionData) -> bool {
    data.scroll_depth > 70.0
}

fn prioritize_projects(page: &mut dyn Page) -> ActionReport {
    let mut report = ActionReport::default();
    report.record(page.move_before("projects", "about"));
    for id in ["projects", "about"] {
        report.record(page.with_element(id, &mut |el| {
            el.set_style("transition", "opacity 0.3s ease");
            el.set_style("opacity", "1");
        }));
    }
    report
}

fn optimize_cta(page: &mut dyn Page) -> ActionReport {
    let mut report = ActionReport::default();
    page.set_css_var("--accent-color", "#10b981");
    page.set_css_var("--accent-hover", "#059669");
    report.record(page.set_text("exploreProjects", "See Featured Work"));
    report.record(page.set_text("contactHero", "Start a Conversation"));
    let count = page.for_each_with_class("project-cta", &mut |_, el| {
        el.text = "Explore Project".to_string();
    });
    report.record_count(count, ".project-cta");
    report
}

fn default_to_dark(page: &mut dyn Page) -> ActionReport {
    page.add_body_class("dark-theme");
    ActionReport {
        changed: 1,
        missing: Vec::new(),
    }
}

fn highlight_projects(page: &mut dyn Page) -> ActionReport {
    let mut report = ActionReport::default();
    let count = page.for_each_with_class("project-card", &mut |i, el| {
        el.add_class(HIGHLIGHT_CLASS);
        el.set_style("animation-delay", format!("{}ms", i * HIGHLIGHT_STAGGER_MS));
    });
    report.record_count(count, ".project-card");
    report
}

fn reveal_content(page: &mut dyn Page) -> ActionReport {
    let mut report = ActionReport::default();
    if page.element(BONUS_ID).is_some() {
        return report;
    }
    let block = Element::new("section")
        .with_id(BONUS_ID)
        .with_class("bonus-content")
        .with_child(Element::new("h3").with_text("Thanks for reading this far"))
        .with_child(
            Element::new("p").with_text("Here are a few experiments that did not make the main list."),
        );
    report.record(page.append_child("main", block));
    report
}
