//! Interaction model - the flat statistics record the page accumulates.

use crate::capped::CappedLog;
use crate::Time;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the interaction log.
pub const MAX_INTERACTIONS: usize = 1000;

/// Log of interaction events, newest last.
pub type InteractionLog = CappedLog<InteractionEvent, MAX_INTERACTIONS>;

/// A key that is not one of the known counters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown key: {0}")]
pub struct UnknownKey(pub String);

/// Click counter categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClickCategory {
    /// Project cards and project navigation
    Projects,
    /// About section navigation
    About,
    /// Contact navigation and form submissions
    Contact,
    /// Call-to-action buttons
    Cta,
    /// The theme toggle button
    ThemeToggle,
    /// Navigation links
    Navigation,
}

impl ClickCategory {
    /// All categories, in display order.
    pub const ALL: [ClickCategory; 6] = [
        ClickCategory::Projects,
        ClickCategory::About,
        ClickCategory::Contact,
        ClickCategory::Cta,
        ClickCategory::ThemeToggle,
        ClickCategory::Navigation,
    ];

    /// Storage key of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClickCategory::Projects => "projects",
            ClickCategory::About => "about",
            ClickCategory::Contact => "contact",
            ClickCategory::Cta => "cta",
            ClickCategory::ThemeToggle => "themeToggle",
            ClickCategory::Navigation => "navigation",
        }
    }
}

impl std::fmt::Display for ClickCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClickCategory {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClickCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Page sections that are tracked for views and dwell time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Section {
    /// Landing block
    Hero,
    /// About me
    About,
    /// Project showcase
    Projects,
    /// Skills and stats
    Skills,
    /// Contact form
    Contact,
}

impl Section {
    /// All sections, in page order.
    pub const ALL: [Section; 5] = [
        Section::Hero,
        Section::About,
        Section::Projects,
        Section::Skills,
        Section::Contact,
    ];

    /// Element id / storage key of this section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Hero => "hero",
            Section::About => "about",
            Section::Projects => "projects",
            Section::Skills => "skills",
            Section::Contact => "contact",
        }
    }
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Section {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

/// Colour theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    #[default]
    Light,
    /// Dark theme
    Dark,
}

impl Theme {
    /// The opposite theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        })
    }
}

/// Per-category click counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClickCounts {
    /// Project clicks
    pub projects: u64,
    /// About clicks
    pub about: u64,
    /// Contact clicks
    pub contact: u64,
    /// Call-to-action clicks
    pub cta: u64,
    /// Theme toggle clicks
    pub theme_toggle: u64,
    /// Navigation clicks
    pub navigation: u64,
}

impl ClickCounts {
    /// Current count for a category.
    pub fn get(&self, category: ClickCategory) -> u64 {
        match category {
            ClickCategory::Projects => self.projects,
            ClickCategory::About => self.about,
            ClickCategory::Contact => self.contact,
            ClickCategory::Cta => self.cta,
            ClickCategory::ThemeToggle => self.theme_toggle,
            ClickCategory::Navigation => self.navigation,
        }
    }

    /// Increment a category by one.
    pub fn bump(&mut self, category: ClickCategory) {
        let slot = match category {
            ClickCategory::Projects => &mut self.projects,
            ClickCategory::About => &mut self.about,
            ClickCategory::Contact => &mut self.contact,
            ClickCategory::Cta => &mut self.cta,
            ClickCategory::ThemeToggle => &mut self.theme_toggle,
            ClickCategory::Navigation => &mut self.navigation,
        };
        *slot = slot.saturating_add(1);
    }

    /// Sum over all categories.
    pub fn total(&self) -> u64 {
        ClickCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }
}

/// One counter per tracked section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SectionCounters {
    /// Hero section
    pub hero: u64,
    /// About section
    pub about: u64,
    /// Projects section
    pub projects: u64,
    /// Skills section
    pub skills: u64,
    /// Contact section
    pub contact: u64,
}

impl SectionCounters {
    /// Current value for a section.
    pub fn get(&self, section: Section) -> u64 {
        match section {
            Section::Hero => self.hero,
            Section::About => self.about,
            Section::Projects => self.projects,
            Section::Skills => self.skills,
            Section::Contact => self.contact,
        }
    }

    /// Add `amount` to a section, saturating.
    pub fn add(&mut self, section: Section, amount: u64) {
        let slot = match section {
            Section::Hero => &mut self.hero,
            Section::About => &mut self.about,
            Section::Projects => &mut self.projects,
            Section::Skills => &mut self.skills,
            Section::Contact => &mut self.contact,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Sum over all sections.
    pub fn total(&self) -> u64 {
        Section::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// What kind of interaction happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InteractionKind {
    /// A click, with the raw category and optional target keys
    Click {
        /// Category key as reported by the page
        category: String,
        /// Secondary key, if any
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    /// A section scrolled into view
    SectionView {
        /// Section key
        section: String,
    },
    /// Scroll depth changed
    Scroll {
        /// Depth percentage
        depth: f64,
    },
    /// Theme preference changed
    ThemeChange {
        /// New theme
        theme: Theme,
    },
    /// A new page visit
    Visit {
        /// Visit number
        count: u64,
    },
}

/// A timestamped interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionEvent {
    /// What happened
    #[serde(flatten)]
    pub kind: InteractionKind,

    /// When it happened
    pub timestamp: Time,
}

impl InteractionEvent {
    /// Create an event stamped at `timestamp`.
    pub fn new(kind: InteractionKind, timestamp: Time) -> Self {
        Self { kind, timestamp }
    }
}

/// Aggregate interaction statistics, persisted across sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionData {
    /// Clicks by category
    pub clicks: ClickCounts,

    /// Cumulative dwell time per section, in milliseconds
    pub section_time: SectionCounters,

    /// Latest recorded scroll depth, percent of page (0-100)
    pub scroll_depth: f64,

    /// Current theme preference
    pub theme_preference: Theme,

    /// Date of the most recent visit
    pub last_visit: Option<NaiveDate>,

    /// Number of recorded visits
    pub visit_count: u64,

    /// Views per section
    pub section_views: SectionCounters,

    /// Most recent interaction events
    pub interactions: InteractionLog,
}

impl InteractionData {
    /// Weight of total clicks in the engagement score.
    pub const CLICK_WEIGHT: f64 = 0.3;
    /// Weight of total dwell seconds in the engagement score.
    pub const DWELL_WEIGHT: f64 = 0.4;
    /// Weight of scroll depth in the engagement score.
    pub const SCROLL_WEIGHT: f64 = 0.3;

    /// Total dwell time across sections, in seconds.
    pub fn total_dwell_seconds(&self) -> f64 {
        self.section_time.total() as f64 / 1000.0
    }

    /// Weighted engagement score. Unbounded.
    pub fn engagement_score(&self) -> f64 {
        Self::CLICK_WEIGHT * self.clicks.total() as f64
            + Self::DWELL_WEIGHT * self.total_dwell_seconds()
            + Self::SCROLL_WEIGHT * self.scroll_depth
    }

    /// Append an event to the capped log.
    pub fn log(&mut self, kind: InteractionKind, timestamp: Time) {
        self.interactions.push(InteractionEvent::new(kind, timestamp));
    }
}
