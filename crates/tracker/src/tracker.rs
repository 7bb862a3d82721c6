//! Interaction tracking service.

use folio_core::{
    ClickCategory, InteractionData, InteractionKind, Section, Theme, Time,
};
use folio_storage::{load_json, save_json, AppContext, Storage};
use tracing::{debug, info, warn};

/// Single mutable source of truth for interaction statistics.
pub struct InteractionTracker<S: Storage> {
    ctx: AppContext<S>,
    data: InteractionData,
    current_section: Option<Section>,
    section_entered_at: Time,
}

impl<S: Storage> InteractionTracker<S> {
    /// Load persisted statistics, falling back to zeroed defaults when the
    /// stored record is missing, corrupt or unreadable.
    pub async fn load(ctx: AppContext<S>) -> Self {
        let outcome = {
            let storage = ctx.storage.lock().await;
            load_json(&*storage, &ctx.keys.interactions).await
        };
        let data = outcome.or_default_logged(&ctx.keys.interactions);
        let now = ctx.clock.now();
        Self {
            ctx,
            data,
            current_section: None,
            section_entered_at: now,
        }
    }

    /// Current statistics.
    pub fn data(&self) -> &InteractionData {
        &self.data
    }

    /// Section currently considered visible.
    pub fn current_section(&self) -> Option<Section> {
        self.current_section
    }

    /// Weighted engagement score of the current statistics.
    pub fn engagement_score(&self) -> f64 {
        self.data.engagement_score()
    }

    /// Count a new visit and persist.
    pub async fn record_visit(&mut self) {
        let now = self.ctx.clock.now();
        let count = self.data.visit_count.saturating_add(1);
        self.data.visit_count = count;
        self.data.last_visit = Some(now.date_naive());
        self.data.log(InteractionKind::Visit { count }, now);
        info!(visit = count, "visit recorded");
        self.persist().await;
    }

    /// Count a click under `category`, and under `target` too when it names
    /// a known category. Unknown keys are logged but not counted.
    pub async fn track_click(&mut self, category: &str, target: Option<&str>) {
        let now = self.ctx.clock.now();
        match category.parse::<ClickCategory>() {
            Ok(c) => self.data.clicks.bump(c),
            Err(e) => debug!(%e, "click category not counted"),
        }
        if let Some(Ok(t)) = target.map(str::parse::<ClickCategory>) {
            self.data.clicks.bump(t);
        }
        self.data.log(
            InteractionKind::Click {
                category: category.to_string(),
                target: target.map(str::to_string),
            },
            now,
        );
        debug!(category, ?target, total = self.data.clicks.total(), "click tracked");
        self.persist().await;
    }

    /// Count a view of `section` when it is a known section.
    pub fn track_section_view(&mut self, section: &str) {
        let now = self.ctx.clock.now();
        match section.parse::<Section>() {
            Ok(s) => self.data.section_views.add(s, 1),
            Err(e) => debug!(%e, "section view not counted"),
        }
        self.data.log(
            InteractionKind::SectionView {
                section: section.to_string(),
            },
            now,
        );
    }

    /// Record the latest scroll depth, clamped to 0-100 percent.
    pub fn track_scroll(&mut self, depth: f64) {
        if depth.is_nan() {
            return;
        }
        let depth = depth.clamp(0.0, 100.0);
        if depth == self.data.scroll_depth {
            return;
        }
        self.data.scroll_depth = depth;
        self.data.log(InteractionKind::Scroll { depth }, self.ctx.clock.now());
    }

    /// Set the theme preference and persist.
    pub async fn track_theme_preference(&mut self, theme: Theme) {
        let now = self.ctx.clock.now();
        self.data.theme_preference = theme;
        self.data.log(InteractionKind::ThemeChange { theme }, now);
        debug!(?theme, "theme preference tracked");
        self.persist().await;
    }

    /// Close the dwell interval of the previously visible section and start
    /// one for `next`.
    pub fn update_section_time(&mut self, next: Option<Section>) {
        let now = self.ctx.clock.now();
        if let Some(previous) = self.current_section {
            let elapsed = (now - self.section_entered_at).num_milliseconds().max(0) as u64;
            self.data.section_time.add(previous, elapsed);
            debug!(section = %previous, elapsed_ms = elapsed, "dwell time added");
        }
        self.current_section = next;
        self.section_entered_at = now;
    }

    /// Write the statistics to storage.
    pub async fn save(&self) -> folio_storage::Result<()> {
        let mut storage = self.ctx.storage.lock().await;
        save_json(&mut *storage, &self.ctx.keys.interactions, &self.data).await
    }

    async fn persist(&self) {
        if let Err(e) = self.save().await {
            warn!(key = %self.ctx.keys.interactions, error = %e, "failed to persist interactions");
        }
    }
}
