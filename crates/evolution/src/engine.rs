//! Evolution engine - evaluates the rule table against the statistics.

use crate::{ActionReport, EvolutionRule, RefirePolicy, RuleSet};
use folio_core::{EvolutionHistory, EvolutionHistoryEntry, InteractionData, Time};
use folio_page::Page;
use folio_storage::{load_json, save_json, AppContext, Storage};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// A rule that fired during an evaluation.
#[derive(Debug, Clone)]
pub struct AppliedEvolution {
    /// Rule name
    pub rule: &'static str,
    /// Description shown and recorded
    pub description: &'static str,
    /// What the action did
    pub report: ActionReport,
    /// Whether the notice element was present
    pub notice_shown: bool,
    /// Engagement score at application time
    pub engagement_score: f64,
}

/// Evaluates rules and keeps the evolution history.
///
/// Rule state per session:
/// ```text
/// eligible (cooldown elapsed, not active) → predicate → applied (active, cooldown reset)
/// ```
/// Under [`RefirePolicy::Once`] the active set only grows, so every rule
/// fires at most once per session.
pub struct EvolutionEngine<S: Storage> {
    ctx: AppContext<S>,
    rules: RuleSet,
    policy: RefirePolicy,
    active: BTreeSet<&'static str>,
    last_applied: HashMap<&'static str, Time>,
    history: EvolutionHistory,
}

impl<S: Storage> EvolutionEngine<S> {
    /// Create an engine, loading the persisted history (or starting empty
    /// when it is missing, corrupt or unreadable).
    pub async fn load(ctx: AppContext<S>, rules: RuleSet) -> Self {
        let outcome = {
            let storage = ctx.storage.lock().await;
            load_json(&*storage, &ctx.keys.history).await
        };
        let history: EvolutionHistory = outcome.or_default_logged(&ctx.keys.history);
        debug!(entries = history.len(), rules = rules.len(), "evolution engine loaded");
        Self {
            ctx,
            rules,
            policy: RefirePolicy::default(),
            active: BTreeSet::new(),
            last_applied: HashMap::new(),
            history,
        }
    }

    /// Set the refire policy.
    pub fn with_policy(mut self, policy: RefirePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The rule table.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Applied evolutions, oldest first.
    pub fn history(&self) -> &EvolutionHistory {
        &self.history
    }

    /// Whether `rule` has been applied in this session and is still held.
    pub fn is_active(&self, rule: &str) -> bool {
        self.active.contains(rule)
    }

    /// Names of active rules, sorted.
    pub fn active_rules(&self) -> Vec<&'static str> {
        self.active.iter().copied().collect()
    }

    /// Whether `rule` may be evaluated at `now`.
    pub fn is_eligible(&self, rule: &EvolutionRule, now: Time) -> bool {
        let cooled = self
            .last_applied
            .get(rule.name)
            .map_or(true, |last| now - *last >= rule.cooldown);
        match self.policy {
            RefirePolicy::Once => cooled && !self.active.contains(rule.name),
            RefirePolicy::AfterCooldown => cooled,
        }
    }

    /// Evaluate every rule in order against `data`, applying each eligible
    /// rule whose predicate holds. Several rules may fire in one call. An
    /// action that finds every target already in its evolved state is not
    /// recorded.
    pub async fn evaluate(&mut self, data: &InteractionData, page: &mut dyn Page) -> Vec<AppliedEvolution> {
        let now = self.ctx.clock.now();
        let mut applied = Vec::new();

        let rules: Vec<EvolutionRule> = self.rules.iter().cloned().collect();
        for rule in rules {
            if !self.is_eligible(&rule, now) {
                continue;
            }
            if !(rule.predicate)(data) {
                continue;
            }
            applied.extend(self.apply(&rule, data, page, now));
        }

        if !applied.is_empty() {
            self.persist().await;
        }
        applied
    }

    fn apply(
        &mut self,
        rule: &EvolutionRule,
        data: &InteractionData,
        page: &mut dyn Page,
        now: Time,
    ) -> Option<AppliedEvolution> {
        let report = (rule.action)(page);
        if report.changed == 0 && report.missing.is_empty() {
            debug!(rule = rule.name, "page already evolved, nothing recorded");
            return None;
        }
        if !report.is_complete() {
            debug!(rule = rule.name, missing = ?report.missing, "some targets were not on the page");
        }

        self.active.insert(rule.name);
        self.last_applied.insert(rule.name, now);

        let entry = EvolutionHistoryEntry::new(
            self.ctx.session,
            rule.name,
            rule.description,
            data.clone(),
            now,
        );
        let engagement_score = entry.engagement_score;
        self.history.push(entry);

        let notice_shown = page.show_notice(rule.description).is_found();
        info!(
            rule = rule.name,
            changed = report.changed,
            engagement = engagement_score,
            "evolution applied"
        );

        Some(AppliedEvolution {
            rule: rule.name,
            description: rule.description,
            report,
            notice_shown,
            engagement_score,
        })
    }

    /// Write the history to storage.
    pub async fn save_history(&self) -> folio_storage::Result<()> {
        let mut storage = self.ctx.storage.lock().await;
        save_json(&mut *storage, &self.ctx.keys.history, &self.history).await
    }

    async fn persist(&self) {
        if let Err(e) = self.save_history().await {
            warn!(key = %self.ctx.keys.history, error = %e, "failed to persist evolution history");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CONTENT_REVEAL, CTA_OPTIMIZATION, PROJECT_HIGHLIGHT};
    use chrono::{Duration, TimeZone, Utc};
    use folio_core::{ManualClock, Theme, MAX_HISTORY};
    use folio_page::{Document, NOTICE_ID};
    use folio_storage::MemoryStorage;
    use folio_tracker::InteractionTracker;
    use std::sync::Arc;

    fn context(storage: MemoryStorage) -> (AppContext<MemoryStorage>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 5, 4, 9, 30, 0).unwrap());
        (AppContext::with_clock(storage, Arc::new(clock.clone())), clock)
    }

    fn label(doc: &Document, id: &str) -> String {
        doc.element(id).map(|e| e.text.clone()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_four_cta_clicks_rewrite_labels_once() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut tracker = InteractionTracker::load(ctx.clone()).await;
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        let mut page = Document::portfolio();

        for _ in 0..3 {
            tracker.track_click("cta", None).await;
        }
        assert!(engine.evaluate(tracker.data(), &mut page).await.is_empty());
        assert_eq!(label(&page, "exploreProjects"), "View My Work");

        tracker.track_click("cta", None).await;
        let applied = engine.evaluate(tracker.data(), &mut page).await;
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].rule, CTA_OPTIMIZATION);
        assert!(applied[0].report.is_complete());
        assert_eq!(label(&page, "exploreProjects"), "See Featured Work");
        assert_eq!(label(&page, "contactHero"), "Start a Conversation");
        assert!(page
            .elements_with_class("project-cta")
            .iter()
            .all(|e| e.text == "Explore Project"));
        assert_eq!(page.css_var("--accent-color"), Some("#10b981"));

        // Put a label back: a second application would overwrite it again.
        page.set_text("exploreProjects", "View My Work");
        clock.advance(Duration::hours(1));
        tracker.track_click("cta", None).await;
        assert!(engine.evaluate(tracker.data(), &mut page).await.is_empty());
        assert_eq!(label(&page, "exploreProjects"), "View My Work");
        assert_eq!(engine.history().len(), 1);
    }

    #[tokio::test]
    async fn test_every_matching_rule_fires_in_one_tick() {
        let (ctx, _) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        let mut page = Document::portfolio();

        let mut data = InteractionData::default();
        data.clicks.projects = 9;
        data.scroll_depth = 90.0;

        let fired: Vec<_> = engine
            .evaluate(&data, &mut page)
            .await
            .into_iter()
            .map(|a| a.rule)
            .collect();
        // projects_priority needs dwell time too, so it stays eligible.
        assert_eq!(fired, vec![PROJECT_HIGHLIGHT, CONTENT_REVEAL]);
        assert_eq!(engine.active_rules(), vec![CONTENT_REVEAL, PROJECT_HIGHLIGHT]);
    }

    #[tokio::test]
    async fn test_fire_once_ignores_elapsed_cooldown() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        let mut page = Document::portfolio();
        let mut data = InteractionData::default();
        data.scroll_depth = 75.0;

        assert_eq!(engine.evaluate(&data, &mut page).await.len(), 1);
        clock.advance(Duration::days(1));
        assert!(engine.evaluate(&data, &mut page).await.is_empty());
        assert!(engine.is_active(CONTENT_REVEAL));
    }

    #[tokio::test]
    async fn test_after_cooldown_policy_refires() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin())
            .await
            .with_policy(RefirePolicy::AfterCooldown);
        let mut page = Document::portfolio();
        let mut data = InteractionData::default();
        data.clicks.theme_toggle = 2;
        data.theme_preference = Theme::Dark;

        assert_eq!(engine.evaluate(&data, &mut page).await.len(), 1);
        clock.advance(Duration::seconds(59));
        assert!(engine.evaluate(&data, &mut page).await.is_empty(), "still cooling down");
        clock.advance(Duration::seconds(1));
        assert_eq!(engine.evaluate(&data, &mut page).await.len(), 1);
        assert_eq!(engine.history().len(), 2);
    }

    #[tokio::test]
    async fn test_refire_without_page_change_is_not_recorded() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin())
            .await
            .with_policy(RefirePolicy::AfterCooldown);
        let mut page = Document::portfolio();
        let mut data = InteractionData::default();
        data.scroll_depth = 95.0;

        assert_eq!(engine.evaluate(&data, &mut page).await.len(), 1);
        page.hide_notice();
        clock.advance(Duration::seconds(120));
        // The bonus block is already there, so nothing changes.
        assert!(engine.evaluate(&data, &mut page).await.is_empty());
        assert_eq!(engine.history().len(), 1);
        assert!(!page.element(NOTICE_ID).unwrap().has_class("show"));
    }

    #[tokio::test]
    async fn test_history_persisted_and_reloaded() {
        let (ctx, _) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx.clone(), RuleSet::builtin()).await;
        let mut page = Document::portfolio();
        let mut data = InteractionData::default();
        data.clicks.contact = 6;
        engine.evaluate(&data, &mut page).await;

        let reloaded = EvolutionEngine::load(ctx.clone(), RuleSet::builtin()).await;
        assert_eq!(reloaded.history(), engine.history());
        let entry = reloaded.history().last().unwrap();
        assert_eq!(entry.rule, CTA_OPTIMIZATION);
        assert_eq!(entry.snapshot, data);
        assert_eq!(entry.session, ctx.session);
        // Activity is per session, not persisted.
        assert!(!reloaded.is_active(CTA_OPTIMIZATION));
    }

    #[tokio::test]
    async fn test_history_capped_across_sessions() {
        let storage = MemoryStorage::new();
        let (ctx, _) = context(storage);
        let mut data = InteractionData::default();
        data.scroll_depth = 80.0;

        for _ in 0..(MAX_HISTORY + 3) {
            let mut session = ctx.clone();
            session.session = folio_core::SessionId::new();
            let mut engine = EvolutionEngine::load(session, RuleSet::builtin()).await;
            let mut page = Document::portfolio();
            assert_eq!(engine.evaluate(&data, &mut page).await.len(), 1);
        }
        let engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        assert_eq!(engine.history().len(), MAX_HISTORY);
    }

    #[tokio::test]
    async fn test_notice_shows_description() {
        let (ctx, _) = context(MemoryStorage::new());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        let mut page = Document::portfolio();
        let mut data = InteractionData::default();
        data.clicks.projects = 12;

        let applied = engine.evaluate(&data, &mut page).await;
        assert!(applied[0].notice_shown);
        let notice = page.element(NOTICE_ID).unwrap();
        assert_eq!(notice.text, "Project cards highlighted");
        assert!(notice.has_class("show"));
    }

    #[tokio::test]
    async fn test_missing_elements_and_storage_degrade_quietly() {
        let (ctx, _) = context(MemoryStorage::failing());
        let mut engine = EvolutionEngine::load(ctx, RuleSet::builtin()).await;
        let mut page = Document::new();
        let mut data = InteractionData::default();
        data.clicks.cta = 5;

        let applied = engine.evaluate(&data, &mut page).await;
        assert_eq!(applied.len(), 1);
        assert!(!applied[0].notice_shown);
        assert_eq!(applied[0].report.missing.len(), 3);
        assert!(engine.is_active(CTA_OPTIMIZATION));
        assert!(engine.save_history().await.is_err());
    }
}
