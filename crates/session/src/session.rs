//! One page load: event wiring and timer handling.

use crate::{ConfigError, SessionConfig, TimerKind, Timers, UiEvent};
use chrono::Duration;
use folio_core::{Section, Theme, Time};
use folio_evolution::{AppliedEvolution, EvolutionEngine};
use folio_page::Page;
use folio_storage::{AppContext, Storage};
use folio_tracker::InteractionTracker;
use tracing::{debug, info, warn};

const DARK_THEME_CLASS: &str = "dark-theme";
const ACTIVE_CLASS: &str = "active";
const MENU_OPEN_CLASS: &str = "menu-open";
const NAV_ID: &str = "nav";
const CONTACT_THANKS: &str = "Thanks for your message! I'll get back to you soon.";

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The session has already shut down
    #[error("session is closed")]
    Closed,

    /// The configuration could not be turned into a rule set
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A running session over storage `S` and page `P`.
///
/// All state changes happen through [`Session::handle`] and
/// [`Session::advance_to`], so the caller fully controls ordering.
pub struct Session<S: Storage, P: Page> {
    ctx: AppContext<S>,
    config: SessionConfig,
    tracker: InteractionTracker<S>,
    engine: EvolutionEngine<S>,
    page: P,
    timers: Timers,
    notice_generation: u64,
    closed: bool,
}

impl<S: Storage, P: Page> Session<S, P> {
    /// Load persisted state, count the visit and arm the periodic timers.
    pub async fn start(ctx: AppContext<S>, config: SessionConfig, mut page: P) -> Result<Self, SessionError> {
        let rules = config.rule_set()?;
        let ctx = ctx.with_keys(config.storage_keys.clone());

        let mut tracker = InteractionTracker::load(ctx.clone()).await;
        tracker.record_visit().await;
        tracker.update_section_time(Some(Section::Hero));
        if tracker.data().theme_preference == Theme::Dark {
            page.add_body_class(DARK_THEME_CLASS);
        }

        let engine = EvolutionEngine::load(ctx.clone(), rules)
            .await
            .with_policy(config.refire_policy);

        let now = ctx.clock.now();
        let mut timers = Timers::new();
        schedule_after(&mut timers, now, config.evaluation_interval(), TimerKind::Evaluate);
        schedule_after(&mut timers, now, config.flush_interval(), TimerKind::Flush);

        info!(
            session = %ctx.session,
            visit = tracker.data().visit_count,
            "session started"
        );

        Ok(Self {
            ctx,
            config,
            tracker,
            engine,
            page,
            timers,
            notice_generation: 0,
            closed: false,
        })
    }

    /// Apply one UI event. Clicks also schedule an evaluation after the
    /// configured delay.
    pub async fn handle(&mut self, event: UiEvent) -> Result<(), SessionError> {
        if self.closed {
            return Err(SessionError::Closed);
        }
        let schedule_check = event.is_click();

        match event {
            UiEvent::NavClick { section } => {
                self.tracker.track_click("navigation", Some(section.as_str())).await;
            }
            UiEvent::ProjectCardClick { project } => {
                self.tracker.track_click("projects", Some(project.as_str())).await;
            }
            UiEvent::ExploreProjects => {
                self.tracker.track_click("cta", Some("exploreProjects")).await;
            }
            UiEvent::ContactHero => {
                self.tracker.track_click("cta", Some("contactHero")).await;
            }
            UiEvent::ProjectCta { project } => {
                self.tracker.track_click("cta", project.as_deref()).await;
            }
            UiEvent::ThemeToggle => self.toggle_theme().await,
            UiEvent::MenuToggle => {
                let lookup = self.page.with_element(NAV_ID, &mut |el| {
                    if !el.remove_class(MENU_OPEN_CLASS) {
                        el.add_class(MENU_OPEN_CLASS);
                    }
                });
                if !lookup.is_found() {
                    debug!("navigation element missing, menu not toggled");
                }
            }
            UiEvent::Click { target } => {
                debug!(?target, "document click");
            }
            UiEvent::ContactSubmit { form } => match form.validate() {
                Ok(()) => {
                    self.tracker.track_click("contact", None).await;
                    self.notify(CONTACT_THANKS);
                    info!("contact form submitted");
                }
                Err(e) => {
                    debug!(error = %e, "contact form rejected");
                    self.notify(&e.to_string());
                }
            },
            UiEvent::SectionVisible { section } => self.section_visible(&section),
            UiEvent::Scroll { depth } => self.tracker.track_scroll(depth),
            UiEvent::Unload => {
                self.shutdown().await;
                return Ok(());
            }
        }

        if schedule_check {
            let now = self.ctx.clock.now();
            schedule_after(&mut self.timers, now, self.config.click_check_delay(), TimerKind::ClickCheck);
        }
        Ok(())
    }

    /// Fire every timer due at or before `now`, earliest first. Periodic
    /// timers are re-armed from their own deadline. Returns the evolutions
    /// applied along the way.
    pub async fn advance_to(&mut self, now: Time) -> Vec<AppliedEvolution> {
        let mut applied = Vec::new();
        if self.closed {
            return applied;
        }
        while let Some((due, kind)) = self.timers.pop_due(now) {
            debug!(?kind, %due, "timer fired");
            match kind {
                TimerKind::Evaluate => {
                    applied.extend(self.evaluate_now().await);
                    let period = self.config.evaluation_interval();
                    schedule_after(&mut self.timers, due, period, TimerKind::Evaluate);
                }
                TimerKind::Flush => {
                    self.flush().await;
                    let period = self.config.flush_interval();
                    schedule_after(&mut self.timers, due, period, TimerKind::Flush);
                }
                TimerKind::ClickCheck => applied.extend(self.evaluate_now().await),
                TimerKind::HideNotice { generation } => {
                    if generation == self.notice_generation {
                        self.page.hide_notice();
                    }
                }
            }
        }
        applied
    }

    /// Evaluate the rules immediately against the current statistics.
    pub async fn evaluate_now(&mut self) -> Vec<AppliedEvolution> {
        // Fold the running dwell interval in so rules see it.
        self.tracker.update_section_time(self.tracker.current_section());
        let applied = self.engine.evaluate(self.tracker.data(), &mut self.page).await;
        if !applied.is_empty() {
            self.arm_notice_hide();
        }
        applied
    }

    /// Close the current dwell interval and write everything to storage.
    /// Further events are rejected.
    pub async fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.tracker.update_section_time(None);
        if let Err(e) = self.tracker.save().await {
            warn!(error = %e, "final interaction flush failed");
        }
        if let Err(e) = self.engine.save_history().await {
            warn!(error = %e, "final history flush failed");
        }
        self.timers.clear();
        self.closed = true;
        info!(
            session = %self.ctx.session,
            engagement = self.tracker.engagement_score(),
            evolutions = self.engine.active_rules().len(),
            "session ended"
        );
    }

    /// Deadline of the next pending timer.
    pub fn next_deadline(&self) -> Option<Time> {
        self.timers.next_deadline()
    }

    /// Number of click-scheduled evaluations still pending.
    pub fn pending_checks(&self) -> usize {
        self.timers.count(|k| k == TimerKind::ClickCheck)
    }

    /// Whether the session has shut down.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The tracker.
    pub fn tracker(&self) -> &InteractionTracker<S> {
        &self.tracker
    }

    /// The evolution engine.
    pub fn engine(&self) -> &EvolutionEngine<S> {
        &self.engine
    }

    /// The page.
    pub fn page(&self) -> &P {
        &self.page
    }

    /// The session's context.
    pub fn context(&self) -> &AppContext<S> {
        &self.ctx
    }

    /// The session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Consume the session and return the page.
    pub fn into_page(self) -> P {
        self.page
    }

    async fn toggle_theme(&mut self) {
        let next = self.tracker.data().theme_preference.toggled();
        self.tracker.track_click("themeToggle", None).await;
        self.tracker.track_theme_preference(next).await;
        match next {
            Theme::Dark => self.page.add_body_class(DARK_THEME_CLASS),
            Theme::Light => self.page.remove_body_class(DARK_THEME_CLASS),
        }
    }

    fn section_visible(&mut self, section: &str) {
        self.tracker.track_section_view(section);
        let Ok(parsed) = section.parse::<Section>() else {
            return;
        };
        if self.tracker.current_section() != Some(parsed) {
            self.tracker.update_section_time(Some(parsed));
        }
        self.page.for_each_with_class("nav-link", &mut |_, el| {
            if el.data("section") == Some(section) {
                el.add_class(ACTIVE_CLASS);
            } else {
                el.remove_class(ACTIVE_CLASS);
            }
        });
    }

    fn notify(&mut self, text: &str) {
        if self.page.show_notice(text).is_found() {
            self.arm_notice_hide();
        } else {
            debug!(text, "notice element missing");
        }
    }

    fn arm_notice_hide(&mut self) {
        self.notice_generation += 1;
        let now = self.ctx.clock.now();
        let kind = TimerKind::HideNotice {
            generation: self.notice_generation,
        };
        schedule_after(&mut self.timers, now, self.config.notice_duration(), kind);
    }

    async fn flush(&mut self) {
        self.tracker.update_section_time(self.tracker.current_section());
        match self.tracker.save().await {
            Ok(()) => debug!("interactions flushed"),
            Err(e) => warn!(error = %e, "periodic flush failed"),
        }
    }
}

/// Schedule `kind` at `base + delay`, dropping it when the deadline is not
/// representable.
fn schedule_after(timers: &mut Timers, base: Time, delay: Duration, kind: TimerKind) {
    match base.checked_add_signed(delay) {
        Some(due) => timers.schedule(due, kind),
        None => warn!(?kind, %base, "timer deadline out of range, not scheduled"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use folio_core::{Clock, ManualClock};
    use folio_evolution::{RefirePolicy, CONTENT_REVEAL, CTA_OPTIMIZATION, DARK_THEME_DEFAULT};
    use folio_page::{ContactForm, Document, NOTICE_ID, NOTICE_VISIBLE_CLASS};
    use folio_storage::MemoryStorage;
    use std::sync::Arc;

    fn context(storage: MemoryStorage) -> (AppContext<MemoryStorage>, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap());
        (AppContext::with_clock(storage, Arc::new(clock.clone())), clock)
    }

    async fn start(ctx: AppContext<MemoryStorage>) -> Session<MemoryStorage, Document> {
        Session::start(ctx, SessionConfig::default(), Document::portfolio())
            .await
            .unwrap()
    }

    fn notice_visible(session: &Session<MemoryStorage, Document>) -> bool {
        session
            .page()
            .element(NOTICE_ID)
            .map_or(false, |e| e.has_class(NOTICE_VISIBLE_CLASS))
    }

    #[tokio::test]
    async fn test_start_counts_visit_and_arms_timers() {
        let (ctx, clock) = context(MemoryStorage::new());
        let session = start(ctx).await;
        assert_eq!(session.tracker().data().visit_count, 1);
        assert_eq!(session.tracker().current_section(), Some(Section::Hero));
        assert_eq!(session.next_deadline(), Some(clock.now() + Duration::seconds(10)));
        assert_eq!(session.pending_checks(), 0);
    }

    #[tokio::test]
    async fn test_click_evaluates_after_delay() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx).await;

        for _ in 0..4 {
            session.handle(UiEvent::ExploreProjects).await.unwrap();
        }
        assert_eq!(session.tracker().data().clicks.cta, 4);
        assert_eq!(session.pending_checks(), 4);

        clock.advance(Duration::milliseconds(999));
        assert!(session.advance_to(clock.now()).await.is_empty());

        clock.advance(Duration::milliseconds(1));
        let applied = session.advance_to(clock.now()).await;
        assert_eq!(applied.len(), 1);
        assert_eq!(applied[0].rule, CTA_OPTIMIZATION);
        assert_eq!(session.pending_checks(), 0);
        assert_eq!(
            session.page().element("exploreProjects").map(|e| e.text.as_str()),
            Some("See Featured Work")
        );
    }

    #[tokio::test]
    async fn test_periodic_evaluation_rearms() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx).await;
        session.handle(UiEvent::Scroll { depth: 85.0 }).await.unwrap();
        assert_eq!(session.pending_checks(), 0, "scrolling is not a click");

        clock.advance(Duration::seconds(10));
        let applied = session.advance_to(clock.now()).await;
        assert_eq!(applied.len(), 1);
        assert_eq!(session.next_deadline(), Some(clock.now() + Duration::seconds(5)));

        // The hide timer fires, then the next evaluation re-arms again.
        clock.advance(Duration::seconds(10));
        assert!(session.advance_to(clock.now()).await.is_empty());
        assert!(!notice_visible(&session));
        assert_eq!(session.next_deadline(), Some(clock.now() + Duration::seconds(10)));
    }

    #[tokio::test]
    async fn test_stale_hide_does_not_hide_newer_notice() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx).await;

        session
            .handle(UiEvent::ContactSubmit { form: ContactForm::default() })
            .await
            .unwrap();
        assert!(notice_visible(&session));

        clock.advance(Duration::seconds(3));
        session.handle(UiEvent::ContactSubmit { form: ContactForm::default() }).await.unwrap();

        // First notice's hide is due now but belongs to an older generation.
        clock.advance(Duration::seconds(2));
        session.advance_to(clock.now()).await;
        assert!(notice_visible(&session));

        clock.advance(Duration::seconds(3));
        session.advance_to(clock.now()).await;
        assert!(!notice_visible(&session));
    }

    #[tokio::test]
    async fn test_contact_submission_validated() {
        let (ctx, _) = context(MemoryStorage::new());
        let mut session = start(ctx).await;

        let mut form = ContactForm {
            name: "Ada".into(),
            email: "ada@example".into(),
            subject: "Hello".into(),
            message: "Nice site".into(),
        };
        session.handle(UiEvent::ContactSubmit { form: form.clone() }).await.unwrap();
        assert_eq!(session.tracker().data().clicks.contact, 0);
        assert_eq!(
            session.page().element(NOTICE_ID).map(|e| e.text.as_str()),
            Some("Please enter a valid email address.")
        );

        form.email = "ada@example.com".into();
        session.handle(UiEvent::ContactSubmit { form }).await.unwrap();
        assert_eq!(session.tracker().data().clicks.contact, 1);
        assert_eq!(
            session.page().element(NOTICE_ID).map(|e| e.text.as_str()),
            Some(CONTACT_THANKS)
        );
    }

    #[tokio::test]
    async fn test_theme_toggle_flips_preference_and_body_class() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx.clone()).await;

        session.handle(UiEvent::ThemeToggle).await.unwrap();
        assert_eq!(session.tracker().data().theme_preference, Theme::Dark);
        assert!(session.page().body.has_class(DARK_THEME_CLASS));

        session.handle(UiEvent::ThemeToggle).await.unwrap();
        assert_eq!(session.tracker().data().theme_preference, Theme::Light);
        assert!(!session.page().body.has_class(DARK_THEME_CLASS));

        session.handle(UiEvent::ThemeToggle).await.unwrap();
        clock.advance(Duration::seconds(1));
        let applied = session.advance_to(clock.now()).await;
        assert_eq!(applied.iter().map(|a| a.rule).collect::<Vec<_>>(), vec![DARK_THEME_DEFAULT]);
        session.shutdown().await;

        // The next session starts dark.
        let next = start(ctx).await;
        assert!(next.page().body.has_class(DARK_THEME_CLASS));
        assert_eq!(next.tracker().data().visit_count, 2);
    }

    #[tokio::test]
    async fn test_section_visibility_tracks_dwell_and_nav() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx).await;

        clock.advance(Duration::seconds(2));
        session
            .handle(UiEvent::SectionVisible { section: "projects".into() })
            .await
            .unwrap();
        clock.advance(Duration::seconds(7));
        session
            .handle(UiEvent::SectionVisible { section: "about".into() })
            .await
            .unwrap();

        let data = session.tracker().data();
        assert_eq!(data.section_time.hero, 2_000);
        assert_eq!(data.section_time.projects, 7_000);
        assert_eq!(data.section_views.projects, 1);

        let active: Vec<_> = session
            .page()
            .elements_with_class(ACTIVE_CLASS)
            .iter()
            .filter_map(|e| e.data("section"))
            .collect();
        assert_eq!(active, vec!["about"]);
    }

    #[tokio::test]
    async fn test_projects_priority_sees_running_dwell() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx).await;
        session
            .handle(UiEvent::SectionVisible { section: "projects".into() })
            .await
            .unwrap();
        for project in ["a", "b", "c"] {
            session
                .handle(UiEvent::ProjectCardClick { project: project.into() })
                .await
                .unwrap();
        }
        // No section change since; the evaluation folds the open interval in.
        clock.advance(Duration::seconds(10));
        let fired: Vec<_> = session.advance_to(clock.now()).await.into_iter().map(|a| a.rule).collect();
        assert!(fired.contains(&folio_evolution::PROJECTS_PRIORITY));
        assert_eq!(
            session.page().child_ids("main")[..3],
            ["hero".to_string(), "projects".to_string(), "about".to_string()]
        );
    }

    #[tokio::test]
    async fn test_menu_toggle() {
        let (ctx, _) = context(MemoryStorage::new());
        let mut session = start(ctx).await;
        session.handle(UiEvent::MenuToggle).await.unwrap();
        assert!(session.page().element(NAV_ID).unwrap().has_class(MENU_OPEN_CLASS));
        session.handle(UiEvent::MenuToggle).await.unwrap();
        assert!(!session.page().element(NAV_ID).unwrap().has_class(MENU_OPEN_CLASS));
    }

    #[tokio::test]
    async fn test_unload_flushes_and_closes() {
        let (ctx, clock) = context(MemoryStorage::new());
        let mut session = start(ctx.clone()).await;
        session.handle(UiEvent::Scroll { depth: 42.0 }).await.unwrap();
        clock.advance(Duration::seconds(4));
        session.handle(UiEvent::Unload).await.unwrap();

        assert!(session.is_closed());
        assert_eq!(session.next_deadline(), None);
        assert!(matches!(
            session.handle(UiEvent::ThemeToggle).await,
            Err(SessionError::Closed)
        ));

        let tracker = InteractionTracker::load(ctx).await;
        assert_eq!(tracker.data().scroll_depth, 42.0);
        assert_eq!(tracker.data().section_time.hero, 4_000);
    }

    #[tokio::test]
    async fn test_refire_policy_from_config() {
        let (ctx, clock) = context(MemoryStorage::new());
        let config = SessionConfig {
            refire_policy: RefirePolicy::AfterCooldown,
            ..SessionConfig::default()
        };
        let mut session = Session::start(ctx, config, Document::portfolio()).await.unwrap();
        for _ in 0..3 {
            session.handle(UiEvent::ThemeToggle).await.unwrap();
        }
        session.handle(UiEvent::Scroll { depth: 90.0 }).await.unwrap();

        let mut fired = Vec::new();
        for _ in 0..14 {
            clock.advance(Duration::seconds(10));
            for applied in session.advance_to(clock.now()).await {
                fired.push(applied.rule);
            }
        }
        // dark_theme_default cools down for 60 s and fires at 10, 70 and 130 s.
        // content_reveal finds its block already on the page when it cools down.
        assert_eq!(fired.iter().filter(|r| **r == DARK_THEME_DEFAULT).count(), 3);
        assert_eq!(fired.iter().filter(|r| **r == CONTENT_REVEAL).count(), 1);
    }

    #[tokio::test]
    async fn test_start_rejects_out_of_range_config() {
        let (ctx, _) = context(MemoryStorage::new());
        let config = SessionConfig {
            evaluation_interval_ms: 9_000_000_000_000_000_000,
            ..SessionConfig::default()
        };
        let result = Session::start(ctx, config, Document::portfolio()).await;
        assert!(matches!(result, Err(SessionError::Config(ConfigError::Invalid(_)))));
    }

    #[tokio::test]
    async fn test_unrepresentable_deadlines_are_skipped() {
        let clock = ManualClock::new(chrono::DateTime::<Utc>::MAX_UTC - Duration::milliseconds(500));
        let ctx = AppContext::with_clock(MemoryStorage::new(), Arc::new(clock.clone()));
        let mut session = start(ctx).await;
        assert_eq!(session.next_deadline(), None);

        session
            .handle(UiEvent::ContactSubmit { form: ContactForm::default() })
            .await
            .unwrap();
        assert!(notice_visible(&session));
        assert_eq!(session.pending_checks(), 0);
        assert!(session.advance_to(clock.now()).await.is_empty());
    }

    #[tokio::test]
    async fn test_failing_storage_still_runs() {
        let (ctx, clock) = context(MemoryStorage::failing());
        let mut session = start(ctx).await;
        for _ in 0..6 {
            session.handle(UiEvent::ContactHero).await.unwrap();
        }
        clock.advance(Duration::seconds(30));
        let applied = session.advance_to(clock.now()).await;
        assert_eq!(applied.len(), 1);
        session.shutdown().await;
        assert!(session.is_closed());
    }
}
