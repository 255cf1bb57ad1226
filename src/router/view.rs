//! Applies paths to the tab hierarchy and records user navigation in history.
//!
//! A path is applied one level at a time. Each activation reports whether the
//! level is usable immediately or will signal completion later through
//! [`ViewRouter::activation_complete`], so a subtab is never activated before
//! its parent tab has produced it.

use std::collections::HashSet;

use super::{normalize, RouteEntry, RouteTable};
use crate::logging::{log, log_route, obj, v_opt, v_str, Domain, Level as LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    Tab,
    Subtab,
    Subsubtab,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Tab => "tab",
            Level::Subtab => "subtab",
            Level::Subsubtab => "subsubtab",
        }
    }
}

/// Who caused an activation. Only user activations reach history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    User,
    Router,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::User => "user",
            Origin::Router => "router",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterPhase {
    Idle,
    ApplyingTab,
    ApplyingSubtab,
    ApplyingSubsubtab,
}

impl RouterPhase {
    fn level(&self) -> Option<Level> {
        match self {
            RouterPhase::Idle => None,
            RouterPhase::ApplyingTab => Some(Level::Tab),
            RouterPhase::ApplyingSubtab => Some(Level::Subtab),
            RouterPhase::ApplyingSubsubtab => Some(Level::Subsubtab),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Activated; children are available now.
    Ready,
    /// Activated; children appear once `activation_complete` is signalled.
    Pending,
    /// No such control on the page.
    Missing,
}

pub trait NavigationSurface {
    fn activate(&mut self, level: Level, id: &str) -> Activation;
}

pub trait History {
    /// Pushes a new entry whose associated state is `path`.
    fn push(&mut self, path: &str);
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationState {
    pub tab: Option<String>,
    pub subtab: Option<String>,
    pub subsubtab: Option<String>,
}

impl NavigationState {
    fn set(&mut self, level: Level, id: &str) {
        match level {
            Level::Tab => {
                self.tab = Some(id.to_string());
                self.subtab = None;
                self.subsubtab = None;
            }
            Level::Subtab => {
                self.subtab = Some(id.to_string());
                self.subsubtab = None;
            }
            Level::Subsubtab => self.subsubtab = Some(id.to_string()),
        }
    }

    pub fn matches(&self, entry: &RouteEntry) -> bool {
        self.tab.as_deref() == Some(entry.tab)
            && self.subtab.as_deref() == entry.subtab
            && self.subsubtab.as_deref() == entry.subsubtab
    }
}

pub struct ViewRouter<H: History> {
    table: RouteTable,
    history: H,
    nav: NavigationState,
    phase: RouterPhase,
    pending: Option<RouteEntry>,
}

impl<H: History> ViewRouter<H> {
    pub fn new(table: RouteTable, history: H) -> Self {
        Self {
            table,
            history,
            nav: NavigationState::default(),
            phase: RouterPhase::Idle,
            pending: None,
        }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn history(&self) -> &H {
        &self.history
    }

    pub fn history_mut(&mut self) -> &mut H {
        &mut self.history
    }

    pub fn state(&self) -> &NavigationState {
        &self.nav
    }

    pub fn phase(&self) -> RouterPhase {
        self.phase
    }

    /// True while a path is being applied.
    pub fn is_applying(&self) -> bool {
        self.phase != RouterPhase::Idle
    }

    /// Applies a known path level by level. Unknown paths are ignored and
    /// return false. Never pushes history.
    pub fn apply_path(&mut self, path: &str, ui: &mut dyn NavigationSurface) -> bool {
        let Some(entry) = self.table.lookup(path).copied() else {
            log(
                LogLevel::Debug,
                Domain::Router,
                "unknown_route",
                obj(&[("path", v_str(normalize(path)))]),
            );
            return false;
        };
        log_route("apply_path", entry.path, Origin::Router.as_str());
        self.pending = Some(entry);
        self.phase = RouterPhase::ApplyingTab;
        self.drive(ui);
        true
    }

    /// Completion signal for the control that answered `Activation::Pending`.
    /// Signals for any other level or id, including late ones from a
    /// superseded path, are ignored.
    pub fn activation_complete(&mut self, level: Level, id: &str, ui: &mut dyn NavigationSurface) {
        let awaited = match (self.pending, self.phase.level()) {
            (Some(entry), Some(current)) if current == level => id_at(&entry, level),
            _ => None,
        };
        if awaited != Some(id) {
            log(
                LogLevel::Debug,
                Domain::Router,
                "stale_completion",
                obj(&[("level", v_str(level.as_str())), ("id", v_str(id))]),
            );
            return;
        }
        if self.advance() {
            self.drive(ui);
        }
    }

    /// Records an activation. A user activation while idle pushes the path of
    /// the first route matching the new state, if any.
    pub fn on_activation(&mut self, level: Level, id: &str, origin: Origin) -> Option<&'static str> {
        self.nav.set(level, id);
        if origin != Origin::User || self.is_applying() {
            return None;
        }
        let path = self
            .table
            .reverse(
                self.nav.tab.as_deref().unwrap_or_default(),
                self.nav.subtab.as_deref(),
                self.nav.subsubtab.as_deref(),
            )
            .map(|e| e.path)?;
        self.history.push(path);
        log_route("history_push", path, origin.as_str());
        Some(path)
    }

    /// Back/forward: replays the path stored with the history entry.
    pub fn on_pop_state(&mut self, state: Option<&str>, ui: &mut dyn NavigationSurface) -> bool {
        match state {
            Some(path) => self.apply_path(path, ui),
            None => false,
        }
    }

    /// Applies the address path only if the table knows it; otherwise the
    /// default view stays.
    pub fn initial_load(&mut self, address_path: &str, ui: &mut dyn NavigationSurface) -> bool {
        if self.table.lookup(address_path).is_none() {
            return false;
        }
        self.apply_path(address_path, ui)
    }

    fn drive(&mut self, ui: &mut dyn NavigationSurface) {
        loop {
            let (Some(entry), Some(level)) = (self.pending, self.phase.level()) else {
                return;
            };
            let Some(id) = id_at(&entry, level) else {
                self.finish();
                return;
            };
            match ui.activate(level, id) {
                Activation::Missing => {
                    log(
                        LogLevel::Debug,
                        Domain::Router,
                        "control_missing",
                        obj(&[("level", v_str(level.as_str())), ("id", v_str(id))]),
                    );
                    self.finish();
                    return;
                }
                Activation::Pending => {
                    self.on_activation(level, id, Origin::Router);
                    // Nothing deeper waits on this level.
                    if next_phase(&entry, self.phase) == RouterPhase::Idle {
                        self.finish();
                    }
                    return;
                }
                Activation::Ready => {
                    self.on_activation(level, id, Origin::Router);
                    if !self.advance() {
                        return;
                    }
                }
            }
        }
    }

    /// Moves to the next specified level; returns false once finished.
    fn advance(&mut self) -> bool {
        let Some(entry) = self.pending else {
            self.finish();
            return false;
        };
        let next = next_phase(&entry, self.phase);
        if next == RouterPhase::Idle {
            self.finish();
            return false;
        }
        self.phase = next;
        true
    }

    fn finish(&mut self) {
        self.phase = RouterPhase::Idle;
        self.pending = None;
        log(
            LogLevel::Debug,
            Domain::Router,
            "navigation_state",
            obj(&[
                ("tab", v_opt(self.nav.tab.as_deref())),
                ("subtab", v_opt(self.nav.subtab.as_deref())),
                ("subsubtab", v_opt(self.nav.subsubtab.as_deref())),
            ]),
        );
    }
}

fn id_at(entry: &RouteEntry, level: Level) -> Option<&'static str> {
    match level {
        Level::Tab => Some(entry.tab),
        Level::Subtab => entry.subtab,
        Level::Subsubtab => entry.subsubtab,
    }
}

/// The phase after `phase` for `entry`; Idle once no deeper level is set.
fn next_phase(entry: &RouteEntry, phase: RouterPhase) -> RouterPhase {
    match phase {
        RouterPhase::ApplyingTab if entry.subtab.is_some() => RouterPhase::ApplyingSubtab,
        RouterPhase::ApplyingSubtab if entry.subsubtab.is_some() => RouterPhase::ApplyingSubsubtab,
        _ => RouterPhase::Idle,
    }
}

/// In-memory history with back/forward over pushed paths.
#[derive(Debug, Clone, Default)]
pub struct MemoryHistory {
    entries: Vec<Option<String>>,
    cursor: usize,
    pushes: usize,
}

impl MemoryHistory {
    /// Starts with the page-load entry, which carries no state.
    pub fn new() -> Self {
        Self {
            entries: vec![None],
            cursor: 0,
            pushes: 0,
        }
    }

    pub fn pushes(&self) -> usize {
        self.pushes
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).and_then(|e| e.as_deref())
    }

    /// Address-bar path for the current entry.
    pub fn address(&self) -> String {
        format!("/{}", self.current().unwrap_or_default())
    }

    /// Moves back and returns the new entry's state.
    pub fn back(&mut self) -> Option<Option<String>> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor).cloned()
    }

    pub fn forward(&mut self) -> Option<Option<String>> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        self.entries.get(self.cursor).cloned()
    }
}

impl History for MemoryHistory {
    fn push(&mut self, path: &str) {
        if self.entries.is_empty() {
            self.entries.push(None);
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(Some(path.to_string()));
        self.cursor = self.entries.len() - 1;
        self.pushes += 1;
    }
}

/// Navigation surface that records activations. Levels listed as deferred
/// answer `Pending`; ids outside the known set answer `Missing`.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    known: Option<HashSet<String>>,
    deferred: HashSet<Level>,
    activated: Vec<(Level, String)>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.known = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn deferring(mut self, level: Level) -> Self {
        self.deferred.insert(level);
        self
    }

    pub fn activated(&self) -> &[(Level, String)] {
        &self.activated
    }
}

impl NavigationSurface for RecordingSurface {
    fn activate(&mut self, level: Level, id: &str) -> Activation {
        if let Some(known) = &self.known {
            if !known.contains(id) {
                return Activation::Missing;
            }
        }
        self.activated.push((level, id.to_string()));
        if self.deferred.contains(&level) {
            Activation::Pending
        } else {
            Activation::Ready
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> ViewRouter<MemoryHistory> {
        ViewRouter::new(RouteTable::standard().unwrap(), MemoryHistory::new())
    }

    #[test]
    fn test_apply_tab_only_clears_marker_immediately() {
        let mut r = router();
        let mut ui = RecordingSurface::new();
        assert!(r.apply_path("overview", &mut ui));
        assert_eq!(r.phase(), RouterPhase::Idle);
        assert_eq!(r.state().tab.as_deref(), Some("overview"));
        assert_eq!(r.state().subtab, None);
    }

    #[test]
    fn test_stale_completion_is_ignored() {
        let mut r = router();
        let mut ui = RecordingSurface::new().deferring(Level::Tab);
        r.apply_path("metrics/fees/7d", &mut ui);
        assert_eq!(r.phase(), RouterPhase::ApplyingTab);
        r.activation_complete(Level::Subtab, "METRICS_BTC_FEES", &mut ui);
        assert_eq!(r.phase(), RouterPhase::ApplyingTab);
        r.activation_complete(Level::Tab, "review", &mut ui);
        assert_eq!(r.phase(), RouterPhase::ApplyingTab);
        r.activation_complete(Level::Tab, "metrics", &mut ui);
        assert_eq!(r.phase(), RouterPhase::Idle);
        assert_eq!(r.state().subsubtab.as_deref(), Some("METRICS_BTC_FEES_7D"));
    }

    #[test]
    fn test_deferred_deepest_level_finishes_at_once() {
        let mut r = router();
        let mut ui = RecordingSurface::new().deferring(Level::Subtab);
        r.apply_path("review/btc-usd", &mut ui);
        assert_eq!(r.phase(), RouterPhase::Idle);
        assert_eq!(r.state().subtab.as_deref(), Some("REVIEW_BTC_USD"));
        // a late signal after finishing changes nothing
        r.activation_complete(Level::Subtab, "REVIEW_BTC_USD", &mut ui);
        assert_eq!(ui.activated().len(), 2);
    }

    #[test]
    fn test_missing_control_stops_application() {
        let mut r = router();
        let mut ui = RecordingSurface::new().with_known(["metrics"]);
        assert!(r.apply_path("metrics/tx-amount/24h", &mut ui));
        assert_eq!(r.phase(), RouterPhase::Idle);
        assert_eq!(r.state().tab.as_deref(), Some("metrics"));
        assert_eq!(r.state().subtab, None);
    }

    #[test]
    fn test_user_tab_click_pushes_tab_path() {
        let mut r = router();
        assert_eq!(r.on_activation(Level::Tab, "review", Origin::User), Some("review"));
        assert_eq!(
            r.on_activation(Level::Subtab, "REVIEW_BTC_GOLD", Origin::User),
            Some("review/btc-gold")
        );
        assert_eq!(r.history().pushes(), 2);
        assert_eq!(r.history().address(), "/review/btc-gold");
    }

    #[test]
    fn test_user_click_without_route_pushes_nothing() {
        let mut r = router();
        assert_eq!(r.on_activation(Level::Tab, "settings", Origin::User), None);
        assert_eq!(r.history().pushes(), 0);
    }

    #[test]
    fn test_memory_history_truncates_forward() {
        let mut h = MemoryHistory::new();
        h.push("a");
        h.push("b");
        assert_eq!(h.back(), Some(Some("a".to_string())));
        h.push("c");
        assert_eq!(h.forward(), None);
        assert_eq!(h.back(), Some(Some("a".to_string())));
        assert_eq!(h.back(), Some(None));
        assert_eq!(h.back(), None);
    }
}
