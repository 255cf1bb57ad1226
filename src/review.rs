//! One comparison view per asset: series -> filter -> axis -> chart, with the
//! performance overlay re-derived from live state on every paint.

use futures_util::future::join_all;
use serde_json::json;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use crate::axis::advise;
use crate::chart::{Anchor, ChartBackend, ChartError, ChartLifecycle, Dataset, DrawPlugin, OverlayCanvas, RenderOutcome};
use crate::controls::{BoundControls, ControlSurface};
use crate::data::{Series, SeriesError, SeriesStore};
use crate::filter::{self, FilterState};
use crate::logging::{log, log_filter_applied, log_render, obj, v_str, Domain, Level, ProfileScope};
use crate::performance::annotate;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetConfig {
    pub asset_id: &'static str,
    pub label: &'static str,
    pub source: &'static str,
    pub color: &'static str,
    pub unit_label: &'static str,
    pub surface_id: &'static str,
    pub control_prefix: &'static str,
}

pub const ASSETS: &[AssetConfig] = &[
    AssetConfig {
        asset_id: "btc-usd",
        label: "BTC / USD",
        source: "series/btc_usd.jsonl",
        color: "#f7931a",
        unit_label: "USD",
        surface_id: "chart-btc-usd",
        control_prefix: "usd",
    },
    AssetConfig {
        asset_id: "btc-eur",
        label: "BTC / EUR",
        source: "series/btc_eur.jsonl",
        color: "#2775ca",
        unit_label: "EUR",
        surface_id: "chart-btc-eur",
        control_prefix: "eur",
    },
    AssetConfig {
        asset_id: "btc-gold",
        label: "BTC / Gold",
        source: "series/btc_gold.jsonl",
        color: "#d4af37",
        unit_label: "oz XAU",
        surface_id: "chart-btc-gold",
        control_prefix: "gold",
    },
];

#[derive(Debug, Default)]
struct ViewState {
    series: Option<Arc<Series>>,
    filter: FilterState,
}

struct PerformancePlugin {
    view: Rc<RefCell<ViewState>>,
}

impl DrawPlugin for PerformancePlugin {
    fn id(&self) -> &'static str {
        "performance"
    }

    fn after_draw(&self, canvas: &mut dyn OverlayCanvas) {
        let view = self.view.borrow();
        let Some(series) = view.series.as_deref() else {
            return;
        };
        if let Some(overlay) = annotate(&filter::apply(series, &view.filter)) {
            canvas.draw_text(&overlay.text(), overlay.tone.color(), Anchor::TopLeft);
        }
    }
}

pub struct ReviewController {
    config: AssetConfig,
    view: Rc<RefCell<ViewState>>,
    controls: Option<BoundControls>,
}

impl ReviewController {
    pub fn new(config: AssetConfig) -> Self {
        Self {
            config,
            view: Rc::new(RefCell::new(ViewState::default())),
            controls: None,
        }
    }

    pub fn config(&self) -> &AssetConfig {
        &self.config
    }

    pub fn filter(&self) -> FilterState {
        self.view.borrow().filter.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.view.borrow().series.is_some()
    }

    pub async fn load(&self, store: &SeriesStore) -> Result<(), SeriesError> {
        let series = store.load(self.config.source).await?;
        self.view.borrow_mut().series = Some(series);
        Ok(())
    }

    /// Resolves this asset's controls on `surface` and shows the group for the
    /// current mode.
    pub fn bind_controls(&mut self, surface: &mut dyn ControlSurface) {
        let bound = BoundControls::bind(self.config.control_prefix, surface);
        bound.populate_ranges(surface);
        bound.sync_groups(surface, self.view.borrow().filter.time_mode);
        log(
            Level::Debug,
            Domain::Controls,
            "controls_bound",
            obj(&[
                ("asset_id", v_str(self.config.asset_id)),
                ("bound", json!(bound.bound_count())),
            ]),
        );
        self.controls = Some(bound);
    }

    pub fn owns_control(&self, control_id: &str) -> bool {
        self.controls
            .as_ref()
            .map_or(false, |c| c.is_bound(control_id))
    }

    /// Writes the control's value into the filter and re-renders. Unbound ids
    /// are ignored.
    pub fn on_control_change<B: ChartBackend>(
        &mut self,
        control_id: &str,
        surface: &mut dyn ControlSurface,
        charts: &mut ChartLifecycle<B>,
    ) -> Result<Option<RenderOutcome>, ChartError> {
        let Some(controls) = &self.controls else {
            return Ok(None);
        };
        if !controls.is_bound(control_id) {
            return Ok(None);
        }
        let changed = {
            let mut view = self.view.borrow_mut();
            controls.handle(control_id, surface, &mut view.filter)
        };
        log(
            Level::Debug,
            Domain::Controls,
            "control_changed",
            obj(&[
                ("asset_id", v_str(self.config.asset_id)),
                ("control", v_str(control_id)),
                ("changed", json!(changed)),
            ]),
        );
        self.refresh(charts)
    }

    /// Runs the full filter -> axis -> render cycle. No-op until loaded.
    pub fn refresh<B: ChartBackend>(
        &self,
        charts: &mut ChartLifecycle<B>,
    ) -> Result<Option<RenderOutcome>, ChartError> {
        let _scope = ProfileScope::with_context("review_refresh", &[("asset_id", v_str(self.config.asset_id))]);
        // The borrow must end before render: repainting runs the overlay plugin.
        let (dataset, advice, transform) = {
            let view = self.view.borrow();
            let Some(series) = view.series.as_deref() else {
                return Ok(None);
            };
            let visible = filter::apply(series, &view.filter);
            let advice = advise(&visible, &view.filter);
            log_filter_applied(
                self.config.asset_id,
                view.filter.time_mode.as_str(),
                series.len(),
                visible.len(),
                advice.granularity.as_str(),
            );
            (
                Dataset::from_points(self.config.label, self.config.color, &visible),
                advice,
                view.filter.axis_transform,
            )
        };
        let points = dataset.len();
        let outcome = charts.render(
            self.config.surface_id,
            dataset,
            advice,
            transform,
            self.config.unit_label,
            || {
                vec![Box::new(PerformancePlugin {
                    view: Rc::clone(&self.view),
                }) as Box<dyn DrawPlugin>]
            },
        )?;
        log_render(
            self.config.asset_id,
            self.config.surface_id,
            outcome.as_str(),
            points,
            advice.granularity.as_str(),
        );
        Ok(Some(outcome))
    }
}

/// Controllers keyed by asset id plus the chart instances they draw into.
pub struct ReviewRegistry<B: ChartBackend> {
    controllers: BTreeMap<&'static str, ReviewController>,
    charts: ChartLifecycle<B>,
}

impl<B: ChartBackend> ReviewRegistry<B> {
    pub fn from_table(table: &[AssetConfig], backend: B) -> Self {
        Self {
            controllers: table
                .iter()
                .map(|cfg| (cfg.asset_id, ReviewController::new(*cfg)))
                .collect(),
            charts: ChartLifecycle::new(backend),
        }
    }

    pub fn asset_ids(&self) -> Vec<&'static str> {
        self.controllers.keys().copied().collect()
    }

    pub fn controller(&self, asset_id: &str) -> Option<&ReviewController> {
        self.controllers.get(asset_id)
    }

    pub fn charts(&self) -> &ChartLifecycle<B> {
        &self.charts
    }

    pub fn charts_mut(&mut self) -> &mut ChartLifecycle<B> {
        &mut self.charts
    }

    /// Loads every asset's series concurrently. Failed assets get an error
    /// state on their surface and stay eligible for a later load.
    pub async fn load_all(&mut self, store: &SeriesStore) -> Vec<(&'static str, Result<(), SeriesError>)> {
        let results = join_all(self.controllers.iter().map(|(id, c)| async move { (*id, c.load(store).await) })).await;
        for (id, result) in &results {
            if let (Err(err), Some(ctrl)) = (result, self.controllers.get(id)) {
                let surface = ctrl.config().surface_id;
                if let Err(chart_err) = self.charts.show_error(surface, &err.to_string()) {
                    log(
                        Level::Debug,
                        Domain::Chart,
                        "error_state_skipped",
                        obj(&[("surface", v_str(surface)), ("error", v_str(&chart_err.to_string()))]),
                    );
                }
            }
        }
        results
    }

    pub fn bind_controls(&mut self, surface: &mut dyn ControlSurface) {
        for ctrl in self.controllers.values_mut() {
            ctrl.bind_controls(surface);
        }
    }

    /// Dispatches a control event to the controller that bound that id.
    pub fn on_control_change(
        &mut self,
        control_id: &str,
        surface: &mut dyn ControlSurface,
    ) -> Result<Option<RenderOutcome>, ChartError> {
        match self.controllers.values_mut().find(|c| c.owns_control(control_id)) {
            Some(ctrl) => ctrl.on_control_change(control_id, surface, &mut self.charts),
            None => Ok(None),
        }
    }

    pub fn refresh(&mut self, asset_id: &str) -> Result<Option<RenderOutcome>, ChartError> {
        match self.controllers.get(asset_id) {
            Some(ctrl) => ctrl.refresh(&mut self.charts),
            None => Ok(None),
        }
    }

    /// Renders every loaded asset. A missing surface skips that asset only.
    pub fn refresh_all(&mut self) -> Vec<(&'static str, Option<RenderOutcome>)> {
        let mut out = Vec::new();
        for (id, ctrl) in &self.controllers {
            match ctrl.refresh(&mut self.charts) {
                Ok(outcome) => out.push((*id, outcome)),
                Err(err) => {
                    log(
                        Level::Debug,
                        Domain::Chart,
                        "render_skipped",
                        obj(&[("asset_id", v_str(id)), ("error", v_str(&err.to_string()))]),
                    );
                    out.push((*id, None));
                }
            }
        }
        out
    }
}
