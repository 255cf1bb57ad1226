//! Chart configuration and the one-instance-per-surface lifecycle.
//!
//! The drawing library itself sits behind [`ChartBackend`]: it is handed a
//! declarative [`ChartSpec`] once per surface and afterwards only receives
//! in-place mutations followed by a repaint.

use std::collections::HashMap;

use crate::axis::AxisAdvice;
use crate::data::SeriesPoint;
use crate::filter::AxisTransform;

pub mod headless;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChartError {
    #[error("display surface {surface} not present")]
    SurfaceMissing { surface: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub label: String,
    pub color: String,
    /// (epoch millis, value)
    pub points: Vec<(i64, f64)>,
}

impl Dataset {
    pub fn from_points(label: &str, color: &str, points: &[SeriesPoint]) -> Self {
        Self {
            label: label.to_string(),
            color: color.to_string(),
            points: points.iter().map(|p| (p.ts.timestamp_millis(), p.value)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Hover picks the nearest index along the shared x axis, not the point under
/// the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub nearest_index: bool,
    pub intersect: bool,
    pub shared_x_axis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tooltip {
    pub decimals: usize,
    pub unit_label: String,
}

impl Tooltip {
    pub fn format(&self, value: f64) -> String {
        format!("{:.*} {}", self.decimals, value, self.unit_label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomConfig {
    pub pan_x: bool,
    pub wheel_zoom_x: bool,
    pub reset_on_double_click: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub dataset: Dataset,
    pub x_axis: AxisAdvice,
    pub y_transform: AxisTransform,
    pub interaction: Interaction,
    pub tooltip: Tooltip,
    pub zoom: ZoomConfig,
    pub plugins: Vec<&'static str>,
}

impl ChartSpec {
    pub fn comparison(
        dataset: Dataset,
        x_axis: AxisAdvice,
        y_transform: AxisTransform,
        unit_label: &str,
        plugins: Vec<&'static str>,
    ) -> Self {
        Self {
            dataset,
            x_axis,
            y_transform,
            interaction: Interaction {
                nearest_index: true,
                intersect: false,
                shared_x_axis: true,
            },
            tooltip: Tooltip {
                decimals: 2,
                unit_label: unit_label.to_string(),
            },
            zoom: ZoomConfig {
                pan_x: true,
                wheel_zoom_x: true,
                reset_on_double_click: true,
            },
            plugins,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    TopLeft,
}

pub trait OverlayCanvas {
    fn draw_text(&mut self, text: &str, color: &str, anchor: Anchor);
}

/// Hook run by the chart after every paint.
pub trait DrawPlugin {
    fn id(&self) -> &'static str;
    fn after_draw(&self, canvas: &mut dyn OverlayCanvas);
}

pub trait ChartInstance {
    fn set_dataset(&mut self, dataset: Dataset);
    fn set_x_axis(&mut self, advice: AxisAdvice);
    fn set_y_transform(&mut self, transform: AxisTransform);
    fn repaint(&mut self);
}

pub trait ChartBackend {
    type Chart: ChartInstance;

    fn create(
        &mut self,
        surface: &str,
        spec: ChartSpec,
        plugins: Vec<Box<dyn DrawPlugin>>,
    ) -> Result<Self::Chart, ChartError>;

    /// Replaces the surface's content with an error message.
    fn show_error(&mut self, surface: &str, message: &str) -> Result<(), ChartError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    Created,
    Updated,
}

impl RenderOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderOutcome::Created => "created",
            RenderOutcome::Updated => "updated",
        }
    }
}

/// Owns at most one live chart per surface id.
pub struct ChartLifecycle<B: ChartBackend> {
    backend: B,
    charts: HashMap<String, B::Chart>,
}

impl<B: ChartBackend> ChartLifecycle<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            charts: HashMap::new(),
        }
    }

    /// Creates the surface's chart on first use; afterwards mutates it in
    /// place and repaints. `plugins` is only invoked on creation.
    pub fn render<P>(
        &mut self,
        surface: &str,
        dataset: Dataset,
        advice: AxisAdvice,
        transform: AxisTransform,
        unit_label: &str,
        plugins: P,
    ) -> Result<RenderOutcome, ChartError>
    where
        P: FnOnce() -> Vec<Box<dyn DrawPlugin>>,
    {
        if let Some(chart) = self.charts.get_mut(surface) {
            chart.set_dataset(dataset);
            chart.set_x_axis(advice);
            chart.set_y_transform(transform);
            chart.repaint();
            return Ok(RenderOutcome::Updated);
        }

        let plugins = plugins();
        let ids = plugins.iter().map(|p| p.id()).collect();
        let spec = ChartSpec::comparison(dataset, advice, transform, unit_label, ids);
        let mut chart = self.backend.create(surface, spec, plugins)?;
        chart.repaint();
        self.charts.insert(surface.to_string(), chart);
        Ok(RenderOutcome::Created)
    }

    pub fn show_error(&mut self, surface: &str, message: &str) -> Result<(), ChartError> {
        self.backend.show_error(surface, message)
    }

    pub fn chart(&self, surface: &str) -> Option<&B::Chart> {
        self.charts.get(surface)
    }

    pub fn chart_mut(&mut self, surface: &str) -> Option<&mut B::Chart> {
        self.charts.get_mut(surface)
    }

    pub fn live_count(&self) -> usize {
        self.charts.len()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}
