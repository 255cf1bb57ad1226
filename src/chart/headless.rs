//! In-memory chart backend: keeps the configured state and the text drawn by
//! overlay plugins so a run can be inspected or logged without a browser.

use chrono::{DateTime, Datelike, Utc};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};

use super::{Anchor, ChartBackend, ChartError, ChartInstance, ChartSpec, Dataset, DrawPlugin, OverlayCanvas};
use crate::axis::{AxisAdvice, Granularity};
use crate::filter::AxisTransform;

#[derive(Debug, Clone, PartialEq)]
pub struct DrawnText {
    pub text: String,
    pub color: String,
    pub anchor: Anchor,
}

#[derive(Debug, Default)]
struct TextCanvas {
    drawn: Vec<DrawnText>,
}

impl OverlayCanvas for TextCanvas {
    fn draw_text(&mut self, text: &str, color: &str, anchor: Anchor) {
        self.drawn.push(DrawnText {
            text: text.to_string(),
            color: color.to_string(),
            anchor,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    DoubleClick,
    Wheel { zoom_in: bool },
    Drag { dx_ms: i64 },
}

pub struct HeadlessChart {
    surface: String,
    spec: ChartSpec,
    plugins: Vec<Box<dyn DrawPlugin>>,
    paints: u64,
    overlay: Vec<DrawnText>,
    zoom: f64,
    pan_ms: i64,
}

impl HeadlessChart {
    pub fn surface(&self) -> &str {
        &self.surface
    }

    pub fn spec(&self) -> &ChartSpec {
        &self.spec
    }

    pub fn paints(&self) -> u64 {
        self.paints
    }

    /// Text drawn by plugins during the last paint.
    pub fn overlay(&self) -> &[DrawnText] {
        &self.overlay
    }

    pub fn overlay_text(&self) -> Option<&str> {
        self.overlay.first().map(|d| d.text.as_str())
    }

    pub fn is_zoomed(&self) -> bool {
        self.zoom != 1.0 || self.pan_ms != 0
    }

    pub fn zoom_level(&self) -> f64 {
        self.zoom
    }

    pub fn handle_gesture(&mut self, gesture: Gesture) {
        let zoom = self.spec.zoom;
        match gesture {
            Gesture::DoubleClick if zoom.reset_on_double_click => {
                self.zoom = 1.0;
                self.pan_ms = 0;
            }
            Gesture::Wheel { zoom_in } if zoom.wheel_zoom_x => {
                self.zoom *= if zoom_in { 1.25 } else { 0.8 };
            }
            Gesture::Drag { dx_ms } if zoom.pan_x => self.pan_ms += dx_ms,
            _ => return,
        }
        self.repaint();
    }

    /// Hover text for the point nearest `ts_ms` by index on the x axis.
    pub fn hover(&self, ts_ms: i64) -> Option<String> {
        let points = &self.spec.dataset.points;
        let idx = match points.binary_search_by_key(&ts_ms, |(t, _)| *t) {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) if i >= points.len() => points.len().checked_sub(1)?,
            Err(i) => {
                if ts_ms - points[i - 1].0 <= points[i].0 - ts_ms {
                    i - 1
                } else {
                    i
                }
            }
        };
        points
            .get(idx)
            .map(|(_, v)| self.spec.tooltip.format(*v))
    }

    /// Tick labels: one per granularity bucket, at its first point.
    pub fn x_ticks(&self) -> Vec<String> {
        let advice = self.spec.x_axis;
        let mut last_bucket = None;
        let mut ticks = Vec::new();
        for (ms, _) in &self.spec.dataset.points {
            let Some(ts) = DateTime::<Utc>::from_timestamp_millis(*ms) else {
                continue;
            };
            let bucket = match advice.granularity {
                Granularity::Month => (ts.year(), ts.month0()),
                Granularity::Quarter => (ts.year(), ts.month0() / 3),
                Granularity::Year => (ts.year(), 0),
            };
            if last_bucket != Some(bucket) {
                last_bucket = Some(bucket);
                ticks.push(
                    advice
                        .label
                        .label(ts)
                        .unwrap_or_else(|| ts.format("%Y-%m-%d").to_string()),
                );
            }
        }
        ticks
    }

    pub fn snapshot(&self) -> Value {
        json!({
            "surface": self.surface,
            "label": self.spec.dataset.label,
            "color": self.spec.dataset.color,
            "points": self.spec.dataset.len(),
            "granularity": self.spec.x_axis.granularity.as_str(),
            "y_axis": self.spec.y_transform.as_str(),
            "plugins": self.spec.plugins,
            "paints": self.paints,
            "overlay": self.overlay_text(),
            "ticks": self.x_ticks(),
        })
    }
}

impl ChartInstance for HeadlessChart {
    fn set_dataset(&mut self, dataset: Dataset) {
        self.spec.dataset = dataset;
    }

    fn set_x_axis(&mut self, advice: AxisAdvice) {
        self.spec.x_axis = advice;
    }

    fn set_y_transform(&mut self, transform: AxisTransform) {
        self.spec.y_transform = transform;
    }

    fn repaint(&mut self) {
        self.paints += 1;
        let mut canvas = TextCanvas::default();
        for plugin in &self.plugins {
            plugin.after_draw(&mut canvas);
        }
        self.overlay = canvas.drawn;
    }
}

/// Backend over a fixed set of surfaces, or any surface when unrestricted.
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    surfaces: Option<HashSet<String>>,
    created: usize,
    errors: HashMap<String, String>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_surfaces<I, S>(surfaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            surfaces: Some(surfaces.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    fn check(&self, surface: &str) -> Result<(), ChartError> {
        match &self.surfaces {
            Some(known) if !known.contains(surface) => Err(ChartError::SurfaceMissing {
                surface: surface.to_string(),
            }),
            _ => Ok(()),
        }
    }

    /// Number of chart instances ever constructed.
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn error_for(&self, surface: &str) -> Option<&str> {
        self.errors.get(surface).map(String::as_str)
    }
}

impl ChartBackend for HeadlessBackend {
    type Chart = HeadlessChart;

    fn create(
        &mut self,
        surface: &str,
        spec: ChartSpec,
        plugins: Vec<Box<dyn DrawPlugin>>,
    ) -> Result<HeadlessChart, ChartError> {
        self.check(surface)?;
        self.created += 1;
        self.errors.remove(surface);
        Ok(HeadlessChart {
            surface: surface.to_string(),
            spec,
            plugins,
            paints: 0,
            overlay: Vec::new(),
            zoom: 1.0,
            pan_ms: 0,
        })
    }

    fn show_error(&mut self, surface: &str, message: &str) -> Result<(), ChartError> {
        self.check(surface)?;
        self.errors.insert(surface.to_string(), message.to_string());
        Ok(())
    }
}
