//! Declarative control bindings: each control id writes one filter field;
//! the three selector groups are shown one at a time to match the mode.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::data::ranges::RangeCatalog;
use crate::filter::{AxisTransform, FilterState, TimeMode};
use crate::logging::{log, obj, v_str, Domain, Level};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    TimeMode,
    Year,
    RangeId,
    AxisTransform,
    CustomStart,
    CustomEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Year,
    Range,
    Custom,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Year, Group::Range, Group::Custom];

    pub fn suffix(&self) -> &'static str {
        match self {
            Group::Year => "year-group",
            Group::Range => "range-group",
            Group::Custom => "custom-group",
        }
    }

    pub fn for_mode(mode: TimeMode) -> Option<Group> {
        match mode {
            TimeMode::All => None,
            TimeMode::Year => Some(Group::Year),
            TimeMode::NamedRange => Some(Group::Range),
            TimeMode::Custom => Some(Group::Custom),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlBinding {
    pub suffix: &'static str,
    pub field: Field,
    pub group: Option<Group>,
}

pub const BINDINGS: &[ControlBinding] = &[
    ControlBinding { suffix: "time-mode", field: Field::TimeMode, group: None },
    ControlBinding { suffix: "year", field: Field::Year, group: Some(Group::Year) },
    ControlBinding { suffix: "range", field: Field::RangeId, group: Some(Group::Range) },
    ControlBinding { suffix: "scale", field: Field::AxisTransform, group: None },
    ControlBinding { suffix: "start", field: Field::CustomStart, group: Some(Group::Custom) },
    ControlBinding { suffix: "end", field: Field::CustomEnd, group: Some(Group::Custom) },
];

pub fn control_id(prefix: &str, suffix: &str) -> String {
    format!("{}-{}", prefix, suffix)
}

/// Page elements as seen by the binder.
pub trait ControlSurface {
    fn exists(&self, id: &str) -> bool;
    fn value(&self, id: &str) -> Option<String>;
    fn set_visible(&mut self, id: &str, visible: bool);
    /// Replaces a selector's (value, label) options.
    fn set_options(&mut self, id: &str, options: &[(&str, &str)]);
}

/// Bindings resolved against one page for one controller.
#[derive(Debug, Clone)]
pub struct BoundControls {
    prefix: String,
    by_id: HashMap<String, ControlBinding>,
}

impl BoundControls {
    /// Keeps only the bindings whose element is present.
    pub fn bind(prefix: &str, surface: &dyn ControlSurface) -> Self {
        let mut by_id = HashMap::new();
        for binding in BINDINGS {
            let id = control_id(prefix, binding.suffix);
            if surface.exists(&id) {
                by_id.insert(id, *binding);
            } else {
                log(
                    Level::Debug,
                    Domain::Controls,
                    "control_absent",
                    obj(&[("control", v_str(&id))]),
                );
            }
        }
        Self {
            prefix: prefix.to_string(),
            by_id,
        }
    }

    pub fn is_bound(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn bound_count(&self) -> usize {
        self.by_id.len()
    }

    /// Reads the control's current value into its field. Returns false for
    /// controls that are unbound or whose write left the state unchanged.
    pub fn handle(&self, id: &str, surface: &mut dyn ControlSurface, state: &mut FilterState) -> bool {
        let Some(binding) = self.by_id.get(id) else {
            return false;
        };
        let raw = surface.value(id).unwrap_or_default();
        let before = state.clone();
        write_field(binding.field, raw.trim(), state);
        if binding.field == Field::TimeMode {
            self.sync_groups(surface, state.time_mode);
        }
        *state != before
    }

    /// Fills the range selector, if bound, with the catalog's windows.
    pub fn populate_ranges(&self, surface: &mut dyn ControlSurface) {
        let id = control_id(&self.prefix, "range");
        if !self.is_bound(&id) {
            return;
        }
        let options: Vec<(&str, &str)> = RangeCatalog::entries().iter().map(|r| (r.id, r.label)).collect();
        surface.set_options(&id, &options);
    }

    /// Shows only the group belonging to `mode`.
    pub fn sync_groups(&self, surface: &mut dyn ControlSurface, mode: TimeMode) {
        let active = Group::for_mode(mode);
        for group in Group::ALL {
            let id = control_id(&self.prefix, group.suffix());
            if surface.exists(&id) {
                surface.set_visible(&id, active == Some(group));
            }
        }
    }
}

fn write_field(field: Field, raw: &str, state: &mut FilterState) {
    match field {
        Field::TimeMode => {
            if let Some(mode) = TimeMode::parse(raw) {
                state.time_mode = mode;
            }
        }
        Field::Year => state.year = raw.parse().ok(),
        Field::RangeId => state.range_id = (!raw.is_empty()).then(|| raw.to_string()),
        Field::AxisTransform => {
            if let Some(t) = AxisTransform::parse(raw) {
                state.axis_transform = t;
            }
        }
        Field::CustomStart => state.custom_start = parse_date(raw),
        Field::CustomEnd => state.custom_end = parse_date(raw),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// In-memory page: element values and visibility by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryControls {
    values: HashMap<String, String>,
    hidden: HashMap<String, bool>,
    options: HashMap<String, Vec<(String, String)>>,
}

impl MemoryControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element with an initial value.
    pub fn with(mut self, id: &str, value: &str) -> Self {
        self.values.insert(id.to_string(), value.to_string());
        self
    }

    /// Adds the full control set for `prefix`.
    pub fn with_all(mut self, prefix: &str) -> Self {
        for binding in BINDINGS {
            self.values.entry(control_id(prefix, binding.suffix)).or_default();
        }
        for group in Group::ALL {
            self.values.entry(control_id(prefix, group.suffix())).or_default();
        }
        self
    }

    pub fn set(&mut self, id: &str, value: &str) {
        if let Some(slot) = self.values.get_mut(id) {
            *slot = value.to_string();
        }
    }

    pub fn options(&self, id: &str) -> &[(String, String)] {
        self.options.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.values.contains_key(id) && !self.hidden.get(id).copied().unwrap_or(false)
    }
}

impl ControlSurface for MemoryControls {
    fn exists(&self, id: &str) -> bool {
        self.values.contains_key(id)
    }

    fn value(&self, id: &str) -> Option<String> {
        self.values.get(id).cloned()
    }

    fn set_visible(&mut self, id: &str, visible: bool) {
        self.hidden.insert(id.to_string(), !visible);
    }

    fn set_options(&mut self, id: &str, options: &[(&str, &str)]) {
        self.options.insert(
            id.to_string(),
            options.iter().map(|(v, l)| (v.to_string(), l.to_string())).collect(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_controls_are_skipped() {
        let page = MemoryControls::new().with("usd-year", "2021");
        let bound = BoundControls::bind("usd", &page);
        assert_eq!(bound.bound_count(), 1);
        assert!(bound.is_bound("usd-year"));
        assert!(!bound.is_bound("usd-range"));
    }

    #[test]
    fn test_mode_switch_toggles_groups() {
        let mut page = MemoryControls::new().with_all("usd");
        let bound = BoundControls::bind("usd", &page);
        let mut state = FilterState::default();

        page.set("usd-time-mode", "range");
        assert!(bound.handle("usd-time-mode", &mut page, &mut state));
        assert_eq!(state.time_mode, TimeMode::NamedRange);
        assert!(page.is_visible("usd-range-group"));
        assert!(!page.is_visible("usd-year-group"));
        assert!(!page.is_visible("usd-custom-group"));

        page.set("usd-time-mode", "all");
        bound.handle("usd-time-mode", &mut page, &mut state);
        for group in Group::ALL {
            assert!(!page.is_visible(&control_id("usd", group.suffix())));
        }
    }

    #[test]
    fn test_field_writes() {
        let mut page = MemoryControls::new().with_all("p");
        let bound = BoundControls::bind("p", &page);
        let mut state = FilterState::default();

        page.set("p-year", "2020");
        bound.handle("p-year", &mut page, &mut state);
        page.set("p-start", "2021-03-04");
        bound.handle("p-start", &mut page, &mut state);
        page.set("p-scale", "log");
        bound.handle("p-scale", &mut page, &mut state);
        assert_eq!(state.year, Some(2020));
        assert_eq!(state.custom_start, NaiveDate::from_ymd_opt(2021, 3, 4));
        assert_eq!(state.axis_transform, AxisTransform::Logarithmic);

        page.set("p-year", "");
        assert!(bound.handle("p-year", &mut page, &mut state));
        assert_eq!(state.year, None);
    }

    #[test]
    fn test_range_selector_lists_catalog() {
        let mut page = MemoryControls::new().with_all("eur");
        BoundControls::bind("eur", &page).populate_ranges(&mut page);
        let options = page.options("eur-range");
        assert_eq!(options.len(), RangeCatalog::entries().len());
        assert_eq!(options[0].0, "genesis");
        assert_eq!(options[3], ("cycle-3".to_string(), "Cycle 3 (2020-2024)".to_string()));

        let mut bare = MemoryControls::new().with("eur-year", "");
        BoundControls::bind("eur", &bare).populate_ranges(&mut bare);
        assert!(bare.options("eur-range").is_empty());
    }

    #[test]
    fn test_unbound_id_is_ignored() {
        let mut page = MemoryControls::new();
        let bound = BoundControls::bind("p", &page);
        let mut state = FilterState::default();
        assert!(!bound.handle("p-year", &mut page, &mut state));
        assert_eq!(state, FilterState::default());
    }
}
