//! Headless dashboard driver.
//!
//! Usage: chainview [path] [asset-id] [control=value ...]
//!
//! Applies `path` to the navigation hierarchy, loads every asset series,
//! renders each comparison chart, then replays the given control changes on
//! one asset and logs the resulting chart states.

use anyhow::{anyhow, Result};
use serde_json::json;

use chainview::chart::headless::HeadlessBackend;
use chainview::config::Config;
use chainview::controls::{control_id, MemoryControls};
use chainview::data::source::{DirSource, HttpSource, SeriesSource};
use chainview::data::SeriesStore;
use chainview::logging::{log, obj, v_str, Domain, Level};
use chainview::review::{ReviewRegistry, ASSETS};
use chainview::router::view::{MemoryHistory, RecordingSurface, ViewRouter};
use chainview::router::RouteTable;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cfg = Config::from_env();
    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .or_else(|| cfg.initial_path.clone())
        .unwrap_or_default();
    let asset = args.next();
    let changes: Vec<(String, String)> = args
        .filter_map(|a| a.split_once('=').map(|(k, v)| (k.to_string(), v.to_string())))
        .collect();

    let source: Box<dyn SeriesSource> = match &cfg.series_dir {
        Some(dir) => Box::new(DirSource::new(dir)),
        None => Box::new(HttpSource::new(&cfg.series_base_url, cfg.http_timeout_secs)?),
    };
    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("path", v_str(&path)),
            ("series_base", v_str(cfg.series_dir.as_deref().unwrap_or(&cfg.series_base_url))),
            ("max_retries", json!(cfg.max_retries)),
        ]),
    );
    let store = SeriesStore::with_retry(source, cfg.retry());

    let mut router = ViewRouter::new(RouteTable::standard()?, MemoryHistory::new());
    let mut nav = RecordingSurface::new();
    if !router.initial_load(&path, &mut nav) {
        log(
            Level::Info,
            Domain::Router,
            "default_view",
            obj(&[("path", v_str(&path))]),
        );
    }

    let mut registry = ReviewRegistry::from_table(ASSETS, HeadlessBackend::new());
    let mut page = ASSETS
        .iter()
        .fold(MemoryControls::new(), |page, a| page.with_all(a.control_prefix));
    registry.bind_controls(&mut page);

    for (asset_id, result) in registry.load_all(&store).await {
        if let Err(err) = result {
            log(
                Level::Warn,
                Domain::Data,
                "asset_unavailable",
                obj(&[("asset_id", v_str(asset_id)), ("error", v_str(&err.to_string()))]),
            );
        }
    }
    registry.refresh_all();

    if let Some(asset_id) = asset {
        let prefix = registry
            .controller(&asset_id)
            .map(|c| c.config().control_prefix)
            .ok_or_else(|| anyhow!("unknown asset {}", asset_id))?;
        for (suffix, value) in &changes {
            let id = control_id(prefix, suffix);
            page.set(&id, value);
            registry.on_control_change(&id, &mut page)?;
        }
    }

    for asset_id in registry.asset_ids() {
        let Some(ctrl) = registry.controller(asset_id) else {
            continue;
        };
        let surface = ctrl.config().surface_id;
        let chart = registry.charts().chart(surface).map(|c| c.snapshot());
        log(
            Level::Info,
            Domain::Chart,
            "chart_state",
            obj(&[
                ("asset_id", v_str(asset_id)),
                ("surface", v_str(surface)),
                ("chart", chart.unwrap_or(serde_json::Value::Null)),
                ("error", json!(registry.charts().backend().error_for(surface))),
                ("report", json!(store.report(ctrl.config().source))),
            ]),
        );
    }

    let nav_state = router.state();
    log(
        Level::Info,
        Domain::Router,
        "navigation",
        obj(&[
            ("tab", json!(nav_state.tab)),
            ("subtab", json!(nav_state.subtab)),
            ("subsubtab", json!(nav_state.subsubtab)),
            ("address", v_str(&router.history().address())),
        ]),
    );
    Ok(())
}
