//! Main application entry point
//!
//! Builds a grid over random sample data, applies a filter, a two level
//! sort and a saved view, then prints the result and exports it to CSV.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info, warn};

use sg_core::events::events::{FiltersChanged, SavedViewsChanged, SortChanged, SummaryChanged, ViewChanged};
use sg_core::{CellValue, SortDirection, TableIdCounter};
use sg_data::{JsonViewStore, StoreLocation, ViewStore};
use sg_views::{CsvSnapshotSink, ExportOutcome, ExportScope, GridConfig, GridProxy, SnapshotSink};

mod create_sample_data;

const SAMPLE_ROWS: usize = 50;
const PREVIEW_ROWS: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    info!("Starting smart grid demo");

    let table = create_sample_data::create_sample_table(SAMPLE_ROWS)?;
    let store: Arc<dyn ViewStore> = Arc::new(JsonViewStore::from_location(&StoreLocation::default()));
    let ids = TableIdCounter::new();
    let config = GridConfig::named("People").with_summary(&["Height", "Income"]);

    let mut grid = GridProxy::with_store(Box::new(table), config, &ids, store)?;
    subscribe_logging(&grid);

    // Employed people and people whose employment is unknown
    grid.set_filter(
        "Is_Employed",
        Some(vec![CellValue::Bool(true), CellValue::Null]),
    )?;
    grid.set_sort_levels(&[
        ("Last Name".to_string(), SortDirection::Ascending),
        ("Age".to_string(), SortDirection::Descending),
    ])?;

    grid.hide_column("Registration_Date")?;
    match grid.save_view("Compact") {
        Ok(name) => info!("Saved view '{}'", name),
        // A previous run already saved it
        Err(e) => warn!("View not saved: {}", e),
    }

    print_grid(&grid);
    print_summary(&grid);

    let path = std::env::temp_dir().join(format!("{}_export.csv", grid.name()));
    let snapshot = grid.export_snapshot(ExportScope::CurrentView, true)?;
    let sink = CsvSnapshotSink::new(&path);
    match sink.write(snapshot, Arc::new(AtomicBool::new(false))).await {
        Ok(ExportOutcome::Completed { rows }) => info!("Exported {} rows to {}", rows, path.display()),
        Ok(ExportOutcome::Cancelled { rows_written }) => {
            warn!("Export cancelled after {} rows", rows_written)
        }
        Err(e) => error!("Export failed: {:#}", e),
    }

    Ok(())
}

fn subscribe_logging(grid: &GridProxy) {
    let events = grid.events();
    events.subscribe_fn::<FiltersChanged, _>(|e| {
        info!("{}: filters on {:?}, {} rows visible", e.table, e.filtered_columns, e.visible_rows)
    });
    events.subscribe_fn::<SortChanged, _>(|e| info!("{}: sort {:?}", e.table, e.sort));
    events.subscribe_fn::<ViewChanged, _>(|e| info!("{}: view '{}'", e.table, e.view_name));
    events.subscribe_fn::<SavedViewsChanged, _>(|e| info!("{}: saved views {:?}", e.table, e.names));
    events.subscribe_fn::<SummaryChanged, _>(|e| tracing::debug!("{}: summary changed", e.table));
}

fn print_grid(grid: &GridProxy) {
    println!("{} ({} of {} rows)", grid.name(), grid.row_count(), grid.source().row_count());
    println!("{}", grid.columns().join(" | "));
    for row in grid.display_rows().iter().take(PREVIEW_ROWS) {
        println!("{}", row.join(" | "));
    }
    if grid.row_count() > PREVIEW_ROWS {
        println!("... {} more", grid.row_count() - PREVIEW_ROWS);
    }
}

fn print_summary(grid: &GridProxy) {
    for attribute in grid.summary().attributes() {
        let mut line = format!("{}: {}", attribute.name, attribute.total_text());
        if attribute.shows_filtered() {
            line.push_str(&format!("  filtered {}", attribute.filtered_text()));
        }
        println!("{}", line);
    }
}
