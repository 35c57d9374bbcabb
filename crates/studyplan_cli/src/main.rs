//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `studyplan_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use studyplan_core::{AppStore, SqliteDocumentStorage, PERIODS_PER_SESSION};

fn main() {
    println!("studyplan_core version={}", studyplan_core::core_version());

    // In-memory DB keeps the probe independent from any real planner data.
    let storage = match SqliteDocumentStorage::open_in_memory() {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("studyplan_core store=unavailable error={err}");
            std::process::exit(1);
        }
    };
    let store = AppStore::open(storage);

    let periods: usize = store
        .schedule()
        .iter()
        .map(|day| day.morning.len() + day.afternoon.len())
        .sum();
    println!(
        "studyplan_core store ready={} days={} periods={} periods_per_session={}",
        store.is_ready(),
        store.schedule().len(),
        periods,
        PERIODS_PER_SESSION
    );
    println!(
        "studyplan_core store extra_classes={} notes={}",
        store.extra_classes().len(),
        store.notes().len()
    );
}
