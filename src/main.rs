use std::env;
use std::process::ExitCode;

use stclust::{loader, ArrestProfile, Dbscan, DbscanParams, OffenseCategory};
use strum::IntoEnumIterator;

fn main() -> ExitCode {
    pretty_env_logger::init();

    let mut args = env::args().skip(1);
    let Some(arrests_path) = args.next() else {
        eprintln!("usage: stclust <arrests.csv> [events.csv]");
        return ExitCode::FAILURE;
    };
    let events_path = args.next();

    match run(&arrests_path, events_path.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(arrests_path: &str, events_path: Option<&str>) -> stclust::Result<()> {
    let arrests = loader::load_arrests_from_path(arrests_path)?;
    let profile = ArrestProfile::from_records(&arrests);

    println!("{} arrests across the tracked categories", profile.total);
    for (category, count) in &profile.by_category {
        println!("  {category}: {count}");
    }
    for (borough, count) in &profile.by_borough {
        println!("  {borough}: {count}");
    }
    if let Some(hour) = profile.peak_hour() {
        println!("peak hour of day: {hour:02}:00");
    }

    let params = DbscanParams::builder().build()?;
    println!("\nhotspot clusters per category (eps 0.5km, min_samples 5):");
    for category in OffenseCategory::iter() {
        let positions: Vec<Vec<f64>> = arrests
            .iter()
            .filter(|r| r.category == category)
            .map(|r| r.position())
            .collect();
        let assignment = Dbscan::new(&positions, params.clone()).cluster()?;
        println!(
            "  {category}: {} clusters, {} noise of {}",
            assignment.cluster_count(),
            assignment.noise_count(),
            positions.len()
        );
    }

    if let Some(path) = events_path {
        let events = loader::load_events_from_path(path)?;
        println!("\n{} permitted events:", events.len());
        for event in &events {
            println!(
                "  {} ({}, {} -> {})",
                event.name,
                event.borough,
                event.start.format("%Y-%m-%d %H:%M"),
                event.end.format("%Y-%m-%d %H:%M")
            );
        }
    }

    Ok(())
}
