// Summary printing and CSV export for completed runs

use hitormiss::{AppConfig, RunReport};
use serde::Serialize;
use std::path::Path;

/// One CSV row per run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CsvResultRow {
    pub bucket_key_prefix: String,
    pub buckets: usize,
    pub probes: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub backfill_failures: u64,
    pub buckets_created: u64,
    pub buckets_preexisting: u64,
    pub buckets_deleted: u64,
    pub delete_failures: u64,
    pub elapsed_ms: u64,
}

impl CsvResultRow {
    /// Flattens a run report into a row
    pub fn new(config: &AppConfig, report: &RunReport) -> Self {
        Self {
            bucket_key_prefix: config.bucket_key_prefix.clone(),
            buckets: config.initial_number_of_buckets,
            probes: report.generator.probes,
            hits: report.tally.hits,
            misses: report.tally.misses,
            hit_rate: report.tally.hit_rate(),
            backfill_failures: report.generator.backfill_failures,
            buckets_created: report.setup.created,
            buckets_preexisting: report.setup.preexisting,
            buckets_deleted: report.teardown.deleted,
            delete_failures: report.teardown.failed,
            elapsed_ms: report.elapsed_ms(),
        }
    }
}

/// Print a summary report of a run
pub fn print_summary(config: &AppConfig, report: &RunReport) {
    let workload = config.workload();
    let (lo, hi) = workload.draw_range();

    println!("\nHit/Miss Simulation Summary");
    println!("===========================");
    println!("Bucket prefix:  {}", config.bucket_key_prefix);
    println!("Seeded buckets: {}", workload.seeded_keys);
    println!("Probes:         {} (keys drawn from [{}, {}])", report.generator.probes, lo, hi);
    println!("Duration:       {:.3}s", report.elapsed.as_secs_f64());

    println!(
        "\n{:<12} {:>10} {:>10} {:>10} {:>8}",
        "Source", "Hits", "Misses", "Total", "HitRate"
    );
    println!("{}", "-".repeat(54));
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>7.2}%",
        "aggregator",
        report.tally.hits,
        report.tally.misses,
        report.tally.total(),
        report.tally.hit_rate()
    );
    println!(
        "{:<12} {:>10} {:>10} {:>10} {:>8}",
        "generator",
        report.generator.hits,
        report.generator.misses,
        report.generator.probes,
        ""
    );

    println!("\nDataset:");
    println!(
        "  setup:    {} created, {} already present",
        report.setup.created, report.setup.preexisting
    );
    println!(
        "  teardown: {} deleted, {} failed, {} accumulators removed",
        report.teardown.deleted, report.teardown.failed, report.teardown.accumulators_deleted
    );
    if report.generator.backfill_failures > 0 {
        println!(
            "  warning:  {} misses could not be backfilled",
            report.generator.backfill_failures
        );
    }
}

/// Export a run to a CSV file
pub fn export_csv(path: &Path, config: &AppConfig, report: &RunReport) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.serialize(CsvResultRow::new(config, report))?;
    writer.flush()?;
    Ok(())
}
