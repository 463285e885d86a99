//! Batch driver for the centroid-size table

use crate::config::BatchConfig;
use log::info;
use morphocrate_algorithms::{centroid_size, collect_outcomes, BatchReport};
use morphocrate_core::Result;
use morphocrate_io::{discover_mesh_files, mesh_identifier, CentroidSizeTableWriter, IoRegistry};
use rayon::prelude::*;

/// Measure every mesh `config` selects and write the result table.
///
/// Meshes are discovered in file-name order and the table keeps that order.
/// Each mesh is read and measured on the rayon pool; its points are dropped
/// as soon as its centroid size is known. Under
/// [`EmptyMeshPolicy::Fail`](morphocrate_algorithms::EmptyMeshPolicy::Fail)
/// a failing mesh aborts the run and no table is written.
pub fn run_batch(config: &BatchConfig, registry: &IoRegistry) -> Result<BatchReport> {
    config.validate()?;

    let files = discover_mesh_files(&config.source_dir, &config.extension_filter)?;
    info!(
        "Measuring {} meshes from {}",
        files.len(),
        config.source_dir.display()
    );

    let outcomes: Vec<(String, Result<f64>)> = files
        .par_iter()
        .map(|path| {
            let outcome = registry
                .read_point_set(path)
                .and_then(|points| centroid_size(&points));
            (mesh_identifier(path), outcome)
        })
        .collect();

    let report = collect_outcomes(outcomes, config.on_empty_mesh)?;

    CentroidSizeTableWriter::write(&report.records, &config.dest_path, &config.table_options())?;
    info!(
        "Wrote {} centroid sizes to {}",
        report.records.len(),
        config.dest_path.display()
    );

    Ok(report)
}
