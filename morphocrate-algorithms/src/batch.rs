//! Batch application of the centroid-size statistic
//!
//! Every mesh is measured independently, so the work is spread over the rayon
//! pool. Results are collected through indexed parallel iterators, which
//! leaves each result in the slot of its input: the output order is always
//! the input order.

use crate::centroid::centroid_size;
use log::{info, warn};
use morphocrate_core::{CentroidSizeRecord, Error, PointSet, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// What to do with a mesh that yields no points or cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyMeshPolicy {
    /// Log the failure, leave the mesh out of the table and continue
    #[default]
    Skip,
    /// Abort the whole batch at the first failing mesh
    Fail,
}

impl std::str::FromStr for EmptyMeshPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "skip" => Ok(EmptyMeshPolicy::Skip),
            "fail" => Ok(EmptyMeshPolicy::Fail),
            other => Err(Error::Config(format!(
                "unknown empty mesh policy '{}', expected 'skip' or 'fail'",
                other
            ))),
        }
    }
}

/// A mesh left out of the table under [`EmptyMeshPolicy::Skip`]
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedMesh {
    pub identifier: String,
    pub reason: String,
}

/// Outcome of a batch run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// One record per successfully measured mesh, in input order
    pub records: Vec<CentroidSizeRecord>,
    /// Meshes that were skipped, in input order
    pub skipped: Vec<SkippedMesh>,
}

impl BatchReport {
    /// Total number of meshes the batch saw
    pub fn processed(&self) -> usize {
        self.records.len() + self.skipped.len()
    }
}

/// Compute the centroid size of every `(identifier, points)` pair.
///
/// The returned records keep the order of `sources`; identifiers are never
/// re-sorted here, discovery order is the caller's decision.
///
/// # Errors
/// Under [`EmptyMeshPolicy::Fail`], the first failing mesh in input order
/// is returned as [`Error::Mesh`].
pub fn process_batch(sources: &[(String, PointSet)], policy: EmptyMeshPolicy) -> Result<BatchReport> {
    let outcomes: Vec<(String, Result<f64>)> = sources
        .par_iter()
        .map(|(identifier, points)| (identifier.clone(), centroid_size(points)))
        .collect();

    collect_outcomes(outcomes, policy)
}

/// Apply the per-mesh failure policy to ordered measurement outcomes.
///
/// Read failures and empty point sets are treated alike.
pub fn collect_outcomes(
    outcomes: Vec<(String, Result<f64>)>,
    policy: EmptyMeshPolicy,
) -> Result<BatchReport> {
    let mut report = BatchReport {
        records: Vec::with_capacity(outcomes.len()),
        skipped: Vec::new(),
    };

    for (identifier, outcome) in outcomes {
        match outcome {
            Ok(size) => report.records.push(CentroidSizeRecord::new(identifier, size)),
            Err(err) => match policy {
                EmptyMeshPolicy::Fail => return Err(err.for_mesh(identifier)),
                EmptyMeshPolicy::Skip => {
                    warn!("Skipping {}: {}", identifier, err);
                    report.skipped.push(SkippedMesh {
                        identifier,
                        reason: err.to_string(),
                    });
                }
            },
        }
    }

    info!(
        "Measured {} of {} meshes ({} skipped)",
        report.records.len(),
        report.processed(),
        report.skipped.len()
    );

    Ok(report)
}
