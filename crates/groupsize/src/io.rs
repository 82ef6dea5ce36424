//! Output files: simulation tables, derived analysis, and the run manifest

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use groupsize_core::analysis::{
    BucketProbabilities, CORRELATION_METRICS, CORRELATION_PARAMETERS, CorrelationTable,
    DisparityBucket, correlation_table, disparity_probabilities, floor_slices,
};
use groupsize_core::model::ModelKind;
use groupsize_core::sweep::ResultTable;
use serde::{Deserialize, Serialize};

/// Write content to a file atomically using write-then-rename pattern.
///
/// The content is first written to a sibling `.tmp` file, then renamed over
/// the target path.
pub fn atomic_write(path: &Path, content: &str) -> io::Result<()> {
    let extension = path
        .extension()
        .map(|e| format!("{}.tmp", e.to_string_lossy()))
        .unwrap_or_else(|| "tmp".to_string());
    let temp_path = path.with_extension(extension);

    fs::write(&temp_path, content)?;
    fs::rename(&temp_path, path)?;

    Ok(())
}

/// Save a result table as `{dir}/{stem}_simulation.csv`, creating `dir` if needed
pub fn save_simulation_data(
    dir: &Path,
    stem: &str,
    table: &ResultTable,
    with_deviation: bool,
) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{stem}_simulation.csv"));
    atomic_write(&path, &table.to_csv(with_deviation))?;
    tracing::info!(path = %path.display(), rows = table.len(), "simulation data saved");
    Ok(path)
}

/// Bucket shares per group size, one column per bucket
pub fn probabilities_csv(probabilities: &[BucketProbabilities]) -> String {
    let mut out = String::from("prop_disadv,count");
    for bucket in DisparityBucket::ALL {
        out.push(',');
        out.push_str(bucket.label());
    }
    out.push('\n');

    for entry in probabilities {
        out.push_str(&format!("{},{}", entry.prop_disadv, entry.count));
        for share in entry.shares {
            out.push_str(&format!(",{share}"));
        }
        out.push('\n');
    }
    out
}

/// Correlation matrix with parameters as rows; undefined cells left empty
pub fn correlations_csv(table: &CorrelationTable) -> String {
    let mut out = format!("parameter,{}\n", table.columns.join(","));
    for (name, values) in table.rows.iter().zip(&table.values) {
        out.push_str(name);
        for value in values {
            out.push(',');
            if let Some(v) = value {
                out.push_str(&v.to_string());
            }
        }
        out.push('\n');
    }
    out
}

/// Write the probability and correlation CSVs for `table`.
///
/// Sweeps over `min_rate` are analyzed per floor slice, giving
/// `{stem}_disparity_probability_{slice}.csv` and
/// `{stem}_correlations_{slice}.csv` for each slice. Other sweeps get one
/// unsuffixed pair. Correlation rows cover the default parameters present in
/// the table.
pub fn save_analysis(dir: &Path, stem: &str, table: &ResultTable) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)?;

    let slices = floor_slices(table);
    if slices.is_empty() {
        return write_analysis(dir, stem, "", table);
    }

    let mut paths = Vec::with_capacity(2 * slices.len());
    for slice in slices {
        let rows = slice.select(table);
        tracing::debug!(
            slice = slice.suffix(),
            min_rate = slice.min_rate(),
            rows = rows.len(),
            "analyzing floor slice"
        );
        paths.extend(write_analysis(dir, stem, &format!("_{}", slice.suffix()), &rows)?);
    }
    Ok(paths)
}

fn write_analysis(
    dir: &Path,
    stem: &str,
    suffix: &str,
    table: &ResultTable,
) -> io::Result<Vec<PathBuf>> {
    let probabilities_path = dir.join(format!("{stem}_disparity_probability{suffix}.csv"));
    atomic_write(
        &probabilities_path,
        &probabilities_csv(&disparity_probabilities(table)),
    )?;

    let parameters: Vec<&str> = CORRELATION_PARAMETERS
        .into_iter()
        .filter(|name| table.column(name).is_some())
        .collect();
    let correlations_path = dir.join(format!("{stem}_correlations{suffix}.csv"));
    atomic_write(
        &correlations_path,
        &correlations_csv(&correlation_table(table, &parameters, &CORRELATION_METRICS)),
    )?;

    tracing::debug!(stem, suffix, "analysis saved");
    Ok(vec![probabilities_path, correlations_path])
}

/// Metadata written next to the simulation data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub name: String,
    pub model: ModelKind,
    pub seed: u64,
    pub parallel: bool,
    pub total_points: usize,
    pub columns: Vec<String>,
    pub created: jiff::Timestamp,
}

impl RunManifest {
    pub fn save(&self, dir: &Path, stem: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{stem}.manifest.json"));
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        atomic_write(&path, &json)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(io::Error::other)
    }
}
