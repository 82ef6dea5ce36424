//! Derived metrics over sweep results: deviations from the population
//! average, disparity-ratio buckets, and parameter/metric correlations.

use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::sweep::{ResultTable, SimulationRow};

/// Grid key of the rate floor
pub const FLOOR_KEY: &str = "min_rate";

/// Index into the ascending distinct floors of the constrained slice
const CONSTRAINED_FLOOR_POSITION: usize = 5;

/// Grid parameters correlated against outcome metrics by default
pub const CORRELATION_PARAMETERS: [&str; 3] = ["prop_disadv", "gamma", "z_position_gap"];

/// Outcome metrics correlated against parameters by default
pub const CORRELATION_METRICS: [&str; 7] = [
    "disparity_ratio",
    "rate_difference",
    "rate_disadv",
    "disadv_delta_from_avg_percent",
    "rate_adv",
    "adv_delta_from_avg_percent",
    "normalized_disparity_index",
];

/// How far each group's rate sits from the population average
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationMetrics {
    pub disadv_delta_from_avg: f64,
    pub disadv_delta_from_avg_percent: f64,
    pub adv_delta_from_avg_percent: f64,
    /// Same form as the bias parameter, 1.0 for an infinite ratio
    pub normalized_disparity_index: f64,
    /// Disparity ratio rounded half to even
    pub disparity_ratio_rounded: f64,
    /// Range label of the rounded ratio, e.g. `"2.5-3.49"`
    pub disparity_ratio_label: String,
}

impl DeviationMetrics {
    /// Deviations are taken against the row's rounded `pop_avg`
    pub fn from_row(row: &SimulationRow) -> Self {
        let pop_avg = row.pop_avg as f64;
        let percent = |rate: f64| (rate - pop_avg) / pop_avg * 100.0;
        let rounded = row.measures.disparity_ratio.round_ties_even();

        Self {
            disadv_delta_from_avg: row.rate_disadv - pop_avg,
            disadv_delta_from_avg_percent: percent(row.rate_disadv),
            adv_delta_from_avg_percent: percent(row.rate_adv),
            normalized_disparity_index: row.measures.bias_parameter,
            disparity_ratio_rounded: rounded,
            disparity_ratio_label: ratio_label(rounded),
        }
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        match column {
            "disadv_delta_from_avg" => Some(self.disadv_delta_from_avg),
            "disadv_delta_from_avg_percent" => Some(self.disadv_delta_from_avg_percent),
            "adv_delta_from_avg_percent" => Some(self.adv_delta_from_avg_percent),
            "normalized_disparity_index" => Some(self.normalized_disparity_index),
            "disparity_ratio_rounded" => Some(self.disparity_ratio_rounded),
            _ => None,
        }
    }
}

fn ratio_label(rounded: f64) -> String {
    if rounded == 1.0 {
        "1-1.49".to_string()
    } else if rounded == 10.0 {
        "9.5-10".to_string()
    } else {
        format!("{}-{}", rounded - 0.5, rounded + 0.49)
    }
}

/// Disparity-ratio severity bands, right-closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DisparityBucket {
    /// `(0, 2]`
    Low,
    /// `(2, 4]`
    Moderate,
    /// `(4, 10]`
    High,
    /// `(10, 30]`
    VeryHigh,
    /// `(30, inf]`
    Extreme,
}

impl DisparityBucket {
    pub const ALL: [DisparityBucket; 5] = [
        DisparityBucket::Low,
        DisparityBucket::Moderate,
        DisparityBucket::High,
        DisparityBucket::VeryHigh,
        DisparityBucket::Extreme,
    ];

    /// Bucket for a ratio; `None` for ratios at or below zero and NaN
    pub fn from_ratio(ratio: f64) -> Option<Self> {
        if ratio.is_nan() || ratio <= 0.0 {
            None
        } else if ratio <= 2.0 {
            Some(DisparityBucket::Low)
        } else if ratio <= 4.0 {
            Some(DisparityBucket::Moderate)
        } else if ratio <= 10.0 {
            Some(DisparityBucket::High)
        } else if ratio <= 30.0 {
            Some(DisparityBucket::VeryHigh)
        } else {
            Some(DisparityBucket::Extreme)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DisparityBucket::Low => "Low (1-2)",
            DisparityBucket::Moderate => "Moderate (2-4)",
            DisparityBucket::High => "High (5-10)",
            DisparityBucket::VeryHigh => "Very High (10-30)",
            DisparityBucket::Extreme => "Extreme (30+)",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DisparityBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Share of rows in each bucket at one group size
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketProbabilities {
    pub prop_disadv: f64,
    /// Indexed like [`DisparityBucket::ALL`]; sums to 1
    pub shares: [f64; 5],
    /// Rows that fell into a bucket
    pub count: usize,
}

impl BucketProbabilities {
    pub fn share(&self, bucket: DisparityBucket) -> f64 {
        self.shares[bucket.index()]
    }
}

/// Bucket shares per distinct `prop_disadv`, aggregated over every other
/// parameter and sorted by `prop_disadv`. Unbucketed rows are left out of
/// both numerator and denominator.
pub fn disparity_probabilities(table: &ResultTable) -> Vec<BucketProbabilities> {
    let mut counts: FxHashMap<u64, [usize; 5]> = FxHashMap::default();
    for row in table {
        if let Some(bucket) = DisparityBucket::from_ratio(row.measures.disparity_ratio) {
            counts.entry(row.prop_disadv.to_bits()).or_default()[bucket.index()] += 1;
        }
    }

    let mut out: Vec<BucketProbabilities> = counts
        .into_iter()
        .map(|(bits, counts)| {
            let count: usize = counts.iter().sum();
            BucketProbabilities {
                prop_disadv: f64::from_bits(bits),
                shares: counts.map(|c| c as f64 / count as f64),
                count,
            }
        })
        .collect();
    out.sort_by(|a, b| a.prop_disadv.total_cmp(&b.prop_disadv));
    out
}

/// Rows of a sweep sharing one rate floor, analyzed apart from the others
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FloorSlice {
    /// `min_rate == 0`
    Unconstrained,
    /// One representative positive floor
    Constrained(f64),
}

impl FloorSlice {
    pub fn min_rate(self) -> f64 {
        match self {
            FloorSlice::Unconstrained => 0.0,
            FloorSlice::Constrained(floor) => floor,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            FloorSlice::Unconstrained => "unconstrained",
            FloorSlice::Constrained(_) => "constrained",
        }
    }

    /// Rows of `table` whose `min_rate` equals this slice's floor
    #[must_use]
    pub fn select(self, table: &ResultTable) -> ResultTable {
        let floor = self.min_rate();
        table.filter(|row| row.parameters.get(FLOOR_KEY) == Some(floor))
    }
}

/// Floors to analyze separately: zero when swept, plus the sixth smallest
/// floor (the largest when fewer than six are swept). Empty when the table
/// has no `min_rate` column.
pub fn floor_slices(table: &ResultTable) -> Vec<FloorSlice> {
    let Some(floors) = table.distinct(FLOOR_KEY) else {
        return Vec::new();
    };
    let mut slices = Vec::with_capacity(2);
    if floors.contains(&0.0) {
        slices.push(FloorSlice::Unconstrained);
    }
    if let Some(&floor) = floors
        .get(CONSTRAINED_FLOOR_POSITION)
        .or(floors.last())
        .filter(|floor| **floor != 0.0)
    {
        slices.push(FloorSlice::Constrained(floor));
    }
    slices
}

/// Pearson correlation coefficient.
///
/// `None` for mismatched or short inputs, a constant series, or any
/// non-finite value.
pub fn pearson_correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    if x.iter().chain(y).any(|v| !v.is_finite()) {
        return None;
    }
    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
    for (&a, &b) in x.iter().zip(y) {
        let dx = a - mean_x;
        let dy = b - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some(cov / (var_x.sqrt() * var_y.sqrt()))
}

/// Correlations between named columns of a result table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationTable {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `values[i][j]` correlates `rows[i]` with `columns[j]`
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationTable {
    pub fn get(&self, row: &str, column: &str) -> Option<f64> {
        let i = self.rows.iter().position(|r| r == row)?;
        let j = self.columns.iter().position(|c| c == column)?;
        self.values[i][j]
    }
}

/// Correlate every `rows` column with every `columns` column.
/// Unknown column names yield `None` cells.
pub fn correlation_table(table: &ResultTable, rows: &[&str], columns: &[&str]) -> CorrelationTable {
    let fetch = |names: &[&str]| -> Vec<Option<Vec<f64>>> {
        names.iter().map(|name| table.column(name)).collect()
    };
    let row_data = fetch(rows);
    let col_data = fetch(columns);

    let values = row_data
        .iter()
        .map(|x| {
            col_data
                .iter()
                .map(|y| match (x, y) {
                    (Some(x), Some(y)) => pearson_correlation(x, y),
                    _ => None,
                })
                .collect()
        })
        .collect();

    CorrelationTable {
        rows: rows.iter().map(|s| s.to_string()).collect(),
        columns: columns.iter().map(|s| s.to_string()).collect(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupRates;
    use crate::sweep::ParameterSet;
    use std::sync::Arc;

    fn row(p: f64, disadv: f64, adv: f64) -> SimulationRow {
        SimulationRow::new(
            ParameterSet::from_pairs([("p", p)]),
            p,
            GroupRates {
                disadvantaged: disadv,
                advantaged: adv,
            },
        )
    }

    fn table(rows: Vec<SimulationRow>) -> ResultTable {
        ResultTable::new(Arc::from(vec!["p".to_string()]), rows)
    }

    #[test]
    fn test_deviation_metrics() {
        // pop_avg = 0.5 * 300 + 0.5 * 100 = 200
        let m = DeviationMetrics::from_row(&row(0.5, 300.0, 100.0));
        assert_eq!(m.disadv_delta_from_avg, 100.0);
        assert_eq!(m.disadv_delta_from_avg_percent, 50.0);
        assert_eq!(m.adv_delta_from_avg_percent, -50.0);
        assert!((m.normalized_disparity_index - 0.5).abs() < 1e-12);
        assert_eq!(m.disparity_ratio_rounded, 3.0);
        assert_eq!(m.disparity_ratio_label, "2.5-3.49");
    }

    #[test]
    fn test_ratio_labels() {
        assert_eq!(ratio_label(1.0), "1-1.49");
        assert_eq!(ratio_label(10.0), "9.5-10");
        assert_eq!(ratio_label(5.0), "4.5-5.49");
        // 2.5 rounds to 2
        let m = DeviationMetrics::from_row(&row(0.5, 250.0, 100.0));
        assert_eq!(m.disparity_ratio_label, "1.5-2.49");
    }

    #[test]
    fn test_bucket_edges_right_closed() {
        assert_eq!(DisparityBucket::from_ratio(2.0), Some(DisparityBucket::Low));
        assert_eq!(DisparityBucket::from_ratio(2.0001), Some(DisparityBucket::Moderate));
        assert_eq!(DisparityBucket::from_ratio(10.0), Some(DisparityBucket::High));
        assert_eq!(DisparityBucket::from_ratio(30.5), Some(DisparityBucket::Extreme));
        assert_eq!(
            DisparityBucket::from_ratio(f64::INFINITY),
            Some(DisparityBucket::Extreme)
        );
        assert_eq!(DisparityBucket::from_ratio(0.0), None);
        assert_eq!(DisparityBucket::from_ratio(f64::NAN), None);
    }

    #[test]
    fn test_probabilities_per_group_size() {
        let t = table(vec![
            row(0.5, 150.0, 100.0),
            row(0.5, 300.0, 100.0),
            row(0.1, 100.0, 0.0),
            row(0.5, 120.0, 100.0),
            row(0.5, 500.0, 100.0),
        ]);
        let probs = disparity_probabilities(&t);
        assert_eq!(probs.len(), 2);
        assert_eq!(probs[0].prop_disadv, 0.1);
        assert_eq!(probs[0].share(DisparityBucket::Extreme), 1.0);

        assert_eq!(probs[1].count, 4);
        assert_eq!(probs[1].share(DisparityBucket::Low), 0.5);
        assert_eq!(probs[1].share(DisparityBucket::Moderate), 0.25);
        assert_eq!(probs[1].share(DisparityBucket::High), 0.25);
        assert!((probs[1].shares.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    fn floored(p: f64, min_rate: f64, disadv: f64) -> SimulationRow {
        SimulationRow::new(
            ParameterSet::from_pairs([("p", p), ("min_rate", min_rate)]),
            p,
            GroupRates {
                disadvantaged: disadv,
                advantaged: 100.0,
            },
        )
    }

    fn floored_table(rows: Vec<SimulationRow>) -> ResultTable {
        ResultTable::new(Arc::from(vec!["p".to_string(), "min_rate".to_string()]), rows)
    }

    #[test]
    fn test_floor_slices_pick_zero_and_sixth_floor() {
        let rows = (0..8).map(|i| floored(0.5, 50.0 * i as f64, 150.0)).collect();
        assert_eq!(
            floor_slices(&floored_table(rows)),
            vec![FloorSlice::Unconstrained, FloorSlice::Constrained(250.0)]
        );

        let rows = vec![floored(0.5, 0.0, 150.0), floored(0.5, 450.0, 150.0)];
        assert_eq!(
            floor_slices(&floored_table(rows)),
            vec![FloorSlice::Unconstrained, FloorSlice::Constrained(450.0)]
        );

        let only_zero = floored_table(vec![floored(0.5, 0.0, 150.0)]);
        assert_eq!(floor_slices(&only_zero), vec![FloorSlice::Unconstrained]);

        let no_floor = table(vec![row(0.5, 150.0, 100.0)]);
        assert!(floor_slices(&no_floor).is_empty());
    }

    #[test]
    fn test_probabilities_within_one_floor() {
        // Unconstrained rows are High/Extreme, floored rows Low/Moderate
        let t = floored_table(vec![
            floored(0.1, 0.0, 500.0),
            floored(0.1, 0.0, 5000.0),
            floored(0.1, 450.0, 150.0),
            floored(0.1, 450.0, 300.0),
            floored(0.5, 0.0, 500.0),
            floored(0.5, 450.0, 150.0),
        ]);

        let pooled = disparity_probabilities(&t);
        assert_eq!(pooled[0].count, 4);

        let unconstrained = disparity_probabilities(&FloorSlice::Unconstrained.select(&t));
        assert_eq!(unconstrained.len(), 2);
        assert_eq!(unconstrained[0].count, 2);
        assert_eq!(unconstrained[0].share(DisparityBucket::High), 0.5);
        assert_eq!(unconstrained[0].share(DisparityBucket::Extreme), 0.5);
        assert_eq!(unconstrained[0].share(DisparityBucket::Low), 0.0);
        assert_eq!(unconstrained[1].count, 1);

        let constrained = FloorSlice::Constrained(450.0).select(&t);
        assert_eq!(constrained.len(), 3);
        assert!(constrained.iter().all(|r| r.parameters.get("min_rate") == Some(450.0)));
        let probs = disparity_probabilities(&constrained);
        assert_eq!(probs[0].share(DisparityBucket::Low), 0.5);
        assert_eq!(probs[0].share(DisparityBucket::Moderate), 0.5);
    }

    #[test]
    fn test_pearson() {
        let x = [1.0, 2.0, 3.0, 4.0];
        assert!((pearson_correlation(&x, &[2.0, 4.0, 6.0, 8.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!((pearson_correlation(&x, &[8.0, 6.0, 4.0, 2.0]).unwrap() + 1.0).abs() < 1e-12);
        assert_eq!(pearson_correlation(&x, &[5.0; 4]), None);
        assert_eq!(pearson_correlation(&x, &[1.0, 2.0]), None);
        assert_eq!(pearson_correlation(&x, &[1.0, 2.0, f64::INFINITY, 3.0]), None);
    }

    #[test]
    fn test_correlation_table() {
        let t = table(vec![
            row(0.1, 500.0, 100.0),
            row(0.3, 400.0, 100.0),
            row(0.5, 200.0, 100.0),
        ]);
        let corr = correlation_table(&t, &["prop_disadv", "gamma"], &["rate_disadv", "rate_adv"]);
        assert!(corr.get("prop_disadv", "rate_disadv").unwrap() < -0.9);
        assert_eq!(corr.get("prop_disadv", "rate_adv"), None);
        assert_eq!(corr.get("gamma", "rate_disadv"), None);
    }
}
