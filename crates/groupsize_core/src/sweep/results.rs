//! Rows produced by a sweep and the table that collects them.

use std::fmt::Write as _;
use std::sync::Arc;

use super::grid::{PROPORTION_KEY, ParameterSet, round_to};
use crate::analysis::DeviationMetrics;
use crate::disparity::DisparityMeasures;
use crate::model::GroupRates;

/// Output columns following the parameters, in CSV order
pub const BASE_COLUMNS: [&str; 6] = [
    "pop_avg",
    "rate_adv",
    "rate_disadv",
    "disparity_ratio",
    "disparity_difference",
    "bias_parameter",
];

/// Optional derived columns appended after [`BASE_COLUMNS`]
pub const DEVIATION_COLUMNS: [&str; 6] = [
    "disadv_delta_from_avg",
    "disadv_delta_from_avg_percent",
    "adv_delta_from_avg_percent",
    "normalized_disparity_index",
    "disparity_ratio_rounded",
    "disparity_ratio_label",
];

/// Alias of `disparity_difference` accepted by column lookups
const RATE_DIFFERENCE: &str = "rate_difference";

/// Result of evaluating one grid combination
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRow {
    pub prop_disadv: f64,
    /// Every grid parameter of the combination, `p` included
    pub parameters: ParameterSet,
    /// Population-weighted average rate, rounded half to even
    pub pop_avg: i64,
    pub rate_adv: f64,
    pub rate_disadv: f64,
    pub measures: DisparityMeasures,
}

impl SimulationRow {
    pub fn new(parameters: ParameterSet, prop_disadv: f64, rates: GroupRates) -> Self {
        let pop_avg = rates.population_average(prop_disadv).round_ties_even() as i64;
        Self {
            prop_disadv,
            parameters,
            pop_avg,
            rate_adv: rates.advantaged,
            rate_disadv: rates.disadvantaged,
            measures: DisparityMeasures::compute(rates.disadvantaged, rates.advantaged, prop_disadv),
        }
    }

    /// Unrounded population-weighted average
    pub fn population_average(&self) -> f64 {
        self.prop_disadv * self.rate_disadv + (1.0 - self.prop_disadv) * self.rate_adv
    }

    pub fn deviation(&self) -> DeviationMetrics {
        DeviationMetrics::from_row(self)
    }

    /// Numeric value of a named column, derived columns included
    pub fn value(&self, column: &str) -> Option<f64> {
        let value = match column {
            "prop_disadv" | PROPORTION_KEY => self.prop_disadv,
            "pop_avg" => self.pop_avg as f64,
            "rate_adv" => self.rate_adv,
            "rate_disadv" => self.rate_disadv,
            "disparity_ratio" => self.measures.disparity_ratio,
            "disparity_difference" | RATE_DIFFERENCE => self.measures.disparity_difference,
            "bias_parameter" => self.measures.bias_parameter,
            other => {
                return self
                    .parameters
                    .get(other)
                    .or_else(|| self.deviation().value(other));
            }
        };
        Some(value)
    }
}

/// Rows of a sweep in combination order
#[derive(Debug, Clone, PartialEq)]
pub struct ResultTable {
    parameter_names: Arc<[String]>,
    rows: Vec<SimulationRow>,
}

impl ResultTable {
    pub fn new(parameter_names: Arc<[String]>, rows: Vec<SimulationRow>) -> Self {
        Self {
            parameter_names,
            rows,
        }
    }

    /// Grid parameter names in grid order
    pub fn parameter_names(&self) -> &[String] {
        &self.parameter_names
    }

    pub fn rows(&self) -> &[SimulationRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SimulationRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header in CSV order: `prop_disadv`, the other parameters, then outputs
    pub fn columns(&self, with_deviation: bool) -> Vec<String> {
        let mut columns = vec!["prop_disadv".to_string()];
        columns.extend(
            self.parameter_names
                .iter()
                .filter(|n| n.as_str() != PROPORTION_KEY)
                .cloned(),
        );
        columns.extend(BASE_COLUMNS.iter().map(|c| c.to_string()));
        if with_deviation {
            columns.extend(DEVIATION_COLUMNS.iter().map(|c| c.to_string()));
        }
        columns
    }

    fn is_numeric_column(&self, name: &str) -> bool {
        name == "prop_disadv"
            || name == RATE_DIFFERENCE
            || self.parameter_names.iter().any(|n| n == name)
            || BASE_COLUMNS.contains(&name)
            || (DEVIATION_COLUMNS.contains(&name) && name != "disparity_ratio_label")
    }

    /// All values of a numeric column, or `None` for an unknown name
    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        if !self.is_numeric_column(name) {
            return None;
        }
        self.rows.iter().map(|row| row.value(name)).collect()
    }

    /// Sorted distinct values of a numeric column
    pub fn distinct(&self, name: &str) -> Option<Vec<f64>> {
        let mut values = self.column(name)?;
        values.sort_by(f64::total_cmp);
        values.dedup();
        Some(values)
    }

    /// Rows matching `predicate`, keeping order
    #[must_use]
    pub fn filter(&self, predicate: impl Fn(&SimulationRow) -> bool) -> Self {
        Self {
            parameter_names: Arc::clone(&self.parameter_names),
            rows: self.rows.iter().filter(|r| predicate(r)).cloned().collect(),
        }
    }

    /// Round a parameter column in place. Returns `false` for an unknown name.
    pub fn round_parameter(&mut self, name: &str, decimals: u32) -> bool {
        if !self.parameter_names.iter().any(|n| n == name) {
            return false;
        }
        for row in &mut self.rows {
            if let Some(value) = row.parameters.get(name) {
                let rounded = round_to(value, decimals);
                row.parameters.set(name, rounded);
                if name == PROPORTION_KEY {
                    row.prop_disadv = rounded;
                }
            }
        }
        true
    }

    /// Render the table as CSV with a header line
    pub fn to_csv(&self, with_deviation: bool) -> String {
        let columns = self.columns(with_deviation);
        let mut out = columns.join(",");
        out.push('\n');

        for row in &self.rows {
            let mut fields: Vec<String> = Vec::with_capacity(columns.len());
            fields.push(format_value(row.prop_disadv));
            fields.extend(
                row.parameters
                    .iter()
                    .filter(|(name, _)| *name != PROPORTION_KEY)
                    .map(|(_, v)| format_value(v)),
            );
            fields.push(row.pop_avg.to_string());
            for value in [
                row.rate_adv,
                row.rate_disadv,
                row.measures.disparity_ratio,
                row.measures.disparity_difference,
                row.measures.bias_parameter,
            ] {
                fields.push(format_value(value));
            }
            if with_deviation {
                let dev = row.deviation();
                for value in [
                    dev.disadv_delta_from_avg,
                    dev.disadv_delta_from_avg_percent,
                    dev.adv_delta_from_avg_percent,
                    dev.normalized_disparity_index,
                    dev.disparity_ratio_rounded,
                ] {
                    fields.push(format_value(value));
                }
                fields.push(dev.disparity_ratio_label);
            }
            let _ = writeln!(out, "{}", fields.join(","));
        }
        out
    }
}

impl<'a> IntoIterator for &'a ResultTable {
    type Item = &'a SimulationRow;
    type IntoIter = std::slice::Iter<'a, SimulationRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}

/// Shortest round-trip text; `inf` for infinities, empty for NaN
fn format_value(value: f64) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}
