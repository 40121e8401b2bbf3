//! Strategy profiles.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::regret::uniform;
use crate::error::{Result, SolverError};
use crate::tree::InfoSetRegistry;

/// Information set label → probability of each action.
///
/// Rows are aligned with the declared action order of their information
/// set. Labels without a row are played uniformly by every consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    rows: FxHashMap<String, Vec<f64>>,
}

impl Strategy {
    /// Empty profile (uniform everywhere).
    pub fn new() -> Self {
        Self::default()
    }

    /// Explicit uniform rows for every registered information set.
    pub fn uniform(info_sets: &InfoSetRegistry) -> Self {
        let rows = info_sets
            .iter()
            .map(|set| (set.label().to_string(), uniform(set.actions().len())))
            .collect();
        Self { rows }
    }

    /// Set the row of `label`.
    pub fn insert(&mut self, label: impl Into<String>, probabilities: Vec<f64>) {
        self.rows.insert(label.into(), probabilities);
    }

    /// Row of `label`, if any.
    pub fn get(&self, label: &str) -> Option<&[f64]> {
        self.rows.get(label).map(Vec::as_slice)
    }

    /// Probability of the `index`-th action of `label`.
    pub fn probability(&self, label: &str, index: usize) -> Option<f64> {
        self.get(label).and_then(|row| row.get(index).copied())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.rows.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Row for a node with `num_actions` actions, checked against its size.
    ///
    /// Returns `None` when the profile has no row for `label`.
    pub(crate) fn row_for(&self, label: &str, num_actions: usize) -> Result<Option<&[f64]>> {
        match self.get(label) {
            Some(row) if row.len() != num_actions => Err(SolverError::InvalidInfoSet {
                label: label.to_string(),
                reason: format!(
                    "strategy row has {} entries for {} actions",
                    row.len(),
                    num_actions
                ),
            }),
            row => Ok(row),
        }
    }

    /// Rows keyed by action name, ordered for display and export.
    pub fn named(&self, info_sets: &InfoSetRegistry) -> BTreeMap<String, BTreeMap<String, f64>> {
        self.rows
            .iter()
            .filter_map(|(label, row)| {
                let actions = info_sets.actions_of(label).ok()?;
                let named = actions.iter().cloned().zip(row.iter().copied()).collect();
                Some((label.clone(), named))
            })
            .collect()
    }
}

impl FromIterator<(String, Vec<f64>)> for Strategy {
    fn from_iter<T: IntoIterator<Item = (String, Vec<f64>)>>(iter: T) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}
