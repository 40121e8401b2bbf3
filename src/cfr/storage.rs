//! Storage for CFR regrets and strategy sums.
//!
//! This module holds the two tables a CFR run mutates:
//! - **Regrets**: cumulative counterfactual regret per action of each info set
//! - **Strategy sums**: reach-weighted cumulative strategy per action
//!
//! Rows are allocated up front for the information sets a learner is
//! responsible for and are aligned with each set's declared action order.
//! The storage is owned by a single solver and mutated through `&mut`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::regret::{normalize, regret_matching};
use crate::cfr::strategy::Strategy;
use crate::error::{Result, SolverError};
use crate::tree::InfoSetRegistry;

/// Regret and strategy-sum tables of one learning run.
#[derive(Debug, Clone, Default)]
pub struct RegretStorage {
    /// Cumulative regrets: info set label -> [regret per action]
    regrets: FxHashMap<String, Vec<f64>>,

    /// Cumulative strategy sums: info set label -> [strategy weight per action]
    strategy_sums: FxHashMap<String, Vec<f64>>,

    /// Action names for each info set: label -> [action name per action]
    action_names: FxHashMap<String, Vec<String>>,
}

impl RegretStorage {
    /// Create new empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate zeroed rows for the information sets owned by `player`, or
    /// for every information set when `player` is `None`.
    pub fn for_info_sets(info_sets: &InfoSetRegistry, player: Option<&str>) -> Self {
        let mut storage = Self::new();
        for set in info_sets.iter() {
            if player.map_or(true, |p| p == set.player()) {
                storage.allocate(set.label(), set.actions());
            }
        }
        storage
    }

    /// Allocate a zeroed row for `label` (no-op if it already exists).
    pub fn allocate(&mut self, label: &str, actions: &[String]) {
        if self.action_names.contains_key(label) {
            return;
        }
        self.regrets
            .insert(label.to_string(), vec![0.0; actions.len()]);
        self.strategy_sums
            .insert(label.to_string(), vec![0.0; actions.len()]);
        self.action_names
            .insert(label.to_string(), actions.to_vec());
    }

    /// Current strategy of `label` by regret matching.
    pub fn current_strategy(&self, label: &str) -> Result<Vec<f64>> {
        row(&self.regrets, label).map(regret_matching)
    }

    /// Average strategy of `label` (normalized strategy sums).
    pub fn average_strategy(&self, label: &str) -> Result<Vec<f64>> {
        row(&self.strategy_sums, label).map(normalize)
    }

    /// Current strategy of every stored info set.
    pub fn current_profile(&self) -> Strategy {
        self.regrets
            .iter()
            .map(|(label, regrets)| (label.clone(), regret_matching(regrets)))
            .collect()
    }

    /// Average strategy of every stored info set.
    pub fn average_profile(&self) -> Strategy {
        self.strategy_sums
            .iter()
            .map(|(label, sums)| (label.clone(), normalize(sums)))
            .collect()
    }

    /// Add `deltas` to the regrets of `label`.
    pub fn update_regrets(&mut self, label: &str, deltas: &[f64]) -> Result<()> {
        let entry = row_mut(&mut self.regrets, label, deltas.len())?;
        for (regret, delta) in entry.iter_mut().zip(deltas) {
            *regret += delta;
        }
        Ok(())
    }

    /// Add `weight * strategy` to the strategy sums of `label`.
    pub fn update_strategy_sum(
        &mut self,
        label: &str,
        strategy: &[f64],
        weight: f64,
    ) -> Result<()> {
        let entry = row_mut(&mut self.strategy_sums, label, strategy.len())?;
        for (sum, prob) in entry.iter_mut().zip(strategy) {
            *sum += prob * weight;
        }
        Ok(())
    }

    /// Action names of `label`.
    pub fn action_names(&self, label: &str) -> Option<&[String]> {
        self.action_names.get(label).map(Vec::as_slice)
    }

    /// Get the number of information sets stored.
    pub fn num_info_sets(&self) -> usize {
        self.action_names.len()
    }

    /// Check if an info set exists in storage.
    pub fn contains(&self, label: &str) -> bool {
        self.action_names.contains_key(label)
    }

    /// Read access to regrets (for analysis/export).
    pub fn regrets(&self) -> &FxHashMap<String, Vec<f64>> {
        &self.regrets
    }

    /// Read access to strategy sums (for analysis/export).
    pub fn strategy_sums(&self) -> &FxHashMap<String, Vec<f64>> {
        &self.strategy_sums
    }

    /// Zero every row, keeping the allocation.
    pub fn clear(&mut self) {
        for values in self.regrets.values_mut().chain(self.strategy_sums.values_mut()) {
            values.iter_mut().for_each(|v| *v = 0.0);
        }
    }

    /// Export storage to serializable format.
    pub fn export(&self) -> StorageExport {
        StorageExport {
            regrets: self.regrets.clone(),
            strategy_sums: self.strategy_sums.clone(),
            action_names: self.action_names.clone(),
        }
    }

    /// Replace the tables with an export of the same layout.
    pub fn import(&mut self, data: StorageExport) -> Result<()> {
        if data.action_names != self.action_names {
            return Err(SolverError::Checkpoint(
                "stored information sets do not match this game".to_string(),
            ));
        }
        for (label, actions) in &self.action_names {
            for table in [&data.regrets, &data.strategy_sums] {
                if table.get(label).map(Vec::len) != Some(actions.len()) {
                    return Err(SolverError::Checkpoint(format!(
                        "row of `{}` does not match its {} actions",
                        label,
                        actions.len()
                    )));
                }
            }
        }
        self.regrets = data.regrets;
        self.strategy_sums = data.strategy_sums;
        Ok(())
    }
}

fn row<'a>(table: &'a FxHashMap<String, Vec<f64>>, label: &str) -> Result<&'a [f64]> {
    table
        .get(label)
        .map(Vec::as_slice)
        .ok_or_else(|| SolverError::UnknownInfoSet(label.to_string()))
}

fn row_mut<'a>(
    table: &'a mut FxHashMap<String, Vec<f64>>,
    label: &str,
    len: usize,
) -> Result<&'a mut Vec<f64>> {
    let entry = table
        .get_mut(label)
        .ok_or_else(|| SolverError::UnknownInfoSet(label.to_string()))?;
    if entry.len() != len {
        return Err(SolverError::InvalidInfoSet {
            label: label.to_string(),
            reason: format!("update has {} entries for {} actions", len, entry.len()),
        });
    }
    Ok(entry)
}

/// Serializable export format for storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageExport {
    /// Cumulative regrets
    pub regrets: FxHashMap<String, Vec<f64>>,
    /// Cumulative strategy sums
    pub strategy_sums: FxHashMap<String, Vec<f64>>,
    /// Action names for each info set
    pub action_names: FxHashMap<String, Vec<String>>,
}
