//! Counterfactual Regret Minimization (CFR) solver.
//!
//! This module implements full-traversal CFR over an explicit [`GameTree`]
//! in two variants:
//! - **Single**: one target player learns against an opponent that plays
//!   uniformly at random. Only the target's information sets get tables.
//! - **Dual**: both players learn simultaneously from one set of tables and
//!   the average strategy converges to a Nash equilibrium.
//!
//! Every iteration first computes the current strategy of every information
//! set by regret matching, then walks the whole tree once with that profile.
//! Regret and strategy-sum updates go straight into the tables, so the
//! profile seen by one iteration never depends on the order in which the
//! traversal visits nodes.

use std::ops::ControlFlow;
use std::path::Path;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cfr::config::{CFRConfig, CFRStats, CfrMode};
use crate::cfr::diagnostics;
use crate::cfr::storage::{RegretStorage, StorageExport};
use crate::cfr::strategy::Strategy;
use crate::error::{Result, SolverError};
use crate::tree::{GameTree, InfoSetRegistry, NodeId, NodeKind};

/// The main CFR solver.
///
/// The solver borrows the tree and its information sets for its whole
/// lifetime and owns the regret tables it learns.
///
/// # Example
/// ```
/// use efg_solver::cfr::{CFRConfig, CFRSolver};
/// use efg_solver::games;
///
/// let game = games::bundled("rps").unwrap();
/// let mut solver = CFRSolver::new(&game.tree, &game.info_sets, CFRConfig::dual()).unwrap();
///
/// solver.train(100).unwrap();
/// let strategy = solver.average_strategy();
/// assert_eq!(strategy.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct CFRSolver<'a> {
    /// The game being solved.
    tree: &'a GameTree,

    /// Information sets of `tree`.
    info_sets: &'a InfoSetRegistry,

    /// Configuration for the solver.
    config: CFRConfig,

    /// Storage for regrets and strategy sums.
    storage: RegretStorage,

    /// Current iteration count.
    iteration: u64,

    /// Statistics tracking.
    stats: CFRStats,

    /// Players whose root utility is recorded: the target, or both players
    /// in tree order.
    players: Vec<String>,
}

impl<'a> CFRSolver<'a> {
    /// Create a new CFR solver for the given game.
    ///
    /// # Arguments
    /// * `tree` - The game to solve
    /// * `info_sets` - Information sets covering every decision node of `tree`
    /// * `config` - Variant and diagnostics settings
    ///
    /// # Errors
    /// Fails if the configuration is invalid, the single-player target does
    /// not occur in the game, the dual variant is asked for a game without
    /// exactly two players, or a decision node has no registered information
    /// set.
    pub fn new(
        tree: &'a GameTree,
        info_sets: &'a InfoSetRegistry,
        config: CFRConfig,
    ) -> Result<Self> {
        config.validate()?;
        info_sets.ensure_covers(tree)?;

        let (players, storage) = match &config.mode {
            CfrMode::Single { player } => {
                if !tree.players().contains(player) {
                    return Err(SolverError::UnknownPlayer(player.clone()));
                }
                let storage = RegretStorage::for_info_sets(info_sets, Some(player));
                (vec![player.clone()], storage)
            }
            CfrMode::Dual => {
                let players = diagnostics::two_players(tree)?;
                let storage = RegretStorage::for_info_sets(info_sets, None);
                (players.iter().map(|p| p.to_string()).collect(), storage)
            }
        };

        let stats = CFRStats {
            info_sets: storage.num_info_sets(),
            players: players.clone(),
            ..CFRStats::new()
        };

        Ok(Self {
            tree,
            info_sets,
            config,
            storage,
            iteration: 0,
            stats,
            players,
        })
    }

    /// Run a single iteration of CFR.
    ///
    /// # Returns
    /// The root utility of this iteration, one entry per recorded player.
    pub fn run_iteration(&mut self) -> Result<Vec<f64>> {
        let profile = self.storage.current_profile();
        let root = self.tree.root();

        let utility = match self.config.mode.clone() {
            CfrMode::Single { player } => {
                vec![self.single_utility(&profile, &player, root, 1.0, 1.0)?]
            }
            CfrMode::Dual => self.dual_utility(&profile, root, [1.0, 1.0])?.to_vec(),
        };

        self.iteration += 1;
        self.stats.iterations = self.iteration;
        self.stats.utilities.push(utility.clone());
        Ok(utility)
    }

    /// Train the solver for a specified number of iterations.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    ///
    /// # Returns
    /// Statistics from the training run.
    pub fn train(&mut self, iterations: u64) -> Result<&CFRStats> {
        self.train_with_callback(iterations, u64::MAX, |_| ControlFlow::Continue(()))
    }

    /// Train for the number of iterations set in the configuration.
    pub fn train_configured(&mut self) -> Result<&CFRStats> {
        self.train(self.config.iterations)
    }

    /// Train with a callback for progress tracking.
    ///
    /// # Arguments
    /// * `iterations` - Number of iterations to run
    /// * `callback_interval` - How often to call the callback
    /// * `callback` - Function called every `callback_interval` iterations;
    ///   returning [`ControlFlow::Break`] stops training after that iteration
    ///
    /// The Nash gap of the average strategy is recorded every
    /// [`CFRConfig::nash_gap_interval`] iterations and once more when
    /// training ends, provided the game has two players.
    pub fn train_with_callback<F>(
        &mut self,
        iterations: u64,
        callback_interval: u64,
        mut callback: F,
    ) -> Result<&CFRStats>
    where
        F: FnMut(&CFRStats) -> ControlFlow<()>,
    {
        let start_time = Instant::now();
        let elapsed_before = self.stats.elapsed_seconds;
        let callback_interval = callback_interval.max(1);
        let measure_gap = self.tree.players().len() == 2;

        log::info!(
            "training {} for {} iterations over {} information sets",
            self.mode_name(),
            iterations,
            self.storage.num_info_sets()
        );

        for i in 0..iterations {
            self.run_iteration()?;

            if measure_gap
                && self
                    .config
                    .nash_gap_interval
                    .map_or(false, |every| self.iteration % every == 0)
            {
                self.record_nash_gap()?;
            }

            if (i + 1) % callback_interval == 0 {
                self.update_stats(start_time, elapsed_before);
                if callback(&self.stats).is_break() {
                    log::info!("training stopped by callback at iteration {}", self.iteration);
                    break;
                }
            }
        }

        if measure_gap && self.iteration > 0 {
            self.record_nash_gap()?;
        }
        self.update_stats(start_time, elapsed_before);

        log::info!(
            "finished {} iterations in {:.2}s ({:.0} it/s)",
            self.stats.iterations,
            self.stats.elapsed_seconds,
            self.stats.iterations_per_second
        );
        if let Some(gap) = self.stats.nash_gap {
            log::info!("nash gap of the average strategy: {:.6}", gap);
        }

        Ok(&self.stats)
    }

    /// Single-player traversal: value of `target` at `id`.
    ///
    /// `rprob1` is the target's own reach probability, `rprob2` the product
    /// of every other choice (opponent and chance) along the path.
    fn single_utility(
        &mut self,
        profile: &Strategy,
        target: &str,
        id: NodeId,
        rprob1: f64,
        rprob2: f64,
    ) -> Result<f64> {
        let tree = self.tree;
        let node = tree.node(id);

        match node.kind() {
            NodeKind::Terminal { payoffs } => payoffs
                .get(target)
                .copied()
                .ok_or_else(|| {
                    tree.structure_error(id, format!("no payoff for player `{}`", target))
                }),
            NodeKind::Decision { player, actions } if player == target => {
                let label = label_of(tree, id)?;
                let sigma = row_of(profile, label, actions.len())?;

                self.storage.update_strategy_sum(label, sigma, rprob1)?;

                let mut values = Vec::with_capacity(actions.len());
                for (i, &child) in node.children().iter().enumerate() {
                    let reach = rprob1 * sigma[i];
                    values.push(self.single_utility(profile, target, child, reach, rprob2)?);
                }
                let node_value: f64 = sigma.iter().zip(&values).map(|(s, v)| s * v).sum();

                let deltas: Vec<f64> = values.iter().map(|v| rprob2 * (v - node_value)).collect();
                self.storage.update_regrets(label, &deltas)?;

                Ok(node_value)
            }
            NodeKind::Decision { actions, .. } => {
                let p = 1.0 / actions.len() as f64;
                let mut total = 0.0;
                for &child in node.children() {
                    total += p * self.single_utility(profile, target, child, rprob1, rprob2 * p)?;
                }
                Ok(total)
            }
            NodeKind::Chance { outcomes } => {
                let mut total = 0.0;
                for (&child, (_, p)) in node.children().iter().zip(outcomes) {
                    total += p * self.single_utility(profile, target, child, rprob1, rprob2 * p)?;
                }
                Ok(total)
            }
        }
    }

    /// Dual traversal: values of both players at `id`, with each player's
    /// own reach probability in `reach`.
    fn dual_utility(
        &mut self,
        profile: &Strategy,
        id: NodeId,
        reach: [f64; 2],
    ) -> Result<[f64; 2]> {
        let tree = self.tree;
        let node = tree.node(id);

        match node.kind() {
            NodeKind::Terminal { .. } => {
                let mut values = [0.0; 2];
                for (value, player) in values.iter_mut().zip(&self.players) {
                    *value = node.payoff(player).ok_or_else(|| {
                        tree.structure_error(id, format!("no payoff for player `{}`", player))
                    })?;
                }
                Ok(values)
            }
            NodeKind::Decision { player, actions } => {
                let actor = self.player_index(player)?;
                let other = 1 - actor;
                let label = label_of(tree, id)?;
                let sigma = row_of(profile, label, actions.len())?;

                self.storage.update_strategy_sum(label, sigma, reach[actor])?;

                let mut values = Vec::with_capacity(actions.len());
                let mut node_value = [0.0; 2];
                for (i, &child) in node.children().iter().enumerate() {
                    let mut next = reach;
                    next[actor] *= sigma[i];
                    let value = self.dual_utility(profile, child, next)?;
                    node_value[0] += sigma[i] * value[0];
                    node_value[1] += sigma[i] * value[1];
                    values.push(value[actor]);
                }

                let deltas: Vec<f64> = values
                    .iter()
                    .map(|v| reach[other] * (v - node_value[actor]))
                    .collect();
                self.storage.update_regrets(label, &deltas)?;

                Ok(node_value)
            }
            NodeKind::Chance { outcomes } => {
                let mut total = [0.0; 2];
                for (&child, (_, p)) in node.children().iter().zip(outcomes) {
                    let value = self.dual_utility(profile, child, [reach[0] * p, reach[1] * p])?;
                    total[0] += p * value[0];
                    total[1] += p * value[1];
                }
                Ok(total)
            }
        }
    }

    fn player_index(&self, player: &str) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p == player)
            .ok_or_else(|| SolverError::UnknownPlayer(player.to_string()))
    }

    fn record_nash_gap(&mut self) -> Result<()> {
        let gap = self.nash_gap()?;
        log::debug!("iteration {}: nash gap {:.6}", self.iteration, gap);
        self.stats.record_nash_gap(self.iteration, gap);
        Ok(())
    }

    fn update_stats(&mut self, start_time: Instant, elapsed_before: f64) {
        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.storage.num_info_sets();
        self.stats.elapsed_seconds = elapsed_before + start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
    }

    fn mode_name(&self) -> String {
        match &self.config.mode {
            CfrMode::Single { player } => format!("player {} against a uniform opponent", player),
            CfrMode::Dual => "both players".to_string(),
        }
    }

    /// Get the average strategy of every learned information set.
    ///
    /// This is the time-averaged strategy which converges to Nash equilibrium
    /// in the dual variant.
    pub fn average_strategy(&self) -> Strategy {
        diagnostics::average_strategy(&self.storage)
    }

    /// Get the current strategy for an information set.
    ///
    /// This returns the strategy based on current regrets (regret matching).
    pub fn current_strategy(&self, label: &str) -> Result<Vec<f64>> {
        self.storage.current_strategy(label)
    }

    /// Nash gap of the current average strategy.
    ///
    /// Information sets without tables (the opponent's, in the single-player
    /// variant) are played uniformly.
    pub fn nash_gap(&self) -> Result<f64> {
        diagnostics::nash_gap(self.tree, self.info_sets, &self.average_strategy())
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    /// Get reference to the storage for analysis.
    pub fn storage(&self) -> &RegretStorage {
        &self.storage
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &CFRConfig {
        &self.config
    }

    /// Get reference to the game.
    pub fn tree(&self) -> &'a GameTree {
        self.tree
    }

    /// Players whose utilities are recorded, in column order.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Export solver state for checkpointing.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            iteration: self.iteration,
            storage: self.storage.export(),
            stats: self.stats.clone(),
        }
    }

    /// Import solver state from checkpoint.
    ///
    /// The checkpoint must come from a solver over the same information sets
    /// and in the same mode.
    pub fn import_state(&mut self, state: SolverState) -> Result<()> {
        if state.stats.players != self.players {
            return Err(SolverError::Checkpoint(format!(
                "checkpoint records players {:?}, solver records {:?}",
                state.stats.players, self.players
            )));
        }
        let width = self.players.len();
        let bad_row = state.stats.utilities.iter().enumerate().find(|(_, u)| u.len() != width);
        if let Some((row, u)) = bad_row {
            return Err(SolverError::Checkpoint(format!(
                "utility row {} has {} entries for {} players",
                row,
                u.len(),
                width
            )));
        }
        self.storage.import(state.storage)?;
        self.iteration = state.iteration;
        self.stats = state.stats;
        Ok(())
    }

    /// Write [`export_state`](Self::export_state) to `path` as JSON.
    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.export_state())?;
        std::fs::write(path.as_ref(), json)?;
        log::info!(
            "saved checkpoint at iteration {} to {}",
            self.iteration,
            path.as_ref().display()
        );
        Ok(())
    }

    /// Restore a checkpoint written by [`save_checkpoint`](Self::save_checkpoint).
    pub fn load_checkpoint(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let state: SolverState = serde_json::from_str(&text)?;
        self.import_state(state)?;
        log::info!("resumed from iteration {} ({})", self.iteration, path.as_ref().display());
        Ok(())
    }

    /// Reset the solver to initial state.
    pub fn reset(&mut self) {
        self.storage.clear();
        self.iteration = 0;
        self.stats = CFRStats {
            info_sets: self.storage.num_info_sets(),
            players: self.players.clone(),
            ..CFRStats::new()
        };
    }
}

fn label_of(tree: &GameTree, id: NodeId) -> Result<&str> {
    tree.node(id)
        .info_set()
        .ok_or_else(|| tree.structure_error(id, "decision node has no information set"))
}

fn row_of<'p>(profile: &'p Strategy, label: &str, num_actions: usize) -> Result<&'p [f64]> {
    profile
        .row_for(label, num_actions)?
        .ok_or_else(|| SolverError::UnknownInfoSet(label.to_string()))
}

/// Serializable solver state for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverState {
    /// Current iteration.
    pub iteration: u64,
    /// Storage export.
    pub storage: StorageExport,
    /// Statistics.
    pub stats: CFRStats,
}
