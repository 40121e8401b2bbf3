//! Game tree model.
//!
//! A game is a finite tree of decision, chance and terminal nodes. The tree
//! is stored as an arena: every node is addressed by a [`NodeId`], owns its
//! children through the arena, and keeps a non-owning back reference to its
//! parent that is only used for lookups (history paths, error context).
//!
//! Trees are assembled with a [`TreeBuilder`] and are immutable once
//! [`TreeBuilder::build`] has checked their invariants. Information sets are
//! kept outside the tree, in an [`InfoSetRegistry`], and are only referenced
//! from nodes by label.
//!
//! # Example
//!
//! ```
//! use efg_solver::tree::{NodeKind, TreeBuilder};
//!
//! let mut builder = TreeBuilder::new(NodeKind::decision("1", ["l", "r"]));
//! let root = builder.root();
//! builder.add_child(root, "l", NodeKind::terminal([("1", 1.0), ("2", -1.0)])).unwrap();
//! builder.add_child(root, "r", NodeKind::terminal([("1", 0.0), ("2", 0.0)])).unwrap();
//! let tree = builder.build().unwrap();
//!
//! assert_eq!(tree.len(), 3);
//! assert_eq!(tree.players(), ["1", "2"]);
//! ```

pub mod info_set;

pub use info_set::{InfoSet, InfoSetRegistry};

use std::collections::BTreeSet;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SolverError};

/// Chance probabilities must sum to 1 within this tolerance.
pub const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Index of a node in its [`GameTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// The three kinds of node and their per-kind data.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A player chooses one of `actions`.
    Decision {
        /// Acting player.
        player: String,
        /// Legal actions in declared order.
        actions: Vec<String>,
    },
    /// Nature picks an outcome with the declared probability.
    Chance {
        /// Outcome labels and their probabilities, in declared order.
        outcomes: Vec<(String, f64)>,
    },
    /// The game is over.
    Terminal {
        /// Payoff of every player.
        payoffs: FxHashMap<String, f64>,
    },
}

impl NodeKind {
    /// Decision node for `player` with the given actions.
    pub fn decision<P, I, A>(player: P, actions: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = A>,
        A: Into<String>,
    {
        NodeKind::Decision {
            player: player.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }

    /// Chance node with `(label, probability)` outcomes.
    pub fn chance<I, A>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = (A, f64)>,
        A: Into<String>,
    {
        NodeKind::Chance {
            outcomes: outcomes.into_iter().map(|(a, p)| (a.into(), p)).collect(),
        }
    }

    /// Terminal node with `(player, payoff)` entries.
    pub fn terminal<I, P>(payoffs: I) -> Self
    where
        I: IntoIterator<Item = (P, f64)>,
        P: Into<String>,
    {
        NodeKind::Terminal {
            payoffs: payoffs.into_iter().map(|(p, v)| (p.into(), v)).collect(),
        }
    }

    /// Short name of the variant, used in messages.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Decision { .. } => "decision",
            NodeKind::Chance { .. } => "chance",
            NodeKind::Terminal { .. } => "terminal",
        }
    }

    /// Number of outgoing edges.
    pub fn num_actions(&self) -> usize {
        match self {
            NodeKind::Decision { actions, .. } => actions.len(),
            NodeKind::Chance { outcomes } => outcomes.len(),
            NodeKind::Terminal { .. } => 0,
        }
    }

    /// Label of the `index`-th edge.
    pub fn action(&self, index: usize) -> Option<&str> {
        match self {
            NodeKind::Decision { actions, .. } => actions.get(index).map(String::as_str),
            NodeKind::Chance { outcomes } => outcomes.get(index).map(|(a, _)| a.as_str()),
            NodeKind::Terminal { .. } => None,
        }
    }

    /// Position of `action` among the declared edges.
    pub fn action_index(&self, action: &str) -> Option<usize> {
        (0..self.num_actions()).find(|&i| self.action(i) == Some(action))
    }

    /// Checks the per-node invariants that don't depend on the rest of the tree.
    fn check(&self) -> std::result::Result<(), String> {
        let labels: Vec<&str> = (0..self.num_actions()).filter_map(|i| self.action(i)).collect();
        let mut seen = FxHashSet::default();
        for label in &labels {
            if !seen.insert(*label) {
                return Err(format!("action `{}` declared twice", label));
            }
        }

        match self {
            NodeKind::Decision { actions, .. } if actions.is_empty() => {
                Err("decision node declares no actions".to_string())
            }
            NodeKind::Decision { .. } => Ok(()),
            NodeKind::Chance { outcomes } => {
                if let Some((label, p)) = outcomes.iter().find(|(_, p)| !(0.0..=1.0).contains(p)) {
                    return Err(format!("probability {} of `{}` is outside [0, 1]", p, label));
                }
                let total: f64 = outcomes.iter().map(|(_, p)| p).sum();
                if (total - 1.0).abs() > PROBABILITY_TOLERANCE {
                    return Err(format!("chance probabilities sum to {}", total));
                }
                Ok(())
            }
            NodeKind::Terminal { payoffs } if payoffs.is_empty() => {
                Err("terminal node has no payoffs".to_string())
            }
            NodeKind::Terminal { .. } => Ok(()),
        }
    }
}

/// A node of a built tree.
#[derive(Debug, Clone)]
pub struct TreeNode {
    kind: NodeKind,
    parent: Option<NodeId>,
    edge: Option<String>,
    children: Vec<NodeId>,
    info_set: Option<String>,
}

impl TreeNode {
    fn new(kind: NodeKind, parent: Option<NodeId>, edge: Option<String>) -> Self {
        Self {
            kind,
            parent,
            edge,
            children: Vec::new(),
            info_set: None,
        }
    }

    /// Variant and per-variant data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Label of the edge leading into this node, `None` for the root.
    pub fn edge(&self) -> Option<&str> {
        self.edge.as_deref()
    }

    /// Children in declared action order (empty for terminals).
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Information set label (decision nodes only).
    pub fn info_set(&self) -> Option<&str> {
        self.info_set.as_deref()
    }

    /// Number of outgoing edges.
    pub fn num_actions(&self) -> usize {
        self.kind.num_actions()
    }

    /// Edge labels in declared order.
    pub fn actions(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.num_actions()).filter_map(move |i| self.kind.action(i))
    }

    /// Child reached through `action`.
    pub fn child(&self, action: &str) -> Option<NodeId> {
        self.kind.action_index(action).map(|i| self.children[i])
    }

    /// Acting player of a decision node.
    pub fn player(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Decision { player, .. } => Some(player),
            _ => None,
        }
    }

    /// Payoff of `player` at a terminal node.
    pub fn payoff(&self, player: &str) -> Option<f64> {
        match &self.kind {
            NodeKind::Terminal { payoffs } => payoffs.get(player).copied(),
            _ => None,
        }
    }

    /// Whether the node ends the game.
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }
}

/// An immutable game tree.
#[derive(Debug, Clone)]
pub struct GameTree {
    nodes: Vec<TreeNode>,
    players: Vec<String>,
}

impl GameTree {
    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Look up a node.
    ///
    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Look up a node, returning `None` for foreign ids.
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a tree has at least a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in creation order (parents before children).
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Sorted player ids.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    /// Child of `id` through `action`.
    pub fn child(&self, id: NodeId, action: &str) -> Option<NodeId> {
        self.node(id).child(action)
    }

    /// Follow a sequence of actions from the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |id, action| self.child(id, action.as_ref()))
    }

    /// Actions leading from the root to `id`.
    pub fn history(&self, id: NodeId) -> Vec<&str> {
        history_of(&self.nodes, id)
    }

    /// History rendered as `/a/b/`, used in messages.
    pub fn path_string(&self, id: NodeId) -> String {
        render_path(&self.history(id))
    }

    /// Length of the longest root-to-leaf path.
    ///
    /// Every traversal in this crate recurses once per edge, so this is also
    /// the maximum recursion depth of the solvers.
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent {
                depths[i] = depths[parent.0] + 1;
            }
        }
        depths.into_iter().max().unwrap_or(0)
    }

    /// Ids of all decision nodes.
    pub fn decision_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Decision { .. }))
            .map(|(id, _)| id)
    }

    pub(crate) fn structure_error(&self, id: NodeId, reason: impl Into<String>) -> SolverError {
        SolverError::InvalidStructure {
            path: self.path_string(id),
            reason: reason.into(),
        }
    }
}

fn history_of(nodes: &[TreeNode], id: NodeId) -> Vec<&str> {
    let mut edges = Vec::new();
    let mut current = Some(id);
    while let Some(node) = current.and_then(|id| nodes.get(id.0)) {
        if let Some(edge) = node.edge.as_deref() {
            edges.push(edge);
        }
        current = node.parent;
    }
    edges.reverse();
    edges
}

fn render_path(edges: &[&str]) -> String {
    let mut path = String::from("/");
    for edge in edges {
        path.push_str(edge);
        path.push('/');
    }
    path
}

/// Assembles a [`GameTree`].
///
/// Children and information set labels can only be attached here; the
/// resulting tree is checked once in [`TreeBuilder::build`].
#[derive(Debug, Clone)]
pub struct TreeBuilder {
    nodes: Vec<TreeNode>,
    slots: Vec<Vec<Option<NodeId>>>,
}

impl TreeBuilder {
    /// Start a tree with the given root.
    pub fn new(root: NodeKind) -> Self {
        let slots = vec![vec![None; root.num_actions()]];
        Self {
            nodes: vec![TreeNode::new(root, None, None)],
            slots,
        }
    }

    /// The root node.
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of nodes added so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: a builder starts with a root.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Attach a new node under `parent` through `action`.
    pub fn add_child(&mut self, parent: NodeId, action: &str, kind: NodeKind) -> Result<NodeId> {
        let Some(parent_node) = self.nodes.get(parent.0) else {
            return Err(SolverError::InvalidStructure {
                path: format!("#{}", parent.0),
                reason: "parent does not exist".to_string(),
            });
        };
        let Some(slot) = parent_node.kind.action_index(action) else {
            return Err(self.error(
                parent,
                format!("{} node has no action `{}`", parent_node.kind.name(), action),
            ));
        };
        if self.slots[parent.0][slot].is_some() {
            return Err(self.error(parent, format!("child `{}` added twice", action)));
        }

        let id = NodeId(self.nodes.len());
        let num_actions = kind.num_actions();
        self.nodes
            .push(TreeNode::new(kind, Some(parent), Some(action.to_string())));
        self.slots.push(vec![None; num_actions]);
        self.slots[parent.0][slot] = Some(id);
        Ok(id)
    }

    /// Attach a node at `path` (a sequence of actions from the root).
    ///
    /// The node's parent is the node at `path` minus its last action, which
    /// must already exist.
    pub fn add_at_path<S: AsRef<str>>(&mut self, path: &[S], kind: NodeKind) -> Result<NodeId> {
        let Some((action, parent_path)) = path.split_last() else {
            return Err(self.error(self.root(), "the root already exists"));
        };
        let parent = self.find(parent_path).ok_or_else(|| SolverError::InvalidStructure {
            path: render_path(&path.iter().map(|s| s.as_ref()).collect::<Vec<&str>>()),
            reason: "parent node does not exist".to_string(),
        })?;
        self.add_child(parent, action.as_ref(), kind)
    }

    /// Follow a sequence of actions from the root.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<NodeId> {
        path.iter().try_fold(self.root(), |id, action| {
            let slot = self.nodes[id.0].kind.action_index(action.as_ref())?;
            self.slots[id.0][slot]
        })
    }

    /// Label a decision node with its information set.
    pub fn set_info_set(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Decision { .. }) => {
                self.nodes[id.0].info_set = Some(label.into());
                Ok(())
            }
            Some(kind) => Err(self.error(
                id,
                format!("information sets only apply to decision nodes, not {}", kind.name()),
            )),
            None => Err(SolverError::InvalidStructure {
                path: format!("#{}", id.0),
                reason: "node does not exist".to_string(),
            }),
        }
    }

    /// Check every invariant and freeze the tree.
    pub fn build(self) -> Result<GameTree> {
        let TreeBuilder { mut nodes, slots } = self;

        for (i, node) in nodes.iter().enumerate() {
            node.kind.check().map_err(|reason| SolverError::InvalidStructure {
                path: render_path(&history_of(&nodes, NodeId(i))),
                reason,
            })?;
            if let Some(slot) = slots[i].iter().position(Option::is_none) {
                let action = node.kind.action(slot).unwrap_or_default();
                return Err(SolverError::InvalidStructure {
                    path: render_path(&history_of(&nodes, NodeId(i))),
                    reason: format!("no child for declared action `{}`", action),
                });
            }
        }

        let mut players = BTreeSet::new();
        for node in &nodes {
            match &node.kind {
                NodeKind::Decision { player, .. } => {
                    players.insert(player.clone());
                }
                NodeKind::Terminal { payoffs } => players.extend(payoffs.keys().cloned()),
                NodeKind::Chance { .. } => {}
            }
        }
        for (i, node) in nodes.iter().enumerate() {
            if let NodeKind::Terminal { payoffs } = &node.kind {
                if let Some(missing) = players.iter().find(|p| !payoffs.contains_key(*p)) {
                    return Err(SolverError::InvalidStructure {
                        path: render_path(&history_of(&nodes, NodeId(i))),
                        reason: format!("no payoff for player `{}`", missing),
                    });
                }
            }
        }

        for (node, slots) in nodes.iter_mut().zip(slots) {
            node.children = slots.into_iter().flatten().collect();
        }

        Ok(GameTree {
            nodes,
            players: players.into_iter().collect(),
        })
    }

    fn error(&self, id: NodeId, reason: impl Into<String>) -> SolverError {
        SolverError::InvalidStructure {
            path: render_path(&history_of(&self.nodes, id)),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matching_pennies() -> TreeBuilder {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["h", "t"]));
        for first in ["h", "t"] {
            let node = builder
                .add_child(NodeId::ROOT, first, NodeKind::decision("2", ["h", "t"]))
                .unwrap();
            builder.set_info_set(node, "2").unwrap();
            for second in ["h", "t"] {
                let v = if first == second { 1.0 } else { -1.0 };
                builder
                    .add_child(node, second, NodeKind::terminal([("1", v), ("2", -v)]))
                    .unwrap();
            }
        }
        builder.set_info_set(NodeId::ROOT, "1").unwrap();
        builder
    }

    #[test]
    fn test_build_and_navigate() {
        let tree = matching_pennies().build().unwrap();

        assert_eq!(tree.len(), 7);
        assert_eq!(tree.players(), ["1", "2"]);
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.decision_nodes().count(), 3);

        let leaf = tree.find(&["t", "h"]).unwrap();
        assert_eq!(tree.node(leaf).payoff("1"), Some(-1.0));
        assert_eq!(tree.history(leaf), vec!["t", "h"]);
        assert_eq!(tree.path_string(leaf), "/t/h/");

        let parent = tree.node(leaf).parent().unwrap();
        assert_eq!(tree.node(parent).info_set(), Some("2"));
        assert_eq!(tree.node(parent).player(), Some("2"));
        assert_eq!(tree.node(parent).actions().collect::<Vec<_>>(), vec!["h", "t"]);
    }

    #[test]
    fn test_missing_child_is_rejected() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a", "b"]));
        builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 0.0)]))
            .unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, SolverError::InvalidStructure { ref path, .. } if path == "/"));
        assert!(err.to_string().contains("`b`"));
    }

    #[test]
    fn test_undeclared_and_duplicate_children() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a"]));
        assert!(builder
            .add_child(NodeId::ROOT, "z", NodeKind::terminal([("1", 0.0)]))
            .is_err());
        builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 0.0)]))
            .unwrap();
        assert!(builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 0.0)]))
            .is_err());
    }

    #[test]
    fn test_chance_probabilities_must_sum_to_one() {
        let mut builder = TreeBuilder::new(NodeKind::chance([("x", 0.5), ("y", 0.4)]));
        for a in ["x", "y"] {
            builder
                .add_child(NodeId::ROOT, a, NodeKind::terminal([("1", 0.0)]))
                .unwrap();
        }
        let err = builder.build().unwrap_err();
        assert!(err.to_string().contains("sum to"));
    }

    #[test]
    fn test_terminal_needs_every_player() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a", "b"]));
        builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 1.0), ("2", -1.0)]))
            .unwrap();
        builder
            .add_child(NodeId::ROOT, "b", NodeKind::terminal([("1", 1.0)]))
            .unwrap();

        let err = builder.build().unwrap_err();
        assert!(matches!(err, SolverError::InvalidStructure { ref path, .. } if path == "/b/"));
    }

    #[test]
    fn test_info_set_only_on_decision_nodes() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a"]));
        let leaf = builder
            .add_child(NodeId::ROOT, "a", NodeKind::terminal([("1", 0.0)]))
            .unwrap();
        assert!(builder.set_info_set(leaf, "x").is_err());
    }

    #[test]
    fn test_add_at_path_needs_parent() {
        let mut builder = TreeBuilder::new(NodeKind::decision("1", ["a"]));
        let err = builder
            .add_at_path(&["a", "b"], NodeKind::terminal([("1", 0.0)]))
            .unwrap_err();
        assert!(err.to_string().contains("parent"));

        let id = builder
            .add_at_path(&["a"], NodeKind::decision("2", ["b"]))
            .unwrap();
        assert_eq!(builder.find(&["a"]), Some(id));
    }
}
