//! Information set registry.
//!
//! An information set groups the decision nodes a player cannot tell apart.
//! The registry is an index from label to member nodes that sits beside the
//! tree; the tree itself only stores the label on each node.

use rustc_hash::{FxHashMap, FxHashSet};

use super::{GameTree, NodeId, NodeKind};
use crate::error::{Result, SolverError};

/// One registered information set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoSet {
    label: String,
    player: String,
    actions: Vec<String>,
    nodes: Vec<NodeId>,
}

impl InfoSet {
    /// Label of the set.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Player acting at every member.
    pub fn player(&self) -> &str {
        &self.player
    }

    /// Actions shared by every member, in declared order.
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Member nodes in registration order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
}

/// Label → member nodes, with the shared owner and actions of each set.
#[derive(Debug, Clone, Default)]
pub struct InfoSetRegistry {
    sets: FxHashMap<String, InfoSet>,
    order: Vec<String>,
}

impl InfoSetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Group every labelled decision node of `tree` by label.
    ///
    /// Sets are registered in order of their first member.
    pub fn from_tree(tree: &GameTree) -> Result<Self> {
        let mut groups: Vec<(String, Vec<NodeId>)> = Vec::new();
        let mut index: FxHashMap<&str, usize> = FxHashMap::default();
        for id in tree.decision_nodes() {
            let Some(label) = tree.node(id).info_set() else {
                continue;
            };
            match index.get(label) {
                Some(&i) => groups[i].1.push(id),
                None => {
                    index.insert(label, groups.len());
                    groups.push((label.to_string(), vec![id]));
                }
            }
        }

        let mut registry = Self::new();
        for (label, nodes) in groups {
            registry.register(tree, label, nodes)?;
        }
        registry.ensure_covers(tree)?;
        Ok(registry)
    }

    /// Register `nodes` under `label`.
    ///
    /// The members must be decision nodes carrying `label`, share the acting
    /// player and the ordered action list, and none may lie below another.
    pub fn register(
        &mut self,
        tree: &GameTree,
        label: impl Into<String>,
        nodes: Vec<NodeId>,
    ) -> Result<()> {
        let label = label.into();
        let invalid = |reason: String| SolverError::InvalidInfoSet {
            label: label.clone(),
            reason,
        };

        if self.sets.contains_key(&label) {
            return Err(invalid("registered twice".to_string()));
        }
        let Some(&first) = nodes.first() else {
            return Err(invalid("has no nodes".to_string()));
        };

        let mut shared: Option<(&str, &[String])> = None;
        let mut members = FxHashSet::default();
        for &id in &nodes {
            let node = tree
                .get(id)
                .ok_or_else(|| invalid(format!("node #{} does not exist", id.index())))?;
            let (player, actions) = match node.kind() {
                NodeKind::Decision { player, actions } => (player.as_str(), actions.as_slice()),
                kind => {
                    return Err(invalid(format!(
                        "{} node at {} cannot belong to an information set",
                        kind.name(),
                        tree.path_string(id)
                    )))
                }
            };
            if node.info_set() != Some(label.as_str()) {
                return Err(invalid(format!(
                    "node at {} is labelled {:?}",
                    tree.path_string(id),
                    node.info_set()
                )));
            }
            if !members.insert(id) {
                return Err(invalid(format!("lists {} twice", tree.path_string(id))));
            }
            match shared {
                None => shared = Some((player, actions)),
                Some((p, _)) if p != player => {
                    return Err(invalid(format!(
                        "node at {} belongs to player `{}`, not `{}`",
                        tree.path_string(id),
                        player,
                        p
                    )))
                }
                Some((_, a)) if a != actions => {
                    return Err(invalid(format!(
                        "node at {} has actions {:?}, expected {:?}",
                        tree.path_string(id),
                        actions,
                        a
                    )))
                }
                Some(_) => {}
            }
        }

        for &id in &nodes {
            let mut ancestor = tree.node(id).parent();
            while let Some(up) = ancestor {
                if members.contains(&up) {
                    return Err(invalid(format!(
                        "{} lies below {} in the same set",
                        tree.path_string(id),
                        tree.path_string(up)
                    )));
                }
                ancestor = tree.node(up).parent();
            }
        }

        let player = tree.node(first).player().unwrap_or_default().to_string();
        let actions = tree.node(first).actions().map(str::to_string).collect();
        log::debug!(
            "registered information set {} ({} nodes, player {})",
            label,
            nodes.len(),
            player
        );

        self.order.push(label.clone());
        self.sets.insert(
            label.clone(),
            InfoSet {
                label,
                player,
                actions,
                nodes,
            },
        );
        Ok(())
    }

    /// Check that every decision node of `tree` belongs to a registered set.
    pub fn ensure_covers(&self, tree: &GameTree) -> Result<()> {
        for id in tree.decision_nodes() {
            let Some(label) = tree.node(id).info_set() else {
                return Err(tree.structure_error(id, "decision node has no information set"));
            };
            if !self.get(label)?.nodes.contains(&id) {
                return Err(tree.structure_error(
                    id,
                    format!("node is labelled `{}` but not registered there", label),
                ));
            }
        }
        Ok(())
    }

    /// The registered set called `label`.
    pub fn get(&self, label: &str) -> Result<&InfoSet> {
        self.sets
            .get(label)
            .ok_or_else(|| SolverError::UnknownInfoSet(label.to_string()))
    }

    /// Member nodes of `label`.
    pub fn lookup(&self, label: &str) -> Result<&[NodeId]> {
        self.get(label).map(InfoSet::nodes)
    }

    /// Player acting in `label`.
    pub fn owner_of(&self, label: &str) -> Result<&str> {
        self.get(label).map(InfoSet::player)
    }

    /// Actions available in `label`.
    pub fn actions_of(&self, label: &str) -> Result<&[String]> {
        self.get(label).map(InfoSet::actions)
    }

    /// All labels in registration order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Labels of the sets owned by `player`.
    pub fn labels_for<'a>(&'a self, player: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter().filter(move |s| s.player == player).map(InfoSet::label)
    }

    /// All sets in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &InfoSet> {
        self.order.iter().filter_map(|label| self.sets.get(label))
    }

    /// Number of registered sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
