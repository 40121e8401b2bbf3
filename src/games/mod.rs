//! Game definitions for the solvers.
//!
//! A [`Game`] bundles a built tree with its information sets. Games come
//! from three places:
//!
//! 1. **Description files** in the text format of [`format`], read with
//!    [`load`].
//! 2. **Bundled descriptions** compiled into the crate, see [`bundled`].
//! 3. **Generators** that build a tree from the rules of a game: [`kuhn`]
//!    and [`rps`].
//!
//! ## Available Games
//!
//! - `kuhn`: Kuhn Poker, a 3-card poker game with a known Nash equilibrium
//! - `rps`: Rock-Paper-Superscissors, one information set per player

pub mod format;
pub mod kuhn;
pub mod rps;

use std::path::Path;

use crate::error::{Result, SolverError};
use crate::tree::{GameTree, InfoSetRegistry};

const KUHN: &str = include_str!("../../games/kuhn.txt");
const ROCK_PAPER_SUPERSCISSORS: &str = include_str!("../../games/rock_paper_superscissors.txt");

/// Names accepted by [`bundled`].
pub const BUNDLED: [&str; 2] = ["kuhn", "rps"];

/// A game tree together with its information sets.
#[derive(Debug, Clone)]
pub struct Game {
    /// Display name.
    pub name: String,
    /// The tree.
    pub tree: GameTree,
    /// Information sets covering every decision node of `tree`.
    pub info_sets: InfoSetRegistry,
}

impl Game {
    /// Bundle a tree with its registry.
    pub fn new(name: impl Into<String>, tree: GameTree, info_sets: InfoSetRegistry) -> Self {
        Self {
            name: name.into(),
            tree,
            info_sets,
        }
    }

    /// Bundle a tree whose decision nodes are all labelled, grouping them
    /// into information sets by label.
    pub fn from_tree(name: impl Into<String>, tree: GameTree) -> Result<Self> {
        let info_sets = InfoSetRegistry::from_tree(&tree)?;
        Ok(Self::new(name, tree, info_sets))
    }
}

/// Read a game description file.
pub fn load(path: impl AsRef<Path>) -> Result<Game> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    format::parse(&name, &text)
}

/// A game description shipped with the crate.
///
/// `rock_paper_superscissors` is accepted as a long name for `rps`.
pub fn bundled(name: &str) -> Result<Game> {
    match name {
        "kuhn" => format::parse("kuhn", KUHN),
        "rps" | "rock_paper_superscissors" => {
            format::parse("rock_paper_superscissors", ROCK_PAPER_SUPERSCISSORS)
        }
        other => Err(SolverError::UnknownGame(other.to_string())),
    }
}

/// Load `game` as a file if one exists at that path, else as a bundled name.
pub fn resolve(game: &str) -> Result<Game> {
    if Path::new(game).is_file() {
        load(game)
    } else {
        bundled(game)
    }
}
