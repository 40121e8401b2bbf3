//! Line-oriented game description format.
//!
//! ```text
//! # comments and blank lines are ignored
//! node / chance actions JQ=0.5 QJ=0.5
//! node /C:JQ/ player 1 actions p b
//! node /C:JQ/P1:p/ terminal payoffs 1=-1 2=1
//! infoset J: nodes /C:JQ/ /C:JK/
//! ```
//!
//! A path lists the edges from the root, one `/`-separated segment each;
//! only the part of a segment after its first `:` is the action, the prefix
//! names who chose it. The first `node` line declares the root (`/`), and
//! every other node must be declared after its parent.

use std::fmt::Write as _;

use crate::error::{Result, SolverError};
use crate::games::Game;
use crate::tree::{GameTree, InfoSetRegistry, NodeId, NodeKind, TreeBuilder};

/// Parse a game description.
///
/// Syntax errors are reported as [`SolverError::Parse`] with the 1-based line
/// number. Once every line is read the tree and its information sets are
/// checked like any other tree.
pub fn parse(name: &str, text: &str) -> Result<Game> {
    let mut builder: Option<TreeBuilder> = None;
    let mut info_sets: Vec<(usize, String, Vec<Vec<String>>)> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let tokens: Vec<&str> = content.split_whitespace().collect();
        match tokens[0] {
            "node" => {
                let (path, kind) = parse_node(line, &tokens)?;
                match builder.as_mut() {
                    None if path.is_empty() => builder = Some(TreeBuilder::new(kind)),
                    None => return Err(parse_error(line, "the first node must be the root `/`")),
                    Some(_) if path.is_empty() => {
                        return Err(parse_error(line, "the root is declared twice"))
                    }
                    Some(builder) => {
                        builder
                            .add_at_path(&path, kind)
                            .map_err(|err| parse_error(line, err.to_string()))?;
                    }
                }
            }
            "infoset" => {
                let (label, paths) = parse_infoset(line, &tokens)?;
                info_sets.push((line, label, paths));
            }
            keyword => return Err(parse_error(line, format!("unknown keyword `{}`", keyword))),
        }
    }

    let Some(mut builder) = builder else {
        return Err(parse_error(text.lines().count().max(1), "no nodes declared"));
    };

    let mut members = Vec::with_capacity(info_sets.len());
    for (line, label, paths) in info_sets {
        let mut nodes = Vec::with_capacity(paths.len());
        for path in &paths {
            let id = builder.find(path).ok_or_else(|| {
                parse_error(line, format!("no node at {}", render(path)))
            })?;
            builder
                .set_info_set(id, label.as_str())
                .map_err(|err| parse_error(line, err.to_string()))?;
            nodes.push(id);
        }
        members.push((label, nodes));
    }

    let tree = builder.build()?;
    let mut registry = InfoSetRegistry::new();
    for (label, nodes) in members {
        registry.register(&tree, label, nodes)?;
    }
    registry.ensure_covers(&tree)?;

    log::info!(
        "loaded {}: {} nodes, {} information sets, players {:?}",
        name,
        tree.len(),
        registry.len(),
        tree.players()
    );
    Ok(Game::new(name, tree, registry))
}

fn parse_node(line: usize, tokens: &[&str]) -> Result<(Vec<String>, NodeKind)> {
    let path = parse_path(line, token(line, tokens, 1, "a node path")?)?;
    let kind = match token(line, tokens, 2, "a node kind")? {
        "player" => {
            let player = token(line, tokens, 3, "a player id")?;
            expect(line, tokens, 4, "actions")?;
            let actions = &tokens[5.min(tokens.len())..];
            if actions.is_empty() {
                return Err(parse_error(line, "a decision node needs actions"));
            }
            NodeKind::decision(player, actions.iter().copied())
        }
        "chance" => {
            expect(line, tokens, 3, "actions")?;
            let outcomes = tokens[4..]
                .iter()
                .map(|pair| parse_pair(line, pair))
                .collect::<Result<Vec<_>>>()?;
            NodeKind::chance(outcomes)
        }
        "terminal" => {
            expect(line, tokens, 3, "payoffs")?;
            let payoffs = tokens[4..]
                .iter()
                .map(|pair| parse_pair(line, pair))
                .collect::<Result<Vec<_>>>()?;
            NodeKind::terminal(payoffs)
        }
        other => return Err(parse_error(line, format!("unknown node kind `{}`", other))),
    };
    Ok((path, kind))
}

fn parse_infoset(line: usize, tokens: &[&str]) -> Result<(String, Vec<Vec<String>>)> {
    let label = token(line, tokens, 1, "an information set label")?;
    expect(line, tokens, 2, "nodes")?;
    let paths = tokens[3..]
        .iter()
        .map(|path| parse_path(line, path))
        .collect::<Result<Vec<_>>>()?;
    if paths.is_empty() {
        return Err(parse_error(line, format!("information set `{}` lists no nodes", label)));
    }
    Ok((label.to_string(), paths))
}

/// `/` is the root; `/C:JQ/P1:b/` is `["JQ", "b"]`.
fn parse_path(line: usize, path: &str) -> Result<Vec<String>> {
    let inner = path
        .strip_prefix('/')
        .and_then(|p| if p.is_empty() { Some(p) } else { p.strip_suffix('/') })
        .ok_or_else(|| parse_error(line, format!("path `{}` must start and end with `/`", path)))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    inner
        .split('/')
        .map(|segment| match segment.split_once(':') {
            Some((_, action)) if !action.is_empty() => Ok(action.to_string()),
            _ => Err(parse_error(
                line,
                format!("path segment `{}` is not `<who>:<action>`", segment),
            )),
        })
        .collect()
}

fn parse_pair(line: usize, pair: &str) -> Result<(String, f64)> {
    let (key, value) = pair
        .split_once('=')
        .ok_or_else(|| parse_error(line, format!("expected `<name>=<number>`, found `{}`", pair)))?;
    let value: f64 = value
        .parse()
        .map_err(|_| parse_error(line, format!("`{}` is not a number", value)))?;
    if key.is_empty() || !value.is_finite() {
        return Err(parse_error(line, format!("invalid entry `{}`", pair)));
    }
    Ok((key.to_string(), value))
}

fn token<'t>(line: usize, tokens: &[&'t str], index: usize, what: &str) -> Result<&'t str> {
    tokens
        .get(index)
        .copied()
        .ok_or_else(|| parse_error(line, format!("expected {}", what)))
}

fn expect(line: usize, tokens: &[&str], index: usize, keyword: &str) -> Result<()> {
    match tokens.get(index) {
        Some(&found) if found == keyword => Ok(()),
        Some(found) => Err(parse_error(line, format!("expected `{}`, found `{}`", keyword, found))),
        None => Err(parse_error(line, format!("expected `{}`", keyword))),
    }
}

fn parse_error(line: usize, reason: impl Into<String>) -> SolverError {
    SolverError::Parse {
        line,
        reason: reason.into(),
    }
}

fn render(path: &[String]) -> String {
    let mut out = String::from("/");
    for action in path {
        out.push_str(action);
        out.push('/');
    }
    out
}

/// Write `game` in the description format.
///
/// Nodes are written parents first, information sets in registration order.
/// Labels containing whitespace, `/` or `=` cannot be represented.
pub fn to_text(game: &Game) -> String {
    let tree = &game.tree;
    let mut out = String::new();
    let _ = writeln!(out, "# {}", game.name);

    for (id, node) in tree.iter() {
        let path = node_path(tree, id);
        let _ = match node.kind() {
            NodeKind::Decision { player, actions } => {
                writeln!(out, "node {} player {} actions {}", path, player, actions.join(" "))
            }
            NodeKind::Chance { outcomes } => {
                let outcomes: Vec<String> =
                    outcomes.iter().map(|(a, p)| format!("{}={}", a, p)).collect();
                writeln!(out, "node {} chance actions {}", path, outcomes.join(" "))
            }
            NodeKind::Terminal { .. } => {
                let payoffs: Vec<String> = tree
                    .players()
                    .iter()
                    .filter_map(|p| node.payoff(p).map(|v| format!("{}={}", p, v)))
                    .collect();
                writeln!(out, "node {} terminal payoffs {}", path, payoffs.join(" "))
            }
        };
    }

    for set in game.info_sets.iter() {
        let paths: Vec<String> = set.nodes().iter().map(|&id| node_path(tree, id)).collect();
        let _ = writeln!(out, "infoset {} nodes {}", set.label(), paths.join(" "));
    }
    out
}

/// Path of `id` with a `C` or `P<player>` prefix on every segment.
fn node_path(tree: &GameTree, id: NodeId) -> String {
    let mut segments = Vec::new();
    let mut current = id;
    while let Some(parent) = tree.node(current).parent() {
        let who = match tree.node(parent).player() {
            Some(player) => format!("P{}", player),
            None => "C".to_string(),
        };
        segments.push(format!("{}:{}", who, tree.node(current).edge().unwrap_or_default()));
        current = parent;
    }
    segments.reverse();

    let mut out = String::from("/");
    for segment in segments {
        out.push_str(&segment);
        out.push('/');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PENNIES: &str = "\
# matching pennies
node / player 1 actions h t

node /P1:h/ player 2 actions h t
node /P1:t/ player 2 actions h t
node /P1:h/P2:h/ terminal payoffs 1=1 2=-1
node /P1:h/P2:t/ terminal payoffs 1=-1 2=1
node /P1:t/P2:h/ terminal payoffs 1=-1 2=1
node /P1:t/P2:t/ terminal payoffs 1=1 2=-1
infoset P1 nodes /
infoset P2 nodes /P1:h/ /P1:t/
";

    #[test]
    fn test_parse_pennies() {
        let game = parse("pennies", PENNIES).unwrap();

        assert_eq!(game.tree.len(), 7);
        assert_eq!(game.tree.players(), ["1", "2"]);
        assert_eq!(game.info_sets.labels().collect::<Vec<_>>(), vec!["P1", "P2"]);
        assert_eq!(game.info_sets.lookup("P2").unwrap().len(), 2);

        let leaf = game.tree.find(&["t", "h"]).unwrap();
        assert_eq!(game.tree.node(leaf).payoff("2"), Some(1.0));
    }

    #[test]
    fn test_paths() {
        assert_eq!(parse_path(1, "/").unwrap(), Vec::<String>::new());
        assert_eq!(parse_path(1, "/C:JQ/P1:b/").unwrap(), vec!["JQ", "b"]);
        assert_eq!(parse_path(1, "/C:a:b/").unwrap(), vec!["a:b"]);
        assert!(parse_path(1, "C:JQ/").is_err());
        assert!(parse_path(1, "/C:JQ").is_err());
        assert!(parse_path(1, "/JQ/").is_err());
    }

    #[test]
    fn test_errors_carry_line_numbers() {
        let cases = [
            ("node / player 1 actions a\nnode /P1:a/ terminal payoffs 1=x\n", 2),
            ("node / player 1 actions a\nedge /P1:a/\n", 2),
            ("\n\nnode /P1:a/ terminal payoffs 1=0\n", 3),
            ("node / player 1 actions a\nnode /P1:a/P1:b/ terminal payoffs 1=0\n", 2),
            ("node / player 1 actions a\nnode / player 1 actions a\n", 2),
            ("node / chance actions a=0.5 b\n", 1),
            ("node / player 1\n", 1),
            (
                concat!(
                    "node / player 1 actions a\n",
                    "node /P1:a/ terminal payoffs 1=0\n",
                    "infoset I nodes /P1:z/\n",
                ),
                3,
            ),
        ];
        for (text, expected) in cases {
            match parse("bad", text) {
                Err(SolverError::Parse { line, .. }) => assert_eq!(line, expected, "{:?}", text),
                other => panic!("{:?} parsed as {:?}", text, other.map(|g| g.tree.len())),
            }
        }
    }

    #[test]
    fn test_structure_errors_after_parsing() {
        // Player 1 has no payoff at /P1:b/.
        let text = "node / player 1 actions a b\n\
                    node /P1:a/ terminal payoffs 1=1\n\
                    node /P1:b/ terminal payoffs 2=1\n\
                    infoset I nodes /\n";
        assert!(matches!(
            parse("bad", text),
            Err(SolverError::InvalidStructure { .. })
        ));

        // The root is never put in an information set.
        let text = "node / player 1 actions a\nnode /P1:a/ terminal payoffs 1=0\n";
        assert!(matches!(
            parse("bad", text),
            Err(SolverError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_to_text_round_trip() {
        let game = parse("pennies", PENNIES).unwrap();
        let text = to_text(&game);
        assert!(text.contains("node /P1:h/P2:t/ terminal payoffs 1=-1 2=1"));
        assert!(text.contains("infoset P2 nodes /P1:h/ /P1:t/"));

        let again = parse("pennies", &text).unwrap();
        assert_eq!(to_text(&again), text);
    }
}
