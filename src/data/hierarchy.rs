//! Hierarchy construction from delimited lineage paths.
//!
//! Abundance rows carry a lineage string such as
//! `k__Bacteria;p__Firmicutes;g__Lactobacillus`. The hierarchy is built by
//! splitting each lineage on the configured delimiter and inserting missing
//! intermediate nodes in first-seen order. After construction, internal node
//! abundances are the per-sample sum of their children's abundances,
//! enforced by a bottom-up propagation pass.

use crate::error::{Result, TaxocompError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Semantic rank of a hierarchy node, parsed from the conventional
/// one-letter label prefix (`k__Bacteria`, `p__Firmicutes`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rank {
    Domain,
    Kingdom,
    Phylum,
    Class,
    Order,
    Family,
    Genus,
    Species,
    /// Functional annotation (e.g. a pathway grafted under a taxon).
    Function,
}

impl Rank {
    /// Get the descriptive name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Kingdom => "kingdom",
            Self::Phylum => "phylum",
            Self::Class => "class",
            Self::Order => "order",
            Self::Family => "family",
            Self::Genus => "genus",
            Self::Species => "species",
            Self::Function => "function",
        }
    }
}

/// Split a raw label into its optional rank and the prefix-stripped
/// display name. Labels without a recognized prefix keep their full text.
pub fn parse_label(label: &str) -> (Option<Rank>, String) {
    if let Some(rest) = label.strip_prefix("fn__") {
        return (Some(Rank::Function), rest.to_string());
    }
    let rank = match label.get(..3) {
        Some("d__") => Some(Rank::Domain),
        Some("k__") => Some(Rank::Kingdom),
        Some("p__") => Some(Rank::Phylum),
        Some("c__") => Some(Rank::Class),
        Some("o__") => Some(Rank::Order),
        Some("f__") => Some(Rank::Family),
        Some("g__") => Some(Rank::Genus),
        Some("s__") => Some(Rank::Species),
        _ => None,
    };
    match rank {
        Some(r) => (Some(r), label[3..].to_string()),
        None => (None, label.to_string()),
    }
}

/// A flat abundance row: one lineage with its per-sample values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineageRow {
    /// Delimited lineage path, e.g. `k__Bacteria;p__Firmicutes`.
    pub lineage: String,
    /// Sample identifier -> abundance value.
    pub abundances: HashMap<String, f64>,
}

/// One node of the abundance hierarchy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Display label with any rank prefix stripped.
    pub name: String,
    /// Original label including the rank prefix.
    pub full_name: String,
    /// Delimiter-joined ancestor path. Unique across the tree and used as
    /// the key into statistics maps; display names collide across branches.
    pub path: String,
    /// Semantic rank, when the label carried a recognized prefix.
    pub rank: Option<Rank>,
    /// Child nodes in first-seen insertion order.
    pub children: Vec<HierarchyNode>,
    /// Sample identifier -> abundance value. For internal nodes this is
    /// the per-sample sum over children after propagation.
    pub abundances: HashMap<String, f64>,
}

impl HierarchyNode {
    /// Create a detached node from a raw label and its ancestor path.
    fn from_label(label: &str, path: String) -> Self {
        let (rank, name) = parse_label(label);
        Self {
            name,
            full_name: label.to_string(),
            path,
            rank,
            children: Vec::new(),
            abundances: HashMap::new(),
        }
    }

    /// Create an empty root node.
    pub fn root() -> Self {
        Self {
            name: "root".to_string(),
            full_name: "root".to_string(),
            path: "root".to_string(),
            rank: None,
            children: Vec::new(),
            abundances: HashMap::new(),
        }
    }

    /// Check whether this node is a leaf.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including self.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Number of leaves in this subtree.
    pub fn leaf_count(&self) -> usize {
        if self.is_leaf() {
            1
        } else {
            self.children.iter().map(|c| c.leaf_count()).sum()
        }
    }

    /// Maximum depth below this node (a leaf has depth 0).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Pre-order traversal visiting every node in this subtree.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a HierarchyNode)) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }

    /// Collect references to every node in pre-order.
    pub fn nodes(&self) -> Vec<&HierarchyNode> {
        let mut out = Vec::with_capacity(self.node_count());
        self.walk(&mut |n| out.push(n));
        out
    }

    /// Find a node in this subtree by its full ancestor path.
    pub fn find(&self, path: &str) -> Option<&HierarchyNode> {
        if self.path == path {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(path))
    }

    /// Get an existing child by its original label, or insert a new one.
    fn child_mut(&mut self, label: &str, delimiter: &str) -> &mut HierarchyNode {
        if let Some(idx) = self.children.iter().position(|c| c.full_name == label) {
            return &mut self.children[idx];
        }
        let path = if self.path == "root" {
            label.to_string()
        } else {
            format!("{}{}{}", self.path, delimiter, label)
        };
        self.children.push(HierarchyNode::from_label(label, path));
        self.children.last_mut().unwrap()
    }

    /// Recompute internal node abundances as the per-sample sum of their
    /// children's abundances, bottom-up. Leaf abundances are untouched.
    pub fn propagate_abundances(&mut self) {
        if self.is_leaf() {
            return;
        }
        for child in &mut self.children {
            child.propagate_abundances();
        }
        let mut summed: HashMap<String, f64> = HashMap::new();
        for child in &self.children {
            for (sample, value) in &child.abundances {
                *summed.entry(sample.clone()).or_insert(0.0) += value;
            }
        }
        self.abundances = summed;
    }

    /// Per-rank node counts for this subtree (unranked nodes excluded).
    pub fn rank_counts(&self) -> HashMap<Rank, usize> {
        let mut counts = HashMap::new();
        self.walk(&mut |n| {
            if let Some(rank) = n.rank {
                *counts.entry(rank).or_insert(0) += 1;
            }
        });
        counts
    }
}

/// Build a hierarchy from flat lineage rows.
///
/// Lineages are split on `delimiter`; empty segments are skipped. Each
/// row's abundances are assigned to the final node of its lineage,
/// accumulating additively when the same lineage appears twice. After
/// construction a propagation pass overwrites every internal node's
/// abundances with the per-sample sum over its children.
pub fn build_hierarchy(rows: &[LineageRow], delimiter: &str) -> Result<HierarchyNode> {
    if rows.is_empty() {
        return Err(TaxocompError::EmptyData(
            "No lineage rows to build hierarchy from".to_string(),
        ));
    }
    if delimiter.is_empty() {
        return Err(TaxocompError::InvalidParameter(
            "Lineage delimiter must be non-empty".to_string(),
        ));
    }

    let mut root = HierarchyNode::root();
    for row in rows {
        let mut node = &mut root;
        for segment in row.lineage.split(delimiter) {
            let segment = segment.trim();
            if segment.is_empty() {
                continue;
            }
            node = node.child_mut(segment, delimiter);
        }
        for (sample, value) in &row.abundances {
            *node.abundances.entry(sample.clone()).or_insert(0.0) += value;
        }
    }
    root.propagate_abundances();
    Ok(root)
}

/// Summary of a built hierarchy, printable by the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeSummary {
    pub n_nodes: usize,
    pub n_leaves: usize,
    pub depth: usize,
    /// (rank name, count) pairs in canonical rank order.
    pub rank_counts: Vec<(String, usize)>,
}

impl TreeSummary {
    /// Summarize a hierarchy.
    pub fn of(tree: &HierarchyNode) -> Self {
        let counts = tree.rank_counts();
        let order = [
            Rank::Domain,
            Rank::Kingdom,
            Rank::Phylum,
            Rank::Class,
            Rank::Order,
            Rank::Family,
            Rank::Genus,
            Rank::Species,
            Rank::Function,
        ];
        let rank_counts = order
            .iter()
            .filter_map(|r| counts.get(r).map(|&c| (r.name().to_string(), c)))
            .collect();
        Self {
            n_nodes: tree.node_count(),
            n_leaves: tree.leaf_count(),
            depth: tree.depth(),
            rank_counts,
        }
    }
}

impl std::fmt::Display for TreeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Hierarchy")?;
        writeln!(f, "  Nodes:  {}", self.n_nodes)?;
        writeln!(f, "  Leaves: {}", self.n_leaves)?;
        writeln!(f, "  Depth:  {}", self.depth)?;
        for (rank, count) in &self.rank_counts {
            writeln!(f, "  {:<8} {}", format!("{}:", rank), count)?;
        }
        Ok(())
    }
}
