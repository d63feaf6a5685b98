//! Balanced tree rules.
//!
//! A balanced tree keeps the per-level member counts even; the balance
//! metric is the standard deviation of members per depth level. Insertion
//! always goes to the shallowest member with a free child slot, ties broken
//! by fewer children, then by insertion order.

use crate::arena::NodeId;
use crate::structure::tree;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::BalancedTree;

/// Standard deviation of the member count per depth level.
pub fn balance_metric(graph: &StructureGraph, members: &[NodeId], head: NodeId) -> f64 {
  let levels = tree::level_counts(graph, T, members, head);
  if levels.is_empty() {
    return 0.0;
  }
  let mean = levels.iter().sum::<usize>() as f64 / levels.len() as f64;
  let var = levels.iter().map(|&c| (c as f64 - mean).powi(2)).sum::<f64>() / levels.len() as f64;
  var.sqrt()
}

pub fn is_balanced(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, tolerance: f64,
) -> bool {
  balance_metric(graph, members, head) <= tolerance
}

/// Tree invariant plus the child cap.
pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, target_links: usize,
) -> StructureCheck {
  tree::is_valid_structure(graph, T, members, head)?;
  for &m in members {
    let children = graph.get(m).map(|n| n.child_count_for(T)).unwrap_or(0);
    if children > target_links {
      return Err(format!("member {m} has {children} children, cap is {target_links}"));
    }
  }
  Ok(())
}

pub fn can_accept_more_children(
  graph: &StructureGraph, node: NodeId, target_links: usize,
) -> bool {
  graph.get(node).map_or(false, |n| n.child_count_for(T) < target_links)
}

/// The insertion point for the next member: shallowest candidate with a
/// free slot, fewer children first among equals.
pub fn insertion_candidate(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, target_links: usize,
) -> Option<NodeId> {
  members
    .iter()
    .enumerate()
    .filter(|(_, m)| can_accept_more_children(graph, **m, target_links))
    .map(|(i, m)| {
      let depth = tree::depth_of(graph, T, *m, head).unwrap_or(usize::MAX);
      let children = graph.get(*m).map(|n| n.child_count_for(T)).unwrap_or(usize::MAX);
      (depth, children, i, *m)
    })
    .min_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)))
    .map(|(_, _, _, m)| m)
}
