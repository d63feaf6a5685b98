//! Depth-limited tree rules.
//!
//! The mirror image of the balanced tree: insertion goes as deep as the
//! depth cap allows, filling a branch before opening the next one. With a
//! finite per-node child cap the structure has a hard capacity,
//! sum over d in 0..=max_depth of max_children^d.

use crate::arena::NodeId;
use crate::structure::tree;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::DepthLimitTree;

/// Tree invariant, depth bound and child cap.
///
/// Every non-leaf must sit strictly above `max_depth`, so no member ends
/// up deeper than the cap.
pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, max_depth: usize,
  max_children: Option<usize>,
) -> StructureCheck {
  tree::is_valid_structure(graph, T, members, head)?;
  for &m in members {
    let Some(node) = graph.get(m) else { continue };
    let depth = tree::depth_of(graph, T, m, head)
      .ok_or_else(|| format!("member {m} is detached from the head"))?;
    if depth > max_depth {
      return Err(format!("member {m} sits at depth {depth}, cap is {max_depth}"));
    }
    let children = node.child_count_for(T);
    if children > 0 && depth >= max_depth {
      return Err(format!("non-leaf {m} at the depth cap"));
    }
    if let Some(cap) = max_children {
      if children > cap {
        return Err(format!("member {m} has {children} children, cap is {cap}"));
      }
    }
  }
  Ok(())
}

pub fn can_accept_more_children(
  graph: &StructureGraph, node: NodeId, head: NodeId, max_depth: usize,
  max_children: Option<usize>,
) -> bool {
  let Some(n) = graph.get(node) else { return false };
  let Some(depth) = tree::depth_of(graph, T, node, head) else { return false };
  depth < max_depth && max_children.map_or(true, |cap| n.child_count_for(T) < cap)
}

/// The insertion point for the next member: deepest candidate under the
/// caps, insertion order among equals.
pub fn insertion_candidate(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, max_depth: usize,
  max_children: Option<usize>,
) -> Option<NodeId> {
  members
    .iter()
    .enumerate()
    .filter(|(_, m)| can_accept_more_children(graph, **m, head, max_depth, max_children))
    .map(|(i, m)| (tree::depth_of(graph, T, *m, head).unwrap_or(0), i, *m))
    .max_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
    .map(|(_, _, m)| m)
}

/// Members that fit under the caps at all.
pub fn capacity(max_depth: usize, max_children: Option<usize>) -> Option<usize> {
  let cap = max_children?;
  let mut total = 1usize;
  let mut level = 1usize;
  for _ in 0..max_depth {
    level = level.saturating_mul(cap);
    total = total.saturating_add(level);
  }
  Some(total)
}
