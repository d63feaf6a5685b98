//! Tree structure rules, shared by the plain, balanced and depth-limited
//! variants.
//!
//! Depth is always computed from the planning graph: the distance from a
//! member to the head along parent references. Nothing in the crate stores
//! a depth field.

use ordermap::OrderSet;

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

/// Depth of `node` inside the structure of type `t` rooted at `head`;
/// `None` when the node does not reach the head.
pub fn depth_of(
  graph: &StructureGraph, t: StructureType, node: NodeId, head: NodeId,
) -> Option<usize> {
  let mut depth = 0;
  let mut visited = OrderSet::new();
  let mut cur = node;
  loop {
    if cur == head {
      return Some(depth);
    }
    if !visited.insert(cur) {
      return None;
    }
    cur = graph.get(cur)?.parent_for(t)?;
    depth += 1;
  }
}

/// Number of members at each depth level, index = depth.
pub fn level_counts(
  graph: &StructureGraph, t: StructureType, members: &[NodeId], head: NodeId,
) -> Vec<usize> {
  let mut levels: Vec<usize> = Vec::new();
  for &m in members {
    if let Some(d) = depth_of(graph, t, m, head) {
      if levels.len() <= d {
        levels.resize(d + 1, 0);
      }
      levels[d] += 1;
    }
  }
  levels
}

/// Number of populated levels; the conventional "depth" of the whole tree.
pub fn tree_depth(
  graph: &StructureGraph, t: StructureType, members: &[NodeId], head: NodeId,
) -> usize {
  level_counts(graph, t, members, head).len()
}

/// The tree invariant: one head without internal parent, every other
/// member exactly one internal parent, |members|-1 edges, all members
/// reachable from the head.
///
/// An *external* parent of the head is permitted; embedded trees keep
/// their host edge under the host's tag, which this check ignores.
pub fn is_valid_structure(
  graph: &StructureGraph, t: StructureType, members: &[NodeId], head: NodeId,
) -> StructureCheck {
  if members.is_empty() {
    return Err("tree has no members".into());
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  let member_set: OrderSet<NodeId> = members.iter().copied().collect();

  for &m in members {
    let node = graph.get(m).ok_or_else(|| format!("member {m} not in graph"))?;
    if !node.has_type(t) {
      return Err(format!("member {m} lacks the {t} tag"));
    }
    let internal_parents: Vec<NodeId> =
      node.parents_for(t).filter(|p| member_set.contains(p)).collect();
    if m == head {
      if !internal_parents.is_empty() {
        return Err(format!("head {m} has an internal parent"));
      }
    } else if internal_parents.len() != 1 {
      return Err(format!("member {m} has {} internal parents", internal_parents.len()));
    }
  }

  let edges = graph.structure_edges(t, members);
  if edges.len() != members.len() - 1 {
    return Err(format!("expected {} edges, found {}", members.len() - 1, edges.len()));
  }

  // Single internal parent per non-head plus the edge count rules out
  // cycles; reachability is what remains to check.
  let reached = graph.collect_members(t, head);
  if reached.len() != members.len() || !members.iter().all(|m| reached.contains(m)) {
    return Err("not all members are reachable from the head".into());
  }
  Ok(())
}

/// Any tree member may take more children.
pub fn can_accept_more_children(_graph: &StructureGraph, _node: NodeId) -> bool {
  true
}

/// A member can leave the structure iff it is a leaf; the head only as the
/// sole remaining member.
pub fn can_be_removed_from_structure(
  graph: &StructureGraph, t: StructureType, node: NodeId, head: NodeId,
) -> bool {
  let Some(n) = graph.get(node) else { return false };
  if node == head {
    return graph.collect_members(t, head).len() == 1;
  }
  n.children_for(t).next().is_none()
}

/// Leaves first, deepest first, latest-added first within a level: the
/// deterministic retirement order for the tree family.
pub fn removal_order(
  graph: &StructureGraph, t: StructureType, members: &[NodeId], head: NodeId,
) -> Vec<NodeId> {
  let mut leaves: Vec<(usize, usize, NodeId)> = members
    .iter()
    .enumerate()
    .filter(|(_, m)| {
      **m != head && graph.get(**m).map_or(false, |n| n.children_for(t).next().is_none())
    })
    .map(|(i, m)| (depth_of(graph, t, *m, head).unwrap_or(0), i, *m))
    .collect();
  leaves.sort_by(|a, b| b.0.cmp(&a.0).then(b.1.cmp(&a.1)));
  leaves.into_iter().map(|(_, _, m)| m).collect()
}
