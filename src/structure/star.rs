//! Star structure rules.
//!
//! One center, everyone else directly attached to it. A non-center member
//! is either a leaf or the head of a nested substructure hosted on the
//! star (a "child-head"); the star itself never grows grandchildren.

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::Star;

pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId,
) -> StructureCheck {
  if members.len() < 3 {
    return Err(format!("star needs at least 3 members, found {}", members.len()));
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  let center = graph.get(head).ok_or("center not in graph")?;
  if center.parents_for(T).any(|p| members.contains(&p)) {
    return Err("center has an internal parent".into());
  }
  let spokes: Vec<NodeId> = center.children_for(T).collect();
  for &m in members {
    if m == head {
      continue;
    }
    let node = graph.get(m).ok_or_else(|| format!("member {m} not in graph"))?;
    if !spokes.contains(&m) {
      return Err(format!("member {m} is not attached to the center"));
    }
    let star_children = node.child_count_for(T);
    // A leaf, or a child-head hosting some nested structure; never a star
    // grandchild.
    if star_children > 0 {
      return Err(format!("member {m} has star grandchildren"));
    }
    let is_leaf = node.children().count() == 0;
    let is_child_head = node.head_types().any(|ht| ht != T);
    if !is_leaf && !is_child_head {
      return Err(format!("member {m} is neither a leaf nor a child-head"));
    }
  }
  Ok(())
}

/// The center of the star `start` belongs to.
pub fn center(graph: &StructureGraph, start: NodeId) -> Option<NodeId> {
  graph.head_of(start, T)
}

/// Spoke members in attachment order.
pub fn leaves(graph: &StructureGraph, center: NodeId) -> Vec<NodeId> {
  graph.get(center).map(|n| n.children_for(T).collect()).unwrap_or_default()
}

/// Only the center accepts more members.
pub fn can_accept_more_children(graph: &StructureGraph, node: NodeId) -> bool {
  graph.get(node).map_or(false, |n| n.is_head(T))
}

/// Only leaves are removable, and only while the star keeps at least two.
pub fn can_be_removed_from_structure(
  graph: &StructureGraph, node: NodeId, center: NodeId,
) -> bool {
  if node == center {
    return false;
  }
  let leaf_count = leaves(graph, center).len();
  leaf_count >= 2
    && graph.get(node).map_or(false, |n| n.child_count_for(T) == 0)
}
