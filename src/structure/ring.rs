//! Ring structure rules.
//!
//! The planning graph stores the full cycle as directed edges: every member
//! has exactly one outgoing and one incoming ring edge, and the canonical
//! walk follows the outgoing side. The successor of the last member is the
//! head, which the representation realises with an explicit closing edge.

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::Ring;

pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId,
) -> StructureCheck {
  if members.len() < 3 {
    return Err(format!("ring needs at least 3 members, found {}", members.len()));
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  for &m in members {
    let node = graph.get(m).ok_or_else(|| format!("member {m} not in graph"))?;
    let d = node.degree_for(T);
    if d != 2 {
      return Err(format!("member {m} has ring degree {d}"));
    }
  }
  // Degree 2 everywhere plus one closed walk covering every member is
  // exactly "single Hamiltonian cycle".
  let mut cur = head;
  for _ in 0..members.len() {
    cur = next_in_ring(graph, head, cur)
      .ok_or_else(|| format!("walk breaks at {cur}"))?;
  }
  if cur != head {
    return Err("walk does not close at the head".into());
  }
  let covered = graph.collect_members(T, head);
  if covered.len() != members.len() {
    return Err(format!("walk covers {} of {} members", covered.len(), members.len()));
  }
  Ok(())
}

/// The canonical successor: the outgoing ring edge, the head when the
/// closing edge is still missing mid-reconfiguration.
pub fn next_in_ring(graph: &StructureGraph, head: NodeId, node: NodeId) -> Option<NodeId> {
  let n = graph.get(node)?;
  n.children_for(T).next().or(Some(head)).filter(|_| n.has_type(T))
}

/// The canonical predecessor: the incoming ring edge.
pub fn previous_in_ring(graph: &StructureGraph, head: NodeId, node: NodeId) -> Option<NodeId> {
  let n = graph.get(node)?;
  if let Some(p) = n.parents_for(T).next() {
    return Some(p);
  }
  // No incoming edge: walk forward until something points at us.
  let mut cur = node;
  for _ in 0..graph.len() {
    let next = next_in_ring(graph, head, cur)?;
    if next == node {
      return Some(cur);
    }
    cur = next;
  }
  None
}

/// A member has capacity while its outgoing walk slot is vacant.
pub fn can_accept_more_children(graph: &StructureGraph, node: NodeId) -> bool {
  graph.get(node).map_or(false, |n| n.children_for(T).next().is_none())
}

/// Any member may leave while the ring stays above the minimum size.
pub fn can_be_removed_from_structure(member_count: usize) -> bool {
  member_count >= 4
}
