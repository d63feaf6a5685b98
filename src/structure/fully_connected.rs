//! Fully connected structure rules.
//!
//! The planned edge relation is the complete graph over the members,
//! stored in canonical orientation (earlier member -> later member), so a
//! node may carry several incoming edges of this type.

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::FullyConnected;

pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId,
) -> StructureCheck {
  if members.len() < 2 {
    return Err(format!("fully connected needs at least 2 members, found {}", members.len()));
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  for (i, &a) in members.iter().enumerate() {
    for &b in &members[i + 1..] {
      if !graph.has_edge(a, b, T) {
        return Err(format!("missing edge between {a} and {b}"));
      }
    }
  }
  let edges = graph.structure_edges(T, members);
  let expected = members.len() * (members.len() - 1) / 2;
  if edges.len() != expected {
    return Err(format!("expected {expected} edges, found {}", edges.len()));
  }
  Ok(())
}

/// Every member always has room: a newcomer wires to all of them.
pub fn can_accept_more_children(_graph: &StructureGraph, _node: NodeId) -> bool {
  true
}

pub fn can_be_removed_from_structure(member_count: usize) -> bool {
  member_count >= 2
}

pub fn predicted_link_count(members: usize) -> usize {
  members * members.saturating_sub(1) / 2
}
