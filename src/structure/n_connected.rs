//! N-connected structure rules.
//!
//! Every member holds `min(n, m-1)` in-structure edges. At small sizes the
//! structure degenerates toward fully connected; when `m * n` is odd one
//! member necessarily stays one edge short (handshake), which the expected
//! total `floor(m * min(n, m-1) / 2)` already accounts for.

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::NConnected;

/// Target degree at `members` total size.
pub fn target_degree(n: usize, members: usize) -> usize {
  n.min(members.saturating_sub(1))
}

pub fn predicted_link_count(n: usize, members: usize) -> usize {
  members * target_degree(n, members) / 2
}

pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId, n: usize,
) -> StructureCheck {
  if members.len() < 2 {
    return Err(format!("n-connected needs at least 2 members, found {}", members.len()));
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  let target = target_degree(n, members.len());
  let short_allowed = (members.len() * target) % 2;
  let mut short = 0;
  for &m in members {
    let node = graph.get(m).ok_or_else(|| format!("member {m} not in graph"))?;
    match node.degree_for(T) {
      d if d == target => {}
      d if d + 1 == target => short += 1,
      d => return Err(format!("member {m} has degree {d}, target {target}")),
    }
  }
  if short != short_allowed {
    return Err(format!("{short} members below target degree, {short_allowed} allowed"));
  }
  let edges = graph.structure_edges(T, members);
  let expected = predicted_link_count(n, members.len());
  if edges.len() != expected {
    return Err(format!("expected {expected} edges, found {}", edges.len()));
  }
  Ok(())
}

/// A member takes another peer while below its degree parameter.
pub fn can_accept_more_children(graph: &StructureGraph, node: NodeId, n: usize) -> bool {
  graph.get(node).map_or(false, |node| node.degree_for(T) < n)
}

/// Removal keeps n-regularity satisfiable only above n+1 members.
pub fn can_be_removed_from_structure(member_count: usize, n: usize) -> bool {
  member_count > n
}

/// Implemented in-structure edges over the maximum possible at this size.
pub fn connectivity_density(graph: &StructureGraph, members: &[NodeId]) -> f64 {
  if members.len() < 2 {
    return 0.0;
  }
  let max = members.len() * (members.len() - 1) / 2;
  graph.structure_edges(T, members).len() as f64 / max as f64
}
