//! Line structure rules.
//!
//! A line is a chain of members: two endpoints of in-line degree one,
//! everyone else of degree two, no branching, no cycle. The head is an
//! endpoint and the canonical walk runs head -> other endpoint.

use crate::arena::NodeId;
use crate::structure::{StructureCheck, StructureGraph, StructureType};

const T: StructureType = StructureType::Line;

pub fn is_valid_structure(
  graph: &StructureGraph, members: &[NodeId], head: NodeId,
) -> StructureCheck {
  if members.len() < 2 {
    return Err(format!("line needs at least 2 members, found {}", members.len()));
  }
  if !members.contains(&head) {
    return Err("head is not a member".into());
  }
  let mut endpoints = 0;
  for &m in members {
    let node = graph.get(m).ok_or_else(|| format!("member {m} not in graph"))?;
    if !node.has_type(T) {
      return Err(format!("member {m} lacks the line tag"));
    }
    match node.degree_for(T) {
      1 => endpoints += 1,
      2 => {}
      d => return Err(format!("member {m} has line degree {d}")),
    }
  }
  if endpoints != 2 {
    return Err(format!("expected 2 endpoints, found {endpoints}"));
  }
  let Some(h) = graph.get(head) else { return Err("head not in graph".into()) };
  if h.degree_for(T) != 1 {
    return Err("head is not an endpoint".into());
  }
  // Degree profile rules out branching; walking the chain rules out a
  // split into several components.
  if walk(graph, head).len() != members.len() {
    return Err("line is not a single chain".into());
  }
  Ok(())
}

/// The canonical walk from the head to the far endpoint.
pub fn walk(graph: &StructureGraph, head: NodeId) -> Vec<NodeId> {
  let mut order = vec![head];
  let mut prev = None;
  let mut cur = head;
  loop {
    let Some(node) = graph.get(cur) else { break };
    let next = node
      .children_for(T)
      .chain(node.parents_for(T))
      .find(|n| Some(*n) != prev && !order.contains(n));
    match next {
      Some(n) => {
        order.push(n);
        prev = Some(cur);
        cur = n;
      }
      None => break,
    }
  }
  order
}

/// The endpoint opposite the head.
pub fn other_endpoint(graph: &StructureGraph, head: NodeId) -> Option<NodeId> {
  let order = walk(graph, head);
  if order.len() < 2 {
    None
  } else {
    order.last().copied()
  }
}

/// Zero-based position along the canonical walk.
pub fn position_in_line(graph: &StructureGraph, head: NodeId, node: NodeId) -> Option<usize> {
  walk(graph, head).iter().position(|n| *n == node)
}

/// Endpoints may grow the line; a middle member may not branch.
pub fn can_accept_more_children(graph: &StructureGraph, node: NodeId) -> bool {
  graph.get(node).map_or(false, |n| n.degree_for(T) < 2)
}

/// Only endpoints are removable, and only while at least 3 members keep
/// the line non-degenerate afterwards.
pub fn can_be_removed_from_structure(
  graph: &StructureGraph, node: NodeId, member_count: usize,
) -> bool {
  member_count >= 3 && graph.get(node).map_or(false, |n| n.degree_for(T) == 1)
}
