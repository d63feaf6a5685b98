//! Skeleton builders for the tree family.
//!
//! Both builders attach planning nodes for a pool of mirrors under an
//! existing head node and report the edges they created, so the calling
//! strategy can implement each edge as a physical link. They are shared by
//! the tree strategies and by the snowflake substructure factory, which is
//! why they know nothing about any particular strategy instance.

use tracing::warn;

use crate::arena::{MirrorId, NodeId};
use crate::structure::{balanced_tree, depth_limit_tree, StructureGraph, StructureType};

/// Attach `mirrors` under `head` breadth-first, always filling the
/// shallowest member with a free slot. Returns the created edges in
/// creation order.
pub fn grow_balanced_tree(
  graph: &mut StructureGraph, head: NodeId, mirrors: &[MirrorId], target_links: usize,
) -> Vec<(NodeId, NodeId)> {
  let t = StructureType::BalancedTree;
  let mut members = graph.collect_members(t, head);
  if members.is_empty() {
    members.push(head);
  }
  let mut edges = Vec::new();
  for &mirror in mirrors {
    let Some(parent) =
      balanced_tree::insertion_candidate(graph, &members, head, target_links)
    else {
      // Unreachable while target_links >= 1; guarded for zero caps.
      warn!(%mirror, "balanced tree has no free slot");
      break;
    };
    let node = graph.insert_bound([t], mirror);
    graph.add_child(parent, node, &[t]);
    members.push(node);
    edges.push((parent, node));
  }
  edges
}

/// Attach `mirrors` under `head` depth-first up to `max_depth`, honoring
/// the per-node child cap. Returns the created edges and the mirrors that
/// did not fit under the caps.
pub fn grow_depth_limit_tree(
  graph: &mut StructureGraph, head: NodeId, mirrors: &[MirrorId], max_depth: usize,
  max_children: Option<usize>,
) -> (Vec<(NodeId, NodeId)>, Vec<MirrorId>) {
  let t = StructureType::DepthLimitTree;
  let mut members = graph.collect_members(t, head);
  if members.is_empty() {
    members.push(head);
  }
  let mut edges = Vec::new();
  let mut unplaced = Vec::new();
  for &mirror in mirrors {
    match depth_limit_tree::insertion_candidate(graph, &members, head, max_depth, max_children)
    {
      Some(parent) => {
        let node = graph.insert_bound([t], mirror);
        graph.add_child(parent, node, &[t]);
        members.push(node);
        edges.push((parent, node));
      }
      None => unplaced.push(mirror),
    }
  }
  (edges, unplaced)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::structure::tree;

  fn pool(n: usize) -> Vec<MirrorId> {
    (1..=n).map(MirrorId).collect()
  }

  #[test]
  fn balanced_builder_fills_levels() {
    let mut graph = StructureGraph::new();
    let head = graph.insert_bound([StructureType::BalancedTree], MirrorId(100));
    graph.set_head(head, StructureType::BalancedTree, true);
    let edges = grow_balanced_tree(&mut graph, head, &pool(14), 2);
    assert_eq!(edges.len(), 14);
    let members = graph.collect_members(StructureType::BalancedTree, head);
    assert_eq!(members.len(), 15);
    // 15 members with 2 children per node is a full binary tree: 4 levels.
    assert_eq!(tree::tree_depth(&graph, StructureType::BalancedTree, &members, head), 4);
    let levels = tree::level_counts(&graph, StructureType::BalancedTree, &members, head);
    assert_eq!(levels, vec![1, 2, 4, 8]);
  }

  #[test]
  fn depth_limit_builder_respects_capacity() {
    let mut graph = StructureGraph::new();
    let head = graph.insert_bound([StructureType::DepthLimitTree], MirrorId(100));
    graph.set_head(head, StructureType::DepthLimitTree, true);
    let (edges, unplaced) =
      grow_depth_limit_tree(&mut graph, head, &pool(99), 3, Some(3));
    // Capacity 1 + 3 + 9 + 27 = 40, the head occupies one slot.
    assert_eq!(edges.len(), 39);
    assert_eq!(unplaced.len(), 60);
    let members = graph.collect_members(StructureType::DepthLimitTree, head);
    for &m in &members {
      let d = tree::depth_of(&graph, StructureType::DepthLimitTree, m, head).unwrap();
      assert!(d <= 3);
    }
  }

  #[test]
  fn depth_limit_builder_goes_deep_first() {
    let mut graph = StructureGraph::new();
    let head = graph.insert_bound([StructureType::DepthLimitTree], MirrorId(100));
    graph.set_head(head, StructureType::DepthLimitTree, true);
    let (edges, unplaced) = grow_depth_limit_tree(&mut graph, head, &pool(3), 3, Some(2));
    assert!(unplaced.is_empty());
    // The first branch is filled to the cap before a second one opens.
    let members = graph.collect_members(StructureType::DepthLimitTree, head);
    let max_depth = members
      .iter()
      .filter_map(|&m| tree::depth_of(&graph, StructureType::DepthLimitTree, m, head))
      .max()
      .unwrap();
    assert_eq!(max_depth, 3);
    assert_eq!(edges.len(), 3);
  }
}
