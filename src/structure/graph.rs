use ordermap::{OrderMap, OrderSet};
use tracing::trace;

use crate::arena::{Arena, MirrorId, NodeId};
use crate::structure::{StructureNode, StructureType};

/// The planning graph.
///
/// Nodes live in an arena and reference each other by id only; all edge
/// mutations go through this type so the child/parent maps stay mirrored
/// (invariant: a child's parent entry always points back to the node that
/// recorded it as a child).
///
/// Traversals are deterministic given insertion order. Cycles are tolerated
/// by every traversal (visited set); the tree-typed validators are the ones
/// that forbid them.
#[derive(Debug, Clone, Default)]
pub struct StructureGraph {
  nodes: Arena<NodeId, StructureNode>,
  mirror_index: OrderMap<MirrorId, NodeId>,
}

impl StructureGraph {
  pub fn new() -> Self {
    StructureGraph { nodes: Arena::new(), mirror_index: OrderMap::new() }
  }

  pub fn insert(&mut self, types: impl IntoIterator<Item = StructureType>) -> NodeId {
    self.nodes.insert(StructureNode::new(types))
  }

  /// Insert a node already bound to a mirror.
  pub fn insert_bound(
    &mut self, types: impl IntoIterator<Item = StructureType>, mirror: MirrorId,
  ) -> NodeId {
    let mut node = StructureNode::new(types);
    node.bind_mirror(mirror);
    let id = self.nodes.insert(node);
    self.mirror_index.insert(mirror, id);
    id
  }

  pub fn bind_mirror(&mut self, id: NodeId, mirror: MirrorId) {
    if let Some(node) = self.nodes.get_mut(id) {
      node.bind_mirror(mirror);
      self.mirror_index.insert(mirror, id);
    }
  }

  pub fn get(&self, id: NodeId) -> Option<&StructureNode> {
    self.nodes.get(id)
  }

  pub fn get_mut(&mut self, id: NodeId) -> Option<&mut StructureNode> {
    self.nodes.get_mut(id)
  }

  pub fn contains(&self, id: NodeId) -> bool {
    self.nodes.contains(id)
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn iter(&self) -> crate::arena::Iter<'_, NodeId, StructureNode> {
    self.nodes.iter()
  }

  pub fn clear(&mut self) {
    self.nodes.clear();
    self.mirror_index.clear();
  }

  pub fn node_for_mirror(&self, mirror: MirrorId) -> Option<NodeId> {
    self.mirror_index.get(&mirror).copied()
  }

  /// All nodes carrying the tag, in insertion order.
  pub fn nodes_with_type(&self, t: StructureType) -> Vec<NodeId> {
    self.nodes.iter().filter(|(_, n)| n.has_type(t)).map(|(id, _)| id).collect()
  }

  /// Attach `child` under `parent` for the given types.
  ///
  /// Maintains the parent backreference, adds the tags to both nodes' type
  /// sets, and propagates the head hint of each tag down to the child.
  pub fn add_child(&mut self, parent: NodeId, child: NodeId, types: &[StructureType]) {
    debug_assert!(parent != child, "Self edge in the planning graph!");
    if !self.nodes.contains(parent) || !self.nodes.contains(child) {
      return;
    }

    let mut hints: Vec<(StructureType, NodeId)> = Vec::new();
    {
      let p = self.nodes.get_mut(parent).unwrap();
      p.record_child(child, types);
      for t in types {
        p.add_type(*t);
        let hint = if p.is_head(*t) { Some(parent) } else { p.head_hint(*t) };
        if let Some(h) = hint {
          hints.push((*t, h));
        }
      }
    }
    {
      let c = self.nodes.get_mut(child).unwrap();
      c.record_parent(parent, types);
      for t in types {
        c.add_type(*t);
      }
      for (t, h) in hints {
        // A head keeps pointing at itself, it is not inside the parent's
        // substructure of that type.
        if !c.is_head(t) {
          c.set_head_hint(t, h);
        }
      }
    }
  }

  /// Drop the edge tags between `parent` and `child`; the edge itself is
  /// removed once its tag set is empty. Unknown edges are skipped.
  pub fn remove_child(&mut self, parent: NodeId, child: NodeId, types: &[StructureType]) {
    if let Some(p) = self.nodes.get_mut(parent) {
      p.erase_child(child, types);
    }
    if let Some(c) = self.nodes.get_mut(child) {
      c.erase_parent(parent, types);
    }
  }

  pub fn set_head(&mut self, id: NodeId, t: StructureType, flag: bool) {
    if let Some(node) = self.nodes.get_mut(id) {
      node.set_head(t, flag);
      if flag {
        node.set_head_hint(t, id);
      }
    }
  }

  pub fn is_head(&self, id: NodeId, t: StructureType) -> bool {
    self.nodes.get(id).map(|n| n.is_head(t)).unwrap_or(false)
  }

  /// Resolve the head of the substructure of type `t` that `start` belongs
  /// to, walking parent references. Falls back to the cached hint when the
  /// walk dead-ends (possible mid-reconfiguration).
  pub fn head_of(&self, start: NodeId, t: StructureType) -> Option<NodeId> {
    let mut visited = OrderSet::new();
    let mut cur = start;
    loop {
      let node = self.nodes.get(cur)?;
      if node.is_head(t) {
        return Some(cur);
      }
      if !visited.insert(cur) {
        break;
      }
      match node.parent_for(t) {
        Some(p) => cur = p,
        None => break,
      }
    }
    let hint = self.nodes.get(start)?.head_hint(t)?;
    self.nodes.get(hint).filter(|n| n.is_head(t)).map(|_| hint)
  }

  /// Collect the members of the substructure of type `t` containing
  /// `start`, in deterministic breadth-first discovery order starting at
  /// the structure's head.
  ///
  /// Only edges tagged `t` are followed, and heads of *other* instances of
  /// `t` bound the traversal, so equally-typed substructures hosted next to
  /// each other stay separate.
  pub fn collect_members(&self, t: StructureType, start: NodeId) -> Vec<NodeId> {
    let Some(head) = self.head_of(start, t) else {
      return Vec::new();
    };
    let mut order = Vec::new();
    let mut visited = OrderSet::new();
    let mut queue = std::collections::VecDeque::new();
    queue.push_back(head);
    visited.insert(head);
    while let Some(id) = queue.pop_front() {
      let Some(node) = self.nodes.get(id) else { continue };
      if !node.has_type(t) {
        continue;
      }
      order.push(id);
      for next in node.children_for(t).chain(node.parents_for(t)) {
        if visited.contains(&next) {
          continue;
        }
        let Some(n) = self.nodes.get(next) else { continue };
        if n.is_head(t) && next != head {
          continue;
        }
        visited.insert(next);
        queue.push_back(next);
      }
    }
    order
  }

  /// Distinct undirected edges tagged `t` among `members`, each reported
  /// once as (parent, child).
  pub fn structure_edges(&self, t: StructureType, members: &[NodeId]) -> Vec<(NodeId, NodeId)> {
    let member_set: OrderSet<NodeId> = members.iter().copied().collect();
    let mut edges = Vec::new();
    for &m in members {
      let Some(node) = self.nodes.get(m) else { continue };
      for child in node.children_for(t) {
        if member_set.contains(&child) {
          edges.push((m, child));
        }
      }
    }
    edges
  }

  /// Remove every edge incident to `id`, in both directions.
  pub fn unwire_node(&mut self, id: NodeId) {
    let Some(node) = self.nodes.get(id) else { return };
    let children: Vec<NodeId> = node.children().map(|(c, _)| c).collect();
    let parents: Vec<NodeId> = node.parents().map(|(p, _)| p).collect();
    for c in children {
      if let Some(n) = self.nodes.get_mut(c) {
        n.drop_edge_to_parent(id);
      }
      self.nodes.get_mut(id).unwrap().drop_edge_to_child(c);
    }
    for p in parents {
      if let Some(n) = self.nodes.get_mut(p) {
        n.drop_edge_to_child(id);
      }
      self.nodes.get_mut(id).unwrap().drop_edge_to_parent(p);
    }
  }

  /// Unwire and delete the node. Removing an already-removed node is a
  /// no-op. The caller cascades onto the physical layer.
  pub fn remove_node(&mut self, id: NodeId) -> Option<StructureNode> {
    if !self.nodes.contains(id) {
      return None;
    }
    self.unwire_node(id);
    let node = self.nodes.remove(id)?;
    if let Some(m) = node.mirror() {
      self.mirror_index.remove(&m);
    }
    trace!(node = %id, "planning node removed");
    Some(node)
  }

  /// Whether an edge tagged `t` exists between the pair, either direction.
  pub fn has_edge(&self, a: NodeId, b: NodeId, t: StructureType) -> bool {
    self
      .nodes
      .get(a)
      .map(|n| {
        n.children_for(t).any(|c| c == b) || n.parents_for(t).any(|p| p == b)
      })
      .unwrap_or(false)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::structure::StructureType::*;

  #[test]
  fn add_child_maintains_backrefs() {
    let mut g = StructureGraph::new();
    let a = g.insert([Tree]);
    let b = g.insert([Tree]);
    g.add_child(a, b, &[Tree]);
    assert_eq!(g.get(b).unwrap().parent_for(Tree), Some(a));
    assert_eq!(g.get(a).unwrap().children_for(Tree).collect::<Vec<_>>(), vec![b]);
  }

  #[test]
  fn remove_last_tag_drops_edge() {
    let mut g = StructureGraph::new();
    let a = g.insert([Tree, Star]);
    let b = g.insert([Tree, Star]);
    g.add_child(a, b, &[Tree, Star]);
    g.remove_child(a, b, &[Tree]);
    assert!(g.has_edge(a, b, Star));
    assert!(!g.has_edge(a, b, Tree));
    g.remove_child(a, b, &[Star]);
    assert_eq!(g.get(b).unwrap().planned_links(), 0);
  }

  #[test]
  fn head_resolution_walks_parents() {
    let mut g = StructureGraph::new();
    let h = g.insert([Tree]);
    g.set_head(h, Tree, true);
    let m = g.insert([Tree]);
    let l = g.insert([Tree]);
    g.add_child(h, m, &[Tree]);
    g.add_child(m, l, &[Tree]);
    assert_eq!(g.head_of(l, Tree), Some(h));
    assert_eq!(g.collect_members(Tree, l), vec![h, m, l]);
  }

  #[test]
  fn traversal_stops_at_foreign_heads() {
    let mut g = StructureGraph::new();
    let h1 = g.insert([Star]);
    let h2 = g.insert([Star]);
    g.set_head(h1, Star, true);
    g.set_head(h2, Star, true);
    let a = g.insert([Star]);
    g.add_child(h1, a, &[Star]);
    // A bridge-style edge from a member of the first star to the head of a
    // second one must not leak the second star's members in.
    let b = g.insert([Star]);
    g.add_child(h2, b, &[Star]);
    g.add_child(a, h2, &[Star]);
    let members = g.collect_members(Star, a);
    assert!(members.contains(&h1) && members.contains(&a));
    assert!(!members.contains(&h2) && !members.contains(&b));
  }

  #[test]
  fn traversal_tolerates_cycles() {
    let mut g = StructureGraph::new();
    let a = g.insert([Ring]);
    let b = g.insert([Ring]);
    let c = g.insert([Ring]);
    g.set_head(a, Ring, true);
    g.add_child(a, b, &[Ring]);
    g.add_child(b, c, &[Ring]);
    g.add_child(c, a, &[Ring]);
    assert_eq!(g.collect_members(Ring, b).len(), 3);
    assert_eq!(g.head_of(c, Ring), Some(a));
  }

  #[test]
  fn remove_node_is_idempotent() {
    let mut g = StructureGraph::new();
    let a = g.insert([Line]);
    let b = g.insert([Line]);
    g.add_child(a, b, &[Line]);
    assert!(g.remove_node(b).is_some());
    assert!(g.remove_node(b).is_none());
    assert_eq!(g.get(a).unwrap().planned_links(), 0);
  }
}
