use ordermap::{OrderMap, OrderSet};

use crate::arena::{MirrorId, NodeId};
use crate::structure::StructureType;

/// A vertex of the planning graph.
///
/// Edges are directed parent -> child and carry the subset of structure
/// types they participate in. Each node mirrors its incoming edges, so the
/// parent reference for a type is always recoverable from the child side;
/// [`StructureGraph`](crate::structure::StructureGraph) keeps the two maps
/// consistent on every mutation.
#[derive(Debug, Clone, Default)]
pub struct StructureNode {
  node_types: OrderSet<StructureType>,
  /// Outgoing edges in insertion order, tagged with their types.
  children: OrderMap<NodeId, OrderSet<StructureType>>,
  /// Incoming edges, the exact mirror of some other nodes' `children`.
  parents: OrderMap<NodeId, OrderSet<StructureType>>,
  /// Types this node is the head of.
  heads: OrderSet<StructureType>,
  /// Cached id of the head of the substructure per type; a fast-path hint
  /// maintained on wiring, not authoritative.
  head_hints: OrderMap<StructureType, NodeId>,
  mirror: Option<MirrorId>,
}

impl StructureNode {
  pub fn new(types: impl IntoIterator<Item = StructureType>) -> Self {
    StructureNode { node_types: types.into_iter().collect(), ..Default::default() }
  }

  pub fn node_types(&self) -> &OrderSet<StructureType> {
    &self.node_types
  }

  pub fn has_type(&self, t: StructureType) -> bool {
    self.node_types.contains(&t)
  }

  pub fn add_type(&mut self, t: StructureType) {
    self.node_types.insert(t);
  }

  pub fn remove_type(&mut self, t: StructureType) {
    self.node_types.remove(&t);
    self.heads.remove(&t);
    self.head_hints.remove(&t);
  }

  /// All outgoing edges in insertion order.
  pub fn children(&self) -> impl Iterator<Item = (NodeId, &OrderSet<StructureType>)> + '_ {
    self.children.iter().map(|(k, v)| (*k, v))
  }

  /// Outgoing edges participating in `t`, in insertion order.
  pub fn children_for(&self, t: StructureType) -> impl Iterator<Item = NodeId> + '_ {
    self.children.iter().filter(move |(_, tags)| tags.contains(&t)).map(|(k, _)| *k)
  }

  pub fn parents(&self) -> impl Iterator<Item = (NodeId, &OrderSet<StructureType>)> + '_ {
    self.parents.iter().map(|(k, v)| (*k, v))
  }

  pub fn parents_for(&self, t: StructureType) -> impl Iterator<Item = NodeId> + '_ {
    self.parents.iter().filter(move |(_, tags)| tags.contains(&t)).map(|(k, _)| *k)
  }

  /// The structural parent for `t`: the first incoming edge carrying the
  /// tag. Complete-graph types store several incoming edges per node; the
  /// tree-like types never do.
  pub fn parent_for(&self, t: StructureType) -> Option<NodeId> {
    self.parents_for(t).next()
  }

  /// In-structure degree for `t`: distinct neighbours over both directions.
  pub fn degree_for(&self, t: StructureType) -> usize {
    self.children_for(t).count() + self.parents_for(t).count()
  }

  /// Planned link count of the node: every incident edge, counted once,
  /// regardless of type.
  pub fn planned_links(&self) -> usize {
    self.children.len() + self.parents.len()
  }

  pub fn child_count_for(&self, t: StructureType) -> usize {
    self.children_for(t).count()
  }

  pub fn is_head(&self, t: StructureType) -> bool {
    self.heads.contains(&t)
  }

  pub fn set_head(&mut self, t: StructureType, flag: bool) {
    if flag {
      self.heads.insert(t);
      self.node_types.insert(t);
    } else {
      self.heads.remove(&t);
    }
  }

  pub fn head_types(&self) -> impl Iterator<Item = StructureType> + '_ {
    self.heads.iter().copied()
  }

  pub fn head_hint(&self, t: StructureType) -> Option<NodeId> {
    self.head_hints.get(&t).copied()
  }

  pub fn set_head_hint(&mut self, t: StructureType, head: NodeId) {
    self.head_hints.insert(t, head);
  }

  pub fn mirror(&self) -> Option<MirrorId> {
    self.mirror
  }

  /// Bind a mirror to this node. The binding is immutable for the lifetime
  /// of the node.
  ///
  /// # Panics
  /// Panics if the node is already bound to a different mirror.
  pub fn bind_mirror(&mut self, mirror: MirrorId) {
    assert!(
      self.mirror.is_none() || self.mirror == Some(mirror),
      "Rebinding a structure node to a different mirror!"
    );
    self.mirror = Some(mirror);
  }

  // Edge storage maintenance; only StructureGraph calls these.

  pub(super) fn record_child(&mut self, child: NodeId, types: &[StructureType]) {
    let tags = self.children.entry(child).or_default();
    for t in types {
      tags.insert(*t);
    }
  }

  pub(super) fn record_parent(&mut self, parent: NodeId, types: &[StructureType]) {
    let tags = self.parents.entry(parent).or_default();
    for t in types {
      tags.insert(*t);
    }
  }

  /// Drop the given tags from the edge to `child`; returns true when the
  /// edge carries no tags any more and was removed entirely.
  pub(super) fn erase_child(&mut self, child: NodeId, types: &[StructureType]) -> bool {
    if let Some(tags) = self.children.get_mut(&child) {
      for t in types {
        tags.remove(t);
      }
      if tags.is_empty() {
        self.children.remove(&child);
        return true;
      }
    }
    false
  }

  pub(super) fn erase_parent(&mut self, parent: NodeId, types: &[StructureType]) -> bool {
    if let Some(tags) = self.parents.get_mut(&parent) {
      for t in types {
        tags.remove(t);
      }
      if tags.is_empty() {
        self.parents.remove(&parent);
        return true;
      }
    }
    false
  }

  pub(super) fn drop_edge_to_child(&mut self, child: NodeId) {
    self.children.remove(&child);
  }

  pub(super) fn drop_edge_to_parent(&mut self, parent: NodeId) {
    self.parents.remove(&parent);
  }
}
