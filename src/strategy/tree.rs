//! The plain tree strategy: members attach breadth-first, two children per
//! member, the unparameterised default of the tree family.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{tree, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::Tree;

const DEFAULT_CHILDREN: usize = 2;

#[derive(Debug, Default)]
pub struct TreeStrategy;

impl TreeStrategy {
  pub fn new() -> Self {
    TreeStrategy
  }

  /// The shallowest member with a free child slot, fewer children first
  /// among equals. Any member keeps the invariant valid after the next
  /// addition too, so the look-ahead never vetoes the choice.
  fn insertion_candidate(net: &Network, members: &[NodeId], head: NodeId) -> Option<NodeId> {
    members
      .iter()
      .enumerate()
      .filter(|(_, m)| {
        net.graph.get(**m).map_or(false, |n| n.child_count_for(T) < DEFAULT_CHILDREN)
      })
      .map(|(i, m)| {
        let depth = tree::depth_of(&net.graph, T, *m, head).unwrap_or(usize::MAX);
        let children = net.graph.get(*m).map(|n| n.child_count_for(T)).unwrap_or(usize::MAX);
        (depth, children, i, *m)
      })
      .min()
      .map(|(_, _, _, m)| m)
  }
}

impl TopologyStrategy for TreeStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "tree"
  }

  fn init_network(
    &mut self, net: &mut Network, pool: &[MirrorId], props: &SimProps, rng: &mut StdRng,
    now: Tick,
  ) -> Option<NodeId> {
    let (&first, rest) = pool.split_first()?;
    let head = spawn_head(net, first, T);
    self.init_network_sub(net, head, rest, props, rng, now);
    Some(head)
  }

  fn init_network_sub(
    &mut self, net: &mut Network, anchor: NodeId, pool: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    self.handle_add_new_mirrors(net, anchor, pool, props, rng, now);
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    let mut members = net.graph.collect_members(T, head);
    if members.is_empty() {
      members.push(head);
    }
    for &mirror in added {
      let Some(parent) = Self::insertion_candidate(net, &members, head) else { break };
      let node = net.graph.insert_bound([T], mirror);
      net.wire(parent, node, &[T], now, props, rng);
      members.push(node);
    }
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    for _ in 0..count {
      let members = net.graph.collect_members(T, head);
      let order = tree::removal_order(&net.graph, T, &members, head);
      let victim = order
        .first()
        .and_then(|n| net.graph.get(*n).and_then(|node| node.mirror()))
        .or_else(|| net.graph.get(head).and_then(|n| n.mirror()));
      let Some(mirror) = victim else { break };
      net.retire_mirror(mirror, now, props, rng);
      retired.push(mirror);
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    members.saturating_sub(1)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    net.graph.get(node).map(|n| n.degree_for(T)).unwrap_or(0)
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() <= 1 {
      debug!(members = members.len(), "tree below regular size");
      return Ok(());
    }
    tree::is_valid_structure(&net.graph, T, &members, head)
  }
}
