//! The balanced tree strategy: a capped tree that fills level by level.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::builder;
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{balanced_tree, tree, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::BalancedTree;

#[derive(Debug)]
pub struct BalancedTreeStrategy {
  target_links: usize,
  tolerance: f64,
}

impl BalancedTreeStrategy {
  pub fn new(target_links: usize) -> Self {
    BalancedTreeStrategy { target_links: target_links.max(1), tolerance: 3.0 }
  }

  pub fn with_tolerance(mut self, tolerance: f64) -> Self {
    self.tolerance = tolerance;
    self
  }

  pub fn target_links(&self) -> usize {
    self.target_links
  }

  pub fn is_balanced(&self, net: &Network, head: NodeId) -> bool {
    let members = net.graph.collect_members(T, head);
    balanced_tree::is_balanced(&net.graph, &members, head, self.tolerance)
  }
}

impl TopologyStrategy for BalancedTreeStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "balanced_tree"
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
    let edges = builder::grow_balanced_tree(&mut net.graph, anchor, pool, self.target_links);
    for (parent, child) in edges {
      net.wire(parent, child, &[T], now, props, rng);
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    self.init_network_sub(net, head, added, props, rng, now);
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

  fn set_target_links_per_node(&mut self, n: usize) -> bool {
    self.target_links = n.max(1);
    true
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() <= 1 {
      debug!(members = members.len(), "balanced tree below regular size");
      return Ok(());
    }
    balanced_tree::is_valid_structure(&net.graph, &members, head, self.target_links)
  }
}
