//! The fully connected strategy: the complete graph over the pool.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{lifo_members, spawn_head, TopologyStrategy};
use crate::structure::{fully_connected, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::FullyConnected;

#[derive(Debug, Default)]
pub struct FullyConnectedStrategy;

impl FullyConnectedStrategy {
  pub fn new() -> Self {
    FullyConnectedStrategy
  }
}

impl TopologyStrategy for FullyConnectedStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "fully_connected"
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
    for &mirror in added {
      let members = net.graph.collect_members(T, head);
      let node = net.graph.insert_bound([T], mirror);
      // Canonical orientation: every existing member parents the newcomer.
      for parent in members {
        net.wire(parent, node, &[T], now, props, rng);
      }
    }
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    for _ in 0..count {
      let members = net.graph.collect_members(T, head);
      let victim = lifo_members(net, &members, head)
        .first()
        .copied()
        .or_else(|| net.graph.get(head).and_then(|n| n.mirror()));
      let Some(mirror) = victim else { break };
      net.retire_mirror(mirror, now, props, rng);
      retired.push(mirror);
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    fully_connected::predicted_link_count(members)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    let members = net.graph.collect_members(T, node);
    members.len().saturating_sub(1)
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() < 2 {
      debug!(members = members.len(), "fully connected below regular size");
      return Ok(());
    }
    fully_connected::is_valid_structure(&net.graph, &members, head)
  }
}
