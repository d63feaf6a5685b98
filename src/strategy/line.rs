//! The line strategy: a chain that only ever grows and shrinks at its far
//! endpoint, keeping the head endpoint stable.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{line, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::Line;

#[derive(Debug, Default)]
pub struct LineStrategy;

impl LineStrategy {
  pub fn new() -> Self {
    LineStrategy
  }
}

impl TopologyStrategy for LineStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "line"
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
    let mut tail = anchor;
    for &mirror in pool {
      let node = net.graph.insert_bound([T], mirror);
      net.wire(tail, node, &[T], now, props, rng);
      tail = node;
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    let tail = line::other_endpoint(&net.graph, head).unwrap_or(head);
    self.init_network_sub(net, tail, added, props, rng, now);
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    for _ in 0..count {
      // The far endpoint retires first; the head goes last, once alone.
      let victim = line::other_endpoint(&net.graph, head).unwrap_or(head);
      let Some(mirror) = net.graph.get(victim).and_then(|n| n.mirror()) else { break };
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
    if members.len() < 2 {
      debug!(members = members.len(), "line below regular size");
      return Ok(());
    }
    line::is_valid_structure(&net.graph, &members, head)
  }
}
