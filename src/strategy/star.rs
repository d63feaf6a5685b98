//! The star strategy: one center, spokes to everyone else.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{star, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::Star;

#[derive(Debug, Default)]
pub struct StarStrategy;

impl StarStrategy {
  pub fn new() -> Self {
    StarStrategy
  }
}

impl TopologyStrategy for StarStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "star"
  }

  fn init_network(
    &mut self, net: &mut Network, pool: &[MirrorId], props: &SimProps, rng: &mut StdRng,
    now: Tick,
  ) -> Option<NodeId> {
    let (&first, rest) = pool.split_first()?;
    let center = spawn_head(net, first, T);
    self.init_network_sub(net, center, rest, props, rng, now);
    Some(center)
  }

  fn init_network_sub(
    &mut self, net: &mut Network, anchor: NodeId, pool: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    if pool.len() + 1 < 3 {
      debug!(members = pool.len() + 1, "star below minimum size");
    }
    for &mirror in pool {
      let node = net.graph.insert_bound([T], mirror);
      net.wire(anchor, node, &[T], now, props, rng);
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
      // Latest-attached leaf first; the center only ever goes last.
      let victim = star::leaves(&net.graph, head)
        .last()
        .copied()
        .or(if net.graph.contains(head) { Some(head) } else { None });
      let Some(mirror) = victim.and_then(|n| net.graph.get(n).and_then(|n| n.mirror())) else {
        break;
      };
      net.retire_mirror(mirror, now, props, rng);
      retired.push(mirror);
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    members.saturating_sub(1)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    let Some(n) = net.graph.get(node) else { return 0 };
    if n.is_head(T) {
      net.graph.collect_members(T, node).len().saturating_sub(1)
    } else {
      1
    }
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() < 3 {
      debug!(members = members.len(), "star below regular size");
      return Ok(());
    }
    star::is_valid_structure(&net.graph, &members, head)
  }
}
