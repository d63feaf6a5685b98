//! The ring strategy.
//!
//! The closing edge (last member -> head) makes the planned cycle explicit.
//! Growth splices new members in right before the head, so only the
//! closing edge is ever rewired; shrink retires the head's predecessor and
//! re-closes the walk. Below three members the ring degrades to a line and
//! the degradation is logged, never raised.

use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{ring, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::Ring;

#[derive(Debug, Default)]
pub struct RingStrategy;

impl RingStrategy {
  pub fn new() -> Self {
    RingStrategy
  }

  /// The open tail of a not-yet-closed ring: the walk end reached from the
  /// head along outgoing edges.
  fn open_tail(net: &Network, head: NodeId) -> NodeId {
    let mut cur = head;
    let mut seen = vec![head];
    while let Some(next) = net.graph.get(cur).and_then(|n| n.children_for(T).next()) {
      if seen.contains(&next) {
        break;
      }
      seen.push(next);
      cur = next;
    }
    cur
  }

  fn is_closed(net: &Network, head: NodeId) -> bool {
    net.graph.get(head).map(|n| n.parents_for(T).next().is_some()).unwrap_or(false)
  }
}

impl TopologyStrategy for RingStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "ring"
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
    if pool.len() + 1 >= 3 {
      net.wire(tail, anchor, &[T], now, props, rng);
    } else {
      debug!(members = pool.len() + 1, "ring below minimum size, running as line");
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    for &mirror in added {
      let node = net.graph.insert_bound([T], mirror);
      if Self::is_closed(net, head) {
        // Splice in before the head: break the closing edge, then rebuild
        // it through the newcomer.
        let tail = ring::previous_in_ring(&net.graph, head, head).unwrap_or(head);
        net.unwire(tail, head, &[T]);
        net.wire(tail, node, &[T], now, props, rng);
        net.wire(node, head, &[T], now, props, rng);
      } else {
        let tail = Self::open_tail(net, head);
        net.wire(tail, node, &[T], now, props, rng);
        if net.graph.collect_members(T, head).len() >= 3 {
          net.wire(node, head, &[T], now, props, rng);
        }
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
      match members.len() {
        0 => break,
        1 => {
          let Some(mirror) = net.graph.get(head).and_then(|n| n.mirror()) else { break };
          net.retire_mirror(mirror, now, props, rng);
          retired.push(mirror);
        }
        len => {
          let victim = ring::previous_in_ring(&net.graph, head, head)
            .filter(|v| *v != head)
            .unwrap_or_else(|| Self::open_tail(net, head));
          let before = ring::previous_in_ring(&net.graph, head, victim).filter(|v| *v != victim);
          let Some(mirror) = net.graph.get(victim).and_then(|n| n.mirror()) else { break };
          net.retire_mirror(mirror, now, props, rng);
          retired.push(mirror);
          if len - 1 >= 3 {
            if let Some(before) = before {
              net.wire(before, head, &[T], now, props, rng);
            }
          } else if len - 1 == 2 {
            debug!("ring degraded to a line of 2");
          }
        }
      }
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    match members {
      0 | 1 => 0,
      2 => 1,
      m => m,
    }
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    if net.graph.get(node).is_some() {
      2
    } else {
      0
    }
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    match members.len() {
      0 | 1 => Ok(()),
      2 => {
        let edges = net.graph.structure_edges(T, &members);
        if edges.len() == 1 {
          Ok(())
        } else {
          Err(format!("degenerate ring of 2 with {} edges", edges.len()))
        }
      }
      _ => ring::is_valid_structure(&net.graph, &members, head),
    }
  }
}
