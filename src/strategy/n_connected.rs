//! The n-connected strategy: every member keeps `min(n, m-1)` peers.
//!
//! Initial construction lays the members on a circle and connects the k-th
//! neighbours for k up to n/2, plus the half-turn diagonals when n is odd;
//! that meets the expected edge total exactly. Growth uses edge rotation:
//! an existing edge is split and both ends rewired through the newcomer,
//! so existing degrees survive untouched. A top-up pass links the lowest-
//! degree non-adjacent pairs until the predicted count is met, which also
//! repairs the neighbourhood a retired member leaves behind.

use ordermap::OrderSet;
use rand::rngs::StdRng;
use tracing::debug;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::error::{SimError, SimResult};
use crate::network::Network;
use crate::strategy::{spawn_head, TopologyStrategy};
use crate::structure::{n_connected, StructureCheck, StructureType};
use crate::Tick;

const T: StructureType = StructureType::NConnected;

#[derive(Debug)]
pub struct NConnectedStrategy {
  n: usize,
}

impl NConnectedStrategy {
  /// `n` below 2 is rejected; a 1-connected structure is a tree and has
  /// its own strategy.
  pub fn new(n: usize) -> SimResult<Self> {
    if n < 2 {
      return Err(SimError::InvalidConstruction(format!(
        "n-connected requires n >= 2, got {n}"
      )));
    }
    Ok(NConnectedStrategy { n })
  }

  pub fn n(&self) -> usize {
    self.n
  }

  pub fn connectivity_density(&self, net: &Network, head: NodeId) -> f64 {
    let members = net.graph.collect_members(T, head);
    n_connected::connectivity_density(&net.graph, &members)
  }

  /// Link lowest-degree non-adjacent pairs until the structure carries its
  /// predicted edge count. Converges in one pass after a single add or
  /// remove; logs and stops when no linkable pair remains.
  fn top_up(
    &self, net: &mut Network, head: NodeId, props: &SimProps, rng: &mut StdRng, now: Tick,
  ) {
    loop {
      let members = net.graph.collect_members(T, head);
      if members.len() < 2 {
        return;
      }
      let target = n_connected::target_degree(self.n, members.len());
      let predicted = n_connected::predicted_link_count(self.n, members.len());
      if net.graph.structure_edges(T, &members).len() >= predicted {
        return;
      }
      let mut candidates: Vec<(usize, usize, NodeId)> = members
        .iter()
        .enumerate()
        .filter_map(|(i, &m)| {
          let deg = net.graph.get(m)?.degree_for(T);
          (deg < target).then_some((deg, i, m))
        })
        .collect();
      candidates.sort();
      let pair = candidates.iter().enumerate().find_map(|(i, &(_, _, a))| {
        candidates[i + 1..]
          .iter()
          .find(|&&(_, _, b)| !net.graph.has_edge(a, b, T))
          .map(|&(_, _, b)| (a, b))
      });
      match pair {
        Some((a, b)) => {
          net.wire(a, b, &[T], now, props, rng);
        }
        None => {
          // Every deficient pair is already adjacent; rotate an unrelated
          // edge through the two neediest members instead.
          let (a, b) = match (candidates.first(), candidates.get(1)) {
            (Some(&(_, _, a)), Some(&(_, _, b))) => (a, b),
            (Some(&(_, _, a)), None) => (a, a),
            _ => return,
          };
          if !Self::rotate_through(net, &members, a, b, props, rng, now) {
            debug!(n = self.n, "no linkable pair left below target degree");
            return;
          }
        }
      }
    }
  }

  /// Split an edge (u, v) away from `a` and `b` and rewire its ends onto
  /// them: u and v keep their degrees, a and b each gain one. With a == b
  /// the single member gains two.
  fn rotate_through(
    net: &mut Network, members: &[NodeId], a: NodeId, b: NodeId, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> bool {
    let edges = net.graph.structure_edges(T, members);
    for (u, v) in edges {
      if u == a || u == b || v == a || v == b {
        continue;
      }
      if !net.graph.has_edge(a, u, T) && !net.graph.has_edge(b, v, T) {
        net.unwire(u, v, &[T]);
        net.wire(a, u, &[T], now, props, rng);
        net.wire(b, v, &[T], now, props, rng);
        return true;
      }
      if !net.graph.has_edge(a, v, T) && !net.graph.has_edge(b, u, T) {
        net.unwire(u, v, &[T]);
        net.wire(a, v, &[T], now, props, rng);
        net.wire(b, u, &[T], now, props, rng);
        return true;
      }
    }
    false
  }
}

impl TopologyStrategy for NConnectedStrategy {
  fn structure_type(&self) -> StructureType {
    T
  }

  fn name(&self) -> &'static str {
    "n_connected"
  }

  fn minimum_members(&self) -> usize {
    self.n + 1
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
    let mut members = vec![anchor];
    for &mirror in pool {
      members.push(net.graph.insert_bound([T], mirror));
    }
    let m = members.len();
    if m < 2 {
      return;
    }
    let target = n_connected::target_degree(self.n, m);
    if m <= self.n {
      debug!(n = self.n, members = m, "n-connected below n+1 members, running fully connected");
    }
    if target >= m - 1 {
      for i in 0..m {
        for j in i + 1..m {
          net.wire(members[i], members[j], &[T], now, props, rng);
        }
      }
      return;
    }
    for k in 1..=self.n / 2 {
      for i in 0..m {
        net.wire(members[i], members[(i + k) % m], &[T], now, props, rng);
      }
    }
    if self.n % 2 == 1 {
      let half = m / 2;
      for i in 0..m / 2 {
        net.wire(members[i], members[i + half], &[T], now, props, rng);
      }
    }
  }

  fn handle_add_new_mirrors(
    &mut self, net: &mut Network, head: NodeId, added: &[MirrorId], props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) {
    for &mirror in added {
      let members = net.graph.collect_members(T, head);
      let node = net.graph.insert_bound([T], mirror);
      if members.is_empty() {
        continue;
      }
      let new_target = n_connected::target_degree(self.n, members.len() + 1);
      if new_target >= members.len() {
        for &peer in &members {
          net.wire(peer, node, &[T], now, props, rng);
        }
        continue;
      }
      let edges = net.graph.structure_edges(T, &members);
      let mut used: OrderSet<NodeId> = OrderSet::new();
      let mut rotated = 0;
      for (a, b) in edges {
        if rotated == self.n / 2 {
          break;
        }
        if used.contains(&a) || used.contains(&b) {
          continue;
        }
        net.unwire(a, b, &[T]);
        net.wire(a, node, &[T], now, props, rng);
        net.wire(node, b, &[T], now, props, rng);
        used.insert(a);
        used.insert(b);
        rotated += 1;
      }
    }
    self.top_up(net, head, props, rng, now);
  }

  fn handle_remove_mirrors(
    &mut self, net: &mut Network, head: NodeId, count: usize, props: &SimProps,
    rng: &mut StdRng, now: Tick,
  ) -> Vec<MirrorId> {
    let mut retired = Vec::new();
    for _ in 0..count {
      let members = net.graph.collect_members(T, head);
      if members.len() <= self.n {
        debug!(n = self.n, members = members.len(), "shrinking below n+1 members");
      }
      let Some(&victim) = members.iter().rev().find(|&&m| m != head).or(members.first())
      else {
        break;
      };
      let Some(mirror) = net.graph.get(victim).and_then(|n| n.mirror()) else { break };
      net.retire_mirror(mirror, now, props, rng);
      retired.push(mirror);
      if net.graph.contains(head) {
        self.top_up(net, head, props, rng, now);
      }
    }
    retired
  }

  fn predicted_link_count(&self, members: usize) -> usize {
    n_connected::predicted_link_count(self.n, members)
  }

  fn target_links_per_node(&self, net: &Network, node: NodeId) -> usize {
    let members = net.graph.collect_members(T, node);
    n_connected::target_degree(self.n, members.len())
  }

  fn set_target_links_per_node(&mut self, n: usize) -> bool {
    if n < 2 {
      return false;
    }
    self.n = n;
    true
  }

  fn validate(&self, net: &Network, head: NodeId) -> StructureCheck {
    let members = net.graph.collect_members(T, head);
    if members.len() < 2 {
      debug!(members = members.len(), "n-connected below regular size");
      return Ok(());
    }
    n_connected::is_valid_structure(&net.graph, &members, head, self.n)
  }
}
