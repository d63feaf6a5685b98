//! The realised network: planning graph, mirror pool and link set under
//! one owner.
//!
//! All physical mutation goes through this type so the planning layer and
//! the lifecycle layer cannot drift apart: wiring an edge creates the
//! backing link, removing a node closes the links its mirror owned.
//! Everything here is single-threaded by contract; the engine owns the
//! network exclusively during a tick.

use rand::rngs::StdRng;
use tracing::{debug, trace};

use crate::arena::{Arena, LinkId, MirrorId, NodeId};
use crate::config::SimProps;
use crate::link::{Link, LinkState};
use crate::mirror::{Mirror, MirrorState};
use crate::structure::{StructureGraph, StructureType};

#[derive(Debug, Default)]
pub struct Network {
  pub graph: StructureGraph,
  mirrors: Arena<MirrorId, Mirror>,
  links: Arena<LinkId, Link>,
}

impl Network {
  pub fn new() -> Self {
    Network { graph: StructureGraph::new(), mirrors: Arena::new(), links: Arena::new() }
  }

  // Mirror pool -----------------------------------------------------------

  pub fn create_mirror(&mut self, now: crate::Tick, props: &SimProps, rng: &mut StdRng) -> MirrorId {
    let id = self.mirrors.insert_with(|id| Mirror::new(id, now, props, rng));
    trace!(mirror = %id, tick = now, "mirror created");
    id
  }

  pub fn mirror(&self, id: MirrorId) -> Option<&Mirror> {
    self.mirrors.get(id)
  }

  /// Lookup for callers that treat a missing mirror as an error instead of
  /// a silent skip.
  pub fn try_mirror(&self, id: MirrorId) -> crate::SimResult<&Mirror> {
    self.mirrors.get(id).ok_or(crate::SimError::NoSuchMirror(id))
  }

  pub fn mirrors(&self) -> crate::arena::Iter<'_, MirrorId, Mirror> {
    self.mirrors.iter()
  }

  /// Mirrors that count toward the realised network, pool order.
  pub fn alive_mirrors(&self) -> Vec<MirrorId> {
    self
      .mirrors
      .iter()
      .filter(|(_, m)| m.state().is_alive())
      .map(|(id, _)| id)
      .collect()
  }

  pub fn num_alive_mirrors(&self) -> usize {
    self.mirrors.iter().filter(|(_, m)| m.state().is_alive()).count()
  }

  pub fn num_ready_mirrors(&self) -> usize {
    self.mirrors.iter().filter(|(_, m)| m.state() == MirrorState::Ready).count()
  }

  /// Alive mirrors that no planning node is bound to.
  pub fn unplaced_mirrors(&self) -> Vec<MirrorId> {
    self
      .mirrors
      .iter()
      .filter(|(id, m)| m.state().is_alive() && self.graph.node_for_mirror(*id).is_none())
      .map(|(id, _)| id)
      .collect()
  }

  pub fn total_received_data(&self) -> u64 {
    self.mirrors.iter().map(|(_, m)| m.received_data()).sum()
  }

  // Links -----------------------------------------------------------------

  pub fn link(&self, id: LinkId) -> Option<&Link> {
    self.links.get(id)
  }

  pub fn try_link(&self, id: LinkId) -> crate::SimResult<&Link> {
    self.links.get(id).ok_or(crate::SimError::NoSuchLink(id))
  }

  pub fn links(&self) -> crate::arena::Iter<'_, LinkId, Link> {
    self.links.iter()
  }

  pub fn num_links(&self) -> usize {
    self.links.len()
  }

  pub fn num_active_links(&self) -> usize {
    self.links.iter().filter(|(_, l)| l.state() == LinkState::Active).count()
  }

  pub fn has_active_link(&self, mirror: MirrorId) -> bool {
    self
      .mirrors
      .get(mirror)
      .map(|m| {
        m.links()
          .iter()
          .filter_map(|l| self.links.get(*l))
          .any(|l| l.state() == LinkState::Active)
      })
      .unwrap_or(false)
  }

  /// Implemented link count of a planning node: the links its mirror owns.
  pub fn implemented_links(&self, node: NodeId) -> usize {
    self
      .graph
      .get(node)
      .and_then(|n| n.mirror())
      .and_then(|m| self.mirrors.get(m))
      .map(|m| m.num_links())
      .unwrap_or(0)
  }

  /// Planned minus implemented, floored at zero.
  pub fn pending_links(&self, node: NodeId) -> usize {
    let planned = self.graph.get(node).map(|n| n.planned_links()).unwrap_or(0);
    planned.saturating_sub(self.implemented_links(node))
  }

  // Wiring ----------------------------------------------------------------

  /// Plan an edge and implement it in one step: `child` goes under
  /// `parent` for `types`, and the bound mirrors receive a fresh link
  /// unless one already connects them.
  pub fn wire(
    &mut self, parent: NodeId, child: NodeId, types: &[StructureType], now: crate::Tick,
    props: &SimProps, rng: &mut StdRng,
  ) -> Option<LinkId> {
    self.graph.add_child(parent, child, types);
    let a = self.graph.get(parent)?.mirror()?;
    let b = self.graph.get(child)?.mirror()?;
    self.link_mirrors(a, b, now, props, rng)
  }

  fn link_mirrors(
    &mut self, a: MirrorId, b: MirrorId, now: crate::Tick, props: &SimProps,
    rng: &mut StdRng,
  ) -> Option<LinkId> {
    if a == b || !self.mirrors.contains(a) || !self.mirrors.contains(b) {
      return None;
    }
    if self.mirrors[a].is_linked_with(b, &self.links) {
      return None;
    }
    let id = self.links.insert_with(|id| Link::new(id, a, b, now, props, rng));
    self.mirrors[a].add_link(id);
    self.mirrors[b].add_link(id);
    trace!(link = %id, source = %a, target = %b, tick = now, "link created");
    Some(id)
  }

  /// Drop the edge tags between the pair; when no tagged edge remains in
  /// either direction the physical link between their mirrors is closed.
  pub fn unwire(&mut self, parent: NodeId, child: NodeId, types: &[StructureType]) {
    self.graph.remove_child(parent, child, types);
    let still_connected = self
      .graph
      .get(parent)
      .map(|n| {
        n.children().any(|(c, _)| c == child) || n.parents().any(|(p, _)| p == child)
      })
      .unwrap_or(false);
    if still_connected {
      return;
    }
    let a = self.graph.get(parent).and_then(|n| n.mirror());
    let b = self.graph.get(child).and_then(|n| n.mirror());
    if let (Some(a), Some(b)) = (a, b) {
      if let Some(id) = self.link_between(a, b) {
        self.close_link(id);
      }
    }
  }

  pub fn link_between(&self, a: MirrorId, b: MirrorId) -> Option<LinkId> {
    self
      .mirrors
      .get(a)?
      .links()
      .iter()
      .copied()
      .find(|l| self.links.get(*l).map(|l| l.connects(a, b)).unwrap_or(false))
  }

  /// Close and drop a link. Closing an unknown link is a no-op.
  pub fn close_link(&mut self, id: LinkId) {
    let Some(mut link) = self.links.remove(id) else { return };
    link.close();
    if let Some(m) = self.mirrors.get_mut(link.source()) {
      m.remove_link(id);
    }
    if let Some(m) = self.mirrors.get_mut(link.target()) {
      m.remove_link(id);
    }
    trace!(link = %id, "link closed");
  }

  pub fn close_links_of(&mut self, mirror: MirrorId) {
    let owned: Vec<LinkId> =
      self.mirrors.get(mirror).map(|m| m.links().iter().copied().collect()).unwrap_or_default();
    for l in owned {
      self.close_link(l);
    }
  }

  pub fn close_all_links(&mut self) {
    let all: Vec<LinkId> = self.links.keys().collect();
    for l in all {
      self.close_link(l);
    }
  }

  /// Tear the whole planned topology down: every link closed, every
  /// planning node dropped. The mirror pool survives.
  pub fn teardown_topology(&mut self) {
    debug!(links = self.links.len(), nodes = self.graph.len(), "topology teardown");
    self.close_all_links();
    self.graph.clear();
  }

  /// Retire a mirror: close its links, cascade its planning node away and
  /// begin its shutdown. Retiring an unknown mirror is a no-op.
  pub fn retire_mirror(
    &mut self, mirror: MirrorId, now: crate::Tick, props: &SimProps, rng: &mut StdRng,
  ) {
    if !self.mirrors.contains(mirror) {
      return;
    }
    if let Some(node) = self.graph.node_for_mirror(mirror) {
      self.graph.remove_node(node);
    }
    self.close_links_of(mirror);
    self.mirrors[mirror].shutdown(now, props, rng);
    debug!(mirror = %mirror, tick = now, "mirror retired");
  }

  // Tick advancement ------------------------------------------------------

  /// Advance every link and mirror by one tick and sweep out entities that
  /// finished their lifecycle.
  pub fn advance(&mut self, now: crate::Tick, props: &SimProps) {
    for (_, link) in self.links.iter_mut() {
      link.advance(now);
    }
    let active: Vec<MirrorId> = self
      .mirrors
      .iter()
      .filter(|(id, _)| self.has_active_link(*id))
      .map(|(id, _)| id)
      .collect();
    for (id, mirror) in self.mirrors.iter_mut() {
      mirror.advance(now, props, active.contains(&id));
    }
    self.mirrors.retain(|_, m| m.state() != MirrorState::Stopped);
  }
}
