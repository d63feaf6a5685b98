//! The link lifecycle state machine.
//!
//! A link is an unordered pair of mirrors. It spends a sampled construction
//! delay in `pending` before turning `active`; the topology layer counts a
//! link as implemented from the moment the object exists, independent of
//! activation.

use rand::rngs::StdRng;

use crate::arena::{LinkId, MirrorId};
use crate::config::SimProps;
use crate::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
  Pending,
  Active,
  Closed,
}

#[derive(Debug, Clone)]
pub struct Link {
  id: LinkId,
  source: MirrorId,
  target: MirrorId,
  state: LinkState,
  created_at: Tick,
  active_at: Tick,
}

impl Link {
  pub fn new(
    id: LinkId, source: MirrorId, target: MirrorId, now: Tick, props: &SimProps,
    rng: &mut StdRng,
  ) -> Self {
    Link {
      id,
      source,
      target,
      state: LinkState::Pending,
      created_at: now,
      active_at: now + props.sample_link_activation_time(rng),
    }
  }

  pub fn id(&self) -> LinkId {
    self.id
  }

  pub fn source(&self) -> MirrorId {
    self.source
  }

  pub fn target(&self) -> MirrorId {
    self.target
  }

  pub fn state(&self) -> LinkState {
    self.state
  }

  pub fn created_at(&self) -> Tick {
    self.created_at
  }

  pub fn connects(&self, a: MirrorId, b: MirrorId) -> bool {
    (self.source == a && self.target == b) || (self.source == b && self.target == a)
  }

  pub fn touches(&self, m: MirrorId) -> bool {
    self.source == m || self.target == m
  }

  pub fn peer_of(&self, m: MirrorId) -> Option<MirrorId> {
    if self.source == m {
      Some(self.target)
    } else if self.target == m {
      Some(self.source)
    } else {
      None
    }
  }

  pub fn close(&mut self) {
    self.state = LinkState::Closed;
  }

  pub fn advance(&mut self, now: Tick) {
    if self.state == LinkState::Pending && now >= self.active_at {
      self.state = LinkState::Active;
    }
  }
}
