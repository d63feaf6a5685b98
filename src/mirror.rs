//! The mirror lifecycle state machine.
//!
//! A mirror is a participating node of the simulated distributed system. It
//! advances through `down -> starting -> up -> ready` after creation and
//! `stopping -> stopped` after retirement, one transition per tick at most,
//! with the dwell times sampled from the configured delay bounds. The
//! topology layer only relies on the observable contract: link ownership,
//! `is_linked_with` and the current state.

use ordermap::OrderSet;
use rand::rngs::StdRng;
use tracing::trace;

use crate::arena::{Arena, LinkId, MirrorId};
use crate::config::SimProps;
use crate::link::{Link, LinkState};
use crate::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MirrorState {
  Down,
  Starting,
  Up,
  Ready,
  Stopping,
  Stopped,
}

impl MirrorState {
  /// A mirror counts toward the realised network until it begins shutdown.
  pub fn is_alive(&self) -> bool {
    !matches!(self, MirrorState::Stopping | MirrorState::Stopped)
  }
}

impl std::fmt::Display for MirrorState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let s = match self {
      MirrorState::Down => "down",
      MirrorState::Starting => "starting",
      MirrorState::Up => "up",
      MirrorState::Ready => "ready",
      MirrorState::Stopping => "stopping",
      MirrorState::Stopped => "stopped",
    };
    f.write_str(s)
  }
}

#[derive(Debug, Clone)]
pub struct Mirror {
  id: MirrorId,
  state: MirrorState,
  /// Tick at which `starting` completes.
  up_at: Tick,
  /// Tick at which `up` becomes `ready`.
  ready_at: Tick,
  /// Tick at which `stopping` completes; meaningful only once stopping.
  stopped_at: Tick,
  links: OrderSet<LinkId>,
  /// Data-content layer observables: bytes of the mirrored file set held.
  received_data: u64,
  update_interval: Tick,
  next_update_at: Tick,
}

impl Mirror {
  pub fn new(id: MirrorId, now: Tick, props: &SimProps, rng: &mut StdRng) -> Self {
    let startup = props.sample_startup_time(rng);
    let ready = props.sample_ready_time(rng);
    let interval = props.sample_file_update_interval(rng).max(1);
    Mirror {
      id,
      state: MirrorState::Down,
      up_at: now + startup,
      ready_at: now + startup + ready,
      stopped_at: Tick::MAX,
      links: OrderSet::new(),
      received_data: 0,
      update_interval: interval,
      next_update_at: 0,
    }
  }

  pub fn id(&self) -> MirrorId {
    self.id
  }

  pub fn state(&self) -> MirrorState {
    self.state
  }

  pub fn add_link(&mut self, link: LinkId) {
    self.links.insert(link);
  }

  /// Removing an unknown link is a no-op.
  pub fn remove_link(&mut self, link: LinkId) {
    self.links.remove(&link);
  }

  pub fn links(&self) -> &OrderSet<LinkId> {
    &self.links
  }

  pub fn num_links(&self) -> usize {
    self.links.len()
  }

  pub fn is_linked_with(&self, other: MirrorId, links: &Arena<LinkId, Link>) -> bool {
    self
      .links
      .iter()
      .filter_map(|l| links.get(*l))
      .any(|l| l.state() != LinkState::Closed && l.connects(self.id, other))
  }

  pub fn received_data(&self) -> u64 {
    self.received_data
  }

  /// Begin shutdown. The caller is responsible for closing the links.
  pub fn shutdown(&mut self, now: Tick, props: &SimProps, rng: &mut StdRng) {
    if !self.state.is_alive() {
      return;
    }
    self.stopped_at = now + props.sample_stop_time(rng);
    trace!(mirror = %self.id, stopped_at = self.stopped_at, "mirror stopping");
    self.state = MirrorState::Stopping;
  }

  /// Advance the lifecycle by one tick.
  ///
  /// `has_active_link` feeds the data-content layer: a ready mirror with at
  /// least one active link refreshes its copy of the file set every
  /// `update_interval` ticks.
  pub fn advance(&mut self, now: Tick, props: &SimProps, has_active_link: bool) {
    match self.state {
      MirrorState::Down => {
        self.state = MirrorState::Starting;
      }
      MirrorState::Starting => {
        if now >= self.up_at {
          self.state = MirrorState::Up;
        }
      }
      MirrorState::Up => {
        if now >= self.ready_at {
          trace!(mirror = %self.id, tick = now, "mirror ready");
          self.state = MirrorState::Ready;
          self.next_update_at = now + self.update_interval;
        }
      }
      MirrorState::Ready => {
        if has_active_link && now >= self.next_update_at {
          self.received_data = props.file_data_size;
          self.next_update_at = now + self.update_interval;
        }
      }
      MirrorState::Stopping => {
        if now >= self.stopped_at {
          self.state = MirrorState::Stopped;
        }
      }
      MirrorState::Stopped => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use rand::SeedableRng;

  fn fixed_props() -> SimProps {
    SimProps {
      startup_time_min: 2,
      startup_time_max: 2,
      ready_time_min: 1,
      ready_time_max: 1,
      stop_time_min: 1,
      stop_time_max: 1,
      file_update_interval_min: 5,
      file_update_interval_max: 5,
      ..Default::default()
    }
  }

  #[test]
  fn walks_the_startup_chain() {
    let props = fixed_props();
    let mut rng = StdRng::seed_from_u64(0);
    let mut m = Mirror::new(MirrorId(1), 0, &props, &mut rng);
    assert_eq!(m.state(), MirrorState::Down);
    m.advance(1, &props, false);
    assert_eq!(m.state(), MirrorState::Starting);
    m.advance(2, &props, false);
    assert_eq!(m.state(), MirrorState::Up);
    m.advance(3, &props, false);
    assert_eq!(m.state(), MirrorState::Ready);
  }

  #[test]
  fn shutdown_reaches_stopped() {
    let props = fixed_props();
    let mut rng = StdRng::seed_from_u64(0);
    let mut m = Mirror::new(MirrorId(1), 0, &props, &mut rng);
    for t in 1..4 {
      m.advance(t, &props, false);
    }
    m.shutdown(4, &props, &mut rng);
    assert_eq!(m.state(), MirrorState::Stopping);
    assert!(!m.state().is_alive());
    m.advance(5, &props, false);
    assert_eq!(m.state(), MirrorState::Stopped);
  }

  #[test]
  fn data_refresh_requires_active_link() {
    let props = fixed_props();
    let mut rng = StdRng::seed_from_u64(0);
    let mut m = Mirror::new(MirrorId(1), 0, &props, &mut rng);
    for t in 1..4 {
      m.advance(t, &props, false);
    }
    assert_eq!(m.state(), MirrorState::Ready);
    for t in 4..30 {
      m.advance(t, &props, false);
    }
    assert_eq!(m.received_data(), 0);
    for t in 30..40 {
      m.advance(t, &props, true);
    }
    assert_eq!(m.received_data(), props.file_data_size);
  }
}
