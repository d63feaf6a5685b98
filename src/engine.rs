//! The reconfiguration engine.
//!
//! Once per tick the engine reconciles the realised network with the
//! scheduled targets, in a fixed order: consume due effector actions,
//! apply a pending strategy switch (full teardown and rebuild), grow,
//! shrink, then advance every mirror and link by one tick. No step
//! observes partial results of a later one, and nothing in here aborts a
//! run; conditions a strategy cannot satisfy degrade and get logged.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::arena::{MirrorId, NodeId};
use crate::config::SimProps;
use crate::effector::{Action, Effector};
use crate::error::SimResult;
use crate::network::Network;
use crate::probes::{LinkProbe, MirrorProbe};
use crate::strategy::TopologyStrategy;
use crate::structure::StructureCheck;
use crate::Tick;

pub struct Engine {
  run_id: Uuid,
  props: SimProps,
  rng: StdRng,
  net: Network,
  strategy: Box<dyn TopologyStrategy>,
  pending_strategy: Option<Box<dyn TopologyStrategy>>,
  effector: Effector,
  target_mirrors: usize,
  head: Option<NodeId>,
  now: Tick,
}

impl Engine {
  /// Build an engine and realise the initial network at tick zero.
  pub fn new(props: SimProps, mut strategy: Box<dyn TopologyStrategy>) -> SimResult<Engine> {
    props.validate()?;
    let run_id = Uuid::new_v4();
    let mut rng = StdRng::seed_from_u64(props.seed);
    let mut net = Network::new();
    let target_mirrors = props.num_mirrors;

    let pool: Vec<MirrorId> =
      (0..target_mirrors).map(|_| net.create_mirror(0, &props, &mut rng)).collect();
    let head = strategy.init_network(&mut net, &pool, &props, &mut rng, 0);
    info!(
      %run_id,
      strategy = strategy.name(),
      mirrors = target_mirrors,
      links = net.num_links(),
      "network initialised"
    );

    let effector = Effector::new(props.sim_time);
    Ok(Engine {
      run_id,
      props,
      rng,
      net,
      strategy,
      pending_strategy: None,
      effector,
      target_mirrors,
      head,
      now: 0,
    })
  }

  pub fn run_id(&self) -> Uuid {
    self.run_id
  }

  pub fn now(&self) -> Tick {
    self.now
  }

  pub fn sim_time(&self) -> Tick {
    self.props.sim_time
  }

  pub fn props(&self) -> &SimProps {
    &self.props
  }

  pub fn network(&self) -> &Network {
    &self.net
  }

  pub fn strategy(&self) -> &dyn TopologyStrategy {
    self.strategy.as_ref()
  }

  pub fn head(&self) -> Option<NodeId> {
    self.head
  }

  pub fn target_mirrors(&self) -> usize {
    self.target_mirrors
  }

  // Effector surface ------------------------------------------------------

  pub fn set_mirrors(&mut self, count: usize, at: Tick) -> SimResult<()> {
    self.effector.set_mirrors(count, at)
  }

  pub fn set_strategy(
    &mut self, strategy: Box<dyn TopologyStrategy>, at: Tick,
  ) -> SimResult<()> {
    self.effector.set_strategy(strategy, at)
  }

  pub fn set_target_links_per_mirror(&mut self, n: usize, at: Tick) -> SimResult<()> {
    self.effector.set_target_links_per_mirror(n, at)
  }

  // Probes ----------------------------------------------------------------

  /// Snapshot views are only consistent at tick boundaries; take them
  /// between `run_step` calls.
  pub fn mirror_probe(&self) -> MirrorProbe<'_> {
    MirrorProbe::new(&self.net, self.strategy.as_ref(), self.target_mirrors)
  }

  pub fn link_probe(&self) -> LinkProbe<'_> {
    LinkProbe::new(&self.net, self.strategy.as_ref(), self.target_mirrors)
  }

  /// Check the realised structure against the active strategy's invariant.
  pub fn validate(&self) -> StructureCheck {
    match self.head {
      Some(head) => self.strategy.validate(&self.net, head),
      None => Ok(()),
    }
  }

  // Stepping --------------------------------------------------------------

  /// Advance the simulation by one tick and return the new time.
  pub fn run_step(&mut self) -> Tick {
    self.now += 1;
    let now = self.now;

    for action in self.effector.drain_due(now) {
      match action {
        Action::SetMirrors(count) => {
          info!(tick = now, target = count, "target mirror count set");
          self.target_mirrors = count;
        }
        Action::SetStrategy(s) => {
          self.pending_strategy = Some(s);
        }
        Action::SetTargetLinksPerMirror(n) => {
          if !self.strategy.set_target_links_per_node(n) {
            debug!(tick = now, n, strategy = self.strategy.name(), "links-per-mirror setting ignored");
          }
        }
      }
    }

    if let Some(next) = self.pending_strategy.take() {
      info!(tick = now, from = self.strategy.name(), to = next.name(), "strategy switch");
      self.strategy = next;
      self.head = self.strategy.restart_network(&mut self.net, &self.props, &mut self.rng, now);
    }

    let current = self.net.num_alive_mirrors();
    if self.target_mirrors > current {
      self.grow(self.target_mirrors - current, now);
    } else if current > self.target_mirrors {
      self.shrink(current - self.target_mirrors, now);
    }
    self.refresh_head();

    self.net.advance(now, &self.props);
    now
  }

  /// Run every remaining tick of the configured simulation time.
  pub fn run_to_end(&mut self) {
    while self.now < self.props.sim_time {
      self.run_step();
    }
  }

  fn grow(&mut self, delta: usize, now: Tick) {
    let added: Vec<MirrorId> =
      (0..delta).map(|_| self.net.create_mirror(now, &self.props, &mut self.rng)).collect();
    debug!(tick = now, added = delta, "growing");
    match self.head.filter(|h| self.net.graph.contains(*h)) {
      Some(head) => {
        self.strategy.handle_add_new_mirrors(
          &mut self.net,
          head,
          &added,
          &self.props,
          &mut self.rng,
          now,
        );
      }
      None => {
        let pool = self.net.alive_mirrors();
        self.head =
          self.strategy.init_network(&mut self.net, &pool, &self.props, &mut self.rng, now);
      }
    }
  }

  fn shrink(&mut self, delta: usize, now: Tick) {
    debug!(tick = now, removed = delta, "shrinking");
    // Mirrors outside any structure go first; they cost no rewiring.
    let unplaced =
      crate::strategy::retire_unplaced(&mut self.net, delta, now, &self.props, &mut self.rng);
    let mut left = delta - unplaced.len();
    if left == 0 {
      return;
    }
    match self.head.filter(|h| self.net.graph.contains(*h)) {
      Some(head) => {
        let retired = self.strategy.handle_remove_mirrors(
          &mut self.net,
          head,
          left,
          &self.props,
          &mut self.rng,
          now,
        );
        left = left.saturating_sub(retired.len());
      }
      None => {}
    }
    // A strategy that could not satisfy the full quota leaves the rest to
    // plain latest-first retirement rather than stalling the target.
    if left > 0 {
      let victims: Vec<MirrorId> =
        self.net.alive_mirrors().into_iter().rev().take(left).collect();
      for m in victims {
        self.net.retire_mirror(m, now, &self.props, &mut self.rng);
      }
    }
  }

  fn refresh_head(&mut self) {
    if self.head.map(|h| self.net.graph.contains(h)).unwrap_or(false) {
      return;
    }
    let t = self.strategy.structure_type();
    self.head =
      self.net.graph.nodes_with_type(t).into_iter().find(|&n| self.net.graph.is_head(n, t));
  }
}
