//! Scheduled control actions.
//!
//! The effector is the operator's hand on the simulation: target mirror
//! counts and strategy switches are scheduled against ticks, totally
//! ordered by (tick, submission order). Two actions on the same tick take
//! effect in submission order, so a strategy switch scheduled after a
//! count change sees the new count.

use std::collections::BTreeMap;

use crate::error::{SimError, SimResult};
use crate::strategy::TopologyStrategy;
use crate::Tick;

pub enum Action {
  SetMirrors(usize),
  SetStrategy(Box<dyn TopologyStrategy>),
  SetTargetLinksPerMirror(usize),
}

impl std::fmt::Debug for Action {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Action::SetMirrors(c) => write!(f, "SetMirrors({c})"),
      Action::SetStrategy(s) => write!(f, "SetStrategy({})", s.name()),
      Action::SetTargetLinksPerMirror(n) => write!(f, "SetTargetLinksPerMirror({n})"),
    }
  }
}

#[derive(Debug, Default)]
pub struct Effector {
  queue: BTreeMap<(Tick, u64), Action>,
  seq: u64,
  sim_time: Tick,
}

impl Effector {
  pub fn new(sim_time: Tick) -> Self {
    Effector { queue: BTreeMap::new(), seq: 0, sim_time }
  }

  /// Schedule "the target mirror count is `count` from tick `at` on".
  pub fn set_mirrors(&mut self, count: usize, at: Tick) -> SimResult<()> {
    self.submit(Action::SetMirrors(count), at)
  }

  /// Schedule a switch to `strategy` at tick `at`.
  pub fn set_strategy(&mut self, strategy: Box<dyn TopologyStrategy>, at: Tick) -> SimResult<()> {
    self.submit(Action::SetStrategy(strategy), at)
  }

  /// Schedule a links-per-mirror change; strategies it is meaningless for
  /// ignore it.
  pub fn set_target_links_per_mirror(&mut self, n: usize, at: Tick) -> SimResult<()> {
    self.submit(Action::SetTargetLinksPerMirror(n), at)
  }

  fn submit(&mut self, action: Action, at: Tick) -> SimResult<()> {
    if at > self.sim_time {
      return Err(SimError::SchedulingOutOfRange { at, limit: self.sim_time });
    }
    self.queue.insert((at, self.seq), action);
    self.seq += 1;
    Ok(())
  }

  /// Take every action due at or before `now`, submission order within a
  /// tick.
  pub(crate) fn drain_due(&mut self, now: Tick) -> Vec<Action> {
    let later = self.queue.split_off(&(now + 1, 0));
    let due = std::mem::replace(&mut self.queue, later);
    due.into_values().collect()
  }

  pub fn pending(&self) -> usize {
    self.queue.len()
  }
}
