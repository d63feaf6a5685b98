//! Error taxonomy of the simulator.
//!
//! Construction-time problems surface to the caller; everything that can go
//! wrong inside a tick is recovered locally (degenerate modes, silent skips)
//! and never aborts a run.

use thiserror::Error;

use crate::arena::{LinkId, MirrorId};
use crate::Tick;

#[derive(Debug, Error)]
pub enum SimError {
  /// A strategy or engine was built with unusable parameters,
  /// e.g. n-connected with n < 2.
  #[error("invalid construction: {0}")]
  InvalidConstruction(String),

  /// An effector action targets a tick outside the run.
  #[error("action scheduled at tick {at} outside of 0..={limit}")]
  SchedulingOutOfRange { at: Tick, limit: Tick },

  /// A reconfiguration step referenced a mirror that is already gone.
  /// Engine-internal paths recover from this by skipping; it only surfaces
  /// through direct API misuse.
  #[error("no such mirror: {0}")]
  NoSuchMirror(MirrorId),

  /// Same as [`SimError::NoSuchMirror`], for links.
  #[error("no such link: {0}")]
  NoSuchLink(LinkId),

  /// The property set is inconsistent (empty range, zero sim time, ...).
  #[error("config: {0}")]
  Config(String),

  #[error("io: {0}")]
  Io(#[from] std::io::Error),

  #[error("malformed property file: {0}")]
  Parse(#[from] serde_json::Error),
}

pub type SimResult<T> = Result<T, SimError>;
