//! rdmsim simulates a reconfigurable distributed mirror network as a
//! discrete-time timeline.
//!
//! An operator schedules control actions ("set the target number of
//! mirrors to M at tick T", "switch to topology strategy S at tick T")
//! and a reconfiguration engine incrementally mutates a set of *mirrors*
//! and *links* so that, on every tick, the realised network converges
//! toward the scheduled target under the active topology constraints.
//! Mirrors carry lifecycle delays (startup, readiness, shutdown) and links
//! a construction delay, so changes take effect over many ticks, not
//! instantly.
//!
//! The crate is organised in two layers:
//!
//! + The **planning graph** ([`structure`]): arena-stored
//!   [`StructureNode`](structure::StructureNode)s, each tagged with the
//!   set of structure types it participates in, wired by tag-labelled
//!   parent/child edges. One per-type rule module supplies the validator,
//!   admission predicate, removal predicate and navigation for its
//!   topology class.
//! + The **topology strategies** ([`strategy`]): one
//!   [`TopologyStrategy`](strategy::TopologyStrategy) per structure type,
//!   plus the composite snowflake hosting substructures behind a central
//!   bridge. Strategies build networks from scratch, grow and shrink them
//!   incrementally, and predict converged link counts.
//!
//! The [`Engine`] drives both per tick, and [`probes`] expose read-only
//! counts at tick boundaries.
//!
//! # Example
//!
//! ```
//! use rdmsim::{Engine, SimProps};
//! use rdmsim::strategy::RingStrategy;
//!
//! let props = SimProps { num_mirrors: 10, sim_time: 50, ..Default::default() };
//! let mut engine = Engine::new(props, Box::new(RingStrategy::new())).unwrap();
//! engine.set_mirrors(14, 10).unwrap();
//!
//! engine.run_to_end();
//!
//! assert_eq!(engine.mirror_probe().num_mirrors(), 14);
//! assert_eq!(engine.link_probe().num_links(), 14);
//! ```

/// Simulation time, in ticks.
pub type Tick = u64;

pub mod arena;
pub mod builder;
pub mod config;
pub mod effector;
pub mod engine;
pub mod error;
pub mod link;
pub mod mirror;
pub mod network;
pub mod probes;
pub mod strategy;
pub mod structure;

pub use arena::{LinkId, MirrorId, NodeId};
pub use config::SimProps;
pub use engine::Engine;
pub use error::{SimError, SimResult};
pub use link::{Link, LinkState};
pub use mirror::{Mirror, MirrorState};
pub use network::Network;
pub use structure::StructureType;
