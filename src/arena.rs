//! Identity and storage substrate for the simulation.
//!
//! Every entity of the simulation (planning-graph node, mirror, link) lives
//! in an [`Arena`] and is addressed by a typed id drawn from an
//! [`IdDistributer`]. Ids are monotone and never reused within one run, so
//! an id uniquely names an entity for the whole simulation even after the
//! entity is gone. Arenas are backed by [`ordermap::OrderMap`], which keeps
//! insertion order: every iteration over nodes, mirrors or links is
//! deterministic given the same sequence of operations.

use std::fmt::{self, Debug, Display};
use std::hash::Hash;
use std::iter::{ExactSizeIterator, FusedIterator, Iterator};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ordermap::{self, OrderMap};
use serde::{Deserialize, Serialize};

/// An atomic source of distinct usize ids.
///
/// Clones share the same counter, so one distributer can be handed to
/// several arenas that must never collide (it is not: node and link ids are
/// independent per the data model, each arena gets its own distributer).
#[derive(Debug, Clone)]
pub struct IdDistributer {
  cnt: Arc<AtomicUsize>,
}

impl IdDistributer {
  pub fn new() -> IdDistributer {
    IdDistributer { cnt: Arc::new(AtomicUsize::new(0)) }
  }

  pub fn alloc(&self) -> usize {
    let c = self.cnt.fetch_add(1, Ordering::Relaxed);
    c + 1
  }
}

impl Default for IdDistributer {
  fn default() -> Self {
    IdDistributer::new()
  }
}

/// Key trait for arena-addressed entities.
pub trait ArenaIndex:
  Hash + PartialEq + Eq + Debug + Copy + Clone + PartialOrd + Ord
{
  fn new(id: usize) -> Self;
  fn raw(&self) -> usize;
}

macro_rules! arena_id {
  ($(#[$doc:meta])* $name:ident) => {
    $(#[$doc])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    )]
    pub struct $name(pub usize);

    impl ArenaIndex for $name {
      fn new(id: usize) -> Self {
        $name(id)
      }
      fn raw(&self) -> usize {
        self.0
      }
    }

    impl Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
      }
    }
  };
}

arena_id! {
  /// Id of a planning-graph node.
  NodeId
}
arena_id! {
  /// Id of a mirror.
  MirrorId
}
arena_id! {
  /// Id of a link between two mirrors.
  LinkId
}

/// The container for simulation entities.
///
/// A thin wrapper over [`OrderMap`] that allocates keys from its
/// [`IdDistributer`]. [`OrderMap::remove`] preserves the relative order of
/// the surviving entries; the topology algorithms rely on that for
/// deterministic member enumeration.
#[derive(Debug, Clone)]
pub struct Arena<K: ArenaIndex, V> {
  distributer: IdDistributer,
  container: OrderMap<K, V>,
}

impl<K: ArenaIndex, V> Arena<K, V> {
  pub fn new() -> Self {
    Arena { distributer: IdDistributer::new(), container: OrderMap::new() }
  }

  pub fn insert(&mut self, item: V) -> K {
    let idx = K::new(self.distributer.alloc());
    self.container.insert(idx, item);
    idx
  }

  /// Insert an entity that wants to know its own id.
  pub fn insert_with(&mut self, create: impl FnOnce(K) -> V) -> K {
    let idx = K::new(self.distributer.alloc());
    self.container.insert(idx, create(idx));
    idx
  }

  /// Reserve an id without storing anything, use together with
  /// [`fill_back`](Arena::fill_back).
  pub fn alloc(&mut self) -> K {
    K::new(self.distributer.alloc())
  }

  /// # Panics
  /// Panics if the index is already occupied.
  pub fn fill_back(&mut self, i: K, item: V) {
    assert!(self.container.insert(i, item).is_none(), "Filled an occupied index!")
  }

  pub fn remove(&mut self, i: K) -> Option<V> {
    self.container.remove(&i)
  }

  pub fn contains(&self, i: K) -> bool {
    self.container.contains_key(&i)
  }

  pub fn get(&self, i: K) -> Option<&V> {
    self.container.get(&i)
  }

  pub fn get_mut(&mut self, i: K) -> Option<&mut V> {
    self.container.get_mut(&i)
  }

  pub fn len(&self) -> usize {
    self.container.len()
  }

  pub fn is_empty(&self) -> bool {
    self.container.is_empty()
  }

  pub fn clear(&mut self) {
    self.container.clear()
  }

  pub fn keys(&self) -> impl Iterator<Item = K> + '_ {
    self.container.keys().copied()
  }

  pub fn iter(&self) -> Iter<'_, K, V> {
    Iter(self.container.iter())
  }

  pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
    IterMut(self.container.iter_mut())
  }

  /// Remove every entry the predicate rejects, preserving order.
  pub fn retain(&mut self, mut keep: impl FnMut(K, &mut V) -> bool) {
    self.container.retain(|k, v| keep(*k, v));
  }
}

impl<K: ArenaIndex, V> Default for Arena<K, V> {
  fn default() -> Self {
    Arena::new()
  }
}

#[derive(Debug)]
pub struct Iter<'a, K, V>(ordermap::map::Iter<'a, K, V>)
where
  K: ArenaIndex,
  V: 'a;

impl<'a, K, V> Clone for Iter<'a, K, V>
where
  K: ArenaIndex,
  V: 'a,
{
  fn clone(&self) -> Self {
    Self(self.0.clone())
  }
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
  K: ArenaIndex,
  V: 'a,
{
  type Item = (K, &'a V);
  fn next(&mut self) -> Option<Self::Item> {
    self.0.next().map(|(idx, data)| (*idx, data))
  }
  fn size_hint(&self) -> (usize, Option<usize>) {
    self.0.size_hint()
  }
}
impl<'a, K, V> FusedIterator for Iter<'a, K, V>
where
  K: ArenaIndex,
  V: 'a,
{
}
impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V>
where
  K: ArenaIndex,
  V: 'a,
{
}

#[derive(Debug)]
pub struct IterMut<'a, K, V>(ordermap::map::IterMut<'a, K, V>)
where
  V: 'a,
  K: ArenaIndex;

impl<'a, K, V> Iterator for IterMut<'a, K, V>
where
  V: 'a,
  K: ArenaIndex,
{
  type Item = (K, &'a mut V);
  fn next(&mut self) -> Option<Self::Item> {
    self.0.next().map(|(idx, data)| (*idx, data))
  }
  fn size_hint(&self) -> (usize, Option<usize>) {
    self.0.size_hint()
  }
}
impl<'a, K, V> FusedIterator for IterMut<'a, K, V>
where
  V: 'a,
  K: ArenaIndex,
{
}
impl<'a, K, V> ExactSizeIterator for IterMut<'a, K, V>
where
  V: 'a,
  K: ArenaIndex,
{
}

impl<'a, K, V> IntoIterator for &'a Arena<K, V>
where
  V: 'a,
  K: ArenaIndex,
{
  type IntoIter = Iter<'a, K, V>;
  type Item = (K, &'a V);

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<K: ArenaIndex, V> std::ops::Index<K> for Arena<K, V> {
  type Output = V;

  fn index(&self, index: K) -> &Self::Output {
    self.get(index).unwrap()
  }
}
impl<K: ArenaIndex, V> std::ops::IndexMut<K> for Arena<K, V> {
  fn index_mut(&mut self, index: K) -> &mut Self::Output {
    self.get_mut(index).unwrap()
  }
}
