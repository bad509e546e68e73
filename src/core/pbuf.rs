//! Defines the Region type and PersistentBinaryUnionFind, a persistent
//! union-find over a strict two-way partition.
//!
//! Every set carries a polarity: a region and its complement are the two
//! sides of one unresolved question.  Index 0 is special: it has infinite
//! rank, so it is never attached under anything else and `Region::OUTSIDE`
//! and `Region::INSIDE` stay the canonical names of the two final regions.

use super::parray::PArray;
use super::Error;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::ops::Not;

/// A signed component id: either "the same region as component `id`" or,
/// when `inverted`, "the region opposite component `id`".
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Region {
  id: usize,
  inverted: bool,
}

impl Region {
  /// The canonical region of index 0: outside the loop.
  pub const OUTSIDE: Region = Region::new(0, false);

  /// The complement of `OUTSIDE`: inside the loop.
  pub const INSIDE: Region = Region::new(0, true);

  /// Makes a region from a component id and polarity.
  pub const fn new(id: usize, inverted: bool) -> Region {
    Region { id, inverted }
  }

  /// The same region as the given index.
  pub const fn of(id: usize) -> Region {
    Region::new(id, false)
  }

  /// The component id, ignoring polarity.
  pub const fn id(self) -> usize {
    self.id
  }

  /// Whether this names the complement of its component.
  pub const fn is_inverted(self) -> bool {
    self.inverted
  }

  /// Tells whether this is one of the two canonical regions.
  pub const fn is_canonical(self) -> bool {
    self.id == 0
  }

  /// This region if `flip` is false, its complement otherwise.
  pub fn flip_if(self, flip: bool) -> Region {
    Region::new(self.id, self.inverted ^ flip)
  }
}

impl Not for Region {
  type Output = Region;

  /// The opposite region.
  fn not(self) -> Region {
    self.flip_if(true)
  }
}

impl fmt::Display for Region {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    if self.inverted {
      write!(f, "~{}", self.id)
    } else {
      write!(f, "{}", self.id)
    }
  }
}

/// A persistent partition of `0..len` into regions, where each set of
/// indices is known to be either the same as or opposite to its root.
#[derive(Clone)]
pub struct PersistentBinaryUnionFind {
  /// Maps each index to its parent, signed relative to the index.  Roots map
  /// to themselves, uninverted.
  parent: RefCell<PArray<Region>>,
  rank: PArray<u32>,
  merges: usize,
}

impl PersistentBinaryUnionFind {
  /// Makes a partition of `0..size` in which every index is its own region
  /// and index 0 is the permanent canonical root.
  pub fn create(size: usize) -> PersistentBinaryUnionFind {
    let rank = PArray::create(size, |_| 0);
    let rank = if size > 0 { rank.set(0, u32::MAX) } else { rank };
    PersistentBinaryUnionFind {
      parent: RefCell::new(PArray::create(size, Region::of)),
      rank,
      merges: 0,
    }
  }

  /// The number of indices being partitioned.
  pub fn len(&self) -> usize {
    self.rank.len()
  }

  /// Tells whether there are no indices.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// How many successful, state-changing unions led to this value.  Two
  /// values derived from one another are logically equal exactly when this
  /// count matches.
  pub fn merges(&self) -> usize {
    self.merges
  }

  /// Returns the canonical signed region of `x`.
  pub fn find(&self, x: Region) -> Region {
    let mut parent = self.parent.borrow_mut();
    // Each entry is an index we passed through and the polarity of the hop
    // out of it.
    let mut path = Vec::new();
    let mut i = x.id;
    loop {
      let p = parent.get(i);
      if p.id == i {
        break;
      }
      path.push((i, p.inverted));
      i = p.id;
    }
    let root = i;
    // Compress, walking back from the root so each index's polarity relative
    // to the root is the running parity of the hops above it.
    let mut parity = false;
    for &(i, hop) in path.iter().rev() {
      parity ^= hop;
      let target = Region::new(root, parity);
      if parent.get(i) != target {
        *parent = parent.set(i, target);
      }
    }
    Region::new(root, parity ^ x.inverted)
  }

  /// Returns the canonical signed region of index `x`.
  pub fn find_index(&self, x: usize) -> Region {
    self.find(Region::of(x))
  }

  /// Returns a partition in which `x` and `y` are the same region.  To
  /// record that they are opposite, pass `!y`.
  ///
  /// Fails with `Error::Contradiction` when they are already known to be
  /// opposite.
  pub fn union(&self, x: Region, y: Region) -> Result<PersistentBinaryUnionFind, Error> {
    let cx = self.find(x);
    let cy = self.find(y);
    if cx == cy {
      return Ok(self.clone());
    }
    if cx == !cy {
      return Err(Error::Contradiction(format!(
        "cannot union opposite regions {} ({}) and {} ({})",
        x, cx, y, cy
      )));
    }
    // Roots `a` and `b` are to be joined with relative polarity `sign`.
    let (a, b) = (cx.id, cy.id);
    let sign = cx.inverted ^ cy.inverted;
    let parent = self.parent.borrow();
    let ra = self.rank.get(a);
    let rb = self.rank.get(b);
    let (parent, rank) = if ra > rb {
      (parent.set(b, Region::new(a, sign)), self.rank.clone())
    } else if ra < rb {
      (parent.set(a, Region::new(b, sign)), self.rank.clone())
    } else {
      (parent.set(b, Region::new(a, sign)), self.rank.set(a, ra + 1))
    };
    Ok(PersistentBinaryUnionFind {
      parent: RefCell::new(parent),
      rank,
      merges: self.merges + 1,
    })
  }
}

impl fmt::Debug for PersistentBinaryUnionFind {
  /// Lists the indices that aren't trivial roots, with their parents and
  /// ranks.
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parent = self.parent.borrow().to_vec();
    let rank = self.rank.to_vec();
    let mut first = true;
    f.write_str("{")?;
    for (i, (p, r)) in parent.iter().zip(rank).enumerate() {
      if p.id != i || r != 0 {
        if !first {
          f.write_str(", ")?;
        }
        first = false;
        write!(f, "{}: {} ({})", i, p, r)?;
      }
    }
    f.write_str("}")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn canonical_regions() {
    let uf = PersistentBinaryUnionFind::create(4);
    assert_eq!(Region::OUTSIDE, uf.find_index(0));
    assert_eq!(Region::INSIDE, uf.find(Region::INSIDE));
    assert_eq!(Region::INSIDE, !Region::OUTSIDE);
    assert!(Region::INSIDE.is_canonical());
    assert!(!uf.find_index(3).is_canonical());
  }

  #[test]
  fn find_is_idempotent() {
    let uf = PersistentBinaryUnionFind::create(6)
      .union(Region::of(1), !Region::of(2))
      .unwrap()
      .union(Region::of(2), Region::of(3))
      .unwrap()
      .union(Region::of(4), !Region::of(3))
      .unwrap();
    for i in 0..6 {
      let r = uf.find_index(i);
      assert_eq!(r, uf.find(r));
      assert_ne!(r, !uf.find(r));
    }
  }

  #[test]
  fn same_and_opposite() {
    let uf = PersistentBinaryUnionFind::create(5)
      .union(Region::of(1), Region::of(2))
      .unwrap()
      .union(Region::of(3), !Region::of(2))
      .unwrap();
    assert_eq!(uf.find_index(1), uf.find_index(2));
    assert_eq!(uf.find_index(3), !uf.find_index(2));
    assert_eq!(uf.find_index(3), !uf.find_index(1));
    assert_eq!(2, uf.merges());
  }

  #[test]
  fn union_with_self_is_noop() {
    let uf = PersistentBinaryUnionFind::create(3);
    let same = uf.union(Region::of(2), Region::of(2)).unwrap();
    assert_eq!(0, same.merges());
    assert_eq!(Region::of(2), same.find_index(2));
  }

  #[test]
  fn union_with_complement_fails() {
    let uf = PersistentBinaryUnionFind::create(3);
    for i in 0..3 {
      assert!(matches!(
        uf.union(Region::of(i), !Region::of(i)),
        Err(Error::Contradiction(_))
      ));
    }
    let uf = uf.union(Region::of(1), !Region::of(2)).unwrap();
    assert!(uf.union(Region::of(1), Region::of(2)).is_err());
  }

  #[test]
  fn canonical_root_is_never_displaced() {
    let mut uf = PersistentBinaryUnionFind::create(10);
    // Build up a high-rank tree away from 0 first.
    for i in 2..10 {
      uf = uf.union(Region::of(1), Region::of(i).flip_if(i % 2 == 0)).unwrap();
    }
    uf = uf.union(Region::of(5), Region::INSIDE).unwrap();
    for i in 1..10 {
      let r = uf.find_index(i);
      assert!(r.is_canonical());
      assert_eq!(if i % 2 == 0 { Region::OUTSIDE } else { Region::INSIDE }, r);
    }
    assert_eq!(Region::OUTSIDE, uf.find_index(0));
  }

  #[test]
  fn old_versions_persist() {
    let base = PersistentBinaryUnionFind::create(4);
    let a = base.union(Region::of(1), Region::of(2)).unwrap();
    let b = base.union(Region::of(1), !Region::of(2)).unwrap();
    assert_eq!(a.find_index(1), a.find_index(2));
    assert_eq!(b.find_index(1), !b.find_index(2));
    assert_ne!(base.find_index(1), base.find_index(2));
    assert_ne!(base.find_index(1), !base.find_index(2));
  }

  #[test]
  fn debug_lists_nontrivial_entries() {
    let uf = PersistentBinaryUnionFind::create(3);
    assert_eq!("{0: 0 (4294967295)}", format!("{:?}", uf));
  }
}
