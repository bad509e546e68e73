//! Defines PersistentUnionFind, a disjoint-set forest whose unions return new
//! values instead of mutating.
//!
//! Follows Conchon and Filliâtre, "A Persistent Union-Find Data Structure":
//! union by rank plus path compression, with both the parent and rank maps
//! stored in `PArray`s so every version shares structure with the ones it was
//! derived from.

use super::parray::PArray;
use std::cell::RefCell;

/// A persistent partition of `0..len` into disjoint sets.
#[derive(Clone, Debug)]
pub struct PersistentUnionFind {
  /// Path compression rewrites this even through a shared reference; the
  /// rewrite never changes which root any index reaches.
  parent: RefCell<PArray<usize>>,
  rank: PArray<u32>,
}

impl PersistentUnionFind {
  /// Makes a partition of `0..size` into singletons.
  pub fn create(size: usize) -> PersistentUnionFind {
    PersistentUnionFind {
      parent: RefCell::new(PArray::create(size, |i| i)),
      rank: PArray::create(size, |_| 0),
    }
  }

  /// The number of elements being partitioned.
  pub fn len(&self) -> usize {
    self.rank.len()
  }

  /// Tells whether there are no elements.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the canonical representative of `index`'s set.
  pub fn find(&self, index: usize) -> usize {
    let mut parent = self.parent.borrow_mut();
    let mut path = Vec::new();
    let mut i = index;
    loop {
      let p = parent.get(i);
      if p == i {
        break;
      }
      path.push(i);
      i = p;
    }
    let root = i;
    // Point everything we passed through straight at the root.
    for &i in &path {
      if parent.get(i) != root {
        *parent = parent.set(i, root);
      }
    }
    root
  }

  /// Returns a partition in which `x`'s and `y`'s sets are merged.
  pub fn union(&self, x: usize, y: usize) -> PersistentUnionFind {
    let cx = self.find(x);
    let cy = self.find(y);
    if cx == cy {
      return self.clone();
    }
    let parent = self.parent.borrow();
    let rx = self.rank.get(cx);
    let ry = self.rank.get(cy);
    let (parent, rank) = if rx > ry {
      (parent.set(cy, cx), self.rank.clone())
    } else if rx < ry {
      (parent.set(cx, cy), self.rank.clone())
    } else {
      (parent.set(cy, cx), self.rank.set(cx, rx + 1))
    };
    PersistentUnionFind {
      parent: RefCell::new(parent),
      rank,
    }
  }
}
