//! Defines the PArray type, a persistent array with amortized O(1) access.
//!
//! This is Baker's "rerooting" trick: every version of the array is a node in
//! a shared version graph.  Exactly one node holds the flat array; every
//! other node is a one-slot diff pointing toward it.  Reading or writing a
//! version first reverses the chain of diffs between it and the live node,
//! so the version being touched becomes live.  Observable contents of a
//! version never change, but the graph itself is mutated in place, which is
//! why it lives behind a single-threaded `Rc<RefCell<_>>`.
//!
//! Memory: the graph gets one node per `set` and never shrinks.  Nodes of
//! versions that have been dropped stay in the arena until every version
//! sharing it is gone, so a store costs O(length + total sets) for as long as
//! any of its versions is alive.  Rerooting reuses nodes and adds none.

use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// One version of a persistent array.
///
/// Cloning a `PArray` is cheap and yields the same version.  `set` returns a
/// new version and leaves this one observably unchanged.
pub struct PArray<T> {
  store: Rc<RefCell<Store<T>>>,
  version: usize,
}

/// The version graph shared by all versions derived from one `create`.
struct Store<T> {
  /// The flat array, holding the contents of the live version.
  data: Vec<T>,
  /// One node per version ever created, including dropped ones.
  nodes: Vec<Node<T>>,
}

enum Node<T> {
  /// This version's contents are `data`.
  Live,
  /// This version's contents are `parent`'s, except at `index`, which holds
  /// `value`.
  Diff { parent: usize, index: usize, value: T },
}

impl<T: Clone> PArray<T> {
  /// Makes a new array of the given length, computing each element from its
  /// index.
  pub fn create(length: usize, init: impl FnMut(usize) -> T) -> PArray<T> {
    let store = Store {
      data: (0..length).map(init).collect(),
      nodes: vec![Node::Live],
    };
    PArray {
      store: Rc::new(RefCell::new(store)),
      version: 0,
    }
  }

  /// The number of elements.
  pub fn len(&self) -> usize {
    self.store.borrow().data.len()
  }

  /// Tells whether the array has no elements.
  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns the element at `index` in this version.
  ///
  /// ## Panics
  ///
  /// Panics if the index is out of range.
  pub fn get(&self, index: usize) -> T {
    let mut store = self.store.borrow_mut();
    store.reroot(self.version);
    store.data[index].clone()
  }

  /// Returns a new version identical to this one except that `index` holds
  /// `value`.  The new version becomes live.
  ///
  /// ## Panics
  ///
  /// Panics if the index is out of range.
  pub fn set(&self, index: usize, value: T) -> PArray<T> {
    let mut store = self.store.borrow_mut();
    store.reroot(self.version);
    let previous = mem::replace(&mut store.data[index], value);
    let next = store.nodes.len();
    store.nodes.push(Node::Live);
    store.nodes[self.version] = Node::Diff {
      parent: next,
      index,
      value: previous,
    };
    PArray {
      store: Rc::clone(&self.store),
      version: next,
    }
  }

  /// Copies out this version's contents.
  pub fn to_vec(&self) -> Vec<T> {
    let mut store = self.store.borrow_mut();
    store.reroot(self.version);
    store.data.clone()
  }
}

impl<T> Store<T> {
  /// Makes `version` the live node, reversing every diff between it and the
  /// current live node.
  fn reroot(&mut self, version: usize) {
    let mut path = Vec::new();
    let mut node = version;
    while let Node::Diff { parent, .. } = self.nodes[node] {
      path.push(node);
      node = parent;
    }
    // Walk back from the live end: each step moves the live array one node
    // closer to `version`, leaving a diff behind that undoes the move.
    for &node in path.iter().rev() {
      let Node::Diff { parent, index, value } = mem::replace(&mut self.nodes[node], Node::Live)
      else {
        unreachable!()
      };
      let previous = mem::replace(&mut self.data[index], value);
      self.nodes[parent] = Node::Diff {
        parent: node,
        index,
        value: previous,
      };
    }
  }
}

impl<T> Clone for PArray<T> {
  fn clone(&self) -> Self {
    PArray {
      store: Rc::clone(&self.store),
      version: self.version,
    }
  }
}

impl<T: Clone + fmt::Debug> fmt::Debug for PArray<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_list().entries(self.to_vec()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn create() {
    let arr = PArray::create(5, |i| i);
    assert_eq!(vec![0, 1, 2, 3, 4], arr.to_vec());
    assert_eq!(5, arr.len());
  }

  #[test]
  fn create_empty() {
    let arr = PArray::create(0, |_| 0);
    assert!(arr.is_empty());
    assert_eq!(Vec::<i32>::new(), arr.to_vec());
  }

  #[test]
  fn set_element() {
    let arr = PArray::create(5, |i| i).set(3, 6);
    assert_eq!(vec![0, 1, 2, 6, 4], arr.to_vec());
    assert_eq!(6, arr.get(3));
  }

  #[test]
  fn older_versions_persist() {
    let arr = PArray::create(5, |i| i);
    let newer = arr.set(3, 6);
    assert_eq!(vec![0, 1, 2, 3, 4], arr.to_vec());
    assert_eq!(6, newer.get(3));
    assert_eq!(3, arr.get(3));
  }

  #[test]
  fn sibling_versions_are_independent() {
    let arr = PArray::create(5, |i| i);
    let arr1 = arr.set(3, 6);
    let arr2 = arr.set(3, 7);
    assert_eq!(vec![0, 1, 2, 6, 4], arr1.to_vec());
    assert_eq!(vec![0, 1, 2, 7, 4], arr2.to_vec());
    assert_eq!(vec![0, 1, 2, 3, 4], arr.to_vec());
  }

  fn nodes<T>(arr: &PArray<T>) -> usize {
    arr.store.borrow().nodes.len()
  }

  #[test]
  fn arena_grows_only_on_set() {
    let base = PArray::create(4, |i| i);
    let mut current = base.clone();
    for i in 0..10 {
      current = current.set(i % 4, i);
    }
    assert_eq!(11, nodes(&base));
    for _ in 0..3 {
      assert_eq!(0, base.get(0));
      assert_eq!(8, current.get(0));
    }
    assert_eq!(11, nodes(&base));
    // Dropped versions keep their nodes.
    drop(base.set(1, 100));
    assert_eq!(12, nodes(&current));
  }

  #[test]
  fn long_chains_and_branches() {
    let base = PArray::create(10, |_| 0usize);
    let mut versions = vec![base.clone()];
    let mut current = base.clone();
    for i in 0..100 {
      current = current.set(i % 10, i);
      versions.push(current.clone());
    }
    let branch = versions[50].set(0, 999);
    // Jump around the version graph in an unfriendly order.
    for (n, version) in versions.iter().enumerate().rev().step_by(7) {
      let mut expected = vec![0usize; 10];
      for i in 0..n {
        expected[i % 10] = i;
      }
      assert_eq!(expected, version.to_vec());
    }
    assert_eq!(999, branch.get(0));
    assert_eq!(50, versions[51].get(0));
    assert_eq!(0, base.get(9));
  }
}
