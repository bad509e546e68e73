//! Defines the Fence type: a snapshot of what is known about which side of
//! the loop each cell lies on, plus the rules that deduce more.
//!
//! A fence never changes.  Every rule takes a fence and returns a new one,
//! sharing the grid and clue tables and most of the union-find's storage with
//! the fence it came from.  That makes speculation free: a trial is just a
//! fence that gets dropped.

mod constraints;
mod internals;

pub use constraints::*;

use crate::core::*;
use crate::solve::Limits;
use internals::{implications, Arm, Implications, Term, Vars, MAX_VARS};
use itertools::Itertools;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, trace};

/// One state of knowledge about a puzzle.
#[derive(Clone, Debug)]
pub struct Fence {
  grid: Rc<Grid>,
  constraints: Rc<Constraints>,
  clues: Rc<Clues>,
  uf: PersistentBinaryUnionFind,
  limits: Limits,
}

impl Fence {
  /// Makes a fence with nothing yet deduced, for a grid of the given size
  /// with the given constraints.
  pub fn create(height: usize, width: usize, constraints: &Constraints) -> Result<Fence, Error> {
    if height == 0 || width == 0 {
      return Err(Error::InvalidConstraint(format!(
        "a {}x{} grid has no cells",
        height, width
      )));
    }
    let grid = Grid::new(height, width);
    let clues = Clues::index(&grid, constraints)?;
    let uf = PersistentBinaryUnionFind::create(grid.cells().len());
    Ok(Fence {
      grid: Rc::new(grid),
      constraints: Rc::new(constraints.clone()),
      clues: Rc::new(clues),
      uf,
      limits: Limits::default(),
    })
  }

  /// This fence, with different caps on the work its rules may do.
  pub fn with_limits(&self, limits: Limits) -> Fence {
    Fence {
      limits,
      ..self.clone()
    }
  }

  pub fn grid(&self) -> &Grid {
    &self.grid
  }

  /// The constraints as given.
  pub fn constraints(&self) -> &Constraints {
    &self.constraints
  }

  /// The constraints indexed by grid entity.
  pub fn clues(&self) -> &Clues {
    &self.clues
  }

  pub fn limits(&self) -> Limits {
    self.limits
  }

  /// How many unions have gone into this fence.  A rule made progress
  /// exactly when this grew.
  pub fn merges(&self) -> usize {
    self.uf.merges()
  }

  /// The canonical region of a cell.
  pub fn region(&self, cell: CellId) -> Region {
    self.uf.find_index(cell.index())
  }

  /// Whether the loop runs along `h`: `Some(true)` if the cells on either
  /// side are known to be in opposite regions, `Some(false)` if they're
  /// known to be in the same region, and `None` if it's not yet known.
  pub fn edge_type(&self, h: HalfedgeId) -> Option<bool> {
    let left = self.region(self.grid.cell_of(h));
    let right = self.region(self.grid.right(h));
    if left == right {
      Some(false)
    } else if left == !right {
      Some(true)
    } else {
      None
    }
  }

  /// Returns a fence in which regions `a` and `b` are the same.
  pub fn union(&self, a: Region, b: Region) -> Result<Fence, Error> {
    Ok(self.with_uf(self.uf.union(a, b)?))
  }

  /// Returns a fence in which the loop does (`wall`) or doesn't run along
  /// `h`.
  pub fn set_edge_type(&self, h: HalfedgeId, wall: bool) -> Result<Fence, Error> {
    let left = Self::cell_region(self.grid.cell_of(h));
    let right = Self::cell_region(self.grid.right(h));
    self.union(left, right.flip_if(wall)).map_err(|_| {
      Error::Contradiction(format!(
        "{} can't be {}",
        self.grid.describe(Element::Halfedge(h)),
        if wall { "a wall" } else { "open" }
      ))
    })
  }

  /// The number of cells not yet known to be inside or outside.
  pub fn unknown_cells(&self) -> usize {
    self
      .grid
      .cells()
      .iter()
      .filter(|c| !self.region(c.id()).is_canonical())
      .count()
  }

  /// Tells whether every cell is known to be inside or outside.
  pub fn is_solved(&self) -> bool {
    self.unknown_cells() == 0
  }

  fn with_uf(&self, uf: PersistentBinaryUnionFind) -> Fence {
    Fence {
      grid: self.grid.clone(),
      constraints: self.constraints.clone(),
      clues: self.clues.clone(),
      uf,
      limits: self.limits,
    }
  }

  fn cell_region(cell: CellId) -> Region {
    Region::of(cell.index())
  }

  /// Counts the known walls among `edges`, and collects the unknown ones.
  fn tally(&self, edges: &[HalfedgeId]) -> (usize, Vec<HalfedgeId>) {
    let mut walls = 0;
    let mut unknown = Vec::new();
    for &h in edges {
      match self.edge_type(h) {
        Some(true) => walls += 1,
        Some(false) => {}
        None => unknown.push(h),
      }
    }
    (walls, unknown)
  }

  fn is_wall(&self, h: Option<HalfedgeId>) -> bool {
    h.is_some_and(|h| self.edge_type(h) == Some(true))
  }

  /// Whether the loop certainly doesn't run along `h`, including when
  /// there's no such edge.
  fn is_open(&self, h: Option<HalfedgeId>) -> bool {
    h.map_or(true, |h| self.edge_type(h) == Some(false))
  }

  /// Like `set_edge_type`, for an edge that may be off the lattice.  A
  /// missing edge is skipped; a circle that needs one is left for
  /// `check_rules` to reject.
  fn force(&self, h: Option<HalfedgeId>, wall: bool) -> Result<Fence, Error> {
    match h {
      Some(h) => self.set_edge_type(h, wall),
      None => Ok(self.clone()),
    }
  }

  /// Each cell's region, renamed so that two fences agreeing on which cells
  /// are the same or opposite give equal results no matter which roots
  /// their union-finds chose.
  fn normalized_regions(&self) -> Vec<Region> {
    let mut names: Vec<Option<Region>> = vec![None; self.uf.len()];
    self
      .grid
      .cells()
      .iter()
      .map(|c| {
        let r = self.region(c.id());
        let name = *names[r.id()].get_or_insert(Region::new(c.id().index(), r.is_inverted()));
        name.flip_if(r.is_inverted())
      })
      .collect()
  }
}

/// The rules.
impl Fence {
  /// Applies the deductions that only need doing once: cells whose side is
  /// given, open circles' diagonals, and pairs of adjacent dead-end cells.
  pub fn handle_initial_cases(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for (cell, inside) in self.clues.initials() {
      fence = fence.union(Self::cell_region(cell), Region::OUTSIDE.flip_if(inside))?;
    }
    for (cell, _) in self.clues.enclosures() {
      fence = fence.union(Self::cell_region(cell), Region::INSIDE)?;
    }
    for (v, filled) in self.clues.masyus() {
      if filled {
        continue;
      }
      // The loop passes straight through, so it separates each pair of
      // diagonally opposite cells.
      let [nw, ne, se, sw] = self.grid.quadrants(v).map(Self::cell_region);
      fence = fence
        .union(nw, !se)
        .and_then(|f| f.union(ne, !sw))
        .map_err(|_| {
          Error::Contradiction(format!(
            "no straight path through the circle at {}",
            self.grid.describe(Element::Vertex(v))
          ))
        })?;
    }
    fence = fence.dead_end_pairs()?;
    trace!(merges = fence.merges(), "initial cases");
    Ok(fence)
  }

  /// Tells whether a cell's clue is one less than its number of sides.
  fn is_dead_end(&self, cell: CellId) -> bool {
    self
      .clues
      .slitherlink(cell)
      .is_some_and(|n| n as usize + 1 == self.grid.cell(cell).degree())
  }

  fn dead_end_pairs(&self) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let mut fence = self.clone();
    for (cell, _) in self.clues.slitherlinks() {
      if !self.is_dead_end(cell) {
        continue;
      }
      let incident = grid.cell(cell).incident();
      for (i, &h) in incident.iter().enumerate() {
        let other = grid.right(h);
        if other < cell || !self.is_dead_end(other) {
          continue;
        }
        let twin = grid.halfedge(h).twin();
        let across = grid.cell(other).incident();
        let Some(j) = across.iter().position(|&t| t == twin) else {
          continue;
        };
        fence = fence
          .set_edge_type(h, true)?
          .set_edge_type(incident[(i + 2) % incident.len()], true)?
          .set_edge_type(across[(j + 2) % across.len()], true)?;
        for beyond in [grid.straight(h), grid.straight(twin)].into_iter().flatten() {
          fence = fence.set_edge_type(beyond, false)?;
        }
      }
      let Some((y, x)) = grid.cell(cell).position() else {
        continue;
      };
      for dx in [-1, 1] {
        let other = grid.cell_at(y as isize + 1, x as isize + dx);
        if other == Grid::OUTSIDE || !self.is_dead_end(other) {
          continue;
        }
        let corner = if dx > 0 { x + 1 } else { x };
        let Some(shared) = grid.vertex_at(y + 1, corner) else {
          continue;
        };
        for c in [cell, other] {
          for &h in grid.cell(c).incident() {
            if grid.halfedge(h).vert() != shared && grid.orig(h) != shared {
              fence = fence.set_edge_type(h, true)?;
            }
          }
        }
      }
    }
    Ok(fence)
  }

  /// One pass of all the local rules.
  pub fn iterate(&self) -> Result<Fence, Error> {
    self
      .masyu_check()?
      .range_check()?
      .vertex_check()?
      .enclosure_check()
  }

  /// Repeats `iterate` until it stops making progress.  Fails with
  /// `Error::NonConvergence` if that takes more than the allotted passes.
  pub fn iterate_to_fixed_point(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for pass in 0..self.limits.max_passes {
      let next = fence.iterate()?;
      trace!(pass, merges = next.merges(), "local pass");
      if next.merges() == fence.merges() {
        return Ok(next);
      }
      fence = next;
    }
    Err(Error::NonConvergence {
      limit: self.limits.max_passes,
    })
  }

  /// Applies every Slitherlink clue.
  pub fn range_check(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for (cell, clue) in self.clues.slitherlinks() {
      fence = fence.range_check_cell(cell, clue)?;
    }
    Ok(fence)
  }

  /// Commits everything implied by `cell` having exactly `clue` walls,
  /// given what's known about its neighbors.
  pub fn range_check_cell(&self, cell: CellId, clue: u8) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let center = self.region(cell);
    let mut vars = Vars::new(center);
    let middle = vars.term(center);
    let neighbors: Vec<Term> = grid
      .cell(cell)
      .incident()
      .iter()
      .map(|&h| vars.term(self.region(grid.right(h))))
      .collect();
    if vars.len() > self.max_vars() {
      trace!(cell = %cell, vars = vars.len(), "too many regions to enumerate");
      return Ok(self.clone());
    }
    let found = implications(vars.len(), |a| {
      let side = middle.eval(a);
      neighbors.iter().filter(|t| t.eval(a) != side).count() == clue as usize
    });
    self.commit(&vars, found, || {
      format!("{} can't have {} walls", grid.describe(Element::Cell(cell)), clue)
    })
  }

  /// Applies every Corral size clue.
  pub fn enclosure_check(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for (cell, size) in self.clues.enclosures() {
      fence = fence.enclosure_check_cell(cell, size)?;
    }
    Ok(fence)
  }

  /// Commits everything implied by exactly `size` cells being visible from
  /// `cell` in straight lines within its region, itself included.
  pub fn enclosure_check_cell(&self, cell: CellId, size: usize) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let Some((y, x)) = grid.cell(cell).position() else {
      return Ok(self.clone());
    };
    let center = self.region(cell);
    let mut vars = Vars::new(center);
    let middle = vars.term(center);
    let mut rays: Vec<Vec<Term>> = Vec::with_capacity(Dir::COUNT);
    for dir in Dir::all() {
      let (dy, dx) = dir.delta();
      let mut ray = Vec::new();
      // A run of `size` more cells would already be too many.
      for k in 1..=size as isize {
        let c = grid.cell_at(y as isize + k * dy, x as isize + k * dx);
        if c == Grid::OUTSIDE {
          break;
        }
        let region = self.region(c);
        ray.push(vars.term(region));
        // Nothing past a cell known to be on the other side is visible.
        if region == !center {
          break;
        }
      }
      rays.push(ray);
    }
    if vars.len() > self.max_vars() {
      trace!(cell = %cell, vars = vars.len(), "too many regions to enumerate");
      return Ok(self.clone());
    }
    let found = implications(vars.len(), |a| {
      let side = middle.eval(a);
      let seen: usize = rays
        .iter()
        .map(|ray| ray.iter().take_while(|t| t.eval(a) == side).count())
        .sum();
      seen + 1 == size
    });
    self.commit(&vars, found, || {
      format!("{} can't see {} cells", grid.describe(Element::Cell(cell)), size)
    })
  }

  fn max_vars(&self) -> usize {
    self.limits.max_exhaustive_vars.min(MAX_VARS)
  }

  /// Unions whatever an exhaustive check found, or reports that it found no
  /// way to satisfy the rule.
  fn commit(
    &self,
    vars: &Vars,
    found: Option<Implications>,
    failure: impl FnOnce() -> String,
  ) -> Result<Fence, Error> {
    let Some(found) = found else {
      return Err(Error::Contradiction(failure()));
    };
    if found.is_empty() {
      return Ok(self.clone());
    }
    let mut fence = self.clone();
    for (var, value) in found.units {
      fence = fence.union(vars.root(var), vars.root(0).flip_if(value))?;
    }
    for (a, b, differ) in found.pairs {
      fence = fence.union(vars.root(a), vars.root(b).flip_if(differ))?;
    }
    Ok(fence)
  }

  /// Applies every Masyu circle.
  pub fn masyu_check(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for (v, filled) in self.clues.masyus() {
      fence = if filled {
        fence.filled_circle(v)?
      } else {
        fence.open_circle(v)?
      };
    }
    Ok(fence)
  }

  /// The loop turns at a filled circle and runs straight for two edges on
  /// both sides of the turn.
  fn filled_circle(&self, v: VertexId) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let mut fence = self.clone();
    for dir in Dir::all() {
      let ahead = Arm::of(grid, v, dir);
      let behind = Arm::of(grid, v, dir.opposite());
      let crossed = ahead.elbow(grid).is_some_and(|elbow| {
        let elbow = grid.vertex(elbow);
        [dir.left(), dir.right()]
          .into_iter()
          .any(|side| fence.is_wall(elbow.outgoing(side)))
      });
      if crossed || fence.is_open(ahead.near) || fence.is_open(ahead.far) {
        fence = fence
          .force(behind.near, true)?
          .force(behind.far, true)?;
      }
      // An arm one edge long can't be used, however its near edge is set.
      if fence.is_wall(ahead.near) && ahead.far.is_some() {
        fence = fence
          .force(ahead.far, true)?
          .force(behind.near, false)?;
      }
    }
    Ok(fence)
  }

  /// The loop runs straight through an open circle and turns on at least
  /// one side of it.
  fn open_circle(&self, v: VertexId) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let mut fence = self.clone();
    for dir in [Dir::Right, Dir::Down] {
      let ahead = Arm::of(grid, v, dir);
      let behind = Arm::of(grid, v, dir.opposite());
      if fence.is_wall(ahead.far) && fence.is_wall(behind.far) {
        fence = fence.force(ahead.near, false)?;
      }
      if fence.is_wall(ahead.near) || fence.is_wall(behind.near) {
        if fence.is_wall(ahead.far) {
          fence = fence.force(behind.far, false)?;
        }
        if fence.is_wall(behind.far) {
          fence = fence.force(ahead.far, false)?;
        }
      }
    }
    Ok(fence)
  }

  /// The loop meets each vertex with zero or two of its edges.
  pub fn vertex_check(&self) -> Result<Fence, Error> {
    let mut fence = self.clone();
    for v in self.grid.vertices() {
      let (walls, unknown) = fence.tally(v.incoming());
      if walls == 2 {
        for h in unknown {
          fence = fence.set_edge_type(h, false)?;
        }
      } else if walls == 1 && unknown.len() == 1 {
        fence = fence.set_edge_type(unknown[0], true)?;
      }
    }
    Ok(fence)
  }

  /// Verifies that no vertex or clue is already violated.
  pub fn check_rules(&self) -> Result<(), Error> {
    let grid = &*self.grid;
    for v in grid.vertices() {
      let (walls, unknown) = self.tally(v.incoming());
      if walls > 2 || (walls == 1 && unknown.is_empty()) {
        return Err(Error::Contradiction(format!(
          "{} meets {} walls",
          grid.describe(Element::Vertex(v.id())),
          walls
        )));
      }
      if walls == 0 && unknown.is_empty() && self.clues.masyu(v.id()).is_some() {
        return Err(Error::Contradiction(format!(
          "the loop misses the circle at {}",
          grid.describe(Element::Vertex(v.id()))
        )));
      }
    }
    for (cell, clue) in self.clues.slitherlinks() {
      let (walls, unknown) = self.tally(grid.cell(cell).incident());
      let clue = clue as usize;
      if clue < walls || clue > walls + unknown.len() {
        return Err(Error::Contradiction(format!(
          "{} has {} walls and {} unknown sides but needs {}",
          grid.describe(Element::Cell(cell)),
          walls,
          unknown.len(),
          clue
        )));
      }
    }
    Ok(())
  }

  /// Requires the cells of `!region` to be connected through the cells not
  /// known to be in `region`.  With `fix`, any pocket of such cells cut off
  /// from `!region` is folded into `region`.
  pub fn check_connected_with_removal(&self, region: Region, fix: bool) -> Result<Fence, Error> {
    let grid = &*self.grid;
    let region = self.uf.find(region);
    let target = !region;
    const UNSEEN: usize = usize::MAX;
    let mut component = vec![UNSEEN; grid.cells().len()];
    let mut components: Vec<Vec<CellId>> = Vec::new();
    for start in grid.cells().iter().map(|c| c.id()) {
      if component[start.index()] != UNSEEN || self.region(start) == region {
        continue;
      }
      let id = components.len();
      let mut members = Vec::new();
      let mut queue = VecDeque::from([start]);
      component[start.index()] = id;
      while let Some(c) = queue.pop_front() {
        members.push(c);
        for &h in grid.cell(c).incident() {
          let n = grid.right(h);
          if component[n.index()] == UNSEEN
            && self.region(n) != region
            && self.edge_type(h) != Some(true)
          {
            component[n.index()] = id;
            queue.push_back(n);
          }
        }
      }
      components.push(members);
    }
    let (anchored, pockets): (Vec<_>, Vec<_>) = components
      .into_iter()
      .partition(|members| members.iter().any(|&c| self.region(c) == target));
    if anchored.len() > 1 {
      return Err(Error::Contradiction(format!(
        "region {} is split into {} pieces",
        target,
        anchored.len()
      )));
    }
    if !fix || anchored.is_empty() || pockets.is_empty() {
      return Ok(self.clone());
    }
    let mut fence = self.clone();
    for cell in pockets.into_iter().flatten() {
      fence = fence.union(Self::cell_region(cell), region)?;
    }
    trace!(region = %region, merges = fence.merges() - self.merges(), "folded in pockets");
    Ok(fence)
  }

  /// The speculative rule.  Tries each pair of regions as the same and as
  /// opposites, and when one guess leads to a contradiction, commits the
  /// other.  Also folds in disconnected pockets.  Returns the new fence and
  /// whether anything was learned.
  pub fn slow_checks(&self) -> Result<(Fence, bool), Error> {
    let fence = self
      .check_connected_with_removal(Region::OUTSIDE, true)?
      .check_connected_with_removal(Region::INSIDE, true)?;
    if fence.merges() != self.merges() {
      return Ok((fence, true));
    }
    let sizes = fence
      .grid
      .cells()
      .iter()
      .map(|c| fence.region(c.id()).id())
      .counts();
    let roots: Vec<usize> = sizes.keys().copied().sorted().collect();
    for (&a, &b) in roots.iter().tuple_combinations() {
      if sizes[&a] < 2 && sizes[&b] < 2 {
        continue;
      }
      let (a, b) = (Region::of(a), Region::of(b));
      for guess in [b, !b] {
        if let Some(reason) = fence.refutes(a, guess)? {
          debug!(%a, %guess, %reason, "refuted; committing the opposite");
          let fence = fence.union(a, !guess)?;
          return Ok((fence, true));
        }
      }
    }
    Ok((fence, false))
  }

  /// Tries `a` and `b` as the same region, returning the contradiction that
  /// follows if there is one.
  fn refutes(&self, a: Region, b: Region) -> Result<Option<Error>, Error> {
    let trial = self.union(a, b).and_then(|t| {
      let t = t.iterate_to_fixed_point()?;
      t.check_rules()?;
      t.check_connected_with_removal(Region::OUTSIDE, false)?
        .check_connected_with_removal(Region::INSIDE, false)
    });
    match trial {
      Ok(_) => Ok(None),
      Err(e) if e.is_contradiction() => {
        trace!(%a, %b, reason = %e, "trial failed");
        Ok(Some(e))
      }
      Err(e) => Err(e),
    }
  }
}

/// Two fences are equal when they're for the same puzzle and agree on the
/// relationship between every pair of cells.
impl PartialEq for Fence {
  fn eq(&self, other: &Fence) -> bool {
    self.grid.height() == other.grid.height()
      && self.grid.width() == other.grid.width()
      && self.clues == other.clues
      && self.normalized_regions() == other.normalized_regions()
  }
}

impl Eq for Fence {}
