//! Defines the Grid type: a half-edge mesh (DCEL) over an h×w rectangle of
//! cells, plus one unbounded `outside` cell surrounding it.
//!
//! Every entity lives in one of the grid's tables and is referred to by a
//! dense index type.  The grid is built in two passes, first allocating all
//! the entities and then wiring their indices together, and never changes
//! afterward.
//!
//! Coordinates are in screen terms: vertex `(0, 0)` is the top left corner,
//! rows grow downward, and cell `(y, x)` is the square whose top left corner
//! is vertex `(y, x)`.  Half-edges run counter-clockwise (as drawn) around
//! the cell on their left.

use super::dir::{Dir, Orientation};
use crate::define_index_types;
use serde::Serialize;

define_index_types! {
    /// Identifies a lattice point of the grid.
    VertexId;

    /// Identifies one direction of travel along a lattice segment.
    HalfedgeId;

    /// Identifies a lattice segment, without direction.
    EdgeId;

    /// Identifies a cell of the grid.  `CellId(0)` is always the outside.
    CellId;
}

/// Any one of the grid's navigable entities.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum Element {
  Vertex(VertexId),
  Halfedge(HalfedgeId),
  Edge(EdgeId),
  Cell(CellId),
}

/// A lattice point.
#[derive(Clone, Debug)]
pub struct Vertex {
  id: VertexId,
  y: usize,
  x: usize,
  /// The half-edges pointing at this vertex, in rotational order.
  incoming: Vec<HalfedgeId>,
  /// The half-edge leaving this vertex in each direction, if any.
  outgoing: [Option<HalfedgeId>; Dir::COUNT],
}

impl Vertex {
  pub fn id(&self) -> VertexId {
    self.id
  }

  pub fn y(&self) -> usize {
    self.y
  }

  pub fn x(&self) -> usize {
    self.x
  }

  /// The half-edges whose destination is this vertex, in rotational order.
  pub fn incoming(&self) -> &[HalfedgeId] {
    &self.incoming
  }

  /// The half-edge leaving this vertex in the given direction; absent at the
  /// grid's boundary.
  pub fn outgoing(&self, dir: Dir) -> Option<HalfedgeId> {
    self.outgoing[dir.index()]
  }

  /// How many edges meet here: 2 at a corner, 3 on a side, 4 inside.
  pub fn degree(&self) -> usize {
    self.incoming.len()
  }
}

/// One direction of travel along a lattice segment.
#[derive(Clone, Debug)]
pub struct Halfedge {
  id: HalfedgeId,
  edge: EdgeId,
  dir: Dir,
  twin: HalfedgeId,
  next: HalfedgeId,
  prev: HalfedgeId,
  vert: VertexId,
  cell: CellId,
  cw: HalfedgeId,
  ccw: HalfedgeId,
}

impl Halfedge {
  pub fn id(&self) -> HalfedgeId {
    self.id
  }

  /// The undirected edge this half-edge belongs to.
  pub fn edge(&self) -> EdgeId {
    self.edge
  }

  /// The direction of travel.
  pub fn dir(&self) -> Dir {
    self.dir
  }

  /// The same segment, traveled the other way.
  pub fn twin(&self) -> HalfedgeId {
    self.twin
  }

  /// The following half-edge around the cell on the left.
  pub fn next(&self) -> HalfedgeId {
    self.next
  }

  /// The preceding half-edge around the cell on the left.
  pub fn prev(&self) -> HalfedgeId {
    self.prev
  }

  /// The destination vertex.
  pub fn vert(&self) -> VertexId {
    self.vert
  }

  /// The cell on the left.
  pub fn cell(&self) -> CellId {
    self.cell
  }

  /// The next incoming half-edge in the rotation around the destination:
  /// `next.twin`.
  pub fn cw(&self) -> HalfedgeId {
    self.cw
  }

  /// The previous incoming half-edge in the rotation around the destination:
  /// `twin.prev`.
  pub fn ccw(&self) -> HalfedgeId {
    self.ccw
  }
}

/// A lattice segment.
#[derive(Clone, Debug)]
pub struct Edge {
  id: EdgeId,
  halfedges: [HalfedgeId; 2],
  orientation: Orientation,
}

impl Edge {
  pub fn id(&self) -> EdgeId {
    self.id
  }

  /// Both half-edges.  The first runs rightward or downward.
  pub fn halfedges(&self) -> [HalfedgeId; 2] {
    self.halfedges
  }

  pub fn orientation(&self) -> Orientation {
    self.orientation
  }
}

/// A face of the mesh: one square of the grid, or the outside.
#[derive(Clone, Debug)]
pub struct Cell {
  id: CellId,
  position: Option<(usize, usize)>,
  /// The half-edges with this cell on their left, in cycle order.
  incident: Vec<HalfedgeId>,
}

impl Cell {
  pub fn id(&self) -> CellId {
    self.id
  }

  /// The cell's row and column, or None for the outside.
  pub fn position(&self) -> Option<(usize, usize)> {
    self.position
  }

  /// Tells whether this is the unbounded cell surrounding the grid.
  pub fn is_outside(&self) -> bool {
    self.position.is_none()
  }

  /// The half-edges around this cell, counter-clockwise as drawn.  Interior
  /// cells list their right, top, left and bottom sides in that order.
  pub fn incident(&self) -> &[HalfedgeId] {
    &self.incident
  }

  /// The number of sides.
  pub fn degree(&self) -> usize {
    self.incident.len()
  }
}

/// The half-edge mesh for a rectangular grid.
#[derive(Clone, Debug)]
pub struct Grid {
  height: usize,
  width: usize,
  vertices: Vec<Vertex>,
  halfedges: Vec<Halfedge>,
  edges: Vec<Edge>,
  cells: Vec<Cell>,
}

/// A placeholder for links the second pass fills in.
const UNLINKED: HalfedgeId = HalfedgeId::new(usize::MAX);

impl Grid {
  /// The outside cell's id, the same for every grid.
  pub const OUTSIDE: CellId = CellId::new(0);

  /// Builds the mesh for a grid of `height` rows and `width` columns of
  /// cells.
  ///
  /// ## Panics
  ///
  /// Panics if either dimension is zero.
  pub fn new(height: usize, width: usize) -> Grid {
    assert!(height > 0 && width > 0, "empty {}x{} grid", height, width);
    let mut grid = Grid {
      height,
      width,
      vertices: Vec::with_capacity((height + 1) * (width + 1)),
      halfedges: Vec::new(),
      edges: Vec::new(),
      cells: Vec::with_capacity(height * width + 1),
    };
    grid.allocate();
    grid.link_twins_and_cycles();
    grid.link_cells();
    grid.link_vertices();
    grid
  }

  /// First pass: makes every entity, with the links known from position
  /// alone.
  fn allocate(&mut self) {
    let (h, w) = (self.height, self.width);
    for y in 0..=h {
      for x in 0..=w {
        self.vertices.push(Vertex {
          id: VertexId::new(self.vertices.len()),
          y,
          x,
          incoming: Vec::with_capacity(4),
          outgoing: [None; Dir::COUNT],
        });
      }
    }
    self.cells.push(Cell {
      id: Self::OUTSIDE,
      position: None,
      incident: Vec::with_capacity(2 * (h + w)),
    });
    for y in 0..h {
      for x in 0..w {
        self.cells.push(Cell {
          id: CellId::new(self.cells.len()),
          position: Some((y, x)),
          incident: Vec::with_capacity(4),
        });
      }
    }
    for y in 0..=h {
      for x in 0..w {
        self.add_edge(y, x, Dir::Right);
      }
    }
    for y in 0..h {
      for x in 0..=w {
        self.add_edge(y, x, Dir::Down);
      }
    }
  }

  /// Adds the edge from vertex `(y, x)` one step in `dir`, which must be
  /// rightward or downward, along with its two half-edges.
  fn add_edge(&mut self, y: usize, x: usize, dir: Dir) {
    let (dy, dx) = dir.delta();
    let (y2, x2) = ((y as isize + dy) as usize, (x as isize + dx) as usize);
    let from = self.vertex_index(y, x);
    let to = self.vertex_index(y2, x2);
    let edge = EdgeId::new(self.edges.len());
    let forward = HalfedgeId::new(self.halfedges.len());
    let backward = HalfedgeId::new(forward.index() + 1);
    self.edges.push(Edge {
      id: edge,
      halfedges: [forward, backward],
      orientation: dir.orientation(),
    });
    for (id, dir, origin, dest) in [(forward, dir, from, to), (backward, dir.opposite(), to, from)] {
      self.halfedges.push(Halfedge {
        id,
        edge,
        dir,
        twin: UNLINKED,
        next: UNLINKED,
        prev: UNLINKED,
        vert: dest,
        cell: Self::OUTSIDE,
        cw: UNLINKED,
        ccw: UNLINKED,
      });
      self.vertices[origin.index()].outgoing[dir.index()] = Some(id);
    }
  }

  /// Second pass, part one: twins, and the `next`/`prev` cycles around every
  /// cell.  Walking a cell counter-clockwise means turning as far left as
  /// the lattice allows at each vertex; only the outside cell ever has to go
  /// straight or turn right.
  fn link_twins_and_cycles(&mut self) {
    for i in 0..self.halfedges.len() {
      self.halfedges[i].twin = HalfedgeId::new(i ^ 1);
    }
    for i in 0..self.halfedges.len() {
      let h = &self.halfedges[i];
      let dest = &self.vertices[h.vert.index()];
      let dir = h.dir;
      let next = [dir.left(), dir, dir.right()]
        .into_iter()
        .find_map(|d| dest.outgoing(d))
        .expect("every vertex has at least two edges");
      self.halfedges[i].next = next;
      self.halfedges[next.index()].prev = HalfedgeId::new(i);
    }
  }

  /// Second pass, part two: walks each cell's cycle once to record its
  /// incident half-edges.
  fn link_cells(&mut self) {
    for c in 0..self.cells.len() {
      let start = match self.cells[c].position {
        // The top of the top left cell, traveling right, has the outside on
        // its left.
        None => self.vertex(self.vertex_index(0, 0)).outgoing(Dir::Right),
        // The right side, traveling up.
        Some((y, x)) => self.vertex(self.vertex_index(y + 1, x + 1)).outgoing(Dir::Up),
      }
      .expect("cycle start exists");
      let mut h = start;
      loop {
        self.halfedges[h.index()].cell = CellId::new(c);
        self.cells[c].incident.push(h);
        h = self.halfedges[h.index()].next;
        if h == start {
          break;
        }
      }
    }
  }

  /// Second pass, part three: walks the rotation of half-edges around each
  /// vertex to record its incoming half-edges.
  fn link_vertices(&mut self) {
    for v in 0..self.vertices.len() {
      let start = Dir::all()
        .find_map(|d| self.vertices[v].outgoing(d))
        .map(|h| self.halfedges[h.index()].twin)
        .expect("every vertex has an edge");
      let mut h = start;
      loop {
        let cw = self.halfedges[self.halfedges[h.index()].next.index()].twin;
        let ccw = self.halfedges[self.halfedges[h.index()].twin.index()].prev;
        let halfedge = &mut self.halfedges[h.index()];
        halfedge.cw = cw;
        halfedge.ccw = ccw;
        self.vertices[v].incoming.push(h);
        h = cw;
        if h == start {
          break;
        }
      }
    }
  }

  fn vertex_index(&self, y: usize, x: usize) -> VertexId {
    VertexId::new(y * (self.width + 1) + x)
  }

  /// Number of rows of cells.
  pub fn height(&self) -> usize {
    self.height
  }

  /// Number of columns of cells.
  pub fn width(&self) -> usize {
    self.width
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  pub fn halfedges(&self) -> &[Halfedge] {
    &self.halfedges
  }

  pub fn edges(&self) -> &[Edge] {
    &self.edges
  }

  /// All cells, starting with the outside.
  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  pub fn vertex(&self, id: VertexId) -> &Vertex {
    &self.vertices[id.index()]
  }

  pub fn halfedge(&self, id: HalfedgeId) -> &Halfedge {
    &self.halfedges[id.index()]
  }

  pub fn edge(&self, id: EdgeId) -> &Edge {
    &self.edges[id.index()]
  }

  pub fn cell(&self, id: CellId) -> &Cell {
    &self.cells[id.index()]
  }

  /// The vertex at `(y, x)`, if it's on the lattice.
  pub fn vertex_at(&self, y: usize, x: usize) -> Option<VertexId> {
    if y <= self.height && x <= self.width {
      Some(self.vertex_index(y, x))
    } else {
      None
    }
  }

  /// The cell at row `y` and column `x`.  Squares beyond the grid's bounds
  /// are all part of the outside cell.
  pub fn cell_at(&self, y: isize, x: isize) -> CellId {
    if y >= 0 && x >= 0 && (y as usize) < self.height && (x as usize) < self.width {
      CellId::new(1 + y as usize * self.width + x as usize)
    } else {
      Self::OUTSIDE
    }
  }

  /// The cell on the left of `h`.
  pub fn cell_of(&self, h: HalfedgeId) -> CellId {
    self.halfedge(h).cell
  }

  /// The cell on the right of `h`.
  pub fn right(&self, h: HalfedgeId) -> CellId {
    self.cell_of(self.halfedge(h).twin)
  }

  /// The vertex `h` starts from.
  pub fn orig(&self, h: HalfedgeId) -> VertexId {
    self.halfedge(self.halfedge(h).twin).vert
  }

  /// The half-edge that continues `h` in a straight line past its
  /// destination, if the lattice goes on that far.
  pub fn straight(&self, h: HalfedgeId) -> Option<HalfedgeId> {
    let h = self.halfedge(h);
    self.vertex(h.vert).outgoing(h.dir)
  }

  /// The half-edge arriving at `v` while traveling in `dir`, if any.
  pub fn incoming(&self, v: VertexId, dir: Dir) -> Option<HalfedgeId> {
    self
      .vertex(v)
      .outgoing(dir.opposite())
      .map(|h| self.halfedge(h).twin)
  }

  /// The four cells touching vertex `v`, clockwise from the top left: NW,
  /// NE, SE, SW.  Several may be the outside.
  pub fn quadrants(&self, v: VertexId) -> [CellId; 4] {
    let v = self.vertex(v);
    let (y, x) = (v.y as isize, v.x as isize);
    [
      self.cell_at(y - 1, x - 1),
      self.cell_at(y - 1, x),
      self.cell_at(y, x),
      self.cell_at(y, x - 1),
    ]
  }

  /// Every vertex, edge and interior cell, positioned on the doubled
  /// lattice: vertices at even rows and columns, cells at odd ones, and
  /// edges in between.  Renderers lay out text this way.
  pub fn layout(&self) -> Vec<(usize, usize, Element)> {
    let mut layout = Vec::with_capacity(self.vertices.len() + self.edges.len() + self.cells.len());
    for v in &self.vertices {
      layout.push((2 * v.y, 2 * v.x, Element::Vertex(v.id)));
    }
    for e in &self.edges {
      let a = self.vertex(self.halfedge(e.halfedges[0]).vert);
      let b = self.vertex(self.halfedge(e.halfedges[1]).vert);
      layout.push((a.y + b.y, a.x + b.x, Element::Edge(e.id)));
    }
    for c in &self.cells {
      if let Some((y, x)) = c.position {
        layout.push((2 * y + 1, 2 * x + 1, Element::Cell(c.id)));
      }
    }
    layout.sort_by_key(|&(y, x, _)| (y, x));
    layout
  }

  /// A human-readable name for an element, for diagnostics.
  pub fn describe(&self, element: Element) -> String {
    match element {
      Element::Vertex(v) => {
        let v = self.vertex(v);
        format!("vertex ({}, {})", v.y, v.x)
      }
      Element::Halfedge(h) => {
        let origin = self.vertex(self.orig(h));
        format!(
          "half-edge ({}, {}) {:?}",
          origin.y,
          origin.x,
          self.halfedge(h).dir
        )
      }
      Element::Edge(e) => self.describe(Element::Halfedge(self.edge(e).halfedges[0])),
      Element::Cell(c) => match self.cell(c).position {
        Some((y, x)) => format!("cell ({}, {})", y, x),
        None => "outside".to_string(),
      },
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use paste::paste;

  macro_rules! count_test {
    ($h:literal, $w:literal) => {
      paste! {
        #[test]
        fn [<counts_ $h x $w>]() {
          let g = Grid::new($h, $w);
          assert_eq!(($h + 1) * ($w + 1), g.vertices().len());
          assert_eq!($h * $w + 1, g.cells().len());
          assert_eq!($h * ($w + 1) + $w * ($h + 1), g.edges().len());
          assert_eq!(2 * g.edges().len(), g.halfedges().len());
        }
      }
    };
  }

  count_test!(1, 1);
  count_test!(2, 2);
  count_test!(3, 3);
  count_test!(2, 5);
  count_test!(7, 3);

  #[test]
  fn twins_pair_up() {
    let g = Grid::new(3, 4);
    for h in g.halfedges() {
      let twin = g.halfedge(h.twin());
      assert_eq!(h.id(), twin.twin());
      assert_eq!(h.edge(), twin.edge());
      assert_eq!(h.dir().opposite(), twin.dir());
      assert_eq!(g.orig(h.id()), twin.vert());
      assert_ne!(h.cell(), twin.cell());
    }
  }

  #[test]
  fn cells_are_closed_cycles() {
    let g = Grid::new(3, 4);
    for c in g.cells() {
      let expected = if c.is_outside() { 2 * (3 + 4) } else { 4 };
      assert_eq!(expected, c.degree());
      for (i, &h) in c.incident().iter().enumerate() {
        let he = g.halfedge(h);
        assert_eq!(c.id(), he.cell());
        assert_eq!(c.incident()[(i + 1) % c.degree()], he.next());
        assert_eq!(h, g.halfedge(he.next()).prev());
        assert_eq!(he.vert(), g.orig(he.next()));
      }
    }
  }

  #[test]
  fn interior_cells_run_counter_clockwise() {
    let g = Grid::new(2, 2);
    let c = g.cell(g.cell_at(1, 0));
    let dirs: Vec<_> = c.incident().iter().map(|&h| g.halfedge(h).dir()).collect();
    assert_eq!(vec![Dir::Up, Dir::Left, Dir::Down, Dir::Right], dirs);
    assert_eq!(Some((1, 0)), c.position());
  }

  #[test]
  fn every_halfedge_borders_the_right_cell() {
    let g = Grid::new(3, 2);
    for h in g.halfedges() {
      let origin = g.vertex(g.orig(h.id()));
      let (y, x) = (origin.y() as isize, origin.x() as isize);
      let expected = match h.dir() {
        Dir::Right => g.cell_at(y - 1, x),
        Dir::Left => g.cell_at(y, x - 1),
        Dir::Down => g.cell_at(y, x),
        Dir::Up => g.cell_at(y - 1, x - 1),
      };
      assert_eq!(expected, h.cell(), "{}", g.describe(Element::Halfedge(h.id())));
    }
  }

  #[test]
  fn vertex_rotations() {
    let g = Grid::new(3, 3);
    for v in g.vertices() {
      let on_row_edge = v.y() == 0 || v.y() == 3;
      let on_col_edge = v.x() == 0 || v.x() == 3;
      let expected = 4 - on_row_edge as usize - on_col_edge as usize;
      assert_eq!(expected, v.degree());
      for (i, &h) in v.incoming().iter().enumerate() {
        let he = g.halfedge(h);
        assert_eq!(v.id(), he.vert());
        assert_eq!(v.incoming()[(i + 1) % v.degree()], he.cw());
        assert_eq!(h, g.halfedge(he.cw()).ccw());
      }
    }
  }

  #[test]
  fn straight_lines() {
    let g = Grid::new(2, 3);
    let mut h = g.vertex(g.vertex_at(1, 0).unwrap()).outgoing(Dir::Right).unwrap();
    let mut steps = 1;
    while let Some(next) = g.straight(h) {
      assert_eq!(Dir::Right, g.halfedge(next).dir());
      h = next;
      steps += 1;
    }
    assert_eq!(3, steps);
    assert_eq!(g.vertex_at(1, 3), Some(g.halfedge(h).vert()));
  }

  #[test]
  fn incoming_by_direction() {
    let g = Grid::new(2, 2);
    let v = g.vertex_at(0, 1).unwrap();
    for dir in [Dir::Right, Dir::Left, Dir::Up] {
      let h = g.incoming(v, dir).unwrap();
      assert_eq!(dir, g.halfedge(h).dir());
      assert_eq!(v, g.halfedge(h).vert());
      assert!(g.vertex(v).incoming().contains(&h));
    }
    assert_eq!(None, g.incoming(v, Dir::Down));
  }

  #[test]
  fn quadrants_around_a_corner() {
    let g = Grid::new(2, 2);
    let corner = g.vertex_at(0, 0).unwrap();
    assert_eq!(
      [Grid::OUTSIDE, Grid::OUTSIDE, g.cell_at(0, 0), Grid::OUTSIDE],
      g.quadrants(corner)
    );
    let center = g.vertex_at(1, 1).unwrap();
    assert_eq!(
      [g.cell_at(0, 0), g.cell_at(0, 1), g.cell_at(1, 1), g.cell_at(1, 0)],
      g.quadrants(center)
    );
  }

  #[test]
  fn layout_covers_the_doubled_lattice() {
    let g = Grid::new(2, 3);
    let layout = g.layout();
    assert_eq!(5 * 7, layout.len());
    for (y, x, element) in layout {
      match element {
        Element::Vertex(_) => assert!(y % 2 == 0 && x % 2 == 0),
        Element::Cell(c) => {
          assert!(y % 2 == 1 && x % 2 == 1);
          assert_eq!(Some((y / 2, x / 2)), g.cell(c).position());
        }
        Element::Edge(e) => {
          assert_eq!(1, (y + x) % 2);
          let expected = if y % 2 == 0 {
            Orientation::Horizontal
          } else {
            Orientation::Vertical
          };
          assert_eq!(expected, g.edge(e).orientation());
        }
        Element::Halfedge(_) => panic!("half-edges aren't laid out"),
      }
    }
  }
}
