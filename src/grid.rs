//! Square maze grid with per-edge wall flags.
//!
//! Walls are shared edges: every mutation goes through [`Grid::set_wall`],
//! which writes both sides of the edge so neighbours never disagree.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    pub fn manhattan(self, other: Pos) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Offset by a signed delta; `None` when it would leave the first quadrant.
    pub fn offset(self, drow: isize, dcol: isize) -> Option<Pos> {
        let row = self.row.checked_add_signed(drow)?;
        let col = self.col.checked_add_signed(dcol)?;
        Some(Pos { row, col })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Right,
    Down,
    Left,
}

impl Dir {
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Right, Dir::Down, Dir::Left];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::Up => (-1, 0),
            Dir::Right => (0, 1),
            Dir::Down => (1, 0),
            Dir::Left => (0, -1),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Right => Dir::Left,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
        }
    }

    /// Slot in wall arrays and [`Dir::ALL`].
    pub fn index(self) -> usize {
        match self {
            Dir::Up => 0,
            Dir::Right => 1,
            Dir::Down => 2,
            Dir::Left => 3,
        }
    }

    /// Direction from `from` to a 4-adjacent `to`.
    pub fn between(from: Pos, to: Pos) -> Option<Dir> {
        Dir::ALL
            .into_iter()
            .find(|dir| from.offset(dir.delta().0, dir.delta().1) == Some(to))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    walls: [bool; 4],
    pub visited: bool,
    pub has_pellet: bool,
}

impl Cell {
    const WALLED: Cell = Cell {
        walls: [true; 4],
        visited: false,
        has_pellet: false,
    };

    pub fn has_wall(&self, dir: Dir) -> bool {
        self.walls[dir.index()]
    }

    pub fn walls(&self) -> [bool; 4] {
        self.walls
    }

    pub fn is_enclosed(&self) -> bool {
        self.walls.iter().all(|&wall| wall)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Every cell starts with all four walls.
    pub fn new(size: usize) -> Self {
        Self {
            size,
            cells: vec![Cell::WALLED; size * size],
        }
    }

    /// Every wall removed, boundary included, and every cell visited.
    pub fn open(size: usize) -> Self {
        let open = Cell {
            walls: [false; 4],
            visited: true,
            has_pellet: false,
        };
        Self {
            size,
            cells: vec![open; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.row < self.size && pos.col < self.size
    }

    pub fn index(&self, pos: Pos) -> usize {
        pos.row * self.size + pos.col
    }

    pub fn pos_at(&self, index: usize) -> Pos {
        Pos::new(index / self.size, index % self.size)
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        if self.in_bounds(pos) {
            self.cells.get(self.index(pos))
        } else {
            None
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.size * self.size).map(|idx| self.pos_at(idx))
    }

    pub fn step(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (drow, dcol) = dir.delta();
        pos.offset(drow, dcol).filter(|next| self.in_bounds(*next))
    }

    /// Out-of-bounds positions read as walled.
    pub fn has_wall(&self, pos: Pos, dir: Dir) -> bool {
        self.cell(pos).map_or(true, |cell| cell.has_wall(dir))
    }

    /// Sets the wall on `dir` of `pos` and the matching wall of the
    /// neighbour across that edge, if any.
    pub fn set_wall(&mut self, pos: Pos, dir: Dir, present: bool) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.cells[idx].walls[dir.index()] = present;
        if let Some(next) = self.step(pos, dir) {
            let nidx = self.index(next);
            self.cells[nidx].walls[dir.opposite().index()] = present;
        }
    }

    /// Clears the wall pair between two 4-adjacent cells. Returns false,
    /// leaving the grid untouched, when they are not adjacent or not both
    /// in bounds.
    pub fn remove_wall(&mut self, a: Pos, b: Pos) -> bool {
        if !self.in_bounds(a) || !self.in_bounds(b) {
            return false;
        }
        match Dir::between(a, b) {
            Some(dir) => {
                self.set_wall(a, dir, false);
                true
            }
            None => false,
        }
    }

    /// Clears the wall on `dir` of `pos` only if a neighbour exists there.
    pub fn remove_wall_towards(&mut self, pos: Pos, dir: Dir) -> bool {
        match self.step(pos, dir) {
            Some(next) if self.in_bounds(pos) => self.remove_wall(pos, next),
            _ => false,
        }
    }

    /// True iff `to` is in bounds, 4-adjacent to `from` and the shared wall
    /// is absent.
    pub fn is_passable(&self, from: Pos, to: Pos) -> bool {
        if !self.in_bounds(from) || !self.in_bounds(to) {
            return false;
        }
        match Dir::between(from, to) {
            Some(dir) => !self.has_wall(from, dir),
            None => false,
        }
    }

    /// All four walls set. Out-of-bounds positions count as enclosed.
    pub fn is_fully_enclosed(&self, pos: Pos) -> bool {
        self.cell(pos).map_or(true, Cell::is_enclosed)
    }

    /// Turns a cell into a solid block, closing the neighbours' shared walls.
    pub fn add_block(&mut self, pos: Pos) {
        for dir in Dir::ALL {
            self.set_wall(pos, dir, true);
        }
    }

    /// Opens every wall of `pos` towards neighbours that are not blocks.
    pub fn clear_around(&mut self, pos: Pos) {
        for dir in Dir::ALL {
            if let Some(next) = self.step(pos, dir) {
                if !self.is_fully_enclosed(next) {
                    self.set_wall(pos, dir, false);
                }
            }
        }
    }

    /// Forces the outward walls of the top-left and bottom-right cells open.
    pub fn open_entrance_and_exit(&mut self) {
        if self.size == 0 {
            return;
        }
        let last = self.size - 1;
        self.set_wall(Pos::new(0, 0), Dir::Left, false);
        self.set_wall(Pos::new(last, last), Dir::Right, false);
    }

    /// Wall state of the edge between two adjacent cells, seen from `a`.
    pub fn wall_towards(&self, a: Pos, b: Pos) -> Option<bool> {
        let dir = Dir::between(a, b)?;
        self.cell(a)?;
        self.cell(b)?;
        Some(self.has_wall(a, dir))
    }

    pub fn open_edge_count(&self) -> usize {
        self.positions()
            .map(|pos| {
                [Dir::Right, Dir::Down]
                    .into_iter()
                    .filter(|&dir| self.step(pos, dir).is_some() && !self.has_wall(pos, dir))
                    .count()
            })
            .sum()
    }

    pub fn walls_are_symmetric(&self) -> bool {
        self.positions().all(|pos| {
            [Dir::Right, Dir::Down].into_iter().all(|dir| match self.step(pos, dir) {
                Some(next) => self.has_wall(pos, dir) == self.has_wall(next, dir.opposite()),
                None => true,
            })
        })
    }

    pub fn mark_visited(&mut self, pos: Pos) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].visited = true;
        }
    }

    pub fn is_visited(&self, pos: Pos) -> bool {
        self.cell(pos).map_or(true, |cell| cell.visited)
    }

    pub fn set_pellet(&mut self, pos: Pos, present: bool) {
        if self.in_bounds(pos) {
            let idx = self.index(pos);
            self.cells[idx].has_pellet = present;
        }
    }

    pub fn clear_pellets(&mut self) {
        for cell in &mut self.cells {
            cell.has_pellet = false;
        }
    }
}
