/// Maze grid and generator.
///
/// ## Carve (randomized depth-first backtracking)
///
///   1. Start with every wall present, mark (0,0) visited, push it.
///   2. Look at the top of the stack. Collect unvisited neighbors in
///      the order up, right, down, left.
///   3. If any: pick one uniformly, remove the shared wall on both
///      sides, mark it visited, push it.
///   4. Otherwise pop (backtrack).
///   5. Stop when the stack is empty.
///
/// Every cell is visited exactly once and each visit opens exactly one
/// wall pair, so the result is a spanning tree: N²−1 passages, connected,
/// acyclic.
///
/// ## Post-processing
///
/// All mutations go through `remove_wall()` / `add_wall()`, which keep
/// both sides of a wall in sync. `add_loops()` only removes walls (can
/// only add cycles). `seal()` is the one operation that can cut the start
/// off; it returns what it closed so `reopen()` can undo it exactly.

use std::collections::VecDeque;

use log::debug;
use rand::Rng;

use super::cell::{Cell, Direction, Pos};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Maze {
    size: usize,
    /// `cells[y][x]`
    cells: Vec<Vec<Cell>>,
}

impl Maze {
    /// Grid with every wall present.
    pub fn closed(size: usize) -> Self {
        let cells = (0..size)
            .map(|y| (0..size).map(|x| Cell::closed(x, y)).collect())
            .collect();
        Maze { size, cells }
    }

    /// Carve a perfect maze of `size`×`size` cells starting from (0,0).
    pub fn generate<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Self {
        let mut maze = Maze::closed(size);
        if size == 0 {
            return maze;
        }

        let mut stack: Vec<Pos> = Vec::with_capacity(size * size);
        let start = Pos::new(0, 0);
        maze.cell_mut(start).visited = true;
        stack.push(start);

        let mut carved = 0usize;
        let mut max_depth = 1usize;

        while let Some(&current) = stack.last() {
            let candidates: Vec<(Pos, Direction)> = Direction::ALL
                .iter()
                .filter_map(|&dir| dir.step(current, size).map(|next| (next, dir)))
                .filter(|(next, _)| !maze.cell(*next).visited)
                .collect();

            if candidates.is_empty() {
                stack.pop();
                continue;
            }

            let (next, dir) = candidates[rng.gen_range(0..candidates.len())];
            maze.remove_wall(current, dir);
            maze.cell_mut(next).visited = true;
            stack.push(next);
            carved += 1;
            max_depth = max_depth.max(stack.len());
        }

        debug!("carved {size}x{size} maze: {carved} passages, max stack depth {max_depth}");
        maze
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x < self.size && pos.y < self.size
    }

    /// Panics on out-of-bounds positions; callers check `in_bounds` first.
    #[inline]
    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.y][pos.x]
    }

    #[inline]
    fn cell_mut(&mut self, pos: Pos) -> &mut Cell {
        &mut self.cells[pos.y][pos.x]
    }

    /// Is there a wall on the `dir` side of `pos`?
    /// Out of bounds counts as walled.
    #[inline]
    pub fn has_wall(&self, pos: Pos, dir: Direction) -> bool {
        if !self.in_bounds(pos) {
            return true;
        }
        self.cell(pos).has_wall(dir)
    }

    /// Open the wall between `pos` and its neighbor in `dir`.
    /// Returns false (and changes nothing) on the outer boundary.
    pub fn remove_wall(&mut self, pos: Pos, dir: Direction) -> bool {
        self.set_wall(pos, dir, false)
    }

    /// Close the wall between `pos` and its neighbor in `dir`.
    pub fn add_wall(&mut self, pos: Pos, dir: Direction) -> bool {
        self.set_wall(pos, dir, true)
    }

    fn set_wall(&mut self, pos: Pos, dir: Direction, present: bool) -> bool {
        if !self.in_bounds(pos) {
            return false;
        }
        let Some(next) = dir.step(pos, self.size) else { return false };
        self.cell_mut(pos).walls.set(dir, present);
        self.cell_mut(next).walls.set(dir.opposite(), present);
        true
    }

    /// Number of open wall pairs between neighboring cells.
    pub fn open_passages(&self) -> usize {
        let mut count = 0;
        for row in &self.cells {
            for cell in row {
                if cell.pos.x + 1 < self.size && !cell.walls.right { count += 1; }
                if cell.pos.y + 1 < self.size && !cell.walls.bottom { count += 1; }
            }
        }
        count
    }

    /// Number of cells reachable from `start` through open walls (BFS).
    pub fn reachable_from(&self, start: Pos) -> usize {
        if !self.in_bounds(start) {
            return 0;
        }
        let mut seen = vec![vec![false; self.size]; self.size];
        let mut queue = VecDeque::new();
        seen[start.y][start.x] = true;
        queue.push_back(start);
        let mut count = 0;

        while let Some(pos) = queue.pop_front() {
            count += 1;
            for dir in Direction::ALL {
                if self.has_wall(pos, dir) { continue; }
                if let Some(next) = dir.step(pos, self.size) {
                    if !seen[next.y][next.x] {
                        seen[next.y][next.x] = true;
                        queue.push_back(next);
                    }
                }
            }
        }
        count
    }

    /// Does every cell connect back to `start`?
    pub fn is_connected_from(&self, start: Pos) -> bool {
        self.reachable_from(start) == self.size * self.size
    }

    /// Knock out `attempts` random right/bottom walls to create cycles.
    /// Walls already open are picked too, so fewer than `attempts`
    /// cycles may result. Returns the number of walls actually opened.
    pub fn add_loops<R: Rng + ?Sized>(&mut self, attempts: usize, rng: &mut R) -> usize {
        if self.size < 2 {
            return 0;
        }
        let mut opened = 0;
        for _ in 0..attempts {
            let pos = Pos::new(rng.gen_range(0..self.size - 1), rng.gen_range(0..self.size - 1));
            let dir = if rng.gen_bool(0.5) { Direction::Right } else { Direction::Down };
            if self.has_wall(pos, dir) && self.remove_wall(pos, dir) {
                opened += 1;
            }
        }
        debug!("add_loops: {opened}/{attempts} walls opened");
        opened
    }

    /// Close every open side of `pos`. Returns the directions closed.
    pub fn seal(&mut self, pos: Pos) -> Vec<Direction> {
        if !self.in_bounds(pos) {
            return vec![];
        }
        let open: Vec<Direction> = Direction::ALL
            .iter()
            .copied()
            .filter(|&d| !self.has_wall(pos, d))
            .collect();
        for &dir in &open {
            self.add_wall(pos, dir);
        }
        open
    }

    /// Undo a `seal()`.
    pub fn reopen(&mut self, pos: Pos, dirs: &[Direction]) {
        for &dir in dirs {
            self.remove_wall(pos, dir);
        }
    }

    /// ASCII drawing: `+` corners, `-` horizontal walls, `|` vertical walls.
    /// `(2N+1)` rows of `(2N+1)` characters.
    pub fn to_diagram(&self) -> Vec<String> {
        let n = self.size;
        let mut rows = Vec::with_capacity(2 * n + 1);

        let mut top = String::from("+");
        for x in 0..n {
            top.push(if self.cells[0][x].walls.top { '-' } else { ' ' });
            top.push('+');
        }
        rows.push(top);

        for y in 0..n {
            let mut mid = String::new();
            mid.push(if self.cells[y][0].walls.left { '|' } else { ' ' });
            let mut bottom = String::from("+");
            for x in 0..n {
                let walls = self.cells[y][x].walls;
                mid.push(' ');
                mid.push(if walls.right { '|' } else { ' ' });
                bottom.push(if walls.bottom { '-' } else { ' ' });
                bottom.push('+');
            }
            rows.push(mid);
            rows.push(bottom);
        }
        rows
    }

    /// Parse the format produced by `to_diagram()`.
    /// Outer borders are always walled, whatever the diagram says.
    #[cfg(test)]
    pub fn from_diagram(rows: &[&str]) -> Self {
        let n = (rows.len() - 1) / 2;
        let mut maze = Maze::closed(n);
        for y in 0..n {
            let mid: Vec<char> = rows[2 * y + 1].chars().collect();
            let below: Vec<char> = rows[2 * y + 2].chars().collect();
            for x in 0..n {
                let pos = Pos::new(x, y);
                if x + 1 < n && mid.get(2 * x + 2) == Some(&' ') {
                    maze.remove_wall(pos, Direction::Right);
                }
                if y + 1 < n && below.get(2 * x + 1) == Some(&' ') {
                    maze.remove_wall(pos, Direction::Down);
                }
            }
        }
        maze
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn has_cycle(maze: &Maze) -> bool {
        // A connected graph on V vertices is a tree iff it has V-1 edges.
        maze.open_passages() >= maze.size() * maze.size()
    }

    #[test]
    fn carve_is_spanning_tree() {
        for seed in 0..25u64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let maze = Maze::generate(15, &mut rng);
            assert_eq!(maze.open_passages(), 15 * 15 - 1, "seed {seed}");
            assert!(maze.is_connected_from(Pos::new(0, 0)), "seed {seed}");
            assert!(!has_cycle(&maze));
        }
    }

    #[test]
    fn carve_small_and_odd_sizes() {
        let mut rng = StdRng::seed_from_u64(7);
        for n in 1..=9 {
            let maze = Maze::generate(n, &mut rng);
            assert_eq!(maze.open_passages(), n * n - 1);
            assert!(maze.is_connected_from(Pos::new(0, 0)));
        }
    }

    #[test]
    fn carve_marks_every_cell_visited() {
        let mut rng = StdRng::seed_from_u64(3);
        let maze = Maze::generate(8, &mut rng);
        for y in 0..8 {
            for x in 0..8 {
                assert!(maze.cell(Pos::new(x, y)).visited);
            }
        }
    }

    #[test]
    fn outer_boundary_stays_walled() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut maze = Maze::generate(10, &mut rng);
        maze.add_loops(50, &mut rng);
        for i in 0..10 {
            assert!(maze.has_wall(Pos::new(i, 0), Direction::Up));
            assert!(maze.has_wall(Pos::new(i, 9), Direction::Down));
            assert!(maze.has_wall(Pos::new(0, i), Direction::Left));
            assert!(maze.has_wall(Pos::new(9, i), Direction::Right));
        }
    }

    #[test]
    fn same_seed_same_maze() {
        let a = Maze::generate(15, &mut StdRng::seed_from_u64(42));
        let b = Maze::generate(15, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn walls_are_symmetric() {
        let mut rng = StdRng::seed_from_u64(5);
        let maze = Maze::generate(12, &mut rng);
        for y in 0..12 {
            for x in 0..12 {
                let pos = Pos::new(x, y);
                for dir in Direction::ALL {
                    if let Some(next) = dir.step(pos, 12) {
                        assert_eq!(maze.has_wall(pos, dir), maze.has_wall(next, dir.opposite()));
                    }
                }
            }
        }
    }

    #[test]
    fn add_loops_keeps_connectivity_and_adds_cycles() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut maze = Maze::generate(15, &mut rng);
        let opened = maze.add_loops(30, &mut rng);
        assert!(opened > 0);
        assert_eq!(maze.open_passages(), 15 * 15 - 1 + opened);
        assert!(maze.is_connected_from(Pos::new(0, 0)));
        assert!(has_cycle(&maze));
    }

    #[test]
    fn seal_and_reopen_start() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut maze = Maze::generate(15, &mut rng);
        let before = maze.clone();
        let start = Pos::new(0, 0);

        let sealed = maze.seal(start);
        assert!(!sealed.is_empty());
        assert_eq!(maze.reachable_from(start), 1);
        assert_eq!(maze.cell(start).walls.openings(), 0);

        maze.reopen(start, &sealed);
        assert_eq!(maze, before);
        assert!(maze.is_connected_from(start));
    }

    #[test]
    fn remove_wall_on_boundary_is_noop() {
        let mut maze = Maze::closed(3);
        assert!(!maze.remove_wall(Pos::new(0, 0), Direction::Up));
        assert!(!maze.remove_wall(Pos::new(2, 1), Direction::Right));
        assert!(!maze.remove_wall(Pos::new(5, 5), Direction::Left));
        assert_eq!(maze.open_passages(), 0);
    }

    #[test]
    fn diagram_round_trip() {
        let rows = [
            "+-+-+-+",
            "|     |",
            "+-+-+ +",
            "|   | |",
            "+ +-+ +",
            "|     |",
            "+-+-+-+",
        ];
        let maze = Maze::from_diagram(&rows);
        assert_eq!(maze.size(), 3);
        assert!(!maze.has_wall(Pos::new(0, 0), Direction::Right));
        assert!(maze.has_wall(Pos::new(0, 0), Direction::Down));
        assert!(!maze.has_wall(Pos::new(2, 0), Direction::Down));
        assert!(maze.has_wall(Pos::new(1, 1), Direction::Right));
        assert_eq!(maze.open_passages(), 8);
        assert!(maze.is_connected_from(Pos::new(0, 0)));

        let drawn = maze.to_diagram();
        let drawn: Vec<&str> = drawn.iter().map(|s| s.as_str()).collect();
        assert_eq!(drawn, rows);
    }
}
