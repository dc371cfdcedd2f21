/// Grid cells, positions and directions.
/// Wall semantics are centralized here so the generator, the rule
/// engine and the renderer all read walls the same way.

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Pos { x, y }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    /// Neighbor scan order used by the carve algorithm.
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Step one cell from `from` inside an `size`×`size` grid.
    /// None when the step would leave the grid.
    pub fn step(self, from: Pos, size: usize) -> Option<Pos> {
        let (dx, dy) = self.delta();
        let nx = from.x as i64 + dx as i64;
        let ny = from.y as i64 + dy as i64;
        if nx < 0 || ny < 0 || nx >= size as i64 || ny >= size as i64 {
            return None;
        }
        Some(Pos::new(nx as usize, ny as usize))
    }
}

/// The four wall flags of a cell. `true` = wall present.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Walls {
    pub top: bool,
    pub right: bool,
    pub bottom: bool,
    pub left: bool,
}

impl Walls {
    pub const CLOSED: Walls = Walls { top: true, right: true, bottom: true, left: true };

    pub fn get(&self, dir: Direction) -> bool {
        match dir {
            Direction::Up => self.top,
            Direction::Right => self.right,
            Direction::Down => self.bottom,
            Direction::Left => self.left,
        }
    }

    pub fn set(&mut self, dir: Direction, present: bool) {
        match dir {
            Direction::Up => self.top = present,
            Direction::Right => self.right = present,
            Direction::Down => self.bottom = present,
            Direction::Left => self.left = present,
        }
    }

    /// Number of open sides.
    pub fn openings(&self) -> usize {
        Direction::ALL.iter().filter(|d| !self.get(**d)).count()
    }
}

impl Default for Walls {
    fn default() -> Self {
        Walls::CLOSED
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub pos: Pos,
    /// Only meaningful while the carve algorithm runs.
    pub visited: bool,
    pub walls: Walls,
}

impl Cell {
    pub fn closed(x: usize, y: usize) -> Self {
        Cell { pos: Pos::new(x, y), visited: false, walls: Walls::CLOSED }
    }

    #[inline]
    pub fn has_wall(&self, dir: Direction) -> bool {
        self.walls.get(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_stays_inside_grid() {
        let corner = Pos::new(0, 0);
        assert_eq!(Direction::Up.step(corner, 3), None);
        assert_eq!(Direction::Left.step(corner, 3), None);
        assert_eq!(Direction::Right.step(corner, 3), Some(Pos::new(1, 0)));
        assert_eq!(Direction::Down.step(corner, 3), Some(Pos::new(0, 1)));

        let far = Pos::new(2, 2);
        assert_eq!(Direction::Right.step(far, 3), None);
        assert_eq!(Direction::Down.step(far, 3), None);
    }

    #[test]
    fn opposite_is_involution() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
            assert_ne!(d.opposite(), d);
        }
    }

    #[test]
    fn walls_get_set() {
        let mut w = Walls::CLOSED;
        assert_eq!(w.openings(), 0);
        w.set(Direction::Right, false);
        w.set(Direction::Down, false);
        assert!(!w.get(Direction::Right));
        assert!(w.get(Direction::Left));
        assert_eq!(w.openings(), 2);
    }
}
