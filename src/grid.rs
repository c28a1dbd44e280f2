//! Static grid workspace: bounds, obstacles, neighbor enumeration and the
//! Manhattan-distance heuristic.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::path::Position;

/// A static, immutable 2D 4-connected grid with a fixed obstacle set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    obstacles: HashSet<Position>,
}

/// On-the-wire shape for [`Grid`], matching the serialization contract of
/// §4.1/§6: obstacles sorted ascending lexicographically for stability.
#[derive(Debug, Serialize, Deserialize)]
struct GridDto {
    width: usize,
    height: usize,
    obstacles: Vec<[usize; 2]>,
}

impl Grid {
    /// Builds a grid from an explicit obstacle set. Obstacles outside the
    /// rectangle are rejected — they could never affect `passable`/
    /// `in_bounds` and their presence most likely signals a caller bug.
    pub fn new(width: usize, height: usize, obstacles: HashSet<Position>) -> Self {
        for &(x, y) in &obstacles {
            assert!(
                x < width && y < height,
                "obstacle {:?} is outside the {}x{} grid",
                (x, y),
                width,
                height
            );
        }
        Grid {
            width,
            height,
            obstacles,
        }
    }

    /// Builds a grid from a 2D truthy-cell matrix: row-major, `matrix[y][x]`
    /// non-zero/true marks an obstacle. `width` is taken from the first
    /// row's length; an empty matrix yields a 0x0 grid.
    pub fn from_matrix<T>(matrix: &[Vec<T>]) -> Self
    where
        T: Copy + PartialEq + Default,
    {
        let height = matrix.len();
        let width = matrix.first().map_or(0, |row| row.len());
        let zero = T::default();
        let obstacles = matrix
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter()
                    .enumerate()
                    .filter(move |&(_, cell)| *cell != zero)
                    .map(move |(x, _)| (x, y))
            })
            .collect();
        Grid {
            width,
            height,
            obstacles,
        }
    }

    /// Parses the `{width, height, obstacles: [[x,y], ...]}` serialized
    /// form described in §4.1/§6.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let dto: GridDto = serde_json::from_str(json)?;
        let obstacles = dto.obstacles.into_iter().map(|[x, y]| (x, y)).collect();
        Ok(Grid::new(dto.width, dto.height, obstacles))
    }

    /// Writes the `{width, height, obstacles}` serialized form, with
    /// `obstacles` sorted ascending lexicographically for stability.
    pub fn to_json(&self) -> String {
        let mut obstacles: Vec<[usize; 2]> =
            self.obstacles.iter().map(|&(x, y)| [x, y]).collect();
        obstacles.sort_unstable();
        let dto = GridDto {
            width: self.width,
            height: self.height,
            obstacles,
        };
        serde_json::to_string(&dto).expect("GridDto serialization is infallible")
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True iff `p` lies within the grid rectangle.
    pub fn in_bounds(&self, p: Position) -> bool {
        p.0 < self.width && p.1 < self.height
    }

    /// True iff `p` is not an obstacle. Does not check bounds; pair with
    /// [`Grid::in_bounds`] at call sites that need both.
    pub fn passable(&self, p: Position) -> bool {
        !self.obstacles.contains(&p)
    }

    /// 4-neighbors of `p` that are in bounds and passable, in the fixed
    /// emission order (+1,0), (-1,0), (0,+1), (0,-1). This order matters:
    /// it is what makes low-level tie-breaking deterministic.
    pub fn neighbors(&self, p: Position) -> Vec<Position> {
        const DELTAS: [(isize, isize); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
        DELTAS
            .iter()
            .filter_map(|&(dx, dy)| {
                let nx = p.0.checked_add_signed(dx)?;
                let ny = p.1.checked_add_signed(dy)?;
                let next = (nx, ny);
                (self.in_bounds(next) && self.passable(next)).then_some(next)
            })
            .collect()
    }

    /// Manhattan distance between `a` and `b`. Admissible and consistent
    /// for unit-cost 4-connected motion including waits.
    pub fn heuristic(&self, a: Position, b: Position) -> usize {
        a.0.abs_diff(b.0) + a.1.abs_diff(b.1)
    }
}
