// Star board geometry.
//
// The 121 holes of a Sternhalma star are the union of two 13-row triangles on
// a 17×17 axial grid:
//
//   T_a = { y >= 4, x <= 12, y - x <= 4 }   tips (0,4), (12,4), (12,16)
//   T_b = { y <= 12, x >= 4, x - y <= 4 }   tips (4,0), (16,12), (4,12)
//
// Their intersection is the central hexagon (61 holes); each of the six star
// points ("arms") holds 10 holes. Arms are numbered by `Corner`, going round
// the star:
//
//   0 → tip (0,4)    1 → tip (4,12)   2 → tip (12,16)
//   3 → tip (16,12)  4 → tip (12,4)   5 → tip (4,0)
//
// Neighbours are the six lattice directions listed in `NEIGHBOR_OFFSETS`;
// every triangle edge runs along one of them.

use halma_protocol::{Corner, Position};

pub const GRID_SIZE: i32 = 17;

pub const NEIGHBOR_OFFSETS: [(i32, i32); 6] = [(1, 0), (-1, 0), (0, 1), (0, -1), (1, 1), (-1, -1)];

pub const HOLES_PER_ARM: usize = 10;

const TIPS: [Position; 6] = [
    Position::new(0, 4),
    Position::new(4, 12),
    Position::new(12, 16),
    Position::new(16, 12),
    Position::new(12, 4),
    Position::new(4, 0),
];

pub fn is_on_board(p: Position) -> bool {
    let in_a = p.y >= 4 && p.x <= 12 && p.y - p.x <= 4;
    let in_b = p.y <= 12 && p.x >= 4 && p.x - p.y <= 4;
    in_a || in_b
}

/// The arm `p` lies in, or `None` for the central hexagon and off-board
/// positions.
pub fn arm_of(p: Position) -> Option<Corner> {
    if !is_on_board(p) {
        return None;
    }
    let arm = if p.x < 4 {
        0
    } else if p.y > 12 {
        2
    } else if p.x > 12 {
        3
    } else if p.y < 4 {
        5
    } else if p.x - p.y > 4 {
        4
    } else if p.y - p.x > 4 {
        1
    } else {
        return None;
    };
    Some(Corner(arm))
}

/// The outermost hole of an arm.
pub fn tip(corner: Corner) -> Position {
    TIPS[corner.index() % TIPS.len()]
}

/// All holes in row-major order (`y`, then `x`).
pub fn all_positions() -> impl Iterator<Item = Position> {
    (0..GRID_SIZE)
        .flat_map(|y| (0..GRID_SIZE).map(move |x| Position::new(x, y)))
        .filter(|p| is_on_board(*p))
}

/// The ten holes of an arm, row-major.
pub fn arm(corner: Corner) -> Vec<Position> {
    all_positions()
        .filter(|p| arm_of(*p) == Some(corner))
        .collect()
}

pub fn neighbors(p: Position) -> impl Iterator<Item = Position> {
    NEIGHBOR_OFFSETS
        .iter()
        .map(move |(dx, dy)| p.offset(*dx, *dy))
        .filter(|n| is_on_board(*n))
}
