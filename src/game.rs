//! Game state: arena, falling piece, collision, rotation, row sweeps, scoring and drop speed.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

pub const ARENA_WIDTH: usize = 10;
pub const ARENA_HEIGHT: usize = 20;

/// Points for the first row of a sweep; every further row in the same sweep doubles it.
const ROW_BASE_POINTS: u32 = 100;
/// Score needed per level.
const POINTS_PER_LEVEL: u32 = 500;
const BASE_DROP_INTERVAL_MS: u32 = 800;
const DROP_INTERVAL_STEP_MS: u32 = 80;
const MIN_DROP_INTERVAL_MS: u32 = 150;

/// Arena/shape cell: 0 is empty, 1..=7 is a piece colour id.
pub type Cell = u8;
pub const EMPTY: Cell = 0;

/// Tetromino kinds, in spawn-pool order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    I,
    L,
    J,
    O,
    T,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::L, Self::J, Self::O, Self::T, Self::S, Self::Z];

    /// Colour id written into the arena when this piece locks.
    pub fn color_id(self) -> Cell {
        match self {
            Self::T => 1,
            Self::O => 2,
            Self::L => 3,
            Self::J => 4,
            Self::I => 5,
            Self::S => 6,
            Self::Z => 7,
        }
    }

    /// Spawn orientation.
    pub fn shape(self) -> Shape {
        let mask: &[&[u8]] = match self {
            Self::T => &[&[0, 1, 0], &[1, 1, 1], &[0, 0, 0]],
            Self::O => &[&[1, 1], &[1, 1]],
            Self::L => &[&[0, 1, 0], &[0, 1, 0], &[0, 1, 1]],
            Self::J => &[&[0, 1, 0], &[0, 1, 0], &[1, 1, 0]],
            Self::I => &[&[0, 1, 0, 0], &[0, 1, 0, 0], &[0, 1, 0, 0], &[0, 1, 0, 0]],
            Self::S => &[&[0, 1, 1], &[1, 1, 0], &[0, 0, 0]],
            Self::Z => &[&[1, 1, 0], &[0, 1, 1], &[0, 0, 0]],
        };
        let id = self.color_id();
        Shape::from_rows(
            mask.iter()
                .map(|row| row.iter().map(|&m| m * id).collect())
                .collect(),
        )
    }
}

/// Piece matrix. Values are immutable; rotation yields a new shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    rows: Vec<Vec<Cell>>,
}

impl Shape {
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        Self { rows }
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Occupied cells as (dx, dy, value) relative to the shape's top-left corner.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|&(_, &v)| v != EMPTY)
                .map(move |(dx, &v)| (dx as i32, dy as i32, v))
        })
    }

    /// Clockwise quarter turn: transpose, then reverse each row.
    pub fn rotated(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let rows = (0..w)
            .map(|y| (0..h).map(|x| self.rows[h - 1 - x][y]).collect())
            .collect();
        Self { rows }
    }
}

/// Top-left offset of a shape inside the arena. May be negative while probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

/// Result of one sweep pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sweep {
    pub rows: u32,
    pub points: u32,
}

/// Playing field of locked cells. rows[0] is the top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arena {
    rows: VecDeque<Vec<Cell>>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            rows: (0..ARENA_HEIGHT).map(|_| vec![EMPTY; ARENA_WIDTH]).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<Cell> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if let Some(slot) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *slot = cell;
        }
    }

    fn cell_at(&self, x: i32, y: i32) -> Option<Cell> {
        if x < 0 || y < 0 {
            return None;
        }
        self.get(x as usize, y as usize)
    }

    pub fn clear(&mut self) {
        for row in &mut self.rows {
            row.fill(EMPTY);
        }
    }

    /// True if any occupied cell of `shape` at `pos` is out of bounds or on a filled cell.
    pub fn collides(&self, shape: &Shape, pos: Pos) -> bool {
        shape
            .cells()
            .any(|(dx, dy, _)| self.cell_at(pos.x + dx, pos.y + dy) != Some(EMPTY))
    }

    /// Write the shape's occupied cells into the arena. Cells outside the arena are dropped.
    pub fn merge(&mut self, shape: &Shape, pos: Pos) {
        for (dx, dy, v) in shape.cells() {
            let (x, y) = (pos.x + dx, pos.y + dy);
            if x >= 0 && y >= 0 {
                self.set(x as usize, y as usize, v);
            }
        }
    }

    /// Remove full rows bottom-up, refilling from the top. A cleared index is checked
    /// again, so stacked full rows each count; the row bonus doubles per cleared row.
    pub fn sweep(&mut self) -> Sweep {
        let mut sweep = Sweep::default();
        let mut multiplier = 1;
        let mut y = self.rows.len();
        while y > 0 {
            let idx = y - 1;
            if self.rows[idx].contains(&EMPTY) {
                y -= 1;
                continue;
            }
            if let Some(mut row) = self.rows.remove(idx) {
                row.fill(EMPTY);
                self.rows.push_front(row);
            }
            sweep.rows += 1;
            sweep.points += ROW_BASE_POINTS * multiplier;
            multiplier *= 2;
        }
        sweep
    }
}

/// Falling piece and the running score.
#[derive(Debug, Clone)]
pub struct Player {
    pub kind: PieceKind,
    pub shape: Shape,
    pub pos: Pos,
    pub score: u32,
}

impl Player {
    fn new(kind: PieceKind) -> Self {
        let shape = kind.shape();
        Self {
            kind,
            pos: spawn_position(&shape),
            shape,
            score: 0,
        }
    }
}

/// Centered on the top row.
fn spawn_position(shape: &Shape) -> Pos {
    Pos {
        x: (ARENA_WIDTH / 2) as i32 - (shape.width() / 2) as i32,
        y: 0,
    }
}

pub fn level_for_score(score: u32) -> u32 {
    score / POINTS_PER_LEVEL + 1
}

pub fn drop_interval_for_level(level: u32) -> u32 {
    BASE_DROP_INTERVAL_MS
        .saturating_sub(level.saturating_sub(1).saturating_mul(DROP_INTERVAL_STEP_MS))
        .max(MIN_DROP_INTERVAL_MS)
}

#[derive(Debug, Clone)]
struct Session {
    level: u32,
    drop_interval_ms: u32,
    drop_counter_ms: u32,
    lines: u32,
    last_sweep: Sweep,
    paused: bool,
    game_over: bool,
}

impl Session {
    fn new() -> Self {
        Self {
            level: 1,
            drop_interval_ms: BASE_DROP_INTERVAL_MS,
            drop_counter_ms: 0,
            lines: 0,
            last_sweep: Sweep::default(),
            paused: false,
            game_over: false,
        }
    }
}

/// Discrete input commands; no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    TogglePause,
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    pub fn dx(self) -> i32 {
        match self {
            Self::Left => -1,
            Self::Right => 1,
        }
    }
}

/// What a soft drop did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Paused or game over.
    Ignored,
    Fell,
    Locked,
}

/// Read-only view handed to the renderer once per frame.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub arena: &'a Arena,
    pub piece: &'a Shape,
    pub kind: PieceKind,
    pub pos: Pos,
    pub score: u32,
    pub level: u32,
    pub lines: u32,
    pub drop_interval_ms: u32,
    pub last_sweep: Sweep,
    pub paused: bool,
    pub game_over: bool,
}

impl Snapshot<'_> {
    /// Arena cell with the falling piece drawn over it.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        let (px, py) = (x as i32 - self.pos.x, y as i32 - self.pos.y);
        if px >= 0 && py >= 0 && (px as usize) < self.piece.width() && (py as usize) < self.piece.height() {
            let v = self.piece.rows[py as usize][px as usize];
            if v != EMPTY {
                return v;
            }
        }
        self.arena.get(x, y).unwrap_or(EMPTY)
    }
}

/// Board state machine: Running ⇄ Paused, Running → GameOver (until restart).
#[derive(Debug)]
pub struct GameState<R = StdRng> {
    arena: Arena,
    player: Player,
    session: Session,
    rng: R,
}

impl GameState<StdRng> {
    pub fn with_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> GameState<R> {
    pub fn new(mut rng: R) -> Self {
        let kind = random_kind(&mut rng);
        let mut state = Self {
            arena: Arena::new(),
            player: Player::new(kind),
            session: Session::new(),
            rng,
        };
        state.spawn_kind(kind);
        state
    }

    fn is_running(&self) -> bool {
        !self.session.paused && !self.session.game_over
    }

    pub fn is_game_over(&self) -> bool {
        self.session.game_over
    }

    /// Current piece against the arena at its current position.
    pub fn collides(&self) -> bool {
        self.arena.collides(&self.player.shape, self.player.pos)
    }

    /// Uniform pick from the 7 kinds, placed centered on the top row.
    pub fn spawn_piece(&mut self) {
        let kind = random_kind(&mut self.rng);
        self.spawn_kind(kind);
    }

    fn spawn_kind(&mut self, kind: PieceKind) {
        self.player.kind = kind;
        self.player.shape = kind.shape();
        self.player.pos = spawn_position(&self.player.shape);
        debug!("spawn {:?} at ({}, {})", kind, self.player.pos.x, self.player.pos.y);
        if self.collides() {
            self.session.game_over = true;
            info!(
                "game over: score {}, level {}, lines {}",
                self.player.score, self.session.level, self.session.lines
            );
        }
    }

    /// Shift one column; reverted on collision. Returns whether the piece moved.
    pub fn move_piece(&mut self, dir: Direction) -> bool {
        if !self.is_running() {
            return false;
        }
        self.player.pos.x += dir.dx();
        if self.collides() {
            self.player.pos.x -= dir.dx();
            return false;
        }
        true
    }

    /// Clockwise rotation in place, no wall kicks. Returns whether the rotation stuck.
    pub fn rotate(&mut self) -> bool {
        if !self.is_running() {
            return false;
        }
        let rotated = self.player.shape.rotated();
        if self.arena.collides(&rotated, self.player.pos) {
            return false;
        }
        self.player.shape = rotated;
        true
    }

    /// One row down; on collision lock, sweep and spawn. Resets the drop timer.
    pub fn soft_drop(&mut self) -> DropOutcome {
        if !self.is_running() {
            return DropOutcome::Ignored;
        }
        self.session.drop_counter_ms = 0;
        self.player.pos.y += 1;
        if !self.collides() {
            return DropOutcome::Fell;
        }
        self.player.pos.y -= 1;
        self.lock_piece();
        DropOutcome::Locked
    }

    fn lock_piece(&mut self) {
        debug!(
            "lock {:?} at ({}, {})",
            self.player.kind, self.player.pos.x, self.player.pos.y
        );
        self.arena.merge(&self.player.shape, self.player.pos);
        self.sweep_rows();
        self.update_level();
        self.spawn_piece();
    }

    /// Clear full rows and award their points.
    pub fn sweep_rows(&mut self) -> Sweep {
        let sweep = self.arena.sweep();
        if sweep.rows > 0 {
            self.player.score += sweep.points;
            self.session.lines += sweep.rows;
            self.session.last_sweep = sweep;
            info!(
                "swept {} row(s) for {} points, score {}",
                sweep.rows, sweep.points, self.player.score
            );
        }
        sweep
    }

    /// Recompute level and drop interval from the score.
    pub fn update_level(&mut self) {
        let level = level_for_score(self.player.score);
        if level != self.session.level {
            info!("level {} -> {}", self.session.level, level);
        }
        self.session.level = level;
        self.session.drop_interval_ms = drop_interval_for_level(level);
    }

    /// Advance the drop timer; drops once when it exceeds the interval.
    pub fn tick(&mut self, elapsed_ms: u32) {
        if !self.is_running() {
            return;
        }
        self.session.drop_counter_ms = self.session.drop_counter_ms.saturating_add(elapsed_ms);
        if self.session.drop_counter_ms > self.session.drop_interval_ms {
            self.soft_drop();
        }
        self.update_level();
    }

    pub fn toggle_pause(&mut self) {
        if self.session.game_over {
            return;
        }
        self.session.paused = !self.session.paused;
        info!("{}", if self.session.paused { "paused" } else { "resumed" });
    }

    /// Fresh arena and session; a new piece is spawned.
    pub fn restart(&mut self) {
        info!("restart (previous score {})", self.player.score);
        self.arena.clear();
        self.session = Session::new();
        self.player.score = 0;
        self.spawn_piece();
    }

    pub fn apply(&mut self, command: Command) {
        match command {
            Command::MoveLeft => {
                self.move_piece(Direction::Left);
            }
            Command::MoveRight => {
                self.move_piece(Direction::Right);
            }
            Command::SoftDrop => {
                self.soft_drop();
            }
            Command::Rotate => {
                self.rotate();
            }
            Command::TogglePause => self.toggle_pause(),
            Command::Restart => self.restart(),
        }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            arena: &self.arena,
            piece: &self.player.shape,
            kind: self.player.kind,
            pos: self.player.pos,
            score: self.player.score,
            level: self.session.level,
            lines: self.session.lines,
            drop_interval_ms: self.session.drop_interval_ms,
            last_sweep: self.session.last_sweep,
            paused: self.session.paused,
            game_over: self.session.game_over,
        }
    }
}

fn random_kind<R: Rng>(rng: &mut R) -> PieceKind {
    PieceKind::ALL[rng.gen_range(0..PieceKind::ALL.len())]
}
