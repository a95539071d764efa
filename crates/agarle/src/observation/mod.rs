//! Observation encoding.
//!
//! An [`Observation`] owns copies of everything it encodes, so it stays valid
//! while the engine keeps ticking. Boundary layers read it through
//! [`BufferView`]s (pointer, length, shape, strides) and never take ownership.

mod full;
mod grid;

pub use full::FullEncoder;
pub use grid::{GridEncoder, GridToggles};

use crate::config::{ObservationConfig, ObservationKind};
use crate::entity::{Body, Cell, Pid};
use crate::world::GameState;

/// Columns of a static entity row: x, y.
pub const STATIC_COLUMNS: usize = 2;
/// Columns of a cell row: x, y, dx, dy, mass.
pub const CELL_COLUMNS: usize = 5;

/// Buffer order inside every observation.
pub const PELLETS: usize = 0;
pub const VIRUSES: usize = 1;
pub const FOODS: usize = 2;
pub const AGENT: usize = 3;
pub const OTHERS: usize = 4;
/// Only produced by the grid encoder.
pub const GRID: usize = 5;

/// A dense, row-major `f32` tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    data: Box<[f32]>,
    shape: Vec<usize>,
}

impl Buffer {
    /// `data.len()` must equal the product of `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Self {
        debug_assert_eq!(data.len(), shape.iter().product::<usize>());
        Self {
            data: data.into_boxed_slice(),
            shape,
        }
    }

    /// A `[rows, columns]` table from packed rows.
    pub fn table(data: Vec<f32>, columns: usize) -> Self {
        let rows = data.len() / columns;
        Self::new(data, vec![rows, columns])
    }

    /// A zero-row table.
    pub fn empty(columns: usize) -> Self {
        Self::new(Vec::new(), vec![0, columns])
    }

    pub fn zeros(shape: Vec<usize>) -> Self {
        let len = shape.iter().product();
        Self::new(vec![0.0; len], shape)
    }

    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Leading dimension (row count for tables).
    #[inline]
    pub fn rows(&self) -> usize {
        self.shape.first().copied().unwrap_or(0)
    }

    /// Row `index` of a table.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        let columns = self.shape.get(1).copied().unwrap_or(1);
        self.data.chunks_exact(columns.max(1)).nth(index)
    }

    #[inline]
    pub fn view(&self) -> BufferView<'_> {
        BufferView {
            data: &self.data,
            shape: &self.shape,
        }
    }
}

/// Borrowed, read-only view of a [`Buffer`]. Cannot outlive the observation.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    data: &'a [f32],
    shape: &'a [usize],
}

impl<'a> BufferView<'a> {
    #[inline]
    pub fn as_ptr(&self) -> *const f32 {
        self.data.as_ptr()
    }

    /// Element count.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn data(&self) -> &'a [f32] {
        self.data
    }

    #[inline]
    pub fn shape(&self) -> &'a [usize] {
        self.shape
    }

    /// Row-major strides in bytes.
    pub fn strides(&self) -> Vec<usize> {
        let mut strides = vec![size_of::<f32>(); self.shape.len()];
        for axis in (0..self.shape.len().saturating_sub(1)).rev() {
            strides[axis] = strides[axis + 1] * self.shape[axis + 1];
        }
        strides
    }
}

/// Encoded state for one player, one buffer per category.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    buffers: Vec<Buffer>,
}

impl Observation {
    pub fn new(buffers: Vec<Buffer>) -> Self {
        Self { buffers }
    }

    #[inline]
    pub fn buffers(&self) -> &[Buffer] {
        &self.buffers
    }

    #[inline]
    pub fn pellets(&self) -> &Buffer {
        &self.buffers[PELLETS]
    }

    #[inline]
    pub fn viruses(&self) -> &Buffer {
        &self.buffers[VIRUSES]
    }

    #[inline]
    pub fn foods(&self) -> &Buffer {
        &self.buffers[FOODS]
    }

    /// The observed player's own cells.
    #[inline]
    pub fn agent(&self) -> &Buffer {
        &self.buffers[AGENT]
    }

    /// Every other player's cells, in ascending pid order.
    #[inline]
    pub fn others(&self) -> &Buffer {
        &self.buffers[OTHERS]
    }

    /// Mass grid, grid encoder only.
    #[inline]
    pub fn grid(&self) -> Option<&Buffer> {
        self.buffers.get(GRID)
    }

    pub fn shapes(&self) -> Vec<&[usize]> {
        self.buffers.iter().map(Buffer::shape).collect()
    }

    pub fn views(&self) -> Vec<BufferView<'_>> {
        self.buffers.iter().map(Buffer::view).collect()
    }
}

/// Turns committed state into an observation for one player.
pub trait Encoder: Send {
    fn encode(&self, pid: Pid, state: &GameState) -> Observation;
}

/// Build the encoder an observation config asks for.
pub fn encoder_for(config: &ObservationConfig) -> Box<dyn Encoder> {
    match config.kind {
        ObservationKind::Full => Box::new(FullEncoder),
        ObservationKind::Grid => Box::new(GridEncoder::new(config.grid_size, GridToggles::from(config))),
    }
}

pub(crate) fn static_table<B: Body>(bodies: &[B]) -> Buffer {
    let mut data = Vec::with_capacity(bodies.len() * STATIC_COLUMNS);
    for body in bodies {
        let p = body.position();
        data.extend_from_slice(&[p.x, p.y]);
    }
    Buffer::table(data, STATIC_COLUMNS)
}

pub(crate) fn push_cell_rows<'a>(data: &mut Vec<f32>, cells: impl IntoIterator<Item = &'a Cell>) {
    for cell in cells {
        data.extend_from_slice(&[
            cell.position.x,
            cell.position.y,
            cell.velocity.x,
            cell.velocity.y,
            cell.mass(),
        ]);
    }
}

/// Own cells and everyone else's cells.
pub(crate) fn cell_tables(pid: Pid, state: &GameState) -> (Buffer, Buffer) {
    let mut agent = Vec::new();
    let mut others = Vec::new();
    for player in state.players() {
        if player.pid() == pid {
            push_cell_rows(&mut agent, player.cells());
        } else {
            push_cell_rows(&mut others, player.cells());
        }
    }
    (Buffer::table(agent, CELL_COLUMNS), Buffer::table(others, CELL_COLUMNS))
}
