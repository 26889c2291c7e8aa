use num_traits::Float;
use kura_core::solver::{Block, LinAlgEx, SolverError};
use kura_core::{BlockDense, BlockSparse, BlockDiags, BlockZero, BlockId,
                BlockGradient1D, BlockGradient2D, BlockGradient3D, BlockDct,
                TransformKind, LinOp, BlockPlace};

//

/// Owned description of one linear-map block.
///
/// The typed counterpart of a block entry in a host parameter dictionary.
/// A description owns its data; the matching [`kura_core`] block borrowing
/// that data is materialized when an operator is assembled.
#[derive(Debug, Clone)]
pub enum BlockDesc<F: Float>
{
    /// Dense matrix, column-major data of length `nrows * ncols`.
    Dense {nrows: usize, ncols: usize, data: Vec<F>},
    /// Sparse matrix in CSR storage; `transpose` views the triple as its
    /// transpose (covering CSC input).
    Sparse {nrows: usize, ncols: usize, row_ptr: Vec<usize>, col_ind: Vec<usize>, val: Vec<F>, transpose: bool},
    /// Banded diagonals, one constant factor per offset.
    Diags {nrows: usize, ncols: usize, offsets: Vec<isize>, factors: Vec<F>},
    /// All-zero block.
    Zero {nrows: usize, ncols: usize},
    /// Scaled identity.
    Id {n: usize, scale: F},
    /// Forward-difference gradient on a 1D grid.
    Gradient1D {n: usize},
    /// Forward-difference gradient on a 2D grid.
    Gradient2D {nx: usize, ny: usize},
    /// Forward-difference gradient on a 3D grid.
    Gradient3D {nx: usize, ny: usize, nz: usize},
    /// Orthonormal trigonometric transform.
    Dct {n: usize, kind: TransformKind},
}

impl<F: Float> BlockDesc<F>
{
    /// Size of the described block.
    pub fn size(&self) -> (usize, usize)
    {
        match self {
            BlockDesc::Dense {nrows, ncols, ..} => (*nrows, *ncols),
            BlockDesc::Sparse {nrows, ncols, transpose, ..} => {
                if *transpose {(*ncols, *nrows)} else {(*nrows, *ncols)}
            },
            BlockDesc::Diags {nrows, ncols, ..} => (*nrows, *ncols),
            BlockDesc::Zero {nrows, ncols} => (*nrows, *ncols),
            BlockDesc::Id {n, ..} => (*n, *n),
            BlockDesc::Gradient1D {n} => (*n, *n),
            BlockDesc::Gradient2D {nx, ny} => (2 * nx * ny, nx * ny),
            BlockDesc::Gradient3D {nx, ny, nz} => (3 * nx * ny * nz, nx * ny * nz),
            BlockDesc::Dct {n, ..} => (*n, *n),
        }
    }

    pub(crate) fn build<L>(&self) -> Result<BuiltBlock<'_, L>, SolverError>
    where L: LinAlgEx<F=F>
    {
        let b = match self {
            BlockDesc::Dense {nrows, ncols, data} => {
                if nrows * ncols != data.len() {
                    return Err(SolverError::ShapeMismatch(format!(
                        "dense block data length {} does not match {}x{}",
                        data.len(), nrows, ncols)));
                }
                BuiltBlock::Dense(BlockDense::new(*nrows, *ncols, data))
            },
            BlockDesc::Sparse {nrows, ncols, row_ptr, col_ind, val, transpose} => {
                BuiltBlock::Sparse(BlockSparse::new(*nrows, *ncols, row_ptr, col_ind, val, *transpose)?)
            },
            BlockDesc::Diags {nrows, ncols, offsets, factors} => {
                BuiltBlock::Diags(BlockDiags::new(*nrows, *ncols, offsets, factors)?)
            },
            BlockDesc::Zero {nrows, ncols} => BuiltBlock::Zero(BlockZero::new(*nrows, *ncols)),
            BlockDesc::Id {n, scale} => BuiltBlock::Id(BlockId::new(*n, *scale)),
            BlockDesc::Gradient1D {n} => {
                let (m, n_) = self.size();
                empty_grid_check(m, n_)?;
                BuiltBlock::Grad1(BlockGradient1D::new(*n))
            },
            BlockDesc::Gradient2D {nx, ny} => {
                let (m, n_) = self.size();
                empty_grid_check(m, n_)?;
                BuiltBlock::Grad2(BlockGradient2D::new(*nx, *ny))
            },
            BlockDesc::Gradient3D {nx, ny, nz} => {
                let (m, n_) = self.size();
                empty_grid_check(m, n_)?;
                BuiltBlock::Grad3(BlockGradient3D::new(*nx, *ny, *nz))
            },
            BlockDesc::Dct {n, kind} => {
                empty_grid_check(*n, *n)?;
                BuiltBlock::Dct(BlockDct::new(*n, *kind))
            },
        };

        Ok(b)
    }
}

fn empty_grid_check(m: usize, n: usize) -> Result<(), SolverError>
{
    if m == 0 || n == 0 {
        Err(SolverError::InvalidStructure("grid block has an empty dimension".to_string()))
    }
    else {
        Ok(())
    }
}

/// A [`BlockDesc`] placed at a `(row, col)` offset.
#[derive(Debug, Clone)]
pub struct BlockPlaceDesc<F: Float>
{
    pub row: usize,
    pub col: usize,
    pub block: BlockDesc<F>,
}

impl<F: Float> BlockPlaceDesc<F>
{
    /// Creates a placement.
    pub fn new(row: usize, col: usize, block: BlockDesc<F>) -> Self
    {
        BlockPlaceDesc {
            row, col, block,
        }
    }
}

//

pub(crate) enum BuiltBlock<'a, L: LinAlgEx>
{
    Dense(BlockDense<'a, L>),
    Sparse(BlockSparse<'a, L::F>),
    Diags(BlockDiags<'a, L::F>),
    Zero(BlockZero<L>),
    Id(BlockId<L>),
    Grad1(BlockGradient1D<L>),
    Grad2(BlockGradient2D<L>),
    Grad3(BlockGradient3D<L>),
    Dct(BlockDct<L>),
}

// fully qualified so that blocks parameterized by the scalar type alone
// dispatch without inference ambiguity
macro_rules! built_dispatch {
    ($self:expr, $b:ident, $m:ident ( $($arg:expr),* )) => {
        match $self {
            BuiltBlock::Dense($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Sparse($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Diags($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Zero($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Id($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Grad1($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Grad2($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Grad3($b) => Block::<L>::$m($b, $($arg),*),
            BuiltBlock::Dct($b) => Block::<L>::$m($b, $($arg),*),
        }
    };
}

impl<'a, L: LinAlgEx> Block<L> for BuiltBlock<'a, L>
{
    fn size(&self) -> (usize, usize)
    {
        built_dispatch!(self, b, size())
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        built_dispatch!(self, b, op_add(alpha, x, y))
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        built_dispatch!(self, b, trans_op_add(alpha, x, y))
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        built_dispatch!(self, b, absadd_cols(p, tau))
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        built_dispatch!(self, b, absadd_rows(p, sigma))
    }
}

//

// builds all blocks and hands the composite to `f`
pub(crate) fn with_linop<L, R, FN>(dims: Option<(usize, usize)>, places: &[BlockPlaceDesc<L::F>], f: FN) -> Result<R, SolverError>
where L: LinAlgEx, FN: FnOnce(&LinOp<'_, L>) -> R
{
    let mut built = Vec::with_capacity(places.len());
    for p in places {
        built.push(p.block.build::<L>()?);
    }

    let bp = built.iter().zip(places)
        .map(|(b, p)| BlockPlace::new(p.row, p.col, b as &dyn Block<L>))
        .collect();

    let lo = match dims {
        Some((nrows, ncols)) => LinOp::new_sized(nrows, ncols, bp)?,
        None => LinOp::new(bp)?,
    };

    Ok(f(&lo))
}
