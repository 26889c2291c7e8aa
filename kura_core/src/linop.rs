use num_traits::Zero;
use crate::solver::{Block, LinAlg, Operator, SolverError, VecLike};

//

/// A [`Block`] placed at a `(row, col)` offset of a composite operator.
pub struct BlockPlace<'a, L: LinAlg>
{
    row: usize,
    col: usize,
    block: &'a dyn Block<L>,
}

impl<'a, L: LinAlg> BlockPlace<'a, L>
{
    /// Creates a placement of `block` with its upper-left cell at
    /// `(row, col)`.
    pub fn new(row: usize, col: usize, block: &'a dyn Block<L>) -> Self
    {
        BlockPlace {
            row, col, block,
        }
    }

    fn rect(&self) -> (usize, usize, usize, usize)
    {
        let (m, n) = self.block.size();

        (self.row, self.row + m, self.col, self.col + n)
    }
}

/// Composite linear operator.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// A block matrix \\(K\\) assembled from heterogeneous [`Block`] leaves.
/// The occupied rectangles of any two blocks must not intersect, so no two
/// blocks ever write the same output cell; apart from that blocks may be
/// placed anywhere, and rows or columns not covered by any block are zero.
///
/// The composite is immutable once constructed; structural validation
/// happens in [`LinOp::new`].
pub struct LinOp<'a, L: LinAlg>
{
    blocks: Vec<BlockPlace<'a, L>>,
    nrows: usize,
    ncols: usize,
}

impl<'a, L: LinAlg> LinOp<'a, L>
{
    /// Creates an instance from block placements.
    ///
    /// Returns the composite, whose size is the maximum extent of the
    /// placements, or [`SolverError::InvalidStructure`] if two occupied
    /// rectangles intersect.
    pub fn new(blocks: Vec<BlockPlace<'a, L>>) -> Result<Self, SolverError>
    {
        let mut nrows = 0;
        let mut ncols = 0;

        for b in &blocks {
            let (_, r1, _, c1) = b.rect();
            nrows = nrows.max(r1);
            ncols = ncols.max(c1);
        }

        for (i, bi) in blocks.iter().enumerate() {
            let (ir0, ir1, ic0, ic1) = bi.rect();
            for bj in blocks.iter().skip(i + 1) {
                let (jr0, jr1, jc0, jc1) = bj.rect();
                if ir0 < jr1 && jr0 < ir1 && ic0 < jc1 && jc0 < ic1 {
                    return Err(SolverError::InvalidStructure(format!(
                        "blocks overlap: rows [{}, {})x[{}, {}) and [{}, {})x[{}, {})",
                        ir0, ir1, ic0, ic1, jr0, jr1, jc0, jc1)));
                }
            }
        }

        Ok(LinOp {
            blocks, nrows, ncols,
        })
    }

    /// Creates an instance with an explicit size.
    ///
    /// Returns [`SolverError::InvalidStructure`] if a placement exceeds
    /// `(nrows, ncols)` or placements overlap.
    pub fn new_sized(nrows: usize, ncols: usize, blocks: Vec<BlockPlace<'a, L>>) -> Result<Self, SolverError>
    {
        let l = Self::new(blocks)?;

        if l.nrows > nrows || l.ncols > ncols {
            return Err(SolverError::InvalidStructure(format!(
                "blocks extend to ({}, {}) beyond the operator size ({}, {})",
                l.nrows, l.ncols, nrows, ncols)));
        }

        Ok(LinOp {
            blocks: l.blocks,
            nrows, ncols,
        })
    }

    fn op_impl(&self, transpose: bool, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V)
    {
        let f0 = L::F::zero();

        if beta == f0 {
            L::fill(f0, y);
        }
        else {
            L::scale(beta, y);
        }

        for b in &self.blocks {
            let (m, n) = b.block.size();
            let (xo, xl, yo, yl) = if transpose {(b.row, m, b.col, n)} else {(b.col, n, b.row, m)};

            let (_, x_spl) = x.split_ref(xo);
            let (x_sub, _) = x_spl.split_ref(xl);
            let (_, mut y_spl) = y.split_mut(yo);
            let (mut y_sub, _) = y_spl.split_mut(yl);

            if transpose {
                b.block.trans_op_add(alpha, &x_sub, &mut y_sub);
            }
            else {
                b.block.op_add(alpha, &x_sub, &mut y_sub);
            }
        }
    }
}

impl<'a, L: LinAlg> Operator<L> for LinOp<'a, L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.nrows, self.ncols)
    }

    fn op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V)
    {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);

        self.op_impl(false, alpha, x, beta, y);
    }

    fn trans_op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V)
    {
        assert_eq!(x.len(), self.nrows);
        assert_eq!(y.len(), self.ncols);

        self.op_impl(true, alpha, x, beta, y);
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        assert_eq!(tau.len(), self.ncols);

        for b in &self.blocks {
            let (_, n) = b.block.size();
            let (_, mut spl) = tau.split_mut(b.col);
            let (mut sub, _) = spl.split_mut(n);
            b.block.absadd_cols(p, &mut sub);
        }
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        assert_eq!(sigma.len(), self.nrows);

        for b in &self.blocks {
            let (m, _) = b.block.size();
            let (_, mut spl) = sigma.split_mut(b.row);
            let (mut sub, _) = spl.split_mut(m);
            b.block.absadd_rows(p, &mut sub);
        }
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Operator;
    use crate::{FloatGeneric, BlockDense, BlockId, BlockZero};
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_linop1()
    {
        // K = [ A  0 ]
        //     [ 0  2I]
        let a = BlockDense::<L>::new(2, 2, &[
            1., 3.,
            2., 4.,
        ]);
        let id = BlockId::<L>::new(2, 2.);

        let linop = LinOp::new(vec![
            BlockPlace::new(0, 0, &a),
            BlockPlace::new(2, 2, &id),
        ]).unwrap();

        assert_eq!(linop.size(), (4, 4));

        let x = &[1., 1., 1., 1.];
        let y = &mut[0.; 4];
        linop.op(1., x.as_ref(), 0., y.as_mut());
        assert_float_eq!(y.as_ref(), [3., 7., 2., 2.].as_ref(), abs_all <= 1e-12);

        let yt = &mut[0.; 4];
        linop.trans_op(1., x.as_ref(), 0., yt.as_mut());
        assert_float_eq!(yt.as_ref(), [4., 6., 2., 2.].as_ref(), abs_all <= 1e-12);

        let tau = &mut[0.; 4];
        linop.absadd_cols(1., tau.as_mut());
        assert_float_eq!(tau.as_ref(), [4., 6., 2., 2.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_linop_overlap()
    {
        let a = BlockDense::<L>::new(2, 2, &[1., 3., 2., 4.]);
        let z = BlockZero::<L>::new(3, 3);

        let r = LinOp::new(vec![
            BlockPlace::new(0, 0, &a),
            BlockPlace::new(1, 1, &z),
        ]);
        assert!(matches!(r, Err(SolverError::InvalidStructure(_))));
    }
}
