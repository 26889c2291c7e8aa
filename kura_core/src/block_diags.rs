use num_traits::Float;
use crate::solver::{Block, LinAlg, SolverError, VecLike};

//

/// Banded diagonal block.
///
/// A set of (offset, factor) diagonals of an \\(m \times n\\) matrix:
/// offset 0 is the main diagonal, positive offsets lie above it. Each
/// diagonal carries one constant factor, so the whole block is described
/// by a parameter table small enough for device constant memory. The apply
/// paths reduce to one axpy over a contiguous sub-view per diagonal and
/// stay on the device.
pub struct BlockDiags<'a, F: Float>
{
    nrows: usize,
    ncols: usize,
    offsets: &'a[isize],
    factors: &'a[F],
}

impl<'a, F: Float> BlockDiags<'a, F>
{
    /// Creates an instance borrowing the diagonal table.
    ///
    /// Returns [`SolverError::InvalidStructure`] if the table lengths
    /// disagree or an offset addresses no cell of the matrix.
    pub fn new(nrows: usize, ncols: usize, offsets: &'a[isize], factors: &'a[F]) -> Result<Self, SolverError>
    {
        if offsets.len() != factors.len() {
            return Err(SolverError::InvalidStructure(format!(
                "{} offsets vs {} factors", offsets.len(), factors.len())));
        }
        for o in offsets {
            if *o >= ncols as isize || -*o >= nrows as isize {
                return Err(SolverError::InvalidStructure(format!(
                    "diagonal offset {} outside a {}x{} matrix", o, nrows, ncols)));
            }
        }

        Ok(BlockDiags {
            nrows, ncols, offsets, factors,
        })
    }

    // covered cells of diagonal `o`: rows [r0, r0 + l), cols [r0 + o, ...)
    fn diag_span(&self, o: isize) -> (usize, usize, usize)
    {
        let r0 = if o < 0 {(-o) as usize} else {0};
        let c0 = if o < 0 {0} else {o as usize};
        let l = (self.nrows - r0).min(self.ncols - c0);

        (r0, c0, l)
    }
}

impl<'a, L: LinAlg> Block<L> for BlockDiags<'a, L::F>
{
    fn size(&self) -> (usize, usize)
    {
        (self.nrows, self.ncols)
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        for (o, fac) in self.offsets.iter().zip(self.factors) {
            let (r0, c0, l) = self.diag_span(*o);

            let (_, x_spl) = x.split_ref(c0);
            let (x_sub, _) = x_spl.split_ref(l);
            let (_, mut y_spl) = y.split_mut(r0);
            let (mut y_sub, _) = y_spl.split_mut(l);

            L::add(alpha * *fac, &x_sub, &mut y_sub);
        }
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        for (o, fac) in self.offsets.iter().zip(self.factors) {
            let (r0, c0, l) = self.diag_span(*o);

            let (_, x_spl) = x.split_ref(r0);
            let (x_sub, _) = x_spl.split_ref(l);
            let (_, mut y_spl) = y.split_mut(c0);
            let (mut y_sub, _) = y_spl.split_mut(l);

            L::add(alpha * *fac, &x_sub, &mut y_sub);
        }
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        for (o, fac) in self.offsets.iter().zip(self.factors) {
            let (_, c0, l) = self.diag_span(*o);

            let (_, mut spl) = tau.split_mut(c0);
            let (mut sub, _) = spl.split_mut(l);
            L::adds(fac.abs().powf(p), &mut sub);
        }
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        for (o, fac) in self.offsets.iter().zip(self.factors) {
            let (r0, _, l) = self.diag_span(*o);

            let (_, mut spl) = sigma.split_mut(r0);
            let (mut sub, _) = spl.split_mut(l);
            L::adds(fac.abs().powf(p), &mut sub);
        }
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Block;
    use crate::FloatGeneric;
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_block_diags1()
    {
        // M = [ 2 -1  0  0 ]
        //     [ 0  2 -1  0 ]
        //     [ 0  0  2 -1 ]
        let b = BlockDiags::new(3, 4, &[0, 1], &[2., -1.]).unwrap();

        let y = &mut[0.; 3];
        Block::<L>::op_add(&b, 1., [1., 2., 3., 4.].as_ref(), y.as_mut());
        assert_float_eq!(y.as_ref(), [0., 1., 2.].as_ref(), abs_all <= 1e-12);

        let yt = &mut[0.; 4];
        Block::<L>::trans_op_add(&b, 1., [1., 1., 1.].as_ref(), yt.as_mut());
        assert_float_eq!(yt.as_ref(), [2., 1., 1., -1.].as_ref(), abs_all <= 1e-12);

        let tau = &mut[0.; 4];
        Block::<L>::absadd_cols(&b, 1., tau.as_mut());
        assert_float_eq!(tau.as_ref(), [2., 3., 3., 1.].as_ref(), abs_all <= 1e-12);

        let sigma = &mut[0.; 3];
        Block::<L>::absadd_rows(&b, 1., sigma.as_mut());
        assert_float_eq!(sigma.as_ref(), [3., 3., 3.].as_ref(), abs_all <= 1e-12);
    }
}
