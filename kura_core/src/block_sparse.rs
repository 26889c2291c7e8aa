use num_traits::Float;
use crate::solver::{Block, LinAlg, SolverError, VecLike};

//

/// Sparse matrix block in compressed row storage.
///
/// Borrows the CSR triple of an \\(m \times n\\) matrix. A matrix supplied
/// in compressed *column* storage enters as the CSR of its transpose with
/// the `transpose` flag set.
///
/// The apply paths iterate the stored pattern on the host; sparse blocks
/// are meant for couplings whose pattern has no structure a dedicated
/// block could exploit.
pub struct BlockSparse<'a, F: Float>
{
    nrows: usize,
    ncols: usize,
    row_ptr: &'a[usize],
    col_ind: &'a[usize],
    val: &'a[F],
    transpose: bool,
}

impl<'a, F: Float> BlockSparse<'a, F>
{
    /// Creates an instance borrowing a CSR triple.
    ///
    /// `nrows` and `ncols` are the size of the *stored* matrix; with
    /// `transpose` the block acts as its transpose.
    /// Returns [`SolverError::InvalidStructure`] on an inconsistent triple.
    pub fn new(nrows: usize, ncols: usize, row_ptr: &'a[usize], col_ind: &'a[usize], val: &'a[F], transpose: bool) -> Result<Self, SolverError>
    {
        if row_ptr.len() != nrows + 1 {
            return Err(SolverError::InvalidStructure(format!(
                "row_ptr length {} does not match {} rows", row_ptr.len(), nrows)));
        }
        if row_ptr[nrows] != val.len() || col_ind.len() != val.len() {
            return Err(SolverError::InvalidStructure(format!(
                "nonzero count disagrees: row_ptr ends at {}, {} indices, {} values",
                row_ptr[nrows], col_ind.len(), val.len())));
        }
        for r in 0.. nrows {
            if row_ptr[r] > row_ptr[r + 1] {
                return Err(SolverError::InvalidStructure(format!(
                    "row_ptr decreases at row {}", r)));
            }
        }
        for c in col_ind {
            if *c >= ncols {
                return Err(SolverError::InvalidStructure(format!(
                    "column index {} out of {} columns", c, ncols)));
            }
        }

        Ok(BlockSparse {
            nrows, ncols, row_ptr, col_ind, val, transpose,
        })
    }

    // y += alpha * M x on the stored orientation
    fn spmv_add(&self, alpha: F, x: &[F], y: &mut[F])
    {
        for r in 0.. self.nrows {
            let mut acc = F::zero();
            for k in self.row_ptr[r].. self.row_ptr[r + 1] {
                acc = acc + self.val[k] * x[self.col_ind[k]];
            }
            y[r] = y[r] + alpha * acc;
        }
    }

    // y += alpha * M^T x on the stored orientation
    fn spmv_t_add(&self, alpha: F, x: &[F], y: &mut[F])
    {
        for r in 0.. self.nrows {
            let ax = alpha * x[r];
            for k in self.row_ptr[r].. self.row_ptr[r + 1] {
                y[self.col_ind[k]] = y[self.col_ind[k]] + self.val[k] * ax;
            }
        }
    }

    // accumulate |.|^p over stored rows resp. columns
    fn powsum_add(&self, rowwise: bool, p: F, out: &mut[F])
    {
        for r in 0.. self.nrows {
            for k in self.row_ptr[r].. self.row_ptr[r + 1] {
                let i = if rowwise {r} else {self.col_ind[k]};
                out[i] = out[i] + self.val[k].abs().powf(p);
            }
        }
    }
}

impl<'a, L: LinAlg> Block<L> for BlockSparse<'a, L::F>
{
    fn size(&self) -> (usize, usize)
    {
        if self.transpose {(self.ncols, self.nrows)} else {(self.nrows, self.ncols)}
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        if self.transpose {
            self.spmv_t_add(alpha, x.get_ref(), y.get_mut());
        }
        else {
            self.spmv_add(alpha, x.get_ref(), y.get_mut());
        }
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        if self.transpose {
            self.spmv_add(alpha, x.get_ref(), y.get_mut());
        }
        else {
            self.spmv_t_add(alpha, x.get_ref(), y.get_mut());
        }
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        self.powsum_add(self.transpose, p, tau.get_mut());
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        self.powsum_add(!self.transpose, p, sigma.get_mut());
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
    fn test_block_sparse1()
    {
        // M = [ 1  0  2 ]
        //     [ 0 -3  0 ]
        let row_ptr = &[0, 2, 3];
        let col_ind = &[0, 2, 1];
        let val = &[1., 2., -3.];
        let b = BlockSparse::new(2, 3, row_ptr, col_ind, val, false).unwrap();

        assert_eq!(Block::<L>::size(&b), (2, 3));

        let y = &mut[0.; 2];
        Block::<L>::op_add(&b, 1., [1., 1., 1.].as_ref(), y.as_mut());
        assert_float_eq!(y.as_ref(), [3., -3.].as_ref(), abs_all <= 1e-12);

        let yt = &mut[0.; 3];
        Block::<L>::trans_op_add(&b, 2., [1., 1.].as_ref(), yt.as_mut());
        assert_float_eq!(yt.as_ref(), [2., -6., 4.].as_ref(), abs_all <= 1e-12);

        let tau = &mut[0.; 3];
        Block::<L>::absadd_cols(&b, 1., tau.as_mut());
        assert_float_eq!(tau.as_ref(), [1., 3., 2.].as_ref(), abs_all <= 1e-12);

        let sigma = &mut[0.; 2];
        Block::<L>::absadd_rows(&b, 1., sigma.as_mut());
        assert_float_eq!(sigma.as_ref(), [3., 3.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_block_sparse_bad()
    {
        let r = BlockSparse::<f64>::new(2, 3, &[0, 2, 3], &[0, 5, 1], &[1., 2., -3.], false);
        assert!(matches!(r, Err(SolverError::InvalidStructure(_))));
    }
}
