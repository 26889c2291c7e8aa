use num_traits::One;
use crate::solver::{Block, LinAlgEx, VecLike, VecRef};
use crate::subv;

//

/// Dense matrix block.
///
/// Borrows a column-major data array; the apply paths run through
/// [`LinAlgEx::transform_ge`] and stay on the device.
pub struct BlockDense<'a, L: LinAlgEx>
{
    nrows: usize,
    ncols: usize,
    array: VecRef<'a, L::V>,
}

impl<'a, L: LinAlgEx> BlockDense<'a, L>
{
    /// Creates an instance borrowing `array`, the column-major matrix data
    /// of length `nrows * ncols`.
    pub fn new(nrows: usize, ncols: usize, array: &'a[L::F]) -> Self
    {
        assert_eq!(nrows * ncols, array.len());

        BlockDense {
            nrows, ncols,
            array: L::V::new_ref(array),
        }
    }
}

impl<'a, L: LinAlgEx> Block<L> for BlockDense<'a, L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.nrows, self.ncols)
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        if self.nrows > 0 && self.ncols > 0 {
            L::transform_ge(false, self.nrows, self.ncols, alpha, &self.array, x, L::F::one(), y);
        }
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        if self.nrows > 0 && self.ncols > 0 {
            L::transform_ge(true, self.nrows, self.ncols, alpha, &self.array, x, L::F::one(), y);
        }
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        assert_eq!(tau.len(), self.ncols);

        for (c, e) in tau.get_mut().iter_mut().enumerate() {
            subv!(self.array, (_t; c * self.nrows), (col; self.nrows));
            *e = *e + L::abspowsum(&col, p, 1);
        }
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        assert_eq!(sigma.len(), self.nrows);

        for (r, e) in sigma.get_mut().iter_mut().enumerate() {
            subv!(self.array, (_t; r), (row; self.nrows * self.ncols - r));
            *e = *e + L::abspowsum(&row, p, self.nrows);
        }
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::FloatGeneric;
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_block_dense1()
    {
        let array = &[ // column-major
            1., -4.,
            2.,  5.,
           -3.,  6.,
        ];
        let b = BlockDense::<L>::new(2, 3, array);

        let y = &mut[1., 1.];
        b.op_add(1., [1., 1., 1.].as_ref(), y.as_mut());
        assert_float_eq!(y.as_ref(), [1., 8.].as_ref(), abs_all <= 1e-12);

        let yt = &mut[0.; 3];
        b.trans_op_add(1., [1., 1.].as_ref(), yt.as_mut());
        assert_float_eq!(yt.as_ref(), [-3., 7., 3.].as_ref(), abs_all <= 1e-12);

        let tau = &mut[0.; 3];
        b.absadd_cols(1., tau.as_mut());
        assert_float_eq!(tau.as_ref(), [5., 7., 9.].as_ref(), abs_all <= 1e-12);

        let sigma = &mut[0.; 2];
        b.absadd_rows(2., sigma.as_mut());
        assert_float_eq!(sigma.as_ref(), [14., 77.].as_ref(), abs_all <= 1e-12);
    }
}
