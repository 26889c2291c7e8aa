use core::marker::PhantomData;
use crate::solver::{Block, LinAlg};

//

/// All-zero block.
///
/// Contributes nothing to applications or sums; placing one documents a
/// coupling that is structurally absent and reserves its rectangle.
pub struct BlockZero<L: LinAlg>
{
    ph_l: PhantomData<L>,
    nrows: usize,
    ncols: usize,
}

impl<L: LinAlg> BlockZero<L>
{
    /// Creates an instance.
    pub fn new(nrows: usize, ncols: usize) -> Self
    {
        BlockZero {
            ph_l: PhantomData,
            nrows, ncols,
        }
    }
}

impl<L: LinAlg> Block<L> for BlockZero<L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.nrows, self.ncols)
    }

    fn op_add(&self, _alpha: L::F, _x: &L::V, _y: &mut L::V)
    {
    }

    fn trans_op_add(&self, _alpha: L::F, _x: &L::V, _y: &mut L::V)
    {
    }

    fn absadd_cols(&self, _p: L::F, _tau: &mut L::V)
    {
    }

    fn absadd_rows(&self, _p: L::F, _sigma: &mut L::V)
    {
    }
}
