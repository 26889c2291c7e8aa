use core::marker::PhantomData;
use num_traits::Float;
use crate::solver::{Block, LinAlg};

//

/// Scaled identity block \\(sI\\) of size \\(n \times n\\).
pub struct BlockId<L: LinAlg>
{
    ph_l: PhantomData<L>,
    n: usize,
    scale: L::F,
}

impl<L: LinAlg> BlockId<L>
{
    /// Creates an instance.
    pub fn new(n: usize, scale: L::F) -> Self
    {
        BlockId {
            ph_l: PhantomData,
            n, scale,
        }
    }
}

impl<L: LinAlg> Block<L> for BlockId<L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.n, self.n)
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        L::add(alpha * self.scale, x, y);
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        L::add(alpha * self.scale, x, y);
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        L::adds(self.scale.abs().powf(p), tau);
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        L::adds(self.scale.abs().powf(p), sigma);
    }
}
