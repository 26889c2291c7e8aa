use core::marker::PhantomData;
use num_traits::{Float, Zero, One, NumCast};
use crate::solver::{Block, LinAlg, VecLike};

//

/// Kind of trigonometric transform of a [`BlockDct`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind
{
    /// Orthonormal DCT-II.
    Dct2,
    /// Orthonormal DST-II.
    Dst2,
}

/// Orthonormal trigonometric transform block.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The \\(n \times n\\) DCT-II
/// \\(y_k = s_k \sum_j x_j \cos\frac{\pi k (2j+1)}{2n}\\)
/// or DST-II
/// \\(y_k = s_k \sum_j x_j \sin\frac{\pi (k+1)(2j+1)}{2n}\\)
/// with orthonormal scaling, so the adjoint equals the inverse.
/// Basis rows are generated on the fly; applications cost \\(O(n^2)\\),
/// which keeps this block for small and medium sizes (prefactored
/// dataterms, boundary lifts).
pub struct BlockDct<L: LinAlg>
{
    ph_l: PhantomData<L>,
    n: usize,
    kind: TransformKind,
}

impl<L: LinAlg> BlockDct<L>
{
    /// Creates an instance of size `n`.
    pub fn new(n: usize, kind: TransformKind) -> Self
    {
        assert!(n > 0);

        BlockDct {
            ph_l: PhantomData,
            n, kind,
        }
    }

    // basis entry M[k][j]
    fn entry(&self, k: usize, j: usize) -> L::F
    {
        let f1 = L::F::one();
        let f2 = f1 + f1;
        let n: L::F = NumCast::from(self.n).unwrap();
        let pi: L::F = NumCast::from(core::f64::consts::PI).unwrap();
        let jj: L::F = NumCast::from(2 * j + 1).unwrap();

        match self.kind {
            TransformKind::Dct2 => {
                let scl = if k == 0 {(f1 / n).sqrt()} else {(f2 / n).sqrt()};
                let kk: L::F = NumCast::from(k).unwrap();
                scl * (pi * kk * jj / (f2 * n)).cos()
            },
            TransformKind::Dst2 => {
                let scl = if k == self.n - 1 {(f1 / n).sqrt()} else {(f2 / n).sqrt()};
                let kk: L::F = NumCast::from(k + 1).unwrap();
                scl * (pi * kk * jj / (f2 * n)).sin()
            },
        }
    }
}

impl<L: LinAlg> Block<L> for BlockDct<L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.n, self.n)
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let xs = x.get_ref();
        let ys = y.get_mut();

        for k in 0.. self.n {
            let mut acc = L::F::zero();
            for (j, u) in xs.iter().enumerate() {
                acc = acc + self.entry(k, j) * *u;
            }
            ys[k] = ys[k] + alpha * acc;
        }
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let xs = x.get_ref();
        let ys = y.get_mut();

        for (j, v) in ys.iter_mut().enumerate() {
            let mut acc = L::F::zero();
            for (k, u) in xs.iter().enumerate() {
                acc = acc + self.entry(k, j) * *u;
            }
            *v = *v + alpha * acc;
        }
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        for (j, e) in tau.get_mut().iter_mut().enumerate() {
            let mut acc = L::F::zero();
            for k in 0.. self.n {
                acc = acc + self.entry(k, j).abs().powf(p);
            }
            *e = *e + acc;
        }
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        for (k, e) in sigma.get_mut().iter_mut().enumerate() {
            let mut acc = L::F::zero();
            for j in 0.. self.n {
                acc = acc + self.entry(k, j).abs().powf(p);
            }
            *e = *e + acc;
        }
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use super::*;

    type L = crate::FloatGeneric<f64>;

    #[test]
    fn test_dct_orthonormal()
    {
        for kind in [TransformKind::Dct2, TransformKind::Dst2] {
            let n = 8;
            let b = BlockDct::<L>::new(n, kind);

            // M^T M = I
            for j in 0.. n {
                let mut e = vec![0.; n];
                e[j] = 1.;
                let mut m = vec![0.; n];
                b.op_add(1., e.as_slice(), m.as_mut_slice());
                let mut mtm = vec![0.; n];
                b.trans_op_add(1., m.as_slice(), mtm.as_mut_slice());

                assert_float_eq!(mtm.as_ref(), e.as_ref(), abs_all <= 1e-12);
            }
        }
    }
}
