use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;
use crate::prox_norm2::average_groups;

//

/// Singular-value proximal operator of N x 2 matrix groups.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Each group of \\(2N\\) values is an \\(N \times 2\\) matrix \\(A\\)
/// stored by columns. With \\(A = U\,{\bf diag}(s_1, s_2)\,V^T\\), the
/// result is \\(U\,{\bf diag}(t_1, t_2)\,V^T\\) where \\(t_i\\) applies
/// the scalar proximal map to the singular value \\(s_i\\). The two
/// singular pairs come from the closed-form eigendecomposition of the
/// \\(2 \times 2\\) Gram matrix \\(A^T A\\), so no iterative factorization
/// is involved. With [`crate::Fun1D::Abs`] this is the nuclear-norm
/// shrinkage used by vector-valued total variation.
pub struct ProxSingularNx2<'a, L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    nrows: usize,
    fun: crate::Fun1D,
    cf: crate::Coeffs1D<'a, L::F>,
    eps_zero: L::F,
}

impl<'a, L: LinAlg> ProxSingularNx2<'a, L>
{
    /// Creates an instance on `[index, index + size)` with groups of
    /// `nrows` x 2 matrices.
    ///
    /// * `eps_zero` is the threshold below which a singular value is
    ///   treated as zero.
    pub fn new(index: usize, size: usize, nrows: usize, fun: crate::Fun1D, cf: crate::Coeffs1D<'a, L::F>, eps_zero: L::F) -> Result<Self, SolverError>
    {
        let g = 2 * nrows;
        if nrows == 0 || size % g != 0 {
            return Err(SolverError::InvalidStructure(format!(
                "range length {} is not a multiple of the group length {}", size, g)));
        }
        cf.validate_groups(size / g)?;

        Ok(ProxSingularNx2 {
            ph_l: PhantomData,
            index, size, nrows, fun, cf, eps_zero,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxSingularNx2<'a, L>
{
    fn index(&self) -> usize
    {
        self.index
    }

    fn size(&self) -> usize
    {
        self.size
    }

    fn diagsteps(&self) -> bool
    {
        true
    }

    fn eval_local(&mut self, result: &mut L::V, arg: &L::V, tau_diag: &L::V, tau: L::F, invert_tau: bool) -> Result<(), SolverError>
    {
        let f0 = L::F::zero();
        let f1 = L::F::one();
        let f2 = f1 + f1;

        let av = arg.get_ref();
        let td = tau_diag.get_ref();
        let r = result.get_mut();
        let n = self.nrows;
        let g = 2 * n;

        for gi in 0.. self.size / g {
            let base = gi * g;
            let s = step_of(tau, td[base], invert_tau);
            let (ca, cb) = (&av[base.. base + n], &av[base + n.. base + g]);

            // Gram matrix of the N x 2 group
            let mut g11 = f0;
            let mut g12 = f0;
            let mut g22 = f0;
            for k in 0.. n {
                g11 = g11 + ca[k] * ca[k];
                g12 = g12 + ca[k] * cb[k];
                g22 = g22 + cb[k] * cb[k];
            }

            let mean = (g11 + g22) / f2;
            let disc = ((g11 - g22) * (g11 - g22) / (f2 * f2) + g12 * g12).sqrt();
            let sv1 = (mean + disc).max(f0).sqrt();
            let sv2 = (mean - disc).max(f0).sqrt();

            let t1 = self.cf.prox_at(&self.fun, gi, sv1, s);
            let t2 = self.cf.prox_at(&self.fun, gi, sv2, s);
            let fac1 = if sv1 > self.eps_zero {t1 / sv1} else {f0};
            let fac2 = if sv2 > self.eps_zero {t2 / sv2} else {f0};

            // right-singular vectors from the Gram eigenpairs
            let (v1, v2) = if g12.abs() > self.eps_zero * f1.max(mean) {
                let l1 = mean + disc;
                let w = (g12, l1 - g11);
                let wn = (w.0 * w.0 + w.1 * w.1).sqrt();
                let v1 = (w.0 / wn, w.1 / wn);
                (v1, (-v1.1, v1.0))
            }
            else if g11 >= g22 {
                ((f1, f0), (f0, f1))
            }
            else {
                ((f0, f1), (f1, f0))
            };

            // M = fac1 v1 v1^T + fac2 v2 v2^T, result = A M
            let m11 = fac1 * v1.0 * v1.0 + fac2 * v2.0 * v2.0;
            let m12 = fac1 * v1.0 * v1.1 + fac2 * v2.0 * v2.1;
            let m22 = fac1 * v1.1 * v1.1 + fac2 * v2.1 * v2.1;

            for k in 0.. n {
                r[base + k] = ca[k] * m11 + cb[k] * m12;
                r[base + n + k] = ca[k] * m12 + cb[k] * m22;
            }
        }

        Ok(())
    }

    fn average_steps(&self, tau_diag: &mut L::V)
    {
        average_groups::<L>(tau_diag, 2 * self.nrows);
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Prox;
    use crate::{Fun1D, Coeffs1D, FloatGeneric};
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_singular_diagonal()
    {
        // A = diag(3, 4): singular values 3 and 4, soft threshold 1
        let mut p = ProxSingularNx2::<L>::new(0, 4, 2, Fun1D::Abs, Coeffs1D::default(), 1e-12).unwrap();

        let arg = &[3., 0., 0., 4.];
        let td = &[1.; 4];
        let r = &mut[0.; 4];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [2., 0., 0., 3.].as_ref(), abs_all <= 1e-10);
    }

    #[test]
    fn test_singular_rotated()
    {
        // rank-one A = u w^T with |u| = 5, w = (cos t, sin t):
        // the single singular value is 5, shrinking by 1 scales A by 4/5
        let (c, s) = (0.6, 0.8);
        let arg = &[3. * c, 4. * c, 3. * s, 4. * s];
        let td = &[1.; 4];

        let mut p = ProxSingularNx2::<L>::new(0, 4, 2, Fun1D::Abs, Coeffs1D::default(), 1e-12).unwrap();
        let r = &mut[0.; 4];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        let expect: Vec<f64> = arg.iter().map(|v| v * 0.8).collect();
        assert_float_eq!(r.as_ref(), expect.as_slice(), abs_all <= 1e-10);
    }
}
