use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;

//

/// Quadratic proximal operator with a diagonal Hessian.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The prox of \\(f(x) = \frac12 x^T Q x + q^T x\\) with
/// \\(Q = {\bf diag}(Q_{ii}),\ Q_{ii} \ge 0\\):
/// \\[
/// x_i = \frac{v_i - s_i q_i}{1 + s_i Q_{ii}}.
/// \\]
pub struct ProxQuadDiag<'a, L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    hess: &'a[L::F],
    lin: &'a[L::F],
}

impl<'a, L: LinAlg> ProxQuadDiag<'a, L>
{
    /// Creates an instance on `[index, index + size)` borrowing the
    /// Hessian diagonal `hess` and the linear term `lin`.
    pub fn new(index: usize, size: usize, hess: &'a[L::F], lin: &'a[L::F]) -> Result<Self, SolverError>
    {
        if hess.len() != size || lin.len() != size {
            return Err(SolverError::ShapeMismatch(format!(
                "hessian length {} or linear length {} does not match range length {}",
                hess.len(), lin.len(), size)));
        }
        if hess.iter().any(|q| *q < L::F::zero()) {
            return Err(SolverError::Config("hessian diagonal must be nonnegative".to_string()));
        }

        Ok(ProxQuadDiag {
            ph_l: PhantomData,
            index, size, hess, lin,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxQuadDiag<'a, L>
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
        let f1 = L::F::one();

        let a = arg.get_ref();
        let td = tau_diag.get_ref();
        let r = result.get_mut();

        for i in 0.. r.len() {
            let s = step_of(tau, td[i], invert_tau);

            // divide through by s when it is large, keeping the formula
            // finite as s grows without bound
            r[i] = if s <= f1 {
                (a[i] - s * self.lin[i]) / (f1 + s * self.hess[i])
            }
            else {
                (a[i] / s - self.lin[i]) / (s.recip() + self.hess[i])
            };
        }

        Ok(())
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Prox;
    use crate::FloatGeneric;
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_prox_quad()
    {
        let hess = &[2., 2., 0.];
        let lin = &[0., -1., 1.];
        let mut p = ProxQuadDiag::<L>::new(0, 3, hess, lin).unwrap();

        let arg = &[3., 3., 3.];
        let td = &[1.; 3];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [1., 4. / 3., 2.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_prox_quad_large_step()
    {
        // s -> infinity tends to the unconstrained minimizer -q/Q
        let hess = &[2.];
        let lin = &[-4.];
        let mut p = ProxQuadDiag::<L>::new(0, 1, hess, lin).unwrap();

        let arg = &[0.];
        let td = &[1.];
        let r = &mut[0.];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1e30, false).unwrap();

        assert_float_eq!(r[0], 2., abs <= 1e-9);
    }
}
