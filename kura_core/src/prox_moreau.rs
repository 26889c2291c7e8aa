use num_traits::{Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;

//

/// Moreau conjugation wrapper.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Given an inner operator evaluating \\({\rm prox}\_{s f}\\), evaluates
/// \\({\rm prox}\_{s f^\*}\\) through the Moreau identity
/// \\[
/// {\rm prox}_{s f^\*}(v) = v - s \cdot {\rm prox}_{f/s}(v/s),
/// \\]
/// realized by dividing the argument by the effective steps, evaluating
/// the inner operator with inverted steps, and recombining. Applying the
/// wrapper twice recovers the inner operator up to roundoff.
pub struct ProxMoreau<'a, L: LinAlg>
{
    inner: Box<dyn Prox<L> + 'a>,
    work: Vec<L::F>,
}

impl<'a, L: LinAlg> ProxMoreau<'a, L>
{
    /// Creates an instance conjugating `inner`.
    pub fn new(inner: Box<dyn Prox<L> + 'a>) -> Self
    {
        let work = vec![L::F::zero(); inner.size()];

        ProxMoreau {
            inner, work,
        }
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxMoreau<'a, L>
{
    fn index(&self) -> usize
    {
        self.inner.index()
    }

    fn size(&self) -> usize
    {
        self.inner.size()
    }

    fn diagsteps(&self) -> bool
    {
        true
    }

    fn eval_local(&mut self, result: &mut L::V, arg: &L::V, tau_diag: &L::V, tau: L::F, invert_tau: bool) -> Result<(), SolverError>
    {
        let diag = self.inner.diagsteps();
        let f1 = L::F::one();

        // work = arg ./ s
        {
            let a = arg.get_ref();
            let td = tau_diag.get_ref();
            for (i, w) in self.work.iter_mut().enumerate() {
                let s = step_of(tau, if diag {td[i]} else {f1}, invert_tau);
                *w = a[i] / s;
            }
        }

        // result = prox_{f/s}(work), evaluated with inverted steps
        {
            let w = L::V::new_mut(&mut self.work);
            self.inner.eval_local(result, &w, tau_diag, tau, !invert_tau)?;
            drop(w);
        }

        // result = arg - s .* result
        {
            let a = arg.get_ref();
            let td = tau_diag.get_ref();
            let r = result.get_mut();
            for i in 0.. r.len() {
                let s = step_of(tau, if diag {td[i]} else {f1}, invert_tau);
                r[i] = a[i] - s * r[i];
            }
        }

        Ok(())
    }

    fn average_steps(&self, tau_diag: &mut L::V)
    {
        self.inner.average_steps(tau_diag);
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Prox;
    use crate::{Fun1D, Coeffs1D, Prox1D, FloatGeneric};
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_moreau_abs()
    {
        // conjugate of 0.5|.| is the indicator of [-0.5, 0.5], whose prox
        // clips regardless of the step size
        let cf = Coeffs1D {
            c: crate::Coef::Scal(0.5),
            .. Coeffs1D::default()
        };
        let inner = Prox1D::<L>::new(0, 3, Fun1D::Abs, cf).unwrap();
        let mut p = ProxMoreau::new(Box::new(inner));

        let arg = &[-1., 0.2, 0.7];
        let td = &[1.; 3];

        for tau in [0.3, 1., 4.] {
            let r = &mut[0.; 3];
            p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), tau, false).unwrap();

            assert_float_eq!(r.as_ref(), [-0.5, 0.2, 0.5].as_ref(), abs_all <= 1e-12);
        }
    }

    #[test]
    fn test_double_moreau()
    {
        // Moreau(Moreau(P)) == P
        let inner = Prox1D::<L>::new(0, 4, Fun1D::Abs, Coeffs1D::default()).unwrap();
        let mut pp = ProxMoreau::new(Box::new(ProxMoreau::new(Box::new(inner))));

        let mut plain = Prox1D::<L>::new(0, 4, Fun1D::Abs, Coeffs1D::default()).unwrap();

        let arg = &[-2., -0.1, 0.4, 3.];
        let td = &[1., 0.5, 2., 1.];
        let tau = 0.8;

        let r_pp = &mut[0.; 4];
        pp.eval(r_pp.as_mut(), arg.as_ref(), td.as_ref(), tau, false).unwrap();

        let r_pl = &mut[0.; 4];
        plain.eval(r_pl.as_mut(), arg.as_ref(), td.as_ref(), tau, false).unwrap();

        assert_float_eq!(r_pp.as_ref(), r_pl.as_ref(), abs_all <= 1e-7);
    }
}
