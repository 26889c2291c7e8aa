use num_traits::{Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;

//

/// Affine coefficient wrapper.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Given an inner operator for \\(f\\), evaluates the proximal map of
/// \\[
/// h(x) = c \cdot f(a x + b) + d x + \frac{e}{2} x^2
/// \\]
/// with scalar coefficients. The calculus of proximal operators of affine
/// compositions reduces it to one inner evaluation:
/// \\[
/// \tilde v = \frac{a (v - s d)}{1 + s e} + b, \quad
/// \tilde s = \frac{s c a^2}{1 + s e}, \quad
/// {\rm prox}_{s h}(v) = \frac{{\rm prox}_{\tilde s f}(\tilde v) - b}{a},
/// \\]
/// where \\(\tilde s\\) enters the inner operator as a per-coordinate step
/// vector, so the inner operator must honor diagonal steps.
pub struct ProxTransform<'a, L: LinAlg>
{
    inner: Box<dyn Prox<L> + 'a>,
    a: L::F,
    b: L::F,
    c: L::F,
    d: L::F,
    e: L::F,
    work: Vec<L::F>,
}

impl<'a, L: LinAlg> ProxTransform<'a, L>
{
    /// Creates an instance wrapping `inner`.
    ///
    /// Requires `a != 0`, `c > 0`, `e >= 0` and a diagstep-capable inner
    /// operator; fails with [`SolverError::Config`] otherwise.
    pub fn new(inner: Box<dyn Prox<L> + 'a>, a: L::F, b: L::F, c: L::F, d: L::F, e: L::F) -> Result<Self, SolverError>
    {
        let f0 = L::F::zero();

        if a == f0 {
            return Err(SolverError::Config("coefficient a must be nonzero".to_string()));
        }
        if c <= f0 {
            return Err(SolverError::Config("coefficient c must be positive".to_string()));
        }
        if e < f0 {
            return Err(SolverError::Config("coefficient e must be nonnegative".to_string()));
        }
        if !inner.diagsteps() {
            return Err(SolverError::Config(
                "transform wrapper requires a diagstep-capable inner operator".to_string()));
        }

        let work = vec![f0; 2 * inner.size()];

        Ok(ProxTransform {
            inner, a, b, c, d, e, work,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxTransform<'a, L>
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
        let f1 = L::F::one();
        let sz = self.inner.size();
        let (w_arg, w_tau) = self.work.split_at_mut(sz);

        {
            let v = arg.get_ref();
            let td = tau_diag.get_ref();
            for i in 0.. sz {
                let s = step_of(tau, td[i], invert_tau);
                let den = f1 + s * self.e;
                w_arg[i] = self.a * (v[i] - s * self.d) / den + self.b;
                w_tau[i] = s * self.c * self.a * self.a / den;
            }
        }

        {
            let va = L::V::new_ref(w_arg);
            let vtd = L::V::new_ref(w_tau);
            self.inner.eval_local(result, &va, &vtd, f1, false)?;
        }

        let r = result.get_mut();
        for v in r.iter_mut() {
            *v = (*v - self.b) / self.a;
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
    use crate::{Fun1D, Coef, Coeffs1D, Prox1D, FloatGeneric};
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_transform_matches_coeffs()
    {
        // the wrapper over a plain 1D prox equals the 1D prox with the
        // same coefficient pack
        let (a, b, c, d, e) = (2., -1., 0.5, 0.3, 0.2);

        let inner = Prox1D::<L>::new(0, 3, Fun1D::Abs, Coeffs1D::default()).unwrap();
        let mut wrapped = ProxTransform::new(Box::new(inner), a, b, c, d, e).unwrap();

        let cf = Coeffs1D {
            a: Coef::Scal(a),
            b: Coef::Scal(b),
            c: Coef::Scal(c),
            d: Coef::Scal(d),
            e: Coef::Scal(e),
            .. Coeffs1D::default()
        };
        let mut direct = Prox1D::<L>::new(0, 3, Fun1D::Abs, cf).unwrap();

        let arg = &[-2., 0.4, 1.7];
        let td = &[1., 0.5, 2.];
        let tau = 0.7;

        let r_w = &mut[0.; 3];
        wrapped.eval(r_w.as_mut(), arg.as_ref(), td.as_ref(), tau, false).unwrap();

        let r_d = &mut[0.; 3];
        direct.eval(r_d.as_mut(), arg.as_ref(), td.as_ref(), tau, false).unwrap();

        assert_float_eq!(r_w.as_ref(), r_d.as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_transform_square()
    {
        // h(x) = c * (1/2)(a x)^2, prox at s: v / (1 + s c a^2)
        let inner = Prox1D::<L>::new(0, 1, Fun1D::Square, Coeffs1D::default()).unwrap();
        let mut p = ProxTransform::new(Box::new(inner), 3., 0., 2., 0., 0.).unwrap();

        let arg = &[19.];
        let td = &[1.];
        let r = &mut[0.];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r[0], 1., abs <= 1e-12);
    }
}
