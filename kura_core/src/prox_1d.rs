use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;

//

/// Scalar function kind of a separable proximal operator.
///
/// Each kind names a convex scalar function \\(f\\); the associated
/// [`Fun1D::prox`] evaluates
/// \\({\rm prox}\_{\tau f}(x_0) = \arg\min_x f(x) + \frac{1}{2\tau}(x-x_0)^2\\)
/// in closed form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fun1D
{
    /// \\(f = 0\\)
    Zero,
    /// \\(f(x) = |x|\\)
    Abs,
    /// \\(f(x) = \frac12 x^2\\)
    Square,
    /// Huber function of parameter \\(\alpha\\)
    Huber,
    /// \\(f(x) = \\#\\{x \ne 0\\}\\) (nonconvex counting penalty,
    /// hard thresholding)
    L0,
    /// Indicator of \\(x \le 0\\)
    IndLeq0,
    /// Indicator of \\(x \ge 0\\)
    IndGeq0,
    /// Indicator of \\(x = 0\\)
    IndEq0,
    /// Indicator of \\(0 \le x \le 1\\)
    IndBox01,
    /// \\(f(x) = \max(x, 0)\\)
    MaxPos0,
}

impl Fun1D
{
    /// Evaluates the scalar proximal map of the function.
    ///
    /// * `x0` is the argument, `tau` the step size.
    /// * `alpha` and `beta` are the function's own parameters
    ///   (only Huber reads `alpha`; `beta` is reserved).
    pub fn prox<F: Float>(&self, x0: F, tau: F, alpha: F, _beta: F) -> F
    {
        let f0 = F::zero();
        let f1 = F::one();

        match self {
            Fun1D::Zero => x0,
            Fun1D::Abs => {
                if x0 >= tau {
                    x0 - tau
                }
                else if x0 <= -tau {
                    x0 + tau
                }
                else {
                    f0
                }
            },
            Fun1D::Square => x0 / (f1 + tau),
            Fun1D::Huber => {
                // prox of huber_alpha; x0/(tau+alpha) is stable for tau -> 0
                let mut r = x0 / (tau + alpha);
                r = r / f1.max(r.abs());
                x0 - tau * r
            },
            Fun1D::L0 => {
                if x0 * x0 > tau + tau {x0} else {f0}
            },
            Fun1D::IndLeq0 => x0.min(f0),
            Fun1D::IndGeq0 => x0.max(f0),
            Fun1D::IndEq0 => f0,
            Fun1D::IndBox01 => x0.max(f0).min(f1),
            Fun1D::MaxPos0 => {
                if x0 > tau {
                    x0 - tau
                }
                else if x0 < f0 {
                    x0
                }
                else {
                    f0
                }
            },
        }
    }

    /// Whether the function is an indicator, whose proximal map ignores
    /// the step size.
    pub fn is_indicator(&self) -> bool
    {
        matches!(self, Fun1D::IndLeq0 | Fun1D::IndGeq0 | Fun1D::IndEq0 | Fun1D::IndBox01)
    }
}

//

/// A coefficient stored once per range or once per coordinate.
#[derive(Debug, Clone, Copy)]
pub enum Coef<'a, F: Float>
{
    /// One value for the whole range.
    Scal(F),
    /// One value per coordinate (or per group for grouped operators).
    PerElem(&'a[F]),
}

impl<'a, F: Float> Coef<'a, F>
{
    fn at(&self, i: usize) -> F
    {
        match self {
            Coef::Scal(v) => *v,
            Coef::PerElem(v) => v[i],
        }
    }

    fn len_ok(&self, n: usize) -> bool
    {
        match self {
            Coef::Scal(_) => true,
            Coef::PerElem(v) => v.len() == n,
        }
    }

    fn is(&self, v: F) -> bool
    {
        matches!(self, Coef::Scal(s) if *s == v)
    }
}

/// Coefficient pack of the generalized separable prox.
///
/// The operator evaluates the proximal map of
/// \\(h(x) = c \cdot f(a x + b) + d x + \frac{e}{2} x^2\\)
/// per coordinate, with `alpha`/`beta` forwarded to the scalar function.
#[derive(Debug, Clone, Copy)]
pub struct Coeffs1D<'a, F: Float>
{
    pub a: Coef<'a, F>,
    pub b: Coef<'a, F>,
    pub c: Coef<'a, F>,
    pub d: Coef<'a, F>,
    pub e: Coef<'a, F>,
    pub alpha: F,
    pub beta: F,
}

impl<'a, F: Float> Default for Coeffs1D<'a, F>
{
    fn default() -> Self
    {
        let f0 = F::zero();
        let f1 = F::one();

        Coeffs1D {
            a: Coef::Scal(f1),
            b: Coef::Scal(f0),
            c: Coef::Scal(f1),
            d: Coef::Scal(f0),
            e: Coef::Scal(f0),
            alpha: f0,
            beta: f0,
        }
    }
}

impl<'a, F: Float> Coeffs1D<'a, F>
{
    pub(crate) fn validate(&self, n: usize) -> Result<(), SolverError>
    {
        if !(self.a.len_ok(n) && self.b.len_ok(n) && self.c.len_ok(n)
             && self.d.len_ok(n) && self.e.len_ok(n)) {
            return Err(SolverError::ShapeMismatch(format!(
                "per-coordinate coefficient length does not match range length {}", n)));
        }
        if let Coef::Scal(a) = self.a {
            if a == F::zero() {
                return Err(SolverError::Config("coefficient a must be nonzero".to_string()));
            }
        }
        if let Coef::PerElem(a) = self.a {
            if a.iter().any(|v| *v == F::zero()) {
                return Err(SolverError::Config("coefficient a must be nonzero".to_string()));
            }
        }

        Ok(())
    }

    /// Validates per-group coefficient lengths of grouped operators.
    pub(crate) fn validate_groups(&self, n_groups: usize) -> Result<(), SolverError>
    {
        self.validate(n_groups)
    }

    fn is_default(&self) -> bool
    {
        let f0 = F::zero();
        let f1 = F::one();

        self.a.is(f1) && self.b.is(f0) && self.c.is(f1) && self.d.is(f0) && self.e.is(f0)
    }

    /// Evaluates the proximal map of the weighted function at one
    /// coordinate, reducing to the plain scalar prox by the affine
    /// calculus of proximal operators.
    pub(crate) fn prox_at(&self, fun: &Fun1D, i: usize, v: F, s: F) -> F
    {
        let f1 = F::one();

        let (ca, cb, cc, cd, ce) =
            (self.a.at(i), self.b.at(i), self.c.at(i), self.d.at(i), self.e.at(i));

        // prox_{s h}(v) with h(x) = c f(ax+b) + dx + (e/2)x^2 reduces to
        //   u = prox_{s~ f}(x~),  x~ = a(v - s d)/(1 + s e) + b,
        //                         s~ = s c a^2 / (1 + s e),
        //   result = (u - b)/a
        let den = f1 + s * ce;
        let xt = ca * (v - s * cd) / den + cb;
        let st = s * cc * ca * ca / den;
        let u = fun.prox(xt, st, self.alpha, self.beta);

        (u - cb) / ca
    }
}

//

/// Separable 1D proximal operator over a contiguous index range.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Applies the scalar proximal map of
/// \\(c_k f(a_k x_k + b_k) + d_k x_k + \frac{e_k}{2} x_k^2\\)
/// to every coordinate of its range. Indicator kinds with default
/// coefficients evaluate through device clamp kernels; the general path is
/// a pointwise loop.
pub struct Prox1D<'a, L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    fun: Fun1D,
    cf: Coeffs1D<'a, L::F>,
}

impl<'a, L: LinAlg> Prox1D<'a, L>
{
    /// Creates an instance on `[index, index + size)`.
    ///
    /// Returns [`SolverError::Config`] or [`SolverError::ShapeMismatch`]
    /// on an inadmissible coefficient pack.
    pub fn new(index: usize, size: usize, fun: Fun1D, cf: Coeffs1D<'a, L::F>) -> Result<Self, SolverError>
    {
        cf.validate(size)?;

        Ok(Prox1D {
            ph_l: PhantomData,
            index, size, fun, cf,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for Prox1D<'a, L>
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

        if self.fun.is_indicator() && self.cf.is_default() {
            L::copy(arg, result);
            match self.fun {
                Fun1D::IndLeq0 => L::clamp_max(f0, result),
                Fun1D::IndGeq0 => L::clamp_min(f0, result),
                Fun1D::IndEq0 => L::fill(f0, result),
                Fun1D::IndBox01 => {
                    L::clamp_min(f0, result);
                    L::clamp_max(f1, result);
                },
                _ => unreachable!(),
            }
            return Ok(());
        }

        let a = arg.get_ref();
        let td = tau_diag.get_ref();
        let r = result.get_mut();

        for i in 0.. r.len() {
            let s = step_of(tau, td[i], invert_tau);
            r[i] = self.cf.prox_at(&self.fun, i, a[i], s);
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
    fn test_prox1d_square()
    {
        // prox of (1/2)||x - 0||^2 at tau=1 is arg / 2
        let mut p = Prox1D::<L>::new(0, 3, Fun1D::Square, Coeffs1D::default()).unwrap();

        let arg = &[1., 2., 3.];
        let td = &[1., 1., 1.];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [0.5, 1.0, 1.5].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_prox1d_box()
    {
        let mut p = Prox1D::<L>::new(0, 3, Fun1D::IndBox01, Coeffs1D::default()).unwrap();

        let arg = &[-0.3, 0.5, 1.7];
        let td = &[1., 1., 1.];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [0., 0.5, 1.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_prox1d_abs_shift()
    {
        // f(x) = |x - 2| via b = -2: prox at tau=1 soft-thresholds around 2
        let cf = Coeffs1D {
            b: Coef::Scal(-2.),
            .. Coeffs1D::default()
        };
        let mut p = Prox1D::<L>::new(0, 3, Fun1D::Abs, cf).unwrap();

        let arg = &[0., 2.5, 4.];
        let td = &[1., 1., 1.];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [1., 2., 3.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_prox1d_range()
    {
        // only [1, 3) of the variable is touched
        let mut p = Prox1D::<L>::new(1, 2, Fun1D::IndGeq0, Coeffs1D::default()).unwrap();

        let arg = &[-1., -1., -1., -1.];
        let td = &[1.; 4];
        let r = &mut[9., 9., 9., 9.];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [9., 0., 0., 9.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_prox1d_moreau_identity()
    {
        // prox_{tf}(x) + t prox_{f*/t}(x/t) = x for f = |.|
        let mut p = Prox1D::<L>::new(0, 1, Fun1D::Abs, Coeffs1D::default()).unwrap();

        for x in [-2., -0.3, 0., 0.4, 3.] {
            let t: f64 = 0.7;
            let td = &[1.];

            let r = &mut[0.];
            p.eval(r.as_mut(), [x].as_ref(), td.as_ref(), t, false).unwrap();

            // prox_{f*/t}(x/t) with f* the unit-interval indicator: clamp
            let conj = (x / t).max(-1.).min(1.);

            assert_float_eq!(r[0] + t * conj, x, abs <= 1e-12);
        }
    }
}
