use core::marker::PhantomData;
use num_traits::{Float, Zero, NumCast};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::solver::step_of;

//

/// Euclidean-norm grouped proximal operator.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Splits its range into groups of a fixed length and applies the scalar
/// proximal map of \\(c_g f(a_g \\|x_g\\| + b_g) + \ldots\\) to each group
/// norm, rescaling the group radially:
/// \\({\rm prox}(x_g) = \frac{t_g}{\\|x_g\\|} x_g\\) with
/// \\(t_g\\) the 1D result. With [`crate::Fun1D::Abs`] this is the grouped
/// soft shrinkage of isotropic total variation.
///
/// Per-group coefficients index by group, not by coordinate. The step size
/// must be constant within each group; [`Prox::average_steps`] makes a
/// diagonal preconditioner admissible.
pub struct ProxNorm2<'a, L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    group: usize,
    fun: crate::Fun1D,
    cf: crate::Coeffs1D<'a, L::F>,
}

impl<'a, L: LinAlg> ProxNorm2<'a, L>
{
    /// Creates an instance on `[index, index + size)` with groups of
    /// length `group`.
    pub fn new(index: usize, size: usize, group: usize, fun: crate::Fun1D, cf: crate::Coeffs1D<'a, L::F>) -> Result<Self, SolverError>
    {
        if group == 0 || size % group != 0 {
            return Err(SolverError::InvalidStructure(format!(
                "range length {} is not a multiple of the group length {}", size, group)));
        }
        cf.validate_groups(size / group)?;

        Ok(ProxNorm2 {
            ph_l: PhantomData,
            index, size, group, fun, cf,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxNorm2<'a, L>
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

        let a = arg.get_ref();
        let td = tau_diag.get_ref();
        let r = result.get_mut();
        let g = self.group;

        for gi in 0.. self.size / g {
            let base = gi * g;
            let s = step_of(tau, td[base], invert_tau);

            let mut sq = f0;
            for k in 0.. g {
                sq = sq + a[base + k] * a[base + k];
            }
            let norm = sq.sqrt();

            if norm > f0 {
                let t = self.cf.prox_at(&self.fun, gi, norm, s);
                let fac = t / norm;
                for k in 0.. g {
                    r[base + k] = fac * a[base + k];
                }
            }
            else {
                for k in 0.. g {
                    r[base + k] = f0;
                }
            }
        }

        Ok(())
    }

    fn average_steps(&self, tau_diag: &mut L::V)
    {
        average_groups::<L>(tau_diag, self.group);
    }
}

// replace each group of `group` elements by its mean
pub(crate) fn average_groups<L: LinAlg>(v: &mut L::V, group: usize)
{
    let vs = v.get_mut();
    let ng = NumCast::from(group).unwrap();

    for chunk in vs.chunks_mut(group) {
        let mut sum = L::F::zero();
        for e in chunk.iter() {
            sum = sum + *e;
        }
        let mean = sum / ng;
        for e in chunk.iter_mut() {
            *e = mean;
        }
    }
}

//
