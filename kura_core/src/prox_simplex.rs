use core::marker::PhantomData;
use num_traits::{Float, Zero, NumCast};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::prox_norm2::average_groups;

//

/// Projection onto the standard simplex, per group.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Splits its range into groups of a fixed length and projects each group
/// onto \\(\\{x \ge 0, \sum_i x_i = r\\}\\) by Michelot's iterative
/// threshold search. As the prox of an indicator it ignores step sizes and
/// its result is exactly feasible: the active coordinates are set from the
/// final threshold, the rest to zero.
pub struct ProxIndSimplex<L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    group: usize,
    radius: L::F,
}

impl<L: LinAlg> ProxIndSimplex<L>
{
    /// Creates an instance on `[index, index + size)` with groups of
    /// length `group` summing to `radius`.
    pub fn new(index: usize, size: usize, group: usize, radius: L::F) -> Result<Self, SolverError>
    {
        if group == 0 || size % group != 0 {
            return Err(SolverError::InvalidStructure(format!(
                "range length {} is not a multiple of the group length {}", size, group)));
        }
        if radius <= L::F::zero() {
            return Err(SolverError::Config("simplex radius must be positive".to_string()));
        }

        Ok(ProxIndSimplex {
            ph_l: PhantomData,
            index, size, group, radius,
        })
    }
}

impl<L: LinAlg> Prox<L> for ProxIndSimplex<L>
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

    fn eval_local(&mut self, result: &mut L::V, arg: &L::V, _tau_diag: &L::V, _tau: L::F, _invert_tau: bool) -> Result<(), SolverError>
    {
        let f0 = L::F::zero();

        let a = arg.get_ref();
        let r = result.get_mut();
        let g = self.group;

        for gi in 0.. self.size / g {
            let base = gi * g;
            let v = &a[base.. base + g];

            // Michelot: iterate the threshold over the active set
            let mut sum = f0;
            for e in v {
                sum = sum + *e;
            }
            let mut th = (sum - self.radius) / NumCast::from(g).unwrap();

            for _ in 0.. g {
                let mut s = f0;
                let mut cnt = 0;
                for e in v {
                    if *e > th {
                        s = s + *e;
                        cnt += 1;
                    }
                }
                let th_new = (s - self.radius) / NumCast::from(cnt).unwrap();
                if !(th_new > th) {
                    break;
                }
                th = th_new;
            }

            for k in 0.. g {
                r[base + k] = (v[k] - th).max(f0);
            }
        }

        Ok(())
    }

    fn average_steps(&self, tau_diag: &mut L::V)
    {
        average_groups::<L>(tau_diag, self.group);
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
    fn test_simplex_proj()
    {
        let mut p = ProxIndSimplex::<L>::new(0, 3, 3, 1.).unwrap();

        let arg = &[0.8, 0.6, -1.];
        let td = &[1.; 3];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        // feasibility is exact
        let sum: f64 = r.iter().sum();
        assert_float_eq!(sum, 1., abs <= 1e-12);
        assert!(r.iter().all(|e| *e >= 0.));
        assert_float_eq!(r.as_ref(), [0.6, 0.4, 0.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_simplex_inside()
    {
        // a feasible point is a fixed point
        let mut p = ProxIndSimplex::<L>::new(0, 3, 3, 1.).unwrap();

        let arg = &[0.2, 0.3, 0.5];
        let td = &[1.; 3];
        let r = &mut[0.; 3];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), arg.as_ref(), abs_all <= 1e-12);
    }
}
