use core::marker::PhantomData;
use num_traits::{Float, Zero, One};
use crate::solver::{LinAlg, Prox, SolverError, VecLike};
use crate::prox_norm2::average_groups;

//

/// Projection onto the Euclidean ball, per group.
///
/// Splits its range into groups of a fixed length and projects each group
/// onto \\(\\{x \mid \\|x\\|_2 \le r\\}\\). An indicator prox: step sizes
/// are ignored and the result is exactly feasible.
pub struct ProxIndBall2<L: LinAlg>
{
    ph_l: PhantomData<L>,
    index: usize,
    size: usize,
    group: usize,
    radius: L::F,
}

impl<L: LinAlg> ProxIndBall2<L>
{
    /// Creates an instance on `[index, index + size)` with groups of
    /// length `group` and ball radius `radius`.
    pub fn new(index: usize, size: usize, group: usize, radius: L::F) -> Result<Self, SolverError>
    {
        if group == 0 || size % group != 0 {
            return Err(SolverError::InvalidStructure(format!(
                "range length {} is not a multiple of the group length {}", size, group)));
        }
        if radius < L::F::zero() {
            return Err(SolverError::Config("ball radius must be nonnegative".to_string()));
        }

        Ok(ProxIndBall2 {
            ph_l: PhantomData,
            index, size, group, radius,
        })
    }
}

impl<L: LinAlg> Prox<L> for ProxIndBall2<L>
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
        let f1 = L::F::one();

        let a = arg.get_ref();
        let r = result.get_mut();
        let g = self.group;

        for gi in 0.. self.size / g {
            let base = gi * g;

            let mut sq = f0;
            for k in 0.. g {
                sq = sq + a[base + k] * a[base + k];
            }
            let norm = sq.sqrt();

            let fac = if norm > self.radius {self.radius / norm} else {f1};
            for k in 0.. g {
                r[base + k] = fac * a[base + k];
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
    fn test_ball_proj()
    {
        let mut p = ProxIndBall2::<L>::new(0, 4, 2, 1.).unwrap();

        let arg = &[3., 4., 0.3, -0.4];
        let td = &[1.; 4];
        let r = &mut[0.; 4];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [0.6, 0.8, 0.3, -0.4].as_ref(), abs_all <= 1e-12);
    }
}
