use core::cell::RefCell;
use num_traits::Zero;
use crate::solver::{LinAlg, Prox, SolverError, VecLike};

//

/// Permutation wrapper.
///
/// Evaluates the inner operator on a permuted view of its range:
/// inner coordinate `k` reads outer coordinate `perm[k]`, and the inner
/// result is scattered back through the same map. Useful when a grouped
/// operator expects interleaved storage the problem does not have.
pub struct ProxPermute<'a, L: LinAlg>
{
    inner: Box<dyn Prox<L> + 'a>,
    perm: &'a[usize],
    work: RefCell<Vec<L::F>>,
}

impl<'a, L: LinAlg> ProxPermute<'a, L>
{
    /// Creates an instance borrowing the index array `perm`, which must be
    /// a permutation of `[0, inner.size())`.
    pub fn new(inner: Box<dyn Prox<L> + 'a>, perm: &'a[usize]) -> Result<Self, SolverError>
    {
        let sz = inner.size();

        if perm.len() != sz {
            return Err(SolverError::ShapeMismatch(format!(
                "permutation length {} does not match range length {}", perm.len(), sz)));
        }
        let mut seen = vec![false; sz];
        for i in perm {
            if *i >= sz || seen[*i] {
                return Err(SolverError::InvalidStructure(format!(
                    "index array is not a permutation at {}", i)));
            }
            seen[*i] = true;
        }

        let work = RefCell::new(vec![L::F::zero(); 3 * sz]);

        Ok(ProxPermute {
            inner, perm, work,
        })
    }
}

impl<'a, L: LinAlg> Prox<L> for ProxPermute<'a, L>
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
        self.inner.diagsteps()
    }

    fn eval_local(&mut self, result: &mut L::V, arg: &L::V, tau_diag: &L::V, tau: L::F, invert_tau: bool) -> Result<(), SolverError>
    {
        let sz = self.inner.size();
        let mut work = self.work.borrow_mut();
        let (w_res, w) = work.split_at_mut(sz);
        let (w_arg, w_td) = w.split_at_mut(sz);

        {
            let a = arg.get_ref();
            let td = tau_diag.get_ref();
            for (k, p) in self.perm.iter().enumerate() {
                w_arg[k] = a[*p];
                w_td[k] = td[*p];
            }
        }

        {
            let mut res = L::V::new_mut(w_res);
            let va = L::V::new_ref(w_arg);
            let vtd = L::V::new_ref(w_td);
            self.inner.eval_local(&mut res, &va, &vtd, tau, invert_tau)?;
        }

        let r = result.get_mut();
        for (k, p) in self.perm.iter().enumerate() {
            r[*p] = w_res[k];
        }

        Ok(())
    }

    fn average_steps(&self, tau_diag: &mut L::V)
    {
        // average in the inner ordering, scatter back
        let sz = self.inner.size();
        let mut work = self.work.borrow_mut();
        let (w_td, _) = work.split_at_mut(sz);

        {
            let td = tau_diag.get_ref();
            for (k, p) in self.perm.iter().enumerate() {
                w_td[k] = td[*p];
            }
        }

        {
            let mut vtd = L::V::new_mut(w_td);
            self.inner.average_steps(&mut vtd);
        }

        let td = tau_diag.get_mut();
        for (k, p) in self.perm.iter().enumerate() {
            td[*p] = w_td[k];
        }
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Prox;
    use crate::{Fun1D, Coeffs1D, Prox1D, ProxNorm2, FloatGeneric};
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_permute_pointwise()
    {
        // permuting a pointwise prox changes nothing
        let inner = Prox1D::<L>::new(0, 4, Fun1D::IndGeq0, Coeffs1D::default()).unwrap();
        let perm = &[3, 1, 0, 2];
        let mut p = ProxPermute::new(Box::new(inner), perm).unwrap();

        let arg = &[-1., 2., -3., 4.];
        let td = &[1.; 4];
        let r = &mut[0.; 4];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [0., 2., 0., 4.].as_ref(), abs_all <= 1e-12);
    }

    #[test]
    fn test_permute_grouped()
    {
        // deinterleave (x0, y0, x1, y1) so that norm2 groups see (x0, x1)
        // and (y0, y1)
        let inner = ProxNorm2::<L>::new(0, 4, 2, Fun1D::Abs, Coeffs1D::default()).unwrap();
        let perm = &[0, 2, 1, 3];
        let mut p = ProxPermute::new(Box::new(inner), perm).unwrap();

        let arg = &[3., 0.3, 4., 0.4];
        let td = &[1.; 4];
        let r = &mut[0.; 4];
        p.eval(r.as_mut(), arg.as_ref(), td.as_ref(), 1., false).unwrap();

        assert_float_eq!(r.as_ref(), [2.4, 0., 3.2, 0.].as_ref(), abs_all <= 1e-12);
    }
}
