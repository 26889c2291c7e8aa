//! Proximal operator trait

use num_traits::Float;
use crate::solver::{LinAlg, SolverError, VecLike};
use crate::{subv, subv_mut};

/// Proximal operator trait.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Expresses \\((I + s\partial f)^{-1}\\) of a convex function \\(f\\) acting
/// on the contiguous index range `[index, index + size)` of a variable
/// vector. The effective step size of coordinate \\(k\\) is
/// \\(s_k = \tau \cdot \tau^{\rm diag}\_k\\) when the operator honors
/// per-coordinate step sizes ([`Prox::diagsteps`]), \\(\tau\\) otherwise,
/// and is replaced by \\(1/s_k\\) when `invert_tau` is set.
pub trait Prox<L: LinAlg>
{
    /// First index of the range this operator acts on.
    fn index(&self) -> usize;

    /// Length of the range this operator acts on.
    fn size(&self) -> usize;

    /// Whether per-coordinate step sizes are honored.
    ///
    /// An operator reporting `false` uses the scalar \\(\tau\\) alone and
    /// requires a step-size vector that is constant over its range.
    fn diagsteps(&self) -> bool;

    /// Evaluates the operator on pre-sliced sub-views of length
    /// [`Prox::size`], in the operator's own coordinates.
    fn eval_local(&mut self, result: &mut L::V, arg: &L::V, tau_diag: &L::V, tau: L::F, invert_tau: bool) -> Result<(), SolverError>;

    /// Averages a step-size sub-vector (length [`Prox::size`], local
    /// coordinates) over the operator's separable groups.
    ///
    /// Group-coupled operators need one step size per group; preconditioner
    /// construction calls this to make the diagonal admissible. Pointwise
    /// operators keep the default no-op.
    fn average_steps(&self, _tau_diag: &mut L::V)
    {
    }

    /// Evaluates the operator on full-length vectors.
    ///
    /// * `result`, `arg` and `tau_diag` are vectors of the full variable
    ///   length; only `result[index .. index + size)` is mutated.
    /// * `tau` is the scalar step size factor.
    /// * If `invert_tau` is `true`, the effective step sizes are inverted.
    fn eval(&mut self, result: &mut L::V, arg: &L::V, tau_diag: &L::V, tau: L::F, invert_tau: bool) -> Result<(), SolverError>
    {
        let (idx, sz) = (self.index(), self.size());

        if arg.len() != result.len() || tau_diag.len() != result.len() {
            return Err(SolverError::ShapeMismatch(format!(
                "prox arguments disagree in length: result {}, arg {}, tau_diag {}",
                result.len(), arg.len(), tau_diag.len())));
        }
        if idx + sz > result.len() {
            return Err(SolverError::ShapeMismatch(format!(
                "prox range [{}, {}) exceeds variable length {}",
                idx, idx + sz, result.len())));
        }

        subv_mut!(result, (_r_head; idx), (r; sz));
        subv!(arg, (_a_head; idx), (a; sz));
        subv!(tau_diag, (_t_head; idx), (t; sz));

        self.eval_local(&mut r, &a, &t, tau, invert_tau)
    }
}

/// Effective step size of one coordinate.
pub(crate) fn step_of<F: Float>(tau: F, tau_diag: F, invert_tau: bool) -> F
{
    let s = tau * tau_diag;

    if invert_tau {s.recip()} else {s}
}
