//! Linear operator and block traits

use core::marker::PhantomData;
use crate::solver::LinAlg;

/// Linear operator trait.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Expresses a linear operator \\(K: \mathbb{R}^n \to \mathbb{R}^m\\)
/// (or a matrix \\(K \in \mathbb{R}^{m \times n}\\)) together with the
/// absolute-power sum queries that diagonal preconditioners are built from.
pub trait Operator<L: LinAlg>
{
    /// Size of \\(K\\).
    ///
    /// Returns the tuple \\((m, n)\\).
    fn size(&self) -> (usize, usize);

    /// Calculate \\(\alpha K x + \beta y\\) into `y`.
    ///
    /// The length of `x` shall be \\(n\\) and the length of `y` shall be \\(m\\).
    fn op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V);

    /// Calculate \\(\alpha K^T x + \beta y\\) into `y`.
    ///
    /// The length of `x` shall be \\(m\\) and the length of `y` shall be \\(n\\).
    fn trans_op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V);

    /// Calculate \\(\left[ \tau_j + \sum_{i=0}^{m-1}|K_{ij}|^p \right]_{j=0,\ldots,n-1}\\)
    /// into `tau`, whose length shall be \\(n\\).
    fn absadd_cols(&self, p: L::F, tau: &mut L::V);

    /// Calculate \\(\left[ \sigma_i + \sum_{j=0}^{n-1}|K_{ij}|^p \right]_{i=0,\ldots,m-1}\\)
    /// into `sigma`, whose length shall be \\(m\\).
    fn absadd_rows(&self, p: L::F, sigma: &mut L::V);
}

/// Block trait.
///
/// A block is a leaf linear map \\(M \in \mathbb{R}^{m_b \times n_b}\\)
/// placed at some `(row, col)` offset inside a composite operator
/// (see [`crate::LinOp`]). All methods operate on the block's own
/// coordinates; the composite routes the global sub-views.
///
/// The apply methods accumulate: the composite zeroes the output once and
/// every block adds its contribution.
pub trait Block<L: LinAlg>
{
    /// Size \\((m_b, n_b)\\) of the block.
    fn size(&self) -> (usize, usize);

    /// Calculate \\(y + \alpha M x\\) into `y`.
    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V);

    /// Calculate \\(y + \alpha M^T x\\) into `y`.
    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V);

    /// Add \\(\sum_i |M_{ij}|^p\\) to `tau[j]` for each column `j`.
    ///
    /// Gradient and diagonal blocks use exact analytic sums here; dense
    /// blocks reduce their stored data. Results feed preconditioner
    /// construction and must be exact, not sampled.
    fn absadd_cols(&self, p: L::F, tau: &mut L::V);

    /// Add \\(\sum_j |M_{ij}|^p\\) to `sigma[i]` for each row `i`.
    fn absadd_rows(&self, p: L::F, sigma: &mut L::V);
}

//

/// Negated adjoint adapter.
///
/// Wraps an operator \\(K\\) and exposes \\(-K^T\\), which is the operator
/// of the dualized saddle-point problem.
pub struct NegAdjoint<'a, L: LinAlg, O: Operator<L>>
{
    ph_l: PhantomData<L>,
    inner: &'a O,
}

impl<'a, L: LinAlg, O: Operator<L>> NegAdjoint<'a, L, O>
{
    /// Creates an instance viewing `inner` as \\(-{\rm inner}^T\\).
    pub fn new(inner: &'a O) -> Self
    {
        NegAdjoint {
            ph_l: PhantomData,
            inner,
        }
    }
}

impl<'a, L: LinAlg, O: Operator<L>> Operator<L> for NegAdjoint<'a, L, O>
{
    fn size(&self) -> (usize, usize)
    {
        let (m, n) = self.inner.size();

        (n, m)
    }

    fn op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V)
    {
        self.inner.trans_op(-alpha, x, beta, y);
    }

    fn trans_op(&self, alpha: L::F, x: &L::V, beta: L::F, y: &mut L::V)
    {
        self.inner.op(-alpha, x, beta, y);
    }

    fn absadd_cols(&self, p: L::F, tau: &mut L::V)
    {
        // |-K^T| sums over rows of K^T = columns swapped
        self.inner.absadd_rows(p, tau);
    }

    fn absadd_rows(&self, p: L::F, sigma: &mut L::V)
    {
        self.inner.absadd_cols(p, sigma);
    }
}
