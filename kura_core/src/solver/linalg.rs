//! Linear algebra backend

use num_traits::Float;
use crate::solver::VecLike;

/// Linear algebra trait.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The elementwise and reduction kernels the solver is built from.
/// All operations are understood as asynchronous with respect to the host
/// and serialized per backend instance; only the reductions returning a
/// scalar force the host to block. Partial reductions are obtained by
/// applying a reduction to a sub-view (see [`VecLike::split_ref`]).
pub trait LinAlg
{
    /// Floating point data type used as scalars.
    type F: Float;

    /// Data type of vectors of `F`.
    type V: VecLike<F=Self::F> + ?Sized;

    /// Calculate 2-norm \\(\\|x\\|_2=\sqrt{\sum_i x_i^2}\\).
    fn norm(x: &Self::V) -> Self::F;

    /// Calculate \\(\infty\\)-norm \\(\\|x\\|_\infty=\max_i |x_i|\\).
    fn norm_inf(x: &Self::V) -> Self::F;

    /// Calculate 1-norm \\(\\|x\\|_1=\sum_i |x_i|\\).
    ///
    /// * `incx` is the spacing between elements of `x`;
    ///   only every `incx`-th element enters the sum.
    fn abssum(x: &Self::V, incx: usize) -> Self::F;

    /// Calculate \\(\sum_i |x_i|^p\\).
    ///
    /// * `incx` as in [`LinAlg::abssum`].
    fn abspowsum(x: &Self::V, p: Self::F, incx: usize) -> Self::F;

    /// Copy from a vector `x` to another vector `y` of the same length.
    fn copy(x: &Self::V, y: &mut Self::V);

    /// Fill `y` with a value `a`.
    fn fill(a: Self::F, y: &mut Self::V);

    /// Calculate \\(\alpha x\\) in place.
    fn scale(alpha: Self::F, x: &mut Self::V);

    /// Calculate \\(\alpha x + y\\) into `y`. `x` and `y` shall have the
    /// same length.
    fn add(alpha: Self::F, x: &Self::V, y: &mut Self::V);

    /// Calculate \\(s\mathbb{1} + y\\) into `y`.
    fn adds(s: Self::F, y: &mut Self::V);

    /// Calculate \\(y_i / x_i\\) into `y` elementwise.
    /// `x` and `y` shall have the same length.
    fn elem_div(x: &Self::V, y: &mut Self::V);

    /// Calculate \\(\max(y_i, a)\\) into `y` elementwise.
    fn clamp_min(a: Self::F, y: &mut Self::V);

    /// Calculate \\(\min(y_i, a)\\) into `y` elementwise.
    fn clamp_max(a: Self::F, y: &mut Self::V);

    /// Calculate \\(\alpha D x + \beta y\\),
    /// where \\(D={\bf diag}(d)\\) is a diagonal matrix.
    ///
    /// `d`, `x` and `y` shall have the same length.
    fn transform_di(alpha: Self::F, d: &Self::V, x: &Self::V, beta: Self::F, y: &mut Self::V);

    /// Clears process-wide device state cached by the backend.
    ///
    /// A device backend drops its cached parameter tables here so that no
    /// state leaks between solver instances. Invoked before every solve.
    /// Host backends keep no such state.
    fn reset_device_state()
    {
    }
}

/// Linear algebra extended subtrait.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
pub trait LinAlgEx: LinAlg + Clone
{
    /// Calculate \\(\alpha G x + \beta y\\) for a dense matrix \\(G\\).
    ///
    /// * If `transpose` is `true`, calculate \\(\alpha G^T x + \beta y\\) instead.
    /// * `n_row` and `n_col` are the number of rows and columns of \\(G\\).
    /// * `mat` is \\(G\\), stored in column-major order;
    ///   its length shall be `n_row * n_col`.
    /// * The length of `x` shall be `n_col` (or `n_row` if `transpose`),
    ///   and the length of `y` the other one.
    fn transform_ge(transpose: bool, n_row: usize, n_col: usize, alpha: Self::F, mat: &Self::V, x: &Self::V, beta: Self::F, y: &mut Self::V);
}
