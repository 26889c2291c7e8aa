/*!
Kura ([鞍](http://www.decodeunicode.org/en/u+978D) in Japanese) means saddle.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate provides the numerical core of a solver for large-scale non-smooth
convex optimization problems in saddle-point form
\\[
\min_x \max_y \ \langle Kx, y \rangle + G(x) - F^\*(y),
\\]
where \\(K\\) is a large structured linear operator and \\(G, F^\*\\) admit
efficient proximal operators. Problems of this shape arise in imaging
(total-variation denoising and reconstruction, stereo) with variable sizes of
\\(10^4\\) to \\(10^8\\).

The core is generic over a linear algebra backend:

* [`solver::LinAlg`]/[`solver::LinAlgEx`] abstract the vector kernels,
  and [`solver::VecLike`] abstracts a (possibly device-resident) vector.
* [`FloatGeneric`] is the pure-Rust reference backend, generic over
  `num::Float`.
* The `kura_f32cuda` crate implements the backend on CUDA/cuBLAS.

On top of those sit the three building layers:

* [`solver::Block`] leaves ([`BlockDense`], [`BlockSparse`], [`BlockDiags`],
  [`BlockGradient2D`], ...) composed into a [`LinOp`] block matrix.
* [`solver::Prox`] leaves ([`Prox1D`], [`ProxNorm2`], ...) and the
  compositional wrappers [`ProxMoreau`], [`ProxPermute`], [`ProxTransform`].
* The preconditioned primal-dual iteration engine [`solver::Pdhg`].

Problem assembly, preconditioner construction and solve orchestration live in
the `kura` crate.
*/

pub mod solver;

//

mod floatgeneric;

pub use floatgeneric::*;

//

mod linop;

pub use linop::*;

//

mod block_dense;
mod block_sparse;
mod block_diags;
mod block_zero;
mod block_id;
mod block_gradient;
mod block_dct;

pub use block_dense::*;
pub use block_sparse::*;
pub use block_diags::*;
pub use block_zero::*;
pub use block_id::*;
pub use block_gradient::*;
pub use block_dct::*;

//

mod prox_1d;
mod prox_norm2;
mod prox_simplex;
mod prox_ball;
mod prox_quad;
mod prox_singular;
mod prox_moreau;
mod prox_permute;
mod prox_transform;

pub use prox_1d::*;
pub use prox_norm2::*;
pub use prox_simplex::*;
pub use prox_ball::*;
pub use prox_quad::*;
pub use prox_singular::*;
pub use prox_moreau::*;
pub use prox_permute::*;
pub use prox_transform::*;
