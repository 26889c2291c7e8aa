/*!
Kura ([鞍](http://www.decodeunicode.org/en/u+978D) in Japanese) means saddle.

<script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
<script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>

This crate assembles and solves large-scale non-smooth convex optimization
problems in saddle-point form
\\[
\min_x \max_y \ \langle Kx, y \rangle + G(x) - F^\*(y)
\\]
on top of the numerical core of [`kura_core`].

# General usage

1. Express your problem with a block description of \\(K\\)
   ([`BlockPlaceDesc`]) and descriptions of the separable pieces of
   \\(G\\) and \\(F^\*\\) ([`ProxDesc`]). The prox ranges of each side must
   partition its variable exactly.
1. Choose a [`kura_core::solver::LinAlgEx`] implementation to use:
   * [`prelude::FloatGeneric`] -
     `num::Float`-generic, pure Rust, fewer environment-dependent problems.
   * `kura_f32cuda` crate -
     `f32`-specific, using CUDA/cuBLAS which requires an installed
     environment.
1. Construct a [`Problem`] and a [`Solver`], optionally adjusting
   [`SolverOptions`].
1. Invoke [`Solver::solve`] to obtain a [`Solution`] carrying the final
   iterates \\(x, Kx, y, K^Ty\\) and the termination status.

# Example

Total-variation denoising of a 1D signal `f` with weight `lambda`
(the ROF model)
\\[
\min_x \ \frac12 \\|x - f\\|^2 + \lambda \\|\nabla x\\|_1 :
\\]

```
use float_eq::assert_float_eq;
use kura::prelude::*;
use kura::*;

//env_logger::init(); // Use any logger crate as `kura` uses `log` crate.

type La = FloatGeneric<f64>;

let n = 16;
let f: Vec<f64> = (0.. n).map(|i| if i < n / 2 {0.1} else {0.9}).collect();
let lambda = 0.2;

// K = forward-difference gradient
let blocks = vec![BlockPlaceDesc::new(0, 0, BlockDesc::Gradient1D {n})];

// G(x) = (1/2)||x - f||^2, expressed through the shift b = -f
let prox_g = vec![ProxDesc::Fun1D {
    index: 0, size: n,
    fun: Fun1D::Square,
    cf: CoeffsDesc {
        b: CoefDesc::PerElem(f.iter().map(|v| -v).collect()),
        .. CoeffsDesc::default()
    },
}];

// F*(y) = indicator of |y_i| <= lambda, the conjugate of lambda||.||_1
let prox_fconj = vec![ProxDesc::Moreau {
    inner: Box::new(ProxDesc::Fun1D {
        index: 0, size: n,
        fun: Fun1D::Abs,
        cf: CoeffsDesc {c: CoefDesc::Scal(lambda), .. CoeffsDesc::default()},
    }),
}];

let mut problem = Problem::<La>::new(n, n, blocks, prox_g, prox_fconj);
let solver = Solver::<La>::new().opts(|o| {o.max_iters = 2000});

let sol = solver.solve(&mut problem, None, None).unwrap();

// flat at both ends of the step
assert_float_eq!(sol.x[0], sol.x[1], abs <= 1e-3);
assert_float_eq!(sol.x[n - 1], sol.x[n - 2], abs <= 1e-3);
```
*/

mod opbuild;

pub use opbuild::*;

//

mod proxbuild;

pub use proxbuild::*;

//

mod options;

pub use options::*;

//

mod problem;

pub use problem::*;

//

mod solve;

pub use solve::*;

//

mod eval;

pub use eval::*;

//

/// Prelude
pub mod prelude
{
    pub use kura_core::solver::{Pdhg, PdhgParam, Precond, IterInfo, SolveStatus, StepRule, AdaptRule, SolverError};
    pub use kura_core::{FloatGeneric, Fun1D, TransformKind};
}
