//! Preconditioned primal-dual iteration engine

use num_traits::Float;
use crate::solver::{LinAlg, Operator, Prox, SolverError, VecLike};
use crate::subv_mut;

/// Step-size rule of the iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepRule<F: Float>
{
    /// Fixed scalar step factors.
    Fixed,
    /// Accelerated schedule under strong convexity `gamma > 0` of
    /// the primal function, retuning \\(\theta, \hat\tau, \hat\sigma\\)
    /// every iteration.
    Accel
    {
        /// Strong convexity modulus of \\(G\\).
        gamma: F,
    },
    /// Backtracking on the descent inequality
    /// \\(2\hat\tau\hat\sigma\\|K\Delta x\\|^2 \le
    /// \alpha(\\|\Delta x\\|^2/\hat\tau + \\|\Delta y\\|^2/\hat\sigma)\\).
    Backtrack
    {
        /// Acceptance factor \\(\alpha \in (0, 1)\\).
        alpha: F,
        /// Shrinkage factor \\(\eta \in (0, 1)\\) applied on violation.
        eta: F,
        /// Growth factor \\(\delta > 1\\) applied when the inequality
        /// holds with slack.
        delta: F,
        /// Bound on retries within one iteration.
        max_tries: u32,
    },
}

/// Adaptation rule of the scalar step factors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptRule<F: Float>
{
    /// No adaptation.
    Off,
    /// Periodically rescale \\(\hat\tau \leftrightarrow \hat\sigma\\)
    /// (product preserved) so that the primal and dual residual norms
    /// track each other.
    Balance
    {
        /// Iterations between adaptation checks.
        interval: usize,
        /// Residual ratio that triggers a rescale.
        target: F,
        /// Rescale factor, `> 1`.
        factor: F,
    },
}

/// Engine parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PdhgParam<F: Float>
{
    /// Iteration cap.
    pub max_iter: usize,
    /// Absolute tolerance of the residual thresholds.
    pub tol_abs: F,
    /// Relative tolerance of the residual thresholds.
    pub tol_rel: F,
    /// Initial scalar primal step factor \\(\hat\tau\\).
    pub tau0: F,
    /// Initial scalar dual step factor \\(\hat\sigma\\).
    pub sigma0: F,
    /// Extrapolation factor \\(\theta\\).
    pub theta: F,
    /// Step-size rule.
    pub step_rule: StepRule<F>,
    /// Adaptation rule.
    pub adapt: AdaptRule<F>,
    /// Small positive number treated as zero.
    pub eps_zero: F,
}

impl<F: Float> Default for PdhgParam<F>
{
    fn default() -> Self
    {
        let f1 = F::one();

        PdhgParam {
            max_iter: 1000,
            tol_abs: F::from(1e-5).unwrap(),
            tol_rel: F::from(1e-5).unwrap(),
            tau0: f1,
            sigma0: f1,
            theta: f1,
            step_rule: StepRule::Fixed,
            adapt: AdaptRule::Off,
            eps_zero: F::from(1e-12).unwrap(),
        }
    }
}

/// Termination status of a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus
{
    /// Both residuals dropped below their thresholds.
    Converged,
    /// The iteration cap was reached.
    StoppedMaxIters,
    /// The monitor requested a stop.
    StoppedUser,
}

/// Per-iteration residual information handed to the monitor.
#[derive(Debug, Clone, Copy)]
pub struct IterInfo<F: Float>
{
    /// Iteration counter, starting at 0.
    pub iter: usize,
    /// Whether this is the last iteration before the cap.
    pub last: bool,
    /// 1-norm of the primal residual
    /// \\(\\|\Delta x / T - K^T \Delta y\\|_1\\).
    pub primal_res: F,
    /// 1-norm of the dual residual
    /// \\(\\|\Delta y / S - K \Delta x\\|_1\\).
    pub dual_res: F,
    /// Primal threshold
    /// \\({\rm tol}\_{\rm abs}\sqrt n + {\rm tol}\_{\rm rel}\\|x\\|\\).
    pub eps_primal: F,
    /// Dual threshold
    /// \\({\rm tol}\_{\rm abs}\sqrt m + {\rm tol}\_{\rm rel}\\|y\\|\\).
    pub eps_dual: F,
    /// Whether both residuals are below their thresholds.
    pub converged: bool,
}

/// Diagonal preconditioners and their exact reciprocals.
///
/// `tau` has the primal length \\(n\\), `sigma` the dual length \\(m\\).
/// The `_inv` vectors must hold the elementwise reciprocals; the residuals
/// are computed from them.
pub struct Precond<'a, F: Float>
{
    pub tau: &'a [F],
    pub tau_inv: &'a [F],
    pub sigma: &'a [F],
    pub sigma_inv: &'a [F],
}

// Slack ratio of the backtracking inequality below which the step
// factors are grown.
const BACKTRACK_SLACK: f64 = 0.25;

/// Primal-dual iteration engine.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// Drives the preconditioned first-order scheme
/// \\[
/// \begin{array}{l}
/// x^{k+1} = {\rm prox}_{T G}(x^k - T K^T y^k) \\\\
/// \bar x = x^{k+1} + \theta (x^{k+1} - x^k) \\\\
/// y^{k+1} = {\rm prox}_{S F^\*}(y^k + S K \bar x)
/// \end{array}
/// \\]
/// with \\(T = \hat\tau\,{\bf diag}(\tau)\\) and
/// \\(S = \hat\sigma\,{\bf diag}(\sigma)\\).
/// \\(Kx\\) and \\(K^Ty\\) are cached so that one iteration costs one
/// forward and one adjoint application; the extrapolated point enters only
/// through \\(K\bar x = (1+\theta)Kx^{k+1} - \theta Kx^k\\).
pub struct Pdhg<F: Float>
{
    /// Engine parameters.
    pub par: PdhgParam<F>,
}

impl<F: Float> Pdhg<F>
{
    /// Creates an instance with default parameters.
    pub fn new() -> Self
    {
        Pdhg {
            par: PdhgParam::default(),
        }
    }

    /// Changes parameters of the instance.
    pub fn par<P>(mut self, f: P) -> Self
    where P: FnOnce(&mut PdhgParam<F>)
    {
        f(&mut self.par);
        self
    }

    /// Runs the iteration.
    ///
    /// * `op` is the linear operator \\(K\\).
    /// * `prox_g` and `prox_fconj` are the proximal operators of the
    ///   separable pieces of \\(G\\) and \\(F^\*\\); their ranges must
    ///   partition \\([0, n)\\) and \\([0, m)\\) respectively (validated by
    ///   the problem layer).
    /// * `pc` holds the diagonal preconditioners.
    /// * `x` and `y` are the warm-start iterates on entry and the final
    ///   iterates on exit; `kx` and `kty` receive \\(Kx\\) and \\(K^Ty\\).
    /// * `monitor` is invoked once per iteration with residual information
    ///   and the current iterates; returning `true` stops the solve after
    ///   the in-flight iteration.
    pub fn solve<L, O>(
        &self,
        op: &O,
        prox_g: &mut [Box<dyn Prox<L> + '_>],
        prox_fconj: &mut [Box<dyn Prox<L> + '_>],
        pc: Precond<'_, F>,
        x: &mut [F], y: &mut [F],
        kx: &mut [F], kty: &mut [F],
        monitor: &mut dyn FnMut(IterInfo<F>, &L::V, &L::V) -> bool,
    ) -> Result<SolveStatus, SolverError>
    where L: LinAlg<F=F>, O: Operator<L>, F: core::fmt::Debug
    {
        let (m, n) = op.size();
        let f0 = F::zero();
        let f1 = F::one();
        let f2 = f1 + f1;

        if m == 0 || n == 0 {
            return Err(SolverError::ShapeMismatch("operator has an empty dimension".to_string()));
        }
        if x.len() != n || kty.len() != n || pc.tau.len() != n || pc.tau_inv.len() != n {
            return Err(SolverError::ShapeMismatch(format!(
                "primal-sized arguments disagree with operator columns {}", n)));
        }
        if y.len() != m || kx.len() != m || pc.sigma.len() != m || pc.sigma_inv.len() != m {
            return Err(SolverError::ShapeMismatch(format!(
                "dual-sized arguments disagree with operator rows {}", m)));
        }

        log::debug!("pdhg: {} rows, {} cols, {:?}, {:?}",
                    m, n, self.par.step_rule, self.par.adapt);

        let mut work = vec![f0; (n + m) * 4];
        let mut w = L::V::new_mut(&mut work);
        subv_mut!(w,
            (x_prev; n), (kty_prev; n), (t_n; n), (u_n; n),
            (y_prev; m), (kx_prev; m), (t_m; m), (u_m; m));

        let mut x = L::V::new_mut(x);
        let mut y = L::V::new_mut(y);
        let mut kx = L::V::new_mut(kx);
        let mut kty = L::V::new_mut(kty);
        let tau = L::V::new_ref(pc.tau);
        let tau_inv = L::V::new_ref(pc.tau_inv);
        let sigma = L::V::new_ref(pc.sigma);
        let sigma_inv = L::V::new_ref(pc.sigma_inv);

        op.op(f1, &x, f0, &mut kx);
        op.trans_op(f1, &y, f0, &mut kty);

        let mut tau_hat = self.par.tau0;
        let mut sigma_hat = self.par.sigma0;
        let mut theta = self.par.theta;

        let sqrt_n = F::from(n).unwrap().sqrt();
        let sqrt_m = F::from(m).unwrap().sqrt();
        let slack = F::from(BACKTRACK_SLACK).unwrap();

        for i in 0.. self.par.max_iter {
            L::copy(&x, &mut x_prev);
            L::copy(&y, &mut y_prev);
            L::copy(&kx, &mut kx_prev);
            L::copy(&kty, &mut kty_prev);

            let mut tries = 0;
            loop {
                // x = prox_{T G}(x_prev - tau_hat * tau .* kty_prev)
                L::copy(&x_prev, &mut t_n);
                L::transform_di(-tau_hat, &tau, &kty_prev, f1, &mut t_n);
                for g in prox_g.iter_mut() {
                    g.eval(&mut x, &t_n, &tau, tau_hat, false)?;
                }

                op.op(f1, &x, f0, &mut kx);

                // u_m = K x_bar = (1 + theta) * kx - theta * kx_prev
                L::copy(&kx, &mut u_m);
                L::scale(f1 + theta, &mut u_m);
                L::add(-theta, &kx_prev, &mut u_m);

                // y = prox_{S F*}(y_prev + sigma_hat * sigma .* u_m)
                L::copy(&y_prev, &mut t_m);
                L::transform_di(sigma_hat, &sigma, &u_m, f1, &mut t_m);
                for f in prox_fconj.iter_mut() {
                    f.eval(&mut y, &t_m, &sigma, sigma_hat, false)?;
                }

                if let StepRule::Backtrack {alpha, eta, delta, max_tries} = self.par.step_rule {
                    // t_n = dx, u_m = K dx, t_m = dy
                    L::copy(&x, &mut t_n);
                    L::add(-f1, &x_prev, &mut t_n);
                    L::copy(&y, &mut t_m);
                    L::add(-f1, &y_prev, &mut t_m);
                    L::copy(&kx, &mut u_m);
                    L::add(-f1, &kx_prev, &mut u_m);

                    let norm_kdx = L::norm(&u_m);
                    let norm_dx = L::norm(&t_n);
                    let norm_dy = L::norm(&t_m);
                    let lhs = f2 * tau_hat * sigma_hat * norm_kdx * norm_kdx;
                    let rhs = alpha * (norm_dx * norm_dx / tau_hat + norm_dy * norm_dy / sigma_hat);

                    if lhs > rhs && tries < max_tries && tau_hat * eta > self.par.eps_zero {
                        tries += 1;
                        tau_hat = tau_hat * eta;
                        sigma_hat = sigma_hat * eta;
                        log::debug!("pdhg: backtrack {} at iteration {}, tau_hat {:.3e}",
                                    tries, i, tau_hat.to_f64().unwrap());
                        L::copy(&x_prev, &mut x);
                        L::copy(&y_prev, &mut y);
                        L::copy(&kx_prev, &mut kx);
                        continue;
                    }
                    if lhs <= slack * rhs {
                        tau_hat = tau_hat * delta;
                        sigma_hat = sigma_hat * delta;
                    }
                }
                break;
            }

            op.trans_op(f1, &y, f0, &mut kty);

            // primal_res = || dx / T - K^T dy ||_1
            L::copy(&x_prev, &mut u_n);
            L::add(-f1, &x, &mut u_n);
            L::copy(&kty_prev, &mut t_n);
            L::add(-f1, &kty, &mut t_n);
            L::transform_di(tau_hat.recip(), &tau_inv, &u_n, -f1, &mut t_n);
            let primal_res = L::abssum(&t_n, 1);

            // dual_res = || dy / S - K dx ||_1
            L::copy(&y_prev, &mut u_m);
            L::add(-f1, &y, &mut u_m);
            L::copy(&kx_prev, &mut t_m);
            L::add(-f1, &kx, &mut t_m);
            L::transform_di(sigma_hat.recip(), &sigma_inv, &u_m, -f1, &mut t_m);
            let dual_res = L::abssum(&t_m, 1);

            if !(primal_res.is_finite() && dual_res.is_finite()) {
                return Err(SolverError::NumericFailure(format!(
                    "non-finite residuals at iteration {} (|x|_inf {:.3e})",
                    i, L::norm_inf(&x).to_f64().unwrap_or(f64::NAN))));
            }

            let eps_primal = self.par.tol_abs * sqrt_n + self.par.tol_rel * L::norm(&x);
            let eps_dual = self.par.tol_abs * sqrt_m + self.par.tol_rel * L::norm(&y);
            let converged = primal_res < eps_primal && dual_res < eps_dual;

            if let StepRule::Accel {gamma} = self.par.step_rule {
                theta = (f1 + f2 * gamma * tau_hat).sqrt().recip();
                tau_hat = tau_hat * theta;
                sigma_hat = sigma_hat / theta;
            }

            if let AdaptRule::Balance {interval, target, factor} = self.par.adapt {
                if interval > 0 && (i + 1) % interval == 0 {
                    if primal_res > target * dual_res {
                        tau_hat = tau_hat * factor;
                        sigma_hat = sigma_hat / factor;
                    }
                    else if dual_res > target * primal_res {
                        tau_hat = tau_hat / factor;
                        sigma_hat = sigma_hat * factor;
                    }
                }
            }

            let info = IterInfo {
                iter: i,
                last: i + 1 == self.par.max_iter,
                primal_res, dual_res,
                eps_primal, eps_dual,
                converged,
            };

            log::trace!("pdhg: {} | {:.2e} {:.2e} | {:.2e} {:.2e}",
                        i,
                        primal_res.to_f64().unwrap(), eps_primal.to_f64().unwrap(),
                        dual_res.to_f64().unwrap(), eps_dual.to_f64().unwrap());

            let stop = monitor(info, &x, &y);

            if converged {
                return Ok(SolveStatus::Converged);
            }
            if stop {
                return Ok(SolveStatus::StoppedUser);
            }
        }

        Ok(SolveStatus::StoppedMaxIters)
    }
}
