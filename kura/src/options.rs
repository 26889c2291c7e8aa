use num_traits::Float;
use kura_core::solver::{StepRule, AdaptRule, SolverError};

//

/// Diagonal preconditioner construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecondKind
{
    /// Identity step scaling.
    Off,
    /// Alpha-based diagonal scaling
    /// \\(\tau_c = 1/\sum_r |K_{rc}|^{2-\alpha}\\),
    /// \\(\sigma_r = 1/\sum_c |K_{rc}|^\alpha\\).
    Alpha,
}

/// Solver options.
///
/// The typed counterpart of the host options dictionary, with the same
/// recognized keys. Construct through `Default` and adjust via
/// [`crate::Solver::opts`].
#[derive(Debug, Clone)]
pub struct SolverOptions<F: Float>
{
    /// Iteration cap, `> 0`.
    pub max_iters: usize,
    /// Number of intermediate callback invocations, linearly spaced over
    /// the iterations. Values below 2 disable the schedule.
    pub num_cback_calls: usize,
    /// Absolute residual tolerance, `> 0`.
    pub tol_abs: F,
    /// Relative residual tolerance, `> 0`.
    pub tol_rel: F,
    /// Diagnostic output through the log facade.
    pub verbose: bool,
    /// Dualize the problem before iterating, undo afterwards.
    pub solve_dual_problem: bool,
    /// Preconditioner construction.
    pub precond: PrecondKind,
    /// Exponent of the alpha preconditioner, within `[0, 2]`.
    pub precond_alpha: F,
    /// Step-size rule.
    pub stepsize: StepRule<F>,
    /// Residual balancing rule.
    pub adapt: AdaptRule<F>,
    /// Warm-start primal iterate.
    pub x0: Option<Vec<F>>,
    /// Warm-start dual iterate.
    pub y0: Option<Vec<F>>,
    /// Small positive number treated as zero.
    pub eps_zero: F,
}

impl<F: Float> Default for SolverOptions<F>
{
    fn default() -> Self
    {
        SolverOptions {
            max_iters: 1000,
            num_cback_calls: 10,
            tol_abs: F::from(1e-5).unwrap(),
            tol_rel: F::from(1e-5).unwrap(),
            verbose: false,
            solve_dual_problem: false,
            precond: PrecondKind::Alpha,
            precond_alpha: F::one(),
            stepsize: StepRule::Fixed,
            adapt: AdaptRule::Off,
            x0: None,
            y0: None,
            eps_zero: F::from(1e-12).unwrap(),
        }
    }
}

impl<F: Float> SolverOptions<F>
{
    pub(crate) fn validate(&self) -> Result<(), SolverError>
    {
        let f0 = F::zero();
        let f1 = F::one();
        let f2 = f1 + f1;

        if self.max_iters == 0 {
            return Err(SolverError::Config("max_iters must be positive".to_string()));
        }
        if !(self.tol_abs > f0 && self.tol_rel > f0) {
            return Err(SolverError::Config("tolerances must be positive".to_string()));
        }
        if self.precond_alpha < f0 || self.precond_alpha > f2 {
            return Err(SolverError::Config("precond_alpha must lie in [0, 2]".to_string()));
        }
        match self.stepsize {
            StepRule::Fixed => {},
            StepRule::Accel {gamma} => {
                if !(gamma > f0) {
                    return Err(SolverError::Config("accelerated stepsize needs gamma > 0".to_string()));
                }
            },
            StepRule::Backtrack {alpha, eta, delta, ..} => {
                if !(alpha > f0 && alpha < f1 && eta > f0 && eta < f1 && delta > f1) {
                    return Err(SolverError::Config(
                        "backtracking needs alpha, eta in (0, 1) and delta > 1".to_string()));
                }
            },
        }
        if let AdaptRule::Balance {interval, target, factor} = self.adapt {
            if interval == 0 || !(target >= f1) || !(factor > f1) {
                return Err(SolverError::Config(
                    "balancing needs interval > 0, target >= 1 and factor > 1".to_string()));
            }
        }

        Ok(())
    }
}

/// Backtracking step-size rule with default coefficients.
pub fn goldstein<F: Float>() -> StepRule<F>
{
    StepRule::Backtrack {
        alpha: F::from(0.95).unwrap(),
        eta: F::from(0.7).unwrap(),
        delta: F::from(1.02).unwrap(),
        max_tries: 10,
    }
}

/// Residual balancing rule with default coefficients.
pub fn balance<F: Float>() -> AdaptRule<F>
{
    AdaptRule::Balance {
        interval: 10,
        target: F::from(5.).unwrap(),
        factor: F::from(1.2).unwrap(),
    }
}
