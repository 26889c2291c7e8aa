use core::marker::PhantomData;
use num_traits::{Float, ToPrimitive};
use kura_core::solver::{LinAlgEx, NegAdjoint, Pdhg, Precond, SolveStatus, SolverError, VecLike};
use crate::{Problem, SolverOptions};

//

/// Solution of a solve: the four observable quantities and the
/// termination status.
#[derive(Debug, Clone)]
pub struct Solution<F: Float>
{
    /// Primal iterate \\(x\\).
    pub x: Vec<F>,
    /// Constraint image \\(Kx\\).
    pub kx: Vec<F>,
    /// Dual iterate \\(y\\).
    pub y: Vec<F>,
    /// Adjoint image \\(K^Ty\\).
    pub kty: Vec<F>,
    /// Termination status.
    pub status: SolveStatus,
}

impl<F: Float> Solution<F>
{
    /// Human-readable form of the termination status.
    pub fn result_string(&self) -> &'static str
    {
        match self.status {
            SolveStatus::Converged => "Converged.",
            SolveStatus::StoppedMaxIters => "Reached maximum iterations.",
            SolveStatus::StoppedUser => "Stopped by user.",
        }
    }
}

// prefixes the diagnostic of an error, keeping its kind
fn with_context(ctx: &str, e: SolverError) -> SolverError
{
    match e {
        SolverError::Config(s)           => SolverError::Config(format!("{}: {}", ctx, s)),
        SolverError::InvalidState(s)     => SolverError::InvalidState(format!("{}: {}", ctx, s)),
        SolverError::InvalidStructure(s) => SolverError::InvalidStructure(format!("{}: {}", ctx, s)),
        SolverError::ShapeMismatch(s)    => SolverError::ShapeMismatch(format!("{}: {}", ctx, s)),
        SolverError::Resource(s)         => SolverError::Resource(format!("{}: {}", ctx, s)),
        SolverError::NumericFailure(s)   => SolverError::NumericFailure(format!("{}: {}", ctx, s)),
    }
}

/// Intermediate callback: receives `(iteration, x, y)` and may request a
/// stop by returning `true`.
pub type IntermCallback<'a, F> = &'a mut dyn FnMut(usize, &[F], &[F]) -> bool;

/// Stopping callback: polled once per iteration, `true` aborts after the
/// in-flight iteration.
pub type StopCallback<'a> = &'a mut dyn FnMut() -> bool;

//

/// Solve orchestrator.
///
/// Holds [`SolverOptions`], drives a [`Problem`] through the
/// [`Pdhg`] engine, schedules intermediate callbacks, polls the stopping
/// callback and maps the result back to the original problem orientation.
pub struct Solver<L: LinAlgEx>
{
    ph_l: PhantomData<L>,
    /// Solver options.
    pub opts: SolverOptions<L::F>,
}

impl<L: LinAlgEx> Solver<L>
{
    /// Creates an instance with default options.
    pub fn new() -> Self
    {
        Solver {
            ph_l: PhantomData,
            opts: SolverOptions::default(),
        }
    }

    /// Changes options of the instance.
    pub fn opts<O>(mut self, f: O) -> Self
    where O: FnOnce(&mut SolverOptions<L::F>)
    {
        f(&mut self.opts);
        self
    }

    /// Solves the problem.
    ///
    /// Initializes `problem` if needed (wrapping failures with context),
    /// applies dualization per the options, runs the iteration with the
    /// callback schedule, and restores the problem orientation before
    /// returning. Warm starts come from the options; callbacks and the
    /// solution are always expressed in the original orientation.
    pub fn solve(&self, problem: &mut Problem<L>,
                 mut interm: Option<IntermCallback<'_, L::F>>,
                 mut stop: Option<StopCallback<'_>>) -> Result<Solution<L::F>, SolverError>
    {
        let f0 = L::F::zero();

        self.opts.validate()?;

        // a fresh solve never inherits device-side parameter tables
        L::reset_device_state();

        if !problem.initialized() {
            problem.initialize(self.opts.precond, self.opts.precond_alpha, self.opts.eps_zero)
                .map_err(|e| with_context("failed to initialize the problem", e))?;
        }

        if self.opts.solve_dual_problem {
            problem.dualize()?;
        }
        let dualized = problem.dualized();

        let (m, n) = (problem.nrows(), problem.ncols());

        // warm starts are given in the original orientation
        let (x0, y0) = if dualized {(&self.opts.y0, &self.opts.x0)} else {(&self.opts.x0, &self.opts.y0)};
        let mut x = match x0 {
            Some(v) => {
                if v.len() != n {
                    return Err(SolverError::ShapeMismatch(format!(
                        "warm-start length {} does not match the primal dimension {}", v.len(), n)));
                }
                v.clone()
            },
            None => vec![f0; n],
        };
        let mut y = match y0 {
            Some(v) => {
                if v.len() != m {
                    return Err(SolverError::ShapeMismatch(format!(
                        "warm-start length {} does not match the dual dimension {}", v.len(), m)));
                }
                v.clone()
            },
            None => vec![f0; m],
        };
        let mut kx = vec![f0; m];
        let mut kty = vec![f0; n];

        if self.opts.verbose {
            log::info!("kura: {} rows x {} cols{}", m, n,
                       if dualized {" (dualized)"} else {""});
        }

        // callback points spaced linearly over [0, max_iters - 1]
        let ncb = self.opts.num_cback_calls;
        let cb_points: Vec<usize> = if ncb >= 2 {
            (0.. ncb).map(|k| k * (self.opts.max_iters - 1) / (ncb - 1)).collect()
        }
        else {
            Vec::new()
        };
        let mut cb_next = 0;

        let engine = Pdhg::new().par(|p| {
            p.max_iter = self.opts.max_iters;
            p.tol_abs = self.opts.tol_abs;
            p.tol_rel = self.opts.tol_rel;
            p.step_rule = self.opts.stepsize;
            p.adapt = self.opts.adapt;
            p.eps_zero = self.opts.eps_zero;
        });

        let verbose = self.opts.verbose;
        let (tau, tau_inv, sigma, sigma_inv) = problem.precond_slices();
        let pc = Precond {tau, tau_inv, sigma, sigma_inv};

        let status = problem.with_linop(|lo| -> Result<SolveStatus, SolverError> {
            let (g_descs, f_descs) = problem.prox_descs();
            let mut prox_g = Vec::with_capacity(g_descs.len());
            for d in g_descs {
                prox_g.push(d.build::<L>(self.opts.eps_zero)?);
            }
            let mut prox_fconj = Vec::with_capacity(f_descs.len());
            for d in f_descs {
                prox_fconj.push(d.build::<L>(self.opts.eps_zero)?);
            }

            let mut monitor = |info: kura_core::solver::IterInfo<L::F>, xs: &L::V, ys: &L::V| -> bool {
                let stop_req = match stop.as_mut() {
                    Some(f) => f(),
                    None => false,
                };

                let scheduled = cb_next < cb_points.len() && info.iter >= cb_points[cb_next];
                if scheduled {
                    cb_next += 1;
                }

                let mut stop_all = stop_req;
                if scheduled || info.converged || stop_req || info.last {
                    if verbose {
                        log::info!("{:6}: {:9.1e} {:9.1e} {:9.1e} {:9.1e}",
                                   info.iter + 1,
                                   info.primal_res.to_f64().unwrap(), info.eps_primal.to_f64().unwrap(),
                                   info.dual_res.to_f64().unwrap(), info.eps_dual.to_f64().unwrap());
                    }
                    if let Some(cb) = interm.as_mut() {
                        // device writes are reconciled by the host views
                        let xh = xs.get_ref();
                        let yh = ys.get_ref();
                        let (px, py) = if dualized {(yh, xh)} else {(xh, yh)};
                        if cb(info.iter + 1, px, py) {
                            stop_all = true;
                        }
                    }
                }

                stop_all
            };

            if dualized {
                let op = NegAdjoint::new(lo);
                engine.solve(&op, &mut prox_g, &mut prox_fconj, pc,
                             &mut x, &mut y, &mut kx, &mut kty, &mut monitor)
            }
            else {
                engine.solve(lo, &mut prox_g, &mut prox_fconj, pc,
                             &mut x, &mut y, &mut kx, &mut kty, &mut monitor)
            }
        })??;

        if dualized {
            // restore the original orientation and map the iterates back:
            // the dual run's primal is the original dual, and the
            // constraint images pick up the sign of -K^T
            problem.dualize()?;
            for v in kx.iter_mut() {
                *v = -*v;
            }
            for v in kty.iter_mut() {
                *v = -*v;
            }

            Ok(Solution {
                x: y, kx: kty,
                y: x, kty: kx,
                status,
            })
        }
        else {
            Ok(Solution {
                x, kx, y, kty,
                status,
            })
        }
    }
}
