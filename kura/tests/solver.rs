use float_eq::assert_float_eq;
use kura::prelude::*;
use kura::*;

type La = FloatGeneric<f64>;

//

// xorshift PRNG, deterministic across runs
struct Xor64(u64);

impl Xor64
{
    fn init() -> Self
    {
        Xor64(88172645463325252)
    }

    fn next(&mut self) -> f64
    {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    // Box-Muller
    fn gauss(&mut self) -> f64
    {
        let u1 = self.next().max(1e-12);
        let u2 = self.next();
        (-2. * u1.ln()).sqrt() * (2. * std::f64::consts::PI * u2).cos()
    }
}

// piecewise-constant signal with a step at n/2, plus Gaussian noise
fn rof_signal(n: usize, noise: f64) -> Vec<f64>
{
    let mut rnd = Xor64::init();
    (0.. n)
        .map(|i| if i < n / 2 {0.2} else {0.8})
        .map(|v| v + noise * rnd.gauss())
        .collect()
}

// min_x (1/2)||x - f||^2 + lambda ||grad x||_1
fn rof_problem(f: &[f64], lambda: f64) -> Problem<La>
{
    let n = f.len();

    let blocks = vec![BlockPlaceDesc::new(0, 0, BlockDesc::Gradient1D {n})];

    let prox_g = vec![ProxDesc::Fun1D {
        index: 0, size: n,
        fun: Fun1D::Square,
        cf: CoeffsDesc {
            b: CoefDesc::PerElem(f.iter().map(|v| -v).collect()),
            .. CoeffsDesc::default()
        },
    }];

    let prox_fconj = vec![ProxDesc::Moreau {
        inner: Box::new(ProxDesc::Fun1D {
            index: 0, size: n,
            fun: Fun1D::Abs,
            cf: CoeffsDesc {c: CoefDesc::Scal(lambda), .. CoeffsDesc::default()},
        }),
    }];

    Problem::new(n, n, blocks, prox_g, prox_fconj)
}

fn rof_objective(x: &[f64], f: &[f64], lambda: f64) -> f64
{
    let fid: f64 = x.iter().zip(f).map(|(a, b)| (a - b) * (a - b)).sum();
    let tv: f64 = x.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    0.5 * fid + lambda * tv
}

//

#[test]
fn test_rof_denoise_1d()
{
    let _ = env_logger::builder().is_test(true).try_init();

    let n = 100;
    let f = rof_signal(n, 0.05);
    let lambda = 1. / 25.;

    // residual thresholds of about 1e-2 are reached within 2000 iterations
    let mut problem = rof_problem(&f, lambda);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 2000;
        o.tol_abs = 1e-3;
        o.tol_rel = 1e-9;
    });
    let sol = solver.solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);
    assert_eq!(sol.result_string(), "Converged.");

    // a tight solve yields a piecewise-constant signal
    let mut problem = rof_problem(&f, lambda);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 50_000;
        o.tol_abs = 1e-8;
        o.tol_rel = 1e-8;
    });
    let sol = solver.solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    let jumps = sol.x.windows(2).filter(|w| (w[1] - w[0]).abs() >= 1e-3).count();
    assert!(jumps <= 10, "{} jumps in the denoised signal", jumps);

    // the reconstruction stays near the clean signal
    for (i, v) in sol.x.iter().enumerate() {
        let clean = if i < n / 2 {0.2} else {0.8};
        assert!((v - clean).abs() < 0.15, "x[{}] = {} far from {}", i, v, clean);
    }

    // Kx matches the gradient of x
    for i in 0.. n - 1 {
        assert_float_eq!(sol.kx[i], sol.x[i + 1] - sol.x[i], abs <= 1e-10);
    }
}

#[test]
fn test_rof_objective_decrease()
{
    let n = 100;
    let f = rof_signal(n, 0.05);
    let lambda = 1. / 25.;

    let mut problem = rof_problem(&f, lambda);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 2000;
        o.num_cback_calls = 20;
        o.tol_abs = 1e-9;
        o.tol_rel = 1e-9;
    });

    let mut objs = Vec::new();
    let mut cb = |_i: usize, x: &[f64], _y: &[f64]| -> bool {
        objs.push(rof_objective(x, &f, lambda));
        false
    };
    solver.solve(&mut problem, Some(&mut cb), None).unwrap();

    assert!(objs.len() >= 10);
    let head: f64 = objs[.. 5].iter().sum::<f64>() / 5.;
    let tail: f64 = objs[objs.len() - 5 ..].iter().sum::<f64>() / 5.;
    assert!(tail <= head, "objective grew from {} to {}", head, tail);
}

#[test]
fn test_warm_start_idempotence()
{
    let n = 100;
    let f = rof_signal(n, 0.05);
    let lambda = 1. / 25.;

    let mut problem = rof_problem(&f, lambda);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 50_000;
        o.tol_abs = 1e-6;
        o.tol_rel = 1e-6;
    });
    let sol = solver.solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    // restarting from the solution converges immediately
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 50_000;
        o.tol_abs = 1e-6;
        o.tol_rel = 1e-6;
        o.x0 = Some(sol.x.clone());
        o.y0 = Some(sol.y.clone());
    });

    let mut last_iter = 0;
    let mut cb = |i: usize, _x: &[f64], _y: &[f64]| -> bool {
        last_iter = i;
        false
    };
    let sol2 = solver.solve(&mut problem, Some(&mut cb), None).unwrap();

    assert_eq!(sol2.status, SolveStatus::Converged);
    assert!(last_iter <= 2, "warm start took {} iterations", last_iter);
    assert_float_eq!(sol2.x.as_slice(), sol.x.as_slice(), abs_all <= 1e-6);
}

#[test]
fn test_dualization_symmetry()
{
    let n = 100;
    let f = rof_signal(n, 0.05);
    let lambda = 1. / 25.;

    let tight = |o: &mut SolverOptions<f64>| {
        o.max_iters = 50_000;
        o.tol_abs = 1e-8;
        o.tol_rel = 1e-8;
    };

    let mut problem = rof_problem(&f, lambda);
    let sol = Solver::<La>::new().opts(tight)
        .solve(&mut problem, None, None).unwrap();

    let mut problem_d = rof_problem(&f, lambda);
    let sol_d = Solver::<La>::new().opts(|o| {
        tight(o);
        o.solve_dual_problem = true;
    }).solve(&mut problem_d, None, None).unwrap();

    assert_eq!(sol_d.status, SolveStatus::Converged);
    assert!(!problem_d.dualized());

    assert_float_eq!(sol_d.x.as_slice(), sol.x.as_slice(), abs_all <= 1e-4);
    assert_float_eq!(sol_d.y.as_slice(), sol.y.as_slice(), abs_all <= 1e-3);
}

#[test]
fn test_stepsize_and_adapt_variants()
{
    let n = 100;
    let f = rof_signal(n, 0.05);
    let lambda = 1. / 25.;

    // backtracking
    let mut problem = rof_problem(&f, lambda);
    let sol = Solver::<La>::new().opts(|o| {
        o.max_iters = 20_000;
        o.tol_abs = 1e-5;
        o.tol_rel = 1e-5;
        o.stepsize = goldstein();
    }).solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    // accelerated, G is 1-strongly convex
    let mut problem = rof_problem(&f, lambda);
    let sol = Solver::<La>::new().opts(|o| {
        o.max_iters = 20_000;
        o.tol_abs = 1e-4;
        o.tol_rel = 1e-4;
        o.stepsize = StepRule::Accel {gamma: 1.};
    }).solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    // residual balancing
    let mut problem = rof_problem(&f, lambda);
    let sol = Solver::<La>::new().opts(|o| {
        o.max_iters = 20_000;
        o.tol_abs = 1e-5;
        o.tol_rel = 1e-5;
        o.adapt = balance();
    }).solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    // preconditioning off still converges on this small problem
    let mut problem = rof_problem(&f, lambda);
    let sol = Solver::<La>::new().opts(|o| {
        o.max_iters = 20_000;
        o.tol_abs = 1e-5;
        o.tol_rel = 1e-5;
        o.precond = PrecondKind::Off;
        o.stepsize = goldstein();
    }).solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);
}

#[test]
fn test_stopping_callback()
{
    let n = 100;
    let f = rof_signal(n, 0.05);

    let mut problem = rof_problem(&f, 1. / 25.);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 10_000;
        o.tol_abs = 1e-12;
        o.tol_rel = 1e-12;
    });

    let mut polls = 0usize;
    let mut stop = || {
        polls += 1;
        polls >= 50
    };
    let sol = solver.solve(&mut problem, None, Some(&mut stop)).unwrap();

    assert_eq!(sol.status, SolveStatus::StoppedUser);
    assert_eq!(polls, 50);
}

#[test]
fn test_max_iters_status()
{
    let n = 100;
    let f = rof_signal(n, 0.05);

    let mut problem = rof_problem(&f, 1. / 25.);
    let sol = Solver::<La>::new().opts(|o| {
        o.max_iters = 5;
        o.tol_abs = 1e-12;
        o.tol_rel = 1e-12;
    }).solve(&mut problem, None, None).unwrap();

    assert_eq!(sol.status, SolveStatus::StoppedMaxIters);
    assert_eq!(sol.result_string(), "Reached maximum iterations.");
}
