use float_eq::assert_float_eq;
use kura::prelude::*;
use kura::*;
use kura_f32cuda::F32Cuda;

type La = F32Cuda;

//

#[test]
fn test_rof_denoise_cuda()
{
    let _ = env_logger::builder().is_test(true).try_init();

    for d in kura_f32cuda::cuda_mgr::device_list().unwrap() {
        println!("device {}: {} ({} B, {} cores)", d.id, d.name, d.memory_bytes, d.cores);
    }

    // small 1D total-variation denoising, deterministic jitter
    let n = 64;
    let f: Vec<f32> = (0.. n)
        .map(|i| {
            let base = if i < n / 2 {0.2} else {0.8};
            let jitter = (((i * 2654435761) % 1000) as f32 / 1000. - 0.5) * 0.06;
            base + jitter
        })
        .collect();
    let lambda = 0.05;

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

    let mut problem = Problem::<La>::new(n, n, blocks, prox_g, prox_fconj);
    let solver = Solver::<La>::new().opts(|o| {
        o.max_iters = 5000;
        o.tol_abs = 1e-4;
        o.tol_rel = 1e-4;
        o.eps_zero = 1e-9;
    });

    let sol = solver.solve(&mut problem, None, None).unwrap();
    assert_eq!(sol.status, SolveStatus::Converged);

    // flat away from the step
    assert_float_eq!(sol.x[0], sol.x[1], abs <= 1e-2);
    assert_float_eq!(sol.x[n - 1], sol.x[n - 2], abs <= 1e-2);
}
