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
        (self.0 >> 11) as f64 / (1u64 << 53) as f64 - 0.5
    }
}

fn inner_prod(a: &[f64], b: &[f64]) -> f64
{
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

//

#[test]
fn test_adjoint_gradient_2d()
{
    let _ = env_logger::builder().is_test(true).try_init();

    // 16x16 image, adjointness gap below 1e-6 in double precision
    let (nx, ny) = (16, 16);
    let blocks = vec![BlockPlaceDesc::new(0, 0, BlockDesc::Gradient2D {nx, ny})];

    let n = nx * ny;
    let m = 2 * n;

    let mut rnd = Xor64::init();
    let u: Vec<f64> = (0.. n).map(|_| rnd.next()).collect();
    let v: Vec<f64> = (0.. m).map(|_| rnd.next()).collect();

    let ku = eval_linop::<La>(&blocks, &u, false).unwrap();
    let ktv = eval_linop::<La>(&blocks, &v, true).unwrap();

    let gap = (inner_prod(&ku.result, &v) - inner_prod(&u, &ktv.result)).abs();
    let scale = inner_prod(&u, &u).sqrt() * inner_prod(&v, &v).sqrt();
    assert!(gap <= 1e-6 * scale.max(1.), "adjointness gap {}", gap);
}

#[test]
fn test_adjoint_mixed_composite()
{
    // K = [ grad ; A ] with a dense coupling block below the stencil
    let n = 9;
    let mut rnd = Xor64::init();
    let data: Vec<f64> = (0.. 2 * n).map(|_| rnd.next()).collect();

    let blocks = vec![
        BlockPlaceDesc::new(0, 0, BlockDesc::Gradient1D {n}),
        BlockPlaceDesc::new(n, 0, BlockDesc::Dense {nrows: 2, ncols: n, data}),
    ];

    let u: Vec<f64> = (0.. n).map(|_| rnd.next()).collect();
    let v: Vec<f64> = (0.. n + 2).map(|_| rnd.next()).collect();

    let ku = eval_linop::<La>(&blocks, &u, false).unwrap();
    let ktv = eval_linop::<La>(&blocks, &v, true).unwrap();

    assert_float_eq!(inner_prod(&ku.result, &v), inner_prod(&u, &ktv.result), abs <= 1e-10);
}

#[test]
fn test_sums_against_materialization()
{
    // row/col sums of every block kind agree with the materialized matrix
    let mut rnd = Xor64::init();
    let dense: Vec<f64> = (0.. 12).map(|_| rnd.next()).collect();

    let cases = vec![
        BlockDesc::Dense {nrows: 3, ncols: 4, data: dense},
        BlockDesc::Sparse {
            nrows: 3, ncols: 4,
            row_ptr: vec![0, 2, 2, 4],
            col_ind: vec![0, 3, 1, 2],
            val: vec![1.5, -2., 0.5, 3.],
            transpose: false,
        },
        BlockDesc::Diags {nrows: 3, ncols: 4, offsets: vec![-1, 0, 2], factors: vec![0.5, -2., 1.5]},
        BlockDesc::Gradient2D {nx: 3, ny: 2},
        BlockDesc::Dct {n: 5, kind: TransformKind::Dct2},
        BlockDesc::Dct {n: 5, kind: TransformKind::Dst2},
    ];

    for desc in cases {
        let (m, n) = desc.size();
        let blocks = vec![BlockPlaceDesc::new(0, 0, desc)];

        // materialize through unit vectors
        let mut mat = vec![vec![0.; n]; m];
        for j in 0.. n {
            let mut e = vec![0.; n];
            e[j] = 1.;
            let col = eval_linop::<La>(&blocks, &e, false).unwrap().result;
            for i in 0.. m {
                mat[i][j] = col[i];
            }
        }

        let ev = eval_linop::<La>(&blocks, &vec![0.; n], false).unwrap();
        for i in 0.. m {
            let s: f64 = mat[i].iter().map(|v| v.abs()).sum();
            assert_float_eq!(ev.row_sums[i], s, abs <= 1e-10);
        }
        for j in 0.. n {
            let s: f64 = (0.. m).map(|i| mat[i][j].abs()).sum();
            assert_float_eq!(ev.col_sums[j], s, abs <= 1e-10);
        }
    }
}

#[test]
fn test_precond_gradient_1d()
{
    // 1D forward gradient on n = 10 with alpha = 1:
    // sigma = 1/2 on interior rows, 1 on the boundary row;
    // tau = 1/2 on interior cols, 1 on boundary cols
    let n = 10;
    let blocks = vec![BlockPlaceDesc::new(0, 0, BlockDesc::Gradient1D {n})];
    let prox_g = vec![ProxDesc::Fun1D {
        index: 0, size: n, fun: Fun1D::Zero, cf: CoeffsDesc::default(),
    }];
    let prox_f = vec![ProxDesc::Fun1D {
        index: 0, size: n, fun: Fun1D::Zero, cf: CoeffsDesc::default(),
    }];

    let mut problem = Problem::<La>::new(n, n, blocks, prox_g, prox_f);
    problem.initialize(PrecondKind::Alpha, 1., 1e-12).unwrap();

    let (tau, sigma) = problem.preconditioners().unwrap();

    assert_float_eq!(tau[0], 1., abs <= 1e-12);
    assert_float_eq!(tau[n - 1], 1., abs <= 1e-12);
    for j in 1.. n - 1 {
        assert_float_eq!(tau[j], 0.5, abs <= 1e-12);
    }

    for i in 0.. n - 1 {
        assert_float_eq!(sigma[i], 0.5, abs <= 1e-12);
    }
    assert_float_eq!(sigma[n - 1], 1., abs <= 1e-12);

    // cached scalar queries agree
    assert_float_eq!(problem.row_sum(0, 1.).unwrap(), 2., abs <= 1e-12);
    assert_float_eq!(problem.row_sum(n - 1, 1.).unwrap(), 0., abs <= 1e-12);
    assert_float_eq!(problem.col_sum(0, 1.).unwrap(), 1., abs <= 1e-12);
    assert_float_eq!(problem.col_sum(1, 1.).unwrap(), 2., abs <= 1e-12);
}

#[test]
fn test_add_block_lifecycle()
{
    let prox = |size| ProxDesc::Fun1D {
        index: 0, size, fun: Fun1D::Zero, cf: CoeffsDesc::default(),
    };

    // the operator grows until initialize and is immutable afterwards
    let mut problem = Problem::<La>::new(8, 8,
        vec![BlockPlaceDesc::new(0, 0, BlockDesc::Gradient1D {n: 4})],
        vec![prox(8)], vec![prox(8)]);
    problem.add_block(BlockPlaceDesc::new(4, 4, BlockDesc::Id {n: 4, scale: 2.})).unwrap();
    problem.initialize(PrecondKind::Alpha, 1., 1e-12).unwrap();

    let r = problem.add_block(BlockPlaceDesc::new(0, 4, BlockDesc::Zero {nrows: 4, ncols: 4}));
    assert!(matches!(r, Err(SolverError::InvalidState(_))));

    // the identity block landed on the second diagonal quadrant
    assert_float_eq!(problem.row_sum(5, 1.).unwrap(), 2., abs <= 1e-12);
}

#[test]
fn test_structure_errors()
{
    // overlapping blocks are rejected at initialize
    let blocks = vec![
        BlockPlaceDesc::new(0, 0, BlockDesc::Id {n: 4, scale: 1.}),
        BlockPlaceDesc::new(2, 2, BlockDesc::Id {n: 4, scale: 1.}),
    ];
    let prox_g = vec![ProxDesc::Fun1D {index: 0, size: 6, fun: Fun1D::Zero, cf: CoeffsDesc::default()}];
    let prox_f = vec![ProxDesc::Fun1D {index: 0, size: 6, fun: Fun1D::Zero, cf: CoeffsDesc::default()}];

    let mut problem = Problem::<La>::new(6, 6, blocks, prox_g, prox_f);
    let r = problem.initialize(PrecondKind::Alpha, 1., 1e-12);
    assert!(matches!(r, Err(SolverError::InvalidStructure(_))));

    // prox ranges must partition the variable
    let blocks = vec![BlockPlaceDesc::new(0, 0, BlockDesc::Id {n: 6, scale: 1.})];
    let prox_g = vec![ProxDesc::Fun1D {index: 0, size: 4, fun: Fun1D::Zero, cf: CoeffsDesc::default()}];
    let prox_f = vec![ProxDesc::Fun1D {index: 0, size: 6, fun: Fun1D::Zero, cf: CoeffsDesc::default()}];

    let mut problem = Problem::<La>::new(6, 6, blocks, prox_g, prox_f);
    let r = problem.initialize(PrecondKind::Alpha, 1., 1e-12);
    assert!(matches!(r, Err(SolverError::InvalidStructure(_))));
}
