use num_traits::One;
use core::marker::PhantomData;
use crate::solver::{Block, LinAlg, VecLike};
use crate::{subv, subv_mut};

//

// y[base .. base+len) += alpha * (x[base+off ..) - x[base ..))
fn fwd_diff_add<L: LinAlg>(alpha: L::F, x: &L::V, y: &mut L::V, base: usize, len: usize, off: usize)
{
    let (_, mut y_spl) = y.split_mut(base);
    let (mut y_sub, _) = y_spl.split_mut(len);

    {
        let (_, x_spl) = x.split_ref(base + off);
        let (x_hi, _) = x_spl.split_ref(len);
        L::add(alpha, &x_hi, &mut y_sub);
    }
    {
        let (_, x_spl) = x.split_ref(base);
        let (x_lo, _) = x_spl.split_ref(len);
        L::add(-alpha, &x_lo, &mut y_sub);
    }
}

// adjoint of fwd_diff_add:
// y[base ..)     -= alpha * g[base .. base+len)
// y[base+off ..) += alpha * g[base .. base+len)
fn fwd_diff_t_add<L: LinAlg>(alpha: L::F, g: &L::V, y: &mut L::V, base: usize, len: usize, off: usize)
{
    let (_, g_spl) = g.split_ref(base);
    let (g_sub, _) = g_spl.split_ref(len);

    {
        let (_, mut y_spl) = y.split_mut(base);
        let (mut y_lo, _) = y_spl.split_mut(len);
        L::add(-alpha, &g_sub, &mut y_lo);
    }
    {
        let (_, mut y_spl) = y.split_mut(base + off);
        let (mut y_hi, _) = y_spl.split_mut(len);
        L::add(alpha, &g_sub, &mut y_hi);
    }
}

// v[base .. base+len) += s
fn adds_range<L: LinAlg>(s: L::F, v: &mut L::V, base: usize, len: usize)
{
    let (_, mut spl) = v.split_mut(base);
    let (mut sub, _) = spl.split_mut(len);
    L::adds(s, &mut sub);
}

//

/// Forward-difference gradient on a 1D grid.
///
/// <script src="https://polyfill.io/v3/polyfill.min.js?features=es6"></script>
/// <script id="MathJax-script" async src="https://cdn.jsdelivr.net/npm/mathjax@3/es5/tex-mml-chtml.js"></script>
///
/// The square \\(n \times n\\) stencil \\((Kx)\_i = x_{i+1} - x_i\\) with a
/// Neumann boundary: the last row is zero. Row and column sums are exact
/// analytic values (every interior stencil entry has magnitude one, so a
/// row with two entries contributes \\(2\\) for any exponent).
pub struct BlockGradient1D<L: LinAlg>
{
    ph_l: PhantomData<L>,
    n: usize,
}

impl<L: LinAlg> BlockGradient1D<L>
{
    /// Creates an instance on `n` grid points.
    pub fn new(n: usize) -> Self
    {
        assert!(n > 0);

        BlockGradient1D {
            ph_l: PhantomData,
            n,
        }
    }
}

impl<L: LinAlg> Block<L> for BlockGradient1D<L>
{
    fn size(&self) -> (usize, usize)
    {
        (self.n, self.n)
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        fwd_diff_add::<L>(alpha, x, y, 0, self.n - 1, 1);
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        fwd_diff_t_add::<L>(alpha, x, y, 0, self.n - 1, 1);
    }

    fn absadd_cols(&self, _p: L::F, tau: &mut L::V)
    {
        let f1 = L::F::one();

        adds_range::<L>(f1, tau, 0, self.n - 1);
        adds_range::<L>(f1, tau, 1, self.n - 1);
    }

    fn absadd_rows(&self, _p: L::F, sigma: &mut L::V)
    {
        let f2 = L::F::one() + L::F::one();

        adds_range::<L>(f2, sigma, 0, self.n - 1);
    }
}

//

/// Forward-difference gradient on a 2D grid.
///
/// Grid cells are indexed `ix + nx * iy`; the output stacks the
/// \\(\partial_x\\) component on rows \\([0, N)\\) and the
/// \\(\partial_y\\) component on rows \\([N, 2N)\\), \\(N = n_x n_y\\),
/// each with a Neumann boundary (zero last difference per axis). Applies
/// reduce to contiguous sub-view axpys and stay on the device; sums are
/// exact analytic values.
pub struct BlockGradient2D<L: LinAlg>
{
    ph_l: PhantomData<L>,
    nx: usize,
    ny: usize,
}

impl<L: LinAlg> BlockGradient2D<L>
{
    /// Creates an instance on an `nx` x `ny` grid.
    pub fn new(nx: usize, ny: usize) -> Self
    {
        assert!(nx > 0 && ny > 0);

        BlockGradient2D {
            ph_l: PhantomData,
            nx, ny,
        }
    }

    fn cells(&self) -> usize
    {
        self.nx * self.ny
    }
}

impl<L: LinAlg> Block<L> for BlockGradient2D<L>
{
    fn size(&self) -> (usize, usize)
    {
        (2 * self.cells(), self.cells())
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let (nx, ny, nn) = (self.nx, self.ny, self.cells());

        subv_mut!(y, (gx; nn), (gy; nn));

        for iy in 0.. ny {
            fwd_diff_add::<L>(alpha, x, &mut gx, iy * nx, nx - 1, 1);
        }
        fwd_diff_add::<L>(alpha, x, &mut gy, 0, nn - nx, nx);
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let (nx, ny, nn) = (self.nx, self.ny, self.cells());

        subv!(x, (gx; nn), (gy; nn));

        for iy in 0.. ny {
            fwd_diff_t_add::<L>(alpha, &gx, y, iy * nx, nx - 1, 1);
        }
        fwd_diff_t_add::<L>(alpha, &gy, y, 0, nn - nx, nx);
    }

    fn absadd_cols(&self, _p: L::F, tau: &mut L::V)
    {
        let f1 = L::F::one();
        let (nx, ny, nn) = (self.nx, self.ny, self.cells());

        for iy in 0.. ny {
            adds_range::<L>(f1, tau, iy * nx, nx - 1);
            adds_range::<L>(f1, tau, iy * nx + 1, nx - 1);
        }
        adds_range::<L>(f1, tau, 0, nn - nx);
        adds_range::<L>(f1, tau, nx, nn - nx);
    }

    fn absadd_rows(&self, _p: L::F, sigma: &mut L::V)
    {
        let f2 = L::F::one() + L::F::one();
        let (nx, ny, nn) = (self.nx, self.ny, self.cells());

        subv_mut!(sigma, (sx; nn), (sy; nn));

        for iy in 0.. ny {
            adds_range::<L>(f2, &mut sx, iy * nx, nx - 1);
        }
        adds_range::<L>(f2, &mut sy, 0, nn - nx);
    }
}

//

/// Forward-difference gradient on a 3D grid.
///
/// Grid cells are indexed `ix + nx * (iy + ny * iz)`; the output stacks
/// the three axis components on rows \\([0, N)\\), \\([N, 2N)\\) and
/// \\([2N, 3N)\\), \\(N = n_x n_y n_z\\).
pub struct BlockGradient3D<L: LinAlg>
{
    ph_l: PhantomData<L>,
    nx: usize,
    ny: usize,
    nz: usize,
}

impl<L: LinAlg> BlockGradient3D<L>
{
    /// Creates an instance on an `nx` x `ny` x `nz` grid.
    pub fn new(nx: usize, ny: usize, nz: usize) -> Self
    {
        assert!(nx > 0 && ny > 0 && nz > 0);

        BlockGradient3D {
            ph_l: PhantomData,
            nx, ny, nz,
        }
    }

    fn cells(&self) -> usize
    {
        self.nx * self.ny * self.nz
    }
}

impl<L: LinAlg> Block<L> for BlockGradient3D<L>
{
    fn size(&self) -> (usize, usize)
    {
        (3 * self.cells(), self.cells())
    }

    fn op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let (nx, ny, nz, nn) = (self.nx, self.ny, self.nz, self.cells());
        let slab = nx * ny;

        subv_mut!(y, (gx; nn), (gy; nn), (gz; nn));

        for is in 0.. ny * nz {
            fwd_diff_add::<L>(alpha, x, &mut gx, is * nx, nx - 1, 1);
        }
        for iz in 0.. nz {
            fwd_diff_add::<L>(alpha, x, &mut gy, iz * slab, slab - nx, nx);
        }
        fwd_diff_add::<L>(alpha, x, &mut gz, 0, nn - slab, slab);
    }

    fn trans_op_add(&self, alpha: L::F, x: &L::V, y: &mut L::V)
    {
        let (nx, ny, nz, nn) = (self.nx, self.ny, self.nz, self.cells());
        let slab = nx * ny;

        subv!(x, (gx; nn), (gy; nn), (gz; nn));

        for is in 0.. ny * nz {
            fwd_diff_t_add::<L>(alpha, &gx, y, is * nx, nx - 1, 1);
        }
        for iz in 0.. nz {
            fwd_diff_t_add::<L>(alpha, &gy, y, iz * slab, slab - nx, nx);
        }
        fwd_diff_t_add::<L>(alpha, &gz, y, 0, nn - slab, slab);
    }

    fn absadd_cols(&self, _p: L::F, tau: &mut L::V)
    {
        let f1 = L::F::one();
        let (nx, ny, nz, nn) = (self.nx, self.ny, self.nz, self.cells());
        let slab = nx * ny;

        for is in 0.. ny * nz {
            adds_range::<L>(f1, tau, is * nx, nx - 1);
            adds_range::<L>(f1, tau, is * nx + 1, nx - 1);
        }
        for iz in 0.. nz {
            adds_range::<L>(f1, tau, iz * slab, slab - nx);
            adds_range::<L>(f1, tau, iz * slab + nx, slab - nx);
        }
        adds_range::<L>(f1, tau, 0, nn - slab);
        adds_range::<L>(f1, tau, slab, nn - slab);
    }

    fn absadd_rows(&self, _p: L::F, sigma: &mut L::V)
    {
        let f2 = L::F::one() + L::F::one();
        let (nx, ny, nz, nn) = (self.nx, self.ny, self.nz, self.cells());
        let slab = nx * ny;

        subv_mut!(sigma, (sx; nn), (sy; nn), (sz; nn));

        for is in 0.. ny * nz {
            adds_range::<L>(f2, &mut sx, is * nx, nx - 1);
        }
        for iz in 0.. nz {
            adds_range::<L>(f2, &mut sy, iz * slab, slab - nx);
        }
        adds_range::<L>(f2, &mut sz, 0, nn - slab);
    }
}

//

#[cfg(test)]
mod tests
{
    use float_eq::assert_float_eq;
    use crate::solver::Block;
    use crate::FloatGeneric;
    use super::*;

    type L = FloatGeneric<f64>;

    #[test]
    fn test_gradient_1d()
    {
        let b = BlockGradient1D::<L>::new(4);

        let y = &mut[0.; 4];
        b.op_add(1., [1., 3., 2., 5.].as_ref(), y.as_mut());
        assert_float_eq!(y.as_ref(), [2., -1., 3., 0.].as_ref(), abs_all <= 1e-12);

        // boundary row is zero, interior rows sum to 2
        let sigma = &mut[0.; 4];
        b.absadd_rows(1., sigma.as_mut());
        assert_float_eq!(sigma.as_ref(), [2., 2., 2., 0.].as_ref(), abs_all <= 1e-12);

        let tau = &mut[0.; 4];
        b.absadd_cols(1., tau.as_mut());
        assert_float_eq!(tau.as_ref(), [1., 2., 2., 1.].as_ref(), abs_all <= 1e-12);
    }

    // materialize a block column by column through op_add
    fn dense_of<B: Block<L>>(b: &B) -> Vec<Vec<f64>>
    {
        let (m, n) = b.size();
        let mut cols = Vec::new();
        for j in 0.. n {
            let mut e = vec![0.; n];
            e[j] = 1.;
            let mut y = vec![0.; m];
            b.op_add(1., e.as_slice(), y.as_mut_slice());
            cols.push(y);
        }
        cols
    }

    #[test]
    fn test_gradient_2d_adjoint_and_sums()
    {
        let (nx, ny) = (4, 3);
        let b = BlockGradient2D::<L>::new(nx, ny);
        let (m, n) = Block::<L>::size(&b);
        let cols = dense_of(&b);

        // adjoint consistency against the materialized matrix
        let u: Vec<f64> = (0.. m).map(|i| ((i * 7 + 3) % 11) as f64 - 5.).collect();
        let mut ktu_ref = vec![0.; n];
        for j in 0.. n {
            for i in 0.. m {
                ktu_ref[j] += cols[j][i] * u[i];
            }
        }
        let mut ktu = vec![0.; n];
        b.trans_op_add(1., u.as_slice(), ktu.as_mut_slice());
        assert_float_eq!(ktu.as_slice(), ktu_ref.as_slice(), abs_all <= 1e-12);

        // analytic sums against the materialized matrix
        let mut tau = vec![0.; n];
        b.absadd_cols(1., tau.as_mut_slice());
        for j in 0.. n {
            let s: f64 = cols[j].iter().map(|v| v.abs()).sum();
            assert_float_eq!(tau[j], s, abs <= 1e-12);
        }

        let mut sigma = vec![0.; m];
        b.absadd_rows(1., sigma.as_mut_slice());
        for i in 0.. m {
            let s: f64 = cols.iter().map(|c| c[i].abs()).sum();
            assert_float_eq!(sigma[i], s, abs <= 1e-12);
        }
    }

    #[test]
    fn test_gradient_3d_adjoint()
    {
        let b = BlockGradient3D::<L>::new(3, 2, 2);
        let (m, n) = Block::<L>::size(&b);

        let u: Vec<f64> = (0.. m).map(|i| ((i * 5 + 1) % 7) as f64 - 3.).collect();
        let v: Vec<f64> = (0.. n).map(|j| ((j * 3 + 2) % 5) as f64 - 2.).collect();

        // <K v, u> == <v, K^T u>
        let mut kv = vec![0.; m];
        b.op_add(1., v.as_slice(), kv.as_mut_slice());
        let mut ktu = vec![0.; n];
        b.trans_op_add(1., u.as_slice(), ktu.as_mut_slice());

        let ip_a: f64 = kv.iter().zip(&u).map(|(a, b)| a * b).sum();
        let ip_b: f64 = v.iter().zip(&ktu).map(|(a, b)| a * b).sum();
        assert_float_eq!(ip_a, ip_b, abs <= 1e-10);
    }
}
