use num_traits::Float;
use core::marker::PhantomData;
use crate::solver::{LinAlg, LinAlgEx};

/// `num::Float`-generic [`LinAlgEx`] implementation.
///
/// All numeric operations are written in pure Rust. Slow compared to a
/// device backend, but free of environment dependencies; the whole stack
/// builds and tests with it on any machine.
#[derive(Clone)]
pub struct FloatGeneric<F>
{
    ph_f: PhantomData<F>,
}

impl<F: Float> LinAlg for FloatGeneric<F>
{
    type F = F;
    type V = [F];

    fn norm(x: &[F]) -> F
    {
        let mut sum = F::zero();
        for u in x {
            sum = sum + *u * *u;
        }
        sum.sqrt()
    }

    fn norm_inf(x: &[F]) -> F
    {
        let mut max = F::zero();
        for u in x {
            max = max.max(u.abs());
        }
        max
    }

    fn abssum(x: &[F], incx: usize) -> F
    {
        if incx == 0 {
            F::zero()
        }
        else {
            let mut sum = F::zero();
            for u in x.chunks(incx) {
                sum = sum + u[0].abs();
            }
            sum
        }
    }

    fn abspowsum(x: &[F], p: F, incx: usize) -> F
    {
        if incx == 0 {
            F::zero()
        }
        else {
            let mut sum = F::zero();
            for u in x.chunks(incx) {
                sum = sum + u[0].abs().powf(p);
            }
            sum
        }
    }

    fn copy(x: &[F], y: &mut[F])
    {
        assert_eq!(x.len(), y.len());

        for (u, v) in x.iter().zip(y) {
            *v = *u;
        }
    }

    fn fill(a: F, y: &mut[F])
    {
        for v in y {
            *v = a;
        }
    }

    fn scale(alpha: F, x: &mut[F])
    {
        for u in x {
            *u = alpha * *u;
        }
    }

    fn add(alpha: F, x: &[F], y: &mut[F])
    {
        assert_eq!(x.len(), y.len());

        for (u, v) in x.iter().zip(y) {
            *v = *v + alpha * *u;
        }
    }

    fn adds(s: F, y: &mut[F])
    {
        for v in y {
            *v = *v + s;
        }
    }

    fn elem_div(x: &[F], y: &mut[F])
    {
        assert_eq!(x.len(), y.len());

        for (u, v) in x.iter().zip(y) {
            *v = *v / *u;
        }
    }

    fn clamp_min(a: F, y: &mut[F])
    {
        for v in y {
            *v = v.max(a);
        }
    }

    fn clamp_max(a: F, y: &mut[F])
    {
        for v in y {
            *v = v.min(a);
        }
    }

    fn transform_di(alpha: F, d: &[F], x: &[F], beta: F, y: &mut[F])
    {
        assert_eq!(d.len(), x.len());
        assert_eq!(d.len(), y.len());

        for (i, v) in y.iter_mut().enumerate() {
            *v = alpha * d[i] * x[i] + beta * *v;
        }
    }
}

impl<F: Float> LinAlgEx for FloatGeneric<F>
{
    // y = a*mat*x + b*y
    fn transform_ge(transpose: bool, n_row: usize, n_col: usize, alpha: F, mat: &[F], x: &[F], beta: F, y: &mut[F])
    {
        assert_eq!(mat.len(), n_row * n_col);
        if transpose {
            assert_eq!(x.len(), n_row);
            assert_eq!(y.len(), n_col);
        } else {
            assert_eq!(x.len(), n_col);
            assert_eq!(y.len(), n_row);
        }

        // column-major: mat[r + c * n_row]
        for (r, v) in y.iter_mut().enumerate() {
            let mut mat_x = F::zero();
            for (c, u) in x.iter().enumerate() {
                let e = if transpose {mat[c + r * n_row]} else {mat[r + c * n_row]};
                mat_x = mat_x + e * *u;
            }
            *v = alpha * mat_x + beta * *v;
        }
    }
}

//

#[test]
fn test_floatgeneric1()
{
    use float_eq::assert_float_eq;

    type L = FloatGeneric<f64>;

    let mat = &[ // column-major
        1., 4.,
        2., 5.,
        3., 6.,
    ];
    let x = &[1., -1., 2.];
    let y = &mut[1., 1.];

    L::transform_ge(false, 2, 3, 1., mat, x, 2., y);
    assert_float_eq!(y.as_ref(), [7., 13.].as_ref(), abs_all <= 1e-12);

    let xt = &[1., 1.];
    let yt = &mut[0.; 3];
    L::transform_ge(true, 2, 3, 1., mat, xt, 0., yt);
    assert_float_eq!(yt.as_ref(), [5., 7., 9.].as_ref(), abs_all <= 1e-12);
}

#[test]
fn test_floatgeneric2()
{
    use float_eq::assert_float_eq;

    type L = FloatGeneric<f64>;

    let x = &[1., -2., 4., -8.];
    assert_float_eq!(L::abssum(x, 1), 15., abs <= 1e-12);
    assert_float_eq!(L::abssum(x, 2), 5., abs <= 1e-12);
    assert_float_eq!(L::abspowsum(x, 2., 1), 85., abs <= 1e-12);
    assert_float_eq!(L::norm_inf(x), 8., abs <= 1e-12);
}
