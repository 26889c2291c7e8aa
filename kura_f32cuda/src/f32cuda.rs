use kura_core::solver::{VecLike, LinAlg, LinAlgEx};
use cublas_sys::*;
use crate::cuda_mgr;
use crate::f32cuda_vec::F32CudaVec;

//

/// `f32`-specific [`LinAlgEx`] implementation using `rustacuda` and
/// `cublas-sys`.
///
/// Reductions and transforms run through cuBLAS on the device; the few
/// pointwise operations cuBLAS has no primitive for run on synchronized
/// host views of [`F32CudaVec`], exactly like the pointwise proximal
/// loops of the core.
///
/// You need a [NVIDIA CUDA Toolkit](https://developer.nvidia.com/cuda-downloads) to link.
#[derive(Clone)]
pub struct F32Cuda;

//

impl LinAlg for F32Cuda
{
    type F = f32;
    type V = F32CudaVec;

    fn norm(x: &F32CudaVec) -> f32
    {
        let mut result = 0.;

        unsafe {
            let st = cublasSnrm2_v2(
                cuda_mgr::cublas_handle(),
                x.len() as i32,
                x.get_dev().as_ptr(), 1,
                &mut result
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }

        result
    }

    fn norm_inf(x: &F32CudaVec) -> f32
    {
        if x.is_empty() {
            return 0.;
        }

        let mut idx: i32 = 0;

        unsafe {
            let st = cublasIsamax_v2(
                cuda_mgr::cublas_handle(),
                x.len() as i32,
                x.get_dev().as_ptr(), 1,
                &mut idx
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }

        // cuBLAS index is one-based
        x.get_ref()[(idx - 1) as usize].abs()
    }

    fn abssum(x: &F32CudaVec, incx: usize) -> f32
    {
        if incx == 0 {
            0.
        }
        else {
            let mut result = 0.;

            unsafe {
                let st = cublasSasum_v2(
                    cuda_mgr::cublas_handle(),
                    ((x.len() + (incx - 1)) / incx) as i32,
                    x.get_dev().as_ptr(), incx as i32,
                    &mut result
                );
                assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
            }

            result
        }
    }

    fn abspowsum(x: &F32CudaVec, p: f32, incx: usize) -> f32
    {
        if incx == 0 {
            return 0.;
        }

        if p == 1. {
            Self::abssum(x, incx)
        }
        else if p == 2. {
            if incx == 1 {
                let n = Self::norm(x);
                n * n
            }
            else {
                let mut result = 0.;

                unsafe {
                    let st = cublasSnrm2_v2(
                        cuda_mgr::cublas_handle(),
                        ((x.len() + (incx - 1)) / incx) as i32,
                        x.get_dev().as_ptr(), incx as i32,
                        &mut result
                    );
                    assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
                }

                result * result
            }
        }
        else {
            // no cuBLAS primitive; reduce on the host view
            x.get_ref().iter().step_by(incx).map(|v| v.abs().powf(p)).sum()
        }
    }

    fn copy(x: &F32CudaVec, y: &mut F32CudaVec)
    {
        assert_eq!(x.len(), y.len());

        unsafe {
            let st = cublasScopy_v2(
                cuda_mgr::cublas_handle(),
                x.len() as i32,
                x.get_dev().as_ptr(), 1,
                y.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }

    fn fill(a: f32, y: &mut F32CudaVec)
    {
        for v in y.get_mut() {
            *v = a;
        }
    }

    fn scale(alpha: f32, x: &mut F32CudaVec)
    {
        unsafe {
            let st = cublasSscal_v2(
                cuda_mgr::cublas_handle(),
                x.len() as i32,
                &alpha, x.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }

    fn add(alpha: f32, x: &F32CudaVec, y: &mut F32CudaVec)
    {
        assert_eq!(x.len(), y.len());

        unsafe {
            let st = cublasSaxpy_v2(
                cuda_mgr::cublas_handle(),
                x.len() as i32,
                &alpha, x.get_dev().as_ptr(), 1,
                y.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }

    fn adds(s: f32, y: &mut F32CudaVec)
    {
        let ones = cuda_mgr::ones_ptr(1);

        unsafe {
            let st = cublasSaxpy_v2(
                cuda_mgr::cublas_handle(),
                y.len() as i32,
                &s, ones, 0,
                y.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }

    fn elem_div(x: &F32CudaVec, y: &mut F32CudaVec)
    {
        assert_eq!(x.len(), y.len());

        let xs = x.get_ref();
        for (u, v) in xs.iter().zip(y.get_mut()) {
            *v = *v / *u;
        }
    }

    fn clamp_min(a: f32, y: &mut F32CudaVec)
    {
        for v in y.get_mut() {
            *v = v.max(a);
        }
    }

    fn clamp_max(a: f32, y: &mut F32CudaVec)
    {
        for v in y.get_mut() {
            *v = v.min(a);
        }
    }

    fn transform_di(alpha: f32, d: &F32CudaVec, x: &F32CudaVec, beta: f32, y: &mut F32CudaVec)
    {
        assert_eq!(d.len(), x.len());
        assert_eq!(d.len(), y.len());

        unsafe {
            // diagonal transform as a zero-bandwidth banded multiply
            let st = cublasSsbmv_v2(
                cuda_mgr::cublas_handle(),
                cublasFillMode_t::CUBLAS_FILL_MODE_UPPER,
                d.len() as i32, 0,
                &alpha, d.get_dev().as_ptr(), 1,
                x.get_dev().as_ptr(), 1,
                &beta, y.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }

    fn reset_device_state()
    {
        cuda_mgr::reset_cache();
    }
}

//

impl LinAlgEx for F32Cuda
{
    // y = a*mat*x + b*y
    fn transform_ge(transpose: bool, n_row: usize, n_col: usize, alpha: f32, mat: &F32CudaVec, x: &F32CudaVec, beta: f32, y: &mut F32CudaVec)
    {
        assert_eq!(mat.len(), n_row * n_col);

        let trans = if transpose {
            assert_eq!(x.len(), n_row);
            assert_eq!(y.len(), n_col);

            cublasOperation_t::CUBLAS_OP_T
        } else {
            assert_eq!(x.len(), n_col);
            assert_eq!(y.len(), n_row);

            cublasOperation_t::CUBLAS_OP_N
        };

        unsafe {
            let st = cublasSgemv_v2(
                cuda_mgr::cublas_handle(),
                trans,
                n_row as i32, n_col as i32,
                &alpha, mat.get_dev().as_ptr(), n_row as i32,
                x.get_dev().as_ptr(), 1,
                &beta, y.get_dev_mut().as_mut_ptr(), 1
            );
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }
    }
}
