/*!
This crate provides an `f32`-specific CUDA/cuBLAS implementation of the
[`kura_core::solver::LinAlgEx`] linear algebra backend.

* [`F32Cuda`] is the backend; plug it in as the `L` type parameter of the
  `kura` stack.
* [`F32CudaVec`] keeps a device buffer and a host buffer per vector and
  synchronizes them lazily, so reductions and BLAS transforms run on the
  device while pointwise proximal loops read host views.
* [`cuda_mgr`] owns the process-wide CUDA context, stream and cuBLAS
  handle, selects and enumerates devices, and resets cached device state
  between solves.

You need a [NVIDIA CUDA Toolkit](https://developer.nvidia.com/cuda-downloads)
to link.
*/

pub mod cuda_mgr;

//

mod f32cuda_vec;

pub use f32cuda_vec::*;

//

mod f32cuda;

pub use f32cuda::*;
