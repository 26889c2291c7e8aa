//! CUDA manager module.

use std::prelude::v1::*;
use std::thread_local;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use num_traits::Zero;
use rustacuda::prelude::*;
use rustacuda::device::DeviceAttribute;
use rustacuda::memory::{DeviceBuffer, DeviceCopy};
use cublas_sys::*;
use kura_core::solver::SolverError;

//

// process-wide selected device index, read at first use per thread
static DEVICE_INDEX: AtomicUsize = AtomicUsize::new(0);

/// Selects the device index used when the CUDA context of a thread is
/// created.
///
/// Takes effect before the first CUDA use of a thread; a context that
/// already exists keeps its device, which is logged as a warning.
pub fn set_device(id: usize) -> Result<(), SolverError>
{
    rustacuda::init(CudaFlags::empty())
        .map_err(|e| SolverError::Resource(format!("CUDA driver initialization failed: {:?}", e)))?;

    let count = Device::num_devices()
        .map_err(|e| SolverError::Resource(format!("CUDA device query failed: {:?}", e)))? as usize;
    if id >= count {
        return Err(SolverError::Resource(format!(
            "device index {} out of {} visible devices", id, count)));
    }

    let prev = DEVICE_INDEX.swap(id, Ordering::SeqCst);
    if prev != id {
        CUDA_MANAGER.with(|mgr| {
            if mgr.borrow().is_some() {
                log::warn!("CUDA context already created on device {}; {} applies to new threads", prev, id);
            }
        });
    }

    Ok(())
}

/// One visible CUDA device.
#[derive(Debug, Clone)]
pub struct DeviceInfo
{
    /// Device index usable with [`set_device`].
    pub id: usize,
    /// Device name.
    pub name: String,
    /// Total device memory in bytes.
    pub memory_bytes: usize,
    /// CUDA core count (multiprocessors times cores per multiprocessor).
    pub cores: usize,
}

/// Enumerates the visible CUDA devices.
pub fn device_list() -> Result<Vec<DeviceInfo>, SolverError>
{
    rustacuda::init(CudaFlags::empty())
        .map_err(|e| SolverError::Resource(format!("CUDA driver initialization failed: {:?}", e)))?;

    let map_err = |e| SolverError::Resource(format!("CUDA device query failed: {:?}", e));

    let mut list = Vec::new();
    for (id, device) in Device::devices().map_err(map_err)?.enumerate() {
        let device = device.map_err(map_err)?;
        let major = device.get_attribute(DeviceAttribute::ComputeCapabilityMajor).map_err(map_err)?;
        let minor = device.get_attribute(DeviceAttribute::ComputeCapabilityMinor).map_err(map_err)?;
        let mp = device.get_attribute(DeviceAttribute::MultiprocessorCount).map_err(map_err)? as usize;

        list.push(DeviceInfo {
            id,
            name: device.name().map_err(map_err)?,
            memory_bytes: device.total_memory().map_err(map_err)?,
            cores: mp * sm_cores(major, minor),
        });
    }

    Ok(list)
}

// CUDA cores per multiprocessor by compute capability
fn sm_cores(major: i32, minor: i32) -> usize
{
    match (major, minor) {
        (3, _) => 192,
        (5, _) => 128,
        (6, 0) => 64,
        (6, _) => 128,
        (7, _) => 64,
        (8, 0) => 64,
        (8, _) => 128,
        (9, _) => 128,
        _ => 64,
    }
}

//

struct CudaManager
{
    // the context must outlive every device buffer of the thread
    _context: Context,
    stream: Stream,
    cublas_handle: cublasHandle_t,
    // small cached device tables, dropped by reset_cache
    ones: RefCell<Option<DeviceBuffer<f32>>>,
}

impl CudaManager
{
    fn new() -> CudaManager
    {
        // Initialize the CUDA API
        let r = rustacuda::init(CudaFlags::empty());
        if r.is_err() {
            log::error!("CUDA driver initialization failed");
        }
        r.unwrap();

        let id = DEVICE_INDEX.load(Ordering::SeqCst);
        let device = Device::get_device(id as u32);
        if device.is_err() {
            log::error!("CUDA device {} not found", id);
        }
        let device = device.unwrap();

        log::info!("CUDA device {}: {}", id, device.name().unwrap());

        let context = Context::create_and_push(
            ContextFlags::MAP_HOST | ContextFlags::SCHED_AUTO,
            device
        );
        if context.is_err() {
            log::error!("CUDA context failed to create");
        }
        let context = context.unwrap();

        let stream = Stream::new(StreamFlags::DEFAULT, None);
        if stream.is_err() {
            log::error!("CUDA stream failed to create");
        }
        let stream = stream.unwrap();

        let mut cublas_handle: cublasHandle_t = std::ptr::null_mut();
        unsafe {
            let st = cublasCreate_v2(&mut cublas_handle);
            if st != cublasStatus_t::CUBLAS_STATUS_SUCCESS {
                log::error!("cuBLAS handle failed to create");
            }
            assert_eq!(st, cublasStatus_t::CUBLAS_STATUS_SUCCESS);
        }

        log::debug!("CUDA_MANAGER created");
        CudaManager {
            _context: context,
            stream,
            cublas_handle,
            ones: RefCell::new(None),
        }
    }
}

impl Drop for CudaManager
{
    fn drop(&mut self)
    {
        unsafe {
            let st = cublasDestroy_v2(self.cublas_handle);
            if st != cublasStatus_t::CUBLAS_STATUS_SUCCESS {
                log::error!("cuBLAS handle failed to destroy");
            }
        }

        log::debug!("CUDA_MANAGER dropped");
    }
}

//

thread_local!(static CUDA_MANAGER: RefCell<Option<CudaManager>> = RefCell::new(None));

fn with_mgr<R, F>(f: F) -> R
where F: FnOnce(&CudaManager) -> R
{
    CUDA_MANAGER.with(|mgr| {
        let mut mgr = mgr.borrow_mut();
        if mgr.is_none() {
            *mgr = Some(CudaManager::new());
        }
        f(mgr.as_ref().unwrap())
    })
}

/// Allocates a new device buffer with the same contents as a given slice.
pub fn buf_from_slice<T>(s: &[T]) -> DeviceBuffer<T>
where T: DeviceCopy
{
    with_mgr(|_| { // ensure that rustacuda::init is done
        DeviceBuffer::<T>::from_slice(s).unwrap()
    })
}

/// Allocates a new device buffer of `length` zeroes.
pub fn buf_zeroes<T>(length: usize) -> DeviceBuffer<T>
where T: Zero
{
    with_mgr(|_| { // ensure that rustacuda::init is done
        unsafe {
            DeviceBuffer::zeroed(length).unwrap()
        }
    })
}

/// Gets the cuBLAS handle.
pub(crate) fn cublas_handle() -> cublasHandle_t
{
    with_mgr(|mgr| {
        mgr.cublas_handle
    })
}

// device pointer of a cached all-ones vector of at least `len` elements
pub(crate) fn ones_ptr(len: usize) -> *const f32
{
    with_mgr(|mgr| {
        let mut ones = mgr.ones.borrow_mut();
        let need = match ones.as_ref() {
            Some(b) => b.len() < len,
            None => true,
        };
        if need {
            *ones = Some(buf_from_slice(&vec![1.; len.max(256)]));
        }
        ones.as_ref().unwrap().as_ptr()
    })
}

/// Drops the cached device parameter tables of this thread.
///
/// Invoked before every solve so that no device-side state leaks from one
/// solver instance into the next. The context and handles stay alive.
pub fn reset_cache()
{
    CUDA_MANAGER.with(|mgr| {
        if let Some(mgr) = mgr.borrow().as_ref() {
            *mgr.ones.borrow_mut() = None;
            mgr.stream.synchronize().unwrap_or_else(|e| {
                log::error!("CUDA stream synchronization failed: {:?}", e);
            });
        }
    });
}
