//! [`F32CudaVec`] module.

use std::prelude::v1::*;
use std::rc::Rc;
use std::cell::RefCell;
use std::thread_local;
use std::collections::HashMap;
use std::pin::Pin;
use rustacuda::memory::{DeviceBuffer, DeviceSlice, CopyDestination};
use kura_core::solver::{VecRef, VecMut, VecLike};
use super::cuda_mgr;

//

// which side of a vector holds the freshest data
#[derive(Eq, PartialEq, Copy, Clone, Debug)]
enum Freshest
{
    Sync,
    Host,
    Dev,
}

#[derive(Eq, PartialEq, Copy, Clone)]
enum HostBuf
{
    Ref(*const f32),
    Mut(*mut f32),
}

/// `f32`-specific vector with a CUDA device buffer, the [`VecLike`]
/// implementation of [`crate::F32Cuda`]`::V`.
///
/// Every vector wraps a host slice and owns a device copy of it. Sub-views
/// share the device buffer of their parent and track which side was
/// written last; host and device contents are synchronized lazily on
/// access, and a dropped view reconciles its freshness state with its
/// parent (see [`VecLike::drop_view`]).
pub struct F32CudaVec
{
    idx: usize,
    parent_idx: Option<usize>,
    dev_buf: Rc<RefCell<DeviceBuffer<f32>>>,
    host_buf: HostBuf,
    sta: usize,
    end: usize,
    fresh: RefCell<Freshest>,
}

struct VecManager
{
    cnt: usize,
    map: HashMap<usize, Pin<Box<F32CudaVec>>>,
}

impl VecManager
{
    fn new() -> VecManager
    {
        VecManager {
            cnt: 0,
            map: HashMap::new(),
        }
    }

    fn register<'a, F>(&mut self, func: F) -> &'a mut F32CudaVec
    where F: FnOnce(usize) -> F32CudaVec
    {
        let idx = self.cnt;
        self.cnt = idx + 1;

        let cv = func(idx);

        let r = self.map.insert(idx, Box::pin(cv));
        assert!(r.is_none());
        let cv = self.map.get_mut(&idx).unwrap();

        unsafe {
            std::mem::transmute::<&mut F32CudaVec, &'a mut F32CudaVec>(cv)
        }
    }
}

impl Drop for VecManager
{
    fn drop(&mut self) {
        if self.map.len() > 0 {
            log::warn!("memory leak: {} vectors", self.map.len())
        }
    }
}

//

thread_local!(static VEC_MANAGER: RefCell<VecManager> = RefCell::new(VecManager::new()));

fn new_vec_from_ref(s: &[f32]) -> &mut F32CudaVec
{
    VEC_MANAGER.with(|mgr| {
        let mut mgr = mgr.borrow_mut();

        mgr.register(|idx| {
            F32CudaVec {
                idx,
                parent_idx: None,
                dev_buf: Rc::new(RefCell::new(cuda_mgr::buf_from_slice(s))),
                host_buf: HostBuf::Ref(s.as_ptr()),
                sta: 0,
                end: s.len(),
                fresh: RefCell::new(Freshest::Sync),
            }
        })
    })
}

fn new_vec_from_mut(s: &mut[f32]) -> &mut F32CudaVec
{
    VEC_MANAGER.with(|mgr| {
        let mut mgr = mgr.borrow_mut();

        mgr.register(|idx| {
            F32CudaVec {
                idx,
                parent_idx: None,
                dev_buf: Rc::new(RefCell::new(cuda_mgr::buf_from_slice(s))),
                host_buf: HostBuf::Mut(s.as_mut_ptr()),
                sta: 0,
                end: s.len(),
                fresh: RefCell::new(Freshest::Sync),
            }
        })
    })
}

fn split_vec(cv: &F32CudaVec, sta: usize, end: usize) -> &mut F32CudaVec
{
    assert!(sta <= end);
    assert!(cv.sta + sta <= cv.end);
    assert!(cv.sta + end <= cv.end);

    VEC_MANAGER.with(|mgr| {
        let mut mgr = mgr.borrow_mut();

        mgr.register(|idx| {
            F32CudaVec {
                idx,
                parent_idx: Some(cv.idx),
                dev_buf: cv.dev_buf.clone(),
                host_buf: cv.host_buf,
                sta: cv.sta + sta,
                end: cv.sta + end,
                fresh: RefCell::new(*cv.fresh.borrow()),
            }
        })
    })
}

fn remove_vec(idx: usize)
{
    VEC_MANAGER.with(|mgr| {
        let mut mgr = mgr.borrow_mut();

        // reconcile freshness of the split tree:
        //
        // parent    child(cv)
        // Sync   -> Sync       do nothing
        //        -> Host       change parent to Host
        //        -> Dev        change parent to Dev
        // Host   -> Sync       do nothing
        //        -> Host       do nothing
        //        -> Dev        copy child range from device to host
        // Dev    -> Sync       do nothing
        //        -> Host       copy child range from host to device
        //        -> Dev        do nothing

        let cv = &mgr.map[&idx];
        let cv_fresh = *cv.fresh.borrow();
        let cv_par_idx = cv.parent_idx;
        let mut cv_par_fresh = None;

        if let Some(par_idx) = cv_par_idx {
            let par = mgr.map.get_mut(&par_idx).unwrap();
            let mut par_fresh = par.fresh.borrow_mut();

            cv_par_fresh = Some(*par_fresh);

            if *par_fresh == Freshest::Sync {
                *par_fresh = cv_fresh;
            }
        }

        let cv = mgr.map.get_mut(&idx).unwrap();
        if let Some(par_fresh) = cv_par_fresh {
            match par_fresh {
                Freshest::Sync => {},
                Freshest::Host => {
                    if cv_fresh == Freshest::Dev {
                        cv.sync_from_dev();
                    }
                },
                Freshest::Dev => {
                    if cv_fresh == Freshest::Host {
                        cv.sync_from_host();
                    }
                },
            }
        }
        else {
            if cv_fresh == Freshest::Dev {
                cv.sync_from_dev();
            }
        }

        mgr.map.remove(&idx).unwrap();
    });
}

//

impl VecLike for F32CudaVec
{
    type F = f32;

    fn new_ref(s: &[f32]) -> VecRef<'_, F32CudaVec>
    {
        let cv = new_vec_from_ref(s);

        VecRef::new(cv)
    }

    fn new_mut(s: &mut[f32]) -> VecMut<'_, F32CudaVec>
    {
        let cv = new_vec_from_mut(s);

        VecMut::new(cv)
    }

    fn split_ref(&self, mid: usize) -> (VecRef<'_, F32CudaVec>, VecRef<'_, F32CudaVec>)
    {
        let cv0 = split_vec(self, 0, mid);
        let cv1 = split_vec(self, mid, self.len());

        (VecRef::new(cv0), VecRef::new(cv1))
    }

    fn split_mut(&mut self, mid: usize) -> (VecMut<'_, F32CudaVec>, VecMut<'_, F32CudaVec>)
    {
        let cv0 = split_vec(self, 0, mid);
        let cv1 = split_vec(self, mid, self.len());

        (VecMut::new(cv0), VecMut::new(cv1))
    }

    fn drop_view(&self)
    {
        remove_vec(self.idx);
    }

    fn len(&self) -> usize
    {
        self.end - self.sta
    }

    fn get_ref(&self) -> &[f32]
    {
        let mut fresh = self.fresh.borrow_mut();
        match *fresh {
            Freshest::Sync | Freshest::Host => {},
            Freshest::Dev => {
                self.sync_from_dev();
                *fresh = Freshest::Sync;
            },
        }

        let hb_ref = self.host_buf_ref();

        unsafe {
            std::mem::transmute::<&[f32], &[f32]>(hb_ref)
        }
    }

    fn get_mut(&mut self) -> &mut[f32]
    {
        let mut fresh = self.fresh.borrow_mut();
        match *fresh {
            Freshest::Sync => {
                *fresh = Freshest::Host;
            },
            Freshest::Host => {},
            Freshest::Dev => {
                self.sync_from_dev();
                *fresh = Freshest::Host;
            },
        }

        let hb_mut = self.host_buf_mut();

        unsafe {
            std::mem::transmute::<&mut[f32], &mut[f32]>(hb_mut)
        }
    }
}

//

impl F32CudaVec
{
    fn host_buf_ref(&self) -> &[f32]
    {
        let hb_ptr = match self.host_buf {
            HostBuf::Ref(p) => {p},
            HostBuf::Mut(p) => {p as *const f32},
        };

        unsafe {
            let hb = std::ptr::slice_from_raw_parts(hb_ptr.add(self.sta), self.end - self.sta);

            hb.as_ref().unwrap()
        }
    }

    fn host_buf_mut(&self) -> &mut[f32]
    {
        let hb_ptr = match self.host_buf {
            HostBuf::Ref(_) => {panic!("mutable access through an immutable vector")},
            HostBuf::Mut(p) => {p},
        };

        unsafe {
            let hb = std::ptr::slice_from_raw_parts_mut(hb_ptr.add(self.sta), self.end - self.sta);

            hb.as_mut().unwrap()
        }
    }

    fn sync_from_dev(&self)
    {
        let db = &self.dev_buf.as_ref().borrow()[self.sta.. self.end];
        let hb_mut = self.host_buf_mut();
        db.copy_to(hb_mut).unwrap();
    }

    fn sync_from_host(&self)
    {
        let db = &mut self.dev_buf.as_ref().borrow_mut()[self.sta.. self.end];
        let hb_ref = self.host_buf_ref();
        db.copy_from(hb_ref).unwrap();
    }

    /// Device-side view of the vector contents, synchronized from the
    /// host if necessary.
    pub fn get_dev(&self) -> &DeviceSlice<f32>
    {
        let mut fresh = self.fresh.borrow_mut();
        match *fresh {
            Freshest::Sync | Freshest::Dev => {},
            Freshest::Host => {
                self.sync_from_host();
                *fresh = Freshest::Sync;
            },
        }

        let db_ref = &self.dev_buf.as_ref().borrow()[self.sta.. self.end];

        unsafe {
            std::mem::transmute::<&DeviceSlice<f32>, &DeviceSlice<f32>>(db_ref)
        }
    }

    /// Mutable version of [`F32CudaVec::get_dev`].
    pub fn get_dev_mut(&mut self) -> &mut DeviceSlice<f32>
    {
        let mut fresh = self.fresh.borrow_mut();
        match *fresh {
            Freshest::Sync => {
                *fresh = Freshest::Dev;
            },
            Freshest::Dev => {},
            Freshest::Host => {
                self.sync_from_host();
                *fresh = Freshest::Dev;
            },
        }

        let db_mut = &mut self.dev_buf.as_ref().borrow_mut()[self.sta.. self.end];

        unsafe {
            std::mem::transmute::<&mut DeviceSlice<f32>, &mut DeviceSlice<f32>>(db_mut)
        }
    }
}
