//! Device vector abstraction

use num_traits::Float;
use core::ops::{Deref, DerefMut};

/// Device vector trait.
///
/// Expresses a contiguous vector of scalars that may live in GPU memory.
/// The length is fixed at creation. Sub-range views obtained from
/// [`VecLike::split_ref`]/[`VecLike::split_mut`] alias the parent storage,
/// they never copy it.
///
/// Host access through [`VecLike::get_ref`]/[`VecLike::get_mut`] is always
/// possible; a device-resident implementation synchronizes host and device
/// copies lazily and reconciles the split tree when a view is dropped
/// (see [`VecLike::drop_view`]).
pub trait VecLike
{
    /// Floating point data type of the vector elements.
    type F: Float;

    /// Wraps a host slice into an immutable vector view.
    fn new_ref(s: &[Self::F]) -> VecRef<'_, Self>;
    /// Wraps a host slice into a mutable vector view.
    fn new_mut(s: &mut[Self::F]) -> VecMut<'_, Self>;

    /// Splits into two aliasing sub-views `[0, mid)` and `[mid, len)`.
    fn split_ref(&self, mid: usize) -> (VecRef<'_, Self>, VecRef<'_, Self>);
    /// Mutable version of [`VecLike::split_ref`].
    fn split_mut(&mut self, mid: usize) -> (VecMut<'_, Self>, VecMut<'_, Self>);

    /// Called when a view goes out of scope.
    ///
    /// A device implementation reconciles pending host/device writes of the
    /// view with its parent here. Host implementations do nothing.
    fn drop_view(&self);

    /// Length of the vector.
    fn len(&self) -> usize;

    /// Whether the vector is empty.
    fn is_empty(&self) -> bool
    {
        self.len() == 0
    }

    /// Host-visible read access to the whole vector.
    fn get_ref(&self) -> &[Self::F];
    /// Host-visible write access to the whole vector.
    fn get_mut(&mut self) -> &mut[Self::F];

    /// Reads a single element.
    fn get(&self, idx: usize) -> Self::F
    {
        let (_, spl) = self.split_ref(idx);
        let (ind, _) = spl.split_ref(1);
        ind.get_ref()[0]
    }
    /// Writes a single element.
    fn set(&mut self, idx: usize, val: Self::F)
    {
        let (_, mut spl) = self.split_mut(idx);
        let (mut ind, _) = spl.split_mut(1);
        ind.get_mut()[0] = val;
    }
}

/// Immutable RAII view of a [`VecLike`] vector.
#[derive(Debug)] // NOTE: do not derive Clone, or VecLike::drop_view pairing breaks.
pub struct VecRef<'a, V: VecLike + ?Sized>
{
    v: &'a V,
}

impl<'a, V: VecLike + ?Sized> VecRef<'a, V>
{
    /// Creates a view referring to `v`. Implementors of [`VecLike`] call
    /// this from their splitting methods.
    pub fn new(v: &'a V) -> Self
    {
        VecRef {v}
    }
}

impl<'a, V: VecLike + ?Sized> Deref for VecRef<'a, V>
{
    type Target = V;
    fn deref(&self) -> &Self::Target {self.v}
}

impl<'a, V: VecLike + ?Sized> Drop for VecRef<'a, V>
{
    fn drop(&mut self) {
        self.v.drop_view();
    }
}

/// Mutable RAII view of a [`VecLike`] vector.
#[derive(Debug)]
pub struct VecMut<'a, V: VecLike + ?Sized>
{
    v: &'a mut V,
}

impl<'a, V: VecLike + ?Sized> VecMut<'a, V>
{
    /// Creates a mutable view referring to `v`.
    pub fn new(v: &'a mut V) -> Self
    {
        VecMut {v}
    }
}

impl<'a, V: VecLike + ?Sized> Deref for VecMut<'a, V>
{
    type Target = V;
    fn deref(&self) -> &Self::Target {self.v}
}

impl<'a, V: VecLike + ?Sized> DerefMut for VecMut<'a, V>
{
    fn deref_mut(&mut self) -> &mut Self::Target {self.v}
}

impl<'a, V: VecLike + ?Sized> Drop for VecMut<'a, V>
{
    fn drop(&mut self) {
        self.v.drop_view();
    }
}

/// Destructures a [`VecLike`] into named immutable sub-views.
///
/// `subv!(v, (a; la), (b; lb))` binds `a` to `v[0..la]` and
/// `b` to `v[la..la+lb]`.
#[macro_export]
macro_rules! subv {
    ($vec:expr, $( ($var:ident; $len:expr) ),+ ) => {
        let (_, _subv_rest) = $vec.split_ref(0);
        $(
            let ($var, _subv_rest) = _subv_rest.split_ref($len);
        )*
        drop(_subv_rest);
    };
}

/// Mutable version of [`subv!`].
#[macro_export]
macro_rules! subv_mut {
    ($vec:expr, $( ($var:ident; $len:expr) ),+ ) => {
        let (_, mut _subv_rest) = $vec.split_mut(0);
        $(
            #[allow(unused_mut)]
            let (mut $var, mut _subv_rest) = _subv_rest.split_mut($len);
        )*
        drop(_subv_rest);
    };
}

//

impl<F: Float> VecLike for [F]
{
    type F = F;

    fn new_ref(s: &[F]) -> VecRef<'_, Self>
    {
        VecRef {v: s}
    }

    fn new_mut(s: &mut[F]) -> VecMut<'_, Self>
    {
        VecMut {v: s}
    }

    fn split_ref(&self, mid: usize) -> (VecRef<'_, Self>, VecRef<'_, Self>)
    {
        let s = self.split_at(mid);
        (VecRef {v: s.0}, VecRef {v: s.1})
    }

    fn split_mut(&mut self, mid: usize) -> (VecMut<'_, Self>, VecMut<'_, Self>)
    {
        let s = self.split_at_mut(mid);
        (VecMut {v: s.0}, VecMut {v: s.1})
    }

    fn drop_view(&self)
    {
    }

    fn len(&self) -> usize
    {
        <[F]>::len(self)
    }

    fn get_ref(&self) -> &[F]
    {
        self
    }

    fn get_mut(&mut self) -> &mut[F]
    {
        self
    }
}
