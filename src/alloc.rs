//! Allocator hooks.
//!
//! Segment storage lives in the rope's arena. The allocator decides whether
//! each segment may be brought into use, and it is told when one is released.
//! A hook that refuses makes the whole operation fail before anything
//! changes.
//!
//! Sizes are segment footprints (see [`footprint`]). The head segment is
//! charged when a rope is built with [`Rope::with_allocator`]. It is resized
//! through `realloc` as it grows taller.
//!
//! [`Rope::with_allocator`]: crate::Rope::with_allocator

use std::fmt;

use smallvec::SmallVec;

use crate::segment::footprint;

/// Returned by a hook that refuses a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "allocation refused")
    }
}

impl std::error::Error for AllocError {}

/// Allocation strategy used by a [`Rope`](crate::Rope).
pub trait Allocator {
    /// A segment of `bytes` is about to be created.
    fn alloc(&mut self, bytes: usize) -> Result<(), AllocError>;

    /// The head segment is growing from `old_bytes` to `new_bytes`.
    fn realloc(&mut self, old_bytes: usize, new_bytes: usize) -> Result<(), AllocError>;

    /// A segment of `bytes` has been released.
    fn free(&mut self, bytes: usize);
}

/// The process allocator. Never refuses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Global;

impl Allocator for Global {
    #[inline]
    fn alloc(&mut self, _bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    #[inline]
    fn realloc(&mut self, _old_bytes: usize, _new_bytes: usize) -> Result<(), AllocError> {
        Ok(())
    }

    #[inline]
    fn free(&mut self, _bytes: usize) {}
}

/// Allocator built from three plain functions.
///
/// `alloc` and `realloc` return `false` to refuse.
#[derive(Clone, Copy)]
pub struct Hooks {
    alloc: fn(usize) -> bool,
    realloc: fn(usize, usize) -> bool,
    free: fn(usize),
}

impl Hooks {
    pub fn new(
        alloc: fn(usize) -> bool,
        realloc: fn(usize, usize) -> bool,
        free: fn(usize),
    ) -> Hooks {
        Hooks { alloc, realloc, free }
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").finish_non_exhaustive()
    }
}

impl Allocator for Hooks {
    fn alloc(&mut self, bytes: usize) -> Result<(), AllocError> {
        if (self.alloc)(bytes) {
            Ok(())
        } else {
            Err(AllocError)
        }
    }

    fn realloc(&mut self, old_bytes: usize, new_bytes: usize) -> Result<(), AllocError> {
        if (self.realloc)(old_bytes, new_bytes) {
            Ok(())
        } else {
            Err(AllocError)
        }
    }

    fn free(&mut self, bytes: usize) {
        (self.free)(bytes)
    }
}

impl<T: Allocator + ?Sized> Allocator for &mut T {
    fn alloc(&mut self, bytes: usize) -> Result<(), AllocError> {
        (**self).alloc(bytes)
    }

    fn realloc(&mut self, old_bytes: usize, new_bytes: usize) -> Result<(), AllocError> {
        (**self).realloc(old_bytes, new_bytes)
    }

    fn free(&mut self, bytes: usize) {
        (**self).free(bytes)
    }
}

/// Reservations granted for the segments one edit is about to create.
///
/// Dropped without [`commit`](Reservation::commit), it hands every grant back
/// to the allocator.
pub(crate) struct Reservation<'a, A: Allocator> {
    alloc: &'a mut A,
    heights: SmallVec<[u8; 4]>,
    committed: bool,
}

impl<'a, A: Allocator> Reservation<'a, A> {
    pub(crate) fn new(alloc: &'a mut A) -> Self {
        Reservation {
            alloc,
            heights: SmallVec::new(),
            committed: false,
        }
    }

    /// Charge one segment of the given height.
    pub(crate) fn reserve(&mut self, height: u8) -> Result<(), AllocError> {
        self.alloc.alloc(footprint(height))?;
        self.heights.push(height);
        Ok(())
    }

    /// Grow the head from `old` to `new` levels. Must be the last request.
    pub(crate) fn grow_head(&mut self, old: u8, new: u8) -> Result<(), AllocError> {
        self.alloc.realloc(footprint(old), footprint(new))
    }

    /// Keep every grant. Returns the charged heights in reservation order.
    pub(crate) fn commit(mut self) -> SmallVec<[u8; 4]> {
        self.committed = true;
        std::mem::take(&mut self.heights)
    }
}

impl<A: Allocator> Drop for Reservation<'_, A> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        for &height in &self.heights {
            self.alloc.free(footprint(height));
        }
    }
}
