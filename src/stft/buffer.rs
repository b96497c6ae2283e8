// src/stft/buffer.rs
//! Fixed-capacity sample ring with explicit available/free accounting.

use super::try_vec;
use crate::common::StftError;
use alloc::vec::Vec;

/// Single-owner circular buffer.
///
/// `avail() + free() == capacity()` after every operation. Bulk copies are
/// tiled at the wrap point, so no transfer ever runs past the end of the
/// storage.
#[derive(Clone, Debug)]
pub struct CircularBuffer<T> {
    data: Vec<T>,
    read: usize,
    write: usize,
    avail: usize,
}

impl<T: Copy + Default> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Result<Self, StftError> {
        if capacity == 0 {
            return Err(StftError::InvalidConfig("zero length buffer"));
        }
        let data = try_vec(capacity, T::default())?;
        Ok(Self { data, read: 0, write: 0, avail: 0 })
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Samples ready to read.
    pub fn avail(&self) -> usize {
        self.avail
    }

    /// Room left for writing.
    pub fn free(&self) -> usize {
        self.data.len() - self.avail
    }

    pub fn read_pos(&self) -> usize {
        self.read
    }

    pub fn write_pos(&self) -> usize {
        self.write
    }

    /// Contiguous samples between `pos` and the end of the storage.
    #[inline]
    pub fn samples_without_wrap(&self, pos: usize) -> usize {
        self.data.len() - pos
    }

    /// Folds a position that has run past the end back to the start.
    #[inline]
    pub fn wrap(&self, pos: usize) -> usize {
        if pos >= self.data.len() { pos - self.data.len() } else { pos }
    }

    /// Appends one sample; returns false when the buffer is full.
    pub fn push(&mut self, x: T) -> bool {
        if self.free() == 0 {
            return false;
        }
        self.data[self.write] = x;
        self.write = self.wrap(self.write + 1);
        self.avail += 1;
        true
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.avail == 0 {
            return None;
        }
        let x = self.data[self.read];
        self.read = self.wrap(self.read + 1);
        self.avail -= 1;
        Some(x)
    }

    /// Pops one sample and clears its slot.
    pub fn take(&mut self) -> Option<T> {
        if self.avail == 0 {
            return None;
        }
        let x = core::mem::take(&mut self.data[self.read]);
        self.read = self.wrap(self.read + 1);
        self.avail -= 1;
        Some(x)
    }

    /// Copies as much of `src` as fits and returns the count written.
    pub fn write(&mut self, src: &[T]) -> usize {
        let total = src.len().min(self.free());
        let mut done = 0;
        while done < total {
            let n = self.samples_without_wrap(self.write).min(total - done);
            self.data[self.write..self.write + n].copy_from_slice(&src[done..done + n]);
            self.write = self.wrap(self.write + n);
            done += n;
        }
        self.avail += total;
        total
    }

    /// Copies up to `dst.len()` samples out and returns the count read.
    pub fn read(&mut self, dst: &mut [T]) -> usize {
        self.read_tiles(dst.len(), false, |tile, offset| {
            dst[offset..offset + tile.len()].copy_from_slice(tile)
        })
    }

    /// Like [`read`](Self::read), but clears the consumed slots so they can
    /// be accumulated into again.
    pub fn read_and_zero(&mut self, dst: &mut [T]) -> usize {
        self.read_tiles(dst.len(), true, |tile, offset| {
            dst[offset..offset + tile.len()].copy_from_slice(tile)
        })
    }

    /// Hands up to `n` samples to `f` in contiguous tiles, consuming them.
    /// `f` receives each tile with its offset from the first sample.
    pub fn drain_tiles<F: FnMut(&[T], usize)>(&mut self, n: usize, f: F) -> usize {
        self.read_tiles(n, false, f)
    }

    fn read_tiles<F: FnMut(&[T], usize)>(&mut self, n: usize, zero: bool, mut f: F) -> usize {
        let total = n.min(self.avail);
        let mut done = 0;
        while done < total {
            let n = self.samples_without_wrap(self.read).min(total - done);
            let tile = &mut self.data[self.read..self.read + n];
            f(tile, done);
            if zero {
                tile.fill(T::default());
            }
            self.read = self.wrap(self.read + n);
            done += n;
        }
        self.avail -= total;
        total
    }

    /// Mutable view of `len` slots starting `offset` past the write cursor,
    /// split at the wrap point. The slots are not published until
    /// [`commit`](Self::commit) is called.
    pub fn region_mut(&mut self, offset: usize, len: usize) -> Result<(&mut [T], &mut [T]), StftError> {
        if offset + len > self.free() {
            return Err(StftError::InvalidConfig("region past free space"));
        }
        let start = self.wrap(self.write + offset);
        let first = len.min(self.samples_without_wrap(start));
        let (head, tail) = self.data.split_at_mut(start);
        Ok((&mut tail[..first], &mut head[..len - first]))
    }

    /// Publishes `n` samples written through [`region_mut`](Self::region_mut).
    pub fn commit(&mut self, n: usize) {
        let n = n.min(self.free());
        self.write = self.wrap(self.write + n);
        self.avail += n;
    }

    /// Drops `n` samples from the read side without copying them.
    pub fn consume(&mut self, n: usize) {
        let n = n.min(self.avail);
        self.read = self.wrap(self.read + n);
        self.avail -= n;
    }

    /// Clears the contents and returns both cursors to the start.
    pub fn reset(&mut self) {
        self.data.fill(T::default());
        self.read = 0;
        self.write = 0;
        self.avail = 0;
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
