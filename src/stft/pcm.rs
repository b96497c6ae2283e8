// src/stft/pcm.rs
//! PCM sample containers and interleaved circular source/sink views.

use crate::fixed::math::{sat_i16, sat_i32};
use core::fmt::Debug;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum SampleFormat {
    S16,
    S24,
    S32,
}

/// A PCM container the stream processors can consume and produce.
///
/// Every container maps onto Q1.31 internally: S16 and S24 samples are
/// left-aligned, S32 is used as is.
pub trait Sample: Copy + Default + PartialEq + Debug {
    const FORMAT: SampleFormat;

    fn to_q31(self) -> i32;

    /// Rounds and saturates a Q1.31 value into the container.
    fn from_q31(x: i32) -> Self;

    /// Raw 16-bit word in the low bits, sign-extended. Used for data
    /// streams such as cepstral blocks that are not audio.
    fn from_word(w: i16) -> Self;

    fn to_q15(self) -> i16 {
        sat_i16(sat_i32(((self.to_q31() as i64 >> 15) + 1) >> 1))
    }
}

impl Sample for i16 {
    const FORMAT: SampleFormat = SampleFormat::S16;

    #[inline]
    fn to_q31(self) -> i32 {
        (self as i32) << 16
    }

    #[inline]
    fn from_q31(x: i32) -> Self {
        sat_i16(sat_i32(((x as i64 >> 15) + 1) >> 1))
    }

    #[inline]
    fn from_word(w: i16) -> Self {
        w
    }

    #[inline]
    fn to_q15(self) -> i16 {
        self
    }
}

/// 24-bit sample in the low bits of a 32-bit container.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct S24(pub i32);

impl S24 {
    pub const MAX: i32 = (1 << 23) - 1;
    pub const MIN: i32 = -(1 << 23);
}

impl Sample for S24 {
    const FORMAT: SampleFormat = SampleFormat::S24;

    #[inline]
    fn to_q31(self) -> i32 {
        self.0 << 8
    }

    #[inline]
    fn from_q31(x: i32) -> Self {
        let y = ((x as i64 >> 7) + 1) >> 1;
        S24(y.clamp(S24::MIN as i64, S24::MAX as i64) as i32)
    }

    #[inline]
    fn from_word(w: i16) -> Self {
        S24(w as i32)
    }
}

impl Sample for i32 {
    const FORMAT: SampleFormat = SampleFormat::S32;

    #[inline]
    fn to_q31(self) -> i32 {
        self
    }

    #[inline]
    fn from_q31(x: i32) -> Self {
        x
    }

    #[inline]
    fn from_word(w: i16) -> Self {
        w as i32
    }
}

/// Read side of an interleaved circular PCM buffer owned by the host.
///
/// `pos` is the read position in samples and `avail` the number of samples
/// that may be read, possibly wrapping back to index 0.
pub struct SourceView<'a, T> {
    buf: &'a [T],
    pos: usize,
    avail: usize,
    consumed: usize,
}

impl<'a, T: Copy> SourceView<'a, T> {
    pub fn new(buf: &'a [T], pos: usize, avail: usize) -> Self {
        let avail = avail.min(buf.len());
        let pos = if buf.is_empty() { 0 } else { pos % buf.len() };
        Self { buf, pos, avail, consumed: 0 }
    }

    /// Whole slice readable from the start.
    pub fn linear(buf: &'a [T]) -> Self {
        Self::new(buf, 0, buf.len())
    }

    pub fn avail(&self) -> usize {
        self.avail
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Samples read so far through this view.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Reads up to `frames` whole frames of `channels` samples, calling
    /// `f(channel, sample)` for each sample in order. Returns frames read.
    pub fn read_frames<F: FnMut(usize, T)>(&mut self, frames: usize, channels: usize, mut f: F) -> usize {
        if channels == 0 {
            return 0;
        }
        let frames = frames.min(self.avail / channels);
        let mut remaining = frames * channels;
        let mut ch = 0;
        while remaining > 0 {
            let n = (self.buf.len() - self.pos).min(remaining);
            for &x in &self.buf[self.pos..self.pos + n] {
                f(ch, x);
                ch += 1;
                if ch == channels {
                    ch = 0;
                }
            }
            self.pos += n;
            if self.pos >= self.buf.len() {
                self.pos -= self.buf.len();
            }
            remaining -= n;
        }
        self.avail -= frames * channels;
        self.consumed += frames * channels;
        frames
    }
}

/// Write side of an interleaved circular PCM buffer owned by the host.
pub struct SinkView<'a, T> {
    buf: &'a mut [T],
    pos: usize,
    free: usize,
    produced: usize,
}

impl<'a, T: Copy + Default> SinkView<'a, T> {
    pub fn new(buf: &'a mut [T], pos: usize, free: usize) -> Self {
        let free = free.min(buf.len());
        let pos = if buf.is_empty() { 0 } else { pos % buf.len() };
        Self { buf, pos, free, produced: 0 }
    }

    pub fn linear(buf: &'a mut [T]) -> Self {
        let free = buf.len();
        Self::new(buf, 0, free)
    }

    pub fn free(&self) -> usize {
        self.free
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Samples written so far through this view.
    pub fn produced(&self) -> usize {
        self.produced
    }

    /// Writes up to `n` samples produced by `f`, returns the count written.
    pub fn write_with<F: FnMut() -> T>(&mut self, n: usize, mut f: F) -> usize {
        let total = n.min(self.free);
        let mut remaining = total;
        while remaining > 0 {
            let len = (self.buf.len() - self.pos).min(remaining);
            for x in &mut self.buf[self.pos..self.pos + len] {
                *x = f();
            }
            self.pos += len;
            if self.pos >= self.buf.len() {
                self.pos -= self.buf.len();
            }
            remaining -= len;
        }
        self.free -= total;
        self.produced += total;
        total
    }

    /// Writes up to `frames` interleaved frames, `f(channel)` giving each
    /// sample. Returns frames written.
    pub fn write_frames<F: FnMut(usize) -> T>(&mut self, frames: usize, channels: usize, mut f: F) -> usize {
        if channels == 0 {
            return 0;
        }
        let frames = frames.min(self.free / channels);
        let mut ch = 0;
        self.write_with(frames * channels, || {
            let x = f(ch);
            ch = if ch + 1 == channels { 0 } else { ch + 1 };
            x
        });
        frames
    }

    pub fn write_slice(&mut self, src: &[T]) -> usize {
        let mut it = src.iter().copied();
        self.write_with(src.len(), || it.next().unwrap_or_default())
    }

    pub fn zero_fill(&mut self, n: usize) -> usize {
        self.write_with(n, T::default)
    }
}
