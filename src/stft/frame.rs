// src/stft/frame.rs
//! Hop-synchronous frame assembly, block normalization and windowing.

use super::buffer::CircularBuffer;
use crate::fixed::FftWord;
use crate::fixed::math::norm_i32;

/// Largest normalization boost, about 60 dB.
pub const NORMALIZE_MAX_SHIFT: i32 = 10;

/// Builds one frame from the carried tail plus `hop` fresh samples.
///
/// `frame` receives `prev.len() + hop` words: the tail first, then the new
/// samples read from `input` across its wrap point. On return `prev` holds
/// the last `prev.len()` samples of the frame, ready for the next hop. The
/// caller guarantees `input.avail() >= hop`.
pub fn fill_frame<T, W, F>(input: &mut CircularBuffer<T>, prev: &mut [T], frame: &mut [W], hop: usize, to_word: F)
where
    T: Copy + Default,
    F: Fn(T) -> W,
{
    let p = prev.len();
    for (dst, &x) in frame.iter_mut().zip(prev.iter()) {
        *dst = to_word(x);
    }

    // keep the part of the old tail that stays inside the next frame
    let keep = p.saturating_sub(hop);
    prev.copy_within(p - keep..p, 0);

    input.drain_tiles(hop, |tile, offset| {
        for (i, &x) in tile.iter().enumerate() {
            let k = offset + i;
            frame[p + k] = to_word(x);
            if k + p >= hop {
                prev[k + p - hop] = x;
            }
        }
    });
}

/// Moves the first `prev.len()` samples of a freshly filled input into the
/// tail buffer. Returns false if not enough samples are buffered.
pub fn fill_prev_samples<T: Copy + Default>(input: &mut CircularBuffer<T>, prev: &mut [T]) -> bool {
    if input.avail() < prev.len() {
        return false;
    }
    input.read(prev);
    true
}

/// Left shift that brings the frame peak close to full scale, read from
/// the Q1.15 view of the real parts: `clamp(norm(peak << 15) − 1, 0, 10)`.
pub fn normalize_shift<W: FftWord>(frame: &[W]) -> i32 {
    let peak = frame
        .iter()
        .map(|x| (x.to_q31().re.to_bits() >> 16).unsigned_abs())
        .max()
        .unwrap_or(0);
    (norm_i32((peak << 15) as i32) - 1).clamp(0, NORMALIZE_MAX_SHIFT)
}

/// Multiplies the real parts by a Q1.15 window with an extra left shift.
pub fn apply_window<W: FftWord>(frame: &mut [W], window: &[i16], shift: i32) {
    for (x, &w) in frame.iter_mut().zip(window.iter()) {
        *x = x.window(w, shift);
    }
}
