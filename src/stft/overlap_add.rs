// src/stft/overlap_add.rs

use super::buffer::CircularBuffer;
use crate::common::StftError;
use crate::fixed::FftWord;

/// Accumulates a synthesized frame into the output ring and publishes `hop`
/// finished samples.
///
/// The frame is added, saturating, onto the partial sums that start at the
/// write cursor; the first `hop` of them are then complete. Slots past the
/// cursor must be zero before they first receive a frame, which holds as
/// long as the reader drains with [`CircularBuffer::read_and_zero`] or
/// [`CircularBuffer::take`].
pub fn overlap_add<W: FftWord>(output: &mut CircularBuffer<i32>, frame: &[W], hop: usize) -> Result<(), StftError> {
    if hop > frame.len() {
        return Err(StftError::InvalidConfig("hop longer than frame"));
    }
    let (head, tail) = output.region_mut(0, frame.len())?;
    for (acc, x) in head.iter_mut().chain(tail.iter_mut()).zip(frame.iter()) {
        *acc = acc.saturating_add(x.to_q31().re.to_bits());
    }
    output.commit(hop);
    Ok(())
}
