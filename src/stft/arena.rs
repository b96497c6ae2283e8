// src/stft/arena.rs
//! Per-stream scratch storage handed out as typed views for one hop.

use super::config::Q7;
use super::try_vec;
use crate::common::StftError;
use crate::fixed::{FftWord, PolarFixed};
use alloc::vec::Vec;

/// Lengths of the scratch vectors; zero for stages a stream does not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ArenaLayout {
    pub fft_size: usize,
    pub polar: usize,
    pub power: usize,
    pub mel: usize,
    pub ceps: usize,
}

/// Scratch shared by every channel of a stream. Channels are processed one
/// after another, so each hop borrows the whole arena.
#[derive(Debug)]
pub struct ScratchArena<W> {
    fft_in: Vec<W>,
    fft_out: Vec<W>,
    polar: Vec<PolarFixed>,
    power: Vec<u64>,
    mel: Vec<Q7>,
    ceps: Vec<Q7>,
}

/// Disjoint views into a [`ScratchArena`], valid for one hop.
pub struct HopScratch<'a, W> {
    pub fft_in: &'a mut [W],
    pub fft_out: &'a mut [W],
    pub polar: &'a mut [PolarFixed],
    /// Power spectrum, Q2.62.
    pub power: &'a mut [u64],
    pub mel: &'a mut [Q7],
    pub ceps: &'a mut [Q7],
}

impl<W: FftWord> ScratchArena<W> {
    pub fn new(layout: ArenaLayout) -> Result<Self, StftError> {
        Ok(Self {
            fft_in: try_vec(layout.fft_size, W::default())?,
            fft_out: try_vec(layout.fft_size, W::default())?,
            polar: try_vec(layout.polar, PolarFixed::ZERO)?,
            power: try_vec(layout.power, 0)?,
            mel: try_vec(layout.mel, Q7::ZERO)?,
            ceps: try_vec(layout.ceps, Q7::ZERO)?,
        })
    }

    pub fn layout(&self) -> ArenaLayout {
        ArenaLayout {
            fft_size: self.fft_in.len(),
            polar: self.polar.len(),
            power: self.power.len(),
            mel: self.mel.len(),
            ceps: self.ceps.len(),
        }
    }

    /// Views for one hop; the transform buffers are cleared first since the
    /// previous hop used them as scratch.
    pub fn hop(&mut self) -> HopScratch<'_, W> {
        self.fft_in.fill(W::default());
        self.fft_out.fill(W::default());
        HopScratch {
            fft_in: &mut self.fft_in,
            fft_out: &mut self.fft_out,
            polar: &mut self.polar,
            power: &mut self.power,
            mel: &mut self.mel,
            ceps: &mut self.ceps,
        }
    }

    /// Last cepstral vector written through [`hop`](Self::hop).
    pub fn ceps(&self) -> &[Q7] {
        &self.ceps
    }

    pub fn clear(&mut self) {
        self.fft_in.fill(W::default());
        self.fft_out.fill(W::default());
        self.polar.fill(PolarFixed::ZERO);
        self.power.fill(0);
        self.mel.fill(Q7::ZERO);
        self.ceps.fill(Q7::ZERO);
    }
}
