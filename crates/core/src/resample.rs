//! Resolution changes and tiled composition.
//!
//! Interpolation kernels all go through [`Element::weighted_sum`], so integer
//! grids round the same way for every operator.

use glam::IVec2;
use seagrid_common::{Element, is_power_of_two_size};

use crate::error::GridError;
use crate::grid::Grid;

/// Weights of the 4-tap smoothing kernel along one axis.
const SMOOTH_TAPS: [f32; 4] = [-1.0 / 16.0, 9.0 / 16.0, 9.0 / 16.0, -1.0 / 16.0];

#[inline]
fn mean2<T: Element>(a: T, b: T) -> T {
    T::weighted_sum([a, b], [0.5, 0.5])
}

#[inline]
fn smooth<T: Element>(taps: [T; 4]) -> T {
    T::weighted_sum(taps, SMOOTH_TAPS)
}

/// Size of a doubled grid: `2n` samples with wrap, `2n - 1` without.
fn doubled_size(size: IVec2, wrap: bool) -> IVec2 {
    if wrap { size * 2 } else { size * 2 - IVec2::ONE }
}

/// Flat storage plus width, for the interior loops of the resamplers.
struct Canvas<T> {
    width: i32,
    cells: Vec<T>,
}

impl<T: Element> Canvas<T> {
    fn new(size: IVec2) -> Self {
        Self {
            width: size.x,
            cells: vec![T::default(); size.x as usize * size.y as usize],
        }
    }

    #[inline]
    fn get(&self, x: i32, y: i32) -> T {
        self.cells[(x + y * self.width) as usize]
    }

    #[inline]
    fn set(&mut self, x: i32, y: i32, v: T) {
        self.cells[(x + y * self.width) as usize] = v;
    }
}

impl<T: Element> Grid<T> {
    #[inline]
    fn sample(&self, x: i32, y: i32) -> T {
        self[IVec2::new(x, y)]
    }

    /// Double the resolution with linear interpolation.
    ///
    /// Each source sample is kept at `(2x, 2y)`; the samples in between are
    /// means of their neighbors. Without `wrap`, `n` samples give `2n - 1`;
    /// with `wrap` the last column and row interpolate against column and
    /// row 0, giving `2n`.
    pub fn upsampled(&self, wrap: bool) -> Result<Self, GridError> {
        let (w, h) = (self.width(), self.height());
        if w < 1 || h < 1 {
            return Err(GridError::invalid("Grid::upsampled: base size invalid"));
        }
        let size = doubled_size(self.size(), wrap);
        let mut out = Canvas::new(size);

        // even rows: copy kept samples, interpolate between them
        for y in 0..h {
            for x in 0..w - 1 {
                out.set(2 * x, 2 * y, self.sample(x, y));
                out.set(2 * x + 1, 2 * y, mean2(self.sample(x, y), self.sample(x + 1, y)));
            }
            out.set(2 * w - 2, 2 * y, self.sample(w - 1, y));
            if wrap {
                out.set(2 * w - 1, 2 * y, mean2(self.sample(w - 1, y), self.sample(0, y)));
            }
        }

        // odd rows read the finished even rows above and below
        for y in 0..h - 1 {
            for x in 0..size.x {
                let v = mean2(out.get(x, 2 * y), out.get(x, 2 * y + 2));
                out.set(x, 2 * y + 1, v);
            }
        }
        if wrap {
            for x in 0..size.x {
                let v = mean2(out.get(x, size.y - 2), out.get(x, 0));
                out.set(x, size.y - 1, v);
            }
        }

        tracing::trace!(from = %self.size(), to = %size, wrap, "upsampled");
        Ok(Self::from_parts(size, out.cells))
    }

    /// Halve the resolution by averaging 2x2 blocks.
    ///
    /// With odd dimensions and `force_even_size == false`, the trailing
    /// column is averaged in vertical pairs, the trailing row in horizontal
    /// pairs, and the final corner sample is copied as is. With
    /// `force_even_size` the trailing column and row are dropped.
    pub fn downsampled(&self, force_even_size: bool) -> Self {
        let (w, h) = (self.width(), self.height());
        let half = IVec2::new(w >> 1, h >> 1);
        let size = if force_even_size {
            half
        } else {
            half + IVec2::new(w & 1, h & 1)
        };
        let mut out = Canvas::new(size);

        for y in 0..half.y {
            for x in 0..half.x {
                let block = [
                    self.sample(2 * x, 2 * y),
                    self.sample(2 * x + 1, 2 * y),
                    self.sample(2 * x, 2 * y + 1),
                    self.sample(2 * x + 1, 2 * y + 1),
                ];
                out.set(x, y, T::weighted_sum(block, [0.25; 4]));
            }
        }

        if !force_even_size {
            if w & 1 == 1 {
                for y in 0..half.y {
                    out.set(half.x, y, mean2(self.sample(w - 1, 2 * y), self.sample(w - 1, 2 * y + 1)));
                }
            }
            if h & 1 == 1 {
                for x in 0..half.x {
                    out.set(x, half.y, mean2(self.sample(2 * x, h - 1), self.sample(2 * x + 1, h - 1)));
                }
            }
            if (w & h) & 1 == 1 {
                out.set(half.x, half.y, self.sample(w - 1, h - 1));
            }
        }

        tracing::trace!(from = %self.size(), to = %size, force_even_size, "downsampled");
        Self::from_parts(size, out.cells)
    }

    /// Double the resolution with the separable 4-tap kernel
    /// `{-1/16, 9/16, 9/16, -1/16}`.
    ///
    /// Needs at least 3 samples per axis. Without `wrap` the missing tap at
    /// an edge repeats the edge sample; with `wrap` taps are taken modulo the
    /// dimension. Result sizes follow [`Grid::upsampled`].
    pub fn smooth_upsampled(&self, wrap: bool) -> Result<Self, GridError> {
        let (w, h) = (self.width(), self.height());
        if w < 3 || h < 3 {
            return Err(GridError::invalid(
                "Grid::smooth_upsampled: base size invalid",
            ));
        }
        let size = doubled_size(self.size(), wrap);
        let mut out = Canvas::new(size);
        let s = |x: i32, y: i32| self.sample(x, y);

        // horizontal pass on even rows
        for y in 0..h {
            let ry = 2 * y;
            out.set(0, ry, s(0, y));
            for x in 1..w - 2 {
                out.set(2 * x, ry, s(x, y));
                out.set(2 * x + 1, ry, smooth([s(x - 1, y), s(x, y), s(x + 1, y), s(x + 2, y)]));
            }
            out.set(2 * w - 4, ry, s(w - 2, y));
            out.set(2 * w - 2, ry, s(w - 1, y));

            let last = smooth([s(w - 3, y), s(w - 2, y), s(w - 1, y), s(if wrap { 0 } else { w - 1 }, y)]);
            out.set(2 * w - 3, ry, last);
            if wrap {
                out.set(1, ry, smooth([s(w - 1, y), s(0, y), s(1, y), s(2, y)]));
                out.set(2 * w - 1, ry, smooth([s(w - 2, y), s(w - 1, y), s(0, y), s(1, y)]));
            } else {
                out.set(1, ry, smooth([s(0, y), s(0, y), s(1, y), s(2, y)]));
            }
        }

        // vertical pass reads the completed even rows
        let col = |out: &Canvas<T>, x: i32, rows: [i32; 4]| smooth(rows.map(|r| out.get(x, r)));
        for y in 1..h - 2 {
            for x in 0..size.x {
                let v = col(&out, x, [2 * y - 2, 2 * y, 2 * y + 2, 2 * y + 4]);
                out.set(x, 2 * y + 1, v);
            }
        }
        let (last, before, third) = (2 * h - 2, 2 * h - 4, 2 * h - 6);
        for x in 0..size.x {
            if wrap {
                let first = col(&out, x, [last, 0, 2, 4]);
                let penultimate = col(&out, x, [third, before, last, 0]);
                let trailing = col(&out, x, [before, last, 0, 2]);
                out.set(x, 1, first);
                out.set(x, 2 * h - 3, penultimate);
                out.set(x, 2 * h - 1, trailing);
            } else {
                let first = col(&out, x, [0, 0, 2, 4]);
                let penultimate = col(&out, x, [third, before, last, last]);
                out.set(x, 1, first);
                out.set(x, 2 * h - 3, penultimate);
            }
        }

        tracing::trace!(from = %self.size(), to = %size, wrap, "smooth upsampled");
        Ok(Self::from_parts(size, out.cells))
    }

    /// Add `other * scalar`, tiled across `self` with wraparound.
    ///
    /// `other` must have power-of-two dimensions.
    pub fn add_tiled(&mut self, other: &Self, scalar: T) -> &mut Self {
        self.add_wrapped(other, IVec2::ZERO, Some(scalar))
    }

    /// Add a copy of `other` moved by `offset`, tiled with wraparound:
    /// `self[x, y] += other[(x + ox) & (ow - 1), (y + oy) & (oh - 1)]`.
    ///
    /// `other` must have power-of-two dimensions.
    pub fn add_shifted(&mut self, other: &Self, offset: IVec2) -> &mut Self {
        self.add_wrapped(other, offset, None)
    }

    fn add_wrapped(&mut self, other: &Self, offset: IVec2, scalar: Option<T>) -> &mut Self {
        debug_assert!(
            is_power_of_two_size(other.size()),
            "tiled source needs power-of-two dimensions, got {}",
            other.size()
        );
        let mask = other.size() - IVec2::ONE;
        self.for_each_xy_mut(|value, xy, _| {
            let v = other[(xy + offset) & mask];
            let add = match scalar {
                Some(s) => v.saturating_mul(s),
                None => v,
            };
            *value = value.saturating_add(add);
        });
        self
    }
}
