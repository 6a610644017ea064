use std::fmt::Debug;
use std::ops::{Add, AddAssign, Mul, MulAssign};

use glam::{Vec2, Vec3, Vec4};

/// Numeric capabilities a grid element must provide.
///
/// Scalars and small fixed-size vectors qualify. For vector types `min_elem`
/// and `max_elem` work per component, so `get_min` on a grid of `Vec3` yields
/// the component-wise minimum.
pub trait Element:
    Copy + Default + Debug + Add<Output = Self> + AddAssign + Mul<Output = Self> + MulAssign
{
    /// Absolute value (per component for vectors).
    fn abs(self) -> Self;

    /// Smaller of `self` and `other`.
    fn min_elem(self, other: Self) -> Self;

    /// Larger of `self` and `other`.
    fn max_elem(self, other: Self) -> Self;

    /// `self + other`, clamped to the type bounds for integers.
    fn saturating_add(self, other: Self) -> Self;

    /// `self * other`, clamped to the type bounds for integers.
    fn saturating_mul(self, other: Self) -> Self;

    /// `sum(samples[i] * weights[i])`.
    ///
    /// Integer types accumulate in `f64` and truncate toward zero once at the
    /// end, saturating at the type bounds.
    fn weighted_sum<const N: usize>(samples: [Self; N], weights: [f32; N]) -> Self;
}

macro_rules! impl_element_float {
    ($($t:ty),*) => {$(
        impl Element for $t {
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn min_elem(self, other: Self) -> Self {
                if other < self { other } else { self }
            }

            #[inline]
            fn max_elem(self, other: Self) -> Self {
                if self < other { other } else { self }
            }

            #[inline]
            fn saturating_add(self, other: Self) -> Self {
                self + other
            }

            #[inline]
            fn saturating_mul(self, other: Self) -> Self {
                self * other
            }

            #[inline]
            fn weighted_sum<const N: usize>(samples: [Self; N], weights: [f32; N]) -> Self {
                let mut sum: $t = 0.0;
                for (s, w) in samples.into_iter().zip(weights) {
                    sum += s * <$t>::from(w);
                }
                sum
            }
        }
    )*};
}

macro_rules! impl_element_int {
    ($abs:ident => $($t:ty),*) => {$(
        impl Element for $t {
            #[inline]
            fn abs(self) -> Self {
                impl_element_int!(@abs $abs self)
            }

            #[inline]
            fn min_elem(self, other: Self) -> Self {
                Ord::min(self, other)
            }

            #[inline]
            fn max_elem(self, other: Self) -> Self {
                Ord::max(self, other)
            }

            #[inline]
            fn saturating_add(self, other: Self) -> Self {
                <$t>::saturating_add(self, other)
            }

            #[inline]
            fn saturating_mul(self, other: Self) -> Self {
                <$t>::saturating_mul(self, other)
            }

            #[inline]
            fn weighted_sum<const N: usize>(samples: [Self; N], weights: [f32; N]) -> Self {
                let mut sum = 0.0f64;
                for (s, w) in samples.into_iter().zip(weights) {
                    sum += s as f64 * f64::from(w);
                }
                sum as $t
            }
        }
    )*};
    (@abs signed $v:ident) => { $v.saturating_abs() };
    (@abs unsigned $v:ident) => { $v };
}

macro_rules! impl_element_vec {
    ($($t:ty),*) => {$(
        impl Element for $t {
            #[inline]
            fn abs(self) -> Self {
                <$t>::abs(self)
            }

            #[inline]
            fn min_elem(self, other: Self) -> Self {
                <$t>::min(self, other)
            }

            #[inline]
            fn max_elem(self, other: Self) -> Self {
                <$t>::max(self, other)
            }

            #[inline]
            fn saturating_add(self, other: Self) -> Self {
                self + other
            }

            #[inline]
            fn saturating_mul(self, other: Self) -> Self {
                self * other
            }

            #[inline]
            fn weighted_sum<const N: usize>(samples: [Self; N], weights: [f32; N]) -> Self {
                let mut sum = <$t>::ZERO;
                for (s, w) in samples.into_iter().zip(weights) {
                    sum += s * w;
                }
                sum
            }
        }
    )*};
}

impl_element_float!(f32, f64);
impl_element_int!(signed => i8, i16, i32, i64);
impl_element_int!(unsigned => u8, u16, u32);
impl_element_vec!(Vec2, Vec3, Vec4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_weighted_sum() {
        let v = f32::weighted_sum([2.0, 4.0], [0.5, 0.5]);
        assert_eq!(v, 3.0);
    }

    #[test]
    fn int_weighted_sum_truncates_once() {
        // 0.5*3 + 0.5*4 = 3.5, truncated to 3 (per-term truncation would give 1 + 2).
        assert_eq!(i32::weighted_sum([3, 4], [0.5, 0.5]), 3);
        assert_eq!(i32::weighted_sum([-3, -4], [0.5, 0.5]), -3);
    }

    #[test]
    fn int_weighted_sum_saturates() {
        assert_eq!(u8::weighted_sum([200, 200], [1.0, 1.0]), 255);
        assert_eq!(u8::weighted_sum([10], [-1.0]), 0);
    }

    #[test]
    fn signed_abs_saturates() {
        assert_eq!(Element::abs(i32::MIN), i32::MAX);
        assert_eq!(Element::abs(-7i16), 7);
        assert_eq!(Element::abs(7u8), 7);
    }

    #[test]
    fn int_arithmetic_saturates() {
        assert_eq!(Element::saturating_add(200u8, 100), 255);
        assert_eq!(Element::saturating_mul(20u8, 20), 255);
        assert_eq!(Element::saturating_add(-100i8, -100), -128);
        assert_eq!(Element::saturating_mul(3i32, -4), -12);
    }

    #[test]
    fn float_arithmetic_is_plain() {
        assert_eq!(Element::saturating_add(1.5f32, 2.0), 3.5);
        assert_eq!(Element::saturating_mul(f64::MAX, 2.0), f64::INFINITY);
        assert_eq!(
            Element::saturating_mul(Vec2::new(1.0, 2.0), Vec2::splat(3.0)),
            Vec2::new(3.0, 6.0)
        );
    }

    #[test]
    fn vector_min_max_per_component() {
        let a = Vec3::new(1.0, 5.0, -2.0);
        let b = Vec3::new(3.0, 0.0, -4.0);
        assert_eq!(a.min_elem(b), Vec3::new(1.0, 0.0, -4.0));
        assert_eq!(a.max_elem(b), Vec3::new(3.0, 5.0, -2.0));
        assert_eq!(Element::abs(b), Vec3::new(3.0, 0.0, 4.0));
    }

    #[test]
    fn vector_weighted_sum() {
        let v = Vec2::weighted_sum([Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0)], [0.5, 0.5]);
        assert_eq!(v, Vec2::new(2.0, 3.0));
    }
}
