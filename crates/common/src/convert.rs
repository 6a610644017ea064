use glam::{Vec2, Vec3, Vec4};

/// Explicit element cast, the `U(v)` of a numeric conversion.
///
/// Primitive numerics convert with `as` semantics (float to int truncates
/// toward zero and saturates).
pub trait CastFrom<T>: Sized {
    fn cast_from(value: T) -> Self;
}

/// Conversion of a value assumed to lie in `[0, 1]` to a target
/// representation, e.g. a float height to an 8-bit texel.
///
/// Out-of-range input is clamped. Implement this for custom texel types to
/// use them with `Grid::convert_01`.
pub trait Convert01<Src>: Sized {
    fn convert_01(src: Src) -> Self;
}

macro_rules! impl_cast_from {
    ($src:ty => $($dst:ty),*) => {$(
        impl CastFrom<$src> for $dst {
            #[inline]
            fn cast_from(value: $src) -> Self {
                value as $dst
            }
        }
    )*};
}

macro_rules! impl_cast_all {
    ($($src:ty),*) => {$(
        impl_cast_from!($src => f32, f64, i8, i16, i32, i64, u8, u16, u32);
    )*};
}

impl_cast_all!(f32, f64, i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_cast_vec {
    ($($t:ty),*) => {$(
        impl CastFrom<$t> for $t {
            #[inline]
            fn cast_from(value: $t) -> Self {
                value
            }
        }

        impl CastFrom<f32> for $t {
            #[inline]
            fn cast_from(value: f32) -> Self {
                <$t>::splat(value)
            }
        }
    )*};
}

impl_cast_vec!(Vec2, Vec3, Vec4);

#[inline]
fn unit_to_u8(v: f32) -> u8 {
    (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8
}

impl Convert01<f32> for u8 {
    fn convert_01(src: f32) -> Self {
        unit_to_u8(src)
    }
}

impl Convert01<f64> for u8 {
    fn convert_01(src: f64) -> Self {
        (src * 255.0 + 0.5).clamp(0.0, 255.0) as u8
    }
}

impl Convert01<f32> for u16 {
    fn convert_01(src: f32) -> Self {
        (src * 65535.0 + 0.5).clamp(0.0, 65535.0) as u16
    }
}

impl Convert01<f64> for u16 {
    fn convert_01(src: f64) -> Self {
        (src * 65535.0 + 0.5).clamp(0.0, 65535.0) as u16
    }
}

impl Convert01<f32> for f32 {
    fn convert_01(src: f32) -> Self {
        src.clamp(0.0, 1.0)
    }
}

impl Convert01<Vec2> for [u8; 2] {
    fn convert_01(src: Vec2) -> Self {
        src.to_array().map(unit_to_u8)
    }
}

impl Convert01<Vec3> for [u8; 3] {
    fn convert_01(src: Vec3) -> Self {
        src.to_array().map(unit_to_u8)
    }
}

impl Convert01<Vec4> for [u8; 4] {
    fn convert_01(src: Vec4) -> Self {
        src.to_array().map(unit_to_u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cast_truncates_and_saturates() {
        assert_eq!(i32::cast_from(2.9f32), 2);
        assert_eq!(i32::cast_from(-2.9f32), -2);
        assert_eq!(u8::cast_from(300.0f32), 255);
        assert_eq!(u8::cast_from(-5.0f64), 0);
        assert_eq!(f32::cast_from(7i16), 7.0);
    }

    #[test]
    fn vector_cast_from_scalar_splats() {
        assert_eq!(Vec3::cast_from(2.0f32), Vec3::splat(2.0));
    }

    #[test]
    fn unit_range_to_bytes() {
        assert_eq!(u8::convert_01(0.0f32), 0);
        assert_eq!(u8::convert_01(1.0f32), 255);
        assert_eq!(u8::convert_01(0.5f32), 128);
        assert_eq!(u8::convert_01(-1.0f32), 0);
        assert_eq!(u8::convert_01(2.0f64), 255);
        assert_eq!(u16::convert_01(1.0f32), 65535);
    }

    #[test]
    fn vector_to_texel() {
        let texel = <[u8; 3]>::convert_01(Vec3::new(0.0, 1.0, 0.5));
        assert_eq!(texel, [0, 255, 128]);
    }
}
