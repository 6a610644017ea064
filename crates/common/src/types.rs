use glam::IVec2;

/// True if `v` is a positive power of two.
pub fn is_power_of_two(v: i32) -> bool {
    v > 0 && (v & (v - 1)) == 0
}

/// True if both components of `size` are powers of two, which is what the
/// masked wraparound addressing (`coord & (dim - 1)`) needs.
pub fn is_power_of_two_size(size: IVec2) -> bool {
    is_power_of_two(size.x) && is_power_of_two(size.y)
}
