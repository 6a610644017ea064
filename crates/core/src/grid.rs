use std::ops::{AddAssign, Index, IndexMut, MulAssign};

use glam::IVec2;
use seagrid_common::{CastFrom, Convert01, Element, is_power_of_two_size};
use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Element count for `size`, or an error if a dimension is negative.
fn element_count(size: IVec2, context: &str) -> Result<usize, GridError> {
    if size.x < 0 || size.y < 0 {
        return Err(GridError::invalid(format!(
            "{context}: size {}x{} must not be negative",
            size.x, size.y
        )));
    }
    Ok(size.x as usize * size.y as usize)
}

/// A dense, row-major 2D array of samples.
///
/// Element `(x, y)` lives at flat index `x + y * width`. The grid owns its
/// storage exclusively; operations that combine grids only borrow the other
/// operand.
///
/// Two access paths exist: [`Grid::at`] and friends check bounds and return
/// [`GridError::OutOfRange`], while `grid[pos]` is for loops whose indices are
/// derived from the grid's own size. Indexing out of bounds is a caller bug;
/// it is caught by a debug assertion and otherwise by the slice bounds check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "RawGrid<T>",
    bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>")
)]
pub struct Grid<T> {
    size: IVec2,
    elements: Vec<T>,
}

/// Unvalidated wire form of a grid.
#[derive(Deserialize)]
struct RawGrid<T> {
    size: IVec2,
    elements: Vec<T>,
}

impl<T> TryFrom<RawGrid<T>> for Grid<T> {
    type Error = GridError;

    fn try_from(raw: RawGrid<T>) -> Result<Self, Self::Error> {
        Self::from_vec(raw.size, raw.elements)
    }
}

impl<T> Default for Grid<T> {
    fn default() -> Self {
        Self {
            size: IVec2::ZERO,
            elements: Vec::new(),
        }
    }
}

impl<T> Grid<T> {
    /// Adopt a flat row-major vector as a grid of `size`.
    pub fn from_vec(size: IVec2, elements: Vec<T>) -> Result<Self, GridError> {
        let count = element_count(size, "Grid::from_vec")?;
        if elements.len() != count {
            return Err(GridError::invalid(format!(
                "Grid::from_vec: {} elements do not fill {}x{}",
                elements.len(),
                size.x,
                size.y
            )));
        }
        Ok(Self { size, elements })
    }

    /// Assemble a grid whose storage was sized by the caller.
    pub(crate) fn from_parts(size: IVec2, elements: Vec<T>) -> Self {
        debug_assert_eq!(elements.len(), size.x as usize * size.y as usize);
        Self { size, elements }
    }

    /// Build a grid by evaluating `f` at every position, row by row.
    pub fn from_fn(size: IVec2, mut f: impl FnMut(IVec2) -> T) -> Result<Self, GridError> {
        let count = element_count(size, "Grid::from_fn")?;
        let mut elements = Vec::with_capacity(count);
        for y in 0..size.y {
            for x in 0..size.x {
                elements.push(f(IVec2::new(x, y)));
            }
        }
        Ok(Self { size, elements })
    }

    /// Width and height.
    pub fn size(&self) -> IVec2 {
        self.size
    }

    pub fn width(&self) -> i32 {
        self.size.x
    }

    pub fn height(&self) -> i32 {
        self.size.y
    }

    /// Number of elements (`width * height`).
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// True if `pos` addresses a cell of this grid.
    pub fn contains(&self, pos: IVec2) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.size.x && pos.y < self.size.y
    }

    #[inline]
    fn flat_index(&self, pos: IVec2) -> usize {
        debug_assert!(self.contains(pos), "grid index {pos} outside {}", self.size);
        pos.x as usize + pos.y as usize * self.size.x as usize
    }

    fn check(&self, pos: IVec2) -> Result<usize, GridError> {
        if self.contains(pos) {
            Ok(self.flat_index(pos))
        } else {
            Err(GridError::OutOfRange {
                x: pos.x,
                y: pos.y,
                width: self.size.x,
                height: self.size.y,
            })
        }
    }

    /// Bounds-checked access. Negative coordinates are rejected as well.
    pub fn at(&self, pos: IVec2) -> Result<&T, GridError> {
        let i = self.check(pos)?;
        Ok(&self.elements[i])
    }

    /// Bounds-checked mutable access.
    pub fn at_mut(&mut self, pos: IVec2) -> Result<&mut T, GridError> {
        let i = self.check(pos)?;
        Ok(&mut self.elements[i])
    }

    pub fn at_xy(&self, x: i32, y: i32) -> Result<&T, GridError> {
        self.at(IVec2::new(x, y))
    }

    pub fn at_xy_mut(&mut self, x: i32, y: i32) -> Result<&mut T, GridError> {
        self.at_mut(IVec2::new(x, y))
    }

    /// Borrow the row-major storage, e.g. for a texture upload. The grid
    /// cannot be resized or dropped while the slice is alive.
    pub fn as_slice(&self) -> &[T] {
        &self.elements
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.elements
    }

    /// Hand over the storage and leave an empty `0x0` grid behind.
    pub fn take_elements(&mut self) -> Vec<T> {
        self.size = IVec2::ZERO;
        std::mem::take(&mut self.elements)
    }

    /// Consume the grid and return its storage.
    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }

    /// Exchange contents and dimensions with `other`.
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.elements.iter_mut()
    }

    /// Visit every element with its position and flat index, row by row.
    pub fn for_each_xy(&self, mut f: impl FnMut(&T, IVec2, usize)) {
        let width = self.size.x.max(1) as usize;
        for (i, value) in self.elements.iter().enumerate() {
            f(value, IVec2::new((i % width) as i32, (i / width) as i32), i);
        }
    }

    /// Mutable variant of [`Grid::for_each_xy`].
    pub fn for_each_xy_mut(&mut self, mut f: impl FnMut(&mut T, IVec2, usize)) {
        let width = self.size.x.max(1) as usize;
        for (i, value) in self.elements.iter_mut().enumerate() {
            f(value, IVec2::new((i % width) as i32, (i / width) as i32), i);
        }
    }
}

impl<T: bytemuck::Pod> Grid<T> {
    /// Raw bytes of the storage for zero-copy upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.elements)
    }
}

impl<T: Clone> Grid<T> {
    /// Create a grid of `size` with every cell set to `fill`.
    pub fn new(size: IVec2, fill: T) -> Result<Self, GridError> {
        let count = element_count(size, "Grid::new")?;
        Ok(Self {
            size,
            elements: vec![fill; count],
        })
    }

    /// Change the size, keeping the overlapping region at the same `(x, y)`.
    /// Cells outside the old extent are set to `fill`. On error the grid is
    /// left untouched.
    pub fn resize(&mut self, new_size: IVec2, fill: T) -> Result<(), GridError> {
        let count = element_count(new_size, "Grid::resize")?;
        let mut elements = vec![fill; count];
        let keep = self.size.min(new_size);
        for y in 0..keep.y as usize {
            let src = y * self.size.x as usize;
            let dst = y * new_size.x as usize;
            let n = keep.x as usize;
            elements[dst..dst + n].clone_from_slice(&self.elements[src..src + n]);
        }
        self.elements = elements;
        self.size = new_size;
        Ok(())
    }

    /// Copy of the rectangle starting at `offset` with extent `size`.
    pub fn sub_area(&self, offset: IVec2, size: IVec2) -> Result<Self, GridError> {
        element_count(size, "Grid::sub_area")?;
        if offset.x < 0 || offset.y < 0 {
            return Err(GridError::invalid(format!(
                "Grid::sub_area: offset {offset} must not be negative"
            )));
        }
        if offset.y.checked_add(size.y).is_none_or(|end| end > self.size.y) {
            return Err(GridError::invalid("Grid::sub_area: offset.y invalid"));
        }
        if offset.x.checked_add(size.x).is_none_or(|end| end > self.size.x) {
            return Err(GridError::invalid("Grid::sub_area: offset.x invalid"));
        }
        let mut elements = Vec::with_capacity(size.x as usize * size.y as usize);
        for y in 0..size.y {
            let start = self.flat_index_unchecked(offset + IVec2::new(0, y));
            elements.extend_from_slice(&self.elements[start..start + size.x as usize]);
        }
        Ok(Self { size, elements })
    }

    /// Move every element by `offset` with wraparound.
    ///
    /// Both dimensions must be powers of two; the wrap is a bit mask.
    pub fn shifted(&self, offset: IVec2) -> Self {
        debug_assert!(
            self.is_empty() || is_power_of_two_size(self.size),
            "Grid::shifted needs power-of-two dimensions, got {}",
            self.size
        );
        let mask = self.size - IVec2::ONE;
        let mut result = self.clone();
        self.for_each_xy(|value, xy, _| {
            let target = (xy + offset) & mask;
            result[target] = value.clone();
        });
        result
    }

    /// Swap rows and columns.
    pub fn transposed(&self) -> Self {
        let size = IVec2::new(self.size.y, self.size.x);
        let mut elements = Vec::with_capacity(self.elements.len());
        for y in 0..size.y {
            for x in 0..size.x {
                elements.push(self[IVec2::new(y, x)].clone());
            }
        }
        Self { size, elements }
    }

    /// Overwrite the region at `offset` with `other`.
    ///
    /// `other` must fit inside `self` at `offset`.
    pub fn insert(&mut self, other: &Self, offset: IVec2) -> &mut Self {
        debug_assert!(
            offset.x >= 0
                && offset.y >= 0
                && offset.x + other.size.x <= self.size.x
                && offset.y + other.size.y <= self.size.y,
            "Grid::insert: {} at {offset} does not fit into {}",
            other.size,
            self.size
        );
        let n = other.size.x as usize;
        for y in 0..other.size.y {
            let dst = self.flat_index_unchecked(offset + IVec2::new(0, y));
            let src = y as usize * n;
            self.elements[dst..dst + n].clone_from_slice(&other.elements[src..src + n]);
        }
        self
    }

    // Row starts may equal `len` for zero-width rows, which `flat_index`
    // would flag.
    #[inline]
    fn flat_index_unchecked(&self, pos: IVec2) -> usize {
        pos.x as usize + pos.y as usize * self.size.x as usize
    }
}

impl<T: Clone + Default> Grid<T> {
    /// Create a grid of `size` filled with `T::default()`.
    pub fn with_default(size: IVec2) -> Result<Self, GridError> {
        Self::new(size, T::default())
    }
}

impl<T: Copy> Grid<T> {
    /// Element-wise explicit cast to another element type.
    pub fn convert<U: CastFrom<T>>(&self) -> Grid<U> {
        Grid {
            size: self.size,
            elements: self.elements.iter().map(|&v| U::cast_from(v)).collect(),
        }
    }

    /// Element-wise conversion of values in `[0, 1]` through the
    /// [`Convert01`] policy of the target type.
    pub fn convert_01<U: Convert01<T>>(&self) -> Grid<U> {
        Grid {
            size: self.size,
            elements: self.elements.iter().map(|&v| U::convert_01(v)).collect(),
        }
    }

    /// Build a grid from one of another element type.
    pub fn cast_from<S: Copy>(source: &Grid<S>) -> Self
    where
        T: CastFrom<S>,
    {
        source.convert()
    }
}

impl<T: Element> Grid<T> {
    /// Clamp each element to `[min, max]`, then cast.
    pub fn convert_clamped<U: CastFrom<T>>(&self, min: T, max: T) -> Grid<U> {
        Grid {
            size: self.size,
            elements: self
                .elements
                .iter()
                .map(|&v| U::cast_from(min.max_elem(max.min_elem(v))))
                .collect(),
        }
    }

    /// Reduce `map(v)` over all elements with `f`. Every element, the first
    /// included, goes through `map`.
    fn fold_nonempty(
        &self,
        context: &str,
        map: impl Fn(T) -> T,
        f: impl Fn(T, T) -> T,
    ) -> Result<T, GridError> {
        let (&first, rest) = self
            .elements
            .split_first()
            .ok_or_else(|| GridError::invalid(format!("Grid::{context}: grid is empty")))?;
        Ok(rest.iter().fold(map(first), |acc, &v| f(acc, map(v))))
    }

    pub fn get_min(&self) -> Result<T, GridError> {
        self.fold_nonempty("get_min", |v| v, T::min_elem)
    }

    pub fn get_max(&self) -> Result<T, GridError> {
        self.fold_nonempty("get_max", |v| v, T::max_elem)
    }

    pub fn get_min_abs(&self) -> Result<T, GridError> {
        self.fold_nonempty("get_min_abs", T::abs, T::min_elem)
    }

    pub fn get_max_abs(&self) -> Result<T, GridError> {
        self.fold_nonempty("get_max_abs", T::abs, T::max_elem)
    }

    /// Multiply every element by `s`. Integer elements saturate.
    pub fn mul_scalar(&mut self, s: T) -> &mut Self {
        for v in &mut self.elements {
            *v = v.saturating_mul(s);
        }
        self
    }

    /// Add `a` to every element. Integer elements saturate.
    pub fn add_scalar(&mut self, a: T) -> &mut Self {
        for v in &mut self.elements {
            *v = v.saturating_add(a);
        }
        self
    }

    /// Element-wise sum. Both grids must have the same dimensions.
    pub fn try_add_grid(&mut self, other: &Self) -> Result<&mut Self, GridError> {
        if self.size != other.size {
            return Err(GridError::invalid(format!(
                "Grid::add_grid: size {} does not match {}",
                other.size, self.size
            )));
        }
        for (v, &o) in self.elements.iter_mut().zip(&other.elements) {
            *v = v.saturating_add(o);
        }
        Ok(self)
    }
}

impl<T> Index<IVec2> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, pos: IVec2) -> &T {
        &self.elements[self.flat_index(pos)]
    }
}

impl<T> IndexMut<IVec2> for Grid<T> {
    #[inline]
    fn index_mut(&mut self, pos: IVec2) -> &mut T {
        let i = self.flat_index(pos);
        &mut self.elements[i]
    }
}

impl<T: Element> MulAssign<T> for Grid<T> {
    fn mul_assign(&mut self, s: T) {
        self.mul_scalar(s);
    }
}

impl<T: Element> AddAssign<T> for Grid<T> {
    fn add_assign(&mut self, a: T) {
        self.add_scalar(a);
    }
}

/// Panics if the dimensions differ; use [`Grid::try_add_grid`] to get an
/// error instead.
impl<T: Element> AddAssign<&Grid<T>> for Grid<T> {
    fn add_assign(&mut self, other: &Grid<T>) {
        if let Err(e) = self.try_add_grid(other) {
            panic!("{e}");
        }
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut Grid<T> {
    type Item = &'a mut T;
    type IntoIter = std::slice::IterMut<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter_mut()
    }
}
