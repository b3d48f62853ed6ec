//! Copy-on-write pixel storage.
//!
//! A [`PixelBuffer`] is a cheap handle: cloning it shares the pixel storage
//! and bumps an atomic reference count. Every mutating method detaches first,
//! so a handle never observes writes made through another one.
//!
//! ```rust
//! use vellum::{PixelBuffer, Rgba8};
//!
//! let a = PixelBuffer::new(4, 4, Rgba8::new(0, 0, 0, 255));
//! let mut b = a.clone();
//! assert!(a.same_object(&b));
//!
//! b.set_pixel(1, 1, Rgba8::new(255, 0, 0, 255));
//! assert!(!a.same_object(&b));
//! assert_eq!(a.pixel(1, 1, Rgba8::default()), Rgba8::new(0, 0, 0, 255));
//! ```

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct Storage<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    // Share of the canvas holding real content after power-of-two padding.
    fw: f32,
    fh: f32,
}

impl<T> Storage<T> {
    fn new(width: usize, height: usize, data: Vec<T>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            width,
            height,
            fw: 1.0,
            fh: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// PixelBuffer
// ---------------------------------------------------------------------------

/// Row-major 2D pixel buffer with copy-on-write sharing.
///
/// The pixel type is opaque to the buffer; anything `Copy + Default` works.
/// The crate aliases the common ones as [`Rgba8Map`](crate::Rgba8Map),
/// [`RgbaF32Map`](crate::RgbaF32Map) and [`GrayMap`](crate::GrayMap).
///
/// Reads never fail: out-of-range coordinates return a caller-supplied
/// default. Out-of-range writes are ignored.
pub struct PixelBuffer<T> {
    inner: Arc<Storage<T>>,
}

impl<T> Clone for PixelBuffer<T> {
    /// Shares the storage. No pixels are copied.
    #[inline]
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Copy + Default> Default for PixelBuffer<T> {
    /// The empty 0×0 buffer.
    fn default() -> Self {
        Self::from_storage(Storage::new(0, 0, Vec::new()))
    }
}

impl<T> fmt::Debug for PixelBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.inner.width)
            .field("height", &self.inner.height)
            .field("fw", &self.inner.fw)
            .field("fh", &self.inner.fh)
            .field("ref_count", &Arc::strong_count(&self.inner))
            .finish_non_exhaustive()
    }
}

/// Two buffers are equal when they have the same dimensions and pixels.
///
/// Fractional-size hints and sharing are not compared; use
/// [`PixelBuffer::same_object`] for identity.
impl<T: PartialEq> PartialEq for PixelBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
            || (self.inner.width == other.inner.width
                && self.inner.height == other.inner.height
                && self.inner.data == other.inner.data)
    }
}

impl<T> PixelBuffer<T> {
    #[inline]
    fn from_storage(storage: Storage<T>) -> Self {
        Self {
            inner: Arc::new(storage),
        }
    }

    /// Width in pixels.
    #[inline]
    pub fn width(&self) -> usize {
        self.inner.width
    }

    /// Height in pixels.
    #[inline]
    pub fn height(&self) -> usize {
        self.inner.height
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.data.len()
    }

    /// `true` if either dimension is zero.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.data.is_empty()
    }

    /// Size of the pixel data in bytes.
    #[inline]
    pub fn size_in_bytes(&self) -> usize {
        self.len() * core::mem::size_of::<T>()
    }

    /// Horizontal share of the canvas that holds real content.
    ///
    /// 1.0 unless the buffer came out of [`pad_to_power_of_two`](Self::pad_to_power_of_two),
    /// in which case it lies in (0.5, 1.0].
    #[inline]
    pub fn fw(&self) -> f32 {
        self.inner.fw
    }

    /// Vertical share of the canvas that holds real content. See [`fw`](Self::fw).
    #[inline]
    pub fn fh(&self) -> f32 {
        self.inner.fh
    }

    /// `true` if both handles point at the same storage.
    #[inline]
    pub fn same_object(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of handles sharing this buffer's storage.
    #[inline]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// `true` if no other handle shares the storage, so a mutation will not copy.
    #[inline]
    pub fn is_unique(&self) -> bool {
        self.ref_count() == 1
    }

    /// All pixels, row-major.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.inner.data
    }

    /// Iterate over rows.
    pub fn rows(&self) -> core::slice::ChunksExact<'_, T> {
        // Width 0 implies no data, so the chunk size only has to be non-zero.
        self.inner.data.chunks_exact(self.inner.width.max(1))
    }

    /// Borrow row `y`, or `None` if out of range.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.inner.height {
            return None;
        }
        let w = self.inner.width;
        Some(&self.inner.data[y * w..(y + 1) * w])
    }

    /// Raw row-major byte view of the pixels.
    #[inline]
    pub fn as_bytes(&self) -> &[u8]
    where
        T: bytemuck::Pod,
    {
        bytemuck::cast_slice(self.as_slice())
    }
}

impl<T: Copy + Default> PixelBuffer<T> {
    /// Allocate a `width × height` buffer filled with `fill`.
    ///
    /// Zero dimensions are allowed and give an empty buffer.
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Self::from_storage(Storage::new(width, height, vec![fill; width * height]))
    }

    /// Allocate a `width × height` buffer copying the first `width * height`
    /// pixels of `data`.
    ///
    /// A slice that is too short gives the empty buffer and a logged warning.
    pub fn from_slice(width: usize, height: usize, data: &[T]) -> Self {
        let n = width * height;
        match data.get(..n) {
            Some(pixels) => Self::from_storage(Storage::new(width, height, pixels.to_vec())),
            None => {
                log::warn!(
                    "pixel slice holds {} pixels, {width}x{height} needs {n}",
                    data.len()
                );
                Self::default()
            }
        }
    }

    /// Take ownership of `data` as a `width × height` buffer.
    ///
    /// Returns `None` if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width * height)
            .then(|| Self::from_storage(Storage::new(width, height, data)))
    }

    /// Unwrap into the pixel vector, copying only if the storage is shared.
    pub fn into_vec(self) -> Vec<T> {
        match Arc::try_unwrap(self.inner) {
            Ok(storage) => storage.data,
            Err(shared) => shared.data.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Detach
    // -----------------------------------------------------------------------

    /// Private copy of the storage if it is shared, then mutable access.
    #[inline]
    fn storage_mut(&mut self) -> &mut Storage<T> {
        Arc::make_mut(&mut self.inner)
    }

    /// Mutable access to all pixels. Detaches.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.storage_mut().data
    }

    /// Iterate mutably over rows. Detaches.
    pub fn rows_mut(&mut self) -> core::slice::ChunksExactMut<'_, T> {
        let w = self.inner.width.max(1);
        self.as_mut_slice().chunks_exact_mut(w)
    }

    // -----------------------------------------------------------------------
    // Pixel access
    // -----------------------------------------------------------------------

    /// Pixel at `(x, y)`, or `default` if out of range.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize, default: T) -> T {
        if x < self.inner.width && y < self.inner.height {
            self.inner.data[y * self.inner.width + x]
        } else {
            default
        }
    }

    /// Write the pixel at `(x, y)`. Detaches. Out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: T) {
        let storage = self.storage_mut();
        if x < storage.width && y < storage.height {
            storage.data[y * storage.width + x] = value;
        }
    }

    /// Mutable reference to the pixel at `(x, y)`. Detaches.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of range.
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut T {
        let storage = self.storage_mut();
        assert!(
            x < storage.width && y < storage.height,
            "pixel ({x}, {y}) outside {}x{} buffer",
            storage.width,
            storage.height
        );
        &mut storage.data[y * storage.width + x]
    }

    /// Set every pixel to `value`. Detaches.
    pub fn fill(&mut self, value: T) {
        self.as_mut_slice().fill(value);
    }

    // -----------------------------------------------------------------------
    // Rows and columns
    // -----------------------------------------------------------------------

    /// Copy of row `y`. Empty if the buffer is empty or `y` is out of range.
    pub fn extract_row(&self, y: usize) -> Vec<T> {
        self.row(y).map(<[T]>::to_vec).unwrap_or_default()
    }

    /// Copy of column `x`. Empty if the buffer is empty or `x` is out of range.
    pub fn extract_column(&self, x: usize) -> Vec<T> {
        if x >= self.inner.width {
            return Vec::new();
        }
        self.rows().map(|row| row[x]).collect()
    }

    /// Overwrite row `y` with `values`. Detaches.
    ///
    /// Nothing is written unless `values.len() == width`.
    pub fn set_row(&mut self, y: usize, values: &[T]) {
        let storage = self.storage_mut();
        let w = storage.width;
        if y < storage.height && values.len() == w {
            storage.data[y * w..(y + 1) * w].copy_from_slice(values);
        }
    }

    /// Overwrite column `x` with `values`. Detaches.
    ///
    /// Nothing is written unless `values.len() == height`.
    pub fn set_column(&mut self, x: usize, values: &[T]) {
        let storage = self.storage_mut();
        let w = storage.width;
        if x < w && values.len() == storage.height {
            for (row, &v) in storage.data.chunks_exact_mut(w).zip(values) {
                row[x] = v;
            }
        }
    }

    /// Set every pixel of row `y` to `value`. Detaches.
    pub fn fill_row(&mut self, y: usize, value: T) {
        let storage = self.storage_mut();
        let w = storage.width;
        if y < storage.height {
            storage.data[y * w..(y + 1) * w].fill(value);
        }
    }

    /// Set every pixel of column `x` to `value`. Detaches.
    pub fn fill_column(&mut self, x: usize, value: T) {
        let storage = self.storage_mut();
        let w = storage.width;
        if x < w {
            for row in storage.data.chunks_exact_mut(w) {
                row[x] = value;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Resizing
    // -----------------------------------------------------------------------

    /// Reallocate to `width × height` without scaling.
    ///
    /// The old pixels are dropped, never copied: a shared handle gets a fresh
    /// allocation instead of a private copy. The new pixels are `T::default()`.
    /// Fractional-size hints are kept.
    pub fn set_size(&mut self, width: usize, height: usize) {
        let n = width * height;
        match Arc::get_mut(&mut self.inner) {
            Some(storage) => {
                storage.data.clear();
                storage.data.resize(n, T::default());
                storage.width = width;
                storage.height = height;
            }
            None => {
                let mut storage = Storage::new(width, height, vec![T::default(); n]);
                storage.fw = self.inner.fw;
                storage.fh = self.inner.fh;
                self.inner = Arc::new(storage);
            }
        }
    }

    /// Record how much of the canvas holds real content. Detaches.
    pub fn set_fractional_size(&mut self, fw: f32, fh: f32) {
        let storage = self.storage_mut();
        storage.fw = fw;
        storage.fh = fh;
    }

    // -----------------------------------------------------------------------
    // Derived buffers
    // -----------------------------------------------------------------------

    /// Copy of the rectangle `[left, right) × [top, bottom)`.
    ///
    /// `left`/`top` are clamped to the last column/row and `right`/`bottom` to
    /// the width/height. The result is at least 1×1; cells that fall outside
    /// the source read as `T::default()`. Always a fresh allocation.
    pub fn sub_image(&self, left: usize, top: usize, right: usize, bottom: usize) -> Self {
        let (w, h) = (self.width(), self.height());
        let left = left.min(w.saturating_sub(1));
        let top = top.min(h.saturating_sub(1));
        let right = right.min(w);
        let bottom = bottom.min(h);

        let width = right.saturating_sub(left).max(1);
        let height = bottom.saturating_sub(top).max(1);

        let mut data = Vec::with_capacity(width * height);
        for y in top..top + height {
            data.extend((left..left + width).map(|x| self.pixel(x, y, T::default())));
        }
        Self::from_storage(Storage::new(width, height, data))
    }

    /// Rotate 90° clockwise. The result is `height × width`.
    pub fn rotate_90_cw(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let src = self.as_slice();
        let mut data = Vec::with_capacity(w * h);
        // Destination row x reads source column x from the bottom up.
        for x in 0..w {
            data.extend((0..h).rev().map(|y| src[y * w + x]));
        }
        Self::from_storage(Storage::new(h, w, data))
    }

    /// Rotate 90° counter-clockwise. The result is `height × width`.
    pub fn rotate_90_ccw(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let src = self.as_slice();
        let mut data = Vec::with_capacity(w * h);
        // Destination row r reads source column w-1-r from the top down.
        for x in (0..w).rev() {
            data.extend((0..h).map(|y| src[y * w + x]));
        }
        Self::from_storage(Storage::new(h, w, data))
    }

    /// Copy with the rows in reverse order.
    pub fn flipped(&self) -> Self {
        let mut data = Vec::with_capacity(self.len());
        for row in self.rows().rev() {
            data.extend_from_slice(row);
        }
        Self::from_storage(Storage::new(self.width(), self.height(), data))
    }

    /// Pad to a square power-of-two canvas.
    ///
    /// The side is the next power of two ≥ `max(width, height)`. Content sits
    /// in the top-left; each row's last pixel is repeated across the padding
    /// columns and the last row is repeated down the padding rows. `fw`/`fh`
    /// record the share of the canvas that holds real content.
    ///
    /// A buffer that is already a power-of-two square is returned as a shared
    /// clone; an empty buffer gives an empty buffer.
    pub fn pad_to_power_of_two(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        if w == 0 || h == 0 {
            return Self::default();
        }

        let size = w.max(h).next_power_of_two();
        if w == size && h == size {
            return self.clone();
        }

        let mut data = Vec::with_capacity(size * size);
        for row in self.rows() {
            data.extend_from_slice(row);
            let edge = row[w - 1];
            data.resize(data.len() + (size - w), edge);
        }
        let last = (h - 1) * size;
        for _ in h..size {
            data.extend_from_within(last..last + size);
        }

        let mut storage = Storage::new(size, size, data);
        storage.fw = (w as f32 * self.fw()) / size as f32;
        storage.fh = (h as f32 * self.fh()) / size as f32;
        Self::from_storage(storage)
    }

    /// [`pad_to_power_of_two`](Self::pad_to_power_of_two) into an existing handle.
    pub fn pad_to_power_of_two_into(&self, other: &mut Self) {
        *other = self.pad_to_power_of_two();
    }
}

// ---------------------------------------------------------------------------
// imgref interop
// ---------------------------------------------------------------------------

#[cfg(feature = "imgref")]
impl<T: Copy + Default> PixelBuffer<T> {
    /// Borrow as an [`imgref::ImgRef`]. `None` for an empty buffer.
    pub fn as_img(&self) -> Option<imgref::ImgRef<'_, T>> {
        (!self.is_empty())
            .then(|| imgref::ImgRef::new(self.as_slice(), self.width(), self.height()))
    }
}

#[cfg(feature = "imgref")]
impl<T: Copy + Default> From<imgref::ImgVec<T>> for PixelBuffer<T> {
    /// Copies the visible pixels, dropping any stride padding.
    fn from(img: imgref::ImgVec<T>) -> Self {
        let (w, h) = (img.width(), img.height());
        let data: Vec<T> = img.as_ref().pixels().collect();
        Self::from_storage(Storage::new(w, h, data))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Rgba8;

    const RED: Rgba8 = Rgba8::new(255, 0, 0, 255);
    const GREEN: Rgba8 = Rgba8::new(0, 255, 0, 255);
    const BLUE: Rgba8 = Rgba8::new(0, 0, 255, 255);
    const CLEAR: Rgba8 = Rgba8::new(0, 0, 0, 0);

    fn numbered(w: usize, h: usize) -> PixelBuffer<u32> {
        let data: Vec<u32> = (0..(w * h) as u32).collect();
        PixelBuffer::from_vec(w, h, data).unwrap()
    }

    #[test]
    fn new_fills_and_reads_default_out_of_range() {
        let buf = PixelBuffer::new(3, 2, RED);
        for y in 0..2 {
            for x in 0..3 {
                assert_eq!(buf.pixel(x, y, CLEAR), RED);
            }
        }
        assert_eq!(buf.pixel(3, 0, CLEAR), CLEAR);
        assert_eq!(buf.pixel(0, 2, CLEAR), CLEAR);
        assert_eq!(buf.pixel(usize::MAX, usize::MAX, BLUE), BLUE);
    }

    #[test]
    fn zero_sized_buffers_are_legal() {
        let buf = PixelBuffer::new(0, 5, RED);
        assert!(buf.is_empty());
        assert_eq!(buf.height(), 5);
        assert_eq!(buf.rows().count(), 0);
        assert!(buf.extract_row(0).is_empty());
        assert!(buf.extract_column(0).is_empty());
        assert_eq!(PixelBuffer::<u8>::default().len(), 0);
    }

    #[test]
    fn from_slice_copies_and_rejects_short_input() {
        let src = [RED, GREEN, BLUE, CLEAR, RED];
        let buf = PixelBuffer::from_slice(2, 2, &src);
        assert_eq!(buf.as_slice(), &src[..4]);

        let short = PixelBuffer::from_slice(3, 3, &src);
        assert!(short.is_empty());
    }

    #[test]
    fn clone_shares_until_written() {
        let a = PixelBuffer::new(4, 4, RED);
        let mut b = a.clone();
        assert!(a.same_object(&b));
        assert_eq!(a.ref_count(), 2);

        b.set_pixel(2, 3, GREEN);
        assert!(!a.same_object(&b));
        assert!(a.is_unique());
        assert!(b.is_unique());
        assert_eq!(a.pixel(2, 3, CLEAR), RED);
        assert_eq!(b.pixel(2, 3, CLEAR), GREEN);
    }

    #[test]
    fn unique_write_does_not_reallocate() {
        let mut a = PixelBuffer::new(2, 2, RED);
        let before = a.as_slice().as_ptr();
        a.set_pixel(0, 0, BLUE);
        a.fill_row(1, GREEN);
        assert_eq!(a.as_slice().as_ptr(), before);
    }

    #[test]
    fn out_of_range_write_still_detaches() {
        let a = PixelBuffer::new(2, 2, RED);
        let mut b = a.clone();
        b.set_pixel(9, 9, GREEN);
        assert!(!a.same_object(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn pixel_mut_detaches() {
        let a = PixelBuffer::new(2, 2, RED);
        let mut b = a.clone();
        *b.pixel_mut(1, 0) = BLUE;
        assert_eq!(a.pixel(1, 0, CLEAR), RED);
        assert_eq!(b.pixel(1, 0, CLEAR), BLUE);
    }

    #[test]
    #[should_panic]
    fn pixel_mut_out_of_range_panics() {
        let mut a = PixelBuffer::new(2, 2, RED);
        let _ = a.pixel_mut(2, 0);
    }

    #[test]
    fn moved_out_handle_is_empty() {
        let mut a = PixelBuffer::new(2, 2, RED);
        let b = core::mem::take(&mut a);
        assert!(a.is_empty());
        assert_eq!(b.len(), 4);
        assert!(!a.same_object(&b));
    }

    #[test]
    fn fill_detaches() {
        let a = PixelBuffer::new(3, 3, RED);
        let mut b = a.clone();
        b.fill(BLUE);
        assert!(a.as_slice().iter().all(|&p| p == RED));
        assert!(b.as_slice().iter().all(|&p| p == BLUE));
    }

    #[test]
    fn sub_image_top_left_of_checkerboard() {
        let board = PixelBuffer::from_slice(2, 2, &[RED, GREEN, GREEN, RED]);
        let sub = board.sub_image(0, 0, 1, 1);
        assert_eq!((sub.width(), sub.height()), (1, 1));
        assert_eq!(sub.pixel(0, 0, CLEAR), RED);
        assert!(!sub.same_object(&board));
    }

    #[test]
    fn sub_image_clamps() {
        let buf = numbered(4, 3);
        let sub = buf.sub_image(2, 1, 100, 100);
        assert_eq!((sub.width(), sub.height()), (2, 2));
        assert_eq!(sub.as_slice(), &[6, 7, 10, 11]);

        // Inverted rectangle collapses to a single pixel.
        let one = buf.sub_image(3, 2, 1, 0);
        assert_eq!((one.width(), one.height()), (1, 1));
        assert_eq!(one.as_slice(), &[11]);

        let whole = buf.sub_image(0, 0, 4, 3);
        assert_eq!(whole, buf);
        assert!(!whole.same_object(&buf));
    }

    #[test]
    fn rotate_cw_layout() {
        // 0 1 2      3 0
        // 3 4 5  ->  4 1
        //            5 2
        let r = numbered(3, 2).rotate_90_cw();
        assert_eq!((r.width(), r.height()), (2, 3));
        assert_eq!(r.as_slice(), &[3, 0, 4, 1, 5, 2]);
    }

    #[test]
    fn rotate_ccw_layout() {
        // 0 1 2      2 5
        // 3 4 5  ->  1 4
        //            0 3
        let r = numbered(3, 2).rotate_90_ccw();
        assert_eq!((r.width(), r.height()), (2, 3));
        assert_eq!(r.as_slice(), &[2, 5, 1, 4, 0, 3]);
    }

    #[test]
    fn rotations_cancel() {
        for (w, h) in [(1, 1), (5, 3), (2, 7), (0, 4)] {
            let buf = numbered(w, h);
            let back = buf.rotate_90_cw().rotate_90_ccw();
            assert_eq!((back.width(), back.height()), (w, h));
            assert_eq!(back, buf);
            assert_eq!(buf.rotate_90_ccw().rotate_90_cw(), buf);
        }
    }

    #[test]
    fn flipped_reverses_rows_and_cancels() {
        let buf = numbered(2, 3);
        let f = buf.flipped();
        assert_eq!(f.as_slice(), &[4, 5, 2, 3, 0, 1]);
        assert_eq!(f.flipped(), buf);
    }

    #[test]
    fn rows_and_columns() {
        let mut buf = numbered(3, 2);
        assert_eq!(buf.extract_row(1), [3, 4, 5]);
        assert_eq!(buf.extract_column(2), [2, 5]);
        assert!(buf.extract_row(2).is_empty());
        assert!(buf.extract_column(3).is_empty());

        buf.set_row(0, &[9, 9, 9]);
        buf.set_row(1, &[7, 7]);
        assert_eq!(buf.as_slice(), &[9, 9, 9, 3, 4, 5]);

        buf.set_column(1, &[8, 8]);
        buf.set_column(0, &[1, 1, 1]);
        assert_eq!(buf.as_slice(), &[9, 8, 9, 3, 8, 5]);

        buf.fill_row(1, 0);
        buf.fill_column(2, 6);
        assert_eq!(buf.as_slice(), &[9, 8, 6, 0, 0, 6]);
    }

    #[test]
    fn set_row_detaches_even_when_rejected() {
        let a = numbered(3, 2);
        let mut b = a.clone();
        b.set_row(0, &[1]);
        assert!(!a.same_object(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn set_size_reallocates_without_touching_shared_copy() {
        let a = numbered(3, 3);
        let mut b = a.clone();
        b.set_size(5, 1);
        assert_eq!((b.width(), b.height(), b.len()), (5, 1, 5));
        assert_eq!((a.width(), a.height()), (3, 3));
        assert_eq!(a.as_slice()[8], 8);

        let mut c = numbered(2, 2);
        c.set_size(0, 0);
        assert!(c.is_empty());
    }

    #[test]
    fn pad_to_power_of_two_replicates_edges() {
        let buf = numbered(3, 2);
        let padded = buf.pad_to_power_of_two();
        assert_eq!((padded.width(), padded.height()), (4, 4));
        assert_eq!(
            padded.as_slice(),
            &[0, 1, 2, 2, 3, 4, 5, 5, 3, 4, 5, 5, 3, 4, 5, 5]
        );
        assert_eq!(padded.fw(), 0.75);
        assert_eq!(padded.fh(), 0.5);
    }

    #[test]
    fn pad_to_power_of_two_compounds_fractions() {
        let mut buf = numbered(3, 3);
        buf.set_fractional_size(0.5, 1.0);
        let padded = buf.pad_to_power_of_two();
        assert_eq!(padded.fw(), 0.375);
        assert_eq!(padded.fh(), 0.75);
    }

    #[test]
    fn pad_to_power_of_two_shares_when_already_square() {
        let buf = numbered(8, 8);
        let padded = buf.pad_to_power_of_two();
        assert!(padded.same_object(&buf));

        let mut other = numbered(1, 1);
        numbered(2, 1).pad_to_power_of_two_into(&mut other);
        assert_eq!(other.as_slice(), &[0, 1, 0, 1]);

        assert!(PixelBuffer::<u32>::default().pad_to_power_of_two().is_empty());
    }

    #[test]
    fn as_bytes_is_row_major_rgba() {
        let buf = PixelBuffer::from_slice(2, 1, &[RED, BLUE]);
        assert_eq!(buf.as_bytes(), &[255, 0, 0, 255, 0, 0, 255, 255]);
        assert_eq!(buf.size_in_bytes(), 8);
    }

    #[test]
    fn into_vec_copies_only_when_shared() {
        let a = numbered(2, 2);
        let b = a.clone();
        assert_eq!(b.into_vec(), [0, 1, 2, 3]);
        assert!(a.is_unique());
        assert_eq!(a.into_vec(), [0, 1, 2, 3]);
    }

    #[cfg(feature = "imgref")]
    #[test]
    fn imgref_round_trip() {
        let buf = numbered(3, 2);
        let img = buf.as_img().unwrap();
        assert_eq!(img.width(), 3);
        assert_eq!(img.height(), 2);

        let owned = imgref::ImgVec::new(buf.as_slice().to_vec(), 3, 2);
        assert_eq!(PixelBuffer::from(owned), buf);
        assert!(PixelBuffer::<u32>::default().as_img().is_none());
    }
}
