//! Row scheduler.
//!
//! Splits a destination buffer into disjoint rows and runs a closure per row.
//! Workers are rayon tasks that claim small blocks of rows by
//! post-incrementing one shared atomic counter, so a slow row never holds up
//! the rest.
//! The row closure must only depend on its row index, which makes the output
//! independent of which worker ran which row.

/// How [`for_each_row`] distributes rows.
///
/// This is the only execution knob in the crate; every row-parallel
/// operation takes one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Threading {
    /// One worker per rayon pool thread, capped by the row count.
    #[default]
    Auto,
    /// At most this many workers (still capped by the row count).
    Fixed(usize),
    /// Run every row on the calling thread.
    Sequential,
}

impl Threading {
    /// Number of workers this setting asks for when there are `rows` rows.
    ///
    /// Always 1 without the `std` feature.
    pub fn workers(self, rows: usize) -> usize {
        if rows == 0 {
            return 0;
        }
        match self {
            Threading::Sequential => 1,
            Threading::Fixed(n) => n.clamp(1, rows),
            Threading::Auto => hardware_threads().min(rows),
        }
        .min(max_workers())
    }
}

#[cfg(feature = "std")]
fn hardware_threads() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "std"))]
fn hardware_threads() -> usize {
    1
}

#[cfg(feature = "std")]
const fn max_workers() -> usize {
    usize::MAX
}

#[cfg(not(feature = "std"))]
const fn max_workers() -> usize {
    1
}

/// Run `f(y, row)` for every `width`-sized row of `dst`.
///
/// Rows are handed out in claim order, which may differ from completion
/// order. Returns once every row has run. A `width` of zero or an empty
/// `dst` is a no-op; a trailing partial row is ignored.
pub fn for_each_row<T, F>(dst: &mut [T], width: usize, threading: Threading, f: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if width == 0 || dst.is_empty() {
        return;
    }
    let rows = dst.len() / width;
    let workers = threading.workers(rows);

    if workers <= 1 {
        for (y, row) in dst.chunks_exact_mut(width).enumerate() {
            f(y, row);
        }
        return;
    }

    #[cfg(feature = "std")]
    run_workers(dst, width, rows, workers, &f);
}

#[cfg(feature = "std")]
fn run_workers<T, F>(dst: &mut [T], width: usize, rows: usize, workers: usize, f: &F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Mutex, PoisonError};

    let block_rows = block_rows(rows, workers);
    log::debug!("spreading {rows} rows over {workers} workers, {block_rows} rows per claim");

    // Each block is claimed by exactly one worker, so its lock never
    // contends. The lock only hands the `&mut` over without `unsafe`.
    let blocks: Vec<Mutex<&mut [T]>> = dst[..rows * width]
        .chunks_mut(block_rows * width)
        .map(Mutex::new)
        .collect();
    let next = AtomicUsize::new(0);

    rayon::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|_| {
                loop {
                    let b = next.fetch_add(1, Ordering::Relaxed);
                    let Some(block) = blocks.get(b) else {
                        break;
                    };
                    let mut block = block.lock().unwrap_or_else(PoisonError::into_inner);
                    for (i, row) in block.chunks_exact_mut(width).enumerate() {
                        f(b * block_rows + i, row);
                    }
                }
            });
        }
    });
}

/// Rows per claim: about four claims per worker, so uneven rows still
/// balance out.
#[cfg(feature = "std")]
fn block_rows(rows: usize, workers: usize) -> usize {
    (rows / (workers * 4)).max(1)
}

#[cfg(test)]
mod tests {
    extern crate std;
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::sync::atomic::{AtomicUsize, Ordering};

    fn fill_rows(threading: Threading, width: usize, height: usize) -> Vec<u64> {
        let mut dst = vec![0u64; width * height];
        for_each_row(&mut dst, width, threading, |y, row| {
            for (x, v) in row.iter_mut().enumerate() {
                *v = (y as u64) << 32 | x as u64;
            }
        });
        dst
    }

    #[test]
    fn every_row_runs_once() {
        let calls = AtomicUsize::new(0);
        let mut dst = vec![0u32; 7 * 33];
        for_each_row(&mut dst, 7, Threading::Fixed(4), |y, row| {
            calls.fetch_add(1, Ordering::Relaxed);
            row.fill(y as u32 + 1);
        });
        assert_eq!(calls.load(Ordering::Relaxed), 33);
        for (y, row) in dst.chunks_exact(7).enumerate() {
            assert!(row.iter().all(|&v| v == y as u32 + 1));
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        for (w, h) in [(1, 1), (3, 100), (64, 5), (17, 17)] {
            let expected = fill_rows(Threading::Sequential, w, h);
            assert_eq!(fill_rows(Threading::Auto, w, h), expected);
            assert_eq!(fill_rows(Threading::Fixed(3), w, h), expected);
            assert_eq!(fill_rows(Threading::Fixed(64), w, h), expected);
        }
    }

    #[test]
    fn blocks_cover_every_row_once() {
        // 1001 rows do not split evenly into blocks.
        let mut dst = vec![0u32; 5 * 1001];
        for_each_row(&mut dst, 5, Threading::Fixed(6), |y, row| {
            for v in row.iter_mut() {
                *v += y as u32 + 1;
            }
        });
        for (y, row) in dst.chunks_exact(5).enumerate() {
            assert!(row.iter().all(|&v| v == y as u32 + 1), "row {y}");
        }
    }

    #[test]
    fn trailing_partial_row_is_untouched() {
        let mut dst = vec![0u8; 3 * 40 + 2];
        for_each_row(&mut dst, 3, Threading::Fixed(4), |_, row| row.fill(7));
        assert!(dst[..120].iter().all(|&v| v == 7));
        assert_eq!(&dst[120..], &[0, 0]);
    }

    #[cfg(feature = "std")]
    #[test]
    fn block_size_keeps_claims_small() {
        assert_eq!(block_rows(3, 8), 1);
        assert_eq!(block_rows(1000, 4), 62);
        assert_eq!(block_rows(16, 4), 1);
    }

    #[test]
    fn degenerate_inputs_are_noops() {
        let mut empty: Vec<u8> = Vec::new();
        for_each_row(&mut empty, 4, Threading::Auto, |_, _| panic!("no rows"));
        let mut data = vec![1u8; 4];
        for_each_row(&mut data, 0, Threading::Auto, |_, _| panic!("no width"));
        assert_eq!(data, [1, 1, 1, 1]);
    }

    #[test]
    fn worker_count_is_bounded_by_rows() {
        assert_eq!(Threading::Auto.workers(0), 0);
        assert_eq!(Threading::Sequential.workers(1000), 1);
        assert_eq!(Threading::Fixed(0).workers(10), 1);
        assert!(Threading::Fixed(8).workers(3) <= 3);
        assert!(Threading::Auto.workers(2) <= 2);
        assert!(Threading::Auto.workers(2) >= 1);
    }
}
