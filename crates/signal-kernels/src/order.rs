//! Order Statistics
//!
//! In-place introsort and introselect over `f64` buffers, plus percentile
//! helpers built on them. Every function here reorders its input: callers that
//! still need the original sample order must pass a copy.
//!
//! Ordering is `f64::total_cmp`, so NaN values sort after every finite value
//! instead of poisoning the comparisons.

use crate::{KernelError, KernelResult};
use std::cmp::Ordering;

/// Partitions at or below this length are finished with insertion sort
const INSERTION_THRESHOLD: usize = 16;

#[inline]
fn less(a: f64, b: f64) -> bool {
    a.total_cmp(&b) == Ordering::Less
}

#[inline]
fn floor_log2(n: usize) -> usize {
    (usize::BITS - 1 - n.leading_zeros()) as usize
}

/// Sort a buffer in place.
///
/// Median-of-three quicksort that switches to heapsort once the recursion
/// depth exceeds `2 * log2(n)`, so sorted, reversed and organ-pipe inputs stay
/// O(n log n).
pub fn sort(buf: &mut [f64]) {
    if buf.len() < 2 {
        return;
    }
    let depth = 2 * floor_log2(buf.len());
    introsort(buf, depth);
}

fn introsort(mut buf: &mut [f64], mut depth: usize) {
    loop {
        if buf.len() <= INSERTION_THRESHOLD {
            insertion_sort(buf);
            return;
        }
        if depth == 0 {
            heapsort(buf);
            return;
        }
        depth -= 1;

        let pivot = partition(buf);
        let (left, right) = std::mem::take(&mut buf).split_at_mut(pivot);
        let right = &mut right[1..];

        // Recurse on the smaller side, iterate on the larger one
        if left.len() < right.len() {
            introsort(left, depth);
            buf = right;
        } else {
            introsort(right, depth);
            buf = left;
        }
    }
}

/// Median-of-three partition. Requires `buf.len() >= 3`.
///
/// Returns the final pivot index `p`: everything in `buf[..p]` is `<=` the
/// pivot and everything in `buf[p + 1..]` is `>=` it.
fn partition(buf: &mut [f64]) -> usize {
    let last = buf.len() - 1;
    let mid = buf.len() / 2;

    if less(buf[mid], buf[0]) {
        buf.swap(mid, 0);
    }
    if less(buf[last], buf[0]) {
        buf.swap(last, 0);
    }
    if less(buf[last], buf[mid]) {
        buf.swap(last, mid);
    }

    // buf[0] <= pivot <= buf[last] now act as sentinels for both scans
    buf.swap(mid, last - 1);
    let pivot = buf[last - 1];

    let mut i = 0;
    let mut j = last - 1;
    loop {
        i += 1;
        while less(buf[i], pivot) {
            i += 1;
        }
        j -= 1;
        while less(pivot, buf[j]) {
            j -= 1;
        }
        if i >= j {
            break;
        }
        buf.swap(i, j);
    }
    buf.swap(i, last - 1);
    i
}

fn insertion_sort(buf: &mut [f64]) {
    for i in 1..buf.len() {
        let value = buf[i];
        let mut j = i;
        while j > 0 && less(value, buf[j - 1]) {
            buf[j] = buf[j - 1];
            j -= 1;
        }
        buf[j] = value;
    }
}

fn heapsort(buf: &mut [f64]) {
    let len = buf.len();
    for start in (0..len / 2).rev() {
        sift_down(buf, start, len);
    }
    for end in (1..len).rev() {
        buf.swap(0, end);
        sift_down(buf, 0, end);
    }
}

fn sift_down(buf: &mut [f64], mut root: usize, end: usize) {
    loop {
        let mut child = 2 * root + 1;
        if child >= end {
            return;
        }
        if child + 1 < end && less(buf[child], buf[child + 1]) {
            child += 1;
        }
        if !less(buf[root], buf[child]) {
            return;
        }
        buf.swap(root, child);
        root = child;
    }
}

/// Partially sort `buf` so that `buf[k]` holds the k-th smallest value.
///
/// Afterwards every element left of `k` is `<= buf[k]` and every element right
/// of it is `>= buf[k]`. Average O(n); falls back to heapsort of the remaining
/// range when pivots keep going bad.
pub fn select_nth(buf: &mut [f64], k: usize) -> KernelResult<f64> {
    let len = buf.len();
    if k >= len {
        return Err(KernelError::TooShort {
            required: k + 1,
            actual: len,
        });
    }

    let mut lo = 0;
    let mut hi = len;
    let mut depth = 2 * floor_log2(len);
    loop {
        let window = &mut buf[lo..hi];
        if window.len() <= INSERTION_THRESHOLD {
            insertion_sort(window);
            break;
        }
        if depth == 0 {
            heapsort(window);
            break;
        }
        depth -= 1;

        let pivot = lo + partition(window);
        match k.cmp(&pivot) {
            Ordering::Equal => break,
            Ordering::Less => hi = pivot,
            Ordering::Greater => lo = pivot + 1,
        }
    }
    Ok(buf[k])
}

fn check_percentile(p: f64) -> KernelResult<()> {
    if !(0.0..=100.0).contains(&p) {
        return Err(KernelError::OutOfRange {
            name: "percentile",
            value: p,
            min: 0.0,
            max: 100.0,
        });
    }
    Ok(())
}

/// Fractional rank of percentile `p` in a buffer of `len` values
#[inline]
fn rank(p: f64, len: usize) -> (usize, f64) {
    let h = p / 100.0 * (len - 1) as f64;
    let lower = h.floor();
    (lower as usize, h - lower)
}

/// The p-th percentile (`p` in `[0, 100]`) with linear interpolation between
/// the two bracketing order statistics.
///
/// Reorders `buf`. No allocation: the lower order statistic comes from
/// [`select_nth`], the upper one is the minimum of the right partition.
pub fn percentile(buf: &mut [f64], p: f64) -> KernelResult<f64> {
    check_percentile(p)?;
    if buf.is_empty() {
        return Err(KernelError::TooShort {
            required: 1,
            actual: 0,
        });
    }

    let (lower, frac) = rank(p, buf.len());
    let low = select_nth(buf, lower)?;
    if frac == 0.0 || lower + 1 == buf.len() {
        return Ok(low);
    }

    let high = buf[lower + 1..]
        .iter()
        .copied()
        .min_by(|a, b| a.total_cmp(b))
        .unwrap_or(low);
    Ok(low + frac * (high - low))
}

/// Percentile over a buffer that is already sorted ascending.
pub fn percentile_sorted(sorted: &[f64], p: f64) -> KernelResult<f64> {
    check_percentile(p)?;
    if sorted.is_empty() {
        return Err(KernelError::TooShort {
            required: 1,
            actual: 0,
        });
    }

    let (lower, frac) = rank(p, sorted.len());
    let low = sorted[lower];
    if frac == 0.0 || lower + 1 == sorted.len() {
        return Ok(low);
    }
    Ok(low + frac * (sorted[lower + 1] - low))
}

/// Median (50th percentile). Reorders `buf`.
pub fn median(buf: &mut [f64]) -> KernelResult<f64> {
    percentile(buf, 50.0)
}

/// Interquartile range, 75th minus 25th percentile. Sorts `buf`.
pub fn iqr(buf: &mut [f64]) -> KernelResult<f64> {
    sort(buf);
    Ok(percentile_sorted(buf, 75.0)? - percentile_sorted(buf, 25.0)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_sorted(values: &[f64]) -> Vec<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        sorted
    }

    fn scrambled(n: usize) -> Vec<f64> {
        // Deterministic permutation-like sequence with duplicates
        (0..n).map(|i| ((i * 7919) % 101) as f64 - 50.0).collect()
    }

    #[test]
    fn test_sort_matches_reference() {
        for n in [0, 1, 2, 3, 15, 16, 17, 100, 1000] {
            let values = scrambled(n);
            let mut sorted = values.clone();
            sort(&mut sorted);
            assert_eq!(sorted, reference_sorted(&values), "n = {n}");
        }
    }

    #[test]
    fn test_sort_adversarial_inputs() {
        let ascending: Vec<f64> = (0..5000).map(|i| i as f64).collect();
        let descending: Vec<f64> = ascending.iter().rev().copied().collect();
        let constant = vec![3.0; 5000];
        let organ_pipe: Vec<f64> = (0..2500).chain((0..2500).rev()).map(|i| i as f64).collect();

        for values in [ascending, descending, constant, organ_pipe] {
            let mut sorted = values.clone();
            sort(&mut sorted);
            assert_eq!(sorted, reference_sorted(&values));
        }
    }

    #[test]
    fn test_heapsort_directly() {
        let values = scrambled(257);
        let mut sorted = values.clone();
        heapsort(&mut sorted);
        assert_eq!(sorted, reference_sorted(&values));
    }

    #[test]
    fn test_nan_sorts_last() {
        let mut values = vec![2.0, f64::NAN, -1.0, 0.5];
        sort(&mut values);
        assert_eq!(&values[..3], &[-1.0, 0.5, 2.0]);
        assert!(values[3].is_nan());
    }

    #[test]
    fn test_select_nth() {
        let values = scrambled(500);
        let expected = reference_sorted(&values);
        for k in [0, 1, 17, 250, 498, 499] {
            let mut buf = values.clone();
            let got = select_nth(&mut buf, k).unwrap();
            assert_eq!(got, expected[k]);
            assert!(buf[..k].iter().all(|&v| v <= got));
            assert!(buf[k + 1..].iter().all(|&v| v >= got));
        }
    }

    #[test]
    fn test_select_nth_out_of_range() {
        let mut buf = vec![1.0, 2.0];
        assert!(select_nth(&mut buf, 2).is_err());
    }

    #[test]
    fn test_percentile_interpolation() {
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert!((percentile(&mut values, 50.0).unwrap() - 2.5).abs() < 1e-12);
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert!((percentile(&mut values, 25.0).unwrap() - 1.75).abs() < 1e-12);
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&mut values, 100.0).unwrap(), 4.0);
        let mut values = vec![4.0, 1.0, 3.0, 2.0];
        assert_eq!(percentile(&mut values, 0.0).unwrap(), 1.0);
    }

    #[test]
    fn test_percentile_rejects_bad_input() {
        assert!(percentile(&mut [1.0, 2.0], 101.0).is_err());
        assert!(percentile(&mut [1.0, 2.0], -0.5).is_err());
        assert!(percentile(&mut Vec::new(), 50.0).is_err());
    }

    #[test]
    fn test_iqr() {
        let mut values: Vec<f64> = (1..=8).rev().map(f64::from).collect();
        assert!((iqr(&mut values).unwrap() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_single_value_median() {
        assert_eq!(median(&mut [7.0]).unwrap(), 7.0);
    }
}
