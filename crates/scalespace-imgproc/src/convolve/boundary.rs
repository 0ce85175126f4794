use std::ops::Range;

/// Maps an index outside `[0, len)` back inside by reflecting without repeating the edge.
///
/// `-1, -2, ..` map to `1, 2, ..` and `len, len + 1, ..` map to `len - 2, len - 3, ..`.
/// Reflection repeats for indices further away than one axis length, so the mapping is
/// periodic with period `2 * (len - 1)`. An axis of length 1 maps everything to 0.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::convolve::mirror_index;
///
/// assert_eq!(mirror_index(-1, 5), 1);
/// assert_eq!(mirror_index(5, 5), 3);
/// assert_eq!(mirror_index(2, 5), 2);
/// ```
#[inline]
pub fn mirror_index(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let period = 2 * (len as isize - 1);
    let m = index.rem_euclid(period);
    if m >= len as isize {
        (period - m) as usize
    } else {
        m as usize
    }
}

/// Range of source indices along one axis needed to filter `[start, stop)` with a kernel of
/// the given radius.
///
/// This is the smallest range containing [`mirror_index`] of every index in
/// `[start - radius, stop + radius)`.
pub fn halo_range(start: usize, stop: usize, radius: usize, len: usize) -> Range<usize> {
    let from = start as isize - radius as isize;
    let to = stop as isize + radius as isize;
    let (lo, hi) = (from..to)
        .map(|i| mirror_index(i, len))
        .fold((usize::MAX, 0), |(lo, hi), m| (lo.min(m), hi.max(m)));
    if lo > hi {
        return start..start;
    }
    lo..hi + 1
}
