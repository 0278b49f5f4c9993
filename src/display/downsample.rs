/// Reduce `(xs[i], values[i])` to at most `2 * max(1, max_points / 2) + 2`
/// points, keeping the minimum and maximum of every bucket.
///
/// When `values.len() <= max_points` every sample is kept. The first and last
/// samples are always included. Output is ordered by x.
pub fn downsample(values: &[f64], xs: &[f64], max_points: usize) -> Vec<(f64, f64)> {
    let n = values.len().min(xs.len());
    if n == 0 {
        return Vec::new();
    }
    let mut points: Vec<(f64, f64)> = envelope_indices(&values[..n], max_points)
        .into_iter()
        .map(|i| (xs[i], values[i]))
        .collect();
    // Timestamps may step backwards; equal x keeps sample order.
    points.sort_by(|a, b| a.0.total_cmp(&b.0));
    points
}

/// Same as [`downsample`] with the sample index as x.
pub fn downsample_indexed(values: &[f64], max_points: usize) -> Vec<(f64, f64)> {
    let xs: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
    downsample(values, &xs, max_points)
}

/// Indices retained by the min/max envelope, ascending and without repeats.
pub fn envelope_indices(values: &[f64], max_points: usize) -> Vec<usize> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    if n <= max_points {
        return (0..n).collect();
    }
    let buckets = (max_points / 2).max(1);
    let bucket_size = n as f64 / buckets as f64;
    let mut picked = Vec::with_capacity(2 * buckets + 2);
    picked.push(0);
    for b in 0..buckets {
        let start = ((b as f64 * bucket_size).floor() as usize).min(n - 1);
        let end = if b == buckets - 1 {
            n
        } else {
            ((b + 1) as f64 * bucket_size).floor() as usize
        };
        let end = end.min(n).max(start + 1);
        let (min_idx, max_idx) = bucket_extrema(values, start, end);
        if min_idx == max_idx {
            picked.push(min_idx);
        } else {
            picked.push(min_idx.min(max_idx));
            picked.push(min_idx.max(max_idx));
        }
    }
    picked.push(n - 1);
    // Bucket order is already ascending; the sort only settles boundary ties.
    picked.sort_unstable();
    picked.dedup();
    picked
}

/// Positions of the minimum and maximum in `values[start..end]`. NaN never
/// wins a comparison, so an all-NaN bucket reports `start` for both.
fn bucket_extrema(values: &[f64], start: usize, end: usize) -> (usize, usize) {
    let mut min_val = f64::MAX;
    let mut max_val = f64::MIN;
    let mut min_idx = start;
    let mut max_idx = start;
    for (i, &v) in values.iter().enumerate().take(end).skip(start) {
        if v < min_val {
            min_val = v;
            min_idx = i;
        }
        if v > max_val {
            max_val = v;
            max_idx = i;
        }
    }
    (min_idx, max_idx)
}
