use num_traits::Float;
use rayon::prelude::*;

// elements per rayon job for the pointwise helpers
const MIN_CHUNK: usize = 4096;

/// Eigenvalues of the symmetric matrix `[[xx, xy], [xy, yy]]`, largest first.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::linalg::eigenvalues_2x2;
///
/// assert_eq!(eigenvalues_2x2([2.0f64, 0.0, 6.0]), [6.0, 2.0]);
/// ```
#[inline]
pub fn eigenvalues_2x2<T: Float>([xx, xy, yy]: [T; 3]) -> [T; 2] {
    let two = T::one() + T::one();
    let mean = (xx + yy) / two;
    let radius = ((xx - yy) / two).hypot(xy);
    [mean + radius, mean - radius]
}

/// Eigenvalues of the symmetric matrix with upper triangle `[a00, a01, a02, a11, a12, a22]`,
/// largest first.
///
/// The matrix is scaled by its largest absolute entry and shifted to `B = (A - q I) / p`,
/// with `q` the mean of the diagonal and `p^2` the mean square entry of `A - q I`. The
/// trigonometric form on `B` gives the eigenvalue farthest from the other two; the
/// remaining pair comes from the 2x2 block on the orthogonal complement of its
/// eigenvector, so close eigenvalues keep their separation. A zero matrix gives zeros,
/// any NaN entry gives NaNs.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::linalg::eigenvalues_3x3;
///
/// let ev = eigenvalues_3x3([1.0f64, 1e-3, 0.0, 1.0, 0.0, 1.0]);
/// assert!((ev[0] - 1.001).abs() < 1e-12);
/// assert!((ev[1] - 1.0).abs() < 1e-12);
/// assert!((ev[2] - 0.999).abs() < 1e-12);
/// ```
pub fn eigenvalues_3x3<T: Float>(m: [T; 6]) -> [T; 3] {
    if m.iter().any(|v| v.is_nan()) {
        return [T::nan(); 3];
    }
    let max_abs = m.iter().fold(T::zero(), |acc, v| acc.max(v.abs()));
    if max_abs == T::zero() {
        return [T::zero(); 3];
    }

    let inv = max_abs.recip();
    let [a00, a01, a02, a11, a12, a22] = m.map(|v| v * inv);

    let cast = |v: f64| T::from(v).unwrap_or_else(T::zero);
    let two = cast(2.0);
    let half = cast(0.5);
    let inv3 = cast(1.0 / 3.0);
    let inv6 = cast(1.0 / 6.0);
    let third_turn = cast(2.0 * std::f64::consts::FRAC_PI_3);

    let q = (a00 + a11 + a22) * inv3;
    let (b00, b11, b22) = (a00 - q, a11 - q, a22 - q);
    let off = a01 * a01 + a02 * a02 + a12 * a12;
    let p2 = (b00 * b00 + b11 * b11 + b22 * b22 + two * off) * inv6;
    if p2 == T::zero() {
        return [q * max_abs; 3];
    }

    let p = p2.sqrt();
    let inv_p = p.recip();
    let [c00, c01, c02, c11, c12, c22] = [b00, a01, a02, b11, a12, b22].map(|v| v * inv_p);
    let det = c00 * (c11 * c22 - c12 * c12) - c01 * (c01 * c22 - c12 * c02)
        + c02 * (c01 * c12 - c11 * c02);
    let r = (det * half).max(-T::one()).min(T::one());
    let phi = r.acos() * inv3;

    // largest root when r >= 0, smallest otherwise
    let lambda = if r >= T::zero() {
        q + two * p * phi.cos()
    } else {
        q + two * p * (phi + third_turn).cos()
    };

    let a = [a00, a01, a02, a11, a12, a22];
    let [mut r0, mut r1, mut r2] = match isolated_eigenvector(&a, lambda) {
        Some(v) => {
            let [u, w] = complement(v);
            let (au, aw) = (sym_mul(&a, u), sym_mul(&a, w));
            let [e0, e1] = eigenvalues_2x2([dot(u, au), dot(u, aw), dot(w, aw)]);
            [lambda, e0, e1]
        }
        None => [
            q + two * p * phi.cos(),
            q + two * p * (phi - third_turn).cos(),
            q + two * p * (phi + third_turn).cos(),
        ],
    };

    if r0 < r1 {
        std::mem::swap(&mut r0, &mut r1);
    }
    if r0 < r2 {
        std::mem::swap(&mut r0, &mut r2);
    }
    if r1 < r2 {
        std::mem::swap(&mut r1, &mut r2);
    }

    [r0 * max_abs, r1 * max_abs, r2 * max_abs]
}

fn dot<T: Float>(u: [T; 3], v: [T; 3]) -> T {
    u[0] * v[0] + u[1] * v[1] + u[2] * v[2]
}

fn cross<T: Float>(u: [T; 3], v: [T; 3]) -> [T; 3] {
    [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ]
}

fn sym_mul<T: Float>(&[a00, a01, a02, a11, a12, a22]: &[T; 6], v: [T; 3]) -> [T; 3] {
    [
        a00 * v[0] + a01 * v[1] + a02 * v[2],
        a01 * v[0] + a11 * v[1] + a12 * v[2],
        a02 * v[0] + a12 * v[1] + a22 * v[2],
    ]
}

// unit eigenvector of a simple eigenvalue: the widest cross product of two rows of A - lambda I
fn isolated_eigenvector<T: Float>(&[a00, a01, a02, a11, a12, a22]: &[T; 6], lambda: T) -> Option<[T; 3]> {
    let rows = [
        [a00 - lambda, a01, a02],
        [a01, a11 - lambda, a12],
        [a02, a12, a22 - lambda],
    ];
    let (best, norm2) = [
        cross(rows[0], rows[1]),
        cross(rows[0], rows[2]),
        cross(rows[1], rows[2]),
    ]
    .into_iter()
    .map(|c| (c, dot(c, c)))
    .fold(([T::zero(); 3], T::zero()), |acc, c| if c.1 > acc.1 { c } else { acc });
    if !(norm2 > T::zero() && norm2.is_finite()) {
        return None;
    }
    let inv = norm2.sqrt().recip();
    Some(best.map(|c| c * inv))
}

// orthonormal basis of the plane orthogonal to the unit vector `v`
fn complement<T: Float>(v: [T; 3]) -> [[T; 3]; 2] {
    let u = if v[0].abs() > v[1].abs() {
        let inv = (v[0] * v[0] + v[2] * v[2]).sqrt().recip();
        [-v[2] * inv, T::zero(), v[0] * inv]
    } else {
        let inv = (v[1] * v[1] + v[2] * v[2]).sqrt().recip();
        [T::zero(), v[2] * inv, -v[1] * inv]
    };
    [u, cross(v, u)]
}

/// `acc[i] += other[i]`.
pub fn add_assign<T: Float + Send + Sync>(acc: &mut [T], other: &[T]) {
    acc.par_iter_mut()
        .zip(other.par_iter())
        .with_min_len(MIN_CHUNK)
        .for_each(|(a, &b)| *a = *a + b);
}

/// `acc[i] += other[i]^2`.
pub fn add_squared<T: Float + Send + Sync>(acc: &mut [T], other: &[T]) {
    acc.par_iter_mut()
        .zip(other.par_iter())
        .with_min_len(MIN_CHUNK)
        .for_each(|(a, &b)| *a = *a + b * b);
}

/// `acc[i] = sqrt(acc[i])`.
pub fn sqrt_in_place<T: Float + Send + Sync>(acc: &mut [T]) {
    acc.par_iter_mut()
        .with_min_len(MIN_CHUNK)
        .for_each(|a| *a = a.sqrt());
}

/// Pointwise product of two buffers.
pub fn mul<T: Float + Send + Sync>(a: &[T], b: &[T]) -> Vec<T> {
    a.par_iter()
        .zip(b.par_iter())
        .with_min_len(MIN_CHUNK)
        .map(|(&x, &y)| x * y)
        .collect()
}
