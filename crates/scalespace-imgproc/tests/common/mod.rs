#![allow(dead_code)]

use rand::{rngs::StdRng, Rng, SeedableRng};
use scalespace_imgproc::kernels::{gaussian_kernel_1d, Kernel1D, WindowPolicy};

pub fn random_data(numel: usize, seed: u64) -> Vec<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..numel).map(|_| rng.random_range(0.0..1.0)).collect()
}

// whole-sample symmetric reflection, independent of the engine's index map
pub fn reflect(mut index: isize, len: usize) -> usize {
    let n = len as isize;
    if n == 1 {
        return 0;
    }
    loop {
        if index < 0 {
            index = -index;
        } else if index >= n {
            index = 2 * (n - 1) - index;
        } else {
            return index as usize;
        }
    }
}

/// Direct f64 convolution with one kernel per axis: `out[i] = sum_j K(j) in[i - j]`.
pub fn reference_convolve(data: &[f64], shape: &[usize], kernels: &[&Kernel1D]) -> Vec<f64> {
    assert_eq!(shape.len(), kernels.len());
    let mut current = data.to_vec();
    for (axis, kernel) in kernels.iter().enumerate() {
        let n = shape[axis];
        let stride: usize = shape[axis + 1..].iter().product();
        let radius = kernel.radius() as isize;
        let coefs = kernel.coefficients();
        let next: Vec<f64> = (0..current.len())
            .map(|idx| {
                let coord = (idx / stride) % n;
                let base = idx - coord * stride;
                (-radius..=radius)
                    .map(|j| {
                        let k = coefs[(j + radius) as usize];
                        k * current[base + reflect(coord as isize - j, n) * stride]
                    })
                    .sum()
            })
            .collect();
        current = next;
    }
    current
}

fn kernel(order: u32, sigma: f64, window: WindowPolicy) -> Kernel1D {
    gaussian_kernel_1d(order, sigma, window).expect("valid kernel")
}

// `special` on the listed axes, smoothing on the others
fn mixed(
    data: &[f64],
    shape: &[usize],
    special: &Kernel1D,
    axes: &[usize],
    smooth: &Kernel1D,
) -> Vec<f64> {
    let kernels: Vec<&Kernel1D> = (0..shape.len())
        .map(|a| if axes.contains(&a) { special } else { smooth })
        .collect();
    reference_convolve(data, shape, &kernels)
}

pub fn reference_gradient(data: &[f64], shape: &[usize], sigma: f64, window: WindowPolicy) -> Vec<Vec<f64>> {
    let smooth = kernel(0, sigma, window);
    let deriv = kernel(1, sigma, window);
    (0..shape.len())
        .map(|axis| mixed(data, shape, &deriv, &[axis], &smooth))
        .collect()
}

pub fn reference_gradient_magnitude(
    data: &[f64],
    shape: &[usize],
    sigma: f64,
    window: WindowPolicy,
) -> Vec<f64> {
    let partials = reference_gradient(data, shape, sigma, window);
    (0..data.len())
        .map(|i| partials.iter().map(|p| p[i] * p[i]).sum::<f64>().sqrt())
        .collect()
}

pub fn reference_laplacian(data: &[f64], shape: &[usize], sigma: f64, window: WindowPolicy) -> Vec<f64> {
    let smooth = kernel(0, sigma, window);
    let second = kernel(2, sigma, window);
    let partials: Vec<Vec<f64>> = (0..shape.len())
        .map(|axis| mixed(data, shape, &second, &[axis], &smooth))
        .collect();
    (0..data.len())
        .map(|i| partials.iter().map(|p| p[i]).sum())
        .collect()
}

/// Upper-triangular Hessian components, `[h00, h01, h11]` or `[h00, h01, h02, h11, h12, h22]`.
pub fn reference_hessian(data: &[f64], shape: &[usize], sigma: f64, window: WindowPolicy) -> Vec<Vec<f64>> {
    let smooth = kernel(0, sigma, window);
    let first = kernel(1, sigma, window);
    let second = kernel(2, sigma, window);
    let mut out = Vec::new();
    for i in 0..shape.len() {
        for j in i..shape.len() {
            if i == j {
                out.push(mixed(data, shape, &second, &[i], &smooth));
            } else {
                out.push(mixed(data, shape, &first, &[i, j], &smooth));
            }
        }
    }
    out
}

pub fn reference_structure_tensor(
    data: &[f64],
    shape: &[usize],
    inner: f64,
    outer: f64,
    window: WindowPolicy,
) -> Vec<Vec<f64>> {
    let gradient = reference_gradient(data, shape, inner, window);
    let outer_kernel = kernel(0, outer, window);
    let kernels = vec![&outer_kernel; shape.len()];
    let mut out = Vec::new();
    for i in 0..shape.len() {
        for j in i..shape.len() {
            let product: Vec<f64> = gradient[i]
                .iter()
                .zip(gradient[j].iter())
                .map(|(a, b)| a * b)
                .collect();
            out.push(reference_convolve(&product, shape, &kernels));
        }
    }
    out
}

pub fn quadratic_eigenvalues([xx, xy, yy]: [f64; 3]) -> [f64; 2] {
    let trace = xx + yy;
    let det = xx * yy - xy * xy;
    let disc = (trace * trace / 4.0 - det).max(0.0).sqrt();
    [trace / 2.0 + disc, trace / 2.0 - disc]
}

/// Cyclic Jacobi rotations on the upper triangle `[a00, a01, a02, a11, a12, a22]`.
pub fn jacobi_eigenvalues([a00, a01, a02, a11, a12, a22]: [f64; 6]) -> [f64; 3] {
    let mut a = [[a00, a01, a02], [a01, a11, a12], [a02, a12, a22]];
    for _ in 0..64 {
        let (mut p, mut q, mut largest) = (0, 1, 0.0f64);
        for i in 0..3 {
            for j in i + 1..3 {
                if a[i][j].abs() > largest {
                    largest = a[i][j].abs();
                    p = i;
                    q = j;
                }
            }
        }
        if largest == 0.0 {
            break;
        }
        let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
        let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
        let c = 1.0 / (t * t + 1.0).sqrt();
        let s = t * c;
        for row in a.iter_mut() {
            let (kp, kq) = (row[p], row[q]);
            row[p] = c * kp - s * kq;
            row[q] = s * kp + c * kq;
        }
        for k in 0..3 {
            let (pk, qk) = (a[p][k], a[q][k]);
            a[p][k] = c * pk - s * qk;
            a[q][k] = s * pk + c * qk;
        }
    }
    let mut ev = [a[0][0], a[1][1], a[2][2]];
    ev.sort_by(|x, y| y.total_cmp(x));
    ev
}

/// Per-point eigenvalues from upper-triangular component planes, largest first.
pub fn reference_eigenvalues(components: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let numel = components[0].len();
    (0..numel)
        .map(|p| match components.len() {
            3 => quadratic_eigenvalues(std::array::from_fn(|c| components[c][p])).to_vec(),
            6 => jacobi_eigenvalues(std::array::from_fn(|c| components[c][p])).to_vec(),
            n => panic!("unexpected component count {n}"),
        })
        .collect()
}

/// Asserts `|actual - expected| <= tol * max(1, |expected|)` pointwise.
pub fn assert_close<T: Copy + Into<f64>>(actual: &[T], expected: &[f64], tol: f64, what: &str) {
    assert_eq!(actual.len(), expected.len(), "{what}: length");
    for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
        let a: f64 = (*a).into();
        let bound = tol * e.abs().max(1.0);
        assert!(
            (a - e).abs() <= bound,
            "{what}: element {i} is {a}, expected {e} (tolerance {bound})"
        );
    }
}

/// Mean of `|actual - expected|`.
pub fn mean_abs_error<T: Copy + Into<f64>>(actual: &[T], expected: &[f64]) -> f64 {
    assert_eq!(actual.len(), expected.len(), "length");
    let total: f64 = actual
        .iter()
        .zip(expected.iter())
        .map(|(a, e)| ((*a).into() - e).abs())
        .sum();
    total / expected.len().max(1) as f64
}
