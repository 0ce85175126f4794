use crate::error::FilterError;

/// Gaussian envelope value at the window edge that the default window stays below.
pub const DEFAULT_TAIL_TOLERANCE: f64 = 1e-4;

/// Largest kernel radius the factory will build.
pub const MAX_KERNEL_RADIUS: usize = 1 << 16;

/// Rule deriving the kernel radius from sigma.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum WindowPolicy {
    /// Truncate where the Gaussian envelope drops below [`DEFAULT_TAIL_TOLERANCE`].
    #[default]
    Default,
    /// Explicit window ratio `w`: `radius = ceil(w * sigma)`.
    Ratio(f64),
}

impl WindowPolicy {
    /// Builds a policy from a window ratio, where `0.0` selects the default window.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio == 0.0 {
            WindowPolicy::Default
        } else {
            WindowPolicy::Ratio(ratio)
        }
    }

    /// Computes the kernel radius for the given sigma.
    ///
    /// # Errors
    ///
    /// Fails for a non-positive or non-finite ratio, and when the radius would exceed
    /// [`MAX_KERNEL_RADIUS`].
    pub fn radius(&self, sigma: f64) -> Result<usize, FilterError> {
        let factor = match *self {
            WindowPolicy::Default => (-2.0 * DEFAULT_TAIL_TOLERANCE.ln()).sqrt(),
            WindowPolicy::Ratio(ratio) => {
                if !(ratio.is_finite() && ratio > 0.0) {
                    return Err(FilterError::InvalidWindowRatio(ratio));
                }
                ratio
            }
        };
        let radius = (factor * sigma).ceil();
        if !(radius <= MAX_KERNEL_RADIUS as f64) {
            return Err(FilterError::InvalidSigma(sigma));
        }
        Ok(radius as usize)
    }
}

/// Whether the kernel mirrors onto itself or onto its negation around the center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    /// `K(-x) == K(x)`, even derivative orders.
    Symmetric,
    /// `K(-x) == -K(x)`, odd derivative orders.
    Antisymmetric,
}

/// A sampled derivative-of-Gaussian FIR kernel.
///
/// Coefficients follow the convolution convention: `out[i] = sum_j K(j) * in[i - j]` for
/// `j` in `[-radius, radius]`, stored at `coefficients()[j + radius]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel1D {
    order: u32,
    sigma: f64,
    radius: usize,
    coefficients: Vec<f64>,
}

impl Kernel1D {
    /// Builds the kernel of the given derivative order. See [`gaussian_kernel_1d`].
    pub fn gaussian(order: u32, sigma: f64, window: WindowPolicy) -> Result<Self, FilterError> {
        gaussian_kernel_1d(order, sigma, window)
    }

    /// Derivative order, 0 to 2.
    pub fn order(&self) -> u32 {
        self.order
    }

    /// Scale the kernel was built for.
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Number of taps on each side of the center.
    pub fn radius(&self) -> usize {
        self.radius
    }

    /// Total number of taps, `2 * radius + 1`.
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    /// Always false, a kernel has at least its center tap.
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// All taps from offset `-radius` to `radius`.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Symmetry of the kernel, determined by the parity of the order.
    pub fn symmetry(&self) -> Symmetry {
        if self.order % 2 == 0 {
            Symmetry::Symmetric
        } else {
            Symmetry::Antisymmetric
        }
    }

    /// Center tap followed by the weight of the sample at `i + k`, for `k = 1..=radius`.
    ///
    /// The sample at `i - k` gets the same weight for symmetric kernels and its negation
    /// for antisymmetric ones.
    pub fn half_coefficients(&self) -> Vec<f64> {
        (0..=self.radius)
            .map(|k| self.coefficients[self.radius - k])
            .collect()
    }
}

/// Create a sampled Gaussian derivative kernel.
///
/// The Gaussian envelope `exp(-x^2 / (2 sigma^2))` is sampled at the integer offsets of the
/// window and normalized per order:
///
/// * order 0: unit sum.
/// * order 1: `sum K(x) * (-x) == 1`, so the kernel differentiates a unit ramp to 1.
/// * order 2: zero mean over the window, then `sum K(x) * x^2 / 2 == 1`.
///
/// Derivative kernels use a radius of at least 1. As sigma goes to zero they tend to the
/// central difference `[0.5, 0, -0.5]` and the second difference `[1, -2, 1]`.
///
/// # Arguments
///
/// * `order` - The derivative order, 0, 1 or 2.
/// * `sigma` - The scale of the Gaussian.
/// * `window` - The window policy deriving the radius from sigma.
///
/// # Errors
///
/// Invalid order, sigma or window ratio.
///
/// # Example
///
/// ```
/// use scalespace_imgproc::kernels::{gaussian_kernel_1d, WindowPolicy};
///
/// let kernel = gaussian_kernel_1d(0, 1.0, WindowPolicy::Ratio(3.0)).unwrap();
/// assert_eq!(kernel.radius(), 3);
/// assert!((kernel.coefficients().iter().sum::<f64>() - 1.0).abs() < 1e-12);
/// ```
pub fn gaussian_kernel_1d(
    order: u32,
    sigma: f64,
    window: WindowPolicy,
) -> Result<Kernel1D, FilterError> {
    if order > 2 {
        return Err(FilterError::InvalidDerivativeOrder(order));
    }
    if !(sigma.is_finite() && sigma > 0.0) {
        return Err(FilterError::InvalidSigma(sigma));
    }

    let mut radius = window.radius(sigma)?;
    if order > 0 {
        radius = radius.max(1);
    }

    let sigma2 = sigma * sigma;
    let offsets = || (-(radius as i64)..=radius as i64).map(|x| x as f64);
    let envelope = |x: f64| (-(x * x) / (2.0 * sigma2)).exp();

    // relative to e(1), so a vanishing envelope still leaves the central difference
    let envelope_from_one = |x: f64| (-(x * x - 1.0) / (2.0 * sigma2)).exp();

    let mut coefficients: Vec<f64> = match order {
        0 => offsets().map(envelope).collect(),
        1 => offsets()
            .map(|x| if x == 0.0 { 0.0 } else { -x * envelope_from_one(x) })
            .collect(),
        _ => offsets().map(|x| (x * x / sigma2 - 1.0) * envelope(x)).collect(),
    };

    if order == 2 {
        let dc = coefficients.iter().sum::<f64>() / coefficients.len() as f64;
        coefficients.iter_mut().for_each(|c| *c -= dc);
    }

    let norm = match order {
        0 => coefficients.iter().sum::<f64>(),
        1 => offsets().zip(coefficients.iter()).map(|(x, c)| -x * c).sum(),
        _ => offsets()
            .zip(coefficients.iter())
            .map(|(x, c)| x * x * c / 2.0)
            .sum(),
    };
    if !norm.is_normal() {
        return Err(FilterError::DegenerateKernel { order, sigma });
    }
    coefficients.iter_mut().for_each(|c| *c /= norm);

    log::trace!("gaussian kernel: order {order}, sigma {sigma}, radius {radius}");

    Ok(Kernel1D {
        order,
        sigma,
        radius,
        coefficients,
    })
}
