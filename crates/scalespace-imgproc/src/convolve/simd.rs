use std::fmt;

use num_traits::Float;

use crate::cpu::{self, SimdTier};
use crate::error::FilterError;
use crate::kernels::Symmetry;

/// Signature of a row routine: `(half coefficients, source, taps, output row)`.
pub type RowFn<T> = unsafe fn(&[T], &[T], &RowTaps, &mut [T]);

/// Floating point types the filter engine runs on.
pub trait FilterElement: Float + Default + fmt::Debug + Send + Sync + 'static {
    /// Converts an `f64` kernel coefficient to the element type.
    fn from_coefficient(value: f64) -> Self;

    /// Returns the row routine compiled for `tier` and `symmetry`.
    ///
    /// The routine may use instructions the host lacks; go through
    /// [`select_implementation`] to get one that is safe to run.
    fn row_fn(tier: SimdTier, symmetry: Symmetry) -> RowFn<Self>;
}

/// Start offsets, in the source slice, of the rows feeding one output row.
///
/// Output element `i` reads `src[center + i]` and, for every `k` in `1..=radius`, the pair
/// `src[plus[k - 1] + i]`, `src[minus[k - 1] + i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowTaps {
    center: usize,
    plus: Vec<usize>,
    minus: Vec<usize>,
    reach: usize,
}

impl RowTaps {
    /// Recomputes the taps of a kernel with the given radius from a map of kernel offset
    /// to source start offset.
    pub fn fill(&mut self, radius: usize, offset: impl Fn(isize) -> usize) {
        self.center = offset(0);
        self.plus.clear();
        self.minus.clear();
        for k in 1..=radius as isize {
            self.plus.push(offset(k));
            self.minus.push(offset(-k));
        }
        self.reach = self
            .plus
            .iter()
            .chain(self.minus.iter())
            .fold(self.center, |acc, &o| acc.max(o));
    }

    /// Number of taps on each side of the center.
    pub fn radius(&self) -> usize {
        self.plus.len()
    }
}

/// A row routine bound to the SIMD tier and kernel symmetry it was selected for.
#[derive(Clone, Copy)]
pub struct FirRowKernel<T> {
    tier: SimdTier,
    symmetry: Symmetry,
    func: RowFn<T>,
}

impl<T> fmt::Debug for FirRowKernel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirRowKernel")
            .field("tier", &self.tier)
            .field("symmetry", &self.symmetry)
            .finish()
    }
}

impl<T: FilterElement> FirRowKernel<T> {
    /// The tier the routine runs on.
    pub fn tier(&self) -> SimdTier {
        self.tier
    }

    /// The kernel symmetry the routine assumes.
    pub fn symmetry(&self) -> Symmetry {
        self.symmetry
    }

    /// Computes one output row.
    ///
    /// `coefs` holds the half kernel, center first.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::InvalidRowTaps`] if the taps do not match `coefs` or reach
    /// past the end of `src`.
    pub fn apply(
        &self,
        coefs: &[T],
        src: &[T],
        taps: &RowTaps,
        out: &mut [T],
    ) -> Result<(), FilterError> {
        let required = taps.reach + out.len();
        if coefs.len() != taps.radius() + 1 || required > src.len() {
            return Err(FilterError::InvalidRowTaps {
                taps: taps.radius() + 1,
                coefficients: coefs.len(),
                required,
                available: src.len(),
            });
        }
        // SAFETY: every row read lies inside `src` and the tier was checked against the
        // host when the kernel was selected.
        unsafe { (self.func)(coefs, src, taps, out) };
        Ok(())
    }
}

/// Picks the row routine for the widest tier usable on this host, not wider than
/// `max_tier`.
///
/// An unusable tier degrades to the next narrower one.
///
/// # Errors
///
/// Returns [`FilterError::ConfigurationFatal`] when no tier is usable at all.
pub fn select_implementation<T: FilterElement>(
    max_tier: SimdTier,
    symmetry: Symmetry,
) -> Result<FirRowKernel<T>, FilterError> {
    let tier = cpu::select_tier(Some(max_tier))?;
    Ok(FirRowKernel {
        tier,
        symmetry,
        func: T::row_fn(tier, symmetry),
    })
}

/// Computes `out[start..]` one element at a time.
///
/// With `FUSED` the multiply-add is a single rounding, matching the FMA vector lanes.
#[inline(always)]
unsafe fn row_span<T: Float, const SYMMETRIC: bool, const FUSED: bool>(
    coefs: &[T],
    src: &[T],
    taps: &RowTaps,
    out: &mut [T],
    start: usize,
) {
    for i in start..out.len() {
        let mut acc = *coefs.get_unchecked(0) * *src.get_unchecked(taps.center + i);
        for ((&h, &p), &m) in coefs[1..].iter().zip(&taps.plus).zip(&taps.minus) {
            let p = *src.get_unchecked(p + i);
            let m = *src.get_unchecked(m + i);
            let s = if SYMMETRIC { p + m } else { p - m };
            acc = if FUSED { h.mul_add(s, acc) } else { acc + h * s };
        }
        *out.get_unchecked_mut(i) = acc;
    }
}

unsafe fn row_scalar<T: Float, const SYMMETRIC: bool>(
    coefs: &[T],
    src: &[T],
    taps: &RowTaps,
    out: &mut [T],
) {
    row_span::<T, SYMMETRIC, false>(coefs, src, taps, out, 0)
}

#[cfg(target_arch = "x86_64")]
mod x86 {
    use std::arch::x86_64::*;

    use super::{row_span, RowTaps};

    #[inline]
    #[target_feature(enable = "avx")]
    unsafe fn madd_ps(acc: __m256, h: __m256, s: __m256) -> __m256 {
        _mm256_add_ps(acc, _mm256_mul_ps(h, s))
    }

    #[inline]
    #[target_feature(enable = "avx,fma")]
    unsafe fn fmadd_ps(acc: __m256, h: __m256, s: __m256) -> __m256 {
        _mm256_fmadd_ps(h, s, acc)
    }

    #[inline]
    #[target_feature(enable = "avx")]
    unsafe fn madd_pd(acc: __m256d, h: __m256d, s: __m256d) -> __m256d {
        _mm256_add_pd(acc, _mm256_mul_pd(h, s))
    }

    #[inline]
    #[target_feature(enable = "avx,fma")]
    unsafe fn fmadd_pd(acc: __m256d, h: __m256d, s: __m256d) -> __m256d {
        _mm256_fmadd_pd(h, s, acc)
    }

    macro_rules! avx_row {
        (
            $name:ident, $t:ty, $lanes:literal, $features:literal, $fused:literal,
            $set1:ident, $loadu:ident, $storeu:ident, $add:ident, $sub:ident, $mul:ident,
            $madd:ident
        ) => {
            #[target_feature(enable = $features)]
            pub(super) unsafe fn $name<const SYMMETRIC: bool>(
                coefs: &[$t],
                src: &[$t],
                taps: &RowTaps,
                out: &mut [$t],
            ) {
                let n = out.len();
                let base = src.as_ptr();
                let dst = out.as_mut_ptr();
                let h0 = $set1(*coefs.get_unchecked(0));
                let mut i = 0;
                while i + $lanes <= n {
                    let mut acc = $mul(h0, $loadu(base.add(taps.center + i)));
                    for ((&h, &p), &m) in coefs[1..].iter().zip(&taps.plus).zip(&taps.minus) {
                        let p = $loadu(base.add(p + i));
                        let m = $loadu(base.add(m + i));
                        let s = if SYMMETRIC { $add(p, m) } else { $sub(p, m) };
                        acc = $madd(acc, $set1(h), s);
                    }
                    $storeu(dst.add(i), acc);
                    i += $lanes;
                }
                row_span::<$t, SYMMETRIC, $fused>(coefs, src, taps, out, i);
            }
        };
    }

    avx_row!(
        avx_row_f32, f32, 8, "avx", false,
        _mm256_set1_ps, _mm256_loadu_ps, _mm256_storeu_ps, _mm256_add_ps, _mm256_sub_ps,
        _mm256_mul_ps, madd_ps
    );
    avx_row!(
        fma_row_f32, f32, 8, "avx,fma", true,
        _mm256_set1_ps, _mm256_loadu_ps, _mm256_storeu_ps, _mm256_add_ps, _mm256_sub_ps,
        _mm256_mul_ps, fmadd_ps
    );
    avx_row!(
        avx_row_f64, f64, 4, "avx", false,
        _mm256_set1_pd, _mm256_loadu_pd, _mm256_storeu_pd, _mm256_add_pd, _mm256_sub_pd,
        _mm256_mul_pd, madd_pd
    );
    avx_row!(
        fma_row_f64, f64, 4, "avx,fma", true,
        _mm256_set1_pd, _mm256_loadu_pd, _mm256_storeu_pd, _mm256_add_pd, _mm256_sub_pd,
        _mm256_mul_pd, fmadd_pd
    );
}

macro_rules! impl_filter_element {
    ($t:ty, $avx:ident, $fma:ident) => {
        impl FilterElement for $t {
            #[inline]
            fn from_coefficient(value: f64) -> Self {
                value as $t
            }

            fn row_fn(tier: SimdTier, symmetry: Symmetry) -> RowFn<Self> {
                match (tier, symmetry) {
                    #[cfg(target_arch = "x86_64")]
                    (SimdTier::AvxFma, Symmetry::Symmetric) => x86::$fma::<true>,
                    #[cfg(target_arch = "x86_64")]
                    (SimdTier::AvxFma, Symmetry::Antisymmetric) => x86::$fma::<false>,
                    #[cfg(target_arch = "x86_64")]
                    (SimdTier::Avx, Symmetry::Symmetric) => x86::$avx::<true>,
                    #[cfg(target_arch = "x86_64")]
                    (SimdTier::Avx, Symmetry::Antisymmetric) => x86::$avx::<false>,
                    (_, Symmetry::Symmetric) => row_scalar::<$t, true>,
                    (_, Symmetry::Antisymmetric) => row_scalar::<$t, false>,
                }
            }
        }
    };
}

impl_filter_element!(f32, avx_row_f32, fma_row_f32);
impl_filter_element!(f64, avx_row_f64, fma_row_f64);
