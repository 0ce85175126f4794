use std::fmt;
use std::sync::OnceLock;

use crate::error::FilterError;

/// SIMD instruction-set tiers the convolution inner loop can be specialized for.
///
/// Tiers are ordered from narrowest to widest, so `SimdTier::Avx < SimdTier::AvxFma`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdTier {
    /// Portable scalar code, always available.
    Baseline,
    /// 256-bit AVX vectors.
    Avx,
    /// 256-bit AVX vectors with fused multiply-add.
    AvxFma,
}

impl SimdTier {
    /// All tiers, narrowest first.
    pub const ALL: [SimdTier; 3] = [SimdTier::Baseline, SimdTier::Avx, SimdTier::AvxFma];

    /// Whether this build contains code for the tier.
    pub const fn is_compiled(self) -> bool {
        match self {
            SimdTier::Baseline => true,
            SimdTier::Avx | SimdTier::AvxFma => cfg!(target_arch = "x86_64"),
        }
    }

    /// Short lower-case name of the tier.
    pub const fn name(self) -> &'static str {
        match self {
            SimdTier::Baseline => "baseline",
            SimdTier::Avx => "avx",
            SimdTier::AvxFma => "avx+fma",
        }
    }

    fn is_supported_by_host(self) -> bool {
        match self {
            SimdTier::Baseline => true,
            #[cfg(target_arch = "x86_64")]
            SimdTier::Avx => is_x86_feature_detected!("avx"),
            #[cfg(target_arch = "x86_64")]
            SimdTier::AvxFma => is_x86_feature_detected!("avx") && is_x86_feature_detected!("fma"),
            #[cfg(not(target_arch = "x86_64"))]
            SimdTier::Avx | SimdTier::AvxFma => false,
        }
    }
}

impl fmt::Display for SimdTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The SIMD tiers usable in this process: compiled in and accepted by the CPU.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    tiers: Vec<SimdTier>,
}

impl CapabilitySet {
    fn probe() -> Self {
        let tiers = SimdTier::ALL
            .iter()
            .copied()
            .filter(|tier| tier.is_compiled() && tier.is_supported_by_host())
            .collect();
        Self { tiers }
    }

    /// Builds a set from an explicit list of tiers, sorted narrowest first.
    pub fn from_tiers(tiers: &[SimdTier]) -> Self {
        let mut tiers = tiers.to_vec();
        tiers.sort();
        tiers.dedup();
        Self { tiers }
    }

    /// The usable tiers, narrowest first.
    pub fn tiers(&self) -> &[SimdTier] {
        &self.tiers
    }

    /// Whether the tier is usable.
    pub fn contains(&self, tier: SimdTier) -> bool {
        self.tiers.contains(&tier)
    }

    /// The widest usable tier.
    pub fn best(&self) -> Option<SimdTier> {
        self.tiers.last().copied()
    }

    /// Picks the widest usable tier not wider than `max_tier`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::ConfigurationFatal`] when no tier qualifies.
    pub fn select(&self, max_tier: Option<SimdTier>) -> Result<SimdTier, FilterError> {
        self.tiers
            .iter()
            .rev()
            .copied()
            .find(|&tier| max_tier.map_or(true, |max| tier <= max))
            .ok_or_else(|| {
                FilterError::ConfigurationFatal(format!(
                    "no tier at or below {} among {:?}",
                    max_tier.map_or("any", SimdTier::name),
                    self.tiers
                ))
            })
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.tiers.iter().map(|t| t.name()).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

static CAPABILITIES: OnceLock<Result<CapabilitySet, FilterError>> = OnceLock::new();

/// Returns the process-wide capability set, probing the CPU on first use.
///
/// The probe runs exactly once; every later call returns the same object.
///
/// # Errors
///
/// Returns [`FilterError::ConfigurationFatal`] if not even the baseline tier is usable.
pub fn resolve() -> Result<&'static CapabilitySet, FilterError> {
    CAPABILITIES
        .get_or_init(|| {
            let set = CapabilitySet::probe();
            if set.tiers.is_empty() {
                log::error!("no SIMD tier is usable on this host");
                return Err(FilterError::ConfigurationFatal(
                    "no compiled tier is supported by this CPU".to_string(),
                ));
            }
            log::debug!("resolved CPU capabilities: {set}");
            Ok(set)
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// Returns the widest tier usable in this process, capped at `max_tier` if given.
pub fn select_tier(max_tier: Option<SimdTier>) -> Result<SimdTier, FilterError> {
    resolve()?.select(max_tier)
}
