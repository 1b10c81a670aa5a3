use core::fmt;
use core::str::FromStr;

use crate::{CpuFeatures, GemmError};

/// Environment variable used to force a kernel variant.
pub const ISA_ENV_VAR: &str = "LAMINA_SGEMM_ISA";

/// Capability token selecting which sgemm kernel variant may run on this cpu.
///
/// Variants are ordered by capability, so `isa >= IsaVariant::Avx` reads as
/// "at least avx".
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IsaVariant {
    Baseline,
    Avx,
    Avx2Fma3,
    Avx512f,
}

impl IsaVariant {
    pub const ALL: [IsaVariant; 4] = [IsaVariant::Baseline, IsaVariant::Avx, IsaVariant::Avx2Fma3, IsaVariant::Avx512f];

    pub fn name(self) -> &'static str {
        match self {
            IsaVariant::Baseline => "baseline",
            IsaVariant::Avx => "avx",
            IsaVariant::Avx2Fma3 => "avx2fma3",
            IsaVariant::Avx512f => "avx512f",
        }
    }

    /// Whether the kernels of this variant are legal to call given `cpu_ft`.
    #[cfg(target_arch = "x86_64")]
    pub fn is_supported(self, cpu_ft: &CpuFeatures) -> bool {
        match self {
            IsaVariant::Baseline => true,
            IsaVariant::Avx => cpu_ft.avx,
            IsaVariant::Avx2Fma3 => cpu_ft.avx && cpu_ft.avx2 && cpu_ft.fma,
            // the avx512 kernel packs with avx transposes, so require the full chain
            IsaVariant::Avx512f => cpu_ft.avx && cpu_ft.avx2 && cpu_ft.fma && cpu_ft.avx512f,
        }
    }

    #[cfg(not(target_arch = "x86_64"))]
    pub fn is_supported(self, _cpu_ft: &CpuFeatures) -> bool {
        self == IsaVariant::Baseline
    }

    /// Most capable variant supported by `cpu_ft`.
    pub fn best(cpu_ft: &CpuFeatures) -> Self {
        Self::ALL.into_iter().rev().find(|isa| isa.is_supported(cpu_ft)).unwrap_or(IsaVariant::Baseline)
    }
}

impl fmt::Display for IsaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IsaVariant {
    type Err = GemmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(IsaVariant::Baseline),
            "avx" => Ok(IsaVariant::Avx),
            "avx2fma3" => Ok(IsaVariant::Avx2Fma3),
            "avx512f" => Ok(IsaVariant::Avx512f),
            _ => Err(GemmError::UnknownIsa(s.to_string())),
        }
    }
}

/// Picks the active token from the detected features and an optional requested
/// variant (usually the value of [`ISA_ENV_VAR`]).
///
/// Requests that do not parse, or name a variant the cpu cannot run, are
/// reported with a warning and fall back to auto-detection.
pub fn resolve_isa(cpu_ft: &CpuFeatures, requested: Option<&str>) -> IsaVariant {
    let detected = IsaVariant::best(cpu_ft);
    let Some(requested) = requested else {
        return detected;
    };
    match requested.parse::<IsaVariant>() {
        Ok(isa) if isa.is_supported(cpu_ft) => isa,
        Ok(isa) => {
            tracing::warn!(requested = %isa, fallback = %detected, "{} requests an isa this cpu lacks", ISA_ENV_VAR);
            detected
        }
        Err(err) => {
            tracing::warn!(fallback = %detected, "ignoring {}: {}", ISA_ENV_VAR, err);
            detected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(target_arch = "x86_64")]
    fn features(avx: bool, avx2: bool, fma: bool, avx512f: bool) -> CpuFeatures {
        CpuFeatures { sse: true, sse2: true, avx, avx2, fma, avx512f }
    }

    #[test]
    fn parse_names() {
        for isa in IsaVariant::ALL {
            assert_eq!(isa.name().parse::<IsaVariant>().unwrap(), isa);
        }
        assert_eq!(" AVX2FMA3 ".parse::<IsaVariant>().unwrap(), IsaVariant::Avx2Fma3);
        assert!(matches!("sse4".parse::<IsaVariant>(), Err(GemmError::UnknownIsa(s)) if s == "sse4"));
        assert!("".parse::<IsaVariant>().is_err());
    }

    #[test]
    fn ordering_follows_capability() {
        assert!(IsaVariant::Baseline < IsaVariant::Avx);
        assert!(IsaVariant::Avx < IsaVariant::Avx2Fma3);
        assert!(IsaVariant::Avx2Fma3 < IsaVariant::Avx512f);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn best_variant() {
        assert_eq!(IsaVariant::best(&features(false, false, false, false)), IsaVariant::Baseline);
        assert_eq!(IsaVariant::best(&features(true, false, false, false)), IsaVariant::Avx);
        // fma without avx2 is not enough for the fma3 kernels
        assert_eq!(IsaVariant::best(&features(true, false, true, false)), IsaVariant::Avx);
        assert_eq!(IsaVariant::best(&features(true, true, true, false)), IsaVariant::Avx2Fma3);
        assert_eq!(IsaVariant::best(&features(true, true, true, true)), IsaVariant::Avx512f);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn resolve_override() {
        let ft = features(true, true, true, false);
        assert_eq!(resolve_isa(&ft, None), IsaVariant::Avx2Fma3);
        assert_eq!(resolve_isa(&ft, Some("baseline")), IsaVariant::Baseline);
        assert_eq!(resolve_isa(&ft, Some("avx")), IsaVariant::Avx);
        // unsupported and invalid requests fall back to detection
        assert_eq!(resolve_isa(&ft, Some("avx512f")), IsaVariant::Avx2Fma3);
        assert_eq!(resolve_isa(&ft, Some("neon")), IsaVariant::Avx2Fma3);
    }

    #[cfg(not(target_arch = "x86_64"))]
    #[test]
    fn resolve_override() {
        let ft = CpuFeatures { dummy: false };
        assert_eq!(resolve_isa(&ft, None), IsaVariant::Baseline);
        assert_eq!(resolve_isa(&ft, Some("avx")), IsaVariant::Baseline);
    }
}
