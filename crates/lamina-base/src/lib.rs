//! Hardware configuration and shared plumbing for the lamina crates.
//!
//! The cpu is probed once per process; the resulting [`IsaVariant`] token is
//! immutable afterwards and decides which sgemm kernels run.

use once_cell::sync::Lazy;

mod error;
mod isa;
mod matrix;

pub use error::{GemmError, Result};
pub use isa::{resolve_isa, IsaVariant, ISA_ENV_VAR};
pub use matrix::{required_len, MatrixMut, MatrixRef, Transpose};

#[cfg(target_arch = "x86_64")]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub sse: bool,
    pub sse2: bool,
    pub avx: bool,
    pub avx2: bool,
    pub fma: bool,
    pub avx512f: bool,
}

#[cfg(not(target_arch = "x86_64"))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CpuFeatures {
    pub dummy: bool,
}

pub struct HwConfig {
    pub cpu_ft: CpuFeatures,
    /// Best variant the cpu supports.
    pub detected: IsaVariant,
    /// Variant in use, after applying [`ISA_ENV_VAR`].
    pub active: IsaVariant,
    pub family_id: u8,
    pub model_id: u8,
}

// cpuid reports what the silicon implements, the std macro additionally checks
// that the os saves the wider register state
#[cfg(target_arch = "x86_64")]
fn detect_cpu() -> (CpuFeatures, u8, u8) {
    let cpuid = raw_cpuid::CpuId::new();
    let Some(feature_info) = cpuid.get_feature_info() else {
        return (CpuFeatures::default(), 0, 0);
    };
    let (avx2, avx512f) = cpuid
        .get_extended_feature_info()
        .map_or((false, false), |info| (info.has_avx2(), info.has_avx512f()));
    let cpu_ft = CpuFeatures {
        sse: feature_info.has_sse() && is_x86_feature_detected!("sse"),
        sse2: feature_info.has_sse2() && is_x86_feature_detected!("sse2"),
        avx: feature_info.has_avx() && is_x86_feature_detected!("avx"),
        avx2: avx2 && is_x86_feature_detected!("avx2"),
        fma: feature_info.has_fma() && is_x86_feature_detected!("fma"),
        avx512f: avx512f && is_x86_feature_detected!("avx512f"),
    };
    (cpu_ft, feature_info.family_id(), feature_info.model_id())
}

#[cfg(not(target_arch = "x86_64"))]
fn detect_cpu() -> (CpuFeatures, u8, u8) {
    (CpuFeatures { dummy: false }, 0, 0)
}

fn detect_hw_config() -> HwConfig {
    let (cpu_ft, family_id, model_id) = detect_cpu();
    let detected = IsaVariant::best(&cpu_ft);
    let requested = std::env::var(ISA_ENV_VAR).ok();
    let active = resolve_isa(&cpu_ft, requested.as_deref());
    tracing::debug!(?cpu_ft, %detected, %active, family_id, model_id, "detected hardware config");
    HwConfig { cpu_ft, detected, active, family_id, model_id }
}

pub static RUNTIME_HW_CONFIG: Lazy<HwConfig> = Lazy::new(detect_hw_config);

/// Process-wide capability token. The first call probes the cpu; later calls
/// return the cached value.
#[inline]
pub fn detect_capability() -> IsaVariant {
    RUNTIME_HW_CONFIG.active
}

#[inline]
pub fn round_up(x: usize, m: usize) -> usize {
    x.div_ceil(m) * m
}
