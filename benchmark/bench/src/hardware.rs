use lamina_base::{IsaVariant, RUNTIME_HW_CONFIG};
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "x86_64")]
#[derive(Debug, Serialize, Deserialize)]
pub struct HWConfig {
    pub sse: bool,
    pub sse2: bool,
    pub avx: bool,
    pub avx2: bool,
    pub fma: bool,
    pub avx512f: bool,
    pub family_id: u8,
    pub model_id: u8,
    pub detected_isa: String,
    pub active_isa: String,
}

#[cfg(not(target_arch = "x86_64"))]
#[derive(Debug, Serialize, Deserialize)]
pub struct HWConfig {
    pub detected_isa: String,
    pub active_isa: String,
}

pub fn detect_hw_config() -> HWConfig {
    let hw = &*RUNTIME_HW_CONFIG;
    #[cfg(target_arch = "x86_64")]
    {
        let ft = hw.cpu_ft;
        HWConfig {
            sse: ft.sse,
            sse2: ft.sse2,
            avx: ft.avx,
            avx2: ft.avx2,
            fma: ft.fma,
            avx512f: ft.avx512f,
            family_id: hw.family_id,
            model_id: hw.model_id,
            detected_isa: hw.detected.to_string(),
            active_isa: hw.active.to_string(),
        }
    }
    #[cfg(not(target_arch = "x86_64"))]
    {
        HWConfig { detected_isa: hw.detected.to_string(), active_isa: hw.active.to_string() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BenchmarkConfig {
    pub hw_config: HWConfig,
    pub os: String,
    pub arch: String,
    /// Variants the running cpu can execute.
    pub supported_isas: Vec<String>,
}

pub fn get_benchmark_config() -> BenchmarkConfig {
    let hw_config = detect_hw_config();
    let os = std::env::consts::OS.to_string();
    let arch = std::env::consts::ARCH.to_string();
    let supported_isas = IsaVariant::ALL
        .into_iter()
        .filter(|isa| isa.is_supported(&RUNTIME_HW_CONFIG.cpu_ft))
        .map(|isa| isa.to_string())
        .collect();
    BenchmarkConfig { hw_config, os, arch, supported_isas }
}
