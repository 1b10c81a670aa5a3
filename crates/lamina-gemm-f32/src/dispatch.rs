use lamina_base::{detect_capability, GemmError, IsaVariant, Result, RUNTIME_HW_CONFIG};
use once_cell::sync::Lazy;

use crate::baseline;
#[cfg(target_arch = "x86_64")]
use crate::x86_64_arch::{avx, avx512f, avx_fma};

/// Micro-kernel entry point: `(a, b_packed, c, k, m, n, lda, ldc, alpha,
/// zero_mode) -> rows handled`.
pub(crate) type KernelFn = unsafe fn(*const f32, *const f32, *mut f32, usize, usize, usize, usize, usize, f32, bool) -> usize;

/// Static description of the kernels of one isa variant.
pub struct KernelVariant {
    pub isa: IsaVariant,
    /// Row tiles the kernel can process, largest first.
    pub row_tiles: &'static [usize],
    pub vector_width: usize,
    /// Width of one packed B band, two vectors.
    pub band_width: usize,
    pub mc: usize,
    pub kc: usize,
    pub nc: usize,
    pub(crate) kernel: KernelFn,
}

impl KernelVariant {
    pub fn max_rows(&self) -> usize {
        self.row_tiles[0]
    }

    pub fn has_avx(&self) -> bool {
        self.isa >= IsaVariant::Avx
    }

    /// Table entry for `isa`, if this target has kernels for it at all.
    pub fn for_isa(isa: IsaVariant) -> Option<&'static KernelVariant> {
        VARIANTS.iter().copied().find(|v| v.isa == isa)
    }

    /// Entry for `isa` after checking that the running cpu can execute it.
    pub fn supported(isa: IsaVariant) -> Result<&'static KernelVariant> {
        if !isa.is_supported(&RUNTIME_HW_CONFIG.cpu_ft) {
            return Err(GemmError::UnsupportedIsa(isa));
        }
        Self::for_isa(isa).ok_or(GemmError::UnsupportedIsa(isa))
    }

    /// Entry selected by the process-wide capability token.
    pub fn active() -> &'static KernelVariant {
        *ACTIVE
    }
}

impl std::fmt::Debug for KernelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KernelVariant")
            .field("isa", &self.isa)
            .field("row_tiles", &self.row_tiles)
            .field("vector_width", &self.vector_width)
            .field("band_width", &self.band_width)
            .field("mc", &self.mc)
            .field("kc", &self.kc)
            .field("nc", &self.nc)
            .finish()
    }
}

// mc is a multiple of every max row tile, nc of every band width
const MC: usize = 120;
const KC: usize = 256;
const NC: usize = 128;

static BASELINE: KernelVariant = KernelVariant {
    isa: IsaVariant::Baseline,
    row_tiles: baseline::ROW_TILES,
    vector_width: baseline::BAND / 2,
    band_width: baseline::BAND,
    mc: MC,
    kc: KC,
    nc: NC,
    kernel: baseline::kernel,
};

#[cfg(target_arch = "x86_64")]
static AVX: KernelVariant = KernelVariant {
    isa: IsaVariant::Avx,
    row_tiles: avx::ROW_TILES,
    vector_width: avx::BAND / 2,
    band_width: avx::BAND,
    mc: MC,
    kc: KC,
    nc: NC,
    kernel: avx::kernel,
};

#[cfg(target_arch = "x86_64")]
static AVX2_FMA3: KernelVariant = KernelVariant {
    isa: IsaVariant::Avx2Fma3,
    row_tiles: avx_fma::ROW_TILES,
    vector_width: avx_fma::BAND / 2,
    band_width: avx_fma::BAND,
    mc: MC,
    kc: KC,
    nc: NC,
    kernel: avx_fma::kernel,
};

#[cfg(target_arch = "x86_64")]
static AVX512F: KernelVariant = KernelVariant {
    isa: IsaVariant::Avx512f,
    row_tiles: avx512f::ROW_TILES,
    vector_width: avx512f::BAND / 2,
    band_width: avx512f::BAND,
    mc: MC,
    kc: KC,
    nc: 2 * NC,
    kernel: avx512f::kernel,
};

static VARIANTS: &[&KernelVariant] = &[
    &BASELINE,
    #[cfg(target_arch = "x86_64")]
    &AVX,
    #[cfg(target_arch = "x86_64")]
    &AVX2_FMA3,
    #[cfg(target_arch = "x86_64")]
    &AVX512F,
];

static ACTIVE: Lazy<&'static KernelVariant> = Lazy::new(|| {
    let isa = detect_capability();
    let variant = KernelVariant::for_isa(isa).unwrap_or(&BASELINE);
    tracing::debug!(isa = %variant.isa, row_tiles = ?variant.row_tiles, band_width = variant.band_width, "selected sgemm kernels");
    variant
});
