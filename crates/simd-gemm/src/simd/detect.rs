//! CPU feature detection for runtime SIMD dispatch.
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::GemmError;

/// Available SIMD instruction sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdLevel {
    /// No SIMD, use scalar code.
    Scalar,
    /// SSE2 (128-bit, available on all x86-64).
    Sse2,
    /// AVX (256-bit float, no FMA).
    Avx,
    /// AVX2 with FMA (256-bit).
    Avx2,
    /// AVX-512F (512-bit).
    Avx512,
    /// ARM NEON (128-bit, FMA).
    Neon,
}

impl SimdLevel {
    /// Every level, narrowest first.
    pub const ALL: [SimdLevel; 6] = [
        SimdLevel::Scalar,
        SimdLevel::Sse2,
        SimdLevel::Avx,
        SimdLevel::Avx2,
        SimdLevel::Avx512,
        SimdLevel::Neon,
    ];

    /// Detect the best available SIMD level at runtime.
    pub fn detect() -> Self {
        #[cfg(target_arch = "x86_64")]
        {
            for level in [SimdLevel::Avx512, SimdLevel::Avx2, SimdLevel::Avx] {
                if level.is_supported() {
                    return level;
                }
            }
            // SSE2 is always available on x86-64
            SimdLevel::Sse2
        }

        #[cfg(target_arch = "aarch64")]
        {
            // NEON is always available on AArch64
            SimdLevel::Neon
        }

        #[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
        {
            SimdLevel::Scalar
        }
    }

    /// Whether the running CPU can execute this level.
    pub fn is_supported(&self) -> bool {
        match self {
            SimdLevel::Scalar => true,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Sse2 => true,
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx => is_x86_feature_detected!("avx"),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx2 => is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma"),
            #[cfg(target_arch = "x86_64")]
            SimdLevel::Avx512 => {
                is_x86_feature_detected!("avx512f")
                    && is_x86_feature_detected!("avx2")
                    && is_x86_feature_detected!("fma")
            }
            #[cfg(target_arch = "aarch64")]
            SimdLevel::Neon => true,
            #[allow(unreachable_patterns)]
            _ => false,
        }
    }

    /// All levels the running CPU supports, narrowest first.
    pub fn supported_levels() -> Vec<SimdLevel> {
        Self::ALL.into_iter().filter(|l| l.is_supported()).collect()
    }

    /// The next narrower level in the capability chain.
    pub fn narrower(&self) -> SimdLevel {
        match self {
            SimdLevel::Scalar | SimdLevel::Sse2 | SimdLevel::Neon => SimdLevel::Scalar,
            SimdLevel::Avx => SimdLevel::Sse2,
            SimdLevel::Avx2 => SimdLevel::Avx,
            SimdLevel::Avx512 => SimdLevel::Avx2,
        }
    }

    /// Get the SIMD width in bytes.
    pub fn width_bytes(&self) -> usize {
        match self {
            SimdLevel::Scalar => 4,
            SimdLevel::Sse2 | SimdLevel::Neon => 16,
            SimdLevel::Avx | SimdLevel::Avx2 => 32,
            SimdLevel::Avx512 => 64,
        }
    }

    /// Get the number of f32 elements that fit in one SIMD register.
    pub fn f32_width(&self) -> usize {
        self.width_bytes() / 4
    }

    /// Number of architectural vector registers.
    pub fn registers(&self) -> usize {
        match self {
            SimdLevel::Avx512 | SimdLevel::Neon => 32,
            _ => 16,
        }
    }

    /// Whether accumulation uses fused multiply-add.
    pub fn has_fma(&self) -> bool {
        matches!(
            self,
            SimdLevel::Avx2 | SimdLevel::Avx512 | SimdLevel::Neon
        )
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            SimdLevel::Scalar => "scalar",
            SimdLevel::Sse2 => "sse2",
            SimdLevel::Avx => "avx",
            SimdLevel::Avx2 => "avx2",
            SimdLevel::Avx512 => "avx512",
            SimdLevel::Neon => "neon",
        }
    }
}

impl fmt::Display for SimdLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SimdLevel {
    type Err = GemmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.name() == wanted)
            .ok_or_else(|| GemmError::UnknownLevel(s.to_string()))
    }
}

/// Global cached SIMD level.
static SIMD_LEVEL: OnceLock<SimdLevel> = OnceLock::new();

/// Get the detected SIMD level (cached).
///
/// This is what the hardware offers; the level the kernels are bound to
/// may be lower when forced through configuration, see
/// [`crate::simd::kernel_table`].
pub fn detected_level() -> SimdLevel {
    *SIMD_LEVEL.get_or_init(SimdLevel::detect)
}
