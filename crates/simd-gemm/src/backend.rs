use crate::simd::{kernel_table, SimdLevel};

/// Kind of kernels the process is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Plain scalar kernels.
    Portable,
    /// SIMD-accelerated (SSE2, AVX, AVX2, AVX-512, NEON).
    Simd,
}

impl Backend {
    /// Backend of the bound kernel table.
    pub fn current() -> Self {
        match kernel_table().level {
            SimdLevel::Scalar => Backend::Portable,
            _ => Backend::Simd,
        }
    }

    /// Human-readable description of the bound kernels.
    pub fn description() -> String {
        let table = kernel_table();
        let isa = match table.level {
            SimdLevel::Scalar => "Portable (no SIMD)",
            SimdLevel::Sse2 => "x86-64 SSE2 (128-bit)",
            SimdLevel::Avx => "x86-64 AVX (256-bit)",
            SimdLevel::Avx2 => "x86-64 AVX2 + FMA (256-bit)",
            SimdLevel::Avx512 => "x86-64 AVX-512 (512-bit)",
            SimdLevel::Neon => "ARM NEON (128-bit)",
        };
        format!("{isa}, {} f32 lanes, {} registers", table.lanes, table.registers)
    }
}

/// Library version, bound backend and cache configuration.
pub fn version_info() -> String {
    let cache = crate::config::cache_sizes();
    format!(
        "simd-gemm v{}\nBackend: {}\nSIMD Level: {}\nDetected: {}\nCaches: L1 {} / L2 {} / L3 {} bytes",
        env!("CARGO_PKG_VERSION"),
        Backend::description(),
        kernel_table().level,
        crate::simd::detected_level(),
        cache.l1,
        cache.l2,
        cache.l3
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        let backend = Backend::current();
        println!("Current backend: {:?}", backend);
        println!("Version info:\n{}", version_info());

        assert_eq!(
            backend == Backend::Portable,
            kernel_table().level == SimdLevel::Scalar
        );
    }

    #[test]
    fn test_backend_description_not_empty() {
        let desc = Backend::description();
        assert!(
            desc.contains("Portable")
                || desc.contains("SSE2")
                || desc.contains("AVX")
                || desc.contains("NEON")
        );
        assert!(desc.contains("lanes"));
    }

    #[test]
    fn test_version_info_format() {
        let info = version_info();
        assert!(info.contains("simd-gemm v"));
        assert!(info.contains("Backend:"));
        assert!(info.contains("SIMD Level:"));
        assert!(info.contains("Caches:"));
    }
}
