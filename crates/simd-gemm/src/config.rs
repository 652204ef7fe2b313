//! Target cache configuration and environment overrides.
//!
//! Cache capacities are not probed at runtime. Each target has a fixed
//! default which can be overridden through the environment before the
//! first GEMM call:
//!
//! | Variable          | Meaning                                   |
//! |-------------------|-------------------------------------------|
//! | `SIMD_GEMM_L1`    | L1 data cache bytes (`32K`, `32768`, ...) |
//! | `SIMD_GEMM_L2`    | L2 cache bytes                            |
//! | `SIMD_GEMM_L3`    | L3 cache bytes                            |
//! | `SIMD_GEMM_LEVEL` | force a SIMD level the CPU supports       |

use std::sync::OnceLock;

use crate::error::{GemmError, Result};
use crate::simd::SimdLevel;

/// Environment variable holding the L1 size override.
pub const ENV_L1: &str = "SIMD_GEMM_L1";
/// Environment variable holding the L2 size override.
pub const ENV_L2: &str = "SIMD_GEMM_L2";
/// Environment variable holding the L3 size override.
pub const ENV_L3: &str = "SIMD_GEMM_L3";
/// Environment variable forcing a SIMD level.
pub const ENV_LEVEL: &str = "SIMD_GEMM_LEVEL";

/// Cache capacities in bytes used to size the blocking panels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSizes {
    pub l1: usize,
    pub l2: usize,
    pub l3: usize,
}

impl CacheSizes {
    pub const fn new(l1: usize, l2: usize, l3: usize) -> Self {
        Self { l1, l2, l3 }
    }

    /// Compiled-in defaults for the current target.
    pub const fn target_default() -> Self {
        #[cfg(target_arch = "aarch64")]
        {
            Self::new(16 * 1024, 512 * 1024, 2 * 1024 * 1024)
        }

        #[cfg(not(target_arch = "aarch64"))]
        {
            Self::new(32 * 1024, 256 * 1024, 2 * 1024 * 1024)
        }
    }

    /// Defaults with any `SIMD_GEMM_L*` overrides applied.
    pub fn from_env() -> Self {
        let mut sizes = Self::target_default();
        for (var, slot) in [
            (ENV_L1, &mut sizes.l1),
            (ENV_L2, &mut sizes.l2),
            (ENV_L3, &mut sizes.l3),
        ] {
            if let Ok(raw) = std::env::var(var) {
                match parse_size(&raw) {
                    Ok(bytes) => *slot = bytes,
                    Err(err) => log::warn!("ignoring {var}: {err}"),
                }
            }
        }
        sizes
    }
}

impl Default for CacheSizes {
    fn default() -> Self {
        Self::target_default()
    }
}

/// Parse a byte count such as `32768`, `32K` or `2M`.
pub fn parse_size(raw: &str) -> Result<usize> {
    let raw = raw.trim();
    let (digits, scale) = match raw.char_indices().last() {
        Some((i, 'k' | 'K')) => (&raw[..i], 1024),
        Some((i, 'm' | 'M')) => (&raw[..i], 1024 * 1024),
        _ => (raw, 1),
    };
    match digits.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value * scale),
        _ => Err(GemmError::InvalidConfig(raw.to_string())),
    }
}

/// Level requested through `SIMD_GEMM_LEVEL`, if any and if parsable.
pub fn level_override() -> Option<SimdLevel> {
    let raw = std::env::var(ENV_LEVEL).ok()?;
    match raw.parse::<SimdLevel>() {
        Ok(level) => Some(level),
        Err(err) => {
            log::warn!("ignoring {ENV_LEVEL}: {err}");
            None
        }
    }
}

static CACHE_SIZES: OnceLock<CacheSizes> = OnceLock::new();

/// Process-wide cache sizes, read from the environment on first use.
pub fn cache_sizes() -> &'static CacheSizes {
    CACHE_SIZES.get_or_init(CacheSizes::from_env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("32768").unwrap(), 32768);
        assert_eq!(parse_size("32K").unwrap(), 32 * 1024);
        assert_eq!(parse_size("32k").unwrap(), 32 * 1024);
        assert_eq!(parse_size(" 2M ").unwrap(), 2 * 1024 * 1024);
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!(parse_size("").is_err());
        assert!(parse_size("K").is_err());
        assert!(parse_size("0").is_err());
        assert!(parse_size("-5").is_err());
        assert!(parse_size("lots").is_err());
    }

    #[test]
    fn test_target_default() {
        let sizes = CacheSizes::default();
        assert!(sizes.l1 < sizes.l2);
        assert!(sizes.l2 <= sizes.l3);
        assert_eq!(sizes.l3, 2 * 1024 * 1024);
    }

    #[test]
    fn test_cache_sizes_cached() {
        let first = cache_sizes() as *const CacheSizes;
        let second = cache_sizes() as *const CacheSizes;
        assert_eq!(first, second);
    }
}
