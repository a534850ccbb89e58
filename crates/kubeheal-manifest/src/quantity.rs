//! Resource quantities
//!
//! Only the narrow forms the healer edits are understood:
//! memory `<digits>(Mi|Gi|M|G)` and cpu `<digits>[m]`. Anything else fails
//! to parse and the caller leaves the field alone.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Memory unit suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUnit {
    /// Mebibytes
    Mi,
    /// Gibibytes
    Gi,
    /// Megabytes
    M,
    /// Gigabytes
    G,
}

impl MemoryUnit {
    // Longest suffix first so "Mi" is not read as "M" + garbage.
    const SUFFIXES: [(&'static str, MemoryUnit); 4] = [
        ("Mi", MemoryUnit::Mi),
        ("Gi", MemoryUnit::Gi),
        ("M", MemoryUnit::M),
        ("G", MemoryUnit::G),
    ];

    /// Bytes per unit
    #[inline]
    #[must_use]
    pub fn bytes(self) -> u128 {
        match self {
            MemoryUnit::Mi => 1 << 20,
            MemoryUnit::Gi => 1 << 30,
            MemoryUnit::M => 1_000_000,
            MemoryUnit::G => 1_000_000_000,
        }
    }

    /// Suffix text
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MemoryUnit::Mi => "Mi",
            MemoryUnit::Gi => "Gi",
            MemoryUnit::M => "M",
            MemoryUnit::G => "G",
        }
    }
}

/// Error for text that is not a supported quantity
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported quantity: '{0}'")]
pub struct QuantityError(pub String);

/// Memory quantity such as `512Mi`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryQuantity {
    /// Numeric part
    pub value: u64,
    /// Unit suffix
    pub unit: MemoryUnit,
}

impl MemoryQuantity {
    /// Floor applied when reducing memory requests
    pub const REDUCTION_FLOOR: MemoryQuantity = MemoryQuantity {
        value: 256,
        unit: MemoryUnit::Mi,
    };

    /// Create quantity
    #[inline]
    #[must_use]
    pub const fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    /// Absolute size in bytes
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> u128 {
        u128::from(self.value) * self.unit.bytes()
    }

    /// Multiply the numeric part, keeping the unit
    #[must_use]
    pub fn scaled(&self, factor: u64) -> Option<Self> {
        self.value.checked_mul(factor).map(|value| Self::new(value, self.unit))
    }

    /// Halve the size; odd `Gi`/`G` values step down to `Mi`/`M`
    #[must_use]
    pub fn halved(&self) -> Self {
        match self.unit {
            MemoryUnit::Gi if self.value % 2 == 1 => {
                Self::new(self.value.saturating_mul(512), MemoryUnit::Mi)
            }
            MemoryUnit::G if self.value % 2 == 1 => {
                Self::new(self.value.saturating_mul(500), MemoryUnit::M)
            }
            unit => Self::new(self.value / 2, unit),
        }
    }

    /// Larger of `self` and `floor` by absolute size
    #[must_use]
    pub fn at_least(self, floor: Self) -> Self {
        match self.bytes().cmp(&floor.bytes()) {
            Ordering::Less => floor,
            Ordering::Equal | Ordering::Greater => self,
        }
    }
}

impl FromStr for MemoryQuantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MemoryUnit::SUFFIXES
            .iter()
            .find_map(|(suffix, unit)| {
                let digits = s.strip_suffix(suffix)?;
                parse_digits(digits).map(|value| Self::new(value, *unit))
            })
            .ok_or_else(|| QuantityError(s.to_string()))
    }
}

impl fmt::Display for MemoryQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_str())
    }
}

/// CPU quantity such as `500m` or `2`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CpuQuantity {
    /// Millicores (`500m`)
    Millis(u64),
    /// Whole cores (`2`)
    Cores(u64),
}

impl CpuQuantity {
    /// Floor applied when reducing cpu requests, in millicores
    pub const REDUCTION_FLOOR_MILLIS: u64 = 100;

    /// Absolute size in millicores
    #[inline]
    #[must_use]
    pub fn millicores(&self) -> u128 {
        match *self {
            CpuQuantity::Millis(m) => u128::from(m),
            CpuQuantity::Cores(c) => u128::from(c) * 1000,
        }
    }

    /// Halve, keeping whole cores when the result is exact
    #[must_use]
    pub fn halved(&self) -> Self {
        match *self {
            CpuQuantity::Millis(m) => CpuQuantity::Millis(m / 2),
            CpuQuantity::Cores(c) if c % 2 == 0 => CpuQuantity::Cores(c / 2),
            CpuQuantity::Cores(c) => CpuQuantity::Millis(c.saturating_mul(500)),
        }
    }

    /// `self`, or the floor in millicores when `self` is below it
    #[must_use]
    pub fn at_least_millis(self, floor: u64) -> Self {
        if self.millicores() < u128::from(floor) {
            CpuQuantity::Millis(floor)
        } else {
            self
        }
    }
}

impl FromStr for CpuQuantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = match s.strip_suffix('m') {
            Some(digits) => parse_digits(digits).map(CpuQuantity::Millis),
            None => parse_digits(s).map(CpuQuantity::Cores),
        };
        parsed.ok_or_else(|| QuantityError(s.to_string()))
    }
}

impl fmt::Display for CpuQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CpuQuantity::Millis(m) => write!(f, "{m}m"),
            CpuQuantity::Cores(c) => write!(f, "{c}"),
        }
    }
}

fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Double a memory quantity, keeping its unit
pub fn double_memory(text: &str) -> Result<String, QuantityError> {
    let quantity: MemoryQuantity = text.parse()?;
    quantity
        .scaled(2)
        .map(|q| q.to_string())
        .ok_or_else(|| QuantityError(text.to_string()))
}

/// Halve a memory quantity, never going below 256Mi
pub fn reduce_memory(text: &str) -> Result<String, QuantityError> {
    let quantity: MemoryQuantity = text.parse()?;
    Ok(quantity
        .halved()
        .at_least(MemoryQuantity::REDUCTION_FLOOR)
        .to_string())
}

/// Halve a cpu quantity, never going below 100m
pub fn reduce_cpu(text: &str) -> Result<String, QuantityError> {
    let quantity: CpuQuantity = text.parse()?;
    Ok(quantity
        .halved()
        .at_least_millis(CpuQuantity::REDUCTION_FLOOR_MILLIS)
        .to_string())
}
