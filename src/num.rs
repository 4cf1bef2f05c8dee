//! Numerical helpers: a cheaply ordered float and double-double arithmetic.

use std::cmp::Ordering;
use std::hash::Hash;

/// A wrapper for `f64` that implements `Ord`.
///
/// This just panics when comparing NaNs -- it doesn't order them, nor does
/// it guard against them on construction. Everything that reaches the kernel
/// has been checked for finiteness, so that's fine.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CheapOrderedFloat(f64);

impl Hash for CheapOrderedFloat {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        // Adding zero turns -0.0 into 0.0, which keeps `Hash` consistent with `Eq`.
        (self.0 + 0.0).to_bits().hash(state)
    }
}

impl Eq for CheapOrderedFloat {}

impl PartialOrd for CheapOrderedFloat {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CheapOrderedFloat {
    #[inline(always)]
    fn cmp(&self, other: &Self) -> Ordering {
        if self.0 < other.0 {
            Ordering::Less
        } else if self.0 > other.0 {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    }
}

impl From<f64> for CheapOrderedFloat {
    fn from(value: f64) -> Self {
        CheapOrderedFloat(value)
    }
}

/// An unevaluated sum `hi + lo` of two doubles, with `|lo| <= ulp(hi) / 2`.
///
/// This gives us about 106 bits of mantissa, which is plenty for the signs
/// of the small determinants that our predicates need. Differences of two
/// doubles are exact in this representation; products of two doubles are
/// exact as well (thanks to fused multiply-add).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DoubleDouble {
    /// The leading part.
    pub hi: f64,
    /// The trailing correction.
    pub lo: f64,
}

#[inline]
fn two_sum(a: f64, b: f64) -> DoubleDouble {
    let s = a + b;
    let bb = s - a;
    let err = (a - (s - bb)) + (b - bb);
    DoubleDouble { hi: s, lo: err }
}

#[inline]
fn quick_two_sum(a: f64, b: f64) -> DoubleDouble {
    let s = a + b;
    let err = b - (s - a);
    DoubleDouble { hi: s, lo: err }
}

#[inline]
fn two_prod(a: f64, b: f64) -> DoubleDouble {
    let p = a * b;
    let err = a.mul_add(b, -p);
    DoubleDouble { hi: p, lo: err }
}

impl DoubleDouble {
    #[cfg(test)]
    /// Zero.
    pub const ZERO: DoubleDouble = DoubleDouble { hi: 0.0, lo: 0.0 };

    /// The exact difference `a - b`.
    pub fn diff(a: f64, b: f64) -> Self {
        two_sum(a, -b)
    }

    #[cfg(test)]
    /// The exact product `a * b`.
    pub fn prod(a: f64, b: f64) -> Self {
        two_prod(a, b)
    }

    /// The sign of this number.
    pub fn signum(&self) -> Ordering {
        // `hi` dominates `lo`, unless `hi` is zero.
        let x = if self.hi != 0.0 { self.hi } else { self.lo };
        CheapOrderedFloat(x).cmp(&CheapOrderedFloat(0.0))
    }

    #[cfg(test)]
    /// An approximation of this number as a single `f64`.
    pub fn to_f64(self) -> f64 {
        self.hi + self.lo
    }
}

impl From<f64> for DoubleDouble {
    fn from(x: f64) -> Self {
        DoubleDouble { hi: x, lo: 0.0 }
    }
}

impl std::ops::Add for DoubleDouble {
    type Output = DoubleDouble;

    fn add(self, rhs: DoubleDouble) -> DoubleDouble {
        let s = two_sum(self.hi, rhs.hi);
        let t = two_sum(self.lo, rhs.lo);
        let s = quick_two_sum(s.hi, s.lo + t.hi);
        quick_two_sum(s.hi, s.lo + t.lo)
    }
}

impl std::ops::Neg for DoubleDouble {
    type Output = DoubleDouble;

    fn neg(self) -> DoubleDouble {
        DoubleDouble {
            hi: -self.hi,
            lo: -self.lo,
        }
    }
}

impl std::ops::Sub for DoubleDouble {
    type Output = DoubleDouble;

    fn sub(self, rhs: DoubleDouble) -> DoubleDouble {
        self + (-rhs)
    }
}

impl std::ops::Mul for DoubleDouble {
    type Output = DoubleDouble;

    fn mul(self, rhs: DoubleDouble) -> DoubleDouble {
        let p = two_prod(self.hi, rhs.hi);
        let cross = self.hi * rhs.lo + self.lo * rhs.hi;
        quick_two_sum(p.hi, p.lo + cross)
    }
}
