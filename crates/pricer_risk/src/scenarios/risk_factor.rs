//! Risk factor identification for sensitivity and stress analysis.
//!
//! A [`RiskFactorKey`] names one shiftable point of the simulation market:
//! a curve pillar, a survival probability pillar or an FX spot. Keys are
//! totally ordered by `(key_type, name, index)` so that sets and maps of
//! keys iterate deterministically and keys of the same curve are adjacent.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Category of a risk factor.
///
/// Serialised by variant name, as used in configuration files.
///
/// # Examples
///
/// ```rust
/// use pricer_risk::scenarios::KeyType;
///
/// assert!(KeyType::DiscountCurve.is_par_type());
/// assert!(!KeyType::FxSpot.is_par_type());
/// assert_eq!(format!("{}", KeyType::SurvivalProbability), "SurvivalProbability");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KeyType {
    /// Discount curve pillar of a currency, stored as a discount factor.
    DiscountCurve,
    /// Named yield curve pillar, stored as a discount factor.
    YieldCurve,
    /// Forwarding curve pillar of an index, stored as a discount factor.
    IndexCurve,
    /// Default curve pillar, stored as a survival probability.
    SurvivalProbability,
    /// FX spot of a six-letter pair.
    FxSpot,
}

/// Group of par key types that are converted together in a stress test.
///
/// Rates curves calibrate against each other (index curves depend on the
/// discount curve), so a par shock to any of them holds the par rates of
/// all the others. Credit curves form their own group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ParFamily {
    /// Discount, yield and index curves
    InterestRate,
    /// Survival probability curves
    Credit,
}

impl KeyType {
    /// Types that can be expressed through calibrating par instruments.
    pub const PAR_TYPES: [KeyType; 4] = [
        KeyType::DiscountCurve,
        KeyType::YieldCurve,
        KeyType::IndexCurve,
        KeyType::SurvivalProbability,
    ];

    /// Whether par instruments exist for this type.
    #[inline]
    pub fn is_par_type(&self) -> bool {
        Self::PAR_TYPES.contains(self)
    }

    /// Par family of the type, `None` for types without par instruments.
    pub fn par_family(&self) -> Option<ParFamily> {
        match self {
            KeyType::DiscountCurve | KeyType::YieldCurve | KeyType::IndexCurve => {
                Some(ParFamily::InterestRate)
            }
            KeyType::SurvivalProbability => Some(ParFamily::Credit),
            KeyType::FxSpot => None,
        }
    }

    /// Whether the stored value is a discount factor or survival probability
    /// on a tenor grid.
    #[inline]
    pub fn is_curve(&self) -> bool {
        !matches!(self, KeyType::FxSpot)
    }

    /// Type name as displayed in keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::DiscountCurve => "DiscountCurve",
            KeyType::YieldCurve => "YieldCurve",
            KeyType::IndexCurve => "IndexCurve",
            KeyType::SurvivalProbability => "SurvivalProbability",
            KeyType::FxSpot => "FxSpot",
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unique identifier of a risk factor.
///
/// # Examples
///
/// ```rust
/// use pricer_risk::scenarios::{KeyType, RiskFactorKey};
///
/// let key = RiskFactorKey::new(KeyType::DiscountCurve, "EUR", 3);
/// assert_eq!(format!("{}", key), "DiscountCurve/EUR/3");
///
/// let earlier = RiskFactorKey::new(KeyType::DiscountCurve, "EUR", 2);
/// assert!(earlier < key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RiskFactorKey {
    /// Category
    pub key_type: KeyType,
    /// Currency, curve, credit or pair name
    pub name: String,
    /// Pillar index within the curve; zero for scalar factors
    pub index: usize,
}

impl RiskFactorKey {
    /// Creates a key.
    #[inline]
    pub fn new(key_type: KeyType, name: impl Into<String>, index: usize) -> Self {
        Self {
            key_type,
            name: name.into(),
            index,
        }
    }

    /// Discount curve pillar key.
    #[inline]
    pub fn discount(currency: impl Into<String>, index: usize) -> Self {
        Self::new(KeyType::DiscountCurve, currency, index)
    }

    /// Survival probability pillar key.
    #[inline]
    pub fn survival(name: impl Into<String>, index: usize) -> Self {
        Self::new(KeyType::SurvivalProbability, name, index)
    }

    /// Curve the key belongs to, `(key_type, name)`.
    #[inline]
    pub fn group(&self) -> (KeyType, &str) {
        (self.key_type, self.name.as_str())
    }
}

impl fmt::Display for RiskFactorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.key_type, self.name, self.index)
    }
}
