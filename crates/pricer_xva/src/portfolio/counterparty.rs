//! Counterparty credit references.
//!
//! A counterparty carries no credit parameters itself: it names the default
//! curve in the market and, optionally, a reference security whose
//! recovery quote takes precedence over the curve-level recovery.

use pricer_core::market_data::RecoverySource;

use super::ids::CounterpartyId;

/// Counterparty with its market credit references.
///
/// # Examples
///
/// ```
/// use pricer_core::market_data::RecoverySource;
/// use pricer_xva::portfolio::{Counterparty, CounterpartyId};
///
/// let cp = Counterparty::new(CounterpartyId::new("CPTY_A"), "CPTY_A_SNRFOR")
///     .with_security_id("CPTY_A_BOND_2030");
///
/// assert_eq!(cp.default_curve(), "CPTY_A_SNRFOR");
/// assert_eq!(
///     cp.recovery_chain()[0],
///     RecoverySource::Security("CPTY_A_BOND_2030".to_string())
/// );
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Counterparty {
    id: CounterpartyId,
    default_curve: String,
    security_id: Option<String>,
}

impl Counterparty {
    /// Creates a counterparty referencing a default curve by name.
    pub fn new(id: CounterpartyId, default_curve: impl Into<String>) -> Self {
        Self {
            id,
            default_curve: default_curve.into(),
            security_id: None,
        }
    }

    /// Sets the reference security for recovery lookups.
    pub fn with_security_id(mut self, security_id: impl Into<String>) -> Self {
        self.security_id = Some(security_id.into());
        self
    }

    /// Counterparty identifier.
    #[inline]
    pub fn id(&self) -> &CounterpartyId {
        &self.id
    }

    /// Market name of the default curve.
    #[inline]
    pub fn default_curve(&self) -> &str {
        &self.default_curve
    }

    /// Reference security, if any.
    #[inline]
    pub fn security_id(&self) -> Option<&str> {
        self.security_id.as_deref()
    }

    /// Ordered recovery rate candidates: the security quote, then the
    /// credit curve recovery.
    pub fn recovery_chain(&self) -> Vec<RecoverySource> {
        let mut chain = Vec::with_capacity(2);
        if let Some(security) = &self.security_id {
            chain.push(RecoverySource::Security(security.clone()));
        }
        chain.push(RecoverySource::CreditCurve(self.default_curve.clone()));
        chain
    }
}
