//! Explicitly constructed currency registry.
//!
//! Components that need to turn text into [`Currency`] values receive a
//! [`CurrencyRegistry`] by reference. A registry is populated through
//! [`CurrencyRegistryBuilder`] and is immutable once built, so tests can
//! construct exactly the registry they need without touching shared state.
//!
//! # Examples
//!
//! ```
//! use pricer_core::types::{Currency, CurrencyRegistryBuilder};
//!
//! let registry = CurrencyRegistryBuilder::new()
//!     .register(Currency::EUR)
//!     .register(Currency::USD)
//!     .alias("EURO", Currency::EUR)
//!     .unwrap()
//!     .build();
//!
//! assert_eq!(registry.parse("euro").unwrap(), Currency::EUR);
//! assert!(registry.parse("GBP").is_err());
//! ```

use std::collections::BTreeMap;

use super::currency::Currency;
use super::error::CurrencyError;

/// Mutable builder for a [`CurrencyRegistry`].
#[derive(Debug, Clone, Default)]
pub struct CurrencyRegistryBuilder {
    entries: BTreeMap<String, Currency>,
}

impl CurrencyRegistryBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a currency under its ISO code.
    pub fn register(mut self, currency: Currency) -> Self {
        self.entries.insert(currency.code().to_string(), currency);
        self
    }

    /// Register every currency in [`Currency::ALL`].
    pub fn register_all(self) -> Self {
        Currency::ALL.iter().fold(self, |b, &c| b.register(c))
    }

    /// Register an additional spelling for a currency.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::ConflictingAlias`] if the alias (or code)
    /// already maps to a different currency.
    pub fn alias(mut self, alias: &str, currency: Currency) -> Result<Self, CurrencyError> {
        let key = alias.to_uppercase();
        if let Some(existing) = self.entries.get(&key) {
            if *existing != currency {
                return Err(CurrencyError::ConflictingAlias {
                    alias: key,
                    existing: existing.code().to_string(),
                });
            }
        }
        self.entries.insert(key, currency);
        Ok(self)
    }

    /// Freeze the builder into an immutable registry.
    pub fn build(self) -> CurrencyRegistry {
        CurrencyRegistry {
            entries: self.entries,
        }
    }
}

/// Immutable lookup table from currency codes and aliases to [`Currency`].
#[derive(Debug, Clone)]
pub struct CurrencyRegistry {
    entries: BTreeMap<String, Currency>,
}

impl CurrencyRegistry {
    /// Registry containing every ISO code in [`Currency::ALL`] and no aliases.
    pub fn standard() -> Self {
        CurrencyRegistryBuilder::new().register_all().build()
    }

    /// Parse a code or alias (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::UnknownCurrency`] if the text is not registered.
    pub fn parse(&self, code: &str) -> Result<Currency, CurrencyError> {
        self.entries
            .get(&code.trim().to_uppercase())
            .copied()
            .ok_or_else(|| CurrencyError::UnknownCurrency(code.to_string()))
    }

    /// Parse a six-letter pair such as `"USDEUR"` into `(foreign, domestic)`.
    ///
    /// # Errors
    ///
    /// Returns [`CurrencyError::InvalidPair`] if the text is not six ASCII
    /// letters, or [`CurrencyError::UnknownCurrency`] for an unregistered leg.
    pub fn parse_pair(&self, pair: &str) -> Result<(Currency, Currency), CurrencyError> {
        let pair = pair.trim();
        if pair.len() != 6 || !pair.is_ascii() {
            return Err(CurrencyError::InvalidPair(pair.to_string()));
        }
        let (foreign, domestic) = pair.split_at(3);
        Ok((self.parse(foreign)?, self.parse(domestic)?))
    }

    /// Whether the code or alias is registered.
    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(&code.trim().to_uppercase())
    }

    /// Distinct registered currencies in ascending order.
    pub fn currencies(&self) -> Vec<Currency> {
        let mut out: Vec<Currency> = self.entries.values().copied().collect();
        out.sort();
        out.dedup();
        out
    }
}
