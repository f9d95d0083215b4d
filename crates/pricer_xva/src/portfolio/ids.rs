//! Identifier types for portfolio entities.
//!
//! Trades, counterparties and netting sets are keyed by string identifiers
//! that double as NPV cube ids. The newtypes keep a trade id from being
//! passed where a netting set id is expected.

use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::new(s)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

entity_id!(
    /// Unique identifier for a trade.
    ///
    /// # Examples
    ///
    /// ```
    /// use pricer_xva::portfolio::TradeId;
    ///
    /// let id = TradeId::new("SWAP_001");
    /// assert_eq!(id.as_str(), "SWAP_001");
    /// ```
    TradeId
);

entity_id!(
    /// Unique identifier for a counterparty.
    CounterpartyId
);

entity_id!(
    /// Unique identifier for a netting set.
    NettingSetId
);

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_display_and_as_str() {
        let id = NettingSetId::new("CPTY_A_CSA");
        assert_eq!(id.as_str(), "CPTY_A_CSA");
        assert_eq!(format!("{}", id), "CPTY_A_CSA");
    }

    #[test]
    fn test_conversions() {
        let a: TradeId = "T1".into();
        let b: TradeId = String::from("T1").into();
        assert_eq!(a, b);
        assert_eq!(a.as_ref(), "T1");
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let mut ids = vec![
            CounterpartyId::new("CPTY_C"),
            CounterpartyId::new("CPTY_A"),
            CounterpartyId::new("CPTY_B"),
        ];
        ids.sort();
        assert_eq!(ids[0].as_str(), "CPTY_A");
        assert_eq!(ids[2].as_str(), "CPTY_C");
    }

    #[test]
    fn test_hash_membership() {
        let mut set = HashSet::new();
        set.insert(TradeId::new("T1"));
        assert!(set.contains(&TradeId::new("T1")));
        assert!(!set.contains(&TradeId::new("T2")));
    }
}
