//! XVA calculation configuration.
//!
//! Loaded from TOML or assembled with `with_*` builders. Every field has a
//! default, so a configuration file only lists what differs:
//!
//! ```toml
//! base_currency = "EUR"
//! dva_name = "BANK"
//! fva_borrowing_curve = "BANK_EUR_BORROW"
//! fva_lending_curve = "BANK_EUR_LEND"
//! allocation_method = "RelativeXva"
//! ```

use std::path::Path;

use pricer_core::types::DayCountConvention;
use serde::{Deserialize, Serialize};

use super::error::XvaError;

/// Split of netting-set CVA and DVA back to the trades of the set.
///
/// Allocated trade values add up to the netting-set value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AllocationMethod {
    /// No allocation; allocated trade values are zero.
    #[default]
    None,
    /// Proportional to the stand-alone trade CVA (DVA) within the set.
    /// Falls back to an equal split when the stand-alone values sum to
    /// zero.
    RelativeXva,
}

/// Exposure cube slots and credit/funding curve names for
/// [`XvaCalculator`](super::XvaCalculator).
///
/// The default depth indices follow the layout written by
/// [`ExposureCalculator`](crate::exposure::ExposureCalculator): trade EPE in
/// slot 0 and ENE in slot 1; netting set EE in slot 0, EPE in slot 1 and
/// ENE in slot 2.
///
/// # Examples
///
/// ```
/// use pricer_xva::xva::XvaConfig;
///
/// let config = XvaConfig::from_toml_str(
///     r#"
///     base_currency = "EUR"
///     fva_borrowing_curve = "BANK_BORROW"
///     netting_set_epe_index = 0
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.netting_set_epe_index, 0);
/// assert_eq!(config.trade_ene_index, 1);
/// assert!(config.fva_enabled());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct XvaConfig {
    /// Currency whose discount curve is the risk-free (OIS) curve in the
    /// funding spread discount factors.
    pub base_currency: Option<String>,
    /// Own default curve name; DVA is skipped when absent.
    pub dva_name: Option<String>,
    /// Yield curve used for funding cost; FCA and MVA are skipped when absent.
    pub fva_borrowing_curve: Option<String>,
    /// Yield curve used for funding benefit; FBA is skipped when absent.
    pub fva_lending_curve: Option<String>,
    /// Trade cube slot holding EPE.
    pub trade_epe_index: usize,
    /// Trade cube slot holding ENE.
    pub trade_ene_index: usize,
    /// Netting set cube slot holding EPE.
    pub netting_set_epe_index: usize,
    /// Netting set cube slot holding ENE.
    pub netting_set_ene_index: usize,
    /// Fixed counterparty recovery replacing the market lookup.
    pub cva_recovery_override: Option<f64>,
    /// Fixed own recovery replacing the market lookup.
    pub dva_recovery_override: Option<f64>,
    /// Day count mapping cube dates to curve times from the as-of date.
    pub day_count: DayCountConvention,
    /// Compute XVA from the counterparty's side: the own name becomes the
    /// CVA name, each counterparty the DVA name, and EPE and ENE swap.
    pub flip_view: bool,
    /// Under flip view, the borrowing curve is the counterparty default
    /// curve name plus this postfix.
    pub flip_view_borrowing_curve_postfix: Option<String>,
    /// Under flip view, the lending curve is the counterparty default curve
    /// name plus this postfix.
    pub flip_view_lending_curve_postfix: Option<String>,
    /// Netting set to trade allocation of CVA and DVA.
    pub allocation_method: AllocationMethod,
}

impl Default for XvaConfig {
    fn default() -> Self {
        Self {
            base_currency: None,
            dva_name: None,
            fva_borrowing_curve: None,
            fva_lending_curve: None,
            trade_epe_index: 0,
            trade_ene_index: 1,
            netting_set_epe_index: 1,
            netting_set_ene_index: 2,
            cva_recovery_override: None,
            dva_recovery_override: None,
            day_count: DayCountConvention::Act365Fixed,
            flip_view: false,
            flip_view_borrowing_curve_postfix: None,
            flip_view_lending_curve_postfix: None,
            allocation_method: AllocationMethod::None,
        }
    }
}

impl XvaConfig {
    /// Default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// [`XvaError::ConfigParse`] for malformed TOML or unknown keys,
    /// otherwise the errors of [`validate`](Self::validate).
    pub fn from_toml_str(s: &str) -> Result<Self, XvaError> {
        let config: XvaConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, XvaError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            XvaError::ConfigParse(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Sets the base currency of the OIS curve.
    pub fn with_base_currency(mut self, currency: impl Into<String>) -> Self {
        self.base_currency = Some(currency.into());
        self
    }

    /// Sets the own default curve name, enabling DVA.
    pub fn with_dva_name(mut self, name: impl Into<String>) -> Self {
        self.dva_name = Some(name.into());
        self
    }

    /// Sets the funding borrowing curve, enabling FCA and MVA.
    pub fn with_fva_borrowing_curve(mut self, name: impl Into<String>) -> Self {
        self.fva_borrowing_curve = Some(name.into());
        self
    }

    /// Sets the funding lending curve, enabling FBA.
    pub fn with_fva_lending_curve(mut self, name: impl Into<String>) -> Self {
        self.fva_lending_curve = Some(name.into());
        self
    }

    /// Sets the trade cube EPE and ENE slots.
    pub fn with_trade_indices(mut self, epe: usize, ene: usize) -> Self {
        self.trade_epe_index = epe;
        self.trade_ene_index = ene;
        self
    }

    /// Sets the netting set cube EPE and ENE slots.
    pub fn with_netting_set_indices(mut self, epe: usize, ene: usize) -> Self {
        self.netting_set_epe_index = epe;
        self.netting_set_ene_index = ene;
        self
    }

    /// Fixes the counterparty recovery rate.
    pub fn with_cva_recovery(mut self, recovery: f64) -> Self {
        self.cva_recovery_override = Some(recovery);
        self
    }

    /// Fixes the own recovery rate.
    pub fn with_dva_recovery(mut self, recovery: f64) -> Self {
        self.dva_recovery_override = Some(recovery);
        self
    }

    /// Sets the day count for curve times.
    pub fn with_day_count(mut self, day_count: DayCountConvention) -> Self {
        self.day_count = day_count;
        self
    }

    /// Switches to the counterparty's view.
    pub fn with_flip_view(mut self) -> Self {
        self.flip_view = true;
        self
    }

    /// Sets the funding curve postfixes used under flip view.
    pub fn with_flip_view_funding_postfixes(
        mut self,
        borrowing: impl Into<String>,
        lending: impl Into<String>,
    ) -> Self {
        self.flip_view_borrowing_curve_postfix = Some(borrowing.into());
        self.flip_view_lending_curve_postfix = Some(lending.into());
        self
    }

    /// Sets the netting set to trade allocation method.
    pub fn with_allocation_method(mut self, method: AllocationMethod) -> Self {
        self.allocation_method = method;
        self
    }

    /// Whether any funding curve is configured for the active view.
    pub fn fva_enabled(&self) -> bool {
        if self.flip_view {
            self.flip_view_borrowing_curve_postfix.is_some()
                || self.flip_view_lending_curve_postfix.is_some()
        } else {
            self.fva_borrowing_curve.is_some() || self.fva_lending_curve.is_some()
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`XvaError::InvalidConfig`] for recovery overrides outside [0, 1],
    ///   empty curve names, identical EPE and ENE slots, or flip view
    ///   without an own name
    /// - [`XvaError::MissingBaseCurrency`] when funding curves are set
    ///   without a base currency
    pub fn validate(&self) -> Result<(), XvaError> {
        for (label, value) in [
            ("cva_recovery_override", self.cva_recovery_override),
            ("dva_recovery_override", self.dva_recovery_override),
        ] {
            if let Some(r) = value {
                if !(0.0..=1.0).contains(&r) {
                    return Err(XvaError::InvalidConfig(format!(
                        "{} must be in [0, 1], got {}",
                        label, r
                    )));
                }
            }
        }
        for (label, value) in [
            ("base_currency", &self.base_currency),
            ("dva_name", &self.dva_name),
            ("fva_borrowing_curve", &self.fva_borrowing_curve),
            ("fva_lending_curve", &self.fva_lending_curve),
            (
                "flip_view_borrowing_curve_postfix",
                &self.flip_view_borrowing_curve_postfix,
            ),
            (
                "flip_view_lending_curve_postfix",
                &self.flip_view_lending_curve_postfix,
            ),
        ] {
            if value.as_deref().is_some_and(str::is_empty) {
                return Err(XvaError::InvalidConfig(format!("{} must not be empty", label)));
            }
        }
        if self.trade_epe_index == self.trade_ene_index {
            return Err(XvaError::InvalidConfig(
                "trade EPE and ENE slots coincide".to_string(),
            ));
        }
        if self.netting_set_epe_index == self.netting_set_ene_index {
            return Err(XvaError::InvalidConfig(
                "netting set EPE and ENE slots coincide".to_string(),
            ));
        }
        if self.flip_view && self.dva_name.is_none() {
            return Err(XvaError::InvalidConfig(
                "flip_view requires dva_name".to_string(),
            ));
        }
        if self.fva_enabled() && self.base_currency.is_none() {
            return Err(XvaError::MissingBaseCurrency);
        }
        Ok(())
    }
}
