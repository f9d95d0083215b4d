//! Zero to par sensitivity conversion.
//!
//! With `J[i][j] = ∂cᵢ/∂zⱼ` the par rate Jacobian, the chain rule gives
//! `∂V/∂z = Jᵀ ∂V/∂c`, so par sensitivities follow from zero
//! sensitivities through the inverse of the transposed Jacobian:
//!
//! ```text
//! par_delta = (Jᵀ)⁻¹ · (zero_delta / zero_shift) ⊙ par_shift
//! ```

use std::collections::{BTreeMap, BTreeSet};

use nalgebra::{DMatrix, DVector};
use tracing::{info, warn};

use super::analysis::{ParSensitivities, ParSensitivityAnalysis};
use super::error::ParSensitivityError;
use crate::scenarios::{KeyType, RiskFactorKey};

/// Smallest zero shift used as a divisor.
const MIN_ZERO_SHIFT: f64 = 1e-10;

/// Converts zero-rate sensitivities into par-rate sensitivities.
///
/// # Examples
///
/// ```rust
/// use std::collections::BTreeMap;
/// use pricer_risk::par::ParSensitivityConverter;
/// use pricer_risk::scenarios::RiskFactorKey;
///
/// let key = RiskFactorKey::discount("EUR", 0);
/// let sensitivities = [((key.clone(), key.clone()), 2.0)].into_iter().collect();
/// let shifts: BTreeMap<_, _> = [(key.clone(), (1e-4, 1e-4))].into_iter().collect();
///
/// let converter = ParSensitivityConverter::from_sensitivities(&sensitivities, &shifts).unwrap();
/// let par = converter.convert_sensitivity(&[10.0]).unwrap();
/// assert!((par[0] - 5.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct ParSensitivityConverter {
    keys: Vec<RiskFactorKey>,
    zero_shifts: DVector<f64>,
    par_shifts: DVector<f64>,
    jacobian_transpose: DMatrix<f64>,
    inverse: DMatrix<f64>,
    condition_number: f64,
}

impl ParSensitivityConverter {
    /// Converter for the results of a par sensitivity analysis.
    ///
    /// # Errors
    ///
    /// See [`from_sensitivities`](Self::from_sensitivities).
    pub fn new(analysis: &ParSensitivityAnalysis) -> Result<Self, ParSensitivityError> {
        Self::from_sensitivities(analysis.par_sensitivities(), analysis.shift_sizes())
    }

    /// Converter for explicit sensitivities and `(zero, par)` shift sizes.
    ///
    /// # Errors
    ///
    /// * [`ParSensitivityError::KeyMismatch`] - Par and zero key sets differ
    /// * [`ParSensitivityError::Empty`] - No sensitivities
    /// * [`ParSensitivityError::MissingShiftSize`] - A key has no shift sizes
    /// * [`ParSensitivityError::SingularJacobian`] - The Jacobian is singular
    pub fn from_sensitivities(
        sensitivities: &ParSensitivities,
        shift_sizes: &BTreeMap<RiskFactorKey, (f64, f64)>,
    ) -> Result<Self, ParSensitivityError> {
        let par_keys: BTreeSet<&RiskFactorKey> = sensitivities.keys().map(|(p, _)| p).collect();
        let zero_keys: BTreeSet<&RiskFactorKey> = sensitivities.keys().map(|(_, z)| z).collect();
        if par_keys != zero_keys {
            let par_only: Vec<_> = par_keys.difference(&zero_keys).collect();
            let zero_only: Vec<_> = zero_keys.difference(&par_keys).collect();
            for key in &par_only {
                warn!(key = %key, "Par key without a matching zero key");
            }
            for key in &zero_only {
                warn!(key = %key, "Zero key without a matching par key");
            }
            return Err(ParSensitivityError::KeyMismatch {
                par_only: par_only.len(),
                zero_only: zero_only.len(),
            });
        }
        if par_keys.is_empty() {
            return Err(ParSensitivityError::Empty);
        }

        let keys: Vec<RiskFactorKey> = par_keys.into_iter().cloned().collect();
        let n = keys.len();
        let index: BTreeMap<&RiskFactorKey, usize> =
            keys.iter().enumerate().map(|(i, k)| (k, i)).collect();

        let mut zero_shifts = DVector::zeros(n);
        let mut par_shifts = DVector::zeros(n);
        for (i, key) in keys.iter().enumerate() {
            let &(zero, par) = shift_sizes
                .get(key)
                .ok_or_else(|| ParSensitivityError::MissingShiftSize(key.to_string()))?;
            zero_shifts[i] = zero.max(MIN_ZERO_SHIFT);
            par_shifts[i] = par;
        }

        let mut jacobian_transpose = DMatrix::zeros(n, n);
        for ((par, zero), &value) in sensitivities {
            jacobian_transpose[(index[zero], index[par])] = value;
        }

        let Some(inverse) = jacobian_transpose.clone().try_inverse() else {
            return Err(singular_diagnostics(&keys, &jacobian_transpose));
        };
        let condition_number = jacobian_transpose.norm() * inverse.norm();
        info!(keys = n, condition_number, "Inverted par Jacobian");

        Ok(Self {
            keys,
            zero_shifts,
            par_shifts,
            jacobian_transpose,
            inverse,
            condition_number,
        })
    }

    /// Keys in matrix order; par and zero keys coincide.
    #[inline]
    pub fn keys(&self) -> &[RiskFactorKey] {
        &self.keys
    }

    /// `(Jᵀ)⁻¹`; entry `(i, j)` is `∂zⱼ/∂cᵢ`.
    #[inline]
    pub fn conversion_matrix(&self) -> &DMatrix<f64> {
        &self.inverse
    }

    /// `Jᵀ`; entry `(j, i)` is `∂cᵢ/∂zⱼ`.
    #[inline]
    pub fn jacobian_transpose(&self) -> &DMatrix<f64> {
        &self.jacobian_transpose
    }

    /// Frobenius condition number of the Jacobian.
    #[inline]
    pub fn condition_number(&self) -> f64 {
        self.condition_number
    }

    /// Par sensitivities per par shift from zero sensitivities per zero
    /// shift, both in [`keys`](Self::keys) order.
    ///
    /// # Errors
    ///
    /// [`ParSensitivityError::DimensionMismatch`] if the input length differs
    /// from the number of keys.
    pub fn convert_sensitivity(
        &self,
        zero_sensitivities: &[f64],
    ) -> Result<Vec<f64>, ParSensitivityError> {
        if zero_sensitivities.len() != self.keys.len() {
            return Err(ParSensitivityError::DimensionMismatch {
                expected: self.keys.len(),
                actual: zero_sensitivities.len(),
            });
        }
        let derivatives =
            DVector::from_column_slice(zero_sensitivities).component_div(&self.zero_shifts);
        let par = (&self.inverse * derivatives).component_mul(&self.par_shifts);
        Ok(par.iter().copied().collect())
    }

    /// Non-zero entries of the conversion matrix as
    /// `(zero key, par key, ∂z/∂c)`.
    pub fn conversion_entries(&self) -> Vec<(&RiskFactorKey, &RiskFactorKey, f64)> {
        let n = self.keys.len();
        let mut entries = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let value = self.inverse[(i, j)];
                if value != 0.0 {
                    entries.push((&self.keys[j], &self.keys[i], value));
                }
            }
        }
        entries
    }

    /// Block of the conversion matrix for one curve, rows par keys and
    /// columns zero keys in pillar order.
    pub fn block(&self, key_type: KeyType, name: &str) -> Option<DMatrix<f64>> {
        let indices: Vec<usize> = self
            .keys
            .iter()
            .enumerate()
            .filter(|(_, k)| k.group() == (key_type, name))
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            return None;
        }
        let m = indices.len();
        Some(DMatrix::from_fn(m, m, |r, c| self.inverse[(indices[r], indices[c])]))
    }
}

fn singular_diagnostics(keys: &[RiskFactorKey], jt: &DMatrix<f64>) -> ParSensitivityError {
    let zero_rows: Vec<usize> = (0..jt.nrows())
        .filter(|&r| jt.row(r).iter().all(|v| *v == 0.0))
        .collect();
    let zero_cols: Vec<usize> = (0..jt.ncols())
        .filter(|&c| jt.column(c).iter().all(|v| *v == 0.0))
        .collect();
    for &r in &zero_rows {
        warn!(key = %keys[r], "No par rate depends on zero factor");
    }
    for &c in &zero_cols {
        warn!(key = %keys[c], "Par rate depends on no zero factor");
    }
    if zero_rows.is_empty() && zero_cols.is_empty() {
        warn!(keys = keys.len(), "Par Jacobian rows are linearly dependent");
    }
    ParSensitivityError::SingularJacobian {
        zero_rows: zero_rows.len(),
        zero_cols: zero_cols.len(),
    }
}
