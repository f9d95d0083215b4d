//! Closed-form conditional moments of the cross-asset state over one step.
//!
//! All functions work on the interval `[t0, t0 + dt]`. Expectations are
//! split into a state-independent part (`*_expectation_1`, cacheable per
//! step) and a part linear in the start state (`*_expectation_2`).
//!
//! FX index `i` refers to FX block `i`, whose foreign IR block is `i + 1`.
//! Integrals are evaluated by Gauss-Legendre quadrature split at the model's
//! parameter breakpoints, so piecewise-constant volatilities integrate
//! exactly up to the smooth `H` factors.

use super::error::ModelError;
use super::model::CrossAssetModel;
use super::parametrization::IrLgm1fParametrization;

/// State-independent part of E[zᵢ(t0 + dt) | z(t0)].
pub fn ir_expectation_1(model: &CrossAssetModel, i: usize, t0: f64, dt: f64) -> f64 {
    if i == 0 {
        return 0.0;
    }
    let (a, b) = (t0, t0 + dt);
    let ir0 = model.ir(0);
    let iri = model.ir(i);
    let fxi = model.fx(i - 1);
    let rho_0i = model.rho_zz(0, i);
    let rho_ii = model.rho_zx(i, i - 1);

    model.integral(a, b, |s| {
        let ai = iri.alpha(s);
        -iri.h(s) * ai * ai - ai * fxi.sigma(s) * rho_ii + ir0.h(s) * ir0.alpha(s) * ai * rho_0i
    })
}

/// State-dependent part of E[zᵢ(t0 + dt) | z(t0)]; the LGM state is a
/// martingale up to the drift above.
#[inline]
pub fn ir_expectation_2(_model: &CrossAssetModel, _i: usize, zi_0: f64) -> f64 {
    zi_0
}

/// State-independent part of E[ln xᵢ(t0 + dt) | state(t0)].
///
/// # Errors
///
/// Propagates curve failures from either currency's discount curve.
pub fn fx_expectation_1(
    model: &CrossAssetModel,
    i: usize,
    t0: f64,
    dt: f64,
) -> Result<f64, ModelError> {
    let (a, b) = (t0, t0 + dt);
    let ir0 = model.ir(0);
    let irf = model.ir(i + 1);
    let fx = model.fx(i);
    let rho_0f = model.rho_zz(0, i + 1);
    let rho_0x = model.rho_zx(0, i);
    let rho_fx = model.rho_zx(i + 1, i);

    let (h0_a, h0_b) = (ir0.h(a), ir0.h(b));
    let (hf_a, hf_b) = (irf.h(a), irf.h(b));
    let (zeta0_a, zeta0_b) = (ir0.zeta(a), ir0.zeta(b));
    let (zetaf_a, zetaf_b) = (irf.zeta(a), irf.zeta(b));

    let mut res = (irf.discount(b)? / irf.discount(a)? * ir0.discount(a)? / ir0.discount(b)?).ln();

    res -= 0.5 * (fx.variance(b) - fx.variance(a));

    let int_h0h0a0a0 = model.integral(a, b, |s| {
        let (h, al) = (ir0.h(s), ir0.alpha(s));
        h * h * al * al
    });
    res += 0.5 * (h0_b * h0_b * zeta0_b - h0_a * h0_a * zeta0_a - int_h0h0a0a0);

    let int_hfhfafaf = model.integral(a, b, |s| {
        let (h, al) = (irf.h(s), irf.alpha(s));
        h * h * al * al
    });
    res -= 0.5 * (hf_b * hf_b * zetaf_b - hf_a * hf_a * zetaf_a - int_hfhfafaf);

    res += model.integral(a, b, |s| ir0.h(s) * ir0.alpha(s) * fx.sigma(s) * rho_0x);

    let foreign_drift = model.integral(a, b, |s| {
        let af = irf.alpha(s);
        -irf.h(s) * af * af + ir0.h(s) * ir0.alpha(s) * af * rho_0f - af * fx.sigma(s) * rho_fx
    });
    res -= hf_b * foreign_drift;

    res += model.integral(a, b, |s| {
        let (hf, af) = (irf.h(s), irf.alpha(s));
        -hf * hf * af * af + ir0.h(s) * hf * ir0.alpha(s) * af * rho_0f
            - hf * af * fx.sigma(s) * rho_fx
    });

    Ok(res)
}

/// State-dependent part of E[ln xᵢ(t0 + dt) | state(t0)].
pub fn fx_expectation_2(
    model: &CrossAssetModel,
    i: usize,
    t0: f64,
    xi_0: f64,
    zi_0: f64,
    z0_0: f64,
    dt: f64,
) -> f64 {
    let ir0 = model.ir(0);
    let irf = model.ir(i + 1);
    xi_0 + (ir0.h(t0 + dt) - ir0.h(t0)) * z0_0 - (irf.h(t0 + dt) - irf.h(t0)) * zi_0
}

/// Cov[zᵢ, zⱼ] over the step.
pub fn ir_ir_covariance(model: &CrossAssetModel, i: usize, j: usize, t0: f64, dt: f64) -> f64 {
    let (iri, irj) = (model.ir(i), model.ir(j));
    let rho = model.rho_zz(i, j);
    model.integral(t0, t0 + dt, |s| iri.alpha(s) * irj.alpha(s) * rho)
}

/// Cov[zᵢ, ln xⱼ] over the step.
pub fn ir_fx_covariance(model: &CrossAssetModel, i: usize, j: usize, t0: f64, dt: f64) -> f64 {
    let (a, b) = (t0, t0 + dt);
    let ir0 = model.ir(0);
    let iri = model.ir(i);
    let irf = model.ir(j + 1);
    let fx = model.fx(j);
    let rho_0i = model.rho_zz(0, i);
    let rho_fi = model.rho_zz(j + 1, i);
    let rho_ix = model.rho_zx(i, j);

    ir0.h(b) * model.integral(a, b, |s| ir0.alpha(s) * iri.alpha(s) * rho_0i)
        - model.integral(a, b, |s| ir0.h(s) * ir0.alpha(s) * iri.alpha(s) * rho_0i)
        - irf.h(b) * model.integral(a, b, |s| irf.alpha(s) * iri.alpha(s) * rho_fi)
        + model.integral(a, b, |s| irf.h(s) * irf.alpha(s) * iri.alpha(s) * rho_fi)
        + model.integral(a, b, |s| iri.alpha(s) * fx.sigma(s) * rho_ix)
}

/// Cov[ln xᵢ, ln xⱼ] over the step.
pub fn fx_fx_covariance(model: &CrossAssetModel, i: usize, j: usize, t0: f64, dt: f64) -> f64 {
    let (a, b) = (t0, t0 + dt);
    let ir0 = model.ir(0);
    let iri = model.ir(i + 1);
    let irj = model.ir(j + 1);
    let (fxi, fxj) = (model.fx(i), model.fx(j));

    let h0 = ir0.h(b);
    let hi = iri.h(b);
    let hj = irj.h(b);

    let rho_0i = model.rho_zz(0, i + 1);
    let rho_0j = model.rho_zz(0, j + 1);
    let rho_ij = model.rho_zz(i + 1, j + 1);
    let rho_0xi = model.rho_zx(0, i);
    let rho_0xj = model.rho_zx(0, j);
    let rho_ixj = model.rho_zx(i + 1, j);
    let rho_jxi = model.rho_zx(j + 1, i);
    let rho_xx = model.rho_xx(i, j);

    let int = |f: &dyn Fn(f64) -> f64| model.integral(a, b, f);

    // domestic rate variance
    let row1 = h0 * h0 * (ir0.zeta(b) - ir0.zeta(a))
        - 2.0 * h0 * int(&|s| ir0.h(s) * ir0.alpha(s) * ir0.alpha(s))
        + int(&|s| ir0.h(s) * ir0.h(s) * ir0.alpha(s) * ir0.alpha(s));

    // domestic against foreign rates
    let dom_for = |irk: &IrLgm1fParametrization, hk: f64, rho: f64| {
        -h0 * hk * int(&|s| ir0.alpha(s) * irk.alpha(s) * rho)
            + hk * int(&|s| ir0.h(s) * ir0.alpha(s) * irk.alpha(s) * rho)
            + h0 * int(&|s| irk.h(s) * irk.alpha(s) * ir0.alpha(s) * rho)
            - int(&|s| ir0.h(s) * irk.h(s) * ir0.alpha(s) * irk.alpha(s) * rho)
    };
    let row2 = dom_for(irj, hj, rho_0j);
    let row3 = dom_for(iri, hi, rho_0i);

    // domestic rate against FX
    let row4 = h0 * int(&|s| ir0.alpha(s) * fxj.sigma(s) * rho_0xj)
        - int(&|s| ir0.h(s) * ir0.alpha(s) * fxj.sigma(s) * rho_0xj);
    let row5 = h0 * int(&|s| ir0.alpha(s) * fxi.sigma(s) * rho_0xi)
        - int(&|s| ir0.h(s) * ir0.alpha(s) * fxi.sigma(s) * rho_0xi);

    // foreign rates against FX
    let row6 = -hi * int(&|s| iri.alpha(s) * fxj.sigma(s) * rho_ixj)
        + int(&|s| iri.h(s) * iri.alpha(s) * fxj.sigma(s) * rho_ixj);
    let row7 = -hj * int(&|s| irj.alpha(s) * fxi.sigma(s) * rho_jxi)
        + int(&|s| irj.h(s) * irj.alpha(s) * fxi.sigma(s) * rho_jxi);

    // foreign against foreign rates
    let row8 = hi * hj * int(&|s| iri.alpha(s) * irj.alpha(s) * rho_ij)
        - hj * int(&|s| iri.h(s) * iri.alpha(s) * irj.alpha(s) * rho_ij)
        - hi * int(&|s| irj.h(s) * irj.alpha(s) * iri.alpha(s) * rho_ij)
        + int(&|s| iri.h(s) * irj.h(s) * iri.alpha(s) * irj.alpha(s) * rho_ij);

    let row9 = int(&|s| fxi.sigma(s) * fxj.sigma(s) * rho_xx);

    row1 + row2 + row3 + row4 + row5 + row6 + row7 + row8 + row9
}
