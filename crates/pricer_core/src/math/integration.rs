//! Gauss-Legendre quadrature for piecewise-smooth integrands.
//!
//! Model parameters in the cross-asset model are piecewise constant in time,
//! so the integrands of the conditional moment formulas are smooth between
//! parameter breakpoints and may jump across them. [`GaussLegendre::integrate`]
//! splits `[a, b]` at the supplied breakpoints and applies a fixed-order rule
//! on every smooth piece.

use std::f64::consts::PI;

/// Default number of nodes per smooth segment.
pub const DEFAULT_ORDER: usize = 16;

/// Gauss-Legendre rule with nodes and weights on [-1, 1].
///
/// # Example
///
/// ```
/// use pricer_core::math::GaussLegendre;
///
/// let rule = GaussLegendre::new(8);
/// // Step function jumping at t = 1
/// let f = |t: f64| if t <= 1.0 { 2.0 } else { 5.0 };
/// let v = rule.integrate(f, 0.0, 3.0, &[1.0]);
/// assert!((v - 12.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct GaussLegendre {
    nodes: Vec<f64>,
    weights: Vec<f64>,
}

impl Default for GaussLegendre {
    fn default() -> Self {
        Self::new(DEFAULT_ORDER)
    }
}

impl GaussLegendre {
    /// Build a rule with `order` nodes (at least one).
    ///
    /// Nodes are the roots of the Legendre polynomial Pₙ found by Newton
    /// iteration from the Chebyshev-like initial guess.
    pub fn new(order: usize) -> Self {
        let n = order.max(1);
        let mut nodes = vec![0.0; n];
        let mut weights = vec![0.0; n];
        let m = (n + 1) / 2;
        for i in 0..m {
            let mut z = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
            let mut dp = 1.0;
            for _ in 0..100 {
                let (p, d) = legendre(n, z);
                dp = d;
                let dz = p / d;
                z -= dz;
                if dz.abs() < 1e-15 {
                    break;
                }
            }
            let (_, d) = legendre(n, z);
            if d != 0.0 {
                dp = d;
            }
            let w = 2.0 / ((1.0 - z * z) * dp * dp);
            nodes[i] = -z;
            nodes[n - 1 - i] = z;
            weights[i] = w;
            weights[n - 1 - i] = w;
        }
        Self { nodes, weights }
    }

    /// Number of nodes.
    pub fn order(&self) -> usize {
        self.nodes.len()
    }

    /// Integrate a smooth function over `[a, b]`.
    pub fn integrate_smooth<F: Fn(f64) -> f64>(&self, f: &F, a: f64, b: f64) -> f64 {
        let half = 0.5 * (b - a);
        let mid = 0.5 * (a + b);
        self.nodes
            .iter()
            .zip(&self.weights)
            .map(|(&x, &w)| w * f(mid + half * x))
            .sum::<f64>()
            * half
    }

    /// Integrate over `[a, b]`, splitting at every breakpoint strictly inside.
    ///
    /// `breakpoints` must be sorted ascending; points outside `(a, b)` are ignored.
    ///
    /// Returns `-∫[b, a]` when `b < a` and zero for an empty interval.
    pub fn integrate<F: Fn(f64) -> f64>(&self, f: F, a: f64, b: f64, breakpoints: &[f64]) -> f64 {
        if a == b {
            return 0.0;
        }
        if b < a {
            return -self.integrate(f, b, a, breakpoints);
        }
        let mut total = 0.0;
        let mut lo = a;
        for &bp in breakpoints.iter().filter(|&&bp| bp > a && bp < b) {
            if bp > lo {
                total += self.integrate_smooth(&f, lo, bp);
                lo = bp;
            }
        }
        total + self.integrate_smooth(&f, lo, b)
    }
}

/// Value and derivative of the Legendre polynomial Pₙ at `x`.
fn legendre(n: usize, x: f64) -> (f64, f64) {
    let mut p0 = 1.0;
    let mut p1 = x;
    if n == 0 {
        return (1.0, 0.0);
    }
    for k in 2..=n {
        let kf = k as f64;
        let p2 = ((2.0 * kf - 1.0) * x * p1 - (kf - 1.0) * p0) / kf;
        p0 = p1;
        p1 = p2;
    }
    let d = n as f64 * (x * p1 - p0) / (x * x - 1.0);
    (p1, d)
}
