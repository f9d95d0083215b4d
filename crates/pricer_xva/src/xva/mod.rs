//! XVA increment aggregation over exposure cubes.
//!
//! ```text
//! ┌────────────────────────┐   ┌────────────────────────────┐
//! │ trade / netting set    │   │ Market                      │
//! │ exposure cubes         │   │  default, yield, discount   │
//! │  (EPE / ENE slots)     │   │  curves, recovery rates     │
//! └───────────┬────────────┘   └──────────────┬─────────────┘
//!             │                               │
//!             ▼                               ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ XvaCalculator                                            │
//! │  validates cubes, resolves recoveries and funding dcfs,  │
//! │  walks the date grid per trade and netting set           │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ per period
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │ dyn XvaIncrementStrategy (StaticCreditXvaStrategy, ...)  │
//! │  CVA / DVA / FCA / FBA / MVA increments                  │
//! └───────────────────────────┬──────────────────────────────┘
//!                             ▼
//!                        XvaResult
//! ```

mod calculator;
mod config;
mod error;
mod result;
mod static_credit;
mod strategy;

pub use calculator::{DimProfile, XvaCalculator};
pub use config::{AllocationMethod, XvaConfig};
pub use error::XvaError;
pub use result::{XvaResult, XvaValues};
pub use static_credit::StaticCreditXvaStrategy;
pub use strategy::{ExposureProfile, IncrementPeriod, XvaIncrementStrategy};
