//! Risk factors, scenarios and the simulation market.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  Simulation Market                    │
//! ├──────────────────────────────────────────────────────┤
//! │  RiskFactorKey       - (type, name, pillar index)     │
//! │  Scenario            - Labelled key -> value snapshot │
//! │  SimMarketParameters - Curves and pillar tenors       │
//! │  ScenarioSimMarket   - Base scenario, single shifts   │
//! │  ScenarioMarket      - Market view of one scenario    │
//! └──────────────────────────────────────────────────────┘
//! ```

mod error;
mod risk_factor;
mod scenario;
mod sim_market;

pub use error::ScenarioError;
pub use risk_factor::{KeyType, ParFamily, RiskFactorKey};
pub use scenario::{Scenario, ShiftType};
pub use sim_market::{ScenarioMarket, ScenarioSimMarket, SimMarketParameters};
