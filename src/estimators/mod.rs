//! Battery estimators: pure functions and small accumulators.
//!
//! | Estimator   | Input                         | Output            |
//! |-------------|-------------------------------|-------------------|
//! | `direction` | signed current                | charging / not    |
//! | `energy`    | signed current + timestamp    | cumulative Ah     |
//! | `soc`       | voltage, current, temperature | 0 – 100 %         |
//! | `soh`       | measured / rated capacity     | %                 |
//!
//! Nothing here touches hardware or logs; the service owns the state
//! and decides what to report.

pub mod direction;
pub mod energy;
pub mod soc;
pub mod soh;
