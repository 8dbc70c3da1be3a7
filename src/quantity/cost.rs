use std::fmt::{Debug, Display, Formatter};

use crate::quantity::Quantity;

/// Dollars.
pub type Cost = Quantity<0, 0, 1>;

impl Display for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.2}", self.0)
    }
}

impl Debug for Cost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}", self.0)
    }
}

/// Dollars per hour.
pub type CostRate = Quantity<0, -1, 1>;

impl Display for CostRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.3}/h", self.0)
    }
}

impl Debug for CostRate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "${:.4}/h", self.0)
    }
}
