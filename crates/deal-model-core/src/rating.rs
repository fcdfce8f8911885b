use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Multiple;

/// Lender bankability bucket for a debt service coverage ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DscrRating {
    Insufficient,
    Marginal,
    Good,
    Excellent,
}

impl DscrRating {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Insufficient => "Insufficient",
            Self::Marginal => "Marginal",
            Self::Good => "Good",
            Self::Excellent => "Excellent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Insufficient => {
                "Cash flow does not cover debt service; likely loan decline"
            }
            Self::Marginal => {
                "Covers debt service but below typical lender minimum; consider more equity or a longer term"
            }
            Self::Good => "Meets typical SBA lender minimum coverage",
            Self::Excellent => "Strong coverage with cushion for downside scenarios",
        }
    }
}

impl std::fmt::Display for DscrRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Ordered DSCR threshold ladder. Each edge is the inclusive lower bound of
/// its band; anything below `marginal_from` is insufficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DscrLadder {
    pub marginal_from: Multiple,
    pub good_from: Multiple,
    pub excellent_from: Multiple,
}

impl DscrLadder {
    /// The single ladder used by every calculator surface.
    pub const CANONICAL: DscrLadder = DscrLadder {
        marginal_from: dec!(1.0),
        good_from: dec!(1.25),
        excellent_from: dec!(1.35),
    };

    pub fn rate(&self, dscr: Multiple) -> DscrRating {
        if dscr >= self.excellent_from {
            DscrRating::Excellent
        } else if dscr >= self.good_from {
            DscrRating::Good
        } else if dscr >= self.marginal_from {
            DscrRating::Marginal
        } else {
            DscrRating::Insufficient
        }
    }

    /// Undefined coverage (no debt service) has no rating.
    pub fn rate_optional(&self, dscr: Option<Multiple>) -> Option<DscrRating> {
        dscr.map(|d| self.rate(d))
    }

    pub fn is_ordered(&self) -> bool {
        self.marginal_from <= self.good_from && self.good_from <= self.excellent_from
    }
}

impl Default for DscrLadder {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Rate a DSCR against the canonical ladder.
pub fn rate_dscr(dscr: Option<Decimal>) -> Option<DscrRating> {
    DscrLadder::CANONICAL.rate_optional(dscr)
}
