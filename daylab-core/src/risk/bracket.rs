//! Stop/take bracket around an open position and the intrabar touch check.
//!
//! When a bar's range covers both levels the adverse level (stop) wins.

use serde::{Deserialize, Serialize};

/// Side of an open position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Direction implied by a signed position, `None` when flat.
    pub fn of(position: f64) -> Option<Self> {
        if position > 0.0 {
            Some(Self::Long)
        } else if position < 0.0 {
            Some(Self::Short)
        } else {
            None
        }
    }
}

/// Stop-loss and take-profit levels for one open position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bracket {
    pub stop: f64,
    pub take: f64,
}

/// Which bracket level a bar touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchKind {
    Stop,
    Take,
}

/// A touched bracket level and the price the position is closed at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Touch {
    pub kind: TouchKind,
    pub price: f64,
}

/// Place stop and take at `multiplier × volatility` from the entry price.
///
/// Long: stop below, take above. Short: mirrored.
pub fn derive_bracket(
    entry_price: f64,
    entry_volatility: f64,
    stop_multiplier: f64,
    take_multiplier: f64,
    direction: Direction,
) -> Bracket {
    let stop_distance = stop_multiplier * entry_volatility;
    let take_distance = take_multiplier * entry_volatility;
    match direction {
        Direction::Long => Bracket {
            stop: entry_price - stop_distance,
            take: entry_price + take_distance,
        },
        Direction::Short => Bracket {
            stop: entry_price + stop_distance,
            take: entry_price - take_distance,
        },
    }
}

/// Check whether a bar's range touched the bracket.
///
/// The stop is always tested before the take.
pub fn check_touch(
    direction: Direction,
    bracket: &Bracket,
    bar_high: f64,
    bar_low: f64,
) -> Option<Touch> {
    let (stop_hit, take_hit) = match direction {
        Direction::Long => (bar_low <= bracket.stop, bar_high >= bracket.take),
        Direction::Short => (bar_high >= bracket.stop, bar_low <= bracket.take),
    };

    if stop_hit {
        Some(Touch {
            kind: TouchKind::Stop,
            price: bracket.stop,
        })
    } else if take_hit {
        Some(Touch {
            kind: TouchKind::Take,
            price: bracket.take,
        })
    } else {
        None
    }
}
