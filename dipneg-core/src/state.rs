use serde::{Deserialize, Serialize};

pub type PowerName = String;
pub type RegionName = String;
pub type ProvinceName = String;

/// Game phases in the order the board steps through them within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Spring movement
    Spring,
    /// Spring retreats
    Summer,
    /// Fall movement
    Fall,
    /// Fall retreats
    Autumn,
    /// Builds and disbands
    Winter,
}

impl Phase {
    pub const ALL: [Phase; 5] = [
        Phase::Spring,
        Phase::Summer,
        Phase::Fall,
        Phase::Autumn,
        Phase::Winter,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn code(self) -> &'static str {
        match self {
            Phase::Spring => "SPR",
            Phase::Summer => "SUM",
            Phase::Fall => "FAL",
            Phase::Autumn => "AUT",
            Phase::Winter => "WIN",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A point in game time. Ordered by year, then by phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Turn {
    pub year: i32,
    pub phase: Phase,
}

impl Turn {
    pub fn new(year: i32, phase: Phase) -> Self {
        Self { year, phase }
    }

    /// True if this turn lies strictly before `current`.
    ///
    /// Clauses tagged with such a turn can no longer be honoured.
    pub fn is_before(&self, current: Turn) -> bool {
        *self < current
    }

    /// The turn `phases` steps after this one, wrapping into the next year
    /// after winter.
    pub fn advance(&self, phases: u32) -> Self {
        let per_year = Phase::ALL.len() as u32;
        let total = self.phase.index() as u32 + phases;
        Self {
            year: self.year + (total / per_year) as i32,
            phase: Phase::ALL[(total % per_year) as usize],
        }
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new(1901, Phase::Spring)
    }
}

impl std::fmt::Display for Turn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.phase, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_ordering() {
        let spring = Turn::new(1901, Phase::Spring);
        let fall = Turn::new(1901, Phase::Fall);
        let next_spring = Turn::new(1902, Phase::Spring);

        assert!(spring.is_before(fall));
        assert!(fall.is_before(next_spring));
        assert!(!fall.is_before(fall));
        assert!(!next_spring.is_before(fall));
    }

    #[test]
    fn test_advance_wraps_year() {
        let fall = Turn::new(1901, Phase::Fall);
        assert_eq!(fall.advance(0), fall);
        assert_eq!(fall.advance(2), Turn::new(1901, Phase::Winter));
        assert_eq!(fall.advance(3), Turn::new(1902, Phase::Spring));
        assert_eq!(fall.advance(8), Turn::new(1903, Phase::Spring));
    }

    #[test]
    fn test_display() {
        assert_eq!(Turn::new(1905, Phase::Autumn).to_string(), "AUT 1905");
    }
}
