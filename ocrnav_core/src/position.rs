//! World positions and the OCR text -> coordinate parser.

use regex::Regex;

use crate::error::Result;
use crate::mapping::Axis;
use crate::util::round2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn get(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }

    pub fn rounded(&self) -> Self {
        Self::new(round2(self.x), round2(self.y), round2(self.z))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X={:.2}, Y={:.2}, Z={:.2}", self.x, self.y, self.z)
    }
}

const NUMBER: &str = r"[-+]?\d+(?:\.\d+)?";

/// Digit runs too long for `f32` parse to infinity; those are misreads.
fn finite(s: &str) -> Option<f32> {
    s.parse::<f32>().ok().filter(|v| v.is_finite())
}

/// Two-pass coordinate parser.
///
/// 1. Labeled: `x`, `y`, `z` (any case), optional `:`/`=` separator, signed
///    decimal. Each axis is searched independently; all three must hit.
/// 2. Fallback: the first three signed decimals in reading order.
#[derive(Debug, Clone)]
pub struct CoordinateParser {
    labeled: [Regex; 3],
    number: Regex,
}

impl CoordinateParser {
    pub fn new() -> Result<Self> {
        let labeled = |label: char| -> Result<Regex> {
            Regex::new(&format!(r"(?i){label}\s*[:=]?\s*({NUMBER})"))
                .map_err(|e| eyre::eyre!("compile {label} pattern: {e}"))
        };
        Ok(Self {
            labeled: [labeled('x')?, labeled('y')?, labeled('z')?],
            number: Regex::new(NUMBER).map_err(|e| eyre::eyre!("compile number pattern: {e}"))?,
        })
    }

    pub fn parse(&self, text: &str) -> Option<Position> {
        self.parse_labeled(text).or_else(|| self.parse_unlabeled(text))
    }

    pub fn parse_labeled(&self, text: &str) -> Option<Position> {
        let mut vals = [0.0f32; 3];
        for (slot, re) in vals.iter_mut().zip(&self.labeled) {
            *slot = re
                .captures(text)
                .and_then(|c| c.get(1))
                .and_then(|m| finite(m.as_str()))?;
        }
        Some(Position::new(vals[0], vals[1], vals[2]))
    }

    pub fn parse_unlabeled(&self, text: &str) -> Option<Position> {
        let mut nums = self
            .number
            .find_iter(text)
            .filter_map(|m| finite(m.as_str()));
        Some(Position::new(nums.next()?, nums.next()?, nums.next()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parser() -> CoordinateParser {
        CoordinateParser::new().unwrap()
    }

    #[test]
    fn labeled_mixed_case_and_separators() {
        let p = parser().parse("x: -12.50 y:3.00 Z : 7").unwrap();
        assert_eq!(p, Position::new(-12.5, 3.0, 7.0));
    }

    #[test]
    fn overflowing_numbers_are_not_coordinates() {
        let huge = "9".repeat(60);
        assert_eq!(parser().parse(&format!("X: {huge} Y: 1 Z: 2")), None);
    }

    #[test]
    fn labeled_any_order() {
        let p = parser().parse("Z=1.5 X=-2 Y=+4.25").unwrap();
        assert_eq!(p, Position::new(-2.0, 4.25, 1.5));
    }

    #[rstest]
    #[case("pos 10 20.5 -30", Position::new(10.0, 20.5, -30.0))]
    #[case("1, 2, 3, 4", Position::new(1.0, 2.0, 3.0))]
    // only two labels hit, so the fallback takes over
    #[case("x: 1 y: 2 q: 3", Position::new(1.0, 2.0, 3.0))]
    fn unlabeled_fallback(#[case] text: &str, #[case] want: Position) {
        assert_eq!(parser().parse(text), Some(want));
    }

    #[rstest]
    #[case("")]
    #[case("no digits here")]
    #[case("x: 1 y: 2")]
    fn fewer_than_three_numbers(#[case] text: &str) {
        assert_eq!(parser().parse(text), None);
    }

    #[test]
    fn display_two_decimals() {
        assert_eq!(
            Position::new(1.0, -2.345, 0.0).to_string(),
            "X=1.00, Y=-2.35, Z=0.00"
        );
    }
}
