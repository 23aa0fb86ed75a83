//! Axis directions, key roles and the learned key -> axis mapping.

use std::fmt;
use std::str::FromStr;

use crate::error::NavError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn is_horizontal(self) -> bool {
        !matches!(self, Axis::Y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Plus,
    Minus,
}

/// "Pressing this key increases/decreases this axis."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AxisDirection {
    pub axis: Axis,
    pub sign: Sign,
}

impl AxisDirection {
    pub const X_PLUS: Self = Self::new(Axis::X, Sign::Plus);
    pub const X_MINUS: Self = Self::new(Axis::X, Sign::Minus);
    pub const Y_PLUS: Self = Self::new(Axis::Y, Sign::Plus);
    pub const Y_MINUS: Self = Self::new(Axis::Y, Sign::Minus);
    pub const Z_PLUS: Self = Self::new(Axis::Z, Sign::Plus);
    pub const Z_MINUS: Self = Self::new(Axis::Z, Sign::Minus);

    pub const fn new(axis: Axis, sign: Sign) -> Self {
        Self { axis, sign }
    }

    /// Direction of travel along `axis` for a signed delta.
    pub fn from_delta(axis: Axis, delta: f32) -> Self {
        Self::new(axis, if delta > 0.0 { Sign::Plus } else { Sign::Minus })
    }

    pub fn increases(self) -> bool {
        self.sign == Sign::Plus
    }
}

impl fmt::Display for AxisDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let axis = match self.axis {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        };
        let sign = match self.sign {
            Sign::Plus => '+',
            Sign::Minus => '-',
        };
        write!(f, "{axis}{sign}")
    }
}

impl FromStr for AxisDirection {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let axis = match s.as_bytes().first() {
            Some(b'x') => Axis::X,
            Some(b'y') => Axis::Y,
            Some(b'z') => Axis::Z,
            _ => return Err(NavError::Config(format!("bad direction code {s:?}"))),
        };
        let sign = match &s[1..] {
            "+" => Sign::Plus,
            "-" => Sign::Minus,
            _ => return Err(NavError::Config(format!("bad direction code {s:?}"))),
        };
        Ok(Self::new(axis, sign))
    }
}

/// Physical keys behind each movement role. `back` and `strafe_opposite`
/// are never calibrated; they are the conventional reverse of their pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBindings {
    pub forward: String,
    pub back: String,
    pub strafe: String,
    pub strafe_opposite: String,
    pub ascend: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            forward: "w".into(),
            back: "s".into(),
            strafe: "d".into(),
            strafe_opposite: "a".into(),
            ascend: "space".into(),
        }
    }
}

impl KeyBindings {
    /// The other member of `key`'s physical pair.
    pub fn opposite(&self, key: &str) -> Option<&str> {
        self.pair_of(key).map(|(a, b)| if key == a { b } else { a })
    }

    /// `(key, reverse)` pair containing `key`, if it is a horizontal key.
    pub fn pair_of(&self, key: &str) -> Option<(&str, &str)> {
        [
            (self.forward.as_str(), self.back.as_str()),
            (self.strafe.as_str(), self.strafe_opposite.as_str()),
        ]
        .into_iter()
        .find(|(a, b)| *a == key || *b == key)
    }

    /// The four horizontal keys; candidates for an oscillation nudge.
    pub fn movement_keys(&self) -> [&str; 4] {
        [
            self.forward.as_str(),
            self.strafe_opposite.as_str(),
            self.back.as_str(),
            self.strafe.as_str(),
        ]
    }

    /// Every key the controller may hold down.
    pub fn all_keys(&self) -> [&str; 5] {
        [
            self.forward.as_str(),
            self.back.as_str(),
            self.strafe.as_str(),
            self.strafe_opposite.as_str(),
            self.ascend.as_str(),
        ]
    }
}

/// Learned direction per role. Invariant when produced by the calibrator:
/// `forward` and `strafe` sit on different horizontal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapping {
    pub forward: AxisDirection,
    pub strafe: AxisDirection,
    pub ascend: AxisDirection,
}

/// A same-axis result that was overridden by the fixed fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingConflict {
    pub forward: AxisDirection,
    pub measured: AxisDirection,
    pub resolved: AxisDirection,
}

impl KeyMapping {
    /// Layout most games ship with: forward walks -z, strafe walks +x.
    pub const fn preset() -> Self {
        Self {
            forward: AxisDirection::Z_MINUS,
            strafe: AxisDirection::X_PLUS,
            ascend: AxisDirection::Y_PLUS,
        }
    }

    /// Build a mapping from two verified directions, forcing `strafe` off the
    /// forward key's axis when both landed on the same one: `x+` if forward
    /// holds z, `z-` if forward holds x. This is a fixed guess, not a
    /// re-measurement; the returned conflict lets callers flag it.
    pub fn resolve(
        forward: AxisDirection,
        strafe: AxisDirection,
        ascend: AxisDirection,
    ) -> (Self, Option<MappingConflict>) {
        if forward.axis != strafe.axis {
            return (
                Self {
                    forward,
                    strafe,
                    ascend,
                },
                None,
            );
        }
        let resolved = if forward.axis == Axis::Z {
            AxisDirection::X_PLUS
        } else {
            AxisDirection::Z_MINUS
        };
        (
            Self {
                forward,
                strafe: resolved,
                ascend,
            },
            Some(MappingConflict {
                forward,
                measured: strafe,
                resolved,
            }),
        )
    }

    pub fn is_valid(&self) -> bool {
        self.forward.axis.is_horizontal()
            && self.strafe.axis.is_horizontal()
            && self.forward.axis != self.strafe.axis
            && self.ascend.axis == Axis::Y
    }

    /// `(key, direction)` for the role driving `axis`, if any.
    pub fn binding_for<'a>(
        &self,
        bindings: &'a KeyBindings,
        axis: Axis,
    ) -> Option<(&'a str, AxisDirection)> {
        if self.forward.axis == axis {
            Some((bindings.forward.as_str(), self.forward))
        } else if self.strafe.axis == axis {
            Some((bindings.strafe.as_str(), self.strafe))
        } else {
            None
        }
    }

    /// `{w: z-, d: x+, space: y+}` style rendering.
    pub fn describe(&self, bindings: &KeyBindings) -> String {
        format!(
            "{{{}: {}, {}: {}, {}: {}}}",
            bindings.forward,
            self.forward,
            bindings.strafe,
            self.strafe,
            bindings.ascend,
            self.ascend
        )
    }
}

impl fmt::Display for KeyMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "forward={} strafe={} ascend={}",
            self.forward, self.strafe, self.ascend
        )
    }
}
