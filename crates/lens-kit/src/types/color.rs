//! Avatar colors.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// An RGB color, displayed as `#rrggbb`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Pick a random color for a profile avatar placeholder.
pub fn generate_random_color() -> Color {
    let [r, g, b] = rand::thread_rng().r#gen::<[u8; 3]>();
    Color { r, g, b }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Color {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let hex_digits = s
            .strip_prefix('#')
            .ok_or_else(|| format!("color '{}' must start with '#'", s))?;
        let bytes = hex::decode(hex_digits).map_err(|e| format!("color '{}': {}", s, e))?;
        match bytes.as_slice() {
            [r, g, b] => Ok(Color::rgb(*r, *g, *b)),
            _ => Err(format!("color '{}' must have six hex digits", s)),
        }
    }
}
