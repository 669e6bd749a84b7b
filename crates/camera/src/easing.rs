use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Monotone `[0, 1] -> [0, 1]` reparameterizations of animation progress.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    EaseInOutQuad,
    #[default]
    EaseInOutCubic,
    EaseInOutExpo,
}

impl Easing {
    pub fn all() -> &'static [Easing] {
        &[
            Easing::Linear,
            Easing::EaseInOutQuad,
            Easing::EaseInOutCubic,
            Easing::EaseInOutExpo,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Easing::Linear => "linear",
            Easing::EaseInOutQuad => "easeInOutQuad",
            Easing::EaseInOutCubic => "easeInOutCubic",
            Easing::EaseInOutExpo => "easeInOutExpo",
        }
    }

    /// Applies the easing. `t` is clamped to `[0, 1]`; NaN maps to 0.
    pub fn apply(&self, t: f64) -> f64 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Easing::Linear => t,
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    let u = 1.0 - t;
                    1.0 - 2.0 * u * u
                }
            }
            Easing::EaseInOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 1.0 - t;
                    1.0 - 4.0 * u * u * u
                }
            }
            Easing::EaseInOutExpo => {
                if t == 0.0 {
                    0.0
                } else if t == 1.0 {
                    1.0
                } else if t < 0.5 {
                    2f64.powf(20.0 * t - 10.0) / 2.0
                } else {
                    (2.0 - 2f64.powf(-20.0 * t + 10.0)) / 2.0
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEasing(pub String);

impl std::fmt::Display for UnknownEasing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown easing {:?} (expected linear, easeInOutQuad, easeInOutCubic or easeInOutExpo)",
            self.0
        )
    }
}

impl std::error::Error for UnknownEasing {}

impl FromStr for Easing {
    type Err = UnknownEasing;

    /// Accepts camelCase names and their snake/kebab-case spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "linear" => Ok(Easing::Linear),
            "easeinoutquad" => Ok(Easing::EaseInOutQuad),
            "easeinoutcubic" => Ok(Easing::EaseInOutCubic),
            "easeinoutexpo" => Ok(Easing::EaseInOutExpo),
            _ => Err(UnknownEasing(s.to_string())),
        }
    }
}
