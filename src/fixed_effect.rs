use std::{str::FromStr, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{Error, FittedModel};

// Only the `C(` prefix is checked, a closing parenthesis is not required.
static FIXED_EFFECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^C\(").expect("fixed effect pattern should compile"));

/// Whether the variable name denotes a categorical fixed effect, `C(<something>)`.
pub fn is_fixed_effect(name: &str) -> bool {
    FIXED_EFFECT.is_match(name)
}

/// Whether a model includes any fixed effect terms. Displays and serializes as `Yes` or `No`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FixedEffects {
    #[serde(rename = "Yes")]
    HasFixedEffects,
    #[serde(rename = "No")]
    NoFixedEffects,
}

impl FixedEffects {
    /// Whether at least one fixed effect term is present.
    pub fn is_yes(self) -> bool {
        self == FixedEffects::HasFixedEffects
    }

    /// `Yes` or `No`.
    pub fn as_str(self) -> &'static str {
        match self {
            FixedEffects::HasFixedEffects => "Yes",
            FixedEffects::NoFixedEffects => "No",
        }
    }
}

impl From<bool> for FixedEffects {
    fn from(has: bool) -> Self {
        if has {
            FixedEffects::HasFixedEffects
        } else {
            FixedEffects::NoFixedEffects
        }
    }
}

impl std::fmt::Display for FixedEffects {
    #[cfg_attr(coverage_nightly, coverage(off))]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FixedEffects {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(FixedEffects::HasFixedEffects),
            "No" => Ok(FixedEffects::NoFixedEffects),
            _ => Err(Error::InvalidFixedEffects(s.to_string())),
        }
    }
}

/// Check the model's term names for fixed effects.
pub fn model_has_fixed_effects(model: &impl FittedModel) -> FixedEffects {
    model
        .term_names()
        .iter()
        .any(|name| is_fixed_effect(name))
        .into()
}
