//! Threshold/easing derivation table
//!
//! Pure functions from (progress, parameter spec) to render parameters.
//! Nothing here holds state; every frame recomputes the whole table.

use serde::Serialize;

pub use stagehand_core::config::{Curve, DerivationConfig, ParameterSpec};

use crate::scroll::EasingTypeExt;

/// Value of one parameter for the given progress
pub fn derive(progress: f64, curve: &Curve) -> f64 {
    let p = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };

    match *curve {
        Curve::Offset {
            threshold,
            max_magnitude,
            easing,
        } => {
            if p < threshold {
                0.0
            } else {
                max_magnitude * easing.apply(p)
            }
        }
        Curve::FadeOut {
            hide_threshold,
            fade_speed,
        } => {
            if p >= hide_threshold {
                0.0
            } else {
                (1.0 - p * fade_speed).max(0.0)
            }
        }
        Curve::FadeIn {
            reveal_threshold,
            fade_speed,
        } => {
            if p < reveal_threshold {
                0.0
            } else {
                (p * fade_speed).min(1.0)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedValue {
    pub name: String,
    pub value: f64,
}

/// All derived parameters for one frame, in table order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DerivedParameters(Vec<DerivedValue>);

impl DerivedParameters {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|v| v.name == name).map(|v| v.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &DerivedValue> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, Default)]
pub struct DerivationTable {
    specs: Vec<ParameterSpec>,
}

impl DerivationTable {
    pub fn new(specs: Vec<ParameterSpec>) -> Self {
        Self { specs }
    }

    pub fn from_config(config: &DerivationConfig) -> Self {
        Self::new(config.parameters.clone())
    }

    pub fn derive_all(&self, progress: f64) -> DerivedParameters {
        DerivedParameters(
            self.specs
                .iter()
                .map(|spec| DerivedValue {
                    name: spec.name.clone(),
                    value: derive(progress, &spec.curve),
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scroll::EasingType;

    fn offset(threshold: f64) -> Curve {
        Curve::Offset {
            threshold,
            max_magnitude: -120.0,
            easing: EasingType::EaseOut,
        }
    }

    #[test]
    fn test_offset_rest_below_threshold() {
        let curve = offset(0.2);
        assert_eq!(derive(0.0, &curve), 0.0);
        assert_eq!(derive(0.19, &curve), 0.0);
        let at = derive(0.2, &curve);
        assert!((at - -120.0 * (1.0 - 2.0_f64.powf(-2.0))).abs() < 1e-9);
        assert_eq!(derive(1.0, &curve), -120.0);
    }

    #[test]
    fn test_offset_monotonic_above_threshold() {
        let curve = offset(0.03);
        let mut prev = 0.0_f64;
        for i in 3..=100 {
            let magnitude = derive(i as f64 / 100.0, &curve).abs();
            assert!(magnitude >= prev, "not monotonic at {}", i);
            prev = magnitude;
        }
    }

    #[test]
    fn test_fade_out() {
        let curve = Curve::FadeOut {
            hide_threshold: 0.6,
            fade_speed: 2.5,
        };
        assert_eq!(derive(0.0, &curve), 1.0);
        assert!((derive(0.2, &curve) - 0.5).abs() < 1e-9);
        assert_eq!(derive(0.45, &curve), 0.0);
        assert_eq!(derive(0.6, &curve), 0.0);
    }

    #[test]
    fn test_fade_in_independent_of_fade_out() {
        let fade_in = Curve::FadeIn {
            reveal_threshold: 0.03,
            fade_speed: 1.5,
        };
        let fade_out = Curve::FadeOut {
            hide_threshold: 0.6,
            fade_speed: 2.5,
        };
        assert_eq!(derive(0.02, &fade_in), 0.0);
        assert!((derive(0.2, &fade_in) - 0.3).abs() < 1e-9);
        assert_eq!(derive(0.9, &fade_in), 1.0);
        // Both partially visible in the overlap window
        let p = 0.2;
        let sum = derive(p, &fade_in) + derive(p, &fade_out);
        assert!((sum - 0.8).abs() < 1e-9);
    }

    #[test]
    fn test_derive_is_pure_and_clamps_input() {
        let table = DerivationTable::from_config(&DerivationConfig::default());
        assert_eq!(table.derive_all(0.37), table.derive_all(0.37));
        assert_eq!(table.derive_all(1.4), table.derive_all(1.0));
        assert_eq!(table.derive_all(-0.2), table.derive_all(0.0));
        assert_eq!(table.derive_all(f64::NAN), table.derive_all(0.0));
    }

    #[test]
    fn test_default_table_at_rest_and_revealed() {
        let table = DerivationTable::from_config(&DerivationConfig::default());
        let rest = table.derive_all(0.0);
        let names: Vec<&str> = rest.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["title_offset", "secondary_offset", "title_opacity", "element_opacity"]
        );
        assert_eq!(rest.get("title_offset"), Some(0.0));
        assert_eq!(rest.get("secondary_offset"), Some(0.0));
        assert_eq!(rest.get("title_opacity"), Some(1.0));
        assert_eq!(rest.get("element_opacity"), Some(0.0));

        let full = table.derive_all(1.0);
        assert_eq!(full.get("title_offset"), Some(-120.0));
        assert_eq!(full.get("title_opacity"), Some(0.0));
        assert_eq!(full.get("element_opacity"), Some(1.0));
        assert_eq!(full.get("missing"), None);
    }
}
