use serde::Deserialize;

/// The easing curves the tunnel animation uses. Selecting one in
/// `parameters.json` uses the lowercase/camelCase names (`linear`,
/// `inExpo`, `outCubic`); anything else fails deserialization, so a typo
/// aborts startup instead of silently animating wrong.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    Linear,
    InExpo,
    OutCubic,
}

impl Easing {
    /// Maps linear progress `t` in [0, 1] to eased progress in [0, 1].
    /// All three curves are exact at the endpoints: 0 ↦ 0 and 1 ↦ 1.
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Easing::Linear => t,
            Easing::InExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::OutCubic => 1.0 - (1.0 - t).powi(3),
        }
    }
}

/// Interpolates from `start` to `end` with eased progress.
pub fn tween(start: f32, end: f32, p: f32, easing: Easing) -> f32 {
    start + (end - start) * easing.apply(p)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        for easing in [Easing::Linear, Easing::InExpo, Easing::OutCubic].iter() {
            assert_eq!(easing.apply(0.0), 0.0, "{:?} at 0", easing);
            assert_eq!(easing.apply(1.0), 1.0, "{:?} at 1", easing);
        }
    }

    #[test]
    fn in_expo_accelerates() {
        // Slow start, late rush.
        assert!(Easing::InExpo.apply(0.5) < 0.05);
        assert!(Easing::InExpo.apply(0.9) < 0.6);
    }

    #[test]
    fn out_cubic_decelerates() {
        assert!(Easing::OutCubic.apply(0.5) > 0.5);
        assert!((Easing::OutCubic.apply(0.5) - 0.875).abs() < 1e-6);
    }

    #[test]
    fn tween_hits_both_ends() {
        assert_eq!(tween(500.0, 50.0, 0.0, Easing::OutCubic), 500.0);
        assert_eq!(tween(500.0, 50.0, 1.0, Easing::OutCubic), 50.0);
    }

    #[test]
    fn unknown_easing_name_is_rejected() {
        assert!(serde_json::from_str::<Easing>("\"inExpo\"").is_ok());
        assert!(serde_json::from_str::<Easing>("\"outCubic\"").is_ok());
        assert!(serde_json::from_str::<Easing>("\"bounce\"").is_err());
    }
}
