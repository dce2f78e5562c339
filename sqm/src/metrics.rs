//! Illuminance to sky-quality conversion.
//!
//! Pure math over a single lux value: SQM surface brightness, naked-eye
//! limiting magnitude, and a Bortle-scale classification. No I/O.

use crate::units::{Illuminance, Magnitude};

/// Smallest illuminance fed into the logarithm. Readings at or below
/// zero clamp to this value instead of failing.
pub const MIN_MEASURABLE_LUX: f64 = 0.0001;

/// Illuminance that maps to SQM 0.0 in the empirical fit.
const REFERENCE_LUX: f64 = 108_000.0;

/// Slope of the empirical lux-to-magnitude fit, fixed at design time.
const SQM_SLOPE: f64 = -0.45;

#[derive(Copy, Clone, PartialEq, Debug)]
pub struct SkyMetrics {
    pub sqm: Magnitude,
    pub nelm: Magnitude,
    pub bortle: Bortle,
}

/// One tier of the Bortle classification: display text plus the hex
/// RGB color the overlay renders it in.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Bortle {
    pub rating: &'static str,
    pub color: &'static str,
}

/// Ascending SQM upper bounds; the first strictly-greater entry wins.
const BORTLE_SCALE: &[(f64, Bortle)] = &[
    (
        18.0,
        Bortle {
            rating: "Very bright (Bortle 8-9, inner city)",
            color: "#FF0000",
        },
    ),
    (
        19.5,
        Bortle {
            rating: "Bright (Bortle 7-8, city edge)",
            color: "#FF8000",
        },
    ),
    (
        20.5,
        Bortle {
            rating: "Moderate (Bortle 5-6, suburban)",
            color: "#FFFF00",
        },
    ),
    (
        21.3,
        Bortle {
            rating: "Good (Bortle 4-5, rural)",
            color: "#80FF00",
        },
    ),
    (
        21.8,
        Bortle {
            rating: "Dark (Bortle 3-4, rural)",
            color: "#00FF00",
        },
    ),
    (
        f64::INFINITY,
        Bortle {
            rating: "Excellent (Bortle 1-2, very dark sky)",
            color: "#00FFFF",
        },
    ),
];

/// Clamp a reading to the smallest measurable illuminance. A sensor
/// dark floor or an absent TSL2561 reading arrives here as zero.
pub fn clamp(illuminance: Illuminance) -> Illuminance {
    if illuminance.as_lux() <= 0.0 {
        Illuminance::from_lux(MIN_MEASURABLE_LUX)
    } else {
        illuminance
    }
}

/// Derive the full metric set from one illuminance sample.
pub fn derive(illuminance: Illuminance, offset: Magnitude) -> SkyMetrics {
    let lux = clamp(illuminance).as_lux();
    let sqm = Magnitude::from_mags((lux / REFERENCE_LUX).log10() / SQM_SLOPE + offset.as_mags());
    let nelm = Magnitude::from_mags(
        7.93 - 5.0 * (10f64.powf(4.316 - sqm.as_mags() / 5.0) + 1.0).log10(),
    );
    SkyMetrics {
        sqm,
        nelm,
        bortle: classify(sqm),
    }
}

/// Pick the Bortle tier for an SQM value. Total over all inputs; a NaN
/// (which compares false against every bound) lands in the darkest
/// tier.
pub fn classify(sqm: Magnitude) -> Bortle {
    let mags = sqm.as_mags();
    BORTLE_SCALE
        .iter()
        .find(|(upper, _)| mags < *upper)
        .map(|(_, bortle)| *bortle)
        .unwrap_or(BORTLE_SCALE[BORTLE_SCALE.len() - 1].1)
}

/// The overlay renderer only guarantees a basic character set; replace
/// diacritics and typographic dashes before text reaches it.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2013}' => out.push('-'),
            'ä' => out.push_str("ae"),
            'ö' => out.push_str("oe"),
            'ü' => out.push_str("ue"),
            'Ä' => out.push_str("Ae"),
            'Ö' => out.push_str("Oe"),
            'Ü' => out.push_str("Ue"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn derive_lux(lux: f64, offset: f64) -> SkyMetrics {
        derive(Illuminance::from_lux(lux), Magnitude::from_mags(offset))
    }

    #[test]
    fn non_positive_readings_clamp_identically() {
        let at_epsilon = derive_lux(MIN_MEASURABLE_LUX, 0.0);
        for lux in [0.0, -0.001, -5000.0] {
            let m = derive_lux(lux, 0.0);
            assert_relative_eq!(m.sqm.as_mags(), at_epsilon.sqm.as_mags());
            assert_relative_eq!(m.nelm.as_mags(), at_epsilon.nelm.as_mags());
            assert_eq!(m.bortle, at_epsilon.bortle);
        }
    }

    #[test]
    fn offset_is_strictly_additive() {
        for lux in [0.5, 42.0, 108_000.0] {
            let base = derive_lux(lux, 0.0);
            for offset in [-1.5, 0.25, 3.0] {
                let shifted = derive_lux(lux, offset);
                assert_relative_eq!(
                    shifted.sqm.as_mags(),
                    base.sqm.as_mags() + offset,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn reference_lux_anchors_sqm_zero() {
        let m = derive_lux(108_000.0, 0.0);
        assert_relative_eq!(m.sqm.as_mags(), 0.0);
        assert_relative_eq!(m.nelm.as_mags(), -13.65025, epsilon = 1e-4);
        assert_eq!(m.bortle.color, "#FF0000");
        assert!(m.bortle.rating.starts_with("Very bright"));
    }

    #[test]
    fn tier_boundaries_are_strictly_less_than() {
        let cases = [
            (17.999, "#FF0000"),
            (18.0, "#FF8000"),
            (19.5, "#FFFF00"),
            (20.5, "#80FF00"),
            (21.3, "#00FF00"),
            (21.8, "#00FFFF"),
            (25.0, "#00FFFF"),
        ];
        for (mags, color) in cases {
            assert_eq!(
                classify(Magnitude::from_mags(mags)).color,
                color,
                "sqm {mags}"
            );
        }
    }

    #[test]
    fn classification_is_total() {
        let mut mags = -10.0;
        while mags < 30.0 {
            let bortle = classify(Magnitude::from_mags(mags));
            assert!(!bortle.rating.is_empty());
            assert!(bortle.color.starts_with('#'));
            mags += 0.05;
        }
        // NaN falls through every bound and lands in the darkest tier
        assert_eq!(classify(Magnitude::from_mags(f64::NAN)).color, "#00FFFF");
    }

    #[test]
    fn clamped_floor_is_a_finite_dark_reading() {
        let m = derive_lux(0.0, 0.0);
        assert_relative_eq!(m.sqm.as_mags(), 20.0742, epsilon = 1e-3);
        assert_eq!(m.bortle.color, "#FFFF00");
    }

    #[test]
    fn sanitize_transliterates() {
        assert_eq!(sanitize("Grün \u{2013} Über"), "Gruen - Ueber");
        assert_eq!(sanitize("plain ascii"), "plain ascii");
    }
}
