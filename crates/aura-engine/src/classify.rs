use aura_contracts::analysis::{BodyShape, BodyShapeResult, Season};

/// A circumference counts as dominant when it exceeds another by more than 5%.
pub const DOMINANT_RATIO: f64 = 1.05;
/// A waist defines an hourglass when it is under 75% of both bust and hips.
pub const WAIST_DEFINITION_RATIO: f64 = 0.75;

/// Classifies a measurement triple into a body shape.
///
/// The guards are evaluated in this exact order and the first match wins;
/// a triple satisfying both the Pear and Apple conditions is a Pear. Callers
/// validate positivity before reaching this point.
pub fn classify_body_shape(bust: f64, waist: f64, hips: f64) -> BodyShapeResult {
    if hips > bust * DOMINANT_RATIO && hips > waist * DOMINANT_RATIO {
        return shape_result(BodyShape::Pear);
    }
    if bust > hips * DOMINANT_RATIO && bust > waist * DOMINANT_RATIO {
        return shape_result(BodyShape::InvertedTriangle);
    }
    if waist < bust * WAIST_DEFINITION_RATIO && waist < hips * WAIST_DEFINITION_RATIO {
        return shape_result(BodyShape::Hourglass);
    }
    if waist > bust * DOMINANT_RATIO || waist > hips * DOMINANT_RATIO {
        return shape_result(BodyShape::Apple);
    }
    shape_result(BodyShape::Rectangle)
}

pub fn shape_result(shape: BodyShape) -> BodyShapeResult {
    let (description, tips) = match shape {
        BodyShape::Rectangle => (
            "Your bust, waist, and hips are fairly uniform. You have an athletic silhouette.",
            "Define your waist with belts and cinch-waist dresses. Layers work great for you!",
        ),
        BodyShape::Pear => (
            "Your hips are wider than your bust and waist.",
            "Highlight your upper body with patterns and keep bottoms simple/dark.",
        ),
        BodyShape::InvertedTriangle => (
            "Your shoulders/bust are broader than your hips.",
            "Add volume to your lower body with A-line skirts or wide-leg pants.",
        ),
        BodyShape::Hourglass => (
            "Your waist is significantly smaller than your bust and hips.",
            "Embrace your curves! Fitted clothes are your best friend.",
        ),
        BodyShape::Apple => (
            "You carry weight around your midsection.",
            "Empire waistlines and structured jackets are perfect for elongation.",
        ),
    };
    BodyShapeResult {
        shape,
        description: description.to_string(),
        tips: tips.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeasonPalette {
    pub palette: [&'static str; 5],
    pub avoid: [&'static str; 3],
}

/// Fixed palette table; total over the four seasons.
pub fn season_palette(season: Season) -> SeasonPalette {
    match season {
        Season::Spring => SeasonPalette {
            palette: ["#FFD700", "#FF6347", "#98FB98", "#40E0D0", "#FFA07A"],
            avoid: ["#000000", "#FFFFFF", "#696969"],
        },
        Season::Summer => SeasonPalette {
            palette: ["#B0E0E6", "#E6E6FA", "#FFB6C1", "#708090", "#F08080"],
            avoid: ["#FFA500", "#FFD700", "#000000"],
        },
        Season::Autumn => SeasonPalette {
            palette: ["#8B4513", "#DAA520", "#556B2F", "#A0522D", "#CD853F"],
            avoid: ["#FF69B4", "#00FFFF", "#E6E6FA"],
        },
        Season::Winter => SeasonPalette {
            palette: ["#000000", "#FFFFFF", "#FF0000", "#000080", "#00FF00"],
            avoid: ["#DAA520", "#A0522D", "#F5F5DC"],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defined_waist_classifies_as_hourglass() {
        // Neither bust nor hips dominates; 24 < 27 (0.75 * 36) on both sides.
        let result = classify_body_shape(36.0, 24.0, 36.0);
        assert_eq!(result.shape, BodyShape::Hourglass);
    }

    #[test]
    fn uniform_triple_classifies_as_rectangle() {
        let result = classify_body_shape(36.0, 30.0, 36.0);
        assert_eq!(result.shape, BodyShape::Rectangle);
    }

    #[test]
    fn wide_hips_classify_as_pear() {
        let result = classify_body_shape(34.0, 28.0, 40.0);
        assert_eq!(result.shape, BodyShape::Pear);
    }

    #[test]
    fn broad_bust_classifies_as_inverted_triangle() {
        let result = classify_body_shape(42.0, 32.0, 36.0);
        assert_eq!(result.shape, BodyShape::InvertedTriangle);
    }

    #[test]
    fn thick_waist_classifies_as_apple() {
        let result = classify_body_shape(36.0, 40.0, 36.0);
        assert_eq!(result.shape, BodyShape::Apple);
    }

    #[test]
    fn pear_guard_wins_over_apple_guard() {
        // Hips and waist both exceed bust by more than 5%, which satisfies
        // the Apple condition too; the Pear guard is evaluated first.
        let result = classify_body_shape(30.0, 33.0, 40.0);
        assert_eq!(result.shape, BodyShape::Pear);
    }

    #[test]
    fn every_shape_carries_description_and_tips() {
        for (bust, waist, hips) in [
            (36.0, 30.0, 36.0),
            (34.0, 28.0, 40.0),
            (42.0, 32.0, 36.0),
            (36.0, 24.0, 36.0),
            (36.0, 40.0, 36.0),
        ] {
            let result = classify_body_shape(bust, waist, hips);
            assert!(!result.description.is_empty());
            assert!(!result.tips.is_empty());
        }
    }

    #[test]
    fn palette_table_is_total_with_fixed_sizes() {
        for season in Season::ALL {
            let entry = season_palette(season);
            assert_eq!(entry.palette.len(), 5);
            assert_eq!(entry.avoid.len(), 3);
        }
        assert_eq!(season_palette(Season::Winter).palette[0], "#000000");
        assert_eq!(season_palette(Season::Spring).avoid[0], "#000000");
    }
}
