use rand::Rng;

use aura_contracts::analysis::{
    outfit_items, OutfitResult, Season, SkinConditionResult, SkinToneResult,
};

use crate::classify::season_palette;

/// Source of the randomly chosen fallback season. Injected so tests can pin
/// the season; the synthesized result is an illustrative stand-in, not a
/// model output.
pub trait SeasonSource: Send {
    fn pick(&mut self) -> Season;
}

/// Uniform choice over the four seasons.
#[derive(Debug, Default)]
pub struct RandomSeasons;

impl SeasonSource for RandomSeasons {
    fn pick(&mut self) -> Season {
        let idx = rand::thread_rng().gen_range(0..Season::ALL.len());
        Season::ALL[idx]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedSeason(pub Season);

impl SeasonSource for FixedSeason {
    fn pick(&mut self) -> Season {
        self.0
    }
}

pub fn skin_tone(seasons: &mut dyn SeasonSource) -> SkinToneResult {
    let season = seasons.pick();
    let entry = season_palette(season);
    SkinToneResult {
        season,
        palette: entry.palette.iter().map(|c| c.to_string()).collect(),
        avoid: entry.avoid.iter().map(|c| c.to_string()).collect(),
        description: format!("You have a {} complexion.", season.as_str()),
        skin_tone: Some("Medium".to_string()),
    }
}

pub fn skin_condition() -> SkinConditionResult {
    SkinConditionResult {
        label: "Normal".to_string(),
        confidence: 70,
        description: "Analysis completed with fallback logic.".to_string(),
    }
}

/// Deterministic rule table: occasion overrides the base garments, cold
/// weather layers the top.
pub fn outfit(occasion: &str, weather: &str, mood: &str) -> OutfitResult {
    let mut top = "Classic White Tee".to_string();
    let mut bottom = "Blue Denim Jeans".to_string();
    let mut shoes = "White Sneakers".to_string();
    let mut accessory = "Minimalist Watch".to_string();
    let mut tips = "A timeless look that works for everything.".to_string();

    match occasion {
        "Date Night" => {
            top = "Silk Button-Down".to_string();
            bottom = "Tailored Chinos".to_string();
            shoes = "Leather Loafers".to_string();
            accessory = "Gold Chain".to_string();
            tips = "Sleek and sophisticated. The silk fabric adds a touch of romance.".to_string();
        }
        "Work" => {
            top = "Structured Blazer".to_string();
            bottom = "Pleated Trousers".to_string();
            shoes = "Oxford Shoes".to_string();
            tips = "Professional yet stylish. Commands respect while keeping you comfortable."
                .to_string();
        }
        "Party" => {
            top = "Sequin Top".to_string();
            bottom = "Leather Skirt/Pants".to_string();
            shoes = "Statement Heels/Boots".to_string();
            tips = "Bold and high-energy. Shows off your confidence!".to_string();
        }
        _ => {}
    }

    if weather == "Cold" {
        top = format!("Chunky Knit Sweater over {top}");
        tips.push_str(" The layering keeps you warm without losing style points.");
    }

    OutfitResult {
        items: outfit_items(top, bottom, shoes, accessory),
        reasoning: format!("Based on your {mood} mood for {occasion}."),
        tips,
        images: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_season_drives_the_palette() {
        let mut seasons = FixedSeason(Season::Winter);
        let result = skin_tone(&mut seasons);
        assert_eq!(result.season, Season::Winter);
        assert_eq!(result.palette.len(), 5);
        assert_eq!(result.avoid.len(), 3);
        assert_eq!(result.palette[0], "#000000");
        assert!(result.description.contains("Winter"));
    }

    #[test]
    fn random_source_stays_within_the_four_seasons() {
        let mut seasons = RandomSeasons;
        for _ in 0..32 {
            assert!(Season::ALL.contains(&seasons.pick()));
        }
    }

    #[test]
    fn skin_condition_fallback_is_fixed() {
        let result = skin_condition();
        assert_eq!(result.label, "Normal");
        assert_eq!(result.confidence, 70);
    }

    #[test]
    fn outfit_default_row_matches_the_table() {
        let result = outfit("Casual", "Mild", "Relaxed");
        assert_eq!(result.items["top"], "Classic White Tee");
        assert_eq!(result.items["bottom"], "Blue Denim Jeans");
        assert_eq!(result.items["shoes"], "White Sneakers");
        assert_eq!(result.items["accessory"], "Minimalist Watch");
        assert_eq!(result.reasoning, "Based on your Relaxed mood for Casual.");
    }

    #[test]
    fn occasion_overrides_garments() {
        let result = outfit("Date Night", "Mild", "Romantic");
        assert_eq!(result.items["top"], "Silk Button-Down");
        assert_eq!(result.items["accessory"], "Gold Chain");

        let result = outfit("Work", "Mild", "Focused");
        assert_eq!(result.items["top"], "Structured Blazer");
        // Work keeps the default accessory.
        assert_eq!(result.items["accessory"], "Minimalist Watch");
    }

    #[test]
    fn cold_weather_layers_the_top() {
        let result = outfit("Party", "Cold", "Festive");
        assert_eq!(
            result.items["top"],
            "Chunky Knit Sweater over Sequin Top"
        );
        assert!(result.tips.ends_with("style points."));
    }
}
