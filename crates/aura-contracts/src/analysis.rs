use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Outfit slots in the order the backend and the fallback table fill them.
pub const OUTFIT_SLOTS: [&str; 4] = ["top", "bottom", "shoes", "accessory"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    SkinTone,
    SkinCondition,
    BodyShape,
    OutfitRecommendation,
    TryOnSynthesis,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::SkinTone => "skin_tone",
            AnalysisKind::SkinCondition => "skin_condition",
            AnalysisKind::BodyShape => "body_shape",
            AnalysisKind::OutfitRecommendation => "outfit_recommendation",
            AnalysisKind::TryOnSynthesis => "try_on_synthesis",
        }
    }

    /// Read-style kinds recover locally when the backend is unreachable and
    /// have their last result cached per owner.
    pub fn is_read_style(&self) -> bool {
        !matches!(self, AnalysisKind::TryOnSynthesis)
    }
}

/// Reference to an image the caller owns: a filesystem path, an http(s) URL,
/// or an inline `data:` payload. The orchestration layer never stores bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(pub String);

impl ImageRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_url(&self) -> bool {
        self.0.starts_with("data:")
    }

    /// Trailing path segment, used as the multipart file name.
    pub fn file_name(&self) -> &str {
        let candidate = self.0.rsplit('/').next().unwrap_or("");
        if candidate.is_empty() {
            "photo.jpg"
        } else {
            candidate
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    pub bust: f64,
    pub waist: f64,
    pub hips: f64,
}

impl Measurements {
    pub fn new(bust: f64, waist: f64, hips: f64) -> Self {
        Self { bust, waist, hips }
    }

    pub fn all_positive(&self) -> bool {
        self.bust > 0.0 && self.waist > 0.0 && self.hips > 0.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AnalysisRequest {
    SkinTone {
        image: ImageRef,
    },
    SkinCondition {
        image: ImageRef,
    },
    BodyShape {
        image: Option<ImageRef>,
        measurements: Option<Measurements>,
    },
    OutfitRecommendation {
        occasion: String,
        weather: String,
        mood: String,
    },
    TryOnSynthesis {
        person_image: ImageRef,
        garment_image: ImageRef,
    },
}

impl AnalysisRequest {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisRequest::SkinTone { .. } => AnalysisKind::SkinTone,
            AnalysisRequest::SkinCondition { .. } => AnalysisKind::SkinCondition,
            AnalysisRequest::BodyShape { .. } => AnalysisKind::BodyShape,
            AnalysisRequest::OutfitRecommendation { .. } => AnalysisKind::OutfitRecommendation,
            AnalysisRequest::TryOnSynthesis { .. } => AnalysisKind::TryOnSynthesis,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    Spring,
    Summer,
    Autumn,
    Winter,
}

impl Season {
    pub const ALL: [Season; 4] = [Season::Spring, Season::Summer, Season::Autumn, Season::Winter];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Spring => "Spring",
            Season::Summer => "Summer",
            Season::Autumn => "Autumn",
            Season::Winter => "Winter",
        }
    }

    pub fn parse(raw: &str) -> Option<Season> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "spring" => Some(Season::Spring),
            "summer" => Some(Season::Summer),
            "autumn" | "fall" => Some(Season::Autumn),
            "winter" => Some(Season::Winter),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyShape {
    Rectangle,
    Pear,
    InvertedTriangle,
    Hourglass,
    Apple,
}

impl BodyShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyShape::Rectangle => "Rectangle",
            BodyShape::Pear => "Pear",
            BodyShape::InvertedTriangle => "Inverted Triangle",
            BodyShape::Hourglass => "Hourglass",
            BodyShape::Apple => "Apple",
        }
    }

    pub fn parse(raw: &str) -> Option<BodyShape> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "rectangle" => Some(BodyShape::Rectangle),
            "pear" => Some(BodyShape::Pear),
            "inverted triangle" | "inverted_triangle" => Some(BodyShape::InvertedTriangle),
            "hourglass" => Some(BodyShape::Hourglass),
            "apple" => Some(BodyShape::Apple),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinToneResult {
    pub season: Season,
    pub palette: Vec<String>,
    pub avoid: Vec<String>,
    pub description: String,
    pub skin_tone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinConditionResult {
    pub label: String,
    pub confidence: u8,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyShapeResult {
    pub shape: BodyShape,
    pub description: String,
    pub tips: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitResult {
    pub items: IndexMap<String, String>,
    pub reasoning: String,
    pub tips: String,
    #[serde(default)]
    pub images: Vec<ImageRef>,
}

/// One step of a morning or evening skin-care routine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareStep {
    pub step: String,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareProduct {
    pub name: String,
    pub brand: String,
    pub image: ImageRef,
}

/// Care guidance for one skin-condition label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkinCarePlan {
    pub label: String,
    pub botanicals: String,
    pub morning: Vec<CareStep>,
    pub evening: Vec<CareStep>,
    pub products: Vec<CareProduct>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TryOnStatus {
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TryOnResult {
    pub status: TryOnStatus,
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload")]
pub enum AnalysisResult {
    SkinTone(SkinToneResult),
    SkinCondition(SkinConditionResult),
    BodyShape(BodyShapeResult),
    OutfitRecommendation(OutfitResult),
    TryOnSynthesis(TryOnResult),
}

impl AnalysisResult {
    pub fn kind(&self) -> AnalysisKind {
        match self {
            AnalysisResult::SkinTone(_) => AnalysisKind::SkinTone,
            AnalysisResult::SkinCondition(_) => AnalysisKind::SkinCondition,
            AnalysisResult::BodyShape(_) => AnalysisKind::BodyShape,
            AnalysisResult::OutfitRecommendation(_) => AnalysisKind::OutfitRecommendation,
            AnalysisResult::TryOnSynthesis(_) => AnalysisKind::TryOnSynthesis,
        }
    }
}

/// Builds the slot map in contract order.
pub fn outfit_items(
    top: impl Into<String>,
    bottom: impl Into<String>,
    shoes: impl Into<String>,
    accessory: impl Into<String>,
) -> IndexMap<String, String> {
    let mut items = IndexMap::new();
    items.insert("top".to_string(), top.into());
    items.insert("bottom".to_string(), bottom.into());
    items.insert("shoes".to_string(), shoes.into());
    items.insert("accessory".to_string(), accessory.into());
    items
}
