use aura_contracts::analysis::{AnalysisRequest, ImageRef};
use aura_contracts::errors::AuraError;
use aura_contracts::identity::Identity;

/// Transport-ready request: ordered text fields plus image attachments,
/// one-to-one with the multipart form the client sends.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportPayload {
    pub fields: Vec<(String, String)>,
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub field: String,
    pub file_name: String,
    pub image: ImageRef,
}

impl TransportPayload {
    fn new() -> Self {
        Self {
            fields: Vec::new(),
            attachments: Vec::new(),
        }
    }

    fn field(&mut self, name: &str, value: impl Into<String>) {
        self.fields.push((name.to_string(), value.into()));
    }

    fn attach(&mut self, field: &str, file_name: &str, image: &ImageRef) {
        self.attachments.push(Attachment {
            field: field.to_string(),
            file_name: file_name.to_string(),
            image: image.clone(),
        });
    }

    #[cfg(test)]
    pub fn field_value(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Assembles the transport payload for one analysis request.
///
/// The owner field is omitted for guest usage; identity is never mutated.
pub fn build(
    request: &AnalysisRequest,
    identity: Option<&Identity>,
) -> Result<TransportPayload, AuraError> {
    let mut payload = TransportPayload::new();
    if let Some(identity) = identity {
        payload.field("username", identity.owner_id.clone());
    }

    match request {
        AnalysisRequest::SkinTone { image } => {
            payload.attach("profile_pic", image.file_name(), image);
        }
        AnalysisRequest::SkinCondition { image } => {
            payload.attach("image", image.file_name(), image);
        }
        AnalysisRequest::BodyShape {
            image,
            measurements,
        } => {
            if image.is_none() && measurements.is_none() {
                return Err(AuraError::InvalidRequest(
                    "body shape analysis needs an image or a bust/waist/hips triple".to_string(),
                ));
            }
            if let Some(image) = image {
                payload.attach("profile_pic", image.file_name(), image);
            }
            if let Some(measurements) = measurements {
                if !measurements.all_positive() {
                    return Err(AuraError::InvalidRequest(
                        "measurements must be positive numbers".to_string(),
                    ));
                }
                payload.field("bust", format_measure(measurements.bust));
                payload.field("waist", format_measure(measurements.waist));
                payload.field("hips", format_measure(measurements.hips));
            }
        }
        AnalysisRequest::OutfitRecommendation {
            occasion,
            weather,
            mood,
        } => {
            payload.field("occasion", occasion.clone());
            payload.field("weather", weather.clone());
            payload.field("mood", mood.clone());
        }
        AnalysisRequest::TryOnSynthesis {
            person_image,
            garment_image,
        } => {
            if identity.is_none() {
                return Err(AuraError::InvalidRequest(
                    "virtual try-on requires a logged-in identity".to_string(),
                ));
            }
            payload.attach("vton_img", "user.jpg", person_image);
            payload.attach("garm_img", "clothing.jpg", garment_image);
        }
    }

    Ok(payload)
}

/// Wardrobe photos upload under a fixed name, like the try-on pair.
pub fn wardrobe_payload(image: &ImageRef) -> TransportPayload {
    let mut payload = TransportPayload::new();
    payload.attach("wardrobe_img", "wardrobe.jpg", image);
    payload
}

fn format_measure(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}
