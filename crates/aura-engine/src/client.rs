use std::env;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use indexmap::IndexMap;
use reqwest::blocking::multipart::{Form as MultipartForm, Part as MultipartPart};
use reqwest::blocking::{Client as HttpClient, Response as HttpResponse};
use serde_json::{json, Value};

use aura_contracts::analysis::{
    outfit_items, AnalysisRequest, AnalysisResult, BodyShape, BodyShapeResult, ImageRef,
    OutfitResult, Season, SkinConditionResult, SkinToneResult, TryOnResult, TryOnStatus,
    OUTFIT_SLOTS,
};
use aura_contracts::errors::AuraError;
use aura_contracts::identity::Identity;
use aura_contracts::jobs::JobStatus;

use crate::classify::shape_result;
use crate::poller::{JobTicket, PollOutcome, SubmitOutcome, TryOnTransport};
use crate::request::{Attachment, TransportPayload};

const DEFAULT_API_BASE: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT_S: f64 = 30.0;

/// Blocking HTTP client for the inference backend. One operation per
/// endpoint; no retries, no cache access, no state beyond the connection
/// pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    api_base: String,
    http: HttpClient,
}

impl ApiClient {
    pub fn new() -> Self {
        let api_base = env::var("AURA_API_BASE")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        Self::with_base(api_base)
    }

    pub fn with_base(api_base: impl Into<String>) -> Self {
        let timeout_s = env::var("AURA_HTTP_TIMEOUT")
            .ok()
            .and_then(|value| value.trim().parse::<f64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_S)
            .clamp(5.0, 120.0);
        let http = HttpClient::builder()
            .timeout(Duration::from_secs_f64(timeout_s))
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            http,
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    /// One remote inference call for a read-style request. The try-on kind
    /// goes through [`TryOnTransport`] instead.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        payload: &TransportPayload,
    ) -> Result<AnalysisResult, AuraError> {
        match request {
            AnalysisRequest::SkinTone { .. } => {
                let body = self.post_multipart("api/skin-tone-detection", payload)?;
                Ok(AnalysisResult::SkinTone(normalize_skin_tone(&body)))
            }
            AnalysisRequest::SkinCondition { .. } => {
                let body = self.post_multipart("api/skin-analysis", payload)?;
                Ok(AnalysisResult::SkinCondition(normalize_skin_condition(
                    &body,
                )))
            }
            AnalysisRequest::BodyShape { .. } => {
                let body = self.post_multipart("api/body-shape-analysis", payload)?;
                Ok(AnalysisResult::BodyShape(normalize_body_shape(&body)?))
            }
            AnalysisRequest::OutfitRecommendation { .. } => {
                let body = self.post_multipart("api/outfit-recommendation", payload)?;
                Ok(AnalysisResult::OutfitRecommendation(normalize_outfit(
                    &body,
                )))
            }
            AnalysisRequest::TryOnSynthesis { .. } => Err(AuraError::InvalidRequest(
                "try-on synthesis is driven by the job poller".to_string(),
            )),
        }
    }

    pub fn login(
        &self,
        username: &str,
        password: &str,
        location: Option<(f64, f64)>,
    ) -> Result<Identity, AuraError> {
        let mut form = MultipartForm::new()
            .text("username", username.to_ascii_lowercase())
            .text("password", password.to_string());
        if let Some((latitude, longitude)) = location {
            form = form
                .text("latitude", latitude.to_string())
                .text("longitude", longitude.to_string());
        }

        let body = self.send_multipart("login", form)?;
        let user = body.get("user").and_then(Value::as_object);
        let owner_id = user
            .and_then(|user| user.get("username"))
            .and_then(Value::as_str)
            .unwrap_or(username)
            .to_string();
        let display_name = user
            .and_then(|user| user.get("name"))
            .and_then(Value::as_str)
            .unwrap_or(&owner_id)
            .to_string();
        let session_token = body
            .get("token")
            .or_else(|| user.and_then(|user| user.get("token")))
            .and_then(Value::as_str)
            .map(str::to_string);
        Ok(Identity {
            owner_id,
            display_name,
            session_token,
        })
    }

    pub fn signup(&self, details: &SignupDetails) -> Result<(), AuraError> {
        let form = MultipartForm::new()
            .text("name", details.name.clone())
            .text("username", normalize_username(&details.username))
            .text("email", details.email.to_ascii_lowercase())
            .text("phone", details.phone.clone())
            .text("password", details.password.clone());
        self.send_multipart("signup", form)?;
        Ok(())
    }

    /// Best effort; a dead backend must not block a local logout.
    pub fn logout(&self) -> Result<(), AuraError> {
        let response = self
            .http
            .get(self.endpoint("logout"))
            .send()
            .map_err(|err| AuraError::RemoteUnavailable(transport_error_text(&err)))?;
        if !response.status().is_success() {
            return Err(remote_error("logout", response));
        }
        Ok(())
    }

    pub fn profile(&self, owner_id: &str) -> Result<Value, AuraError> {
        let response = self
            .http
            .get(self.endpoint("profile"))
            .query(&[("username", owner_id)])
            .send()
            .map_err(|err| AuraError::RemoteUnavailable(transport_error_text(&err)))?;
        json_or_remote_error("profile fetch", response)
    }

    pub fn update_settings(
        &self,
        owner_id: &str,
        dark_mode: Option<bool>,
        notifications: Option<bool>,
    ) -> Result<(), AuraError> {
        let mut form = MultipartForm::new().text("username", owner_id.to_string());
        if let Some(dark_mode) = dark_mode {
            form = form.text("dark_mode", dark_mode.to_string());
        }
        if let Some(notifications) = notifications {
            form = form.text("notifications", notifications.to_string());
        }
        self.send_multipart("api/update-settings", form)?;
        Ok(())
    }

    /// Outfit suggestions built from a photo of the caller's wardrobe.
    pub fn wardrobe_recommendation(&self, image: &ImageRef) -> Result<Vec<Value>, AuraError> {
        let payload = crate::request::wardrobe_payload(image);
        let body = self.post_multipart("api/wardrobe-recommendation", &payload)?;
        Ok(body
            .get("recommendations")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    pub fn weather_outfit(&self, season: &str, gender: &str) -> Result<Vec<Value>, AuraError> {
        let response = self
            .http
            .post(self.endpoint("api/weather-outfit"))
            .json(&json!({ "season": season, "gender": gender }))
            .send()
            .map_err(|err| AuraError::RemoteUnavailable(transport_error_text(&err)))?;
        let body = json_or_remote_error("weather outfit", response)?;
        Ok(body
            .get("recommendations")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default())
    }

    fn post_multipart(
        &self,
        path: &str,
        payload: &TransportPayload,
    ) -> Result<Value, AuraError> {
        let mut form = MultipartForm::new();
        for (name, value) in &payload.fields {
            form = form.text(name.clone(), value.clone());
        }
        for attachment in &payload.attachments {
            form = form.part(attachment.field.clone(), attachment_part(attachment)?);
        }
        self.send_multipart(path, form)
    }

    fn send_multipart(&self, path: &str, form: MultipartForm) -> Result<Value, AuraError> {
        let endpoint = self.endpoint(path);
        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .map_err(|err| AuraError::RemoteUnavailable(transport_error_text(&err)))?;
        json_or_remote_error(path, response)
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TryOnTransport for ApiClient {
    fn submit(
        &self,
        owner_id: &str,
        payload: &TransportPayload,
    ) -> Result<SubmitOutcome, AuraError> {
        let body = self.post_multipart("run_virtual_try_on", payload)?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .and_then(JobStatus::parse)
            .unwrap_or(JobStatus::Completed);
        match status {
            JobStatus::Completed => Ok(SubmitOutcome::Done(TryOnResult {
                status: TryOnStatus::Completed,
                images: self.completed_images(&body)?,
            })),
            JobStatus::Failed => Err(AuraError::JobFailed(
                error_message(&body).unwrap_or_else(|| "virtual try-on failed".to_string()),
            )),
            // The backend tags poll URLs with the fixed upload names.
            _ => Ok(SubmitOutcome::Accepted(JobTicket {
                owner_id: owner_id.to_string(),
                person_tag: "user".to_string(),
                garment_tag: "clothing".to_string(),
            })),
        }
    }

    fn poll(&self, ticket: &JobTicket) -> Result<PollOutcome, AuraError> {
        let path = format!(
            "check_status/{}/{}/{}",
            ticket.owner_id, ticket.person_tag, ticket.garment_tag
        );
        let response = self
            .http
            .get(self.endpoint(&path))
            .send()
            .map_err(|err| AuraError::RemoteUnavailable(transport_error_text(&err)))?;
        let body = json_or_remote_error("job status", response)?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .and_then(JobStatus::parse)
            .unwrap_or(JobStatus::Processing);
        match status {
            JobStatus::Completed => Ok(PollOutcome::Completed(self.completed_images(&body)?)),
            JobStatus::Failed => Ok(PollOutcome::Failed(
                error_message(&body).unwrap_or_else(|| "virtual try-on failed".to_string()),
            )),
            other => Ok(PollOutcome::Pending(other)),
        }
    }
}

impl ApiClient {
    /// A completed body must carry both result paths; anything less is a
    /// contract fault, like an unrecognized body-shape label.
    fn completed_images(&self, body: &Value) -> Result<Vec<ImageRef>, AuraError> {
        let images: Vec<ImageRef> = ["img_one", "img_two"]
            .iter()
            .filter_map(|key| body.get(*key).and_then(Value::as_str))
            .map(|path| ImageRef::new(format!("{}/{}", self.api_base, path.trim_start_matches('/'))))
            .collect();
        if images.len() < 2 {
            return Err(AuraError::RemoteUnavailable(
                "completed try-on response is missing its result images".to_string(),
            ));
        }
        Ok(images)
    }
}

#[derive(Debug, Clone)]
pub struct SignupDetails {
    pub name: String,
    pub username: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

fn attachment_part(attachment: &Attachment) -> Result<MultipartPart, AuraError> {
    let bytes = image_bytes(&attachment.image)?;
    MultipartPart::bytes(bytes)
        .file_name(attachment.file_name.clone())
        .mime_str("image/jpeg")
        .map_err(|err| AuraError::InvalidRequest(format!("bad attachment mime: {err}")))
}

fn image_bytes(image: &ImageRef) -> Result<Vec<u8>, AuraError> {
    let raw = image.as_str();
    if image.is_data_url() {
        let encoded = raw.split_once(',').map(|(_, rest)| rest).unwrap_or("");
        return BASE64.decode(encoded.as_bytes()).map_err(|err| {
            AuraError::InvalidRequest(format!("inline image base64 decode failed: {err}"))
        });
    }
    let path = raw.strip_prefix("file://").unwrap_or(raw);
    std::fs::read(path)
        .map_err(|err| AuraError::InvalidRequest(format!("cannot read image {path}: {err}")))
}

fn remote_error(op: &str, response: HttpResponse) -> AuraError {
    let status = response.status();
    let body = response.text().unwrap_or_default();
    let message = parse_error_message(&body)
        .unwrap_or_else(|| format!("{op} failed ({})", status.as_u16()));
    AuraError::RemoteUnavailable(message)
}

/// Success bodies must be JSON; anything else is a normalized
/// `RemoteUnavailable` carrying the backend's `error` message when present.
fn json_or_remote_error(op: &str, response: HttpResponse) -> Result<Value, AuraError> {
    if !response.status().is_success() {
        return Err(remote_error(op, response));
    }
    let body = response.text().unwrap_or_default();
    serde_json::from_str(&body).map_err(|_| {
        AuraError::RemoteUnavailable(format!(
            "{op} returned a non-JSON body: {}",
            truncate_text(&body, 200)
        ))
    })
}

fn parse_error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .get("error")
        .or_else(|| parsed.get("message"))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn error_message(body: &Value) -> Option<String> {
    body.get("error")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn transport_error_text(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        "connection failed".to_string()
    } else {
        truncate_text(&err.to_string(), 300)
    }
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    let prefix: String = value.chars().take(max_chars).collect();
    format!("{prefix}…")
}

fn normalize_username(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect()
}

// --- payload normalization -------------------------------------------------
//
// Backend field names are re-shaped into the shared result schema; a missing
// optional field takes the documented default.

pub(crate) fn normalize_skin_tone(body: &Value) -> SkinToneResult {
    let season = body
        .get("season")
        .and_then(Value::as_str)
        .and_then(Season::parse)
        .unwrap_or(Season::Spring);
    SkinToneResult {
        season,
        palette: string_list(body.get("recommended_colors")),
        avoid: string_list(body.get("avoid_colors")),
        description: body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("Skin tone analyzed successfully")
            .to_string(),
        skin_tone: body
            .get("skin_tone")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

pub(crate) fn normalize_skin_condition(body: &Value) -> SkinConditionResult {
    let label = body
        .get("skin_type")
        .and_then(Value::as_str)
        .unwrap_or("Normal")
        .to_string();
    let confidence = body
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(85.0)
        .clamp(0.0, 100.0) as u8;
    let description = body
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("Detected {label} skin condition."));
    SkinConditionResult {
        label,
        confidence,
        description,
    }
}

pub(crate) fn normalize_body_shape(body: &Value) -> Result<BodyShapeResult, AuraError> {
    let shape = body
        .get("body_shape")
        .and_then(Value::as_str)
        .and_then(BodyShape::parse)
        .ok_or_else(|| {
            AuraError::RemoteUnavailable("backend returned an unrecognized body shape".to_string())
        })?;
    let defaults = shape_result(shape);
    Ok(BodyShapeResult {
        shape,
        description: body
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or(&defaults.description)
            .to_string(),
        tips: body
            .get("styling_tips")
            .and_then(Value::as_str)
            .unwrap_or(&defaults.tips)
            .to_string(),
    })
}

pub(crate) fn normalize_outfit(body: &Value) -> OutfitResult {
    // serde_json objects iterate alphabetically; re-impose slot order.
    let mut items: IndexMap<String, String> = IndexMap::new();
    if let Some(map) = body.get("items").and_then(Value::as_object) {
        for slot in OUTFIT_SLOTS {
            if let Some(item) = map.get(slot).and_then(Value::as_str) {
                items.insert(slot.to_string(), item.to_string());
            }
        }
        for (slot, value) in map {
            if let (false, Some(item)) = (items.contains_key(slot), value.as_str()) {
                items.insert(slot.clone(), item.to_string());
            }
        }
    }
    if items.is_empty() {
        items = outfit_items(
            "Recommended Top",
            "Recommended Bottom",
            "Recommended Shoes",
            "Recommended Accessory",
        );
    }
    OutfitResult {
        items,
        reasoning: body
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or("AI-powered recommendation")
            .to_string(),
        tips: body
            .get("tips")
            .and_then(Value::as_str)
            .unwrap_or("Style tip for your outfit")
            .to_string(),
        images: string_list(body.get("images"))
            .into_iter()
            .map(ImageRef::new)
            .collect(),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|rows| {
            rows.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
