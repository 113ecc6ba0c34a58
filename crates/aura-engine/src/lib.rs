use std::path::{Path, PathBuf};

use serde_json::Value;

use aura_contracts::analysis::{AnalysisKind, AnalysisRequest, AnalysisResult, ImageRef};
use aura_contracts::errors::AuraError;
use aura_contracts::events::{Event, EventKind, EventWriter};
use aura_contracts::identity::{Identity, SessionStore};
use aura_contracts::store::{CachedEntry, ResultCache};

pub mod classify;
pub mod client;
pub mod fallback;
pub mod poller;
pub mod request;
pub mod skincare;

pub use client::{ApiClient, SignupDetails};
pub use poller::{CancelFlag, PollConfig};

use fallback::{RandomSeasons, SeasonSource};
use poller::TryOnTransport;
use request::TransportPayload;

/// Remote surface the engine drives: one inference call per read-style kind
/// plus the try-on job protocol. `ApiClient` is the production
/// implementation; tests script it.
pub trait InferenceBackend: TryOnTransport {
    fn analyze(
        &self,
        request: &AnalysisRequest,
        payload: &TransportPayload,
    ) -> Result<AnalysisResult, AuraError>;
}

impl InferenceBackend for ApiClient {
    fn analyze(
        &self,
        request: &AnalysisRequest,
        payload: &TransportPayload,
    ) -> Result<AnalysisResult, AuraError> {
        ApiClient::analyze(self, request, payload)
    }
}

/// Orchestration façade: remote-first analysis with local degradation,
/// bounded try-on polling, and a best-effort per-owner result cache.
pub struct StylistEngine {
    backend: Box<dyn InferenceBackend>,
    // Identity and profile calls always go to the real backend; the
    // pluggable seam only covers analysis and the job protocol.
    client: ApiClient,
    cache: ResultCache,
    sessions: SessionStore,
    events: EventWriter,
    seasons: Box<dyn SeasonSource>,
    poll_config: PollConfig,
}

impl StylistEngine {
    /// Engine over the real backend, with its store and event log under
    /// `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self::with_backend(data_dir, Box::new(ApiClient::new()))
    }

    pub fn with_backend(data_dir: impl Into<PathBuf>, backend: Box<dyn InferenceBackend>) -> Self {
        let data_dir = data_dir.into();
        let store_path = data_dir.join("store.json");
        let events = EventWriter::for_session(data_dir.join("events.jsonl"));
        Self {
            backend,
            client: ApiClient::new(),
            cache: ResultCache::with_events(&store_path, events.clone()),
            sessions: SessionStore::new(&store_path),
            events,
            seasons: Box::new(RandomSeasons),
            poll_config: PollConfig::default(),
        }
    }

    pub fn set_season_source(&mut self, seasons: Box<dyn SeasonSource>) {
        self.seasons = seasons;
    }

    pub fn set_poll_config(&mut self, config: PollConfig) {
        self.poll_config = config;
    }

    pub fn event_writer(&self) -> EventWriter {
        self.events.clone()
    }

    /// Identity persisted by the last successful login, if any.
    pub fn current_identity(&mut self) -> Option<Identity> {
        self.sessions.load()
    }

    pub fn analyze(
        &mut self,
        identity: Option<&Identity>,
        request: &AnalysisRequest,
    ) -> Result<AnalysisResult, AuraError> {
        self.analyze_with_cancel(identity, request, &CancelFlag::new())
    }

    /// As [`analyze`], with a cooperative cancel flag for the try-on poll
    /// loop. Read-style kinds ignore the flag; they make a single call.
    pub fn analyze_with_cancel(
        &mut self,
        identity: Option<&Identity>,
        request: &AnalysisRequest,
        cancel: &CancelFlag,
    ) -> Result<AnalysisResult, AuraError> {
        let kind = request.kind();
        let owner = identity.map(|identity| identity.owner_id.clone());
        self.log(
            Event::new(EventKind::AnalysisStarted)
                .analysis(kind)
                .owner(owner.as_deref()),
        );

        let payload = request::build(request, identity)?;

        if let AnalysisRequest::TryOnSynthesis { .. } = request {
            // build() rejected guest try-on already.
            let owner = owner.unwrap_or_default();
            return self.run_try_on(&owner, &payload, cancel);
        }

        let outcome = self.backend.analyze(request, &payload);
        let result = match outcome {
            Ok(result) => result,
            Err(err) if err.is_remote_unavailable() => {
                self.log(
                    Event::new(EventKind::RemoteFailed)
                        .analysis(kind)
                        .error(err.to_string()),
                );
                match self.recover_locally(request) {
                    Some(result) => {
                        self.log(Event::new(EventKind::FallbackEngaged).analysis(kind));
                        result
                    }
                    None => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        debug_assert_eq!(result.kind(), kind);
        if let Some(owner) = &owner {
            self.cache.put(owner, &result);
        }
        self.log(
            Event::new(EventKind::AnalysisCompleted)
                .analysis(kind)
                .owner(owner.as_deref()),
        );
        Ok(result)
    }

    /// Last stored result for `(owner, kind)`, if any.
    pub fn cached(&mut self, owner_id: &str, kind: AnalysisKind) -> Option<CachedEntry> {
        let entry = self.cache.get(owner_id, kind)?;
        self.log(
            Event::new(EventKind::CacheHit)
                .analysis(kind)
                .owner(Some(owner_id)),
        );
        Some(entry)
    }

    fn run_try_on(
        &mut self,
        owner_id: &str,
        payload: &TransportPayload,
        cancel: &CancelFlag,
    ) -> Result<AnalysisResult, AuraError> {
        self.log(Event::new(EventKind::JobSubmitted).owner(Some(owner_id)));
        match poller::run(
            self.backend.as_ref(),
            owner_id,
            payload,
            self.poll_config,
            cancel,
        ) {
            Ok((result, job)) => {
                self.log(
                    Event::new(EventKind::JobCompleted)
                        .field("job_id", job.id.clone())
                        .field("attempts", job.attempts_made),
                );
                Ok(AnalysisResult::TryOnSynthesis(result))
            }
            Err(err) => {
                let kind = match &err {
                    AuraError::JobTimeout { .. } => EventKind::JobTimeout,
                    _ => EventKind::JobFailed,
                };
                self.log(Event::new(kind).error(err.to_string()));
                Err(err)
            }
        }
    }

    // Local substitution for a failed remote read. None means the failure
    // must propagate (image-only body shape has no local classifier).
    fn recover_locally(&mut self, request: &AnalysisRequest) -> Option<AnalysisResult> {
        match request {
            AnalysisRequest::SkinTone { .. } => Some(AnalysisResult::SkinTone(
                fallback::skin_tone(self.seasons.as_mut()),
            )),
            AnalysisRequest::SkinCondition { .. } => {
                Some(AnalysisResult::SkinCondition(fallback::skin_condition()))
            }
            AnalysisRequest::OutfitRecommendation {
                occasion,
                weather,
                mood,
            } => Some(AnalysisResult::OutfitRecommendation(fallback::outfit(
                occasion, weather, mood,
            ))),
            AnalysisRequest::BodyShape {
                measurements: Some(measurements),
                ..
            } => Some(AnalysisResult::BodyShape(classify::classify_body_shape(
                measurements.bust,
                measurements.waist,
                measurements.hips,
            ))),
            AnalysisRequest::BodyShape { .. } | AnalysisRequest::TryOnSynthesis { .. } => None,
        }
    }

    // Logging never interferes with the operation it describes.
    fn log(&self, event: Event) {
        let _ = self.events.record(event);
    }
}

// --- identity operations ---------------------------------------------------
//
// Unlike read-style analyses these always surface their errors; there is no
// meaningful local substitute for authentication.

impl StylistEngine {
    pub fn login(
        &mut self,
        username: &str,
        password: &str,
        location: Option<(f64, f64)>,
    ) -> Result<Identity, AuraError> {
        let identity = self.client.login(username, password, location)?;
        if let Err(err) = self.sessions.save(&identity) {
            self.log(Event::new(EventKind::SessionError).error(format!("{err:#}")));
        }
        self.log(Event::new(EventKind::Login).owner(Some(&identity.owner_id)));
        Ok(identity)
    }

    pub fn signup(&mut self, details: &SignupDetails) -> Result<(), AuraError> {
        self.client.signup(details)
    }

    /// Clears the local session even when the remote call fails.
    pub fn logout(&mut self) -> Result<(), AuraError> {
        let remote = self.client.logout();
        if let Err(err) = self.sessions.clear() {
            self.log(Event::new(EventKind::SessionError).error(format!("{err:#}")));
        }
        self.log(Event::new(EventKind::Logout));
        remote
    }

    pub fn profile(&mut self, identity: &Identity) -> Result<Value, AuraError> {
        self.client.profile(&identity.owner_id)
    }

    pub fn update_settings(
        &mut self,
        identity: &Identity,
        dark_mode: Option<bool>,
        notifications: Option<bool>,
    ) -> Result<(), AuraError> {
        self.client
            .update_settings(&identity.owner_id, dark_mode, notifications)
    }

    pub fn weather_outfit(&mut self, season: &str, gender: &str) -> Result<Vec<Value>, AuraError> {
        self.client.weather_outfit(season, gender)
    }

    pub fn wardrobe_recommendation(&mut self, image: &ImageRef) -> Result<Vec<Value>, AuraError> {
        self.client.wardrobe_recommendation(image)
    }
}

pub fn default_data_dir() -> PathBuf {
    std::env::var("AURA_DATA_DIR")
        .ok()
        .map(PathBuf::from)
        .filter(|path| path != Path::new(""))
        .unwrap_or_else(|| PathBuf::from(".aura"))
}
