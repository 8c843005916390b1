//! Capability set of a playable video source.
//!
//! Concrete sources (manifest-backed, offline-stored, ...) live outside this
//! crate. They report their DRM scheme through [`DrmSchemeInfo`], which turns
//! into a [`LicenseRequest`] when the key system asks for a license.

use std::sync::Arc;

use async_trait::async_trait;

use crate::{LicenseError, LicenseRequest, Parameters, Result, Transport};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
    Text,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Track {
    pub id: u32,
    pub kind: TrackKind,
    pub lang: Option<String>,
    /// Bits per second. Zero for text tracks.
    pub bandwidth: u64,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub active: bool,
}

/// Limits on which video tracks may be selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Restrictions {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    pub min_bandwidth: Option<u64>,
    pub max_bandwidth: Option<u64>,
}

impl Restrictions {
    /// Whether `track` satisfies every limit. Non-video tracks always pass.
    pub fn allows(&self, track: &Track) -> bool {
        if track.kind != TrackKind::Video {
            return true;
        }
        let within = |value: Option<u32>, max: Option<u32>| match (value, max) {
            (Some(value), Some(max)) => value <= max,
            _ => true,
        };
        within(track.width, self.max_width)
            && within(track.height, self.max_height)
            && self.min_bandwidth.map_or(true, |min| track.bandwidth >= min)
            && self.max_bandwidth.map_or(true, |max| track.bandwidth <= max)
    }
}

/// DRM metadata reported by a source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrmSchemeInfo {
    /// Key system identifier, e.g. `com.widevine.alpha`. Empty for clear content.
    pub key_system: String,
    /// License server address; may be an inline `data:` address.
    pub license_server_url: String,
    /// Key system metadata only; requests built here never attach cookies.
    pub with_credentials: bool,
    pub distinctive_identifier: bool,
    pub persistent_state: bool,
    /// Restrictions imposed by the license or key system.
    pub restrictions: Restrictions,
}

impl DrmSchemeInfo {
    /// Whether the content is unencrypted.
    pub fn is_clear(&self) -> bool {
        self.key_system.is_empty()
    }

    /// Builds a request carrying `challenge` to this scheme's license server.
    pub fn license_request(&self, challenge: Vec<u8>) -> LicenseRequest {
        LicenseRequest::new(self.license_server_url.clone(), Some(challenge))
    }
}

/// The element a source attaches to for playback.
pub trait PlaybackSink: Send {
    /// Points the sink at the media the source produces.
    fn set_source(&mut self, locator: &str);
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Loads intermediate material such as a manifest.
    async fn load(&mut self, preferred_language: &str) -> Result<()>;

    /// Attaches to `sink`. Must not be called before [`VideoSource::load`] completes.
    async fn attach(&mut self, sink: &mut dyn PlaybackSink) -> Result<()>;

    /// DRM scheme of the loaded content, or `None` if it is not encrypted.
    fn drm_scheme_info(&self) -> Option<DrmSchemeInfo>;

    fn tracks(&self, kind: TrackKind) -> Vec<Track>;

    /// Returns `false` if no track of `kind` has the given id.
    fn select_track(&mut self, kind: TrackKind, id: u32, immediate: bool) -> bool;

    fn enable_text_track(&mut self, enabled: bool);

    /// Enables or disables bitrate adaptation.
    fn enable_adaptation(&mut self, enabled: bool);

    /// Tracks violating `restrictions` are ignored from now on.
    fn set_restrictions(&mut self, restrictions: Restrictions);

    /// Seconds of buffered media needed to resume after a stall.
    fn resume_threshold(&self) -> f64;

    async fn destroy(&mut self) -> Result<()>;
}

/// Fetches a license for `source`'s current DRM scheme over HTTP with
/// default retry parameters.
pub async fn fetch_license(source: &dyn VideoSource, challenge: Vec<u8>) -> Result<Vec<u8>> {
    let info = encrypted_scheme(source)?;
    info.license_request(challenge).send().await
}

/// Like [`fetch_license`], but through `transport` with `parameters`.
pub async fn fetch_license_with(
    source: &dyn VideoSource,
    challenge: Vec<u8>,
    transport: Arc<dyn Transport>,
    parameters: Parameters,
) -> Result<Vec<u8>> {
    let info = encrypted_scheme(source)?;
    info.license_request(challenge)
        .with_transport(transport)
        .with_parameters(parameters)
        .send()
        .await
}

fn encrypted_scheme(source: &dyn VideoSource) -> Result<DrmSchemeInfo> {
    source
        .drm_scheme_info()
        .filter(|info| !info.is_clear())
        .ok_or_else(|| LicenseError::Source("content is not encrypted".to_owned()))
}
