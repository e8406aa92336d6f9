//! Network degradation.
//!
//! The host's network primitive is an `Arc<dyn Fetcher>`. Applying a profile
//! wraps whatever primitive is current in a [`ThrottledFetcher`] that adds
//! latency, fails every call when offline, and drops a fraction of calls on
//! lossy profiles. The primitive seen before the first apply is remembered so
//! [`reset_network`] restores that exact `Arc`, however many profiles were
//! stacked.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::NetworkError;
use crate::host::{Host, NetworkSettings};

/// Request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// Fetch the body.
    Get,
    /// Probe for existence only.
    Head,
}

/// A request issued through the network primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    /// Request method.
    pub method: Method,
    /// Origin-relative URL, e.g. `/data/calm_breathing_free.json`.
    pub url: String,
}

impl FetchRequest {
    /// A GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
        }
    }

    /// A HEAD request.
    pub fn head(url: impl Into<String>) -> Self {
        Self {
            method: Method::Head,
            url: url.into(),
        }
    }
}

/// A successful response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// URL that was requested.
    pub url: String,
    /// Response body. Empty for HEAD.
    pub body: Vec<u8>,
    /// Size of the resource, reported for HEAD as well.
    pub content_length: usize,
}

impl FetchResponse {
    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// The ambient network primitive.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Issue one request.
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError>;
}

/// In-memory origin serving fixed resources.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    resources: BTreeMap<String, Vec<u8>>,
    requests: AtomicUsize,
}

impl StaticFetcher {
    /// Serve `body` at `url`.
    pub fn with_resource(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.resources.insert(url.into(), body.into());
        self
    }

    /// Number of requests that reached this origin.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        let body = self
            .resources
            .get(&request.url)
            .ok_or_else(|| NetworkError::NotFound {
                url: request.url.clone(),
            })?;
        Ok(FetchResponse {
            content_length: body.len(),
            body: match request.method {
                Method::Get => body.clone(),
                Method::Head => Vec::new(),
            },
            url: request.url,
        })
    }
}

/// A named network condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NetworkProfile {
    /// Stable id.
    pub id: &'static str,
    /// Human-readable description.
    pub description: &'static str,
    /// Latency added before every request.
    pub latency_ms: u64,
    /// Download throughput. `None` means unthrottled.
    pub download_kbps: Option<u64>,
    /// Fraction of requests dropped, 0.0 to 1.0.
    pub packet_loss: f64,
    /// Every request fails immediately.
    pub offline: bool,
}

impl NetworkProfile {
    /// Simulated time to deliver `bytes` at this profile's throughput.
    pub fn transfer_time(&self, bytes: usize) -> Duration {
        match self.download_kbps {
            Some(kbps) if kbps > 0 => Duration::from_millis((bytes as u64 * 8) / kbps),
            _ => Duration::ZERO,
        }
    }
}

static PROFILES: [NetworkProfile; 6] = [
    NetworkProfile {
        id: "offline",
        description: "No connectivity",
        latency_ms: 0,
        download_kbps: None,
        packet_loss: 0.0,
        offline: true,
    },
    NetworkProfile {
        id: "slow_3g",
        description: "Slow 3G",
        latency_ms: 2000,
        download_kbps: Some(400),
        packet_loss: 0.0,
        offline: false,
    },
    NetworkProfile {
        id: "fast_3g",
        description: "Fast 3G",
        latency_ms: 562,
        download_kbps: Some(1600),
        packet_loss: 0.0,
        offline: false,
    },
    NetworkProfile {
        id: "4g",
        description: "Typical 4G",
        latency_ms: 170,
        download_kbps: Some(9000),
        packet_loss: 0.0,
        offline: false,
    },
    NetworkProfile {
        id: "broadband",
        description: "Wired broadband",
        latency_ms: 20,
        download_kbps: Some(50_000),
        packet_loss: 0.0,
        offline: false,
    },
    NetworkProfile {
        id: "lossy_3g",
        description: "Fast 3G dropping one request in five",
        latency_ms: 562,
        download_kbps: Some(1600),
        packet_loss: 0.2,
        offline: false,
    },
];

/// Every network profile.
pub fn network_profiles() -> &'static [NetworkProfile] {
    &PROFILES
}

/// Look up a profile by id.
pub fn network_profile(id: &str) -> Result<&'static NetworkProfile, NetworkError> {
    PROFILES
        .iter()
        .find(|p| p.id == id)
        .ok_or_else(|| NetworkError::UnknownProfile(id.to_string()))
}

/// Wraps a fetcher with a profile's latency, throughput and loss.
pub struct ThrottledFetcher {
    inner: Arc<dyn Fetcher>,
    profile: &'static NetworkProfile,
    settings: NetworkSettings,
    rng: Mutex<StdRng>,
}

impl ThrottledFetcher {
    /// Wrap `inner`.
    pub fn new(
        inner: Arc<dyn Fetcher>,
        profile: &'static NetworkProfile,
        settings: NetworkSettings,
    ) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            inner,
            profile,
            settings,
            rng: Mutex::new(rng),
        }
    }

    fn scaled(&self, duration: Duration) -> Duration {
        self.settings.scale(duration)
    }
}

#[async_trait]
impl Fetcher for ThrottledFetcher {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, NetworkError> {
        if self.profile.offline {
            return Err(NetworkError::Offline { url: request.url });
        }

        let latency = self.scaled(Duration::from_millis(self.profile.latency_ms));
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let dropped = self.profile.packet_loss > 0.0
            && self.rng.lock().gen_bool(self.profile.packet_loss.min(1.0));
        if dropped {
            return Err(NetworkError::PacketLoss { url: request.url });
        }

        let response = self.inner.fetch(request).await?;
        let transfer = self.scaled(self.profile.transfer_time(response.body.len()));
        if !transfer.is_zero() {
            tokio::time::sleep(transfer).await;
        }
        Ok(response)
    }
}

/// Wrap the host's network primitive with `profile`.
///
/// Stacking profiles compounds their latency; [`reset_network`] undoes all of
/// them at once.
pub fn apply_network_profile(host: &Host, profile: &'static NetworkProfile) {
    let settings = host.network_settings();
    let mut inner = host.lock();
    if inner.original_fetcher.is_none() {
        inner.original_fetcher = Some(Arc::clone(&inner.fetcher));
    }

    let wrapped = ThrottledFetcher::new(Arc::clone(&inner.fetcher), profile, settings);
    inner.fetcher = Arc::new(wrapped);
    inner.env.network_profile = Some(profile.id.to_string());
    inner.env.network_latency_ms += profile.latency_ms;
    inner.env.offline |= profile.offline;
    tracing::debug!(profile = profile.id, "Network profile applied");
}

/// Restore the network primitive seen before the first apply.
pub fn reset_network(host: &Host) {
    let mut inner = host.lock();
    if let Some(original) = inner.original_fetcher.take() {
        inner.fetcher = original;
        tracing::debug!("Network restored");
    }
    inner.env.network_profile = None;
    inner.env.network_latency_ms = 0;
    inner.env.offline = false;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NetworkSettings;
    use tokio::time::Instant;

    fn origin() -> Arc<StaticFetcher> {
        Arc::new(StaticFetcher::default().with_resource("/data/a.json", vec![b'x'; 4000]))
    }

    #[tokio::test]
    async fn static_fetcher_serves_and_404s() {
        let origin = origin();
        let ok = origin.fetch(FetchRequest::get("/data/a.json")).await.unwrap();
        assert_eq!(ok.body.len(), 4000);

        let head = origin.fetch(FetchRequest::head("/data/a.json")).await.unwrap();
        assert!(head.body.is_empty());
        assert_eq!(head.content_length, 4000);

        assert!(matches!(
            origin.fetch(FetchRequest::get("/nope")).await,
            Err(NetworkError::NotFound { .. })
        ));
        assert_eq!(origin.requests(), 3);
    }

    #[test]
    fn profile_lookup() {
        assert!(network_profile("slow_3g").is_ok());
        assert_eq!(
            network_profile("dialup"),
            Err(NetworkError::UnknownProfile("dialup".into()))
        );
        assert!(network_profiles().iter().any(|p| p.offline));
    }

    #[test]
    fn transfer_time_uses_throughput() {
        let slow = network_profile("slow_3g").unwrap();
        assert_eq!(slow.transfer_time(50_000), Duration::from_millis(1000));
        let offline = network_profile("offline").unwrap();
        assert_eq!(offline.transfer_time(50_000), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_profile_adds_latency() {
        let host = Host::new(origin());
        apply_network_profile(&host, network_profile("slow_3g").unwrap());

        let started = Instant::now();
        let response = host.fetch(FetchRequest::get("/data/a.json")).await.unwrap();
        let elapsed = started.elapsed();

        assert_eq!(response.body.len(), 4000);
        // 2000 ms latency + 32000 bits at 400 kbps
        assert_eq!(elapsed, Duration::from_millis(2080));
    }

    #[tokio::test(start_paused = true)]
    async fn latency_scale_shrinks_delay() {
        let settings = NetworkSettings {
            latency_scale: 0.5,
            seed: None,
        };
        let host = Host::with_settings(origin(), settings);
        apply_network_profile(&host, network_profile("fast_3g").unwrap());

        let started = Instant::now();
        host.fetch(FetchRequest::head("/data/a.json")).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(281));
    }

    #[tokio::test(start_paused = true)]
    async fn offline_fails_immediately_without_reaching_origin() {
        let origin = origin();
        let host = Host::new(origin.clone());
        apply_network_profile(&host, network_profile("offline").unwrap());

        let started = Instant::now();
        let err = host.fetch(FetchRequest::get("/data/a.json")).await.unwrap_err();
        assert!(matches!(err, NetworkError::Offline { .. }));
        assert_eq!(started.elapsed(), Duration::ZERO);
        assert_eq!(origin.requests(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn lossy_profile_drops_some_requests() {
        let settings = NetworkSettings {
            latency_scale: 0.0,
            seed: Some(11),
        };
        let host = Host::with_settings(origin(), settings);
        apply_network_profile(&host, network_profile("lossy_3g").unwrap());

        let mut dropped = 0;
        for _ in 0..200 {
            if let Err(NetworkError::PacketLoss { .. }) =
                host.fetch(FetchRequest::head("/data/a.json")).await
            {
                dropped += 1;
            }
        }
        assert!((10..=80).contains(&dropped), "dropped {dropped}");
    }

    #[tokio::test(start_paused = true)]
    async fn stacked_profiles_reset_to_original_identity() {
        let origin: Arc<dyn Fetcher> = origin();
        let host = Host::new(Arc::clone(&origin));

        apply_network_profile(&host, network_profile("4g").unwrap());
        apply_network_profile(&host, network_profile("slow_3g").unwrap());
        assert!(!Arc::ptr_eq(&host.fetcher(), &origin));
        assert_eq!(host.environment().network_latency_ms, 2170);

        reset_network(&host);
        assert!(Arc::ptr_eq(&host.fetcher(), &origin));
        assert_eq!(host.environment(), Default::default());

        // Second reset is a no-op.
        reset_network(&host);
        assert!(Arc::ptr_eq(&host.fetcher(), &origin));
    }
}
