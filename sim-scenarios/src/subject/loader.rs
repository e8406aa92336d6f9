//! Room loading as the app does it: fetch, cache, autofix, validate.

use async_trait::async_trait;
use sim_env::{FetchRequest, Host};
use sim_types::{autofix_room, validate_room, RoomDocument, Rule, ValidationOptions};

use crate::error::LoadError;
use crate::subject::catalog::room_url;

/// Result of loading one room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    /// Rule violations that make the room unloadable.
    pub errors: Vec<String>,
    /// Quality issues and loader notices.
    pub warnings: Vec<String>,
    /// Rules behind `errors`, in the same order.
    pub error_rules: Vec<Rule>,
    /// The autofix pass changed the document.
    pub autofixed: bool,
    /// The document after autofix.
    pub cleaned_document: RoomDocument,
    /// The body came from storage because the network failed.
    pub from_cache: bool,
}

impl LoadOutcome {
    /// True if the room has no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// The loader-and-validator the scenarios exercise.
#[async_trait]
pub trait RoomLoader: Send + Sync {
    /// Fetch room `id` and validate it.
    async fn load_and_validate(
        &self,
        id: &str,
        options: &ValidationOptions,
    ) -> Result<LoadOutcome, LoadError>;

    /// Validate a room body that is already in hand.
    fn validate_json(
        &self,
        id: &str,
        json: &str,
        options: &ValidationOptions,
    ) -> Result<LoadOutcome, LoadError>;
}

/// Loads rooms through the host's current network primitive and caches raw
/// bodies in host storage under `room:<id>`.
#[derive(Debug, Clone)]
pub struct CatalogLoader {
    host: Host,
}

impl CatalogLoader {
    /// Create a loader bound to `host`.
    pub fn new(host: Host) -> Self {
        Self { host }
    }

    /// Storage key for a cached room body.
    pub fn cache_key(id: &str) -> String {
        format!("room:{id}")
    }
}

#[async_trait]
impl RoomLoader for CatalogLoader {
    async fn load_and_validate(
        &self,
        id: &str,
        options: &ValidationOptions,
    ) -> Result<LoadOutcome, LoadError> {
        let key = Self::cache_key(id);
        let mut notices = Vec::new();

        let (json, from_cache) = match self.host.fetch(FetchRequest::get(room_url(id))).await {
            Ok(response) => {
                let json = response.text();
                if let Err(e) = self.host.storage_set(&key, json.clone()) {
                    notices.push(format!("room {id} not cached: {e}"));
                }
                (json, false)
            }
            Err(network) => match self.host.storage_get(&key) {
                Ok(Some(cached)) => {
                    notices.push(format!("room {id} served from cache: {network}"));
                    (cached, true)
                }
                _ => {
                    return Err(LoadError::Network {
                        id: id.to_string(),
                        source: network,
                    })
                }
            },
        };

        let mut outcome = self.validate_json(id, &json, options)?;
        outcome.from_cache = from_cache;
        notices.append(&mut outcome.warnings);
        outcome.warnings = notices;
        tracing::debug!(
            room = id,
            errors = outcome.errors.len(),
            warnings = outcome.warnings.len(),
            from_cache,
            "Room loaded"
        );
        Ok(outcome)
    }

    fn validate_json(
        &self,
        id: &str,
        json: &str,
        options: &ValidationOptions,
    ) -> Result<LoadOutcome, LoadError> {
        let room = RoomDocument::from_json(json).map_err(|source| LoadError::Malformed {
            id: id.to_string(),
            source,
        })?;
        let (cleaned, autofixed) = autofix_room(&room);
        let report = validate_room(&cleaned, options);

        Ok(LoadOutcome {
            errors: report.errors.iter().map(ToString::to_string).collect(),
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
            error_rules: report.errors.iter().map(|v| v.rule).collect(),
            autofixed,
            cleaned_document: cleaned,
            from_cache: false,
        })
    }
}
