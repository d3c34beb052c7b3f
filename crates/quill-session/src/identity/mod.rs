//! Program identity produced by builds.
//!
//! The store keeps a single current record (no history) plus an optional
//! custom public key that overrides the built one.

use std::fs;
use std::path::Path;

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, PUBLIC_KEY_LENGTH};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{BuildError, IdentityError};

mod patch;

pub use patch::{IdentityPatcher, LiteralSpan, PatchOutcome, PatchedText, PropagationReport};

/// A keypair minted by the compile service.
#[derive(Debug, Clone, PartialEq)]
pub struct IdentityRecord {
    /// Build that produced the keypair.
    pub uuid: String,
    /// Secret key followed by public key.
    pub keypair: Vec<u8>,
    /// Base58 public key.
    pub public_key_text: String,
    /// Interface descriptor returned with the build, if any.
    pub idl: Option<serde_json::Value>,
}

impl IdentityRecord {
    /// Decodes raw keypair bytes, checking the public half against the secret.
    pub fn from_keypair(
        uuid: impl Into<String>,
        keypair: &[u8],
        idl: Option<serde_json::Value>,
    ) -> Result<Self, BuildError> {
        let bytes: &[u8; KEYPAIR_LENGTH] = keypair.try_into().map_err(|_| {
            BuildError::MalformedIdentity(format!(
                "expected {KEYPAIR_LENGTH} keypair bytes, got {}",
                keypair.len()
            ))
        })?;
        let signing = SigningKey::from_keypair_bytes(bytes)
            .map_err(|err| BuildError::MalformedIdentity(err.to_string()))?;
        Ok(Self {
            uuid: uuid.into(),
            keypair: keypair.to_vec(),
            public_key_text: encode_public_key(&signing.verifying_key().to_bytes()),
            idl,
        })
    }
}

/// Base58 text of a raw ed25519 public key.
pub fn encode_public_key(bytes: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    bs58::encode(bytes).into_string()
}

/// Checks that `text` is a base58 ed25519 public key.
pub fn validate_public_key(text: &str) -> Result<(), IdentityError> {
    let bytes = bs58::decode(text)
        .into_vec()
        .map_err(|err| IdentityError::Decode(err.to_string()))?;
    if bytes.len() != PUBLIC_KEY_LENGTH {
        return Err(IdentityError::Decode(format!(
            "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
            bytes.len()
        )));
    }
    Ok(())
}

/// Identity metadata attached to the next build request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriorIdentity {
    /// Previous build id, `None` before the first build.
    pub uuid: Option<String>,
    /// Previous 64-byte keypair.
    pub keypair: Option<Vec<u8>>,
    /// User-chosen program id, forwarded as `pk`.
    pub custom_public_key: Option<String>,
}

#[derive(Debug, Default)]
struct IdentityState {
    record: Option<IdentityRecord>,
    custom_public_key: Option<String>,
}

/// Holder of the current program identity.
#[derive(Debug, Default)]
pub struct IdentityStore {
    state: RwLock<IdentityState>,
}

impl IdentityStore {
    /// An empty store: no record, no custom key.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current record, if a build has succeeded.
    pub fn record(&self) -> Option<IdentityRecord> {
        self.state.read().record.clone()
    }

    /// Replaces the current record.
    pub fn commit(&self, record: IdentityRecord) {
        info!("Program identity {} (build {})", record.public_key_text, record.uuid);
        self.state.write().record = Some(record);
    }

    /// The user-chosen program id, if any.
    pub fn custom_public_key(&self) -> Option<String> {
        self.state.read().custom_public_key.clone()
    }

    /// Sets or clears the custom program id. The key must be a base58
    /// ed25519 public key.
    pub fn set_custom_public_key(&self, key: Option<String>) -> Result<(), IdentityError> {
        if let Some(key) = &key {
            validate_public_key(key)?;
        }
        self.state.write().custom_public_key = key;
        Ok(())
    }

    /// The custom key if set, else the built one.
    pub fn effective_public_key(&self) -> Result<String, IdentityError> {
        let state = self.state.read();
        state
            .custom_public_key
            .clone()
            .or_else(|| {
                state
                    .record
                    .as_ref()
                    .map(|record| record.public_key_text.clone())
            })
            .ok_or(IdentityError::Missing)
    }

    /// Metadata attached to the next build request.
    pub fn prior(&self) -> PriorIdentity {
        let state = self.state.read();
        PriorIdentity {
            uuid: state.record.as_ref().map(|record| record.uuid.clone()),
            keypair: state.record.as_ref().map(|record| record.keypair.clone()),
            custom_public_key: state.custom_public_key.clone(),
        }
    }

    /// Reads a persisted record. A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, IdentityError> {
        let store = Self::new();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No identity file at {}", path.display());
                return Ok(store);
            }
            Err(err) => return Err(err.into()),
        };
        let persisted: PersistedIdentity = serde_json::from_str(&contents)?;
        let record = IdentityRecord::from_keypair(persisted.uuid, &persisted.keypair, persisted.idl)
            .map_err(|err| IdentityError::Decode(err.to_string()))?;
        if persisted.public_key != record.public_key_text {
            warn!(
                "Stored public key {} does not match keypair; using {}",
                persisted.public_key, record.public_key_text
            );
        }
        store.state.write().record = Some(record);
        Ok(store)
    }

    /// Writes the current record. Nothing is written when there is none.
    pub fn save(&self, path: &Path) -> Result<bool, IdentityError> {
        let Some(record) = self.record() else {
            return Ok(false);
        };
        let persisted = PersistedIdentity {
            uuid: record.uuid,
            keypair: record.keypair,
            public_key: record.public_key_text,
            idl: record.idl,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(&persisted)?)?;
        debug!("Saved program identity to {}", path.display());
        Ok(true)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedIdentity {
    uuid: String,
    keypair: Vec<u8>,
    public_key: String,
    #[serde(default)]
    idl: Option<serde_json::Value>,
}
