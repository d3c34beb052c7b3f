//! Build orchestration: sending a file snapshot to the compile service and
//! committing the identity it returns.
//!
//! The orchestrator never touches the document store or the live buffer;
//! propagating the new identity is a separate step (see
//! [`IdentityPatcher::propagate`](crate::identity::IdentityPatcher::propagate)).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::BuildError;
use crate::identity::{IdentityRecord, IdentityStore};

mod transport;

pub use transport::{BuildTransport, HttpBuildTransport};

/// Wire shape of a build request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRequest {
    /// `[path, content]` pairs in caller order.
    pub files: Vec<(String, String)>,
    pub uuid: Option<String>,
    /// Previous keypair (secret then public bytes).
    pub kp: Option<Vec<u8>>,
    /// Custom public key.
    pub pk: Option<String>,
}

/// Wire shape of a build response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildResponse {
    pub uuid: String,
    #[serde(default)]
    pub stderr: String,
    #[serde(default)]
    pub kp: Option<Vec<u8>>,
    #[serde(default)]
    pub idl: Option<serde_json::Value>,
}

/// A successful build.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOutcome {
    pub uuid: String,
    /// Compiler diagnostics.
    pub stderr: String,
    pub identity: IdentityRecord,
}

/// Sends builds and commits the identity they return.
#[derive(Debug)]
pub struct BuildOrchestrator<T> {
    transport: T,
    identities: Arc<IdentityStore>,
}

impl<T: BuildTransport> BuildOrchestrator<T> {
    /// Builds read prior metadata from and commit into `identities`.
    pub fn new(transport: T, identities: Arc<IdentityStore>) -> Self {
        Self {
            transport,
            identities,
        }
    }

    pub fn identities(&self) -> &Arc<IdentityStore> {
        &self.identities
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `files` with the prior identity and commits the new one.
    pub async fn build(&self, files: Vec<(String, String)>) -> Result<BuildOutcome, BuildError> {
        let prior = self.identities.prior();
        let request = BuildRequest {
            files,
            uuid: prior.uuid,
            kp: prior.keypair,
            pk: prior.custom_public_key,
        };
        info!(
            "Building {} files (previous build {})",
            request.files.len(),
            request.uuid.as_deref().unwrap_or("none")
        );

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("Build failed: {err}");
                return Err(err);
            }
        };
        let Some(keypair) = response.kp else {
            warn!("Build {} returned no keypair", response.uuid);
            return Err(BuildError::MalformedIdentity(
                "response carried no keypair".to_string(),
            ));
        };
        let identity = IdentityRecord::from_keypair(response.uuid.clone(), &keypair, response.idl)?;
        self.identities.commit(identity.clone());
        info!("Build {} finished", response.uuid);
        Ok(BuildOutcome {
            uuid: response.uuid,
            stderr: response.stderr,
            identity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::transport::scripted::ScriptedTransport;
    use super::*;
    use ed25519_dalek::SigningKey;

    fn keypair(seed: u8) -> Vec<u8> {
        SigningKey::from_bytes(&[seed; 32]).to_keypair_bytes().to_vec()
    }

    fn response(uuid: &str, kp: Option<Vec<u8>>) -> BuildResponse {
        BuildResponse {
            uuid: uuid.to_string(),
            stderr: "warning: unused variable".to_string(),
            kp,
            idl: None,
        }
    }

    #[test]
    fn wire_names_match_the_compile_service() {
        let request = BuildRequest {
            files: vec![("/src/lib.rs".into(), "x".into())],
            uuid: Some("u0".into()),
            kp: None,
            pk: Some("PK".into()),
        };
        let json = serde_json::to_value(&request).expect("encode");
        assert_eq!(
            json,
            serde_json::json!({
                "files": [["/src/lib.rs", "x"]],
                "uuid": "u0",
                "kp": null,
                "pk": "PK",
            })
        );

        let decoded: BuildResponse =
            serde_json::from_str(r#"{"uuid":"u1","stderr":"","kp":null,"idl":null}"#)
                .expect("decode");
        assert_eq!(decoded.kp, None);
    }

    #[tokio::test]
    async fn commits_identity_and_forwards_prior_metadata() {
        let identities = Arc::new(IdentityStore::new());
        let transport = ScriptedTransport::new([
            Ok(response("u1", Some(keypair(1)))),
            Ok(response("u2", Some(keypair(2)))),
        ]);
        let orchestrator = BuildOrchestrator::new(transport, Arc::clone(&identities));

        let first = orchestrator.build(vec![]).await.expect("first build");
        assert_eq!(first.uuid, "u1");
        assert_eq!(first.stderr, "warning: unused variable");
        orchestrator.build(vec![]).await.expect("second build");

        let requests = orchestrator.transport().requests.lock().clone();
        assert_eq!(requests[0].uuid, None);
        assert_eq!(requests[1].uuid.as_deref(), Some("u1"));
        assert_eq!(requests[1].kp, Some(keypair(1)));
        assert_eq!(identities.record().map(|record| record.uuid), Some("u2".into()));
    }

    #[tokio::test]
    async fn failures_leave_identity_untouched() {
        let identities = Arc::new(IdentityStore::new());
        let transport = ScriptedTransport::new([
            Ok(response("u1", Some(keypair(1)))),
            Err(BuildError::Remote("error[E0425]".into())),
            Ok(response("u3", None)),
            Ok(response("u4", Some(vec![0; 12]))),
        ]);
        let orchestrator = BuildOrchestrator::new(transport, Arc::clone(&identities));
        let committed = orchestrator.build(vec![]).await.expect("build").identity;

        assert_eq!(
            orchestrator.build(vec![]).await,
            Err(BuildError::Remote("error[E0425]".into()))
        );
        assert!(matches!(
            orchestrator.build(vec![]).await,
            Err(BuildError::MalformedIdentity(_))
        ));
        assert!(matches!(
            orchestrator.build(vec![]).await,
            Err(BuildError::MalformedIdentity(_))
        ));
        assert_eq!(identities.record(), Some(committed));
    }
}
