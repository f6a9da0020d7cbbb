//! Gateway server: wires the engine stack together and serves the RPC API.

use charter_approval::{
    ApprovalDecision, ApprovalTicket, ApprovalWorkflow, ApproverChannel, GovernorDirectory,
};
use charter_audit::{AuditError, AuditEvent, AuditLog, ChainVerification, MemoryAuditStorage};
use charter_config::Config;
use charter_core::{ActClass, ActionRequest, PrincipalId, TicketId, Verdict};
use charter_crypto::{KeyPair, SigningKeyring};
use charter_engine::{Engine, EngineError, PrincipalDirectory};
use charter_guard::BudgetGuard;
use charter_registry::SeedRegistry;
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObjectOwned;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::rpc::{CharterRpcServer, EngineStatus};

/// Validation failures the caller can fix.
const VALIDATION_CODE: i32 = -32602;
/// The caller lacks the governor role for the scope.
const PERMISSION_CODE: i32 = -32001;
/// The referenced ticket does not exist.
const NOT_FOUND_CODE: i32 = -32002;
/// Internal failures (audit chain, signing).
const INTERNAL_CODE: i32 = -32000;

/// External collaborators the gateway cannot supply itself: the approver
/// notification channel and the identity seams.
pub struct GatewayDeps {
    /// Where "approval needed" notifications go.
    pub channel: Arc<dyn ApproverChannel>,
    /// Who may resolve tickets for which scope.
    pub governors: Arc<dyn GovernorDirectory>,
    /// Who may submit requests.
    pub principals: Arc<dyn PrincipalDirectory>,
}

/// A running gateway.
pub struct Gateway {
    addr: SocketAddr,
    handle: ServerHandle,
    rotation: tokio::task::JoinHandle<()>,
    engine: Arc<Engine>,
    keyring: Arc<RwLock<SigningKeyring>>,
}

impl Gateway {
    /// Build the full engine stack from configuration and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if key material cannot be loaded, the audit chain
    /// cannot be opened, or the server cannot bind.
    pub async fn start(config: &Config, bind: &str, deps: GatewayDeps) -> GatewayResult<Self> {
        let keyring = match &config.keys.path {
            Some(path) => SigningKeyring::load_or_generate(path)?,
            None => SigningKeyring::new(KeyPair::generate()),
        };
        let keyring = Arc::new(RwLock::new(keyring));

        // Only the in-memory backend is built in; `Config` validation
        // already rejected anything else.
        let storage = Arc::new(MemoryAuditStorage::new());
        let audit = Arc::new(AuditLog::open(storage, keyring.clone()).await?);

        let guard = Arc::new(BudgetGuard::new(config.caps()));
        let seeds = Arc::new(SeedRegistry::new());
        let workflow = Arc::new(ApprovalWorkflow::new(
            deps.channel,
            deps.governors,
            audit.clone(),
            config.ticket_timeout(),
        ));

        let granularities = HashMap::from([
            (ActClass::Artifact, config.granularity_for(ActClass::Artifact)),
            (
                ActClass::Communication,
                config.granularity_for(ActClass::Communication),
            ),
            (
                ActClass::Execution,
                config.granularity_for(ActClass::Execution),
            ),
        ]);
        let engine = Arc::new(
            Engine::new(
                config.rule_table(),
                guard.clone(),
                seeds.clone(),
                workflow,
                deps.principals,
                audit.clone(),
            )
            .with_granularities(granularities),
        );

        let server = Server::builder()
            .build(bind)
            .await
            .map_err(|e| GatewayError::Runtime(format!("failed to bind {bind}: {e}")))?;
        let addr = server
            .local_addr()
            .map_err(|e| GatewayError::Runtime(format!("failed to get local address: {e}")))?;

        let rpc = RpcImpl {
            engine: engine.clone(),
            guard,
            seeds,
            keyring: keyring.clone(),
            started_at: Instant::now(),
        };
        let handle = server.start(rpc.into_rpc());
        let rotation = spawn_rotation_task(keyring.clone(), audit, config.rotation_interval());

        info!(%addr, "gateway started");
        Ok(Self {
            addr,
            handle,
            rotation,
            engine,
            keyring,
        })
    }

    /// The address the server bound to.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// The engine behind this gateway.
    #[must_use]
    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    /// Rotate the signing key immediately, outside the periodic schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the new key cannot be generated or persisted,
    /// or if the rotation entry cannot be audited.
    pub async fn rotate_now(&self) -> GatewayResult<()> {
        let (old_id, new_id) =
            rotate_signing_key(&self.keyring, self.engine.audit()).await?;
        info!(old = old_id, new = new_id, "signing key rotated");
        Ok(())
    }

    /// Stop serving and cancel the rotation task.
    pub async fn stop(self) {
        self.rotation.abort();
        if self.handle.stop().is_ok() {
            self.handle.stopped().await;
        }
    }
}

/// Rotate the keyring and append the rotation to the audit chain.
///
/// Returns the old and new key IDs as hex.
async fn rotate_signing_key(
    keyring: &Arc<RwLock<SigningKeyring>>,
    audit: &AuditLog,
) -> GatewayResult<(String, String)> {
    let (old_id, new_id) = {
        let mut ring = keyring
            .write()
            .map_err(|_| GatewayError::Runtime("keyring lock poisoned".into()))?;
        let old_id = hex::encode(ring.current_key_id());
        let new_id = hex::encode(ring.rotate()?);
        (old_id, new_id)
    };

    audit
        .append(AuditEvent::KeyRotated {
            old_key_id: old_id.clone(),
            new_key_id: new_id.clone(),
        })
        .await?;
    Ok((old_id, new_id))
}

fn spawn_rotation_task(
    keyring: Arc<RwLock<SigningKeyring>>,
    audit: Arc<AuditLog>,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; the key is already fresh.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match rotate_signing_key(&keyring, &audit).await {
                Ok((old, new)) => info!(old, new, "signing key rotated on schedule"),
                // The old key keeps signing; rotation retries next tick.
                Err(e) => warn!(error = %e, "scheduled key rotation failed"),
            }
        }
    })
}

struct RpcImpl {
    engine: Arc<Engine>,
    guard: Arc<BudgetGuard>,
    seeds: Arc<SeedRegistry>,
    keyring: Arc<RwLock<SigningKeyring>>,
    started_at: Instant,
}

fn engine_error_to_rpc(e: EngineError) -> ErrorObjectOwned {
    if e.is_validation() {
        return ErrorObjectOwned::owned(VALIDATION_CODE, e.to_string(), None::<()>);
    }
    match e {
        EngineError::Approval(a) => approval_error_to_rpc(a),
        other => ErrorObjectOwned::owned(INTERNAL_CODE, other.to_string(), None::<()>),
    }
}

fn approval_error_to_rpc(e: charter_approval::ApprovalError) -> ErrorObjectOwned {
    use charter_approval::ApprovalError;
    let code = match &e {
        ApprovalError::NotGovernor { .. } => PERMISSION_CODE,
        ApprovalError::TicketNotFound(_) => NOT_FOUND_CODE,
        ApprovalError::DuplicateOpenTicket(_) => VALIDATION_CODE,
        ApprovalError::Audit(_) => INTERNAL_CODE,
    };
    ErrorObjectOwned::owned(code, e.to_string(), None::<()>)
}

fn audit_error_to_rpc(e: AuditError) -> ErrorObjectOwned {
    let code = match &e {
        AuditError::InvalidRange { .. } => VALIDATION_CODE,
        _ => INTERNAL_CODE,
    };
    ErrorObjectOwned::owned(code, e.to_string(), None::<()>)
}

#[async_trait::async_trait]
impl CharterRpcServer for RpcImpl {
    async fn decide(&self, request: ActionRequest) -> Result<Verdict, ErrorObjectOwned> {
        self.engine
            .decide(&request)
            .await
            .map_err(engine_error_to_rpc)
    }

    async fn resolve_ticket(
        &self,
        ticket_id: TicketId,
        decision: ApprovalDecision,
        resolver: PrincipalId,
    ) -> Result<ApprovalTicket, ErrorObjectOwned> {
        self.engine
            .approvals()
            .resolve(&ticket_id, decision, &resolver)
            .await
            .map_err(approval_error_to_rpc)
    }

    async fn verify_chain(
        &self,
        from: u64,
        to: Option<u64>,
    ) -> Result<ChainVerification, ErrorObjectOwned> {
        let head = self.engine.audit().next_seq().await;
        if head == 0 {
            return Ok(ChainVerification {
                valid: true,
                first_break: None,
                checked: 0,
            });
        }
        let to = to.unwrap_or(head - 1);
        self.engine
            .audit()
            .verify_chain(from, to)
            .await
            .map_err(audit_error_to_rpc)
    }

    async fn status(&self) -> Result<EngineStatus, ErrorObjectOwned> {
        let signing_key_id = self
            .keyring
            .read()
            .map(|ring| hex::encode(ring.current_key_id()))
            .map_err(|_| {
                ErrorObjectOwned::owned(INTERNAL_CODE, "keyring lock poisoned", None::<()>)
            })?;

        Ok(EngineStatus {
            running: true,
            uptime_secs: self.started_at.elapsed().as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            chain_entries: self.engine.audit().next_seq().await,
            open_tickets: self.engine.approvals().open_ticket_count(),
            tracked_principals: self.guard.tracked_principals(),
            active_seeds: self.seeds.snapshot().len(),
            signing_key_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::CharterRpcClient;
    use async_trait::async_trait;
    use charter_approval::StaticGovernorDirectory;
    use charter_core::{Principal, ReasonCode, Role, TargetScope, Tier};
    use charter_crypto::ContentHash;
    use charter_engine::StaticPrincipalDirectory;
    use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
    use std::sync::{OnceLock, Weak};

    /// Channel that resolves every ticket once wired to the workflow.
    struct AutoApprover {
        workflow: OnceLock<Weak<ApprovalWorkflow>>,
    }

    #[async_trait]
    impl ApproverChannel for AutoApprover {
        async fn notify(&self, ticket: &ApprovalTicket) {
            let Some(workflow) = self.workflow.get().and_then(Weak::upgrade) else {
                return;
            };
            let ticket_id = ticket.ticket_id.clone();
            tokio::spawn(async move {
                let _ = workflow
                    .resolve(
                        &ticket_id,
                        ApprovalDecision::Approve,
                        &PrincipalId::new("gov-1"),
                    )
                    .await;
            });
        }
    }

    async fn start_gateway() -> (Gateway, HttpClient) {
        let approver = Arc::new(AutoApprover {
            workflow: OnceLock::new(),
        });
        let deps = GatewayDeps {
            channel: approver.clone(),
            governors: Arc::new(StaticGovernorDirectory::new([PrincipalId::new("gov-1")])),
            principals: Arc::new(StaticPrincipalDirectory::new([
                Principal::new("usr-1", Role::Operator, Tier::Paid),
                Principal::new("gov-1", Role::Governor, Tier::Internal),
            ])),
        };
        let gateway = Gateway::start(&Config::default(), "127.0.0.1:0", deps)
            .await
            .unwrap();
        approver
            .workflow
            .set(Arc::downgrade(gateway.engine().approvals()))
            .unwrap_or_else(|_| panic!("approver already wired"));

        let client = HttpClientBuilder::default()
            .build(format!("http://{}", gateway.local_addr()))
            .unwrap();
        (gateway, client)
    }

    fn request(action_type: &str) -> ActionRequest {
        ActionRequest::new(
            "usr-1",
            ActClass::Artifact,
            action_type,
            TargetScope::engagement("acme"),
            ContentHash::hash(b"post body"),
        )
    }

    #[tokio::test]
    async fn test_decide_roundtrip() {
        let (gateway, client) = start_gateway().await;

        let verdict = client.decide(request("publish_post")).await.unwrap();
        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason_code, ReasonCode::Approved);

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_unregistered_action_maps_to_validation_code() {
        let (gateway, client) = start_gateway().await;

        let err = client.decide(request("transmute_lead")).await.unwrap_err();
        match err {
            jsonrpsee::core::ClientError::Call(obj) => assert_eq!(obj.code(), VALIDATION_CODE),
            other => panic!("expected call error, got {other:?}"),
        }

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_unknown_ticket_maps_to_not_found() {
        let (gateway, client) = start_gateway().await;

        let err = client
            .resolve_ticket(
                TicketId::new(),
                ApprovalDecision::Approve,
                PrincipalId::new("gov-1"),
            )
            .await
            .unwrap_err();
        match err {
            jsonrpsee::core::ClientError::Call(obj) => assert_eq!(obj.code(), NOT_FOUND_CODE),
            other => panic!("expected call error, got {other:?}"),
        }

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_verify_chain_and_status() {
        let (gateway, client) = start_gateway().await;

        // An empty chain verifies trivially.
        let report = client.verify_chain(0, None).await.unwrap();
        assert!(report.valid);
        assert_eq!(report.checked, 0);

        client.decide(request("publish_post")).await.unwrap();
        client.decide(request("send_email")).await.unwrap();

        let report = client.verify_chain(0, None).await.unwrap();
        assert!(report.valid);
        assert!(report.checked >= 4, "tickets and decisions are all chained");

        let status = client.status().await.unwrap();
        assert!(status.running);
        assert_eq!(status.open_tickets, 0);
        assert_eq!(status.tracked_principals, 1);
        assert_eq!(status.chain_entries, report.checked);

        gateway.stop().await;
    }

    #[tokio::test]
    async fn test_rotation_is_audited_and_chain_survives() {
        let (gateway, client) = start_gateway().await;

        client.decide(request("publish_post")).await.unwrap();
        let before = client.status().await.unwrap();

        gateway.rotate_now().await.unwrap();
        client.decide(request("publish_post")).await.unwrap();

        let after = client.status().await.unwrap();
        assert_ne!(before.signing_key_id, after.signing_key_id);

        // Entries signed under both keys still verify.
        let report = client.verify_chain(0, None).await.unwrap();
        assert!(report.valid);

        gateway.stop().await;
    }
}
