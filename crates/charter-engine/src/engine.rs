//! The policy decision point.
//!
//! `decide` runs the full pipeline for one request: structural validation,
//! rule-table classification, budget consumption, precedent matching, and
//! the approval checkpoint, finishing with exactly one decision entry in
//! the audit chain. A failed audit write fails the whole decision.

use async_trait::async_trait;
use charter_approval::{ApprovalTicket, ApprovalWorkflow, GovernanceHook, TicketStatus};
use charter_audit::{AuditEvent, AuditLog};
use charter_core::{
    ActClass, ActionRequest, DecidedBy, Granularity, Principal, PrincipalId, ReasonCode, RequestId,
    SeedId, TicketId, Timestamp, Verdict,
};
use charter_guard::{BudgetGuard, BudgetResult, ExceededReason};
use charter_registry::{PrecedentSeed, SeedEffect, SeedRegistry};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{EngineError, EngineResult};
use crate::rules::RuleTable;

/// Identity lookup for submitting principals.
///
/// The engine consumes principals as verified facts from the identity
/// layer; it never authenticates anyone itself.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Fetch the principal for an ID, if known.
    async fn lookup(&self, principal_id: &PrincipalId) -> Option<Principal>;
}

/// Directory backed by a fixed principal set.
#[derive(Debug, Default)]
pub struct StaticPrincipalDirectory {
    principals: HashMap<PrincipalId, Principal>,
}

impl StaticPrincipalDirectory {
    /// Build a directory from known principals.
    #[must_use]
    pub fn new(principals: impl IntoIterator<Item = Principal>) -> Self {
        Self {
            principals: principals
                .into_iter()
                .map(|p| (p.principal_id.clone(), p))
                .collect(),
        }
    }
}

#[async_trait]
impl PrincipalDirectory for StaticPrincipalDirectory {
    async fn lookup(&self, principal_id: &PrincipalId) -> Option<Principal> {
        self.principals.get(principal_id).cloned()
    }
}

/// The policy decision point.
pub struct Engine {
    rules: RuleTable,
    guard: Arc<BudgetGuard>,
    seeds: Arc<SeedRegistry>,
    approvals: Arc<ApprovalWorkflow>,
    principals: Arc<dyn PrincipalDirectory>,
    audit: Arc<AuditLog>,
    granularities: HashMap<ActClass, Granularity>,
    decided: DashMap<RequestId, Verdict>,
    started_at: Timestamp,
}

impl Engine {
    /// Assemble an engine from its collaborators.
    #[must_use]
    pub fn new(
        rules: RuleTable,
        guard: Arc<BudgetGuard>,
        seeds: Arc<SeedRegistry>,
        approvals: Arc<ApprovalWorkflow>,
        principals: Arc<dyn PrincipalDirectory>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            rules,
            guard,
            seeds,
            approvals,
            principals,
            audit,
            granularities: HashMap::new(),
            decided: DashMap::new(),
            started_at: Timestamp::now(),
        }
    }

    /// Override the per-class approval granularity. Classes absent from
    /// the map keep their built-in default.
    #[must_use]
    pub fn with_granularities(mut self, granularities: HashMap<ActClass, Granularity>) -> Self {
        self.granularities = granularities;
        self
    }

    fn granularity_for(&self, class: ActClass) -> Granularity {
        self.granularities
            .get(&class)
            .copied()
            .unwrap_or_else(|| Granularity::default_for(class))
    }

    /// Decide one action request, returning its terminal verdict.
    ///
    /// Suspends while an approval ticket is open; the caller always gets
    /// a terminal `allow`/`deny` back. Idempotent on `request_id`: a
    /// resubmitted request gets its recorded verdict back without a second
    /// pipeline run, a second ticket, or duplicate audit entries.
    ///
    /// # Errors
    ///
    /// Validation failures (malformed request, unregistered action type,
    /// unknown principal) are returned before anything is recorded. Audit
    /// and approval failures fail the decision.
    pub async fn decide(&self, request: &ActionRequest) -> EngineResult<Verdict> {
        request.validate()?;
        if let Some(prior) = self.decided.get(&request.request_id) {
            tracing::debug!(request = %request.request_id, "request already decided, replaying verdict");
            return Ok(prior.clone());
        }
        let verdict = self.evaluate(request).await?;
        self.decided
            .insert(request.request_id.clone(), verdict.clone());
        Ok(verdict)
    }

    async fn evaluate(&self, request: &ActionRequest) -> EngineResult<Verdict> {
        let rule = self
            .rules
            .lookup(&request.action_type)
            .copied()
            .ok_or_else(|| EngineError::UnregisteredAction {
                action_type: request.action_type.clone(),
            })?;
        let principal = self
            .principals
            .lookup(&request.principal_id)
            .await
            .ok_or_else(|| EngineError::UnknownPrincipal(request.principal_id.clone()))?;

        // In-flight decisions bind to the seeds active at receipt; a
        // supersession landing mid-decision does not shift the ground.
        let seeds = self.seeds.snapshot();

        // The rule table is authoritative for classification.
        let class = rule.act_class;
        if class != request.act_class {
            tracing::warn!(
                request = %request.request_id,
                declared = %request.act_class,
                derived = %class,
                "declared act class differs from rule table",
            );
        }

        // Routing target: platform-scoped requests go to the platform
        // governor, engagement-scoped ones to that engagement's governor.
        let approver_scope = request.target_scope.clone();

        match self
            .guard
            .check_and_consume(&request.principal_id, principal.tier, rule.cost_cents)
        {
            BudgetResult::Allowed { .. } => {},
            BudgetResult::Exceeded(reason) => {
                let code = match reason {
                    ExceededReason::RateCeiling { .. } => ReasonCode::RateLimited,
                    ExceededReason::DailyTaskCeiling { .. } | ExceededReason::SpendCap { .. } => {
                        ReasonCode::BudgetExceeded
                    },
                };
                tracing::info!(request = %request.request_id, reason = %code, "budget refused request");
                let verdict = Verdict::deny(request.request_id.clone(), code, DecidedBy::System);
                self.record_decision(request, class, &verdict, None).await?;
                return Ok(verdict);
            },
        }

        let mut gated = false;
        if let Some(seed) = seeds.match_request(request, class, principal.tier) {
            match &seed.effect {
                SeedEffect::Clarify { note } => {
                    tracing::debug!(seed = %seed.seed_id, note, "precedent clarifies decision");
                },
                SeedEffect::AddGate { gate } => {
                    gated = true;
                    tracing::info!(seed = %seed.seed_id, gate, "precedent gates decision");
                },
                // Registration refuses weakening effects; never honor one.
                SeedEffect::ReduceApproval | SeedEffect::ExpandScope => {
                    tracing::warn!(seed = %seed.seed_id, "weakening seed effect ignored");
                },
            }
        }

        // A presented ticket may satisfy the checkpoint for its own
        // request and class; a lower-class ticket presented at a
        // communication or execution boundary is a bypass attempt.
        if let Some(ticket_id) = &request.presented_ticket {
            if let Some(ticket) = self.approvals.get_ticket(ticket_id) {
                if !ticket.covers(class)
                    && matches!(class, ActClass::Communication | ActClass::Execution)
                {
                    return self.deny_bypass(request, &ticket, class).await;
                }
                if ticket.covers(class)
                    && ticket.is_approved()
                    && ticket.request_id == request.request_id
                {
                    let verdict = Verdict::allow(
                        request.request_id.clone(),
                        if gated {
                            ReasonCode::PrecedentGated
                        } else {
                            ReasonCode::Approved
                        },
                        decided_by_governor(&ticket),
                    )
                    .with_required_approval(class);
                    self.record_decision(request, class, &verdict, Some(ticket.ticket_id.clone()))
                        .await?;
                    return Ok(verdict);
                }
            }
        }

        // Every class mandates approval; prior approvals never transfer
        // between requests.
        let ticket = self
            .approvals
            .request_approval(request, class, self.granularity_for(class), approver_scope)
            .await?;

        let verdict = match ticket.status {
            TicketStatus::Approved => Verdict::allow(
                request.request_id.clone(),
                if gated {
                    ReasonCode::PrecedentGated
                } else {
                    ReasonCode::Approved
                },
                decided_by_governor(&ticket),
            ),
            TicketStatus::Rejected => Verdict::deny(
                request.request_id.clone(),
                ReasonCode::ApprovalRejected,
                decided_by_governor(&ticket),
            ),
            TicketStatus::Expired | TicketStatus::Open => Verdict::deny(
                request.request_id.clone(),
                ReasonCode::ApprovalExpired,
                DecidedBy::System,
            ),
        }
        .with_required_approval(class);

        self.record_decision(request, class, &verdict, Some(ticket.ticket_id))
            .await?;
        Ok(verdict)
    }

    async fn deny_bypass(
        &self,
        request: &ActionRequest,
        ticket: &ApprovalTicket,
        class: ActClass,
    ) -> EngineResult<Verdict> {
        let details = format!(
            "{} ticket {} presented for {} boundary",
            ticket.approval_type, ticket.ticket_id, class
        );
        tracing::warn!(
            security_event = true,
            request = %request.request_id,
            principal = %request.principal_id,
            ticket = %ticket.ticket_id,
            "ticket class bypass attempt",
        );

        self.audit
            .append(AuditEvent::SecurityAlert {
                request_id: request.request_id.clone(),
                principal_id: request.principal_id.clone(),
                violation_type: "exec_bypass".into(),
                details: details.clone(),
            })
            .await?;
        self.approvals.hooks().publish(GovernanceHook::SecurityAlert {
            request_id: request.request_id.clone(),
            principal_id: request.principal_id.clone(),
            details,
        });

        let verdict = Verdict::deny(
            request.request_id.clone(),
            ReasonCode::ExecBypass,
            DecidedBy::System,
        )
        .with_required_approval(class);
        self.record_decision(request, class, &verdict, Some(ticket.ticket_id.clone()))
            .await?;
        Ok(verdict)
    }

    async fn record_decision(
        &self,
        request: &ActionRequest,
        class: ActClass,
        verdict: &Verdict,
        ticket_id: Option<TicketId>,
    ) -> EngineResult<()> {
        self.audit
            .append(AuditEvent::DecisionRecorded {
                request_id: request.request_id.clone(),
                principal_id: request.principal_id.clone(),
                act_class: class,
                action_type: request.action_type.clone(),
                target_scope: request.target_scope.clone(),
                outcome: verdict.outcome,
                reason_code: verdict.reason_code,
                ticket_id,
            })
            .await?;
        tracing::info!(
            request = %request.request_id,
            outcome = %verdict.outcome,
            reason = %verdict.reason_code,
            "decision recorded",
        );
        Ok(())
    }

    /// Register a precedent seed, auditing the registration.
    ///
    /// # Errors
    ///
    /// Refuses effects outside the clarify/add-gate whitelist and duplicate
    /// IDs, and fails if the audit entry cannot be written.
    pub async fn register_seed(&self, seed: PrecedentSeed) -> EngineResult<SeedId> {
        let effect = seed.effect.name().to_string();
        let created_from = seed.created_from_request_id.clone();
        let seed_id = self.seeds.register(seed)?;
        self.audit
            .append(AuditEvent::SeedRegistered {
                seed_id: seed_id.clone(),
                effect,
                created_from_request_id: created_from,
            })
            .await?;
        Ok(seed_id)
    }

    /// Replace a seed with a back-referencing successor, auditing the
    /// supersession.
    ///
    /// # Errors
    ///
    /// Same validation as [`register_seed`](Self::register_seed), plus
    /// unknown or already-superseded `old_id`.
    pub async fn supersede_seed(
        &self,
        old_id: &SeedId,
        replacement: PrecedentSeed,
    ) -> EngineResult<SeedId> {
        let new_id = self.seeds.supersede(old_id, replacement)?;
        self.audit
            .append(AuditEvent::SeedSuperseded {
                old_seed_id: old_id.clone(),
                new_seed_id: new_id.clone(),
            })
            .await?;
        Ok(new_id)
    }

    /// The approval workflow this engine hands pending decisions to.
    #[must_use]
    pub fn approvals(&self) -> &Arc<ApprovalWorkflow> {
        &self.approvals
    }

    /// The audit chain this engine writes to.
    #[must_use]
    pub fn audit(&self) -> &Arc<AuditLog> {
        &self.audit
    }

    /// When this engine instance started.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }
}

fn decided_by_governor(ticket: &ApprovalTicket) -> DecidedBy {
    ticket
        .resolved_by
        .clone()
        .map_or(DecidedBy::System, |principal_id| DecidedBy::Governor {
            principal_id,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use charter_approval::{ApprovalDecision, ApproverChannel};
    use charter_audit::{AuditStorage, MemoryAuditStorage};
    use charter_core::{RequestId, Role, TargetScope, Tier, VerdictOutcome};
    use charter_crypto::{ContentHash, KeyPair, SigningKeyring};
    use charter_guard::TierCaps;
    use charter_registry::MatchCriteria;
    use std::sync::{OnceLock, RwLock, Weak};
    use std::time::Duration;

    /// Channel that resolves every ticket from a background task, standing
    /// in for a governor who always answers.
    struct AutoResolver {
        workflow: OnceLock<Weak<ApprovalWorkflow>>,
        decision: ApprovalDecision,
        governor: PrincipalId,
    }

    impl AutoResolver {
        fn new(decision: ApprovalDecision) -> Self {
            Self {
                workflow: OnceLock::new(),
                decision,
                governor: PrincipalId::new("gov-1"),
            }
        }
    }

    #[async_trait]
    impl ApproverChannel for AutoResolver {
        async fn notify(&self, ticket: &ApprovalTicket) {
            let Some(workflow) = self.workflow.get().and_then(Weak::upgrade) else {
                return;
            };
            let ticket_id = ticket.ticket_id.clone();
            let decision = self.decision;
            let governor = self.governor.clone();
            tokio::spawn(async move {
                let _ = workflow.resolve(&ticket_id, decision, &governor).await;
            });
        }
    }

    /// Channel that never answers, standing in for an absent governor.
    struct SilentChannel;

    #[async_trait]
    impl ApproverChannel for SilentChannel {
        async fn notify(&self, _ticket: &ApprovalTicket) {}
    }

    struct Harness {
        engine: Engine,
        storage: Arc<MemoryAuditStorage>,
        workflow: Arc<ApprovalWorkflow>,
    }

    fn trial_caps(tasks: u32) -> HashMap<Tier, TierCaps> {
        let mut caps = HashMap::new();
        caps.insert(
            Tier::Trial,
            TierCaps {
                max_tasks_per_day: Some(tasks),
                max_spend_cents_per_day: None,
                max_requests_per_minute: None,
            },
        );
        caps
    }

    async fn build(
        channel: Arc<dyn ApproverChannel>,
        resolver: Option<&AutoResolver>,
        caps: HashMap<Tier, TierCaps>,
        timeout: Duration,
    ) -> Harness {
        let storage = Arc::new(MemoryAuditStorage::new());
        let keyring = Arc::new(RwLock::new(SigningKeyring::new(KeyPair::generate())));
        let audit = Arc::new(AuditLog::open(storage.clone(), keyring).await.unwrap());
        let governors = Arc::new(charter_approval::StaticGovernorDirectory::new([
            PrincipalId::new("gov-1"),
        ]));
        let workflow = Arc::new(ApprovalWorkflow::new(
            channel,
            governors,
            audit.clone(),
            timeout,
        ));
        if let Some(resolver) = resolver {
            resolver
                .workflow
                .set(Arc::downgrade(&workflow))
                .unwrap_or_else(|_| panic!("resolver already wired"));
        }

        let principals = Arc::new(StaticPrincipalDirectory::new([
            Principal::new("trial-1", Role::Operator, Tier::Trial),
            Principal::new("usr-1", Role::Operator, Tier::Paid),
            Principal::new("gov-1", Role::Governor, Tier::Internal),
        ]));
        let engine = Engine::new(
            RuleTable::with_defaults(),
            Arc::new(BudgetGuard::new(caps)),
            Arc::new(SeedRegistry::new()),
            workflow.clone(),
            principals,
            audit,
        );
        Harness {
            engine,
            storage,
            workflow,
        }
    }

    async fn auto_harness(decision: ApprovalDecision) -> (Harness, Arc<AutoResolver>) {
        let resolver = Arc::new(AutoResolver::new(decision));
        let h = build(
            resolver.clone(),
            Some(&resolver),
            trial_caps(10),
            Duration::from_secs(5),
        )
        .await;
        (h, resolver)
    }

    fn artifact_request(principal: &str) -> ActionRequest {
        ActionRequest::new(
            principal,
            ActClass::Artifact,
            "publish_post",
            TargetScope::engagement("acme"),
            ContentHash::hash(b"post body"),
        )
    }

    fn execution_request(principal: &str) -> ActionRequest {
        ActionRequest::new(
            principal,
            ActClass::Execution,
            "send_payment",
            TargetScope::engagement("acme"),
            ContentHash::hash(b"invoice 42"),
        )
    }

    async fn events(storage: &MemoryAuditStorage) -> Vec<AuditEvent> {
        let count = storage.count().await.unwrap();
        if count == 0 {
            return Vec::new();
        }
        storage
            .range(0, count - 1)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.event)
            .collect()
    }

    #[tokio::test]
    async fn test_unregistered_action_rejected_before_audit() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        let mut req = artifact_request("usr-1");
        req.action_type = "transmute_lead".into();

        let result = h.engine.decide(&req).await;
        assert!(matches!(
            result,
            Err(EngineError::UnregisteredAction { .. })
        ));
        assert_eq!(h.storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_unknown_principal_rejected() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        let req = artifact_request("nobody");
        let result = h.engine.decide(&req).await;
        assert!(matches!(result, Err(EngineError::UnknownPrincipal(_))));
        assert_eq!(h.storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_approved_execution_allows_with_governor() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        let verdict = h.engine.decide(&execution_request("usr-1")).await.unwrap();

        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason_code, ReasonCode::Approved);
        assert_eq!(verdict.required_approval_type, Some(ActClass::Execution));
        assert!(matches!(verdict.decided_by, DecidedBy::Governor { .. }));

        let events = events(&h.storage).await;
        let decisions: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, AuditEvent::DecisionRecorded { .. }))
            .collect();
        assert_eq!(decisions.len(), 1, "exactly one decision entry per request");
        assert!(matches!(events[0], AuditEvent::TicketOpened { .. }));
    }

    #[tokio::test]
    async fn test_rejected_execution_denies() {
        let (h, _r) = auto_harness(ApprovalDecision::Reject).await;
        let verdict = h.engine.decide(&execution_request("usr-1")).await.unwrap();

        assert_eq!(verdict.outcome, VerdictOutcome::Deny);
        assert_eq!(verdict.reason_code, ReasonCode::ApprovalRejected);
        assert!(matches!(verdict.decided_by, DecidedBy::Governor { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_absent_governor_fails_closed() {
        let h = build(
            Arc::new(SilentChannel),
            None,
            trial_caps(10),
            Duration::from_secs(30),
        )
        .await;

        let verdict = h.engine.decide(&execution_request("usr-1")).await.unwrap();
        assert_eq!(verdict.outcome, VerdictOutcome::Deny);
        assert_eq!(verdict.reason_code, ReasonCode::ApprovalExpired);

        let events = events(&h.storage).await;
        assert!(
            events
                .iter()
                .any(|e| matches!(e, AuditEvent::TicketExpired { .. }))
        );
    }

    #[tokio::test]
    async fn test_trial_daily_ceiling_denies_eleventh_request() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;

        for _ in 0..10 {
            let verdict = h.engine.decide(&artifact_request("trial-1")).await.unwrap();
            assert!(verdict.is_allowed());
        }

        let verdict = h.engine.decide(&artifact_request("trial-1")).await.unwrap();
        assert_eq!(verdict.outcome, VerdictOutcome::Deny);
        assert_eq!(verdict.reason_code, ReasonCode::BudgetExceeded);

        let decisions = events(&h.storage)
            .await
            .into_iter()
            .filter(|e| matches!(e, AuditEvent::DecisionRecorded { .. }))
            .count();
        assert_eq!(decisions, 11);
    }

    #[tokio::test]
    async fn test_resubmitted_request_replays_recorded_verdict() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        let req = execution_request("usr-1");

        let first = h.engine.decide(&req).await.unwrap();
        let second = h.engine.decide(&req).await.unwrap();
        assert_eq!(first, second);

        // The retry opened no second ticket and recorded no second verdict.
        let events = events(&h.storage).await;
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AuditEvent::TicketOpened { .. }))
                .count(),
            1
        );
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, AuditEvent::DecisionRecorded { .. }))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_approval_never_transfers_between_requests() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;

        h.engine.decide(&execution_request("usr-1")).await.unwrap();
        h.engine.decide(&execution_request("usr-1")).await.unwrap();

        // The second identical request opened its own ticket.
        let opened: Vec<_> = events(&h.storage)
            .await
            .into_iter()
            .filter_map(|e| match e {
                AuditEvent::TicketOpened { ticket_id, .. } => Some(ticket_id),
                _ => None,
            })
            .collect();
        assert_eq!(opened.len(), 2);
        assert_ne!(opened[0], opened[1]);
    }

    #[tokio::test]
    async fn test_artifact_ticket_cannot_authorize_execution() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        let mut alerts = h.workflow.hooks().subscribe();

        h.engine.decide(&artifact_request("usr-1")).await.unwrap();
        let artifact_ticket = events(&h.storage)
            .await
            .into_iter()
            .find_map(|e| match e {
                AuditEvent::TicketOpened { ticket_id, .. } => Some(ticket_id),
                _ => None,
            })
            .unwrap();

        let req = execution_request("usr-1").with_ticket(artifact_ticket);
        let verdict = h.engine.decide(&req).await.unwrap();

        assert_eq!(verdict.outcome, VerdictOutcome::Deny);
        assert_eq!(verdict.reason_code, ReasonCode::ExecBypass);

        let events = events(&h.storage).await;
        assert!(events.iter().any(|e| matches!(
            e,
            AuditEvent::SecurityAlert { violation_type, .. } if violation_type == "exec_bypass"
        )));

        // The alert also went out on the hook bus.
        let mut saw_alert = false;
        while let Some(hook) = alerts.try_recv() {
            if hook.hook_type() == "security_alert" {
                saw_alert = true;
            }
        }
        assert!(saw_alert);
    }

    #[tokio::test]
    async fn test_precedent_gate_marks_verdict() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        h.engine
            .register_seed(PrecedentSeed::new(
                "payments-gate",
                MatchCriteria {
                    action_type: Some("send_payment".into()),
                    ..MatchCriteria::default()
                },
                SeedEffect::AddGate {
                    gate: "payments require explicit review".into(),
                },
                RequestId::new(),
            ))
            .await
            .unwrap();

        let verdict = h.engine.decide(&execution_request("usr-1")).await.unwrap();
        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason_code, ReasonCode::PrecedentGated);
    }

    #[tokio::test]
    async fn test_class_constrained_seed_applies_to_derived_class() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;
        h.engine
            .register_seed(PrecedentSeed::new(
                "execution-gate",
                MatchCriteria {
                    act_class: Some(ActClass::Execution),
                    ..MatchCriteria::default()
                },
                SeedEffect::AddGate {
                    gate: "execution requires explicit review".into(),
                },
                RequestId::new(),
            ))
            .await
            .unwrap();

        // The request declares artifact, but the rule table classifies
        // send_payment as execution; the seed still applies.
        let mut req = execution_request("usr-1");
        req.act_class = ActClass::Artifact;
        let verdict = h.engine.decide(&req).await.unwrap();
        assert!(verdict.is_allowed());
        assert_eq!(verdict.reason_code, ReasonCode::PrecedentGated);
    }

    #[tokio::test]
    async fn test_seed_lifecycle_audited() {
        let (h, _r) = auto_harness(ApprovalDecision::Approve).await;

        let weak = h
            .engine
            .register_seed(PrecedentSeed::new(
                "bad",
                MatchCriteria::default(),
                SeedEffect::ReduceApproval,
                RequestId::new(),
            ))
            .await;
        assert!(matches!(weak, Err(EngineError::Registry(_))));
        assert_eq!(h.storage.count().await.unwrap(), 0);

        h.engine
            .register_seed(PrecedentSeed::new(
                "v1",
                MatchCriteria::default(),
                SeedEffect::Clarify {
                    note: "approved precedent".into(),
                },
                RequestId::new(),
            ))
            .await
            .unwrap();
        h.engine
            .supersede_seed(
                &SeedId::new("v1"),
                PrecedentSeed::new(
                    "v2",
                    MatchCriteria::default(),
                    SeedEffect::Clarify {
                        note: "narrowed precedent".into(),
                    },
                    RequestId::new(),
                ),
            )
            .await
            .unwrap();

        let events = events(&h.storage).await;
        assert!(
            events
                .iter()
                .any(|e| matches!(e, AuditEvent::SeedRegistered { .. }))
        );
        assert!(
            events
                .iter()
                .any(|e| matches!(e, AuditEvent::SeedSuperseded { .. }))
        );
    }
}
