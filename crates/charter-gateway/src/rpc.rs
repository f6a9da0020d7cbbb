//! JSON-RPC API definition for the governance gateway.
//!
//! Uses jsonrpsee proc macros to define the RPC interface. The gateway
//! implements the server side; execution systems and approval surfaces
//! call it as clients.

use charter_approval::{ApprovalDecision, ApprovalTicket};
use charter_audit::ChainVerification;
use charter_core::{ActionRequest, PrincipalId, TicketId, Verdict};
use jsonrpsee::proc_macros::rpc;
use jsonrpsee::types::ErrorObjectOwned;
use serde::{Deserialize, Serialize};

// ---------- Wire types ----------

/// Status information about the running engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineStatus {
    /// Whether the engine is accepting requests.
    pub running: bool,
    /// How long the engine has been up (seconds).
    pub uptime_secs: u64,
    /// Engine version.
    pub version: String,
    /// Number of entries in the audit chain.
    pub chain_entries: u64,
    /// Number of approval tickets currently open.
    pub open_tickets: usize,
    /// Number of principals with live budget counters.
    pub tracked_principals: usize,
    /// Number of active precedent seeds.
    pub active_seeds: usize,
    /// Hex ID of the current signing key.
    pub signing_key_id: String,
}

// ---------- RPC API ----------

/// The Charter governance RPC API.
///
/// Implemented by the gateway (server side). Called by the execution
/// system to gate real effects and by approval surfaces to resolve
/// tickets.
#[rpc(server, client, namespace = "charter")]
pub trait CharterRpc {
    /// Decide one action request, returning its terminal verdict.
    ///
    /// Blocks while an approval ticket is open.
    #[method(name = "decide")]
    async fn decide(&self, request: ActionRequest) -> Result<Verdict, ErrorObjectOwned>;

    /// Resolve an open approval ticket as the given governor.
    #[method(name = "resolveTicket")]
    async fn resolve_ticket(
        &self,
        ticket_id: TicketId,
        decision: ApprovalDecision,
        resolver: PrincipalId,
    ) -> Result<ApprovalTicket, ErrorObjectOwned>;

    /// Verify the audit chain over `from..=to`.
    ///
    /// `to` defaults to the current chain head.
    #[method(name = "verifyChain")]
    async fn verify_chain(
        &self,
        from: u64,
        to: Option<u64>,
    ) -> Result<ChainVerification, ErrorObjectOwned>;

    /// Get engine status.
    #[method(name = "status")]
    async fn status(&self) -> Result<EngineStatus, ErrorObjectOwned>;
}
