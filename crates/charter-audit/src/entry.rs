//! Audit entries and the governance events they record.
//!
//! Every decided request, ticket transition, seed change, and security
//! alert becomes exactly one entry. Entries are chain-linked (each carries
//! the hash of its predecessor) and signed by the engine's keyring.

use charter_core::{
    ActClass, Granularity, PrincipalId, ReasonCode, RequestId, SeedId, TargetScope, TicketId,
    Timestamp, VerdictOutcome,
};
use charter_crypto::{ContentHash, KeyId, Signature, SigningKeyring};
use serde::{Deserialize, Serialize};

use crate::canonical::canonicalize;
use crate::error::{AuditError, AuditResult};

/// A governance event recorded in the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A request reached a decision (terminal or pending).
    DecisionRecorded {
        /// The decided request.
        request_id: RequestId,
        /// The submitting principal.
        principal_id: PrincipalId,
        /// Effect-boundary class the engine derived.
        act_class: ActClass,
        /// Registered action type.
        action_type: String,
        /// What the action targets.
        target_scope: TargetScope,
        /// Outcome.
        outcome: VerdictOutcome,
        /// Why.
        reason_code: ReasonCode,
        /// The ticket the decision turned on, if one exists.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ticket_id: Option<TicketId>,
    },

    /// An approval ticket was opened.
    TicketOpened {
        /// The new ticket.
        ticket_id: TicketId,
        /// The request awaiting approval.
        request_id: RequestId,
        /// The approval class the ticket covers.
        approval_type: ActClass,
        /// Coverage of the approval.
        granularity: Granularity,
        /// Scope whose governor must resolve it.
        approver_scope: TargetScope,
    },

    /// A governor resolved an open ticket.
    TicketResolved {
        /// The resolved ticket.
        ticket_id: TicketId,
        /// The request it covered.
        request_id: RequestId,
        /// Whether the governor approved.
        approved: bool,
        /// The resolving governor.
        resolved_by: PrincipalId,
    },

    /// A ticket timed out or was cancelled without resolution.
    TicketExpired {
        /// The expired ticket.
        ticket_id: TicketId,
        /// The request it covered.
        request_id: RequestId,
    },

    /// A resolution was attempted on an already-resolved ticket.
    DuplicateResolution {
        /// The ticket.
        ticket_id: TicketId,
        /// Who attempted the second resolution.
        attempted_by: PrincipalId,
    },

    /// A security-relevant violation was detected.
    SecurityAlert {
        /// The offending request.
        request_id: RequestId,
        /// The submitting principal.
        principal_id: PrincipalId,
        /// Violation kind, e.g. `"exec_bypass"`.
        violation_type: String,
        /// Human-readable details.
        details: String,
    },

    /// A precedent seed was registered.
    SeedRegistered {
        /// The new seed.
        seed_id: SeedId,
        /// Seed effect (`"clarify"` or `"add_gate"`).
        effect: String,
        /// The decided request the seed grew from.
        created_from_request_id: RequestId,
    },

    /// A precedent seed was superseded by a newer one.
    SeedSuperseded {
        /// The retired seed.
        old_seed_id: SeedId,
        /// Its replacement.
        new_seed_id: SeedId,
    },

    /// The signing key was rotated.
    KeyRotated {
        /// Hex ID of the outgoing key.
        old_key_id: String,
        /// Hex ID of the incoming key.
        new_key_id: String,
    },
}

impl AuditEvent {
    /// A short human-readable description, used in logs.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::DecisionRecorded {
                request_id,
                outcome,
                reason_code,
                ..
            } => format!("{request_id} decided {outcome} ({reason_code})"),
            Self::TicketOpened {
                ticket_id,
                request_id,
                ..
            } => format!("{ticket_id} opened for {request_id}"),
            Self::TicketResolved {
                ticket_id,
                approved,
                ..
            } => format!(
                "{ticket_id} {}",
                if *approved { "approved" } else { "rejected" }
            ),
            Self::TicketExpired { ticket_id, .. } => format!("{ticket_id} expired"),
            Self::DuplicateResolution { ticket_id, .. } => {
                format!("duplicate resolution on {ticket_id}")
            },
            Self::SecurityAlert { violation_type, .. } => {
                format!("security alert: {violation_type}")
            },
            Self::SeedRegistered { seed_id, .. } => format!("{seed_id} registered"),
            Self::SeedSuperseded {
                old_seed_id,
                new_seed_id,
            } => format!("{old_seed_id} superseded by {new_seed_id}"),
            Self::KeyRotated { new_key_id, .. } => format!("key rotated to {new_key_id}"),
        }
    }
}

/// Hashed and signed portion of an entry.
///
/// Sequence number and timestamp are inside the hash, so reordering or
/// backdating an entry breaks the chain just like editing its event does.
#[derive(Serialize)]
struct SignedBody<'a> {
    seq: u64,
    recorded_at: &'a Timestamp,
    event: &'a AuditEvent,
}

/// A single entry in the audit chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0.
    pub seq: u64,
    /// Hash of the previous entry; zero for the genesis entry.
    pub prev_hash: ContentHash,
    /// `blake3(prev_hash ‖ canonical(body))`.
    pub entry_hash: ContentHash,
    /// The recorded event.
    pub event: AuditEvent,
    /// When the entry was recorded.
    pub recorded_at: Timestamp,
    /// Which keyring key signed this entry.
    pub key_id: KeyId,
    /// Ed25519 signature over `entry_hash`.
    pub signature: Signature,
}

impl AuditEntry {
    /// Build, hash, and sign an entry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Canonicalization`] if the event body cannot be
    /// canonically encoded.
    pub fn seal(
        seq: u64,
        prev_hash: ContentHash,
        event: AuditEvent,
        keyring: &SigningKeyring,
    ) -> AuditResult<Self> {
        let recorded_at = Timestamp::now();
        let body = canonicalize(&SignedBody {
            seq,
            recorded_at: &recorded_at,
            event: &event,
        })?;
        let entry_hash = ContentHash::hash_multi(&[prev_hash.as_bytes(), &body]);
        let (key_id, signature) = keyring.sign(entry_hash.as_bytes());

        Ok(Self {
            seq,
            prev_hash,
            entry_hash,
            event,
            recorded_at,
            key_id,
            signature,
        })
    }

    /// Recompute the hash this entry should carry.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::Canonicalization`] if the event body cannot be
    /// canonically encoded.
    pub fn compute_hash(&self) -> AuditResult<ContentHash> {
        let body = canonicalize(&SignedBody {
            seq: self.seq,
            recorded_at: &self.recorded_at,
            event: &self.event,
        })?;
        Ok(ContentHash::hash_multi(&[self.prev_hash.as_bytes(), &body]))
    }

    /// Verify this entry's hash and signature against the keyring.
    ///
    /// # Errors
    ///
    /// Returns [`AuditError::InvalidSignature`] if the stored hash does not
    /// match the recomputed one or the signature does not verify.
    pub fn verify(&self, keyring: &SigningKeyring) -> AuditResult<()> {
        if self.compute_hash()? != self.entry_hash {
            return Err(AuditError::InvalidSignature { seq: self.seq });
        }
        keyring
            .verify(&self.key_id, self.entry_hash.as_bytes(), &self.signature)
            .map_err(|_| AuditError::InvalidSignature { seq: self.seq })
    }

    /// Check if this entry directly follows another in the chain.
    #[must_use]
    pub fn follows(&self, previous: &AuditEntry) -> bool {
        self.seq == previous.seq + 1 && self.prev_hash == previous.entry_hash
    }
}
