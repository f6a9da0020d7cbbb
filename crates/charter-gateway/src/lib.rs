//! Charter Gateway - JSON-RPC inbound surface for the governance engine.
//!
//! Assembles the full stack (keyring, audit chain, budget guard, seed
//! registry, approval workflow, decision engine) from configuration and
//! serves `decide`, `resolveTicket`, `verifyChain`, and `status` over
//! JSON-RPC. The identity seams and the approver notification channel are
//! supplied by the embedder through [`GatewayDeps`].

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

mod error;
pub mod rpc;
mod server;

pub use error::{GatewayError, GatewayResult};
pub use rpc::EngineStatus;
pub use server::{Gateway, GatewayDeps};

/// Install the global tracing subscriber, filtered by `RUST_LOG`.
///
/// Call once from the binary embedding the gateway; a second call is a
/// no-op.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
