//! Consensus: dispatch results and their reduction into an agreement.
//!
//! One dispatch fans a prompt out to every warrior; each produces a
//! [`DispatchResult`]. [`aggregate`] reduces the set into a
//! [`ConsensusResult`] with an [`AgreementLevel`] and explicit conflicts.

pub mod agreement;
pub mod aggregate;
pub mod dispatch;

pub use agreement::AgreementLevel;
pub use aggregate::{ConsensusResult, aggregate, decision_token, is_actionable};
pub use dispatch::DispatchResult;
