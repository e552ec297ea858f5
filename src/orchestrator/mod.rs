//! Per-component work of a reconfiguration: starting, stopping and
//! reparametrizing components. Batches always visit every item and report
//! the logical AND of the individual outcomes.

mod activation;
mod adaptation;

pub use activation::ActivationOrchestrator;
pub use adaptation::AdaptationOrchestrator;
