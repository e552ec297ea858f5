//! Remote call gateway.
//!
//! Every call first waits (bounded) for its endpoint to become reachable, then
//! dispatches the request as a separate task and waits (bounded) for the
//! answer. A timed-out call is cancelled through its token so abandoned calls
//! never pile up.

mod remote;
mod message;
mod transport;

pub use remote::{unexpected, Gateway};
pub use message::{Request, Response};
pub use transport::{Endpoint, LocalTransport, Transport};
