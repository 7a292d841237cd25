//! Client-side update engine: hand-off queue, entity builders, and the
//! update dispatcher that turns wire frames into domain events.

pub mod builders;
pub mod cache;
pub mod dispatcher;
pub mod events;
pub mod handoff;
pub mod schedule;
pub mod wire;

use tracing_subscriber::{fmt, EnvFilter};

pub use crate::builders::{EntityBuilders, NoopBuilders};
pub use crate::cache::{EntityCache, SharedEntityCache};
pub use crate::dispatcher::UpdateDispatcher;
pub use crate::events::{ConnectionState, DomainEvent, EventSink};
pub use crate::handoff::{pump, HandoffQueue};
pub use crate::schedule::{MuteScheduler, MuteTarget};
pub use crate::wire::WireUpdate;

/// Install the default tracing subscriber for embedding applications that
/// do not bring their own.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("telegraphe_client=debug,telegraphe_session=info,telegraphe_proto=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}
