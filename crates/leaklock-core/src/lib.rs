//! LeakLock Core Library
//!
//! Event notification fan-out for subscription tracking, plus the provider
//! assistant and subscription summaries that sit next to it.

pub mod aggregator;
pub mod auth;
pub mod clock;
pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod domain;
pub mod metrics;
pub mod obs;
pub mod provider_guide;
pub mod subscription;
pub mod telemetry;

pub use aggregator::{aggregate, aggregate_slots};
pub use auth::{bearer_token, Authenticator, StaticTokenAuthenticator};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::DispatchConfig;
pub use delivery::{Deliverer, HttpDeliverer};
pub use dispatcher::{DispatchPhase, Dispatcher};
pub use domain::{
    DeliveryOutcome, DeliveryStatus, DispatchError, DispatchSummary, Envelope, LeakLockError,
    Result,
};
pub use provider_guide::{parse_intent, respond, AssistantReply, Intent, ProviderAction};
pub use subscription::{
    builtin_templates, filter_and_sort, seed_subscriptions, summarize, Subscription,
    SubscriptionFilter, SubscriptionStatus, SubscriptionSummary, SubscriptionTemplate,
};

pub use leaklock_state::{DeliveryTarget, NewTarget, OwnerId, TargetId, TargetRegistry};

pub use metrics::METRICS;
pub use obs::{
    dispatch_span, emit_delivery_finished, emit_dispatch_completed, emit_dispatch_rejected,
    emit_dispatch_started, emit_targets_resolved,
};
pub use telemetry::init_tracing;

/// LeakLock version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
