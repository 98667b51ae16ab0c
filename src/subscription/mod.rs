//! The subscription aggregate and its billing orchestration.

mod billing;
mod model;
mod partner;

pub use model::{Subscription, SubscriptionBuilder};
pub use partner::{MemoryPartnerRegistry, Partner, PartnerRegistry};
