//! Settlement of completed job runs.
//!
//! The `SettlementProvider` trait abstracts the collaborator that publishes a
//! run's result; `CompletionNotifier` decides when to call it and how to
//! report the outcome.

mod log_provider;
mod notifier;
mod provider;
mod webhook_provider;

#[cfg(test)]
pub(crate) mod testing;

pub use log_provider::LogProvider;
pub use notifier::{CompletionNotifier, NotifyOutcome, SubmissionPolicy, TriggerSource};
pub use provider::{SettlementPayload, SettlementProvider, SettlementReceipt};
pub use webhook_provider::WebhookProvider;

use std::sync::Arc;

use crate::config::settings::{SettlementProviderKind, SettlementSettings};

/// Build the provider selected in configuration
pub fn provider_from_settings(settings: &SettlementSettings) -> Arc<dyn SettlementProvider> {
    match settings.provider {
        SettlementProviderKind::Log => Arc::new(LogProvider::new()),
        SettlementProviderKind::Webhook => Arc::new(WebhookProvider::new(settings.webhook.clone())),
    }
}
