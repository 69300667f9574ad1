//! Provider assistant.
//!
//! Answers "how do I cancel / pause / renew X" from a static table of known
//! providers. Intent extraction (turning free text into an action and a
//! service name) happens upstream; [`parse_intent`] accepts its JSON output.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// What the user wants to do with a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderAction {
    Cancel,
    Pause,
    Renew,
    Unknown,
}

impl ProviderAction {
    /// Case-insensitive; anything unrecognised is `Unknown`.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "cancel" => ProviderAction::Cancel,
            "pause" => ProviderAction::Pause,
            "renew" => ProviderAction::Renew,
            _ => ProviderAction::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderAction::Cancel => "cancel",
            ProviderAction::Pause => "pause",
            ProviderAction::Renew => "renew",
            ProviderAction::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ProviderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the assistant knows about one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderInfo {
    pub allows_pause: bool,
    pub cancel_steps: Option<&'static [&'static str]>,
    pub pause_steps: Option<&'static [&'static str]>,
    pub renew_steps: Option<&'static [&'static str]>,
    pub url: Option<&'static str>,
}

static PROVIDERS: &[(&str, ProviderInfo)] = &[
    (
        "netflix",
        ProviderInfo {
            allows_pause: false,
            cancel_steps: Some(&[
                "Open Netflix app or visit netflix.com",
                "Go to Account settings",
                "Click 'Cancel Membership'",
                "Confirm cancellation",
                "You'll have access until the end of your billing period",
            ]),
            pause_steps: None,
            renew_steps: Some(&[
                "Open Netflix app or visit netflix.com",
                "Go to Account settings",
                "Click 'Restart Membership'",
                "Choose your plan and confirm",
            ]),
            url: Some("https://www.netflix.com/cancelplan"),
        },
    ),
    (
        "spotify",
        ProviderInfo {
            allows_pause: true,
            cancel_steps: Some(&[
                "Open Spotify app or visit spotify.com/account",
                "Click on 'Subscription' in the menu",
                "Select 'Cancel Premium'",
                "Follow the prompts to confirm",
                "Premium benefits end at the next billing date",
            ]),
            pause_steps: Some(&[
                "Open Spotify app or visit spotify.com/account",
                "Go to Subscription settings",
                "Select 'Pause my subscription'",
                "Choose how long to pause (1-3 months)",
                "Confirm your choice",
            ]),
            renew_steps: Some(&[
                "Open Spotify app or visit spotify.com/account",
                "Click on 'Subscription'",
                "Select 'Resume Premium'",
                "Confirm to restart your subscription",
            ]),
            url: Some("https://www.spotify.com/account/subscription/"),
        },
    ),
    (
        "amazon prime",
        ProviderInfo {
            allows_pause: false,
            cancel_steps: Some(&[
                "Go to Amazon.in and sign in",
                "Navigate to 'Account & Lists' → 'Prime Membership'",
                "Click 'End Membership'",
                "Follow the cancellation flow",
                "Confirm your choice",
            ]),
            pause_steps: None,
            renew_steps: Some(&[
                "Go to Amazon.in and sign in",
                "Navigate to 'Account & Lists' → 'Prime Membership'",
                "Click 'Restart Your Membership'",
                "Complete the payment process",
            ]),
            url: Some("https://www.amazon.in/mc/manageyourmembership"),
        },
    ),
    (
        "youtube",
        ProviderInfo {
            allows_pause: true,
            cancel_steps: Some(&[
                "Open YouTube app or visit youtube.com",
                "Go to Settings → Purchases & memberships",
                "Select your YouTube Premium subscription",
                "Click 'Manage' then 'Cancel subscription'",
                "Confirm cancellation",
            ]),
            pause_steps: Some(&[
                "Open YouTube app or visit youtube.com",
                "Go to Settings → Purchases & memberships",
                "Select 'Pause membership'",
                "Choose duration and confirm",
            ]),
            renew_steps: Some(&[
                "Open YouTube app or visit youtube.com",
                "Go to Settings → Purchases & memberships",
                "Click 'Resume membership'",
                "Confirm to restart",
            ]),
            url: Some("https://www.youtube.com/paid_memberships"),
        },
    ),
];

const GENERIC_CANCEL_STEPS: &[&str] = &[
    "Open the provider's app or website",
    "Navigate to Billing or Subscription settings",
    "Look for 'Manage Subscription' or 'Cancel'",
    "Follow the cancellation flow",
    "Save any confirmation emails",
];

const GENERIC_RENEW_STEPS: &[&str] = &[
    "Open the provider's app or website",
    "Navigate to your subscription settings",
    "Look for 'Renew' or 'Reactivate'",
    "Complete the payment process",
];

/// Look up a provider by lowercase name.
pub fn lookup(service: &str) -> Option<&'static ProviderInfo> {
    PROVIDERS
        .iter()
        .find(|(name, _)| *name == service)
        .map(|(_, info)| info)
}

/// Names of every provider in the table.
pub fn known_providers() -> impl Iterator<Item = &'static str> {
    PROVIDERS.iter().map(|(name, _)| *name)
}

/// Extracted intent: one action, one service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub action: ProviderAction,
    /// Lowercased service name, `"unknown"` when not determined
    pub service: String,
}

impl Intent {
    pub fn unknown() -> Self {
        Self {
            action: ProviderAction::Unknown,
            service: UNKNOWN.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawIntent {
    action: Option<String>,
    service: Option<String>,
}

const UNKNOWN: &str = "unknown";

/// Parse `{"action": "...", "service": "..."}` produced by the intent model.
///
/// Invalid JSON falls back to unknown/unknown. Missing or blank fields are
/// unknown.
pub fn parse_intent(text: &str) -> Intent {
    let raw: RawIntent = match serde_json::from_str(text.trim()) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "intent is not valid JSON, treating as unknown");
            return Intent::unknown();
        }
    };

    Intent {
        action: raw
            .action
            .as_deref()
            .map(ProviderAction::parse)
            .unwrap_or(ProviderAction::Unknown),
        service: normalize_service(raw.service.as_deref().unwrap_or(UNKNOWN)),
    }
}

fn normalize_service(raw: &str) -> String {
    let service = raw.trim().to_lowercase();
    if service.is_empty() {
        UNKNOWN.to_string()
    } else {
        service
    }
}

/// Assistant answer, serialized camelCase for the chat client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub response: String,
    pub has_steps: bool,
    pub provider_url: Option<String>,
    pub action: ProviderAction,
    pub service: String,
}

fn numbered(steps: &[&str]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the reply for an intent.
pub fn respond(action: ProviderAction, service: &str) -> AssistantReply {
    let service = normalize_service(service);
    let service_unknown = service == UNKNOWN;
    let mut has_steps = false;
    let mut provider_url = None;

    let response = match (action, service_unknown) {
        (ProviderAction::Unknown, true) => "I'd be happy to help you with your subscription! \
             Could you please tell me which service you'd like to cancel, pause, or renew?"
            .to_string(),
        (_, true) => format!(
            "I understand you want to {action} a subscription. Which service would you like to {action}?"
        ),
        (ProviderAction::Unknown, false) => format!(
            "I can help you with {service}. Would you like to cancel, pause, or renew your {service} subscription?"
        ),
        (ProviderAction::Pause, false) => match lookup(&service) {
            None => format!(
                "I don't have specific information about pausing subscriptions for {service}. \
                 I recommend checking their website or app for pause options in your subscription settings."
            ),
            Some(info) if !info.allows_pause => format!(
                "Unfortunately, {service} does not allow pausing subscriptions. \
                 You can only cancel or keep it active. Would you like help with canceling instead?"
            ),
            Some(info) => match info.pause_steps {
                Some(steps) => {
                    has_steps = true;
                    provider_url = info.url.map(str::to_string);
                    format!(
                        "Here's how to pause your {service} subscription:\n\n{}",
                        numbered(steps)
                    )
                }
                None => format!(
                    "{service} allows pausing, but I don't have the exact steps. \
                     Check the subscription settings in their app or website."
                ),
            },
        },
        (ProviderAction::Cancel, false) => {
            has_steps = true;
            match lookup(&service).and_then(|info| info.cancel_steps.map(|s| (info, s))) {
                Some((info, steps)) => {
                    provider_url = info.url.map(str::to_string);
                    format!(
                        "Here's how to cancel your {service} subscription:\n\n{}",
                        numbered(steps)
                    )
                }
                None => format!(
                    "I don't have specific cancellation steps for {service}. Here's a general approach:\n\n{}",
                    numbered(GENERIC_CANCEL_STEPS)
                ),
            }
        }
        (ProviderAction::Renew, false) => {
            has_steps = true;
            match lookup(&service).and_then(|info| info.renew_steps.map(|s| (info, s))) {
                Some((info, steps)) => {
                    provider_url = info.url.map(str::to_string);
                    format!(
                        "Here's how to renew your {service} subscription:\n\n{}",
                        numbered(steps)
                    )
                }
                None => format!(
                    "I don't have specific renewal steps for {service}. Generally, you can:\n\n{}",
                    numbered(GENERIC_RENEW_STEPS)
                ),
            }
        }
    };

    AssistantReply {
        response,
        has_steps,
        provider_url,
        action,
        service,
    }
}

/// Convenience: parse model output and answer it.
pub fn respond_to_intent(text: &str) -> AssistantReply {
    let intent = parse_intent(text);
    respond(intent.action, &intent.service)
}
