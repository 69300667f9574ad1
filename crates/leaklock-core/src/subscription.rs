//! Subscriptions: listing, summary and demo seeding.
//!
//! Seeding picks a handful of templates and randomises amount, next billing
//! date and status. The random source is passed in so tests can use a
//! seeded `StdRng`.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDate};
use leaklock_state::OwnerId;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::domain::{LeakLockError, Result};

/// Lifecycle state of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Paused,
    Cancelled,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Paused => "paused",
            SubscriptionStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = LeakLockError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(SubscriptionStatus::Active),
            "paused" => Ok(SubscriptionStatus::Paused),
            "cancelled" | "canceled" => Ok(SubscriptionStatus::Cancelled),
            other => Err(LeakLockError::InvalidInput(format!(
                "unknown subscription status: {other}"
            ))),
        }
    }
}

/// A recurring payment tracked for an owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub owner: OwnerId,
    pub provider: String,
    pub name: String,
    pub category: String,
    pub amount: f64,
    pub billing_cycle: String,
    pub currency: String,
    pub next_billing_date: NaiveDate,
    pub status: SubscriptionStatus,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// Optional exact-match filters for listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    pub status: Option<SubscriptionStatus>,
    pub category: Option<String>,
    pub provider: Option<String>,
}

impl SubscriptionFilter {
    pub fn matches(&self, sub: &Subscription) -> bool {
        self.status.map_or(true, |s| sub.status == s)
            && self.category.as_ref().map_or(true, |c| &sub.category == c)
            && self.provider.as_ref().map_or(true, |p| &sub.provider == p)
    }
}

/// Apply `filter`, then order by next billing date (soonest first).
pub fn filter_and_sort(subs: &[Subscription], filter: &SubscriptionFilter) -> Vec<Subscription> {
    let mut selected: Vec<Subscription> =
        subs.iter().filter(|s| filter.matches(s)).cloned().collect();
    selected.sort_by_key(|s| s.next_billing_date);
    selected
}

/// Counts and spend across a listing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionSummary {
    pub total: usize,
    pub active: usize,
    /// Sum of active amounts, rounded to cents
    pub total_monthly_cost: f64,
}

pub fn summarize(subs: &[Subscription]) -> SubscriptionSummary {
    let active: Vec<&Subscription> = subs
        .iter()
        .filter(|s| s.status == SubscriptionStatus::Active)
        .collect();
    let cost: f64 = active.iter().map(|s| s.amount).sum();

    SubscriptionSummary {
        total: subs.len(),
        active: active.len(),
        total_monthly_cost: round_cents(cost),
    }
}

/// Catalogue entry used when seeding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionTemplate {
    pub provider: String,
    pub name: String,
    pub category: String,
    pub amount_min: f64,
    pub amount_max: f64,
    pub billing_cycle: String,
    pub currency: String,
}

impl SubscriptionTemplate {
    pub fn new(
        provider: &str,
        name: &str,
        category: &str,
        amount_min: f64,
        amount_max: f64,
    ) -> Self {
        Self {
            provider: provider.to_string(),
            name: name.to_string(),
            category: category.to_string(),
            amount_min,
            amount_max,
            billing_cycle: "monthly".to_string(),
            currency: "INR".to_string(),
        }
    }
}

const MIN_SEEDED: usize = 6;
const MAX_SEEDED: usize = 9;

/// Generate demo subscriptions for `owner` from `templates`.
///
/// Picks 6 to 9 distinct templates (fewer if the catalogue is smaller).
/// Each gets an amount in `[amount_min, amount_max]` rounded to cents, a
/// next billing date 1 to 30 days after `today`, and a status drawn
/// 80% active, 15% paused, 5% cancelled.
pub fn seed_subscriptions<R: Rng + ?Sized>(
    rng: &mut R,
    owner: &OwnerId,
    templates: &[SubscriptionTemplate],
    today: NaiveDate,
) -> Result<Vec<Subscription>> {
    if templates.is_empty() {
        return Err(LeakLockError::NoTemplates);
    }

    let wanted = rng.gen_range(MIN_SEEDED..=MAX_SEEDED).min(templates.len());
    let picked: Vec<&SubscriptionTemplate> = templates.choose_multiple(rng, wanted).collect();
    debug!(owner = %owner, count = picked.len(), "seeding subscriptions");

    let subs = picked
        .into_iter()
        .map(|template| {
            let amount = sample_amount(rng, template.amount_min, template.amount_max);
            let days_out = rng.gen_range(1..=30);
            let status = sample_status(rng);

            Subscription {
                id: Uuid::new_v4(),
                owner: owner.clone(),
                provider: template.provider.clone(),
                name: template.name.clone(),
                category: template.category.clone(),
                amount,
                billing_cycle: template.billing_cycle.clone(),
                currency: template.currency.clone(),
                next_billing_date: today + Duration::days(days_out),
                status,
                payment_method: None,
                notes: None,
            }
        })
        .collect();

    Ok(subs)
}

fn sample_amount<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
    if lo == hi {
        return lo;
    }
    round_cents(rng.gen_range(lo..=hi))
}

fn sample_status<R: Rng + ?Sized>(rng: &mut R) -> SubscriptionStatus {
    let roll: f64 = rng.gen();
    if roll > 0.95 {
        SubscriptionStatus::Cancelled
    } else if roll > 0.80 {
        SubscriptionStatus::Paused
    } else {
        SubscriptionStatus::Active
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Default catalogue for demo accounts.
pub fn builtin_templates() -> Vec<SubscriptionTemplate> {
    vec![
        SubscriptionTemplate::new("Netflix", "Netflix Standard", "Entertainment", 199.0, 649.0),
        SubscriptionTemplate::new("Spotify", "Spotify Premium", "Music", 119.0, 119.0),
        SubscriptionTemplate::new("Amazon Prime", "Prime Membership", "Shopping", 299.0, 299.0),
        SubscriptionTemplate::new("YouTube", "YouTube Premium", "Entertainment", 129.0, 189.0),
        SubscriptionTemplate::new("Disney+ Hotstar", "Super", "Entertainment", 299.0, 299.0),
        SubscriptionTemplate::new("Microsoft", "Microsoft 365", "Productivity", 489.0, 619.0),
        SubscriptionTemplate::new("Google", "Google One 100 GB", "Cloud Storage", 130.0, 130.0),
        SubscriptionTemplate::new("Notion", "Notion Plus", "Productivity", 800.0, 830.0),
        SubscriptionTemplate::new("Cult.fit", "Cult Pass", "Fitness", 999.0, 1499.0),
        SubscriptionTemplate::new("Zomato", "Zomato Gold", "Food", 149.0, 149.0),
        SubscriptionTemplate::new("Apple", "iCloud+ 50 GB", "Cloud Storage", 75.0, 75.0),
    ]
}
