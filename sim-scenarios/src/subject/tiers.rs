//! Stand-in identities for tier checks.

use chrono::{Duration, Utc};
use sim_types::{MockIdentity, SubscriptionRecord, TierId, TierSelector};

/// Hands out identities without touching an auth backend.
pub trait TierProvider: Send + Sync {
    /// The identity for `selector`.
    fn mock_tier(&self, selector: TierSelector) -> MockIdentity;
}

/// Fixed identities for every tier plus an administrator.
///
/// Paid identities carry an active subscription that started ten days ago
/// and ends in twenty.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockTierProvider;

impl TierProvider for MockTierProvider {
    fn mock_tier(&self, selector: TierSelector) -> MockIdentity {
        let (handle, tier, is_admin) = match selector {
            TierSelector::Admin => ("admin".to_string(), TierId::Vip9, true),
            TierSelector::Tier(tier) => (tier.as_str().replace('_', ""), tier, false),
        };

        let now = Utc::now();
        let subscription = (tier != TierId::Free).then(|| SubscriptionRecord {
            tier_id: tier,
            status: "active".into(),
            current_period_start: now - Duration::days(10),
            current_period_end: now + Duration::days(20),
        });

        MockIdentity {
            id: format!("sim-user-{handle}"),
            email: format!("sim-{handle}@launchsim.test"),
            tier,
            is_admin,
            subscription,
        }
    }
}
