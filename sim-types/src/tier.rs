//! Subscription tiers and stand-in identities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TierId {
    /// Free tier.
    #[serde(rename = "free")]
    Free,
    /// VIP 1.
    #[serde(rename = "vip1")]
    Vip1,
    /// VIP 2.
    #[serde(rename = "vip2")]
    Vip2,
    /// VIP 3.
    #[serde(rename = "vip3")]
    Vip3,
    /// Legacy VIP 3 II; ranks as VIP 3.
    #[serde(rename = "vip3ii")]
    Vip3ii,
    /// VIP 4.
    #[serde(rename = "vip4")]
    Vip4,
    /// VIP 5.
    #[serde(rename = "vip5")]
    Vip5,
    /// VIP 6.
    #[serde(rename = "vip6")]
    Vip6,
    /// VIP 7.
    #[serde(rename = "vip7")]
    Vip7,
    /// VIP 8.
    #[serde(rename = "vip8")]
    Vip8,
    /// VIP 9.
    #[serde(rename = "vip9")]
    Vip9,
    /// Kids level 1.
    #[serde(rename = "kids_1")]
    Kids1,
    /// Kids level 2.
    #[serde(rename = "kids_2")]
    Kids2,
    /// Kids level 3.
    #[serde(rename = "kids_3")]
    Kids3,
}

/// Tier labels a room may carry, including legacy display labels.
pub(crate) const VALID_TIER_LABELS: &[&str] = &[
    "free",
    "Free / Miễn phí",
    "vip1",
    "VIP1",
    "vip2",
    "VIP2",
    "vip3",
    "VIP3",
    "vip3ii",
    "VIP3II",
    "vip4",
    "VIP4",
    "vip5",
    "VIP5",
    "vip6",
    "VIP6",
    "vip7",
    "VIP7",
    "vip8",
    "VIP8",
    "vip9",
    "VIP9",
    "kids_1",
    "Kids Level 1",
    "kids_2",
    "Kids Level 2",
    "kids_3",
    "Kids Level 3",
];

enum Track {
    Main(u8),
    Kids(u8),
}

impl TierId {
    /// Every tier, in ascending order per track.
    pub const ALL: [TierId; 14] = [
        TierId::Free,
        TierId::Vip1,
        TierId::Vip2,
        TierId::Vip3,
        TierId::Vip3ii,
        TierId::Vip4,
        TierId::Vip5,
        TierId::Vip6,
        TierId::Vip7,
        TierId::Vip8,
        TierId::Vip9,
        TierId::Kids1,
        TierId::Kids2,
        TierId::Kids3,
    ];

    /// Canonical identifier, e.g. `vip9` or `kids_1`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Vip1 => "vip1",
            Self::Vip2 => "vip2",
            Self::Vip3 => "vip3",
            Self::Vip3ii => "vip3ii",
            Self::Vip4 => "vip4",
            Self::Vip5 => "vip5",
            Self::Vip6 => "vip6",
            Self::Vip7 => "vip7",
            Self::Vip8 => "vip8",
            Self::Vip9 => "vip9",
            Self::Kids1 => "kids_1",
            Self::Kids2 => "kids_2",
            Self::Kids3 => "kids_3",
        }
    }

    /// Parse a canonical identifier. Display labels are not accepted here;
    /// use [`TierId::normalize`] for those.
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == id)
    }

    /// Map any valid tier label (legacy or display) to a tier.
    ///
    /// `vip3ii` labels normalize to [`TierId::Vip3`].
    pub fn normalize(label: &str) -> Option<Self> {
        let tier = match label {
            "free" | "Free / Miễn phí" => Self::Free,
            "vip1" | "VIP1" => Self::Vip1,
            "vip2" | "VIP2" => Self::Vip2,
            "vip3" | "VIP3" | "vip3ii" | "VIP3II" => Self::Vip3,
            "vip4" | "VIP4" => Self::Vip4,
            "vip5" | "VIP5" => Self::Vip5,
            "vip6" | "VIP6" => Self::Vip6,
            "vip7" | "VIP7" => Self::Vip7,
            "vip8" | "VIP8" => Self::Vip8,
            "vip9" | "VIP9" => Self::Vip9,
            "kids_1" | "Kids Level 1" => Self::Kids1,
            "kids_2" | "Kids Level 2" => Self::Kids2,
            "kids_3" | "Kids Level 3" => Self::Kids3,
            _ => return None,
        };
        Some(tier)
    }

    fn track(&self) -> Track {
        match self {
            Self::Free => Track::Main(0),
            Self::Vip1 => Track::Main(1),
            Self::Vip2 => Track::Main(2),
            Self::Vip3 | Self::Vip3ii => Track::Main(3),
            Self::Vip4 => Track::Main(4),
            Self::Vip5 => Track::Main(5),
            Self::Vip6 => Track::Main(6),
            Self::Vip7 => Track::Main(7),
            Self::Vip8 => Track::Main(8),
            Self::Vip9 => Track::Main(9),
            Self::Kids1 => Track::Kids(1),
            Self::Kids2 => Track::Kids(2),
            Self::Kids3 => Track::Kids(3),
        }
    }
}

impl std::fmt::Display for TierId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which mock identity to hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierSelector {
    /// A regular subscriber on the given tier.
    Tier(TierId),
    /// The administrator identity.
    Admin,
}

impl From<TierId> for TierSelector {
    fn from(tier: TierId) -> Self {
        Self::Tier(tier)
    }
}

/// Subscription row as the backend would return it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    /// Subscribed tier.
    pub tier_id: TierId,
    /// Backend status string, e.g. `active`.
    pub status: String,
    /// Start of the current billing period.
    pub current_period_start: DateTime<Utc>,
    /// End of the current billing period.
    pub current_period_end: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// True if the subscription is active at `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.current_period_start <= now && now < self.current_period_end
    }
}

/// An identity that stands in for a real authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockIdentity {
    /// User id.
    pub id: String,
    /// User email.
    pub email: String,
    /// Effective tier.
    pub tier: TierId,
    /// Administrator flag.
    pub is_admin: bool,
    /// Subscription row, `None` for free users.
    pub subscription: Option<SubscriptionRecord>,
}

/// Whether `identity` may open a room on `room_tier`.
///
/// Admins see everything. The main track is ordered `free < vip1 < ... < vip9`.
/// Kids tiers see free rooms and kids rooms at or below their level. A paid
/// tier without an active subscription falls back to free access.
pub fn can_access(identity: &MockIdentity, room_tier: TierId) -> bool {
    if identity.is_admin {
        return true;
    }

    let effective = match &identity.subscription {
        Some(sub) if sub.is_active_at(Utc::now()) => identity.tier,
        _ => TierId::Free,
    };

    match (effective.track(), room_tier.track()) {
        (_, Track::Main(0)) => true,
        (Track::Main(have), Track::Main(need)) => have >= need,
        (Track::Kids(have), Track::Kids(need)) => have >= need,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn identity(tier: TierId, is_admin: bool, active: bool) -> MockIdentity {
        let now = Utc::now();
        let subscription = (tier != TierId::Free).then(|| SubscriptionRecord {
            tier_id: tier,
            status: if active { "active" } else { "canceled" }.into(),
            current_period_start: now - Duration::days(10),
            current_period_end: now + Duration::days(20),
        });
        MockIdentity {
            id: format!("sim-user-{tier}"),
            email: format!("sim-{tier}@launchsim.test"),
            tier,
            is_admin,
            subscription,
        }
    }

    #[test]
    fn parse_roundtrips_canonical_ids() {
        for tier in TierId::ALL {
            assert_eq!(TierId::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(TierId::parse("VIP9"), None);
    }

    #[test]
    fn normalize_accepts_every_valid_label() {
        for label in VALID_TIER_LABELS {
            assert!(TierId::normalize(label).is_some(), "{label} should normalize");
        }
        assert_eq!(TierId::normalize("VIP3II"), Some(TierId::Vip3));
        assert_eq!(TierId::normalize("premium"), None);
    }

    #[test]
    fn free_cannot_open_vip_room() {
        assert!(!can_access(&identity(TierId::Free, false, false), TierId::Vip9));
        assert!(can_access(&identity(TierId::Free, false, false), TierId::Free));
    }

    #[test]
    fn vip9_opens_everything_on_main_track() {
        let vip9 = identity(TierId::Vip9, false, true);
        assert!(can_access(&vip9, TierId::Vip9));
        assert!(can_access(&vip9, TierId::Vip1));
        assert!(!can_access(&vip9, TierId::Kids1));
    }

    #[test]
    fn admin_bypasses_tiers() {
        let admin = identity(TierId::Vip9, true, true);
        assert!(can_access(&admin, TierId::Kids3));
    }

    #[test]
    fn lapsed_subscription_falls_back_to_free() {
        let lapsed = identity(TierId::Vip5, false, false);
        assert!(!can_access(&lapsed, TierId::Vip1));
        assert!(can_access(&lapsed, TierId::Free));
    }

    #[test]
    fn kids_levels_are_ordered() {
        let kids2 = identity(TierId::Kids2, false, true);
        assert!(can_access(&kids2, TierId::Kids1));
        assert!(!can_access(&kids2, TierId::Kids3));
        assert!(!can_access(&kids2, TierId::Vip1));
    }

    #[test]
    fn serde_uses_canonical_ids() {
        assert_eq!(serde_json::to_string(&TierId::Kids1).unwrap(), "\"kids_1\"");
        assert_eq!(
            serde_json::from_str::<TierId>("\"vip3ii\"").unwrap(),
            TierId::Vip3ii
        );
    }
}
