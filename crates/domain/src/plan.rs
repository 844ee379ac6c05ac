//! Subscription plans and their numeric feature limits.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gatewise_core::{AppError, AppResult, NonEmptyString};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Identifier for a quota-governed resource kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKey {
    /// Contact records.
    MaxContacts,
    /// Tenant user accounts.
    MaxUsers,
    /// Teams.
    MaxTeams,
    /// Members per team.
    MaxTeamMembers,
    /// Lead-capture forms.
    MaxForms,
    /// Landing pages.
    MaxLandingPages,
    /// Automation workflows.
    MaxWorkflows,
    /// Marketing emails per calendar month.
    MaxEmailsPerMonth,
    /// Connected social media accounts.
    SocialMediaAccounts,
    /// Scheduled social media posts.
    SocialMediaPosts,
}

impl FeatureKey {
    /// Returns a stable storage value for this feature key.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MaxContacts => "max_contacts",
            Self::MaxUsers => "max_users",
            Self::MaxTeams => "max_teams",
            Self::MaxTeamMembers => "max_team_members",
            Self::MaxForms => "max_forms",
            Self::MaxLandingPages => "max_landing_pages",
            Self::MaxWorkflows => "max_workflows",
            Self::MaxEmailsPerMonth => "max_emails_per_month",
            Self::SocialMediaAccounts => "social_media_accounts",
            Self::SocialMediaPosts => "social_media_posts",
        }
    }

    /// Returns all quota-governed feature keys.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[FeatureKey] = &[
            FeatureKey::MaxContacts,
            FeatureKey::MaxUsers,
            FeatureKey::MaxTeams,
            FeatureKey::MaxTeamMembers,
            FeatureKey::MaxForms,
            FeatureKey::MaxLandingPages,
            FeatureKey::MaxWorkflows,
            FeatureKey::MaxEmailsPerMonth,
            FeatureKey::SocialMediaAccounts,
            FeatureKey::SocialMediaPosts,
        ];

        ALL
    }
}

impl Display for FeatureKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

impl FromStr for FeatureKey {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|key| key.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown feature key '{value}'")))
    }
}

/// Sentinel limit value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// A numeric feature cap; `-1` is the only valid negative value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureLimit(i64);

impl FeatureLimit {
    /// Creates a validated limit; rejects negatives other than the sentinel.
    pub fn new(value: i64) -> AppResult<Self> {
        if value < UNLIMITED {
            return Err(AppError::Validation(format!(
                "feature limit must be a non-negative cap or {UNLIMITED} for unlimited, got {value}"
            )));
        }

        Ok(Self(value))
    }

    /// Returns the unlimited sentinel.
    #[must_use]
    pub fn unlimited() -> Self {
        Self(UNLIMITED)
    }

    /// Returns whether the limit is the unlimited sentinel.
    #[must_use]
    pub fn is_unlimited(&self) -> bool {
        self.0 == UNLIMITED
    }

    /// Returns the raw limit value, sentinel included.
    #[must_use]
    pub fn value(&self) -> i64 {
        self.0
    }

    /// Returns whether `used + delta` stays within the cap.
    ///
    /// The comparison is exact; display clamping never applies here.
    #[must_use]
    pub fn allows(&self, used: i64, delta: i64) -> bool {
        self.is_unlimited() || used.saturating_add(delta) <= self.0
    }

    /// Returns the display percentage of the limit in use.
    ///
    /// Unlimited is defined as `0` (never computed as a division), and the
    /// result is clamped to `[0, 100]` for display purposes only.
    #[must_use]
    pub fn percentage_used(&self, used: i64) -> u8 {
        if self.is_unlimited() {
            return 0;
        }

        let denominator = self.0.max(1) as f64;
        let ratio = (100.0 * used as f64 / denominator).round();
        ratio.clamp(0.0, 100.0) as u8
    }
}

impl<'de> Deserialize<'de> for FeatureLimit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = i64::deserialize(deserializer)?;
        Self::new(value).map_err(D::Error::custom)
    }
}

/// Unique identifier for a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlanId(Uuid);

impl PlanId {
    /// Creates a new random plan identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a plan identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for PlanId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PlanId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A subscription plan carrying a fixed map of feature limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    id: PlanId,
    name: NonEmptyString,
    display_name: NonEmptyString,
    limits: BTreeMap<FeatureKey, FeatureLimit>,
}

impl Plan {
    /// Creates a plan from its limit map.
    #[must_use]
    pub fn new(
        name: NonEmptyString,
        display_name: NonEmptyString,
        limits: BTreeMap<FeatureKey, FeatureLimit>,
    ) -> Self {
        Self {
            id: PlanId::new(),
            name,
            display_name,
            limits,
        }
    }

    /// Rehydrates a plan from stored fields.
    #[must_use]
    pub fn from_stored(
        id: PlanId,
        name: NonEmptyString,
        display_name: NonEmptyString,
        limits: BTreeMap<FeatureKey, FeatureLimit>,
    ) -> Self {
        Self {
            id,
            name,
            display_name,
            limits,
        }
    }

    /// Returns the plan identifier.
    #[must_use]
    pub fn id(&self) -> PlanId {
        self.id
    }

    /// Returns the stable plan name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the human-readable plan name.
    #[must_use]
    pub fn display_name(&self) -> &NonEmptyString {
        &self.display_name
    }

    /// Returns the limit map.
    #[must_use]
    pub fn limits(&self) -> &BTreeMap<FeatureKey, FeatureLimit> {
        &self.limits
    }

    /// Returns the cap for a feature.
    ///
    /// A feature absent from the map is not governed by the plan and is
    /// treated as unlimited.
    #[must_use]
    pub fn limit_for(&self, feature: FeatureKey) -> FeatureLimit {
        self.limits
            .get(&feature)
            .copied()
            .unwrap_or_else(FeatureLimit::unlimited)
    }
}

/// The platform's built-in subscription tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinPlan {
    /// Entry tier for trying the product.
    Free,
    /// Small teams.
    Starter,
    /// Growing businesses.
    Professional,
    /// Large organisations.
    Enterprise,
}

impl BuiltinPlan {
    /// Returns every built-in tier, cheapest first.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[BuiltinPlan] = &[
            BuiltinPlan::Free,
            BuiltinPlan::Starter,
            BuiltinPlan::Professional,
            BuiltinPlan::Enterprise,
        ];

        ALL
    }

    /// Returns the stable plan name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Starter => "starter",
            Self::Professional => "professional",
            Self::Enterprise => "enterprise",
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Free => "Free Plan",
            Self::Starter => "Starter Plan",
            Self::Professional => "Professional Plan",
            Self::Enterprise => "Enterprise Plan",
        }
    }

    /// Returns the tier's feature limits.
    #[must_use]
    pub fn limit_values(&self) -> &'static [(FeatureKey, i64)] {
        match self {
            Self::Free => &[
                (FeatureKey::MaxContacts, 100),
                (FeatureKey::MaxUsers, 1),
                (FeatureKey::MaxTeams, 0),
                (FeatureKey::MaxTeamMembers, 0),
                (FeatureKey::MaxForms, 3),
                (FeatureKey::MaxLandingPages, 2),
                (FeatureKey::MaxWorkflows, 1),
                (FeatureKey::MaxEmailsPerMonth, 500),
                (FeatureKey::SocialMediaAccounts, 1),
                (FeatureKey::SocialMediaPosts, 10),
            ],
            Self::Starter => &[
                (FeatureKey::MaxContacts, 1000),
                (FeatureKey::MaxUsers, 3),
                (FeatureKey::MaxTeams, 1),
                (FeatureKey::MaxTeamMembers, 5),
                (FeatureKey::MaxForms, 10),
                (FeatureKey::MaxLandingPages, 10),
                (FeatureKey::MaxWorkflows, 5),
                (FeatureKey::MaxEmailsPerMonth, 5000),
                (FeatureKey::SocialMediaAccounts, 3),
                (FeatureKey::SocialMediaPosts, 100),
            ],
            Self::Professional => &[
                (FeatureKey::MaxContacts, 5000),
                (FeatureKey::MaxUsers, 10),
                (FeatureKey::MaxTeams, 3),
                (FeatureKey::MaxTeamMembers, 20),
                (FeatureKey::MaxForms, 50),
                (FeatureKey::MaxLandingPages, 50),
                (FeatureKey::MaxWorkflows, 20),
                (FeatureKey::MaxEmailsPerMonth, 25000),
                (FeatureKey::SocialMediaAccounts, 10),
                (FeatureKey::SocialMediaPosts, 500),
            ],
            Self::Enterprise => &[
                (FeatureKey::MaxContacts, 25000),
                (FeatureKey::MaxUsers, 50),
                (FeatureKey::MaxTeams, 10),
                (FeatureKey::MaxTeamMembers, 100),
                (FeatureKey::MaxForms, 200),
                (FeatureKey::MaxLandingPages, 200),
                (FeatureKey::MaxWorkflows, 100),
                (FeatureKey::MaxEmailsPerMonth, 100000),
                (FeatureKey::SocialMediaAccounts, 50),
                (FeatureKey::SocialMediaPosts, 2000),
            ],
        }
    }

    /// Builds the seeded plan entity for this tier.
    pub fn build(&self) -> AppResult<Plan> {
        let mut limits = BTreeMap::new();
        for (feature, value) in self.limit_values() {
            limits.insert(*feature, FeatureLimit::new(*value)?);
        }

        Ok(Plan::new(
            NonEmptyString::new(self.name())?,
            NonEmptyString::new(self.display_name())?,
            limits,
        ))
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{BuiltinPlan, FeatureKey, FeatureLimit, UNLIMITED};

    #[test]
    fn sentinel_is_the_only_valid_negative() {
        assert!(FeatureLimit::new(UNLIMITED).is_ok());
        assert!(FeatureLimit::new(-2).is_err());
        assert!(FeatureLimit::new(0).is_ok());
    }

    #[test]
    fn unlimited_always_allows() {
        let limit = FeatureLimit::unlimited();
        assert!(limit.allows(0, 0));
        assert!(limit.allows(i64::MAX, 1));
        assert_eq!(limit.percentage_used(123_456), 0);
    }

    #[test]
    fn exact_cap_boundary() {
        let limit = FeatureLimit::new(100).unwrap_or_else(|_| unreachable!());
        assert!(limit.allows(99, 1));
        assert!(!limit.allows(100, 1));
        assert!(limit.allows(100, 0));
    }

    #[test]
    fn percentage_rounds_and_clamps_for_display_only() {
        let limit = FeatureLimit::new(3).unwrap_or_else(|_| unreachable!());
        // 2/3 rounds to 67, overuse clamps to 100 while allows() still fails.
        assert_eq!(limit.percentage_used(2), 67);
        assert_eq!(limit.percentage_used(10), 100);
        assert!(!limit.allows(10, 1));
    }

    #[test]
    fn zero_limit_avoids_division_by_zero() {
        let limit = FeatureLimit::new(0).unwrap_or_else(|_| unreachable!());
        assert_eq!(limit.percentage_used(0), 0);
        assert_eq!(limit.percentage_used(1), 100);
        assert!(!limit.allows(0, 1));
    }

    #[test]
    fn feature_key_round_trips_storage_value() {
        for key in FeatureKey::all() {
            let parsed = key.as_str().parse::<FeatureKey>();
            assert_eq!(parsed.ok(), Some(*key));
        }
    }

    #[test]
    fn builtin_plans_cover_every_feature() {
        for tier in BuiltinPlan::all() {
            let plan = tier.build();
            assert!(plan.is_ok(), "tier '{}' failed to build", tier.name());
            let plan = plan.unwrap_or_else(|_| unreachable!());
            for key in FeatureKey::all() {
                assert!(plan.limits().contains_key(key));
            }
        }
    }

    #[test]
    fn missing_limit_is_treated_as_unlimited() {
        let plan = BuiltinPlan::Free.build().unwrap_or_else(|_| unreachable!());
        assert_eq!(plan.limit_for(FeatureKey::MaxContacts).value(), 100);

        let mut stripped = plan.limits().clone();
        stripped.remove(&FeatureKey::MaxContacts);
        let plan = super::Plan::new(
            gatewise_core::NonEmptyString::new("custom").unwrap_or_else(|_| unreachable!()),
            gatewise_core::NonEmptyString::new("Custom").unwrap_or_else(|_| unreachable!()),
            stripped,
        );
        assert!(plan.limit_for(FeatureKey::MaxContacts).is_unlimited());
    }

    #[test]
    fn stored_invalid_limit_fails_to_decode() {
        let decoded: Result<FeatureLimit, _> = serde_json::from_str("-7");
        assert!(decoded.is_err());
        let decoded: Result<FeatureLimit, _> = serde_json::from_str("-1");
        assert!(decoded.is_ok());
    }

    proptest! {
        #[test]
        fn percentage_is_always_a_display_value(limit in -1_i64..100_000, used in 0_i64..1_000_000) {
            if let Ok(limit) = FeatureLimit::new(limit) {
                let percentage = limit.percentage_used(used);
                prop_assert!(percentage <= 100);
            }
        }

        #[test]
        fn allows_matches_exact_arithmetic(cap in 0_i64..100_000, used in 0_i64..200_000, delta in 0_i64..1_000) {
            let limit = FeatureLimit::new(cap).unwrap_or_else(|_| unreachable!());
            prop_assert_eq!(limit.allows(used, delta), used + delta <= cap);
        }
    }
}
