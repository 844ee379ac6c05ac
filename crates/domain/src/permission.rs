//! Static permission catalog.
//!
//! The catalog is fixed at build time: permissions are never added or removed
//! at runtime, and every identifier belongs to exactly one category. Roles
//! validate their grants against this catalog once, at the creation boundary,
//! so checks never have to tolerate unknown identifiers.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use gatewise_core::{AppError, AppResult};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Category a permission belongs to; the unit of bulk toggling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Contact records.
    Contacts,
    /// Company records.
    Companies,
    /// Deal pipeline records.
    Deals,
    /// Task records.
    Tasks,
    /// Product catalog records.
    Products,
    /// Invoice documents.
    Invoices,
    /// Quotation documents.
    Quotations,
    /// Automation workflows.
    Workflows,
    /// Lead-capture forms.
    Forms,
    /// Email marketing campaigns.
    EmailCampaigns,
    /// Landing pages.
    LandingPages,
    /// Dashboards and reports.
    Analytics,
    /// Tenant settings.
    Settings,
    /// Teams, members and roles.
    TeamManagement,
    /// Subscription and billing.
    Billing,
}

impl PermissionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contacts => "contacts",
            Self::Companies => "companies",
            Self::Deals => "deals",
            Self::Tasks => "tasks",
            Self::Products => "products",
            Self::Invoices => "invoices",
            Self::Quotations => "quotations",
            Self::Workflows => "workflows",
            Self::Forms => "forms",
            Self::EmailCampaigns => "email_campaigns",
            Self::LandingPages => "landing_pages",
            Self::Analytics => "analytics",
            Self::Settings => "settings",
            Self::TeamManagement => "team_management",
            Self::Billing => "billing",
        }
    }

    /// Returns all catalog categories in presentation order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionCategory] = &[
            PermissionCategory::Contacts,
            PermissionCategory::Companies,
            PermissionCategory::Deals,
            PermissionCategory::Tasks,
            PermissionCategory::Products,
            PermissionCategory::Invoices,
            PermissionCategory::Quotations,
            PermissionCategory::Workflows,
            PermissionCategory::Forms,
            PermissionCategory::EmailCampaigns,
            PermissionCategory::LandingPages,
            PermissionCategory::Analytics,
            PermissionCategory::Settings,
            PermissionCategory::TeamManagement,
            PermissionCategory::Billing,
        ];

        ALL
    }

    /// Returns the permission identifiers owned by this category.
    #[must_use]
    pub fn permission_names(&self) -> &'static [&'static str] {
        match self {
            Self::Contacts => &[
                "contacts.view",
                "contacts.create",
                "contacts.edit",
                "contacts.delete",
                "contacts.export",
                "contacts.import",
                "contacts.manage_all",
            ],
            Self::Companies => &[
                "companies.view",
                "companies.create",
                "companies.edit",
                "companies.delete",
                "companies.export",
                "companies.manage_all",
            ],
            Self::Deals => &[
                "deals.view",
                "deals.create",
                "deals.edit",
                "deals.delete",
                "deals.change_stage",
                "deals.manage_all",
            ],
            Self::Tasks => &[
                "tasks.view",
                "tasks.create",
                "tasks.edit",
                "tasks.delete",
                "tasks.assign",
                "tasks.complete",
                "tasks.manage_all",
            ],
            Self::Products => &[
                "products.view",
                "products.create",
                "products.edit",
                "products.delete",
                "products.manage_inventory",
                "products.manage_all",
            ],
            Self::Invoices => &[
                "invoices.view",
                "invoices.create",
                "invoices.edit",
                "invoices.delete",
                "invoices.send",
                "invoices.mark_paid",
                "invoices.manage_all",
            ],
            Self::Quotations => &[
                "quotations.view",
                "quotations.create",
                "quotations.edit",
                "quotations.delete",
                "quotations.send",
                "quotations.convert",
                "quotations.manage_all",
            ],
            Self::Workflows => &[
                "workflows.view",
                "workflows.create",
                "workflows.edit",
                "workflows.delete",
                "workflows.execute",
                "workflows.manage_all",
            ],
            Self::Forms => &[
                "forms.view",
                "forms.create",
                "forms.edit",
                "forms.delete",
                "forms.view_submissions",
                "forms.manage_all",
            ],
            Self::EmailCampaigns => &[
                "email_campaigns.view",
                "email_campaigns.create",
                "email_campaigns.edit",
                "email_campaigns.delete",
                "email_campaigns.send",
                "email_campaigns.manage_all",
            ],
            Self::LandingPages => &[
                "landing_pages.view",
                "landing_pages.create",
                "landing_pages.edit",
                "landing_pages.delete",
                "landing_pages.publish",
                "landing_pages.manage_all",
            ],
            Self::Analytics => &[
                "analytics.view_dashboard",
                "analytics.view_reports",
                "analytics.export_reports",
                "analytics.manage_all",
            ],
            Self::Settings => &[
                "settings.view",
                "settings.edit_business",
                "settings.manage_integrations",
                "settings.manage_pipelines",
                "settings.manage_all",
            ],
            Self::TeamManagement => &[
                "team_management.view_teams",
                "team_management.create_teams",
                "team_management.edit_teams",
                "team_management.delete_teams",
                "team_management.invite_members",
                "team_management.remove_members",
                "team_management.manage_roles",
                "team_management.manage_all",
            ],
            Self::Billing => &[
                "billing.view",
                "billing.manage_subscription",
                "billing.view_invoices",
                "billing.manage_all",
            ],
        }
    }

    /// Returns this category's permissions as catalog values.
    #[must_use]
    pub fn permissions(&self) -> Vec<Permission> {
        self.permission_names()
            .iter()
            .map(|name| Permission(name))
            .collect()
    }
}

impl Display for PermissionCategory {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

impl FromStr for PermissionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|category| category.as_str() == value)
            .copied()
            .ok_or_else(|| AppError::Validation(format!("unknown permission category '{value}'")))
    }
}

/// An atomic named capability, validated against the catalog.
///
/// Holds the canonical catalog string, so equality and ordering are cheap
/// and an instance is proof the identifier exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Permission(&'static str);

impl Permission {
    /// Parses a permission identifier, rejecting anything outside the catalog.
    pub fn new(value: &str) -> AppResult<Self> {
        for category in PermissionCategory::all() {
            if let Some(name) = category
                .permission_names()
                .iter()
                .find(|name| **name == value)
            {
                return Ok(Self(name));
            }
        }

        Err(AppError::Validation(format!(
            "unknown permission '{value}'"
        )))
    }

    /// Returns the stable storage value for this permission.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Returns the category that owns this permission.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        for category in PermissionCategory::all() {
            if category.permission_names().contains(&self.0) {
                return *category;
            }
        }

        // A Permission can only be built from catalog entries.
        unreachable!("permission '{}' lost its category", self.0)
    }
}

impl Display for Permission {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::new(value)
    }
}

impl Serialize for Permission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.0)
    }
}

impl<'de> Deserialize<'de> for Permission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::new(value.as_str()).map_err(D::Error::custom)
    }
}

/// Presentation grouping of categories for role-authoring surfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionGroup {
    /// Display title of the group.
    pub title: &'static str,
    /// Categories shown under the group, in order.
    pub categories: &'static [PermissionCategory],
}

impl PermissionGroup {
    /// Returns the ordered catalog groups.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const GROUPS: &[PermissionGroup] = &[
            PermissionGroup {
                title: "CRM",
                categories: &[
                    PermissionCategory::Contacts,
                    PermissionCategory::Companies,
                    PermissionCategory::Deals,
                    PermissionCategory::Tasks,
                ],
            },
            PermissionGroup {
                title: "Sales",
                categories: &[
                    PermissionCategory::Products,
                    PermissionCategory::Invoices,
                    PermissionCategory::Quotations,
                ],
            },
            PermissionGroup {
                title: "Marketing",
                categories: &[
                    PermissionCategory::EmailCampaigns,
                    PermissionCategory::Forms,
                    PermissionCategory::LandingPages,
                ],
            },
            PermissionGroup {
                title: "Automation",
                categories: &[PermissionCategory::Workflows],
            },
            PermissionGroup {
                title: "Management",
                categories: &[
                    PermissionCategory::Analytics,
                    PermissionCategory::Settings,
                    PermissionCategory::TeamManagement,
                    PermissionCategory::Billing,
                ],
            },
        ];

        GROUPS
    }
}

/// Ordered set of catalog permissions attached to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSet(BTreeSet<Permission>);

impl PermissionSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Builds a set from raw identifiers, rejecting unknown ones.
    pub fn parse<I, S>(values: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = BTreeSet::new();
        for value in values {
            set.insert(Permission::new(value.as_ref())?);
        }

        Ok(Self(set))
    }

    /// Returns whether the set grants the permission.
    #[must_use]
    pub fn contains(&self, permission: Permission) -> bool {
        self.0.contains(&permission)
    }

    /// Returns whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of granted permissions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates the granted permissions in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = Permission> + '_ {
        self.0.iter().copied()
    }

    /// Adds a permission to the set.
    pub fn insert(&mut self, permission: Permission) {
        self.0.insert(permission);
    }

    /// Returns whether every permission in the category is granted.
    #[must_use]
    pub fn fully_contains_category(&self, category: PermissionCategory) -> bool {
        category
            .permissions()
            .iter()
            .all(|permission| self.0.contains(permission))
    }

    /// Returns whether some, but not all, of the category is granted.
    #[must_use]
    pub fn partially_contains_category(&self, category: PermissionCategory) -> bool {
        !self.fully_contains_category(category)
            && category
                .permissions()
                .iter()
                .any(|permission| self.0.contains(permission))
    }

    /// Toggles a whole category at once.
    ///
    /// If every permission in the category is already present the category is
    /// removed; otherwise the category is added in full. A partially selected
    /// category therefore always completes to fully selected first.
    #[must_use]
    pub fn toggle_category(&self, category: PermissionCategory) -> Self {
        let mut toggled = self.0.clone();
        if self.fully_contains_category(category) {
            for permission in category.permissions() {
                toggled.remove(&permission);
            }
        } else {
            for permission in category.permissions() {
                toggled.insert(permission);
            }
        }

        Self(toggled)
    }

    /// Builds the set of every catalog permission.
    #[must_use]
    pub fn all_permissions() -> Self {
        let mut set = BTreeSet::new();
        for category in PermissionCategory::all() {
            set.extend(category.permissions());
        }

        Self(set)
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{Permission, PermissionCategory, PermissionGroup, PermissionSet};

    #[test]
    fn known_permission_is_accepted() {
        let permission = Permission::new("team_management.invite_members");
        assert!(permission.is_ok());
    }

    #[test]
    fn unknown_permission_is_rejected() {
        assert!(Permission::new("contacts.unknown").is_err());
        assert!(Permission::new("").is_err());
    }

    #[test]
    fn permission_resolves_its_category() {
        let permission = Permission::new("deals.change_stage").unwrap_or_else(|_| unreachable!());
        assert_eq!(permission.category(), PermissionCategory::Deals);
    }

    #[test]
    fn every_permission_belongs_to_exactly_one_category() {
        for owner in PermissionCategory::all() {
            for name in owner.permission_names() {
                let owners = PermissionCategory::all()
                    .iter()
                    .filter(|category| category.permission_names().contains(name))
                    .count();
                assert_eq!(owners, 1, "'{name}' owned by {owners} categories");
            }
        }
    }

    #[test]
    fn every_category_belongs_to_exactly_one_group() {
        for category in PermissionCategory::all() {
            let owners = PermissionGroup::all()
                .iter()
                .filter(|group| group.categories.contains(category))
                .count();
            assert_eq!(owners, 1, "'{category}' owned by {owners} groups");
        }
    }

    #[test]
    fn toggle_from_empty_selects_full_category() {
        let empty = PermissionSet::new();
        let toggled = empty.toggle_category(PermissionCategory::Tasks);
        assert!(toggled.fully_contains_category(PermissionCategory::Tasks));
        assert_eq!(toggled.len(), PermissionCategory::Tasks.permissions().len());
    }

    #[test]
    fn toggle_from_full_deselects_category() {
        let full: PermissionSet = PermissionCategory::Tasks.permissions().into_iter().collect();
        let toggled = full.toggle_category(PermissionCategory::Tasks);
        assert!(toggled.is_empty());
    }

    #[test]
    fn toggle_from_partial_completes_category() {
        let partial =
            PermissionSet::parse(["tasks.view", "tasks.create"]).unwrap_or_else(|_| unreachable!());
        let toggled = partial.toggle_category(PermissionCategory::Tasks);
        assert!(toggled.fully_contains_category(PermissionCategory::Tasks));
    }

    #[test]
    fn partial_detection_excludes_full_and_empty() {
        let empty = PermissionSet::new();
        assert!(!empty.partially_contains_category(PermissionCategory::Billing));

        let full: PermissionSet = PermissionCategory::Billing
            .permissions()
            .into_iter()
            .collect();
        assert!(!full.partially_contains_category(PermissionCategory::Billing));

        let partial = PermissionSet::parse(["billing.view"]).unwrap_or_else(|_| unreachable!());
        assert!(partial.partially_contains_category(PermissionCategory::Billing));
    }

    #[test]
    fn unknown_category_lookup_is_empty_not_error() {
        let parsed = "not_a_category".parse::<PermissionCategory>();
        assert!(parsed.is_err());
    }

    #[test]
    fn permission_serde_round_trips_through_storage_value() {
        let permission = Permission::new("invoices.mark_paid").unwrap_or_else(|_| unreachable!());
        let encoded = serde_json::to_string(&permission).unwrap_or_default();
        assert_eq!(encoded, "\"invoices.mark_paid\"");

        let decoded: Result<Permission, _> = serde_json::from_str(&encoded);
        assert_eq!(decoded.ok(), Some(permission));
    }

    #[test]
    fn stored_unknown_permission_fails_to_decode() {
        let decoded: Result<Permission, _> = serde_json::from_str("\"contacts.hack\"");
        assert!(decoded.is_err());
    }

    fn category_strategy() -> impl Strategy<Value = PermissionCategory> {
        prop::sample::select(PermissionCategory::all().to_vec())
    }

    fn permission_set_strategy() -> impl Strategy<Value = PermissionSet> {
        let names: Vec<&'static str> = PermissionCategory::all()
            .iter()
            .flat_map(|category| category.permission_names().iter().copied())
            .collect();
        prop::collection::vec(prop::sample::select(names), 0..24).prop_map(|selected| {
            selected
                .into_iter()
                .filter_map(|name| Permission::new(name).ok())
                .collect()
        })
    }

    proptest! {
        #[test]
        fn toggle_never_leaves_category_partial(
            set in permission_set_strategy(),
            category in category_strategy(),
        ) {
            let toggled = set.toggle_category(category);
            prop_assert!(!toggled.partially_contains_category(category));
        }

        #[test]
        fn toggle_only_touches_the_category(
            set in permission_set_strategy(),
            category in category_strategy(),
        ) {
            let toggled = set.toggle_category(category);
            let unrelated_before: Vec<_> = set
                .iter()
                .filter(|permission| permission.category() != category)
                .collect();
            let unrelated_after: Vec<_> = toggled
                .iter()
                .filter(|permission| permission.category() != category)
                .collect();
            prop_assert_eq!(unrelated_before, unrelated_after);
        }
    }
}
