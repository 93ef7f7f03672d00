use serde::{Deserialize, Serialize};

/// Subscription tiers, ordered: a higher tier allows every feature a lower
/// tier allows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum PlanTier {
    Free,
    Standard,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum Feature {
    Enterprises,
    Clients,
    FeaturedListings,
    CustomDomain,
}

impl Feature {
    /// Lowest tier that includes the feature without an explicit grant.
    #[must_use]
    pub fn baseline_tier(self) -> PlanTier {
        match self {
            Feature::FeaturedListings => PlanTier::Standard,
            Feature::Clients => PlanTier::Standard,
            Feature::Enterprises => PlanTier::Premium,
            Feature::CustomDomain => PlanTier::Premium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Plan {
    pub id: String,
    pub name: String,
    pub tier: PlanTier,
    pub max_properties: u32,
    /// Explicit grants on top of the tier baseline.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl Plan {
    #[must_use]
    pub fn allows(&self, feature: Feature) -> bool {
        self.tier >= feature.baseline_tier() || self.features.contains(&feature)
    }

    #[must_use]
    pub fn within_property_quota(&self, current_count: u32) -> bool {
        current_count < self.max_properties
    }
}
