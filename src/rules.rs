use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{ReportError, Result};
use crate::schema::LineItem;

/// How a rule's patterns are matched against a line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Any include pattern is a case-insensitive substring of the brand,
    /// and no exclude pattern is. Exclude always overrides include.
    BrandSubstring,

    /// The uppercased product name equals one of the patterns exactly.
    /// Exclude patterns are ignored in this mode.
    ExactProductName,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BrandRule {
    #[schemars(description = "Family name this rule tags (e.g., 'Activ')")]
    pub family: String,

    #[schemars(description = "Patterns that pull an item into the family; compared uppercased")]
    pub include: Vec<String>,

    #[schemars(description = "Patterns that veto a match even when an include pattern hits")]
    #[serde(default)]
    pub exclude: Vec<String>,

    pub mode: MatchMode,

    #[schemars(
        description = "Qualification threshold in liters. A customer's accumulated family volume must meet or exceed this (inclusive) within the reporting month."
    )]
    pub threshold_liters: f64,
}

impl BrandRule {
    /// Whether this rule tags the given item. Brand and product name are
    /// uppercased before comparison; patterns are stored uppercased by
    /// [`RuleSet::validate`].
    pub fn matches(&self, item: &LineItem) -> bool {
        match self.mode {
            MatchMode::BrandSubstring => {
                let brand = item.brand.to_uppercase();
                let included = self.include.iter().any(|p| brand.contains(p.as_str()));
                let excluded = self.exclude.iter().any(|p| brand.contains(p.as_str()));
                included && !excluded
            }
            MatchMode::ExactProductName => {
                let name = item.item_name.to_uppercase();
                self.include.iter().any(|p| name == *p)
            }
        }
    }
}

/// One consistent, versioned rule configuration. Injected into every engine
/// call; never read from ambient state, so concurrent report runs can use
/// different snapshots of the rules safely.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RuleSet {
    #[schemars(description = "Monotonically increasing configuration version, for audit")]
    pub version: u32,

    pub families: Vec<BrandRule>,

    #[schemars(
        description = "Product-name substrings excluded from core volume (merchandise, accessories)"
    )]
    pub excluded_products: Vec<String>,

    #[schemars(
        description = "Name of the family treated as non-core: excluded from core volume and from the volume-by-executive and weekly reports, but counted by its own qualification report"
    )]
    pub autocare_family: String,

    #[schemars(description = "Core-volume floor in liters; customers strictly below it are flagged under-billed")]
    pub core_threshold_liters: f64,
}

impl RuleSet {
    /// The distribution business's standard incentive configuration.
    pub fn standard() -> Self {
        Self {
            version: 1,
            families: vec![
                BrandRule {
                    family: "Activ".to_string(),
                    include: vec!["ACTIV".to_string()],
                    exclude: vec!["ESSENTIAL".to_string()],
                    mode: MatchMode::BrandSubstring,
                    threshold_liters: 0.9,
                },
                BrandRule {
                    family: "Power1".to_string(),
                    include: vec![
                        "CASTROL POWER1 4T 10W-30 900ML".to_string(),
                        "CASTROL POWER1 4T 10W-40 1L".to_string(),
                        "CASTROL POWER1 ULTIMATE 10W-40 1L".to_string(),
                    ],
                    exclude: vec![],
                    mode: MatchMode::ExactProductName,
                    threshold_liters: 5.0,
                },
                BrandRule {
                    family: "Magnatec".to_string(),
                    include: vec!["MAGNATEC".to_string()],
                    exclude: vec![],
                    mode: MatchMode::BrandSubstring,
                    threshold_liters: 3.5,
                },
                BrandRule {
                    family: "CRB".to_string(),
                    include: vec!["CRB TURBOMAX".to_string()],
                    exclude: vec![],
                    mode: MatchMode::BrandSubstring,
                    threshold_liters: 1.0,
                },
                BrandRule {
                    family: "Autocare".to_string(),
                    include: vec!["AUTO CARE".to_string()],
                    exclude: vec![],
                    mode: MatchMode::BrandSubstring,
                    threshold_liters: 5.0,
                },
            ],
            excluded_products: vec![
                "FUNNEL".to_string(),
                "STICKER".to_string(),
                "T-SHIRT".to_string(),
                "KEY CHAIN".to_string(),
                "MERCHANDISE".to_string(),
            ],
            autocare_family: "Autocare".to_string(),
            core_threshold_liters: 9.0,
        }
    }

    /// Checks structural soundness and normalizes all patterns to uppercase so
    /// matching never has to re-case them per item.
    pub fn validate(&mut self) -> Result<()> {
        for rule in &mut self.families {
            if rule.include.is_empty() {
                return Err(ReportError::InvalidRule {
                    family: rule.family.clone(),
                    details: "include pattern list is empty".to_string(),
                });
            }
            if rule.threshold_liters <= 0.0 {
                return Err(ReportError::InvalidRule {
                    family: rule.family.clone(),
                    details: format!("threshold must be positive, got {}", rule.threshold_liters),
                });
            }
            for p in rule.include.iter_mut().chain(rule.exclude.iter_mut()) {
                *p = p.trim().to_uppercase();
            }
        }
        for p in &mut self.excluded_products {
            *p = p.trim().to_uppercase();
        }
        if self.rule_for(&self.autocare_family).is_none() {
            return Err(ReportError::UnknownFamily(self.autocare_family.clone()));
        }
        Ok(())
    }

    pub fn rule_for(&self, family: &str) -> Option<&BrandRule> {
        self.families.iter().find(|r| r.family == family)
    }

    /// Tags an item with every family whose rule matches. The result is a set:
    /// an item may belong to zero, one, or several unrelated families, and
    /// there is no priority ordering between rules.
    pub fn classify<'a>(&'a self, item: &LineItem) -> BTreeSet<&'a str> {
        self.families
            .iter()
            .filter(|r| r.matches(item))
            .map(|r| r.family.as_str())
            .collect()
    }

    pub fn is_autocare(&self, item: &LineItem) -> bool {
        self.rule_for(&self.autocare_family)
            .map(|r| r.matches(item))
            .unwrap_or(false)
    }

    fn is_excluded_product(&self, item: &LineItem) -> bool {
        let name = item.item_name.to_uppercase();
        self.excluded_products
            .iter()
            .any(|p| name.contains(p.as_str()))
    }

    /// The shared core-volume predicate: not an excluded product (by name
    /// substring) and not autocare. Both the high-volume qualification report
    /// and the unbilled detector use this single definition.
    pub fn is_core_item(&self, item: &LineItem) -> bool {
        !self.is_excluded_product(item) && !self.is_autocare(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str, brand: &str) -> LineItem {
        LineItem {
            item_name: name.to_string(),
            brand: brand.to_string(),
            quantity: 1,
            liters: 1.0,
            price: 400.0,
        }
    }

    fn rules() -> RuleSet {
        let mut r = RuleSet::standard();
        r.validate().unwrap();
        r
    }

    #[test]
    fn test_substring_include() {
        let rules = rules();
        let tags = rules.classify(&item("CASTROL ACTIV 4T 20W-40 1L", "CASTROL ACTIV"));
        assert!(tags.contains("Activ"));
        assert!(!tags.contains("Magnatec"));
    }

    #[test]
    fn test_exclude_overrides_include() {
        let rules = rules();
        let tags = rules.classify(&item(
            "CASTROL ACTIV ESSENTIAL 1L",
            "CASTROL ACTIV ESSENTIAL",
        ));
        assert!(!tags.contains("Activ"));
    }

    #[test]
    fn test_exact_name_match() {
        let rules = rules();
        let hit = rules.classify(&item("CASTROL POWER1 4T 10W-40 1L", "CASTROL POWER1"));
        assert!(hit.contains("Power1"));

        // Substring is not enough in exact mode.
        let miss = rules.classify(&item("CASTROL POWER1 4T 10W-40", "CASTROL POWER1"));
        assert!(!miss.contains("Power1"));
    }

    #[test]
    fn test_case_insensitive_matching() {
        let rules = rules();
        let tags = rules.classify(&item("castrol magnatec 5w-30 suv 3.5l", "castrol magnatec"));
        assert!(tags.contains("Magnatec"));
    }

    #[test]
    fn test_unmatched_brand_yields_empty_set() {
        let rules = rules();
        assert!(rules.classify(&item("GENERIC OIL 1L", "GENERIC")).is_empty());
    }

    #[test]
    fn test_include_monotonicity() {
        // Adding a synonym to a rule without excludes can only add tags.
        let mut rules = rules();
        let probe = item("CASTROL GTX 15W-40", "CASTROL GTX");
        let before = rules.classify(&probe).contains("Magnatec");
        assert!(!before);

        let idx = rules
            .families
            .iter()
            .position(|r| r.family == "Magnatec")
            .unwrap();
        rules.families[idx].include.push("GTX".to_string());
        rules.validate().unwrap();

        assert!(rules.classify(&probe).contains("Magnatec"));
        // Previously matching items keep their tag.
        assert!(rules
            .classify(&item("CASTROL MAGNATEC 5W-30", "CASTROL MAGNATEC"))
            .contains("Magnatec"));
    }

    #[test]
    fn test_core_predicate() {
        let rules = rules();
        assert!(rules.is_core_item(&item("CASTROL ACTIV 4T 1L", "CASTROL ACTIV")));
        assert!(!rules.is_core_item(&item("CASTROL FUNNEL", "ACCESSORIES")));
        assert!(!rules.is_core_item(&item("AUTO CARE SHAMPOO", "AUTO CARE MAINTENANCE")));
    }

    #[test]
    fn test_validate_rejects_empty_include() {
        let mut rules = RuleSet::standard();
        rules.families[0].include.clear();
        assert!(matches!(
            rules.validate(),
            Err(ReportError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_nonpositive_threshold() {
        let mut rules = RuleSet::standard();
        rules.families[0].threshold_liters = 0.0;
        assert!(matches!(
            rules.validate(),
            Err(ReportError::InvalidRule { .. })
        ));
    }
}
