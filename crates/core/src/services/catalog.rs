//! Static reference data: complaint categories, entity types and suspicion reasons.

use cyberguard_db::entities::complaint::UrgencyLevel;
use cyberguard_db::entities::suspicious_entity::{EntityType, RiskLevel};
use sea_orm::Iterable;
use serde::Serialize;

/// A complaint category and the subcategories filed under it.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplaintCategory {
    pub name: &'static str,
    pub subcategories: &'static [&'static str],
    /// Whether a financial loss amount may be reported.
    pub tracks_financial_loss: bool,
}

pub const COMPLAINT_CATEGORIES: &[ComplaintCategory] = &[
    ComplaintCategory {
        name: "Financial Fraud",
        subcategories: &[
            "UPI/Digital Wallet Fraud",
            "Credit/Debit Card Fraud",
            "Internet Banking Fraud",
            "Investment Scam",
            "Loan App Harassment",
            "Fake Trading Platforms",
        ],
        tracks_financial_loss: true,
    },
    ComplaintCategory {
        name: "Women Safety",
        subcategories: &[
            "Cyberstalking",
            "Morphing/Photo Manipulation",
            "Fake Profile Creation",
            "Blackmail/Sextortion",
            "Online Harassment",
        ],
        tracks_financial_loss: false,
    },
    ComplaintCategory {
        name: "Online Fraud",
        subcategories: &[
            "Fake Websites",
            "Phishing Emails/SMS",
            "Job/Lottery Scams",
            "Fake Social Media Profiles",
            "Online Shopping Fraud",
        ],
        tracks_financial_loss: true,
    },
    ComplaintCategory {
        name: "Cyberbullying",
        subcategories: &[
            "Social Media Harassment",
            "Defamation",
            "Identity Theft",
            "Revenge Porn",
            "Hate Speech",
        ],
        tracks_financial_loss: false,
    },
    ComplaintCategory {
        name: "Malicious Apps",
        subcategories: &["Fake Apps", "Data Theft Apps", "Ransomware", "Spyware", "Adware"],
        tracks_financial_loss: false,
    },
];

pub const SUSPICION_REASONS: &[&str] = &[
    "Asking for personal information",
    "Requesting money/payments",
    "Too good to be true offers",
    "Threatening/intimidating behavior",
    "Impersonating legitimate entity",
    "Suspicious links/downloads",
    "Fake reviews/ratings",
    "Poor grammar/spelling",
    "Pressure to act quickly",
    "Unsolicited contact",
    "Other (specify in description)",
];

/// An entity type as offered on the report form.
#[derive(Debug, Clone, Serialize)]
pub struct EntityTypeOption {
    pub value: EntityType,
    pub label: &'static str,
}

/// Everything the report forms offer, in one payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    pub complaint_categories: &'static [ComplaintCategory],
    pub entity_types: Vec<EntityTypeOption>,
    pub suspicion_reasons: &'static [&'static str],
    pub urgency_levels: Vec<UrgencyLevel>,
    pub risk_levels: Vec<RiskLevel>,
}

/// Build the catalog.
#[must_use]
pub fn catalog() -> Catalog {
    Catalog {
        complaint_categories: COMPLAINT_CATEGORIES,
        entity_types: EntityType::iter()
            .map(|value| EntityTypeOption {
                value,
                label: value.label(),
            })
            .collect(),
        suspicion_reasons: SUSPICION_REASONS,
        urgency_levels: UrgencyLevel::iter().collect(),
        risk_levels: RiskLevel::iter().collect(),
    }
}

/// Look up a category by its exact name.
#[must_use]
pub fn find_category(name: &str) -> Option<&'static ComplaintCategory> {
    COMPLAINT_CATEGORIES.iter().find(|c| c.name == name)
}

/// Whether `subcategory` belongs to `category`.
#[must_use]
pub fn is_valid_subcategory(category: &str, subcategory: &str) -> bool {
    find_category(category).is_some_and(|c| c.subcategories.contains(&subcategory))
}

/// Whether `reason` is one of the listed suspicion reasons.
#[must_use]
pub fn is_valid_reason(reason: &str) -> bool {
    SUSPICION_REASONS.contains(&reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcategory_membership() {
        assert!(is_valid_subcategory("Financial Fraud", "Investment Scam"));
        assert!(is_valid_subcategory("Malicious Apps", "Spyware"));
        assert!(!is_valid_subcategory("Financial Fraud", "Spyware"));
        assert!(!is_valid_subcategory("Unknown", "Spyware"));
    }

    #[test]
    fn test_financial_categories() {
        let financial: Vec<_> = COMPLAINT_CATEGORIES
            .iter()
            .filter(|c| c.tracks_financial_loss)
            .map(|c| c.name)
            .collect();
        assert_eq!(financial, vec!["Financial Fraud", "Online Fraud"]);
    }

    #[test]
    fn test_catalog_lists_everything() {
        let catalog = catalog();
        assert_eq!(catalog.complaint_categories.len(), 5);
        assert_eq!(catalog.entity_types.len(), 6);
        assert_eq!(catalog.suspicion_reasons.len(), 11);
        assert_eq!(catalog.risk_levels.len(), 4);
        assert!(is_valid_reason("Unsolicited contact"));
        assert!(!is_valid_reason("unsolicited contact"));
    }
}
