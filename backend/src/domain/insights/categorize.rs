//! Keyword-based spending classification and budget labels.

const SPENDING_CATEGORIES: &[(&[&str], &str)] = &[
    (&["grocery", "market", "food"], "Groceries & Food"),
    (&["gas", "fuel", "shell", "bp"], "Transportation"),
    (&["restaurant", "cafe", "pizza"], "Dining Out"),
    (&["amazon", "target", "walmart"], "Retail & Shopping"),
    (&["pharmacy", "cvs", "walgreens"], "Health & Pharmacy"),
];

const ITEM_CATEGORIES: &[(&[&str], &str)] = &[
    (&["milk", "cheese", "yogurt"], "Dairy"),
    (&["bread", "bagel", "roll", "muffin"], "Bakery"),
    (
        &["meat", "chicken", "beef", "pork", "fish"],
        "Meat & Seafood",
    ),
    (
        &[
            "fruit",
            "vegetable",
            "produce",
            "apple",
            "banana",
            "onion",
            "potato",
        ],
        "Produce",
    ),
    (&["medicine", "vitamin", "pill", "medication"], "Healthcare"),
    (&["paper", "soap", "clean", "detergent"], "Household"),
    (&["toy", "game", "book"], "Entertainment"),
    (&["shirt", "pant", "shoe", "cloth"], "Clothing"),
];

const IMPACT_UNAVAILABLE: &str = "Impact analysis unavailable";

fn first_match(text: &str, table: &[(&[&str], &'static str)]) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    table
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|keyword| lowered.contains(keyword)))
        .map(|(_, label)| *label)
}

/// Classify a purchase by merchant name.
///
/// # Examples
/// ```
/// use receipt_tracker::domain::insights::categorize_spending;
///
/// assert_eq!(categorize_spending(Some("Whole Foods Market")), "Groceries & Food");
/// assert_eq!(categorize_spending(None), "General");
/// ```
#[must_use]
pub fn categorize_spending(merchant: Option<&str>) -> &'static str {
    merchant
        .and_then(|name| first_match(name, SPENDING_CATEGORIES))
        .unwrap_or("General")
}

/// Classify a single line item by its description.
#[must_use]
pub fn categorize_item(name: &str) -> &'static str {
    first_match(name, ITEM_CATEGORIES).unwrap_or("Other")
}

/// Spending band used for the budget impact labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ImpactBand {
    Low,
    Moderate,
    Medium,
    High,
    Major,
}

impl ImpactBand {
    /// Band for `amount`; zero, NaN and missing amounts have none.
    fn of(amount: Option<f64>) -> Option<Self> {
        let amount = amount.filter(|value| *value != 0.0 && !value.is_nan())?;
        let band = if amount < 20.0 {
            Self::Low
        } else if amount < 50.0 {
            Self::Moderate
        } else if amount < 100.0 {
            Self::Medium
        } else if amount < 200.0 {
            Self::High
        } else {
            Self::Major
        };
        Some(band)
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Low => "Low impact",
            Self::Moderate => "Moderate impact",
            Self::Medium => "Medium impact",
            Self::High => "High impact",
            Self::Major => "Major impact",
        }
    }

    const fn detail(self) -> &'static str {
        match self {
            Self::Low => "Low impact - small purchase",
            Self::Moderate => "Moderate impact - regular expense",
            Self::Medium => "Medium impact - consider tracking",
            Self::High => "High impact - significant expense",
            Self::Major => "Major impact - review budget carefully",
        }
    }
}

/// Short budget impact label.
#[must_use]
pub fn budget_impact(amount: Option<f64>) -> &'static str {
    ImpactBand::of(amount).map_or(IMPACT_UNAVAILABLE, ImpactBand::label)
}

/// Budget impact label with guidance.
#[must_use]
pub fn budget_impact_detail(amount: Option<f64>) -> &'static str {
    ImpactBand::of(amount).map_or(IMPACT_UNAVAILABLE, ImpactBand::detail)
}

/// One-line recommendation for a purchase.
#[must_use]
pub fn recommendation(merchant: Option<&str>, amount: Option<f64>) -> &'static str {
    let amount = amount.unwrap_or(0.0);
    let merchant = merchant.map(str::to_lowercase).unwrap_or_default();

    if merchant.contains("grocery") && amount > 100.0 {
        "Consider meal planning to optimize grocery spending"
    } else if merchant.contains("restaurant") && amount > 50.0 {
        "Track dining expenses to stay within budget"
    } else if amount > 200.0 {
        "Large expense - consider if this aligns with your budget goals"
    } else {
        "Keep tracking expenses for better financial insights"
    }
}
