//! Template insight payloads used when the model is unavailable.

use super::{
    InsightReport, ReceiptFacts, budget_impact, budget_impact_detail, categorize_spending,
    recommendation,
};

/// Fallback for a direct analysis.
///
/// When `model_answered` is true the model responded but its output was
/// unusable, so category and budget impact are still derived locally.
/// Otherwise the category is left as `General` with no impact.
#[must_use]
pub fn direct_analysis_fallback(facts: &ReceiptFacts, model_answered: bool) -> InsightReport {
    let merchant = facts.merchant_name.as_deref();
    let (category, impact) = if model_answered {
        (
            categorize_spending(merchant),
            Some(budget_impact(facts.transaction_amount).to_owned()),
        )
    } else {
        ("General", None)
    };

    InsightReport {
        summary: format!("Analysis for {}", facts.merchant_or("your purchase")),
        category: category.to_owned(),
        budget_impact: impact,
        insights: vec![
            format!("💰 Amount: ${}", facts.amount_label()),
            format!("🏪 Merchant: {}", facts.merchant_or("Unknown")),
            format!("📦 Items: {}", facts.items.len()),
            "📊 Basic analysis completed".to_owned(),
            "⚠️ Enhanced AI features temporarily unavailable".to_owned(),
        ],
        recommendations: vec![
            "Continue tracking your expenses".to_owned(),
            "Review your spending patterns".to_owned(),
            "Set budget goals for better control".to_owned(),
        ],
    }
}

/// Fallback for insight generation.
#[must_use]
pub fn generated_insights_fallback(facts: &ReceiptFacts) -> InsightReport {
    let merchant = facts.merchant_name.as_deref();
    let category = categorize_spending(merchant);
    let impact = budget_impact_detail(facts.transaction_amount);
    let amount = facts.amount_label();

    InsightReport {
        summary: format!(
            "🤖 AI Analysis for {} - ${amount}",
            facts.merchant_or("your purchase")
        ),
        category: category.to_owned(),
        budget_impact: Some(impact.to_owned()),
        insights: vec![
            format!("💰 Transaction amount: ${amount}"),
            format!("🏪 Merchant: {}", facts.merchant_or("Unknown")),
            format!("📦 Items purchased: {} items", facts.items.len()),
            format!("📊 Spending category: {category}"),
            format!("💡 Budget impact: {impact}"),
            format!(
                "🎯 Recommendation: {}",
                recommendation(merchant, facts.transaction_amount)
            ),
        ],
        recommendations: vec![
            "Track similar purchases for better budgeting".to_owned(),
            "Consider setting spending alerts for this category".to_owned(),
        ],
    }
}
