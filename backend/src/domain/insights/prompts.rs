//! Prompt builders for the extraction and insight models.

use std::fmt::Write as _;

use super::ReceiptFacts;

/// Prompt asking the model to extract structured fields from a receipt PDF.
#[must_use]
pub fn extraction_prompt(file_name: &str) -> String {
    format!(
        "You are a receipt scanning assistant. The attached PDF ({file_name}) is a \
purchase receipt or invoice. Extract its contents and answer with a single JSON \
object and nothing else, using this structure:
{{
  \"fileDisplayName\": \"Readable name for the receipt, e.g. merchant and date\",
  \"merchantName\": \"Store name\",
  \"merchantAddress\": \"Store address\",
  \"merchantPhone\": \"Store phone number\",
  \"merchantEmail\": \"Store email\",
  \"transactionDate\": \"Date of the transaction as printed\",
  \"transactionAmount\": 0.0,
  \"transactionCurrency\": \"ISO currency code, e.g. USD\",
  \"summary\": \"Human readable summary including receipt or invoice numbers, key items, prices and discounts\",
  \"items\": [{{ \"name\": \"Item\", \"quantity\": 1, \"unitPrice\": 0.0, \"totalPrice\": 0.0 }}]
}}
Use null for any field that is not present on the receipt."
    )
}

fn items_list(facts: &ReceiptFacts) -> String {
    if facts.items.is_empty() {
        return "No detailed items available".to_owned();
    }
    let mut list = String::new();
    for item in &facts.items {
        let price = item
            .unit_price
            .map_or_else(|| "N/A".to_owned(), |price| price.to_string());
        if !list.is_empty() {
            list.push('\n');
        }
        // Writing into a String cannot fail.
        let _ = write!(list, "- {} (Qty: {}, Price: ${price})", item.name, item.quantity);
    }
    list
}

/// Prompt for a direct analysis with three to five insights.
#[must_use]
pub fn direct_analysis_prompt(facts: &ReceiptFacts) -> String {
    format!(
        "Analyze this receipt and provide smart financial insights:

Merchant: {merchant}
Total Amount: ${amount}
Items:
{items}

Please provide:
1. A brief summary of the purchase
2. Spending category classification
3. Budget impact assessment
4. 3-5 key insights about this purchase
5. Practical recommendations for better financial management

Format your response as a JSON object with the following structure:
{{
  \"summary\": \"Brief summary of the purchase\",
  \"category\": \"Spending category\",
  \"budgetImpact\": \"Impact assessment\",
  \"insights\": [\"insight1\", \"insight2\", \"insight3\", \"insight4\", \"insight5\"],
  \"recommendations\": [\"recommendation1\", \"recommendation2\", \"recommendation3\"]
}}",
        merchant = facts.merchant_or("Unknown"),
        amount = facts.amount_label(),
        items = items_list(facts),
    )
}

/// Prompt for insight generation with four to six insights.
#[must_use]
pub fn insights_prompt(facts: &ReceiptFacts) -> String {
    let details = if facts.items.is_empty() {
        "Not specified".to_owned()
    } else {
        facts
            .items
            .iter()
            .map(|item| format!("{} (qty: {})", item.name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "Analyze this receipt data and provide intelligent financial insights:

Receipt Details:
- Merchant: {merchant}
- Amount: ${amount}
- Items: {count} items
- Item details: {details}

Please provide:
1. A brief summary of this purchase
2. Spending category classification
3. 4-6 key insights about this transaction
4. Budget impact assessment
5. Personalized recommendations

Format the response as JSON with this structure:
{{
  \"summary\": \"Brief summary text\",
  \"category\": \"Spending category\",
  \"insights\": [\"insight 1\", \"insight 2\", \"insight 3\", \"insight 4\", \"insight 5\", \"insight 6\"],
  \"budgetImpact\": \"Impact assessment\",
  \"recommendations\": [\"recommendation 1\", \"recommendation 2\"]
}}",
        merchant = facts.merchant_or("Unknown"),
        amount = facts.amount_label(),
        count = facts.items.len(),
    )
}
