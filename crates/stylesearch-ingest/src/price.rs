//! Price recovery chain: source columns, then the description text, then
//! a brand/category estimate. Stored products always end up with a
//! positive price.

use crate::source::RawRecord;

const PRICE_COLUMNS: &[&str] = &["lowest_price", "price", "cost", "selling_price"];
const LUXURY_WATCH_BRANDS: &[&str] = &["tag heuer", "rolex", "omega", "cartier", "patek"];
const LUXURY_FASHION_BRANDS: &[&str] = &["gucci", "prada", "versace", "balenciaga", "valentino"];
const SPORTS_BRANDS: &[&str] = &["nike", "adidas", "puma"];

pub fn resolve_price(
    record: &RawRecord,
    description: Option<&str>,
    brand: Option<&str>,
    raw_category: &str,
) -> f64 {
    for column in PRICE_COLUMNS {
        if let Some(price) = record.get(column).and_then(parse_price_str) {
            return price;
        }
    }
    if let Some(price) = description.and_then(price_from_description) {
        return price;
    }
    estimate_price(brand, raw_category)
}

/// Parse "₹50,000", "$100" or plain "4999.50".
fn parse_price_str(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '₹' | '$' | '€') && !c.is_whitespace())
        .collect();
    let price: f64 = cleaned.parse().ok()?;
    (price > 0.0).then_some(price)
}

/// Scan free text for price-like fragments: a currency symbol followed
/// by digits, an amount followed by a currency word, or "price:"/"cost:"
/// prefixes.
fn price_from_description(description: &str) -> Option<f64> {
    let lower = description.to_lowercase();
    for symbol in ['₹', '$', '€'] {
        if let Some(pos) = description.find(symbol) {
            if let Some(price) = leading_amount(&description[pos + symbol.len_utf8()..]) {
                return Some(price);
            }
        }
    }
    for marker in ["price:", "price ", "cost:", "cost "] {
        if let Some(pos) = lower.find(marker) {
            if let Some(price) = leading_amount(&lower[pos + marker.len()..]) {
                return Some(price);
            }
        }
    }
    // "5000 INR" style: amount token followed by a currency word
    let tokens: Vec<&str> = lower.split_whitespace().collect();
    for pair in tokens.windows(2) {
        if matches!(pair[1].trim_end_matches('.'), "inr" | "usd" | "eur" | "rupee" | "rupees") {
            if let Some(price) = leading_amount(pair[0]) {
                return Some(price);
            }
        }
    }
    None
}

fn leading_amount(s: &str) -> Option<f64> {
    let digits: String = s
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .filter(|c| *c != ',')
        .collect();
    let price: f64 = digits.parse().ok()?;
    (price > 0.0).then_some(price)
}

fn estimate_price(brand: Option<&str>, raw_category: &str) -> f64 {
    let brand = brand.unwrap_or_default().to_lowercase();
    let category = raw_category.to_lowercase();
    let has_brand = |list: &[&str]| list.iter().any(|b| brand.contains(b));

    if has_brand(LUXURY_WATCH_BRANDS) {
        50_000.0
    } else if has_brand(LUXURY_FASHION_BRANDS) {
        30_000.0
    } else if has_brand(SPORTS_BRANDS) {
        if category.contains("footwear") || category.contains("shoes") {
            8_000.0
        } else {
            5_000.0
        }
    } else if category.contains("watches") {
        15_000.0
    } else if category.contains("footwear") || category.contains("shoes") {
        5_000.0
    } else if category.contains("bags") {
        10_000.0
    } else if category.contains("accessories") {
        3_000.0
    } else {
        2_000.0
    }
}
