use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// App-data hash that settlement trades carry when no metadata is attached.
pub const NO_APP_DATA_HASH: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000001";

/// One settlement call row as read from the warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub trades: Vec<String>,
    pub block_number: u64,
}

impl TradeRecord {
    pub fn new(trades: Vec<String>, block_number: u64) -> Self {
        Self {
            trades,
            block_number,
        }
    }
}

/// A single app-data hash sighting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashObservation {
    pub hash: String,
    pub block_number: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupedEntry {
    pub hash: String,
    pub first_seen_block: u64,
}

/// Row persisted to the app-data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub app_hash: String,
    pub content: AppDataContent,
    pub first_seen_block: u64,
}

/// Projection of an app-data document onto the destination table's `content` column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppDataContent {
    #[serde(rename = "appCode")]
    pub app_code: String,
    pub environment: String,
    #[serde(rename = "fullAppData", default)]
    pub full_app_data: Option<String>,
    #[serde(default)]
    pub metadata: AppMetadata,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppMetadata {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub environment: Option<String>,
    #[serde(rename = "orderClass", default)]
    pub order_class: Option<OrderClassMetadata>,
    #[serde(default)]
    pub quote: Option<QuoteMetadata>,
    #[serde(default)]
    pub referrer: Option<ReferrerMetadata>,
    #[serde(default)]
    pub utm: Option<UtmMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderClassMetadata {
    #[serde(rename = "orderClass", default, deserialize_with = "de_opt_string")]
    pub order_class: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteMetadata {
    #[serde(rename = "buyAmount", default, deserialize_with = "de_opt_string")]
    pub buy_amount: Option<String>,
    #[serde(rename = "sellAmount", default, deserialize_with = "de_opt_string")]
    pub sell_amount: Option<String>,
    #[serde(rename = "slippageBips", default, deserialize_with = "de_opt_string")]
    pub slippage_bips: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferrerMetadata {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub address: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub referrer: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UtmMetadata {
    #[serde(rename = "utmCampaign", default, deserialize_with = "de_opt_string")]
    pub utm_campaign: Option<String>,
    #[serde(rename = "utmContent", default, deserialize_with = "de_opt_string")]
    pub utm_content: Option<String>,
    #[serde(rename = "utmMedium", default, deserialize_with = "de_opt_string")]
    pub utm_medium: Option<String>,
    #[serde(rename = "utmSource", default, deserialize_with = "de_opt_string")]
    pub utm_source: Option<String>,
    #[serde(rename = "utmTerm", default, deserialize_with = "de_opt_string")]
    pub utm_term: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub version: Option<String>,
}

/// Accepts strings, numbers and booleans; the table stores every leaf as a string.
fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    match v {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar, got {}",
            other
        ))),
    }
}
