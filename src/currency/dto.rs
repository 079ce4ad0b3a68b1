use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::currency::repo::CurrencyPair;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePairRequest {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
    pub rate: Option<f64>,
}

/// Partial update. A missing field leaves the stored value alone, and so
/// does a provided-but-falsy one (empty code, zero rate).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePairRequest {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
    pub rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairResponse {
    pub id: Uuid,
    pub base_currency: String,
    pub target_currency: String,
    pub rate: f64,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<CurrencyPair> for PairResponse {
    fn from(pair: CurrencyPair) -> Self {
        Self {
            id: pair.id,
            base_currency: pair.base_currency,
            target_currency: pair.target_currency,
            rate: pair.rate,
            last_updated: pair.last_updated,
            created_at: pair.created_at,
            updated_at: pair.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PairListResponse {
    pub success: bool,
    pub data: Vec<PairResponse>,
}

#[derive(Debug, Serialize)]
pub struct PairEnvelope {
    pub success: bool,
    pub data: PairResponse,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    pub base_currency: Option<String>,
    pub target_currency: Option<String>,
    pub amount: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub base_currency: String,
    pub target_currency: String,
    pub amount: f64,
    pub converted_amount: f64,
    pub rate: f64,
}

#[derive(Debug, Serialize)]
pub struct ConversionEnvelope {
    pub success: bool,
    pub data: ConversionResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_response_uses_camel_case_and_rfc3339() {
        let pair = CurrencyPair {
            id: Uuid::new_v4(),
            base_currency: "USD".into(),
            target_currency: "EUR".into(),
            rate: 0.85,
            last_updated: OffsetDateTime::UNIX_EPOCH,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_value(PairResponse::from(pair)).unwrap();
        assert_eq!(json["baseCurrency"], "USD");
        assert_eq!(json["targetCurrency"], "EUR");
        assert_eq!(json["lastUpdated"], "1970-01-01T00:00:00Z");
        assert!(json.get("base_currency").is_none());
    }

    #[test]
    fn conversion_result_uses_camel_case() {
        let result = ConversionResult {
            base_currency: "USD".into(),
            target_currency: "EUR".into(),
            amount: 100.0,
            converted_amount: 85.0,
            rate: 0.85,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["convertedAmount"], 85.0);
        assert_eq!(json["rate"], 0.85);
    }

    #[test]
    fn convert_request_reads_camel_case_body() {
        let req: ConvertRequest = serde_json::from_str(
            r#"{"baseCurrency":"usd","targetCurrency":"eur","amount":100}"#,
        )
        .unwrap();
        assert_eq!(req.base_currency.as_deref(), Some("usd"));
        assert_eq!(req.amount, Some(100.0));
    }
}
