use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::extractors::{AdminUser, CurrentUser};
use crate::currency::convert::{convert_amount, is_valid_code, normalize_code};
use crate::currency::repo::CurrencyPair;
use crate::error::ApiError;
use crate::state::AppState;

use super::dto::{
    ConversionEnvelope, ConversionResult, ConvertRequest, CreatePairRequest, MessageResponse,
    PairEnvelope, PairListResponse, PairResponse, UpdatePairRequest,
};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/currency", get(list_pairs))
        .route("/currency/convert", post(convert))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/currency", post(create_pair))
        .route("/currency/:id", put(update_pair).delete(delete_pair))
}

/// A malformed id never matched a record in the original deployment, so it
/// reports 404 rather than 400.
fn parse_pair_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound("Currency pair not found".into()))
}

#[instrument(skip(state, _user))]
pub async fn list_pairs(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Result<Json<PairListResponse>, ApiError> {
    let pairs = CurrencyPair::list_all(&state.db)
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(PairListResponse {
        success: true,
        data: pairs.into_iter().map(PairResponse::from).collect(),
    }))
}

#[instrument(skip(state, admin, payload))]
pub async fn create_pair(
    State(state): State<AppState>,
    admin: AdminUser,
    Json(payload): Json<CreatePairRequest>,
) -> Result<(StatusCode, Json<PairEnvelope>), ApiError> {
    let base = normalize_code(&payload.base_currency.unwrap_or_default());
    let target = normalize_code(&payload.target_currency.unwrap_or_default());

    if base.is_empty() || target.is_empty() || payload.rate.is_none() {
        return Err(ApiError::Validation(
            "baseCurrency, targetCurrency and rate are required".into(),
        ));
    }
    if !is_valid_code(&base) || !is_valid_code(&target) {
        return Err(ApiError::Validation(
            "Currency codes must be 3 characters".into(),
        ));
    }
    let rate = payload.rate.unwrap_or_default();
    if !rate.is_finite() || rate <= 0.0 {
        return Err(ApiError::Validation("Rate must be a positive number".into()));
    }

    if CurrencyPair::find_by_codes(&state.db, &base, &target)
        .await
        .map_err(ApiError::internal)?
        .is_some()
    {
        warn!(%base, %target, "create rejected: pair exists");
        return Err(ApiError::Conflict(format!(
            "Currency pair {}/{} already exists",
            base, target
        )));
    }

    // Concurrent creators lose the race at the unique constraint and get
    // the same 400 as the pre-check.
    let pair = CurrencyPair::create(&state.db, &base, &target, rate).await?;

    info!(admin = %admin.0.id, pair_id = %pair.id, %base, %target, rate, "currency pair created");
    Ok((
        StatusCode::CREATED,
        Json(PairEnvelope {
            success: true,
            data: pair.into(),
        }),
    ))
}

/// Resolved field values for a partial update.
#[derive(Debug, PartialEq)]
struct ResolvedUpdate {
    base_currency: String,
    target_currency: String,
    rate: f64,
    rate_changed: bool,
}

/// Merges a partial update onto the stored pair. Absent fields and
/// provided-but-falsy values (empty code, zero rate) keep the stored value;
/// provided codes are normalized.
fn resolve_update(
    pair: &CurrencyPair,
    payload: &UpdatePairRequest,
) -> Result<ResolvedUpdate, ApiError> {
    let base_currency = match &payload.base_currency {
        Some(code) if !code.trim().is_empty() => normalize_code(code),
        _ => pair.base_currency.clone(),
    };
    let target_currency = match &payload.target_currency {
        Some(code) if !code.trim().is_empty() => normalize_code(code),
        _ => pair.target_currency.clone(),
    };
    let rate = match payload.rate {
        Some(r) if r == 0.0 => pair.rate,
        Some(r) if !r.is_finite() || r < 0.0 => {
            return Err(ApiError::Validation("Rate must be a positive number".into()))
        }
        Some(r) => r,
        None => pair.rate,
    };

    Ok(ResolvedUpdate {
        base_currency,
        target_currency,
        rate_changed: rate != pair.rate,
        rate,
    })
}

#[instrument(skip(state, admin, payload))]
pub async fn update_pair(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePairRequest>,
) -> Result<Json<PairEnvelope>, ApiError> {
    let id = parse_pair_id(&id)?;

    let pair = CurrencyPair::find_by_id(&state.db, id)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| ApiError::NotFound("Currency pair not found".into()))?;

    let resolved = resolve_update(&pair, &payload)?;
    let last_updated = if resolved.rate_changed {
        OffsetDateTime::now_utc()
    } else {
        pair.last_updated
    };

    let updated = CurrencyPair::update(
        &state.db,
        id,
        &resolved.base_currency,
        &resolved.target_currency,
        resolved.rate,
        last_updated,
    )
    .await?;

    info!(admin = %admin.0.id, pair_id = %id, rate_changed = resolved.rate_changed, "currency pair updated");
    Ok(Json(PairEnvelope {
        success: true,
        data: updated.into(),
    }))
}

#[instrument(skip(state, admin))]
pub async fn delete_pair(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_pair_id(&id)?;

    let deleted = CurrencyPair::delete(&state.db, id).await?;
    if !deleted {
        return Err(ApiError::NotFound("Currency pair not found".into()));
    }

    info!(admin = %admin.0.id, pair_id = %id, "currency pair deleted");
    Ok(Json(MessageResponse {
        success: true,
        message: "Currency pair deleted".into(),
    }))
}

#[instrument(skip(state, _user, payload))]
pub async fn convert(
    State(state): State<AppState>,
    _user: CurrentUser,
    Json(payload): Json<ConvertRequest>,
) -> Result<Json<ConversionEnvelope>, ApiError> {
    let base = normalize_code(&payload.base_currency.unwrap_or_default());
    let target = normalize_code(&payload.target_currency.unwrap_or_default());
    if base.is_empty() || target.is_empty() {
        return Err(ApiError::Validation(
            "baseCurrency and targetCurrency are required".into(),
        ));
    }

    let amount = payload.amount.unwrap_or_default();
    if !amount.is_finite() || amount <= 0.0 {
        return Err(ApiError::Validation(
            "Amount must be a positive number".into(),
        ));
    }

    let pair = CurrencyPair::find_by_codes(&state.db, &base, &target)
        .await
        .map_err(ApiError::internal)?
        .ok_or_else(|| {
            ApiError::NotFound(format!("Exchange rate not found for {} to {}", base, target))
        })?;

    let converted_amount = convert_amount(amount, pair.rate);

    Ok(Json(ConversionEnvelope {
        success: true,
        data: ConversionResult {
            base_currency: base,
            target_currency: target,
            amount,
            converted_amount,
            rate: pair.rate, // full stored precision, deliberately unrounded
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_pair() -> CurrencyPair {
        CurrencyPair {
            id: Uuid::new_v4(),
            base_currency: "USD".into(),
            target_currency: "EUR".into(),
            rate: 0.85,
            last_updated: OffsetDateTime::UNIX_EPOCH,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn empty_update_keeps_everything() {
        let pair = stored_pair();
        let resolved = resolve_update(&pair, &UpdatePairRequest::default()).unwrap();
        assert_eq!(resolved.base_currency, "USD");
        assert_eq!(resolved.target_currency, "EUR");
        assert_eq!(resolved.rate, 0.85);
        assert!(!resolved.rate_changed);
    }

    #[test]
    fn zero_rate_is_treated_as_absent() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            rate: Some(0.0),
            ..Default::default()
        };
        let resolved = resolve_update(&pair, &payload).unwrap();
        assert_eq!(resolved.rate, 0.85);
        assert!(!resolved.rate_changed);
    }

    #[test]
    fn empty_code_is_treated_as_absent() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            base_currency: Some("   ".into()),
            ..Default::default()
        };
        let resolved = resolve_update(&pair, &payload).unwrap();
        assert_eq!(resolved.base_currency, "USD");
    }

    #[test]
    fn provided_codes_are_normalized() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            base_currency: Some(" gbp ".into()),
            target_currency: Some("jpy".into()),
            ..Default::default()
        };
        let resolved = resolve_update(&pair, &payload).unwrap();
        assert_eq!(resolved.base_currency, "GBP");
        assert_eq!(resolved.target_currency, "JPY");
        assert!(!resolved.rate_changed);
    }

    #[test]
    fn new_rate_marks_the_change() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            rate: Some(0.9),
            ..Default::default()
        };
        let resolved = resolve_update(&pair, &payload).unwrap();
        assert_eq!(resolved.rate, 0.9);
        assert!(resolved.rate_changed);
    }

    #[test]
    fn same_rate_does_not_mark_the_change() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            rate: Some(0.85),
            ..Default::default()
        };
        let resolved = resolve_update(&pair, &payload).unwrap();
        assert!(!resolved.rate_changed);
    }

    #[test]
    fn negative_rate_is_rejected() {
        let pair = stored_pair();
        let payload = UpdatePairRequest {
            rate: Some(-1.0),
            ..Default::default()
        };
        let err = resolve_update(&pair, &payload).unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[test]
    fn malformed_id_reports_not_found() {
        let err = parse_pair_id("not-a-uuid").unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let id = Uuid::new_v4();
        assert_eq!(parse_pair_id(&id.to_string()).unwrap(), id);
    }
}
