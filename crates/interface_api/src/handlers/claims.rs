//! Claims handlers
//!
//! Every handler passes the authenticated user to the service explicitly.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use uuid::Uuid;
use validator::Validate;

use core_kernel::ClaimId;
use domain_expenses::{ActingUser, ReceiptSummary};

use crate::dto::claims::*;
use crate::{error::ApiError, AppState};

/// Creates a claim, optionally submitting it at once
pub async fn create_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Json(request): Json<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), ApiError> {
    request.validate()?;
    let submit = request.submit;
    let details = request.into_details(state.config.default_currency)?;

    let claim = state.claims.create_claim(Some(&acting), details, submit).await?;
    Ok((StatusCode::CREATED, Json(claim.into())))
}

/// Lists claims, newest first
///
/// Users without a reviewing role only see their own claims.
pub async fn list_claims(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Query(params): Query<ListClaimsParams>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let mut query = params.into_query()?;
    if !acting.is_reviewer() {
        query.created_by = Some(acting.id);
    }

    let claims = state.claims.list_claims(query).await?;
    Ok(Json(claims.into_iter().map(ClaimResponse::from).collect()))
}

/// Gets a claim by ID
pub async fn get_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.get_claim(Some(&acting), ClaimId::from_uuid(id)).await?;
    Ok(Json(claim.into()))
}

/// Edits a draft; the claim keeps its currency
pub async fn update_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    request.validate()?;
    let claim_id = ClaimId::from_uuid(id);
    let current = state.claims.get_claim(Some(&acting), claim_id).await?;

    let claim = state
        .claims
        .update_draft(Some(&acting), claim_id, request.into_details(current.currency()))
        .await?;
    Ok(Json(claim.into()))
}

/// Lists the receipts of a claim
pub async fn list_receipts(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<ReceiptResponse>>, ApiError> {
    let receipts = state
        .claims
        .list_receipts(Some(&acting), ClaimId::from_uuid(id))
        .await?;
    Ok(Json(receipts.into_iter().map(ReceiptResponse::from).collect()))
}

/// Attaches a receipt to a draft
pub async fn attach_receipt(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachReceiptRequest>,
) -> Result<(StatusCode, Json<ReceiptResponse>), ApiError> {
    request.validate()?;
    let receipt = request.into_new_receipt(state.config.default_currency)?;

    let stored = state
        .claims
        .attach_receipt(Some(&acting), ClaimId::from_uuid(id), receipt)
        .await?;
    Ok((StatusCode::CREATED, Json(stored.into())))
}

/// Receipt summary of a claim
pub async fn claim_summary(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReceiptSummary>, ApiError> {
    let summary = state
        .claims
        .claim_summary(Some(&acting), ClaimId::from_uuid(id))
        .await?;
    Ok(Json(summary))
}

/// Whether the caller could approve the claim now
pub async fn can_approve(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CanApproveResponse>, ApiError> {
    let claim_id = ClaimId::from_uuid(id);
    let can_approve = state.claims.can_approve_claim(Some(&acting), claim_id).await?;
    Ok(Json(CanApproveResponse { claim_id, can_approve }))
}

pub async fn submit_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.submit_claim(Some(&acting), ClaimId::from_uuid(id)).await?;
    Ok(Json(claim.into()))
}

pub async fn approve_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state.claims.approve_claim(Some(&acting), ClaimId::from_uuid(id)).await?;
    Ok(Json(claim.into()))
}

pub async fn reject_claim(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<RejectClaimRequest>,
) -> Result<Json<ClaimResponse>, ApiError> {
    let claim = state
        .claims
        .reject_claim(Some(&acting), ClaimId::from_uuid(id), &request.reason)
        .await?;
    Ok(Json(claim.into()))
}
