//! Payroll handlers

use axum::{extract::State, Extension, Json};
use tracing::info;
use validator::Validate;

use domain_expenses::{ActingUser, Role};
use domain_payroll::Reconciliation;

use crate::auth::require_role;
use crate::dto::payroll::ReconcilePayrollRequest;
use crate::{error::ApiError, AppState};

/// Writes a payroll update through the strategy chain; admin only
pub async fn reconcile_payroll(
    State(state): State<AppState>,
    Extension(acting): Extension<ActingUser>,
    Json(request): Json<ReconcilePayrollRequest>,
) -> Result<Json<Reconciliation>, ApiError> {
    require_role(&acting, Role::Admin)?;
    request.validate()?;
    let update = request.into_update(state.config.default_currency)?;

    let reconciliation = state.payroll.reconcile(&update).await?;
    info!(
        actor = %acting.id,
        applied_by = %reconciliation.applied_by,
        attempts = reconciliation.attempts.len(),
        "Payroll reconciled"
    );
    Ok(Json(reconciliation))
}
