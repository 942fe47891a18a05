//! Tenant resolution middleware
//!
//! Every tenant-scoped route runs behind [`tenant_middleware`], which reads
//! `X-Tenant-Id` (required) and `X-User-Id` (optional), checks the tenant
//! exists and is active, and injects a [`RequestContext`] into the request
//! extensions.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use uuid::Uuid;

use crate::domain::entities::TenantId;
use crate::domain::ports::TenantRepository;
use crate::error::AppError;

pub const TENANT_HEADER: &str = "X-Tenant-Id";
pub const USER_HEADER: &str = "X-User-Id";

/// Caller identity for one request
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub tenant_id: TenantId,
    /// Recorded as the actor on history and log entries
    pub user_id: Option<String>,
}

fn header<'a>(request: &'a Request<Body>, name: &str) -> Option<&'a str> {
    request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Parse the caller's context from the request headers
pub fn context_from_headers(request: &Request<Body>) -> Result<RequestContext, AppError> {
    let raw = header(request, TENANT_HEADER)
        .ok_or_else(|| AppError::InvalidTenant(format!("Cabeçalho {} ausente", TENANT_HEADER)))?;
    let tenant_id = Uuid::parse_str(raw)
        .map(TenantId)
        .map_err(|_| AppError::InvalidTenant(format!("{} inválido: {}", TENANT_HEADER, raw)))?;

    Ok(RequestContext {
        tenant_id,
        user_id: header(request, USER_HEADER).map(str::to_string),
    })
}

/// Tenant middleware
///
/// Rejects the request with 400 when the header is missing, malformed, or
/// names an unknown or inactive tenant.
pub async fn tenant_middleware<T>(
    State(tenants): State<Arc<T>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError>
where
    T: TenantRepository + 'static,
{
    let context = context_from_headers(&request)?;

    let tenant = tenants
        .find_by_id(&context.tenant_id)
        .await?
        .filter(|t| t.ativo)
        .ok_or_else(|| {
            AppError::InvalidTenant(format!("Tenant desconhecido: {}", context.tenant_id))
        })?;

    tracing::debug!(tenant_id = %tenant.id, user_id = ?context.user_id, "Tenant resolved");
    request.extensions_mut().insert(context);

    Ok(next.run(request).await)
}
