//! Laudo service
//!
//! Report drafts attached to perícias.

use std::sync::Arc;

use crate::domain::entities::{Laudo, LaudoId, LaudoPatch, NewLaudo, PericiaId, TenantId};
use crate::domain::ports::{LaudoRepository, PericiaRepository};
use crate::error::AppError;

pub const DEFAULT_LAUDO_TITLE: &str = "Laudo pericial";

pub struct LaudoService<L, P>
where
    L: LaudoRepository,
    P: PericiaRepository,
{
    laudos: Arc<L>,
    pericias: Arc<P>,
}

impl<L, P> LaudoService<L, P>
where
    L: LaudoRepository,
    P: PericiaRepository,
{
    pub fn new(laudos: Arc<L>, pericias: Arc<P>) -> Self {
        Self { laudos, pericias }
    }

    pub async fn create(&self, tenant: &TenantId, mut laudo: NewLaudo) -> Result<Laudo, AppError> {
        if self
            .pericias
            .find_by_id(tenant, &laudo.pericia_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound("Perícia não encontrada.".to_string()));
        }
        laudo.title = laudo.title.trim().to_string();
        if laudo.title.is_empty() {
            laudo.title = DEFAULT_LAUDO_TITLE.to_string();
        }
        if laudo.sections.is_null() {
            laudo.sections = serde_json::json!([]);
        }

        let created = self.laudos.create(tenant, &laudo).await?;
        tracing::info!(
            tenant_id = %tenant,
            laudo_id = %created.id,
            pericia_id = %created.pericia_id,
            "Laudo created"
        );
        Ok(created)
    }

    /// Newest first, optionally for one perícia
    pub async fn list(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Laudo>, AppError> {
        Ok(self.laudos.list(tenant, pericia_id).await?)
    }

    pub async fn get(&self, tenant: &TenantId, id: &LaudoId) -> Result<Laudo, AppError> {
        self.laudos
            .find_by_id(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Laudo não encontrado.".to_string()))
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        id: &LaudoId,
        patch: LaudoPatch,
    ) -> Result<Laudo, AppError> {
        if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::BadRequest("Título não pode ser vazio".to_string()));
        }
        let mut laudo = self.get(tenant, id).await?;
        patch.apply(&mut laudo);
        Ok(self.laudos.save(&laudo).await?)
    }

    pub async fn delete(&self, tenant: &TenantId, id: &LaudoId) -> Result<(), AppError> {
        self.get(tenant, id).await?;
        self.laudos.delete(tenant, id).await?;
        tracing::info!(tenant_id = %tenant, laudo_id = %id, "Laudo deleted");
        Ok(())
    }
}
