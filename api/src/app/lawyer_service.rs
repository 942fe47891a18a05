//! Lawyer service
//!
//! Lawyer registry and its links to perícias.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entities::{
    CaseRole, Lawyer, LawyerId, LawyerOnPericia, LawyerPatch, NewLawyer, PericiaId, TenantId,
};
use crate::domain::ports::{LawyerRepository, PericiaRepository};
use crate::error::AppError;

/// A lawyer as seen from one perícia
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PericiaLawyer {
    #[serde(flatten)]
    pub lawyer: Lawyer,
    pub role_in_case: CaseRole,
}

pub struct LawyerService<L, P>
where
    L: LawyerRepository,
    P: PericiaRepository,
{
    lawyers: Arc<L>,
    pericias: Arc<P>,
}

impl<L, P> LawyerService<L, P>
where
    L: LawyerRepository,
    P: PericiaRepository,
{
    pub fn new(lawyers: Arc<L>, pericias: Arc<P>) -> Self {
        Self { lawyers, pericias }
    }

    async fn check_pericia(&self, tenant: &TenantId, id: &PericiaId) -> Result<(), AppError> {
        match self.pericias.find_by_id(tenant, id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound("Perícia não encontrada.".to_string())),
        }
    }

    pub async fn create(&self, tenant: &TenantId, mut lawyer: NewLawyer) -> Result<Lawyer, AppError> {
        lawyer.nome = lawyer.nome.trim().to_string();
        if lawyer.nome.is_empty() {
            return Err(AppError::BadRequest("Nome é obrigatório".to_string()));
        }
        let created = self.lawyers.create(tenant, &lawyer).await?;
        tracing::info!(tenant_id = %tenant, lawyer_id = %created.id, "Lawyer created");
        Ok(created)
    }

    /// Lawyers ordered by name
    pub async fn list(&self, tenant: &TenantId) -> Result<Vec<Lawyer>, AppError> {
        Ok(self.lawyers.list(tenant).await?)
    }

    pub async fn get(&self, tenant: &TenantId, id: &LawyerId) -> Result<Lawyer, AppError> {
        self.lawyers
            .find_by_id(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Advogado não encontrado.".to_string()))
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        id: &LawyerId,
        patch: LawyerPatch,
    ) -> Result<Lawyer, AppError> {
        if patch.nome.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::BadRequest("Nome não pode ser vazio".to_string()));
        }
        let mut lawyer = self.get(tenant, id).await?;
        patch.apply(&mut lawyer);
        Ok(self.lawyers.save(&lawyer).await?)
    }

    pub async fn delete(&self, tenant: &TenantId, id: &LawyerId) -> Result<(), AppError> {
        self.get(tenant, id).await?;
        self.lawyers.delete(tenant, id).await?;
        tracing::info!(tenant_id = %tenant, lawyer_id = %id, "Lawyer deleted");
        Ok(())
    }

    /// Link a lawyer to a perícia; linking the same pair twice conflicts
    pub async fn link_to_pericia(
        &self,
        tenant: &TenantId,
        lawyer_id: &LawyerId,
        pericia_id: &PericiaId,
        role: CaseRole,
    ) -> Result<LawyerOnPericia, AppError> {
        self.get(tenant, lawyer_id).await?;
        self.check_pericia(tenant, pericia_id).await?;

        let link = LawyerOnPericia {
            lawyer_id: *lawyer_id,
            pericia_id: *pericia_id,
            role_in_case: role,
        };
        self.lawyers.link(tenant, &link).await?;
        tracing::info!(
            tenant_id = %tenant,
            lawyer_id = %lawyer_id,
            pericia_id = %pericia_id,
            role = %role,
            "Lawyer linked to perícia"
        );
        Ok(link)
    }

    pub async fn list_for_pericia(
        &self,
        tenant: &TenantId,
        pericia_id: &PericiaId,
    ) -> Result<Vec<PericiaLawyer>, AppError> {
        self.check_pericia(tenant, pericia_id).await?;
        Ok(self
            .lawyers
            .list_for_pericia(tenant, pericia_id)
            .await?
            .into_iter()
            .map(|(lawyer, role_in_case)| PericiaLawyer {
                lawyer,
                role_in_case,
            })
            .collect())
    }
}
