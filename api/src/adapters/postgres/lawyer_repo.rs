//! PostgreSQL adapter for LawyerRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::unique_violation;
use crate::domain::entities::{
    CaseRole, Lawyer, LawyerId, LawyerOnPericia, NewLawyer, PericiaId, TenantId,
};
use crate::domain::ports::LawyerRepository;
use crate::entity::{lawyers, lawyers_on_pericias};
use crate::error::DomainError;

/// PostgreSQL implementation of LawyerRepository
pub struct PostgresLawyerRepository {
    db: DatabaseConnection,
}

impl PostgresLawyerRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LawyerRepository for PostgresLawyerRepository {
    async fn create(&self, tenant: &TenantId, lawyer: &NewLawyer) -> Result<Lawyer, DomainError> {
        let now = Utc::now().fixed_offset();

        let model = lawyers::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            nome: Set(lawyer.nome.clone()),
            oab: Set(lawyer.oab.clone()),
            uf_oab: Set(lawyer.uf_oab.clone()),
            email: Set(lawyer.email.clone()),
            telefone: Set(lawyer.telefone.clone()),
            observacoes: Set(lawyer.observacoes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list(&self, tenant: &TenantId) -> Result<Vec<Lawyer>, DomainError> {
        let results = lawyers::Entity::find()
            .filter(lawyers::Column::TenantId.eq(tenant.0))
            .order_by_asc(lawyers::Column::Nome)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &LawyerId,
    ) -> Result<Option<Lawyer>, DomainError> {
        let result = lawyers::Entity::find_by_id(id.0)
            .filter(lawyers::Column::TenantId.eq(tenant.0))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn save(&self, lawyer: &Lawyer) -> Result<Lawyer, DomainError> {
        if self.find_by_id(&lawyer.tenant_id, &lawyer.id).await?.is_none() {
            return Err(DomainError::NotFound(format!("Advogado {}", lawyer.id)));
        }

        let result = lawyers::ActiveModel {
            id: Set(lawyer.id.0),
            tenant_id: Set(lawyer.tenant_id.0),
            nome: Set(lawyer.nome.clone()),
            oab: Set(lawyer.oab.clone()),
            uf_oab: Set(lawyer.uf_oab.clone()),
            email: Set(lawyer.email.clone()),
            telefone: Set(lawyer.telefone.clone()),
            observacoes: Set(lawyer.observacoes.clone()),
            created_at: Set(lawyer.created_at.fixed_offset()),
            updated_at: Set(Utc::now().fixed_offset()),
        }
        .update(&self.db)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn delete(&self, tenant: &TenantId, id: &LawyerId) -> Result<(), DomainError> {
        let result = lawyers::Entity::delete_many()
            .filter(lawyers::Column::Id.eq(id.0))
            .filter(lawyers::Column::TenantId.eq(tenant.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Advogado {}", id)));
        }
        Ok(())
    }

    async fn link(&self, tenant: &TenantId, link: &LawyerOnPericia) -> Result<(), DomainError> {
        lawyers_on_pericias::ActiveModel {
            lawyer_id: Set(link.lawyer_id.0),
            pericia_id: Set(link.pericia_id.0),
            tenant_id: Set(tenant.0),
            role_in_case: Set(link.role_in_case.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| unique_violation(e, "Advogado já vinculado à perícia".to_string()))?;

        Ok(())
    }

    async fn list_for_pericia(
        &self,
        tenant: &TenantId,
        pericia_id: &PericiaId,
    ) -> Result<Vec<(Lawyer, CaseRole)>, DomainError> {
        let results = lawyers_on_pericias::Entity::find()
            .filter(lawyers_on_pericias::Column::TenantId.eq(tenant.0))
            .filter(lawyers_on_pericias::Column::PericiaId.eq(pericia_id.0))
            .find_also_related(lawyers::Entity)
            .order_by_asc(lawyers::Column::Nome)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results
            .into_iter()
            .filter_map(|(link, lawyer)| {
                lawyer.map(|l| (l.into(), link.role_in_case.parse().unwrap_or_default()))
            })
            .collect())
    }
}

/// Convert SeaORM model to domain entity
impl From<lawyers::Model> for Lawyer {
    fn from(model: lawyers::Model) -> Self {
        Lawyer {
            id: LawyerId(model.id),
            tenant_id: TenantId(model.tenant_id),
            nome: model.nome,
            oab: model.oab,
            uf_oab: model.uf_oab,
            email: model.email,
            telefone: model.telefone,
            observacoes: model.observacoes,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}
