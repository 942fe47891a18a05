//! PostgreSQL adapter for FinancialRepository

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::domain::entities::{
    Despesa, DespesaId, ImportBatch, ImportBatchId, ImportStatus, MatchStatus, NewDespesa,
    NewRecebimento, NewUnmatchedPayment, PericiaId, Recebimento, RecebimentoId, TenantId,
    UnmatchedPayment, UnmatchedPaymentId,
};
use crate::domain::ports::FinancialRepository;
use crate::entity::{despesas, import_batches, recebimentos, unmatched_payments};
use crate::error::DomainError;

/// PostgreSQL implementation of FinancialRepository
pub struct PostgresFinancialRepository {
    db: DatabaseConnection,
}

impl PostgresFinancialRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn receipt_model(
    tenant: &TenantId,
    receipt: &NewRecebimento,
    batch: Option<ImportBatchId>,
) -> recebimentos::ActiveModel {
    recebimentos::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant.0),
        pericia_id: Set(receipt.pericia_id.map(|p| p.0)),
        fonte_pagamento: Set(receipt.fonte_pagamento.to_string()),
        data_recebimento: Set(receipt.data_recebimento),
        valor_bruto: Set(receipt.valor_bruto),
        valor_liquido: Set(receipt.valor_liquido),
        descricao: Set(receipt.descricao.clone()),
        import_batch_id: Set(batch.map(|b| b.0)),
        created_at: Set(Utc::now().fixed_offset()),
    }
}

#[async_trait]
impl FinancialRepository for PostgresFinancialRepository {
    async fn create_receipt(
        &self,
        tenant: &TenantId,
        receipt: &NewRecebimento,
    ) -> Result<Recebimento, DomainError> {
        let result = receipt_model(tenant, receipt, None)
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_receipts(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Recebimento>, DomainError> {
        let mut select =
            recebimentos::Entity::find().filter(recebimentos::Column::TenantId.eq(tenant.0));
        if let Some(pericia_id) = pericia_id {
            select = select.filter(recebimentos::Column::PericiaId.eq(pericia_id.0));
        }

        let results = select
            .order_by_desc(recebimentos::Column::DataRecebimento)
            .order_by_desc(recebimentos::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn create_expense(
        &self,
        tenant: &TenantId,
        expense: &NewDespesa,
    ) -> Result<Despesa, DomainError> {
        let model = despesas::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            categoria: Set(expense.categoria.clone()),
            descricao: Set(expense.descricao.clone()),
            valor: Set(expense.valor),
            data_competencia: Set(expense.data_competencia),
            pericia_id: Set(expense.pericia_id.map(|p| p.0)),
            created_at: Set(Utc::now().fixed_offset()),
        };

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.into())
    }

    async fn list_expenses(&self, tenant: &TenantId) -> Result<Vec<Despesa>, DomainError> {
        let results = despesas::Entity::find()
            .filter(despesas::Column::TenantId.eq(tenant.0))
            .order_by_desc(despesas::Column::DataCompetencia)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn import_batch(
        &self,
        tenant: &TenantId,
        source_file_name: Option<&str>,
        matched: &[NewRecebimento],
        unmatched: &[NewUnmatchedPayment],
    ) -> Result<ImportBatch, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let batch = import_batches::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            source_file_name: Set(source_file_name.map(str::to_string)),
            total_records: Set((matched.len() + unmatched.len()) as i32),
            matched_records: Set(matched.len() as i32),
            unmatched_records: Set(unmatched.len() as i32),
            status: Set(ImportStatus::Done.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;
        let batch_id = ImportBatchId(batch.id);

        if !matched.is_empty() {
            recebimentos::Entity::insert_many(
                matched
                    .iter()
                    .map(|r| receipt_model(tenant, r, Some(batch_id))),
            )
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        if !unmatched.is_empty() {
            unmatched_payments::Entity::insert_many(unmatched.iter().map(|u| {
                unmatched_payments::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    tenant_id: Set(tenant.0),
                    import_batch_id: Set(batch_id.0),
                    valor: Set(u.valor),
                    data_pagamento: Set(u.data_pagamento),
                    descricao: Set(u.descricao.clone()),
                    cnj_hint: Set(u.cnj_hint.clone()),
                    match_status: Set(MatchStatus::Unmatched.to_string()),
                    notes: Set(None),
                    created_at: Set(Utc::now().fixed_offset()),
                }
            }))
            .exec(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(batch.into())
    }

    async fn list_unmatched(&self, tenant: &TenantId) -> Result<Vec<UnmatchedPayment>, DomainError> {
        let results = unmatched_payments::Entity::find()
            .filter(unmatched_payments::Column::TenantId.eq(tenant.0))
            .filter(unmatched_payments::Column::MatchStatus.eq(MatchStatus::Unmatched.to_string()))
            .order_by_desc(unmatched_payments::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn reconcile(
        &self,
        tenant: &TenantId,
        ids: &[UnmatchedPaymentId],
        notes: Option<&str>,
    ) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = unmatched_payments::Entity::update_many()
            .col_expr(
                unmatched_payments::Column::MatchStatus,
                Expr::value(MatchStatus::Matched.to_string()),
            )
            .col_expr(
                unmatched_payments::Column::Notes,
                Expr::value(notes.map(str::to_string)),
            )
            .filter(unmatched_payments::Column::TenantId.eq(tenant.0))
            .filter(unmatched_payments::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }
}

/// Convert SeaORM model to domain entity
impl From<recebimentos::Model> for Recebimento {
    fn from(model: recebimentos::Model) -> Self {
        Recebimento {
            id: RecebimentoId(model.id),
            tenant_id: TenantId(model.tenant_id),
            pericia_id: model.pericia_id.map(PericiaId),
            fonte_pagamento: model.fonte_pagamento.parse().unwrap_or_default(),
            data_recebimento: model.data_recebimento,
            valor_bruto: model.valor_bruto,
            valor_liquido: model.valor_liquido,
            descricao: model.descricao,
            import_batch_id: model.import_batch_id.map(ImportBatchId),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<despesas::Model> for Despesa {
    fn from(model: despesas::Model) -> Self {
        Despesa {
            id: DespesaId(model.id),
            tenant_id: TenantId(model.tenant_id),
            categoria: model.categoria,
            descricao: model.descricao,
            valor: model.valor,
            data_competencia: model.data_competencia,
            pericia_id: model.pericia_id.map(PericiaId),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<import_batches::Model> for ImportBatch {
    fn from(model: import_batches::Model) -> Self {
        ImportBatch {
            id: ImportBatchId(model.id),
            tenant_id: TenantId(model.tenant_id),
            source_file_name: model.source_file_name,
            total_records: model.total_records,
            matched_records: model.matched_records,
            unmatched_records: model.unmatched_records,
            status: model.status.parse().unwrap_or_default(),
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<unmatched_payments::Model> for UnmatchedPayment {
    fn from(model: unmatched_payments::Model) -> Self {
        UnmatchedPayment {
            id: UnmatchedPaymentId(model.id),
            tenant_id: TenantId(model.tenant_id),
            import_batch_id: ImportBatchId(model.import_batch_id),
            valor: model.valor,
            data_pagamento: model.data_pagamento,
            descricao: model.descricao,
            cnj_hint: model.cnj_hint,
            match_status: model.match_status.parse().unwrap_or_default(),
            notes: model.notes,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
