//! PostgreSQL adapter for PericiaRepository

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{NullOrdering, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use super::criteria::all_of;
use super::unique_violation;
use crate::domain::criteria::{PericiaCriterion, PericiaOrder, PericiaQuery};
use crate::domain::entities::{
    CatalogItemId, NewPericia, PagamentoStatus, Pericia, PericiaId, PericiaPatch, ScheduleUpdate,
    StatusChange, StatusLog, TenantId,
};
use crate::domain::ports::PericiaRepository;
use crate::entity::{pericias, status_logs};
use crate::error::DomainError;

/// Rows per INSERT statement in bulk imports; each row binds about 32
/// parameters and Postgres caps a statement at 65535
pub const INSERT_CHUNK_ROWS: usize = 500;

/// PostgreSQL implementation of PericiaRepository
pub struct PostgresPericiaRepository {
    db: DatabaseConnection,
}

impl PostgresPericiaRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn new_model(tenant: &TenantId, new: &NewPericia) -> pericias::ActiveModel {
    let now = Utc::now().fixed_offset();
    pericias::ActiveModel {
        id: Set(Uuid::new_v4()),
        tenant_id: Set(tenant.0),
        processo_cnj: Set(new.processo_cnj.clone()),
        cidade_id: Set(new.cidade_id.map(|c| c.0)),
        vara_id: Set(new.vara_id.map(|c| c.0)),
        tipo_pericia_id: Set(new.tipo_pericia_id.map(|c| c.0)),
        modalidade_id: Set(new.modalidade_id.map(|c| c.0)),
        status_id: Set(new.status_id.map(|c| c.0)),
        local_id: Set(new.local_id.map(|c| c.0)),
        juiz_nome: Set(new.juiz_nome.clone()),
        autor_nome: Set(new.autor_nome.clone()),
        reu_nome: Set(new.reu_nome.clone()),
        periciado_nome: Set(new.periciado_nome.clone()),
        observacoes: Set(new.observacoes.clone()),
        extra_observation: Set(new.extra_observation.clone()),
        honorarios_previstos_jg: Set(new.honorarios_previstos_jg),
        honorarios_previstos_partes: Set(new.honorarios_previstos_partes),
        pagamento_status: Set(new.pagamento_status.to_string()),
        is_urgent: Set(new.is_urgent),
        urgent_checked_at: Set(None),
        agendada: Set(new.data_agendamento.is_some()),
        laudo_enviado: Set(false),
        finalizada: Set(false),
        data_nomeacao: Set(new.data_nomeacao),
        data_agendamento: Set(new.data_agendamento.map(|d| d.fixed_offset())),
        hora_agendamento: Set(new.hora_agendamento.clone()),
        data_realizacao: Set(None),
        data_envio_laudo: Set(None),
        origem_importacao: Set(new.origem_importacao.clone()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

/// Copy the present fields of a patch onto an active model
fn apply_patch(model: &mut pericias::ActiveModel, patch: &PericiaPatch) {
    macro_rules! set {
        ($field:ident, $conv:expr) => {
            if let Some(v) = &patch.$field {
                model.$field = Set($conv(v));
            }
        };
    }
    let id = |v: &CatalogItemId| Some(v.0);
    let text = |v: &String| Some(v.clone());
    let ts = |v: &DateTime<Utc>| Some(v.fixed_offset());

    set!(processo_cnj, |v: &String| v.clone());
    set!(cidade_id, id);
    set!(vara_id, id);
    set!(tipo_pericia_id, id);
    set!(modalidade_id, id);
    set!(status_id, id);
    set!(local_id, id);
    set!(juiz_nome, text);
    set!(autor_nome, text);
    set!(reu_nome, text);
    set!(periciado_nome, text);
    set!(observacoes, text);
    set!(extra_observation, text);
    set!(honorarios_previstos_jg, |v: &i64| Some(*v));
    set!(honorarios_previstos_partes, |v: &i64| Some(*v));
    set!(pagamento_status, |v: &PagamentoStatus| v.to_string());
    set!(is_urgent, |v: &bool| *v);
    set!(urgent_checked_at, ts);
    set!(agendada, |v: &bool| *v);
    set!(laudo_enviado, |v: &bool| *v);
    set!(finalizada, |v: &bool| *v);
    set!(data_nomeacao, |v: &chrono::NaiveDate| Some(*v));
    set!(data_agendamento, ts);
    set!(hora_agendamento, text);
    set!(data_realizacao, ts);
    set!(data_envio_laudo, ts);
    model.updated_at = Set(Utc::now().fixed_offset());
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    id: &PericiaId,
) -> Result<Option<pericias::Model>, DomainError> {
    pericias::Entity::find_by_id(id.0)
        .filter(pericias::Column::TenantId.eq(tenant.0))
        .one(conn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))
}

async fn patch_owned<C: ConnectionTrait>(
    conn: &C,
    tenant: &TenantId,
    id: &PericiaId,
    patch: &PericiaPatch,
) -> Result<pericias::Model, DomainError> {
    let existing = find_owned(conn, tenant, id)
        .await?
        .ok_or_else(|| DomainError::NotFound(format!("Perícia {}", id)))?;

    let mut model: pericias::ActiveModel = existing.into();
    apply_patch(&mut model, patch);
    model.update(conn).await.map_err(|e| {
        unique_violation(
            e,
            format!(
                "Perícia {} já cadastrada",
                patch.processo_cnj.as_deref().unwrap_or_default()
            ),
        )
    })
}

#[async_trait]
impl PericiaRepository for PostgresPericiaRepository {
    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Option<Pericia>, DomainError> {
        Ok(find_owned(&self.db, tenant, id).await?.map(|m| m.into()))
    }

    async fn existing_ids(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
    ) -> Result<HashSet<PericiaId>, DomainError> {
        if ids.is_empty() {
            return Ok(HashSet::new());
        }

        let found: Vec<Uuid> = pericias::Entity::find()
            .select_only()
            .column(pericias::Column::Id)
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .filter(pericias::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(found.into_iter().map(PericiaId).collect())
    }

    async fn find_by_cnj(
        &self,
        tenant: &TenantId,
        processo_cnj: &str,
    ) -> Result<Option<Pericia>, DomainError> {
        let result = pericias::Entity::find()
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .filter(pericias::Column::ProcessoCnj.eq(processo_cnj))
            .one(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(result.map(|m| m.into()))
    }

    async fn query(
        &self,
        tenant: &TenantId,
        query: &PericiaQuery,
    ) -> Result<Vec<Pericia>, DomainError> {
        let select = pericias::Entity::find()
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .filter(all_of(&query.criteria));

        let select = match query.order {
            PericiaOrder::CreatedDesc => select.order_by_desc(pericias::Column::CreatedAt),
            PericiaOrder::ScheduledAsc => select.order_by_with_nulls(
                pericias::Column::DataAgendamento,
                Order::Asc,
                NullOrdering::Last,
            ),
            PericiaOrder::NomeacaoDesc => select.order_by_with_nulls(
                pericias::Column::DataNomeacao,
                Order::Desc,
                NullOrdering::Last,
            ),
        };

        let results = select
            .order_by_desc(pericias::Column::CreatedAt)
            .offset(query.offset)
            .limit(query.limit)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn count(
        &self,
        tenant: &TenantId,
        criteria: &[PericiaCriterion],
    ) -> Result<u64, DomainError> {
        pericias::Entity::find()
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .filter(all_of(criteria))
            .count(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))
    }

    async fn create(
        &self,
        tenant: &TenantId,
        pericia: &NewPericia,
    ) -> Result<Pericia, DomainError> {
        let result = new_model(tenant, pericia)
            .insert(&self.db)
            .await
            .map_err(|e| {
                unique_violation(e, format!("Perícia {} já cadastrada", pericia.processo_cnj))
            })?;

        Ok(result.into())
    }

    async fn create_many(
        &self,
        tenant: &TenantId,
        rows: &[NewPericia],
    ) -> Result<u64, DomainError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        for chunk in rows.chunks(INSERT_CHUNK_ROWS) {
            pericias::Entity::insert_many(chunk.iter().map(|r| new_model(tenant, r)))
                .exec(&txn)
                .await
                .map_err(|e| unique_violation(e, "Perícia já cadastrada".to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(rows.len() as u64)
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
        patch: &PericiaPatch,
    ) -> Result<Pericia, DomainError> {
        Ok(patch_owned(&self.db, tenant, id, patch).await?.into())
    }

    async fn update_many(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
        patch: &PericiaPatch,
    ) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let existing = pericias::Entity::find()
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .filter(pericias::Column::Id.is_in(ids.iter().map(|id| id.0)))
            .all(&txn)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let updated = existing.len() as u64;
        for found in existing {
            let mut model: pericias::ActiveModel = found.into();
            apply_patch(&mut model, patch);
            model
                .update(&txn)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(updated)
    }

    async fn delete(&self, tenant: &TenantId, id: &PericiaId) -> Result<(), DomainError> {
        let result = pericias::Entity::delete_many()
            .filter(pericias::Column::Id.eq(id.0))
            .filter(pericias::Column::TenantId.eq(tenant.0))
            .exec(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound(format!("Perícia {}", id)));
        }
        Ok(())
    }

    async fn apply_status_change(
        &self,
        tenant: &TenantId,
        change: &StatusChange,
    ) -> Result<Pericia, DomainError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let updated = patch_owned(&txn, tenant, &change.pericia_id, &change.patch).await?;

        status_logs::ActiveModel {
            id: Set(Uuid::new_v4()),
            tenant_id: Set(tenant.0),
            pericia_id: Set(change.pericia_id.0),
            status_anterior_id: Set(change.log.status_anterior_id.map(|s| s.0)),
            status_novo_id: Set(change.log.status_novo_id.0),
            motivo: Set(change.log.motivo.clone()),
            metadata: Set(change.log.metadata.clone()),
            created_by: Set(change.log.created_by.clone()),
            created_at: Set(Utc::now().fixed_offset()),
        }
        .insert(&txn)
        .await
        .map_err(|e| DomainError::Database(e.to_string()))?;

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        tracing::debug!(
            tenant_id = %tenant,
            pericia_id = %change.pericia_id,
            status_id = %change.log.status_novo_id,
            "Status change committed"
        );
        Ok(updated.into())
    }

    async fn status_logs(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Vec<StatusLog>, DomainError> {
        let results = status_logs::Entity::find()
            .filter(status_logs::Column::TenantId.eq(tenant.0))
            .filter(status_logs::Column::PericiaId.eq(id.0))
            .order_by_desc(status_logs::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn status_logs_between(
        &self,
        tenant: &TenantId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<StatusLog>, DomainError> {
        let results = status_logs::Entity::find()
            .filter(status_logs::Column::TenantId.eq(tenant.0))
            .filter(status_logs::Column::CreatedAt.between(from.fixed_offset(), to.fixed_offset()))
            .order_by_asc(status_logs::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(results.into_iter().map(|m| m.into()).collect())
    }

    async fn set_schedules(
        &self,
        tenant: &TenantId,
        updates: &[ScheduleUpdate],
    ) -> Result<u64, DomainError> {
        if updates.is_empty() {
            return Ok(0);
        }

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        let mut updated = 0;
        for update in updates {
            let Some(existing) = find_owned(&txn, tenant, &update.pericia_id).await? else {
                continue;
            };
            let mut model: pericias::ActiveModel = existing.into();
            model.data_agendamento = Set(update.data_agendamento.map(|d| d.fixed_offset()));
            model.hora_agendamento = Set(update.hora_agendamento.clone());
            model.agendada = Set(update.data_agendamento.is_some());
            model.updated_at = Set(Utc::now().fixed_offset());
            model
                .update(&txn)
                .await
                .map_err(|e| DomainError::Database(e.to_string()))?;
            updated += 1;
        }

        txn.commit()
            .await
            .map_err(|e| DomainError::Database(e.to_string()))?;

        Ok(updated)
    }
}

/// Convert SeaORM model to domain entity
impl From<pericias::Model> for Pericia {
    fn from(model: pericias::Model) -> Self {
        Pericia {
            id: PericiaId(model.id),
            tenant_id: TenantId(model.tenant_id),
            processo_cnj: model.processo_cnj,
            cidade_id: model.cidade_id.map(CatalogItemId),
            vara_id: model.vara_id.map(CatalogItemId),
            tipo_pericia_id: model.tipo_pericia_id.map(CatalogItemId),
            modalidade_id: model.modalidade_id.map(CatalogItemId),
            status_id: model.status_id.map(CatalogItemId),
            local_id: model.local_id.map(CatalogItemId),
            juiz_nome: model.juiz_nome,
            autor_nome: model.autor_nome,
            reu_nome: model.reu_nome,
            periciado_nome: model.periciado_nome,
            observacoes: model.observacoes,
            extra_observation: model.extra_observation,
            honorarios_previstos_jg: model.honorarios_previstos_jg,
            honorarios_previstos_partes: model.honorarios_previstos_partes,
            pagamento_status: model.pagamento_status.parse().unwrap_or_default(),
            is_urgent: model.is_urgent,
            urgent_checked_at: model.urgent_checked_at.map(|dt| dt.with_timezone(&Utc)),
            agendada: model.agendada,
            laudo_enviado: model.laudo_enviado,
            finalizada: model.finalizada,
            data_nomeacao: model.data_nomeacao,
            data_agendamento: model.data_agendamento.map(|dt| dt.with_timezone(&Utc)),
            hora_agendamento: model.hora_agendamento,
            data_realizacao: model.data_realizacao.map(|dt| dt.with_timezone(&Utc)),
            data_envio_laudo: model.data_envio_laudo.map(|dt| dt.with_timezone(&Utc)),
            origem_importacao: model.origem_importacao,
            created_at: model.created_at.with_timezone(&Utc),
            updated_at: model.updated_at.with_timezone(&Utc),
        }
    }
}

/// Convert SeaORM model to domain entity
impl From<status_logs::Model> for StatusLog {
    fn from(model: status_logs::Model) -> Self {
        StatusLog {
            id: model.id,
            tenant_id: TenantId(model.tenant_id),
            pericia_id: PericiaId(model.pericia_id),
            status_anterior_id: model.status_anterior_id.map(CatalogItemId),
            status_novo_id: CatalogItemId(model.status_novo_id),
            motivo: model.motivo,
            metadata: model.metadata,
            created_by: model.created_by,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}
