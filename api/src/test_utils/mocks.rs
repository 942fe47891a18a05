//! Mock implementations of port traits
//!
//! These are in-memory implementations that can be configured for testing.
//! They store data in memory and allow tests to verify behavior. Every
//! repository honours tenant isolation the same way the PostgreSQL
//! adapters do.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use uuid::Uuid;

use crate::domain::criteria::{matches_all, PericiaCriterion, PericiaOrder, PericiaQuery};
use crate::domain::entities::{
    ActivityLog, AgendaEvent, AgendaEventId, AgendaTask, AgendaTaskId, CaseRole, CatalogItem,
    CatalogItemId, CatalogItemPatch, CatalogResource, Despesa, DespesaId, ImportBatch,
    ImportBatchId, ImportStatus, Laudo, LaudoId, Lawyer, LawyerId, LawyerOnPericia, MatchStatus,
    NewActivityLog, NewAgendaEvent, NewAgendaTask, NewCatalogItem, NewDespesa, NewLaudo,
    NewLawyer, NewPericia, NewRecebimento, NewSchedulingBatch, NotificationChannel,
    NewTeleSlot, NotificationConfig, NotificationConfigId, Pericia, PericiaId, PericiaPatch,
    RealtimeNotification, Recebimento, RecebimentoId, ScheduleUpdate, SchedulingBatch,
    SchedulingBatchId, StatusChange, StatusLog, TeleSlot, TeleSlotId, TeleSlotItem,
    TeleSlotItemId, Tenant, TenantId, UnmatchedPayment, UnmatchedPaymentId, NewUnmatchedPayment,
};
use crate::domain::ports::{
    ActivityLogRepository, AgendaRepository, CatalogRepository, FinancialRepository,
    LaudoRepository, LawyerRepository, NotificationPublisher, NotificationRepository,
    PericiaRepository, TelepericiaRepository, TenantRepository,
};
use crate::error::DomainError;

// ============================================================================
// In-Memory Tenant Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryTenantRepository {
    tenants: Arc<RwLock<HashMap<TenantId, Tenant>>>,
}

impl InMemoryTenantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a tenant for testing
    pub fn with_tenant(self, tenant: Tenant) -> Self {
        self.tenants.write().unwrap().insert(tenant.id, tenant);
        self
    }
}

#[async_trait]
impl TenantRepository for InMemoryTenantRepository {
    async fn find_by_id(&self, id: &TenantId) -> Result<Option<Tenant>, DomainError> {
        Ok(self.tenants.read().unwrap().get(id).cloned())
    }

    async fn create(&self, nome: &str) -> Result<Tenant, DomainError> {
        let tenant = Tenant {
            id: TenantId::new(),
            nome: nome.to_string(),
            ativo: true,
            created_at: Utc::now(),
        };
        self.tenants
            .write()
            .unwrap()
            .insert(tenant.id, tenant.clone());
        Ok(tenant)
    }
}

// ============================================================================
// In-Memory Catalog Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryCatalogRepository {
    items: Arc<RwLock<HashMap<CatalogItemId, CatalogItem>>>,
}

impl InMemoryCatalogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a catalog item for testing
    pub fn with_item(self, item: CatalogItem) -> Self {
        self.items.write().unwrap().insert(item.id, item);
        self
    }

    fn visible(item: &CatalogItem, tenant: &TenantId, resource: CatalogResource) -> bool {
        item.tenant_id == *tenant && item.resource == resource
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn list(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
    ) -> Result<Vec<CatalogItem>, DomainError> {
        let items = self.items.read().unwrap();
        let mut result: Vec<CatalogItem> = items
            .values()
            .filter(|i| Self::visible(i, tenant, resource))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.ordem.cmp(&b.ordem).then_with(|| a.nome.cmp(&b.nome)));
        Ok(result)
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<Option<CatalogItem>, DomainError> {
        let items = self.items.read().unwrap();
        Ok(items
            .get(id)
            .filter(|i| Self::visible(i, tenant, resource))
            .cloned())
    }

    async fn find_by_codigo(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        codigo: &str,
    ) -> Result<Option<CatalogItem>, DomainError> {
        let items = self.items.read().unwrap();
        Ok(items
            .values()
            .find(|i| Self::visible(i, tenant, resource) && i.codigo == codigo)
            .cloned())
    }

    async fn find_status_ids_by_codes(
        &self,
        tenant: &TenantId,
        codes: &[&str],
    ) -> Result<HashMap<String, CatalogItemId>, DomainError> {
        let items = self.items.read().unwrap();
        Ok(items
            .values()
            .filter(|i| Self::visible(i, tenant, CatalogResource::Status))
            .filter(|i| codes.contains(&i.codigo.as_str()))
            .map(|i| (i.codigo.clone(), i.id))
            .collect())
    }

    async fn create(
        &self,
        tenant: &TenantId,
        item: &NewCatalogItem,
    ) -> Result<CatalogItem, DomainError> {
        let mut items = self.items.write().unwrap();
        if items
            .values()
            .any(|i| Self::visible(i, tenant, item.resource) && i.codigo == item.codigo)
        {
            return Err(DomainError::AlreadyExists(format!(
                "Código {} já cadastrado",
                item.codigo
            )));
        }

        let now = Utc::now();
        let created = CatalogItem {
            id: CatalogItemId::new(),
            tenant_id: *tenant,
            resource: item.resource,
            codigo: item.codigo.clone(),
            nome: item.nome.clone(),
            uf: item.uf.clone(),
            cidade_id: item.cidade_id,
            tribunal_id: item.tribunal_id,
            endereco: item.endereco.clone(),
            cor: item.cor.clone(),
            ordem: item.ordem,
            ativo: item.ativo,
            created_at: now,
            updated_at: now,
        };
        items.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
        patch: CatalogItemPatch,
    ) -> Result<CatalogItem, DomainError> {
        let mut items = self.items.write().unwrap();
        if let Some(codigo) = &patch.codigo {
            if items
                .values()
                .any(|i| Self::visible(i, tenant, resource) && i.codigo == *codigo && i.id != *id)
            {
                return Err(DomainError::AlreadyExists(format!(
                    "Código {} já cadastrado",
                    codigo
                )));
            }
        }

        let item = items
            .get_mut(id)
            .filter(|i| Self::visible(i, tenant, resource))
            .ok_or_else(|| DomainError::NotFound(format!("Item {}", id)))?;
        patch.apply(item);
        item.updated_at = Utc::now();
        Ok(item.clone())
    }

    async fn delete(
        &self,
        tenant: &TenantId,
        resource: CatalogResource,
        id: &CatalogItemId,
    ) -> Result<(), DomainError> {
        let mut items = self.items.write().unwrap();
        match items.get(id) {
            Some(i) if Self::visible(i, tenant, resource) => {
                items.remove(id);
                Ok(())
            }
            _ => Err(DomainError::NotFound(format!("Item {}", id))),
        }
    }
}

// ============================================================================
// In-Memory Perícia Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryPericiaRepository {
    pericias: Arc<RwLock<HashMap<PericiaId, Pericia>>>,
    logs: Arc<RwLock<Vec<StatusLog>>>,
}

impl InMemoryPericiaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a perícia for testing
    pub fn with_pericia(self, pericia: Pericia) -> Self {
        self.pericias.write().unwrap().insert(pericia.id, pericia);
        self
    }

    /// Pre-populate with a status log entry for testing
    pub fn with_status_log(self, log: StatusLog) -> Self {
        self.logs.write().unwrap().push(log);
        self
    }

    /// Snapshot of one stored perícia regardless of tenant
    pub fn get(&self, id: &PericiaId) -> Option<Pericia> {
        self.pericias.read().unwrap().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.pericias.read().unwrap().len()
    }

    fn materialize(tenant: &TenantId, new: &NewPericia) -> Pericia {
        let now = Utc::now();
        Pericia {
            id: PericiaId::new(),
            tenant_id: *tenant,
            processo_cnj: new.processo_cnj.clone(),
            cidade_id: new.cidade_id,
            vara_id: new.vara_id,
            tipo_pericia_id: new.tipo_pericia_id,
            modalidade_id: new.modalidade_id,
            status_id: new.status_id,
            local_id: new.local_id,
            juiz_nome: new.juiz_nome.clone(),
            autor_nome: new.autor_nome.clone(),
            reu_nome: new.reu_nome.clone(),
            periciado_nome: new.periciado_nome.clone(),
            observacoes: new.observacoes.clone(),
            extra_observation: new.extra_observation.clone(),
            honorarios_previstos_jg: new.honorarios_previstos_jg,
            honorarios_previstos_partes: new.honorarios_previstos_partes,
            pagamento_status: new.pagamento_status,
            is_urgent: new.is_urgent,
            urgent_checked_at: None,
            agendada: new.data_agendamento.is_some(),
            laudo_enviado: false,
            finalizada: false,
            data_nomeacao: new.data_nomeacao,
            data_agendamento: new.data_agendamento,
            hora_agendamento: new.hora_agendamento.clone(),
            data_realizacao: None,
            data_envio_laudo: None,
            origem_importacao: new.origem_importacao.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn cnj_taken(map: &HashMap<PericiaId, Pericia>, tenant: &TenantId, cnj: &str) -> bool {
        map.values()
            .any(|p| p.tenant_id == *tenant && p.processo_cnj == cnj)
    }
}

#[async_trait]
impl PericiaRepository for InMemoryPericiaRepository {
    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Option<Pericia>, DomainError> {
        let pericias = self.pericias.read().unwrap();
        Ok(pericias.get(id).filter(|p| p.tenant_id == *tenant).cloned())
    }

    async fn existing_ids(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
    ) -> Result<HashSet<PericiaId>, DomainError> {
        let pericias = self.pericias.read().unwrap();
        Ok(ids
            .iter()
            .filter(|id| pericias.get(id).is_some_and(|p| p.tenant_id == *tenant))
            .copied()
            .collect())
    }

    async fn find_by_cnj(
        &self,
        tenant: &TenantId,
        processo_cnj: &str,
    ) -> Result<Option<Pericia>, DomainError> {
        let pericias = self.pericias.read().unwrap();
        Ok(pericias
            .values()
            .find(|p| p.tenant_id == *tenant && p.processo_cnj == processo_cnj)
            .cloned())
    }

    async fn query(
        &self,
        tenant: &TenantId,
        query: &PericiaQuery,
    ) -> Result<Vec<Pericia>, DomainError> {
        let pericias = self.pericias.read().unwrap();
        let mut result: Vec<Pericia> = pericias
            .values()
            .filter(|p| p.tenant_id == *tenant && matches_all(&query.criteria, p))
            .cloned()
            .collect();

        match query.order {
            PericiaOrder::CreatedDesc => result.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            PericiaOrder::ScheduledAsc => result.sort_by_key(|p| (p.data_agendamento.is_none(), p.data_agendamento)),
            PericiaOrder::NomeacaoDesc => result.sort_by(|a, b| {
                a.data_nomeacao
                    .is_none()
                    .cmp(&b.data_nomeacao.is_none())
                    .then_with(|| b.data_nomeacao.cmp(&a.data_nomeacao))
            }),
        }

        let offset = query.offset as usize;
        let limit = query.limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(result.into_iter().skip(offset).take(limit).collect())
    }

    async fn count(
        &self,
        tenant: &TenantId,
        criteria: &[PericiaCriterion],
    ) -> Result<u64, DomainError> {
        let pericias = self.pericias.read().unwrap();
        Ok(pericias
            .values()
            .filter(|p| p.tenant_id == *tenant && matches_all(criteria, p))
            .count() as u64)
    }

    async fn create(
        &self,
        tenant: &TenantId,
        pericia: &NewPericia,
    ) -> Result<Pericia, DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        if Self::cnj_taken(&pericias, tenant, &pericia.processo_cnj) {
            return Err(DomainError::AlreadyExists(format!(
                "Perícia {} já cadastrada",
                pericia.processo_cnj
            )));
        }
        let created = Self::materialize(tenant, pericia);
        pericias.insert(created.id, created.clone());
        Ok(created)
    }

    async fn create_many(
        &self,
        tenant: &TenantId,
        rows: &[NewPericia],
    ) -> Result<u64, DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        let mut seen = HashSet::new();
        for row in rows {
            if !seen.insert(row.processo_cnj.as_str())
                || Self::cnj_taken(&pericias, tenant, &row.processo_cnj)
            {
                return Err(DomainError::AlreadyExists(format!(
                    "Perícia {} já cadastrada",
                    row.processo_cnj
                )));
            }
        }
        for row in rows {
            let created = Self::materialize(tenant, row);
            pericias.insert(created.id, created);
        }
        Ok(rows.len() as u64)
    }

    async fn update(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
        patch: &PericiaPatch,
    ) -> Result<Pericia, DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        let pericia = pericias
            .get_mut(id)
            .filter(|p| p.tenant_id == *tenant)
            .ok_or_else(|| DomainError::NotFound(format!("Perícia {}", id)))?;
        patch.apply(pericia);
        pericia.updated_at = Utc::now();
        Ok(pericia.clone())
    }

    async fn update_many(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
        patch: &PericiaPatch,
    ) -> Result<u64, DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        let mut updated = 0;
        for id in ids {
            if let Some(p) = pericias.get_mut(id).filter(|p| p.tenant_id == *tenant) {
                patch.apply(p);
                p.updated_at = Utc::now();
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete(&self, tenant: &TenantId, id: &PericiaId) -> Result<(), DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        match pericias.get(id) {
            Some(p) if p.tenant_id == *tenant => {
                pericias.remove(id);
                Ok(())
            }
            _ => Err(DomainError::NotFound(format!("Perícia {}", id))),
        }
    }

    async fn apply_status_change(
        &self,
        tenant: &TenantId,
        change: &StatusChange,
    ) -> Result<Pericia, DomainError> {
        let updated = self.update(tenant, &change.pericia_id, &change.patch).await?;
        self.logs.write().unwrap().push(StatusLog {
            id: Uuid::new_v4(),
            tenant_id: *tenant,
            pericia_id: change.pericia_id,
            status_anterior_id: change.log.status_anterior_id,
            status_novo_id: change.log.status_novo_id,
            motivo: change.log.motivo.clone(),
            metadata: change.log.metadata.clone(),
            created_by: change.log.created_by.clone(),
            created_at: Utc::now(),
        });
        Ok(updated)
    }

    async fn status_logs(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Vec<StatusLog>, DomainError> {
        let logs = self.logs.read().unwrap();
        let mut result: Vec<StatusLog> = logs
            .iter()
            .filter(|l| l.tenant_id == *tenant && l.pericia_id == *id)
            .cloned()
            .collect();
        result.reverse();
        Ok(result)
    }

    async fn status_logs_between(
        &self,
        tenant: &TenantId,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
    ) -> Result<Vec<StatusLog>, DomainError> {
        let logs = self.logs.read().unwrap();
        Ok(logs
            .iter()
            .filter(|l| l.tenant_id == *tenant && l.created_at >= from && l.created_at <= to)
            .cloned()
            .collect())
    }

    async fn set_schedules(
        &self,
        tenant: &TenantId,
        updates: &[ScheduleUpdate],
    ) -> Result<u64, DomainError> {
        let mut pericias = self.pericias.write().unwrap();
        let mut updated = 0;
        for update in updates {
            if let Some(p) = pericias
                .get_mut(&update.pericia_id)
                .filter(|p| p.tenant_id == *tenant)
            {
                update.apply(p);
                p.updated_at = Utc::now();
                updated += 1;
            }
        }
        Ok(updated)
    }
}

// ============================================================================
// In-Memory Activity Log Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryActivityLogRepository {
    entries: Arc<RwLock<Vec<ActivityLog>>>,
}

impl InMemoryActivityLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<ActivityLog> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl ActivityLogRepository for InMemoryActivityLogRepository {
    async fn record(
        &self,
        tenant: &TenantId,
        entry: &NewActivityLog,
    ) -> Result<ActivityLog, DomainError> {
        let log = ActivityLog {
            id: Uuid::new_v4(),
            tenant_id: *tenant,
            entity_type: entry.entity_type.clone(),
            entity_id: entry.entity_id,
            action: entry.action.clone(),
            payload: entry.payload.clone(),
            created_by: entry.created_by.clone(),
            created_at: Utc::now(),
        };
        self.entries.write().unwrap().push(log.clone());
        Ok(log)
    }

    async fn list_for_entity(
        &self,
        tenant: &TenantId,
        entity_id: &Uuid,
    ) -> Result<Vec<ActivityLog>, DomainError> {
        let entries = self.entries.read().unwrap();
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.tenant_id == *tenant && e.entity_id == *entity_id)
            .cloned()
            .collect())
    }
}

// ============================================================================
// In-Memory Agenda Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryAgendaRepository {
    events: Arc<RwLock<HashMap<AgendaEventId, AgendaEvent>>>,
    tasks: Arc<RwLock<HashMap<AgendaTaskId, AgendaTask>>>,
    batches: Arc<RwLock<Vec<SchedulingBatch>>>,
    fail_inserts: Arc<RwLock<bool>>,
}

impl InMemoryAgendaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with an event for testing
    pub fn with_event(self, event: AgendaEvent) -> Self {
        self.events.write().unwrap().insert(event.id, event);
        self
    }

    /// Pre-populate with a scheduling batch for testing
    pub fn with_batch(self, batch: SchedulingBatch) -> Self {
        self.batches.write().unwrap().push(batch);
        self
    }

    /// Make every bulk insert fail, simulating a rolled back transaction
    pub fn failing_inserts(self) -> Self {
        *self.fail_inserts.write().unwrap() = true;
        self
    }

    pub fn event_count(&self) -> usize {
        self.events.read().unwrap().len()
    }

    pub fn batch_count(&self) -> usize {
        self.batches.read().unwrap().len()
    }

    fn materialize(tenant: &TenantId, new: &NewAgendaEvent) -> AgendaEvent {
        let now = Utc::now();
        AgendaEvent {
            id: AgendaEventId::new(),
            tenant_id: *tenant,
            title: new.title.clone(),
            description: new.description.clone(),
            event_type: new.event_type,
            status: new.status,
            source: new.source,
            ai_suggested: new.ai_suggested,
            start_at: new.start_at,
            end_at: new.end_at,
            location: new.location.clone(),
            pericia_id: new.pericia_id,
            cnj_id: new.cnj_id.clone(),
            city_id: new.city_id,
            city: new.city.clone(),
            status_history: Vec::new(),
            metadata: new.metadata.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn check_failure(&self) -> Result<(), DomainError> {
        if *self.fail_inserts.read().unwrap() {
            return Err(DomainError::Database("simulated insert failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl AgendaRepository for InMemoryAgendaRepository {
    async fn create_event(
        &self,
        tenant: &TenantId,
        event: &NewAgendaEvent,
    ) -> Result<AgendaEvent, DomainError> {
        let created = Self::materialize(tenant, event);
        self.events
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_event(
        &self,
        tenant: &TenantId,
        id: &AgendaEventId,
    ) -> Result<Option<AgendaEvent>, DomainError> {
        let events = self.events.read().unwrap();
        Ok(events.get(id).filter(|e| e.tenant_id == *tenant).cloned())
    }

    async fn list_events(
        &self,
        tenant: &TenantId,
        window: Option<(chrono::DateTime<Utc>, chrono::DateTime<Utc>)>,
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        let events = self.events.read().unwrap();
        let mut result: Vec<AgendaEvent> = events
            .values()
            .filter(|e| e.tenant_id == *tenant)
            .filter(|e| window.map_or(true, |(from, to)| e.start_at >= from && e.start_at < to))
            .cloned()
            .collect();
        result.sort_by_key(|e| e.start_at);
        Ok(result)
    }

    async fn overlapping_events(
        &self,
        tenant: &TenantId,
        from: chrono::DateTime<Utc>,
        to: chrono::DateTime<Utc>,
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        let events = self.events.read().unwrap();
        let mut result: Vec<AgendaEvent> = events
            .values()
            .filter(|e| e.tenant_id == *tenant && e.overlaps(from, to))
            .cloned()
            .collect();
        result.sort_by_key(|e| e.start_at);
        Ok(result)
    }

    async fn save_event(&self, event: &AgendaEvent) -> Result<AgendaEvent, DomainError> {
        let mut events = self.events.write().unwrap();
        match events.get(&event.id) {
            Some(existing) if existing.tenant_id == event.tenant_id => {
                let mut saved = event.clone();
                saved.updated_at = Utc::now();
                events.insert(saved.id, saved.clone());
                Ok(saved)
            }
            _ => Err(DomainError::NotFound(format!("Evento {}", event.id))),
        }
    }

    async fn create_events(
        &self,
        tenant: &TenantId,
        new_events: &[NewAgendaEvent],
    ) -> Result<Vec<AgendaEvent>, DomainError> {
        self.check_failure()?;
        let created: Vec<AgendaEvent> = new_events
            .iter()
            .map(|e| Self::materialize(tenant, e))
            .collect();
        let mut events = self.events.write().unwrap();
        for e in &created {
            events.insert(e.id, e.clone());
        }
        Ok(created)
    }

    async fn create_batch(
        &self,
        tenant: &TenantId,
        new_events: &[NewAgendaEvent],
        batch: &NewSchedulingBatch,
    ) -> Result<SchedulingBatch, DomainError> {
        self.check_failure()?;
        self.create_events(tenant, new_events).await?;
        let created = SchedulingBatch {
            id: SchedulingBatchId::new(),
            tenant_id: *tenant,
            date_ref: batch.date_ref,
            criteria: batch.criteria.clone(),
            result: batch.result.clone(),
            created_at: Utc::now(),
        };
        self.batches.write().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_batches(&self, tenant: &TenantId) -> Result<Vec<SchedulingBatch>, DomainError> {
        let batches = self.batches.read().unwrap();
        let mut result: Vec<SchedulingBatch> = batches
            .iter()
            .filter(|b| b.tenant_id == *tenant)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn create_task(
        &self,
        tenant: &TenantId,
        task: &NewAgendaTask,
    ) -> Result<AgendaTask, DomainError> {
        let now = Utc::now();
        let created = AgendaTask {
            id: AgendaTaskId::new(),
            tenant_id: *tenant,
            title: task.title.clone(),
            description: task.description.clone(),
            status: task.status,
            due_at: task.due_at,
            priority: task.priority,
            pericia_id: task.pericia_id,
            created_at: now,
            updated_at: now,
        };
        self.tasks
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_task(
        &self,
        tenant: &TenantId,
        id: &AgendaTaskId,
    ) -> Result<Option<AgendaTask>, DomainError> {
        let tasks = self.tasks.read().unwrap();
        Ok(tasks.get(id).filter(|t| t.tenant_id == *tenant).cloned())
    }

    async fn list_tasks(&self, tenant: &TenantId) -> Result<Vec<AgendaTask>, DomainError> {
        let tasks = self.tasks.read().unwrap();
        let mut result: Vec<AgendaTask> = tasks
            .values()
            .filter(|t| t.tenant_id == *tenant)
            .cloned()
            .collect();
        result.sort_by_key(|t| (t.due_at.is_none(), t.due_at));
        Ok(result)
    }

    async fn save_task(&self, task: &AgendaTask) -> Result<AgendaTask, DomainError> {
        let mut tasks = self.tasks.write().unwrap();
        match tasks.get(&task.id) {
            Some(existing) if existing.tenant_id == task.tenant_id => {
                let mut saved = task.clone();
                saved.updated_at = Utc::now();
                tasks.insert(saved.id, saved.clone());
                Ok(saved)
            }
            _ => Err(DomainError::NotFound(format!("Tarefa {}", task.id))),
        }
    }
}

// ============================================================================
// In-Memory Lawyer Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryLawyerRepository {
    lawyers: Arc<RwLock<HashMap<LawyerId, Lawyer>>>,
    links: Arc<RwLock<Vec<(TenantId, LawyerOnPericia)>>>,
}

impl InMemoryLawyerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a lawyer for testing
    pub fn with_lawyer(self, lawyer: Lawyer) -> Self {
        self.lawyers.write().unwrap().insert(lawyer.id, lawyer);
        self
    }
}

#[async_trait]
impl LawyerRepository for InMemoryLawyerRepository {
    async fn create(&self, tenant: &TenantId, lawyer: &NewLawyer) -> Result<Lawyer, DomainError> {
        let now = Utc::now();
        let created = Lawyer {
            id: LawyerId::new(),
            tenant_id: *tenant,
            nome: lawyer.nome.clone(),
            oab: lawyer.oab.clone(),
            uf_oab: lawyer.uf_oab.clone(),
            email: lawyer.email.clone(),
            telefone: lawyer.telefone.clone(),
            observacoes: lawyer.observacoes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.lawyers
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(&self, tenant: &TenantId) -> Result<Vec<Lawyer>, DomainError> {
        let lawyers = self.lawyers.read().unwrap();
        let mut result: Vec<Lawyer> = lawyers
            .values()
            .filter(|l| l.tenant_id == *tenant)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.nome.cmp(&b.nome));
        Ok(result)
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &LawyerId,
    ) -> Result<Option<Lawyer>, DomainError> {
        let lawyers = self.lawyers.read().unwrap();
        Ok(lawyers.get(id).filter(|l| l.tenant_id == *tenant).cloned())
    }

    async fn save(&self, lawyer: &Lawyer) -> Result<Lawyer, DomainError> {
        let mut lawyers = self.lawyers.write().unwrap();
        match lawyers.get(&lawyer.id) {
            Some(existing) if existing.tenant_id == lawyer.tenant_id => {
                let mut saved = lawyer.clone();
                saved.updated_at = Utc::now();
                lawyers.insert(saved.id, saved.clone());
                Ok(saved)
            }
            _ => Err(DomainError::NotFound(format!("Advogado {}", lawyer.id))),
        }
    }

    async fn delete(&self, tenant: &TenantId, id: &LawyerId) -> Result<(), DomainError> {
        let mut lawyers = self.lawyers.write().unwrap();
        match lawyers.get(id) {
            Some(l) if l.tenant_id == *tenant => {
                lawyers.remove(id);
                self.links
                    .write()
                    .unwrap()
                    .retain(|(_, link)| link.lawyer_id != *id);
                Ok(())
            }
            _ => Err(DomainError::NotFound(format!("Advogado {}", id))),
        }
    }

    async fn link(&self, tenant: &TenantId, link: &LawyerOnPericia) -> Result<(), DomainError> {
        let mut links = self.links.write().unwrap();
        if links.iter().any(|(t, l)| {
            t == tenant && l.lawyer_id == link.lawyer_id && l.pericia_id == link.pericia_id
        }) {
            return Err(DomainError::AlreadyExists(
                "Advogado já vinculado à perícia".to_string(),
            ));
        }
        links.push((*tenant, link.clone()));
        Ok(())
    }

    async fn list_for_pericia(
        &self,
        tenant: &TenantId,
        pericia_id: &PericiaId,
    ) -> Result<Vec<(Lawyer, CaseRole)>, DomainError> {
        let links = self.links.read().unwrap();
        let lawyers = self.lawyers.read().unwrap();
        let mut result: Vec<(Lawyer, CaseRole)> = links
            .iter()
            .filter(|(t, l)| t == tenant && l.pericia_id == *pericia_id)
            .filter_map(|(_, l)| lawyers.get(&l.lawyer_id).map(|lw| (lw.clone(), l.role_in_case)))
            .collect();
        result.sort_by(|a, b| a.0.nome.cmp(&b.0.nome));
        Ok(result)
    }
}

// ============================================================================
// In-Memory Laudo Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryLaudoRepository {
    laudos: Arc<RwLock<HashMap<LaudoId, Laudo>>>,
}

impl InMemoryLaudoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a laudo for testing
    pub fn with_laudo(self, laudo: Laudo) -> Self {
        self.laudos.write().unwrap().insert(laudo.id, laudo);
        self
    }
}

#[async_trait]
impl LaudoRepository for InMemoryLaudoRepository {
    async fn create(&self, tenant: &TenantId, laudo: &NewLaudo) -> Result<Laudo, DomainError> {
        let now = Utc::now();
        let created = Laudo {
            id: LaudoId::new(),
            tenant_id: *tenant,
            pericia_id: laudo.pericia_id,
            title: laudo.title.clone(),
            status: laudo.status,
            content: laudo.content.clone(),
            sections: laudo.sections.clone(),
            created_at: now,
            updated_at: now,
        };
        self.laudos
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn list(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Laudo>, DomainError> {
        let laudos = self.laudos.read().unwrap();
        let mut result: Vec<Laudo> = laudos
            .values()
            .filter(|l| l.tenant_id == *tenant)
            .filter(|l| pericia_id.map_or(true, |p| l.pericia_id == *p))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn find_by_id(
        &self,
        tenant: &TenantId,
        id: &LaudoId,
    ) -> Result<Option<Laudo>, DomainError> {
        let laudos = self.laudos.read().unwrap();
        Ok(laudos.get(id).filter(|l| l.tenant_id == *tenant).cloned())
    }

    async fn save(&self, laudo: &Laudo) -> Result<Laudo, DomainError> {
        let mut laudos = self.laudos.write().unwrap();
        match laudos.get(&laudo.id) {
            Some(existing) if existing.tenant_id == laudo.tenant_id => {
                let mut saved = laudo.clone();
                saved.updated_at = Utc::now();
                laudos.insert(saved.id, saved.clone());
                Ok(saved)
            }
            _ => Err(DomainError::NotFound(format!("Laudo {}", laudo.id))),
        }
    }

    async fn delete(&self, tenant: &TenantId, id: &LaudoId) -> Result<(), DomainError> {
        let mut laudos = self.laudos.write().unwrap();
        match laudos.get(id) {
            Some(l) if l.tenant_id == *tenant => {
                laudos.remove(id);
                Ok(())
            }
            _ => Err(DomainError::NotFound(format!("Laudo {}", id))),
        }
    }
}

// ============================================================================
// In-Memory Telepericia Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryTelepericiaRepository {
    slots: Arc<RwLock<HashMap<TeleSlotId, TeleSlot>>>,
}

impl InMemoryTelepericiaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate with a slot for testing
    pub fn with_slot(self, slot: TeleSlot) -> Self {
        self.slots.write().unwrap().insert(slot.id, slot);
        self
    }

    fn owned<'a>(
        slots: &'a mut HashMap<TeleSlotId, TeleSlot>,
        tenant: &TenantId,
        id: &TeleSlotId,
    ) -> Result<&'a mut TeleSlot, DomainError> {
        slots
            .get_mut(id)
            .filter(|s| s.tenant_id == *tenant)
            .ok_or_else(|| DomainError::NotFound(format!("Slot {}", id)))
    }
}

#[async_trait]
impl TelepericiaRepository for InMemoryTelepericiaRepository {
    async fn create_slot(
        &self,
        tenant: &TenantId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError> {
        let now = Utc::now();
        let created = TeleSlot {
            id: TeleSlotId::new(),
            tenant_id: *tenant,
            date: slot.date,
            start_time: slot.start_time.clone(),
            duration_minutes: slot.duration_minutes,
            slot_type: slot.slot_type.clone(),
            appointment_duration_minutes: slot.appointment_duration_minutes,
            gap_minutes: slot.gap_minutes,
            capacity: slot.capacity,
            timezone: slot.timezone.clone(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        self.slots
            .write()
            .unwrap()
            .insert(created.id, created.clone());
        Ok(created)
    }

    async fn list_slots(&self, tenant: &TenantId) -> Result<Vec<TeleSlot>, DomainError> {
        let slots = self.slots.read().unwrap();
        let mut result: Vec<TeleSlot> = slots
            .values()
            .filter(|s| s.tenant_id == *tenant)
            .cloned()
            .collect();
        result.sort_by(|a, b| (a.date, &a.start_time).cmp(&(b.date, &b.start_time)));
        Ok(result)
    }

    async fn find_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
    ) -> Result<Option<TeleSlot>, DomainError> {
        let slots = self.slots.read().unwrap();
        Ok(slots.get(id).filter(|s| s.tenant_id == *tenant).cloned())
    }

    async fn update_slot(
        &self,
        tenant: &TenantId,
        id: &TeleSlotId,
        slot: &NewTeleSlot,
    ) -> Result<TeleSlot, DomainError> {
        let mut slots = self.slots.write().unwrap();
        let existing = Self::owned(&mut slots, tenant, id)?;
        existing.date = slot.date;
        existing.start_time = slot.start_time.clone();
        existing.duration_minutes = slot.duration_minutes;
        existing.slot_type = slot.slot_type.clone();
        existing.appointment_duration_minutes = slot.appointment_duration_minutes;
        existing.gap_minutes = slot.gap_minutes;
        existing.capacity = slot.capacity;
        existing.timezone = slot.timezone.clone();
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn delete_slot(&self, tenant: &TenantId, id: &TeleSlotId) -> Result<(), DomainError> {
        let mut slots = self.slots.write().unwrap();
        Self::owned(&mut slots, tenant, id)?;
        slots.remove(id);
        Ok(())
    }

    async fn add_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        pericia_id: &PericiaId,
        order_index: i32,
    ) -> Result<TeleSlotItem, DomainError> {
        let mut slots = self.slots.write().unwrap();
        let slot = Self::owned(&mut slots, tenant, slot_id)?;
        if slot.items.iter().any(|i| i.pericia_id == *pericia_id) {
            return Err(DomainError::AlreadyExists(format!(
                "Perícia {} já atribuída ao slot",
                pericia_id
            )));
        }
        let item = TeleSlotItem {
            id: TeleSlotItemId::new(),
            tenant_id: *tenant,
            slot_id: *slot_id,
            pericia_id: *pericia_id,
            order_index,
            created_at: Utc::now(),
        };
        slot.items.push(item.clone());
        slot.items.sort_by_key(|i| i.order_index);
        Ok(item)
    }

    async fn set_item_order(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        ordered: &[TeleSlotItemId],
    ) -> Result<(), DomainError> {
        let mut slots = self.slots.write().unwrap();
        let slot = Self::owned(&mut slots, tenant, slot_id)?;
        for (index, id) in ordered.iter().enumerate() {
            if let Some(item) = slot.items.iter_mut().find(|i| i.id == *id) {
                item.order_index = index as i32;
            }
        }
        slot.items.sort_by_key(|i| i.order_index);
        Ok(())
    }

    async fn remove_item(
        &self,
        tenant: &TenantId,
        slot_id: &TeleSlotId,
        item_id: &TeleSlotItemId,
    ) -> Result<(), DomainError> {
        let mut slots = self.slots.write().unwrap();
        let slot = Self::owned(&mut slots, tenant, slot_id)?;
        let before = slot.items.len();
        slot.items.retain(|i| i.id != *item_id);
        if slot.items.len() == before {
            return Err(DomainError::NotFound(format!("Item {}", item_id)));
        }
        for (index, item) in slot.items.iter_mut().enumerate() {
            item.order_index = index as i32;
        }
        Ok(())
    }
}

// ============================================================================
// In-Memory Financial Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryFinancialRepository {
    receipts: Arc<RwLock<Vec<Recebimento>>>,
    expenses: Arc<RwLock<Vec<Despesa>>>,
    batches: Arc<RwLock<Vec<ImportBatch>>>,
    unmatched: Arc<RwLock<Vec<UnmatchedPayment>>>,
}

impl InMemoryFinancialRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn materialize_receipt(
        tenant: &TenantId,
        new: &NewRecebimento,
        batch: Option<ImportBatchId>,
    ) -> Recebimento {
        Recebimento {
            id: RecebimentoId::new(),
            tenant_id: *tenant,
            pericia_id: new.pericia_id,
            fonte_pagamento: new.fonte_pagamento,
            data_recebimento: new.data_recebimento,
            valor_bruto: new.valor_bruto,
            valor_liquido: new.valor_liquido,
            descricao: new.descricao.clone(),
            import_batch_id: batch,
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl FinancialRepository for InMemoryFinancialRepository {
    async fn create_receipt(
        &self,
        tenant: &TenantId,
        receipt: &NewRecebimento,
    ) -> Result<Recebimento, DomainError> {
        let created = Self::materialize_receipt(tenant, receipt, None);
        self.receipts.write().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_receipts(
        &self,
        tenant: &TenantId,
        pericia_id: Option<&PericiaId>,
    ) -> Result<Vec<Recebimento>, DomainError> {
        let receipts = self.receipts.read().unwrap();
        let mut result: Vec<Recebimento> = receipts
            .iter()
            .filter(|r| r.tenant_id == *tenant)
            .filter(|r| pericia_id.map_or(true, |p| r.pericia_id == Some(*p)))
            .cloned()
            .collect();
        result.sort_by(|a, b| b.data_recebimento.cmp(&a.data_recebimento));
        Ok(result)
    }

    async fn create_expense(
        &self,
        tenant: &TenantId,
        expense: &NewDespesa,
    ) -> Result<Despesa, DomainError> {
        let created = Despesa {
            id: DespesaId::new(),
            tenant_id: *tenant,
            categoria: expense.categoria.clone(),
            descricao: expense.descricao.clone(),
            valor: expense.valor,
            data_competencia: expense.data_competencia,
            pericia_id: expense.pericia_id,
            created_at: Utc::now(),
        };
        self.expenses.write().unwrap().push(created.clone());
        Ok(created)
    }

    async fn list_expenses(&self, tenant: &TenantId) -> Result<Vec<Despesa>, DomainError> {
        let expenses = self.expenses.read().unwrap();
        let mut result: Vec<Despesa> = expenses
            .iter()
            .filter(|d| d.tenant_id == *tenant)
            .cloned()
            .collect();
        result.sort_by(|a, b| b.data_competencia.cmp(&a.data_competencia));
        Ok(result)
    }

    async fn import_batch(
        &self,
        tenant: &TenantId,
        source_file_name: Option<&str>,
        matched: &[NewRecebimento],
        unmatched: &[NewUnmatchedPayment],
    ) -> Result<ImportBatch, DomainError> {
        let batch = ImportBatch {
            id: ImportBatchId::new(),
            tenant_id: *tenant,
            source_file_name: source_file_name.map(str::to_string),
            total_records: (matched.len() + unmatched.len()) as i32,
            matched_records: matched.len() as i32,
            unmatched_records: unmatched.len() as i32,
            status: ImportStatus::Done,
            created_at: Utc::now(),
        };

        let mut receipts = self.receipts.write().unwrap();
        receipts.extend(
            matched
                .iter()
                .map(|r| Self::materialize_receipt(tenant, r, Some(batch.id))),
        );

        let mut lines = self.unmatched.write().unwrap();
        lines.extend(unmatched.iter().map(|u| UnmatchedPayment {
            id: UnmatchedPaymentId::new(),
            tenant_id: *tenant,
            import_batch_id: batch.id,
            valor: u.valor,
            data_pagamento: u.data_pagamento,
            descricao: u.descricao.clone(),
            cnj_hint: u.cnj_hint.clone(),
            match_status: MatchStatus::Unmatched,
            notes: None,
            created_at: Utc::now(),
        }));

        self.batches.write().unwrap().push(batch.clone());
        Ok(batch)
    }

    async fn list_unmatched(&self, tenant: &TenantId) -> Result<Vec<UnmatchedPayment>, DomainError> {
        let lines = self.unmatched.read().unwrap();
        Ok(lines
            .iter()
            .rev()
            .filter(|u| u.tenant_id == *tenant && u.match_status == MatchStatus::Unmatched)
            .cloned()
            .collect())
    }

    async fn reconcile(
        &self,
        tenant: &TenantId,
        ids: &[UnmatchedPaymentId],
        notes: Option<&str>,
    ) -> Result<u64, DomainError> {
        let mut lines = self.unmatched.write().unwrap();
        let mut changed = 0;
        for line in lines
            .iter_mut()
            .filter(|u| u.tenant_id == *tenant && ids.contains(&u.id))
        {
            line.match_status = MatchStatus::Matched;
            line.notes = notes.map(str::to_string);
            changed += 1;
        }
        Ok(changed)
    }
}

// ============================================================================
// In-Memory Notification Repository
// ============================================================================

#[derive(Default)]
pub struct InMemoryNotificationRepository {
    configs: Arc<RwLock<Vec<NotificationConfig>>>,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn upsert(
        &self,
        tenant: &TenantId,
        channel: NotificationChannel,
        enabled: Option<bool>,
        config: Option<serde_json::Value>,
    ) -> Result<NotificationConfig, DomainError> {
        let mut configs = self.configs.write().unwrap();
        if let Some(existing) = configs
            .iter_mut()
            .find(|c| c.tenant_id == *tenant && c.channel == channel)
        {
            if let Some(enabled) = enabled {
                existing.enabled = enabled;
            }
            if let Some(config) = config {
                existing.config = config;
            }
            existing.updated_at = Utc::now();
            return Ok(existing.clone());
        }

        let created = NotificationConfig {
            id: NotificationConfigId::new(),
            tenant_id: *tenant,
            channel,
            enabled: enabled.unwrap_or(true),
            config: config.unwrap_or_else(|| serde_json::json!({})),
            updated_at: Utc::now(),
        };
        configs.push(created.clone());
        Ok(created)
    }

    async fn list(&self, tenant: &TenantId) -> Result<Vec<NotificationConfig>, DomainError> {
        let configs = self.configs.read().unwrap();
        Ok(configs
            .iter()
            .filter(|c| c.tenant_id == *tenant)
            .cloned()
            .collect())
    }
}

// ============================================================================
// Recording Publisher
// ============================================================================

/// Publisher that keeps every notification it was handed
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<RealtimeNotification>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<RealtimeNotification> {
        self.published.lock().unwrap().clone()
    }
}

impl NotificationPublisher for RecordingPublisher {
    fn publish(&self, notification: RealtimeNotification) -> usize {
        self.published.lock().unwrap().push(notification);
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_pericia, test_status};

    #[tokio::test]
    async fn pericias_are_invisible_across_tenants() {
        let owner = TenantId::new();
        let other = TenantId::new();
        let pericia = test_pericia(owner);
        let id = pericia.id;
        let repo = InMemoryPericiaRepository::new().with_pericia(pericia);

        assert!(repo.find_by_id(&owner, &id).await.unwrap().is_some());
        assert!(repo.find_by_id(&other, &id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&other, &id).await,
            Err(DomainError::NotFound(_))
        ));
        assert!(repo.existing_ids(&other, &[id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn status_codes_resolve_per_tenant() {
        let tenant = TenantId::new();
        let status = test_status(tenant, "AGENDAR_DATA");
        let id = status.id;
        let repo = InMemoryCatalogRepository::new()
            .with_item(status)
            .with_item(test_status(TenantId::new(), "AVALIAR"));

        let ids = repo
            .find_status_ids_by_codes(&tenant, &["AGENDAR_DATA", "AVALIAR"])
            .await
            .unwrap();
        assert_eq!(ids.len(), 1);
        assert_eq!(ids.get("AGENDAR_DATA"), Some(&id));
    }
}
