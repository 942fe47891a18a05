//! Perícia service
//!
//! Case CRUD, status workflow, urgency, dashboard buckets, operational
//! views and per-city overviews.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Utc};
use serde::Serialize;

use crate::app::city_overview::{build_city_overview, CityOverview};
use crate::app::dashboard_rules::{all_bucket_codes, bucket_criteria, DashboardBucket};
use crate::app::scheduling::{local_date, local_midnight};
use crate::app::stage_filter::{stage_criteria, Stage};
use crate::app::status_engine::{derive_flags, is_transition_allowed, WorkflowStatus};
use crate::domain::criteria::{PericiaCriterion, PericiaOrder, PericiaQuery};
use crate::domain::entities::{
    normalize_cnj, CatalogItem, CatalogItemId, CatalogResource, NewActivityLog, NewPericia,
    NewStatusLog, Pericia, PericiaId, PericiaPatch, StatusChange, TenantId,
};
use crate::domain::ports::{
    ActivityLogRepository, CatalogRepository, FinancialRepository, PericiaRepository,
};
use crate::error::{AppError, DomainError};

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
/// Highest page number accepted by paginated listings
pub const MAX_PAGE: u64 = 1_000_000;
/// Most rows a single import may carry
pub const MAX_IMPORT_ROWS: usize = 5_000;
pub const EXPORT_LIMIT: u64 = 1000;
pub const LAUDOS_PENDENTES_LIMIT: u64 = 50;
pub const FILA_AGENDAMENTO_LIMIT: u64 = 500;
pub const CRITICAL_LIMIT: u64 = 5;
pub const IMPORT_ORIGIN: &str = "CSV";
const NO_CITY: &str = "Sem cidade";

/// List filters accepted by `list` and `export`
#[derive(Debug, Clone, Default)]
pub struct PericiaFilter {
    pub status_id: Option<CatalogItemId>,
    pub status_codigo: Option<String>,
    pub cidade_id: Option<CatalogItemId>,
    pub tipo_pericia_id: Option<CatalogItemId>,
    pub vara_id: Option<CatalogItemId>,
    pub valor_min: Option<i64>,
    pub valor_max: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub exported_at: DateTime<Utc>,
    pub total: u64,
    pub rows: Vec<Pericia>,
}

/// Target status plus the dates that usually come with it
#[derive(Debug, Clone)]
pub struct ChangeStatusCommand {
    pub pericia_id: PericiaId,
    pub status_id: CatalogItemId,
    pub motivo: Option<String>,
    pub data_agendamento: Option<DateTime<Utc>>,
    pub hora_agendamento: Option<String>,
    pub data_realizacao: Option<DateTime<Utc>>,
    pub data_envio_laudo: Option<DateTime<Utc>>,
}

/// Compact perícia row used by the dashboard and the views
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PericiaSummary {
    pub id: PericiaId,
    #[serde(rename = "processoCNJ")]
    pub processo_cnj: String,
    pub autor_nome: String,
    pub cidade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_agendamento: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_nomeacao: Option<NaiveDate>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Kpi {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub value: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kpis: Vec<Kpi>,
    pub chart: Vec<ChartPoint>,
    pub critical: Vec<PericiaSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityGroup {
    pub cidade: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    pub items: Vec<PericiaSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NomeacoesView {
    pub total: usize,
    pub groups: Vec<CityGroup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FilaAgendamento {
    pub total: usize,
    pub cities: Vec<CityGroup>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimelineKind {
    Marco,
    Status,
    Atividade,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: TimelineKind,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Validate `1 <= page <= MAX_PAGE` and `1 <= limit <= 100`
pub fn check_page(page: u64, limit: u64) -> Result<(), AppError> {
    if !(1..=MAX_PAGE).contains(&page) {
        return Err(AppError::BadRequest(format!(
            "page deve estar entre 1 e {}",
            MAX_PAGE
        )));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(AppError::BadRequest(format!(
            "limit deve estar entre 1 e {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(())
}

/// Catalog tables a perícia row may point at
const REF_RESOURCES: [CatalogResource; 6] = [
    CatalogResource::Cidades,
    CatalogResource::Varas,
    CatalogResource::TiposPericia,
    CatalogResource::Modalidades,
    CatalogResource::Status,
    CatalogResource::Locais,
];

fn new_refs(p: &NewPericia) -> [(CatalogResource, Option<CatalogItemId>); 6] {
    [
        (CatalogResource::Cidades, p.cidade_id),
        (CatalogResource::Varas, p.vara_id),
        (CatalogResource::TiposPericia, p.tipo_pericia_id),
        (CatalogResource::Modalidades, p.modalidade_id),
        (CatalogResource::Status, p.status_id),
        (CatalogResource::Locais, p.local_id),
    ]
}

fn invalid_ref(resource: CatalogResource, id: &CatalogItemId) -> AppError {
    AppError::BadRequest(format!("Referência inválida em {}: {}", resource, id))
}

fn activity_label(action: &str) -> String {
    match action {
        "URGENTE_MARCADO" => "Marcada como urgente".to_string(),
        "URGENTE_REMOVIDO" => "Urgência removida".to_string(),
        other => other.to_string(),
    }
}

/// Catalog names needed to render summaries
struct Lookups {
    cidades: HashMap<CatalogItemId, CatalogItem>,
    statuses: HashMap<CatalogItemId, CatalogItem>,
}

impl Lookups {
    fn cidade(&self, p: &Pericia) -> Option<&str> {
        p.cidade_id
            .and_then(|id| self.cidades.get(&id))
            .map(|c| c.nome.as_str())
    }

    fn status_code(&self, p: &Pericia) -> Option<&str> {
        p.status_id
            .and_then(|id| self.statuses.get(&id))
            .map(|s| s.codigo.as_str())
    }

    fn summary(&self, p: &Pericia) -> PericiaSummary {
        PericiaSummary {
            id: p.id,
            processo_cnj: p.processo_cnj.clone(),
            autor_nome: p.autor_nome.clone().unwrap_or_default(),
            cidade: self.cidade(p).unwrap_or_default().to_string(),
            data_agendamento: p.data_agendamento,
            data_nomeacao: p.data_nomeacao,
            status: self.status_code(p).unwrap_or_default().to_string(),
        }
    }

    /// Group summaries by city name, cities in name order
    fn group_by_city(&self, pericias: &[Pericia], with_totals: bool) -> Vec<CityGroup> {
        let mut groups: BTreeMap<String, Vec<PericiaSummary>> = BTreeMap::new();
        for p in pericias {
            let key = self.cidade(p).unwrap_or(NO_CITY).to_string();
            groups.entry(key).or_default().push(self.summary(p));
        }
        groups
            .into_iter()
            .map(|(cidade, items)| CityGroup {
                cidade,
                total: with_totals.then_some(items.len()),
                items,
            })
            .collect()
    }
}

/// Service for perícias
pub struct PericiaService<P, C, A, F>
where
    P: PericiaRepository,
    C: CatalogRepository,
    A: ActivityLogRepository,
    F: FinancialRepository,
{
    pericias: Arc<P>,
    catalog: Arc<C>,
    activity: Arc<A>,
    financial: Arc<F>,
    offset: FixedOffset,
}

impl<P, C, A, F> PericiaService<P, C, A, F>
where
    P: PericiaRepository,
    C: CatalogRepository,
    A: ActivityLogRepository,
    F: FinancialRepository,
{
    pub fn new(
        pericias: Arc<P>,
        catalog: Arc<C>,
        activity: Arc<A>,
        financial: Arc<F>,
        offset: FixedOffset,
    ) -> Self {
        Self {
            pericias,
            catalog,
            activity,
            financial,
            offset,
        }
    }

    /// Start of the current local day, in UTC
    fn today(&self) -> DateTime<Utc> {
        local_midnight(local_date(Utc::now(), self.offset), self.offset)
    }

    async fn lookups(&self, tenant: &TenantId) -> Result<Lookups, AppError> {
        let index = |items: Vec<CatalogItem>| -> HashMap<CatalogItemId, CatalogItem> {
            items.into_iter().map(|i| (i.id, i)).collect()
        };
        Ok(Lookups {
            cidades: index(self.catalog.list(tenant, CatalogResource::Cidades).await?),
            statuses: index(self.catalog.list(tenant, CatalogResource::Status).await?),
        })
    }

    /// Every referenced catalog row must belong to the tenant
    async fn check_refs(
        &self,
        tenant: &TenantId,
        refs: [(CatalogResource, Option<CatalogItemId>); 6],
    ) -> Result<(), AppError> {
        for (resource, id) in refs {
            if let Some(id) = id {
                if self.catalog.find_by_id(tenant, resource, &id).await?.is_none() {
                    return Err(invalid_ref(resource, &id));
                }
            }
        }
        Ok(())
    }

    async fn check_new(&self, tenant: &TenantId, p: &NewPericia) -> Result<(), AppError> {
        self.check_refs(tenant, new_refs(p)).await
    }

    /// Ids of every catalog table a new perícia can reference, loaded once
    async fn known_refs(
        &self,
        tenant: &TenantId,
    ) -> Result<HashMap<CatalogResource, HashSet<CatalogItemId>>, AppError> {
        let mut known = HashMap::new();
        for resource in REF_RESOURCES {
            let ids = self
                .catalog
                .list(tenant, resource)
                .await?
                .into_iter()
                .map(|item| item.id)
                .collect();
            known.insert(resource, ids);
        }
        Ok(known)
    }

    async fn check_patch(&self, tenant: &TenantId, p: &PericiaPatch) -> Result<(), AppError> {
        self.check_refs(
            tenant,
            [
                (CatalogResource::Cidades, p.cidade_id),
                (CatalogResource::Varas, p.vara_id),
                (CatalogResource::TiposPericia, p.tipo_pericia_id),
                (CatalogResource::Modalidades, p.modalidade_id),
                (CatalogResource::Status, p.status_id),
                (CatalogResource::Locais, p.local_id),
            ],
        )
        .await
    }

    async fn filter_criteria(
        &self,
        tenant: &TenantId,
        filter: &PericiaFilter,
    ) -> Result<Vec<PericiaCriterion>, AppError> {
        let mut criteria = Vec::new();
        if let Some(id) = filter.status_id {
            criteria.push(PericiaCriterion::StatusIn(vec![id]));
        }
        if let Some(codigo) = &filter.status_codigo {
            let status = self
                .catalog
                .find_by_codigo(tenant, CatalogResource::Status, &codigo.to_uppercase())
                .await?;
            criteria.push(PericiaCriterion::StatusIn(
                status.map(|s| s.id).into_iter().collect(),
            ));
        }
        if let Some(id) = filter.cidade_id {
            criteria.push(PericiaCriterion::Cidade(id));
        }
        if let Some(id) = filter.tipo_pericia_id {
            criteria.push(PericiaCriterion::TipoPericia(id));
        }
        if let Some(id) = filter.vara_id {
            criteria.push(PericiaCriterion::Vara(id));
        }
        if filter.valor_min.is_some() || filter.valor_max.is_some() {
            criteria.push(PericiaCriterion::HonorariosBetween(
                filter.valor_min,
                filter.valor_max,
            ));
        }
        if filter.date_from.is_some() || filter.date_to.is_some() {
            criteria.push(PericiaCriterion::NomeacaoBetween(
                filter.date_from,
                filter.date_to,
            ));
        }
        if let Some(term) = filter.search.as_deref().map(str::trim) {
            if !term.is_empty() {
                criteria.push(PericiaCriterion::Search(term.to_string()));
            }
        }
        Ok(criteria)
    }

    async fn paged(
        &self,
        tenant: &TenantId,
        criteria: Vec<PericiaCriterion>,
        order: PericiaOrder,
        page: u64,
        limit: u64,
    ) -> Result<Page<Pericia>, AppError> {
        check_page(page, limit)?;
        let total = self.pericias.count(tenant, &criteria).await?;
        let items = self
            .pericias
            .query(tenant, &PericiaQuery::new(criteria).order(order).page(page, limit))
            .await?;
        Ok(Page {
            items,
            pagination: Pagination { page, limit, total },
        })
    }

    pub async fn create(&self, tenant: &TenantId, mut new: NewPericia) -> Result<Pericia, AppError> {
        new.processo_cnj = normalize_cnj(&new.processo_cnj)?;
        self.check_new(tenant, &new).await?;

        if self
            .pericias
            .find_by_cnj(tenant, &new.processo_cnj)
            .await?
            .is_some()
        {
            return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                "Perícia {} já cadastrada",
                new.processo_cnj
            ))));
        }

        let created = self.pericias.create(tenant, &new).await?;
        tracing::info!(tenant_id = %tenant, pericia_id = %created.id, cnj = %created.processo_cnj, "Perícia created");
        Ok(created)
    }

    pub async fn list(
        &self,
        tenant: &TenantId,
        filter: &PericiaFilter,
        page: u64,
        limit: u64,
    ) -> Result<Page<Pericia>, AppError> {
        let criteria = self.filter_criteria(tenant, filter).await?;
        self.paged(tenant, criteria, PericiaOrder::CreatedDesc, page, limit)
            .await
    }

    pub async fn get(&self, tenant: &TenantId, id: &PericiaId) -> Result<Pericia, AppError> {
        self.pericias
            .find_by_id(tenant, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Perícia não encontrada.".to_string()))
    }

    pub async fn update(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
        mut patch: PericiaPatch,
    ) -> Result<Pericia, AppError> {
        self.get(tenant, id).await?;

        if let Some(raw) = &patch.processo_cnj {
            let cnj = normalize_cnj(raw)?;
            if let Some(existing) = self.pericias.find_by_cnj(tenant, &cnj).await? {
                if existing.id != *id {
                    return Err(AppError::Domain(DomainError::AlreadyExists(format!(
                        "Perícia {} já cadastrada",
                        cnj
                    ))));
                }
            }
            patch.processo_cnj = Some(cnj);
        }
        if patch.data_agendamento.is_some() && patch.agendada.is_none() {
            patch.agendada = Some(true);
        }
        self.check_patch(tenant, &patch).await?;

        Ok(self.pericias.update(tenant, id, &patch).await?)
    }

    pub async fn delete(&self, tenant: &TenantId, id: &PericiaId) -> Result<(), AppError> {
        self.get(tenant, id).await?;
        self.pericias.delete(tenant, id).await?;
        tracing::info!(tenant_id = %tenant, pericia_id = %id, "Perícia deleted");
        Ok(())
    }

    /// Apply one patch to many perícias; ids of other tenants are ignored
    pub async fn batch_update(
        &self,
        tenant: &TenantId,
        ids: &[PericiaId],
        patch: PericiaPatch,
    ) -> Result<u64, AppError> {
        if ids.is_empty() {
            return Err(AppError::BadRequest("ids não pode ser vazio".to_string()));
        }
        if patch.processo_cnj.is_some() {
            return Err(AppError::BadRequest(
                "processoCNJ não pode ser alterado em lote".to_string(),
            ));
        }
        self.check_patch(tenant, &patch).await?;

        let updated = self.pericias.update_many(tenant, ids, &patch).await?;
        tracing::info!(tenant_id = %tenant, requested = ids.len(), updated, "Perícias batch updated");
        Ok(updated)
    }

    /// Insert every row or none; any invalid row rejects the whole file
    pub async fn import(&self, tenant: &TenantId, rows: Vec<NewPericia>) -> Result<u64, AppError> {
        if rows.is_empty() {
            return Err(AppError::BadRequest("Nenhuma linha para importar".to_string()));
        }
        if rows.len() > MAX_IMPORT_ROWS {
            return Err(AppError::BadRequest(format!(
                "Importação limitada a {} linhas; recebidas {}",
                MAX_IMPORT_ROWS,
                rows.len()
            )));
        }

        let known = self.known_refs(tenant).await?;
        let mut prepared = Vec::with_capacity(rows.len());
        let mut seen = HashSet::new();
        for (index, mut row) in rows.into_iter().enumerate() {
            let line = index + 1;
            row.processo_cnj = normalize_cnj(&row.processo_cnj)
                .map_err(|e| AppError::BadRequest(format!("Linha {}: {}", line, e)))?;
            if !seen.insert(row.processo_cnj.clone()) {
                return Err(AppError::BadRequest(format!(
                    "Linha {}: CNJ {} repetido no arquivo",
                    line, row.processo_cnj
                )));
            }
            let unknown = new_refs(&row).into_iter().find_map(|(resource, id)| {
                id.filter(|id| !known.get(&resource).is_some_and(|ids| ids.contains(id)))
                    .map(|id| (resource, id))
            });
            if let Some((resource, id)) = unknown {
                return Err(AppError::BadRequest(format!(
                    "Linha {}: Referência inválida em {}: {}",
                    line, resource, id
                )));
            }
            row.origem_importacao = Some(IMPORT_ORIGIN.to_string());
            prepared.push(row);
        }

        let imported = self.pericias.create_many(tenant, &prepared).await?;
        tracing::info!(tenant_id = %tenant, imported, "Perícias imported");
        Ok(imported)
    }

    pub async fn export(
        &self,
        tenant: &TenantId,
        filter: &PericiaFilter,
    ) -> Result<ExportResult, AppError> {
        let criteria = self.filter_criteria(tenant, filter).await?;
        let total = self.pericias.count(tenant, &criteria).await?;
        let rows = self
            .pericias
            .query(tenant, &PericiaQuery::new(criteria).limit(EXPORT_LIMIT))
            .await?;
        Ok(ExportResult {
            exported_at: Utc::now(),
            total,
            rows,
        })
    }

    pub async fn change_status(
        &self,
        tenant: &TenantId,
        actor: Option<&str>,
        cmd: ChangeStatusCommand,
    ) -> Result<Pericia, AppError> {
        let current = self.get(tenant, &cmd.pericia_id).await?;

        let target = self
            .catalog
            .find_by_id(tenant, CatalogResource::Status, &cmd.status_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound("Status de destino não encontrado para o tenant.".to_string())
            })?;
        let target_code: WorkflowStatus = target.codigo.parse().map_err(|_| {
            AppError::BadRequest(format!("Status de destino inválido: {}", target.codigo))
        })?;

        let current_code = match current.status_id {
            Some(id) => self
                .catalog
                .find_by_id(tenant, CatalogResource::Status, &id)
                .await?
                .and_then(|s| s.codigo.parse::<WorkflowStatus>().ok()),
            None => None,
        };

        if !is_transition_allowed(current_code, target_code) {
            return Err(AppError::BadRequest(format!(
                "Transição inválida de {} para {}",
                current_code.map_or("SEM_STATUS", |c| c.as_str()),
                target_code
            )));
        }

        let flags = derive_flags(target_code);
        let status_changed = current.status_id.is_some_and(|s| s != target.id);
        let patch = PericiaPatch {
            status_id: Some(target.id),
            agendada: flags.agendada,
            laudo_enviado: flags.laudo_enviado,
            finalizada: flags.finalizada,
            data_agendamento: cmd.data_agendamento,
            hora_agendamento: cmd.hora_agendamento.clone(),
            data_realizacao: cmd.data_realizacao,
            data_envio_laudo: cmd.data_envio_laudo,
            is_urgent: status_changed.then_some(false),
            ..Default::default()
        };

        let mut metadata = serde_json::json!({
            "source": "pericias.changeStatus",
            "currentCodigo": current_code.map(|c| c.as_str()),
            "targetCodigo": target_code.as_str(),
        });
        if let Some(map) = metadata.as_object_mut() {
            if let Some(d) = cmd.data_agendamento {
                map.insert("dataAgendamento".into(), d.to_rfc3339().into());
            }
            if let Some(h) = &cmd.hora_agendamento {
                map.insert("horaAgendamento".into(), h.clone().into());
            }
            if let Some(d) = cmd.data_realizacao {
                map.insert("dataRealizacao".into(), d.to_rfc3339().into());
            }
            if let Some(d) = cmd.data_envio_laudo {
                map.insert("dataEnvioLaudo".into(), d.to_rfc3339().into());
            }
        }

        let change = StatusChange {
            pericia_id: current.id,
            patch,
            log: NewStatusLog {
                status_anterior_id: current.status_id,
                status_novo_id: target.id,
                motivo: cmd.motivo,
                metadata,
                created_by: actor.map(str::to_string),
            },
        };

        let updated = self.pericias.apply_status_change(tenant, &change).await?;
        tracing::info!(
            tenant_id = %tenant,
            pericia_id = %updated.id,
            from = current_code.map_or("SEM_STATUS", |c| c.as_str()),
            to = %target_code,
            "Perícia status changed"
        );
        Ok(updated)
    }

    pub async fn set_urgency(
        &self,
        tenant: &TenantId,
        actor: Option<&str>,
        id: &PericiaId,
        is_urgent: bool,
    ) -> Result<Pericia, AppError> {
        let current = self.get(tenant, id).await?;
        let status_codigo = match current.status_id {
            Some(sid) => self
                .catalog
                .find_by_id(tenant, CatalogResource::Status, &sid)
                .await?
                .map(|s| s.codigo),
            None => None,
        };

        let patch = PericiaPatch {
            is_urgent: Some(is_urgent),
            urgent_checked_at: Some(Utc::now()),
            ..Default::default()
        };
        let updated = self.pericias.update(tenant, id, &patch).await?;

        self.activity
            .record(
                tenant,
                &NewActivityLog {
                    entity_type: "PERICIA".to_string(),
                    entity_id: id.0,
                    action: if is_urgent {
                        "URGENTE_MARCADO"
                    } else {
                        "URGENTE_REMOVIDO"
                    }
                    .to_string(),
                    payload: serde_json::json!({
                        "source": "pericias.setUrgencia",
                        "statusId": current.status_id,
                        "statusCodigo": status_codigo,
                    }),
                    created_by: actor.map(str::to_string),
                },
            )
            .await?;

        Ok(updated)
    }

    pub async fn timeline(
        &self,
        tenant: &TenantId,
        id: &PericiaId,
    ) -> Result<Vec<TimelineEntry>, AppError> {
        let pericia = self.get(tenant, id).await?;
        let statuses: HashMap<CatalogItemId, String> = self
            .catalog
            .list(tenant, CatalogResource::Status)
            .await?
            .into_iter()
            .map(|s| (s.id, s.nome))
            .collect();

        let marco = |date: DateTime<Utc>, event: &str| TimelineEntry {
            date,
            kind: TimelineKind::Marco,
            event: event.to_string(),
            description: None,
            from_status: None,
            to_status: None,
            created_by: None,
        };

        let mut entries = Vec::new();
        if let Some(d) = pericia.data_nomeacao {
            entries.push(marco(local_midnight(d, self.offset), "Data de Nomeação"));
        }
        if let Some(d) = pericia.data_agendamento {
            entries.push(marco(d, "Data de Agendamento"));
        }
        if let Some(d) = pericia.data_realizacao {
            entries.push(marco(d, "Data de Realização"));
        }
        if let Some(d) = pericia.data_envio_laudo {
            entries.push(marco(d, "Data de Envio do Laudo"));
        }

        for log in self.pericias.status_logs(tenant, id).await? {
            let novo = statuses
                .get(&log.status_novo_id)
                .cloned()
                .unwrap_or_else(|| log.status_novo_id.to_string());
            entries.push(TimelineEntry {
                date: log.created_at,
                kind: TimelineKind::Status,
                event: format!("Status alterado para {}", novo),
                description: log.motivo,
                from_status: log
                    .status_anterior_id
                    .and_then(|s| statuses.get(&s).cloned()),
                to_status: Some(novo),
                created_by: log.created_by,
            });
        }

        for entry in self.activity.list_for_entity(tenant, &id.0).await? {
            entries.push(TimelineEntry {
                date: entry.created_at,
                kind: TimelineKind::Atividade,
                event: activity_label(&entry.action),
                description: None,
                from_status: None,
                to_status: None,
                created_by: entry.created_by,
            });
        }

        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    async fn bucket_status_ids(
        &self,
        tenant: &TenantId,
    ) -> Result<HashMap<String, CatalogItemId>, AppError> {
        Ok(self
            .catalog
            .find_status_ids_by_codes(tenant, &all_bucket_codes())
            .await?)
    }

    pub async fn dashboard(&self, tenant: &TenantId) -> Result<Dashboard, AppError> {
        let status_ids = self.bucket_status_ids(tenant).await?;
        let today = self.today();

        let mut kpis = Vec::with_capacity(DashboardBucket::ALL.len() + 1);
        let mut chart = Vec::with_capacity(DashboardBucket::ALL.len());
        for bucket in DashboardBucket::ALL {
            let count = self
                .pericias
                .count(tenant, &bucket_criteria(bucket, &status_ids, today))
                .await?;
            kpis.push(Kpi {
                key: bucket.key().to_string(),
                label: bucket.label().to_string(),
                value: count.to_string(),
            });
            chart.push(ChartPoint {
                name: bucket.label().to_string(),
                value: count,
            });
        }

        let total = self.pericias.count(tenant, &[]).await?;
        kpis.push(Kpi {
            key: "total".to_string(),
            label: "Total de Perícias".to_string(),
            value: total.to_string(),
        });

        let lookups = self.lookups(tenant).await?;
        let critical = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(vec![PericiaCriterion::Urgent(true)]).limit(CRITICAL_LIMIT),
            )
            .await?
            .iter()
            .map(|p| lookups.summary(p))
            .collect();

        Ok(Dashboard {
            kpis,
            chart,
            critical,
        })
    }

    pub async fn bucket(
        &self,
        tenant: &TenantId,
        bucket: DashboardBucket,
        page: u64,
        limit: u64,
    ) -> Result<Page<Pericia>, AppError> {
        let status_ids = self.bucket_status_ids(tenant).await?;
        let order = if bucket == DashboardBucket::ProximasPericias {
            PericiaOrder::ScheduledAsc
        } else {
            PericiaOrder::CreatedDesc
        };
        self.paged(
            tenant,
            bucket_criteria(bucket, &status_ids, self.today()),
            order,
            page,
            limit,
        )
        .await
    }

    async fn stage_status_ids(
        &self,
        tenant: &TenantId,
        stage: Stage,
    ) -> Result<HashMap<String, CatalogItemId>, AppError> {
        let codes: Vec<&str> = stage.status_codes().iter().map(|c| c.as_str()).collect();
        Ok(self.catalog.find_status_ids_by_codes(tenant, &codes).await?)
    }

    pub async fn stage(
        &self,
        tenant: &TenantId,
        stage: Stage,
        page: u64,
        limit: u64,
    ) -> Result<Page<Pericia>, AppError> {
        let ids = self.stage_status_ids(tenant, stage).await?;
        let order = match stage {
            Stage::Nomeacoes => PericiaOrder::NomeacaoDesc,
            Stage::ProximasPericias => PericiaOrder::ScheduledAsc,
            Stage::AgendarData | Stage::EnviarLaudos => PericiaOrder::CreatedDesc,
        };
        self.paged(tenant, stage_criteria(stage, &ids), order, page, limit)
            .await
    }

    pub async fn nomeacoes(
        &self,
        tenant: &TenantId,
        page: u64,
        limit: u64,
    ) -> Result<NomeacoesView, AppError> {
        check_page(page, limit)?;
        let ids = self.stage_status_ids(tenant, Stage::Nomeacoes).await?;
        let items = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(stage_criteria(Stage::Nomeacoes, &ids))
                    .order(PericiaOrder::NomeacaoDesc)
                    .page(page, limit),
            )
            .await?;

        let lookups = self.lookups(tenant).await?;
        Ok(NomeacoesView {
            total: items.len(),
            groups: lookups.group_by_city(&items, false),
        })
    }

    pub async fn fila_agendamento(&self, tenant: &TenantId) -> Result<FilaAgendamento, AppError> {
        let ids = self.stage_status_ids(tenant, Stage::AgendarData).await?;
        let items = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(stage_criteria(Stage::AgendarData, &ids))
                    .order(PericiaOrder::NomeacaoDesc)
                    .limit(FILA_AGENDAMENTO_LIMIT),
            )
            .await?;

        let lookups = self.lookups(tenant).await?;
        Ok(FilaAgendamento {
            total: items.len(),
            cities: lookups.group_by_city(&items, true),
        })
    }

    pub async fn pericias_hoje(&self, tenant: &TenantId) -> Result<Vec<PericiaSummary>, AppError> {
        let start = self.today();
        let end = start + Duration::days(1) - Duration::milliseconds(1);
        let items = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(vec![PericiaCriterion::ScheduledBetween(start, end)])
                    .order(PericiaOrder::ScheduledAsc),
            )
            .await?;

        let lookups = self.lookups(tenant).await?;
        Ok(items.iter().map(|p| lookups.summary(p)).collect())
    }

    pub async fn laudos_pendentes(
        &self,
        tenant: &TenantId,
    ) -> Result<Vec<PericiaSummary>, AppError> {
        let items = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(vec![
                    PericiaCriterion::Agendada(true),
                    PericiaCriterion::LaudoEnviado(false),
                    PericiaCriterion::Finalizada(false),
                ])
                .order(PericiaOrder::ScheduledAsc)
                .limit(LAUDOS_PENDENTES_LIMIT),
            )
            .await?;

        let lookups = self.lookups(tenant).await?;
        Ok(items.iter().map(|p| lookups.summary(p)).collect())
    }

    async fn received_by_pericia(
        &self,
        tenant: &TenantId,
    ) -> Result<HashMap<PericiaId, i64>, AppError> {
        let mut received = HashMap::new();
        for r in self.financial.list_receipts(tenant, None).await? {
            if let Some(pid) = r.pericia_id {
                *received.entry(pid).or_insert(0) += r.effective_value();
            }
        }
        Ok(received)
    }

    pub async fn city_overview(
        &self,
        tenant: &TenantId,
        cidade_id: &CatalogItemId,
    ) -> Result<CityOverview, AppError> {
        let cidade = self
            .catalog
            .find_by_id(tenant, CatalogResource::Cidades, cidade_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cidade não encontrada.".to_string()))?;

        let pericias = self
            .pericias
            .query(
                tenant,
                &PericiaQuery::new(vec![PericiaCriterion::Cidade(*cidade_id)]),
            )
            .await?;
        let received = self.received_by_pericia(tenant).await?;
        let recebido = pericias
            .iter()
            .filter_map(|p| received.get(&p.id))
            .sum();

        Ok(build_city_overview(&cidade, &pericias, recebido))
    }

    pub async fn city_overview_list(&self, tenant: &TenantId) -> Result<Vec<CityOverview>, AppError> {
        let mut cidades = self.catalog.list(tenant, CatalogResource::Cidades).await?;
        cidades.sort_by(|a, b| a.nome.cmp(&b.nome));

        let all = self.pericias.query(tenant, &PericiaQuery::default()).await?;
        let received = self.received_by_pericia(tenant).await?;

        let mut by_city: HashMap<CatalogItemId, Vec<Pericia>> = HashMap::new();
        for p in all {
            if let Some(cid) = p.cidade_id {
                by_city.entry(cid).or_default().push(p);
            }
        }

        Ok(cidades
            .iter()
            .map(|cidade| {
                let pericias = by_city.remove(&cidade.id).unwrap_or_default();
                let recebido = pericias
                    .iter()
                    .filter_map(|p| received.get(&p.id))
                    .sum();
                build_city_overview(cidade, &pericias, recebido)
            })
            .collect())
    }
}
