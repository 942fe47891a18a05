//! Test fixtures
//!
//! Factory functions for creating test data with sensible defaults.
//! Each fixture function creates a valid entity that can be customized.

use chrono::{NaiveDate, Utc};

use crate::domain::entities::{
    AgendaEvent, AgendaEventId, CatalogItem, CatalogItemId, CatalogResource, EventSource,
    EventStatus, EventType, Laudo, LaudoId, LaudoStatus, Lawyer, LawyerId, NewPericia,
    PagamentoStatus, Pericia, PericiaId, Tenant, TenantId,
};

pub const TEST_CNJ: &str = "0001234-56.2024.8.26.0100";

/// Create an active test tenant
pub fn test_tenant() -> Tenant {
    Tenant {
        id: TenantId::new(),
        nome: "Consultório Teste".to_string(),
        ativo: true,
        created_at: Utc::now(),
    }
}

/// Create a catalog item of `resource` with the given code
pub fn test_catalog_item(tenant: TenantId, resource: CatalogResource, codigo: &str) -> CatalogItem {
    let now = Utc::now();
    CatalogItem {
        id: CatalogItemId::new(),
        tenant_id: tenant,
        resource,
        codigo: codigo.to_string(),
        nome: codigo.replace('_', " ").to_lowercase(),
        uf: None,
        cidade_id: None,
        tribunal_id: None,
        endereco: None,
        cor: None,
        ordem: 0,
        ativo: true,
        created_at: now,
        updated_at: now,
    }
}

/// Create a status catalog item
pub fn test_status(tenant: TenantId, codigo: &str) -> CatalogItem {
    test_catalog_item(tenant, CatalogResource::Status, codigo)
}

/// Create a fresh, unscheduled perícia
pub fn test_pericia(tenant: TenantId) -> Pericia {
    let now = Utc::now();
    Pericia {
        id: PericiaId::new(),
        tenant_id: tenant,
        processo_cnj: TEST_CNJ.to_string(),
        cidade_id: None,
        vara_id: None,
        tipo_pericia_id: None,
        modalidade_id: None,
        status_id: None,
        local_id: None,
        juiz_nome: None,
        autor_nome: Some("Maria Autora".to_string()),
        reu_nome: Some("INSS".to_string()),
        periciado_nome: Some("Maria Autora".to_string()),
        observacoes: None,
        extra_observation: None,
        honorarios_previstos_jg: None,
        honorarios_previstos_partes: None,
        pagamento_status: PagamentoStatus::Pendente,
        is_urgent: false,
        urgent_checked_at: None,
        agendada: false,
        laudo_enviado: false,
        finalizada: false,
        data_nomeacao: NaiveDate::from_ymd_opt(2025, 3, 3),
        data_agendamento: None,
        hora_agendamento: None,
        data_realizacao: None,
        data_envio_laudo: None,
        origem_importacao: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create a perícia with a specific status and CNJ
pub fn test_pericia_with(tenant: TenantId, cnj: &str, status: Option<CatalogItemId>) -> Pericia {
    Pericia {
        processo_cnj: cnj.to_string(),
        status_id: status,
        ..test_pericia(tenant)
    }
}

/// Create-payload for a perícia with the given CNJ
pub fn new_pericia(cnj: &str) -> NewPericia {
    NewPericia {
        processo_cnj: cnj.to_string(),
        autor_nome: Some("João Autor".to_string()),
        ..Default::default()
    }
}

/// Create a one-hour manual agenda event starting now
pub fn test_event(tenant: TenantId) -> AgendaEvent {
    let now = Utc::now();
    AgendaEvent {
        id: AgendaEventId::new(),
        tenant_id: tenant,
        title: "Perícia".to_string(),
        description: None,
        event_type: EventType::Pericia,
        status: EventStatus::Agendada,
        source: EventSource::Manual,
        ai_suggested: false,
        start_at: now,
        end_at: Some(now + chrono::Duration::hours(1)),
        location: None,
        pericia_id: None,
        cnj_id: None,
        city_id: None,
        city: None,
        status_history: Vec::new(),
        metadata: serde_json::json!({}),
        created_at: now,
        updated_at: now,
    }
}

/// Create a test lawyer
pub fn test_lawyer(tenant: TenantId, nome: &str) -> Lawyer {
    let now = Utc::now();
    Lawyer {
        id: LawyerId::new(),
        tenant_id: tenant,
        nome: nome.to_string(),
        oab: Some("123456".to_string()),
        uf_oab: Some("SP".to_string()),
        email: None,
        telefone: None,
        observacoes: None,
        created_at: now,
        updated_at: now,
    }
}

/// Create an empty laudo draft for a perícia
pub fn test_laudo(tenant: TenantId, pericia_id: PericiaId) -> Laudo {
    let now = Utc::now();
    Laudo {
        id: LaudoId::new(),
        tenant_id: tenant,
        pericia_id,
        title: "Laudo pericial".to_string(),
        status: LaudoStatus::NotStarted,
        content: None,
        sections: serde_json::json!([]),
        created_at: now,
        updated_at: now,
    }
}
