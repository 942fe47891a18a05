//! End-to-end service flows against the in-memory repositories
//!
//! Each test wires real services to the mocks and walks one workflow:
//! 1. Status workflow: create, move through statuses, read timeline and dashboard
//! 2. Batch scheduling: preview a lote, confirm it, get rejected on repeat
//! 3. Financial import: match by CNJ, reconcile leftovers, read analytics
//! 4. Tenant isolation across services
//!
//! Run with: cargo test integration_tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};

    use crate::app::agenda_service::{BatchItem, BatchMetadata};
    use crate::app::financial_service::ImportRow;
    use crate::app::pericia_service::{ChangeStatusCommand, PericiaFilter, TimelineKind};
    use crate::app::scheduling::{ConflictKind, LotParams};
    use crate::app::{AgendaService, FinancialService, PericiaService};
    use crate::domain::entities::{
        CatalogItem, FontePagamento, NewDespesa, PericiaId, TenantId,
    };
    use crate::error::AppError;
    use crate::test_utils::{
        new_pericia, test_pericia_with, test_status, InMemoryActivityLogRepository,
        InMemoryAgendaRepository, InMemoryCatalogRepository, InMemoryFinancialRepository,
        InMemoryPericiaRepository, TEST_CNJ,
    };

    type Pericias = PericiaService<
        InMemoryPericiaRepository,
        InMemoryCatalogRepository,
        InMemoryActivityLogRepository,
        InMemoryFinancialRepository,
    >;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn pericia_service(catalog: InMemoryCatalogRepository) -> Pericias {
        PericiaService::new(
            Arc::new(InMemoryPericiaRepository::new()),
            Arc::new(catalog),
            Arc::new(InMemoryActivityLogRepository::new()),
            Arc::new(InMemoryFinancialRepository::new()),
            offset(),
        )
    }

    fn status_cmd(pericia_id: PericiaId, status: &CatalogItem) -> ChangeStatusCommand {
        ChangeStatusCommand {
            pericia_id,
            status_id: status.id,
            motivo: None,
            data_agendamento: None,
            hora_agendamento: None,
            data_realizacao: None,
            data_envio_laudo: None,
        }
    }

    #[tokio::test]
    async fn status_workflow_flow() {
        let tenant = TenantId::new();
        let nova = test_status(tenant, "NOVA_NOMEACAO");
        let agendar = test_status(tenant, "AGENDAR_DATA");
        let agendada = test_status(tenant, "DATA_AGENDADA");
        let finalizada = test_status(tenant, "FINALIZADA");
        let catalog = InMemoryCatalogRepository::new()
            .with_item(nova.clone())
            .with_item(agendar.clone())
            .with_item(agendada.clone())
            .with_item(finalizada.clone());
        let service = pericia_service(catalog);

        let mut new = new_pericia(TEST_CNJ);
        new.status_id = Some(nova.id);
        let pericia = service.create(&tenant, new).await.unwrap();

        // Same CNJ twice is refused
        assert!(service.create(&tenant, new_pericia(TEST_CNJ)).await.is_err());

        let moved = service
            .change_status(&tenant, Some("perito"), status_cmd(pericia.id, &agendar))
            .await
            .unwrap();
        assert_eq!(moved.status_id, Some(agendar.id));
        assert!(!moved.agendada);

        let dashboard = service.dashboard(&tenant).await.unwrap();
        let agendar_kpi = dashboard
            .kpis
            .iter()
            .find(|k| k.key == "agendarData")
            .unwrap();
        assert_eq!(agendar_kpi.value, "1");
        assert_eq!(dashboard.kpis.last().unwrap().value, "1");

        // AGENDAR_DATA cannot jump straight to FINALIZADA
        let err = service
            .change_status(&tenant, None, status_cmd(pericia.id, &finalizada))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        service
            .set_urgency(&tenant, Some("perito"), &pericia.id, true)
            .await
            .unwrap();

        let scheduled_at = Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap();
        let scheduled = service
            .change_status(
                &tenant,
                Some("perito"),
                ChangeStatusCommand {
                    data_agendamento: Some(scheduled_at),
                    hora_agendamento: Some("09:00".to_string()),
                    motivo: Some("Data definida pela vara".to_string()),
                    ..status_cmd(pericia.id, &agendada)
                },
            )
            .await
            .unwrap();
        assert!(scheduled.agendada);
        assert!(!scheduled.is_urgent);
        assert_eq!(scheduled.data_agendamento, Some(scheduled_at));

        let timeline = service.timeline(&tenant, &pericia.id).await.unwrap();
        let status_entries: Vec<_> = timeline
            .iter()
            .filter(|e| e.kind == TimelineKind::Status)
            .collect();
        assert_eq!(status_entries.len(), 2);
        assert!(timeline
            .iter()
            .any(|e| e.kind == TimelineKind::Marco && e.event == "Data de Agendamento"));
        assert!(timeline.iter().any(|e| e.kind == TimelineKind::Atividade));
        assert!(timeline.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn batch_scheduling_flow() {
        let tenant = TenantId::new();
        let first = test_pericia_with(tenant, "0000001-11.2024.8.26.0100", None);
        let second = test_pericia_with(tenant, "0000002-22.2024.8.26.0100", None);
        let pericias = InMemoryPericiaRepository::new()
            .with_pericia(first.clone())
            .with_pericia(second.clone());
        let agenda = Arc::new(InMemoryAgendaRepository::new());
        let service = AgendaService::new(
            agenda.clone(),
            Arc::new(pericias),
            Arc::new(InMemoryCatalogRepository::new()),
            offset(),
        );

        let params = LotParams {
            date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            duration_minutes: 30,
            interval_minutes: 10,
        };
        let preview = service
            .preview_batch(&tenant, &params, &[first.id, second.id])
            .await
            .unwrap();
        assert!(preview.valid);
        assert_eq!(preview.items.len(), 2);
        assert_eq!(
            preview.items[1].start_at - preview.items[0].start_at,
            Duration::minutes(40)
        );
        assert_eq!(agenda.event_count(), 0);

        let items: Vec<BatchItem> = preview
            .items
            .iter()
            .map(|slot| BatchItem {
                pericia_id: slot.pericia_id,
                cnj_id: slot.processo_cnj.clone(),
                start_at: slot.start_at,
                end_at: Some(slot.end_at),
                ..Default::default()
            })
            .collect();
        let metadata = BatchMetadata {
            date: Some(params.date),
            location: Some("Fórum Central".to_string()),
            ..Default::default()
        };

        let created = service
            .schedule_batch(&tenant, items.clone(), metadata.clone())
            .await
            .unwrap();
        assert_eq!(created.created, 2);
        assert_eq!(agenda.event_count(), 2);
        assert_eq!(agenda.batch_count(), 1);

        let err = service
            .schedule_batch(&tenant, items, metadata)
            .await
            .unwrap_err();
        match err {
            AppError::Conflict { items, .. } => assert!(!items.is_empty()),
            other => panic!("expected conflict, got {:?}", other),
        }
        assert_eq!(agenda.event_count(), 2);
        assert_eq!(agenda.batch_count(), 1);

        let again = service
            .preview_batch(&tenant, &params, &[first.id])
            .await
            .unwrap();
        assert!(!again.valid);
        assert!(again
            .conflicts
            .iter()
            .any(|c| c.kind == ConflictKind::AlreadyScheduled));
    }

    #[tokio::test]
    async fn financial_import_flow() {
        let tenant = TenantId::new();
        let pericia = test_pericia_with(tenant, TEST_CNJ, None);
        let service = FinancialService::new(
            Arc::new(InMemoryFinancialRepository::new()),
            Arc::new(InMemoryPericiaRepository::new().with_pericia(pericia.clone())),
            Arc::new(InMemoryCatalogRepository::new()),
            offset(),
        );

        let date = NaiveDate::from_ymd_opt(2025, 2, 14).unwrap();
        let rows = vec![
            ImportRow {
                pericia_id: None,
                cnj: Some("00012345620248260100".to_string()),
                fonte_pagamento: FontePagamento::Tj,
                data_recebimento: date,
                valor_bruto: 100_000,
                valor_liquido: Some(90_000),
                descricao: Some("Honorários".to_string()),
            },
            ImportRow {
                pericia_id: None,
                cnj: Some("9999999-99.2024.8.26.0100".to_string()),
                fonte_pagamento: FontePagamento::Outro,
                data_recebimento: date,
                valor_bruto: 5_000,
                valor_liquido: None,
                descricao: None,
            },
        ];
        let summary = service
            .import_batch(&tenant, rows, Some("extrato.csv"))
            .await
            .unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.unmatched, 1);

        let receipts = service
            .list_receipts(&tenant, Some(&pericia.id))
            .await
            .unwrap();
        assert_eq!(receipts.len(), 1);

        let pending = service.unmatched(&tenant).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].valor, 5_000);

        let ids: Vec<_> = pending.iter().map(|u| u.id).collect();
        let reconciled = service
            .reconcile(&tenant, &ids, Some("Depósito identificado"))
            .await
            .unwrap();
        assert_eq!(reconciled.reconciled, 1);
        assert!(service.unmatched(&tenant).await.unwrap().is_empty());

        service
            .create_expense(
                &tenant,
                NewDespesa {
                    categoria: "Deslocamento".to_string(),
                    descricao: None,
                    valor: 20_000,
                    data_competencia: date,
                    pericia_id: Some(pericia.id),
                },
            )
            .await
            .unwrap();

        let analytics = service.analytics(&tenant).await.unwrap();
        assert_eq!(analytics.totals.recebido, 90_000);
        assert_eq!(analytics.totals.despesas, 20_000);
        assert_eq!(analytics.totals.resultado, 70_000);
    }

    #[tokio::test]
    async fn tenants_do_not_see_each_other() {
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let service = pericia_service(InMemoryCatalogRepository::new());

        let pericia = service
            .create(&tenant_a, new_pericia(TEST_CNJ))
            .await
            .unwrap();

        let err = service.get(&tenant_b, &pericia.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let page = service
            .list(&tenant_b, &PericiaFilter::default(), 1, 20)
            .await
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.pagination.total, 0);

        // CNJ uniqueness is per tenant
        let other = service
            .create(&tenant_b, new_pericia(TEST_CNJ))
            .await
            .unwrap();
        assert_ne!(other.id, pericia.id);

        let err = service.delete(&tenant_b, &pericia.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(service.get(&tenant_a, &pericia.id).await.is_ok());
    }
}
