//! Per-city overview
//!
//! Summarises the perícias of one city into workflow buckets and a few
//! headline metrics for the city cards of the dashboard.

use serde::Serialize;

use crate::domain::entities::{CatalogItem, CatalogItemId, PagamentoStatus, Pericia};

/// How many CNJ numbers each bucket lists
pub const BUCKET_PREVIEW: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct CityRef {
    pub id: CatalogItemId,
    pub nome: String,
    pub uf: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityMetrics {
    /// Share of finalized perícias, 0..=100
    pub score: i64,
    pub total_pericias: usize,
    /// Sum of expected JG fees, in centavos
    pub a_receber_total: i64,
    pub atraso_critico: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityBucket {
    pub total: usize,
    pub cnjs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recebido: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FinalizedBucket {
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityBuckets {
    pub avaliar: CityBucket,
    pub agendar: CityBucket,
    pub laudos: CityBucket,
    pub esclarecimentos: CityBucket,
    pub pagamento: CityBucket,
    pub criticos: CityBucket,
    pub finalizada: FinalizedBucket,
}

#[derive(Debug, Clone, Serialize)]
pub struct CityOverview {
    pub cidade: CityRef,
    pub metrics: CityMetrics,
    pub buckets: CityBuckets,
}

fn bucket<'a>(items: impl Iterator<Item = &'a Pericia>) -> CityBucket {
    let matched: Vec<&Pericia> = items.collect();
    CityBucket {
        total: matched.len(),
        cnjs: matched
            .iter()
            .take(BUCKET_PREVIEW)
            .map(|p| p.processo_cnj.clone())
            .collect(),
        recebido: None,
    }
}

/// Build the overview of `cidade` from its perícias (newest first) and
/// the total already received for them, in centavos.
pub fn build_city_overview(cidade: &CatalogItem, pericias: &[Pericia], recebido: i64) -> CityOverview {
    let is_critical =
        |p: &Pericia| p.pagamento_status == PagamentoStatus::Atrasado || p.is_urgent;

    let finalized = pericias.iter().filter(|p| p.finalizada).count();
    let criticos = bucket(pericias.iter().filter(|p| is_critical(p)));
    let mut pagamento = bucket(
        pericias
            .iter()
            .filter(|p| p.pagamento_status == PagamentoStatus::Pendente),
    );
    pagamento.recebido = Some(recebido);

    let score = if pericias.is_empty() {
        0
    } else {
        (finalized as f64 / pericias.len() as f64 * 100.0).round() as i64
    };

    CityOverview {
        cidade: CityRef {
            id: cidade.id,
            nome: cidade.nome.clone(),
            uf: cidade.uf.clone(),
        },
        metrics: CityMetrics {
            score,
            total_pericias: pericias.len(),
            a_receber_total: pericias
                .iter()
                .filter_map(|p| p.honorarios_previstos_jg)
                .sum(),
            atraso_critico: criticos.total,
        },
        buckets: CityBuckets {
            avaliar: bucket(pericias.iter().filter(|p| !p.agendada && !p.finalizada)),
            agendar: bucket(pericias.iter().filter(|p| p.agendada && !p.laudo_enviado)),
            laudos: bucket(
                pericias
                    .iter()
                    .filter(|p| p.agendada && !p.laudo_enviado && !p.finalizada),
            ),
            esclarecimentos: bucket(
                pericias
                    .iter()
                    .filter(|p| p.extra_observation.as_deref().is_some_and(|s| !s.is_empty())),
            ),
            pagamento,
            criticos,
            finalizada: FinalizedBucket { total: finalized },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CatalogResource, TenantId};
    use crate::test_utils::{test_catalog_item, test_pericia};

    #[test]
    fn empty_city_scores_zero() {
        let tenant = TenantId::new();
        let cidade = test_catalog_item(tenant, CatalogResource::Cidades, "CPS");
        let overview = build_city_overview(&cidade, &[], 0);

        assert_eq!(overview.metrics.score, 0);
        assert_eq!(overview.metrics.total_pericias, 0);
        assert_eq!(overview.buckets.pagamento.recebido, Some(0));
    }

    #[test]
    fn buckets_and_metrics() {
        let tenant = TenantId::new();
        let cidade = test_catalog_item(tenant, CatalogResource::Cidades, "CPS");

        let mut novo = test_pericia(tenant);
        novo.honorarios_previstos_jg = Some(50_000);

        let mut agendado = test_pericia(tenant);
        agendado.agendada = true;
        agendado.is_urgent = true;
        agendado.honorarios_previstos_jg = Some(30_000);

        let mut encerrado = test_pericia(tenant);
        encerrado.agendada = true;
        encerrado.laudo_enviado = true;
        encerrado.finalizada = true;
        encerrado.pagamento_status = PagamentoStatus::Atrasado;
        encerrado.extra_observation = Some("quesitos complementares".into());

        let overview =
            build_city_overview(&cidade, &[novo, agendado, encerrado], 12_345);

        assert_eq!(overview.metrics.total_pericias, 3);
        assert_eq!(overview.metrics.score, 33);
        assert_eq!(overview.metrics.a_receber_total, 80_000);
        assert_eq!(overview.metrics.atraso_critico, 2);
        assert_eq!(overview.buckets.avaliar.total, 1);
        assert_eq!(overview.buckets.agendar.total, 1);
        assert_eq!(overview.buckets.laudos.total, 1);
        assert_eq!(overview.buckets.esclarecimentos.total, 1);
        assert_eq!(overview.buckets.pagamento.total, 2);
        assert_eq!(overview.buckets.pagamento.recebido, Some(12_345));
        assert_eq!(overview.buckets.finalizada.total, 1);
    }

    #[test]
    fn bucket_lists_at_most_twenty_cnjs() {
        let tenant = TenantId::new();
        let cidade = test_catalog_item(tenant, CatalogResource::Cidades, "CPS");
        let pericias: Vec<Pericia> = (0..25).map(|_| test_pericia(tenant)).collect();

        let overview = build_city_overview(&cidade, &pericias, 0);
        assert_eq!(overview.buckets.avaliar.total, 25);
        assert_eq!(overview.buckets.avaliar.cnjs.len(), BUCKET_PREVIEW);
    }
}
