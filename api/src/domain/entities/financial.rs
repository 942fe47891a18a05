//! Financial domain entities
//!
//! Receipts (recebimentos) and expenses (despesas) are stored in centavos.
//! Bank statement imports are tracked as `ImportBatch`es; lines that could
//! not be matched to a perícia wait as `UnmatchedPayment`s for manual
//! reconciliation.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::{PericiaId, TenantId};

entity_id!(
    /// Unique identifier for a receipt
    RecebimentoId
);

entity_id!(
    /// Unique identifier for an expense
    DespesaId
);

entity_id!(
    /// Unique identifier for an import batch
    ImportBatchId
);

entity_id!(
    /// Unique identifier for an unmatched payment line
    UnmatchedPaymentId
);

wire_enum!(
    /// Who paid
    FontePagamento {
        Tj => "TJ",
        ParteAutora => "PARTE_AUTORA",
        ParteRe => "PARTE_RE",
        Seguradora => "SEGURADORA",
        Outro => "OUTRO",
    } default Outro
);

wire_enum!(
    ImportStatus {
        Processing => "PROCESSING",
        Done => "DONE",
    } default Processing
);

wire_enum!(
    MatchStatus {
        Unmatched => "UNMATCHED",
        Matched => "MATCHED",
    } default Unmatched
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recebimento {
    pub id: RecebimentoId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    /// `None` for revenue not linked to any perícia
    pub pericia_id: Option<PericiaId>,
    pub fonte_pagamento: FontePagamento,
    pub data_recebimento: NaiveDate,
    pub valor_bruto: i64,
    pub valor_liquido: Option<i64>,
    pub descricao: Option<String>,
    pub import_batch_id: Option<ImportBatchId>,
    pub created_at: DateTime<Utc>,
}

impl Recebimento {
    /// Net amount when known, gross otherwise
    pub fn effective_value(&self) -> i64 {
        self.valor_liquido.unwrap_or(self.valor_bruto)
    }
}

#[derive(Debug, Clone)]
pub struct NewRecebimento {
    pub pericia_id: Option<PericiaId>,
    pub fonte_pagamento: FontePagamento,
    pub data_recebimento: NaiveDate,
    pub valor_bruto: i64,
    pub valor_liquido: Option<i64>,
    pub descricao: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Despesa {
    pub id: DespesaId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub categoria: String,
    pub descricao: Option<String>,
    pub valor: i64,
    pub data_competencia: NaiveDate,
    pub pericia_id: Option<PericiaId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewDespesa {
    pub categoria: String,
    pub descricao: Option<String>,
    pub valor: i64,
    pub data_competencia: NaiveDate,
    pub pericia_id: Option<PericiaId>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportBatch {
    pub id: ImportBatchId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub source_file_name: Option<String>,
    pub total_records: i32,
    pub matched_records: i32,
    pub unmatched_records: i32,
    pub status: ImportStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedPayment {
    pub id: UnmatchedPaymentId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub import_batch_id: ImportBatchId,
    pub valor: i64,
    pub data_pagamento: Option<NaiveDate>,
    pub descricao: Option<String>,
    /// CNJ text found on the statement line, if any
    pub cnj_hint: Option<String>,
    pub match_status: MatchStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUnmatchedPayment {
    pub valor: i64,
    pub data_pagamento: Option<NaiveDate>,
    pub descricao: Option<String>,
    pub cnj_hint: Option<String>,
}
