//! Catalog (configuration) entities
//!
//! Tenant-owned lookup tables: cities, courts, exam types, modalities,
//! workflow statuses, places and tribunals. They share one shape and are
//! distinguished by `CatalogResource`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TenantId;

entity_id!(
    /// Unique identifier for a catalog item
    CatalogItemId
);

/// Which lookup table an item belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CatalogResource {
    Cidades,
    Varas,
    TiposPericia,
    Modalidades,
    Status,
    Locais,
    Tribunais,
}

impl CatalogResource {
    pub const ALL: [CatalogResource; 7] = [
        CatalogResource::Cidades,
        CatalogResource::Varas,
        CatalogResource::TiposPericia,
        CatalogResource::Modalidades,
        CatalogResource::Status,
        CatalogResource::Locais,
        CatalogResource::Tribunais,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogResource::Cidades => "cidades",
            CatalogResource::Varas => "varas",
            CatalogResource::TiposPericia => "tipos-pericia",
            CatalogResource::Modalidades => "modalidades",
            CatalogResource::Status => "status",
            CatalogResource::Locais => "locais",
            CatalogResource::Tribunais => "tribunais",
        }
    }
}

impl std::fmt::Display for CatalogResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CatalogResource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CatalogResource::ALL
            .into_iter()
            .find(|r| r.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown config resource: {}", s))
    }
}

/// A single catalog row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: CatalogItemId,
    #[serde(skip_serializing)]
    pub tenant_id: TenantId,
    pub resource: CatalogResource,
    pub codigo: String,
    pub nome: String,
    pub uf: Option<String>,
    /// Parent city (varas, locais)
    pub cidade_id: Option<CatalogItemId>,
    /// Parent tribunal (varas)
    pub tribunal_id: Option<CatalogItemId>,
    pub endereco: Option<String>,
    /// Badge color for statuses
    pub cor: Option<String>,
    pub ordem: i32,
    pub ativo: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data needed to create a catalog item
#[derive(Debug, Clone)]
pub struct NewCatalogItem {
    pub resource: CatalogResource,
    pub codigo: String,
    pub nome: String,
    pub uf: Option<String>,
    pub cidade_id: Option<CatalogItemId>,
    pub tribunal_id: Option<CatalogItemId>,
    pub endereco: Option<String>,
    pub cor: Option<String>,
    pub ordem: i32,
    pub ativo: bool,
}

/// Partial update of a catalog item
#[derive(Debug, Clone, Default)]
pub struct CatalogItemPatch {
    pub codigo: Option<String>,
    pub nome: Option<String>,
    pub cor: Option<String>,
    pub endereco: Option<String>,
    pub ordem: Option<i32>,
    pub ativo: Option<bool>,
}

impl CatalogItemPatch {
    pub fn apply(self, item: &mut CatalogItem) {
        if let Some(codigo) = self.codigo {
            item.codigo = codigo;
        }
        if let Some(nome) = self.nome {
            item.nome = nome;
        }
        if let Some(cor) = self.cor {
            item.cor = Some(cor);
        }
        if let Some(endereco) = self.endereco {
            item.endereco = Some(endereco);
        }
        if let Some(ordem) = self.ordem {
            item.ordem = ordem;
        }
        if let Some(ativo) = self.ativo {
            item.ativo = ativo;
        }
    }
}
