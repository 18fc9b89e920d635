use serde::{Deserialize, Serialize};
use std::fmt;

/// Registry identifier as emitted by the lookup service.
///
/// The service is not consistent about the JSON type, so both forms are kept
/// as-is rather than coerced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RegistryId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RegistryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryId::Number(n) => write!(f, "{}", n),
            RegistryId::Text(s) => f.write_str(s),
        }
    }
}

impl From<u64> for RegistryId {
    fn from(value: u64) -> Self {
        RegistryId::Number(value.into())
    }
}

impl From<&str> for RegistryId {
    fn from(value: &str) -> Self {
        RegistryId::Text(value.to_string())
    }
}

/// One search hit returned by the lookup service.
///
/// The upstream API publishes its native column names (`Registro_ANS`,
/// `CNPJ`, ...); those are accepted on input. Fields not modelled here are
/// kept in `extra` and passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    #[serde(alias = "Registro_ANS")]
    pub registry_id: RegistryId,

    #[serde(alias = "CNPJ")]
    pub tax_id: String,

    #[serde(alias = "Razao_Social")]
    pub legal_name: String,

    #[serde(alias = "Nome_Fantasia", default, skip_serializing_if = "Option::is_none")]
    pub trade_name: Option<String>,

    #[serde(alias = "Cidade", default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,

    #[serde(alias = "UF", default, skip_serializing_if = "Option::is_none")]
    pub state_code: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ResultRecord {
    pub fn new(
        registry_id: impl Into<RegistryId>,
        tax_id: impl Into<String>,
        legal_name: impl Into<String>,
    ) -> Self {
        Self {
            registry_id: registry_id.into(),
            tax_id: tax_id.into(),
            legal_name: legal_name.into(),
            trade_name: None,
            city: None,
            state_code: None,
            extra: serde_json::Map::new(),
        }
    }

    /// "City/UF", or whichever half is present.
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state_code.as_deref()) {
            (Some(city), Some(uf)) => Some(format!("{}/{}", city, uf)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(uf)) => Some(uf.to_string()),
            (None, None) => None,
        }
    }
}
