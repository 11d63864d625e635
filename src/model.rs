//! Rows read from the procurement store.
//!
//! Field names follow the store's Spanish column names on the wire and
//! English names in Rust.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Primary key of a store row. The store may use integer or text keys;
/// the original JSON type is kept so it can be echoed back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

/// A procurement case ("expediente").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcurementCase {
    pub id: RecordId,
    #[serde(rename = "codigo_proceso")]
    pub process_code: String,
    #[serde(rename = "objeto_contrato", default)]
    pub contract_object: String,
    #[serde(rename = "valor_estimado", default, deserialize_with = "lenient_f64")]
    pub estimated_value: Option<f64>,
    #[serde(rename = "estado_fase", default)]
    pub phase_status: String,
}

/// A bid ("oferta") received for a case. Scores stay `None` until the
/// external scorer has run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub id: RecordId,
    #[serde(rename = "expediente_id")]
    pub case_id: RecordId,
    #[serde(rename = "razon_social")]
    pub bidder_name: String,
    #[serde(rename = "monto_ofertado", default, deserialize_with = "lenient_f64")]
    pub offered_amount: Option<f64>,
    #[serde(rename = "puntaje_precio", default, deserialize_with = "lenient_f64")]
    pub price_score: Option<f64>,
    #[serde(rename = "puntaje_tecnico", default, deserialize_with = "lenient_f64")]
    pub technical_score: Option<f64>,
    #[serde(rename = "puntaje_total", default, deserialize_with = "lenient_f64")]
    pub total_score: Option<f64>,
}

/// Accept a JSON number, a numeric string, or null. Non-finite values
/// ("NaN", "inf") read as missing.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) if s.trim().is_empty() => None,
        Some(Raw::Text(s)) => Some(
            s.trim()
                .parse::<f64>()
                .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}")))?,
        ),
    };
    Ok(value.filter(|n| n.is_finite()))
}
