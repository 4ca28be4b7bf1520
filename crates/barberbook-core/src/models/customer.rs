use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Role;

/// Customer record, created after the identity account during registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Customer {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub firebase_uid: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(rename = "CPF", default)]
    pub cpf: Option<String>,
    /// Kept as sent by the backend (date or full timestamp).
    #[serde(rename = "dataNascimento", default)]
    pub birth_date: Option<String>,
    #[serde(rename = "endereco", default)]
    pub address: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct NewCustomer {
    pub firebase_uid: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "CPF")]
    pub cpf: String,
    #[serde(rename = "dataNascimento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "endereco")]
    pub address: String,
    #[serde(rename = "chaveSeguraRecuperaSenha", skip_serializing_if = "Option::is_none")]
    pub recovery_key: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct CustomerUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "senha", skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(rename = "chaveSeguraRecuperaSenha", skip_serializing_if = "Option::is_none")]
    pub recovery_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
