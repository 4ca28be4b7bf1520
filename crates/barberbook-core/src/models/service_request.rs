use serde::{Deserialize, Serialize};

use super::Reference;

/// A service line booked as part of an appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ServiceRequest {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "servico")]
    pub service: Reference,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "preco")]
    pub unit_price: f64,
    pub total: f64,
    #[serde(rename = "agendamento")]
    pub appointment: Reference,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct NewServiceRequest {
    #[serde(rename = "servico")]
    pub service_id: String,
    #[serde(rename = "quantidade")]
    pub quantity: u32,
    #[serde(rename = "preco")]
    pub unit_price: f64,
    pub total: f64,
    #[serde(rename = "agendamento")]
    pub appointment_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ServiceRequestUpdate {
    #[serde(rename = "servico", skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(rename = "quantidade", skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(rename = "agendamento", skip_serializing_if = "Option::is_none")]
    pub appointment_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_request() {
        let json = r#"{"_id":"r1","servico":{"_id":"s1","name":"Corte"},"quantidade":2,"preco":35,"total":70,"agendamento":"a1"}"#;
        let request: ServiceRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.service.display(), "Corte");
        assert_eq!(request.appointment.id(), "a1");
        assert_eq!(request.quantity, 2);
    }
}
