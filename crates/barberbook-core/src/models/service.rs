use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Service {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub price: f64,
    /// Minutes
    #[serde(rename = "duracao", alias = "duration")]
    pub duration: u32,
    #[serde(rename = "isActive", default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct NewService {
    pub name: String,
    pub price: f64,
    #[serde(rename = "duracao")]
    pub duration: u32,
    #[serde(rename = "isActive")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(rename = "duracao", skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(rename = "isActive", skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service() {
        let json = r#"[{"_id":"s1","name":"Corte","price":35,"duracao":30,"isActive":true},{"id":"s2","name":"Barba","price":25.5,"duration":20}]"#;
        let services: Vec<Service> = serde_json::from_str(json).unwrap();
        assert_eq!(services[0].duration, 30);
        assert_eq!(services[0].price, 35.0);
        assert_eq!(services[1].id, "s2");
        assert!(services[1].is_active);
    }

    #[test]
    fn test_wrong_price_type_is_rejected() {
        let json = r#"{"_id":"s1","name":"Corte","price":"35","duracao":30}"#;
        assert!(serde_json::from_str::<Service>(json).is_err());
    }
}
