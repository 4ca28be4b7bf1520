use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Reference;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    #[serde(alias = "cancelled")]
    Canceled,
}

impl AppointmentStatus {
    pub fn label(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "Pending",
            AppointmentStatus::Confirmed => "Confirmed",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Canceled => "Canceled",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Appointment {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(rename = "cliente")]
    pub customer: Reference,
    #[serde(rename = "usuario")]
    pub user: Reference,
    #[serde(rename = "dataAgendamento")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

impl Appointment {
    pub fn is_upcoming(&self) -> bool {
        self.scheduled_at > Utc::now()
            && !matches!(
                self.status,
                Some(AppointmentStatus::Canceled) | Some(AppointmentStatus::Completed)
            )
    }
}

#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct NewAppointment {
    #[serde(rename = "cliente")]
    pub customer_id: String,
    #[serde(rename = "usuario")]
    pub user_id: String,
    #[serde(rename = "dataAgendamento")]
    pub scheduled_at: DateTime<Utc>,
    pub total: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct AppointmentUpdate {
    #[serde(rename = "dataAgendamento", skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(rename = "cliente", skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(rename = "usuario", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
}
