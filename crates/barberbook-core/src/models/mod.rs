//! Request and response schemas for the barbershop backend.
//!
//! The backend speaks Portuguese field names (`cliente`, `dataAgendamento`,
//! `duracao`); these types use English names and map them with serde.
//!
//! - `Appointment`: a booking (`/agendamentos`)
//! - `Customer`: a client record linked to an identity account (`/clientes`)
//! - `Service`: a bookable service with price and duration (`/servicos`)
//! - `ServiceRequest`: a service line attached to an appointment
//!   (`/solicitarservicos`)
//! - `User`: staff and customer accounts (`/usuarios`)

pub mod appointment;
pub mod customer;
pub mod reference;
pub mod service;
pub mod service_request;
pub mod user;

pub use appointment::{Appointment, AppointmentStatus, AppointmentUpdate, NewAppointment};
pub use customer::{Customer, CustomerUpdate, NewCustomer};
pub use reference::Reference;
pub use service::{NewService, Service, ServiceUpdate};
pub use service_request::{NewServiceRequest, ServiceRequest, ServiceRequestUpdate};
pub use user::{NewUser, Role, User, UserUpdate};
