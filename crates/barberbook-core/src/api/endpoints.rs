//! Typed endpoint wrappers, one group per backend resource.

use super::{ApiClient, ApiError};
use crate::models::{
    Appointment, AppointmentUpdate, Customer, CustomerUpdate, NewAppointment, NewCustomer,
    NewService, NewServiceRequest, NewUser, Service, ServiceRequest, ServiceRequestUpdate,
    ServiceUpdate, User, UserUpdate,
};

const APPOINTMENTS: &str = "agendamentos";
const CUSTOMERS: &str = "clientes";
const SERVICES: &str = "servicos";
const SERVICE_REQUESTS: &str = "solicitarservicos";
const USERS: &str = "usuarios";

fn item(resource: &str, id: &str) -> String {
    format!("{}/{}", resource, id)
}

impl ApiClient {
    // ===== Appointments =====

    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.get(APPOINTMENTS).await
    }

    pub async fn get_appointment(&self, id: &str) -> Result<Appointment, ApiError> {
        self.get(&item(APPOINTMENTS, id)).await
    }

    pub async fn create_appointment(
        &self,
        appointment: &NewAppointment,
    ) -> Result<Appointment, ApiError> {
        self.post(APPOINTMENTS, appointment).await
    }

    pub async fn update_appointment(
        &self,
        id: &str,
        update: &AppointmentUpdate,
    ) -> Result<Appointment, ApiError> {
        self.put(&item(APPOINTMENTS, id), update).await
    }

    pub async fn delete_appointment(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&item(APPOINTMENTS, id)).await
    }

    // ===== Customers =====

    pub async fn list_customers(&self) -> Result<Vec<Customer>, ApiError> {
        self.get(CUSTOMERS).await
    }

    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        self.post(CUSTOMERS, customer).await
    }

    pub async fn update_customer(
        &self,
        id: &str,
        update: &CustomerUpdate,
    ) -> Result<Customer, ApiError> {
        self.put(&item(CUSTOMERS, id), update).await
    }

    pub async fn delete_customer(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&item(CUSTOMERS, id)).await
    }

    // ===== Services =====

    pub async fn list_services(&self) -> Result<Vec<Service>, ApiError> {
        self.get(SERVICES).await
    }

    pub async fn create_service(&self, service: &NewService) -> Result<Service, ApiError> {
        self.post(SERVICES, service).await
    }

    pub async fn update_service(
        &self,
        id: &str,
        update: &ServiceUpdate,
    ) -> Result<Service, ApiError> {
        self.put(&item(SERVICES, id), update).await
    }

    pub async fn delete_service(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&item(SERVICES, id)).await
    }

    // ===== Service requests =====

    pub async fn list_service_requests(&self) -> Result<Vec<ServiceRequest>, ApiError> {
        self.get(SERVICE_REQUESTS).await
    }

    pub async fn get_service_request(&self, id: &str) -> Result<ServiceRequest, ApiError> {
        self.get(&item(SERVICE_REQUESTS, id)).await
    }

    pub async fn create_service_request(
        &self,
        request: &NewServiceRequest,
    ) -> Result<ServiceRequest, ApiError> {
        self.post(SERVICE_REQUESTS, request).await
    }

    pub async fn update_service_request(
        &self,
        id: &str,
        update: &ServiceRequestUpdate,
    ) -> Result<ServiceRequest, ApiError> {
        self.put(&item(SERVICE_REQUESTS, id), update).await
    }

    pub async fn delete_service_request(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&item(SERVICE_REQUESTS, id)).await
    }

    // ===== Users =====

    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get(USERS).await
    }

    pub async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        self.post(USERS, user).await
    }

    pub async fn update_user(&self, id: &str, update: &UserUpdate) -> Result<User, ApiError> {
        self.put(&item(USERS, id), update).await
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), ApiError> {
        self.delete(&item(USERS, id)).await
    }
}
