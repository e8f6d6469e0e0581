//! Typed wrappers for the storefront, spa admin and platform admin endpoints.
//!
//! Bodies stay as JSON values; this layer only knows the routes. Tenant scoping
//! and the bearer credential come from the client's request pipeline.

use std::sync::Arc;

use serde_json::{Value, json};
use spadesk_api::SpaError;

use crate::client::ApiClient;

#[derive(Clone)]
pub struct StorefrontApi {
    client: Arc<ApiClient>,
}

impl StorefrontApi {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    // Public

    pub async fn list_services(&self) -> Result<Value, SpaError> {
        self.client.get("/services").await
    }

    pub async fn get_service(&self, id: &str) -> Result<Value, SpaError> {
        self.client.get(&format!("/services/{id}")).await
    }

    // Customer

    pub async fn create_booking(&self, booking: Value) -> Result<Value, SpaError> {
        self.client.post("/bookings", booking).await
    }

    pub async fn my_bookings(&self) -> Result<Value, SpaError> {
        self.client.get("/bookings/my").await
    }

    // Spa admin

    pub async fn admin_bookings(&self) -> Result<Value, SpaError> {
        self.client.get("/admin/bookings").await
    }

    pub async fn admin_services(&self) -> Result<Value, SpaError> {
        self.client.get("/admin/services").await
    }

    pub async fn admin_sales(&self) -> Result<Value, SpaError> {
        self.client.get("/admin/sales").await
    }

    pub async fn update_booking_status(&self, id: &str, status: &str) -> Result<Value, SpaError> {
        self.client
            .put(&format!("/admin/bookings/{id}/status"), json!({ "status": status }))
            .await
    }

    pub async fn delete_booking(&self, id: &str) -> Result<Value, SpaError> {
        self.client.delete(&format!("/admin/bookings/{id}")).await
    }

    // Platform admin

    pub async fn master_spas(&self) -> Result<Value, SpaError> {
        self.client.get("/master-admin/spas").await
    }

    pub async fn create_spa(&self, spa: Value) -> Result<Value, SpaError> {
        self.client.post("/master-admin/spas", spa).await
    }

    pub async fn master_bookings(&self) -> Result<Value, SpaError> {
        self.client.get("/master-admin/bookings").await
    }

    pub async fn master_sales(&self) -> Result<Value, SpaError> {
        self.client.get("/master-admin/sales").await
    }
}
