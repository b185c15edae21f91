use reqwest::Method;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::models::{DashboardData, DashboardQuery};

impl ApiClient {
    /// Reads the aggregate dashboard for a date range and optional filters.
    pub async fn get_dashboard(&self, query: &DashboardQuery) -> Result<DashboardData, ApiError> {
        let request = self.request(Method::GET, "/dashboard/").query(query);
        self.execute_json("read dashboard", request).await
    }
}
