//! Job endpoints.

use reqwest::multipart::Form;
use reqwest::Method;

use crate::api::client::ApiClient;
use crate::api::error::ApiError;
use crate::api::upload::{file_part, PreparedUpload};
use crate::models::{JobDetail, JobRecord, JobsResponse, Message, ServiceTypes, UserPublic};

impl ApiClient {
    /// Reads one page of jobs, newest first as ordered by the service.
    pub async fn list_jobs(&self, skip: u64, limit: u64) -> Result<Vec<JobRecord>, ApiError> {
        let request = self
            .request(Method::GET, "/jobs/")
            .query(&[("skip", skip), ("limit", limit)]);
        let response: JobsResponse = self.execute_json("list jobs", request).await?;
        Ok(response.into_records())
    }

    /// Reads a job together with its parts.
    pub async fn get_job(&self, job_id: &str) -> Result<JobDetail, ApiError> {
        let request = self.request(Method::GET, &format!("/jobs/{}", job_id));
        self.execute_json("read job", request).await
    }

    /// Deletes a job. Its parts go with it.
    pub async fn delete_job(&self, job_id: &str) -> Result<Message, ApiError> {
        let request = self.request(Method::DELETE, &format!("/jobs/{}", job_id));
        let message: Message = self.execute_json("delete job", request).await?;
        log::info!("Deleted job {}", job_id);
        Ok(message)
    }

    /// Creates a scraping job from a validated upload.
    pub async fn create_scraping_job(&self, upload: &PreparedUpload) -> Result<JobRecord, ApiError> {
        let form = Form::new()
            .part("file", file_part(&upload.file).await?)
            .text("name", upload.name.clone())
            .text("scraper_type", upload.scraper_type.clone());

        let request = self
            .request(Method::POST, "/jobs/upload")
            .query(&[
                ("scraper_type", upload.scraper_type.as_str()),
                ("name", upload.name.as_str()),
            ])
            .multipart(form);

        let job: JobRecord = self.execute_json("create scraping job", request).await?;
        log::info!("Created scraping job {} ({})", job.id, upload.name);
        Ok(job)
    }

    /// Creates an enrichment job for a completed scraping job.
    pub async fn create_enrichment_job(
        &self,
        scraping_job_id: &str,
        enrichment_type: &str,
    ) -> Result<JobRecord, ApiError> {
        let request = self
            .request(Method::POST, &format!("/jobs/{}/enrich", scraping_job_id))
            .query(&[("enrichment_type", enrichment_type)]);
        let job: JobRecord = self.execute_json("create enrichment job", request).await?;
        log::info!(
            "Created enrichment job {} for {} ({})",
            job.id,
            scraping_job_id,
            enrichment_type
        );
        Ok(job)
    }

    /// Asks the service to (re)compute cost and duration estimates.
    pub async fn estimate_job(&self, job_id: &str) -> Result<JobRecord, ApiError> {
        let request = self.request(Method::POST, &format!("/jobs/{}/estimate", job_id));
        self.execute_json("estimate job", request).await
    }

    pub async fn run_scraping(&self, job_id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/jobs/{}/run-scraping", job_id));
        self.execute_unit("run scraping", request).await?;
        log::info!("Started scraping job {}", job_id);
        Ok(())
    }

    pub async fn run_enrichment(&self, job_id: &str) -> Result<(), ApiError> {
        let request = self.request(Method::POST, &format!("/jobs/{}/run-enrichment", job_id));
        self.execute_unit("run enrichment", request).await?;
        log::info!("Started enrichment job {}", job_id);
        Ok(())
    }

    /// Service catalog, served from the in-process cache while fresh.
    pub async fn service_types(&self) -> Result<ServiceTypes, ApiError> {
        if let Some(cached) = self.catalog.get(&()) {
            return Ok(cached);
        }
        let fresh = self.refresh_service_types().await?;
        Ok(fresh)
    }

    /// Fetches the service catalog, bypassing and then refilling the cache.
    pub async fn refresh_service_types(&self) -> Result<ServiceTypes, ApiError> {
        let request = self.request(Method::GET, "/jobs/service-types");
        let types: ServiceTypes = self.execute_json("read service types", request).await?;
        log::debug!(
            "Service catalog: {} scraping, {} enrichment",
            types.scraping.len(),
            types.enrichment.len()
        );
        self.catalog.insert((), types.clone());
        Ok(types)
    }

    /// The user the configured token belongs to.
    pub async fn current_user(&self) -> Result<UserPublic, ApiError> {
        let request = self.request(Method::GET, "/users/me");
        self.execute_json("read current user", request).await
    }
}
