//! Builders for job and part records as the service would send them.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use partsdesk::models::{
    JobDetail, JobRecord, PartImage, PartRecord, ServiceType, ServiceTypes, UserRef,
};

/// Fixed reference instant so ordering assertions are stable.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

/// Builder for `JobRecord` instances.
pub struct JobBuilder {
    record: JobRecord,
}

impl JobBuilder {
    fn new(id: &str, kind: &str, status: &str) -> Self {
        Self {
            record: JobRecord {
                id: id.to_string(),
                kind: kind.to_string(),
                status: status.to_string(),
                name: format!("Job {}", id),
                service_type: String::new(),
                error_message: None,
                estimated_cost: None,
                estimated_time: None,
                progress: 0.0,
                created_at: Some(epoch()),
                updated_at: None,
                requested_by_id: None,
                part_ids: vec![],
                parent_id: None,
                enrichment: None,
            },
        }
    }

    pub fn scraping(id: &str, status: &str) -> Self {
        Self::new(id, "scraping", status).service_type("web")
    }

    pub fn enrichment(id: &str, status: &str) -> Self {
        Self::new(id, "enrichment", status).service_type("gpt")
    }

    pub fn name(mut self, name: &str) -> Self {
        self.record.name = name.to_string();
        self
    }

    pub fn service_type(mut self, service_type: &str) -> Self {
        self.record.service_type = service_type.to_string();
        self
    }

    pub fn progress(mut self, progress: f64) -> Self {
        self.record.progress = progress;
        self
    }

    /// Created `minutes` after [`epoch`].
    pub fn created_minutes(mut self, minutes: i64) -> Self {
        self.record.created_at = Some(epoch() + Duration::minutes(minutes));
        self
    }

    pub fn error(mut self, message: &str) -> Self {
        self.record.error_message = Some(message.to_string());
        self
    }

    pub fn estimate(mut self, cost: Decimal, seconds: u64) -> Self {
        self.record.estimated_cost = Some(cost);
        self.record.estimated_time = Some(seconds);
        self
    }

    pub fn parent(mut self, parent_id: &str) -> Self {
        self.record.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn with_enrichment(mut self, enrichment: JobRecord) -> Self {
        self.record.enrichment = Some(Box::new(enrichment));
        self
    }

    pub fn build(self) -> JobRecord {
        self.record
    }
}

/// Builder for `PartRecord` instances.
pub struct PartBuilder {
    part: PartRecord,
}

impl PartBuilder {
    pub fn new(id: &str, status: &str) -> Self {
        Self {
            part: PartRecord {
                id: id.to_string(),
                code: format!("CODE-{}", id),
                status: status.to_string(),
                scraped_data: None,
                enriched_data: None,
                enriched_corrected_data: None,
                verified_by: None,
                verified_at: None,
                images: vec![],
            },
        }
    }

    pub fn scraped(mut self, data: Value) -> Self {
        self.part.scraped_data = Some(data);
        self
    }

    pub fn enriched(mut self, data: Value) -> Self {
        self.part.enriched_data = Some(data);
        self
    }

    pub fn corrected(mut self, data: Value) -> Self {
        self.part.enriched_corrected_data = Some(data);
        self
    }

    pub fn verified_by(mut self, user_id: &str) -> Self {
        self.part.verified_by = Some(UserRef {
            id: Some(user_id.to_string()),
            ..Default::default()
        });
        self.part.verified_at = Some(epoch());
        self
    }

    pub fn image(mut self, id: &str, url: &str) -> Self {
        self.part.images.push(PartImage {
            id: id.to_string(),
            url: url.to_string(),
            part_id: Some(self.part.id.clone()),
        });
        self
    }

    pub fn build(self) -> PartRecord {
        self.part
    }
}

pub fn detail(job: JobRecord, parts: Vec<PartRecord>) -> JobDetail {
    JobDetail {
        total_parts: Some(parts.len() as u64),
        processed_parts_count: Some(parts.len() as u64),
        job,
        parts,
    }
}

pub fn catalog() -> ServiceTypes {
    ServiceTypes {
        scraping: vec![
            ServiceType {
                id: "web".to_string(),
                name: "Web catalog".to_string(),
            },
            ServiceType {
                id: "ftp".to_string(),
                name: "FTP feed".to_string(),
            },
        ],
        enrichment: vec![ServiceType {
            id: "gpt".to_string(),
            name: "Language model".to_string(),
        }],
    }
}

/// A completed scraping job with a completed enrichment and three parts.
pub fn reviewed_job() -> JobDetail {
    let enrichment = JobBuilder::enrichment("e-1", "completed")
        .parent("s-1")
        .progress(100.0)
        .build();
    let job = JobBuilder::scraping("s-1", "completed")
        .name("March catalog")
        .progress(100.0)
        .with_enrichment(enrichment)
        .build();
    detail(
        job,
        vec![
            PartBuilder::new("p-1", "enriched")
                .scraped(serde_json::json!({"title": "Pump"}))
                .enriched(serde_json::json!({"title": "Water pump", "price": 10}))
                .image("img-1", "https://cdn.test/img-1.png")
                .build(),
            PartBuilder::new("p-2", "verified")
                .enriched(serde_json::json!({"title": "Valve"}))
                .corrected(serde_json::json!({"title": "Ball valve"}))
                .verified_by("u-0")
                .build(),
            PartBuilder::new("p-3", "not_found").build(),
        ],
    )
}
