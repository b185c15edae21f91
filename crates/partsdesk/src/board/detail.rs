//! Job detail view: a job, its parts, and a pager over them.

use crate::eligibility::{self, Evaluation};
use crate::images::ImageGallery;
use crate::models::{JobDetail, JobRecord, PartRecord};
use crate::status::UnknownStatus;

/// Parts shown per page of the detail view.
pub const DEFAULT_PARTS_PER_PAGE: usize = 15;

/// Page position over a list of parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartPager {
    per_page: usize,
    page: usize,
}

impl Default for PartPager {
    fn default() -> Self {
        Self::new(DEFAULT_PARTS_PER_PAGE)
    }
}

impl PartPager {
    pub fn new(per_page: usize) -> Self {
        Self {
            per_page: per_page.max(1),
            page: 1,
        }
    }

    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Current page, 1-based.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages for `len` parts. An empty list still has one page.
    pub fn total_pages(&self, len: usize) -> usize {
        len.div_ceil(self.per_page).max(1)
    }

    /// Moves to `page`, clamped to the pages that exist for `len` parts.
    pub fn set_page(&mut self, page: usize, len: usize) -> usize {
        self.page = page.clamp(1, self.total_pages(len));
        self.page
    }

    pub fn next(&mut self, len: usize) -> usize {
        self.set_page(self.page + 1, len)
    }

    pub fn previous(&mut self, len: usize) -> usize {
        self.set_page(self.page.saturating_sub(1), len)
    }

    /// Parts on the current page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let page = self.page.clamp(1, self.total_pages(items.len()));
        let start = ((page - 1) * self.per_page).min(items.len());
        let end = (start + self.per_page).min(items.len());
        &items[start..end]
    }
}

/// A loaded job with its parts, paged for display.
#[derive(Debug, Clone)]
pub struct JobDetailView {
    detail: JobDetail,
    pager: PartPager,
}

impl JobDetailView {
    pub fn new(detail: JobDetail, per_page: usize) -> Self {
        Self {
            detail,
            pager: PartPager::new(per_page),
        }
    }

    pub fn job(&self) -> &JobRecord {
        &self.detail.job
    }

    pub fn enrichment(&self) -> Option<&JobRecord> {
        self.detail.job.enrichment.as_deref()
    }

    pub fn parts(&self) -> &[PartRecord] {
        &self.detail.parts
    }

    pub fn total_parts(&self) -> u64 {
        self.detail.total_parts()
    }

    /// Parts processed so far, when the service reports it.
    pub fn processed_parts(&self) -> Option<u64> {
        self.detail.processed_parts_count
    }

    pub fn evaluation(&self) -> Result<Evaluation, UnknownStatus> {
        eligibility::evaluate(&self.detail.job)
    }

    /// Parts whose status is outside the part vocabulary, in part order.
    pub fn part_integrity_errors(&self) -> Vec<UnknownStatus> {
        self.detail
            .parts
            .iter()
            .filter_map(|p| p.part_status().err())
            .collect()
    }

    pub fn pager(&self) -> PartPager {
        self.pager
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.detail.parts.len())
    }

    pub fn set_page(&mut self, page: usize) -> usize {
        self.pager.set_page(page, self.detail.parts.len())
    }

    pub fn page_parts(&self) -> &[PartRecord] {
        self.pager.slice(&self.detail.parts)
    }

    pub fn part(&self, part_id: &str) -> Option<&PartRecord> {
        self.detail.parts.iter().find(|p| p.id == part_id)
    }

    pub fn part_mut(&mut self, part_id: &str) -> Option<&mut PartRecord> {
        self.detail.parts.iter_mut().find(|p| p.id == part_id)
    }

    pub fn gallery(&self, part_id: &str) -> Option<ImageGallery> {
        self.part(part_id)
            .map(|p| ImageGallery::new(p.id.clone(), p.images.clone()))
    }

    /// Writes a gallery's confirmed state back onto its part.
    pub fn store_gallery(&mut self, gallery: &ImageGallery) {
        if let Some(part) = self.part_mut(gallery.part_id()) {
            part.images = gallery.images().to_vec();
        }
    }
}
