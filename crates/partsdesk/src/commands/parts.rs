//! `parts` and `images` subcommands. Both work inside a job's detail view.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;

use partsdesk::board::JobDetailView;
use partsdesk::eligibility::Action;
use partsdesk::models::{FieldMap, PartImage, PartRecord, UserRef};
use partsdesk::verification::display_data;
use partsdesk::{
    apply_verification, ImageGallery, PartsdeskError, Result, VerificationDraft,
};

use super::jobs::evaluate_logged;
use super::{require, CommandContext};

#[derive(Subcommand)]
pub enum PartsCommand {
    /// Verify a part, optionally correcting its enriched data
    Verify {
        part_id: String,
        /// Job the part belongs to
        #[arg(long)]
        job: String,
        /// Set a field; the value is read as JSON when it parses, as text otherwise
        #[arg(long = "set", value_name = "KEY=VALUE")]
        set: Vec<String>,
        /// Remove a field
        #[arg(long = "unset", value_name = "KEY")]
        unset: Vec<String>,
        /// Replace all fields with the JSON object in this file
        #[arg(long, conflicts_with_all = ["set", "unset"])]
        data: Option<PathBuf>,
    },

    /// Print the data a reviewer sees for a part
    Show {
        part_id: String,
        #[arg(long)]
        job: String,
    },
}

#[derive(Subcommand)]
pub enum ImagesCommand {
    /// List the images of a part
    List {
        part_id: String,
        #[arg(long)]
        job: String,
    },

    /// Attach a new image to a part
    Add {
        part_id: String,
        file: PathBuf,
        #[arg(long)]
        job: String,
    },

    /// Replace the content of an image, keeping its identifier
    Replace {
        image_id: String,
        file: PathBuf,
        #[arg(long)]
        job: String,
    },

    /// Delete an image
    Delete {
        image_id: String,
        #[arg(long)]
        job: String,
    },
}

/// Loads a job and checks that its details may be worked on.
async fn open_job(ctx: &CommandContext, job_id: &str) -> Result<JobDetailView> {
    let detail = ctx.client.get_job(job_id).await?;
    let evaluation = evaluate_logged(&detail.job)?;
    require(&evaluation, job_id, Action::ViewDetails)?;
    Ok(JobDetailView::new(detail, ctx.config.paging.parts_per_page))
}

fn find_part<'a>(view: &'a JobDetailView, part_id: &str) -> Result<&'a PartRecord> {
    view.part(part_id).ok_or_else(|| {
        PartsdeskError::InvalidInput(format!(
            "part {} does not belong to job {}",
            part_id,
            view.job().id
        ))
    })
}

/// Parses `key=value`. Values that are valid JSON keep their type.
fn parse_assignment(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw.split_once('=').ok_or_else(|| {
        PartsdeskError::InvalidInput(format!("expected KEY=VALUE, got '{}'", raw))
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(PartsdeskError::InvalidInput(format!(
            "missing field name in '{}'",
            raw
        )));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn read_field_map(path: &Path) -> Result<FieldMap> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        PartsdeskError::InvalidInput(format!("cannot read '{}': {}", path.display(), e))
    })?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(PartsdeskError::InvalidInput(format!(
            "'{}' does not hold a JSON object",
            path.display()
        ))),
    }
}

#[derive(Serialize)]
struct PartOutput<'a> {
    part: &'a PartRecord,
    data: FieldMap,
}

fn render_part(part: &PartRecord, data: &FieldMap) -> String {
    let mut lines = vec![format!("{}  {}  {}", part.id, part.code, part.status)];
    if let (Some(by), Some(at)) = (&part.verified_by, part.verified_at) {
        lines.push(format!("verified by {} at {}", by.display_name(), at.to_rfc3339()));
    }
    if data.is_empty() {
        lines.push("  (no enriched data)".to_string());
    }
    for (key, value) in data {
        let value = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        lines.push(format!("  {}: {}", key, value));
    }
    lines.join("\n")
}

pub async fn run(ctx: &CommandContext, command: PartsCommand) -> Result<()> {
    match command {
        PartsCommand::Show { part_id, job } => {
            let view = open_job(ctx, &job).await?;
            let part = find_part(&view, &part_id)?;
            let output = PartOutput {
                part,
                data: display_data(part),
            };
            ctx.emit(&output, || render_part(part, &output.data))
        }
        PartsCommand::Verify {
            part_id,
            job,
            set,
            unset,
            data,
        } => verify(ctx, &job, &part_id, set, unset, data).await,
    }
}

async fn verify(
    ctx: &CommandContext,
    job_id: &str,
    part_id: &str,
    set: Vec<String>,
    unset: Vec<String>,
    data: Option<PathBuf>,
) -> Result<()> {
    let mut view = open_job(ctx, job_id).await?;
    let mut draft = VerificationDraft::new(find_part(&view, part_id)?)?;

    if let Some(path) = data {
        draft.replace_data(read_field_map(&path)?);
    }
    for raw in &set {
        let (key, value) = parse_assignment(raw)?;
        draft.set_field(key, value);
    }
    for key in &unset {
        draft.remove_field(key);
    }

    if !draft.can_submit() {
        return Err(PartsdeskError::ActionUnavailable(format!(
            "part {} is already verified and nothing was changed",
            part_id
        )));
    }

    let request = draft.submission();
    ctx.client.verify_part(part_id, &request).await?;

    let actor = match ctx.client.current_user().await {
        Ok(user) => UserRef::from(&user),
        Err(e) => {
            log::warn!("Could not read the current user: {}", e);
            UserRef::default()
        }
    };

    let part = view.part_mut(part_id).ok_or_else(|| {
        PartsdeskError::InvalidInput(format!("part {} disappeared from job {}", part_id, job_id))
    })?;
    apply_verification(part, &request, &actor, Utc::now())?;
    draft.mark_verified();
    let part: &PartRecord = part;

    let output = PartOutput {
        part,
        data: draft.data().clone(),
    };
    ctx.emit(&output, || render_part(part, &output.data))
}

// ─── Images ─────────────────────────────────────────────────────────────────

fn gallery_of_part(view: &JobDetailView, part_id: &str) -> Result<ImageGallery> {
    find_part(view, part_id)?;
    view.gallery(part_id)
        .ok_or_else(|| PartsdeskError::InvalidInput(format!("part {} not found", part_id)))
}

fn gallery_with_image(view: &JobDetailView, image_id: &str) -> Result<ImageGallery> {
    view.parts()
        .iter()
        .find(|p| p.images.iter().any(|i| i.id == image_id))
        .and_then(|p| view.gallery(&p.id))
        .ok_or_else(|| {
            PartsdeskError::InvalidInput(format!(
                "image {} is not attached to any part of job {}",
                image_id,
                view.job().id
            ))
        })
}

#[derive(Serialize)]
struct GalleryOutput<'a> {
    part_id: &'a str,
    images: &'a [PartImage],
}

fn emit_gallery(ctx: &CommandContext, gallery: &ImageGallery) -> Result<()> {
    let output = GalleryOutput {
        part_id: gallery.part_id(),
        images: gallery.images(),
    };
    ctx.emit(&output, || {
        let mut lines = vec![format!(
            "part {}: {} image(s)",
            gallery.part_id(),
            gallery.len()
        )];
        for image in gallery.images() {
            lines.push(format!("  {}  {}", image.id, image.url));
        }
        lines.join("\n")
    })
}

pub async fn run_images(ctx: &CommandContext, command: ImagesCommand) -> Result<()> {
    match command {
        ImagesCommand::List { part_id, job } => {
            let view = open_job(ctx, &job).await?;
            emit_gallery(ctx, &gallery_of_part(&view, &part_id)?)
        }
        ImagesCommand::Add { part_id, file, job } => {
            let mut view = open_job(ctx, &job).await?;
            let mut gallery = gallery_of_part(&view, &part_id)?;
            let image = ctx.client.add_part_image(&part_id, &file).await?;
            gallery.apply_added(image);
            view.store_gallery(&gallery);
            emit_gallery(ctx, &gallery)
        }
        ImagesCommand::Replace {
            image_id,
            file,
            job,
        } => {
            let mut view = open_job(ctx, &job).await?;
            let mut gallery = gallery_with_image(&view, &image_id)?;
            let image = ctx.client.replace_part_image(&image_id, &file).await?;
            gallery.apply_replaced(image);
            view.store_gallery(&gallery);
            emit_gallery(ctx, &gallery)
        }
        ImagesCommand::Delete { image_id, job } => {
            let mut view = open_job(ctx, &job).await?;
            let mut gallery = gallery_with_image(&view, &image_id)?;
            let message = ctx.client.delete_part_image(&image_id).await?;
            log::info!("{}", message.message);
            gallery.apply_deleted(&image_id);
            view.store_gallery(&gallery);
            emit_gallery(ctx, &gallery)
        }
    }
}
