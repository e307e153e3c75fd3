//! HTTP handler for the application-generation endpoint.

use axum::extract::multipart::Field;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info};

use crate::errors::AppError;
use crate::extract::{extract_upload, UploadedFile};
use crate::guidance::load_guidance;
use crate::pipeline::{run_pipeline, ApplicationInput, PipelineResult};
use crate::state::AppState;

/// POST /api/v1/applications/generate
///
/// Multipart form with three parts: `job_description` (text),
/// `master_resume_file` and `story_file` (PDF or plain-text uploads).
/// Returns the four generated artifacts, or the first error that aborted
/// the run. Unknown parts are ignored.
pub async fn handle_generate_application(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<PipelineResult>, AppError> {
    let mut job_description: Option<String> = None;
    let mut master_resume: Option<UploadedFile> = None;
    let mut story: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart request: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "job_description" => {
                let text = field.text().await.map_err(|e| {
                    AppError::Validation(format!("could not read job_description: {e}"))
                })?;
                job_description = Some(text);
            }
            "master_resume_file" => master_resume = Some(read_upload(field).await?),
            "story_file" => story = Some(read_upload(field).await?),
            other => debug!("ignoring unknown multipart field '{other}'"),
        }
    }

    let job_description = job_description
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::Validation("job_description is required".to_string()))?;
    let master_resume = master_resume
        .ok_or_else(|| AppError::Validation("master_resume_file is required".to_string()))?;
    let story =
        story.ok_or_else(|| AppError::Validation("story_file is required".to_string()))?;

    // Uploads are validated and extracted before the test-mode short
    // circuit, so the request contract is enforced either way.
    let master_resume_text = extract_upload(master_resume).await?;
    let story_text = extract_upload(story).await?;

    if state.config.test_mode {
        info!("TEST_MODE active: returning the fixed mock application");
        return Ok(Json(PipelineResult::mock()));
    }

    let llm = state.llm.as_ref().ok_or(AppError::MissingApiKey)?;
    let guidance = load_guidance(state.config.guidance_dir.clone()).await?;

    let input = ApplicationInput {
        job_description,
        master_resume: master_resume_text,
        story: story_text,
    };

    let result = run_pipeline(llm, state.config.stage_pacing, &guidance, &input).await?;
    Ok(Json(result))
}

/// Captures one uploaded part's name, declared media type, and bytes.
async fn read_upload(field: Field<'_>) -> Result<UploadedFile, AppError> {
    let filename = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("could not read upload '{filename}': {e}")))?;
    Ok(UploadedFile {
        filename,
        content_type,
        bytes,
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
