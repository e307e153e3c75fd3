//! The four-stage application generation pipeline.
//!
//! Flow: analysis → resume draft → review → cover letter. Each stage feeds
//! the next stage's prompt, with a fixed pause between stages to stay under
//! the model API's request-rate ceiling. The run is strictly sequential and
//! the first failing stage aborts it; a partial result is never returned.

pub mod handlers;
pub mod prompts;

use std::time::Duration;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::guidance::GuidanceBundle;
use crate::llm_client::prompts::{JSON_ONLY_INSTRUCTION, NO_FABRICATION_INSTRUCTION};
use crate::llm_client::{LlmClient, LlmError};
use crate::pipeline::prompts::{
    ANALYSIS_PROMPT_TEMPLATE, COVER_LETTER_PROMPT_TEMPLATE, RESUME_PROMPT_TEMPLATE,
    REVIEW_PROMPT_TEMPLATE,
};

// ──────────────────────────────────────────────
// Data models
// ──────────────────────────────────────────────

/// The extracted request inputs the stages draw from.
#[derive(Debug, Clone)]
pub struct ApplicationInput {
    pub job_description: String,
    pub master_resume: String,
    pub story: String,
}

/// Structured output of the analysis stage. Both fields are required; a
/// model reply missing either one fails the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub keywords: Vec<String>,
    pub persona: String,
}

/// The final aggregate. Only exists when every stage succeeded.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub analysis: AnalysisResult,
    pub resume: String,
    pub review: String,
    pub cover_letter: String,
}

impl PipelineResult {
    /// Fixed payload returned in test mode. Shaped like a real result so
    /// clients can build against it without burning model quota.
    pub fn mock() -> Self {
        Self {
            analysis: AnalysisResult {
                keywords: vec![
                    "Rust".to_string(),
                    "Axum".to_string(),
                    "Teamwork".to_string(),
                ],
                persona: "A proactive team player.".to_string(),
            },
            resume: "### Mocked Resume\n\nThis is the tailored resume based on the analysis."
                .to_string(),
            review: "### Mocked Review\n\n- **ATS Score:** 8/10\n- **Comments:** The resume looks strong."
                .to_string(),
            cover_letter: "### Mocked Cover Letter\n\nThis is the final cover letter."
                .to_string(),
        }
    }
}

// ──────────────────────────────────────────────
// Stages
// ──────────────────────────────────────────────

/// The four generation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Analysis,
    ResumeDraft,
    Review,
    CoverLetter,
}

impl Stage {
    pub const ORDER: [Stage; 4] = [
        Stage::Analysis,
        Stage::ResumeDraft,
        Stage::Review,
        Stage::CoverLetter,
    ];

    /// Human-readable stage name, used in logs and user-visible errors.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Analysis => "analysis",
            Stage::ResumeDraft => "resume draft",
            Stage::Review => "review",
            Stage::CoverLetter => "cover letter",
        }
    }

    /// The stage that runs after this one; `None` for the last stage.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Analysis => Some(Stage::ResumeDraft),
            Stage::ResumeDraft => Some(Stage::Review),
            Stage::Review => Some(Stage::CoverLetter),
            Stage::CoverLetter => None,
        }
    }
}

/// Tags a stage failure with the stage name so the caller can tell which
/// of the four calls went wrong.
fn stage_error(stage: Stage, e: LlmError) -> AppError {
    AppError::Llm(format!("{} stage failed: {e}", stage.name()))
}

/// Pauses between `stage` and its successor; no-op after the final stage.
/// This is mandatory success-path spacing, separate from the retry backoff
/// inside `LlmClient`.
async fn pace_between(stage: Stage, pacing: Duration) {
    if let Some(next) = stage.next() {
        info!(
            "waiting {}s before the {} stage to respect the model rate ceiling",
            pacing.as_secs(),
            next.name()
        );
        tokio::time::sleep(pacing).await;
    }
}

// ──────────────────────────────────────────────
// Orchestration
// ──────────────────────────────────────────────

/// Runs the four stages in order and assembles the final result.
pub async fn run_pipeline(
    llm: &LlmClient,
    pacing: Duration,
    guidance: &GuidanceBundle,
    input: &ApplicationInput,
) -> Result<PipelineResult, AppError> {
    // Stage 1: analysis (strict JSON)
    info!("running {} stage", Stage::Analysis.name());
    let prompt = build_analysis_prompt(&input.job_description, &guidance.job_description);
    let analysis: AnalysisResult = llm
        .invoke_json(&prompt)
        .await
        .map_err(|e| stage_error(Stage::Analysis, e))?;
    info!(
        "analysis stage done: {} keywords extracted",
        analysis.keywords.len()
    );
    pace_between(Stage::Analysis, pacing).await;

    // Stage 2: resume draft, grounded in the master resume and stories
    info!("running {} stage", Stage::ResumeDraft.name());
    let analysis_json = serde_json::to_string_pretty(&analysis)
        .map_err(|e| AppError::Internal(anyhow!("analysis does not serialize: {e}")))?;
    let prompt = build_resume_prompt(
        &analysis_json,
        &guidance.resume,
        &input.master_resume,
        &input.story,
    );
    let resume = llm
        .invoke_text(&prompt)
        .await
        .map_err(|e| stage_error(Stage::ResumeDraft, e))?;
    pace_between(Stage::ResumeDraft, pacing).await;

    // Stage 3: review of the fresh draft against the original JD
    info!("running {} stage", Stage::Review.name());
    let prompt = build_review_prompt(&input.job_description, &resume);
    let review = llm
        .invoke_text(&prompt)
        .await
        .map_err(|e| stage_error(Stage::Review, e))?;
    pace_between(Stage::Review, pacing).await;

    // Stage 4: cover letter, grounded in the tailored resume
    info!("running {} stage", Stage::CoverLetter.name());
    let prompt = build_cover_letter_prompt(&resume, &guidance.cover_letter, &input.story);
    let cover_letter = llm
        .invoke_text(&prompt)
        .await
        .map_err(|e| stage_error(Stage::CoverLetter, e))?;
    pace_between(Stage::CoverLetter, pacing).await;

    info!("pipeline done: all four artifacts generated");
    Ok(PipelineResult {
        analysis,
        resume,
        review,
        cover_letter,
    })
}

// ──────────────────────────────────────────────
// Prompt assembly
// ──────────────────────────────────────────────

fn build_analysis_prompt(job_description: &str, jd_guidance: &str) -> String {
    ANALYSIS_PROMPT_TEMPLATE
        .replace("{json_instruction}", JSON_ONLY_INSTRUCTION)
        .replace("{jd_guidance}", jd_guidance)
        .replace("{job_description}", job_description)
}

fn build_resume_prompt(
    analysis_json: &str,
    resume_guidance: &str,
    master_resume: &str,
    story: &str,
) -> String {
    RESUME_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{analysis_json}", analysis_json)
        .replace("{resume_guidance}", resume_guidance)
        .replace("{master_resume}", master_resume)
        .replace("{story}", story)
}

fn build_review_prompt(job_description: &str, resume: &str) -> String {
    REVIEW_PROMPT_TEMPLATE
        .replace("{job_description}", job_description)
        .replace("{resume}", resume)
}

fn build_cover_letter_prompt(resume: &str, cover_letter_guidance: &str, story: &str) -> String {
    COVER_LETTER_PROMPT_TEMPLATE
        .replace("{no_fabrication}", NO_FABRICATION_INSTRUCTION)
        .replace("{resume}", resume)
        .replace("{cover_letter_guidance}", cover_letter_guidance)
        .replace("{story}", story)
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::config::RetryPolicy;
    use crate::llm_client::GenerativeModel;

    /// Scripted transport that records every prompt it receives.
    struct ScriptedModel {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<Result<String, LlmError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl GenerativeModel for ScriptedModel {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("pipeline invoked the model more times than scripted")
        }
    }

    const VALID_ANALYSIS: &str =
        r#"{"keywords": ["Rust", "Tokio"], "persona": "a systems person"}"#;

    fn client_for(model: &Arc<ScriptedModel>) -> LlmClient {
        LlmClient::new(
            model.clone(),
            RetryPolicy {
                max_attempts: 3,
                backoff: Duration::from_secs(120),
            },
        )
    }

    fn input() -> ApplicationInput {
        ApplicationInput {
            job_description: "We need a Rust engineer".to_string(),
            master_resume: "Jane Doe, ten years of Rust".to_string(),
            story: "Situation, task, action, result".to_string(),
        }
    }

    fn guidance() -> GuidanceBundle {
        GuidanceBundle {
            job_description: "JD GUIDANCE BLOB".to_string(),
            resume: "RESUME GUIDANCE BLOB".to_string(),
            cover_letter: "COVER GUIDANCE BLOB".to_string(),
        }
    }

    fn four_good_replies() -> Arc<ScriptedModel> {
        ScriptedModel::new(vec![
            Ok(VALID_ANALYSIS.to_string()),
            Ok("THE RESUME".to_string()),
            Ok("THE REVIEW".to_string()),
            Ok("THE COVER LETTER".to_string()),
        ])
    }

    #[tokio::test(start_paused = true)]
    async fn test_pipeline_returns_all_four_artifacts_verbatim() {
        let model = four_good_replies();
        let result = run_pipeline(
            &client_for(&model),
            Duration::from_secs(60),
            &guidance(),
            &input(),
        )
        .await
        .unwrap();

        assert_eq!(result.analysis.keywords, vec!["Rust", "Tokio"]);
        assert_eq!(result.analysis.persona, "a systems person");
        assert_eq!(result.resume, "THE RESUME");
        assert_eq!(result.review, "THE REVIEW");
        assert_eq!(result.cover_letter, "THE COVER LETTER");
        assert_eq!(model.prompts().len(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_analysis_json_aborts_before_later_stages() {
        let model = ScriptedModel::new(vec![Ok("plain prose, no JSON here".to_string())]);
        let err = run_pipeline(
            &client_for(&model),
            Duration::from_secs(60),
            &guidance(),
            &input(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Llm(_)));
        assert!(err.to_string().contains("analysis stage failed"));
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_midway_stage_failure_aborts_the_rest() {
        let model = ScriptedModel::new(vec![
            Ok(VALID_ANALYSIS.to_string()),
            Err(LlmError::Api {
                status: 500,
                message: "backend exploded".to_string(),
            }),
        ]);
        let err = run_pipeline(
            &client_for(&model),
            Duration::from_secs(60),
            &guidance(),
            &input(),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("resume draft stage failed"));
        assert_eq!(model.prompts().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prompts_thread_prior_outputs_downstream() {
        let model = four_good_replies();
        run_pipeline(
            &client_for(&model),
            Duration::from_secs(60),
            &guidance(),
            &input(),
        )
        .await
        .unwrap();
        let prompts = model.prompts();

        // Stage 1 sees the JD and the JD guidance.
        assert!(prompts[0].contains("We need a Rust engineer"));
        assert!(prompts[0].contains("JD GUIDANCE BLOB"));

        // Stage 2 sees the parsed analysis, the master resume, the story,
        // and the resume guidance.
        assert!(prompts[1].contains("a systems person"));
        assert!(prompts[1].contains("Jane Doe, ten years of Rust"));
        assert!(prompts[1].contains("Situation, task, action, result"));
        assert!(prompts[1].contains("RESUME GUIDANCE BLOB"));

        // Stage 3 sees the JD and the fresh draft, and none of the
        // guidance blobs.
        assert!(prompts[2].contains("We need a Rust engineer"));
        assert!(prompts[2].contains("THE RESUME"));
        assert!(!prompts[2].contains("GUIDANCE BLOB"));

        // Stage 4 sees the draft, the cover-letter guidance, and the story.
        assert!(prompts[3].contains("THE RESUME"));
        assert!(prompts[3].contains("COVER GUIDANCE BLOB"));
        assert!(prompts[3].contains("Situation, task, action, result"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_path_waits_between_stages_but_not_after_the_last() {
        let model = four_good_replies();
        let started = tokio::time::Instant::now();
        run_pipeline(
            &client_for(&model),
            Duration::from_secs(60),
            &guidance(),
            &input(),
        )
        .await
        .unwrap();

        // three inter-stage pauses, none after the cover letter
        assert_eq!(started.elapsed(), Duration::from_secs(180));
    }

    #[test]
    fn test_stage_transitions_are_fixed() {
        assert_eq!(Stage::Analysis.next(), Some(Stage::ResumeDraft));
        assert_eq!(Stage::ResumeDraft.next(), Some(Stage::Review));
        assert_eq!(Stage::Review.next(), Some(Stage::CoverLetter));
        assert_eq!(Stage::CoverLetter.next(), None);
    }

    #[test]
    fn test_stage_order_matches_the_transition_chain() {
        for pair in Stage::ORDER.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
        }
    }

    #[test]
    fn test_mock_result_has_exactly_the_four_artifact_keys() {
        let value = serde_json::to_value(PipelineResult::mock()).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        for key in ["analysis", "resume", "review", "cover_letter"] {
            assert!(object.contains_key(key), "missing key {key}");
        }
        assert!(value["analysis"]["keywords"].is_array());
        assert!(value["analysis"]["persona"].is_string());
    }

    #[test]
    fn test_analysis_result_requires_both_fields() {
        let missing_persona = serde_json::from_str::<AnalysisResult>(r#"{"keywords": []}"#);
        assert!(missing_persona.is_err());

        let missing_keywords = serde_json::from_str::<AnalysisResult>(r#"{"persona": "x"}"#);
        assert!(missing_keywords.is_err());
    }
}
