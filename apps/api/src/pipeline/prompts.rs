//! Stage prompt templates for the generation pipeline.
//!
//! Placeholders use `{name}` markers filled with `str::replace`, so literal
//! braces (like the JSON schema example below) pass through untouched.

/// Stage 1 (analysis). Placeholders: `{json_instruction}`, `{jd_guidance}`,
/// `{job_description}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"Analyze the job description below and work out what a tailored application must target: the keywords the employer screens for, and the persona the ideal candidate projects. Apply the job-description guidelines when any are provided.

{json_instruction}

The JSON object must have EXACTLY this schema:
{
  "keywords": ["keyword one", "keyword two"],
  "persona": "One or two sentences describing the persona the application should project."
}

JOB-DESCRIPTION GUIDELINES:
{jd_guidance}

JOB DESCRIPTION:
{job_description}"#;

/// Stage 2 (resume draft). Placeholders: `{no_fabrication}`,
/// `{analysis_json}`, `{resume_guidance}`, `{master_resume}`, `{story}`.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"Polish the master resume below into a version tailored to the analysis from the previous step. Follow the resume-specific guidelines. Use the STAR stories to sharpen achievements into concrete, quantified bullet points. The output must be a professional, ATS-friendly resume in Markdown, at most two pages long.

{no_fabrication} The master resume is the primary source of truth.

ANALYSIS FROM THE PREVIOUS STEP:
{analysis_json}

RESUME-SPECIFIC GUIDELINES:
{resume_guidance}

MASTER RESUME (primary source of truth):
{master_resume}

STAR STORIES (for impact examples):
{story}"#;

/// Stage 3 (review). Placeholders: `{job_description}`, `{resume}`.
/// Carries no guidance: the reviewer plays an outside hiring manager who
/// has never seen the candidate's internal notes.
pub const REVIEW_PROMPT_TEMPLATE: &str = r#"Review the generated resume below against the job description, twice over: once as the hiring manager reading it, once as an ATS screening it. Give concrete, actionable feedback on how well the resume is tailored to this job. Format the review in Markdown.

JOB DESCRIPTION:
{job_description}

GENERATED RESUME TO REVIEW:
{resume}"#;

/// Stage 4 (cover letter). Placeholders: `{no_fabrication}`, `{resume}`,
/// `{cover_letter_guidance}`, `{story}`.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"Write a cover letter for this application. Follow the cover-letter guidelines where possible, and draw on the STAR stories for concrete examples. Format the letter in Markdown.

{no_fabrication} The tailored resume below is the source of truth.

TAILORED RESUME (source of truth):
{resume}

COVER-LETTER GUIDELINES:
{cover_letter_guidance}

STAR STORIES (for examples):
{story}"#;
