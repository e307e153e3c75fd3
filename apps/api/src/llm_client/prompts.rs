//! Cross-cutting prompt fragments shared by the pipeline stages.
//! Stage-specific templates live in `pipeline::prompts`.

/// Output-format instruction for stages that must return machine-readable
/// JSON. Kept blunt: the parser downstream is strict.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with a single valid JSON object and \
nothing else. Do NOT wrap it in markdown code fences. Do NOT add explanations, apologies, or \
text outside the JSON object.";

/// Grounding instruction for the document-writing stages. Keeps the model
/// anchored to the supplied sources instead of inventing qualifications.
pub const NO_FABRICATION_INSTRUCTION: &str = "Do NOT invent experience, skills, employers, \
dates, or numbers. Every claim must be supported by the source material supplied in this \
prompt; if the sources do not support a claim, leave it out.";
