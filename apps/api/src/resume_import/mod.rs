// Resume import: extracted or pasted resume text → structured resume via the LLM.
// All LLM calls go through llm_client.

pub mod handlers;
pub mod models;
pub mod prompts;
