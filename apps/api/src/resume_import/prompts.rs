// Resume import LLM prompt templates.

pub const RESUME_PARSE_SYSTEM: &str = "\
You are a precise resume data extractor. \
You MUST respond with valid JSON only, with no markdown fences and no explanations. \
Copy facts exactly as written; never invent employers, dates, degrees or skills. \
The input was recovered from an uploaded file and may contain layout noise, \
repeated headers or stray characters. Ignore anything that is not resume content.";

pub const RESUME_PARSE_PROMPT: &str = r#"Parse the following resume text into a structured JSON object.

RESUME TEXT:
{resume_text}

OUTPUT SCHEMA (return exactly this structure):
{
  "full_name": "string" | null,
  "email": "string" | null,
  "phone": "string" | null,
  "location": "string" | null,
  "summary": "string" | null,
  "experience": [
    {
      "company": "string",
      "title": "string",
      "start_date": "YYYY-MM" | "YYYY" | null,
      "end_date": "YYYY-MM" | "YYYY" | null (null = current),
      "location": "string" | null,
      "bullets": ["string"]
    }
  ],
  "education": [
    {
      "institution": "string",
      "degree": "string" | null,
      "field": "string" | null,
      "graduation_date": "YYYY-MM" | "YYYY" | null
    }
  ],
  "skills": ["string"]
}

RULES:
1. Keep bullet wording verbatim, one string per bullet.
2. List experience most recent first.
3. Use null for anything the text does not state.
4. Return ONLY the JSON object."#;

/// Upper bound on resume text sent to the model, in characters.
pub const MAX_RESUME_CHARS: usize = 24_000;

/// Fills the parse template, truncating overly long input on a char boundary.
pub fn build_resume_parse_prompt(resume_text: &str) -> String {
    let text = match resume_text.char_indices().nth(MAX_RESUME_CHARS) {
        Some((cut, _)) => &resume_text[..cut],
        None => resume_text,
    };
    RESUME_PARSE_PROMPT.replace("{resume_text}", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text() {
        let prompt = build_resume_parse_prompt("Jane Doe\nRust engineer");
        assert!(prompt.contains("RESUME TEXT:\nJane Doe\nRust engineer\n"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_prompt_truncates_long_input() {
        let long = "é".repeat(MAX_RESUME_CHARS + 500);
        let prompt = build_resume_parse_prompt(&long);
        let embedded = prompt.matches('é').count();
        assert_eq!(embedded, MAX_RESUME_CHARS);
    }
}
