// All LLM prompt constants for the Matching module.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;

/// System prompt for ranking candidates against a profile.
pub const RECOMMEND_SYSTEM: &str = "You are a job matching assistant. \
    Analyze job listings against a job seeker profile and return match scores with explanations.";

/// Recommendation prompt. Replace `{profile_block}` and `{jobs_json}` before sending.
pub const RECOMMEND_PROMPT_TEMPLATE: &str = r#"Match these jobs to the user profile and score them.

User Profile:
{profile_block}

Jobs (indexed from 0):
{jobs_json}

Return a JSON array with one entry per job you consider a match, best first:
[{"jobIndex": 0, "score": 85, "matchReason": "Your React expertise matches the frontend focus of this role", "skillMatch": ["React", "TypeScript"], "skillGaps": ["AWS"]}]

Rules:
- jobIndex MUST be one of the indices listed above.
- score is an integer from 0 to 100. Focus on skill overlap and experience fit.
- skillMatch lists required skills the user has; skillGaps lists required skills the user lacks."#;

/// System prompt for profile analysis.
pub const ANALYZE_SYSTEM: &str =
    "You are a career advisor. Analyze job seeker profiles and provide actionable insights.";

/// Profile analysis prompt. Replace `{profile_block}` before sending.
pub const ANALYZE_PROMPT_TEMPLATE: &str = r#"Analyze this job seeker profile and provide insights.

{profile_block}

Return a JSON object with this EXACT schema:
{
  "strengths": ["list of profile strengths"],
  "suggestions": ["actionable suggestions to improve job prospects"],
  "marketDemand": [{"skill": "skill name", "demand": "high"}]
}

demand MUST be one of "high", "medium", "low"."#;

/// Profile summary embedded in both prompts. Replace every `{...}` before use.
pub const PROFILE_BLOCK_TEMPLATE: &str = "- Skills: {skills_json}
- Experience Level: {experience_level}
- Preferred Roles: {roles_json}
- Salary Range: ${salary_min} - ${salary_max}
- Remote Preference: {remote_preference}";

/// Candidate descriptions are cut to this many characters in the prompt.
pub const DESCRIPTION_PROMPT_CHARS: usize = 600;

pub fn recommend_system() -> String {
    format!("{RECOMMEND_SYSTEM} {JSON_ONLY_INSTRUCTION}")
}

pub fn analyze_system() -> String {
    format!("{ANALYZE_SYSTEM} {JSON_ONLY_INSTRUCTION}")
}
