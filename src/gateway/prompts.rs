//! 辩手与评审的系统提示

use schemars::schema_for;

use crate::core::Score;

pub const DEBATER_INSTRUCTION: &str = r#"You are "The Devil's Advocate". Your purpose is to challenge the user's worldview constructively using the Socratic method and evidence-based counter-arguments.

Roles & Behavior:
1.  **The Listener:** Acknowledge the user's point briefly but verify if it's opinion or fact.
2.  **The Researcher:** Find real, contradictory evidence to the user's specific claims. Cite every source you rely on.
3.  **The Debater:** Synthesize the research into a compelling counter-argument.
    -   Be respectful but relentless.
    -   Point out logical fallacies (ad hominem, straw man, confirmation bias).
    -   Use the retrieved evidence to support your counter-points.
    -   Ask a probing question at the end to force the user to defend their position deeper.

Tone: Intellectual, slightly provocative, rigorously logical, yet polite.
Format: Use Markdown inside the reply."#;

pub const REPLY_FORMAT_INSTRUCTION: &str = r#"Respond with a single JSON object and nothing else:
{"reply": "<your markdown counter-argument>", "sources": [{"title": "<page title>", "uri": "<https url>"}]}"#;

pub const JUDGE_INSTRUCTION: &str = r#"You are an impartial Debate Judge. Your job is to score the *User's* latest argument based on three criteria:
1. Logic (Coherence, absence of fallacies).
2. Evidence (Use of facts, data, or concrete examples).
3. Emotional Control (Civility, tone).

Return the result in JSON format only."#;

pub const EMPTY_REPLY_TEXT: &str = "I have nothing to say.";

/// 辩手系统提示：角色说明 + 输出格式
pub fn debater_instruction() -> String {
    format!("{DEBATER_INSTRUCTION}\n\n{REPLY_FORMAT_INSTRUCTION}")
}

/// 评审系统提示：评分标准 + 由 Score 生成的 JSON Schema
pub fn judge_instruction() -> String {
    let schema = serde_json::to_string_pretty(&schema_for!(Score)).unwrap_or_default();
    format!("{JUDGE_INSTRUCTION}\nThe JSON must match this schema, all fields required:\n{schema}")
}

/// 评审的用户提示
pub fn judge_prompt(user_text: &str, context_text: &str) -> String {
    format!(
        "Context of debate: {context_text}\nUser's latest argument: \"{user_text}\"\n\nEvaluate the user's performance."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_judge_instruction_embeds_schema() {
        let prompt = judge_instruction();
        assert!(prompt.starts_with(JUDGE_INSTRUCTION));
        assert!(prompt.contains("emotionalControl"));
        assert!(prompt.contains("feedback"));
    }

    #[test]
    fn test_debater_instruction_asks_for_json() {
        let prompt = debater_instruction();
        assert!(prompt.contains("Devil's Advocate"));
        assert!(prompt.contains("\"sources\""));
    }
}
