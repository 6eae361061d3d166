//! Judge gate: second-model review of a generated value.
//!
//! The judge sees the full record, the target field, the user's template,
//! and the generated value, and must answer exactly `OK` to accept.
//! Anything else is treated as a corrected replacement value, never as an
//! error. A failed judge call accepts the generated value unchanged.
use crate::model::{invoke, ChatModel};
use crate::record::Record;
use crate::template::DEFAULT_JUDGE_INSTRUCTION;
use crate::util::truncate_string;

/// Literal token the judge must return to accept the generated value.
const ACCEPT_TOKEN: &str = "OK";

/// Outcome of judging one generated value.
#[derive(Debug, Clone, PartialEq)]
pub struct Judgment {
    /// The value to persist.
    pub final_value: String,
    /// The judge's replacement when it rejected, `None` on acceptance or
    /// judge failure.
    pub judged_value: Option<String>,
    /// True when the generated value passed unchanged.
    pub accepted: bool,
}

/// Build the judgment prompt presenting all four pieces of context.
pub fn judgment_prompt(
    record: &Record,
    target_field: &str,
    prompt_template: &str,
    generated_value: &str,
) -> String {
    format!(
        "Here is a product record: {}.\n\
         The field to enrich is: '{target_field}'.\n\
         The user prompt was: '{prompt_template}'.\n\
         The generated value is: '{generated_value}'.\n\
         As an expert, if the generated value is coherent, relevant, and useful \
         for this field, respond only with \"{ACCEPT_TOKEN}\". Otherwise, rewrite \
         the value so it is correct and relevant for this field.",
        record.to_compact_json()
    )
}

/// Check a judge response against the acceptance token.
///
/// Trimmed, case-insensitive exact match; trailing punctuation or any
/// extra content means the response is a replacement value.
pub fn is_acceptance(response: &str) -> bool {
    response.trim().eq_ignore_ascii_case(ACCEPT_TOKEN)
}

/// Resolve a judge response into the final value.
pub fn resolve_judgment(generated_value: &str, response: &str) -> Judgment {
    if is_acceptance(response) {
        Judgment {
            final_value: generated_value.to_string(),
            judged_value: None,
            accepted: true,
        }
    } else {
        Judgment {
            final_value: response.to_string(),
            judged_value: Some(response.to_string()),
            accepted: false,
        }
    }
}

/// Run the judge gate for one record.
///
/// Judge failures fail open: the generated value is accepted unmodified
/// and the batch continues.
pub fn judge_value(
    judge_model: &dyn ChatModel,
    model_name: &str,
    judge_instruction: Option<&str>,
    record: &Record,
    target_field: &str,
    prompt_template: &str,
    generated_value: &str,
) -> Judgment {
    let prompt = judgment_prompt(record, target_field, prompt_template, generated_value);
    let instruction = judge_instruction.unwrap_or(DEFAULT_JUDGE_INSTRUCTION);
    match invoke(judge_model, model_name, instruction, &prompt) {
        Ok(response) => {
            tracing::debug!(
                target_field,
                response = %truncate_string(&response, 200),
                "judge response"
            );
            resolve_judgment(generated_value, &response)
        }
        Err(error) => {
            tracing::warn!(target_field, %error, "judge call failed; accepting generated value");
            Judgment {
                final_value: generated_value.to_string(),
                judged_value: None,
                accepted: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatMessage;
    use anyhow::{anyhow, Result};
    use serde_json::json;

    struct FixedJudge(&'static str);

    impl ChatModel for FixedJudge {
        fn complete(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct BrokenJudge;

    impl ChatModel for BrokenJudge {
        fn complete(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
            Err(anyhow!("judge unreachable"))
        }
    }

    fn sample_record() -> Record {
        serde_json::from_value(json!({"objectID": "P1", "name": "Widget"})).expect("record")
    }

    #[test]
    fn acceptance_is_case_and_whitespace_insensitive() {
        assert!(is_acceptance("OK"));
        assert!(is_acceptance("ok"));
        assert!(is_acceptance(" OK "));
        assert!(is_acceptance("Ok"));
    }

    #[test]
    fn trailing_punctuation_is_a_replacement() {
        assert!(!is_acceptance("OK."));
        assert!(!is_acceptance("OK, looks good"));
    }

    #[test]
    fn accepted_value_passes_through_unchanged() {
        let judgment = judge_value(
            &FixedJudge("OK"),
            "test-model",
            None,
            &sample_record(),
            "summary",
            "Summarize @name",
            "A compact widget.",
        );
        assert!(judgment.accepted);
        assert_eq!(judgment.final_value, "A compact widget.");
        assert_eq!(judgment.judged_value, None);
    }

    #[test]
    fn rejection_uses_the_judge_text_verbatim() {
        let judgment = judge_value(
            &FixedJudge("Widget: compact, durable."),
            "test-model",
            None,
            &sample_record(),
            "summary",
            "Summarize @name",
            "A compact widget.",
        );
        assert!(!judgment.accepted);
        assert_eq!(judgment.final_value, "Widget: compact, durable.");
        assert_eq!(
            judgment.judged_value.as_deref(),
            Some("Widget: compact, durable.")
        );
    }

    #[test]
    fn judge_failure_fails_open() {
        let judgment = judge_value(
            &BrokenJudge,
            "test-model",
            None,
            &sample_record(),
            "summary",
            "Summarize @name",
            "A compact widget.",
        );
        assert!(judgment.accepted);
        assert_eq!(judgment.final_value, "A compact widget.");
    }

    #[test]
    fn prompt_presents_all_four_context_pieces() {
        let prompt = judgment_prompt(&sample_record(), "summary", "Summarize @name", "generated");
        assert!(prompt.contains(r#""objectID":"P1""#));
        assert!(prompt.contains("'summary'"));
        assert!(prompt.contains("'Summarize @name'"));
        assert!(prompt.contains("'generated'"));
    }
}
