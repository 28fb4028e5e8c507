use std::time::Instant;

use tracing::{debug, info, warn};

use super::{GenerationOptions, LlmProvider};
use crate::metrics::{track_llm_attempt, track_llm_fallback};

/// Runs a prompt cascade and returns the first output `validate` accepts.
///
/// Each prompt is tried up to `attempts` times before moving to the next.
/// Provider errors count as failed attempts. `None` means every attempt
/// failed and the caller should use its canned fallback.
pub async fn first_valid<T, F>(
    llm: &dyn LlmProvider,
    task: &'static str,
    prompts: &[String],
    attempts: usize,
    options: &GenerationOptions,
    mut validate: F,
) -> Option<T>
where
    F: FnMut(&str) -> Option<T>,
{
    for (prompt_index, prompt) in prompts.iter().enumerate() {
        for attempt in 1..=attempts {
            let started = Instant::now();
            let outcome = llm.generate(prompt, options).await;
            let elapsed = started.elapsed().as_secs_f64();

            match outcome {
                Ok(text) => {
                    if let Some(value) = validate(&text) {
                        track_llm_attempt(task, true, elapsed);
                        info!(task, prompt = prompt_index + 1, attempt, "Generation accepted");
                        return Some(value);
                    }
                    track_llm_attempt(task, false, elapsed);
                    debug!(
                        task,
                        prompt = prompt_index + 1,
                        attempt,
                        response_len = text.len(),
                        "Generation rejected by validator"
                    );
                }
                Err(e) => {
                    track_llm_attempt(task, false, elapsed);
                    warn!(task, prompt = prompt_index + 1, attempt, error = %e, "Generation failed");
                }
            }
        }
    }

    warn!(task, prompts = prompts.len(), attempts, "All generation attempts failed");
    track_llm_fallback(task);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{LlmError, ScriptedLlm};

    #[tokio::test]
    async fn test_returns_first_accepted_output() {
        let llm = ScriptedLlm::new(["bad", "12", "7"]);
        let prompts = vec!["p1".to_string()];

        let result = first_valid(&llm, "test", &prompts, 3, &GenerationOptions::default(), |t| {
            t.parse::<u32>().ok().filter(|n| *n < 10)
        })
        .await;

        assert_eq!(result, Some(7));
        assert_eq!(llm.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_moves_to_next_prompt_after_attempts() {
        let llm = ScriptedLlm::new(["x", "x", "ok"]);
        let prompts = vec!["first".to_string(), "second".to_string()];

        let result = first_valid(&llm, "test", &prompts, 2, &GenerationOptions::default(), |t| {
            (t == "ok").then(|| t.to_string())
        })
        .await;

        assert_eq!(result.as_deref(), Some("ok"));
        assert_eq!(llm.prompts(), vec!["first", "first", "second"]);
    }

    #[tokio::test]
    async fn test_errors_count_as_attempts() {
        let llm = ScriptedLlm::from_results(vec![
            Err(LlmError::Empty),
            Err(LlmError::Transport("down".into())),
        ]);
        let prompts = vec!["p".to_string()];

        let result: Option<String> =
            first_valid(&llm, "test", &prompts, 2, &GenerationOptions::default(), |t| {
                Some(t.to_string())
            })
            .await;

        assert!(result.is_none());
        assert_eq!(llm.prompts().len(), 2);
    }
}
