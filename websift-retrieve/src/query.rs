use websift_common::{Result, WebsiftError};
use websift_llm::traits::LlmClient;

/// Turn a free-text question into a compact search-engine query.
///
/// One generation call with a fixed instruction template; no retries. A
/// collaborator failure is fatal to the whole retrieval and surfaces as
/// [`WebsiftError::QueryGeneration`].
pub async fn formulate_query(llm: &dyn LlmClient, question: &str) -> Result<String> {
    let prompt = format!(
        "Based on the provided question, generate a query that can be used to \
         search the web for relevant results. Respond with the query alone on \
         a single line. Do not quote the output.\n\nquestion: {question}"
    );

    let response = llm
        .generate(&prompt, None, Some(64), Some(0.0))
        .await
        .map_err(|e| WebsiftError::QueryGeneration(e.to_string()))?;

    Ok(response.text.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeLlm;

    #[tokio::test]
    async fn returns_trimmed_query_text() {
        let llm = FakeLlm::returning("  capital of France \n");
        let query = formulate_query(&llm, "What is the capital of France?")
            .await
            .unwrap();
        assert_eq!(query, "capital of France");
    }

    #[tokio::test]
    async fn prompt_embeds_the_question() {
        let llm = FakeLlm::returning("q");
        formulate_query(&llm, "how do rockets work").await.unwrap();
        let prompt = llm.last_prompt();
        assert!(prompt.contains("question: how do rockets work"));
        assert!(prompt.contains("Do not quote the output"));
    }

    #[tokio::test]
    async fn collaborator_failure_maps_to_query_generation() {
        let llm = FakeLlm::failing("model unavailable");
        let err = formulate_query(&llm, "anything").await.unwrap_err();
        assert!(matches!(err, WebsiftError::QueryGeneration(_)));
        assert!(err.to_string().contains("model unavailable"));
    }
}
