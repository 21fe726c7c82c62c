use websift_common::Result;
use websift_llm::traits::{LlmClient, TextStream};

const ANSWER_SYSTEM_PROMPT: &str = "You answer questions using only the \
supplied web page contents. Never invent facts that the pages do not \
support, and rephrase rather than copying sentences verbatim.";

/// Build the grounded-answer prompt from the question and the joined page
/// contents.
pub fn answer_prompt(question: &str, page_contents: &str) -> String {
    format!(
        r#"Answer the question below using the provided web page contents.
Give as much detail as the pages support. If the pages offer several
answers or solutions, include all of them.

Format the answer in Markdown, following the example.

EXAMPLE

### Sources:
- [Source Title](Source URL)
- [Source Title](Source URL)

### Answer:
Answer text here.

END EXAMPLE

question: {question}

page contents:

{page_contents}"#
    )
}

/// Stream the synthesized answer as text deltas.
pub async fn synthesize_answer(
    llm: &dyn LlmClient,
    question: &str,
    page_contents: &str,
) -> Result<TextStream> {
    llm.generate_stream(
        &answer_prompt(question, page_contents),
        Some(ANSWER_SYSTEM_PROMPT),
        None,
        Some(0.2),
    )
    .await
}
