//! Grounded answer synthesis.
//!
//! Formats retrieved chunks into a single instructional prompt and invokes
//! the language model once per query. The template constrains the model to
//! answer only from the supplied context and to say so when the context is
//! insufficient.

use std::sync::Arc;

use tracing::debug;

use crate::document::SearchResult;
use crate::error::Result;
use crate::llm::LanguageModel;

/// The fixed question-answering template. `{context_str}` and `{query_str}`
/// are substituted at synthesis time.
const QA_TEMPLATE: &str = "You are an ESG (Environmental, Social, and Governance) expert assistant. \
Based on the provided context, answer the user's question about ESG topics. \
Always provide accurate, well-reasoned responses based on the context. \
If the context doesn't contain enough information to answer the question, \
say so clearly.\n\n\
Context:\n{context_str}\n\n\
Question: {query_str}\n\n\
Answer: ";

/// A synthesized answer with an optional confidence estimate.
#[derive(Debug, Clone)]
pub struct SynthesizedAnswer {
    /// The answer text produced by the language model.
    pub answer: String,
    /// Mean retrieval score of the context, `None` without context.
    pub confidence: Option<f32>,
}

/// Produces grounded answers from retrieved context.
///
/// Stateless between queries: one prompt, one completion. Citations are the
/// caller's context chunks unchanged and in the same order; the synthesizer
/// never invents sources.
pub struct ResponseSynthesizer {
    llm: Arc<dyn LanguageModel>,
    temperature: f32,
}

impl ResponseSynthesizer {
    /// Create a synthesizer using the given model and sampling temperature.
    pub fn new(llm: Arc<dyn LanguageModel>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Synthesize an answer to `question` grounded in `context`.
    pub async fn synthesize(
        &self,
        question: &str,
        context: &[SearchResult],
    ) -> Result<SynthesizedAnswer> {
        let prompt = build_prompt(question, context);
        debug!(context_chunks = context.len(), prompt_len = prompt.len(), "synthesizing answer");

        let answer = self.llm.complete(&prompt, self.temperature).await?;

        let confidence = if context.is_empty() {
            None
        } else {
            Some(context.iter().map(|r| r.score).sum::<f32>() / context.len() as f32)
        };

        Ok(SynthesizedAnswer { answer: answer.trim().to_string(), confidence })
    }
}

/// Fill the QA template with the context block and the question.
fn build_prompt(question: &str, context: &[SearchResult]) -> String {
    let context_str = if context.is_empty() {
        "(no relevant context found)".to_string()
    } else {
        context
            .iter()
            .map(|r| r.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    };

    QA_TEMPLATE
        .replace("{context_str}", &context_str)
        .replace("{query_str}", question)
}
