//! Builds the grounded question-answering prompt from retrieved chunks

use crate::providers::VectorSearchResult;

/// System message sent with every generation request
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant for course materials.";

/// Assembles retrieved chunks and a question into an LLM prompt
#[derive(Debug, Default, Clone, Copy)]
pub struct PromptBuilder;

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Join retrieved chunks into a numbered context block
    pub fn build_context(&self, results: &[VectorSearchResult]) -> String {
        results
            .iter()
            .enumerate()
            .map(|(i, result)| format!("Chunk {}: {}", i + 1, result.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the user prompt: grounding instructions, context, question
    pub fn build_prompt(&self, question: &str, context: &str) -> String {
        format!(
            "Use ONLY the following context to answer the user's question. \
             If the answer is not in the context, say you don't know.\n\n\
             Context:\n{}\n\n\
             Question: {}\nAnswer:",
            context, question
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMeta;
    use uuid::Uuid;

    fn result(content: &str) -> VectorSearchResult {
        VectorSearchResult {
            content: content.to_string(),
            meta: ChunkMeta {
                user_id: Uuid::new_v4(),
                class_id: Uuid::new_v4(),
                document_id: Uuid::new_v4(),
                page_number: 1,
            },
            chunk_index: 0,
            score: 0.9,
        }
    }

    #[test]
    fn test_context_numbers_chunks_from_one() {
        let builder = PromptBuilder::new();
        let context = builder.build_context(&[result("first"), result("second")]);
        assert_eq!(context, "Chunk 1: first\n\nChunk 2: second");
    }

    #[test]
    fn test_prompt_contains_context_and_question() {
        let builder = PromptBuilder::new();
        let prompt = builder.build_prompt("What is recursion?", "Chunk 1: recursion is...");
        assert!(prompt.contains("Use ONLY the following context"));
        assert!(prompt.contains("Context:\nChunk 1: recursion is..."));
        assert!(prompt.ends_with("Question: What is recursion?\nAnswer:"));
    }
}
