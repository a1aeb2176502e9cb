//! Answer composition.
//!
//! Turns a user query into an [`Answer`]:
//!
//! 1. A bare greeting (`"hola"`, `"¡Buenas!"`, …) gets a canned reply with
//!    no retrieval and no LLM call.
//! 2. Otherwise the top-k fragments are retrieved. With none, a fixed
//!    "nothing relevant" reply is returned, again without an LLM call.
//! 3. Otherwise the fragments' content (best first, blank-line separated)
//!    becomes the context of the user prompt, and the [`Generator`] writes
//!    the answer.
//!
//! Generation failures never escape: they become an error-prefixed answer
//! that still carries the retrieved sources.

use serde::Serialize;

use aula_core::store::SnapshotStore;
use aula_core::{DocumentIndex, ScoredFragment};

use crate::llm::Generator;

/// Normalized phrases treated as greetings.
const GREETINGS: &[&str] = &["hola", "buenas", "que tal", "hey", "saludos", "como estas"];

pub const GREETING_REPLY: &str =
    "¡Hola! ¿En qué tema del material educativo te gustaría que te ayude?";

pub const NO_CONTEXT_REPLY: &str = "No encontré información relevante en los documentos cargados. \
     Por favor, sube material relacionado con tu pregunta.";

pub const GENERATION_ERROR_PREFIX: &str = "Error al generar respuesta";

pub const SYSTEM_PROMPT: &str = "Eres un asistente educativo especializado en ingeniería de sistemas. \
Tu trabajo es ayudar a estudiantes y profesores respondiendo preguntas basadas en el material educativo proporcionado.

Instrucciones:
- Responde únicamente basándote en el contexto proporcionado
- Si la información no está en el contexto, indícalo claramente
- Sé preciso y educativo en tus respuestas
- Usa ejemplos del material cuando sea apropiado
- Mantén un tono profesional pero amigable
- Responde en español";

/// Final answer plus the fragments it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub answer: String,
    /// Retrieved fragments, best first. Empty when no retrieval happened.
    pub sources: Vec<ScoredFragment>,
}

/// Lowercase, trim, and strip punctuation, keeping word characters and whitespace.
fn normalize_greeting(query: &str) -> String {
    query
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

pub fn is_greeting(query: &str) -> bool {
    let normalized = normalize_greeting(query);
    GREETINGS.contains(&normalized.as_str())
}

/// Context block: fragment contents joined by blank lines, in the given order.
pub fn build_context(sources: &[ScoredFragment]) -> String {
    sources
        .iter()
        .map(|s| s.fragment.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_user_prompt(context: &str, query: &str) -> String {
    format!(
        "Contexto del material educativo:\n{}\n\n\
         Pregunta del estudiante/profesor: {}\n\n\
         Por favor, proporciona una respuesta detallada basada únicamente en el material proporcionado.",
        context, query
    )
}

/// Answer `query` from `index`, delegating text generation to `generator`.
pub fn compose_answer<S: SnapshotStore>(
    query: &str,
    index: &mut DocumentIndex<S>,
    generator: &dyn Generator,
    top_k: usize,
) -> Answer {
    if is_greeting(query) {
        return Answer {
            answer: GREETING_REPLY.to_string(),
            sources: Vec::new(),
        };
    }

    let sources = index.search(query, top_k);
    if sources.is_empty() {
        return Answer {
            answer: NO_CONTEXT_REPLY.to_string(),
            sources,
        };
    }

    let context = build_context(&sources);
    let user_prompt = build_user_prompt(&context, query);

    match generator.generate(SYSTEM_PROMPT, &user_prompt) {
        Ok(text) => Answer {
            answer: text,
            sources,
        },
        Err(e) => {
            tracing::warn!(error = %e, model = generator.model_name(), "answer generation failed");
            Answer {
                answer: format!(
                    "{}: {}. Verifica tu configuración de API.",
                    GENERATION_ERROR_PREFIX, e
                ),
                sources,
            }
        }
    }
}
