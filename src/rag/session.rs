//! Tutor session: persona policy and conversation history over a chat engine.
//!
//! The session appends the language-enforcement suffix to every outgoing
//! message, relays it to the engine, extracts citations from the sources, and
//! records the exchange for display. History is process-memory only.

use super::{ChatEngine, ChatRole, ContextChunk};
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A recorded conversation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    /// Turn text. User turns hold the text as typed, without the suffix.
    pub content: String,
    /// Rendered citation block, on assistant turns with sources.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sources: Option<String>,
}

impl ChatTurn {
    fn user(content: &str) -> Self {
        Self {
            role: ChatRole::User,
            content: content.to_string(),
            sources: None,
        }
    }

    fn assistant(content: String, sources: Option<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content,
            sources,
        }
    }
}

/// A citation pointing back into the course materials.
#[derive(Debug, Clone)]
pub struct Citation {
    /// File name of the cited material.
    pub source: String,
    /// Relevance score, when the engine supplied one.
    pub score: Option<f32>,
}

impl Citation {
    /// Render one citation line at the given 1-based position.
    pub fn render(&self, position: usize) -> String {
        let score = match self.score {
            Some(s) => format!("{:.2}", s),
            None => "N/A".to_string(),
        };
        format!(
            "**[文獻片段 {}]** `{}` (關聯權重: {})\n\n",
            position, self.source, score
        )
    }
}

/// Render the citation block for a set of retrieved chunks.
fn render_citations(sources: &[ContextChunk]) -> Option<String> {
    if sources.is_empty() {
        return None;
    }

    let mut block = String::new();
    for (i, chunk) in sources.iter().enumerate() {
        let citation = Citation {
            source: chunk.source_file.clone(),
            score: Some(chunk.score),
        };
        block.push_str(&citation.render(i + 1));
    }
    Some(block)
}

/// One user's conversation with the tutor.
pub struct TutorSession {
    engine: Box<dyn ChatEngine>,
    language_suffix: String,
    show_sources: bool,
    history: Vec<ChatTurn>,
}

impl TutorSession {
    /// Create a session over a chat engine.
    pub fn new(engine: Box<dyn ChatEngine>, language_suffix: &str, show_sources: bool) -> Self {
        Self {
            engine,
            language_suffix: language_suffix.to_string(),
            show_sources,
            history: Vec::new(),
        }
    }

    /// Run one tutor turn and return the recorded assistant reply.
    ///
    /// The user turn is recorded before the engine is called; if the engine
    /// fails, the error propagates and the user turn stays in the history.
    pub async fn send(&mut self, message: &str) -> Result<ChatTurn> {
        self.history.push(ChatTurn::user(message));

        let relayed = format!("{}{}", message, self.language_suffix);
        let response = self.engine.chat(&relayed).await?;

        let sources = if self.show_sources {
            render_citations(&response.sources)
        } else {
            None
        };

        let turn = ChatTurn::assistant(response.answer, sources);
        self.history.push(turn.clone());
        Ok(turn)
    }

    /// The full conversation so far, oldest first.
    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// Forget the conversation, on both sides of the engine boundary.
    pub fn clear(&mut self) {
        self.history.clear();
        self.engine.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocentError;
    use crate::rag::EngineResponse;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Engine double that records what it was asked and replays answers.
    struct ScriptedEngine {
        answers: VecDeque<EngineResponse>,
        seen: Arc<Mutex<Vec<String>>>,
        resets: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ScriptedEngine {
        fn new(answers: Vec<EngineResponse>) -> (Self, Arc<Mutex<Vec<String>>>, Arc<AtomicUsize>) {
            let seen = Arc::new(Mutex::new(Vec::new()));
            let resets = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    answers: answers.into(),
                    seen: seen.clone(),
                    resets: resets.clone(),
                    fail: false,
                },
                seen,
                resets,
            )
        }

        fn failing() -> Self {
            Self {
                answers: VecDeque::new(),
                seen: Arc::new(Mutex::new(Vec::new())),
                resets: Arc::new(AtomicUsize::new(0)),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl ChatEngine for ScriptedEngine {
        async fn chat(&mut self, message: &str) -> Result<EngineResponse> {
            self.seen.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(DocentError::OpenAI("upstream failure".to_string()));
            }
            Ok(self.answers.pop_front().unwrap_or(EngineResponse {
                answer: "預設回答".to_string(),
                sources: Vec::new(),
            }))
        }

        fn reset(&mut self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn answer(text: &str, sources: Vec<ContextChunk>) -> EngineResponse {
        EngineResponse {
            answer: text.to_string(),
            sources,
        }
    }

    fn chunk(source: &str, score: f32) -> ContextChunk {
        ContextChunk {
            source_file: source.to_string(),
            content: "excerpt".to_string(),
            score,
        }
    }

    const SUFFIX: &str = " (注意：請務必以繁體中文回答，嚴禁簡體)";

    #[tokio::test]
    async fn test_suffix_appended_to_relayed_message_only() {
        let (engine, seen, _) = ScriptedEngine::new(vec![answer("存量是累積量。", vec![])]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        session.send("什麼是存量？").await.unwrap();

        assert_eq!(seen.lock().unwrap()[0], format!("什麼是存量？{}", SUFFIX));
        // The recorded user turn holds the text as typed.
        assert_eq!(session.history()[0].content, "什麼是存量？");
    }

    #[tokio::test]
    async fn test_answer_recorded_verbatim() {
        let engine_answer = "存量（Stock）是系統中隨時間累積的量。";
        let (engine, _, _) = ScriptedEngine::new(vec![answer(engine_answer, vec![])]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        let turn = session.send("什麼是存量？").await.unwrap();

        assert_eq!(turn.content, engine_answer);
        assert_eq!(session.history()[1].content, engine_answer);
    }

    #[tokio::test]
    async fn test_history_order_and_roles() {
        let (engine, _, _) = ScriptedEngine::new(vec![
            answer("回答一", vec![]),
            answer("回答二", vec![]),
        ]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        session.send("問題一").await.unwrap();
        session.send("問題二").await.unwrap();

        let history = session.history();
        assert_eq!(history.len(), 4);
        let expected = [
            (ChatRole::User, "問題一"),
            (ChatRole::Assistant, "回答一"),
            (ChatRole::User, "問題二"),
            (ChatRole::Assistant, "回答二"),
        ];
        for (turn, (role, content)) in history.iter().zip(expected.iter()) {
            assert_eq!(turn.role, *role);
            assert_eq!(turn.content, *content);
        }
    }

    #[tokio::test]
    async fn test_engine_error_keeps_user_turn() {
        let mut session = TutorSession::new(Box::new(ScriptedEngine::failing()), SUFFIX, true);

        let err = session.send("問題").await.unwrap_err();
        assert!(matches!(err, DocentError::OpenAI(_)));

        let history = session.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, ChatRole::User);
        assert_eq!(history[0].content, "問題");
    }

    #[tokio::test]
    async fn test_citations_rendered_with_scores() {
        let (engine, _, _) = ScriptedEngine::new(vec![answer(
            "回答",
            vec![chunk("ch3_stocks.txt", 0.8234), chunk("ch5_delays.txt", 0.61)],
        )]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        let turn = session.send("問題").await.unwrap();
        let sources = turn.sources.unwrap();

        assert!(sources.contains("**[文獻片段 1]** `ch3_stocks.txt` (關聯權重: 0.82)"));
        assert!(sources.contains("**[文獻片段 2]** `ch5_delays.txt` (關聯權重: 0.61)"));
    }

    #[tokio::test]
    async fn test_no_sources_no_citation_block() {
        let (engine, _, _) = ScriptedEngine::new(vec![answer("回答", vec![])]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        let turn = session.send("問題").await.unwrap();
        assert!(turn.sources.is_none());
    }

    #[tokio::test]
    async fn test_show_sources_off_suppresses_citations() {
        let (engine, _, _) = ScriptedEngine::new(vec![answer("回答", vec![chunk("ch3.txt", 0.9)])]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, false);

        let turn = session.send("問題").await.unwrap();
        assert!(turn.sources.is_none());
    }

    #[tokio::test]
    async fn test_clear_resets_history_and_engine() {
        let (engine, _, resets) = ScriptedEngine::new(vec![answer("回答", vec![])]);
        let mut session = TutorSession::new(Box::new(engine), SUFFIX, true);

        session.send("問題").await.unwrap();
        session.clear();

        assert!(session.history().is_empty());
        assert_eq!(resets.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_citation_without_score_renders_placeholder() {
        let citation = Citation {
            source: "ch11.txt".to_string(),
            score: None,
        };
        assert_eq!(
            citation.render(1),
            "**[文獻片段 1]** `ch11.txt` (關聯權重: N/A)\n\n"
        );
    }
}
