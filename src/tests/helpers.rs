// Shared fixtures and collaborator fakes for unit tests.

use crate::error::{ClassifiedError, PipelineResult};
use crate::pipeline::AnswerBody;
use crate::provider::{FaqEntry, FaqRetriever, ModelProvider, ModelStream, ThresholdSource};
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

pub fn entry(question: &str, answer: &str) -> FaqEntry {
    FaqEntry::new(question, answer)
}

/// Knowledge-base fixture used by the scenario tests. The first entry
/// matches the pricing query verbatim.
pub fn pricing_entries() -> Vec<FaqEntry> {
    vec![
        entry(
            "料金プランについて教えてください",
            "スタンダードプランは月額980円、プレミアムプランは月額1980円です。",
        ),
        entry(
            "解約の手続きを知りたい",
            "マイページの契約情報から解約手続きができます。",
        ),
    ]
}

/// Retriever fake returning a fixed candidate list.
pub struct StaticRetriever {
    pub entries: Vec<FaqEntry>,
}

#[async_trait]
impl FaqRetriever for StaticRetriever {
    async fn search(&self, _query: &str) -> PipelineResult<Vec<FaqEntry>> {
        Ok(self.entries.clone())
    }
}

/// Threshold fake with a fixed stored value (or none).
pub struct FixedThreshold(pub Option<f64>);

#[async_trait]
impl ThresholdSource for FixedThreshold {
    async fn threshold(&self) -> PipelineResult<Option<f64>> {
        Ok(self.0)
    }
}

pub enum ModelMode {
    /// Reply with a single-chunk stream.
    Reply(String),
    /// Never resolve; the executor's per-attempt timeout must fire.
    Hang,
}

/// Model fake that counts invocations.
pub struct ScriptedModel {
    pub calls: Arc<AtomicU32>,
    pub mode: ModelMode,
}

impl ScriptedModel {
    pub fn replying(text: &str) -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                mode: ModelMode::Reply(text.to_string()),
            },
            calls,
        )
    }

    pub fn hanging() -> (Self, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        (
            Self {
                calls: Arc::clone(&calls),
                mode: ModelMode::Hang,
            },
            calls,
        )
    }
}

#[async_trait]
impl ModelProvider for ScriptedModel {
    async fn complete(&self, _system_prompt: &str, _user_query: &str) -> PipelineResult<ModelStream> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            ModelMode::Reply(text) => {
                let text = text.clone();
                let stream =
                    futures_util::stream::once(async move { Ok::<_, ClassifiedError>(text) });
                Ok(Box::pin(stream) as ModelStream)
            }
            ModelMode::Hang => {
                futures_util::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }
}

/// Collect a streamed answer body into a single string, panicking on any
/// stream error.
pub async fn collect_answer(body: AnswerBody) -> String {
    match body {
        AnswerBody::Text(text) => text,
        AnswerBody::Stream(mut stream) => {
            let mut collected = String::new();
            while let Some(chunk) = stream.next().await {
                collected.push_str(&chunk.expect("stream chunk"));
            }
            collected
        }
    }
}
