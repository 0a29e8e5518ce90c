//! Query orchestration
//!
//! One call to [`Assistant::answer`] takes a question (text or audio) from
//! language detection to a delivered reply:
//!
//! ```text
//! detect → translate? → embed → retrieve → gate ─┬─ Found    → prompt → generate → translate? → deliver
//!                                                └─ NotFound → refusal ───────────────────────→ deliver
//! ```
//!
//! It never returns an error. Failures end as a `Failed` or `Unavailable`
//! reply carrying a readable message.

use super::language::{LanguageClassifier, TranslationPlan};
use super::refusal::{self, EMPTY_INPUT_EN, REFUSAL_EN, UNAVAILABLE_EN};
use super::state::{QueryEvent, QueryState, QueryTrace};
use crate::config::Config;
use crate::conversation::{PromptAssembler, Session, TranscriptLog};
use crate::embedding::{EmbeddingGateway, GatewayConfig};
use crate::errors::{RagError, Result};
use crate::index::{KnowledgeHandle, Retrieval, Retriever};
use crate::providers::{
    self, GenerationProvider, LanguageDetector, SpeechToText, TextToSpeech, TranslationProvider,
};
use crate::retry::RetryPolicy;
use crate::types::ChatMessage;
use std::sync::Arc;
use std::time::Duration;

/// What the caller asked with
#[derive(Debug, Clone)]
pub enum Input {
    Text(String),
    /// WAV audio to be recognized first
    Audio(Vec<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Answered,
    Refused,
    Unavailable,
    Failed,
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub text: String,
    /// Language tag of `text`
    pub language: String,
    pub outcome: Outcome,
    pub trail: Vec<QueryState>,
    /// Synthesized speech, when speech output is on and succeeded
    pub audio: Option<Vec<u8>>,
}

/// Tunables for answering
#[derive(Debug, Clone)]
pub struct AnswerSettings {
    pub temperature: f32,
    pub pivot: String,
    pub code_mixed_reply: String,
    /// Language assumed when recognizing audio input
    pub recognition_language: String,
    pub generation_retry: RetryPolicy,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            pivot: "en".to_string(),
            code_mixed_reply: "hi".to_string(),
            recognition_language: "hi".to_string(),
            generation_retry: RetryPolicy::retry_once(Duration::from_secs(2)),
        }
    }
}

impl AnswerSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            temperature: config.generation.temperature,
            pivot: config.language.pivot.clone(),
            code_mixed_reply: config.language.code_mixed_reply.clone(),
            recognition_language: config.language.code_mixed_reply.clone(),
            generation_retry: RetryPolicy::retry_once(Duration::from_millis(
                config.generation.retry_backoff_ms,
            ))
            .with_timeout(config.generation.provider.timeout()),
        }
    }
}

pub struct Assistant {
    gateway: EmbeddingGateway,
    retriever: Retriever,
    generator: Arc<dyn GenerationProvider>,
    classifier: LanguageClassifier,
    assembler: PromptAssembler,
    translator: Option<Arc<dyn TranslationProvider>>,
    speech_in: Option<Arc<dyn SpeechToText>>,
    speech_out: Option<Arc<dyn TextToSpeech>>,
    transcripts: Option<TranscriptLog>,
    settings: AnswerSettings,
}

impl Assistant {
    pub fn new(
        gateway: EmbeddingGateway,
        retriever: Retriever,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            gateway,
            retriever,
            generator,
            classifier: LanguageClassifier::default(),
            assembler: PromptAssembler::default(),
            translator: None,
            speech_in: None,
            speech_out: None,
            transcripts: None,
            settings: AnswerSettings::default(),
        }
    }

    /// Wire every provider from configuration
    pub fn from_config(config: &Config, knowledge: KnowledgeHandle) -> Result<Self> {
        let embedder = providers::build_embedder(&config.embedding)?;
        let gateway = EmbeddingGateway::new(embedder, GatewayConfig::from(&config.embedding));
        let retriever = Retriever::from_config(knowledge, &config.retrieval);
        let generator = providers::build_generator(&config.generation)?;

        let mut assistant = Self::new(gateway, retriever, generator)
            .with_assembler(PromptAssembler::from_config(&config.conversation))
            .with_settings(AnswerSettings::from_config(config));

        if let Some(translator) = providers::build_translator(&config.language)? {
            assistant = assistant.with_translator(translator);
        }
        if let Some(speech) = providers::build_speech(&config.speech)? {
            assistant = assistant.with_speech_input(speech.clone()).with_speech_output(speech);
        }
        if config.conversation.transcripts {
            assistant = assistant.with_transcripts(TranscriptLog::new(config.transcript_dir())?);
        }

        Ok(assistant)
    }

    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.classifier = LanguageClassifier::new(detector);
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn with_translator(mut self, translator: Arc<dyn TranslationProvider>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_speech_input(mut self, speech: Arc<dyn SpeechToText>) -> Self {
        self.speech_in = Some(speech);
        self
    }

    pub fn with_speech_output(mut self, speech: Arc<dyn TextToSpeech>) -> Self {
        self.speech_out = Some(speech);
        self
    }

    pub fn with_transcripts(mut self, transcripts: TranscriptLog) -> Self {
        self.transcripts = Some(transcripts);
        self
    }

    pub fn with_settings(mut self, settings: AnswerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn knowledge(&self) -> &KnowledgeHandle {
        self.retriever.knowledge()
    }

    /// Answer one question within `session`.
    ///
    /// History grows only when generation succeeded.
    pub async fn answer(&self, session: &mut Session, input: Input) -> Reply {
        let mut trace = QueryTrace::new();
        let pivot = self.settings.pivot.clone();

        let query = match input {
            Input::Text(text) => text,
            Input::Audio(bytes) => self.recognize(&bytes).await,
        };
        let query = query.trim().to_string();
        self.log_transcript(session, true, &query);

        if query.is_empty() {
            step(&mut trace, QueryEvent::Fail);
            return self
                .finish(session, trace, Outcome::Failed, EMPTY_INPUT_EN.to_string(), pivot)
                .await;
        }

        let language = self.classifier.classify(&query).await;
        let plan = TranslationPlan::for_language(
            &language,
            &pivot,
            &self.settings.code_mixed_reply,
        );
        tracing::debug!("query language: {} (reply in {})", language, plan.reply_language);

        let pivot_query = match (&plan.query_from, &self.translator) {
            (Some(from), Some(_)) => {
                let translated = self.translate(&query, from.as_deref(), &pivot).await;
                step(&mut trace, QueryEvent::TranslateQuery);
                translated
            }
            _ => query.clone(),
        };

        if !self.retriever.knowledge().is_available() {
            step(&mut trace, QueryEvent::NoKnowledge);
            let text = self.localize(UNAVAILABLE_EN, &plan).await;
            return self
                .finish(session, trace, Outcome::Unavailable, text, plan.reply_language)
                .await;
        }

        let query_vector = match self.gateway.embed_query(&pivot_query).await {
            Ok(vector) => vector,
            Err(e) => return self.fail(session, trace, &e, &plan).await,
        };
        step(&mut trace, QueryEvent::Embed);

        let retrieval = match self.retriever.retrieve(&query_vector) {
            Ok(retrieval) => retrieval,
            Err(RagError::KnowledgeBaseUnavailable) => {
                step(&mut trace, QueryEvent::NoKnowledge);
                let text = self.localize(UNAVAILABLE_EN, &plan).await;
                return self
                    .finish(session, trace, Outcome::Unavailable, text, plan.reply_language)
                    .await;
            }
            Err(e) => return self.fail(session, trace, &e, &plan).await,
        };
        step(&mut trace, QueryEvent::Retrieve);

        let passages = match retrieval {
            Retrieval::Found(passages) => passages,
            Retrieval::NotFound => {
                step(&mut trace, QueryEvent::Irrelevant);
                tracing::info!("no passage within threshold {}, refusing", self.retriever.threshold());
                let text = match refusal::refusal_for(&plan.reply_language) {
                    Some(text) => text.to_string(),
                    None => {
                        let text = self.localize(REFUSAL_EN, &plan).await;
                        if plan.translates_reply(&pivot) && self.translator.is_some() {
                            step(&mut trace, QueryEvent::TranslateAnswer);
                        }
                        text
                    }
                };
                step(&mut trace, QueryEvent::Deliver);
                return self
                    .finish(session, trace, Outcome::Refused, text, plan.reply_language)
                    .await;
            }
        };
        step(&mut trace, QueryEvent::Relevant);

        let messages = self.assembler.assemble(&passages, &session.history, &pivot_query);
        let generated = self
            .settings
            .generation_retry
            .execute("generation", || self.generate(&messages))
            .await;

        let answer = match generated {
            Ok(answer) => answer,
            Err(e) => return self.fail(session, trace, &e, &plan).await,
        };
        step(&mut trace, QueryEvent::Generate);
        session.record(pivot_query, answer.clone());

        let text = if plan.translates_reply(&pivot) && self.translator.is_some() {
            let translated = self.translate(&answer, Some(&pivot), &plan.reply_language).await;
            step(&mut trace, QueryEvent::TranslateAnswer);
            translated
        } else {
            answer
        };
        step(&mut trace, QueryEvent::Deliver);

        self.finish(session, trace, Outcome::Answered, text, plan.reply_language)
            .await
    }

    /// One completion; a blank one counts as a provider failure
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let answer = self
            .generator
            .complete(messages, self.settings.temperature)
            .await?;
        if answer.trim().is_empty() {
            return Err(RagError::provider(self.generator.name(), "empty completion"));
        }
        Ok(answer)
    }

    async fn fail(
        &self,
        session: &Session,
        mut trace: QueryTrace,
        error: &RagError,
        plan: &TranslationPlan,
    ) -> Reply {
        tracing::error!("query failed: {}", error);
        step(&mut trace, QueryEvent::Fail);
        let text = self.localize(&refusal::apology(&error.to_string()), plan).await;
        self.finish(session, trace, Outcome::Failed, text, plan.reply_language.clone())
            .await
    }

    async fn finish(
        &self,
        session: &Session,
        trace: QueryTrace,
        outcome: Outcome,
        text: String,
        language: String,
    ) -> Reply {
        self.log_transcript(session, false, &text);
        let audio = self.synthesize(&text, &language).await;

        Reply {
            text,
            language,
            outcome,
            trail: trace.into_trail(),
            audio,
        }
    }

    /// English text in the reply language, falling back to English
    async fn localize(&self, english: &str, plan: &TranslationPlan) -> String {
        if !plan.translates_reply(&self.settings.pivot) {
            return english.to_string();
        }
        self.translate(english, Some(&self.settings.pivot), &plan.reply_language)
            .await
    }

    /// Translation that falls back to the original text
    async fn translate(&self, text: &str, from: Option<&str>, to: &str) -> String {
        let Some(translator) = &self.translator else {
            return text.to_string();
        };

        match translator.translate(text, from, to).await {
            Ok(translated) => translated,
            Err(e) => {
                tracing::warn!("translation to {} failed, keeping original: {}", to, e);
                text.to_string()
            }
        }
    }

    async fn recognize(&self, audio: &[u8]) -> String {
        let Some(speech) = &self.speech_in else {
            tracing::warn!("audio input received but speech recognition is not configured");
            return String::new();
        };

        match speech.recognize(audio, &self.settings.recognition_language).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("speech recognition failed: {}", e);
                String::new()
            }
        }
    }

    async fn synthesize(&self, text: &str, language: &str) -> Option<Vec<u8>> {
        let speech = self.speech_out.as_ref()?;
        match speech.synthesize(text, language).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!("speech synthesis failed: {}", e);
                None
            }
        }
    }

    fn log_transcript(&self, session: &Session, input: bool, text: &str) {
        let Some(log) = &self.transcripts else {
            return;
        };
        let id = session.short_id();
        let result = if input {
            log.record_input(&id, text)
        } else {
            log.record_output(&id, text)
        };
        if let Err(e) = result {
            tracing::warn!("failed to write transcript: {}", e);
        }
    }
}

fn step(trace: &mut QueryTrace, event: QueryEvent) {
    if let Err(e) = trace.advance(event) {
        tracing::error!("{}", e);
    }
}
