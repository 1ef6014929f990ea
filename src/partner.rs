//! AI conversation partner.
//!
//! A partner reply always produces text: the LLM connector is tried first when
//! configured, and any error, timeout or blank reply falls back to the local
//! canned responder so the turn can still be scored.

use crate::anthropic::{self, AnthropicClient};
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::logging;
use crate::openai::{ChatMessage, OpenAIClient};
use crate::roles::Role;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use std::time::Duration;

const TOPICS: &[&str] = &[
    "movies",
    "music",
    "work",
    "burnout",
    "kids",
    "gaming",
    "habits",
    "goals",
    "friendship",
    "travel",
];

// ============ Local Responder ============

/// Canned phrases keyed by role and whether the player just asked a question.
pub struct LocalResponder<R: Rng> {
    rng: R,
}

impl LocalResponder<StdRng> {
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> LocalResponder<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    fn pick(&mut self, options: &[String]) -> String {
        options
            .choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| "Tell me more.".to_string())
    }

    pub fn reply(&mut self, role: Role, player_last: &str) -> String {
        let topic = TOPICS.choose(&mut self.rng).copied().unwrap_or("music");
        let asked = player_last.contains('?');

        let options: Vec<String> = match (role, asked) {
            (Role::Listener, true) => vec![
                "That's fair. What makes you ask?".into(),
                "I hear you. What part matters most to you?".into(),
                "I can answer, but what's your take first?".into(),
            ],
            (Role::Listener, false) => vec![
                "That makes sense. Tell me more.".into(),
                "Good point. When did you first notice that?".into(),
                "What's the best example you've seen?".into(),
            ],
            (Role::Challenger, true) => vec![
                "Before I answer, why does that matter to you?".into(),
                "What do you mean exactly? Can you define it?".into(),
                "Are we assuming that's true, or testing it?".into(),
            ],
            (Role::Challenger, false) => vec![
                "What if the opposite is true?".into(),
                "What evidence would change your mind?".into(),
                "Is there a simpler explanation?".into(),
            ],
            (Role::Synthesizer, true) => vec![
                format!("So you're asking how {} fits in. For me it ties everything together.", topic),
                "In other words, you want the bigger picture. I think it's about balance.".into(),
                "It sounds like you're connecting a few ideas. I feel they share one root.".into(),
            ],
            (Role::Synthesizer, false) => vec![
                "So if I put those together, it sounds like consistency matters most?".into(),
                "In other words, the common thread is what you value. Is that right?".into(),
                format!("To summarize, {} keeps coming up. Does that fit?", topic),
            ],
            (Role::Explorer, true) => vec![
                format!("Good question. I think {} is a surprising angle on it.", topic),
                format!("For me, it reminds me of {}. Ever seen it that way?", topic),
                "I have a wild guess: it depends on who you ask. What would a kid say?".into(),
            ],
            (Role::Explorer, false) => vec![
                format!("What if we looked at this through {}?", topic),
                format!("Here's an odd link: how does {} connect to this?", topic),
                "What's the strangest version of this you've heard of?".into(),
            ],
            (Role::Initiator, true) => vec![
                format!("Good question. I think {} matters because it shapes choices.", topic),
                format!("Honestly, {} affects my energy more than I expected.", topic),
                format!("For me, {} changes how I show up around people.", topic),
            ],
            (Role::Initiator, false) => vec![
                format!("Let's talk about {}. What's your experience?", topic),
                format!("I've been thinking about {} lately. What do you think?", topic),
                format!("Topic idea: {}. Are you into that?", topic),
            ],
        };

        self.pick(&options)
    }
}

// ============ LLM Connector ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Anthropic,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::OpenAI => "openai",
            Provider::Anthropic => "anthropic",
        }
    }

    pub fn parse(s: &str) -> Option<Provider> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Some(Provider::OpenAI),
            "anthropic" => Some(Provider::Anthropic),
            _ => None,
        }
    }
}

enum ProviderClient {
    OpenAI(OpenAIClient),
    Anthropic(AnthropicClient),
}

/// Role-playing system prompt for the partner.
pub fn system_prompt(role: Role) -> String {
    let role_desc = match role {
        Role::Initiator => {
            "You are the Initiator. You bring up new topics, propose ideas, and drive the conversation forward. \
             Ask open-ended questions about interesting topics. Share your own perspectives to spark discussion. \
             When the conversation stalls, introduce a fresh angle."
        }
        Role::Listener => {
            "You are the Listener. You focus on understanding and validating what the other person says. \
             Reflect their ideas back, ask clarifying follow-up questions, and show that you genuinely hear them. \
             Use phrases like 'tell me more' or 'what matters most to you about that'. Avoid changing the subject."
        }
        Role::Challenger => {
            "You are the Challenger. You respectfully push back on ideas, ask for evidence, and test assumptions. \
             Play devil's advocate when appropriate. Ask 'why' and 'what if the opposite were true'. \
             Never be hostile; be intellectually curious and constructively skeptical."
        }
        Role::Synthesizer => {
            "You are the Synthesizer. You connect ideas, find common threads, and summarize what has been discussed. \
             Use phrases like 'it sounds like', 'in other words', and 'to bring these together'. \
             Help the conversation reach deeper understanding by linking concepts."
        }
        Role::Explorer => {
            "You are the Explorer. You are curious and adventurous in conversation. \
             Ask unexpected questions, make creative connections between topics, and venture into new territory. \
             Be enthusiastic about discovering new ideas together."
        }
    };

    format!(
        "You are a conversational training partner in a communication skills game called Chatter's Guild.\n\
         You are playing the role of {}.\n\n\
         {}\n\n\
         Guidelines:\n\
         - Keep responses to 1-3 sentences. Be concise.\n\
         - Stay in character for your role.\n\
         - Do not mention that you are an AI.\n\
         - Respond naturally as a human conversation partner would.",
        role, role_desc
    )
}

/// Build the full message list: system prompt, history, then the player's last message.
pub fn build_messages(role: Role, player_last: &str, history: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(&system_prompt(role)));
    messages.extend(history.iter().cloned());
    messages.push(ChatMessage::user(player_last));
    messages
}

pub struct LlmConnector {
    config: LlmConfig,
    client: ProviderClient,
}

impl LlmConnector {
    pub fn new(config: LlmConfig, timeout: Duration) -> Result<Self> {
        if !config.is_valid() {
            return Err(Error::config("LLM config needs provider, api_key and endpoint"));
        }
        let provider = Provider::parse(&config.provider).ok_or_else(|| {
            Error::config(format!("Unsupported LLM provider '{}'", config.provider))
        })?;

        let client = match provider {
            Provider::OpenAI => ProviderClient::OpenAI(OpenAIClient::new(
                &config.api_key,
                &config.endpoint,
                &config.model,
                timeout,
            )?),
            Provider::Anthropic => ProviderClient::Anthropic(AnthropicClient::new(
                &config.api_key,
                &config.endpoint,
                &config.model,
                timeout,
            )?),
        };

        Ok(Self { config, client })
    }

    pub fn provider(&self) -> Provider {
        match self.client {
            ProviderClient::OpenAI(_) => Provider::OpenAI,
            ProviderClient::Anthropic(_) => Provider::Anthropic,
        }
    }

    /// e.g. `openai/gpt-4o`
    pub fn provider_label(&self) -> String {
        format!("{}/{}", self.provider().as_str(), self.config.model)
    }

    pub async fn request_reply(
        &self,
        role: Role,
        player_last: &str,
        history: &[ChatMessage],
    ) -> Result<String> {
        let messages = build_messages(role, player_last, history);
        let reply = match &self.client {
            ProviderClient::OpenAI(client) => {
                client
                    .chat_completion(messages, self.config.temperature, self.config.max_tokens)
                    .await?
            }
            ProviderClient::Anthropic(client) => {
                let (system, messages) = anthropic::split_system_prompt(messages);
                client
                    .chat_completion(
                        system.as_deref(),
                        messages,
                        self.config.temperature,
                        self.config.max_tokens,
                    )
                    .await?
            }
        };

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(Error::EmptyReply);
        }
        Ok(reply.to_string())
    }
}

// ============ Partner ============

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySource {
    Llm,
    Local,
    /// The LLM was configured but failed; the local responder answered.
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerReply {
    pub text: String,
    pub source: ReplySource,
}

pub struct Partner<R: Rng = StdRng> {
    local: LocalResponder<R>,
    llm: Option<LlmConnector>,
    timeout: Duration,
}

impl<R: Rng> Partner<R> {
    pub fn new(local: LocalResponder<R>, llm: Option<LlmConnector>, timeout: Duration) -> Self {
        Self {
            local,
            llm,
            timeout,
        }
    }

    pub fn local_only(local: LocalResponder<R>) -> Self {
        Self::new(local, None, Duration::from_secs(15))
    }

    pub fn llm_label(&self) -> Option<String> {
        self.llm.as_ref().map(LlmConnector::provider_label)
    }

    pub async fn reply(
        &mut self,
        role: Role,
        player_last: &str,
        history: &[ChatMessage],
        context_id: Option<&str>,
    ) -> PartnerReply {
        let Some(llm) = &self.llm else {
            return PartnerReply {
                text: self.local.reply(role, player_last),
                source: ReplySource::Local,
            };
        };

        let outcome = match tokio::time::timeout(
            self.timeout,
            llm.request_reply(role, player_last, history),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.timeout)),
        };

        match outcome {
            Ok(text) => {
                logging::log_partner(
                    context_id,
                    &format!("{} replied as {} ({} chars)", llm.provider_label(), role, text.len()),
                );
                PartnerReply {
                    text,
                    source: ReplySource::Llm,
                }
            }
            Err(e) => {
                logging::log_error(
                    context_id,
                    &format!("LLM reply failed, using local responder: {}", e),
                );
                PartnerReply {
                    text: self.local.reply(role, player_last),
                    source: ReplySource::Fallback,
                }
            }
        }
    }
}
