//! Test doubles for the gateway and the input surface

use anyhow::{bail, Result};
use async_trait::async_trait;
use llm_core::{ChatMessage, Gateway};
use parking_lot::Mutex;
use std::collections::VecDeque;

use crate::input::Prompter;

/// Gateway that replays queued replies and records every request
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedGateway {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a transport failure
    pub fn push_error(&self, message: &str) {
        self.replies.lock().push_back(Err(message.to_string()));
    }

    pub fn push_reply(&self, reply: &str) {
        self.replies.lock().push_back(Ok(reply.to_string()));
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn chat(&self, messages: &[ChatMessage], _model: Option<&str>) -> Result<String> {
        self.requests.lock().push(messages.to_vec());
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => bail!("{}", message),
            None => bail!("no scripted reply left"),
        }
    }
}

/// Prompter that answers from a queue and records what it was asked
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
    prompts: Vec<String>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            prompts: Vec::new(),
        }
    }

    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }
}

impl Prompter for ScriptedPrompter {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front())
    }
}
