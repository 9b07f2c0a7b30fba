//! `agentdesk chat` — Interactive requirement-definition chat.
//!
//! A REPL over the agent API's chat stream. Conversation history and the
//! current requirement state live in memory for the lifetime of the
//! process. Ctrl+C while a reply is streaming cancels that reply only.

use std::io::{self, BufRead, Write};

use agentdesk_core::chat::{
    ChatApi, ChatStreamEvent, JobCreationResponse, Message, RequirementState, READY_THRESHOLD,
};
use agentdesk_core::stream::StreamState;
use console::style;
use tokio_util::sync::CancellationToken;

/// One conversation: history, requirement state and the last created job.
pub struct ChatSession {
    conversation_id: String,
    history: Vec<Message>,
    requirements: RequirementState,
    job: Option<JobCreationResponse>,
}

/// What a finished turn produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    pub reply: String,
    pub state: StreamState,
    pub requirements_updated: bool,
}

impl ChatSession {
    pub fn new(conversation_id: Option<String>) -> Self {
        Self {
            conversation_id: conversation_id
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            history: Vec::new(),
            requirements: RequirementState::empty(),
            job: None,
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn requirements(&self) -> &RequirementState {
        &self.requirements
    }

    pub fn job(&self) -> Option<&JobCreationResponse> {
        self.job.as_ref()
    }

    /// Start over with a fresh conversation id.
    pub fn reset(&mut self) {
        *self = Self::new(None);
    }

    /// Send one user message and stream the reply.
    ///
    /// The user message enters the history immediately. The reply is
    /// recorded even when the stream was cancelled part-way; a failed
    /// stream records the error text as the assistant's message.
    pub async fn send<F>(
        &mut self,
        api: &ChatApi,
        user_message: &str,
        mut on_chunk: F,
        cancel: Option<&CancellationToken>,
    ) -> Result<TurnOutcome, String>
    where
        F: FnMut(&str),
    {
        let user_message = user_message.trim();
        if user_message.is_empty() {
            return Err("Message is empty".to_string());
        }

        let previous = self.history.clone();
        let current = self.requirements.clone();
        self.history.push(Message::user(user_message));

        let mut reply = String::new();
        let mut updated: Option<RequirementState> = None;

        let result = api
            .stream_requirement_definition(
                &self.conversation_id,
                user_message,
                &previous,
                &current,
                |event| match event {
                    ChatStreamEvent::Message { content } => {
                        on_chunk(&content);
                        reply.push_str(&content);
                    }
                    ChatStreamEvent::RequirementUpdate { requirements } => {
                        updated = Some(requirements);
                    }
                    ChatStreamEvent::Unknown => {}
                },
                cancel,
            )
            .await;

        let requirements_updated = updated.is_some();
        if let Some(requirements) = updated {
            self.requirements = requirements;
        }

        match result {
            Ok(summary) => {
                if !reply.is_empty() {
                    self.history.push(Message::assistant(reply.clone()));
                }
                Ok(TurnOutcome {
                    reply,
                    state: summary.state,
                    requirements_updated,
                })
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!("[Chat] Stream failed: {}", message);
                self.history.push(Message::assistant(message.clone()));
                Err(message)
            }
        }
    }

    /// Create a job from the current requirements once they are ready.
    pub async fn submit_job(&mut self, api: &ChatApi) -> Result<JobCreationResponse, String> {
        if !self.requirements.is_ready() {
            return Err(format!(
                "Requirements are {:.0}% complete; {:.0}% is needed to create a job",
                self.requirements.completeness * 100.0,
                READY_THRESHOLD * 100.0
            ));
        }

        let job = api
            .create_job(&self.conversation_id, &self.requirements)
            .await
            .map_err(|e| e.to_string())?;

        self.history.push(Message::assistant(format!(
            "Job created: {} (job master {})",
            job.job_id, job.job_master_id
        )));
        self.job = Some(job.clone());
        Ok(job)
    }
}

fn print_requirements(requirements: &RequirementState) {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".to_string());
    println!("  data source:  {}", field(&requirements.data_source));
    println!("  process:      {}", field(&requirements.process_description));
    println!("  output:       {}", field(&requirements.output_format));
    println!("  schedule:     {}", field(&requirements.schedule));
    println!(
        "  completeness: {:.0}%{}",
        requirements.completeness * 100.0,
        if requirements.is_ready() { " (ready)" } else { "" }
    );
}

/// Run the interactive chat loop.
pub async fn run(api_base: &str, conversation_id: Option<String>) -> Result<(), String> {
    let api = ChatApi::new(api_base);
    let mut session = ChatSession::new(conversation_id);

    println!("{}", style("agentdesk chat").bold());
    println!("══════════════════════════════════════");
    println!("API: {}", api.api_base());
    println!("Conversation: {}", session.conversation_id());
    println!("══════════════════════════════════════");
    println!("Describe the job you want to automate. Type /quit to exit.");
    println!("Commands: /status, /job, /history, /new, /quit");
    println!();

    let stdin = io::stdin();
    loop {
        print!("{} ", style("you>").cyan().bold());
        io::stdout().flush().ok();

        let mut line = String::new();
        let read = stdin
            .lock()
            .read_line(&mut line)
            .map_err(|e| format!("Failed to read input: {}", e))?;
        if read == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match trimmed {
            "/quit" | "/exit" | "/q" => {
                println!("Goodbye!");
                break;
            }
            "/status" => print_requirements(session.requirements()),
            "/history" => {
                for message in session.history() {
                    println!("[{:?}] {}", message.role, message.content);
                }
            }
            "/new" => {
                session.reset();
                println!("New conversation: {}", session.conversation_id());
            }
            "/job" => match session.submit_job(&api).await {
                Ok(job) => println!(
                    "{} job {} (master {}): {}",
                    style("✓").green(),
                    job.job_id,
                    job.job_master_id,
                    job.message
                ),
                Err(e) => println!("{} {}", style("✗").red(), e),
            },
            message => {
                let cancel = CancellationToken::new();
                let watcher = {
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    })
                };

                print!("{} ", style("agent>").green().bold());
                io::stdout().flush().ok();

                let outcome = session
                    .send(
                        &api,
                        message,
                        |chunk| {
                            print!("{}", chunk);
                            io::stdout().flush().ok();
                        },
                        Some(&cancel),
                    )
                    .await;
                watcher.abort();
                println!();

                match outcome {
                    Ok(turn) => {
                        if turn.state == StreamState::Cancelled {
                            println!("{}", style("(cancelled)").dim());
                        }
                        if turn.requirements_updated {
                            print_requirements(session.requirements());
                        }
                    }
                    Err(e) => println!("{} {}", style("✗").red(), e),
                }
            }
        }
    }

    Ok(())
}
