use anyhow::Result;
use std::path::PathBuf;

use crate::prompt::prompt::{InputType, Prompt};
use crate::session::session_file::persist_messages;
use loanbot::models::message::Message;
use loanbot::session::Session;

/// Interactive chat over one loanbot session, recorded to a transcript file
pub struct ChatSession<'a> {
    session: Session,
    prompt: Box<dyn Prompt + 'a>,
    session_file: PathBuf,
}

impl<'a> ChatSession<'a> {
    pub fn new(session: Session, prompt: Box<impl Prompt + 'a>, session_file: PathBuf) -> Self {
        ChatSession {
            session,
            prompt,
            session_file,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        self.setup_session();

        loop {
            let input = self.prompt.get_input()?;
            match input.input_type {
                InputType::Message => {
                    if let Some(content) = input.content {
                        self.answer(&content).await;
                    }
                }
                InputType::History => self.render_history(),
                InputType::Exit => break,
                InputType::AskAgain => continue,
            }
        }

        self.close_session();
        Ok(())
    }

    async fn answer(&mut self, query: &str) {
        self.prompt.show_busy();
        let outcome = tokio::select! {
            result = self.session.ask(query) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        self.prompt.hide_busy();

        match outcome {
            Some(Ok(answer)) => self.prompt.render(&Message::assistant(answer)),
            Some(Err(e)) => {
                tracing::error!(error = %e, "failed to answer");
                self.prompt.render_error(&e.to_string());
            }
            None => self
                .prompt
                .render_info("Interrupt: the question was cancelled before it was answered."),
        }

        // the question is part of the transcript even when it was not answered
        if let Err(e) = persist_messages(&self.session_file, self.session.conversation().messages()) {
            self.prompt
                .render_error(&format!("Failed to persist messages: {}", e));
        }
    }

    fn render_history(&mut self) {
        let history = self.session.conversation().history().to_vec();
        if history.is_empty() {
            self.prompt.render_info("No messages yet.");
        }
        for message in &history {
            self.prompt.render(message);
        }
    }

    fn setup_session(&mut self) {
        self.prompt.render_info(&format!(
            "Starting session. Recording to {}",
            self.session_file.display()
        ));

        let resumed = self.session.conversation().history().len();
        if resumed > 0 {
            self.prompt
                .render_info(&format!("Resumed {} earlier messages. Type /history to see them.", resumed));
        }

        self.prompt.ready();
    }

    fn close_session(&mut self) {
        self.prompt.render_info(&format!(
            "Closing session. Recorded to {}",
            self.session_file.display()
        ));
        self.prompt.close();
    }
}
