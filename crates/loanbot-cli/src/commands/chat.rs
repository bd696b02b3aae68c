use anyhow::Result;
use cliclack::input;
use std::path::PathBuf;

use crate::commands::agent::build_agent;
use crate::prompt::cliclack::CliclackPrompt;
use crate::session::session::ChatSession;
use crate::session::session_file::{ensure_session_dir, read_messages, session_path};
use crate::AgentArgs;
use loanbot::session::Session;

pub async fn execute(args: &AgentArgs, loan: PathBuf, session_name: Option<String>) -> Result<()> {
    let agent = build_agent(args, loan)?;

    let session_name = match session_name {
        Some(name) => name,
        None => input("Session name:")
            .placeholder("default")
            .default_input("default")
            .interact()?,
    };
    let session_file = session_path(&ensure_session_dir()?, &session_name);

    let transcript = read_messages(&session_file)?;
    let session = if transcript.is_empty() {
        Session::new(agent)
    } else {
        tracing::info!(messages = transcript.len(), session = %session_name, "resuming session");
        Session::restore(agent, transcript)?
    };

    let mut chat = ChatSession::new(session, Box::new(CliclackPrompt::new()), session_file);
    chat.start().await
}
