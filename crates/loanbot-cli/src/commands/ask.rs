use anyhow::Result;
use cliclack::spinner;
use console::style;
use std::path::PathBuf;

use crate::commands::agent::build_agent;
use crate::prompt::cliclack::print_markdown;
use crate::AgentArgs;
use loanbot::session::Session;

/// Answer one question without a persisted session
pub async fn execute(args: &AgentArgs, loan: PathBuf, query: &str, assess: bool) -> Result<()> {
    let mut session = Session::new(build_agent(args, loan)?);

    let spin = spinner();
    spin.start("awaiting reply");
    let outcome = if assess {
        session
            .assess(query)
            .await
            .map(|assessment| (assessment.response, assessment.off_topic))
    } else {
        session.ask(query).await.map(|response| (response, None))
    };
    spin.stop("");

    let (response, off_topic) = outcome?;
    print_markdown(&response, "zenburn");
    if assess {
        let label = match off_topic {
            Some(true) => "yes",
            Some(false) => "no",
            None => "unknown",
        };
        println!("{} {}", style("Off-topic:").bold(), label);
    }
    Ok(())
}
