use anyhow::Result;
use console::style;
use std::path::PathBuf;

use crate::commands::agent::build_agent;
use crate::AgentArgs;
use loanbot::eval::{Evaluator, Metrics};

pub async fn execute(
    args: &AgentArgs,
    loan: PathBuf,
    input: PathBuf,
    output: PathBuf,
    checkpoint: Option<PathBuf>,
    classify: bool,
) -> Result<()> {
    let mut evaluator = Evaluator::new(build_agent(args, loan)?).with_classification(classify);
    if let Some(path) = checkpoint {
        evaluator = evaluator.with_checkpoint(path);
    }

    let report = evaluator.run_file(&input, &output).await?;
    print_metrics(&report.metrics());
    println!("Results written to {}", output.display());
    Ok(())
}

fn print_metrics(metrics: &Metrics) {
    println!("{}", style("Evaluation").bold().green());
    println!(
        "  answered {}/{}  matched {}  accuracy {:.3}",
        metrics.total - metrics.failed,
        metrics.total,
        metrics.matched,
        metrics.accuracy
    );

    if let Some(off_topic) = &metrics.off_topic {
        println!("{}", style("Off-topic classification").bold().green());
        println!(
            "  support {}  accuracy {:.3}  precision {:.3}  recall {:.3}  f1 {:.3}",
            off_topic.support, off_topic.accuracy, off_topic.precision, off_topic.recall, off_topic.f1
        );
    }

    if metrics.failed > 0 {
        println!(
            "{}",
            style(format!("{} rows failed, see the log for details", metrics.failed)).yellow()
        );
    }
}
