//! Batch evaluation: replay a table of questions against the agent and score the answers.
//!
//! Input is a CSV file with `query` and `expected_response` columns (older files name the
//! latter `real_response`) and an optional `off_topic` label. Every row is answered in its
//! own conversation. A row that fails is logged and recorded with blank generated fields;
//! the run carries on with the next row.
use csv::{ReaderBuilder, Trim, Writer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::agent::Agent;
use crate::errors::{AgentError, AgentResult};

#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RawCase {
    query: String,
    #[serde(alias = "real_response")]
    expected_response: String,
    #[serde(default)]
    off_topic: Option<String>,
}

/// One question with the answer it should get
#[derive(Debug, Clone, PartialEq)]
pub struct EvalCase {
    pub query: String,
    pub expected_response: String,
    pub off_topic: Option<bool>,
}

impl EvalCase {
    pub fn new<Q: Into<String>, E: Into<String>>(query: Q, expected_response: E) -> Self {
        Self {
            query: query.into(),
            expected_response: expected_response.into(),
            off_topic: None,
        }
    }

    pub fn with_off_topic(mut self, off_topic: bool) -> Self {
        self.off_topic = Some(off_topic);
        self
    }
}

/// One row of the results table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalRow {
    pub query: String,
    pub expected_response: String,
    pub generated_response: Option<String>,
    #[serde(rename = "match")]
    pub matched: bool,
    pub generated_off_topic: Option<bool>,
    #[serde(skip)]
    pub expected_off_topic: Option<bool>,
}

impl EvalRow {
    fn failed(case: &EvalCase) -> Self {
        Self {
            query: case.query.clone(),
            expected_response: case.expected_response.clone(),
            generated_response: None,
            matched: false,
            generated_off_topic: None,
            expected_off_topic: case.off_topic,
        }
    }

    pub fn is_failed(&self) -> bool {
        self.generated_response.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationMetrics {
    pub support: usize,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Metrics {
    pub total: usize,
    pub failed: usize,
    pub matched: usize,
    pub accuracy: f64,
    /// Present when at least one row has both an expected and a generated label
    pub off_topic: Option<ClassificationMetrics>,
}

#[derive(Debug, Clone, Default)]
pub struct EvalReport {
    pub rows: Vec<EvalRow>,
    /// How many times the checkpoint file was written
    pub checkpoints: usize,
}

impl EvalReport {
    pub fn metrics(&self) -> Metrics {
        let total = self.rows.len();
        let failed = self.rows.iter().filter(|row| row.is_failed()).count();
        let matched = self.rows.iter().filter(|row| row.matched).count();

        let labelled: Vec<(bool, bool)> = self
            .rows
            .iter()
            .filter_map(|row| Some((row.expected_off_topic?, row.generated_off_topic?)))
            .collect();

        Metrics {
            total,
            failed,
            matched,
            accuracy: ratio(matched, total),
            off_topic: classification_metrics(&labelled),
        }
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Off-topic is the positive class
fn classification_metrics(labels: &[(bool, bool)]) -> Option<ClassificationMetrics> {
    if labels.is_empty() {
        return None;
    }

    let count = |expected: bool, generated: bool| {
        labels
            .iter()
            .filter(|&&pair| pair == (expected, generated))
            .count()
    };
    let tp = count(true, true);
    let tn = count(false, false);
    let fp = count(false, true);
    let fn_ = count(true, false);

    let precision = ratio(tp, tp + fp);
    let recall = ratio(tp, tp + fn_);
    let f1 = if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    };

    Some(ClassificationMetrics {
        support: labels.len(),
        accuracy: ratio(tp + tn, labels.len()),
        precision,
        recall,
        f1,
    })
}

fn parse_label(value: &str) -> AgentResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(AgentError::InvalidInput(format!(
            "off_topic must be true or false, got '{}'",
            other
        ))),
    }
}

fn csv_error(path: &Path, err: csv::Error) -> AgentError {
    AgentError::Io(format!("{}: {}", path.display(), err))
}

/// Read evaluation cases from a CSV file
pub fn read_cases(path: impl AsRef<Path>) -> AgentResult<Vec<EvalCase>> {
    let path = path.as_ref();
    let mut reader = ReaderBuilder::new()
        .trim(Trim::Headers)
        .from_path(path)
        .map_err(|e| csv_error(path, e))?;

    let mut cases = Vec::new();
    for record in reader.deserialize::<RawCase>() {
        let raw = record.map_err(|e| csv_error(path, e))?;
        let off_topic = match raw.off_topic.as_deref() {
            Some(label) if !label.trim().is_empty() => Some(parse_label(label)?),
            _ => None,
        };
        cases.push(EvalCase {
            query: raw.query,
            expected_response: raw.expected_response,
            off_topic,
        });
    }
    Ok(cases)
}

/// Write the results table, replacing any existing file
pub fn write_rows(path: impl AsRef<Path>, rows: &[EvalRow]) -> AgentResult<()> {
    let path = path.as_ref();
    let mut writer = Writer::from_path(path).map_err(|e| csv_error(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| csv_error(path, e))?;
    }
    writer.flush()?;
    Ok(())
}

/// Replays cases against an agent, one fresh conversation per case
pub struct Evaluator {
    agent: Arc<Agent>,
    classify: bool,
    checkpoint: Option<PathBuf>,
}

impl Evaluator {
    pub fn new(agent: Arc<Agent>) -> Self {
        Self {
            agent,
            classify: false,
            checkpoint: None,
        }
    }

    /// Also ask the model whether each query is off-topic
    pub fn with_classification(mut self, classify: bool) -> Self {
        self.classify = classify;
        self
    }

    /// Rewrite `path` with every row processed so far after each answered row
    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>) -> Self {
        self.checkpoint = Some(path.into());
        self
    }

    pub async fn run(&self, cases: &[EvalCase]) -> AgentResult<EvalReport> {
        let mut report = EvalReport::default();

        for (index, case) in cases.iter().enumerate() {
            match self.evaluate(case).await {
                Ok(row) => {
                    tracing::info!(row = index + 1, matched = row.matched, "evaluated");
                    report.rows.push(row);
                    if let Some(path) = &self.checkpoint {
                        write_rows(path, &report.rows)?;
                        report.checkpoints += 1;
                    }
                }
                Err(err) => {
                    tracing::error!(row = index + 1, query = %case.query, error = %err, "evaluation failed");
                    report.rows.push(EvalRow::failed(case));
                }
            }
        }

        Ok(report)
    }

    /// Read `input`, evaluate every case and write the results to `output`
    pub async fn run_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
    ) -> AgentResult<EvalReport> {
        let cases = read_cases(input)?;
        tracing::info!(cases = cases.len(), "starting evaluation");
        let report = self.run(&cases).await?;
        write_rows(output, &report.rows)?;
        Ok(report)
    }

    async fn evaluate(&self, case: &EvalCase) -> AgentResult<EvalRow> {
        let mut conversation = self.agent.start_conversation();
        let (generated, off_topic) = if self.classify {
            let assessment = self.agent.assess(&case.query, &mut conversation).await?;
            (assessment.response, assessment.off_topic)
        } else {
            (self.agent.answer(&case.query, &mut conversation).await?, None)
        };

        Ok(EvalRow {
            query: case.query.clone(),
            expected_response: case.expected_response.clone(),
            matched: generated.trim() == case.expected_response.trim(),
            generated_response: Some(generated),
            generated_off_topic: off_topic,
            expected_off_topic: case.off_topic,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loan::{LoanFacts, LoanRecord};
    use crate::providers::base::StopReason;
    use crate::providers::mock::{answer, stopped, MockProvider};
    use std::fs;
    use tempfile::tempdir;

    fn agent(provider: &MockProvider) -> Arc<Agent> {
        let facts = Arc::new(LoanFacts::from_record(LoanRecord {
            rate: Some(6.0),
            ..Default::default()
        }));
        Arc::new(Agent::for_loan(Box::new(provider.clone()), facts).unwrap())
    }

    #[tokio::test]
    async fn test_failed_row_is_recorded_and_skipped() {
        let provider = MockProvider::new(vec![
            answer("draft"),
            answer("Approved."),
            stopped(StopReason::ContentFilter),
            answer("draft"),
            answer("6%"),
        ]);
        let dir = tempdir().unwrap();
        let checkpoint = dir.path().join("checkpoint.csv");
        let evaluator = Evaluator::new(agent(&provider)).with_checkpoint(&checkpoint);

        let cases = vec![
            EvalCase::new("Is my loan approved?", "Approved."),
            EvalCase::new("Tell me a joke", "No."),
            EvalCase::new("What is my rate?", "6.5%"),
        ];
        let report = evaluator.run(&cases).await.unwrap();

        assert_eq!(report.rows.len(), 3);
        assert_eq!(report.checkpoints, 2);
        assert!(report.rows[0].matched);
        assert!(report.rows[1].is_failed());
        assert!(!report.rows[1].matched);
        assert_eq!(report.rows[2].generated_response.as_deref(), Some("6%"));
        assert!(!report.rows[2].matched);

        let written = fs::read_to_string(&checkpoint).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines[0],
            "query,expected_response,generated_response,match,generated_off_topic"
        );
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "Tell me a joke,No.,,false,");

        let metrics = report.metrics();
        assert_eq!(metrics.total, 3);
        assert_eq!(metrics.failed, 1);
        assert_eq!(metrics.matched, 1);
        assert!((metrics.accuracy - 1.0 / 3.0).abs() < 1e-9);
        assert!(metrics.off_topic.is_none());
    }

    #[tokio::test]
    async fn test_run_file_with_classification() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("questions.csv");
        let output = dir.path().join("results.csv");
        fs::write(
            &input,
            "query,real_response,off_topic\n\
             What is my rate?,Your rate is 6%.,false\n\
             Who won the game?,Please ask a lending officer.,true\n",
        )
        .unwrap();

        let provider = MockProvider::new(vec![
            answer("draft"),
            answer("Your rate is 6%."),
            answer("no"),
            answer("draft"),
            answer("Please ask a lending officer."),
            answer("Yes."),
        ]);
        let evaluator = Evaluator::new(agent(&provider)).with_classification(true);
        let report = evaluator.run_file(&input, &output).await.unwrap();

        let metrics = report.metrics();
        assert_eq!(metrics.matched, 2);
        let off_topic = metrics.off_topic.unwrap();
        assert_eq!(off_topic.support, 2);
        assert_eq!(off_topic.accuracy, 1.0);
        assert_eq!(off_topic.f1, 1.0);

        let written = fs::read_to_string(&output).unwrap();
        assert!(written.contains("What is my rate?,Your rate is 6%.,Your rate is 6%.,true,false"));
        assert!(written.contains(",true,true"));
    }

    #[test]
    fn test_read_cases_rejects_bad_label() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("questions.csv");
        fs::write(&input, "query,expected_response,off_topic\nHi,Hello,maybe\n").unwrap();
        assert!(matches!(read_cases(&input), Err(AgentError::InvalidInput(_))));
    }

    #[test]
    fn test_read_cases_without_labels() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("questions.csv");
        fs::write(&input, "query,expected_response\n\"Rate, please\",6%\n").unwrap();
        let cases = read_cases(&input).unwrap();
        assert_eq!(cases, vec![EvalCase::new("Rate, please", "6%")]);
    }

    #[test]
    fn test_classification_metrics() {
        let labels = [(true, true), (true, false), (false, true), (false, false)];
        let metrics = classification_metrics(&labels).unwrap();
        assert_eq!(metrics.accuracy, 0.5);
        assert_eq!(metrics.precision, 0.5);
        assert_eq!(metrics.recall, 0.5);
        assert_eq!(metrics.f1, 0.5);

        let none_positive = classification_metrics(&[(false, false)]).unwrap();
        assert_eq!(none_positive.f1, 0.0);
        assert!(classification_metrics(&[]).is_none());
    }
}
