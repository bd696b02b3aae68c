use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

use crate::errors::{AgentError, AgentResult};

/// Loan facts read from the lending platform's application document.
///
/// Every field is optional except `rate`: a document without a decision rate is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LoanRecord {
    pub stage: Option<String>,
    pub status: Option<String>,
    pub rate: Option<f64>,
    #[serde(rename = "APR")]
    pub apr: Option<f64>,
    pub amount: Option<f64>,
    pub term: Option<i64>,
    pub estimated_payment: Option<f64>,
}

impl LoanRecord {
    /// Read and parse the document at `path`
    pub fn load(path: impl AsRef<Path>) -> AgentResult<Self> {
        let path = path.as_ref();
        let xml = fs::read_to_string(path)
            .map_err(|e| AgentError::Io(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_xml(&xml)
    }

    pub fn from_xml(xml: &str) -> AgentResult<Self> {
        let doc = Document::parse(xml)
            .map_err(|e| AgentError::MalformedRecord(format!("invalid XML: {}", e)))?;

        let stage_status = find(&doc, "StageStatus");
        let stage = stage_status.and_then(|node| child_text(node, "Stage"));
        let status = stage_status.and_then(|node| child_text(node, "Status"));

        let decision = find(&doc, "Decision")
            .ok_or_else(|| AgentError::MalformedRecord("missing Decision element".to_string()))?;

        let rate = number(decision, "Rate")?
            .ok_or_else(|| AgentError::MalformedRecord("missing Decision/Rate".to_string()))?;
        let apr = number(decision, "APR")?;
        let amount = number(decision, "Amount")?;
        let term = match child_text(decision, "Term") {
            Some(text) => Some(text.parse::<i64>().map_err(|_| {
                AgentError::MalformedRecord(format!("Term must be a whole number of months, got '{}'", text))
            })?),
            None => None,
        };
        let estimated_payment = match child(decision, "OtherData") {
            Some(other) => number(other, "EstimatedPayment")?,
            None => None,
        };

        Ok(Self {
            stage,
            status,
            rate: Some(rate),
            apr,
            amount,
            term,
            estimated_payment,
        })
    }
}

fn find<'a, 'input>(doc: &'a Document<'input>, tag: &str) -> Option<Node<'a, 'input>> {
    doc.descendants().find(|node| node.has_tag_name(tag))
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

/// Trimmed text of a child element; empty elements count as absent
fn child_text(node: Node, tag: &str) -> Option<String> {
    child(node, tag)
        .and_then(|child| child.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(String::from)
}

fn number(node: Node, tag: &str) -> AgentResult<Option<f64>> {
    match child_text(node, tag) {
        Some(text) => text.parse::<f64>().map(Some).map_err(|_| {
            AgentError::MalformedRecord(format!("{} must be a number, got '{}'", tag, text))
        }),
        None => Ok(None),
    }
}

/// Owns the loan record for one assistant, loading it either up front or on first use
#[derive(Debug)]
pub struct LoanFacts {
    source: Option<PathBuf>,
    record: OnceCell<LoanRecord>,
}

impl LoanFacts {
    /// Load the document now, failing construction if it is unreadable or malformed
    pub fn eager(path: impl Into<PathBuf>) -> AgentResult<Self> {
        let path = path.into();
        let record = LoanRecord::load(&path)?;
        tracing::info!(path = %path.display(), "loaded loan record");
        Ok(Self {
            source: Some(path),
            record: OnceCell::new_with(Some(record)),
        })
    }

    /// Defer loading until a tool first needs the record
    pub fn lazy(path: impl Into<PathBuf>) -> Self {
        Self {
            source: Some(path.into()),
            record: OnceCell::new(),
        }
    }

    /// Wrap a record that is already in memory
    pub fn from_record(record: LoanRecord) -> Self {
        Self {
            source: None,
            record: OnceCell::new_with(Some(record)),
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.record.initialized()
    }

    /// The loaded record. A document that cannot be loaded on first use is
    /// `RecordUnavailable`, which aborts the query like a failed eager load would.
    pub async fn record(&self) -> AgentResult<&LoanRecord> {
        self.record
            .get_or_try_init(|| async {
                let path = self.source.as_ref().ok_or_else(|| {
                    AgentError::Internal("loan facts have no source document".to_string())
                })?;
                let record = LoanRecord::load(path).map_err(|err| {
                    tracing::error!(path = %path.display(), error = %err, "failed to load loan record");
                    AgentError::RecordUnavailable(err.to_string())
                })?;
                tracing::info!(path = %path.display(), "loaded loan record on first use");
                Ok(record)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::io::Write;

    const FULL: &str = indoc! {r#"
        <Application>
          <StageStatus>
            <Stage>Underwriting</Stage>
            <Status>Approved</Status>
          </StageStatus>
          <Decision>
            <Rate>6.0</Rate>
            <APR>6.25</APR>
            <Amount>12000</Amount>
            <Term>12</Term>
            <OtherData>
              <EstimatedPayment>1032.80</EstimatedPayment>
            </OtherData>
          </Decision>
        </Application>
    "#};

    #[test]
    fn test_parse_full_record() {
        let record = LoanRecord::from_xml(FULL).unwrap();
        assert_eq!(record.stage.as_deref(), Some("Underwriting"));
        assert_eq!(record.status.as_deref(), Some("Approved"));
        assert_eq!(record.rate, Some(6.0));
        assert_eq!(record.apr, Some(6.25));
        assert_eq!(record.amount, Some(12000.0));
        assert_eq!(record.term, Some(12));
        assert_eq!(record.estimated_payment, Some(1032.80));
    }

    #[test]
    fn test_missing_optional_fields_are_null() {
        let xml = indoc! {r#"
            <Application>
              <Decision>
                <Rate>5.5</Rate>
                <Term>36</Term>
              </Decision>
            </Application>
        "#};
        let record = LoanRecord::from_xml(xml).unwrap();
        assert_eq!(record.rate, Some(5.5));
        assert_eq!(record.estimated_payment, None);
        assert_eq!(record.amount, None);
        assert_eq!(record.stage, None);
        assert_eq!(record.status, None);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["EstimatedPayment"].is_null());
        assert_eq!(json["Term"], 36);
    }

    #[test]
    fn test_missing_rate_is_malformed() {
        let xml = "<Application><Decision><Amount>100</Amount></Decision></Application>";
        let err = LoanRecord::from_xml(xml).unwrap_err();
        assert!(matches!(err, AgentError::MalformedRecord(_)));
    }

    #[test]
    fn test_missing_decision_is_malformed() {
        let xml = "<Application><StageStatus><Status>Pending</Status></StageStatus></Application>";
        assert!(matches!(
            LoanRecord::from_xml(xml),
            Err(AgentError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_non_numeric_values_are_malformed() {
        let xml = "<Application><Decision><Rate>six</Rate></Decision></Application>";
        assert!(matches!(
            LoanRecord::from_xml(xml),
            Err(AgentError::MalformedRecord(_))
        ));

        let xml = "<Application><Decision><Rate>6</Rate><Term>12.5</Term></Decision></Application>";
        assert!(matches!(
            LoanRecord::from_xml(xml),
            Err(AgentError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_invalid_xml_is_malformed() {
        assert!(matches!(
            LoanRecord::from_xml("<Application><Decision>"),
            Err(AgentError::MalformedRecord(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = LoanRecord::load("/nonexistent/loan.xml").unwrap_err();
        assert!(matches!(err, AgentError::Io(_)));
    }

    #[tokio::test]
    async fn test_lazy_facts_load_on_first_use() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FULL.as_bytes()).unwrap();

        let facts = LoanFacts::lazy(file.path());
        assert!(!facts.is_loaded());
        let record = facts.record().await.unwrap();
        assert_eq!(record.term, Some(12));
        assert!(facts.is_loaded());
    }

    #[tokio::test]
    async fn test_eager_facts_fail_at_construction() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"<Application/>").unwrap();

        assert!(matches!(
            LoanFacts::eager(file.path()),
            Err(AgentError::MalformedRecord(_))
        ));

        let lazy = LoanFacts::lazy(file.path());
        assert!(matches!(
            lazy.record().await,
            Err(AgentError::RecordUnavailable(_))
        ));
        assert!(!lazy.is_loaded());
    }

    #[tokio::test]
    async fn test_lazy_facts_missing_file() {
        let lazy = LoanFacts::lazy("/nonexistent/loan.xml");
        let err = lazy.record().await.unwrap_err();
        assert!(matches!(err, AgentError::RecordUnavailable(_)));
        assert!(err.to_string().contains("/nonexistent/loan.xml"));
    }
}
