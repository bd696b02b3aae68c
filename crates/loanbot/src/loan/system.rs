use async_trait::async_trait;
use indoc::indoc;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::payment::monthly_payment;
use super::record::LoanFacts;
use crate::errors::{AgentError, AgentResult};
use crate::models::tool::{ParamKind, Parameter, Tool};
use crate::systems::System;

pub const READ_LOAN_PARAMETERS: &str = "read_loan_parameters";
pub const CALCULATE_MONTHLY_PAYMENT: &str = "calculate_monthly_payment";

/// Loan status and terms for the current borrower
pub struct LoanSystem {
    facts: Arc<LoanFacts>,
    tools: Vec<Tool>,
}

impl LoanSystem {
    pub fn new(facts: Arc<LoanFacts>) -> Self {
        let read = Tool::new(
            READ_LOAN_PARAMETERS,
            indoc! {"
                Read the borrower's loan parameters: stage, status, interest rate, APR,
                approved amount, term in months and the estimated monthly payment.
                Do not use this function if the inquiry does not involve any of these parameters.
            "},
            Vec::new(),
        );
        let calculate = Tool::new(
            CALCULATE_MONTHLY_PAYMENT,
            indoc! {"
                Calculate the monthly payment of the loan. Any argument left out is taken
                from the borrower's loan record, so only pass arguments for hypothetical scenarios.
            "},
            vec![
                Parameter::optional(
                    "amount",
                    ParamKind::Number,
                    "Principal amount in dollars",
                    Value::Null,
                ),
                Parameter::optional(
                    "rate",
                    ParamKind::Number,
                    "Annual interest rate as a percentage, e.g. 6.5",
                    Value::Null,
                ),
                Parameter::optional(
                    "term",
                    ParamKind::Integer,
                    "Term of the loan in months",
                    Value::Null,
                ),
            ],
        );

        Self {
            facts,
            tools: vec![read, calculate],
        }
    }

    async fn read_loan_parameters(&self) -> AgentResult<Value> {
        let record = self.facts.record().await?;
        serde_json::to_value(record).map_err(|e| AgentError::Internal(e.to_string()))
    }

    async fn calculate_monthly_payment(&self, arguments: Map<String, Value>) -> AgentResult<Value> {
        let record = self.facts.record().await?;

        let amount = arguments
            .get("amount")
            .and_then(Value::as_f64)
            .or(record.amount)
            .ok_or_else(|| AgentError::MalformedRecord("the record has no Amount".to_string()))?;
        let rate = arguments
            .get("rate")
            .and_then(Value::as_f64)
            .or(record.rate)
            .ok_or_else(|| AgentError::MalformedRecord("the record has no Rate".to_string()))?;
        let term = arguments
            .get("term")
            .and_then(Value::as_i64)
            .or(record.term)
            .ok_or_else(|| AgentError::MalformedRecord("the record has no Term".to_string()))?;

        let payment = monthly_payment(amount, rate, term)?;
        Ok(json!((payment * 100.0).round() / 100.0))
    }
}

#[async_trait]
impl System for LoanSystem {
    fn name(&self) -> &str {
        "loan"
    }

    fn description(&self) -> &str {
        "Status and terms of the borrower's loan"
    }

    fn instructions(&self) -> &str {
        "Look up loan facts with read_loan_parameters and compute payments with calculate_monthly_payment."
    }

    fn tools(&self) -> &[Tool] {
        &self.tools
    }

    async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> AgentResult<Value> {
        match tool_name {
            READ_LOAN_PARAMETERS => self.read_loan_parameters().await,
            CALCULATE_MONTHLY_PAYMENT => self.calculate_monthly_payment(arguments).await,
            _ => Err(AgentError::UnknownTool(tool_name.to_string())),
        }
    }
}
