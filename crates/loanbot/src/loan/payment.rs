use crate::errors::{AgentError, AgentResult};

/// Monthly payment of a fully amortizing loan.
///
/// `annual_rate` is a percentage (6.0 means 6%). A zero rate spreads the principal
/// evenly over the term. A term of zero or less has no defined payment.
pub fn monthly_payment(amount: f64, annual_rate: f64, term: i64) -> AgentResult<f64> {
    if term <= 0 {
        return Err(AgentError::DivisionUndefined(format!(
            "term must be at least one month, got {}",
            term
        )));
    }

    let months = term as f64;
    let r = annual_rate / 100.0 / 12.0;
    if r == 0.0 {
        return Ok(amount / months);
    }

    let denominator = 1.0 - (1.0 + r).powf(-months);
    if denominator == 0.0 || !denominator.is_finite() {
        return Err(AgentError::DivisionUndefined(format!(
            "rate {}% over {} months leaves nothing to amortize",
            annual_rate, term
        )));
    }

    Ok(amount * r / denominator)
}
