//! The loan fact provider: the borrower's loan record and the tools that read it.
pub mod payment;
pub mod record;
pub mod system;

pub use payment::monthly_payment;
pub use record::{LoanFacts, LoanRecord};
pub use system::LoanSystem;
