//! These models represent the objects passed around by the agent
//!
//! There are a few related formats we need to interact with:
//! - openai compatible messages/tools, sent from the agent to the LLM
//! - transcripts persisted by the CLI and returned by the server
//! - tool calls dispatched to the loan systems
//!
//! We always immediately convert wire formats into the internal structs using the
//! helpers in `providers::utils`, so nothing outside the providers knows the wire shape.
pub mod message;
pub mod role;
pub mod tool;
