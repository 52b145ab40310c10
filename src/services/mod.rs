pub mod attempt_gate;
pub mod bank_parser;
pub mod reformatter;
pub mod scoring;

pub use attempt_gate::{AttemptGate, AttemptStore, MemoryAttemptStore, DEFAULT_ATTEMPT_LIMIT};
pub use bank_parser::{BankParser, ParseError, ParseFailReason, ParseOutcome};
pub use reformatter::reformat;
