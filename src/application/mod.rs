//! Application layer orchestrating the payment flow.
//!
//! `PaymentEngine` is the transaction state machine. It resolves payer
//! credentials through `CredentialTokenizer` and announces every committed
//! transition through `Notifier`, which also serves the long-poll wait.
//! `CardService` manages the instruments a confirmation may reference, and
//! `ScriptRunner` drives all of them from a CSV script.

pub mod cards;
pub mod credential;
pub mod engine;
pub mod notifier;
pub mod replay;
