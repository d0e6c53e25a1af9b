//! Interrupt recognition and routing
//!
//! An agent run pauses with an opaque interrupt value. Only token vault
//! interrupts are handled here; anything else routes to nothing.

pub mod router;
pub mod token_vault;

pub use router::{InterruptRouter, InterruptSignal, RoutedConsent};
pub use token_vault::{is_authorization_interrupt, TokenVaultInterrupt};
