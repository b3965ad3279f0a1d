//! The daphne directive language: expression classification, the state
//! machine engine that drives it, and the line-level directive syntax.
pub mod classify;
pub mod directive;
pub mod fsm;
pub mod text;
