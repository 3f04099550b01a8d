//! Falcon Assist - Conversational Order Assistant
//!
//! This crate implements a three-stage conversational flow that guides a buyer
//! from product selection through request details to delivery and purpose,
//! driven by a per-session state machine and a field-completion engine.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
