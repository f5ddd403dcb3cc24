//! Core components, types, and utilities for the docs-bot.
//!
//! This module contains fundamental building blocks used throughout the application:
//! - Configuration handling and environment variables.
//! - System prompts and directives for LLM interactions.
//! - Fixed reply texts.
//! - Common types and result handling.

pub mod config;
pub mod prompts;
pub mod replies;
pub mod types;
