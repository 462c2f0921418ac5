//! Pagebot core library: Messenger webhook gateway, intent classification, per-sender
//! conversation mode, AI delegates, and reply shaping. Used by the `pagebot` CLI.

pub mod channels;
pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod init;
pub mod intent;
pub mod llm;
pub mod reply;
pub mod session;
