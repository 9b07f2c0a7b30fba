//! agentdesk CLI library: the command implementations behind the
//! `agentdesk` binary, exposed for integration tests.

pub mod commands;
