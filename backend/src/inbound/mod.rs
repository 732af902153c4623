//! Inbound adapters that translate user input into gateway and account
//! calls while keeping argument parsing at the edge.

pub mod cli;
