//! Password commands

use std::io::BufRead;

use anyhow::Context;
use serde::Serialize;

use caseguard_core::{Password, PasswordStrength};

use crate::output::{or_dash, Field, OutputFormat};
use crate::PasswordCommands;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PolicyReport {
    accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    strength: Option<PasswordStrength>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

impl PolicyReport {
    fn evaluate(raw: String) -> Self {
        match Password::new(raw) {
            Ok(password) => Self { accepted: true, strength: Some(password.strength()), reason: None },
            Err(e) => Self { accepted: false, strength: None, reason: Some(e.to_string()) },
        }
    }
}

pub fn handle(action: PasswordCommands, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        PasswordCommands::Check { password } => {
            let raw = match password {
                Some(p) => p,
                None => read_secret()?,
            };
            let report = PolicyReport::evaluate(raw);
            format.print(&report, || {
                vec![
                    Field::new("accepted", report.accepted),
                    Field::new("strength", or_dash(report.strength)),
                    Field::new("reason", or_dash(report.reason.as_deref())),
                ]
            })
        }
    }
}

fn read_secret() -> anyhow::Result<String> {
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).context("cannot read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
