//! Email commands

use serde::Serialize;

use caseguard_core::{CoreConfig, Email};

use crate::output::{Field, OutputFormat};
use crate::EmailCommands;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmailReport {
    email: Email,
    local_part: String,
    domain: String,
    business: bool,
}

impl EmailReport {
    fn new(raw: &str, core: &CoreConfig) -> anyhow::Result<Self> {
        let email = Email::new(raw)?;
        Ok(Self {
            local_part: email.local_part().to_string(),
            domain: email.domain().to_string(),
            business: email.is_business_email_with(&core.identity.extra_personal_domains),
            email,
        })
    }
}

pub fn handle(action: EmailCommands, core: &CoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        EmailCommands::Validate { email } => {
            let report = EmailReport::new(&email, core)?;
            format.print(&report, || {
                vec![
                    Field::new("email", &report.email),
                    Field::new("local part", &report.local_part),
                    Field::new("domain", &report.domain),
                    Field::new("business", report.business),
                ]
            })
        }
    }
}
