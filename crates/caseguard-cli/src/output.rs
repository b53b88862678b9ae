//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `data`; table output renders `rows` instead
    pub fn print<T, R>(&self, data: &T, rows: impl FnOnce() -> Vec<R>) -> anyhow::Result<()>
    where
        T: Serialize,
        R: Tabled,
    {
        match self {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(data)?),
            OutputFormat::Yaml => print!("{}", serde_yaml::to_string(data)?),
            OutputFormat::Table => println!("{}", render(rows())),
        }
        Ok(())
    }
}

/// Render rows with the CLI's table style
pub fn render<R: Tabled>(rows: Vec<R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Two-column row for single-object output
#[derive(Tabled)]
pub struct Field {
    #[tabled(rename = "Field")]
    pub name: &'static str,
    #[tabled(rename = "Value")]
    pub value: String,
}

impl Field {
    pub fn new(name: &'static str, value: impl ToString) -> Self {
        Self { name, value: value.to_string() }
    }
}

/// `-` for absent values
pub fn or_dash(value: Option<impl ToString>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}
