use std::time::Duration;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{Contact, Session};
use serde::Deserialize;

use crate::error::{AppError, Result};

const DEFAULT_CONFIG_PATH: &str = "config/bonifico.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub backend: Backend,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Backend {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Backend {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub user: String,
    pub access_token: String,
    /// Phone number or e-mail address receiving the code.
    pub contact: String,
}

impl std::fmt::Debug for SessionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionSettings")
            .field("user", &self.user)
            .field("access_token", &"<redacted>")
            .field("contact", &self.contact)
            .finish()
    }
}

impl Settings {
    /// Session for the configured user; token and contact are mandatory.
    pub fn session(&self) -> Result<Session> {
        let session = &self.session;
        if session.access_token.trim().is_empty() {
            return Err(AppError::Settings(
                "session.access_token is not set (config file or BONIFICO__SESSION__ACCESS_TOKEN)"
                    .to_string(),
            ));
        }
        let contact = parse_contact(&session.contact)?;
        Ok(Session::new(
            session.user.trim(),
            session.access_token.trim(),
            contact,
        ))
    }
}

fn parse_contact(raw: &str) -> Result<Contact> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AppError::Settings(
            "session.contact is not set (phone number or e-mail)".to_string(),
        ));
    }
    if raw.contains('@') {
        Ok(Contact::Email(raw.to_string()))
    } else {
        Ok(Contact::Phone(raw.to_string()))
    }
}

#[derive(Debug, Parser)]
#[command(name = "bonifico", disable_version_flag = true)]
#[command(about = "Transfers and bill payments confirmed by a one-time code")]
pub struct Cli {
    /// Optional config file path (TOML).
    #[arg(long)]
    config: Option<String>,
    /// Override backend base URL (e.g. http://127.0.0.1:3000/api).
    #[arg(long)]
    base_url: Option<String>,
    /// Override user name (the access token is never read from CLI).
    #[arg(long)]
    user: Option<String>,
    /// Override the phone number or e-mail receiving the code.
    #[arg(long)]
    contact: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transfer to a single beneficiary.
    Transfer(TransferArgs),
    /// Send the same amount to several beneficiaries.
    Mass(MassArgs),
    /// Pay a bill.
    Pay(PayArgs),
    /// Show the balance of an account.
    Balance(BalanceArgs),
}

#[derive(Debug, Args)]
pub struct MovementArgs {
    /// Source account id.
    #[arg(long = "from")]
    pub source: String,
    /// Amount, e.g. 12.50 (per beneficiary for mass transfers).
    #[arg(long)]
    pub amount: String,
    #[arg(long, default_value = "EUR")]
    pub currency: String,
    #[arg(long)]
    pub memo: Option<String>,
    /// Execution date (YYYY-MM-DD); today when omitted.
    #[arg(long)]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Args)]
pub struct TransferArgs {
    #[command(flatten)]
    pub movement: MovementArgs,
    /// Beneficiary id.
    #[arg(long)]
    pub to: String,
    #[arg(long)]
    pub instant: bool,
}

#[derive(Debug, Args)]
pub struct MassArgs {
    #[command(flatten)]
    pub movement: MovementArgs,
    /// Beneficiary ids.
    #[arg(long, num_args = 1.., required = true)]
    pub to: Vec<String>,
}

#[derive(Debug, Args)]
pub struct PayArgs {
    #[command(flatten)]
    pub movement: MovementArgs,
    /// Bill id.
    #[arg(long)]
    pub bill: String,
}

#[derive(Debug, Args)]
pub struct BalanceArgs {
    #[arg(long)]
    pub account: String,
}

pub fn load() -> Result<(Settings, Command)> {
    load_from(Cli::parse())
}

fn load_from(cli: Cli) -> Result<(Settings, Command)> {
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
    let mut builder = config::Config::builder();
    builder = builder.add_source(config::File::with_name(config_path).required(false));
    builder = builder.add_source(config::Environment::with_prefix("BONIFICO").separator("__"));
    let mut settings: Settings = builder.build()?.try_deserialize()?;

    if let Some(base_url) = cli.base_url {
        settings.backend.base_url = base_url;
    }
    if let Some(user) = cli.user {
        settings.session.user = user;
    }
    if let Some(contact) = cli.contact {
        settings.session.contact = contact;
    }

    Ok((settings, cli.command))
}
