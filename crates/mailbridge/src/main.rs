//! `MailBridge` - command-line email agent
//!
//! Sends over SMTP and retrieves over POP3, with optional substitution-table
//! encoding of message bodies.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod config;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use config::AppConfig;
use mailbridge_core::account::{Provider, ServerConfig};
use mailbridge_core::codec::SubstitutionTable;
use mailbridge_core::negotiator::{derive_table, generate_table, rotate_table};
use mailbridge_core::{Account, MailReceiver, MailSender, OutgoingMessage, Security, Settings};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(version, about = "Send and receive mail over SMTP and POP3")]
struct Cli {
    /// Configuration file.
    #[arg(long, global = true, env = "MAILBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Account to use instead of the current one.
    #[arg(long, global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Manage accounts.
    Account {
        #[command(subcommand)]
        command: AccountCommand,
    },
    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Send a message.
    Send {
        /// Recipient (repeatable).
        #[arg(long, required = true)]
        to: Vec<String>,
        /// Carbon copy (repeatable).
        #[arg(long)]
        cc: Vec<String>,
        /// Blind carbon copy (repeatable).
        #[arg(long)]
        bcc: Vec<String>,
        /// Subject line.
        #[arg(long, default_value = "")]
        subject: String,
        /// Body text.
        #[arg(long)]
        body: String,
        /// File to attach (repeatable).
        #[arg(long)]
        attach: Vec<PathBuf>,
    },
    /// Print the number of messages in the mailbox.
    Count,
    /// List messages, newest first.
    List {
        /// Maximum messages to fetch (defaults to the `max_messages` setting).
        #[arg(long)]
        max: Option<usize>,
    },
    /// Delete a message by server index.
    Delete {
        /// Index shown by `list`.
        index: u32,
    },
    /// Substitution table utilities.
    Table {
        #[command(subcommand)]
        command: TableCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    /// Add an account; known providers need only email and password.
    Add {
        /// Unique account name.
        name: String,
        /// Email address.
        email: String,
        /// Password or authorization code.
        #[arg(long, env = "MAILBRIDGE_PASSWORD")]
        password: String,
        /// SMTP host (detected for known providers).
        #[arg(long)]
        smtp_host: Option<String>,
        /// SMTP port.
        #[arg(long)]
        smtp_port: Option<u16>,
        /// POP3 host (detected for known providers).
        #[arg(long)]
        pop3_host: Option<String>,
        /// POP3 port.
        #[arg(long)]
        pop3_port: Option<u16>,
        /// Connection security for both servers.
        #[arg(long, value_enum, default_value_t = SecurityArg::Tls)]
        security: SecurityArg,
    },
    /// Remove an account.
    Remove {
        /// Account name.
        name: String,
    },
    /// List accounts.
    List,
    /// Make an account current.
    Use {
        /// Account name.
        name: String,
    },
    /// Show the provider and servers detected for an address.
    Detect {
        /// Email address.
        email: String,
    },
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print settings as JSON.
    Show,
    /// Change one setting.
    Set {
        /// Setting name.
        key: String,
        /// New value.
        value: String,
    },
}

#[derive(Subcommand, Debug)]
enum TableCommand {
    /// Derive the table agreed through a shared secret.
    Derive {
        /// Shared secret.
        secret: String,
    },
    /// Generate a table, reproducibly with a seed.
    Generate {
        /// Shuffle seed.
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Reshuffle an existing table.
    Rotate {
        /// Current 64-character table.
        table: String,
        /// Rotation seed.
        seed: u64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SecurityArg {
    None,
    Tls,
    Starttls,
}

impl From<SecurityArg> for Security {
    fn from(arg: SecurityArg) -> Self {
        match arg {
            SecurityArg::None => Self::None,
            SecurityArg::Tls => Self::Tls,
            SecurityArg::Starttls => Self::StartTls,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailbridge=info,mailbridge_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load(&path).await;

    match cli.command {
        Command::Account { command } => {
            if account_command(&mut config, command)? {
                config.save(&path).await?;
            }
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => println!("{}", serde_json::to_string_pretty(&config.settings)?),
            SettingsCommand::Set { key, value } => {
                config.settings.set(&key, &value)?;
                config.save(&path).await?;
            }
        },
        Command::Send {
            to,
            cc,
            bcc,
            subject,
            body,
            attach,
        } => {
            let account = selected(&config, cli.account.as_deref())?;
            let message = OutgoingMessage {
                to,
                cc,
                bcc,
                subject,
                body,
                attachments: attach,
            };
            send(account.smtp.clone(), &config.settings, &message).await?;
            println!("Sent to {} recipient(s)", message.to.len() + message.cc.len() + message.bcc.len());
        }
        Command::Count => {
            let account = selected(&config, cli.account.as_deref())?;
            let mut receiver = MailReceiver::new(account.pop3.clone());
            let count = receiver
                .session(async |r| r.message_count().await)
                .await?;
            println!("{count}");
        }
        Command::List { max } => {
            let account = selected(&config, cli.account.as_deref())?;
            let max = max.unwrap_or(config.settings.max_messages);
            list(account.pop3.clone(), &config.settings, max).await?;
        }
        Command::Delete { index } => {
            let account = selected(&config, cli.account.as_deref())?;
            let mut receiver = MailReceiver::new(account.pop3.clone());
            receiver
                .session(async |r| r.delete_message(index).await)
                .await?;
            println!("Deleted message {index}");
        }
        Command::Table { command } => {
            let table = match command {
                TableCommand::Derive { secret } => derive_table(&secret),
                TableCommand::Generate { seed } => generate_table(seed),
                TableCommand::Rotate { table, seed } => {
                    let current: SubstitutionTable =
                        table.parse().context("Invalid substitution table")?;
                    rotate_table(&current, seed)
                }
            };
            println!("{table}");
        }
    }

    Ok(())
}

/// Runs an account subcommand; returns true if the config changed.
fn account_command(config: &mut AppConfig, command: AccountCommand) -> anyhow::Result<bool> {
    match command {
        AccountCommand::Add {
            name,
            email,
            password,
            smtp_host,
            smtp_port,
            pop3_host,
            pop3_port,
            security,
        } => {
            let security = Security::from(security);
            let mut account = Account::with_email(&email).with_password(&password);
            account.name.clone_from(&name);
            account.smtp.security = security;
            account.pop3.security = security;
            account.smtp.port = smtp_port.unwrap_or(ServerConfig::smtp_default_port(security));
            account.pop3.port = pop3_port.unwrap_or(ServerConfig::pop3_default_port(security));
            if let Some(host) = smtp_host {
                account.smtp.host = host;
            }
            if let Some(host) = pop3_host {
                account.pop3.host = host;
            }

            config.add_account(account)?;
            info!(%name, "Account added");
            Ok(true)
        }
        AccountCommand::Remove { name } => {
            config.remove_account(&name)?;
            info!(%name, "Account removed");
            Ok(true)
        }
        AccountCommand::List => {
            for name in config.account_names() {
                let marker = if config.current_account.as_deref() == Some(name) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {name}");
            }
            Ok(false)
        }
        AccountCommand::Use { name } => {
            config.set_current(&name)?;
            Ok(true)
        }
        AccountCommand::Detect { email } => {
            let provider = Provider::detect(&email);
            println!("provider: {provider}");
            match provider.servers() {
                Some(servers) => {
                    println!("smtp: {}:465", servers.smtp_host);
                    println!("pop3: {}:995", servers.pop3_host);
                }
                None => println!("servers must be entered manually"),
            }
            Ok(false)
        }
    }
}

fn selected<'a>(config: &'a AppConfig, name: Option<&str>) -> anyhow::Result<&'a Account> {
    match config.account(name) {
        Some(account) => Ok(account),
        None => match name {
            Some(name) => bail!("Account '{name}' not found"),
            None => bail!("No account configured; run `mailbridge account add` first"),
        },
    }
}

async fn send(
    server: ServerConfig,
    settings: &Settings,
    message: &OutgoingMessage,
) -> anyhow::Result<()> {
    let codec = settings.codec();
    let encoder = codec.as_ref().map(|c| c.encoder());

    let mut sender = MailSender::new(server);
    sender
        .session(async |s| {
            let hook = encoder.as_ref().map(|e| e as &dyn mailbridge_core::TextTransform);
            s.send_message(message, hook).await
        })
        .await?;
    Ok(())
}

async fn list(server: ServerConfig, settings: &Settings, max: usize) -> anyhow::Result<()> {
    let codec = settings.codec();
    let decoder = codec.as_ref().map(|c| c.decoder());

    let mut receiver = MailReceiver::new(server);
    let listing = receiver
        .session(async |r| {
            let hook = decoder.as_ref().map(|d| d as &dyn mailbridge_core::TextTransform);
            r.list_messages(Some(max), hook).await
        })
        .await?;

    for message in &listing.messages {
        println!("[{}] {}", message.index, message.date);
        println!("  From:    {}", message.from);
        println!("  To:      {}", message.to);
        println!("  Subject: {}", message.subject);
        for line in message.body.lines() {
            println!("  | {line}");
        }
        println!();
    }
    println!(
        "retrieved {} of {} (skipped {})",
        listing.messages.len(),
        listing.total,
        listing.skipped
    );
    Ok(())
}
