//! CLI commands

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::ClientConfig;
use crate::session::{ActiveLists, ColumnPolicy, Entry};
use crate::transport::Reply;

#[derive(Parser)]
#[command(name = "esm-lists")]
#[command(about = "Manage ArcSight ESM active lists", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ~/.esm-lists/config.yml); ESM_LISTS_CONFIG takes precedence
    #[arg(long, global = true)]
    config: Option<String>,

    /// ESM base URL, e.g. https://esm:8443
    #[arg(long, global = true)]
    url: Option<String>,

    /// Login name (password comes from the config file or ESM_PASSWORD)
    #[arg(long, global = true)]
    login: Option<String>,

    /// Default active list resource id
    #[arg(long, global = true)]
    list_id: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, global = true)]
    insecure: bool,

    /// Reject batch entries with columns the first entry lacks
    #[arg(long, global = true)]
    strict_columns: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show active list metadata
    Info {
        /// Resource id (defaults to --list-id)
        #[arg(long)]
        id: Option<String>,
    },

    /// Print all entries, one JSON object per line
    Entries {
        /// Resource id (defaults to --list-id)
        #[arg(long)]
        id: Option<String>,
    },

    /// Add entries
    Add(EntryArgs),

    /// Delete entries
    Delete(EntryArgs),

    /// Remove all entries
    Clear {
        /// Resource id (defaults to --list-id)
        #[arg(long)]
        id: Option<String>,
    },
}

#[derive(Args)]
pub(crate) struct EntryArgs {
    /// Resource id (defaults to --list-id)
    #[arg(long)]
    id: Option<String>,

    /// JSON file holding an array of entry objects
    #[arg(long, conflicts_with = "fields")]
    file: Option<PathBuf>,

    /// Columns of a single entry as COLUMN=VALUE
    fields: Vec<String>,
}

/// A command with its inputs already read and validated
enum Action {
    Info(Option<String>),
    Entries(Option<String>),
    Add(Option<String>, Vec<Entry>),
    Delete(Option<String>, Vec<Entry>),
    Clear(Option<String>),
}

enum Output {
    Entries(Vec<Entry>),
    Reply(Reply),
}

impl Cli {
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = ClientConfig::load(self.config.as_deref())?;

        if let Some(url) = &self.url {
            config.url = url.clone();
        }
        if let Some(login) = &self.login {
            config.login = login.clone();
        }
        if let Some(list_id) = &self.list_id {
            config.list_id = Some(list_id.clone());
        }
        if self.insecure {
            config.verify = false;
        }
        if self.strict_columns {
            config.column_policy = ColumnPolicy::Strict;
        }

        Ok(config)
    }
}

impl Action {
    fn from_command(command: Commands) -> Result<Self> {
        Ok(match command {
            Commands::Info { id } => Action::Info(id),
            Commands::Entries { id } => Action::Entries(id),
            Commands::Add(args) => {
                let entries = read_entries(&args)?;
                Action::Add(args.id, entries)
            }
            Commands::Delete(args) => {
                let entries = read_entries(&args)?;
                Action::Delete(args.id, entries)
            }
            Commands::Clear { id } => Action::Clear(id),
        })
    }

    async fn execute(self, lists: &mut ActiveLists) -> crate::error::Result<Output> {
        match self {
            Action::Info(id) => lists.info(id.as_deref()).await.map(Output::Reply),
            Action::Entries(id) => lists.get_entries(id.as_deref()).await.map(Output::Entries),
            Action::Add(id, entries) => lists
                .add_entries(&entries, id.as_deref())
                .await
                .map(Output::Reply),
            Action::Delete(id, entries) => lists
                .delete_entries(&entries, id.as_deref())
                .await
                .map(Output::Reply),
            Action::Clear(id) => lists.clear_list(id.as_deref()).await.map(Output::Reply),
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.client_config()?;
    let action = Action::from_command(cli.command)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let output = rt.block_on(async move {
        let transport = ActiveLists::http_transport(&config)?;
        ActiveLists::scoped(config, transport, move |lists| {
            Box::pin(async move { action.execute(lists).await })
        })
        .await
    })?;

    print_output(output)
}

fn print_output(output: Output) -> Result<()> {
    match output {
        Output::Reply(Reply::Json(value)) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Output::Reply(Reply::Status(status)) => println!("HTTP {}", status),
        Output::Entries(entries) => {
            if entries.is_empty() {
                eprintln!("No entries found");
            }
            for entry in entries {
                println!("{}", serde_json::to_string(&entry)?);
            }
        }
    }
    Ok(())
}

pub(crate) fn read_entries(args: &EntryArgs) -> Result<Vec<Entry>> {
    if let Some(path) = &args.file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read entries from {:?}", path))?;
        let entries: Vec<Entry> =
            serde_json::from_str(&raw).context("Entries file must be a JSON array of objects")?;
        return Ok(entries);
    }

    if args.fields.is_empty() {
        anyhow::bail!("Provide COLUMN=VALUE pairs or --file");
    }

    let mut entry = Entry::new();
    for field in &args.fields {
        let (column, value) = parse_field(field)?;
        entry.insert(column, value);
    }
    Ok(vec![entry])
}

pub(crate) fn parse_field(field: &str) -> Result<(&str, &str)> {
    field
        .split_once('=')
        .filter(|(column, _)| !column.is_empty())
        .with_context(|| format!("Expected COLUMN=VALUE, got '{}'", field))
}
