//! Command-line access to the Solr helpers. Every result is printed to
//! stdout as JSON.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Map, Value};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use tiploc_mapper::config::{log_level, SolrArgs};
use tiploc_mapper::models::Row;
use tiploc_mapper::solr::{clean_doc, pair_facets, QueryParams, SolrClient, SolrField, SolrMode};
use tiploc_mapper::sources::read_jsonl;

#[derive(Parser, Debug)]
#[command(name = "solr-admin")]
#[command(about = "Query and administer Solr collections")]
struct Args {
    #[command(flatten)]
    solr: SolrArgs,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Mode {
    Collections,
    Cores,
}

impl From<Mode> for SolrMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Collections => SolrMode::Collections,
            Mode::Cores => SolrMode::Cores,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print whether Solr runs collections or cores
    Mode,
    /// List collection (or core) names
    Names,
    /// Ping a collection or core
    Ping {
        name: String,
        #[arg(long, value_enum, default_value = "cores")]
        mode: Mode,
    },
    /// Count matching documents
    Count {
        name: String,
        #[arg(short, long, default_value = "*:*")]
        q: String,
    },
    /// Facet counts of one field
    Facet {
        name: String,
        field: String,
        #[arg(short, long, default_value = "*:*")]
        q: String,
    },
    /// Matching documents
    Query {
        name: String,
        #[arg(short, long, default_value = "*:*")]
        q: String,
        /// Comma-separated field list
        #[arg(long)]
        fl: Option<String>,
        #[arg(long, default_value = "id asc")]
        sort: String,
        /// Row limit; every document when omitted
        #[arg(long)]
        rows: Option<usize>,
    },
    /// Matching documents grouped by a field
    Group {
        name: String,
        field: String,
        #[arg(short, long, default_value = "*:*")]
        q: String,
        #[arg(long)]
        fl: Option<String>,
    },
    /// Show schema fields
    Schema {
        name: String,
        /// Include system and required fields
        #[arg(long)]
        all: bool,
        /// Include copy-field rules
        #[arg(long)]
        copy_fields: bool,
        #[arg(long, value_enum, default_value = "collections")]
        mode: Mode,
    },
    /// Add or replace fields from a JSON list of field definitions
    SetSchema {
        name: String,
        file: PathBuf,
        #[arg(long, value_enum, default_value = "collections")]
        mode: Mode,
    },
    /// Create a collection
    Create {
        name: String,
        #[arg(long, default_value_t = 1)]
        shards: u32,
        #[arg(long, default_value_t = 1)]
        replication: u32,
        /// Leave Solr adding unknown fields to the schema
        #[arg(long)]
        no_lock_schema: bool,
    },
    /// Delete a collection
    Delete {
        name: String,
        /// Keep the schema fields instead of deleting them first
        #[arg(long)]
        keep_schema: bool,
        /// Keep the config set
        #[arg(long)]
        keep_config: bool,
    },
    /// List config sets
    Configs,
    /// Delete a config set
    DeleteConfig { name: String },
    /// Check the default of the add-unknown-fields chain
    CheckMissing {
        name: String,
        #[arg(long, default_value = "false")]
        status: String,
        #[arg(long, value_enum, default_value = "collections")]
        mode: Mode,
    },
    /// Post documents from a JSON-lines file
    Post {
        name: String,
        file: PathBuf,
        #[arg(long, default_value_t = 10000)]
        batch_size: usize,
    },
    /// Set fields on existing documents from a JSON-lines file
    Update {
        name: String,
        file: PathBuf,
        #[arg(long, default_value_t = 10000)]
        batch_size: usize,
    },
}

fn with_fields(params: QueryParams, fl: &Option<String>) -> QueryParams {
    match fl {
        Some(fields) => params.fl(fields),
        None => params,
    }
}

async fn post_batches(
    client: &SolrClient,
    name: &str,
    docs: &[Row],
    batch_size: usize,
    atomic: bool,
) -> Result<Value> {
    let mut responses = Vec::new();
    for (idx, batch) in docs.chunks(batch_size.max(1)).enumerate() {
        let response = if atomic {
            client.update_data(batch, name).await?
        } else {
            client.post_data(batch, name).await?
        };
        info!("batch {}: {} documents", idx + 1, batch.len());
        responses.push(response);
    }
    Ok(Value::Array(responses))
}

async fn run(client: &SolrClient, command: Command) -> Result<Value> {
    let value = match command {
        Command::Mode => match client.detect_mode().await? {
            SolrMode::Collections => json!("collections"),
            SolrMode::Cores => json!("cores"),
        },
        Command::Names => json!(client.get_names().await?),
        Command::Ping { name, mode } => json!(client.ping(&name, mode.into()).await?),
        Command::Count { name, q } => json!(client.get_count(&name, &q).await?),
        Command::Facet { name, field, q } => {
            let flat = client.get_facet(&name, &field, QueryParams::new(&q)).await?;
            let counts: Map<String, Value> = pair_facets(&flat)
                .into_iter()
                .map(|(k, v)| (k, json!(v)))
                .collect();
            Value::Object(counts)
        }
        Command::Query {
            name,
            q,
            fl,
            sort,
            rows,
        } => {
            let params = with_fields(QueryParams::new(&q).sort(&sort), &fl);
            let docs = client.get_query(&name, params, rows).await?;
            Value::Array(docs.into_iter().map(|d| Value::Object(clean_doc(d))).collect())
        }
        Command::Group { name, field, q, fl } => {
            let params = with_fields(QueryParams::new(&q), &fl);
            let groups = client.get_group(&name, &field, params).await?;
            Value::Array(
                groups
                    .into_iter()
                    .map(|g| json!({ "value": g.value, "docs": g.docs }))
                    .collect(),
            )
        }
        Command::Schema {
            name,
            all,
            copy_fields,
            mode,
        } => {
            if copy_fields {
                let schema = client.get_full_schema(&name, mode.into(), all).await?;
                json!({ "fields": schema.fields, "copyFields": schema.copy_fields })
            } else {
                json!(client.get_schema(&name, mode.into(), all).await?)
            }
        }
        Command::SetSchema { name, file, mode } => {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let fields: Vec<SolrField> = serde_json::from_str(&text)
                .with_context(|| format!("{} is not a list of field definitions", file.display()))?;
            client.set_schema(&name, mode.into(), &fields).await?
        }
        Command::Create {
            name,
            shards,
            replication,
            no_lock_schema,
        } => {
            client
                .create_collection(&name, shards, replication, !no_lock_schema)
                .await?;
            json!(name)
        }
        Command::Delete {
            name,
            keep_schema,
            keep_config,
        } => {
            client
                .delete_collection(&name, !keep_schema, !keep_config)
                .await?;
            json!(name)
        }
        Command::Configs => client.get_configs().await?,
        Command::DeleteConfig { name } => {
            client.delete_config(&name).await?;
            json!(name)
        }
        Command::CheckMissing { name, status, mode } => {
            json!(client.check_missing_status(&name, mode.into(), &status).await?)
        }
        Command::Post {
            name,
            file,
            batch_size,
        } => {
            let docs: Vec<Row> = read_jsonl(&file)?;
            post_batches(client, &name, &docs, batch_size, false).await?
        }
        Command::Update {
            name,
            file,
            batch_size,
        } => {
            let docs: Vec<Row> = read_jsonl(&file)?;
            post_batches(client, &name, &docs, batch_size, true).await?
        }
    };
    Ok(value)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(args.verbose))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let client = args.solr.connect()?;
    let value = run(&client, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query() {
        let args = Args::parse_from([
            "solr-admin", "query", "TR", "-q", "TIPLOC:EUSTON", "--fl", "TIPLOC,Name", "--rows", "5",
        ]);
        match args.command {
            Command::Query { name, q, fl, rows, .. } => {
                assert_eq!(name, "TR");
                assert_eq!(q, "TIPLOC:EUSTON");
                assert_eq!(fl.as_deref(), Some("TIPLOC,Name"));
                assert_eq!(rows, Some(5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_admin_defaults() {
        match Args::parse_from(["solr-admin", "create", "PATH"]).command {
            Command::Create {
                shards,
                replication,
                no_lock_schema,
                ..
            } => {
                assert_eq!((shards, replication), (1, 1));
                assert!(!no_lock_schema);
            }
            other => panic!("unexpected {:?}", other),
        }
        match Args::parse_from(["solr-admin", "delete", "PATH"]).command {
            Command::Delete {
                keep_schema,
                keep_config,
                ..
            } => assert!(!keep_schema && !keep_config),
            other => panic!("unexpected {:?}", other),
        }
        match Args::parse_from(["solr-admin", "check-missing", "PATH"]).command {
            Command::CheckMissing { status, .. } => assert_eq!(status, "false"),
            other => panic!("unexpected {:?}", other),
        }
        match Args::parse_from(["solr-admin", "delete", "PATH", "--keep-config"]).command {
            Command::Delete { keep_config, .. } => assert!(keep_config),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_verbose_after_subcommand() {
        assert!(Args::parse_from(["solr-admin", "names", "--verbose"]).verbose);
        assert!(!Args::parse_from(["solr-admin", "names"]).verbose);
    }

    #[test]
    fn test_parse_mode_flag() {
        let args = Args::parse_from(["solr-admin", "ping", "PATH", "--mode", "collections"]);
        match args.command {
            Command::Ping { mode, .. } => {
                assert_eq!(SolrMode::from(mode), SolrMode::Collections)
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
