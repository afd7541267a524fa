use clap::Parser;
use couchfind::{
    equal, exists, greater_equal_than, greater_than, lower_equal_than, lower_than, not_equal,
    regex_match, select, ClientConfig, Database, Direction, Expr, HttpPort, IndexHint,
    QueryOptions, SortField,
};
use serde_json::Value;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "couchfind")]
#[command(about = "Run selector queries against a document database's find endpoint", long_about = None)]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server host (overrides config and environment)
    #[arg(long)]
    host: Option<String>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Target database
    #[arg(short, long)]
    database: Option<String>,

    /// Field equals value (e.g. --eq active=true)
    #[arg(long = "eq", value_parser = parse_field_value)]
    eq: Vec<FieldValue>,

    #[arg(long = "ne", value_parser = parse_field_value)]
    ne: Vec<FieldValue>,

    #[arg(long = "gt", value_parser = parse_field_value)]
    gt: Vec<FieldValue>,

    #[arg(long = "gte", value_parser = parse_field_value)]
    gte: Vec<FieldValue>,

    #[arg(long = "lt", value_parser = parse_field_value)]
    lt: Vec<FieldValue>,

    #[arg(long = "lte", value_parser = parse_field_value)]
    lte: Vec<FieldValue>,

    /// Field must be present
    #[arg(long = "exists")]
    exists: Vec<String>,

    /// Field matches a regular expression (e.g. --regex name=^A)
    #[arg(long = "regex", value_parser = parse_field_value)]
    regex: Vec<FieldValue>,

    /// Comma-separated projection
    #[arg(long, value_delimiter = ',')]
    fields: Vec<String>,

    /// Sort field, optionally suffixed with :asc or :desc
    #[arg(long, value_parser = parse_sort)]
    sort: Vec<SortField>,

    /// Collect up to this many rows across rounds
    #[arg(short, long)]
    limit: Option<usize>,

    /// Collect every match, bounded by the fetch ceiling
    #[arg(long, conflicts_with = "limit")]
    all: bool,

    /// Index hint: design document, or design document and index name as ddoc:name
    #[arg(long)]
    use_index: Option<String>,

    /// Pretty-print rows
    #[arg(long)]
    pretty: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone)]
struct FieldValue {
    field: String,
    value: Value,
}

fn parse_field_value(arg: &str) -> Result<FieldValue, String> {
    let (field, raw) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got '{}'", arg))?;
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok(FieldValue {
        field: field.to_string(),
        value,
    })
}

fn parse_sort(arg: &str) -> Result<SortField, String> {
    let (field, direction) = match arg.rsplit_once(':') {
        Some((field, "asc")) => (field, Direction::Asc),
        Some((field, "desc")) => (field, Direction::Desc),
        Some((_, other)) => return Err(format!("unknown sort direction '{}'", other)),
        None => (arg, Direction::Asc),
    };
    Ok(SortField {
        field: field.to_string(),
        direction,
    })
}

impl Args {
    fn predicates(&self) -> Vec<Expr> {
        let mut exprs = Vec::new();
        let groups: [(&[FieldValue], fn(&str, Value) -> Expr); 6] = [
            (self.eq.as_slice(), |f, v| equal(f, v)),
            (self.ne.as_slice(), |f, v| not_equal(f, v)),
            (self.gt.as_slice(), |f, v| greater_than(f, v)),
            (self.gte.as_slice(), |f, v| greater_equal_than(f, v)),
            (self.lt.as_slice(), |f, v| lower_than(f, v)),
            (self.lte.as_slice(), |f, v| lower_equal_than(f, v)),
        ];
        for (args, build) in groups {
            exprs.extend(args.iter().map(|a| build(&a.field, a.value.clone())));
        }
        exprs.extend(self.exists.iter().map(|f| exists(f)));
        exprs.extend(self.regex.iter().map(|a| {
            let pattern = match &a.value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            regex_match(&a.field, &pattern)
        }));
        exprs
    }

    fn options(&self) -> anyhow::Result<QueryOptions> {
        let mut builder = QueryOptions::builder();
        if !self.fields.is_empty() {
            builder = builder.fields(self.fields.iter().cloned());
        }
        if !self.sort.is_empty() {
            builder = builder.sort(self.sort.iter().cloned());
        }
        if let Some(limit) = self.limit {
            builder = builder.limit(limit);
        }
        if self.all {
            builder = builder.fetch_all();
        }
        if let Some(hint) = &self.use_index {
            let hint = match hint.split_once(':') {
                Some((ddoc, name)) => IndexHint::from((ddoc, name)),
                None => IndexHint::from(hint.as_str()),
            };
            builder = builder.use_index(hint);
        }
        Ok(builder.build()?)
    }

    fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => ClientConfig::default(),
        };
        config.apply_env()?;

        if let Some(host) = &self.host {
            config.hostname = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = &self.database {
            config.database = database.clone();
        }
        if self.verbose {
            config.debug_logging = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = args.client_config()?;

    // Initialize logging
    let default_filter = if config.debug_logging {
        "couchfind=debug"
    } else {
        "couchfind=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let selector = select(args.predicates())?;
    let options = args.options()?;
    tracing::debug!("Query: {}", selector);

    let port = HttpPort::new(&config)?;
    let db = Database::new(&port, &config.database);
    let result = db.find(&selector, &options).await;

    for row in &result {
        let line = if args.pretty {
            serde_json::to_string_pretty(row.raw())?
        } else {
            serde_json::to_string(row.raw())?
        };
        println!("{}", line);
    }

    match result.error() {
        None => {
            eprintln!(
                "{} rows in {} rounds from '{}'",
                result.len(),
                result.rounds(),
                db.name()
            );
            Ok(())
        }
        Some(e) => {
            eprintln!(
                "{} rows before failure in round {}",
                result.len(),
                result.rounds() + 1
            );
            anyhow::bail!("find failed: {}", e)
        }
    }
}
