use clap::{Parser, Subcommand, ValueEnum};
use griddb::grid::{
    FEATURE_CUR_LIMIT, FEATURE_CUR_OFFSET, FEATURE_NEXT_OFFSET, FEATURE_TOTAL_DOCUMENTS,
};
use griddb::{
    parse_schema_str, Criteria, DataType, Document, Grid, GridStore, Item, Operator,
    SchemaDefinition,
};
use serde_json::{Map, Value};
use std::process;

/// GridDB CLI: query an in-memory grid loaded from a schema and a rows file
#[derive(Parser)]
#[command(name = "griddb", version, about)]
struct Cli {
    /// Grid definition (YAML)
    #[arg(long)]
    schema: String,

    /// Rows to load: a JSON array of objects
    #[arg(long)]
    rows: Option<String>,

    /// Output format
    #[arg(long, default_value = "yaml")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch rows, optionally filtered and sorted
    Fetch {
        /// Criterion entries (e.g. --criterion age:BETWEEN:18|30 --criterion name:SORT:DESC)
        #[arg(long = "criterion", value_parser = parse_criterion)]
        criteria: Vec<(String, Operator, Vec<String>)>,
        #[arg(long)]
        offset: Option<usize>,
        #[arg(long)]
        limit: Option<usize>,
        /// Compare text case-sensitively
        #[arg(long)]
        case_sensitive: bool,
    },

    /// Search every searchable column
    Search {
        terms: String,
        /// Operator applied per column (default CONTAINS)
        #[arg(long)]
        operator: Option<Operator>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Suggest values of the suggestable column starting with a fragment
    Suggest {
        fragment: String,
        #[arg(long)]
        operator: Option<Operator>,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },

    /// Per-column statistics
    Analyze {
        /// Distinct sample values to report per column
        #[arg(long, default_value_t = 5)]
        samples: usize,
    },

    /// Print the parsed grid definition
    Schema,
}

/// Parse `field:OPERATOR[:value|value...]`
fn parse_criterion(s: &str) -> Result<(String, Operator, Vec<String>), String> {
    let mut parts = s.splitn(3, ':');
    let field = parts.next().unwrap_or_default();
    let operator = parts
        .next()
        .ok_or_else(|| format!("Invalid criterion '{s}': expected field:OPERATOR[:values]"))?;
    if field.is_empty() {
        return Err(format!("Invalid criterion '{s}': missing field name"));
    }
    let operator: Operator = operator.parse().map_err(|e| format!("{e}"))?;
    let values = match parts.next() {
        Some(values) => values.split('|').map(String::from).collect(),
        None => Vec::new(),
    };
    Ok((field.to_string(), operator, values))
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("ERROR:{e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let definition = load_schema(&cli.schema)?;
    let mut store = GridStore::from_schema(&definition)?;
    if let Some(path) = &cli.rows {
        load_rows(&mut store, path)?;
    }
    let defaults = store.defaults();

    match cli.command {
        Command::Fetch {
            criteria,
            offset,
            limit,
            case_sensitive,
        } => {
            let offset = offset.unwrap_or(defaults.offset);
            let limit = limit.unwrap_or(defaults.limit);
            let grid = if criteria.is_empty() {
                store.fetch_page(offset, limit)?
            } else {
                let mut query = Criteria::new("cli").case_sensitive(case_sensitive);
                for (field, operator, values) in criteria {
                    query.add_item(operator, Item::with_values(field, DataType::Text, values));
                }
                store.fetch_criteria_page(&query, offset, limit)?
            };
            print_output(&grid_to_value(&grid)?, &cli.format)?;
        }

        Command::Search {
            terms,
            operator,
            offset,
            limit,
        } => {
            let grid = store.search(&terms, operator, offset, limit.unwrap_or(defaults.limit))?;
            print_output(&grid_to_value(&grid)?, &cli.format)?;
        }

        Command::Suggest {
            fragment,
            operator,
            limit,
        } => {
            let grid = store.suggest(&fragment, operator, limit)?;
            print_output(&grid_to_value(&grid)?, &cli.format)?;
        }

        Command::Analyze { samples } => {
            let grid = store.analyze(samples)?;
            print_output(&grid_to_value(&grid)?, &cli.format)?;
        }

        Command::Schema => {
            print_output(&serde_json::to_value(&definition)?, &cli.format)?;
        }
    }

    Ok(())
}

fn load_schema(path: &str) -> Result<SchemaDefinition, Box<dyn std::error::Error>> {
    let yaml = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read schema file '{path}': {e}"))?;
    Ok(parse_schema_str(&yaml)?)
}

fn load_rows(store: &mut GridStore, path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read rows file '{path}': {e}"))?;
    let rows: Vec<Map<String, Value>> = serde_json::from_str(&json)
        .map_err(|e| format!("Rows file '{path}' is not a JSON array of objects: {e}"))?;

    let count = rows.len();
    for object in rows {
        let row = object_to_document(store.grid().columns(), object);
        store.add(row)?;
    }
    log::debug!("Loaded {count} rows from {path}");
    Ok(())
}

fn object_to_document(columns: &Document, object: Map<String, Value>) -> Document {
    let mut row = Document::new(columns.name());
    for (key, value) in object {
        // unknown keys are kept as text so validation can report them
        let data_type = columns.data_type(&key).unwrap_or(DataType::Text);
        let values: Vec<String> = match value {
            Value::Null => Vec::new(),
            Value::Array(values) => values.iter().filter_map(scalar_text).collect(),
            other => scalar_text(&other).into_iter().collect(),
        };
        row.add(Item::with_values(key, data_type, values));
    }
    row
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn grid_to_value(grid: &Grid) -> serde_json::Result<Value> {
    let rows: Vec<Value> = grid
        .rows()
        .iter()
        .map(|row| {
            let mut map = Map::new();
            for item in row.items() {
                let value = match item.values() {
                    [] => Value::Null,
                    [single] => Value::String(single.clone()),
                    many => Value::Array(many.iter().cloned().map(Value::String).collect()),
                };
                map.insert(item.name().to_string(), value);
            }
            Value::Object(map)
        })
        .collect();

    let mut out = Map::new();
    out.insert("grid".into(), Value::String(grid.name().to_string()));
    out.insert("rows".into(), Value::Array(rows));

    if let Some(page) = grid.pagination() {
        out.insert("pagination".into(), serde_json::to_value(page)?);
    }

    let features: Map<String, Value> = grid
        .features()
        .iter()
        .filter(|(key, _)| {
            ![
                FEATURE_CUR_OFFSET,
                FEATURE_CUR_LIMIT,
                FEATURE_NEXT_OFFSET,
                FEATURE_TOTAL_DOCUMENTS,
            ]
            .contains(&key.as_str())
        })
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect();
    if !features.is_empty() {
        out.insert("features".into(), Value::Object(features));
    }

    Ok(Value::Object(out))
}

fn print_output(value: &Value, format: &OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(value)?),
    }
    Ok(())
}
