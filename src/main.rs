//! Settings Dialog CLI
//!
//! Entry point for the `settings-dialog` command-line tool: a text front end
//! over the settings session.

use clap::{Args, Parser, Subcommand};
use serde_json::{json, Map, Value};
use settings_dialog::config::{default_config_path, EffectiveConfig};
use settings_dialog::store::default_root;
use settings_dialog::{
    category_tree, leaves, CategoryEntry, ChangeRecord, JsonFileStore, KeyPath, Session,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "settings-dialog")]
#[command(about = "Inspect and edit schema-driven application settings", version)]
struct Cli {
    #[command(flatten)]
    opts: StoreOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StoreOpts {
    /// Schema file (.json or .toml)
    #[arg(long, short = 's', global = true)]
    schema: Option<PathBuf>,

    /// Tool config file (default: <config dir>/settings-dialog/config.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Root directory of the settings store (default: platform config dir)
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Organization directory under the store root
    #[arg(long, global = true)]
    organization: Option<String>,

    /// Application directory under the organization
    #[arg(long, global = true)]
    application: Option<String>,

    /// Store entry holding the settings document
    #[arg(long, global = true)]
    key: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the category tree
    Tree,

    /// Print the form for one category (default: top level)
    Show {
        /// Dot-separated category path
        category: Option<String>,
    },

    /// Print the committed value of a setting as JSON
    Get {
        /// Dot-separated leaf path
        path: String,
    },

    /// Commit one value immediately
    Set {
        /// Dot-separated leaf path
        path: String,

        /// JSON value; anything that does not parse is taken as a string
        value: String,
    },

    /// Stage edits, then apply them together
    Edit {
        /// Edits as PATH=VALUE
        #[arg(required = true)]
        assignments: Vec<String>,

        /// Show the changes and discard them
        #[arg(long)]
        dry_run: bool,
    },

    /// Restore defaults for a category (default: everything)
    Reset {
        /// Dot-separated category path
        category: Option<String>,

        /// Show the changes and discard them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the effective tool configuration
    Config,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Tree => run_tree(&cli.opts),
        Commands::Show { category } => run_show(&cli.opts, category.as_deref()),
        Commands::Get { path } => run_get(&cli.opts, &path),
        Commands::Set { path, value } => run_set(&cli.opts, &path, &value),
        Commands::Edit {
            assignments,
            dry_run,
        } => run_edit(&cli.opts, &assignments, dry_run),
        Commands::Reset { category, dry_run } => run_reset(&cli.opts, category.as_deref(), dry_run),
        Commands::Config => run_config(&cli.opts),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, err: impl Display) -> ! {
    eprintln!("{}: {}", context, err);
    process::exit(1);
}

fn run_tree(opts: &StoreOpts) {
    let session = open_session(opts);
    fn print_entries(entries: &[CategoryEntry], depth: usize) {
        for entry in entries {
            println!("{}{}", "  ".repeat(depth), entry.key);
            print_entries(&entry.children, depth + 1);
        }
    }
    print_entries(&category_tree(session.schema()), 0);
}

fn run_show(opts: &StoreOpts, category: Option<&str>) {
    let session = open_session(opts);
    let scope = parse_path(category.unwrap_or(""));

    let views = match leaves(&session, &scope) {
        Ok(v) => v,
        Err(e) => fail("Cannot show category", e),
    };

    for view in views {
        match &view.binding {
            Ok(binding) => {
                let mut line = format!("{} ({}) = {}", view.key, view.kind, binding.control.value());
                if let Some(domain) = binding.control.domain() {
                    line.push_str(&format!("  [{}]", domain));
                }
                if binding.clamped {
                    let stored = session.pending(&view.path).cloned().unwrap_or(Value::Null);
                    line.push_str(&format!("  (stored {} is out of range)", stored));
                }
                println!("{}", line);
            }
            Err(e) => println!("{} ({}) ! {}", view.key, view.kind, e),
        }
    }
}

fn run_get(opts: &StoreOpts, path: &str) {
    let session = open_session(opts);
    match session.read(&parse_path(path)) {
        Ok(value) => println!("{}", value),
        Err(e) => fail("Cannot read setting", e),
    }
}

fn run_set(opts: &StoreOpts, path: &str, value: &str) {
    let mut session = open_session(opts);
    if let Err(e) = session.write(&parse_path(path), parse_value(value)) {
        fail("Cannot write setting", e);
    }
}

fn run_edit(opts: &StoreOpts, assignments: &[String], dry_run: bool) {
    let mut session = open_session(opts);

    for assignment in assignments {
        let Some((path, value)) = assignment.split_once('=') else {
            fail("Invalid edit", format!("'{}' is not PATH=VALUE", assignment));
        };
        if let Err(e) = session.edit(&parse_path(path), parse_value(value)) {
            fail("Cannot edit setting", e);
        }
    }

    finish(&mut session, dry_run);
}

fn run_reset(opts: &StoreOpts, category: Option<&str>, dry_run: bool) {
    let mut session = open_session(opts);
    if let Err(e) = session.restore_defaults(&parse_path(category.unwrap_or(""))) {
        fail("Cannot restore defaults", e);
    }
    finish(&mut session, dry_run);
}

fn run_config(opts: &StoreOpts) {
    let config = load_config(opts);
    match config.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => fail("Error serializing output", e),
    }
}

/// Apply staged edits, or print and discard them on a dry run.
fn finish(session: &mut Session<JsonFileStore>, dry_run: bool) {
    if dry_run {
        print_changes(session.changes());
        session.cancel();
        return;
    }

    match session.apply() {
        Ok(changes) => print_changes(&changes),
        Err(e) => {
            print_changes(e.committed_changes());
            fail("Changes were not saved", e);
        }
    }
}

fn print_changes(changes: &[ChangeRecord]) {
    for change in changes {
        println!("{} = {}", change.path, change.value);
    }
}

fn load_config(opts: &StoreOpts) -> EffectiveConfig {
    let user_path = match &opts.config {
        Some(path) if !path.exists() => fail("Config file not found", path.display()),
        Some(path) => Some(path.clone()),
        None => default_config_path(),
    };

    match EffectiveConfig::build(user_path.as_deref(), Some(cli_overrides(opts))) {
        Ok(config) => config,
        Err(e) => fail("Configuration error", e),
    }
}

fn cli_overrides(opts: &StoreOpts) -> Value {
    let mut overrides = Map::new();
    let mut store = Map::new();
    if let Some(org) = &opts.organization {
        overrides.insert("organization".into(), json!(org));
    }
    if let Some(app) = &opts.application {
        overrides.insert("application".into(), json!(app));
    }
    if let Some(schema) = &opts.schema {
        overrides.insert("schema".into(), json!(schema.to_string_lossy()));
    }
    if let Some(key) = &opts.key {
        store.insert("key".into(), json!(key));
    }
    if let Some(dir) = &opts.store_dir {
        store.insert("dir".into(), json!(dir.to_string_lossy()));
    }
    if !store.is_empty() {
        overrides.insert("store".into(), Value::Object(store));
    }
    Value::Object(overrides)
}

fn open_session(opts: &StoreOpts) -> Session<JsonFileStore> {
    let config = load_config(opts);

    let Some(schema_path) = config.schema_path() else {
        fail("No schema", "pass --schema or set `schema` in the config file");
    };
    let schema = match settings_schema::load_file(&schema_path) {
        Ok(s) => s,
        Err(e) => fail("Error loading schema", e),
    };

    let root = config.store_dir().unwrap_or_else(default_root);
    let store = match JsonFileStore::new(&root, &config.namespace()) {
        Ok(s) => s,
        Err(e) => fail("Invalid store", e),
    };

    let mut session = match Session::init(schema, store, config.store_key()) {
        Ok(s) => s,
        Err(e) => fail("Cannot open settings", e),
    };
    if let Some(warning) = session.take_persistence_warning() {
        eprintln!("Warning: merged settings were not saved: {}", warning);
    }
    session
}

fn parse_path(text: &str) -> KeyPath {
    match KeyPath::parse(text) {
        Ok(path) => path,
        Err(e) => fail("Invalid path", e),
    }
}

/// JSON if it parses, otherwise the raw text as a string.
fn parse_value(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}
