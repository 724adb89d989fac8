use std::{env, fs, path::PathBuf};

use olap::{query_builder::SqlBuilder, registry::SchemaRegistry, OlapConfig, PlannerOptions, QueryRequest};
use tracing_subscriber::EnvFilter;

fn usage() {
    eprintln!("Usage: print_sql [schema_dir] <request_json>");
    eprintln!("Example: cargo run --example print_sql -- demos/games demos/requests/sales_by_year.json");
    eprintln!("Without schema_dir, [schema] dir from the config file is used.");
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = OlapConfig::load_default();
    let mut args = env::args().skip(1).collect::<Vec<_>>();
    let (schema_dir, request_path) = match args.len() {
        1 => match config.schema.dir.clone() {
            Some(dir) => (dir, PathBuf::from(args.remove(0))),
            None => {
                usage();
                std::process::exit(1);
            }
        },
        2 => {
            let dir = PathBuf::from(args.remove(0));
            (dir, PathBuf::from(args.remove(0)))
        }
        _ => {
            usage();
            std::process::exit(1);
        }
    };

    let registry = SchemaRegistry::load_from_dir(schema_dir)?;
    let request = QueryRequest::from_json(&fs::read_to_string(request_path)?)?;

    let builder = SqlBuilder::new(PlannerOptions::from_config(&config));
    let dialect = config.dialect()?;
    let plan = builder.plan(registry.schema(), &request)?;
    if plan.is_empty() {
        eprintln!("no fact table can answer this request");
        return Ok(());
    }
    for (table, entry) in plan.iter() {
        println!("-- {table} (unresolved fields: {})", entry.unresolved_field_count());
        println!("{};\n", builder.render_with_dialect(entry, table, dialect.as_ref()).sql);
    }
    Ok(())
}
