use std::env;
use std::path::PathBuf;

use cdesynth_core::Template;
use cdesynth_generate::output::csv::write_dataset_csv;
use cdesynth_generate::{GenerateOptions, GenerationEngine, builtin_registry, resolve_row_count};
use cdesynth_plan::load_relationship_specs;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut args = env::args().skip(1);
    let mut template_path: Option<PathBuf> = None;
    let mut relationship_paths: Vec<PathBuf> = Vec::new();
    let mut out_path: Option<PathBuf> = None;
    let mut rows: Option<u64> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--template" => template_path = args.next().map(PathBuf::from),
            "--relationships" => relationship_paths.extend(args.next().map(PathBuf::from)),
            "--out" => out_path = args.next().map(PathBuf::from),
            "--rows" => rows = args.next().map(|value| value.parse()).transpose()?,
            _ => {
                if template_path.is_none() {
                    template_path = Some(PathBuf::from(arg));
                } else {
                    return Err("unexpected argument".into());
                }
            }
        }
    }

    let template_path = template_path.ok_or("missing --template path")?;
    let template = Template::from_yaml_path(&template_path)?;
    if relationship_paths.is_empty() {
        if let Some(files) = &template.relationships {
            relationship_paths = files.paths();
        }
    }
    let relationships = load_relationship_specs(&relationship_paths)?;
    let rows = resolve_row_count(rows, &template)?;

    let registry = builtin_registry();
    let engine = GenerationEngine::new(&registry, GenerateOptions::default());
    let dataset = engine.run(&template, &relationships, rows)?;

    let out_path = out_path.unwrap_or_else(|| PathBuf::from("synthetic.csv"));
    let bytes = write_dataset_csv(&out_path, &dataset.header, &dataset.rows)?;

    println!("out={} bytes={bytes} seed={}", out_path.display(), dataset.report.seed);
    Ok(())
}
