use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use build_optimizer::config::Config;
use build_optimizer::{optimize, BuildOptimizerOptions, TransformResult};
use clap::Parser;
use rayon::prelude::*;
use tracing::{debug, info};

mod cli;
mod logger;

fn main() -> Result<()> {
    // logger
    logger::init_logger();

    // cli
    let cli = cli::Cli::parse();
    debug!("cli: {:?}", cli);
    let root = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    // config
    let config = Config::new(&root, cli.config_overrides().as_deref())?;
    debug!("config: {:?}", config);

    if let Some(out_dir) = &cli.out_dir {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("failed to create {}", out_dir.display()))?;
    }

    let results = cli
        .inputs
        .par_iter()
        .map(|input| {
            let output = cli.out_dir.as_ref().map(|out_dir| {
                out_dir.join(input.file_name().unwrap_or(input.as_os_str()))
            });
            let options = BuildOptimizerOptions {
                input_file_path: Some(input.to_string_lossy().to_string()),
                output_file_path: output
                    .as_ref()
                    .map(|output| output.to_string_lossy().to_string()),
                emit_source_map: config.source_map,
                strict: config.strict,
                is_side_effect_free: cli.side_effect_free.then_some(true),
                is_framework_core_file: cli.core.then_some(true),
                ..Default::default()
            };
            let result = optimize(&options, &config.vocabulary)
                .with_context(|| format!("failed to optimize {}", input.display()))?;
            Ok::<_, anyhow::Error>((input, output, result))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut skipped = 0;
    for (input, output, result) in &results {
        if result.skipped {
            skipped += 1;
        }
        match output {
            Some(output) => write_output(input, output, result)?,
            None => print!("{}", output_content(input, result)?),
        }
    }
    info!(
        "optimized {} files, {} already optimal",
        results.len() - skipped,
        skipped
    );
    Ok(())
}

fn output_content(input: &Path, result: &TransformResult) -> Result<String> {
    match &result.content {
        Some(content) => Ok(content.clone()),
        None => fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display())),
    }
}

fn write_output(input: &Path, output: &Path, result: &TransformResult) -> Result<()> {
    fs::write(output, output_content(input, result)?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    if let Some(source_map) = &result.source_map {
        let map_path = format!("{}.map", output.display());
        fs::write(&map_path, source_map.to_json()?)
            .with_context(|| format!("failed to write {}", map_path))?;
    }
    debug!("wrote {}", output.display());
    Ok(())
}
