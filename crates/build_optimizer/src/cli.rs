use std::path::PathBuf;

use clap::Parser;
use serde_json::{json, Map, Value};

#[derive(Parser, Debug)]
#[command(name = "build-optimizer", version, about = "Marks and rewrites JavaScript so minifiers can drop unused framework code")]
pub struct Cli {
    /// Files to optimize
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
    /// Directory to write results to; prints to stdout when omitted
    #[arg(short, long)]
    pub out_dir: Option<PathBuf>,
    /// Emit a `.map` file next to each output
    #[arg(long)]
    pub source_map: bool,
    /// Fail on input that is not valid JavaScript
    #[arg(long)]
    pub strict: bool,
    /// Treat every input as side-effect free
    #[arg(long)]
    pub side_effect_free: bool,
    /// Treat every input as part of the framework core package
    #[arg(long)]
    pub core: bool,
    /// Directory holding `build-optimizer.config.json`
    #[arg(long)]
    pub root: Option<PathBuf>,
}

impl Cli {
    /// Config overrides for flags given on the command line.
    pub fn config_overrides(&self) -> Option<String> {
        let mut overrides = Map::new();
        if self.strict {
            overrides.insert("strict".to_string(), json!(true));
        }
        if self.source_map {
            overrides.insert("source_map".to_string(), json!(true));
        }
        (!overrides.is_empty()).then(|| Value::Object(overrides).to_string())
    }
}
