use std::path::Path;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "build-optimizer.config.json";

/// Names the decorator scrubber treats as framework-owned.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct FrameworkVocabulary {
    pub framework_module: String,
    pub decorators: Vec<String>,
    pub helper_module: String,
    pub decorate_helper: String,
    pub metadata_helper: String,
    pub param_helper: String,
    pub class_metadata_helper: String,
    /// Classes that keep their constructor parameter metadata.
    pub whitelisted_services: Vec<String>,
}

impl Default for FrameworkVocabulary {
    fn default() -> Self {
        let strings = |names: &[&str]| -> Vec<String> {
            names.iter().map(|name| name.to_string()).collect()
        };
        FrameworkVocabulary {
            framework_module: "@angular/core".to_string(),
            decorators: strings(&[
                // class decorators
                "Component",
                "Directive",
                "Injectable",
                "NgModule",
                "Pipe",
                // property decorators
                "ContentChild",
                "ContentChildren",
                "HostBinding",
                "HostListener",
                "Input",
                "Output",
                "ViewChild",
                "ViewChildren",
            ]),
            helper_module: "tslib".to_string(),
            decorate_helper: "__decorate".to_string(),
            metadata_helper: "__metadata".to_string(),
            param_helper: "__param".to_string(),
            class_metadata_helper: "ɵsetClassMetadata".to_string(),
            whitelisted_services: strings(&[
                "PlatformRef_",
                "TestabilityRegistry",
                "Console",
                "BrowserPlatformLocation",
            ]),
        }
    }
}

impl FrameworkVocabulary {
    pub fn is_decorator(&self, name: &str) -> bool {
        self.decorators.iter().any(|decorator| decorator == name)
    }

    pub fn is_whitelisted_service(&self, name: &str) -> bool {
        self.whitelisted_services.iter().any(|service| service == name)
    }

    /// Text fragments whose presence makes decorator scrubbing worth a full parse.
    pub fn scrub_markers(&self) -> [&str; 5] {
        [
            "decorators",
            &self.decorate_helper,
            "propDecorators",
            "ctorParameters",
            &self.class_metadata_helper,
        ]
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub strict: bool,
    pub source_map: bool,
    #[serde(default)]
    pub vocabulary: FrameworkVocabulary,
}

const DEFAULT_CONFIG: &str = r#"
{
    "strict": false,
    "source_map": false
}
"#;

impl Config {
    pub fn new(root: &Path, cli_config: Option<&str>) -> Result<Self> {
        let abs_config_file = root.join(CONFIG_FILE);
        let abs_config_file = abs_config_file.to_string_lossy();
        let c = config::Config::builder();
        // default config
        let c = c.add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Json5,
        ));
        // user config
        let c = c.add_source(config::File::with_name(&abs_config_file).required(false));
        // cli config
        let c = if let Some(cli_config) = cli_config {
            c.add_source(config::File::from_str(
                cli_config,
                config::FileFormat::Json5,
            ))
        } else {
            c
        };

        let c = c.build()?;
        c.try_deserialize::<Config>()
            .map_err(|e| anyhow!("config error: {}", e))
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict: false,
            source_map: false,
            vocabulary: FrameworkVocabulary::default(),
        }
    }
}
