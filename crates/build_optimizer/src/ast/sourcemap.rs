use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use swc_core::common::source_map::SourceMapGenConfig;
use swc_core::common::sync::Lrc;
use swc_core::common::{BytePos, FileName, LineCol, SourceMap};

use crate::ast::error::GenerateError;

pub struct SwcSourceMapGenConfig;

impl SourceMapGenConfig for SwcSourceMapGenConfig {
    fn file_name_to_source(&self, f: &FileName) -> String {
        f.to_string()
    }

    fn inline_sources_content(&self, _f: &FileName) -> bool {
        true
    }
}

pub fn build_source_map_to_buf(
    mappings: &[(BytePos, LineCol)],
    cm: &Lrc<SourceMap>,
) -> Result<Vec<u8>> {
    let sm = cm.build_source_map_with_config(mappings, None, SwcSourceMapGenConfig);
    let mut src_buf = vec![];
    sm.to_writer(&mut src_buf).map_err(|err| {
        anyhow!(GenerateError::SourceMapError {
            message: err.to_string()
        })
    })?;
    Ok(src_buf)
}

/// Version 3 source map as handed back to callers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSourceMap {
    pub version: u32,
    #[serde(default)]
    pub file: String,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources_content: Vec<Option<String>>,
    #[serde(default)]
    pub names: Vec<String>,
    pub mappings: String,
}

impl RawSourceMap {
    pub fn from_slice(buf: &[u8]) -> Result<Self> {
        serde_json::from_slice(buf).map_err(|err| {
            anyhow!(GenerateError::SourceMapError {
                message: err.to_string()
            })
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
