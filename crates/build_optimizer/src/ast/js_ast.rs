use std::fmt;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, FilePathMapping, Globals, Mark, SourceMap, Spanned, GLOBALS};
use swc_core::ecma::ast::{EsVersion, Module};
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::codegen::{Config as JsCodegenConfig, Emitter};
use swc_core::ecma::parser::error::SyntaxError;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{Parser, StringInput, Syntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::VisitMutWith;

use crate::ast::comments::Comments;
use crate::ast::error::{code_frame, GenerateError, ParseError};
use crate::ast::sourcemap::{build_source_map_to_buf, RawSourceMap};

/// A parsed module together with everything needed to print it back.
pub struct JsAst {
    pub ast: Module,
    pub comments: Comments,
    pub cm: Lrc<SourceMap>,
    pub unresolved_mark: Mark,
    pub top_level_mark: Mark,
    globals: Lrc<Globals>,
    path: String,
}

impl fmt::Debug for JsAst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsAst({})", self.path)
    }
}

impl JsAst {
    pub fn new(content: &str, path: &str) -> Result<Self> {
        let cm = Lrc::new(SourceMap::new(FilePathMapping::empty()));
        let fm = cm.new_source_file(FileName::Real(PathBuf::from(path)).into(), content.to_string());
        let comments = Comments::default();
        let lexer = Lexer::new(
            Syntax::Es(Default::default()),
            EsVersion::EsNext,
            StringInput::from(&*fm),
            Some(comments.get_swc_comments()),
        );
        let mut parser = Parser::new_from(lexer);
        let ast = parser.parse_module();

        // handle ast errors
        let mut ast_errors = parser.take_errors();
        // ignore with syntax error in strict mode
        ast_errors.retain(|error| !matches!(error.kind(), SyntaxError::WithInStrict));
        let ast = match ast {
            Ok(ast) if ast_errors.is_empty() => ast,
            result => {
                ast_errors.extend(result.err());
                let errors = ast_errors
                    .iter()
                    .map(|err| code_frame(&cm, err.span(), &err.kind().msg()))
                    .collect::<Vec<String>>();
                return Err(anyhow!(ParseError::JsParseError {
                    messages: errors.join("\n")
                }));
            }
        };

        let globals = Lrc::new(Globals::new());
        let (unresolved_mark, top_level_mark) = GLOBALS.set(&globals, || (Mark::new(), Mark::new()));
        Ok(JsAst {
            ast,
            comments,
            cm,
            unresolved_mark,
            top_level_mark,
            globals,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Binds every identifier to its declaring scope.
    pub fn resolve(&mut self) {
        let JsAst {
            ast,
            globals,
            unresolved_mark,
            top_level_mark,
            ..
        } = self;
        GLOBALS.set(&**globals, || {
            ast.visit_mut_with(&mut resolver(*unresolved_mark, *top_level_mark, false));
        });
    }

    pub fn generate(&self, with_source_map: bool) -> Result<JsAstGenerated> {
        let mut buf = vec![];
        let mut source_map_buf = vec![];
        {
            let mut emitter = Emitter {
                cfg: JsCodegenConfig::default()
                    .with_minify(false)
                    .with_target(EsVersion::EsNext),
                cm: self.cm.clone(),
                comments: Some(self.comments.get_swc_comments()),
                wr: Box::new(JsWriter::new(
                    self.cm.clone(),
                    "\n",
                    &mut buf,
                    if with_source_map {
                        Some(&mut source_map_buf)
                    } else {
                        None
                    },
                )),
            };
            emitter.emit_module(&self.ast).map_err(|err| {
                anyhow!(GenerateError::JsGenerateError {
                    message: err.to_string()
                })
            })?;
        }

        let source_map = if with_source_map {
            let src_buf = build_source_map_to_buf(&source_map_buf, &self.cm)?;
            let filename = &self.path;
            buf.append(
                &mut format!("\n//# sourceMappingURL={filename}.map")
                    .as_bytes()
                    .to_vec(),
            );
            Some(RawSourceMap::from_slice(&src_buf)?)
        } else {
            None
        };

        let code = String::from_utf8(buf)?;
        Ok(JsAstGenerated { code, source_map })
    }
}

pub struct JsAstGenerated {
    pub code: String,
    pub source_map: Option<RawSourceMap>,
}

#[cfg(test)]
mod tests {
    use super::JsAst;
    use crate::ast::error::ParseError;

    #[test]
    fn test_parse_error_carries_location() {
        let err = JsAst::new("var = ;", "broken.js").unwrap_err();
        assert!(err.is::<ParseError>());
        assert!(err.to_string().contains("broken.js:1:"));
    }

    #[test]
    fn test_generate_keeps_comments() {
        let ast = JsAst::new("/* keep */ var a = 1;", "test.js").unwrap();
        let generated = ast.generate(false).unwrap();
        assert!(generated.code.contains("/* keep */"));
        assert!(generated.code.contains("var a = 1;"));
        assert!(generated.source_map.is_none());
    }

    #[test]
    fn test_generate_with_source_map() {
        let ast = JsAst::new("var a = 1;\nvar b = a;\n", "input.js").unwrap();
        let generated = ast.generate(true).unwrap();
        assert!(generated
            .code
            .ends_with("\n//# sourceMappingURL=input.js.map"));
        let map = generated.source_map.unwrap();
        assert_eq!(map.version, 3);
        assert_eq!(map.sources.len(), 1);
        assert!(!map.mappings.is_empty());
    }
}
