//! js2cpp-drv - Compiler Driver
//!
//! Wires the pipeline together for one invocation:
//!
//! ```text
//! Source file (.js)
//!        |
//!        v
//!   [Lexer] --> tokens (preamble first, then the user file)
//!        |
//!        v
//!   [Parser] --> AST annotated with scopes
//!        |
//!        v
//!   [Code generator] --> C++ translation unit (.cpp beside the input)
//! ```
//!
//! Usage is `js2cpp <source-file> [<source-file> ...]`; source paths are
//! positional and nothing else is recognized. Diagnostics stream to stderr
//! one line each, followed by a per-file summary, and the process exit code
//! reports the failure class:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | success |
//! | 1 | argument parse error |
//! | 2 | no source files |
//! | 3 | cannot open a source file |
//! | 4 | cannot open an output file |
//! | 21 | compilation produced one or more errors |

use std::path::{Path, PathBuf};

use js2cpp_gen::CodeGenerator;
use js2cpp_lex::{FileText, Lexer};
use js2cpp_par::Parser;
use js2cpp_util::Handler;
use thiserror::Error;

/// A failed invocation, one variant per exit-code class.
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("argument error: unrecognized option {0}")]
    UnknownOption(String),

    #[error("no source files specified")]
    NoSources,

    #[error("{cause}: {}", path.display())]
    CannotOpenSource { path: PathBuf, cause: std::io::Error },

    #[error("{cause}: {}", path.display())]
    CannotOpenOutput { path: PathBuf, cause: std::io::Error },

    #[error("compilation produced {0} error(s)")]
    CompileErrors(usize),
}

impl DriverError {
    /// The process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            DriverError::UnknownOption(_) => 1,
            DriverError::NoSources => 2,
            DriverError::CannotOpenSource { .. } => 3,
            DriverError::CannotOpenOutput { .. } => 4,
            DriverError::CompileErrors(_) => 21,
        }
    }
}

/// Parsed command line: the source files, in order.
#[derive(Debug, Clone)]
pub struct Config {
    pub input_files: Vec<PathBuf>,
}

/// Parse positional arguments. Anything that looks like an option is
/// rejected.
pub fn parse_args(args: &[String]) -> Result<Config, DriverError> {
    let mut input_files = Vec::new();
    for arg in args {
        if arg.starts_with('-') || arg.starts_with('/') {
            return Err(DriverError::UnknownOption(arg.clone()));
        }
        input_files.push(PathBuf::from(arg));
    }
    if input_files.is_empty() {
        return Err(DriverError::NoSources);
    }
    Ok(Config { input_files })
}

/// Run a full invocation and return the process exit code.
pub fn run(args: &[String]) -> i32 {
    println!("js2cpp v{}", env!("CARGO_PKG_VERSION"));

    let config = match parse_args(args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return e.exit_code();
        }
    };

    let mut total_errors = 0;
    for path in &config.input_files {
        match translate_file(path) {
            Ok(errors) => total_errors += errors,
            Err(e) => {
                eprintln!("{}", e);
                return e.exit_code();
            }
        }
    }

    if total_errors > 0 {
        DriverError::CompileErrors(total_errors).exit_code()
    } else {
        0
    }
}

/// Translate one source file into `x.cpp` beside it.
///
/// Diagnostics go to stderr; the returned count is the number of errors.
/// The output file is written even when the translation had errors, so the
/// emitted text can be inspected.
pub fn translate_file(path: &Path) -> Result<usize, DriverError> {
    let source = FileText::open(path).map_err(|cause| DriverError::CannotOpenSource {
        path: path.to_path_buf(),
        cause,
    })?;

    let handler = Handler::new();
    let code = {
        let lexer = Lexer::new(Box::new(source), &handler);
        let program = Parser::new(lexer, &handler).parse();
        CodeGenerator::new(&program, &handler).generate()
    };

    let out_path = path.with_extension("cpp");
    std::fs::write(&out_path, code).map_err(|cause| DriverError::CannotOpenOutput {
        path: out_path.clone(),
        cause,
    })?;

    for diag in handler.diagnostics() {
        eprintln!("{}", diag);
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    eprintln!(
        "\n{} - {} error(s), {} warning(s)",
        name,
        handler.error_count(),
        handler.warning_count()
    );

    Ok(handler.error_count())
}
