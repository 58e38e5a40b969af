#![allow(clippy::expect_used)]

//! Resolve templates from disk and print the routing table as JSON.
//!
//! ```text
//! stack-routes template.yaml [child.yaml ...]
//! ```
//!
//! The first template is the root stack; each further template becomes a
//! child stack named after its file stem.

use std::path::Path;

use stack_routes::swagger::load_document;
use stack_routes::{FsDocumentReader, ResolverConfig, Stack, StackWalker};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let json = std::env::var("STACK_ROUTES_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(err) = result {
        eprintln!("Warning: failed to initialize logging: {err}");
    }
}

fn main() {
    init_logging();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: stack-routes <template> [child-template ...]");
        std::process::exit(2);
    }

    let mut templates = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_document(Path::new(path)) {
            Ok(template) => templates.push(template),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
    }

    let stacks: Vec<Stack> = templates
        .iter()
        .zip(&paths)
        .enumerate()
        .map(|(i, (template, path))| {
            if i == 0 {
                return Stack::root(template);
            }
            let name = Path::new(path)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| format!("Stack{i}"));
            Stack::new(name, template)
        })
        .collect();

    let mut config = ResolverConfig::from_env();
    if config.working_dir.is_none() {
        config.working_dir = Path::new(&paths[0]).parent().map(Path::to_path_buf);
    }

    match StackWalker::new(&config, &FsDocumentReader).resolve(&stacks) {
        Ok(resolution) => {
            let out = serde_json::to_string_pretty(&resolution).expect("resolution serializes");
            println!("{out}");
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
