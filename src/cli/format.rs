//! Format command implementation.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use crate::cli::AppContext;
use crate::cli::args::FormatArgs;
use crate::core::document::{FormattedDocument, html_to_text};
use crate::core::stream::{NullRenderer, Renderer, WriterRenderer};
use crate::error::{DocstreamError, Result};
use crate::render::to_json;

#[derive(Serialize)]
struct FormatJson<'a> {
    mode: &'a str,
    chars: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<&'a Path>,
    #[serde(skip_serializing_if = "Option::is_none")]
    saved: Option<&'a Path>,
    html: &'a str,
}

/// Execute the format command.
///
/// In human mode without `--plain` the HTML is streamed to stdout as it
/// arrives. Otherwise the document is printed once complete.
///
/// # Errors
///
/// Returns input, pipeline and stream errors. On a stream failure the
/// partial document has already been written to stdout.
pub async fn execute(ctx: &AppContext, args: &FormatArgs) -> Result<()> {
    let content = read_input(args.input_path())?;
    let mode = args.mode.unwrap_or(ctx.config.default_mode);
    let live = !ctx.is_json() && !args.plain && !args.quiet;

    let mut renderer: Box<dyn Renderer> = if live {
        Box::new(WriterRenderer::new(std::io::stdout()))
    } else {
        Box::new(NullRenderer)
    };

    let document = match ctx.formatter().format(mode, &content, renderer.as_mut()).await {
        Ok(document) => document,
        Err(err) => {
            if let Some(partial) = err.partial_output() {
                print_partial(ctx, partial, live, args);
            }
            return Err(err);
        }
    };

    if let Some(path) = &args.output {
        write_file(path, &document.html)?;
        tracing::info!(path = %path.display(), "Document written");
    }
    let saved = save_target(ctx, args)
        .map(|dir| document.save_to(&dir))
        .transpose()?;

    report(ctx, args, &document, saved.as_deref())
}

fn report(
    ctx: &AppContext,
    args: &FormatArgs,
    document: &FormattedDocument,
    saved: Option<&Path>,
) -> Result<()> {
    if ctx.is_json() {
        let body = FormatJson {
            mode: document.mode.as_str(),
            chars: document.html.chars().count(),
            output: args.output.as_deref(),
            saved,
            html: &document.html,
        };
        println!("{}", to_json(&body, ctx.pretty)?);
        return Ok(());
    }

    if args.plain {
        println!("{}", document.plain_text());
    }
    if document.is_empty() {
        eprintln!("Warning: the response contained no document markup");
    }
    if let Some(path) = saved {
        eprintln!("Saved {}", path.display());
    }
    Ok(())
}

/// Partial output for modes that did not stream it live.
///
/// JSON mode prints nothing: the partial document travels in the error
/// object on stderr and stdout stays valid JSON or empty.
fn print_partial(ctx: &AppContext, partial: &str, live: bool, args: &FormatArgs) {
    if ctx.is_json() {
        return;
    }
    if live || args.quiet {
        println!();
        return;
    }
    if args.plain {
        println!("{}", html_to_text(partial));
    } else {
        println!("{partial}");
    }
}

fn save_target(ctx: &AppContext, args: &FormatArgs) -> Option<PathBuf> {
    if let Some(dir) = &args.save_dir {
        return Some(dir.clone());
    }
    if args.save {
        return Some(
            ctx.config
                .output_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
        );
    }
    None
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    let content = match path {
        Some(path) => std::fs::read_to_string(path).map_err(|e| {
            DocstreamError::Config(format!("Cannot read input {}: {e}", path.display()))
        })?,
        None => read_stream(std::io::stdin().lock())?,
    };
    Ok(content)
}

fn read_stream(mut reader: impl Read) -> Result<String> {
    let mut buf = String::new();
    reader
        .read_to_string(&mut buf)
        .context("Failed to read input from stdin")?;
    Ok(buf)
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}
