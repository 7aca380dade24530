//! `mdseo build`: Wrap a markdown file's SEO fragment in a full HTML page.
//!
//! Writes `<out>/index.html` and copies the source file alongside it.

use anyhow::Result;
use colored::Colorize;
use mdseo::{Document, DocumentParser, MarkdownParser, PageConfig};
use notify::{EventKind, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::mpsc;
use std::time::{Duration, Instant};

pub fn handle_build(
    file: &str,
    out_dir: &str,
    parser: &MarkdownParser,
    page: &PageConfig,
    quiet: bool,
) -> Result<()> {
    let file_path = Path::new(file);
    let content = std::fs::read_to_string(file_path)
        .map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", file, e))?;

    // A document that fails to parse still gets a page, with an empty body.
    let doc = match parser.parse(&content) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("{}: {}", file, e);
            Document::default()
        }
    };

    let source_filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "source.md".to_string());

    let out_path = Path::new(out_dir);
    let html = doc.to_html_page(page);

    std::fs::create_dir_all(out_path)
        .map_err(|e| anyhow::anyhow!("Failed to create '{}': {}", out_dir, e))?;

    let index_path = out_path.join("index.html");
    std::fs::write(&index_path, &html)
        .map_err(|e| anyhow::anyhow!("Failed to write '{}': {}", index_path.display(), e))?;

    let source_dest = out_path.join(&source_filename);
    std::fs::copy(file_path, &source_dest).map_err(|e| {
        anyhow::anyhow!("Failed to copy source to '{}': {}", source_dest.display(), e)
    })?;

    log::info!("built {} from {}", index_path.display(), file);
    if !quiet {
        println!("{} {}", "Built".green().bold(), index_path.display());
        println!("  {} {}", "source:".dimmed(), source_dest.display());
    }

    Ok(())
}

/// Watch the source file for changes and rebuild on each save.
///
/// Debounces rapid events (e.g. editors that write in stages) with a 200ms window.
/// Ctrl+C exits cleanly.
pub fn watch_and_rebuild(
    file: &str,
    out_dir: &str,
    parser: &MarkdownParser,
    page: &PageConfig,
    quiet: bool,
) -> Result<()> {
    let file_path = std::fs::canonicalize(file)
        .map_err(|e| anyhow::anyhow!("Cannot resolve path '{}': {}", file, e))?;

    let watch_dir = file_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine parent directory of '{}'", file))?;

    println!(
        "{} {} for changes (Ctrl+C to stop)",
        "Watching".cyan().bold(),
        file
    );

    let (tx, rx) = mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;

    watcher.watch(watch_dir, RecursiveMode::NonRecursive)?;

    let mut last_rebuild = Instant::now();
    let debounce = Duration::from_millis(200);

    loop {
        match rx.recv_timeout(Duration::from_secs(1)) {
            Ok(event) => {
                let is_write = matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_));
                let affects_our_file = event
                    .paths
                    .iter()
                    .any(|p| p.canonicalize().ok().as_ref() == Some(&file_path));

                if is_write && affects_our_file && last_rebuild.elapsed() > debounce {
                    // Let the editor finish writing
                    std::thread::sleep(Duration::from_millis(50));

                    match handle_build(file, out_dir, parser, page, quiet) {
                        Ok(()) => {
                            last_rebuild = Instant::now();
                        }
                        Err(e) => {
                            eprintln!("{} {}", "Build error:".red().bold(), e);
                        }
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                break;
            }
        }
    }

    Ok(())
}
