use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use mdseo::diagram::render_diagram;
use mdseo::{Diagnostic, DocumentParser, MarkdownParser, Severity};
use std::path::{Path, PathBuf};

mod build;
mod config;
mod store;

#[derive(Parser)]
#[command(
    name = "mdseo",
    version,
    about = "Render markdown to restricted, search-engine friendly HTML"
)]
struct Cli {
    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Log debug details to stderr
    #[arg(long, global = true)]
    verbose: bool,

    /// Path to mdseo.json (default: ./mdseo.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markdown file to the SEO HTML fragment
    Render {
        /// Path to the markdown file
        file: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print the parsed document tree as JSON
    Tree {
        /// Path to the markdown file
        file: String,
    },

    /// Report what rendering drops or passes through unescaped
    Validate {
        /// Path to the markdown file(s)
        files: Vec<String>,
    },

    /// Build a full HTML page from a markdown file
    Build {
        /// Path to the markdown file
        file: String,

        /// Output directory
        #[arg(long, default_value = "dist")]
        out: String,

        /// Page title (default: first heading)
        #[arg(long)]
        title: Option<String>,

        /// Rebuild whenever the file changes
        #[arg(long)]
        watch: bool,
    },

    /// Render a Mermaid diagram to SVG
    Diagram {
        /// Path to the Mermaid source
        file: String,

        /// Diagram id passed to the renderer
        #[arg(long, default_value = "diagram")]
        id: String,

        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Manage the stored workspace file tree
    Store {
        #[command(subcommand)]
        action: StoreAction,
    },
}

#[derive(Subcommand)]
enum StoreAction {
    /// Import every markdown file under a directory
    Import {
        /// Directory to scan
        dir: PathBuf,
    },
    /// Print the stored tree
    Show,
    /// Move the tree out of the legacy key-value file
    Migrate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let config = config::load_config(cli.config.as_deref())?;
    let parser = MarkdownParser::new(config.parse.to_options());

    match cli.command {
        Commands::Render { file, out } => {
            handle_render(&file, out.as_deref(), &parser)?;
        }
        Commands::Tree { file } => {
            handle_tree(&file, &parser)?;
        }
        Commands::Validate { files } => {
            handle_validate(&files, &parser)?;
        }
        Commands::Build {
            file,
            out,
            title,
            watch,
        } => {
            let page = config.page.to_page_config(title.as_deref());
            build::handle_build(&file, &out, &parser, &page, cli.quiet)?;
            if watch {
                build::watch_and_rebuild(&file, &out, &parser, &page, cli.quiet)?;
            }
        }
        Commands::Diagram { file, id, out } => {
            let source = read_source(&file)?;
            let backend = config.diagram.to_backend();
            let svg = render_diagram(&backend, &source, &id);
            write_output(out.as_deref(), &svg)?;
        }
        Commands::Store { action } => match action {
            StoreAction::Import { dir } => store::import(&dir, &config.storage, cli.quiet)?,
            StoreAction::Show => store::show(&config.storage)?,
            StoreAction::Migrate => store::migrate(&config.storage, cli.quiet)?,
        },
    }

    Ok(())
}

fn read_source(file: &str) -> Result<String> {
    std::fs::read_to_string(file).map_err(|e| anyhow::anyhow!("Failed to read '{}': {}", file, e))
}

fn write_output(out: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match out {
        Some(path) => std::fs::write(path, bytes)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            use std::io::Write;
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.write_all(b"\n")?;
            Ok(())
        }
    }
}

fn handle_render(file: &str, out: Option<&Path>, parser: &MarkdownParser) -> Result<()> {
    let content = read_source(file)?;

    let result = mdseo::render_with(parser, &content);

    // Parse failures still produce (empty) output; report them on stderr
    for diag in &result.diagnostics {
        eprintln!("{}: {}", file, diag.message);
    }

    write_output(out, result.html.as_bytes())
}

fn handle_tree(file: &str, parser: &MarkdownParser) -> Result<()> {
    let content = read_source(file)?;
    let doc = parser
        .parse(&content)
        .map_err(|e| anyhow::anyhow!("Failed to parse '{}': {}", file, e))?;
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}

fn handle_validate(files: &[String], parser: &MarkdownParser) -> Result<()> {
    let mut has_errors = false;

    for file in files {
        let content = read_source(file)?;

        let diagnostics = match parser.parse(&content) {
            Ok(doc) => doc.validate(),
            Err(e) => vec![Diagnostic::new(Severity::Error, "E001", e.to_string())],
        };

        if diagnostics.is_empty() {
            println!("{}: {}", file, "OK".green());
            continue;
        }

        for diag in &diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => {
                    has_errors = true;
                    format!("{}", "error".red().bold())
                }
                Severity::Warning => format!("{}", "warning".yellow().bold()),
                Severity::Info => format!("{}", "info".cyan().bold()),
            };

            let code_str = match &diag.code {
                Some(c) => format!("[{}] ", c),
                None => String::new(),
            };

            println!("{file}: {severity_str}: {code_str}{}", diag.message);
        }
    }

    if has_errors {
        std::process::exit(1);
    }

    Ok(())
}
