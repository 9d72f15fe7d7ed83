use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;

// Import from dmark-core via the CLI lib
use dmark::{discover_documents, report, PreprocessorConfig, Transpiler, Validator};

#[derive(Parser)]
#[command(name = "dmark")]
#[command(about = "Transpile and validate enhanced-markdown documents")]
struct Cli {
    /// Path to custom config file (YAML format)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rewrite one document's enhanced syntax to standard markdown + LaTeX
    Transpile {
        /// Input .dmd or .md file
        input: PathBuf,

        /// Output file path (stdout if not given)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Run the rewrite and report stats without writing any output
        #[arg(long, conflicts_with = "output")]
        check_only: bool,
    },
    /// Check labels, references, and image paths across a whole project
    Validate {
        /// Project directory to scan for .md/.dmd files
        dir: PathBuf,

        /// Show warnings in full, not just a count
        #[arg(short, long)]
        verbose: bool,

        /// Report format
        #[arg(long, value_enum, default_value = "text")]
        format: ReportFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = PreprocessorConfig::load_with_fallback(cli.config.as_deref());

    match cli.command {
        Command::Transpile {
            input,
            output,
            check_only,
        } => transpile(&config, &input, output.as_deref(), check_only),
        Command::Validate {
            dir,
            verbose,
            format,
        } => validate(&config, &dir, verbose, format),
    }
}

fn transpile(
    config: &PreprocessorConfig,
    input: &std::path::Path,
    output: Option<&std::path::Path>,
    check_only: bool,
) -> Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;

    let result = Transpiler::with_config(config).transpile(&content);

    for warning in &result.warnings {
        eprintln!("⚠️  {}:{}: {}", input.display(), warning.line, warning.message);
    }

    if check_only {
        println!("📄 Checked {} (no output written)", input.display());
        print_stats(&result.stats);
        return Ok(());
    }

    match output {
        Some(path) => {
            fs::write(path, &result.content)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("📄 Transpiled {} -> {}", input.display(), path.display());
            print_stats(&result.stats);
        }
        None => print!("{}", result.content),
    }
    Ok(())
}

fn print_stats(stats: &dmark::TranspileStats) {
    println!("   Figures:    {}", stats.figures);
    println!("   Tables:     {}", stats.tables);
    println!("   Cross-refs: {}", stats.cross_refs);
    println!("   Callouts:   {}", stats.callouts);
}

fn validate(
    config: &PreprocessorConfig,
    dir: &std::path::Path,
    verbose: bool,
    format: ReportFormat,
) -> Result<()> {
    let documents = discover_documents(dir)?;
    eprintln!(
        "🔎 Validating {} document(s) under {}",
        documents.len(),
        dir.display()
    );

    let mut validator = Validator::with_config(config);
    for document in &documents {
        let content = fs::read_to_string(document)
            .with_context(|| format!("failed to read {}", document.display()))?;
        // Image paths are resolved relative to the project root.
        validator.collect_file(document, &content, |path| dir.join(path).exists())?;
    }
    validator.resolve_references()?;

    match format {
        ReportFormat::Text => print!("{}", report(validator.diagnostics(), verbose)),
        ReportFormat::Json => {
            println!("{}", serde_json::to_string_pretty(validator.diagnostics())?)
        }
    }

    if !validator.passed() {
        std::process::exit(1);
    }
    Ok(())
}
