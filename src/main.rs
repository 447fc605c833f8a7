//! template-infer CLI - sample models for template previews

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;

use template_infer::fragment_refs::extract_referenced_template_paths;
use template_infer::{
    FixSuggestion, FsTemplateSource, InferConfig, InferError, ModelInference, TemplateSource,
};

#[derive(Parser)]
#[command(name = "template-infer")]
#[command(about = "Infer sample models for Thymeleaf-style templates")]
#[command(version)]
struct Cli {
    /// Config file (default: ./template-infer.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Templates directory (overrides the config file)
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the inferred sample model as JSON
    Infer {
        /// Template path relative to the templates directory (e.g. fragments/card)
        template: String,

        /// Declared fragment parameter (repeatable)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// JSON file with explicit sample data (wins over inferred values)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Do not follow fragment references
        #[arg(long)]
        no_follow: bool,
    },

    /// Print discovered model paths, loop bindings and references
    Paths {
        /// Template path relative to the templates directory
        template: String,

        /// Declared fragment parameter (repeatable)
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print static fragment references of every template in a directory
    Deps {
        /// Directory to scan (default: templates directory)
        dir: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    let result = load_config(cli.config.as_deref(), cli.templates_dir).and_then(|config| match cli.command {
        Commands::Infer {
            template,
            params,
            data,
            no_follow,
        } => infer(&config, &template, params, data.as_deref(), no_follow),
        Commands::Paths {
            template,
            params,
            json,
        } => paths(&config, &template, params, json),
        Commands::Deps { dir } => deps(&config, dir),
    });

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>, templates_dir: Option<PathBuf>) -> Result<InferConfig, InferError> {
    let mut config = InferConfig::load(path)?;
    if let Some(dir) = templates_dir {
        config.templates_dir = dir;
    }
    config.validate()?;
    Ok(config)
}

fn infer(
    config: &InferConfig,
    template: &str,
    params: Vec<String>,
    data: Option<&Path>,
    no_follow: bool,
) -> Result<(), InferError> {
    let inference = ModelInference::from_config(FsTemplateSource::from_config(config), config)
        .follow_references(config.follow_references && !no_follow);

    let model = match data {
        Some(file) => {
            let explicit: serde_json::Value = serde_json::from_str(&fs::read_to_string(file)?)?;
            inference.infer_model_with_data(template, params, &explicit)?
        }
        None => inference.infer_model(template, params)?,
    };

    println!("{}", serde_json::to_string_pretty(&model)?);
    Ok(())
}

fn paths(config: &InferConfig, template: &str, params: Vec<String>, json: bool) -> Result<(), InferError> {
    let source = FsTemplateSource::from_config(config);
    let location = source.location();
    let inference = ModelInference::from_config(source, config);
    let analysis = inference
        .analyze(template, params)?
        .ok_or_else(|| InferError::TemplateNotFound {
            path: template.to_string(),
            root: location,
        })?;

    if json {
        println!("{}", serde_json::to_string_pretty(&*analysis)?);
        return Ok(());
    }

    println!("{}", "Model paths:".cyan().bold());
    for path in analysis.model_paths() {
        println!("  {}", path);
    }

    println!("{}", "Loop bindings:".cyan().bold());
    for (alias, iterable) in analysis.loop_variable_paths() {
        println!("  {} {} {}", alias, "→".cyan(), iterable);
    }

    println!("{}", "References:".cyan().bold());
    for (reference, follow) in analysis.referenced_template_paths_with_recursion_flags() {
        if *follow {
            println!("  {}", reference);
        } else {
            println!("  {} {}", reference, "(self)".dimmed());
        }
    }

    Ok(())
}

fn deps(config: &InferConfig, dir: Option<PathBuf>) -> Result<(), InferError> {
    let root = dir.unwrap_or_else(|| config.templates_dir.clone());
    if !root.is_dir() {
        return Err(InferError::InvalidConfig {
            field: "templates_dir".into(),
            reason: format!("'{}' is not a directory", root.display()),
        });
    }
    let source = FsTemplateSource::new(root).with_suffix(&config.suffix);

    let templates = source.template_paths()?;
    for template in &templates {
        let Some(html) = source.read(template)? else {
            continue;
        };
        println!("{}", template.bold());
        for reference in extract_referenced_template_paths(&html) {
            println!("  {} {}", "→".cyan(), reference);
        }
    }
    println!("{} {} template(s)", "✓".green(), templates.len());
    Ok(())
}
