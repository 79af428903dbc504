//! PDF Link Tagger CLI tool
//!
//! A command-line tool for rewriting tracking-tag query parameters in the
//! hyperlink annotations of a PDF document.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use pdf_link_tagger::pdf::{list_pdf_links, retag_pdf, RetagOptions};

/// PDF Link Tagger - Rewrite tracking tags in PDF hyperlinks
#[derive(Parser)]
#[command(name = "pdf-link-tagger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Rewrite the tag parameter on every link under the tracking domain
    pdf-link-tagger retag resume.pdf --base-url https://link.example.com/link/ --tag acme-2024

    # Pick an output path and open the result
    pdf-link-tagger retag resume.pdf --base-url https://link.example.com/link/ --tag acme-2024 -o out.pdf --open

    # List the hyperlinks in a PDF, marking those under the tracking domain
    pdf-link-tagger links resume.pdf --base-url https://link.example.com/link/")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rewrite the tag query parameter of links under a base URL
    Retag {
        /// Input PDF file
        input: PathBuf,

        /// Output PDF file path (defaults to tagged_<input>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Base URL prefix identifying links in scope
        #[arg(long)]
        base_url: String,

        /// Value to write into the tag query parameter
        #[arg(long)]
        tag: String,

        /// Open the output file after creation
        #[arg(long)]
        open: bool,
    },

    /// List the hyperlink annotations in a PDF
    Links {
        /// PDF file to inspect
        input: PathBuf,

        /// Mark links under this base URL prefix
        #[arg(long)]
        base_url: Option<String>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Retag { input, output, base_url, tag, open } => {
            cmd_retag(input, output, base_url, tag, open)
        }
        Commands::Links { input, base_url } => {
            cmd_links(input, base_url)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Default output path next to the input: resume.pdf -> tagged_resume.pdf
fn default_output_path(input: &PathBuf) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.pdf".to_string());
    input.with_file_name(format!("tagged_{}", name))
}

/// Append a .pdf extension if the chosen output name lacks one
fn ensure_pdf_extension(path: PathBuf) -> PathBuf {
    match path.extension() {
        Some(ext) if ext.eq_ignore_ascii_case("pdf") => path,
        _ => {
            let mut name = path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "output".to_string());
            name.push_str(".pdf");
            path.with_file_name(name)
        }
    }
}

/// Open a file with the system default application
fn open_file(path: &PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", "", &path.display().to_string()])
            .spawn()?;
    }
    Ok(())
}

/// Rewrite link tags in a PDF
fn cmd_retag(
    input: PathBuf,
    output: Option<PathBuf>,
    base_url: String,
    tag: String,
    open: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    if tag.trim().is_empty() {
        return Err("Tag value must not be empty".into());
    }

    let output = output
        .map(ensure_pdf_extension)
        .unwrap_or_else(|| default_output_path(&input));

    eprintln!("Rewriting link tags in {}...", input.display());

    let options = RetagOptions { base_url, tag };
    let report = retag_pdf(&input, &output, &options)?;

    for warning in &report.warnings {
        eprintln!("Warning: {}", warning);
    }

    println!("Links found: {}", report.total);
    println!("Links updated: {}", report.updated);
    eprintln!("Output: {}", output.display());

    if open {
        open_file(&output)?;
    }

    Ok(())
}

/// List hyperlinks in a PDF
fn cmd_links(input: PathBuf, base_url: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    if !input.exists() {
        return Err(format!("Input file not found: {}", input.display()).into());
    }

    let links = list_pdf_links(&input)?;

    println!("File: {}", input.display());

    let mut in_scope = 0;
    for link in &links {
        let marker = match &base_url {
            Some(prefix) if link.uri.starts_with(prefix.as_str()) => {
                in_scope += 1;
                " *"
            }
            _ => "",
        };
        println!("Page {}: {}{}", link.page, link.uri, marker);
    }

    println!("Links: {}", links.len());
    if base_url.is_some() {
        println!("In scope (*): {}", in_scope);
    }

    Ok(())
}
