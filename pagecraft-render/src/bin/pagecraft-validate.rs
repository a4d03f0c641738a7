use clap::Parser;
use pagecraft_render::{normalize_schema, BlockKind, PageContent, PageError, SchemaChange};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

/// Validate stored page content or component schema files (JSON or YAML).
#[derive(Parser, Debug)]
#[command(name = "pagecraft-validate", version)]
struct Args {
    /// Files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Treat the files as component schemas instead of page content
    #[arg(long)]
    schema: bool,
}

#[derive(Debug)]
enum FileError {
    Read(String),
    Page(PageError),
}

impl From<PageError> for FileError {
    fn from(err: PageError) -> Self {
        FileError::Page(err)
    }
}

fn main() {
    let args = Args::parse();
    let mut exit_code = 0;

    for path in &args.files {
        let result = if args.schema {
            validate_schema(path)
        } else {
            validate_page(path)
        };
        match result {
            Ok(notes) => {
                println!("✓ {} is valid", path.display());
                for note in notes {
                    println!("  {}", note);
                }
            }
            Err(e) => {
                eprintln!("✗ {} has errors:", path.display());
                print_error(&e);
                exit_code = 1;
            }
        }
    }

    process::exit(exit_code);
}

/// Reads a file as JSON, or as YAML for `.yaml`/`.yml` files.
fn read_value(path: &Path) -> Result<Value, FileError> {
    let text = fs::read_to_string(path).map_err(|e| FileError::Read(e.to_string()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    if is_yaml {
        serde_yaml::from_str(&text).map_err(|e| FileError::Page(PageError::InvalidJson(e.to_string())))
    } else {
        serde_json::from_str(&text).map_err(|e| FileError::Page(e.into()))
    }
}

fn validate_page(path: &Path) -> Result<Vec<String>, FileError> {
    let content = PageContent::normalize(&read_value(path)?)?;
    content.validate()?;

    let mut notes = Vec::new();
    for (index, instance) in content.iter().enumerate() {
        if BlockKind::from_key(&instance.kind).is_none() {
            notes.push(format!(
                "warning: {} has unknown type '{}' and will render as a placeholder",
                instance.render_key(index),
                instance.kind
            ));
        }
    }
    notes.push(format!("{} component(s)", content.len()));
    Ok(notes)
}

fn validate_schema(path: &Path) -> Result<Vec<String>, FileError> {
    let normalized = normalize_schema(&read_value(path)?)?;
    let note = match normalized.change {
        SchemaChange::AddedExtraClasses => "note: extraClasses property is missing and would be added",
        SchemaChange::AlreadyPresent => "extraClasses property present",
    };
    Ok(vec![
        format!("{} properties", normalized.schema.properties.len()),
        note.to_string(),
    ])
}

fn print_error(error: &FileError) {
    match error {
        FileError::Read(msg) => {
            eprintln!("  Failed to read file:");
            eprintln!("    {}", msg);
        }
        FileError::Page(PageError::InvalidJson(msg)) => {
            eprintln!("  Parse error:");
            eprintln!("    {}", msg);
        }
        FileError::Page(PageError::DuplicateId { id }) => {
            eprintln!("  Duplicate component id '{}'", id);
            eprintln!("    Component ids must be unique within a page");
        }
        FileError::Page(e) => {
            eprintln!("  {}", e);
        }
    }
}
