//! OpenAPI to Cedar schema CLI
//!
//! Command-line interface for generating Cedar schemas and starter policies.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cedar_openapi_schema::{
    generate_policies, generate_schema, load_spec_auto, load_text, parse_schema, MappingOptions,
    MappingType,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

const LEGACY_SCHEMA_FILE: &str = "v2.cedarschema.json";
const ANNOTATED_SCHEMA_FILE: &str = "v4.cedarschema.json";
const POLICIES_DIR: &str = "policies";

#[derive(Parser)]
#[command(name = "cedar-openapi")]
#[command(about = "Generate Cedar schemas and policies from OpenAPI descriptions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate Cedar schema from OpenAPI spec
    GenerateSchema {
        /// Path or URL (http:// or https://) of the OpenAPI spec, JSON or YAML
        #[arg(long)]
        api_spec: String,

        /// Cedar namespace for your application
        #[arg(long)]
        namespace: String,

        /// Base path selecting one server when the API declares several
        #[arg(long)]
        base_path: Option<String>,

        /// Mapping type
        #[arg(long, default_value = "SimpleRest")]
        mapping_type: MappingType,

        /// Directory the schema files are written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Generate policies for a Cedar schema
    GeneratePolicies {
        /// Path to the Cedar schema file, JSON or human-readable (.cedarschema)
        #[arg(long)]
        schema: PathBuf,

        /// Directory the policies/ folder is created in
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::GenerateSchema {
            api_spec,
            namespace,
            base_path,
            mapping_type,
            output_dir,
        } => {
            let mut options = MappingOptions::new(namespace).mapping_type(mapping_type);
            if let Some(base_path) = base_path {
                options = options.base_path(base_path);
            }
            run_generate_schema(&api_spec, &options, &output_dir)
        }

        Commands::GeneratePolicies { schema, output_dir } => {
            run_generate_policies(&schema, &output_dir)
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_generate_schema(
    api_spec: &str,
    options: &MappingOptions,
    output_dir: &Path,
) -> Result<(), u8> {
    let spec = load_spec_auto(api_spec).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let mapping = generate_schema(&spec, options).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let legacy = mapping.legacy_json().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;
    let annotated = mapping.annotated_json().map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    write_file(&output_dir.join(LEGACY_SCHEMA_FILE), &legacy)?;
    write_file(&output_dir.join(ANNOTATED_SCHEMA_FILE), &annotated)?;

    println!(
        "Cedar schema successfully generated. Your schema files are named: {}, {}.",
        LEGACY_SCHEMA_FILE, ANNOTATED_SCHEMA_FILE
    );
    println!("{} is compatible with Cedar 2.x and 3.x", LEGACY_SCHEMA_FILE);
    println!(
        "{} is compatible with Cedar 4.x and required by the nodejs Cedar plugins.",
        ANNOTATED_SCHEMA_FILE
    );
    Ok(())
}

fn run_generate_policies(schema_path: &Path, output_dir: &Path) -> Result<(), u8> {
    let content = load_text(schema_path).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let schema = parse_schema(&content).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let policies = generate_policies(schema).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let policies_dir = output_dir.join(POLICIES_DIR);
    std::fs::create_dir_all(&policies_dir).map_err(|e| {
        eprintln!("Error creating {}: {}", policies_dir.display(), e);
        3u8
    })?;

    for (index, policy) in policies.iter().enumerate() {
        let file_name = format!("policy_{}.cedar", index + 1);
        write_file(&policies_dir.join(&file_name), policy)?;
        println!(
            "Cedar policy successfully generated in {}/{}",
            POLICIES_DIR, file_name
        );
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<(), u8> {
    std::fs::write(path, content).map_err(|e| {
        eprintln!("Error writing to {}: {}", path.display(), e);
        3u8
    })
}
