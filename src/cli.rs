use crate::design::load_design;
use crate::generator::{generate_service, write_service_file, CodegenOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bodygen")]
#[command(about = "HTTP body type and conversion generator", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate body types, conversions and validations from a resolved design
    Generate {
        /// Resolved design file (JSON or YAML)
        #[arg(short, long)]
        design: PathBuf,

        /// Directory the generated modules are written to
        #[arg(short, long, default_value = "generated")]
        out: PathBuf,

        /// Overwrite existing generated files
        #[arg(short, long, default_value_t = false)]
        force: bool,

        /// Module path of the domain types in the consuming crate
        #[arg(long, default_value = "crate::types")]
        domain_path: String,

        /// Module path of the runtime validation support
        #[arg(long, default_value = "crate::runtime")]
        runtime_path: String,
    },
}

pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            design,
            out,
            force,
            domain_path,
            runtime_path,
        } => {
            let loaded = load_design(&design)?;
            let opts = CodegenOptions {
                domain_path,
                runtime_path,
            };
            for service in &loaded.services {
                let artifacts = generate_service(&loaded.types, service, &opts)?;
                write_service_file(&out, &service.name, &artifacts, force)?;
            }
            Ok(())
        }
    }
}
