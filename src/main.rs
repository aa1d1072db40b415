//! # procertify CLI
//!
//! Command-line interface for filling and exporting certificate templates.
//!
//! ## Usage
//!
//! ```bash
//! # List stored projects
//! procertify projects
//!
//! # Show the merged fill form for two projects
//! procertify fields --project <ID> --project <ID>
//!
//! # Export a filled PDF
//! procertify export --project <ID> --set "Ad Soyad=Ali Veli" --set "İmza=@imza.png"
//!
//! # Preview one side as PNG
//! procertify preview --project <ID> --side back --out arka.png
//!
//! # Back up and restore the store
//! procertify backup
//! procertify restore procertify_yedek_07_03_2024.json
//!
//! # Run the HTTP API
//! procertify serve --listen 127.0.0.1:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use procertify::{
    CertifyError,
    export::{ExportOptions, Exporter},
    fill::{project_labels, unify_fields},
    model::{FillValues, SideKind},
    render::{FontBook, ImageLoader, RenderContext, images::data_url_from_file, preview_png},
    server::{self, ServerConfig},
    store::{Backup, JsonFileStore, Snapshot, Store, backup_filename, import_backup},
};

/// procertify - Certificate template filling and PDF export
#[derive(Parser, Debug)]
#[command(name = "procertify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON store holding projects, signatures and companies
    #[arg(long, global = true, default_value = "procertify.json")]
    store: PathBuf,

    /// Extra font directory, searched before the system fonts (repeatable)
    #[arg(long = "fonts", global = true, value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List stored projects
    Projects,

    /// Print the merged fill form for the selected projects as JSON
    Fields {
        /// Project id (repeatable; defaults to the active project)
        #[arg(long = "project", value_name = "ID")]
        projects: Vec<String>,
    },

    /// Fill the selected projects and write one PDF
    Export {
        /// Project id (repeatable, in page order; defaults to the active project)
        #[arg(long = "project", value_name = "ID")]
        projects: Vec<String>,

        /// Fill value as LABEL=VALUE; LABEL=@FILE binds an image file
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        values: Vec<String>,

        /// JSON object of fill values, applied before --set
        #[arg(long, value_name = "FILE")]
        values_file: Option<PathBuf>,

        /// Output file or directory (defaults to the derived filename)
        #[arg(long, short)]
        out: Option<PathBuf>,

        /// JPEG quality of each page
        #[arg(long, default_value = "95")]
        quality: u8,
    },

    /// Render one side of a project to PNG
    Preview {
        /// Project id (defaults to the active project)
        #[arg(long = "project", value_name = "ID")]
        project: Option<String>,

        /// Side to render
        #[arg(long, default_value = "front")]
        side: SideKind,

        /// Fill value as LABEL=VALUE; LABEL=@FILE binds an image file
        #[arg(long = "set", value_name = "LABEL=VALUE")]
        values: Vec<String>,

        /// Output PNG file
        #[arg(long, short, default_value = "preview.png")]
        out: PathBuf,
    },

    /// Write a backup of the whole store
    Backup {
        /// Output file (defaults to procertify_yedek_DD_MM_YYYY.json)
        #[arg(long, short)]
        out: Option<PathBuf>,
    },

    /// Replace the store with the contents of a backup file
    Restore {
        /// Backup file to import
        file: PathBuf,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), CertifyError> {
    let cli = Cli::parse();
    let store = JsonFileStore::new(cli.store.clone());

    match cli.command {
        Commands::Projects => {
            let snapshot = store.load()?;
            let active = snapshot.active_project().map(|p| p.id.clone());
            for project in &snapshot.projects {
                let marker = if active.as_deref() == Some(project.id.as_str()) { "*" } else { " " };
                let sides: Vec<&str> = project.printable_sides().iter().map(|s| s.as_str()).collect();
                println!(
                    "{} {}  {}  {}x{}  [{}]",
                    marker,
                    project.id,
                    project.name,
                    project.width,
                    project.height,
                    sides.join(", ")
                );
                let labels = project_labels(project);
                if !labels.is_empty() {
                    println!("    labels: {}", labels.join(", "));
                }
            }
            Ok(())
        }

        Commands::Fields { projects } => {
            let snapshot = store.load()?;
            let ids = selection(&snapshot, projects)?;
            let selected = snapshot.select(&ids)?;
            let fields = unify_fields(selected.iter().copied());
            println!("{}", serde_json::to_string_pretty(&fields)?);
            Ok(())
        }

        Commands::Export {
            projects,
            values,
            values_file,
            out,
            quality,
        } => {
            let snapshot = store.load()?;
            let ids = selection(&snapshot, projects)?;
            let selected = snapshot.select(&ids)?;
            let fill = fill_values(values_file.as_deref(), &values)?;

            let fonts = FontBook::discover(&cli.font_dirs);
            let images = ImageLoader::new()?;
            let ctx = RenderContext::new(snapshot.lookups(), &images);
            let options = ExportOptions {
                jpeg_quality: quality,
                ..Default::default()
            };

            let runtime = tokio::runtime::Runtime::new()?;
            let exported = runtime.block_on(Exporter::new(&fonts, options).export(&selected, &fill, &ctx))?;
            let Some(doc) = exported else {
                println!("Nothing selected, no document written.");
                return Ok(());
            };

            let path = match out {
                Some(dir) if dir.is_dir() => dir.join(&doc.filename),
                Some(file) => file,
                None => PathBuf::from(&doc.filename),
            };
            std::fs::write(&path, &doc.bytes)?;
            println!("Wrote {} ({} pages) to {}", doc.filename, doc.pages.len(), path.display());
            Ok(())
        }

        Commands::Preview {
            project,
            side,
            values,
            out,
        } => {
            let snapshot = store.load()?;
            let ids = selection(&snapshot, project.into_iter().collect())?;
            let project = snapshot.select(&ids)?[0];
            let fill = fill_values(None, &values)?;

            let fonts = FontBook::discover(&cli.font_dirs);
            let images = ImageLoader::new()?;
            let ctx = RenderContext::new(snapshot.lookups(), &images);

            let runtime = tokio::runtime::Runtime::new()?;
            let png = runtime.block_on(preview_png(project, side, &fill, &fonts, &ctx))?;
            std::fs::write(&out, png)?;
            println!("Saved {} {} to {}", project.name, side, out.display());
            Ok(())
        }

        Commands::Backup { out } => {
            let snapshot = store.load()?;
            let path = out.unwrap_or_else(|| PathBuf::from(backup_filename(chrono::Local::now().date_naive())));
            std::fs::write(&path, serde_json::to_string_pretty(&Backup::now(&snapshot))?)?;
            println!("Backed up {} projects to {}", snapshot.projects.len(), path.display());
            Ok(())
        }

        Commands::Restore { file } => {
            let json = std::fs::read_to_string(&file)?;
            let current = store.load()?;
            let restored = import_backup(&current, &json)?;
            store.save(&restored)?;
            println!(
                "Restored {} projects, {} signatures, {} companies into {}",
                restored.projects.len(),
                restored.signatures.len(),
                restored.companies.len(),
                store.path().display()
            );
            Ok(())
        }

        Commands::Serve { listen } => {
            let config = ServerConfig {
                listen_addr: listen,
                store_path: cli.store,
                font_dirs: cli.font_dirs,
            };
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(config))
        }
    }
}

/// The ids given, or the active project when none were.
fn selection(snapshot: &Snapshot, ids: Vec<String>) -> Result<Vec<String>, CertifyError> {
    if !ids.is_empty() {
        return Ok(ids);
    }
    snapshot
        .active_project()
        .map(|p| vec![p.id.clone()])
        .ok_or_else(|| CertifyError::NotFound("no projects in store".into()))
}

/// Fill values from an optional JSON file, then `LABEL=VALUE` assignments.
fn fill_values(file: Option<&Path>, assignments: &[String]) -> Result<FillValues, CertifyError> {
    let mut values = match file {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => FillValues::new(),
    };
    for assignment in assignments {
        let (label, value) = parse_assignment(assignment)?;
        values.insert(label, value);
    }
    Ok(values)
}

/// `LABEL=VALUE`; a value of `@FILE` becomes a data URL of the file.
fn parse_assignment(s: &str) -> Result<(String, String), CertifyError> {
    let (label, value) = s
        .split_once('=')
        .ok_or_else(|| CertifyError::InvalidArgument(format!("expected LABEL=VALUE, got '{}'", s)))?;
    let label = label.trim();
    if label.is_empty() {
        return Err(CertifyError::InvalidArgument(format!("empty label in '{}'", s)));
    }
    let value = match value.strip_prefix('@') {
        Some(path) => data_url_from_file(Path::new(path))?,
        None => value.to_string(),
    };
    Ok((label.to_string(), value))
}
