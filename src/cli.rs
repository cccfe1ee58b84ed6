//! Command-line surface
//!
//! Every command resolves the configured site first, then picks a drive:
//! the one named by `--drive`, or the site's first document library.

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::Config;
use crate::documents::{CharacterTextSplitter, Chunker};
use crate::error::{LoaderError, Result};
use crate::pipeline::{load_file_by_id, load_tree};
use crate::remote::credentials::provider_from_config;
use crate::remote::http_client::graph_client;
use crate::remote::{DriveInfo, GraphClient, GraphDrive, RemoteStorage, ROOT_FOLDER};
use crate::tree::{resolve, ListedNode, TreeWalker};

#[derive(Parser)]
#[command(name = "sharepoint-loader", version)]
#[command(about = "List, mirror and load documents from a SharePoint site")]
pub struct Cli {
    /// Document library to use (defaults to the site's first drive)
    #[arg(long, global = true)]
    pub drive: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the site's document libraries
    Drives,
    /// List a folder tree in traversal order
    Ls {
        #[arg(long, default_value = ROOT_FOLDER)]
        folder: String,
        /// Only the folder's direct children
        #[arg(long)]
        shallow: bool,
        /// One JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Mirror a folder tree into a local directory
    Download {
        #[arg(long, default_value = ROOT_FOLDER)]
        folder: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Download a single file by id
    DownloadFile {
        #[arg(long)]
        file: String,
        #[arg(long)]
        out: PathBuf,
    },
    /// Extract text chunks and print them as JSON lines
    Load {
        #[command(flatten)]
        target: LoadTarget,
        #[command(flatten)]
        split: SplitArgs,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct LoadTarget {
    #[arg(long)]
    pub file: Option<String>,
    #[arg(long)]
    pub folder: Option<String>,
}

#[derive(Args)]
pub struct SplitArgs {
    /// Split each unit into chunks of at most this many characters
    #[arg(long)]
    pub chunk_size: Option<usize>,
    #[arg(long, default_value_t = 0, requires = "chunk_size")]
    pub chunk_overlap: usize,
    #[arg(long, default_value = "\n\n", requires = "chunk_size")]
    pub separator: String,
}

impl SplitArgs {
    fn splitter(&self) -> Result<Option<CharacterTextSplitter>> {
        self.chunk_size
            .map(|size| CharacterTextSplitter::new(self.separator.clone(), size, self.chunk_overlap))
            .transpose()
    }
}

/// Run a parsed command line
pub fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::from_env()?;
    let (graph, site_id) = open_site(&config)?;
    let drives = graph.drives(&site_id)?;

    if let Commands::Drives = cli.command {
        for drive in &drives {
            println!("{}\t{}", drive.name, drive.id);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let selected = select_drive(&drives, cli.drive.as_deref())?;
    tracing::info!("[Cli] Using drive {} ({})", selected.name, selected.id);
    let drive = graph.drive(site_id, selected.id.clone());

    execute(cli.command, &drive)
}

fn open_site(config: &Config) -> Result<(GraphClient, String)> {
    let client = graph_client().clone();
    let credentials = provider_from_config(&config.auth, &config.resource, client.clone());
    let graph = GraphClient::connect(client, config.graph_base_url.as_str(), credentials.as_ref())?;
    let site_id = graph.site_id(&config.site_url)?;
    Ok((graph, site_id))
}

fn select_drive<'a>(drives: &'a [DriveInfo], name: Option<&str>) -> Result<&'a DriveInfo> {
    match name {
        Some(name) => drives.iter().find(|d| d.name == name).ok_or_else(|| {
            let known: Vec<_> = drives.iter().map(|d| d.name.as_str()).collect();
            LoaderError::Config(format!(
                "no drive named {:?} (available: {})",
                name,
                known.join(", ")
            ))
        }),
        None => drives
            .first()
            .ok_or_else(|| LoaderError::Config("site has no document libraries".to_string())),
    }
}

fn execute(command: Commands, drive: &GraphDrive) -> Result<ExitCode> {
    match command {
        Commands::Drives => Ok(ExitCode::SUCCESS),
        Commands::Ls {
            folder,
            shallow,
            json,
        } => {
            let listed: Vec<ListedNode> = if shallow {
                drive
                    .list_all_children(&folder)?
                    .into_iter()
                    .map(|node| ListedNode {
                        path: resolve(&node),
                        node,
                    })
                    .collect()
            } else {
                TreeWalker::new(drive).list_tree(&folder)?
            };
            for entry in &listed {
                if json {
                    print_json(entry);
                } else {
                    let marker = if entry.node.is_folder() { 'd' } else { '-' };
                    println!("{} {}\t{}", marker, entry.path, entry.node.id);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Download { folder, out } => {
            let report = TreeWalker::new(drive).download_tree(&folder, &out)?;
            for failure in &report.failed {
                eprintln!("failed: {} ({}): {}", failure.path, failure.kind, failure.message);
            }
            println!(
                "{} downloaded, {} skipped, {} failed",
                report.succeeded.len(),
                report.skipped.len(),
                report.failed.len()
            );
            Ok(exit_code(report.is_complete()))
        }
        Commands::DownloadFile { file, out } => {
            std::fs::create_dir_all(&out).map_err(|e| LoaderError::local_io(&out, e))?;
            let path = TreeWalker::new(drive).download_file(&file, &out)?;
            println!("{}", path.display());
            Ok(ExitCode::SUCCESS)
        }
        Commands::Load { target, split } => {
            let splitter = split.splitter()?;
            let chunker = splitter.as_ref().map(|s| s as &dyn Chunker);

            if let Some(file_id) = target.file {
                match load_file_by_id(drive, &file_id, chunker)? {
                    (_, Some(chunks)) => chunks.iter().for_each(print_json),
                    (node, None) => {
                        return Err(LoaderError::UnsupportedFormat {
                            mime_type: node.mime_type().unwrap_or_default().to_string(),
                        })
                    }
                }
                return Ok(ExitCode::SUCCESS);
            }

            let folder = target.folder.unwrap_or_else(|| ROOT_FOLDER.to_string());
            let report = load_tree(drive, &folder, chunker)?;
            report.chunks.iter().for_each(print_json);
            for path in &report.unsupported {
                eprintln!("unsupported: {}", path);
            }
            for failure in &report.failed {
                eprintln!("failed: {} ({}): {}", failure.path, failure.kind, failure.message);
            }
            Ok(exit_code(report.is_complete()))
        }
    }
}

fn exit_code(complete: bool) -> ExitCode {
    if complete {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string(value) {
        Ok(line) => println!("{}", line),
        Err(e) => tracing::error!("[Cli] Failed to serialize output: {}", e),
    }
}
