pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::normalizer::DateRange;

#[derive(Parser)]
#[command(name = "regwatch")]
#[command(about = "Collects penalty and license disclosures from central-bank branch sites", long_about = None)]
pub struct Cli {
    /// Number of parallel workers (default: from config)
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    /// Config file (default: ~/.config/regwatch/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl administrative-penalty listings and store them
    Penalties {
        /// Province to crawl; repeat for several (default: all)
        #[arg(short = 'p', long = "province")]
        provinces: Vec<String>,

        /// Listing pages visited per site
        #[arg(long)]
        max_pages: Option<u32>,

        /// Print the crawled records as JSON
        #[arg(long)]
        json: bool,

        /// Run in the background and report progress while crawling
        #[arg(long)]
        progress: bool,
    },
    /// Crawl the payment-institution license registries and store them
    Licenses {
        /// Report progress while crawling
        #[arg(long)]
        progress: bool,
    },
    /// List stored penalties
    List {
        /// Only this province
        #[arg(short, long)]
        province: Option<String>,

        /// all, year or month
        #[arg(short, long, default_value = "all")]
        range: DateRange,

        /// Only titles containing this text
        #[arg(short, long)]
        keyword: Option<String>,
    },
    /// Show configured sites and their page template
    Sites,
    /// Download the document behind each stored penalty of a province
    Download {
        #[arg(short, long)]
        province: String,

        /// Target directory (default: ~/Downloads/regwatch/<province>)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}
