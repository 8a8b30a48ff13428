use crate::{
    constants::*,
    io::{format::OutputFormat, reference::ReferenceColumnNames, table::ColumnNames},
    utils::util::Result,
};
use clap::{ArgAction, Args, Parser, Subcommand};
use env_logger::fmt::Color;
use log::{Level, LevelFilter};
use once_cell::sync::Lazy;
use std::{
    fs::File,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

/// Full version string including the crate version and git description.
///
/// # Examples
/// * `0.1.0-1ba958a-dirty` - while on a dirty branch
/// * `0.1.0-1ba958a` - with a fresh commit
pub static FULL_VERSION: Lazy<String> = Lazy::new(|| {
    let git_describe = env!("VERGEN_GIT_DESCRIBE");
    if git_describe.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{}-{}", env!("CARGO_PKG_VERSION"), git_describe)
    }
});

#[derive(Parser, Debug)]
#[command(name="rsidx",
          version=&**FULL_VERSION,
          about="Annotate GWAS summary statistics with reference variant identifiers",
          long_about = None,
          help_template = "{name} {version}\n{about-section}\n{usage-heading}\n    {usage}\n\n{all-args}{after-help}",
          )]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Specify multiple times to increase verbosity level (e.g., -vv for more verbosity)
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true
    )]
    pub verbosity: u8,

    /// Also write log output to FILE
    #[arg(
        long = "log",
        value_name = "FILE",
        global = true,
        value_parser = check_prefix_path
    )]
    pub log: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Assign reference identifiers to summary statistics by chromosome, position and alleles
    Annotate(AnnotateArgs),
    /// Rewrite summary statistics into a downstream column layout
    Convert(ConvertArgs),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Annotate(_) => "annotate",
            Command::Convert(_) => "convert",
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct AnnotateArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub reference: ReferenceArgs,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(arg_required_else_help(true))]
pub struct ConvertArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub columns: ColumnArgs,
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// GWAS summary statistics (tab-separated, optionally gzipped)
    #[arg(
        long = "gwas-summary",
        value_name = "FILE",
        value_parser = check_file_exists
    )]
    pub gwas_summary: PathBuf,

    /// Output file, gzip-compressed when it ends in .gz
    #[arg(
        long = "out",
        value_name = "FILE",
        value_parser = check_prefix_path
    )]
    pub out: String,

    /// Output column layout
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Gwas)]
    pub format: OutputFormat,

    /// Drop rows with an allele frequency outside [maf, 1 - maf]
    #[arg(
        long = "maf",
        value_name = "MAF",
        default_value_t = DEFAULT_MAF,
        value_parser = maf_in_range
    )]
    pub maf: f64,

    /// Keep only the lowest p-value row when an identifier occurs more than once
    #[arg(long = "remove-dup-snp")]
    pub remove_dup_snp: bool,

    /// Number of threads to use
    #[arg(
        short = '@',
        long = "threads",
        value_name = "THREADS",
        default_value = "1",
        value_parser = threads_in_range
    )]
    pub num_threads: usize,
}

/// Input table column names.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Input columns")]
pub struct ColumnArgs {
    /// Variant identifier column
    #[arg(long = "SNP", value_name = "COL", default_value = DEFAULT_SNP_COL)]
    pub snp: String,

    /// Chromosome column
    #[arg(long = "chr", value_name = "COL", default_value = DEFAULT_CHR_COL)]
    pub chr: String,

    /// Position column
    #[arg(long = "pos", value_name = "COL", default_value = DEFAULT_POS_COL)]
    pub pos: String,

    /// Effect allele column
    #[arg(long = "A1", value_name = "COL", default_value = DEFAULT_A1_COL)]
    pub a1: String,

    /// Other allele column
    #[arg(long = "A2", value_name = "COL", default_value = DEFAULT_A2_COL)]
    pub a2: String,

    /// P-value column
    #[arg(long = "pval", value_name = "COL", default_value = DEFAULT_PVAL_COL)]
    pub pval: String,

    /// Allele frequency column
    #[arg(long = "freq", value_name = "COL", default_value = DEFAULT_FREQ_COL)]
    pub freq: String,

    /// Effect size column
    #[arg(long = "beta", value_name = "COL", default_value = DEFAULT_BETA_COL)]
    pub beta: String,

    /// Standard error column
    #[arg(long = "se", value_name = "COL", default_value = DEFAULT_SE_COL)]
    pub se: String,

    /// Sample size column
    #[arg(long = "n", value_name = "COL", default_value = DEFAULT_N_COL)]
    pub n: String,
}

impl ColumnArgs {
    pub fn names(&self) -> ColumnNames {
        // Order follows `Field::ALL`.
        ColumnNames::new([
            self.snp.clone(),
            self.chr.clone(),
            self.pos.clone(),
            self.a1.clone(),
            self.a2.clone(),
            self.pval.clone(),
            self.freq.clone(),
            self.beta.clone(),
            self.se.clone(),
            self.n.clone(),
        ])
    }
}

/// Reference database and its column names.
#[derive(Args, Debug, Clone)]
#[command(next_help_heading = "Reference")]
pub struct ReferenceArgs {
    /// Reference database sorted by chromosome and position (.bim/.bim.gz or tab-separated with header)
    #[arg(long = "dbsnp", value_name = "FILE", value_parser = check_file_exists)]
    pub dbsnp: PathBuf,

    /// Reference chromosome column
    #[arg(long = "dbchr", value_name = "COL", default_value = DEFAULT_DB_CHR_COL)]
    pub db_chr: String,

    /// Reference position column
    #[arg(long = "dbpos", value_name = "COL", default_value = DEFAULT_DB_POS_COL)]
    pub db_pos: String,

    /// Reference first allele column
    #[arg(long = "dbA1", value_name = "COL", default_value = DEFAULT_DB_A1_COL)]
    pub db_a1: String,

    /// Reference second allele column
    #[arg(long = "dbA2", value_name = "COL", default_value = DEFAULT_DB_A2_COL)]
    pub db_a2: String,

    /// Reference identifier column
    #[arg(long = "dbrsid", value_name = "COL", default_value = DEFAULT_DB_ID_COL)]
    pub db_id: String,
}

impl ReferenceArgs {
    pub fn names(&self) -> ReferenceColumnNames {
        ReferenceColumnNames {
            chr: self.db_chr.clone(),
            pos: self.db_pos.clone(),
            a1: self.db_a1.clone(),
            a2: self.db_a2.clone(),
            id: self.db_id.clone(),
        }
    }
}

/// Initializes logging at a level set by the number of `-v` flags.
///
/// With `--log`, every record is also written, uncoloured, to that file.
pub fn init_verbose(args: &Cli) -> Result<()> {
    let filter_level: LevelFilter = match args.verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let log_file = match &args.log {
        Some(path) => Some(Mutex::new(File::create(path).map_err(|error| {
            crate::rsidx_error!("Failed to create log file {}: {error}", path)
        })?)),
        None => None,
    };

    env_logger::Builder::from_default_env()
        .format(move |buf, record| {
            let level = record.level();
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
            let module = record.module_path().unwrap_or("unknown_module");

            if let Some(file) = &log_file {
                if let Ok(mut file) = file.lock() {
                    let line = format!("{} [{}] {} - {}\n", timestamp, level, module, record.args());
                    file.write_all(line.as_bytes())?;
                }
            }

            let mut style = buf.style();
            match level {
                Level::Error => style.set_color(Color::Red),
                Level::Warn => style.set_color(Color::Yellow),
                Level::Info => style.set_color(Color::Green),
                Level::Debug => style.set_color(Color::Blue),
                Level::Trace => style.set_color(Color::Cyan),
            };

            writeln!(
                buf,
                "{} [{}] {} - {}",
                timestamp,
                style.value(level),
                module,
                record.args()
            )
        })
        .filter_level(filter_level)
        .try_init()
        .map_err(|error| crate::rsidx_error!("Failed to initialize logger: {error}"))
}

fn threads_in_range(s: &str) -> Result<usize> {
    let thread: usize = s
        .parse::<usize>()
        .map_err(|_| crate::rsidx_error!("`{}` is not a valid thread number", s))?;
    if thread == 0 {
        return Err(crate::rsidx_error!("Number of threads must be >= 1"));
    }
    Ok(thread)
}

fn maf_in_range(s: &str) -> Result<f64> {
    let maf: f64 = s
        .parse::<f64>()
        .map_err(|_| crate::rsidx_error!("`{}` is not a valid frequency", s))?;
    if !(0.0..0.5).contains(&maf) {
        return Err(crate::rsidx_error!("MAF threshold must be in [0, 0.5)"));
    }
    Ok(maf)
}

fn check_file_exists(s: &str) -> Result<PathBuf> {
    let path = Path::new(s);
    if !path.exists() {
        return Err(crate::rsidx_error!("File does not exist: {}", path.display()));
    }
    Ok(path.to_path_buf())
}

fn check_prefix_path(s: &str) -> Result<String> {
    let path = Path::new(s);
    if let Some(parent_dir) = path.parent() {
        if !parent_dir.as_os_str().is_empty() && !parent_dir.exists() {
            return Err(crate::rsidx_error!(
                "Path does not exist: {}",
                parent_dir.display()
            ));
        }
    }
    Ok(s.to_string())
}
