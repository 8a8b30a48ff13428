pub const DEFAULT_SNP_COL: &str = "SNP";
pub const DEFAULT_CHR_COL: &str = "CHR";
pub const DEFAULT_POS_COL: &str = "POS";
pub const DEFAULT_A1_COL: &str = "A1";
pub const DEFAULT_A2_COL: &str = "A2";
pub const DEFAULT_PVAL_COL: &str = "p";
pub const DEFAULT_FREQ_COL: &str = "freq";
pub const DEFAULT_BETA_COL: &str = "b";
pub const DEFAULT_SE_COL: &str = "se";
pub const DEFAULT_N_COL: &str = "N";

pub const DEFAULT_DB_CHR_COL: &str = "CHR";
pub const DEFAULT_DB_POS_COL: &str = "POS";
pub const DEFAULT_DB_A1_COL: &str = "REF";
pub const DEFAULT_DB_A2_COL: &str = "ALT";
pub const DEFAULT_DB_ID_COL: &str = "ID";

pub const DEFAULT_MAF: f64 = 0.01;

pub const UNMATCHED_SUFFIX: &str = ".unmatch";
pub const GZIP_SUFFIX: &str = ".gz";

// Lines per batch and batches in flight for the reference prefetch thread.
pub const REFERENCE_BATCH_LINES: usize = 8192;
pub const REFERENCE_PREFETCH_DEPTH: usize = 4;

pub const REFERENCE_PROGRESS_INTERVAL: u64 = 1_000_000;
