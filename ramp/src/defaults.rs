// One decibel: 10^0.1, so every tenth step is a factor of ten.
pub const DEFAULT_RATIO: f64 = 1.258_925_411_794_167_3;

pub const DEFAULT_RATE_COUNT: u32 = 50;
pub const DEFAULT_RATE_BASE: f64 = 1.0;

pub const DEFAULT_BUCKET_COUNT: u32 = 71;
pub const DEFAULT_BUCKET_BASE_NS: f64 = 1_000.0;

pub const DEFAULT_VEGETA_PATH: &str = "vegeta";
pub const DEFAULT_ATTACK_DURATION: &str = "5s";
pub const DEFAULT_COOLDOWN: &str = "5s";

pub const DEFAULT_GNUPLOT_PATH: &str = "gnuplot";
pub const DEFAULT_PLOT_FILE: &str = "ramp-requests.plt";
pub const DEFAULT_IMAGE_FILE: &str = "result.png";
pub const DEFAULT_IMAGE_SIZE: &str = "1280, 800";
pub const DEFAULT_HTML_CHART: bool = false;

pub const DEFAULT_OUTPUT_DIR: &str = ".";
pub const DEFAULT_CONFIG_PATH: &str = "ramp.toml";
pub const CONFIG_PATH_ENV: &str = "RAMP_CONFIG_PATH";
pub const CONFIG_ENV_PREFIX: &str = "RAMP_";

pub const LATENCY_DATASET_FILE: &str = "results_latency.txt";
pub const SUCCESS_DATASET_FILE: &str = "results_success.txt";
pub const HTML_CHART_FILE: &str = "results.html";
