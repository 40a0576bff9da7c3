use std::{env, fs, path::PathBuf};

pub use log::{debug, error, info, trace, warn, LevelFilter};
use log4rs::{
    append::{
        console::{ConsoleAppender, Target},
        file::FileAppender,
    },
    config::{Appender, Config, Logger, Root},
    encode::pattern::PatternEncoder,
    filter::threshold::ThresholdFilter,
};
use sanitize_filename::sanitize_with_options;

/// Crates whose chatter is capped at `Error` regardless of configured levels.
const QUIET_CRATES: &[&str] = &["hyper", "reqwest", "rustls", "want"];

const CONSOLE_PATTERN: &str = "{h({l:<5})} {t} - {m}{n}";
const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S%.3f)} {l:<5} {t} - {m}{n}";

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerConfigBuilder<'a> {
    config: LoggerConfig<'a>,
}

impl<'a> LoggerConfigBuilder<'a> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appended to the log file name, e.g. the word being looked up.
    #[must_use]
    pub fn name_suffix(mut self, name_suffix: &'a str) -> Self {
        self.config.name_suffix = Some(name_suffix);
        self
    }

    #[must_use]
    pub fn program_name(mut self, program_name: &'a str) -> Self {
        self.config.program_name = Some(program_name);
        self
    }

    #[must_use]
    pub fn file_log_level(mut self, log_level: LevelFilter) -> Self {
        self.config.file_log_level = Some(log_level);
        self
    }

    #[must_use]
    pub fn console_log_level(mut self, log_level: LevelFilter) -> Self {
        self.config.console_log_level = Some(log_level);
        self
    }

    #[must_use]
    pub fn build(self) -> LoggerConfig<'a> {
        self.config
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LoggerConfig<'a> {
    pub(crate) name_suffix: Option<&'a str>,
    pub(crate) program_name: Option<&'a str>,
    pub(crate) file_log_level: Option<LevelFilter>,
    pub(crate) console_log_level: Option<LevelFilter>,
}

impl<'a> From<LoggerConfigBuilder<'a>> for LoggerConfig<'a> {
    fn from(builder: LoggerConfigBuilder<'a>) -> Self {
        builder.build()
    }
}

impl LoggerConfig<'_> {
    #[must_use]
    pub fn builder<'b>() -> LoggerConfigBuilder<'b> {
        LoggerConfigBuilder::new()
    }

    /// Where the file appender writes for this configuration.
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        let program_name = self
            .program_name
            .map_or_else(|| env!("CARGO_PKG_NAME").to_string(), ToString::to_string);

        let file_name = match self.name_suffix {
            Some(suffix) => format!("{program_name}_{suffix}.log"),
            None => format!("{program_name}.log"),
        };

        let file_name = sanitize_with_options(
            file_name,
            sanitize_filename::Options {
                truncate: true,
                replacement: "^",
                ..Default::default()
            },
        );

        env::temp_dir().join(file_name)
    }
}

/// Installs the global logger.
///
/// Console output goes to stderr so that stdout stays free for results.
pub fn init<'a, T: Into<LoggerConfig<'a>>>(cfg: T) -> anyhow::Result<log4rs::Handle> {
    let cfg: LoggerConfig = cfg.into();

    let mut config = Config::builder();
    let mut root = Root::builder();

    let log_file = cfg.log_file_path();
    fs::create_dir_all(log_file.parent().ok_or_else(|| {
        anyhow::anyhow!(
            "Failed to get parent directory of log file path: {:?}",
            &log_file
        )
    })?)?;

    let appender = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(FILE_PATTERN)))
        .build(&log_file)?;
    let log_level = cfg.file_log_level.unwrap_or(LevelFilter::Debug);
    config = config.appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("logfile", Box::new(appender)),
    );
    root = root.appender("logfile");

    {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
            .build();
        let log_level = cfg.console_log_level.unwrap_or(LevelFilter::Warn);
        config = config.appender(
            Appender::builder()
                .filter(Box::new(ThresholdFilter::new(log_level)))
                .build("console", Box::new(console)),
        );
        root = root.appender("console");
    }

    for name in QUIET_CRATES {
        config = config.logger(Logger::builder().build(*name, LevelFilter::Error));
    }

    let config = config.build(root.build(LevelFilter::Trace))?;

    let handle = log4rs::init_config(config)?;

    debug!("Logging to {:?}", &log_file);

    Ok(handle)
}
