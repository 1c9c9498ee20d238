//! 命令行入口
//!
//! 从文件或标准输入读取订阅内容，翻译后写到标准输出或文件。日志写到标准错误。
//! 整体失败时仍然输出原始内容，并以非零状态码退出。

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;

use clap::{Parser, ValueEnum};
use tracing::Level;

use feedtrans::env::{self, EnvVar};
use feedtrans::parsers::decode_bytes;
use feedtrans::translation::{
    ConfigManager, DisplayMode, ServiceKind, TranslateRequest, TranslationConfig, TranslationOutcome,
    TranslationResult, TranslationService,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliDisplayMode {
    Bilingual,
    Translated,
}

impl From<CliDisplayMode> for DisplayMode {
    fn from(mode: CliDisplayMode) -> Self {
        match mode {
            CliDisplayMode::Bilingual => DisplayMode::Bilingual,
            CliDisplayMode::Translated => DisplayMode::Translated,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CliService {
    Ai,
    Google,
}

impl From<CliService> for ServiceKind {
    fn from(service: CliService) -> Self {
        match service {
            CliService::Ai => ServiceKind::Ai,
            CliService::Google => ServiceKind::Google,
        }
    }
}

/// Translate feed article HTML (or Markdown/plain text) into another language
#[derive(Parser, Debug)]
#[command(name = "feedtrans", version, about)]
struct Cli {
    /// Input file, reads stdin when omitted or "-"
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Target language code (e.g. zh, zh-TW, ja, en)
    #[arg(short, long)]
    lang: Option<String>,

    /// Display mode
    #[arg(short, long, value_enum)]
    mode: Option<CliDisplayMode>,

    /// Translation requests in flight per window
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Preferred translation service
    #[arg(short, long, value_enum)]
    service: Option<CliService>,

    /// Configuration file (TOML or JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Image URL to append to Markdown/plain-text content, may be repeated
    #[arg(short, long = "image", value_name = "URL")]
    images: Vec<String>,

    /// Character encoding of the input (e.g. utf-8, gbk, windows-1252)
    #[arg(long, value_name = "LABEL", default_value = "utf-8")]
    encoding: String,

    /// Write output to a file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Only translate content detected as English, pass anything else through unchanged
    #[arg(long)]
    auto_english: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Print the supported environment variables and exit
    #[arg(long)]
    env_docs: bool,

    /// Write an example configuration file and exit
    #[arg(long, value_name = "FILE")]
    generate_config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if cli.env_docs {
        print!("{}", env::generate_env_docs());
        return;
    }

    if let Some(path) = &cli.generate_config {
        match ConfigManager::generate_example_config(path) {
            Ok(()) => eprintln!("已生成示例配置文件: {}", path.display()),
            Err(e) => {
                eprintln!("生成配置文件失败: {}", e);
                process::exit(1);
            }
        }
        return;
    }

    init_logging(cli.verbose);

    let input = match read_input(cli.input.as_ref(), &cli.encoding) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("读取输入失败: {}", e);
            process::exit(1);
        }
    };

    let outcome = match load_config(&cli) {
        Ok(config) => {
            let request = TranslateRequest::from_config(&config);
            let auto_english = config.auto_translate_english;
            match TranslationService::new(config) {
                Ok(service) if auto_english => service
                    .translate_if_english(&input, None, &cli.images, &request)
                    .await
                    .map(|auto| auto.outcome)
                    .unwrap_or_else(|| TranslationOutcome {
                        html: input.clone(),
                        error: None,
                    }),
                Ok(service) => service.translate_content(&input, &cli.images, &request).await,
                Err(e) => failed_outcome(&input, e.to_string()),
            }
        }
        Err(e) => failed_outcome(&input, e.to_string()),
    };

    if let Err(e) = write_output(cli.output.as_ref(), &outcome.html) {
        eprintln!("写入输出失败: {}", e);
        process::exit(1);
    }

    if let Some(error) = outcome.error {
        eprintln!("翻译失败，已输出原始内容: {}", error);
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        Level::DEBUG
    } else {
        env::core::LogLevel::get_or_default("warn".to_string())
            .parse()
            .unwrap_or(Level::WARN)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// 配置文件与环境变量之上再叠加命令行参数
fn load_config(cli: &Cli) -> TranslationResult<TranslationConfig> {
    let manager = match &cli.config {
        Some(path) => ConfigManager::from_file(path)?,
        None => ConfigManager::new()?,
    };

    if let Some(source) = manager.source() {
        tracing::debug!("配置来源: {}", source.display());
    }

    let mut config = match &cli.lang {
        Some(lang) => manager.config_for(lang),
        None => manager.get_config().clone(),
    };

    if let Some(mode) = cli.mode {
        config.display_mode = mode.into();
    }
    if let Some(concurrency) = cli.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(service) = cli.service {
        config.default_service = service.into();
    }
    if cli.auto_english {
        config.auto_translate_english = true;
    }

    config.validate()?;
    Ok(config)
}

fn failed_outcome(input: &str, error: String) -> TranslationOutcome {
    tracing::error!("{}", error);
    TranslationOutcome {
        html: input.to_string(),
        error: Some(error),
    }
}

fn read_input(path: Option<&PathBuf>, encoding: &str) -> io::Result<String> {
    let bytes = match path {
        Some(path) if path.as_os_str() != "-" => fs::read(path)?,
        _ => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            buffer
        }
    };

    Ok(decode_bytes(&bytes, encoding))
}

fn write_output(path: Option<&PathBuf>, html: &str) -> io::Result<()> {
    match path {
        Some(path) => fs::write(path, html),
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.flush()
        }
    }
}
