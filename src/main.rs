//! `blaink-cache`: ローカルの翻訳キャッシュを閲覧・編集する

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use blaink::api::ApiError;
use blaink::config::{
    ConfigError,
    SdkSettings,
};
use blaink::localisation::{
    LocalisationApi,
    LocalisationManager,
    LocalisationStorage,
    LocalisationSyncResponse,
    SyncRequest,
};
use blaink::storage::StorageError;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// 使い方
const USAGE: &str = "\
Usage: blaink-cache [--config DIR] [--store FILE] <COMMAND>

Commands:
  version             Last applied server version
  languages           Languages present in the cache
  get KEY [LANG]      Resolved translation (current language by default)
  all KEY             Every stored translation of KEY
  set-language LANG   Select the current language
  clear               Remove every cached entry";

/// 標準エラーに報告する失敗
#[derive(Error, Debug)]
enum CliError {
    /// コマンドラインが不正（メッセージの後に使い方を表示する）
    #[error("{0}")]
    Usage(String),
    /// オプションまたは位置引数の値が不正
    #[error(transparent)]
    Args(#[from] pico_args::Error),
    /// `blaink.json` の読み込みまたはバリデーションに失敗
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// キャッシュファイルの読み書きに失敗
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// 標準出力への書き込みに失敗
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// 解析済みのサブコマンド
#[derive(Debug, PartialEq, Eq)]
enum Command {
    /// `version`
    Version,
    /// `languages`
    Languages,
    /// `get KEY [LANG]`
    Get {
        /// 翻訳キー
        key: String,
        /// 言語の指定
        lang: Option<String>,
    },
    /// `all KEY`
    All {
        /// 翻訳キー
        key: String,
    },
    /// `set-language LANG`
    SetLanguage {
        /// 新しい現在の言語
        lang: String,
    },
    /// `clear`
    Clear,
}

/// ログ初期化前にコマンドラインから決まる内容
#[derive(Debug)]
struct Invocation {
    /// 実行するサブコマンド
    command: Command,
    /// キャッシュファイル
    store: PathBuf,
    /// 読み込んだ設定またはデフォルト設定
    settings: SdkSettings,
}

/// ネットワークなしで開いたキャッシュ用の同期トランスポート
#[derive(Debug)]
struct Offline;

impl LocalisationApi for Offline {
    async fn sync(&self, _request: &SyncRequest) -> Result<LocalisationSyncResponse, ApiError> {
        Err(ApiError::Transport("blaink-cache works offline".to_string()))
    }
}

/// オプションを除いた残りからサブコマンドを解析する
fn parse_command(mut args: pico_args::Arguments) -> Result<Command, CliError> {
    let name: Option<String> = args.opt_free_from_str()?;
    let command = match name.as_deref() {
        Some("version") => Command::Version,
        Some("languages") => Command::Languages,
        Some("get") => Command::Get { key: args.free_from_str()?, lang: args.opt_free_from_str()? },
        Some("all") => Command::All { key: args.free_from_str()? },
        Some("set-language") => Command::SetLanguage { lang: args.free_from_str()? },
        Some("clear") => Command::Clear,
        Some(other) => return Err(CliError::Usage(format!("Unknown command: {other}"))),
        None => return Err(CliError::Usage("Missing command".to_string())),
    };

    let rest = args.finish();
    if !rest.is_empty() {
        return Err(CliError::Usage(format!("Unexpected arguments: {rest:?}")));
    }
    Ok(command)
}

/// オプション、サブコマンド、参照先の設定を読み込む
fn parse_invocation(mut args: pico_args::Arguments) -> Result<Invocation, CliError> {
    let config_dir: Option<PathBuf> = args.opt_value_from_str("--config")?;
    let store: Option<PathBuf> = args.opt_value_from_str("--store")?;
    let command = parse_command(args)?;
    let settings = load_settings(config_dir)?;
    let store = store.unwrap_or_else(|| settings.localisation_store_path());
    Ok(Invocation { command, store, settings })
}

/// `--config DIR` の設定、指定がなければ SDK キーなしのデフォルト設定
fn load_settings(config_dir: Option<PathBuf>) -> Result<SdkSettings, CliError> {
    let Some(dir) = config_dir else {
        return Ok(SdkSettings::default());
    };
    Ok(blaink::config::load_settings(&dir)?)
}

/// `command` を実行し、結果を標準出力に書き出す
fn run(command: Command, manager: &LocalisationManager<Offline>) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    match command {
        Command::Version => writeln!(out, "{}", manager.cached_version())?,
        Command::Languages => {
            for lang in manager.available_languages() {
                writeln!(out, "{lang}")?;
            }
        }
        Command::Get { key, lang } => {
            let value = match lang {
                Some(lang) => manager.string_in(&key, &lang),
                None => manager.string(&key),
            };
            writeln!(out, "{value}")?;
        }
        Command::All { key } => {
            for (lang, value) in manager.all_translations(&key) {
                writeln!(out, "{lang}\t{value}")?;
            }
        }
        Command::SetLanguage { lang } => {
            manager.set_language(&lang)?;
            tracing::info!(lang = %lang, "Current language updated");
        }
        Command::Clear => {
            manager.clear_cache()?;
            tracing::info!("Cache cleared");
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        let _ = writeln!(std::io::stdout(), "{USAGE}");
        return ExitCode::SUCCESS;
    }

    let Invocation { command, store, settings } = match parse_invocation(args) {
        Ok(parsed) => parsed,
        Err(e) => {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{e}");
            if matches!(e, CliError::Usage(_)) {
                let _ = writeln!(err, "\n{USAGE}");
            }
            return ExitCode::from(2);
        }
    };

    let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
    let default_level = if settings.debug_logs { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(writer)
        .init();

    let result = LocalisationStorage::open(&store).map_err(CliError::from).and_then(|storage| {
        tracing::debug!(store = %store.display(), "Opened translation cache");
        let manager = LocalisationManager::new(
            Arc::new(Offline),
            Arc::new(storage),
            settings.sdk_key.as_str(),
            settings.language.as_deref(),
        )?;
        run(command, &manager)
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
