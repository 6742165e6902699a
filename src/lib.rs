pub mod cli;
pub mod config;
pub mod filter;
pub mod highlight;
mod output;
pub mod twitch;
pub mod util; // doctestのためpubにする

use std::cell::Cell;
use std::collections::HashSet;
use std::future::Future;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use filter::RuleSet;
use output::Printer;
use twitch::{ChatDownloader, DownloadEvent, DownloadSummary, VideoId};

/// ログ出力の初期化（標準エラー出力、RUST_LOG未設定時はwarn）
///
/// `log`クレートのマクロはtracing-logブリッジ経由でここに流れる
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

pub fn run() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    // シングルスレッドで協調的に並行処理する
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start async runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    runtime.block_on(search(cli))
}

async fn search(cli: Cli) -> ExitCode {
    let printer = Printer::new(cli.plain, cli.print_links);

    // ルールはダウンロード開始前に確定させる
    let dictionary = match load_rules(cli.dict.as_deref(), RuleSet::dictionary::<String>).await {
        Ok(rules) => rules,
        Err(e) => {
            printer.error(&e);
            return ExitCode::FAILURE;
        }
    };
    let users = match load_rules(cli.users.as_deref(), RuleSet::users::<String>).await {
        Ok(rules) => rules,
        Err(e) => {
            printer.error(&e);
            return ExitCode::FAILURE;
        }
    };

    let config = cli.scraper_config();
    let downloader = match ChatDownloader::new(&config) {
        Ok(downloader) => downloader,
        Err(e) => {
            printer.error(&e.to_string());
            return ExitCode::FAILURE;
        }
    };

    let mut video_ids = cli.video_ids.clone();

    if let Some(channel) = cli.vods_from.as_deref() {
        printer.notice(&format!(
            "\nObtaining the {} most recent VOD IDs from '{}' ...",
            cli.max_vods, channel
        ));
        let cancel = downloader.cancellation_token();
        match twitch::vod_list::get_recent_vods(downloader.transport(), channel, cli.max_vods, &cancel)
            .await
        {
            Ok(ids) => video_ids.extend(ids),
            Err(e) => {
                printer.error(&e.to_string());
                return ExitCode::FAILURE;
            }
        }
    }

    let mut video_ids = dedup_preserving_order(video_ids);
    if video_ids.is_empty() {
        printer.error("No VOD IDs provided.");
        return ExitCode::FAILURE;
    }

    if cli.skip_cached {
        video_ids = downloader.remove_cached_vods_from_list(&video_ids);
        if video_ids.is_empty() {
            printer.notice("\nNo VODs to search!\n");
            return ExitCode::SUCCESS;
        }
    }

    if cli.no_search {
        printer.notice(&format!(
            "\nSkipping search. VOD IDs that would have been searched: {}\n",
            video_ids.join(" ")
        ));
        return ExitCode::SUCCESS;
    }

    printer.notice(&format!(
        "\nSearching chat replays from: {} ...",
        video_ids.join(" ")
    ));

    let found = Cell::new(0usize);
    let on_event = |event: DownloadEvent| match event {
        DownloadEvent::Data { video_id, messages } => {
            for message in &messages {
                let result = filter::evaluate(message, &dictionary, &users);
                if result.included {
                    found.set(found.get() + 1);
                    printer.message(&video_id, message, &result.spans);
                }
            }
        }
        DownloadEvent::Progress => printer.tick(),
        DownloadEvent::Error { video_id, message } => {
            printer.error(&format!("VOD {}: {}", video_id, message));
        }
        DownloadEvent::Success => {
            printer.notice(&format!("\nFound {} messages in total.\n", found.get()));
        }
        DownloadEvent::Failure => {
            printer.error("\nOne or more operations have failed.");
        }
    };

    let replays = downloader.get_chat_replays(&video_ids, cli.force_download, on_event);
    tokio::pin!(replays);

    let summary = tokio::select! {
        summary = &mut replays => summary,
        Ok(()) = tokio::signal::ctrl_c() => {
            log::warn!("Interrupted, waiting for running downloads to stop (press Ctrl+C again to exit now)");
            downloader.abort_all();
            match wait_unless_interrupted(&mut replays, second_interrupt()).await {
                Some(summary) => summary,
                None => {
                    log::warn!("Interrupted again, exiting without waiting");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// 次のCtrl+Cを待つ（シグナルを登録できない場合は永久に待つ）
async fn second_interrupt() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// 中断後のジョブ終了を待つ。先に`interrupt`が完了した場合はNone
async fn wait_unless_interrupted<F, I>(replays: F, interrupt: I) -> Option<DownloadSummary>
where
    F: Future<Output = DownloadSummary>,
    I: Future<Output = ()>,
{
    tokio::select! {
        biased;
        summary = replays => Some(summary),
        _ = interrupt => None,
    }
}

/// ルール引数を読み込む（未指定なら空のルール）
async fn load_rules<F>(arg: Option<&str>, build: F) -> Result<RuleSet, String>
where
    F: Fn(&[String]) -> RuleSet,
{
    match arg {
        Some(arg) => Ok(build(&filter::load_list(arg).await?)),
        None => Ok(RuleSet::default()),
    }
}

fn dedup_preserving_order(video_ids: Vec<VideoId>) -> Vec<VideoId> {
    let mut seen = HashSet::new();
    video_ids
        .into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
