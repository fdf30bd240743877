use std::sync::Arc;

use screeneye::config::Config;
use screeneye::engine::config::EngineConfig;
use screeneye::engine::session::AttentionEngine;
use screeneye::engine::types::FrameSignal;
use screeneye::feedback::TracingFeedback;
use screeneye::logging::{init_tracing, LogConfig};
use screeneye::state::SessionHandle;
use screeneye::store::Store;
use screeneye::workers::event_log::EventLogWriter;
use screeneye::workers::{ShutdownSequence, WorkerManager};
use tokio::sync::mpsc;

const USAGE: &str = "usage: screeneye [logs [N]]\n\
    without arguments, reads detector frames (JSON, one per line) from stdin;\n\
    control lines: status | ack | recalibrate | new-session";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    init_tracing(&LogConfig::from(&config));

    let args: Vec<String> = std::env::args().skip(1).collect();

    let store = match Store::open(&config.sled_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!(error = %e, path = %config.sled_path, "Failed to open sled database");
            std::process::exit(1);
        }
    };

    match args.first().map(String::as_str) {
        None => run_session(&config, store).await,
        Some("logs") => {
            let limit = match args.get(1) {
                Some(raw) => match raw.parse::<usize>() {
                    Ok(limit) => limit,
                    Err(_) => {
                        eprintln!("{USAGE}");
                        std::process::exit(2);
                    }
                },
                None => config.recent_log_limit,
            };
            print_logs(&store, limit);
        }
        Some(_) => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn print_logs(store: &Store, limit: usize) {
    match store.recent_events(limit) {
        Ok(records) => {
            for record in records {
                match serde_json::to_string(&record) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::error!(error = %e, id = record.id, "Failed to encode log record"),
                }
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to read event log");
            std::process::exit(1);
        }
    }
}

async fn run_session(config: &Config, store: Arc<Store>) {
    let engine_config = EngineConfig::from_env(&config.engine);
    if let Err(reason) = engine_config.validate() {
        tracing::error!(%reason, "Invalid engine configuration");
        std::process::exit(2);
    }
    tracing::info!(
        calibration_window_ms = engine_config.calibration.window_ms,
        shift_duration_ms = engine_config.shift.duration_ms,
        "Starting screeneye"
    );

    let shutdown = ShutdownSequence::new();

    let (sink, writer_handle) = EventLogWriter::spawn(store.clone(), shutdown.writer());
    let engine = AttentionEngine::new(engine_config, Arc::new(sink));
    let session = SessionHandle::new(engine, Arc::new(TracingFeedback));

    let worker_manager = WorkerManager::new(
        session.clone(),
        store.clone(),
        shutdown.workers(),
        &config.worker,
    );
    let worker_handle = tokio::spawn(async move {
        if let Err(e) = worker_manager.start().await {
            tracing::error!(error = %e, "Worker manager failed");
        }
    });

    session.start(now_ms());

    tokio::select! {
        _ = read_input(&session) => tracing::info!("Input closed"),
        _ = shutdown_signal() => tracing::info!("Shutdown signal received"),
    }
    shutdown.run(worker_handle, writer_handle).await;

    tracing::info!(dropped_frames = session.dropped_frames(), "Flushing store before exit");
    if let Err(e) = store.flush() {
        tracing::error!(error = %e, "Failed to flush store before exit");
    }
    tracing::info!("Shutdown complete");
}

/// stdin 读取放在独立线程：tokio 的 stdin 会让运行时退出时卡在阻塞读上
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read stdin");
                    break;
                }
            }
        }
    });
    rx
}

async fn read_input(session: &SessionHandle) {
    let mut lines = spawn_stdin_reader();
    while let Some(line) = lines.recv().await {
        handle_line(session, line.trim());
    }
}

fn handle_line(session: &SessionHandle, line: &str) {
    let now = now_ms();
    match line {
        "" => return,
        "status" => {}
        "ack" => {
            if let Err(rejection) = session.acknowledge_shift(now) {
                eprintln!("{rejection}");
            }
        }
        "recalibrate" => session.recalibrate(now),
        "new-session" => session.new_session(now),
        _ => {
            match serde_json::from_str::<FrameSignal>(line) {
                Ok(frame) => {
                    session.submit_frame(&frame, now);
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring malformed input line"),
            }
            return;
        }
    }

    match serde_json::to_string(&session.snapshot(now)) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::error!(error = %e, "Failed to encode session view"),
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = sigterm.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install SIGTERM handler");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
