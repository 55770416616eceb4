use pomogroup::{AppState, ChannelNotifier, CommandReply, dispatch, parse_command};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("pomogroup=info".parse()?))
        .init();

    let workspace_root = match std::env::args().nth(1) {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir()?,
    };

    let (notifier, mut notifications) = ChannelNotifier::channel();
    let state = AppState::new(&workspace_root, Arc::new(notifier))?;
    info!(
        workspace_root = %workspace_root.display(),
        tick_millis = state.config().tick_millis,
        "pomogroup v{}",
        env!("CARGO_PKG_VERSION")
    );

    let delivery = tokio::spawn(async move {
        while let Some(notification) = notifications.recv().await {
            let mention = format!("@{}", notification.group_id);
            println!("[{}] {}", notification.group_id, notification.render(Some(&mention)));
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        match parse_command(line) {
            Ok(command) => print_reply(&dispatch(&state, command)),
            Err(message) => warn!(input = line, "{message}"),
        }
    }

    let stopped = state.scheduler().shutdown();
    info!(stopped, "Shutting down");
    drop(state);
    delivery.await?;
    Ok(())
}

fn print_reply(reply: &CommandReply) {
    let Some(view) = &reply.status else {
        println!("{}", reply.content);
        return;
    };
    println!("{}", view.title);
    println!("  Status: {}", view.status);
    println!("  Current Stage: {}", view.current_stage);
    println!("  Time Remaining: {}", view.time_remaining);
    println!("  Completed Cycles: {}", view.completed_cycles);
}
