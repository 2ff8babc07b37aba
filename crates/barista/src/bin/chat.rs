//! A terminal client for practicing coffee chats against a running
//! proxy.

#[macro_use]
extern crate tracing;

use std::cell::Cell;
use std::env;
use std::io::Write as _;
use std::time::Duration;

use barista::client::ProxyChat;
use barista::core::Session;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let base_url = env::var("BARISTA_URL")
        .unwrap_or_else(|_| "http://127.0.0.1:3000".to_owned());
    let mut session = Session::new(ProxyChat::new(base_url));

    println!(
        "{}☕ {}",
        BAR_CHAR.bright_cyan(),
        session.display().bright_white()
    );
    println!("(type /new to start over, ctrl-d to leave)\n");

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");

    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim().to_owned();
        if line.is_empty() {
            continue;
        }
        if line == "/new" {
            session.reset();
            println!(
                "{}☕ {}",
                BAR_CHAR.bright_cyan(),
                session.display().bright_white()
            );
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        progress_bar.set_message("☕ Brewing...");

        // The spinner stays up until the first fragment arrives.
        let started = Cell::new(false);
        let result = session
            .send(&line, |fragment| {
                if !started.replace(true) {
                    progress_bar.finish_and_clear();
                    print!("{}☕ ", BAR_CHAR.bright_cyan());
                }
                print!("{}", fragment.bright_white());
                std::io::stdout().flush().ok();
            })
            .await;

        if !started.get() {
            progress_bar.finish_and_clear();
        }
        match result {
            Ok(_) => println!("\n"),
            Err(err) => {
                error!("chat request failed: {err}");
                if started.get() {
                    println!();
                }
                println!(
                    "{}Sorry, there was an error. Please try again.\n",
                    BAR_CHAR.bright_yellow()
                );
            }
        }
    }
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
