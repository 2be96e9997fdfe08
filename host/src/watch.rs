//! ==============================================================================
//! watch.rs - terminal view
//! ==============================================================================
//!
//! the desktop-style presenter: prints the three vitals on a fixed timer and
//! reacts to one-letter commands on stdin.
//!
//!     r   refresh now
//!     h   show / hide history (re-fetched on its own, slower timer)
//!     q   quit
//!
//! every refresh is an independent fetch; nothing is coalesced. closing stdin
//! only stops command handling, the timers keep running.
//!
//! ==============================================================================

use crate::config::PollingConfig;
use crate::fetcher::ReadingSource;
use crate::render::{history_lines, latest_lines};

use anyhow::Result;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

const HELP: &str = "commands: r = refresh, h = history, q = quit";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Refresh,
    ToggleHistory,
    Quit,
    Unknown,
}

impl Command {
    fn parse(line: &str) -> Option<Command> {
        let cmd = match line.trim().to_ascii_lowercase().as_str() {
            "" => return None,
            "r" | "refresh" => Command::Refresh,
            "h" | "history" => Command::ToggleHistory,
            "q" | "quit" | "exit" => Command::Quit,
            _ => Command::Unknown,
        };
        Some(cmd)
    }
}

pub async fn run_watch<S, R, W>(source: &S, polling: &PollingConfig, input: R, out: &mut W) -> Result<()>
where
    S: ReadingSource,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let latest_period = polling.latest_interval();
    let history_period = polling.history_interval();
    let mut latest_tick = interval_at(Instant::now() + latest_period, latest_period);
    let mut history_tick = interval_at(Instant::now() + history_period, history_period);
    latest_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
    history_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut lines = input.lines();
    let mut input_open = true;
    let mut show_history = false;

    writeln!(out, "{}", HELP)?;
    print_latest(source, out).await?;

    loop {
        tokio::select! {
            _ = latest_tick.tick() => print_latest(source, out).await?,
            _ = history_tick.tick(), if show_history => {
                print_history(source, polling.history_limit, out).await?;
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line? else {
                    debug!("stdin closed, commands disabled");
                    input_open = false;
                    continue;
                };
                match Command::parse(&line) {
                    None => {}
                    Some(Command::Refresh) => print_latest(source, out).await?,
                    Some(Command::ToggleHistory) => {
                        show_history = !show_history;
                        if show_history {
                            print_history(source, polling.history_limit, out).await?;
                            history_tick.reset();
                        } else {
                            writeln!(out, "(history hidden)")?;
                        }
                    }
                    Some(Command::Quit) => break,
                    Some(Command::Unknown) => writeln!(out, "{}", HELP)?,
                }
            }
        }
    }

    Ok(())
}

async fn print_latest<S: ReadingSource, W: Write>(source: &S, out: &mut W) -> Result<()> {
    let latest = source.latest().await;
    writeln!(out, "── Live Vital Signs ──")?;
    for line in latest_lines(latest.as_ref()) {
        writeln!(out, "  {}", line)?;
    }
    out.flush()?;
    Ok(())
}

async fn print_history<S: ReadingSource, W: Write>(source: &S, limit: usize, out: &mut W) -> Result<()> {
    let history = source.history().await;
    writeln!(out, "── Historical Health Data ──")?;
    for line in history_lines(&history, limit) {
        writeln!(out, "  {}", line)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticSource;
    use crate::render::{FETCH_FAILED, NO_HISTORY};
    use serde_json::json;
    use tokio::io::BufReader;

    async fn watch(source: &StaticSource, input: &'static str) -> String {
        let mut out = Vec::new();
        run_watch(source, &PollingConfig::default(), BufReader::new(input.as_bytes()), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse(" R "), Some(Command::Refresh));
        assert_eq!(Command::parse("history"), Some(Command::ToggleHistory));
        assert_eq!(Command::parse("exit"), Some(Command::Quit));
        assert_eq!(Command::parse("?"), Some(Command::Unknown));
        assert_eq!(Command::parse("   "), None);
    }

    #[tokio::test]
    async fn quit_after_initial_fetch() {
        let source = StaticSource::new(json!({"1": {"BPM": 70}, "2": {"BPM": 71, "SpO2": 99}}));
        let out = watch(&source, "q\n").await;
        assert!(out.contains("Heart Rate (BPM): 71"));
        assert!(out.contains("SpO₂ (%): 99"));
        assert!(out.contains("Temperature (°C): --"));
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn refresh_and_history_each_fetch() {
        let source = StaticSource::new(json!({"1": {"BPM": 70}, "2": {"BPM": 71}}));
        let out = watch(&source, "r\nh\n?\nq\n").await;
        assert_eq!(out.matches("── Live Vital Signs ──").count(), 2);
        assert!(out.contains("BPM: 71, SpO₂: --, Temp: --°C"));
        assert!(out.find("BPM: 71,").unwrap() < out.find("BPM: 70,").unwrap());
        assert_eq!(out.matches(HELP).count(), 2);
        assert_eq!(source.fetch_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn timers_refresh_latest_and_shown_history() {
        let source = StaticSource::new(json!({"1": {"BPM": 70}, "2": {"BPM": 71}}));
        let polling = PollingConfig::default();
        let mut out = Vec::new();
        // stdin closes after "h"; only the timers drive the view from then on
        let watching = run_watch(
            &source,
            &polling,
            BufReader::new("h\n".as_bytes()),
            &mut out,
        );
        let ended = tokio::time::timeout(std::time::Duration::from_secs(11), watching).await;
        assert!(ended.is_err(), "watch keeps running after stdin closes");

        let out = String::from_utf8(out).unwrap();
        // latest: initial + ticks at 2, 4, 6, 8, 10
        assert_eq!(out.matches("── Live Vital Signs ──").count(), 6);
        // history: on toggle + ticks at 5, 10
        assert_eq!(out.matches("── Historical Health Data ──").count(), 3);
        assert_eq!(source.fetch_count(), 9);
    }

    #[tokio::test]
    async fn failures_show_warning() {
        let source = StaticSource::failing();
        let out = watch(&source, "h\nh\nq\n").await;
        assert!(out.contains(FETCH_FAILED));
        assert!(out.contains(NO_HISTORY));
        assert!(out.contains("(history hidden)"));
    }
}
