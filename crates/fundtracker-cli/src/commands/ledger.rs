use serde_json::json;

use fundtracker_core::{format_money, Config, Database, Event, KvContributionStore, ProgressSnapshot};

use crate::host::{Host, Mode, StdinPrompt};

const BAR_WIDTH: usize = 40;

pub fn add(amount: &str, json: bool, no_animation: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = Mode::select(json, no_animation);
    let mut host = Host::open(mode)?;
    let now = host.now();
    let outcome = host.session.add_contribution(amount, now);

    // Announcements and confetti finish even when output is JSON.
    host.drive();

    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            if mode == Mode::Json {
                print_json(&host, json!({ "error": e.to_string() }))?;
            }
            return Err(e.into());
        }
    };

    match mode {
        Mode::Json => print_json(&host, json!({ "outcome": outcome }))?,
        Mode::Animated | Mode::Plain => {
            print_summary(&host.session.progress(), &host.session.config().goal.currency_symbol)
        }
    }
    Ok(())
}

pub fn undo(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = Mode::select(json, true);
    let mut host = Host::open(mode)?;
    let removed = host.session.undo();

    if mode == Mode::Json {
        let body = match &removed {
            Ok(amount) => json!({ "removed": amount }),
            Err(e) => json!({ "error": e.to_string() }),
        };
        print_json(&host, body)?;
    }
    removed?;
    Ok(())
}

pub fn reset(yes: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = Mode::select(json, true);
    let mut host = Host::open(mode)?;
    let cleared = if yes {
        host.session.reset(&mut |_: &str| true)
    } else {
        host.session.reset(&mut StdinPrompt)
    };

    if mode == Mode::Json {
        print_json(&host, json!({ "cleared": cleared }))?;
    } else if !cleared {
        println!("reset cancelled");
    }
    Ok(())
}

pub fn status(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open(Mode::select(json, true))?;
    let progress = host.session.progress();
    if json {
        println!("{}", serde_json::to_string_pretty(&progress)?);
    } else {
        print_status(&progress, &host.session.config().goal.currency_symbol);
    }
    Ok(())
}

pub fn history(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let host = Host::open(Mode::select(json, true))?;
    let amounts = host.session.ledger().contributions();
    if json {
        println!("{}", serde_json::to_string_pretty(&amounts)?);
        return Ok(());
    }
    if amounts.is_empty() {
        println!("no contributions yet");
        return Ok(());
    }
    let symbol = &host.session.config().goal.currency_symbol;
    for (i, amount) in amounts.iter().enumerate() {
        println!("{:>4}  {:>16}", i + 1, format_money(*amount, symbol));
    }
    Ok(())
}

pub fn celebrate(duration: Option<u64>, no_animation: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = Mode::select(false, no_animation);
    let mut config = Config::load()?;
    if let Some(ms) = duration {
        config.confetti.duration_ms = ms;
    }
    let store = KvContributionStore::new(Database::open()?, config.storage.key.clone());
    let mut host = Host::with_store(config, store, mode)?;
    let now = host.now();
    host.session.celebrate(now);
    host.drive();

    let frames = host.session.drain_events().iter().find_map(|e| match e {
        Event::ConfettiFinished { frames, .. } => Some(*frames),
        _ => None,
    });
    if mode == Mode::Plain {
        println!("confetti ran for {} frames", frames.unwrap_or(0));
    }
    Ok(())
}

fn print_json(host: &Host, mut body: serde_json::Value) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(obj) = body.as_object_mut() {
        obj.insert("progress".into(), serde_json::to_value(host.session.progress())?);
        obj.insert("notifications".into(), serde_json::to_value(host.messages.notifications())?);
    }
    println!("{}", serde_json::to_string_pretty(&body)?);
    Ok(())
}

fn print_summary(progress: &ProgressSnapshot, symbol: &str) {
    println!(
        "{}  {}% funded, {} to go",
        progress_bar(progress.percent_funded),
        progress.percent_funded,
        format_money(progress.remaining, symbol)
    );
}

fn print_status(progress: &ProgressSnapshot, symbol: &str) {
    println!("Target:         {}", format_money(progress.target, symbol));
    println!("Raised:         {}", format_money(progress.total, symbol));
    println!("Remaining:      {}", format_money(progress.remaining, symbol));
    println!("Contributions:  {}", progress.contribution_count);
    println!(
        "Funded:         {}% {}",
        progress.percent_funded,
        progress_bar(progress.percent_funded)
    );
    println!("Milestones:");
    for mark in &progress.milestones {
        let check = if progress.percent_funded >= mark.percent { "x" } else { " " };
        println!(
            "  [{check}] {:>3}%  {} left",
            mark.percent,
            format_money(mark.remaining, symbol)
        );
    }
}

fn progress_bar(percent: u8) -> String {
    let filled = (percent as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
