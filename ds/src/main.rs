use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

use deadlinestore::cli::{Cli, Command};
use deadlinestore::config::Config;
use deadlinestore::{DeadlineStore, NewDeadline, NotificationSettingsRow, UpdateDeadline};

fn setup_logging() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("deadlinestore starting");

    let store = DeadlineStore::open(&config.db_path)
        .context(format!("Failed to open store at {}", config.db_path.display()))?;

    match cli.command {
        Command::Add {
            user_id,
            title,
            due_at,
            weight,
            description,
        } => {
            let due_at: DateTime<Utc> = due_at
                .parse()
                .context("due_at must be RFC 3339, e.g. 2026-09-15T18:00:00Z")?;
            store.upsert_user(user_id, None, None)?;
            let id = store.add_deadline(&NewDeadline {
                user_id,
                title: title.clone(),
                description,
                due_at,
                weight,
            })?;
            println!("{} Added deadline {}: {}", "✓".green(), id.to_string().cyan(), title);
        }
        Command::List { user_id, all } => {
            let rows = store.deadlines_for(user_id, all)?;
            if rows.is_empty() {
                println!("No deadlines for user {}", user_id);
            } else {
                for row in rows {
                    let marker = if row.completed { "✓".green() } else { "•".yellow() };
                    println!(
                        "{} [{}] w={} due {} {}",
                        marker,
                        row.id.to_string().cyan(),
                        row.weight,
                        row.due_at.format("%d.%m.%Y %H:%M"),
                        row.title
                    );
                    if let Some(desc) = &row.description {
                        println!("    {}", desc.dimmed());
                    }
                }
            }
        }
        Command::Edit {
            user_id,
            id,
            title,
            description,
            due_at,
            weight,
        } => {
            let due_at: Option<DateTime<Utc>> = match due_at {
                Some(s) => Some(s.parse().context("due_at must be RFC 3339, e.g. 2026-09-15T18:00:00Z")?),
                None => None,
            };
            let update = UpdateDeadline {
                title,
                description,
                due_at,
                weight,
            };
            if store.update_deadline(id, user_id, &update)? {
                println!("{} Updated deadline {}", "✓".green(), id);
            } else {
                println!("{} Nothing updated for deadline {} (user {})", "✗".red(), id, user_id);
            }
        }
        Command::Complete { user_id, id } => {
            if store.complete_deadline(id, user_id)? {
                println!("{} Completed deadline {}", "✓".green(), id);
            } else {
                println!("{} No deadline {} for user {}", "✗".red(), id, user_id);
            }
        }
        Command::Reopen { user_id, id } => {
            if store.reopen_deadline(id, user_id)? {
                println!("{} Reopened deadline {}", "✓".green(), id);
            } else {
                println!("{} No deadline {} for user {}", "✗".red(), id, user_id);
            }
        }
        Command::Delete { user_id, id } => {
            if store.delete_deadline(id, user_id)? {
                println!("{} Deleted deadline {}", "✓".green(), id);
            } else {
                println!("{} No deadline {} for user {}", "✗".red(), id, user_id);
            }
        }
        Command::Prefs {
            user_id,
            times,
            weekdays,
        } => {
            if times.is_some() || weekdays.is_some() {
                let current = store.notification_settings(user_id)?;
                let settings = NotificationSettingsRow {
                    times: times.unwrap_or(current.times),
                    weekdays: weekdays.unwrap_or(current.weekdays),
                };
                store.upsert_user(user_id, None, None)?;
                store.set_notification_settings(user_id, &settings)?;
                println!("{} Updated preferences for user {}", "✓".green(), user_id);
            }
            let settings = store.notification_settings(user_id)?;
            println!("User {}", user_id.to_string().cyan());
            if settings.times.is_empty() {
                println!("  Times: {} (notifications off)", "none".dimmed());
            } else {
                println!("  Times: {}", settings.times.join(", "));
            }
            println!(
                "  Weekdays: {}",
                settings
                    .weekdays
                    .iter()
                    .map(|d| d.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
        Command::Display { user_id, on, off } => {
            let mut settings = store.display_settings(user_id)?;
            let mut changed = false;
            for (names, value) in [(&on, true), (&off, false)] {
                for name in names.iter().flatten() {
                    let flag = match name.as_str() {
                        "remaining-time" => &mut settings.show_remaining_time,
                        "description" => &mut settings.show_description,
                        "importance" => &mut settings.show_importance,
                        "weight" => &mut settings.show_weight,
                        "emojis" => &mut settings.show_emojis,
                        "date" => &mut settings.show_date,
                        other => {
                            return Err(eyre::eyre!(
                                "Unknown display setting: {} (use remaining-time, description, importance, weight, emojis, date)",
                                other
                            ));
                        }
                    };
                    *flag = value;
                    changed = true;
                }
            }
            if changed {
                store.upsert_user(user_id, None, None)?;
                store.set_display_settings(user_id, &settings)?;
                println!("{} Updated display settings for user {}", "✓".green(), user_id);
            }
            println!("User {}", user_id.to_string().cyan());
            for (name, value) in [
                ("remaining-time", settings.show_remaining_time),
                ("description", settings.show_description),
                ("importance", settings.show_importance),
                ("weight", settings.show_weight),
                ("emojis", settings.show_emojis),
                ("date", settings.show_date),
            ] {
                let state = if value { "on".green() } else { "off".red() };
                println!("  {}: {}", name, state);
            }
        }
        Command::Stats => {
            let stats = store.stats()?;
            println!("Store: {}", config.db_path.display().to_string().cyan());
            println!("  Users: {}", stats.users);
            println!("  Active deadlines: {}", stats.active_deadlines);
            println!("  Completed deadlines: {}", stats.completed_deadlines);
        }
    }

    Ok(())
}
