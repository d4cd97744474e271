use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use crossterm::style::{Color, Stylize};

use spellbee::app::{App, CompletionReport};
use spellbee::config::Config;
use spellbee::engine::achievements::{ACHIEVEMENTS, Category};
use spellbee::engine::heatmap::{HeatColor, HeatmapMode, heatmap_color};
use spellbee::engine::mischief::MISCHIEVEMENTS;
use spellbee::engine::selector::SelectionMode;
use spellbee::play::{self, PlayOutcome};
use spellbee::session::policy::Activity;

#[derive(Parser)]
#[command(name = "spellbee", version, about = "Spelling practice with spaced repetition")]
struct Cli {
    #[arg(long, global = true, help = "Directory for local data files")]
    data_dir: Option<String>,

    #[arg(long, global = true, help = "Sync server base URL")]
    server: Option<String>,

    #[arg(short, long, global = true, help = "Learner name or id")]
    user: Option<String>,

    #[arg(short, long, global = true, help = "Number of words per session")]
    words: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the word lists
    Lists,
    /// Add a word list from comma or newline separated words
    AddList { name: String, words: String },
    /// Rename a word list or replace its words
    EditList {
        list: String,
        #[arg(long, help = "New list name")]
        name: Option<String>,
        #[arg(long, help = "Replacement words, comma or newline separated")]
        replace: Option<String>,
    },
    /// Delete a word list and its progress
    DeleteList { list: String },
    /// Show the learners
    Users,
    /// Add a learner
    AddUser {
        name: String,
        #[arg(long, help = "PIN protecting this learner")]
        pin: Option<String>,
    },
    /// Delete a learner and their progress
    DeleteUser {
        user: String,
        #[arg(long, help = "Admin PIN")]
        pin: Option<String>,
    },
    /// Clear a learner's word progress
    ClearProgress {
        user: String,
        #[arg(long, help = "Admin or learner PIN")]
        pin: Option<String>,
    },
    /// Turn saved letter feedback on or off for the --user
    Highlight { activity: ActivityArg },
    /// Practice a list in the terminal
    Play {
        activity: ActivityArg,
        #[arg(short, long, help = "List name or id (defaults to the active list)")]
        list: Option<String>,
        #[arg(long, conflicts_with = "most_missed", help = "Only words currently missed")]
        missed: bool,
        #[arg(long, help = "Words missed most often")]
        most_missed: bool,
        #[arg(long, help = "Colour letters as you type")]
        highlight: bool,
    },
    /// Heatmap of every list
    Progress {
        #[arg(long, help = "Count quiz sessions only")]
        quiz: bool,
    },
    /// Per-learner report
    Report,
    /// Earned and locked achievements
    Achievements,
    /// Delete session history (the --user's, or everything)
    ClearSessions {
        #[arg(long, help = "Admin or learner PIN")]
        pin: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ActivityArg {
    Learn,
    Practice,
    Quiz,
    Missing,
}

impl From<ActivityArg> for Activity {
    fn from(arg: ActivityArg) -> Self {
        match arg {
            ActivityArg::Learn => Activity::Learn,
            ActivityArg::Practice => Activity::Practice,
            ActivityArg::Quiz => Activity::Quiz,
            ActivityArg::Missing => Activity::MissingLetters,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = Config::load().unwrap_or_else(|e| {
        log::warn!("ignoring unreadable config: {e}");
        Config::default()
    });
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(url) = cli.server {
        config.server_url = Some(url);
    }
    config.validate();

    let mut app = App::new(config)?;
    app.set_word_count_override(cli.words);
    app.hydrate();
    if let Some(user) = cli.user.as_deref() {
        app.select_user(Some(user))?;
    }

    match cli.command {
        Command::Lists => print_lists(&app),
        Command::AddList { name, words } => {
            let id = app.add_list(&name, &words)?;
            println!("Added {name} ({id})");
        }
        Command::EditList {
            list,
            name,
            replace,
        } => {
            if name.is_none() && replace.is_none() {
                anyhow::bail!("nothing to change; pass --name or --replace");
            }
            app.edit_list(&list, name.as_deref(), replace.as_deref())?;
            println!("Updated {list}");
        }
        Command::DeleteList { list } => {
            app.delete_list(&list)?;
            println!("Deleted {list}");
        }
        Command::Users => {
            for user in &app.state.users {
                let marker = if app.current_user() == Some(user.id.as_str()) { "*" } else { " " };
                println!("{marker} {}  {}", user.name, user.id.as_str().dark_grey());
            }
        }
        Command::AddUser { name, pin } => {
            let id = app.add_user(&name, pin);
            println!("Added {name} ({id})");
        }
        Command::DeleteUser { user, pin } => {
            app.require_access(pin.as_deref(), None)?;
            app.delete_user(&user)?;
            println!("Deleted {user}");
        }
        Command::ClearProgress { user, pin } => {
            let id = app.resolve_user(&user)?;
            app.require_access(pin.as_deref(), Some(&id))?;
            app.clear_user_progress(&id)?;
            println!("Cleared progress for {user}");
        }
        Command::Highlight { activity } => {
            let activity = Activity::from(activity);
            let on = app.toggle_highlight(activity)?;
            println!(
                "Letter feedback for {} is now {}",
                activity.label(),
                if on { "on" } else { "off" }
            );
        }
        Command::Play {
            activity,
            list,
            missed,
            most_missed,
            highlight,
        } => {
            let selection = if missed {
                SelectionMode::Missed
            } else if most_missed {
                SelectionMode::MostMissed
            } else {
                SelectionMode::Fresh
            };
            app.start_activity(activity.into(), list.as_deref(), selection, highlight)?;
            match play::run(&mut app)? {
                PlayOutcome::Finished(Some(report)) => print_completion(&report),
                PlayOutcome::Finished(None) => println!("No words to practice here."),
                PlayOutcome::Quit => println!("Saved your place. Run the same command to carry on."),
            }
        }
        Command::Progress { quiz } => {
            let mode = if quiz { HeatmapMode::Quiz } else { HeatmapMode::Learn };
            print_progress(&app, mode)?;
        }
        Command::Report => {
            for report in app.user_reports()? {
                println!("{}", report.user_name.as_str().bold());
                println!(
                    "  {}/{} practiced, {} mastered ({:.0}%), accuracy {}%, {} sessions",
                    report.practiced,
                    report.total_words,
                    report.mastered,
                    report.mastered_percent(),
                    report.accuracy,
                    report.sessions
                );
                if let Some(last) = report.last_active {
                    println!("  last active {}", last.format("%Y-%m-%d %H:%M"));
                }
                if !report.struggle_words.is_empty() {
                    let words: Vec<String> = report
                        .struggle_words
                        .iter()
                        .map(|s| format!("{} (x{}, {})", s.word, s.incorrect, s.list_name))
                        .collect();
                    println!("  needs work: {}", words.join(", "));
                }
            }
        }
        Command::Achievements => print_achievements(&app)?,
        Command::ClearSessions { pin } => {
            let user = app.current_user().map(str::to_string);
            app.require_access(pin.as_deref(), user.as_deref())?;
            app.clear_sessions(user.as_deref())?;
            println!("Session history cleared.");
        }
    }
    Ok(())
}

fn print_lists(app: &App) {
    for list in &app.state.word_lists {
        let marker = if app.state.active_list_id.as_deref() == Some(list.id.as_str()) {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {} ({} words)  {}",
            list.name,
            list.words.len(),
            list.id.as_str().dark_grey()
        );
    }
}

fn print_completion(report: &CompletionReport) {
    let record = &report.record;
    println!(
        "{} on {}: {} / {} correct, score {}",
        record.mode.as_str(),
        record.list_name,
        record.correct_count(),
        record.results.len(),
        record.score
    );
    if !report.saved {
        println!("{}", "Could not save this session.".yellow());
    }
    for a in &report.achievements {
        println!("{} Achievement unlocked: {} - {}", a.emoji, a.name.bold(), a.description);
    }
    for m in &report.mischievements {
        println!("{} Mischief: {} - {}", m.emoji, m.name.bold(), m.description);
    }
}

fn heat_to_color(color: HeatColor) -> Color {
    match color {
        HeatColor::Ghost => Color::DarkGrey,
        HeatColor::Red => Color::Red,
        HeatColor::Orange => Color::DarkYellow,
        HeatColor::Amber => Color::Rgb { r: 255, g: 191, b: 0 },
        HeatColor::Yellow => Color::Yellow,
        HeatColor::Lime => Color::Rgb { r: 170, g: 220, b: 50 },
        HeatColor::Green => Color::Green,
    }
}

fn print_progress(app: &App, mode: HeatmapMode) -> Result<()> {
    let levels = app.state.settings.heatmap_levels;
    for summary in app.progress_summaries(mode)? {
        let p = &summary.progress;
        println!(
            "{}  {}/{} mastered ({:.0}%), {} missed, {} practiced",
            p.list_name.as_str().bold(),
            p.mastered,
            p.total,
            p.mastered_percent(),
            p.missed,
            p.practiced
        );
        let cells: Vec<String> = p
            .statuses
            .iter()
            .map(|(word, status)| {
                word.as_str()
                    .with(heat_to_color(heatmap_color(*status, levels)))
                    .to_string()
            })
            .collect();
        println!("  {}", cells.join(" "));
        for s in &summary.recent {
            println!(
                "    {}  {:<15} {:>3}",
                s.date.format("%Y-%m-%d"),
                s.mode.as_str(),
                s.score
            );
        }
    }
    Ok(())
}

fn print_achievements(app: &App) -> Result<()> {
    let earned = app.earned_achievements()?;
    println!("{}/{} achievements", earned.len(), ACHIEVEMENTS.len());
    for category in Category::ALL {
        println!("{}", category.label().bold());
        for a in ACHIEVEMENTS.iter().filter(|a| a.category == category) {
            if earned.contains(a.id) {
                println!("  {} {} - {}", a.emoji, a.name, a.description);
            } else {
                println!("  {}", format!("   {} - {}", a.name, a.description).dark_grey());
            }
        }
    }

    let mischief = app.earned_mischief();
    if !mischief.is_empty() {
        println!("{}", "Mischief".bold());
        for m in MISCHIEVEMENTS.iter().filter(|m| mischief.contains(m.id)) {
            println!("  {} {} - {}", m.emoji, m.name, m.description);
        }
    }
    Ok(())
}
