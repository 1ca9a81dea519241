use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::model::skill::Skill;
use crate::model::ticket::TicketStatus;
use crate::model::time_entry::total_hours;
use crate::services::bucket::{BucketMonitor, BucketStatus};
use crate::services::tickets::{NewTicket, TicketPatch};
use crate::services::{
    applications, cv, messages, profile, tickets, ActionContext, Level, Notification, Notifier,
};

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    Dashboard,
    Help,
    Run(Command),
}

/// A one-shot action against the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Add(NewTicket),
    Edit {
        id: String,
        patch: TicketPatch,
    },
    Status {
        id: String,
        status: TicketStatus,
    },
    Log {
        ticket_id: String,
        hours: f64,
        note: Option<String>,
    },
    Time {
        ticket_id: String,
    },
    Apply {
        task_id: String,
        message: Option<String>,
    },
    Applicants {
        task_id: String,
    },
    Accept {
        id: String,
    },
    Reject {
        id: String,
        reason: String,
    },
    Inbox,
    Send {
        recipient_id: String,
        body: String,
    },
    Read {
        id: String,
    },
    Skills,
    SetSkills(Vec<Skill>),
    Cv(CvCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CvCommand {
    List,
    Upload(PathBuf),
    Get { name: String, dest: PathBuf },
    Remove(String),
    Url(String),
}

/// Prints notifications: successes to stdout, failures to stderr.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success => println!("{}", notification.message),
            Level::Failure => eprintln!("error: {}", notification.message),
        }
    }
}

/// Parses everything after the program name.
pub fn parse_args(args: &[String]) -> Result<Invocation> {
    let Some((cmd, rest)) = args.split_first() else {
        return Ok(Invocation::Dashboard);
    };
    match cmd.as_str() {
        "help" | "-h" | "--help" => Ok(Invocation::Help),
        _ => parse_command(cmd, rest).map(Invocation::Run),
    }
}

fn parse_command(cmd: &str, rest: &[String]) -> Result<Command> {
    match cmd {
        "add" => parse_add_args(rest).map(Command::Add),
        "edit" => parse_edit_args(rest),
        "status" => match rest {
            [id, status] => {
                let Some(status) = TicketStatus::ALL
                    .into_iter()
                    .find(|s| s.as_str() == status.as_str())
                else {
                    let names: Vec<&str> = TicketStatus::ALL.iter().map(|s| s.as_str()).collect();
                    bail!("Unknown status '{status}'. Expected one of: {}", names.join(", "));
                };
                Ok(Command::Status {
                    id: id.clone(),
                    status,
                })
            }
            _ => bail!("Usage: equitydesk status <ticket_id> <status>"),
        },
        "log" => parse_log_args(rest),
        "time" => match rest {
            [ticket_id] => Ok(Command::Time {
                ticket_id: ticket_id.clone(),
            }),
            _ => bail!("Usage: equitydesk time <ticket_id>"),
        },
        "apply" => {
            let (positional, message) = split_flag(rest, &["-m", "--message"])?;
            let [task_id] = positional.as_slice() else {
                bail!("Usage: equitydesk apply <task_id> [-m <message>]");
            };
            Ok(Command::Apply {
                task_id: task_id.clone(),
                message,
            })
        }
        "applicants" => match rest {
            [task_id] => Ok(Command::Applicants {
                task_id: task_id.clone(),
            }),
            _ => bail!("Usage: equitydesk applicants <task_id>"),
        },
        "accept" => match rest {
            [id] => Ok(Command::Accept { id: id.clone() }),
            _ => bail!("Usage: equitydesk accept <application_id>"),
        },
        "reject" => match rest {
            [id, reason @ ..] if !reason.is_empty() => Ok(Command::Reject {
                id: id.clone(),
                reason: reason.join(" "),
            }),
            _ => bail!("Usage: equitydesk reject <application_id> <reason>"),
        },
        "inbox" => Ok(Command::Inbox),
        "send" => match rest {
            [recipient_id, body @ ..] if !body.is_empty() => Ok(Command::Send {
                recipient_id: recipient_id.clone(),
                body: body.join(" "),
            }),
            _ => bail!("Usage: equitydesk send <user_id> <message>"),
        },
        "read" => match rest {
            [id] => Ok(Command::Read { id: id.clone() }),
            _ => bail!("Usage: equitydesk read <message_id>"),
        },
        "skills" => match rest {
            [] => Ok(Command::Skills),
            [cmd, skills @ ..] if cmd == "set" && !skills.is_empty() => {
                Ok(Command::SetSkills(skills.iter().map(|s| parse_skill(s)).collect()))
            }
            _ => bail!("Usage: equitydesk skills [set <name[:level]>...]"),
        },
        "cv" => parse_cv_args(rest).map(Command::Cv),
        other => bail!("Unknown command '{other}'. Run `equitydesk help` for usage."),
    }
}

/// Pulls the value of one of `flags` out of `args`, returning the remaining
/// positional words.
fn split_flag(args: &[String], flags: &[&str]) -> Result<(Vec<String>, Option<String>)> {
    let mut positional = Vec::new();
    let mut value = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if flags.contains(&arg.as_str()) {
            match iter.next() {
                Some(v) => value = Some(v.clone()),
                None => bail!("Missing value for {arg} flag"),
            }
        } else {
            positional.push(arg.clone());
        }
    }
    Ok((positional, value))
}

/// Parse `add` arguments into a new ticket.
///
/// Supported forms:
///   equitydesk add "Fix payout rounding"
///   equitydesk add Fix payout rounding -d "Off by a cent" --type bug
///   equitydesk add "Set up vesting" --project p1 --task k2 --priority high
pub fn parse_add_args(args: &[String]) -> Result<NewTicket> {
    if args.is_empty() {
        bail!("Usage: equitydesk add <title> [-d <description>] [--type <type>] [--priority <p>] [--project <id>] [--task <id>]");
    }

    let mut title_parts: Vec<&str> = Vec::new();
    let mut ticket = NewTicket::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "-d" | "--desc" | "--description" => &mut ticket.description,
            "--type" => &mut ticket.kind,
            "--priority" => &mut ticket.priority,
            "--project" => &mut ticket.project_id,
            "--task" => &mut ticket.task_id,
            word => {
                title_parts.push(word);
                continue;
            }
        };
        match iter.next() {
            Some(value) => *slot = Some(value.clone()),
            None => bail!("Missing value for {arg} flag"),
        }
    }

    ticket.title = title_parts.join(" ");
    if ticket.title.trim().is_empty() {
        bail!("Ticket title cannot be empty");
    }
    Ok(ticket)
}

fn parse_edit_args(args: &[String]) -> Result<Command> {
    let Some((id, flags)) = args.split_first() else {
        bail!("Usage: equitydesk edit <ticket_id> [--title <t>] [-d <description>] [--priority <p>] [--health <h>] [--type <type>]");
    };
    let mut patch = TicketPatch::default();
    let mut iter = flags.iter();
    while let Some(arg) = iter.next() {
        let slot = match arg.as_str() {
            "--title" => &mut patch.title,
            "-d" | "--desc" | "--description" => &mut patch.description,
            "--priority" => &mut patch.priority,
            "--health" => &mut patch.health,
            "--type" => &mut patch.kind,
            other => bail!("Unknown option '{other}' for edit"),
        };
        match iter.next() {
            Some(value) => *slot = Some(value.clone()),
            None => bail!("Missing value for {arg} flag"),
        }
    }
    if patch == TicketPatch::default() {
        bail!("Nothing to change. Pass at least one option to edit");
    }
    Ok(Command::Edit {
        id: id.clone(),
        patch,
    })
}

/// `"Rust:Expert"` or a bare `"Rust"`.
fn parse_skill(arg: &str) -> Skill {
    match arg.split_once(':') {
        Some((name, level)) => Skill::new(name, Some(level)),
        None => Skill::new(arg, None),
    }
}

fn parse_log_args(args: &[String]) -> Result<Command> {
    let (positional, note) = split_flag(args, &["-n", "--note"])?;
    let [ticket_id, hours] = positional.as_slice() else {
        bail!("Usage: equitydesk log <ticket_id> <hours> [-n <note>]");
    };
    let hours: f64 = hours
        .parse()
        .with_context(|| format!("'{hours}' is not a number of hours"))?;
    Ok(Command::Log {
        ticket_id: ticket_id.clone(),
        hours,
        note,
    })
}

fn parse_cv_args(args: &[String]) -> Result<CvCommand> {
    match args {
        [] => Ok(CvCommand::List),
        [cmd] if cmd == "ls" => Ok(CvCommand::List),
        [cmd, path] if cmd == "upload" => Ok(CvCommand::Upload(PathBuf::from(path))),
        [cmd, name, dest] if cmd == "get" => Ok(CvCommand::Get {
            name: name.clone(),
            dest: PathBuf::from(dest),
        }),
        [cmd, name] if cmd == "rm" => Ok(CvCommand::Remove(name.clone())),
        [cmd, name] if cmd == "url" => Ok(CvCommand::Url(name.clone())),
        _ => bail!("Usage: equitydesk cv [ls | upload <path> | get <name> <dest> | rm <name> | url <name>]"),
    }
}

/// Runs a one-shot command. `Ok(false)` means the action failed and has
/// already been reported.
pub async fn run(command: Command, ctx: &ActionContext) -> Result<bool> {
    match command {
        Command::Add(ticket) => {
            let created = tickets::create_ticket(ctx, ticket).await;
            if let Some(ticket) = &created {
                println!("  id: {}  type: {}", ticket.id, ticket.ticket_type);
            }
            Ok(created.is_some())
        }
        Command::Edit { id, patch } => Ok(tickets::update_ticket(ctx, &id, patch).await.is_some()),
        Command::Status { id, status } => {
            Ok(tickets::set_ticket_status(ctx, &id, status).await.is_some())
        }
        Command::Log {
            ticket_id,
            hours,
            note,
        } => Ok(tickets::log_time(ctx, &ticket_id, hours, note.as_deref())
            .await
            .is_some()),
        Command::Time { ticket_id } => {
            let entries = tickets::fetch_time_entries(ctx, &ticket_id)
                .await
                .context("Failed to load time entries")?;
            for entry in &entries {
                println!("{}\t{}h\t{}\t{}", entry.logged_at, entry.hours, entry.user_id, entry.note);
            }
            println!("Total: {}h", total_hours(&entries));
            Ok(true)
        }
        Command::Apply { task_id, message } => {
            let application = applications::apply_to_task(ctx, &task_id, message.as_deref()).await;
            if let Some(app) = &application {
                println!("  application: {}", app.id);
            }
            Ok(application.is_some())
        }
        Command::Applicants { task_id } => {
            let list = applications::fetch_for_task(ctx, &task_id)
                .await
                .context("Failed to load applicants")?;
            for app in list {
                println!("{}\t{}\t{}\t{}", app.id, app.status, app.applicant_id, app.message);
            }
            Ok(true)
        }
        Command::Accept { id } => Ok(applications::accept_application(ctx, &id).await.is_some()),
        Command::Reject { id, reason } => Ok(applications::reject_application(ctx, &id, &reason)
            .await
            .is_some()),
        Command::Inbox => {
            let inbox = messages::fetch_inbox(ctx)
                .await
                .context("Failed to load messages")?;
            if inbox.is_empty() {
                println!("No messages");
            }
            for message in inbox {
                let marker = if message.read { " " } else { "*" };
                println!(
                    "{marker} {}\t{}\t{}\t{}",
                    message.id, message.created_at, message.sender_id, message.body
                );
            }
            Ok(true)
        }
        Command::Send { recipient_id, body } => {
            Ok(messages::send_message(ctx, &recipient_id, &body).await.is_some())
        }
        Command::Read { id } => Ok(messages::mark_read(ctx, &id).await),
        Command::Skills => {
            let skills = profile::fetch_skills(ctx)
                .await
                .context("Failed to load skills")?;
            for skill in skills {
                println!("{}\t{}", skill.name, skill.level);
            }
            Ok(true)
        }
        Command::SetSkills(skills) => Ok(profile::save_skills(ctx, skills).await.is_some()),
        Command::Cv(cmd) => run_cv(cmd, ctx).await,
    }
}

async fn run_cv(command: CvCommand, ctx: &ActionContext) -> Result<bool> {
    if !matches!(command, CvCommand::Url(_)) {
        let mut bucket = BucketMonitor::default();
        if let BucketStatus::Unavailable(reason) = bucket.refresh(ctx.storage.as_ref()).await {
            eprintln!("error: CV storage unavailable: {reason}");
            return Ok(false);
        }
    }
    match command {
        CvCommand::List => {
            let files = cv::list_cvs(ctx).await.context("Failed to list CVs")?;
            if files.is_empty() {
                println!("No CVs uploaded yet");
            }
            for file in files {
                println!("{}\t{}\t{}", file.name, file.size_label(), file.updated_at);
            }
            Ok(true)
        }
        CvCommand::Upload(path) => {
            let name = file_name(&path)?;
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            Ok(cv::upload_cv(ctx, &name, bytes).await)
        }
        CvCommand::Get { name, dest } => {
            let bytes = cv::download_cv(ctx, &name)
                .await
                .with_context(|| format!("Failed to download {name}"))?;
            tokio::fs::write(&dest, bytes)
                .await
                .with_context(|| format!("Failed to write {}", dest.display()))?;
            println!("Saved {name} to {}", dest.display());
            Ok(true)
        }
        CvCommand::Remove(name) => Ok(cv::delete_cv(ctx, &name).await),
        CvCommand::Url(name) => {
            println!("{}", cv::public_url(ctx, &name));
            Ok(true)
        }
    }
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .with_context(|| format!("{} is not a file path", path.display()))
}

pub fn print_help() {
    println!("equitydesk: tickets, applications and CVs for equity projects\n");
    println!("USAGE:");
    println!("  equitydesk                           Launch the dashboard");
    println!("  equitydesk add <title> [options]     Create a ticket");
    println!("  equitydesk edit <ticket> [options]   Change ticket fields");
    println!("  equitydesk status <ticket> <status>  Move a ticket (todo, in_progress, review, done, blocked)");
    println!("  equitydesk log <ticket> <hours>      Log time against a ticket");
    println!("  equitydesk time <ticket>             List time logged on a ticket");
    println!("  equitydesk apply <task> [-m msg]     Apply to a task");
    println!("  equitydesk applicants <task>         List applicants for a task");
    println!("  equitydesk accept <application>      Accept an application");
    println!("  equitydesk reject <application> <reason>");
    println!("  equitydesk inbox                     List messages sent to you");
    println!("  equitydesk send <user> <message>     Send a message");
    println!("  equitydesk read <message>            Mark a message as read");
    println!("  equitydesk skills [set <name[:level]>...]");
    println!("  equitydesk cv [ls|upload|get|rm|url] Manage your CVs");
    println!();
    println!("ADD OPTIONS:");
    println!("  -d, --desc <text>    Description");
    println!("  --type <type>        task, bug or project (default: task)");
    println!("  --priority <p>       Priority label");
    println!("  --project <id>       Link to an equity project");
    println!("  --task <id>          Link to a project task");
    println!();
    println!("EDIT OPTIONS:");
    println!("  --title, -d, --priority, --health, --type");
    println!();
    println!("LOG OPTIONS:");
    println!("  -n, --note <text>    Note for the time entry");
}
