use std::future::Future;
use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::mpsc;
use tracing::debug;

use crate::backend::BackendError;
use crate::event::KeyAction;
use crate::model::cv_file::CvFile;
use crate::model::job_application::JobApplication;
use crate::model::ticket::Ticket;
use crate::services::bucket::{check_bucket, BucketMonitor, BucketStatus};
use crate::services::tickets::NewTicket;
use crate::services::{applications, cv, tickets, ActionContext, Notification, Notifier};

const FLASH_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub enum Action {
    Key(KeyAction),
    Tick,
    TicketsLoaded(Vec<Ticket>),
    ApplicationsLoaded(ApplicationScope, Vec<JobApplication>),
    CvsLoaded(Vec<CvFile>),
    FetchError(ViewMode, String),
    BucketChecked(BucketStatus),
    TicketCreated,
    TicketUpdated(Ticket),
    TicketDeleted(String),
    ApplicationUpdated(JobApplication),
    ApplicationWithdrawn(String),
    CvUploaded,
    CvDeleted(String),
    Notify(Notification),
    Quit,
}

/// Routes service notifications into the main loop so they show up as
/// flash messages.
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Action>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::UnboundedSender<Action>) -> Self {
        Self { tx }
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notification: Notification) {
        let _ = self.tx.send(Action::Notify(notification));
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationScope {
    /// Applications the signed-in user submitted.
    Mine,
    /// Applicants for one task, as seen by its owner.
    ForTask(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewMode {
    Tickets,
    Applications(ApplicationScope),
    Cvs,
}

impl ViewMode {
    pub fn title(&self) -> &'static str {
        match self {
            ViewMode::Tickets => "Tickets",
            ViewMode::Applications(ApplicationScope::Mine) => "My applications",
            ViewMode::Applications(ApplicationScope::ForTask(_)) => "Applicants",
            ViewMode::Cvs => "CVs",
        }
    }

    fn next(&self) -> ViewMode {
        match self {
            ViewMode::Tickets => ViewMode::Applications(ApplicationScope::Mine),
            ViewMode::Applications(_) => ViewMode::Cvs,
            ViewMode::Cvs => ViewMode::Tickets,
        }
    }

    fn prev(&self) -> ViewMode {
        match self {
            ViewMode::Tickets => ViewMode::Cvs,
            ViewMode::Applications(_) => ViewMode::Tickets,
            ViewMode::Cvs => ViewMode::Applications(ApplicationScope::Mine),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptKind {
    NewTicket,
    LogTime { ticket_id: String },
    RejectReason { application_id: String },
    UploadCv,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub kind: PromptKind,
    pub buffer: String,
}

impl Prompt {
    fn new(kind: PromptKind) -> Self {
        Self {
            kind,
            buffer: String::new(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self.kind {
            PromptKind::NewTicket => " New ticket title ",
            PromptKind::LogTime { .. } => " Log time: <hours> [note] ",
            PromptKind::RejectReason { .. } => " Rejection reason ",
            PromptKind::UploadCv => " Upload CV: path to file ",
        }
    }
}

pub struct App {
    pub tickets: Vec<Ticket>,
    pub selected_ticket: usize,
    pub applications: Vec<JobApplication>,
    pub selected_application: usize,
    pub cvs: Vec<CvFile>,
    pub selected_cv: usize,
    pub view_mode: ViewMode,
    pub loading: bool,
    pub flash_message: Option<(Notification, Instant)>,
    pub bucket: BucketMonitor,
    pub prompt: Option<Prompt>,
    pub should_quit: bool,
    action_tx: mpsc::UnboundedSender<Action>,
    /// Scope of mutations; cancelled on shutdown.
    ctx: ActionContext,
    /// Scope of the current view's fetches; cancelled when the view is left.
    view_ctx: ActionContext,
}

impl App {
    pub fn new(ctx: ActionContext, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let view_ctx = ctx.child();
        Self {
            tickets: Vec::new(),
            selected_ticket: 0,
            applications: Vec::new(),
            selected_application: 0,
            cvs: Vec::new(),
            selected_cv: 0,
            view_mode: ViewMode::Tickets,
            loading: false,
            flash_message: None,
            bucket: BucketMonitor::default(),
            prompt: None,
            should_quit: false,
            action_tx,
            ctx,
            view_ctx,
        }
    }

    /// Initial bucket probe and first fetch.
    pub fn start(&mut self) {
        self.check_bucket();
        self.refresh_view();
    }

    /// Applies one action. Never waits on the backend: calls are spawned and
    /// report back through the action channel.
    pub fn update(&mut self, action: Action) {
        if let Some((_, t)) = &self.flash_message {
            if t.elapsed().as_secs() >= FLASH_SECS {
                self.flash_message = None;
            }
        }

        match action {
            Action::Key(key) => self.handle_key(key),
            Action::Tick => {}
            Action::TicketsLoaded(tickets) if self.view_mode == ViewMode::Tickets => {
                self.tickets = tickets;
                self.selected_ticket = clamp(self.selected_ticket, self.tickets.len());
                self.loading = false;
            }
            Action::ApplicationsLoaded(scope, applications)
                if self.view_mode == ViewMode::Applications(scope.clone()) =>
            {
                self.applications = applications;
                self.selected_application =
                    clamp(self.selected_application, self.applications.len());
                self.loading = false;
            }
            Action::CvsLoaded(cvs) if self.view_mode == ViewMode::Cvs => {
                self.cvs = cvs;
                self.selected_cv = clamp(self.selected_cv, self.cvs.len());
                self.loading = false;
            }
            Action::FetchError(view, msg) if view == self.view_mode => {
                self.loading = false;
                self.flash(Notification::failure(format!("Fetch error: {msg}")));
            }
            Action::TicketsLoaded(_)
            | Action::ApplicationsLoaded(..)
            | Action::CvsLoaded(_)
            | Action::FetchError(..) => debug!("dropping fetch result for a view no longer shown"),
            Action::BucketChecked(status) => {
                self.bucket.finish(status);
                if self.view_mode == ViewMode::Cvs && self.bucket.status().is_ready() {
                    self.refresh_view();
                }
            }
            Action::TicketCreated => {
                if self.view_mode == ViewMode::Tickets {
                    self.refresh_view();
                }
            }
            Action::TicketUpdated(updated) => {
                if let Some(slot) = self.tickets.iter_mut().find(|t| t.id == updated.id) {
                    *slot = updated;
                }
            }
            Action::TicketDeleted(id) => {
                self.tickets.retain(|t| t.id != id);
                self.selected_ticket = clamp(self.selected_ticket, self.tickets.len());
            }
            Action::ApplicationUpdated(updated) => {
                if let Some(slot) = self.applications.iter_mut().find(|a| a.id == updated.id) {
                    *slot = updated;
                }
            }
            Action::ApplicationWithdrawn(id) => {
                self.applications.retain(|a| a.id != id);
                self.selected_application =
                    clamp(self.selected_application, self.applications.len());
            }
            Action::CvUploaded => {
                if self.view_mode == ViewMode::Cvs {
                    self.refresh_view();
                }
            }
            Action::CvDeleted(name) => {
                self.cvs.retain(|f| f.name != name);
                self.selected_cv = clamp(self.selected_cv, self.cvs.len());
            }
            Action::Notify(notification) => self.flash(notification),
            Action::Quit => {
                self.view_ctx.cancel.cancel();
                self.should_quit = true;
            }
        }
    }

    fn flash(&mut self, notification: Notification) {
        self.flash_message = Some((notification, Instant::now()));
    }

    fn handle_key(&mut self, key: KeyAction) {
        if self.prompt.is_some() {
            self.handle_prompt_key(key);
            return;
        }

        match key {
            KeyAction::Char('q') => self.should_quit = true,
            KeyAction::Tab | KeyAction::Right => self.switch_view(self.view_mode.next()),
            KeyAction::Left => self.switch_view(self.view_mode.prev()),
            KeyAction::Up => self.move_selection(-1),
            KeyAction::Down => self.move_selection(1),
            KeyAction::Char('r') => {
                if self.view_mode == ViewMode::Cvs {
                    self.check_bucket();
                }
                self.refresh_view();
            }
            KeyAction::Char(c) => self.handle_command(c),
            KeyAction::Escape => {
                if matches!(self.view_mode, ViewMode::Applications(ApplicationScope::ForTask(_))) {
                    self.switch_view(ViewMode::Tickets);
                }
            }
            KeyAction::Enter | KeyAction::Backspace => {}
        }
    }

    fn handle_command(&mut self, c: char) {
        let mode = self.view_mode.clone();
        match (&mode, c) {
            (ViewMode::Tickets, 's') => self.cycle_selected_status(),
            (ViewMode::Tickets, 'n') => self.prompt = Some(Prompt::new(PromptKind::NewTicket)),
            (ViewMode::Tickets, 'l') => {
                if let Some(ticket) = self.tickets.get(self.selected_ticket) {
                    let ticket_id = ticket.id.clone();
                    self.prompt = Some(Prompt::new(PromptKind::LogTime { ticket_id }));
                }
            }
            (ViewMode::Tickets, 'd') => {
                if let Some(ticket) = self.tickets.get(self.selected_ticket) {
                    let id = ticket.id.clone();
                    self.spawn_mutation(move |ctx| async move {
                        tickets::delete_ticket(&ctx, &id)
                            .await
                            .then_some(Action::TicketDeleted(id))
                    });
                }
            }
            (ViewMode::Tickets, 'p') => {
                let task_id = self
                    .tickets
                    .get(self.selected_ticket)
                    .and_then(|t| t.task_id.clone());
                match task_id {
                    Some(task_id) => {
                        self.switch_view(ViewMode::Applications(ApplicationScope::ForTask(task_id)))
                    }
                    None => self.flash(Notification::failure("Ticket is not linked to a task")),
                }
            }
            (ViewMode::Applications(ApplicationScope::ForTask(_)), 'a' | 'x') => {
                let Some(app) = self.applications.get(self.selected_application) else {
                    return;
                };
                if !app.is_pending() {
                    let status = app.status.clone();
                    self.flash(Notification::failure(format!("Application already {status}")));
                    return;
                }
                let id = app.id.clone();
                if c == 'x' {
                    self.prompt = Some(Prompt::new(PromptKind::RejectReason { application_id: id }));
                } else {
                    self.spawn_mutation(move |ctx| async move {
                        applications::accept_application(&ctx, &id)
                            .await
                            .map(Action::ApplicationUpdated)
                    });
                }
            }
            (ViewMode::Applications(ApplicationScope::Mine), 'w') => {
                if let Some(app) = self.applications.get(self.selected_application) {
                    let id = app.id.clone();
                    self.spawn_mutation(move |ctx| async move {
                        applications::withdraw_application(&ctx, &id)
                            .await
                            .then_some(Action::ApplicationWithdrawn(id))
                    });
                }
            }
            (ViewMode::Cvs, 'u') => {
                if self.bucket.status().is_ready() {
                    self.prompt = Some(Prompt::new(PromptKind::UploadCv));
                }
            }
            (ViewMode::Cvs, 'd') => {
                if !self.bucket.status().is_ready() {
                    return;
                }
                if let Some(file) = self.cvs.get(self.selected_cv) {
                    let name = file.name.clone();
                    self.spawn_mutation(move |ctx| async move {
                        cv::delete_cv(&ctx, &name)
                            .await
                            .then_some(Action::CvDeleted(name))
                    });
                }
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyAction) {
        let Some(prompt) = self.prompt.as_mut() else {
            return;
        };
        match key {
            KeyAction::Char(c) => prompt.buffer.push(c),
            KeyAction::Backspace => {
                prompt.buffer.pop();
            }
            KeyAction::Escape => self.prompt = None,
            KeyAction::Enter => {
                if let Some(prompt) = self.prompt.take() {
                    self.submit_prompt(prompt);
                }
            }
            _ => {}
        }
    }

    fn submit_prompt(&mut self, prompt: Prompt) {
        let input = prompt.buffer.trim().to_string();
        match prompt.kind {
            PromptKind::NewTicket => self.spawn_mutation(move |ctx| async move {
                tickets::create_ticket(&ctx, NewTicket::titled(input))
                    .await
                    .map(|_| Action::TicketCreated)
            }),
            PromptKind::LogTime { ticket_id } => match parse_time_input(&input) {
                Some((hours, note)) => self.spawn_mutation(move |ctx| async move {
                    tickets::log_time(&ctx, &ticket_id, hours, note.as_deref()).await;
                    None
                }),
                None => self.flash(Notification::failure("Expected: <hours> [note]")),
            },
            PromptKind::RejectReason { application_id } => {
                self.spawn_mutation(move |ctx| async move {
                    applications::reject_application(&ctx, &application_id, &input)
                        .await
                        .map(Action::ApplicationUpdated)
                })
            }
            PromptKind::UploadCv => self.upload_from_path(input),
        }
    }

    fn upload_from_path(&mut self, input: String) {
        let path = PathBuf::from(&input);
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            self.flash(Notification::failure("Not a file path"));
            return;
        };
        self.spawn_mutation(move |ctx| async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => cv::upload_cv(&ctx, &file_name, bytes)
                    .await
                    .then_some(Action::CvUploaded),
                Err(e) => Some(Action::Notify(Notification::failure(format!(
                    "Could not read {input}: {e}"
                )))),
            }
        });
    }

    fn cycle_selected_status(&mut self) {
        let Some(ticket) = self.tickets.get(self.selected_ticket) else {
            return;
        };
        let id = ticket.id.clone();
        let next = ticket.status().next();
        self.spawn_mutation(move |ctx| async move {
            tickets::set_ticket_status(&ctx, &id, next)
                .await
                .map(Action::TicketUpdated)
        });
    }

    pub fn selected_public_url(&self) -> Option<String> {
        self.cvs
            .get(self.selected_cv)
            .map(|file| cv::public_url(&self.ctx, &file.name))
    }

    /// Runs a service call in the background under the app-wide scope. The
    /// service reports its own outcome; `Some(action)` is posted back to
    /// update local state.
    fn spawn_mutation<F, Fut>(&self, op: F)
    where
        F: FnOnce(ActionContext) -> Fut,
        Fut: Future<Output = Option<Action>> + Send + 'static,
    {
        let fut = op(self.ctx.clone());
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Some(action) = fut.await {
                let _ = tx.send(action);
            }
        });
    }

    fn move_selection(&mut self, delta: isize) {
        let (selected, len) = match self.view_mode {
            ViewMode::Tickets => (&mut self.selected_ticket, self.tickets.len()),
            ViewMode::Applications(_) => (&mut self.selected_application, self.applications.len()),
            ViewMode::Cvs => (&mut self.selected_cv, self.cvs.len()),
        };
        if len == 0 {
            return;
        }
        *selected = selected.saturating_add_signed(delta).min(len - 1);
    }

    fn switch_view(&mut self, mode: ViewMode) {
        if mode == self.view_mode {
            return;
        }
        self.view_ctx.cancel.cancel();
        self.view_ctx = self.ctx.child();
        self.view_mode = mode;
        if matches!(self.view_mode, ViewMode::Applications(_)) {
            self.applications.clear();
            self.selected_application = 0;
        }
        self.refresh_view();
    }

    fn check_bucket(&mut self) {
        self.bucket.begin_check();
        let storage = self.ctx.storage.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let status = check_bucket(storage.as_ref()).await;
            let _ = tx.send(Action::BucketChecked(status));
        });
    }

    /// Spawns the fetch for the current view. Results come back as actions
    /// tagged with the view that asked for them.
    pub fn refresh_view(&mut self) {
        let ctx = self.view_ctx.clone();
        let tx = self.action_tx.clone();
        let view = self.view_mode.clone();
        match self.view_mode.clone() {
            ViewMode::Tickets => {
                self.loading = true;
                tokio::spawn(async move {
                    let result = tickets::fetch_tickets(&ctx, None).await;
                    deliver(&tx, view, result.map(Action::TicketsLoaded));
                });
            }
            ViewMode::Applications(scope) => {
                self.loading = true;
                tokio::spawn(async move {
                    let result = match &scope {
                        ApplicationScope::Mine => applications::fetch_for_applicant(&ctx).await,
                        ApplicationScope::ForTask(task_id) => {
                            applications::fetch_for_task(&ctx, task_id).await
                        }
                    };
                    deliver(
                        &tx,
                        view,
                        result.map(|list| Action::ApplicationsLoaded(scope, list)),
                    );
                });
            }
            ViewMode::Cvs => {
                if !self.bucket.status().is_ready() {
                    return;
                }
                self.loading = true;
                tokio::spawn(async move {
                    let result = cv::list_cvs(&ctx).await;
                    deliver(&tx, view, result.map(Action::CvsLoaded));
                });
            }
        }
    }
}

fn deliver(tx: &mpsc::UnboundedSender<Action>, view: ViewMode, result: Result<Action, BackendError>) {
    let action = match result {
        Ok(action) => action,
        Err(BackendError::Cancelled) => {
            debug!("fetch cancelled with its view");
            return;
        }
        Err(e) => Action::FetchError(view, e.to_string()),
    };
    let _ = tx.send(action);
}

fn clamp(selected: usize, len: usize) -> usize {
    selected.min(len.saturating_sub(1))
}

/// Parses `"<hours> [note...]"`.
pub fn parse_time_input(input: &str) -> Option<(f64, Option<String>)> {
    let mut parts = input.trim().splitn(2, char::is_whitespace);
    let hours: f64 = parts.next()?.parse().ok()?;
    let note = parts
        .next()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);
    Some((hours, note))
}
