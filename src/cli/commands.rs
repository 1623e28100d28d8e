// src/cli/commands.rs
use super::render::{describe_state, progress_bar, render_entry, render_jobs, render_transcript};
use super::{Cli, Command, LegacyCommand, LoginArgs};
use crate::auth::{AuthContext, FileTokenStore, SharedTokenStore};
use crate::config::Config;
use crate::error::{ClientError, ClientResult};
use crate::history::{filter_by_title, HistoryBrowser};
use crate::input::validation::{classify_input, validate_youtube_url, DEFAULT_YOUTUBE_PROMPT};
use crate::input::{PreviewRegistry, UploadProgress, UploadSelection};
use crate::models::auth::{SignupForm, UserLogin};
use crate::models::chat::{GenerateRequest, RemoteStatus};
use crate::models::job::Sender;
use crate::services::{ApiService, AuthService, UnifiedApiService};
use crate::workflow::poller::{PollEvent, Poller, StatusSource};
use crate::workflow::session::AnalysisSession;
use crate::workflow::state::{WorkflowState, DEFAULT_FAILURE_MESSAGE};
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

const PROGRESS_TICK: Duration = Duration::from_millis(200);

/// Everything a command needs, wired once per invocation.
pub struct App {
    pub config: Config,
    pub auth: AuthContext<AuthService>,
    pub unified: UnifiedApiService,
    pub legacy: ApiService,
}

impl App {
    pub fn new(config: Config) -> Self {
        let tokens: SharedTokenStore = Arc::new(FileTokenStore::new(&config.token_dir));
        let auth = AuthContext::new(AuthService::new(&config.api_base_url, tokens.clone()), tokens.clone())
            .with_google_sign_in(config.google_sign_in_enabled());
        Self {
            unified: UnifiedApiService::new(&config.api_base_url, tokens.clone()),
            legacy: ApiService::new(&config.api_base_url, tokens),
            auth,
            config,
        }
    }
}

pub async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = Config::from_env();
    if let Some(url) = cli.api_url.as_deref() {
        config = config.with_api_url(url);
    }
    if let Some(millis) = cli.poll_interval_ms {
        config = config.with_poll_interval_ms(millis);
    }
    tracing::debug!(api = %config.api_base_url, token_dir = %config.token_dir.display(), "Loaded configuration");

    let mut app = App::new(config);
    app.auth.initialize();

    // A 401 from the sign-in endpoints means bad credentials, not a stale session
    let signing_in = matches!(cli.command, Command::Login(_) | Command::Register { .. });
    let result = dispatch(&mut app, cli.command).await;
    if let Err(e) = &result {
        if e.is_unauthorized() && !signing_in {
            app.auth.handle_unauthorized();
            eprintln!("🔒 Your session is no longer valid. Please sign in again with `scene-speak login`.");
        }
    }
    result
}

async fn dispatch(app: &mut App, command: Command) -> ClientResult<()> {
    match command {
        Command::Register {
            email,
            first_name,
            last_name,
        } => register(app, email, first_name, last_name).await,
        Command::Login(args) => login(app, args).await,
        Command::Logout => {
            app.auth.logout()?;
            println!("Signed out.");
            Ok(())
        }
        Command::Whoami => {
            match app.auth.session() {
                Some(session) => println!(
                    "Signed in as {} (session expires {})",
                    session.email,
                    session.expires_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M")
                ),
                None => println!("Not signed in."),
            }
            Ok(())
        }
        Command::Analyze { file, text } => analyze(app, file.as_deref(), &text.join(" ")).await,
        Command::History { search } => history(app, search.as_deref()).await,
        Command::Resume { job_id } => resume(app, &job_id).await,
        Command::Legacy(command) => legacy(app, command).await,
    }
}

async fn register(app: &mut App, email: String, first_name: String, last_name: String) -> ClientResult<()> {
    let password = prompt_password("Password: ")?;
    let confirm_password = prompt_password("Confirm password: ")?;
    let form = SignupForm {
        email,
        first_name,
        last_name,
        password,
        confirm_password,
    };

    let user = app.auth.register_form(form).await?;
    println!("✅ Account created for {}.", user.email);
    println!("Sign in with `scene-speak login --email {}`.", user.email);
    Ok(())
}

async fn login(app: &mut App, args: LoginArgs) -> ClientResult<()> {
    let session = match (args.google_id_token, args.email) {
        (Some(id_token), _) => app.auth.google_login(&id_token).await?,
        (None, Some(email)) => {
            let password = prompt_password("Password: ")?;
            app.auth.login(&UserLogin { email, password }).await?
        }
        (None, None) => return Err(ClientError::NotAuthenticated),
    };
    println!("🔐 Signed in as {}.", session.email);
    Ok(())
}

async fn analyze(app: &mut App, file: Option<&Path>, text: &str) -> ClientResult<()> {
    let mut selection = UploadSelection::new(PreviewRegistry::new());
    if let Some(path) = file {
        let selected = selection.select_file(path)?;
        println!(
            "🎞️  {} ({}, {:.1} MB)",
            selected.file_name(),
            selected.mime,
            selected.size_mb()
        );
    }
    let submission = classify_input(selection.selected(), text)?;
    let uploading = submission.file().is_some();

    let mut session = AnalysisSession::new(Arc::new(app.unified.clone()), app.config.poll_interval);
    let printer = spawn_state_printer(&session);

    if uploading {
        with_upload_progress(session.submit(submission)).await?;
    } else {
        session.submit(submission).await?;
    }
    if matches!(session.state(), WorkflowState::Processing(_)) {
        session.await_completion().await?;
    }
    selection.clear();

    let outcome = match session.state() {
        WorkflowState::Error { message, .. } => Err(ClientError::JobFailed(message.clone())),
        _ => {
            print_active(&session);
            chat_loop(&mut session).await
        }
    };
    printer.abort();
    outcome
}

async fn history(app: &mut App, search: Option<&str>) -> ClientResult<()> {
    let browser = HistoryBrowser::new(app.unified.clone());
    let mut jobs = browser.list(&app.auth).await?;
    if let Some(query) = search {
        jobs = filter_by_title(jobs, query);
    }
    println!("{}", render_jobs(&jobs));
    Ok(())
}

async fn resume(app: &mut App, job_id: &str) -> ClientResult<()> {
    let browser = HistoryBrowser::new(app.unified.clone());
    let job = browser.find(&app.auth, job_id).await?;

    let mut session = AnalysisSession::new(Arc::new(app.unified.clone()), app.config.poll_interval);
    let printer = spawn_state_printer(&session);
    session.resume(HistoryBrowser::resume_payload(&job)).await?;

    println!("📂 {}", job.title);
    print_active(&session);
    let outcome = chat_loop(&mut session).await;
    printer.abort();
    outcome
}

async fn legacy(app: &mut App, command: LegacyCommand) -> ClientResult<()> {
    match command {
        LegacyCommand::Upload { path } => {
            let uploaded = with_upload_progress(app.legacy.upload_video(&path)).await?;
            println!("File id: {}", uploaded.file_id);

            let source: Arc<dyn StatusSource> = Arc::new(app.legacy.clone());
            let mut poll = Poller::spawn(source, uploaded.file_id.clone(), app.config.poll_interval);
            while let Some(event) = poll.next_event().await {
                match event {
                    PollEvent::Status { status, .. } => match status.status {
                        RemoteStatus::Active => {
                            println!("✅ Ready. Ask about it with `scene-speak legacy generate {} <PROMPT>`", uploaded.file_id);
                            if let Some(response) = status.response {
                                println!("{}", response);
                            }
                        }
                        RemoteStatus::Error => {
                            let message = status.failure_message().unwrap_or(DEFAULT_FAILURE_MESSAGE);
                            return Err(ClientError::JobFailed(message.to_string()));
                        }
                        other => eprintln!("Status: {}", other.as_str()),
                    },
                    PollEvent::Failed { error, .. } => return Err(error),
                }
            }
            Ok(())
        }
        LegacyCommand::Generate { file_id, prompt } => {
            let reply = app
                .legacy
                .generate_response(&GenerateRequest { file_id, prompt })
                .await?;
            println!("{}", reply.response);
            Ok(())
        }
        LegacyCommand::Youtube { url, prompt } => {
            let url = validate_youtube_url(&url)?;
            let prompt = prompt.unwrap_or_else(|| DEFAULT_YOUTUBE_PROMPT.to_string());
            let reply = app.legacy.analyze_youtube(&url, &prompt).await?;
            println!("{}", reply.response);
            Ok(())
        }
    }
}

/// Read follow-ups from stdin until an empty line, `/quit` or EOF.
async fn chat_loop(session: &mut AnalysisSession<UnifiedApiService>) -> ClientResult<()> {
    println!("\nAsk a follow-up question (empty line or /quit to exit).");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            break;
        }

        if let Err(e) = session.send_message(line).await {
            if e.is_unauthorized() {
                return Err(e);
            }
            eprintln!("⚠️  {}", e);
        }

        if let Some(entry) = session.state().transcript().and_then(|t| t.last()) {
            if entry.sender == Sender::Ai {
                println!("{}", render_entry(entry));
            }
        }
    }
    Ok(())
}

fn print_active(session: &AnalysisSession<UnifiedApiService>) {
    if let Some(job) = session.state().active_job() {
        if let Some(embed) = job.embed_url() {
            println!("▶️  {}", embed);
        }
        println!("{}", render_transcript(&job.transcript));
    }
}

/// Echo processing status and the typing indicator as the session moves.
fn spawn_state_printer(session: &AnalysisSession<UnifiedApiService>) -> tokio::task::JoinHandle<()> {
    let mut updates = session.subscribe();
    tokio::spawn(async move {
        let mut last_line = String::new();
        while updates.changed().await.is_ok() {
            let line = {
                let state = updates.borrow_and_update();
                if matches!(*state, WorkflowState::Error { .. }) {
                    None
                } else {
                    describe_state(&state)
                }
            };
            if let Some(line) = line {
                if line != last_line {
                    eprintln!("{}", line);
                    last_line = line;
                }
            }
        }
    })
}

/// Drive `upload` while a cosmetic progress bar creeps along on stderr.
async fn with_upload_progress<T>(upload: impl Future<Output = ClientResult<T>>) -> ClientResult<T> {
    let mut progress = UploadProgress::new();
    let mut ticker = tokio::time::interval(PROGRESS_TICK);
    tokio::pin!(upload);

    let result = loop {
        tokio::select! {
            result = &mut upload => break result,
            _ = ticker.tick() => {
                progress.tick();
                eprint!("\rUploading {}", progress_bar(progress.percent()));
            }
        }
    };

    match &result {
        Ok(_) => progress.complete(),
        Err(_) => progress.fail(),
    }
    eprintln!("\rUploading {}", progress_bar(progress.percent()));
    result
}

fn prompt_password(label: &str) -> ClientResult<String> {
    Ok(rpassword::prompt_password(label)?)
}
