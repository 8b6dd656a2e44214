use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use fileshare_client::auth::{self, AuthError};
use fileshare_client::config::{AuthScheme, ClientConfig, ConfigError};
use fileshare_client::net::types::{ApprovalStatus, Page, Plan, SearchRequest, ShareSettings};
use fileshare_client::net::{ApiClient, ApiError, ApiResponse, api};
use fileshare_client::notify::{ConsoleNotifier, Notifier};
use fileshare_client::session::{Session, SessionError, StorageRepository};
use fileshare_client::storage::FileStorage;
use serde_json::{Value, json};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("not logged in; run `fileshare login` first")]
    NotLoggedIn,
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "fileshare", about = "File-sharing service client")]
struct Cli {
    #[arg(long, env = "FILESHARE_API_BASE_URL")]
    base_url: Option<String>,

    /// Directory holding the persisted session.
    #[arg(long, env = "FILESHARE_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// How the token is sent: `raw` or `bearer`.
    #[arg(long, env = "FILESHARE_AUTH_SCHEME")]
    auth_scheme: Option<AuthScheme>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "FILESHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        username: String,
        #[arg(long, env = "FILESHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    Whoami,
    Plan(PlanCommand),
    Account(AccountCommand),
    Files(FilesCommand),
    Folders(FoldersCommand),
    Approvals(ApprovalsCommand),
}

#[derive(Args, Debug)]
struct PlanCommand {
    #[command(subcommand)]
    command: PlanSubcommand,
}

#[derive(Subcommand, Debug)]
enum PlanSubcommand {
    Set { plan: Plan },
}

#[derive(Args, Debug)]
struct AccountCommand {
    #[command(subcommand)]
    command: AccountSubcommand,
}

#[derive(Subcommand, Debug)]
enum AccountSubcommand {
    /// Replace the avatar with a local jpeg, png or webp image.
    Avatar { path: PathBuf },
    /// Delete the account and sign out.
    Delete {
        #[arg(long, env = "FILESHARE_PASSWORD", hide_env_values = true)]
        password: String,
    },
}

#[derive(Args, Debug)]
struct FilesCommand {
    #[command(subcommand)]
    command: FilesSubcommand,
}

#[derive(Subcommand, Debug)]
enum FilesSubcommand {
    List {
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 0)]
        limit: u32,
        #[arg(long)]
        team_id: Option<String>,
    },
    Search {
        text: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_limit: u32,
    },
    Rename {
        file_id: String,
        name: String,
    },
    Delete {
        file_id: String,
    },
    Download {
        file_id: String,
        #[arg(long, short)]
        output: PathBuf,
    },
    Upload {
        path: PathBuf,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        folder_id: Option<String>,
    },
    /// Resolve a share link to the file's address.
    Open {
        short_url: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create a share link for a file.
    Share {
        file_id: String,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        approvable: bool,
        #[arg(long)]
        view_only: bool,
        #[arg(long)]
        max_downloads: Option<u32>,
        /// RFC 3339 timestamp.
        #[arg(long)]
        expires_at: Option<String>,
    },
}

#[derive(Args, Debug)]
struct FoldersCommand {
    #[command(subcommand)]
    command: FoldersSubcommand,
}

#[derive(Subcommand, Debug)]
enum FoldersSubcommand {
    List {
        #[arg(long)]
        team_id: Option<String>,
    },
    Create {
        name: String,
        #[arg(long)]
        team_id: Option<String>,
    },
    Show {
        folder_id: String,
    },
    Rename {
        folder_id: String,
        name: String,
    },
    Delete {
        folder_id: String,
    },
}

#[derive(Args, Debug)]
struct ApprovalsCommand {
    #[command(subcommand)]
    command: ApprovalsSubcommand,
}

#[derive(Subcommand, Debug)]
enum ApprovalsSubcommand {
    Request {
        file_id: String,
        #[arg(long)]
        reason: String,
    },
    Status {
        approval_id: String,
        status: ApprovalStatus,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    if let Err(error) = dotenv {
        if !error.not_found() {
            tracing::warn!(%error, "failed to load .env");
        }
    }

    let cli = Cli::parse();
    let notifier = ConsoleNotifier;
    match run(cli, &notifier).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            notifier.error(&error.to_string());
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<ClientConfig, CliError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config.api_base_url.clone_from(base_url);
    }
    if let Some(state_dir) = &cli.state_dir {
        config.state_dir.clone_from(state_dir);
    }
    if let Some(auth_scheme) = cli.auth_scheme {
        config.auth_scheme = auth_scheme;
    }
    Ok(config)
}

async fn run(cli: Cli, notifier: &dyn Notifier) -> Result<(), CliError> {
    let config = load_config(&cli)?;
    let session = Arc::new(Session::restore(StorageRepository::new(FileStorage::new(config.state_dir.clone()))));
    let client = ApiClient::new(&config, Arc::clone(&session))?;
    tracing::debug!(base_url = client.base_url(), state_dir = %config.state_dir.display(), "client ready");

    match cli.command {
        Command::Login { username, password } => {
            let state = auth::login(&client, &username, &password).await?;
            notifier.success(&format!("logged in as {} ({} plan)", state.username, state.plan));
            Ok(())
        }
        Command::Register { username, password } => {
            let message = auth::register(&client, &username, &password).await?;
            notifier.success(&message);
            Ok(())
        }
        Command::Logout => {
            auth::logout(&session)?;
            notifier.success("logged out");
            Ok(())
        }
        Command::Whoami => run_whoami(&session),
        Command::Plan(plan) => {
            require_login(&session)?;
            let PlanSubcommand::Set { plan } = plan.command;
            report(notifier, &auth::change_plan(&client, plan).await?)
        }
        Command::Account(account) => {
            require_login(&session)?;
            match account.command {
                AccountSubcommand::Avatar { path } => {
                    let avatar_url = auth::upload_avatar(&client, &path).await?;
                    notifier.success(&format!("avatar set to {avatar_url}"));
                }
                AccountSubcommand::Delete { password } => {
                    let message = auth::delete_account(&client, &password).await?;
                    notifier.success(&message);
                }
            }
            Ok(())
        }
        Command::Files(files) => {
            // share links are readable without an account
            if !matches!(files.command, FilesSubcommand::Open { .. }) {
                require_login(&session)?;
            }
            run_files(&client, notifier, files).await
        }
        Command::Folders(folders) => {
            require_login(&session)?;
            run_folders(&client, notifier, folders).await
        }
        Command::Approvals(approvals) => {
            require_login(&session)?;
            run_approvals(&client, notifier, approvals).await
        }
    }
}

fn require_login(session: &Session) -> Result<(), CliError> {
    if session.is_authenticated()? { Ok(()) } else { Err(CliError::NotLoggedIn) }
}

fn run_whoami(session: &Session) -> Result<(), CliError> {
    let state = session.snapshot()?;
    let Some(id) = &state.id else {
        return Err(CliError::NotLoggedIn);
    };
    print_json(&json!({
        "id": id.as_str(),
        "username": state.username,
        "plan": state.plan,
        "avatar_url": state.avatar_url,
    }))
}

async fn run_files(client: &ApiClient, notifier: &dyn Notifier, files: FilesCommand) -> Result<(), CliError> {
    match files.command {
        FilesSubcommand::List { page, limit, team_id } => {
            let listing = api::list_files(client, Page { page, limit }, team_id.as_deref()).await?;
            print_json(&json!({ "files": listing.files, "shortUrls": listing.short_urls }))
        }
        FilesSubcommand::Search { text, page, page_limit } => {
            let search = SearchRequest { search_text: &text, page, page_limit };
            report(notifier, &api::search_files(client, &search).await?)
        }
        FilesSubcommand::Rename { file_id, name } => report(notifier, &api::rename_file(client, &file_id, &name).await?),
        FilesSubcommand::Delete { file_id } => report(notifier, &api::delete_file(client, &file_id).await?),
        FilesSubcommand::Download { file_id, output } => {
            let bytes = api::download_file(client, &file_id).await?;
            tokio::fs::write(&output, &bytes).await.map_err(|source| CliError::Write { path: output.clone(), source })?;
            notifier.success(&format!("saved {} bytes to {}", bytes.len(), output.display()));
            Ok(())
        }
        FilesSubcommand::Upload { path, name, folder_id } => {
            let response = api::upload_file(client, &path, name.as_deref(), folder_id.as_deref()).await?;
            report(notifier, &response)
        }
        FilesSubcommand::Open { short_url, password } => {
            let access = api::open_shared_file(client, &short_url, password.as_deref()).await?;
            print_json(&json!({ "file_address": access.file_address }))
        }
        FilesSubcommand::Share { file_id, password, approvable, view_only, max_downloads, expires_at } => {
            let settings = ShareSettings { password, approvable, view_only, max_downloads, expiration_at: expires_at };
            let link = api::create_share_settings(client, &file_id, &settings).await?;
            notifier.success(&format!("share link: {}", link.short_url));
            Ok(())
        }
    }
}

async fn run_folders(client: &ApiClient, notifier: &dyn Notifier, folders: FoldersCommand) -> Result<(), CliError> {
    match folders.command {
        FoldersSubcommand::List { team_id } => print_json(&api::list_folders(client, team_id.as_deref()).await?),
        FoldersSubcommand::Create { name, team_id } => {
            report(notifier, &api::create_folder(client, &name, team_id.as_deref()).await?)
        }
        FoldersSubcommand::Show { folder_id } => {
            let folder = api::folder_contents(client, &folder_id).await?;
            print_json(&json!({
                "folder_id": folder.folder_id,
                "folder_name": folder.folder_name,
                "files": folder.files,
            }))
        }
        FoldersSubcommand::Rename { folder_id, name } => {
            report(notifier, &api::rename_folder(client, &folder_id, &name).await?)
        }
        FoldersSubcommand::Delete { folder_id } => report(notifier, &api::delete_folder(client, &folder_id).await?),
    }
}

async fn run_approvals(
    client: &ApiClient,
    notifier: &dyn Notifier,
    approvals: ApprovalsCommand,
) -> Result<(), CliError> {
    match approvals.command {
        ApprovalsSubcommand::Request { file_id, reason } => {
            report(notifier, &api::request_approval(client, &file_id, &reason).await?)
        }
        ApprovalsSubcommand::Status { approval_id, status } => {
            report(notifier, &api::update_approval_status(client, &approval_id, status).await?)
        }
    }
}

/// Plain-text bodies become a success notification; anything else is printed.
fn report(notifier: &dyn Notifier, response: &ApiResponse) -> Result<(), CliError> {
    match &response.body {
        Value::String(message) => {
            notifier.success(message);
            Ok(())
        }
        Value::Null => {
            notifier.success("done");
            Ok(())
        }
        body => print_json(body),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
