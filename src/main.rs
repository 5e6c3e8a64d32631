use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use webquiz_session::{
    ConfigError, CurrentUser, Location, NavigationError, Router, SessionConfig, SessionError, SessionManager,
    UserDetails,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("{message} [{code}]")]
    Session { code: &'static str, message: String },
    #[error(transparent)]
    Navigation(#[from] NavigationError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl From<SessionError> for CliError {
    fn from(err: SessionError) -> Self {
        Self::Session { code: err.error_code(), message: user_feedback(&err) }
    }
}

/// Message shown to the user for each failure kind.
fn user_feedback(err: &SessionError) -> String {
    match err {
        SessionError::Backend { endpoint, .. } => format!("cannot reach the quiz server ({endpoint})"),
        SessionError::User(user) => user.to_string(),
    }
}

#[derive(Parser, Debug)]
#[command(name = "webquiz", about = "WebQuiz session client")]
struct Cli {
    /// Base URL of the authentication service.
    #[arg(long, env = "WEBQUIZ_BACKEND_URL")]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and print the user the server reports, as JSON.
    Whoami(Identity),
    Login(LoginArgs),
    /// Log in, then end the session again.
    Logout(Identity),
    Signup(SignupArgs),
    /// Navigate through one or more paths in order.
    Navigate(NavigateArgs),
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long, short = 'u')]
    username: String,
    #[arg(long, short = 'p', env = "WEBQUIZ_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Account to sign in as before the command runs. Sessions live only as long
/// as one process, so commands that need a user log in first.
#[derive(Args, Debug)]
struct Identity {
    #[arg(long = "as", value_name = "USERNAME")]
    login_as: String,
    #[arg(long, short = 'p', env = "WEBQUIZ_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[command(flatten)]
    credentials: Credentials,
    /// Path to continue to after logging in.
    #[arg(long)]
    then: Option<String>,
}

#[derive(Args, Debug)]
struct SignupArgs {
    #[command(flatten)]
    credentials: Credentials,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    name: Option<String>,
}

#[derive(Args, Debug)]
struct NavigateArgs {
    /// Log in before navigating.
    #[arg(long = "as", requires = "password", value_name = "USERNAME")]
    login_as: Option<String>,
    #[arg(long, env = "WEBQUIZ_PASSWORD", hide_env_values = true)]
    password: Option<String>,
    #[arg(required = true)]
    paths: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = SessionConfig::from_env()?;
    if let Some(url) = cli.backend_url.as_deref() {
        config = config.with_backend_url(url)?;
    }
    tracing::debug!(backend = %config.backend_url, "session context configured");
    let session = SessionManager::from_config(config)?;

    match cli.command {
        Command::Whoami(identity) => run_whoami(&session, identity).await,
        Command::Login(args) => run_login(session, args).await,
        Command::Logout(identity) => run_logout(&session, identity).await,
        Command::Signup(args) => run_signup(&session, args).await,
        Command::Navigate(args) => run_navigate(session, args).await,
    }
}

async fn run_whoami(session: &SessionManager, identity: Identity) -> Result<(), CliError> {
    session.login(&identity.login_as, &identity.password).await?;
    print_user(&session.get_user().await?)
}

async fn run_login(session: SessionManager, args: LoginArgs) -> Result<(), CliError> {
    let Credentials { username, password } = args.credentials;
    let mut router = Router::new(session);
    match router.login_and_resume(&username, &password, args.then.as_deref()).await {
        Ok(location) => {
            print_location(&location);
            Ok(())
        }
        Err(NavigationError::Session { source, .. }) => Err(source.into()),
        Err(e) => Err(e.into()),
    }
}

async fn run_logout(session: &SessionManager, identity: Identity) -> Result<(), CliError> {
    session.login(&identity.login_as, &identity.password).await?;
    session.logout().await?;
    println!("logged out");
    Ok(())
}

async fn run_signup(session: &SessionManager, args: SignupArgs) -> Result<(), CliError> {
    let Credentials { username, password } = args.credentials;
    let mut details = UserDetails::new(username, password);
    details.email = args.email;
    details.name = args.name;
    print_user(&session.create_user(&details).await?)
}

async fn run_navigate(session: SessionManager, args: NavigateArgs) -> Result<(), CliError> {
    if let (Some(username), Some(password)) = (args.login_as.as_deref(), args.password.as_deref()) {
        session.login(username, password).await?;
    }
    let mut router = Router::new(session);
    for path in &args.paths {
        let location = router.push(path).await?;
        print_location(&location);
    }
    Ok(())
}

fn print_location(location: &Location) {
    match location.return_path() {
        Some(return_path) => println!("{} {} (returnPath={return_path})", location.route, location.full_path),
        None => println!("{} {}", location.route, location.full_path),
    }
}

fn print_user(user: &CurrentUser) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(user)?);
    Ok(())
}

#[cfg(test)]
#[path = "main_test.rs"]
mod tests;
