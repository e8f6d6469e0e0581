mod keychain;

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use spadesk_api::{ApiRequest, Method, Navigator};
use spadesk_auth::landing_path_for;
use spadesk_connectors::{ReqwestTransport, TracingNotifier};
use spadesk_core::{
    CONFIG_FILE, ClientConfig, default_config_dir, load_config, write_default_config_file,
};
use spadesk_session::SpaContext;
use tracing_subscriber::EnvFilter;

use crate::keychain::KeyringStorage;

#[derive(Debug, Parser)]
#[command(name = "spadesk", about = "Spa booking client: session, tenancy and API access")]
struct Cli {
    #[arg(long, global = true)]
    json: bool,

    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Spa to scope requests to, overriding the configured default
    #[arg(long, global = true)]
    spa_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Write a commented config.toml
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Show configuration and session state (no network)
    Status,
    /// Login with email/password; the password is prompted
    Login {
        #[arg(long)]
        email: String,
    },
    /// Remove the stored session
    Logout,
    /// Show claims and profile of the stored session
    Whoami,
    /// Ask for a password reset code
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password with a reset code; the password is prompted twice
    ResetPassword {
        #[arg(long)]
        email: String,
        /// Reset code from the email
        #[arg(long)]
        code: String,
    },
    /// Register a new spa (JSON payload)
    RegisterSpa {
        #[arg(long)]
        data: String,
    },
    /// List services, or show one
    Services { id: Option<String> },
    /// List bookings
    Bookings {
        #[arg(long, value_enum, default_value_t = BookingScope::Mine)]
        scope: BookingScope,
    },
    /// List spas (platform admins)
    Spas,
    /// Raw API call through the session pipeline
    Call {
        #[arg(value_enum)]
        method: HttpMethod,
        /// Path under the API root, e.g. /admin/sales
        path: String,
        /// JSON body
        #[arg(long)]
        data: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BookingScope {
    /// The caller's own bookings
    Mine,
    /// Every booking of the current spa
    Spa,
    /// Every booking on the platform
    Platform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<HttpMethod> for Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => Method::Get,
            HttpMethod::Post => Method::Post,
            HttpMethod::Put => Method::Put,
            HttpMethod::Patch => Method::Patch,
            HttpMethod::Delete => Method::Delete,
        }
    }
}

/// There are no screens in a terminal; navigation is reported.
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, path: &str) {
        tracing::info!(target: "spadesk::navigate", path, "next screen");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let cfg_dir = config_dir(cli.config_dir.clone());

    match &cli.command {
        Commands::Init { force } => {
            let path = cfg_dir.join(CONFIG_FILE);
            if *force && path.exists() {
                fs::remove_file(&path)?;
            }
            let path = write_default_config_file(&cfg_dir)?;
            pout(
                cli.json,
                serde_json::json!({"message": "init complete", "config": path}),
                &format!("Init complete: {}", path.display()),
            )?;
        }
        Commands::Status => {
            let cfg = load_config(&cfg_dir)?;
            let ctx = open_context(&cfg, cli.spa_id.clone())?;
            let role = ctx.session().current_role();
            let tenant = ctx.tenants().resolve("/services");
            pout(
                cli.json,
                serde_json::json!({
                    "api_url": cfg.api_url,
                    "tenant": tenant.tenant_id,
                    "tenant_source": format!("{:?}", tenant.source),
                    "authenticated": role.is_some(),
                    "role": role.map(|r| r.as_str()),
                }),
                &format!(
                    "API: {}\nSpa: {}\nSession: {}",
                    cfg.api_url,
                    tenant.tenant_id.as_deref().unwrap_or("(none)"),
                    role.map_or("anonymous".to_string(), |r| format!("logged in as {r}")),
                ),
            )?;
        }
        Commands::Login { email } => {
            let ctx = context(&cli, &cfg_dir)?;
            let password = rpassword::prompt_password(format!("Password for {email}: "))?;
            if password.is_empty() {
                bail!("Password cannot be empty");
            }
            let identity = ctx.login(email, &password).await?;
            let landing = landing_path_for(identity.role);
            pout(
                cli.json,
                serde_json::json!({"identity": identity, "landing": landing}),
                &format!(
                    "Logged in as {} ({}). Landing page: {landing}",
                    identity.display_name, identity.role
                ),
            )?;
        }
        Commands::Logout => {
            let ctx = context(&cli, &cfg_dir)?;
            ctx.logout();
            pout(
                cli.json,
                serde_json::json!({"ok": true}),
                "Logged out. Stored session removed.",
            )?;
        }
        Commands::Whoami => {
            let ctx = context(&cli, &cfg_dir)?;
            let Some(claims) = ctx.session().claims() else {
                bail!("Not logged in. Run: spadesk login --email <email>");
            };
            let user = ctx.session().current_user();
            let name = user
                .as_ref()
                .and_then(|u| u.full_name.clone())
                .unwrap_or_else(|| claims.subject_id.clone());
            pout(
                cli.json,
                serde_json::json!({"claims": claims, "user": user}),
                &format!(
                    "{name} ({}) spa={}",
                    claims.role,
                    claims.tenant_id.as_deref().unwrap_or("-")
                ),
            )?;
        }
        Commands::ForgotPassword { email } => {
            let ctx = context(&cli, &cfg_dir)?;
            let ticket = ctx.request_password_reset(email).await?;
            let text = match &ticket.reset_token {
                Some(code) => format!("Reset code sent. Development code: {code}"),
                None => "Reset code sent. Check your email.".to_string(),
            };
            pout(cli.json, serde_json::to_value(&ticket)?, &text)?;
        }
        Commands::ResetPassword { email, code } => {
            let ctx = context(&cli, &cfg_dir)?;
            let new_password = rpassword::prompt_password("New password: ")?;
            let confirm = rpassword::prompt_password("Confirm new password: ")?;
            ctx.reset_password(email, code, &new_password, &confirm)
                .await?;
            pout(
                cli.json,
                serde_json::json!({"ok": true}),
                "Password reset. You can now login.",
            )?;
        }
        Commands::RegisterSpa { data } => {
            let ctx = context(&cli, &cfg_dir)?;
            let created = ctx.identity().register_spa(parse_json(data)?).await?;
            print_json(&created)?;
        }
        Commands::Services { id } => {
            let api = context(&cli, &cfg_dir)?.storefront();
            let body = match id {
                Some(id) => api.get_service(id).await?,
                None => api.list_services().await?,
            };
            print_json(&body)?;
        }
        Commands::Bookings { scope } => {
            let api = context(&cli, &cfg_dir)?.storefront();
            let body = match scope {
                BookingScope::Mine => api.my_bookings().await?,
                BookingScope::Spa => api.admin_bookings().await?,
                BookingScope::Platform => api.master_bookings().await?,
            };
            print_json(&body)?;
        }
        Commands::Spas => {
            let api = context(&cli, &cfg_dir)?.storefront();
            print_json(&api.master_spas().await?)?;
        }
        Commands::Call { method, path, data } => {
            let ctx = context(&cli, &cfg_dir)?;
            let mut request = ApiRequest::new((*method).into(), path.as_str());
            if let Some(data) = data {
                request = request.with_body(parse_json(data)?);
            }
            let response = ctx.client().send(request).await?;
            print_json(&response.body)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,spadesk=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn config_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| dirs::config_dir().map(|d| d.join("spadesk")))
        .unwrap_or_else(default_config_dir)
}

fn context(cli: &Cli, cfg_dir: &std::path::Path) -> anyhow::Result<SpaContext> {
    let cfg = load_config(cfg_dir)?;
    open_context(&cfg, cli.spa_id.clone())
}

fn open_context(cfg: &ClientConfig, spa_id: Option<String>) -> anyhow::Result<SpaContext> {
    let transport =
        ReqwestTransport::new(&cfg.api_url, Duration::from_millis(cfg.request_timeout_ms))?;
    let ctx = SpaContext::from_config(
        cfg,
        Arc::new(KeyringStorage::new(&cfg.keyring_service)),
        Arc::new(transport),
        Arc::new(TracingNotifier),
        Arc::new(LogNavigator),
    )?;
    if spa_id.is_some() {
        ctx.tenants().set_explicit(spa_id);
    }
    Ok(ctx)
}

fn parse_json(data: &str) -> anyhow::Result<Value> {
    serde_json::from_str(data).context("--data must be valid JSON")
}

pub fn pout(json_mode: bool, value: Value, text: &str) -> anyhow::Result<()> {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{text}");
    }
    Ok(())
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
