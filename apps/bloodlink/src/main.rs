use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use mimalloc::MiMalloc;
use serde::Serialize;
use uuid::Uuid;

use blood_donation::contract::client::BloodDonationApi;
use blood_donation::contract::model::{
    BloodGroup, DispatchReport, NewBloodRequest, NewUser, Sex, Urgency, User, UserPatch,
    UserRole,
};
use blood_donation::{Adapters, BloodDonation, BloodDonationConfig};
use runtime::{AppConfig, CliArgs};

mod dto;

use dto::{CooldownDto, DonationDto, NotifyDto, RequestDto, StatusDto, UserDto};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MODULE_NAME: &str = "blood_donation";

/// BloodLink - blood donation coordination
#[derive(Parser)]
#[command(name = "bloodlink")]
#[command(about = "BloodLink - match blood requests with nearby volunteers")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory (overrides app.home_dir)
    #[arg(long)]
    home_dir: Option<String>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep everything in memory for this run
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check configuration
    Check,
    #[command(flatten)]
    Action(Action),
}

#[derive(Subcommand)]
enum Action {
    /// Create an account and log in
    Register(RegisterArgs),
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show or update your profile
    Profile(ProfileArgs),
    /// Change your password
    Password {
        #[arg(long)]
        current: String,
        #[arg(long)]
        new: String,
    },
    /// Blood requests
    #[command(subcommand)]
    Request(RequestCommands),
    /// Volunteers matching a request
    Matches { request_id: Uuid },
    /// Record that you donated for a request
    Donate { request_id: Uuid },
    /// Notify matching volunteers about a request again
    Notify {
        request_id: Uuid,
        /// Only this volunteer
        #[arg(long)]
        volunteer: Option<Uuid>,
    },
    /// Time left before you may donate again
    Cooldown,
    /// Your donation history
    History,
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    phone: String,
    /// One of A+ A- B+ B- AB+ AB- O+ O-
    #[arg(long, allow_hyphen_values = true)]
    blood_group: BloodGroup,
    #[arg(long)]
    sex: Sex,
    #[arg(long)]
    locality: String,
    /// Requestor, Volunteer or Both
    #[arg(long)]
    role: UserRole,
    #[arg(long)]
    password: String,
}

#[derive(Args)]
struct ProfileArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    locality: Option<String>,
    #[arg(long)]
    role: Option<UserRole>,
}

#[derive(Subcommand)]
enum RequestCommands {
    /// Post a new blood request
    Create {
        #[arg(long)]
        patient: String,
        #[arg(long, allow_hyphen_values = true)]
        blood_group: BloodGroup,
        #[arg(long)]
        units: u32,
        #[arg(long)]
        hospital: String,
        #[arg(long)]
        locality: String,
        #[arg(long, default_value = "Medium")]
        urgency: Urgency,
    },
    /// All requests, newest first
    List,
    /// One request by id
    Show { id: Uuid },
    /// Close one of your requests
    Close { id: Uuid },
    /// Requests you posted
    Mine,
    /// Open requests you could answer
    ForMe,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // CLI args passed down to config/app
    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        home_dir: cli.home_dir.clone(),
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args)?;

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, &config.home_dir());
    tracing::debug!(home_dir = %config.app.home_dir, "BloodLink starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    let module_cfg: BloodDonationConfig = config.module_config(MODULE_NAME)?;
    let action = match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => return check_config(&config, &module_cfg),
        Commands::Action(action) => action,
    };

    let adapters = if args.mock {
        tracing::info!("Running with in-memory adapters");
        Adapters::in_memory()
    } else {
        Adapters::from_config(&module_cfg, &config.home_dir())?
    };
    let module = BloodDonation::new(&module_cfg, adapters)?;

    run_action(module.api(), action).await
}

fn check_config(config: &AppConfig, module_cfg: &BloodDonationConfig) -> Result<()> {
    tracing::info!("Checking configuration...");
    Adapters::from_config(module_cfg, &config.home_dir())?;
    println!("Configuration check passed");
    println!("{}", config.to_yaml()?);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render output")?
    );
    Ok(())
}

fn print_list<T, D>(items: Vec<T>) -> Result<()>
where
    D: From<T> + Serialize,
{
    print_json(&items.into_iter().map(D::from).collect::<Vec<D>>())
}

async fn require_user(api: &dyn BloodDonationApi) -> Result<User> {
    match api.current_user().await? {
        Some(user) => Ok(user),
        None => bail!("not logged in; run `bloodlink login` first"),
    }
}

async fn run_action(api: Arc<dyn BloodDonationApi>, action: Action) -> Result<()> {
    let api = api.as_ref();
    match action {
        Action::Register(a) => {
            let session = api
                .register(NewUser {
                    name: a.name,
                    email: a.email,
                    phone: a.phone,
                    blood_group: a.blood_group,
                    sex: a.sex,
                    locality: a.locality,
                    role: a.role,
                    password: a.password,
                })
                .await?;
            print_json(&UserDto::from(session.user))
        }
        Action::Login { email, password } => {
            let session = api.login(&email, &password).await?;
            print_json(&UserDto::from(session.user))
        }
        Action::Logout => {
            api.logout().await?;
            print_json(&StatusDto::ok("logged out"))
        }
        Action::Whoami => {
            let user = require_user(api).await?;
            print_json(&UserDto::from(user))
        }
        Action::Profile(p) => {
            let user = require_user(api).await?;
            let patch = UserPatch {
                name: p.name,
                email: p.email,
                phone: p.phone,
                locality: p.locality,
                role: p.role,
            };
            if patch == UserPatch::default() {
                return print_json(&UserDto::from(user));
            }
            let updated = api.update_profile(user.id, patch).await?;
            print_json(&UserDto::from(updated))
        }
        Action::Password { current, new } => {
            let user = require_user(api).await?;
            api.change_password(user.id, &current, &new).await?;
            print_json(&StatusDto::ok("password changed"))
        }
        Action::Request(cmd) => run_request_command(api, cmd).await,
        Action::Matches { request_id } => {
            print_list::<_, UserDto>(api.find_matches(request_id).await?)
        }
        Action::Donate { request_id } => {
            let user = require_user(api).await?;
            let donation = api.record_donation(user.id, request_id).await?;
            print_json(&DonationDto::from(donation))
        }
        Action::Notify {
            request_id,
            volunteer,
        } => {
            let report = match volunteer {
                Some(volunteer_id) => {
                    api.notify_volunteer(request_id, volunteer_id).await?;
                    DispatchReport {
                        delivered: vec![volunteer_id],
                        failed: Vec::new(),
                    }
                }
                None => api.notify_matches(request_id).await?,
            };
            print_json(&NotifyDto::from(report))
        }
        Action::Cooldown => {
            let user = require_user(api).await?;
            let left = api.cooldown_remaining(user.id).await?;
            print_json(&CooldownDto::from(left))
        }
        Action::History => {
            let user = require_user(api).await?;
            print_list::<_, DonationDto>(api.donations_by_donor(user.id).await?)
        }
    }
}

async fn run_request_command(api: &dyn BloodDonationApi, cmd: RequestCommands) -> Result<()> {
    match cmd {
        RequestCommands::Create {
            patient,
            blood_group,
            units,
            hospital,
            locality,
            urgency,
        } => {
            let user = require_user(api).await?;
            let request = api
                .create_request(
                    user.id,
                    NewBloodRequest {
                        patient_name: patient,
                        blood_group,
                        units,
                        hospital,
                        locality,
                        urgency,
                    },
                )
                .await?;
            print_json(&RequestDto::from(request))
        }
        RequestCommands::List => print_list::<_, RequestDto>(api.list_requests().await?),
        RequestCommands::Show { id } => print_json(&RequestDto::from(api.get_request(id).await?)),
        RequestCommands::Close { id } => {
            let user = require_user(api).await?;
            print_json(&RequestDto::from(api.close_request(user.id, id).await?))
        }
        RequestCommands::Mine => {
            let user = require_user(api).await?;
            print_list::<_, RequestDto>(api.requests_by_requestor(user.id).await?)
        }
        RequestCommands::ForMe => {
            let user = require_user(api).await?;
            print_list::<_, RequestDto>(api.open_requests_for_volunteer(user.id).await?)
        }
    }
}
