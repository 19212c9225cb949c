//! CLI module for the gymhub operator console.
//!
//! Every subcommand is one page of the management front end:
//! - `login` / `logout` / `whoami` - Session for the role given by `--role`
//! - `members`, `coaches` - List, lock, unlock and ban accounts
//! - `packages`, `orders`, `reviews`, `rooms`, `facilities` - Admin pages
//! - `my-members` (coach), `my-orders` (client) - Own records
//! - `public packages` - Anonymous package feed
//! - `dashboard` - Summary figures
//! - `config check` - Validate configuration file
//!
//! Destructive actions ask for confirmation on the terminal unless `--yes`
//! is given.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Args, Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

use crate::api::ApiClient;
use crate::config::{ApiSettings, Config};
use crate::confirm::{ConfirmPrompt, Decider, FixedDecision, GateOutcome, UserDecision};
use crate::loader::{FilterCriteria, Filterable, ListQuery, ListView, SortOrder};
use crate::models::{
    AccountHolder, AccountStatus, Coach, Entity, EntityId, FacilityDraft, FacilityStatus, Linked,
    Member, Order, OrderStatus, PackageDraft, PackageStatus, PaymentStatus, ReviewDraft,
    RoomDraft, RoomStatus,
};
use crate::resources::{
    accounts, dashboard, orders, packages, portal, public, reviews, rooms, Labelled, Resource,
};
use crate::session::{Role, SessionGuard, SessionResult};
use crate::storage::{FileStore, KeyValueStore};

/// CLI arguments structure
#[derive(Parser, Debug)]
#[command(name = "gymhub")]
#[command(author, version, about = "Operator console for the gym management backend", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "gymhub.toml")]
    pub config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// API root, overriding `[api].base_url`
    #[arg(long, env = "GYMHUB_API_URL")]
    pub api_url: Option<String>,

    /// Role used by `login`, `logout` and `whoami`
    #[arg(short, long, default_value = "admin")]
    pub role: Role,

    /// Answer every confirmation with yes
    #[arg(short, long)]
    pub yes: bool,

    /// Subcommand to run (if none, shows the session of every role)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the token for `--role`
    Login {
        email: String,
        /// Password (can also be set via GYMHUB_PASSWORD env var)
        #[arg(long, env = "GYMHUB_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored session for `--role`
    Logout,

    /// Verify the stored session for `--role` against the server
    Whoami,

    /// Member accounts (admin)
    #[command(subcommand)]
    Members(AccountCommands),

    /// Coach accounts (admin)
    #[command(subcommand)]
    Coaches(AccountCommands),

    /// Members assigned to the signed-in coach
    MyMembers(ListArgs),

    /// Membership packages (admin)
    #[command(subcommand)]
    Packages(PackageCommands),

    /// Orders (admin)
    #[command(subcommand)]
    Orders(OrderCommands),

    /// Orders of the signed-in client
    MyOrders(ListArgs),

    /// Reviews: moderation (admin) and submission (client)
    #[command(subcommand)]
    Reviews(ReviewCommands),

    /// Rooms (admin)
    #[command(subcommand)]
    Rooms(RoomCommands),

    /// Facilities (admin)
    #[command(subcommand)]
    Facilities(FacilityCommands),

    /// Anonymous endpoints
    #[command(subcommand)]
    Public(PublicCommands),

    /// Summary of members, packages, orders and reviews (admin)
    Dashboard,

    /// Configuration management commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Paging, sorting and filtering shared by every list
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub limit: Option<u32>,
    /// asc or desc
    #[arg(long)]
    pub sort: Option<SortOrder>,
    /// Case-insensitive search term
    #[arg(short, long)]
    pub search: Option<String>,
    /// Status filter (`all` disables it)
    #[arg(long)]
    pub status: Option<String>,
    /// Category filter (packages)
    #[arg(long)]
    pub category: Option<String>,
}

impl ListArgs {
    fn query(&self) -> ListQuery {
        ListQuery {
            page: self.page,
            limit: self.limit,
            sort_order: self.sort,
            search: self.search.clone(),
            status: self
                .status
                .clone()
                .filter(|s| !s.eq_ignore_ascii_case("all")),
        }
    }

    fn criteria(&self) -> FilterCriteria {
        let mut criteria = FilterCriteria::search(self.search.clone().unwrap_or_default());
        if let Some(status) = &self.status {
            criteria = criteria.with_status(status.clone());
        }
        if let Some(category) = &self.category {
            criteria = criteria.with_category(category.clone());
        }
        criteria
    }
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// List accounts
    List(ListArgs),
    /// Lock an active account
    Lock { id: String },
    /// Reopen a locked account
    Unlock { id: String },
    /// Ban an account for good
    Ban { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PackageCommands {
    /// List packages
    List(ListArgs),
    /// Create a package
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        price: f64,
        /// Duration in days
        #[arg(long)]
        days: u32,
        #[arg(long, default_value = "")]
        category: String,
        /// Comma-separated feature list
        #[arg(long, value_delimiter = ',')]
        features: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Create the package as Inactive
        #[arg(long)]
        inactive: bool,
    },
    /// Flip Active/Inactive
    Toggle { id: String },
    /// Delete a package
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// List orders
    List(ListArgs),
    /// Change order status (Pending, Confirmed, Completed, Cancelled)
    Status { id: String, status: OrderStatus },
    /// Change payment status (Unpaid, Paid, Refunded)
    Payment { id: String, status: PaymentStatus },
}

#[derive(Subcommand, Debug)]
pub enum ReviewCommands {
    /// List reviews
    List(ListArgs),
    /// Approve a pending review
    Approve { id: String },
    /// Reject a review
    Reject { id: String },
    /// Submit a review as the signed-in client
    Submit {
        /// Package being reviewed
        #[arg(long)]
        package: String,
        /// Rating from 1 to 5
        #[arg(long)]
        rating: u8,
        #[arg(long)]
        comment: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum RoomCommands {
    /// List rooms
    List(ListArgs),
    /// Create a room
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        capacity: Option<u32>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change room status (available, unavailable, maintenance)
    Status { id: String, status: RoomStatus },
    /// Delete a room
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum FacilityCommands {
    /// List facilities
    List(ListArgs),
    /// Create a facility
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        quantity: Option<u32>,
        /// Room the facility is placed in
        #[arg(long)]
        room: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Change facility status (Operational, Maintenance, Broken)
    Status { id: String, status: FacilityStatus },
    /// Delete a facility
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PublicCommands {
    /// Packages shown on the landing page
    Packages,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate configuration file
    Check,
}

// ============================================================================
// Console wiring
// ============================================================================

/// Shared handles for one console invocation.
struct Console {
    client: ApiClient,
    storage: Arc<dyn KeyValueStore>,
    decider: Box<dyn Decider>,
}

impl Console {
    fn open(cli: &Cli, config: &Config) -> Result<Self> {
        let settings = ApiSettings::resolve(&config.api, cli.api_url.as_deref());
        debug!(base_url = %settings.base_url, "Resolved API root");

        let client = ApiClient::new(settings)?;
        let storage = FileStore::open(&config.storage.path).with_context(|| {
            format!(
                "Failed to open session storage at {}",
                config.storage.path.display()
            )
        })?;
        let decider: Box<dyn Decider> = if cli.yes {
            Box::new(FixedDecision(UserDecision::Confirm))
        } else {
            Box::new(TerminalDecider)
        };

        Ok(Self {
            client,
            storage: Arc::new(storage),
            decider,
        })
    }

    fn guard(&self, role: Role) -> Arc<SessionGuard> {
        Arc::new(SessionGuard::new(
            self.client.clone(),
            self.storage.clone(),
            role,
        ))
    }

    /// Run the session check every page runs before rendering.
    async fn signed_in(&self, role: Role) -> Result<Arc<SessionGuard>> {
        let guard = self.guard(role);
        match guard.check().await {
            SessionResult::Authenticated(session) => {
                debug!(%role, user = session.profile.display_name(), "Session valid");
                Ok(guard)
            }
            SessionResult::Unauthenticated {
                login_route,
                reason,
            } => {
                let why = reason.map(|r| format!(" ({})", r)).unwrap_or_default();
                anyhow::bail!(
                    "Not signed in as {}{}. Sign in with `gymhub --role {} login <email>` (web: {}).",
                    role,
                    why,
                    role,
                    login_route
                )
            }
            SessionResult::Indeterminate(e) => {
                anyhow::bail!("Could not verify the {} session: {}", role, e)
            }
        }
    }

    fn decider(&self) -> &dyn Decider {
        self.decider.as_ref()
    }
}

/// Asks on the terminal. Anything but `y`/`yes` cancels.
struct TerminalDecider;

#[async_trait]
impl Decider for TerminalDecider {
    async fn decide(&self, prompt: &ConfirmPrompt) -> UserDecision {
        let question = format!(
            "{}{}: {}? [y/N] ",
            if prompt.destructive { "[!!] " } else { "" },
            prompt.action,
            prompt.target
        );
        let answer = tokio::task::spawn_blocking(move || {
            print!("{}", question);
            std::io::stdout().flush().ok()?;
            let mut line = String::new();
            std::io::stdin().read_line(&mut line).ok()?;
            Some(line)
        })
        .await
        .ok()
        .flatten();

        answer.as_deref().map_or(UserDecision::Cancel, parse_answer)
    }
}

fn parse_answer(answer: &str) -> UserDecision {
    match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "c" | "có" => UserDecision::Confirm,
        _ => UserDecision::Cancel,
    }
}

// ============================================================================
// CLI Command Handlers
// ============================================================================

/// Run a CLI command
pub async fn run_command(cli: &Cli, config: &Config) -> Result<()> {
    if let Some(Commands::Config(ConfigCommands::Check)) = &cli.command {
        return cmd_config_check(cli).await;
    }

    let console = Console::open(cli, config)?;
    match &cli.command {
        None => cmd_status(&console).await,
        Some(Commands::Login { email, password }) => {
            cmd_login(&console, cli.role, email, password).await
        }
        Some(Commands::Logout) => cmd_logout(&console, cli.role),
        Some(Commands::Whoami) => cmd_whoami(&console, cli.role).await,
        Some(Commands::Members(cmd)) => {
            let guard = console.signed_in(Role::Admin).await?;
            cmd_accounts(&console, accounts::members(guard), cmd).await
        }
        Some(Commands::Coaches(cmd)) => {
            let guard = console.signed_in(Role::Admin).await?;
            cmd_accounts(&console, accounts::coaches(guard), cmd).await
        }
        Some(Commands::MyMembers(args)) => {
            let guard = console.signed_in(Role::Coach).await?;
            let res = accounts::assigned_members(guard);
            list(&res, args).await?;
            print_accounts(&res, args, |m| m.detail());
            Ok(())
        }
        Some(Commands::Packages(cmd)) => cmd_packages(&console, cmd).await,
        Some(Commands::Orders(cmd)) => cmd_orders(&console, cmd).await,
        Some(Commands::MyOrders(args)) => cmd_my_orders(&console, args).await,
        Some(Commands::Reviews(cmd)) => cmd_reviews(&console, cmd).await,
        Some(Commands::Rooms(cmd)) => cmd_rooms(&console, cmd).await,
        Some(Commands::Facilities(cmd)) => cmd_facilities(&console, cmd).await,
        Some(Commands::Public(PublicCommands::Packages)) => cmd_public_packages(&console).await,
        Some(Commands::Dashboard) => cmd_dashboard(&console).await,
        Some(Commands::Config(ConfigCommands::Check)) => Ok(()),
    }
}

/// Stored session of every role, without asking the server
async fn cmd_status(console: &Console) -> Result<()> {
    println!();
    println!("{:<8}  {:<10}  {:<30}", "ROLE", "TOKEN", "USER");
    println!("{}", "-".repeat(52));
    for role in Role::ALL {
        let guard = console.guard(role);
        let store = guard.store();
        let has_token = store.token()?.is_some();
        let user = store
            .profile()
            .map(|p| p.display_name().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8}  {:<10}  {:<30}",
            role.to_string(),
            if has_token { "stored" } else { "none" },
            truncate(&user, 30)
        );
    }
    println!();
    println!("Run `gymhub --help` for the list of pages.");
    Ok(())
}

async fn cmd_login(console: &Console, role: Role, email: &str, password: &str) -> Result<()> {
    let guard = console.guard(role);
    let session = guard
        .login(email, password)
        .await
        .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
    println!(
        "[OK] Signed in as {} ({})",
        session.profile.display_name(),
        role
    );
    Ok(())
}

fn cmd_logout(console: &Console, role: Role) -> Result<()> {
    console
        .guard(role)
        .logout()
        .context("Failed to clear session")?;
    println!("[OK] Signed out of {}", role);
    Ok(())
}

async fn cmd_whoami(console: &Console, role: Role) -> Result<()> {
    match console.guard(role).check().await {
        SessionResult::Authenticated(session) => {
            let profile = &session.profile;
            println!("Role:   {}", role);
            println!("Name:   {}", profile.display_name());
            println!("Email:  {}", profile.email.as_deref().unwrap_or("-"));
            if let Some(id) = &profile.id {
                println!("ID:     {}", id);
            }
            Ok(())
        }
        SessionResult::Unauthenticated {
            login_route,
            reason,
        } => {
            match reason {
                Some(reason) => println!("[!!] Session cleared: {}", reason),
                None => println!("Not signed in as {}.", role),
            }
            println!("Login page: {}", login_route);
            Ok(())
        }
        SessionResult::Indeterminate(e) => {
            anyhow::bail!("Could not verify the {} session: {}", role, e)
        }
    }
}

async fn cmd_accounts<T>(console: &Console, res: Resource<T>, cmd: &AccountCommands) -> Result<()>
where
    T: Entity + AccountHolder + DeserializeOwned + Filterable + Labelled + AccountRow,
{
    let (id, target) = match cmd {
        AccountCommands::List(args) => {
            list(&res, args).await?;
            print_accounts(&res, args, T::detail);
            return Ok(());
        }
        AccountCommands::Lock { id } => (id, AccountStatus::Inactive),
        AccountCommands::Unlock { id } => (id, AccountStatus::Active),
        AccountCommands::Ban { id } => (id, AccountStatus::Banned),
    };

    load_all(&res).await?;
    let outcome = res
        .change_account_status(&EntityId::from(id.as_str()), target, console.decider())
        .await?;
    report(outcome, &format!("Account is now {}", target))
}

async fn cmd_packages(console: &Console, cmd: &PackageCommands) -> Result<()> {
    let res = packages::packages(console.signed_in(Role::Admin).await?);
    match cmd {
        PackageCommands::List(args) => {
            list(&res, args).await?;
            print_view(
                res.view(&args.criteria()),
                format!(
                    "{:<26}  {:<28}  {:>14}  {:>6}  {:<16}  {:<8}",
                    "ID", "NAME", "PRICE", "DAYS", "CATEGORY", "STATUS"
                ),
                108,
                |p| {
                    format!(
                        "{:<26}  {:<28}  {:>14}  {:>6}  {:<16}  {:<8}",
                        truncate(p.id.as_str(), 26),
                        truncate(&p.name, 28),
                        format_amount(p.price),
                        p.duration_in_days,
                        truncate(&p.category, 16),
                        p.status.to_string()
                    )
                },
            );
            let categories = packages::categories(&res.collection().items());
            if !categories.is_empty() {
                println!("Categories: {}", categories.join(", "));
            }
            print_pagination(&res);
            Ok(())
        }
        PackageCommands::Create {
            name,
            price,
            days,
            category,
            features,
            description,
            inactive,
        } => {
            let draft = PackageDraft {
                name: name.clone(),
                price: *price,
                duration_in_days: *days,
                category: category.clone(),
                features: features.clone(),
                description: description.clone(),
                status: if *inactive {
                    PackageStatus::Inactive
                } else {
                    PackageStatus::Active
                },
            };
            let created = res
                .create_package(&draft)
                .await
                .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
            match created {
                Some(p) => println!("[OK] Created package {} ({})", p.name, p.id),
                None => println!("[OK] Created package {}", draft.name),
            }
            Ok(())
        }
        PackageCommands::Toggle { id } => {
            load_all(&res).await?;
            let package = res
                .toggle_status(&EntityId::from(id.as_str()))
                .await
                .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
            println!("[OK] {} is now {}", package.name, package.status);
            Ok(())
        }
        PackageCommands::Delete { id } => {
            load_all(&res).await?;
            let outcome = res
                .delete(&EntityId::from(id.as_str()), console.decider())
                .await?;
            report(outcome, "Deleted")
        }
    }
}

async fn cmd_orders(console: &Console, cmd: &OrderCommands) -> Result<()> {
    let res = orders::orders(console.signed_in(Role::Admin).await?);
    match cmd {
        OrderCommands::List(args) => {
            list(&res, args).await?;
            print_orders(res.view(&args.criteria()));
            print_pagination(&res);
            Ok(())
        }
        OrderCommands::Status { id, status } => {
            load_all(&res).await?;
            let outcome = res
                .change_order_status(&EntityId::from(id.as_str()), *status, console.decider())
                .await?;
            report(outcome, &format!("Order is now {}", status))
        }
        OrderCommands::Payment { id, status } => {
            load_all(&res).await?;
            let outcome = res
                .change_payment_status(&EntityId::from(id.as_str()), *status, console.decider())
                .await?;
            report(outcome, &format!("Payment is now {}", status))
        }
    }
}

async fn cmd_my_orders(console: &Console, args: &ListArgs) -> Result<()> {
    let res = portal::my_orders(console.signed_in(Role::Client).await?);
    list(&res, args).await?;
    print_orders(res.view(&args.criteria()));
    println!(
        "Outstanding: {}",
        format_amount(portal::outstanding_balance(&res.collection().items()))
    );
    Ok(())
}

async fn cmd_reviews(console: &Console, cmd: &ReviewCommands) -> Result<()> {
    if let ReviewCommands::Submit {
        package,
        rating,
        comment,
    } = cmd
    {
        let guard = console.signed_in(Role::Client).await?;
        let draft = ReviewDraft {
            package_id: EntityId::from(package.as_str()),
            rating: *rating,
            comment: comment.clone(),
        };
        let created = reviews::submit_review(&guard, &draft)
            .await
            .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
        match created {
            Some(review) => println!("[OK] Review {} submitted ({})", review.id, review.status),
            None => println!("[OK] Review submitted"),
        }
        return Ok(());
    }

    let res = reviews::reviews(console.signed_in(Role::Admin).await?);
    match cmd {
        ReviewCommands::List(args) => {
            list(&res, args).await?;
            print_view(
                res.view(&args.criteria()),
                format!(
                    "{:<26}  {:<24}  {:<6}  {:<10}  {:<36}",
                    "ID", "CLIENT", "RATING", "STATUS", "COMMENT"
                ),
                110,
                |r| {
                    let client = r
                        .client
                        .as_ref()
                        .and_then(Linked::populated)
                        .and_then(|c| c.name.as_deref())
                        .unwrap_or("-");
                    format!(
                        "{:<26}  {:<24}  {:<6}  {:<10}  {:<36}",
                        truncate(r.id.as_str(), 26),
                        truncate(client, 24),
                        format!("{}/5", r.rating),
                        r.status.to_string(),
                        truncate(&r.comment, 36)
                    )
                },
            );
            if let Some(avg) = reviews::average_rating(&res.collection().items()) {
                println!("Average approved rating: {:.1}", avg);
            }
            print_pagination(&res);
            Ok(())
        }
        ReviewCommands::Approve { id } => {
            load_all(&res).await?;
            let outcome = res
                .approve(&EntityId::from(id.as_str()), console.decider())
                .await?;
            report(outcome, "Approved")
        }
        ReviewCommands::Reject { id } => {
            load_all(&res).await?;
            let outcome = res
                .reject(&EntityId::from(id.as_str()), console.decider())
                .await?;
            report(outcome, "Rejected")
        }
        ReviewCommands::Submit { .. } => Ok(()),
    }
}

async fn cmd_rooms(console: &Console, cmd: &RoomCommands) -> Result<()> {
    let session = console.signed_in(Role::Admin).await?;
    let res = rooms::rooms(session.clone());
    match cmd {
        RoomCommands::List(args) => {
            list(&res, args).await?;
            let facilities = match rooms::facilities(session).load(&ListQuery::default()).await {
                Ok(facilities) => Some(facilities),
                Err(e) => {
                    debug!(error = %e, "Facility counts unavailable");
                    None
                }
            };
            print_view(
                res.view(&args.criteria()),
                format!(
                    "{:<26}  {:<24}  {:>8}  {:<20}  {:>10}  {:<12}",
                    "ID", "NAME", "CAPACITY", "LOCATION", "FACILITIES", "STATUS"
                ),
                110,
                |r| {
                    format!(
                        "{:<26}  {:<24}  {:>8}  {:<20}  {:>10}  {:<12}",
                        truncate(r.id.as_str(), 26),
                        truncate(&r.name, 24),
                        r.capacity.map_or("-".to_string(), |c| c.to_string()),
                        truncate(r.location.as_deref().unwrap_or("-"), 20),
                        facilities.as_deref().map_or("-".to_string(), |all| {
                            rooms::facilities_in(all, &r.id).len().to_string()
                        }),
                        r.status.to_string()
                    )
                },
            );
            Ok(())
        }
        RoomCommands::Create {
            name,
            capacity,
            location,
            description,
        } => {
            let draft = RoomDraft {
                name: name.clone(),
                capacity: *capacity,
                location: location.clone(),
                description: description.clone(),
                status: RoomStatus::Available,
            };
            let created = res
                .create_room(&draft)
                .await
                .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
            match created {
                Some(room) => println!("[OK] Created room {} ({})", room.name, room.id),
                None => println!("[OK] Created room {}", draft.name),
            }
            Ok(())
        }
        RoomCommands::Status { id, status } => {
            load_all(&res).await?;
            let outcome = res
                .change_room_status(&EntityId::from(id.as_str()), *status, console.decider())
                .await?;
            report(outcome, &format!("Room is now {}", status))
        }
        RoomCommands::Delete { id } => {
            load_all(&res).await?;
            let outcome = res
                .delete(&EntityId::from(id.as_str()), console.decider())
                .await?;
            report(outcome, "Deleted")
        }
    }
}

async fn cmd_facilities(console: &Console, cmd: &FacilityCommands) -> Result<()> {
    let res = rooms::facilities(console.signed_in(Role::Admin).await?);
    match cmd {
        FacilityCommands::List(args) => {
            list(&res, args).await?;
            print_view(
                res.view(&args.criteria()),
                format!(
                    "{:<26}  {:<24}  {:>4}  {:<24}  {:<12}",
                    "ID", "NAME", "QTY", "ROOM", "STATUS"
                ),
                98,
                |f| {
                    let room = match &f.room {
                        Some(Linked::Populated(r)) => {
                            r.name.clone().unwrap_or_else(|| r.id.to_string())
                        }
                        Some(Linked::Id(id)) => id.to_string(),
                        None => "-".to_string(),
                    };
                    format!(
                        "{:<26}  {:<24}  {:>4}  {:<24}  {:<12}",
                        truncate(f.id.as_str(), 26),
                        truncate(&f.name, 24),
                        f.quantity.map_or("-".to_string(), |q| q.to_string()),
                        truncate(&room, 24),
                        f.status.to_string()
                    )
                },
            );
            Ok(())
        }
        FacilityCommands::Create {
            name,
            quantity,
            room,
            description,
        } => {
            let draft = FacilityDraft {
                name: name.clone(),
                quantity: *quantity,
                room_id: room.as_deref().map(EntityId::from),
                description: description.clone(),
                status: FacilityStatus::Operational,
            };
            let created = res
                .create_facility(&draft)
                .await
                .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
            match created {
                Some(f) => println!("[OK] Created facility {} ({})", f.name, f.id),
                None => println!("[OK] Created facility {}", draft.name),
            }
            Ok(())
        }
        FacilityCommands::Status { id, status } => {
            load_all(&res).await?;
            let outcome = res
                .change_facility_status(&EntityId::from(id.as_str()), *status, console.decider())
                .await?;
            report(outcome, &format!("Facility is now {}", status))
        }
        FacilityCommands::Delete { id } => {
            load_all(&res).await?;
            let outcome = res
                .delete(&EntityId::from(id.as_str()), console.decider())
                .await?;
            report(outcome, "Deleted")
        }
    }
}

async fn cmd_public_packages(console: &Console) -> Result<()> {
    let packages = public::featured_packages(&console.client).await;
    let active = packages::active_only(&packages);
    if active.is_empty() {
        println!("No packages available.");
        return Ok(());
    }

    println!();
    println!("{:<28}  {:>14}  {:>6}  {:<40}", "NAME", "PRICE", "DAYS", "FEATURES");
    println!("{}", "-".repeat(94));
    for p in active {
        println!(
            "{:<28}  {:>14}  {:>6}  {:<40}",
            truncate(&p.name, 28),
            format_amount(p.price),
            p.duration_in_days,
            truncate(&p.features.join(", "), 40)
        );
    }
    println!();
    Ok(())
}

async fn cmd_dashboard(console: &Console) -> Result<()> {
    let guard = console.signed_in(Role::Admin).await?;
    let summary = dashboard::load_summary(guard)
        .await
        .map_err(|e| anyhow::anyhow!(e.banner_message()))?;

    println!();
    println!("=== Dashboard ===");
    println!();
    println!("Accounts:");
    for (label, counts) in [("Members", summary.members), ("Coaches", summary.coaches)] {
        println!(
            "  {:<10}  {} total, {} active, {} locked, {} banned",
            label,
            counts.total(),
            counts.active,
            counts.inactive,
            counts.banned
        );
    }
    println!();
    println!(
        "Packages:     {} active, {} inactive",
        summary.active_packages, summary.inactive_packages
    );
    println!();
    println!("Orders:");
    for (status, count) in &summary.orders_by_status {
        println!("  {:<10}  {}", status, count);
    }
    println!();
    println!("Revenue:      {}", format_amount(summary.paid_revenue));
    for (month, amount) in &summary.revenue_by_month {
        println!("  {}     {}", month, format_amount(*amount));
    }
    println!();
    println!(
        "Reviews:      {} pending, average {}",
        summary.pending_reviews,
        summary
            .average_rating
            .map_or("-".to_string(), |a| format!("{:.1}", a))
    );
    println!();
    Ok(())
}

/// Validate configuration file
async fn cmd_config_check(cli: &Cli) -> Result<()> {
    let config_path = &cli.config;

    println!("Checking configuration file: {}", config_path.display());
    println!();

    if !config_path.exists() {
        println!(
            "[!!] Configuration file not found: {}",
            config_path.display()
        );
        println!();
        println!("Defaults will be used. To customise, copy gymhub.example.toml to gymhub.toml");
        return Ok(());
    }

    match Config::load(config_path) {
        Ok(config) => {
            let settings = ApiSettings::resolve(&config.api, cli.api_url.as_deref());
            println!("[OK] Configuration file is valid!");
            println!();
            println!("=== Configuration Summary ===");
            println!();
            println!("API:");
            println!("  Base URL:     {}", settings.base_url);
            println!("  Timeout:      {}s", settings.request_timeout.as_secs());
            println!("  Soft timeout: {}s", settings.soft_timeout.as_secs());
            println!();
            println!("Storage:");
            println!("  Session file: {}", config.storage.path.display());
            println!();
            println!("Logging:");
            println!("  Level:        {}", config.logging.level);
            Ok(())
        }
        Err(e) => {
            println!("[!!] Configuration file is invalid!");
            println!();
            println!("Error: {:#}", e);
            anyhow::bail!("Configuration validation failed")
        }
    }
}

// ============================================================================
// Rendering helpers
// ============================================================================

/// Columns that differ between member and coach tables.
trait AccountRow {
    fn contact(&self) -> (Option<&str>, Option<&str>);
    fn detail(&self) -> String;
}

impl AccountRow for Member {
    fn contact(&self) -> (Option<&str>, Option<&str>) {
        (self.email.as_deref(), self.phone.as_deref())
    }

    fn detail(&self) -> String {
        self.gender.clone().unwrap_or_else(|| "-".to_string())
    }
}

impl AccountRow for Coach {
    fn contact(&self) -> (Option<&str>, Option<&str>) {
        (self.email.as_deref(), self.phone.as_deref())
    }

    fn detail(&self) -> String {
        match (&self.specialty, self.experience) {
            (Some(s), Some(years)) => format!("{} ({}y)", s, years),
            (Some(s), None) => s.clone(),
            (None, Some(years)) => format!("{}y", years),
            (None, None) => "-".to_string(),
        }
    }
}

async fn list<T>(res: &Resource<T>, args: &ListArgs) -> Result<()>
where
    T: Entity + DeserializeOwned + Filterable + Labelled,
{
    res.load(&args.query())
        .await
        .map_err(|e| anyhow::anyhow!(e.banner_message()))?;
    Ok(())
}

/// Actions look their target up in the loaded list, as on the web pages.
async fn load_all<T>(res: &Resource<T>) -> Result<()>
where
    T: Entity + DeserializeOwned + Filterable + Labelled,
{
    list(res, &ListArgs::default()).await
}

fn print_accounts<T>(res: &Resource<T>, args: &ListArgs, detail: impl Fn(&T) -> String)
where
    T: Entity + AccountHolder + DeserializeOwned + Filterable + Labelled + AccountRow,
{
    print_view(
        res.view(&args.criteria()),
        format!(
            "{:<26}  {:<24}  {:<28}  {:<12}  {:<16}  {:<8}",
            "ID", "NAME", "EMAIL", "PHONE", "DETAIL", "STATUS"
        ),
        124,
        |a| {
            let (email, phone) = a.contact();
            format!(
                "{:<26}  {:<24}  {:<28}  {:<12}  {:<16}  {:<8}",
                truncate(a.id().as_str(), 26),
                truncate(&a.label(), 24),
                truncate(email.unwrap_or("-"), 28),
                truncate(phone.unwrap_or("-"), 12),
                truncate(&detail(a), 16),
                a.account_status().to_string()
            )
        },
    );
    print_pagination(res);
}

fn print_orders(view: ListView<Order>) {
    print_view(
        view,
        format!(
            "{:<26}  {:<24}  {:>14}  {:<10}  {:<10}  {:<10}",
            "ID", "CLIENT", "TOTAL", "DATE", "STATUS", "PAYMENT"
        ),
        104,
        |o| {
            let date = o
                .order_date_parsed()
                .map_or("-".to_string(), |d| d.format("%Y-%m-%d").to_string());
            format!(
                "{:<26}  {:<24}  {:>14}  {:<10}  {:<10}  {:<10}",
                truncate(o.id.as_str(), 26),
                truncate(o.client_name().unwrap_or("-"), 24),
                format_amount(o.total_amount),
                date,
                o.status.to_string(),
                o.payment_status.to_string()
            )
        },
    );
}

fn print_view<T>(view: ListView<T>, header: String, width: usize, row: impl Fn(&T) -> String) {
    let rows = match view {
        ListView::Rows(rows) => rows,
        other => {
            println!("{}", other.message().unwrap_or_default());
            return;
        }
    };

    println!();
    println!("{}", header);
    println!("{}", "-".repeat(width));
    for item in &rows {
        println!("{}", row(item));
    }
    println!();
}

fn print_pagination<T>(res: &Resource<T>)
where
    T: Entity + DeserializeOwned + Filterable + Labelled,
{
    if let Some(p) = res.loader().pagination() {
        println!(
            "Page {}/{} ({} results)",
            p.current_page, p.total_pages, p.total_results
        );
    }
}

fn report<T: Labelled>(outcome: GateOutcome<T>, done: &str) -> Result<()> {
    match outcome {
        GateOutcome::Completed(record) => {
            println!("[OK] {}: {}", done, record.label());
            Ok(())
        }
        GateOutcome::Cancelled => {
            println!("Cancelled, nothing was sent.");
            Ok(())
        }
        GateOutcome::Failed(e) => anyhow::bail!(e.banner_message()),
    }
}

/// Format an amount with thousands separators, e.g. `1,250,000 ₫`
fn format_amount(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    if rounded < 0 {
        out.insert(0, '-');
    }
    format!("{} ₫", out)
}

/// Truncate a string to a max number of characters
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
