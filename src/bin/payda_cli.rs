use std::{collections::HashSet, str::FromStr, sync::Arc, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use payda_client::{
    api::{HttpBackend, PaydaBackend},
    config::{self, ClientConfig},
    dashboard::{
        CouponTypeGroup, CurrentUser, Dashboard, DashboardSession, NeedDetail, ViewFilter,
    },
    display::{censor_name, format_lira, format_percent},
    errors::ClientError,
    models::{Coupon, Donation, Need, NewNeed},
    notifications::Notification,
    preferences::{PreferenceStore, Theme},
    reference::{self, ALL_CATEGORIES},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize(cli.user_id)?;

    let outcome = match cli.command {
        Commands::Items(args) => handle_items(&context, args, cli.json).await,
        Commands::Needs(command) => handle_needs_command(&context, command, cli.json).await,
        Commands::Coupons(command) => handle_coupons_command(&context, command, cli.json).await,
        Commands::Donations => handle_donations(&context, cli.json).await,
        Commands::Categories(args) => handle_categories(args, cli.json),
        Commands::Theme(command) => handle_theme_command(&context, command, cli.json),
        Commands::Watch(args) => handle_watch(&context, args).await,
    };

    // Backend and validation messages are meant for the person at the terminal
    outcome.map_err(|err| match err.downcast::<ClientError>() {
        Ok(client_err) => anyhow!(client_err.user_message()),
        Err(other) => other,
    })
}

#[derive(Parser)]
#[command(name = "payda", about = "PAYDA donation and coupon dashboard", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[arg(long, global = true, help = "Act as this user id (required for claims and needs)")]
    user_id: Option<i64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Coupon types on the showcase, grouped by type
    Items(ItemsArgs),
    #[command(subcommand)]
    Needs(NeedsCommands),
    #[command(subcommand)]
    Coupons(CouponsCommands),
    /// Coupon donations, newest first
    Donations,
    Categories(CategoriesArgs),
    #[command(subcommand)]
    Theme(ThemeCommands),
    /// Poll the backend and print notifications as they arrive
    Watch(WatchArgs),
}

#[derive(Args)]
struct FilterArgs {
    #[arg(long, help = "Case-insensitive search term")]
    search: Option<String>,
    #[arg(long, default_value = ALL_CATEGORIES, help = "Category id, or 'all'")]
    category: String,
}

impl FilterArgs {
    fn to_filter(&self) -> ViewFilter {
        ViewFilter::new(self.search.clone().unwrap_or_default(), self.category.clone())
    }
}

#[derive(Args)]
struct ItemsArgs {
    #[command(flatten)]
    filter: FilterArgs,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "List individual showcase rows instead of coupon types"
    )]
    flat: bool,
}

#[derive(Subcommand)]
enum NeedsCommands {
    List(FilterArgs),
    Get(GetNeedArgs),
    Create(CreateNeedArgs),
}

#[derive(Args)]
struct GetNeedArgs {
    #[arg(help = "Need id")]
    id: i64,
}

#[derive(Args)]
struct CreateNeedArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, help = "Category id, e.g. kirtasiye")]
    category: String,
    #[arg(long, help = "Target amount in lira")]
    amount: String,
}

#[derive(Subcommand)]
enum CouponsCommands {
    /// Coupons held by the current user
    Mine,
    Claim(ClaimArgs),
    Use(UseArgs),
}

#[derive(Args)]
struct ClaimArgs {
    #[arg(help = "Coupon type id")]
    coupon_type_id: i64,
}

#[derive(Args)]
struct UseArgs {
    #[arg(help = "Coupon id")]
    coupon_id: i64,
}

#[derive(Args)]
struct CategoriesArgs {
    #[arg(long, help = "Show the sub-categories of this category")]
    parent: Option<String>,
}

#[derive(Subcommand)]
enum ThemeCommands {
    Show,
    Set(SetThemeArgs),
}

#[derive(Args)]
struct SetThemeArgs {
    #[arg(help = "default, blue, green, orange or purple")]
    theme: String,
}

#[derive(Args)]
struct WatchArgs {
    #[arg(long, help = "Stop after this many seconds instead of waiting for Ctrl-C")]
    seconds: Option<u64>,
}

struct CliContext {
    config: ClientConfig,
    backend: Arc<dyn PaydaBackend>,
    user: Option<CurrentUser>,
}

impl CliContext {
    fn initialize(user_id: Option<i64>) -> Result<Self> {
        let config = config::load_config().context("failed to load client config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let backend = HttpBackend::from_config(&config)
            .with_context(|| format!("invalid backend address {}", config.api_base_url))?;
        debug!(base_url = %config.api_base_url, "backend configured");

        Ok(Self {
            config,
            backend: Arc::new(backend),
            user: user_id.map(CurrentUser::new),
        })
    }

    /// A loaded, non-polling session for one-shot commands.
    async fn session(&self) -> Arc<DashboardSession> {
        let session =
            DashboardSession::new(Arc::clone(&self.backend), self.config.clone(), self.user.clone());
        session.refresh().await;
        session
    }

    fn preference_store(&self) -> Result<PreferenceStore> {
        self.config
            .preferences_file()
            .map(PreferenceStore::new)
            .ok_or_else(|| anyhow!("no suitable location for the preferences file"))
    }
}

async fn handle_items(context: &CliContext, args: ItemsArgs, json: bool) -> Result<()> {
    let session = context.session().await;
    let filter = args.filter.to_filter();

    if args.flat {
        let items = session.items(&filter).await;
        if json {
            return print_json(&items);
        }
        for item in &items {
            println!(
                "- Item {} • {} • {} • {} / {} • {} available",
                item.id,
                item.title,
                item.company,
                format_lira(item.collected),
                format_lira(item.total_amount),
                item.available_coupons
            );
        }
        return Ok(());
    }

    let groups = session.coupon_groups(&filter).await;
    let claimed = session.claimed_types().await;
    session.close();

    if json {
        return print_json(&groups);
    }
    if groups.is_empty() {
        println!("No coupon types match.");
    }
    for group in &groups {
        render_group(group, &claimed);
    }
    Ok(())
}

async fn handle_needs_command(
    context: &CliContext,
    command: NeedsCommands,
    json: bool,
) -> Result<()> {
    match command {
        NeedsCommands::List(filter) => {
            let session = context.session().await;
            let needs = session.needs(&filter.to_filter()).await;
            if json {
                return print_json(&needs);
            }
            if needs.is_empty() {
                println!("No active needs.");
            }
            for need in &needs {
                render_need(need);
            }
        }
        NeedsCommands::Get(args) => {
            let session = context.session().await;
            let detail = session.need_detail(args.id).await?;
            if json {
                return print_json(&detail);
            }
            render_need_detail(&detail);
        }
        NeedsCommands::Create(args) => {
            let target_amount = Decimal::from_str(args.amount.trim())
                .with_context(|| format!("'{}' is not a valid amount", args.amount))?;
            let session = context.session().await;
            let created = session
                .create_need(NewNeed {
                    user_id: 0,
                    title: args.title,
                    description: args.description,
                    category: args.category,
                    target_amount,
                })
                .await?;
            if json {
                return print_json(&created);
            }
            println!(
                "Need {} created • {} • target {}",
                created.id,
                created.title,
                format_lira(created.target_amount)
            );
        }
    }
    Ok(())
}

async fn handle_coupons_command(
    context: &CliContext,
    command: CouponsCommands,
    json: bool,
) -> Result<()> {
    let session = context.session().await;

    let result = match command {
        CouponsCommands::Mine => {
            if context.user.is_none() {
                return Err(ClientError::MissingUser.into());
            }
            let coupons = session.snapshot().await.my_coupons;
            if json {
                print_json(&coupons)
            } else {
                if coupons.is_empty() {
                    println!("You do not hold any coupons yet.");
                }
                coupons.iter().for_each(render_coupon);
                Ok(())
            }
        }
        CouponsCommands::Claim(args) => {
            let coupon = session.claim_coupon(args.coupon_type_id).await?;
            if json {
                print_json(&coupon)
            } else {
                println!("Claimed coupon {} of type {}", coupon.id, coupon.coupon_type_id);
                Ok(())
            }
        }
        CouponsCommands::Use(args) => {
            let outcome = session.use_coupon(args.coupon_id).await?;
            if json {
                print_json(&outcome)
            } else {
                println!(
                    "{}",
                    outcome
                        .message
                        .unwrap_or_else(|| format!("Coupon {} used", args.coupon_id))
                );
                Ok(())
            }
        }
    };

    session.close();
    result
}

async fn handle_donations(context: &CliContext, json: bool) -> Result<()> {
    let session = context.session().await;
    let state = session.snapshot().await;
    if json {
        return print_json(&state.coupon_donations);
    }
    for donation in &state.coupon_donations {
        render_donation(donation);
    }
    println!(
        "Total: {}",
        format_lira(session.total_coupon_donations().await)
    );
    Ok(())
}

fn handle_categories(args: CategoriesArgs, json: bool) -> Result<()> {
    let categories = match args.parent.as_deref() {
        Some(parent) => {
            reference::find_category(parent)
                .ok_or_else(|| anyhow!("unknown category '{}'", parent))?;
            reference::sub_categories(parent)
        }
        None => reference::CATEGORIES,
    };

    if json {
        return print_json(&categories);
    }
    for category in categories {
        println!("- {} • {}", category.id, category.label);
    }
    Ok(())
}

fn handle_theme_command(context: &CliContext, command: ThemeCommands, json: bool) -> Result<()> {
    let store = context.preference_store()?;
    let theme = match command {
        ThemeCommands::Show => store.theme()?,
        ThemeCommands::Set(args) => {
            let theme = Theme::from_str(&args.theme)?;
            store
                .set_theme(theme)
                .with_context(|| format!("failed writing {}", store.path().display()))?;
            theme
        }
    };

    if json {
        #[derive(Serialize)]
        struct ThemeOutput {
            app_theme: Theme,
        }
        return print_json(&ThemeOutput { app_theme: theme });
    }
    println!("Theme: {}", theme);
    Ok(())
}

async fn handle_watch(context: &CliContext, args: WatchArgs) -> Result<()> {
    let dashboard = Dashboard::open(
        Arc::clone(&context.backend),
        context.config.clone(),
        context.user.clone(),
    )
    .await;
    let mut feed = dashboard.session().notifications().lock().await.subscribe();

    let deadline = async {
        match args.seconds {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    println!(
        "Watching {} every {} ms (Ctrl-C to stop)",
        context.config.api_base_url, context.config.poll_interval_ms
    );
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = &mut deadline => break,
            received = feed.recv() => match received {
                Ok(notification) => render_notification(&notification),
                Err(RecvError::Lagged(skipped)) => eprintln!("({} notifications skipped)", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    dashboard.close();
    Ok(())
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_group(group: &CouponTypeGroup, claimed: &HashSet<i64>) {
    let item = &group.coupon_type;
    let marker = if claimed.contains(&group.type_id()) {
        " • claimed"
    } else if group.is_claimable() && group.available_coupons > 0 {
        " • claimable"
    } else {
        ""
    };
    println!(
        "- Coupon type {} • {} • {} • {} available / {} issued • {} of {}{}",
        group.type_id(),
        item.title,
        item.company,
        group.available_coupons,
        group.coupon_count,
        format_lira(item.collected),
        format_lira(item.total_amount),
        marker
    );
}

fn render_need(need: &Need) {
    println!(
        "- Need {} • {} • {} • {} of {} ({})",
        need.id,
        need.title,
        need.category,
        format_lira(need.current_amount),
        format_lira(need.target_amount),
        format_percent(need.progress())
    );
}

fn render_need_detail(detail: &NeedDetail) {
    let need = &detail.need;
    render_need(need);
    if let Some(owner) = &need.user_name {
        println!("  Requested by {}", censor_name(owner));
    }
    if let Some(description) = &need.description {
        println!("  {}", description);
    }
    println!(
        "  Status {} • remaining {}",
        need.status,
        format_lira(need.remaining())
    );
    if detail.recent_donations.is_empty() {
        println!("  No donations yet.");
    }
    for donation in &detail.recent_donations {
        println!(
            "  • {} from donor #{}",
            format_lira(donation.amount),
            donation.user_id
        );
    }
}

fn render_coupon(coupon: &Coupon) {
    println!(
        "- Coupon {} • {} • {} • {}",
        coupon.id,
        coupon
            .coupon_type_name
            .as_deref()
            .unwrap_or("(unnamed coupon type)"),
        coupon.merchant_name.as_deref().unwrap_or("-"),
        coupon.status
    );
}

fn render_donation(donation: &Donation) {
    let when = donation
        .created_at
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "- {} • {} • coupon type {} • donor #{}",
        when,
        format_lira(donation.amount),
        donation.coupon_type_id.unwrap_or_default(),
        donation.user_id
    );
}

fn render_notification(notification: &Notification) {
    println!(
        "[{}] {}: {}",
        notification.kind, notification.title, notification.message
    );
}
