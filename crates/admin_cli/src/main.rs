use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{CreateUserCmd, Engine, LedgerCmd, Money, Profile, PurgeCmd, Role};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "ketzal_admin")]
#[command(about = "Admin utilities for Ketzal (users, purge, wallets, posts)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./ketzal.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Wallet(Wallet),
    Post(Post),
}

/// The admin running the command. Its password is always prompted.
#[derive(Args, Debug)]
struct Acting {
    #[arg(long, env = "KETZAL_ADMIN_EMAIL")]
    admin_email: String,
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    /// Create the first admin. Refused once any admin exists.
    Bootstrap(BootstrapArgs),
    Create(UserCreateArgs),
    Role(RoleArgs),
    /// Show what purging a user would remove.
    Impact(TargetArgs),
    Purge(PurgeArgs),
    /// Set a new password on the user's identity.
    ResetPassword(TargetArgs),
}

#[derive(Args, Debug)]
struct BootstrapArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: Option<String>,
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[command(flatten)]
    acting: Acting,
    #[arg(long)]
    email: String,
    #[arg(long)]
    username: String,
    #[arg(long)]
    full_name: Option<String>,
    #[arg(long, default_value = "traveler", value_parser = parse_role)]
    role: Role,
}

#[derive(Args, Debug)]
struct RoleArgs {
    #[command(flatten)]
    acting: Acting,
    #[arg(long)]
    user_id: Uuid,
    #[arg(long, value_parser = parse_role)]
    role: Role,
}

#[derive(Args, Debug)]
struct TargetArgs {
    #[command(flatten)]
    acting: Acting,
    #[arg(long)]
    user_id: Uuid,
}

#[derive(Args, Debug)]
struct PurgeArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Confirm the deletion.
    #[arg(long)]
    yes: bool,
}

#[derive(Args, Debug)]
struct Post {
    #[command(subcommand)]
    command: PostCommand,
}

#[derive(Subcommand, Debug)]
enum PostCommand {
    /// Remove a post with its comments and likes.
    Delete(PostDeleteArgs),
}

#[derive(Args, Debug)]
struct PostDeleteArgs {
    #[command(flatten)]
    acting: Acting,
    #[arg(long)]
    post_id: Uuid,
}

#[derive(Args, Debug)]
struct Wallet {
    #[command(subcommand)]
    command: WalletCommand,
}

#[derive(Subcommand, Debug)]
enum WalletCommand {
    Deposit(MovementArgs),
    Withdraw(WithdrawArgs),
}

#[derive(Args, Debug)]
struct MovementArgs {
    #[command(flatten)]
    target: TargetArgs,
    /// Decimal amount, e.g. `150.00`.
    #[arg(long, value_parser = parse_money)]
    amount: Money,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args, Debug)]
struct WithdrawArgs {
    #[command(flatten)]
    movement: MovementArgs,
    /// Confirm the withdrawal.
    #[arg(long)]
    yes: bool,
}

fn parse_role(raw: &str) -> Result<Role, String> {
    Role::try_from(raw).map_err(|err| err.to_string())
}

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

struct RawModeGuard;

impl RawModeGuard {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn notice(message: &str) -> CliResult<()> {
    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(message),
        Print("\r\n")
    )?;
    Ok(())
}

fn prompt_password(prompt: &str) -> CliResult<String> {
    let _raw = RawModeGuard::enter()?;

    let mut out = std::io::stderr();
    execute!(
        out,
        cursor::MoveToColumn(0),
        terminal::Clear(ClearType::CurrentLine),
        Print(prompt)
    )?;
    out.flush()?;

    let mut buf = String::new();
    loop {
        let Event::Key(KeyEvent {
            code, modifiers, ..
        }) = event::read()?
        else {
            continue;
        };

        match code {
            KeyCode::Enter => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                break;
            }
            KeyCode::Backspace => {
                if buf.pop().is_some() {
                    execute!(out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                    out.flush()?;
                }
            }
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                execute!(out, Print("\r\n"))?;
                out.flush()?;
                return Err("interrupted".into());
            }
            KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                buf.push(ch);
                execute!(out, Print("*"))?;
                out.flush()?;
            }
            _ => {}
        }
    }

    Ok(buf)
}

fn prompt_new_password() -> CliResult<String> {
    for _ in 0..3 {
        let p1 = prompt_password("New user password: ")?;
        if p1.is_empty() {
            notice("Password must not be empty.")?;
            continue;
        }

        let p2 = prompt_password("Confirm password: ")?;
        if p1 == p2 {
            return Ok(p1);
        }
        notice("Passwords do not match. Try again.")?;
    }

    Err("too many attempts".into())
}

/// Signs the acting admin in. Role checks happen in each engine call.
async fn sign_in(engine: &Engine, acting: &Acting) -> CliResult<Profile> {
    let password = prompt_password(&format!("Password for {}: ", acting.admin_email))?;
    Ok(engine.authenticate(&acting.admin_email, &password).await?)
}

fn user_command(cmd: CreateUserCmd, full_name: Option<String>) -> CreateUserCmd {
    match full_name {
        Some(full_name) => cmd.full_name(full_name),
        None => cmd,
    }
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run(cli: Cli) -> CliResult<()> {
    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Bootstrap(args),
        }) => {
            let password = prompt_new_password()?;
            let cmd = user_command(
                CreateUserCmd::new(args.email, password, args.username),
                args.full_name,
            );
            let admin = engine.bootstrap_admin(cmd).await?;
            println!("created admin: {} ({})", admin.username, admin.id);
        }
        Command::User(User {
            command: UserCommand::Create(args),
        }) => {
            let admin = sign_in(&engine, &args.acting).await?;
            let password = prompt_new_password()?;
            let cmd = user_command(
                CreateUserCmd::new(args.email, password, args.username).role(args.role),
                args.full_name,
            );
            let profile = engine.create_user(Some(admin.id), cmd).await?;
            println!(
                "created {}: {} ({})",
                profile.role_name(),
                profile.username,
                profile.id
            );
        }
        Command::User(User {
            command: UserCommand::Role(args),
        }) => {
            let admin = sign_in(&engine, &args.acting).await?;
            let profile = engine
                .update_user_role(Some(admin.id), args.user_id, args.role)
                .await?;
            println!("{} is now {}", profile.username, profile.role_name());
        }
        Command::User(User {
            command: UserCommand::Impact(args),
        }) => {
            let admin = sign_in(&engine, &args.acting).await?;
            let impact = engine.deletion_impact(Some(admin.id), args.user_id).await?;
            println!("user:                 {} ({})", impact.username, impact.user_id);
            println!("wallet balance:       {} {}", impact.wallet_balance, impact.currency);
            println!("services:             {}", impact.services);
            println!("active provider jobs: {}", impact.active_bookings_as_provider);
            println!("bookings as traveler: {}", impact.bookings_as_traveler);
            println!("posts:                {}", impact.posts);
            println!("can delete:           {}", impact.can_delete);
        }
        Command::User(User {
            command: UserCommand::Purge(args),
        }) => {
            let admin = sign_in(&engine, &args.target.acting).await?;
            let report = engine
                .purge_user(PurgeCmd::new(Some(admin.id), args.target.user_id).confirmed(args.yes))
                .await?;
            println!(
                "purged {}: {} rows removed",
                report.impact.username, report.rows_deleted
            );
            for skipped in report.skipped {
                println!("skipped: {skipped}");
            }
        }
        Command::User(User {
            command: UserCommand::ResetPassword(args),
        }) => {
            let admin = sign_in(&engine, &args.acting).await?;
            let password = prompt_new_password()?;
            engine
                .reset_password(Some(admin.id), args.user_id, &password)
                .await?;
            println!("password updated for {}", args.user_id);
        }
        Command::Post(Post {
            command: PostCommand::Delete(args),
        }) => {
            let admin = sign_in(&engine, &args.acting).await?;
            let rows = engine.delete_post(Some(admin.id), args.post_id).await?;
            println!("deleted post {}: {rows} rows removed", args.post_id);
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Deposit(args),
        }) => {
            let admin = sign_in(&engine, &args.target.acting).await?;
            let wallet = engine
                .wallet_for_user(Some(admin.id), args.target.user_id)
                .await?;
            let mut cmd = LedgerCmd::deposit(Some(admin.id), wallet.id, args.amount);
            if let Some(description) = args.description {
                cmd = cmd.description(description);
            }
            let tx = engine.apply_transaction(cmd).await?;
            println!("{} ({})", tx.description, tx.id);
        }
        Command::Wallet(Wallet {
            command: WalletCommand::Withdraw(args),
        }) => {
            let movement = args.movement;
            let admin = sign_in(&engine, &movement.target.acting).await?;
            let wallet = engine
                .wallet_for_user(Some(admin.id), movement.target.user_id)
                .await?;
            let mut cmd = LedgerCmd::withdrawal(Some(admin.id), wallet.id, movement.amount)
                .confirmed(args.yes);
            if let Some(description) = movement.description {
                cmd = cmd.description(description);
            }
            let tx = engine.apply_transaction(cmd).await?;
            println!("{} ({})", tx.description, tx.id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
