use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use donorhub::config::AppConfig;
use donorhub::errors::ApiError;
use donorhub::models::{
    AssociationCategory, AssociationChanges, NewAssociation, NewOffer, NewUser, OfferDecision,
    User, UserChanges, UserType,
};
use donorhub::services::conversation::ChatSession;
use donorhub::services::profile::{self, AssociationProfileForm, UserProfileForm};
use donorhub::services::session;
use donorhub::services::signup::{self, AccountType, DonorKind, SignupField, SignupForm};
use donorhub::state::AppState;

#[derive(Parser)]
#[command(name = "donorhub", about = "Donation platform client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a donor, organization or recipient account
    Signup(SignupArgs),
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Show the logged-in user's profile
    Me,
    /// Show the logged-in association's profile
    Association,
    UpdateProfile(UpdateProfileArgs),
    UpdateAssociation(UpdateAssociationArgs),
    DeleteAccount {
        /// Delete another user's account (admin)
        #[arg(long)]
        user_id: Option<i64>,
    },
    /// List conversation summaries
    Conversations {
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one conversation and mark it read
    Thread { counterpart_id: i64 },
    /// Send a message to an association
    Send {
        association_id: i64,
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },
    #[command(subcommand)]
    Offers(OffersCommand),
    Theme {
        #[arg(long)]
        toggle: bool,
    },
    #[command(subcommand)]
    Admin(AdminCommand),
}

#[derive(Args)]
struct SignupArgs {
    #[arg(long, default_value = "donor")]
    account_type: AccountType,
    #[arg(long, default_value = "individual")]
    donor_kind: DonorKind,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    confirm_password: String,
    #[arg(long, default_value = "")]
    first_name: String,
    #[arg(long, default_value = "")]
    last_name: String,
    #[arg(long, default_value = "")]
    organization_name: String,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    address: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    decline_terms: bool,
}

#[derive(Args)]
struct UpdateProfileArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    confirm_password: Option<String>,
}

#[derive(Args)]
struct UpdateAssociationArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// Food, Clothes, Healthcare, Education or "Home supplies"
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    logo_url: Option<String>,
    #[arg(long)]
    password: Option<String>,
    #[arg(long)]
    confirm_password: Option<String>,
}

#[derive(Subcommand)]
enum OffersCommand {
    List { association_id: i64 },
    Create {
        #[arg(long)]
        association_id: i64,
        #[arg(long)]
        user_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Approve or reject an offer
    Status {
        offer_id: i64,
        association_id: i64,
        decision: String,
    },
}

#[derive(Subcommand)]
enum AdminCommand {
    Users,
    /// Show one user
    User { user_id: i64 },
    CreateUser(NewUserArgs),
    /// Change only the fields given
    UpdateUser(UpdateUserArgs),
    Deleted,
    Associations,
    CreateAssociation(NewAssociationArgs),
    /// Change only the fields given
    UpdateAssociation(AdminAssociationArgs),
    Restore { user_id: i64 },
    DeleteUser { user_id: i64 },
    DeleteAssociation { association_id: i64 },
}

#[derive(Args)]
struct NewUserArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    /// donor, recipient or admin
    #[arg(long, default_value = "donor")]
    user_type: String,
}

#[derive(Args)]
struct UpdateUserArgs {
    user_id: i64,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    user_type: Option<String>,
}

#[derive(Args)]
struct NewAssociationArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    password: String,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

#[derive(Args)]
struct AdminAssociationArgs {
    association_id: i64,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    address: Option<String>,
}

fn parse_user_type(raw: &str) -> anyhow::Result<UserType> {
    UserType::parse(raw).with_context(|| format!("unknown user type: {raw}"))
}

fn fail(e: ApiError, fallback: &str) -> anyhow::Error {
    anyhow::anyhow!(e.user_message(fallback))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();
    let state = AppState::init(config).context("failed to start")?;

    run(&state, cli.command).await
}

async fn run(state: &AppState, command: Command) -> anyhow::Result<()> {
    let api = &state.api;

    match command {
        Command::Signup(args) => {
            let form = signup_form(args);
            let status = signup::submit(&form, api).await;
            if !status.is_success() {
                anyhow::bail!(status.message);
            }
            println!("{}", status.message);
        }
        Command::Login { email, password } => {
            let resp = session::login(api, &email, &password)
                .await
                .map_err(|e| fail(e, "Login failed"))?;
            let kind = resp.user_type.map(|t| t.as_str()).unwrap_or("unknown");
            println!("Logged in ({kind})");
        }
        Command::Logout => {
            let (notice, failure) = logout_report(session::logout(api).await);
            println!("{notice}");
            if let Some(failure) = failure {
                anyhow::bail!(failure);
            }
        }
        Command::Me => {
            let user = api.me().await.map_err(|e| fail(e, "Failed to load profile"))?;
            println!("{} <{}> ({})", user.full_name(), user.email, user.user_type.as_str());
            if let Some(phone) = &user.phone {
                println!("phone:   {phone}");
            }
            if let Some(address) = &user.address {
                println!("address: {address}");
            }
        }
        Command::Association => {
            let a = api
                .my_association()
                .await
                .map_err(|e| fail(e, "Failed to load association data"))?;
            println!("{} <{}>", a.name, a.email);
            if let Some(category) = a.category {
                println!("category: {}", category.as_str());
            }
            if let Some(description) = &a.description {
                println!("{description}");
            }
        }
        Command::UpdateProfile(args) => {
            let current = api.me().await.map_err(|e| fail(e, "Failed to load profile"))?;
            let mut form = UserProfileForm::from_user(&current);
            if let Some(v) = args.first_name {
                form.first_name = v;
            }
            if let Some(v) = args.last_name {
                form.last_name = v;
            }
            if let Some(v) = args.phone {
                form.phone = v;
            }
            if let Some(v) = args.address {
                form.address = v;
            }
            form.password = args.password;
            form.confirm_password = args.confirm_password;

            let user = profile::update_user_profile(api, form)
                .await
                .map_err(|e| fail(e, profile::USER_UPDATE_FAILED))?;
            println!("Profile updated: {}", user.full_name());
        }
        Command::UpdateAssociation(args) => {
            let current = api
                .my_association()
                .await
                .map_err(|e| fail(e, "Failed to load association data"))?;
            let mut form = AssociationProfileForm::from_association(&current);
            if let Some(v) = args.name {
                form.name = v;
            }
            if let Some(v) = args.email {
                form.email = v;
            }
            if let Some(v) = args.phone {
                form.phone = v;
            }
            if let Some(v) = args.address {
                form.address = v;
            }
            if let Some(v) = args.description {
                form.description = v;
            }
            if let Some(v) = args.category {
                form.category = Some(
                    AssociationCategory::parse(&v)
                        .with_context(|| format!("unknown category: {v}"))?,
                );
            }
            if args.logo_url.is_some() {
                form.logo_url = args.logo_url;
            }
            form.password = args.password;
            form.confirm_password = args.confirm_password;

            let updated = profile::update_association_profile(api, &current, form)
                .await
                .map_err(|e| fail(e, profile::ASSOCIATION_UPDATE_FAILED))?;
            println!("Association profile updated: {}", updated.name);
        }
        Command::DeleteAccount { user_id } => {
            profile::delete_account(api, user_id)
                .await
                .map_err(|e| fail(e, profile::DELETE_FAILED))?;
            println!("Account deleted");
        }
        Command::Conversations { search } => {
            let chat = load_chat(state).await?;
            let summaries = match search.as_deref() {
                Some(q) => chat.search(q),
                None => chat.summaries().iter().collect(),
            };
            if summaries.is_empty() {
                println!("No conversations");
            }
            for s in summaries {
                let unread = if s.unread_count > 0 {
                    format!(" [{} unread]", s.unread_count)
                } else {
                    String::new()
                };
                println!(
                    "#{} {}{} {}  {}",
                    s.counterpart_id,
                    s.counterpart_name,
                    unread,
                    s.last_message.sent_at.format("%H:%M"),
                    s.last_message.message_content,
                );
            }
        }
        Command::Thread { counterpart_id } => {
            let mut chat = load_chat(state).await?;
            chat.open(api, counterpart_id)
                .await
                .map_err(|e| fail(e, "Failed to load messages"))?;
            print_thread(&chat);
        }
        Command::Send {
            association_id,
            message,
        } => {
            let mut chat = load_chat(state).await?;
            chat.open(api, association_id)
                .await
                .map_err(|e| fail(e, "Failed to load messages"))?;
            let sent = chat.send(api, &message.join(" ")).await;
            print_thread(&chat);
            sent.map_err(|e| fail(e, "Message could not be sent"))?;
        }
        Command::Offers(cmd) => run_offers(state, cmd).await?,
        Command::Theme { toggle } => {
            let default = state.config.default_theme;
            let theme = if toggle {
                session::toggle_theme(&state.store, default)
            } else {
                session::theme(&state.store, default)
            }
            .map_err(|e| fail(e, "Couldn't read theme"))?;
            println!("{}", theme.as_str());
        }
        Command::Admin(cmd) => run_admin(state, cmd).await?,
    }

    Ok(())
}

/// The local session is cleared whatever the backend answered, so the
/// notice always says so; a backend failure is reported separately.
fn logout_report(result: Result<(), ApiError>) -> (&'static str, Option<String>) {
    match result {
        Ok(()) => ("Logged out", None),
        Err(e) => (
            "Logged out locally",
            Some(format!(
                "server logout failed: {}",
                e.user_message("the server did not respond")
            )),
        ),
    }
}

fn signup_form(args: SignupArgs) -> SignupForm {
    let mut form = SignupForm::new(args.account_type, args.donor_kind);
    let fields = [
        (SignupField::Email, args.email),
        (SignupField::Password, args.password),
        (SignupField::ConfirmPassword, args.confirm_password),
        (SignupField::FirstName, args.first_name),
        (SignupField::LastName, args.last_name),
        (SignupField::OrganizationName, args.organization_name),
        (SignupField::Phone, args.phone),
        (SignupField::Address, args.address),
        (SignupField::Description, args.description),
    ];
    for (field, value) in fields {
        // Intermediate states are expected to be invalid.
        let _ = form.set(field, &value);
    }
    if args.decline_terms {
        let _ = form.set(SignupField::TermsAccepted, "false");
    }

    let strength = form.password_strength();
    tracing::debug!(score = strength.score(), label = strength.label(), "password strength");
    form
}

async fn load_chat(state: &AppState) -> anyhow::Result<ChatSession> {
    let viewer = session::viewer(&state.store)
        .map_err(|e| fail(e, "Couldn't read session"))?
        .context("not logged in")?;
    let mut chat = ChatSession::new(viewer);
    chat.load(&state.api)
        .await
        .map_err(|e| fail(e, "Failed to load conversations"))?;
    Ok(chat)
}

fn print_thread(chat: &ChatSession) {
    if let Some(active) = chat.active() {
        println!("── {} ──", active.counterpart_name);
    }
    for entry in chat.thread() {
        let marker = match entry.delivery.as_str() {
            "confirmed" => "",
            other => other,
        };
        println!(
            "{} {}: {} {}",
            entry.message.sent_at.format("%H:%M"),
            entry.sender_name,
            entry.message.message_content,
            marker,
        );
    }
}

async fn run_offers(state: &AppState, cmd: OffersCommand) -> anyhow::Result<()> {
    let api = &state.api;
    match cmd {
        OffersCommand::List { association_id } => {
            let offers = api
                .association_offers(association_id)
                .await
                .map_err(|e| fail(e, "Failed to load offers"))?;
            if offers.is_empty() {
                println!("No offers");
            }
            for o in offers {
                let donor = o
                    .user
                    .as_ref()
                    .map(|u| format!("{} {}", u.first_name, u.last_name))
                    .unwrap_or_else(|| format!("user #{}", o.user_id));
                println!("#{} [{}] {} from {}", o.id, o.status.as_str(), o.title, donor);
            }
        }
        OffersCommand::Create {
            association_id,
            user_id,
            title,
            description,
        } => {
            let offer = api
                .create_offer(&NewOffer {
                    association_id,
                    user_id,
                    title,
                    description,
                })
                .await
                .map_err(|e| fail(e, "Couldn't submit offer. Please try again."))?;
            println!("Offer #{} submitted ({})", offer.id, offer.status.as_str());
        }
        OffersCommand::Status {
            offer_id,
            association_id,
            decision,
        } => {
            let decision = OfferDecision::parse(&decision)
                .with_context(|| format!("decision must be approve or reject, got {decision}"))?;
            let offer = api
                .update_offer_status(offer_id, association_id, decision)
                .await
                .map_err(|e| fail(e, "Couldn't update offer status"))?;
            println!("Offer #{} is now {}", offer.id, offer.status.as_str());
        }
    }
    Ok(())
}

fn print_users(users: &[User]) {
    for u in users {
        println!("#{} {} <{}> {}", u.id, u.full_name(), u.email, u.user_type.as_str());
    }
}

async fn run_admin(state: &AppState, cmd: AdminCommand) -> anyhow::Result<()> {
    let api = &state.api;
    match cmd {
        AdminCommand::Users => {
            let users = api
                .admin_users()
                .await
                .map_err(|e| fail(e, "Failed to load users"))?;
            print_users(&users);
        }
        AdminCommand::Deleted => {
            let users = api
                .admin_deleted_users()
                .await
                .map_err(|e| fail(e, "Failed to load users"))?;
            print_users(&users);
        }
        AdminCommand::User { user_id } => {
            let u = api
                .admin_user(user_id)
                .await
                .map_err(|e| fail(e, "Failed to load user"))?;
            println!("#{} {} <{}> {}", u.id, u.full_name(), u.email, u.user_type.as_str());
            if let Some(deleted_at) = &u.deleted_at {
                println!("deleted at {deleted_at}");
            }
        }
        AdminCommand::CreateUser(args) => {
            let user = NewUser {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                password: args.password,
                phone: args.phone,
                address: args.address,
                user_type: parse_user_type(&args.user_type)?,
            };
            let u = api
                .admin_create_user(&user)
                .await
                .map_err(|e| fail(e, "Couldn't create user"))?;
            println!("User #{} created", u.id);
        }
        AdminCommand::UpdateUser(args) => {
            let changes = UserChanges {
                first_name: args.first_name,
                last_name: args.last_name,
                email: args.email,
                phone: args.phone,
                address: args.address,
                user_type: args.user_type.as_deref().map(parse_user_type).transpose()?,
            };
            let u = api
                .admin_update_user(args.user_id, &changes)
                .await
                .map_err(|e| fail(e, "Couldn't update user"))?;
            println!("User #{} updated: {}", u.id, u.full_name());
        }
        AdminCommand::CreateAssociation(args) => {
            let association = NewAssociation {
                name: args.name,
                email: args.email,
                password: args.password,
                description: args.description,
                phone: args.phone,
                address: args.address,
            };
            let a = api
                .admin_create_association(&association)
                .await
                .map_err(|e| fail(e, "Couldn't create association"))?;
            println!("Association #{} created", a.id);
        }
        AdminCommand::UpdateAssociation(args) => {
            let changes = AssociationChanges {
                name: args.name,
                email: args.email,
                description: args.description,
                phone: args.phone,
                address: args.address,
            };
            let a = api
                .admin_update_association(args.association_id, &changes)
                .await
                .map_err(|e| fail(e, "Couldn't update association"))?;
            println!("Association #{} updated: {}", a.id, a.name);
        }
        AdminCommand::Associations => {
            let associations = api
                .associations()
                .await
                .map_err(|e| fail(e, "Failed to load associations"))?;
            for a in associations {
                println!("#{} {} <{}>", a.id, a.name, a.email);
            }
        }
        AdminCommand::Restore { user_id } => {
            api.admin_restore_user(user_id)
                .await
                .map_err(|e| fail(e, "Couldn't restore user"))?;
            println!("User #{user_id} restored");
        }
        AdminCommand::DeleteUser { user_id } => {
            api.admin_delete_user(user_id)
                .await
                .map_err(|e| fail(e, "Couldn't delete user"))?;
            println!("User #{user_id} deleted");
        }
        AdminCommand::DeleteAssociation { association_id } => {
            api.admin_delete_association(association_id)
                .await
                .map_err(|e| fail(e, "Couldn't delete association"))?;
            println!("Association #{association_id} deleted");
        }
    }
    Ok(())
}
