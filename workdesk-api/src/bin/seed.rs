//! # Workdesk seed data
//!
//! Populates an empty database with a sample organisation: eight users across
//! five departments, five clients and ten tasks. Does nothing when any user
//! already exists.
//!
//! ```bash
//! DATABASE_URL=sqlite://workdesk.db cargo run -p workdesk-api --bin workdesk-seed
//! ```
//!
//! Logins: `admin` / `admin123`, managers `*/manager123`, staff `*/staff123`.

use std::collections::HashMap;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use workdesk_shared::{
    auth::context::AuthContext,
    db::{
        migrations::run_migrations,
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{Role, User},
    services::{
        clients::{self, ClientInput},
        tasks::{self, TaskInput},
        users::{self, NewUser},
    },
};

struct SeedUser {
    username: &'static str,
    password: &'static str,
    full_name: &'static str,
    role: Role,
    department: &'static str,
}

const USERS: [SeedUser; 8] = [
    SeedUser { username: "admin", password: "admin123", full_name: "Sarah Mitchell", role: Role::Admin, department: "Management & Strategy" },
    SeedUser { username: "m.jones", password: "manager123", full_name: "Michael Jones", role: Role::Manager, department: "Client Services" },
    SeedUser { username: "l.chen", password: "manager123", full_name: "Lisa Chen", role: Role::Manager, department: "Finance" },
    SeedUser { username: "r.patel", password: "manager123", full_name: "Raj Patel", role: Role::Manager, department: "Administration" },
    SeedUser { username: "j.smith", password: "staff123", full_name: "James Smith", role: Role::Staff, department: "Client Services" },
    SeedUser { username: "e.williams", password: "staff123", full_name: "Emma Williams", role: Role::Staff, department: "Finance" },
    SeedUser { username: "d.brown", password: "staff123", full_name: "David Brown", role: Role::Staff, department: "Administration" },
    SeedUser { username: "a.taylor", password: "staff123", full_name: "Amy Taylor", role: Role::Staff, department: "HR" },
];

/// company, contact, email, phone, industry, status, notes
const CLIENTS: [(&str, &str, &str, &str, &str, &str, &str); 5] = [
    ("Westfield Accountants", "John Westfield", "john@westfieldacc.co.uk", "0121 456 7890", "Accounting", "active",
     "Long-standing client since 2020. Monthly financial reporting required."),
    ("GreenLeaf Marketing", "Sophie Green", "sophie@greenleaf.co.uk", "0121 234 5678", "Marketing", "active",
     "New client. Requires admin support and client coordination."),
    ("BridgePoint Legal", "Mark Bridge", "mark@bridgepointlegal.co.uk", "0121 987 6543", "Legal", "active",
     "Requires document management and compliance tracking."),
    ("TechForward Solutions", "Priya Sharma", "priya@techforward.co.uk", "0121 111 2222", "Technology", "active",
     "IT consultancy client. Complex project tracking needs."),
    ("Midlands Property Group", "Tom Harris", "tom@midlandsproperty.co.uk", "0121 333 4444", "Real Estate", "inactive",
     "Contract paused, to be reviewed Q2 2026."),
];

struct SeedTask {
    title: &'static str,
    description: &'static str,
    status: &'static str,
    priority: &'static str,
    department: &'static str,
    assignee: &'static str,
    client: Option<&'static str>,
    due_date: &'static str,
    creator: &'static str,
}

const TASKS: [SeedTask; 10] = [
    SeedTask { title: "Prepare monthly financial report", description: "Compile and verify the monthly financial report for Westfield Accountants including P&L and balance sheet.", status: "in_progress", priority: "high", department: "Finance", assignee: "e.williams", client: Some("Westfield Accountants"), due_date: "2026-02-14", creator: "l.chen" },
    SeedTask { title: "Update client contact database", description: "Review and update all client contact information to ensure records are current and accurate.", status: "open", priority: "medium", department: "Administration", assignee: "d.brown", client: None, due_date: "2026-02-21", creator: "r.patel" },
    SeedTask { title: "Schedule quarterly review meetings", description: "Arrange Q1 review meetings with all active clients. Send calendar invites and prepare agendas.", status: "open", priority: "medium", department: "Client Services", assignee: "j.smith", client: None, due_date: "2026-02-28", creator: "m.jones" },
    SeedTask { title: "Onboard new starter (Marketing Dept)", description: "Complete onboarding checklist for new marketing coordinator. Set up accounts, arrange induction.", status: "in_progress", priority: "high", department: "HR", assignee: "a.taylor", client: None, due_date: "2026-02-10", creator: "admin" },
    SeedTask { title: "Process GreenLeaf invoices", description: "Process outstanding invoices for GreenLeaf Marketing for January services.", status: "open", priority: "urgent", department: "Finance", assignee: "e.williams", client: Some("GreenLeaf Marketing"), due_date: "2026-02-07", creator: "l.chen" },
    SeedTask { title: "Prepare compliance documentation", description: "Gather and organise compliance documents for BridgePoint Legal's annual review.", status: "open", priority: "high", department: "Client Services", assignee: "j.smith", client: Some("BridgePoint Legal"), due_date: "2026-02-18", creator: "m.jones" },
    SeedTask { title: "IT equipment audit", description: "Conduct inventory check of all IT equipment across departments. Record serial numbers and conditions.", status: "completed", priority: "low", department: "Administration", assignee: "d.brown", client: None, due_date: "2026-01-31", creator: "admin" },
    SeedTask { title: "Draft staff training plan", description: "Create a training needs analysis and development plan for Q1-Q2 2026 across all departments.", status: "open", priority: "medium", department: "HR", assignee: "a.taylor", client: None, due_date: "2026-03-01", creator: "admin" },
    SeedTask { title: "TechForward project status update", description: "Compile progress report on all active workstreams for TechForward Solutions.", status: "in_progress", priority: "high", department: "Client Services", assignee: "m.jones", client: Some("TechForward Solutions"), due_date: "2026-02-12", creator: "m.jones" },
    SeedTask { title: "Archive inactive client files", description: "Move Midlands Property Group files to archive storage following contract pause.", status: "open", priority: "low", department: "Administration", assignee: "d.brown", client: Some("Midlands Property Group"), due_date: "2026-03-15", creator: "r.patel" },
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "workdesk_seed=info,workdesk_shared=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://workdesk.db".to_string());

    let pool = create_pool(DatabaseConfig::from_url(url, 1)).await?;
    run_migrations(&pool).await?;

    if User::count(&pool).await? > 0 {
        tracing::info!("Database already contains users, skipping seed");
        close_pool(pool).await;
        return Ok(());
    }

    let mut actors: HashMap<&'static str, AuthContext> = HashMap::new();
    for seed in &USERS {
        let user = users::provision(
            &pool,
            NewUser {
                username: seed.username.to_string(),
                password: seed.password.to_string(),
                full_name: seed.full_name.to_string(),
                email: format!("{}@mjlimited.co.uk", seed.username),
                role: seed.role,
                department: seed.department.to_string(),
            },
        )
        .await?;
        actors.insert(seed.username, AuthContext::from_user(&user));
    }

    let admin = actor(&actors, "admin")?;
    let mut client_ids: HashMap<&'static str, i64> = HashMap::new();
    for (company, contact, email, phone, industry, status, notes) in CLIENTS {
        let client = clients::create(
            &pool,
            admin,
            ClientInput {
                company_name: company.to_string(),
                contact_name: contact.to_string(),
                contact_email: email.to_string(),
                contact_phone: Some(phone.to_string()),
                industry: Some(industry.to_string()),
                status: Some(status.to_string()),
                notes: Some(notes.to_string()),
            },
        )
        .await?;
        client_ids.insert(company, client.id);
    }

    for seed in &TASKS {
        let creator = actor(&actors, seed.creator)?;
        let assignee = actor(&actors, seed.assignee)?.user_id;
        let client_id = seed.client.and_then(|name| client_ids.get(name).copied());

        tasks::create(
            &pool,
            creator,
            TaskInput {
                title: seed.title.to_string(),
                description: Some(seed.description.to_string()),
                status: Some(seed.status.to_string()),
                priority: Some(seed.priority.to_string()),
                department: seed.department.to_string(),
                assigned_to: Some(assignee),
                client_id,
                due_date: Some(seed.due_date.to_string()),
            },
        )
        .await?;
    }

    tracing::info!(
        users = USERS.len(),
        clients = CLIENTS.len(),
        tasks = TASKS.len(),
        "Database seeded"
    );

    close_pool(pool).await;
    Ok(())
}

fn actor<'a>(
    actors: &'a HashMap<&'static str, AuthContext>,
    username: &str,
) -> anyhow::Result<&'a AuthContext> {
    actors
        .get(username)
        .ok_or_else(|| anyhow::anyhow!("seed references unknown user {}", username))
}
