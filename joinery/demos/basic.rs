//! Basic example of Joinery DI container.
//!
//! Run with `RUST_LOG=joinery_container=trace` to watch resolution.

use joinery::inventory;
use joinery::prelude::*;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

// === Define your traits and types ===

trait Logger: Send + Sync {
    fn log(&self, msg: &str);
}

struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Database {
    url: String,
    logger: Arc<dyn Logger>,
}

impl Database {
    fn query(&self, sql: &str) -> String {
        self.logger.log(&format!("Executing: {sql}"));
        format!("Results from {}", self.url)
    }
}

struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    fn find_user(&self, id: i64) -> String {
        self.db.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

struct UserService {
    repo: Arc<UserRepository>,
    logger: Arc<dyn Logger>,
}

impl UserService {
    fn get_user(&self, id: i64) -> String {
        self.logger.log(&format!("Getting user {id}"));
        self.repo.find_user(id)
    }
}

// === Describe constructors ===

fn console_logger(_: &Arguments) -> Result<Instance> {
    Ok(Instance::new(Arc::new(ConsoleLogger) as Arc<dyn Logger>))
}

fn database(args: &Arguments) -> Result<Instance> {
    Ok(Instance::new(Database {
        url: args.cloned("url")?,
        logger: args.cloned("logger")?,
    }))
}

fn user_repository(args: &Arguments) -> Result<Instance> {
    Ok(Instance::new(UserRepository { db: args.get("db")? }))
}

fn user_service(args: &Arguments) -> Result<Instance> {
    Ok(Instance::new(UserService {
        repo: args.get("repo")?,
        logger: args.cloned("logger")?,
    }))
}

inventory::submit! {
    StaticType::new("ConsoleLogger", &[], console_logger)
}

inventory::submit! {
    StaticType::new(
        "Database",
        &[("url", Some("database.url")), ("logger", Some("LoggerIface"))],
        database,
    )
}

inventory::submit! {
    StaticType::new("UserRepository", &[("db", Some("Database"))], user_repository)
}

inventory::submit! {
    StaticType::new(
        "UserService",
        &[("repo", Some("UserRepository")), ("logger", Some("LoggerIface"))],
        user_service,
    )
}

const SEED: &str = r#"{
    "database.url": "postgres://localhost/myapp",
    "user.id": 42,
    "LoggerIface": { "class": "ConsoleLogger", "singleton": true },
    "Database": { "class": "Database", "singleton": true },
    "UserService": { "class": "UserService" }
}"#;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("joinery_container=debug")),
        )
        .init();

    // Build the container from seed data; types come from `inventory`
    let seed: Seed = serde_json::from_str(SEED)?;
    let container = Container::builder().seed(seed).build()?;

    println!("✅ Container built successfully!");
    println!("{container:?}");

    // === Resolve ===
    let service = container.resolve::<UserService>("UserService")?;
    let id = container.resolve::<i64>("user.id")?;
    println!("👤 {}", service.get_user(*id));

    // Transient service, shared singleton database
    let again = container.resolve::<UserService>("UserService")?;
    println!("🔁 Same service: {}", Arc::ptr_eq(&service, &again));
    println!("🔁 Same database: {}", Arc::ptr_eq(&service.repo.db, &again.repo.db));

    // === Construct with overrides (the bound singleton is not touched) ===
    let staging = Overrides::new().with("database.url", Instance::new(String::from("postgres://staging/myapp")));
    let db = container
        .construct("Database", &staging)?
        .downcast::<Database>()
        .ok_or("Database has an unexpected type")?;
    println!("🧪 {}", db.query("SELECT 1"));

    // === Invoke a callable ===
    let report = Callable::builder("report")
        .param("db", "Database")
        .param("id", "user.id")
        .build(|args| {
            let db = args.get::<Database>("db")?;
            Ok(format!("User {} lives in {}", args.cloned::<i64>("id")?, db.url))
        });
    let line = container.invoke(&report, &Overrides::new())?;
    println!("📋 {}", line.downcast_ref::<String>().map(String::as_str).unwrap_or_default());

    // === Errors are descriptive ===
    if let Err(err) = container.get("UserServce") {
        println!("\n❌ {err}");
    }

    println!("\n🎉 Everything works!");
    Ok(())
}
