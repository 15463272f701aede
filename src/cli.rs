use config_schema::{
    apply_env, format_config_errors, ApplicationModeField, BoolField, CallArgs, Config,
    ConfigError, FieldValue, HostnameField, InstanceMethodField, IntField, ListField, Schema,
    StringField, UrlField,
};
use tracing_subscriber::EnvFilter;

const PREFIX: &str = "DEMO";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    dotenvy::from_filename("./test.env").ok();

    match std::env::args().nth(1) {
        Some(arg) => match arg.as_str() {
            "defaults" => show_defaults(),
            "env" => load_from_env(),
            "docs" => generate_docs(),
            "invalid" => show_invalid(),
            _ => println!(
                "unknown arg: {}. Available: defaults, env, docs, invalid",
                arg
            ),
        },
        None => {
            println!("Usage: util-cli [command]");
            println!("Commands:");
            println!("  defaults - Print the demo config with only defaults");
            println!("  env      - Load the demo config from DEMO_* environment variables");
            println!("  docs     - Generate CONFIG.md documentation");
            println!("  invalid  - Show how rejected values are reported");
        }
    };
}

fn demo_schema() -> Result<Schema, ConfigError> {
    let schema = Schema::new();
    schema.field(
        "mode",
        ApplicationModeField::new()
            .default("development")
            .description("Application mode"),
    )?;
    schema.field(
        "log_level",
        StringField::log_level()
            .default("info")
            .description("Log verbosity"),
    )?;

    let http = schema.schema("http")?;
    http.field(
        "host",
        HostnameField::new()
            .default("localhost")
            .description("Listen address"),
    )?;
    http.field("port", IntField::port().default(8080).description("Listen port"))?;
    http.field(
        "public_url",
        UrlField::new().description("URL clients use to reach the server"),
    )?;
    http.field(
        "address",
        InstanceMethodField::new("address", |cfg, _args| {
            let host = cfg.get("host")?;
            let port = cfg.get("port")?;
            Ok(FieldValue::from(format!(
                "{}:{}",
                host.as_str().unwrap_or_default(),
                port.as_int().unwrap_or_default()
            )))
        }),
    )?;

    let db = schema.schema("db")?;
    db.field(
        "replicas",
        ListField::new(HostnameField::new()).description("Read replicas"),
    )?;
    db.field("pool", IntField::new().min(1).default(4).description("Connection pool size"))?;
    db.field("debug", BoolField::new().default(false).description("Log every query"))?;

    Ok(schema)
}

fn print_config(cfg: &Config) -> Result<(), ConfigError> {
    println!("{}", cfg.to_basic()?);
    let address = cfg.nested("http")?.call("address", CallArgs::new())?;
    println!("  http address: {}", address.to_basic()?);
    println!("  production: {}", cfg.get("is_production_mode")?.to_basic()?);
    Ok(())
}

fn show_defaults() {
    let result = demo_schema().and_then(|schema| {
        let cfg = schema.instantiate();
        print_config(&cfg)
    });
    if let Err(e) = result {
        eprintln!("{}", e);
    }
}

fn load_from_env() {
    let schema = match demo_schema() {
        Ok(schema) => schema,
        Err(e) => return eprintln!("{}", e),
    };
    let cfg = schema.instantiate();
    match apply_env(&cfg, PREFIX) {
        Ok(count) => {
            println!("Config loaded successfully! ({} override(s))", count);
            if let Err(e) = cfg.validate().and_then(|_| print_config(&cfg)) {
                eprintln!("{}", e);
            }
        }
        Err(errors) => eprintln!("{}", format_config_errors(&errors)),
    }
    println!("all done");
}

fn generate_docs() {
    println!("Generating documentation for the demo schema...");
    let schema = match demo_schema() {
        Ok(schema) => schema,
        Err(e) => return eprintln!("✗ Failed to build schema: {}", e),
    };
    match schema.write_docs("CONFIG.md") {
        Ok(_) => println!("✓ Documentation written to CONFIG.md"),
        Err(e) => eprintln!("✗ Failed to write documentation: {}", e),
    }
}

fn show_invalid() {
    let schema = match demo_schema() {
        Ok(schema) => schema,
        Err(e) => return eprintln!("{}", e),
    };
    let cfg = schema.instantiate();

    let attempts: Vec<(&str, FieldValue)> = vec![
        ("mode", "staging".into()),
        ("log_level", "verbose".into()),
        ("http.port", 70000.into()),
        ("http.public_url", "not a url".into()),
        ("db.pool", 0.into()),
        ("db.replicas", vec!["db-1", "-bad host-"].into()),
    ];

    let errors: Vec<ConfigError> = attempts
        .into_iter()
        .filter_map(|(path, value)| cfg.set_path(path, value).err())
        .collect();
    eprintln!("{}", format_config_errors(&errors));
}
