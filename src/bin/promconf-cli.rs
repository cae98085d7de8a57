use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::{Method, StatusCode};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "promconf-cli")]
#[command(about = "Management CLI for the Prometheus configuration sidecar", long_about = None)]
struct Cli {
    #[arg(short, long, env = "PROMCONF_URL", default_value = "http://localhost:8000")]
    url: String,

    /// Write keys in sorted order
    #[arg(long, global = true)]
    sort_keys: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show one configuration section, or the whole document with `configs`
    Get { section: String },
    /// Merge a JSON or YAML payload into a section, or into the whole document with `configs`
    Patch { section: String, file: PathBuf },
    /// Remove values from rule_files or scrape_config_files
    Remove {
        section: String,
        #[arg(required = true)]
        values: Vec<String>,
    },
    /// Remove a scrape config by job name
    DeleteJob { job_name: String },
    /// Manage rule files
    #[command(subcommand)]
    Rules(RuleCommands),
}

#[derive(Subcommand)]
enum RuleCommands {
    /// List rule files
    List,
    /// Show one rule file
    Show { file: String },
    /// Create a rule file with a generated name
    Create { path: PathBuf },
    /// Create or replace a named rule file
    Replace { file: String, path: PathBuf },
    /// Delete a rule file
    Delete { file: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');
    let sort = [("sort_keys", cli.sort_keys)];

    let request = match cli.command {
        Commands::Get { section } => client.get(section_url(base, &section)),
        Commands::Patch { section, file } => {
            let payload = read_payload(&file)?;
            let method = if section == "configs" { Method::PUT } else { Method::PATCH };
            client
                .request(method, section_url(base, &section))
                .query(&sort)
                .json(&payload)
        }
        Commands::Remove { section, values } => {
            let mut body = serde_json::Map::new();
            body.insert(section.clone(), Value::from(values));
            client
                .delete(section_url(base, &section))
                .query(&sort)
                .json(&body)
        }
        Commands::DeleteJob { job_name } => client
            .delete(section_url(base, "scrape_configs"))
            .query(&[("job_name", job_name)])
            .query(&sort),
        Commands::Rules(command) => match command {
            RuleCommands::List => client.get(format!("{base}/api/v1/rules")),
            RuleCommands::Show { file } => client.get(format!("{base}/api/v1/rules/{file}")),
            RuleCommands::Create { path } => client
                .post(format!("{base}/api/v1/rules"))
                .json(&read_payload(&path)?),
            RuleCommands::Replace { file, path } => client
                .put(format!("{base}/api/v1/rules/{file}"))
                .json(&read_payload(&path)?),
            RuleCommands::Delete { file } => client.delete(format!("{base}/api/v1/rules/{file}")),
        },
    };

    print_response(request.send().await?).await
}

fn section_url(base: &str, section: &str) -> String {
    if section == "configs" {
        format!("{base}/api/v1/configs")
    } else {
        format!("{base}/api/v1/config/{section}")
    }
}

/// JSON is valid YAML, so one parser covers both payload formats.
fn read_payload(path: &Path) -> Result<Value, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&text)?)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if status == StatusCode::NO_CONTENT {
        println!("{}", prometheus_config_proxy::rules::DELETED_MESSAGE);
        return Ok(());
    }

    let text = res.text().await?;
    let body = match serde_json::from_str::<Value>(&text) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => text,
    };

    if !status.is_success() {
        eprintln!("Error: sidecar returned status {}", status);
        eprintln!("{}", body);
        std::process::exit(1);
    }
    println!("{}", body);
    Ok(())
}
