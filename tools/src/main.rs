//! dash-cli: headless console for the banking dashboard core.
//!
//! Usage:
//!   dash-cli list --search smith --status active --risk low
//!   dash-cli show 1001
//!   dash-cli --demo --seed 7 metrics
//!   dash-cli --config dash.json --ipc-mode

use anyhow::{bail, Context, Result};
use bankdash_core::{
    config::DashConfig,
    customer::{Customer, CustomerStatus},
    engine::CustomerEngine,
    error::GatewayResult,
    format::{
        customer_initials, format_currency, format_phone_number, mask_account_number,
        percentage_change, truncate_text,
    },
    gateway::{demo::DemoGateway, http::HttpGateway, CustomerGateway, RemovalProof},
    query::CustomerFilters,
    types::CustomerId,
};
use serde::de::DeserializeOwned;
use std::{env, sync::Arc};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Flags that consume the following argument.
const VALUE_FLAGS: &[&str] = &[
    "--config",
    "--seed",
    "--population",
    "--search",
    "--status",
    "--risk",
    "--account-type",
];

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    Query {
        #[serde(default)]
        filters: CustomerFilters,
        #[serde(default)]
        search: Option<String>,
    },
    Get {
        id: CustomerId,
    },
    Transactions {
        id: CustomerId,
    },
    Predict {
        id: CustomerId,
    },
    Unlearn {
        id: CustomerId,
    },
    UnlearnBatch {
        ids: Vec<CustomerId>,
    },
    Proof {
        id: CustomerId,
    },
    Metrics,
    Refresh,
    Reset,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    let demo = args.iter().any(|a| a == "--demo");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let seed = parse_arg(&args, "--seed", 42u64);
    let population = parse_arg(&args, "--population", bankdash_core::gateway::demo::DEFAULT_POPULATION);

    let config = match flag_value(&args, "--config") {
        Some(path) => DashConfig::load(path)?,
        None => DashConfig::from_env()?,
    };

    let gateway: Arc<dyn CustomerGateway> = if demo {
        Arc::new(DemoGateway::new(config.schema, seed, population))
    } else {
        Arc::new(HttpGateway::from_config(&config)?)
    };
    log::info!("dash-cli: gateway={} schema={:?}", gateway.name(), config.schema);
    let engine = CustomerEngine::new(gateway, &config);

    if ipc_mode {
        return run_ipc_loop(&engine).await;
    }

    let positional = positional_args(&args);
    match positional.as_slice() {
        ["list"] | [] => {
            let filters = filters_from_args(&args)?;
            let customers = engine.query(&filters, flag_value(&args, "--search")).await?;
            print_customer_table(&customers);
        }
        ["show", id] => {
            engine.ensure_populated().await?;
            match engine.get_by_id(id) {
                Some(customer) => print_customer_detail(&customer),
                None => println!("Customer {id} not found"),
            }
        }
        ["transactions", id] => {
            for t in engine.gateway().fetch_transactions(id).await? {
                println!(
                    "  {} {:<8} {:>12} {:<14} {}",
                    t.date,
                    format!("{:?}", t.kind).to_lowercase(),
                    format_currency(t.amount, "USD"),
                    t.category,
                    truncate_text(&t.description, 32),
                );
            }
        }
        ["predict", id] => {
            let p = engine.gateway().predict(id).await?;
            println!("=== OFFER FOR {} ({}) ===", p.customer_name, p.customer_id);
            println!("  segment:   {}", p.segment);
            println!("  offer:     {}", p.nbo);
            println!("  score:     {:.2}", p.score);
            println!("  baseline:  {}", p.baseline);
        }
        ["unlearn", id] => {
            let ack = engine.gateway().trigger_unlearn(id).await?;
            println!("{}", ack.message);
            if !ack.found() {
                bail!("backend does not know customer {id}");
            }
        }
        ["proof", id] => match engine.gateway().removal_proof(id).await? {
            RemovalProof::Unavailable { error } => println!("No proof available: {error}"),
            RemovalProof::Available(report) => {
                println!("=== REMOVAL PROOF {} ===", report.customer_id);
                if let Some(delta) = report.score_delta() {
                    println!("  score delta:  {delta:+.3}");
                }
                if let (Some(pre), Some(post)) =
                    (report.pre_effective.score, report.post_effective.score)
                {
                    println!("  score change: {:+.1}%", percentage_change(post, pre));
                }
                for (key, value) in &report.personalization_gaps {
                    println!("  {key:<28} {value:.4}");
                }
                println!("  {}", report.interpretation.overall_summary);
            }
        },
        ["reset"] => {
            let ack = engine.reset_backend().await?;
            println!("{}", ack.message);
        }
        ["metrics"] => {
            let today = chrono::Local::now().date_naive();
            let m = engine.metrics(today).await?;
            println!("=== PORTFOLIO ===");
            println!("  customers:        {}", m.total_customers);
            println!("  active:           {}", m.active_customers);
            println!("  total balance:    {}", format_currency(m.total_balance, "USD"));
            println!("  average balance:  {}", format_currency(m.average_balance, "USD"));
            println!("  new (30 days):    {}", m.new_registrations);
        }
        other => bail!("unknown command: {}", other.join(" ")),
    }

    Ok(())
}

async fn run_ipc_loop(engine: &CustomerEngine) -> Result<()> {
    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let cmd: IpcCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": e.to_string() });
                write_line(&mut stdout, &err_json).await?;
                continue;
            }
        };

        let response = match cmd {
            IpcCommand::Quit => break,
            IpcCommand::Query { filters, search } => {
                reply(engine.query(&filters, search.as_deref()).await)
            }
            IpcCommand::Get { id } => {
                reply(engine.ensure_populated().await.map(|_| engine.get_by_id(&id)))
            }
            IpcCommand::Transactions { id } => reply(engine.gateway().fetch_transactions(&id).await),
            IpcCommand::Predict { id } => reply(engine.gateway().predict(&id).await),
            IpcCommand::Unlearn { id } => reply(engine.gateway().trigger_unlearn(&id).await),
            IpcCommand::UnlearnBatch { ids } => reply(engine.gateway().unlearn_batch(&ids).await),
            IpcCommand::Proof { id } => reply(engine.gateway().removal_proof(&id).await),
            IpcCommand::Metrics => {
                reply(engine.metrics(chrono::Local::now().date_naive()).await)
            }
            IpcCommand::Refresh => reply(engine.refresh().await.map(|cache| cache.len())),
            IpcCommand::Reset => reply(engine.reset_backend().await),
        };
        write_line(&mut stdout, &response).await?;
    }
    Ok(())
}

fn reply<T: serde::Serialize>(result: GatewayResult<T>) -> serde_json::Value {
    match result.map(serde_json::to_value) {
        Ok(Ok(value)) => serde_json::json!({ "ok": value }),
        Ok(Err(e)) => serde_json::json!({ "error": e.to_string() }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    }
}

async fn write_line(stdout: &mut io::Stdout, value: &serde_json::Value) -> Result<()> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}

fn print_customer_table(customers: &[Customer]) {
    println!("{:<14} {:<4} {:<28} {:>16}", "ID", "", "NAME", "SCORE/BALANCE");
    for c in customers {
        let figure = match (c.score(), c.total_balance()) {
            (Some(score), _) => format!("{score:.2}"),
            (None, Some(balance)) => format_currency(balance, "USD"),
            (None, None) => String::new(),
        };
        let name = c.display_name();
        println!(
            "{:<14} {:<4} {:<28} {:>16}",
            c.id(),
            customer_initials(&name),
            truncate_text(&name, 25),
            figure
        );
    }
    println!("({} customers)", customers.len());
}

fn print_customer_detail(customer: &Customer) {
    match customer {
        Customer::Scored(c) => {
            println!("=== {} ({}) ===", c.customer_name, c.customer_id);
            println!("  age:            {}", c.age);
            println!("  income:         {}", format_currency(c.income, "USD"));
            println!("  tenure:         {} months", c.tenure_months);
            println!("  cards:          {}", c.num_cards);
            println!("  late (12m):     {}", c.late_12m);
            println!("  segment label:  {}", c.segment_label);
            println!("  offer label:    {}", c.nbo_label);
            println!("  score:          {:.2}", c.score_label);
        }
        Customer::Account(c) => {
            println!("=== {} ({}) ===", c.full_name(), c.id);
            println!("  email:          {}", c.email);
            println!("  phone:          {}", format_phone_number(&c.phone));
            println!("  city:           {}, {}", c.address.city, c.address.state);
            println!("  registered:     {}", c.registration_date);
            println!("  status:         {:?}", c.status);
            println!("  risk:           {:?}", c.risk_level);
            for a in &c.accounts {
                println!(
                    "  {:<10} {:<12} {:>16}",
                    format!("{:?}", a.account_type).to_lowercase(),
                    mask_account_number(&a.account_number),
                    format_currency(a.balance, &a.currency)
                );
            }
            println!("  total balance:  {}", format_currency(c.total_balance(), "USD"));
        }
    }
}

fn filters_from_args(args: &[String]) -> Result<CustomerFilters> {
    // "all" is accepted on the command line as an explicit no-filter.
    let filter = |flag| flag_value(args, flag).filter(|v| *v != "all");
    Ok(CustomerFilters {
        status: filter("--status").map(parse_enum::<CustomerStatus>).transpose()?,
        risk_level: filter("--risk").map(parse_enum).transpose()?,
        account_type: filter("--account-type").map(parse_enum).transpose()?,
        registered_between: None,
    })
}

/// Parse a snake_case enum value the same way the config file does.
fn parse_enum<T: DeserializeOwned>(raw: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(raw.to_string()))
        .with_context(|| format!("invalid value '{raw}'"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn positional_args(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
        } else if VALUE_FLAGS.contains(&arg.as_str()) {
            skip_next = true;
        } else if !arg.starts_with("--") {
            out.push(arg.as_str());
        }
    }
    out
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
