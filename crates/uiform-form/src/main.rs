use clap::{value_parser, Arg, ArgAction, Command};
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use uiform_form::{AsyncOptionsConfig, FormConfig, FormSession};
use uiform_options::{
    loader_fn, LoaderContext, LoaderError, LoaderResponse, OptionItem, SharedLoader,
};

const COUNTRIES: [(&str, &str); 3] = [("PE", "Peru"), ("MX", "Mexico"), ("US", "United States")];
const PRODUCTS: [&str; 5] = ["chai", "chamomile", "coffee", "cocoa", "matcha"];

fn countries(delay: Duration) -> SharedLoader {
    loader_fn(move |_ctx: LoaderContext| async move {
        tokio::time::sleep(delay).await;
        Ok::<_, LoaderError>(LoaderResponse::new(
            COUNTRIES
                .iter()
                .map(|(code, name)| OptionItem::new(*code, *name))
                .collect(),
        ))
    })
}

fn cities(delay: Duration) -> SharedLoader {
    loader_fn(move |ctx: LoaderContext| async move {
        tokio::time::sleep(delay).await;
        let country = ctx
            .form_values
            .get("country")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let names: &[&str] = match country.as_str() {
            "PE" => &["Lima", "Cusco", "Arequipa"],
            "MX" => &["Monterrey", "Guadalajara"],
            "US" => &["Austin", "Boston"],
            "" => &[],
            other => return Err(LoaderError::new(format!("no cities for `{other}`"))),
        };
        Ok(LoaderResponse::new(
            names
                .iter()
                .map(|name| OptionItem::new(name.to_lowercase(), *name))
                .collect(),
        ))
    })
}

fn products(delay: Duration) -> SharedLoader {
    loader_fn(move |ctx: LoaderContext| async move {
        tokio::time::sleep(delay).await;
        let term = ctx.search.to_lowercase();
        Ok::<_, LoaderError>(LoaderResponse::from_json_options(
            PRODUCTS
                .iter()
                .filter(|name| name.contains(term.as_str()))
                .map(|name| json!({"value": name, "title": name.to_uppercase()}))
                .collect(),
        ))
    })
}

fn print_field(session: &FormSession, name: &str) -> anyhow::Result<()> {
    let view = session.view(name)?;
    let labels: Vec<&str> = view
        .options_or_empty()
        .iter()
        .map(|option| option.label.as_str())
        .collect();
    println!(
        "  {:<8} loading={:<5} error={:<28} options={:?}",
        name,
        view.loading,
        view.error.as_deref().unwrap_or("-"),
        labels
    );
    Ok(())
}

fn print_state(session: &FormSession, step: &str) -> anyhow::Result<()> {
    println!("{step}");
    for name in session.field_names() {
        print_field(session, &name)?;
    }
    Ok(())
}

async fn run_scenario(delay: Duration, fail: bool) -> anyhow::Result<()> {
    let config = FormConfig::new().with_search_debounce(Duration::from_millis(100));
    let session = FormSession::new(config)
        .with_initial_values(serde_json::Map::from_iter([
            ("country".to_string(), json!("")),
            ("city".to_string(), json!("")),
        ]))
        .with_loader("countries", countries(delay))
        .with_loader("cities", cities(delay))
        .with_loader("products", products(delay));

    session.bind("country", AsyncOptionsConfig::new("countries"))?;
    session.bind(
        "city",
        AsyncOptionsConfig::new("cities").with_dependencies(["country"]),
    )?;
    session.bind("product", AsyncOptionsConfig::new("products").searchable())?;

    for dispatch in session.mount_all()? {
        dispatch.wait().await;
    }
    print_state(&session, "Mounted:")?;

    for dispatch in session.update_value("country", json!("PE"))? {
        dispatch.wait().await;
    }
    print_state(&session, "Country set to PE:")?;

    let (first, second, third) = tokio::join!(
        session.input_debounced("product", "c"),
        session.input_debounced("product", "ch"),
        session.input_debounced("product", "cha"),
    );
    for dispatch in [first?, second?, third?] {
        dispatch.wait().await;
    }
    print_state(&session, "Searched products for \"cha\":")?;

    if fail {
        for dispatch in session.update_value("country", json!("XX"))? {
            dispatch.wait().await;
        }
        print_state(&session, "Country set to XX:")?;
    }

    let stats = session.options().stats();
    println!();
    println!("Entries:    {}", stats.entries);
    println!("Loaded:     {}", stats.loaded);
    println!("Errored:    {}", stats.errored);
    println!("Dispatched: {}", stats.dispatched);
    println!("Superseded: {}", stats.superseded);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Command::new("uiform-demo")
        .version(uiform_form::VERSION)
        .about("Async options store demo")
        .subcommand_required(true)
        .subcommand(
            Command::new("scenario")
                .about("Run the countries/cities/products scenario")
                .arg(
                    Arg::new("delay-ms")
                        .long("delay-ms")
                        .default_value("200")
                        .value_parser(value_parser!(u64))
                        .help("Simulated loader latency in milliseconds"),
                )
                .arg(
                    Arg::new("fail")
                        .long("fail")
                        .action(ArgAction::SetTrue)
                        .help("Select a country whose cities fail to load"),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Print the default configuration")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Output as JSON"),
                ),
        );

    let matches = cli.get_matches();

    match matches.subcommand() {
        Some(("scenario", args)) => {
            let delay = args.get_one::<u64>("delay-ms").copied().unwrap_or(200);
            let fail = args.get_flag("fail");

            println!("Running uiform scenario...");
            println!("Loader delay: {} ms", delay);
            println!();

            run_scenario(Duration::from_millis(delay), fail).await?;
        }
        Some(("config", args)) => {
            let config = FormConfig::default();
            if args.get_flag("json") {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", config.to_toml_string()?);
            }
        }
        _ => unreachable!("clap enforces a subcommand"),
    }

    Ok(())
}
