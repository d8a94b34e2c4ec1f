//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `objext_core` linkage.
//! - Compose a demo host from catalog names and print deterministic output.

use clap::Parser;
use log::error;
use objext_core::{
    set, wrap, CallArgs, Callable, Composable, ComposeResult, Extension, ExtensionCatalog,
    HostType, Interceptor, LoggingConfig, Member, Signature, Value, INIT,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "objext", version, about = "Compose a demo host with extensions")]
struct Cli {
    /// Extension ids to apply, in order.
    #[arg(short, long = "extension")]
    extensions: Vec<String>,

    /// Apply extensions to the instance instead of deriving a type.
    #[arg(long)]
    per_instance: bool,

    /// Number of items to append.
    #[arg(long, default_value_t = 2)]
    appends: i64,

    #[arg(long, default_value = objext_core::default_log_level())]
    log_level: String,

    /// Absolute directory for log files; logs go to stderr when omitted.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

/// Counts calls to `append`.
struct AppendCounter;

impl Extension for AppendCounter {
    fn id(&self) -> &str {
        "append-counter"
    }

    fn can_extend(&self, target: &dyn Composable) -> bool {
        target.has_member("append")
    }

    fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
        wrap(
            target,
            INIT,
            Interceptor::new().before(|record| {
                set(&mut *record.host, "append_count", Member::value(0))
            }),
        )?;
        wrap(
            target,
            "append",
            Interceptor::new().after(|record| {
                let count = record.host.value_mut("append_count")?;
                *count = Value::from(count.as_int()? + 1);
                Ok(())
            }),
        )
    }
}

/// Adds a `len` method.
struct Length;

impl Extension for Length {
    fn id(&self) -> &str {
        "length"
    }

    fn can_extend(&self, target: &dyn Composable) -> bool {
        target.is_a("Tally")
    }

    fn extend(&self, target: &mut dyn Composable) -> ComposeResult<()> {
        set(
            target,
            "len",
            Callable::method(Signature::new(), |host, _| {
                Ok(Value::from(host.get("items")?.as_list()?.len()))
            }),
        )
    }
}

fn tally_type() -> ComposeResult<Rc<HostType>> {
    HostType::builder("Tally")
        .init(Signature::new(), |host, _| {
            host.assign("items", Value::List(vec![]))?;
            Ok(Value::Null)
        })
        .method("append", Signature::new().param("item"), |host, args| {
            let item = args.get("item")?.clone();
            host.value_mut("items")?.as_list_mut()?.push(item);
            Ok(Value::Null)
        })
        .build()
}

fn catalog() -> ComposeResult<ExtensionCatalog> {
    let mut catalog = ExtensionCatalog::new();
    catalog.register(Rc::new(AppendCounter))?;
    catalog.register(Rc::new(Length))?;
    Ok(catalog)
}

fn run(cli: &Cli) -> ComposeResult<()> {
    let catalog = catalog()?;
    let ids: Vec<&str> = cli.extensions.iter().map(String::as_str).collect();
    let base = tally_type()?;

    let mut host = if cli.per_instance {
        base.compose(&catalog.resolve_all(&ids)?, CallArgs::new())?
    } else {
        base.with_named_extensions(&catalog, &ids)?
            .instantiate(CallArgs::new())?
    };

    for item in 0..cli.appends {
        host.call("append", CallArgs::new().arg(item))?;
    }

    println!("objext_core version={}", objext_core::core_version());
    println!("extensions={:?}", host.extensions().ids());
    println!("items={}", host.get("items")?.as_list()?.len());
    if host.has_member("append_count") {
        println!("append_count={}", host.get("append_count")?.as_int()?);
    }
    if host.has_member("len") {
        println!("len={}", host.call("len", CallArgs::new())?.as_int()?);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = LoggingConfig {
        level: cli.log_level.clone(),
        log_dir: cli.log_dir.clone(),
    };
    if let Err(err) = objext_core::init_logging(&config) {
        eprintln!("objext: {err}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error=\"{err}\"");
            eprintln!("objext: {err}");
            ExitCode::FAILURE
        }
    }
}
