//! `proclab`: manage lab test procedures kept in a shared folder.

mod render;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use proclab_core::store::RecordStore;
use proclab_core::types::{
    AppConfig, Backend, Config, Link, ProcedureEdit, ProcedureId, TestName,
};
use proclab_core::{Observed, ProcLabCore, ProcLabError, Snapshot};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "proclab", version, about = "Manage lab test procedures in a shared folder")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "proclab.toml")]
    config: PathBuf,
    /// Shared folder holding the records (overrides `storage.shared_root`).
    #[arg(long, global = true)]
    root: Option<PathBuf>,
    /// Storage backend (overrides `storage.backend`).
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List all tests.
    Tests,
    /// Add a test with an empty procedure list.
    AddTest { name: String },
    /// Delete a test and its procedure list.
    DeleteTest { name: String },
    /// Show the procedures of a test.
    List { test: String },
    /// Append a procedure to a test.
    Add {
        test: String,
        text: String,
        #[command(flatten)]
        link: LinkArgs,
    },
    /// Change the text and/or link of a procedure.
    Edit {
        test: String,
        #[command(flatten)]
        target: TargetArgs,
        /// New description.
        #[arg(long)]
        text: Option<String>,
        #[command(flatten)]
        link: LinkArgs,
        /// Remove the link.
        #[arg(long, conflicts_with_all = ["link", "file"])]
        clear_link: bool,
    },
    /// Remove a procedure.
    Delete {
        test: String,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Re-read a test periodically and mark procedures added since the last read.
    Watch {
        test: String,
        /// Seconds between refreshes (overrides `refresh.interval_secs`).
        #[arg(long)]
        interval: Option<u64>,
        /// Stop after this many refreshes.
        #[arg(long)]
        count: Option<u64>,
    },
    /// Print the remote URL a local path maps to.
    MapUrl { path: String },
}

#[derive(Args, Debug)]
struct LinkArgs {
    /// Link to a URL.
    #[arg(long, conflicts_with = "file")]
    link: Option<String>,
    /// Copy a file into the shared folder and link to it.
    #[arg(long)]
    file: Option<PathBuf>,
}

impl LinkArgs {
    fn is_empty(&self) -> bool {
        self.link.is_none() && self.file.is_none()
    }
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false)]
struct TargetArgs {
    /// Position in the list, as shown by `list`.
    #[arg(long)]
    index: Option<usize>,
    /// Stable procedure id, as shown by `list`.
    #[arg(long)]
    id: Option<ProcedureId>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum BackendArg {
    Json,
    Db,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Json => Backend::Json,
            BackendArg::Db => Backend::Db,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(root) = &cli.root {
        config.storage.shared_root = root.clone();
    }
    if let Some(backend) = cli.backend {
        config.storage.backend = backend.into();
    }

    let errors = config.validate();
    if errors.is_empty() {
        return Ok(config);
    }
    for error in &errors {
        warn!(%error, "invalid config value, using default");
    }
    Ok(config.with_defaults_for_invalid())
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let app_config = load_config(&cli)?;
    let config = Config::from(&app_config);
    debug!(
        root = %config.shared_root.display(),
        backend = %app_config.storage.backend,
        "opening store"
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match app_config.storage.backend {
        Backend::Json => run(ProcLabCore::open_json(config)?, cli.command, &app_config, &mut out),
        Backend::Db => run(ProcLabCore::open_db(config)?, cli.command, &app_config, &mut out),
    }
}

fn run<S: RecordStore>(
    mut core: ProcLabCore<S>,
    command: Command,
    config: &AppConfig,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Tests => render::tests(out, &core.tests()?)?,
        Command::AddTest { name } => {
            if core.add_test(&name)? {
                writeln!(out, "Added test '{}'.", name.trim())?;
            } else {
                writeln!(out, "Nothing added: name is blank or already exists.")?;
            }
        }
        Command::DeleteTest { name } => {
            let test = parse_test(&name)?;
            if core.delete_test(&test)? {
                writeln!(out, "Deleted test '{test}'.")?;
            } else {
                writeln!(out, "No test named '{test}'.")?;
            }
        }
        Command::List { test } => {
            let test = parse_test(&test)?;
            let entries: Vec<Observed> = core
                .procedures(&test)?
                .into_iter()
                .enumerate()
                .map(|(index, procedure)| Observed {
                    index,
                    procedure,
                    is_new: false,
                })
                .collect();
            render::procedures(out, &test, &entries)?;
        }
        Command::Add { test, text, link } => {
            let test = registered_test(&core, &test)?;
            if text.trim().is_empty() {
                bail!("procedure description must not be empty");
            }
            let link = resolve_link(&mut core, &test, link)?.unwrap_or_default();
            if let Some(id) = core.add_procedure(&test, &text, link)? {
                writeln!(out, "Added procedure {id} to '{test}'.")?;
            }
        }
        Command::Edit {
            test,
            target,
            text,
            link,
            clear_link,
        } => {
            let test = registered_test(&core, &test)?;
            if text.is_none() && !clear_link && link.is_empty() {
                bail!("nothing to change: pass --text, --link, --file or --clear-link");
            }

            // Check the target before copying any upload into the shared folder.
            let procedures = core.procedures(&test)?;
            match (target.index, target.id) {
                (_, Some(id)) if !procedures.iter().any(|p| p.id == Some(id)) => {
                    return Err(ProcLabError::ProcedureNotFound(id).into());
                }
                (Some(index), None) if index >= procedures.len() => {
                    writeln!(out, "No procedure #{index} in '{test}'.")?;
                    return Ok(());
                }
                _ => {}
            }

            let link = if clear_link {
                Some(Link::None)
            } else {
                resolve_link(&mut core, &test, link)?
            };
            let edit = ProcedureEdit { text, link };

            match (target.index, target.id) {
                (_, Some(id)) => {
                    core.edit_procedure_by_id(&test, id, edit)?;
                    writeln!(out, "Updated procedure {id}.")?;
                }
                (Some(index), None) => {
                    if core.edit_procedure(&test, index, edit)? {
                        writeln!(out, "Updated procedure #{index}.")?;
                    } else {
                        writeln!(out, "No procedure #{index} in '{test}'.")?;
                    }
                }
                (None, None) => bail!("pass --index or --id"),
            }
        }
        Command::Delete { test, target } => {
            let test = parse_test(&test)?;
            match (target.index, target.id) {
                (_, Some(id)) => {
                    let removed = core.delete_procedure_by_id(&test, id)?;
                    writeln!(out, "Deleted procedure '{}'.", removed.text)?;
                }
                (Some(index), None) => {
                    if core.delete_procedure(&test, index)? {
                        writeln!(out, "Deleted procedure #{index}.")?;
                    } else {
                        writeln!(out, "No procedure #{index} in '{test}'.")?;
                    }
                }
                (None, None) => bail!("pass --index or --id"),
            }
        }
        Command::Watch {
            test,
            interval,
            count,
        } => {
            let test = parse_test(&test)?;
            let interval = Duration::from_secs(interval.unwrap_or(config.refresh.interval_secs).max(1));
            watch(&core, &test, interval, count, out)?;
        }
        Command::MapUrl { path } => match core.remote_url(&path) {
            Some(url) => writeln!(out, "{url}")?,
            None => bail!("no URL mapping configured: set links.local_base and links.remote_base"),
        },
    }
    Ok(())
}

fn watch<S: RecordStore>(
    core: &ProcLabCore<S>,
    test: &TestName,
    interval: Duration,
    count: Option<u64>,
    out: &mut impl Write,
) -> Result<()> {
    let mut snapshot = Snapshot::default();
    let mut cycle = 0;
    loop {
        let refresh = core.refresh(test, &snapshot)?;
        cycle += 1;
        render::refresh(out, test, cycle, &refresh)?;
        out.flush()?;
        snapshot = refresh.snapshot;

        if count.is_some_and(|count| cycle >= count) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn parse_test(name: &str) -> Result<TestName> {
    TestName::try_from(name).with_context(|| format!("invalid test name '{name}'"))
}

/// Parses `name` and requires it to be in the test list, so procedures are
/// never written for a test that `tests` does not show.
fn registered_test<S: RecordStore>(core: &ProcLabCore<S>, name: &str) -> Result<TestName> {
    let test = parse_test(name)?;
    if !core.tests()?.contains(&test) {
        bail!("no test named '{test}': add it with `proclab add-test`");
    }
    Ok(test)
}

fn resolve_link<S: RecordStore>(
    core: &mut ProcLabCore<S>,
    test: &TestName,
    args: LinkArgs,
) -> Result<Option<Link>> {
    match (args.link, args.file) {
        (_, Some(file)) => {
            let link = core
                .attach_file(test, &file)
                .with_context(|| format!("uploading {}", file.display()))?;
            Ok(Some(link))
        }
        (Some(url), None) => Ok(Some(Link::url(url))),
        (None, None) => Ok(None),
    }
}
