//! Command dispatch and handlers

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::ServiceStatus;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the command selected on the command line.
///
/// Without a subcommand this generates the postgres files, like `generate`.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let root = resolve_root(cli.root.as_deref())?;
    match &cli.command {
        None => cmd_generate(&root, false, None),
        Some(Commands::Generate {
            dry_run,
            output_dir,
        }) => cmd_generate(&root, *dry_run, output_dir.as_deref()),
        Some(Commands::List) => cmd_list(&root),
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Show => cmd_config_show(&root),
            ConfigCommands::Path => cmd_config_path(&root),
            ConfigCommands::Init { global } => cmd_config_init(&root, *global),
        },
        Some(Commands::Completion { shell }) => cmd_completion(*shell),
    }
}

fn resolve_root(root: Option<&Path>) -> CliResult<PathBuf> {
    match root {
        Some(path) if path.is_dir() => Ok(path.to_path_buf()),
        Some(path) => Err(CliError::InvalidArgs(format!(
            "not a directory: {}",
            path.display()
        ))),
        None => std::env::current_dir()
            .map_err(|e| InfraError::io("determine current directory", e).into()),
    }
}

#[instrument(skip_all, fields(root = %root.display()))]
fn cmd_generate(root: &Path, dry_run: bool, output_dir: Option<&Path>) -> CliResult<()> {
    let mut settings = Settings::load(root)?;
    if let Some(dir) = output_dir {
        settings.output_dir = dir.to_path_buf();
    }
    debug!("output_dir: {}", settings.output_dir.display());
    let config_file = settings.config_file.clone();

    let container = ServiceContainer::new(settings);
    let service = container.setup_service();

    output::progress("Scanning for service configurations...");
    let setup = service.generate(root)?;

    for skipped in &setup.skipped {
        output::warning(&format!(
            "Skipping {} due to missing values in {} (missing: {})",
            skipped.dir.display(),
            config_file,
            skipped.fields.join(", ")
        ));
    }
    for svc in &setup.services {
        for (field, value) in svc.unusual_identifiers() {
            output::warning(&format!(
                "{}: {} '{}' is not a lowercase SQL identifier, postgres folds unquoted names",
                svc.name, field, value
            ));
        }
    }

    if dry_run {
        let paths = service.output_paths(root);
        output::header(&paths.sql.display());
        output::plain(&setup.sql.render());
        output::header(&paths.env.display());
        output::plain(&setup.env.render());
        return Ok(());
    }

    let paths = service.write(root, &setup)?;
    for svc in &setup.services {
        output::included(&format!("{} ({} / {})", svc.name, svc.database, svc.user));
    }
    output::success(&format!(
        "Generated {} and {}",
        paths.sql.display(),
        paths.env.display()
    ));
    Ok(())
}

#[instrument(skip_all, fields(root = %root.display()))]
fn cmd_list(root: &Path) -> CliResult<()> {
    let settings = Settings::load(root)?;
    let password_key = settings.password_key.clone();
    let secrets_file = settings.secrets_file.clone();
    let container = ServiceContainer::new(settings);

    let statuses = container.setup_service().list(root)?;
    if statuses.is_empty() {
        output::plain(&format!("No services found in {}", root.display()));
        return Ok(());
    }

    for status in &statuses {
        match status {
            ServiceStatus::Ready {
                service,
                secret_present: true,
            } => output::included(&format!(
                "{}: database {}, user {} ({})",
                service.name,
                service.database,
                service.user,
                service.dir.display()
            )),
            ServiceStatus::Ready {
                service,
                secret_present: false,
            } => output::excluded(&format!(
                "{}: {} missing in {}",
                service.name,
                password_key,
                service.dir.join(&secrets_file).display()
            )),
            ServiceStatus::Incomplete(missing) => output::excluded(&format!(
                "{}: missing {}",
                missing.dir.display(),
                missing.fields.join(", ")
            )),
        }
    }
    Ok(())
}

#[instrument(skip_all)]
fn cmd_config_show(root: &Path) -> CliResult<()> {
    let settings = Settings::load(root)?;
    output::plain(&settings.to_toml()?);
    Ok(())
}

fn cmd_config_path(root: &Path) -> CliResult<()> {
    let describe = |path: &Path| {
        let state = if path.exists() { "exists" } else { "not found" };
        format!("{} ({})", path.display(), state)
    };
    match global_config_path() {
        Some(path) => output::detail(&format!("global: {}", describe(&path))),
        None => output::detail("global: unavailable (no home directory)"),
    }
    output::detail(&format!("local:  {}", describe(&local_config_path(root))));
    Ok(())
}

#[instrument(skip_all)]
fn cmd_config_init(root: &Path, global: bool) -> CliResult<()> {
    let path = if global {
        global_config_path()
            .ok_or_else(|| CliError::Usage("cannot determine global config directory".into()))?
    } else {
        local_config_path(root)
    };
    if path.exists() {
        return Err(CliError::Usage(format!(
            "config already exists: {}",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
    }
    std::fs::write(&path, Settings::template())
        .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
    output::success(&format!("Created {}", path.display()));
    Ok(())
}

fn cmd_completion(shell: Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}
