//! Command dispatch

use std::io::BufRead;

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::OrgChartService;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::cli::tree_view::org_tree;
use crate::config::{global_config_path, Settings};
use crate::domain::{Point, TreeLayout};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Load settings and apply command line overrides.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(data_file) = &cli.data_file {
        settings.data_file = data_file.clone();
    }
    if let Some(owner) = &cli.owner {
        settings.owner = owner.clone();
    }
    debug!(?settings, "settings loaded");
    Ok(settings)
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage("no command given, see --help".into()));
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut std::io::stdout());
        return Ok(());
    }
    let settings = load_settings(cli)?;

    if let Commands::Config { command } = command {
        return config_command(command, &settings);
    }

    let container = ServiceContainer::new(settings);
    let mut service = container.org_chart()?;

    match command {
        Commands::Add {
            name,
            title,
            manager,
            director,
        } => _add(&mut service, name, title, manager.as_deref(), *director),
        Commands::Rename {
            employee,
            name,
            title,
        } => {
            let id = service.resolve_id(employee)?;
            service.rename_employee(id, name, title)?;
            output::success(&format!("Renamed: {} ({})", name.trim(), title.trim()));
            Ok(())
        }
        Commands::Move { employee, manager } => {
            let id = service.resolve_id(employee)?;
            let manager_id = service.resolve_id(manager)?;
            service.move_employee(id, manager_id)?;
            output::success(&format!("Moved: {} -> {}", employee, manager));
            Ok(())
        }
        Commands::Remove { employee } => {
            let id = service.resolve_id(employee)?;
            service.remove_employee(id)?;
            output::success(&format!("Removed: {}", employee));
            Ok(())
        }
        Commands::Link { manager, employee } => {
            let manager_id = service.resolve_id(manager)?;
            let id = service.resolve_id(employee)?;
            service.add_reporting_line(manager_id, id)?;
            output::success(&format!("Linked: {} reports to {}", employee, manager));
            Ok(())
        }
        Commands::Unlink { manager, employee } => {
            let manager_id = service.resolve_id(manager)?;
            let id = service.resolve_id(employee)?;
            service.remove_reporting_line(manager_id, id)?;
            output::success(&format!("Unlinked: {} from {}", employee, manager));
            Ok(())
        }
        Commands::Reset { yes } => _reset(&mut service, *yes),
        Commands::Tree => {
            let graph = service.graph();
            output::info(&org_tree(graph, service.owner()));
            debug!(employees = graph.len(), levels = graph.arena().depth(), "tree rendered");
            Ok(())
        }
        Commands::List => _list(&service),
        Commands::Lines => _lines(&service, &container),
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}

#[instrument(skip(service))]
fn _add(
    service: &mut OrgChartService,
    name: &str,
    title: &str,
    manager: Option<&str>,
    director: bool,
) -> CliResult<()> {
    let parent = match manager {
        Some(m) => service.resolve_id(m)?,
        None => service.graph().root_id(),
    };
    let id = service.add_employee(parent, name, title, director || manager.is_none())?;
    output::success(&format!("Added: {} ({}) [{}]", name.trim(), title.trim(), id.short()));
    Ok(())
}

#[instrument(skip(service))]
fn _reset(service: &mut OrgChartService, yes: bool) -> CliResult<()> {
    if !yes {
        output::prompt(&format!(
            "Delete all {} employees of '{}'? [y/N]",
            service.graph().len(),
            service.owner()
        ));
        let mut answer = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut answer)
            .map_err(|e| InfraError::io("read confirmation", e))?;
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
            output::warning("Reset aborted");
            return Ok(());
        }
    }
    service.reset()?;
    output::success("Organisation reset");
    Ok(())
}

fn _list(service: &OrgChartService) -> CliResult<()> {
    let graph = service.graph();
    for employee in graph.employees() {
        let managers = employee
            .reports_to
            .iter()
            .filter_map(|&m| graph.find(m))
            .map(|m| m.name.as_str())
            .join(", ");
        output::info(&format!(
            "{}  {:<20} {:<20} {}",
            employee.id.short(),
            employee.name,
            employee.title,
            if managers.is_empty() { "-".to_string() } else { managers }
        ));
    }
    Ok(())
}

fn _lines(service: &OrgChartService, container: &ServiceContainer) -> CliResult<()> {
    let layout = TreeLayout::new(container.settings.layout);
    let lines = service.secondary_lines(&layout);
    if lines.is_empty() {
        output::info("No secondary reporting lines");
        return Ok(());
    }
    let graph = service.graph();
    let name = |id| graph.find(id).map(|e| e.name.clone()).unwrap_or_default();
    for line in lines {
        output::header(&format!("{} -> {}", name(line.employee), name(line.manager)));
        output::detail(
            &line.points
                .iter()
                .map(|Point { x, y }| format!("({x:.1}, {y:.1})"))
                .join(" -> "),
        );
    }
    Ok(())
}

fn config_command(command: &ConfigCommands, settings: &Settings) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("config: {}", path.display())),
                None => output::warning("no config directory available"),
            }
            output::info(&format!("data:   {}", settings.data_file.display()));
        }
        ConfigCommands::Init => output::info(&Settings::template()),
    }
    Ok(())
}
