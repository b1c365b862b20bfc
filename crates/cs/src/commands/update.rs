use std::process::ExitCode;

use cs_core::{
    NpmPackageManager, PackageManager, RegistryClient, SessionHandle, UpdateDirection,
    UpdateOutcome, UpdateSession, Updater, VersionInfo, is_valid_version, update_direction,
};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Select};
use tokio::signal;
use tokio::sync::mpsc;

use crate::cli::UpdateTarget;
use crate::error::AppError;
use crate::output;

use super::Context;

const VERSION_LIST_SIZE: usize = 10;

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// `cs update [list | <version>]`. Declining a prompt is not an error.
pub async fn run(ctx: &Context, target: UpdateTarget) -> Result<ExitCode, AppError> {
    let client = RegistryClient::new()?;
    let current = CURRENT_VERSION;

    let resolved = match target {
        UpdateTarget::Latest => resolve_latest(&client, current).await?,
        UpdateTarget::Pick => resolve_picked(&client, current).await?,
        UpdateTarget::Version(version) => resolve_specific(&client, &version, current).await?,
    };
    let Some(version) = resolved else {
        return Ok(ExitCode::SUCCESS);
    };

    if !confirm(&version, current)? {
        output::info("Update cancelled");
        return Ok(ExitCode::SUCCESS);
    }

    Ok(perform(ctx, &version, current).await)
}

async fn resolve_latest(
    client: &RegistryClient,
    current: &str,
) -> Result<Option<String>, AppError> {
    output::step("Checking for updates...");
    let latest = client
        .latest_version()
        .await
        .inspect_err(|_| output::step_failed("Could not reach the registry"))?;
    output::step_done(&format!("Latest version: {latest}"));

    Ok(match update_direction(&latest, current) {
        None => return Err(AppError::InvalidVersion(latest)),
        Some(UpdateDirection::Same) => {
            output::success(&format!("Already on the latest version ({current})"));
            None
        }
        Some(UpdateDirection::Downgrade) => {
            output::info(&format!(
                "Current version {current} is newer than the latest release {latest}"
            ));
            None
        }
        Some(UpdateDirection::Upgrade) => {
            output::info(&format!("Current: {current} → Latest: {latest}"));
            Some(latest)
        }
    })
}

async fn resolve_picked(
    client: &RegistryClient,
    current: &str,
) -> Result<Option<String>, AppError> {
    output::step("Fetching available versions...");
    let versions = client
        .list_versions(VERSION_LIST_SIZE)
        .await
        .inspect_err(|_| output::step_failed("Could not reach the registry"))?;
    if versions.is_empty() {
        output::step_failed("No versions found");
        return Err(AppError::NoStableVersions);
    }
    output::step_done(&format!("Found {} versions", versions.len()));

    let labels: Vec<String> = versions
        .iter()
        .map(|info| version_label(info, current))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select version to install")
        .items(&labels)
        .default(0)
        .interact_opt()?;

    let Some(version) = selection.and_then(|index| versions.get(index)) else {
        output::info("Update cancelled");
        return Ok(None);
    };

    if update_direction(&version.version, current) == Some(UpdateDirection::Same) {
        output::success(&format!("Already on version {current}"));
        return Ok(None);
    }
    Ok(Some(version.version.clone()))
}

async fn resolve_specific(
    client: &RegistryClient,
    requested: &str,
    current: &str,
) -> Result<Option<String>, AppError> {
    if !is_valid_version(requested) {
        return Err(AppError::InvalidVersion(requested.to_string()));
    }
    let version = requested.trim().trim_start_matches('v').to_string();

    output::step(&format!("Checking version {version}..."));
    let exists = client
        .version_exists(&version)
        .await
        .inspect_err(|_| output::step_failed("Could not reach the registry"))?;
    if !exists {
        output::step_failed(&format!("Version {version} not found"));
        return Err(AppError::VersionNotFound(version));
    }
    output::step_done(&format!("Version {version} is available"));

    if update_direction(&version, current) == Some(UpdateDirection::Same) {
        output::success(&format!("Already on version {current}"));
        return Ok(None);
    }
    Ok(Some(version))
}

fn version_label(info: &VersionInfo, current: &str) -> String {
    let mut tags = Vec::new();
    if info.is_latest {
        tags.push("latest");
    }
    if info.version == current {
        tags.push("current");
    }

    if tags.is_empty() {
        info.version.clone()
    } else {
        format!("{} ({})", info.version, tags.join(", "))
    }
}

fn confirm_prompt(target: &str, current: &str) -> String {
    let verb = match update_direction(target, current) {
        Some(UpdateDirection::Downgrade) => "Downgrade",
        _ => "Upgrade",
    };
    format!("{verb} from {current} to {target}?")
}

fn confirm(target: &str, current: &str) -> Result<bool, AppError> {
    let answer = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(confirm_prompt(target, current))
        .default(true)
        .interact_opt()?;
    Ok(answer == Some(true))
}

/// Runs the install with Ctrl-C routed into a rollback.
async fn perform(ctx: &Context, target: &str, current: &str) -> ExitCode {
    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(output::print_progress(rx));
    let updater = Updater::new(NpmPackageManager::new()).with_progress(tx);
    let session = UpdateSession::new(target, current);
    let handle = session.handle();

    // Dropping the update future kills a running npm child.
    let finished = {
        let update = updater.execute(&session);
        tokio::pin!(update);
        tokio::select! {
            outcome = &mut update => Some(outcome),
            Ok(()) = signal::ctrl_c() => None,
        }
    };

    let interrupted = finished.is_none();
    let outcome = match finished {
        Some(outcome) => Some(outcome),
        None => recover_after_interrupt(&updater, &handle).await,
    };

    drop(updater);
    let _ = printer.await;

    match outcome {
        Some(outcome) => {
            report(ctx, &outcome);
            exit_code(&outcome, interrupted)
        }
        None => ExitCode::FAILURE,
    }
}

/// A recovered rollback leaves the previous install working, so only an
/// interruption or a failed rollback is reported as failure.
fn exit_code(outcome: &UpdateOutcome, interrupted: bool) -> ExitCode {
    if interrupted || matches!(outcome, UpdateOutcome::RollbackFailed { .. }) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn recover_after_interrupt(
    updater: &Updater<NpmPackageManager>,
    handle: &SessionHandle,
) -> Option<UpdateOutcome> {
    let Some(previous) = handle.rollback_target() else {
        output::warn("Update cancelled");
        return None;
    };

    output::warn(&format!("Update interrupted! Rolling back to {previous}..."));
    log::warn!("Interrupted while {:?}, rolling back", handle.state());

    tokio::select! {
        outcome = updater.recover_interrupted(handle) => outcome,
        Ok(()) = signal::ctrl_c() => {
            output::error("Rollback aborted");
            output::warn(&format!(
                "Manual recovery:\n  {}",
                updater.manager().install_command(&previous)
            ));
            None
        }
    }
}

fn report(ctx: &Context, outcome: &UpdateOutcome) {
    match outcome {
        UpdateOutcome::Succeeded { version } => {
            output::success(&format!("Successfully updated to {version}"));
            output::info(&ctx.shell.reload_hint());
        }
        UpdateOutcome::RolledBack {
            target,
            previous,
            reason,
        } => {
            output::error(&format!("Update to {target} failed: {reason}"));
            output::success(&format!("Rolled back to {previous}"));
        }
        UpdateOutcome::RollbackFailed {
            target,
            previous,
            reason,
            rollback_error,
            ..
        } => {
            output::error(&format!("Update to {target} failed: {reason}"));
            output::error(&format!("Rollback to {previous} failed: {rollback_error}"));
            if let Some(instructions) = outcome.recovery_instructions() {
                output::warn(&instructions);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn info(version: &str, is_latest: bool) -> VersionInfo {
        VersionInfo {
            version: version.to_string(),
            published_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            is_latest,
        }
    }

    #[test]
    fn labels_mark_latest_and_current() {
        assert_eq!(version_label(&info("1.2.0", true), "1.1.0"), "1.2.0 (latest)");
        assert_eq!(version_label(&info("1.1.0", false), "1.1.0"), "1.1.0 (current)");
        assert_eq!(
            version_label(&info("1.1.0", true), "1.1.0"),
            "1.1.0 (latest, current)"
        );
        assert_eq!(version_label(&info("1.0.0", false), "1.1.0"), "1.0.0");
    }

    #[test]
    fn prompt_names_the_direction() {
        assert_eq!(confirm_prompt("1.2.0", "1.1.0"), "Upgrade from 1.1.0 to 1.2.0?");
        assert_eq!(confirm_prompt("v1.2.0", "1.1.0"), "Upgrade from 1.1.0 to v1.2.0?");
        assert_eq!(confirm_prompt("1.0.0", "1.1.0"), "Downgrade from 1.1.0 to 1.0.0?");
    }

    #[test]
    fn recovered_rollback_exits_cleanly_unless_interrupted() {
        let rolled_back = UpdateOutcome::RolledBack {
            target: "1.2.0".to_string(),
            previous: "1.1.0".to_string(),
            reason: "Version mismatch after installation".to_string(),
        };
        let rollback_failed = UpdateOutcome::RollbackFailed {
            target: "1.2.0".to_string(),
            previous: "1.1.0".to_string(),
            reason: "install failed".to_string(),
            rollback_error: "install failed".to_string(),
            recovery_command: "npm install -g @jjuidev/cs@1.1.0".to_string(),
        };
        let succeeded = UpdateOutcome::Succeeded {
            version: "1.2.0".to_string(),
        };

        assert_eq!(exit_code(&succeeded, false), ExitCode::SUCCESS);
        assert_eq!(exit_code(&rolled_back, false), ExitCode::SUCCESS);
        assert_eq!(exit_code(&rolled_back, true), ExitCode::FAILURE);
        assert_eq!(exit_code(&rollback_failed, false), ExitCode::FAILURE);
    }
}
