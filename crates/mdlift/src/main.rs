//! mdlift - markdown attachment uploader
//!
//! Scans markdown documents for attachment references, uploads local
//! attachments through a user-configured external command, and rewrites
//! the documents to use the returned URLs.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use mdlift::attachment;
use mdlift::cli::{Cli, Commands, ConfigCommands};
use mdlift::config::Settings;
use mdlift::errors;
use mdlift::output::{ExitCode, JsonOutput, OutputContext};
use mdlift::vault::{FsDocument, FsVault, VaultIndex};
use mdlift::watch::WatchState;
use mdlift::{ShellRunner, UploadOrchestrator};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Helper to determine exit code from error message
fn error_to_exit_code(error: &anyhow::Error) -> ExitCode {
    let error_msg = error.to_string().to_lowercase();

    // Check root cause for IO errors
    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        return match io_error.kind() {
            std::io::ErrorKind::NotFound => ExitCode::NotFound,
            std::io::ErrorKind::PermissionDenied => ExitCode::PermissionDenied,
            _ => ExitCode::ExternalError,
        };
    }

    if error_msg.contains("not found") || error_msg.contains("no such file") {
        ExitCode::NotFound
    } else if error_msg.contains("disabled")
        || error_msg.contains("unknown setting")
        || error_msg.contains("unknown upload service")
        || error_msg.contains("invalid value")
        || error_msg.contains("no upload command")
        || error_msg.contains("no %s placeholder")
        || error_msg.contains("no test file")
    {
        ExitCode::InvalidArgument
    } else if error_msg.contains("upload test failed")
        || error_msg.contains("failed to spawn")
        || error_msg.contains("failed to read")
        || error_msg.contains("failed to write")
    {
        ExitCode::ExternalError
    } else {
        ExitCode::GenericError
    }
}

fn main() {
    let exit_code = match run() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            error_to_exit_code(&e)
        }
    };

    if exit_code != ExitCode::Success {
        std::process::exit(exit_code.code());
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let quiet = cli.quiet;

    let vault_root = match &cli.vault {
        Some(root) => root.clone(),
        None => env::current_dir().context("Failed to determine current directory")?,
    };

    match cli.command {
        Commands::Init => cmd_init(&vault_root, quiet),
        Commands::Upload { document, json } => cmd_upload(&vault_root, &document, quiet, json),
        Commands::Saved { file, json } => cmd_saved(&vault_root, &file, quiet, json),
        Commands::Watch { interval, once } => cmd_watch(&vault_root, interval, once, quiet),
        Commands::TestUpload { path, json } => cmd_test_upload(&vault_root, path, quiet, json),
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Show { json } => cmd_config_show(&vault_root, quiet, json),
            ConfigCommands::Set { key, value } => cmd_config_set(&vault_root, &key, &value, quiet),
        },
    }
}

fn cmd_init(vault_root: &Path, quiet: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, false);
    let config_path = vault_root
        .join(mdlift::config::CONFIG_DIR)
        .join(mdlift::config::CONFIG_FILE);

    if config_path.exists() {
        ctx.print_info(format!("Config already exists: {}", config_path.display()))?;
        return Ok(());
    }

    Settings::default().save(vault_root)?;
    ctx.print_info(format!("Initialized config: {}", config_path.display()))?;
    Ok(())
}

fn cmd_upload(vault_root: &Path, document: &Path, quiet: bool, json: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, json);
    let settings = Settings::load(vault_root)?;
    require_command(&settings)?;

    let doc_path = if document.is_absolute() {
        document.to_path_buf()
    } else {
        vault_root.join(document)
    };
    let mut doc = FsDocument::open(doc_path)?;

    let vault = FsVault::new(vault_root);
    let orchestrator = UploadOrchestrator::new(&settings, &vault, vault_root, ShellRunner, &ctx);
    let report = orchestrator.upload_document(&mut doc)?;

    if ctx.is_json() {
        let output = JsonOutput::success(report, "upload");
        println!("{}", output.to_json_string()?);
    }
    Ok(())
}

fn cmd_saved(vault_root: &Path, file: &str, quiet: bool, json: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, json);
    let settings = Settings::load(vault_root)?;

    if !settings.auto_upload_on_save {
        ctx.print_info("auto_upload_on_save is disabled; nothing to do.")?;
        return Ok(());
    }

    let rel = vault_relative(vault_root, file);
    let file_name = rel.rsplit('/').next().unwrap_or(&rel);
    if !settings.is_uploadable_file(file_name) {
        ctx.print_info(format!("{} is not in the accepted upload formats.", rel))?;
        return Ok(());
    }
    require_command(&settings)?;

    let vault = FsVault::new(vault_root);
    let mut views = open_markdown_views(vault_root, &vault)?;
    let orchestrator = UploadOrchestrator::new(&settings, &vault, vault_root, ShellRunner, &ctx);
    let report = orchestrator.upload_saved_file(&rel, &mut views)?;

    if ctx.is_json() {
        let output = JsonOutput::success(report, "saved");
        println!("{}", output.to_json_string()?);
    }
    Ok(())
}

fn cmd_watch(vault_root: &Path, interval: u64, once: bool, quiet: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, false);
    let settings = Settings::load(vault_root)?;

    if !settings.auto_upload_on_save {
        return Err(anyhow!(
            "auto_upload_on_save is disabled; enable it with: mdlift config set auto_upload_on_save true"
        ));
    }
    require_command(&settings)?;

    let vault = FsVault::new(vault_root);
    let mut state = WatchState::prime(vault_root, &settings);
    ctx.print_info(format!("Watching {} for saved attachments...", vault_root.display()))?;

    loop {
        std::thread::sleep(Duration::from_secs(interval));
        for rel in state.poll(vault_root, &settings) {
            let mut views = open_markdown_views(vault_root, &vault)?;
            let orchestrator =
                UploadOrchestrator::new(&settings, &vault, vault_root, ShellRunner, &ctx);
            if let Err(e) = orchestrator.upload_saved_file(&rel, &mut views) {
                ctx.print_warning(format!("{}: {:#}", rel, e))?;
            }
        }
        if once {
            return Ok(());
        }
    }
}

fn cmd_test_upload(vault_root: &Path, path: Option<String>, quiet: bool, json: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, json);
    let settings = Settings::load(vault_root)?;
    require_command(&settings)?;

    let path = match path {
        Some(path) => path,
        None if !settings.test_file_path.trim().is_empty() => settings.test_file_path.clone(),
        None => {
            return Err(anyhow::Error::new(
                errors::ActionableError::new("No test file given")
                    .with_remedy("Pass a file: mdlift test-upload <path>")
                    .with_remedy("Or configure one: mdlift config set test_file_path <path>"),
            ))
        }
    };

    let file_path = Path::new(&path);
    let resolved = if file_path.is_absolute() {
        file_path.to_path_buf()
    } else {
        vault_root.join(file_path)
    };
    if !resolved.is_file() {
        return Err(anyhow::Error::new(errors::test_file_not_found(&path)));
    }

    if let Some(program) = command_program(settings.effective_command()) {
        if !program_available(&program) {
            ctx.print_warning(errors::upload_binary_not_found(&program))?;
        }
    }

    let vault = FsVault::new(vault_root);
    let orchestrator = UploadOrchestrator::new(&settings, &vault, vault_root, ShellRunner, &ctx);
    let outcome = orchestrator.test_upload(&resolved.to_string_lossy());

    if ctx.is_json() {
        let output = JsonOutput::success(&outcome, "test-upload");
        println!("{}", output.to_json_string()?);
    }

    if !outcome.is_uploaded() {
        return Err(anyhow!("Upload test failed"));
    }
    Ok(())
}

fn cmd_config_show(vault_root: &Path, quiet: bool, json: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, json);
    let settings = Settings::load(vault_root)?;

    if ctx.is_json() {
        let output = JsonOutput::success(&settings, "config show");
        println!("{}", output.to_json_string()?);
        return Ok(());
    }

    let formats: Vec<&str> = settings.upload_file_format.iter().map(|s| s.as_str()).collect();
    ctx.print_data(format!("upload_service       {}", settings.upload_service))?;
    ctx.print_data(format!("upload_command       {}", settings.effective_command()))?;
    ctx.print_data(format!("upload_file_format   {}", formats.join(",")))?;
    ctx.print_data(format!("delete_source_file   {}", settings.delete_source_file))?;
    ctx.print_data(format!("auto_upload_on_save  {}", settings.auto_upload_on_save))?;
    ctx.print_data(format!("test_file_path       {}", settings.test_file_path))?;

    if let Some(program) = command_program(settings.effective_command()) {
        if !program_available(&program) {
            ctx.print_warning(errors::upload_binary_not_found(&program))?;
        }
    }
    Ok(())
}

fn cmd_config_set(vault_root: &Path, key: &str, value: &str, quiet: bool) -> Result<()> {
    let ctx = OutputContext::new(quiet, false);
    let mut settings = Settings::load(vault_root)?;
    settings.set(key, value)?;
    settings.save(vault_root)?;
    ctx.print_info(format!("Set {} = {}", key, value))?;
    Ok(())
}

/// Fail early when no usable upload command is configured.
fn require_command(settings: &Settings) -> Result<()> {
    let command = settings.effective_command();
    if command.trim().is_empty() || !command.contains("%s") {
        return Err(anyhow::Error::new(errors::upload_command_not_configured(
            command,
        )));
    }
    Ok(())
}

/// First token of the command template, for binary availability checks.
fn command_program(command: &str) -> Option<String> {
    command
        .split_whitespace()
        .next()
        .filter(|token| !token.contains('='))
        .map(str::to_string)
}

fn program_available(program: &str) -> bool {
    if program.contains('/') {
        Path::new(program).exists()
    } else {
        which::which(program).is_ok()
    }
}

/// Normalize a user-supplied file argument to a vault-relative path.
fn vault_relative(vault_root: &Path, file: &str) -> String {
    let path = Path::new(file);
    let rel: PathBuf = if path.is_absolute() {
        path.strip_prefix(vault_root).unwrap_or(path).to_path_buf()
    } else {
        path.to_path_buf()
    };
    attachment::normalize_path(&rel.to_string_lossy())
}

/// Every markdown document in the vault counts as an open view for
/// save-triggered rewrite propagation.
fn open_markdown_views(vault_root: &Path, vault: &FsVault) -> Result<Vec<FsDocument>> {
    let mut views = Vec::new();
    for file in vault.files() {
        let lower = file.name.to_lowercase();
        if lower.ends_with(".md") || lower.ends_with(".markdown") {
            views.push(FsDocument::open(vault_root.join(&file.path))?);
        }
    }
    Ok(views)
}
