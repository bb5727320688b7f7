use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use docsmith_cli::config::{self, DocsmithConfig};
use docsmith_cli::controller::WizardController;
use docsmith_cli::diagnose;
use docsmith_cli::error::ControllerError;
use docsmith_core::ClassifiedError;
use docsmith_core::models::render::RenderRequest;
use docsmith_core::template_files::{pdf_file_name, template_stem};
use docsmith_render::{
    Dispatcher, HttpTransport, RenderEndpoints, RenderOutcome, Renderer, UreqTransport,
};
use docsmith_services::health::HEALTH_TIMEOUT;
use docsmith_services::{HttpTemplateCatalog, HttpTemplateModifier, probe_health};
use docsmith_session::{FileSessionPersistence, SessionStore};

#[derive(Debug, Parser)]
#[command(name = "docsmith", version, about = "Customize and render document templates")]
pub struct Cli {
    /// Write logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,
    /// Config file to use instead of the one in the user config directory
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the templates the rendering service offers
    Templates,
    /// Check that the rendering service is reachable
    Health,
    /// Show the wizard session
    Status,
    /// Select a template and fetch its content
    Select(SelectArgs),
    /// Continue to the customize step
    Next,
    /// Return to template selection (clears the session)
    Back,
    /// Clear the session
    Reset,
    /// Apply a natural-language change to the active template
    Modify(ModifyArgs),
    /// Render the active template to a PDF
    Render(RenderArgs),
    /// Save the active template source
    Download(DownloadArgs),
    /// Send one render request and report how the response was classified
    Diagnose(DiagnoseArgs),
    /// Interactive wizard with background rendering
    Wizard,
    /// Show the configuration (API key redacted)
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct SelectArgs {
    #[arg(value_name = "ID")]
    template_id: String,
}

#[derive(Debug, Args)]
struct ModifyArgs {
    #[arg(value_name = "PROMPT", required = true)]
    prompt: Vec<String>,
}

#[derive(Debug, Args)]
struct RenderArgs {
    /// Output file (default: `<template>.pdf`)
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
    /// Let the service load the template itself instead of sending the active content
    #[arg(long)]
    by_name: bool,
}

#[derive(Debug, Args)]
struct DownloadArgs {
    #[arg(long, value_name = "PATH")]
    out: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct DiagnoseArgs {
    /// Template to render (default: the selected one)
    #[arg(long, value_name = "ID")]
    template: Option<String>,
    /// Render this file's contents instead of a stored template
    #[arg(long, value_name = "FILE")]
    content: Option<PathBuf>,
    /// Write the PDF here if one was produced
    #[arg(long, value_name = "PATH")]
    save: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct ConfigArgs {
    /// Write the effective configuration to the config file
    #[arg(long)]
    init: bool,
}

/// Everything a command needs, built from the configuration.
pub struct Runtime {
    pub config: DocsmithConfig,
    pub catalog: Arc<HttpTemplateCatalog>,
    pub modifier: Arc<HttpTemplateModifier>,
    pub dispatcher: Dispatcher,
    pub renderer: Renderer,
}

impl Runtime {
    pub fn new(config: DocsmithConfig) -> Self {
        let timeout = config.request_timeout();
        let transport: Arc<dyn HttpTransport> = Arc::new(UreqTransport::new(timeout));
        let modify_transport: Arc<dyn HttpTransport> =
            Arc::new(UreqTransport::new(docsmith_services::modify::DEFAULT_TIMEOUT));

        let catalog = Arc::new(
            HttpTemplateCatalog::new(Arc::clone(&transport), &config.render_base_url)
                .with_timeout(timeout),
        );
        let modifier = Arc::new(HttpTemplateModifier::new(
            modify_transport,
            &config.modify_base_url,
            config.api_key.clone(),
        ));
        let endpoints =
            RenderEndpoints::new(&config.render_base_url).with_sample_type(&config.sample_type);
        let dispatcher = Dispatcher::new(transport, endpoints).with_timeout(timeout);
        let renderer = Renderer::new(dispatcher.clone()).with_policy(config.retry_policy());

        Self {
            config,
            catalog,
            modifier,
            dispatcher,
            renderer,
        }
    }

    pub fn controller(
        &self,
        store: SessionStore<FileSessionPersistence>,
    ) -> WizardController<FileSessionPersistence> {
        WizardController::new(
            store,
            self.catalog.clone(),
            self.modifier.clone(),
            self.renderer.clone(),
        )
    }

    fn persistence(&self) -> eyre::Result<FileSessionPersistence> {
        Ok(FileSessionPersistence::new(self.config.session_path()?))
    }

    /// Pick up where the last command left off.
    fn resume(&self) -> eyre::Result<WizardController<FileSessionPersistence>> {
        let persistence = self.persistence()?;
        let path = persistence.path().display().to_string();
        let store = SessionStore::resume(persistence).map_err(|e| {
            eyre::Report::new(e).wrap_err(format!(
                "failed to load session at {path}; `docsmith reset` starts a new one"
            ))
        })?;
        Ok(self.controller(store))
    }

    /// A brand-new session, as on first load of the wizard.
    pub fn start_fresh(&self) -> eyre::Result<WizardController<FileSessionPersistence>> {
        let store = SessionStore::start_fresh(self.persistence()?)?;
        Ok(self.controller(store))
    }
}

impl Cli {
    pub async fn run(self) -> eyre::Result<()> {
        let config = match &self.config {
            Some(path) => {
                let mut config = config::load_config_from(path)?;
                config.apply_env(|name| std::env::var(name).ok());
                config
            }
            None => config::load_config()?,
        };

        if let Command::Config(args) = &self.command {
            return show_config(&config, self.config.as_deref(), args.init);
        }

        let runtime = Runtime::new(config);
        match self.command {
            Command::Templates => list_templates(&runtime).await,
            Command::Health => health(&runtime).await,
            Command::Status => status(&runtime),
            Command::Select(args) => select(&runtime, &args.template_id).await,
            Command::Next => {
                let step = runtime.resume()?.next().map_err(explain)?;
                println!("Now at step {}: {}", step.number(), step.label());
                Ok(())
            }
            Command::Back => {
                let step = runtime.resume()?.back().map_err(explain)?;
                println!("Back at step {}: {} (session cleared)", step.number(), step.label());
                Ok(())
            }
            Command::Reset => {
                // Never loads the old file, so a damaged session can be cleared.
                runtime.start_fresh()?;
                println!("Session cleared.");
                Ok(())
            }
            Command::Modify(args) => modify(&runtime, &args.prompt.join(" ")).await,
            Command::Render(args) => render(&runtime, args).await,
            Command::Download(args) => download(&runtime, args),
            Command::Diagnose(args) => run_diagnose(&runtime, args).await,
            Command::Wizard => crate::wizard::run(&runtime).await,
            Command::Config(_) => Ok(()),
        }
    }
}

/// Turn a failure into a report that tells the user whether retrying helps.
pub fn explain(err: ControllerError) -> eyre::Report {
    match err.classified() {
        Some(classified) => eyre::eyre!(describe_failure(classified)),
        None => eyre::Report::new(err),
    }
}

pub fn describe_failure(err: &ClassifiedError) -> String {
    let mut text = format!("{} [{}]\n  {}", err.message(), err.kind(), err.user_guidance());
    if let Some(detail) = err.raw_detail() {
        text.push_str(&format!("\n  detail: {detail}"));
    }
    text
}

async fn list_templates(runtime: &Runtime) -> eyre::Result<()> {
    let controller = runtime.resume()?;
    let names = controller.list_templates().await.map_err(explain)?;
    let selected = controller.session().selected_template_id.as_deref().map(template_stem);

    if names.is_empty() {
        println!("The rendering service has no templates.");
    }
    for name in &names {
        let marker = if Some(template_stem(name)) == selected { "*" } else { " " };
        println!("{marker} {}", template_stem(name));
    }
    Ok(())
}

async fn health(runtime: &Runtime) -> eyre::Result<()> {
    let catalog = HttpTemplateCatalog::new(
        Arc::new(UreqTransport::new(HEALTH_TIMEOUT)),
        &runtime.config.render_base_url,
    )
    .with_timeout(HEALTH_TIMEOUT);
    let report = probe_health(&catalog, HEALTH_TIMEOUT).await;

    println!("Backend:   {}", runtime.config.render_base_url);
    println!("Latency:   {} ms", report.latency.as_millis());
    match (&report.template_count, &report.error) {
        (Some(count), _) => {
            println!("Status:    healthy ({count} templates)");
            Ok(())
        }
        (None, Some(err)) => {
            println!("Status:    unhealthy");
            Err(eyre::eyre!(describe_failure(err)))
        }
        (None, None) => Err(eyre::eyre!("health probe returned no result")),
    }
}

fn status(runtime: &Runtime) -> eyre::Result<()> {
    let controller = runtime.resume()?;
    let session = controller.session();
    let lineage = controller.lineage();

    println!("Step:      {} ({})", session.step.number(), session.step.label());
    println!(
        "Template:  {}",
        lineage.selected_template_id.as_deref().unwrap_or("(none)")
    );
    println!(
        "Content:   original {}, modified {}",
        if lineage.has_original { "loaded" } else { "missing" },
        if lineage.has_modified { "present" } else { "none" },
    );
    match lineage.active_origin {
        Some(origin) => println!("Active:    {} ({} chars)", origin.as_str(), lineage.active_chars),
        None => println!("Active:    (nothing to render yet)"),
    }
    if !session.last_prompt.is_empty() {
        println!("Prompt:    {}", session.last_prompt);
    }
    println!("Session:   {}", runtime.config.session_path()?.display());
    Ok(())
}

async fn select(runtime: &Runtime, template_id: &str) -> eyre::Result<()> {
    let mut controller = runtime.resume()?;
    controller.select_template(template_id).await.map_err(explain)?;

    let lineage = controller.lineage();
    println!(
        "Selected {} ({} chars loaded). Run `docsmith next` to customize it.",
        template_stem(template_id),
        lineage.active_chars
    );
    Ok(())
}

async fn modify(runtime: &Runtime, prompt: &str) -> eyre::Result<()> {
    let mut controller = runtime.resume()?;
    let modified = controller.modify(prompt).await.map_err(explain)?;

    println!("Template modified ({} chars).", modified.text.chars().count());
    if let Some(usage) = modified.usage {
        println!(
            "Tokens:    {} prompt + {} completion = {} total",
            usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
        );
    }
    if modified.possibly_truncated {
        println!("Warning:   the result is less than half the original size and may be truncated.");
    }
    Ok(())
}

async fn render(runtime: &Runtime, args: RenderArgs) -> eyre::Result<()> {
    let controller = runtime.resume()?;
    let request = if args.by_name {
        controller.plan_render_by_name()
    } else {
        controller.plan_render()
    }
    .map_err(explain)?;

    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(pdf_file_name(request.template_id())));
    let mode = request.mode();

    match controller.render(request).await.map_err(explain)? {
        RenderOutcome::Current { artifact, .. } => {
            std::fs::write(&out, artifact.bytes())?;
            println!(
                "Rendered {} bytes ({}) to {}",
                artifact.size_bytes(),
                mode.as_str(),
                out.display()
            );
            Ok(())
        }
        RenderOutcome::Superseded { generation } => {
            Err(eyre::eyre!("render {generation} was superseded by a newer render"))
        }
    }
}

fn download(runtime: &Runtime, args: DownloadArgs) -> eyre::Result<()> {
    let controller = runtime.resume()?;
    let download = controller.download().map_err(explain)?;
    let out = args.out.unwrap_or_else(|| PathBuf::from(&download.file_name));

    std::fs::write(&out, download.text.as_bytes())?;
    println!("Saved {} template to {}", download.origin.as_str(), out.display());
    Ok(())
}

async fn run_diagnose(runtime: &Runtime, args: DiagnoseArgs) -> eyre::Result<()> {
    let selected = || -> eyre::Result<Option<String>> {
        Ok(runtime.resume()?.session().selected_template_id.clone())
    };

    let request = match (&args.content, args.template) {
        (Some(file), template) => {
            let content = std::fs::read_to_string(file)
                .map_err(|e| eyre::eyre!("failed to read {}: {e}", file.display()))?;
            let template_id = match template {
                Some(id) => id,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        eyre::eyre!("cannot derive a template name from {}", file.display())
                    })?,
            };
            RenderRequest::by_content(template_stem(&template_id), content)
        }
        (None, Some(id)) => RenderRequest::by_name(id),
        (None, None) => match selected()? {
            Some(id) => RenderRequest::by_name(id),
            None => return Err(eyre::eyre!("no template selected; pass --template or --content")),
        },
    }
    .map_err(|e| eyre::eyre!(describe_failure(&e)))?;

    let report = diagnose::diagnose(&runtime.dispatcher, &request)
        .await
        .map_err(|e| eyre::eyre!(describe_failure(&e)))?;
    print!("{report}");

    if let (Some(path), Some(artifact)) = (&args.save, report.artifact()) {
        std::fs::write(path, artifact.bytes())?;
        println!("   Saved to {}", path.display());
    }
    Ok(())
}

fn show_config(
    config: &DocsmithConfig,
    path: Option<&std::path::Path>,
    init: bool,
) -> eyre::Result<()> {
    if init {
        let written = match path {
            Some(path) => {
                config::save_config_to(path, config)?;
                path.to_path_buf()
            }
            None => config::save_config(config)?,
        };
        println!("Wrote {}", written.display());
    }
    println!("{}", serde_json::to_string_pretty(&config::config_info(config))?);
    Ok(())
}
