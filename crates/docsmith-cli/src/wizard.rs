//! Interactive wizard.
//!
//! Reads commands from stdin while template fetches and renders run as
//! spawned tasks. Their results come back over a channel and are applied
//! between commands, so the session only ever changes on this loop.

use std::io::Write;
use std::path::PathBuf;

use docsmith_cli::controller::WizardController;
use docsmith_cli::error::ControllerError;
use docsmith_core::ClassifiedError;
use docsmith_core::models::session::WizardStep;
use docsmith_core::template_files::{pdf_file_name, template_stem};
use docsmith_render::{PreviewSlot, RenderOutcome};
use docsmith_session::FileSessionPersistence;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::cli::{Runtime, describe_failure};

const HELP: &str = "\
Commands:
  list                 list available templates
  select <id>          select a template and load its content
  next                 continue to the customize step (renders a preview)
  back                 return to template selection (clears the session)
  modify <prompt>      change the template with a natural-language instruction
  render               render the active template again
  save [path]          copy the current preview PDF
  download [path]      save the active template source
  status               show the session
  help                 show this help
  quit                 leave the wizard";

enum WizardEvent {
    Fetched {
        template_id: String,
        result: Result<String, ClassifiedError>,
    },
    Rendered {
        generation: u64,
        result: Result<RenderOutcome, ClassifiedError>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct Wizard {
    controller: WizardController<FileSessionPersistence>,
    events: mpsc::UnboundedSender<WizardEvent>,
    render_task: Option<JoinHandle<()>>,
    preview: PreviewSlot,
}

pub async fn run(runtime: &Runtime) -> eyre::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut wizard = Wizard {
        controller: runtime.start_fresh()?,
        events: tx,
        render_task: None,
        preview: PreviewSlot::new(),
    };

    println!("docsmith wizard. Type `help` for commands.");
    wizard.list().await;
    prompt(wizard.controller.step());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if wizard.handle_line(line.trim()).await == Flow::Quit {
                    break;
                }
                prompt(wizard.controller.step());
            }
            Some(event) = rx.recv() => {
                wizard.handle_event(event);
                prompt(wizard.controller.step());
            }
        }
    }

    wizard.shutdown();
    Ok(())
}

fn prompt(step: WizardStep) {
    print!("[{}/2 {}] > ", step.number(), step.label());
    let _ = std::io::stdout().flush();
}

fn report(err: &ControllerError) {
    match err.classified() {
        Some(classified) => println!("{}", describe_failure(classified)),
        None => println!("{err}"),
    }
}

impl Wizard {
    async fn handle_line(&mut self, line: &str) -> Flow {
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "" => {}
            "list" | "ls" => self.list().await,
            "select" if rest.is_empty() => println!("usage: select <id>"),
            "select" => self.select(rest),
            "next" => self.next(),
            "back" => self.back(),
            "modify" if rest.is_empty() => println!("usage: modify <prompt>"),
            "modify" => self.modify(rest).await,
            "render" => self.start_render(),
            "save" => self.save_preview(rest),
            "download" => self.download(rest),
            "status" => self.status(),
            "help" | "?" => println!("{HELP}"),
            "quit" | "exit" => return Flow::Quit,
            other => println!("unknown command `{other}`; type `help`"),
        }
        Flow::Continue
    }

    fn handle_event(&mut self, event: WizardEvent) {
        match event {
            WizardEvent::Fetched {
                template_id,
                result,
            } => match self.controller.complete_fetch(&template_id, result) {
                Ok(true) => {
                    let chars = self.controller.lineage().active_chars;
                    println!("\nLoaded {} ({chars} chars).", template_stem(&template_id));
                }
                Ok(false) => debug!(template_id, "fetch result not applied"),
                Err(e) => {
                    println!();
                    report(&e);
                }
            },
            WizardEvent::Rendered { generation, result } => {
                if !self.controller.renderer().is_current(generation) {
                    debug!(generation, "dropping stale render result");
                    return;
                }
                match result {
                    Ok(RenderOutcome::Current {
                        generation,
                        artifact,
                    }) => match self.preview.present(generation, &artifact) {
                        Ok(true) => {
                            if let Some(preview) = self.preview.current() {
                                println!(
                                    "\nPreview ready: {} ({} bytes)",
                                    preview.path().display(),
                                    preview.size_bytes()
                                );
                            }
                        }
                        Ok(false) => debug!(generation, "preview slot kept a newer render"),
                        Err(e) => println!("\nfailed to write preview: {e}"),
                    },
                    Ok(RenderOutcome::Superseded { .. }) => {}
                    Err(e) => println!("\nRender failed: {}", describe_failure(&e)),
                }
            }
        }
    }

    async fn list(&self) {
        match self.controller.list_templates().await {
            Ok(names) => {
                let selected = self.controller.session().selected_template_id.as_deref();
                for name in &names {
                    let marker = if selected.map(template_stem) == Some(template_stem(name)) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{marker} {}", template_stem(name));
                }
            }
            Err(e) => report(&e),
        }
    }

    fn select(&mut self, template_id: &str) {
        if let Err(e) = self.controller.begin_select(template_id) {
            report(&e);
            return;
        }
        self.cancel_render();
        self.preview.clear();
        println!("Selected {}. Loading content...", template_stem(template_id));

        let catalog = self.controller.catalog();
        let events = self.events.clone();
        let template_id = template_id.to_string();
        tokio::spawn(async move {
            let result = catalog.fetch_content(&template_id).await;
            let _ = events.send(WizardEvent::Fetched {
                template_id,
                result,
            });
        });
    }

    fn next(&mut self) {
        match self.controller.next() {
            Ok(step) => {
                println!("Step {}: {}", step.number(), step.label());
                self.start_render();
            }
            Err(e) => report(&e),
        }
    }

    fn back(&mut self) {
        match self.controller.back() {
            Ok(step) => {
                self.cancel_render();
                self.preview.clear();
                println!("Step {}: {} (session cleared)", step.number(), step.label());
            }
            Err(e) => report(&e),
        }
    }

    async fn modify(&mut self, prompt: &str) {
        println!("Modifying template...");
        match self.controller.modify(prompt).await {
            Ok(modified) => {
                println!("Template modified ({} chars).", modified.text.chars().count());
                if modified.possibly_truncated {
                    println!(
                        "Warning: the result is less than half the original size \
                         and may be truncated."
                    );
                }
                self.start_render();
            }
            Err(e) => report(&e),
        }
    }

    /// Render the active content in the background. Any render still in
    /// flight is aborted and its generation superseded.
    fn start_render(&mut self) {
        let request = match self.controller.plan_render() {
            Ok(request) => request,
            Err(e) => {
                report(&e);
                return;
            }
        };

        if let Some(task) = self.render_task.take() {
            task.abort();
        }
        let renderer = self.controller.renderer();
        let generation = renderer.begin();
        println!(
            "Rendering {} ({}, #{generation})...",
            template_stem(request.template_id()),
            request.mode().as_str()
        );

        let events = self.events.clone();
        self.render_task = Some(tokio::spawn(async move {
            let result = renderer.render_as(generation, request).await;
            let _ = events.send(WizardEvent::Rendered { generation, result });
        }));
    }

    fn cancel_render(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
            // Anything the aborted task already queued is now stale.
            self.controller.renderer().begin();
        }
    }

    fn save_preview(&self, dest: &str) {
        let dest = if dest.is_empty() {
            match &self.controller.session().selected_template_id {
                Some(id) => PathBuf::from(pdf_file_name(id)),
                None => PathBuf::from("preview.pdf"),
            }
        } else {
            PathBuf::from(dest)
        };
        match self.preview.save_to(&dest) {
            Ok(Some(bytes)) => println!("Saved {bytes} bytes to {}", dest.display()),
            Ok(None) => println!("No preview yet. Use `render` first."),
            Err(e) => println!("failed to save preview: {e}"),
        }
    }

    fn download(&self, dest: &str) {
        let download = match self.controller.download() {
            Ok(download) => download,
            Err(e) => {
                report(&e);
                return;
            }
        };
        let dest = if dest.is_empty() {
            PathBuf::from(&download.file_name)
        } else {
            PathBuf::from(dest)
        };
        match std::fs::write(&dest, download.text.as_bytes()) {
            Ok(()) => println!("Saved {} template to {}", download.origin.as_str(), dest.display()),
            Err(e) => println!("failed to save template: {e}"),
        }
    }

    fn status(&self) {
        let lineage = self.controller.lineage();
        let session = self.controller.session();
        println!(
            "Template: {}",
            lineage.selected_template_id.as_deref().unwrap_or("(none)")
        );
        match lineage.active_origin {
            Some(origin) => println!(
                "Active:   {} ({} chars)",
                origin.as_str(),
                lineage.active_chars
            ),
            None => println!("Active:   (no content loaded)"),
        }
        if !session.last_prompt.is_empty() {
            println!("Prompt:   {}", session.last_prompt);
        }
        match self.preview.current() {
            Some(preview) => println!("Preview:  {}", preview.path().display()),
            None => println!("Preview:  (none)"),
        }
    }

    fn shutdown(&mut self) {
        if let Some(task) = self.render_task.take() {
            task.abort();
        }
        self.preview.clear();
    }
}
