//! Smoke test against a running rendering service.
//!
//! Probes the service, fetches one template, and renders it both by name
//! and by content, printing how each response was classified.
//!
//! Usage:
//!   DOCSMITH_RENDER_URL=http://localhost:8890/velocity-engine-app \
//!   DOCSMITH_TEMPLATE=standard_invoice \
//!   cargo run -p docsmith-cli --example render_smoke

use std::sync::Arc;
use std::time::Duration;

use docsmith_cli::diagnose::diagnose;
use docsmith_core::models::render::RenderRequest;
use docsmith_core::template_files::pdf_file_name;
use docsmith_render::{Dispatcher, HttpTransport, RenderEndpoints, UreqTransport};
use docsmith_services::health::HEALTH_TIMEOUT;
use docsmith_services::{HttpTemplateCatalog, TemplateCatalog, probe_health};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let base_url = std::env::var("DOCSMITH_RENDER_URL")
        .unwrap_or_else(|_| "http://localhost:8890/velocity-engine-app".to_string());
    let template =
        std::env::var("DOCSMITH_TEMPLATE").unwrap_or_else(|_| "standard_invoice".to_string());

    println!("╔══════════════════════════════════════════════════╗");
    println!("║      docsmith render smoke test                  ║");
    println!("╠══════════════════════════════════════════════════╣");
    println!("║  Backend:  {:<37} ║", base_url);
    println!("║  Template: {:<37} ║", template);
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    let transport: Arc<dyn HttpTransport> = Arc::new(UreqTransport::new(Duration::from_secs(30)));
    let catalog = HttpTemplateCatalog::new(Arc::clone(&transport), &base_url);

    // Step 1: is anybody there?
    println!("Probing backend...");
    let health = probe_health(&catalog, HEALTH_TIMEOUT).await;
    match (health.template_count, &health.error) {
        (Some(count), _) => println!(
            "  ✅ healthy, {count} templates, {} ms",
            health.latency.as_millis()
        ),
        (None, Some(e)) => {
            println!("  ❌ {e}");
            println!("     {}", e.user_guidance());
            return Err(eyre::eyre!("backend unhealthy"));
        }
        (None, None) => return Err(eyre::eyre!("health probe returned no result")),
    }
    println!();

    let dispatcher = Dispatcher::new(transport, RenderEndpoints::new(&base_url));

    // Step 2: let the service load the template itself.
    println!("Rendering by name...");
    let by_name = diagnose(&dispatcher, &RenderRequest::by_name(&template)?).await?;
    print!("{by_name}");
    println!();

    // Step 3: fetch the source and send it back inline.
    println!("Fetching template content...");
    let content = catalog.fetch_content(&template).await?;
    println!("  {} chars", content.chars().count());
    println!();

    println!("Rendering by content...");
    let by_content = diagnose(&dispatcher, &RenderRequest::by_content(&template, content)?).await?;
    print!("{by_content}");

    if let Some(artifact) = by_content.artifact() {
        let out = std::env::temp_dir().join(pdf_file_name(&template));
        std::fs::write(&out, artifact.bytes())?;
        println!("   Written to {}", out.display());
    }

    println!();
    if by_name.artifact().is_some() && by_content.artifact().is_some() {
        println!("✅ Both render modes produced a PDF.");
        Ok(())
    } else {
        println!("❌ At least one render mode failed.");
        Err(eyre::eyre!("render smoke test failed"))
    }
}
