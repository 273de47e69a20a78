//! Check command.

use console::style;

use scribo_ner::{BackendKind, NerConfig, Structurer};

pub async fn cmd_check(config: &NerConfig) -> anyhow::Result<()> {
    let structurer = Structurer::new(config);

    println!("\n{}", style("NER Backend Status").bold());
    println!("{}", "-".repeat(50));

    let mut any_available = false;
    for kind in BackendKind::ALL {
        let marker = if kind == structurer.default_backend() {
            " (default)"
        } else {
            ""
        };
        let label = format!("{}{}", kind, marker);

        match structurer.ensure_loaded(kind).await {
            Ok(()) => {
                any_available = true;
                println!("  {:<15} {}", label, style("✓ available").green());
            }
            Err(e) => {
                println!("  {:<15} {}", label, style("✗ not available").red());
                println!("                  {}", style(e).dim());
                println!(
                    "                  {}",
                    style(structurer.backend(kind).availability_hint()).dim()
                );
            }
        }
        println!("                  {}", style(kind.description()).dim());
    }
    println!();

    if !any_available {
        anyhow::bail!("No NER backend is available");
    }
    Ok(())
}
