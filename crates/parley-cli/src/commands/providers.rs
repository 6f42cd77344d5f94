use anyhow::Result;
use console::style;
use parley::client::service::ChatClient;
use parley::providers::base::ProviderListing;

pub async fn execute(server: &str) -> Result<()> {
    let client = ChatClient::new(server)?;
    let listing = client.providers().await?;
    print_listing(&listing);
    Ok(())
}

fn print_listing(listing: &ProviderListing) {
    for provider in &listing.providers {
        let marker = if provider.enabled {
            style("●").green()
        } else {
            style("○").dim()
        };
        let status = if provider.enabled {
            style("ready").green()
        } else {
            style("not configured").dim()
        };
        println!(
            "{} {:<10} {:<18} {} {}",
            marker,
            provider.id,
            provider.name,
            style(&provider.model).dim(),
            status
        );
    }

    let context = if listing.context_enabled {
        style("on").green()
    } else {
        style("off").dim()
    };
    println!("\nplatform context: {}", context);
}
