use anyhow::Result;
use console::style;

pub fn execute() -> Result<()> {
    println!(
        "{} {}",
        style("parley").bold().cyan(),
        style(env!("CARGO_PKG_VERSION")).bold()
    );
    Ok(())
}
