use console::style;

use training_reset::cli;

#[tokio::main]
async fn main() {
    if let Err(err) = cli::run().await {
        eprintln!("{}", style(err.user_message()).red().bold());
        std::process::exit(1);
    }
}
