mod app;
mod cli;

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .compact()
        .init();

    let cli = cli::parse();
    app::run(cli);
}
