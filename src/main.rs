use credhub_client::cli::{self, Cli};

fn main() {
    let cli = Cli::parse_args();
    cli::init_logging(cli.debug);

    if let Err(err) = cli::run(cli) {
        eprintln!("error: {:#}", err);
        std::process::exit(1);
    }
}
