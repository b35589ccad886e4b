use clap::Parser;
use meshvc_sim::cli::Cli;

fn main()
{
	let cli = Cli::parse();

	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::new(cli.tracing_filter()))
		.init();

	let exit_code = meshvc_sim::cli::run(&cli);
	std::process::exit(exit_code);
}
