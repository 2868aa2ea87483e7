use registry_catalog::cli::{Args, Runner};
use registry_catalog::logging::Logger;
use std::process;

#[tokio::main]
async fn main() {
    let args = Args::parse_args();

    let runner = match Runner::new(args) {
        Ok(runner) => runner,
        Err(e) => {
            Logger::new(false).error(&e.to_string());
            process::exit(1);
        }
    };

    if let Err(e) = runner.run().await {
        runner.output().error(&e.to_string());
        process::exit(1);
    }
}
