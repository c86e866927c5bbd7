mod opt;
mod routes;
mod utils;

use clap::Parser;
use opt::Opt;

fn route_cmd(opt: Opt) -> i32 {
    match opt {
        Opt::Info(cmd) => routes::info(cmd),
        Opt::Build(cmd) => routes::build(cmd),
        Opt::Loglike(cmd) => routes::loglike(cmd),
        Opt::Sample(cmd) => routes::sample(cmd),
        Opt::Check(cmd) => routes::check(cmd),
    }
}

fn main() {
    env_logger::init();

    let opt = Opt::parse();

    let exit_code = route_cmd(opt);

    std::process::exit(exit_code);
}
