mod cli;

use cli::commands::get::AbsentPathError;

fn main() {
    if let Err(e) = cli::run() {
        if let Some(absent) = e.downcast_ref::<AbsentPathError>() {
            eprintln!("{absent}");
            std::process::exit(2);
        }
        eprintln!("{e:#}"); // pretty anyhow chain
        std::process::exit(1);
    }
}
