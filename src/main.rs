//! prov binary entry point.

use provenance::ui::output;

fn main() {
    if let Err(err) = provenance::cli::run() {
        output::error(format!("{err:#}"));
        std::process::exit(1);
    }
}
