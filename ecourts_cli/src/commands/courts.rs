use ecourts_lib::PortalCatalog;

use crate::output::{print_benches_table, print_json, OutputFormat};

pub fn run(format: &OutputFormat) {
    let benches = PortalCatalog::benches();
    match format {
        OutputFormat::Table => print_benches_table(benches),
        OutputFormat::Json => print_json(&benches),
    }
}
