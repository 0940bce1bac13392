use ecourts_lib::PortalCatalog;

use crate::output::{print_json, print_states_table, OutputFormat};

pub fn run(format: &OutputFormat) {
    let states = PortalCatalog::states();
    match format {
        OutputFormat::Table => print_states_table(states),
        OutputFormat::Json => print_json(&states),
    }
}
