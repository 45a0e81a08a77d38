use comfy_table::{Cell, Table};

use crate::checks::CheckEngine;
use crate::fmt::severity_label;

pub fn list() {
    let engine = CheckEngine::new();
    let mut table = Table::new();
    table.set_header(vec!["#", "Check", "Severity", "Passes when"]);
    for (i, check) in engine.checks().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(check.name()),
            Cell::new(severity_label(check.severity())),
            Cell::new(check.description()),
        ]);
    }
    println!("Checks\n{table}");
}
