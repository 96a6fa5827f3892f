use crate::support::print_json_or_exit;
use deployops_policy::{flagged_changes, load_change_set};
use serde_json::json;

const CHECK_KIND: &str = "ci.change_set_replacement_check.v1";

pub fn run(change_set_path: String, json_output: bool) {
    let change_set = load_change_set(&change_set_path).unwrap_or_else(|err| {
        eprintln!("error: {err}");
        std::process::exit(2);
    });
    let flagged = flagged_changes(&change_set);
    tracing::debug!(flagged = flagged.len(), "reviewed change set");

    let result = if flagged.is_empty() {
        "accepted"
    } else {
        "rejected"
    };

    if json_output {
        let payload = json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "result": result,
            "changeSet": change_set_path,
            "flagged": flagged,
        });
        print_json_or_exit(&payload, "check-replacements");
    } else if flagged.is_empty() {
        println!("No resources require replacement.");
    } else {
        eprintln!("Resources that require attention:");
        for change in &flagged {
            eprintln!(
                "- LogicalId: {}, PhysicalId: {}, Type: {}, Reason: {}",
                change.logical_id, change.physical_id, change.resource_type, change.reason
            );
        }
    }

    if !flagged.is_empty() {
        std::process::exit(1);
    }
}
